//! API Mocks
//!
//! Values describing a stand-in response for one network call pattern.
//!
//! Mocks are built in two steps, request first and response second:
//!
//! ```ignore
//! let mock = create_api_mock(ApiMockRequest::get("/api/settings"))
//!     .reply_with(ApiMockResponse::new("ok"))?;
//! ```
//!
//! Building a mock never applies it. Drivers queue mocks and hand the full
//! list to the configured `apply_mocks` hook.

use crate::result::{DriverError, DriverResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Default status code for mocked responses
pub const DEFAULT_STATUS: u16 = 200;

/// HTTP methods an API mock can answer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    /// GET request
    #[default]
    Get,
    /// POST request
    Post,
    /// PUT request
    Put,
    /// DELETE request
    Delete,
}

impl Method {
    /// Lowercase wire name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Post => "post",
            Self::Put => "put",
            Self::Delete => "delete",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One mocked network call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiMock {
    /// Method to answer
    pub method: Method,
    /// Target URL
    pub url: String,
    /// Query criteria the request must carry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<Value>,
    /// Body criteria the request must carry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    /// Response status code
    pub status: u16,
    /// Response payload
    pub response: Value,
}

impl ApiMock {
    /// Check whether a request would be answered by this mock.
    ///
    /// Method and URL must be equal; a query string on the request URL is
    /// ignored unless the mock URL carries one too. Query and body criteria
    /// only constrain the request when the mock specifies them.
    #[must_use]
    pub fn matches(&self, request: &MockRequest) -> bool {
        if self.method != request.method {
            return false;
        }
        let url_matches = self.url == request.url || self.url == request.path();
        if !url_matches {
            return false;
        }
        if let Some(query) = &self.query {
            if request.query.as_ref() != Some(query) {
                return false;
            }
        }
        if let Some(body) = &self.body {
            if request.body.as_ref() != Some(body) {
                return false;
            }
        }
        true
    }
}

/// Find the mock answering a request.
///
/// Later mocks win over earlier ones, so appending a mock overrides any
/// previous mock for the same call.
#[must_use]
pub fn find_api_mock<'a>(mocks: &'a [ApiMock], request: &MockRequest) -> Option<&'a ApiMock> {
    mocks.iter().rev().find(|mock| mock.matches(request))
}

/// Request half of an API mock
#[derive(Debug, Clone, PartialEq)]
pub struct ApiMockRequest {
    method: Method,
    url: String,
    query: Option<Value>,
    body: Option<Value>,
}

impl ApiMockRequest {
    /// Request for a URL, answering GET by default
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            method: Method::default(),
            url: url.into(),
            query: None,
            body: None,
        }
    }

    /// GET request
    #[must_use]
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(url)
    }

    /// POST request
    #[must_use]
    pub fn post(url: impl Into<String>) -> Self {
        Self::new(url).method(Method::Post)
    }

    /// PUT request
    #[must_use]
    pub fn put(url: impl Into<String>) -> Self {
        Self::new(url).method(Method::Put)
    }

    /// DELETE request
    #[must_use]
    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(url).method(Method::Delete)
    }

    /// Set the method
    #[must_use]
    pub const fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Require a query
    #[must_use]
    pub fn query(mut self, query: impl Into<Value>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Require a body
    #[must_use]
    pub fn body(mut self, body: impl Into<Value>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// Response half of an API mock
#[derive(Debug, Clone, PartialEq)]
pub struct ApiMockResponse {
    status: u16,
    response: Value,
}

impl ApiMockResponse {
    /// Response with a payload and status 200
    #[must_use]
    pub fn new(response: impl Into<Value>) -> Self {
        Self {
            status: DEFAULT_STATUS,
            response: response.into(),
        }
    }

    /// Set the status code
    #[must_use]
    pub const fn status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }
}

/// First step of building an API mock, waiting for its response
#[derive(Debug, Clone, PartialEq)]
pub struct ApiMockRequestBuilder {
    request: ApiMockRequest,
}

impl ApiMockRequestBuilder {
    /// Finish the mock with a response.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::InvalidApiMock`] if the request URL is blank.
    pub fn reply_with(self, response: ApiMockResponse) -> DriverResult<ApiMock> {
        let ApiMockRequest {
            method,
            url,
            query,
            body,
        } = self.request;

        if url.trim().is_empty() {
            return Err(DriverError::InvalidApiMock {
                message: format!("{method} mock has no url"),
            });
        }

        Ok(ApiMock {
            method,
            url,
            query,
            body,
            status: response.status,
            response: response.response,
        })
    }
}

/// Start building an API mock from its request description
#[must_use]
pub fn create_api_mock(request: ApiMockRequest) -> ApiMockRequestBuilder {
    ApiMockRequestBuilder { request }
}

/// An outgoing request to look up among mocks
#[derive(Debug, Clone, PartialEq)]
pub struct MockRequest {
    /// Request method
    pub method: Method,
    /// Request URL, possibly with a query string
    pub url: String,
    /// Parsed query
    pub query: Option<Value>,
    /// Request body
    pub body: Option<Value>,
}

impl MockRequest {
    /// Create a request
    #[must_use]
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            query: None,
            body: None,
        }
    }

    /// Attach a parsed query
    #[must_use]
    pub fn with_query(mut self, query: impl Into<Value>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Attach a body
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Value>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// URL without its query string
    #[must_use]
    pub fn path(&self) -> &str {
        self.url.split('?').next().unwrap_or(&self.url)
    }
}
