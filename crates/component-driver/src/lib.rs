//! component-driver: Chainable Test Drivers for UI Components
//!
//! A driver holds a component's props, the environment injected around it,
//! and a queue of API mocks, and runs the mount/update/teardown lifecycle so
//! each test reads as a short chain of givens, a render, and assertions.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                  component-driver Architecture                   │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   ┌──────────────┐   ┌──────────────┐   ┌──────────────────┐   │
//! │   │ DriverConfig │──►│ DriverHooks  │──►│ TestDriver<R>    │   │
//! │   │ (partial)    │   │ (total)      │   │ props / env /    │   │
//! │   └──────────────┘   └──────────────┘   │ mocks / handle   │   │
//! │                                          └────────┬─────────┘   │
//! │   ┌──────────────┐   ┌──────────────┐            │             │
//! │   │ ApiMock      │   │ DriverFactory│   ┌────────▼─────────┐   │
//! │   │ builders     │   │ + Composed   │   │ R: Renderer      │   │
//! │   └──────────────┘   └──────────────┘   │ (vdom or engine) │   │
//! │                                          └──────────────────┘   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use component_driver::prelude::*;
//!
//! component_driver::setup::init();
//!
//! let template = create_test_driver(
//!     VirtualRenderer::new(),
//!     DriverConfig::new().apply_mocks(|mocks, _env| install(mocks)),
//! );
//! let mut driver = template.create();
//! driver
//!     .given_prop("text", "hello")
//!     .given_api_mock(
//!         create_api_mock(ApiMockRequest::get("/api/settings"))
//!             .reply_with(ApiMockResponse::new("ok"))?,
//!     )
//!     .render(&text_component, RenderOptions::default())
//!     .await?;
//! assert_eq!(driver.get_by_data_hook("content")?.text(), "hello");
//! driver.cleanup();
//! ```
//!
//! # Extending a driver
//!
//! Either wrap a [`TestDriver`] in your own struct (exposing it through
//! `Deref`/`DerefMut` and adding grouped helpers), or compose helper methods
//! over a shared driver with [`driver_factory`].

#![warn(missing_docs)]

mod api_mock;
mod compose;
mod config;
mod driver;
mod renderer;
mod result;
mod selector;

pub mod setup;
pub mod vdom;

pub use api_mock::{
    create_api_mock, find_api_mock, ApiMock, ApiMockRequest, ApiMockRequestBuilder,
    ApiMockResponse, Method, MockRequest, DEFAULT_STATUS,
};
pub use compose::{driver_factory, Composed, DriverFactory, SharedDriver};
pub use config::{DriverConfig, DriverHooks};
pub use driver::{create_test_driver, DriverTemplate, RenderState, TestDriver};
pub use renderer::{Environment, MountedTree, Props, RenderOptions, Renderer};
pub use result::{DriverError, DriverResult};
pub use selector::{by_data_hook, Selector, DATA_HOOK_ATTRIBUTE};

/// Prelude for convenient imports
pub mod prelude {
    pub use super::api_mock::*;
    pub use super::compose::*;
    pub use super::config::*;
    pub use super::driver::*;
    pub use super::renderer::*;
    pub use super::result::*;
    pub use super::selector::*;
    pub use super::vdom::*;
}
