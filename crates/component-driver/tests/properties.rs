//! Property tests for driver state.

use component_driver::prelude::*;
use proptest::prelude::*;
use serde_json::Value;
use std::collections::HashMap;

fn mock(url: &str) -> ApiMock {
    create_api_mock(ApiMockRequest::get(format!("/api/{url}")))
        .reply_with(ApiMockResponse::new(url))
        .unwrap()
}

proptest! {
    #[test]
    fn prop_props_last_write_wins(
        writes in prop::collection::vec(("[a-d]", any::<i64>()), 0..32)
    ) {
        let mut driver = DriverTemplate::<VirtualRenderer>::default().create();
        let mut expected = HashMap::new();
        for (key, value) in &writes {
            driver.given_prop(key.clone(), *value);
            expected.insert(key.clone(), *value);
        }

        prop_assert_eq!(driver.props().len(), expected.len());
        for (key, value) in &expected {
            prop_assert_eq!(driver.get_prop(key), Some(&Value::from(*value)));
        }
    }

    #[test]
    fn prop_env_last_write_wins(
        writes in prop::collection::vec(("[a-d]", "[a-z]{0,8}"), 1..32)
    ) {
        let mut driver = DriverTemplate::<VirtualRenderer>::default().create();
        for (key, value) in &writes {
            driver.given_env(key.clone(), value.clone());
        }

        let (last_key, last_value) = writes.last().unwrap();
        let env_value = driver.get_env_as::<String>(last_key).unwrap();
        prop_assert_eq!(
            env_value.as_ref(),
            Some(last_value)
        );
    }

    #[test]
    fn prop_api_mocks_only_grow(
        urls in prop::collection::vec("[a-z]{1,6}", 0..16),
        render_after in 0usize..16
    ) {
        let mut driver = DriverTemplate::<VirtualRenderer>::default().create();
        let child = Component::new("Child", |_| Element::host("div"));
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();

        let mut previous = 0;
        for (i, url) in urls.iter().enumerate() {
            if i == render_after {
                runtime
                    .block_on(driver.render(&child, RenderOptions::default()))
                    .unwrap();
            }
            driver.given_api_mock(mock(url));
            prop_assert_eq!(driver.api_mocks().len(), previous + 1);
            prop_assert_eq!(driver.api_mocks().last(), Some(&mock(url)));
            previous += 1;
        }
        driver.cleanup();
        prop_assert_eq!(driver.api_mocks().len(), urls.len());
    }

    #[test]
    fn prop_latest_matching_mock_wins(statuses in prop::collection::vec(200u16..600, 1..8)) {
        let mocks: Vec<ApiMock> = statuses
            .iter()
            .map(|status| {
                create_api_mock(ApiMockRequest::get("/api/settings"))
                    .reply_with(ApiMockResponse::new("ok").status(*status))
                    .unwrap()
            })
            .collect();

        let found = find_api_mock(&mocks, &MockRequest::new(Method::Get, "/api/settings"));
        prop_assert_eq!(found.map(|m| m.status), statuses.last().copied());
    }
}
