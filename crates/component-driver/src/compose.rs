//! Driver Composition
//!
//! Build a consumer-specific driver API on top of a [`TestDriver`] without
//! extending it.
//!
//! A consumer factory receives a [`SharedDriver`] and returns whatever set
//! of methods it likes. [`DriverFactory::compose`] creates exactly one
//! driver, hands it to the factory, and returns the methods together with a
//! back-reference to that same driver:
//!
//! ```ignore
//! struct LoginDriver {
//!     driver: SharedDriver<VirtualRenderer>,
//! }
//!
//! impl LoginDriver {
//!     fn given_user(&self, name: &str) -> &Self {
//!         self.driver.given_prop("user", name);
//!         self
//!     }
//!
//!     fn greeting(&self) -> DriverResult<String> {
//!         Ok(self.driver.get_by_data_hook("greeting")?.text())
//!     }
//! }
//!
//! let login = driver_factory(template).compose(|driver| LoginDriver { driver });
//! login.given_user("ada");
//! login.driver.render(&login_form, RenderOptions::default()).await?;
//! assert_eq!(login.greeting()?, "Hello ada");
//! login.driver.cleanup();
//! ```

use crate::api_mock::ApiMock;
use crate::driver::{DriverTemplate, TestDriver};
use crate::renderer::{MountedTree, RenderOptions, Renderer};
use crate::result::{DriverError, DriverResult};
use serde_json::Value;
use std::cell::RefCell;
use std::ops::Deref;
use std::rc::Rc;

/// A driver shared between consumer methods and the composed back-reference.
///
/// Borrows of the inner driver never outlive a single call. No borrow is
/// held while hooks, component render functions, mount effects or unmount
/// notifications run, so any of them may read the driver through a clone of
/// this handle.
pub struct SharedDriver<R: Renderer> {
    inner: Rc<RefCell<TestDriver<R>>>,
}

impl<R: Renderer> Clone for SharedDriver<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<R: Renderer> std::fmt::Debug for SharedDriver<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.inner.try_borrow() {
            Ok(driver) => f.debug_tuple("SharedDriver").field(&*driver).finish(),
            Err(_) => f.write_str("SharedDriver(<borrowed>)"),
        }
    }
}

impl<R: Renderer> SharedDriver<R> {
    /// Share a driver
    #[must_use]
    pub fn new(driver: TestDriver<R>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(driver)),
        }
    }

    /// Whether two handles share the same driver
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Read the driver
    pub fn with<T>(&self, f: impl FnOnce(&TestDriver<R>) -> T) -> T {
        f(&self.inner.borrow())
    }

    /// Mutate the driver
    pub fn with_mut<T>(&self, f: impl FnOnce(&mut TestDriver<R>) -> T) -> T {
        f(&mut self.inner.borrow_mut())
    }

    /// Set a prop
    pub fn given_prop(&self, key: impl Into<String>, value: impl Into<Value>) -> &Self {
        self.inner.borrow_mut().given_prop(key, value);
        self
    }

    /// Current value of a prop
    #[must_use]
    pub fn get_prop(&self, key: &str) -> Option<Value> {
        self.inner.borrow().get_prop(key).cloned()
    }

    /// Set an environment entry
    pub fn given_env(&self, key: impl Into<String>, value: impl Into<Value>) -> &Self {
        self.inner.borrow_mut().given_env(key, value);
        self
    }

    /// Current value of an environment entry
    #[must_use]
    pub fn get_env(&self, key: &str) -> Option<Value> {
        self.inner.borrow().get_env(key).cloned()
    }

    /// Queue an API mock; re-applies the queue when already rendered
    pub fn given_api_mock(&self, mock: ApiMock) -> &Self {
        let reapply = self.inner.borrow_mut().queue_api_mock(mock);
        if reapply {
            self.apply_api_mocks();
        }
        self
    }

    /// Apply the full mock queue
    pub fn apply_api_mocks(&self) -> &Self {
        let snapshot = self.inner.borrow().mock_snapshot();
        snapshot.apply();
        self
    }

    /// Render a component; see [`TestDriver::render`]
    pub async fn render(
        &self,
        component: &R::Component,
        options: RenderOptions,
    ) -> DriverResult<&Self> {
        let plan = self.inner.borrow_mut().begin_render(options)?;
        let mounted = plan.mount(component)?;
        self.inner.borrow_mut().set_mounted(mounted);
        self.settle_and_refresh().await?;
        Ok(self)
    }

    /// Settle and refresh; see [`TestDriver::update`]
    pub async fn update(&self) -> DriverResult<&Self> {
        if self.inner.borrow().handle().is_none() {
            return Err(DriverError::NotMounted { operation: "update" });
        }
        self.settle_and_refresh().await?;
        Ok(self)
    }

    async fn settle_and_refresh(&self) -> DriverResult<()> {
        let renderer = self.inner.borrow().renderer().clone();
        renderer.settle().await;

        // Re-rendering runs component code, so update outside the borrow.
        let mounted = self.inner.borrow_mut().take_mounted();
        let mut mounted = mounted.ok_or(DriverError::NotMounted { operation: "update" })?;
        mounted.update();
        self.inner.borrow_mut().set_mounted(mounted);
        Ok(())
    }

    /// Handle over elements tagged with a semantic hook
    pub fn get_by_data_hook(&self, hook: &str) -> DriverResult<R::Handle> {
        self.inner.borrow().get_by_data_hook(hook)
    }

    /// Whether the handle resolves to at least one element
    pub fn exists(&self) -> DriverResult<bool> {
        self.inner.borrow().exists()
    }

    /// Whether `render` has been called
    #[must_use]
    pub fn is_rendered(&self) -> bool {
        self.inner.borrow().is_rendered()
    }

    /// Number of queued mocks
    #[must_use]
    pub fn api_mock_count(&self) -> usize {
        self.inner.borrow().api_mocks().len()
    }

    /// Tear down; see [`TestDriver::cleanup`]
    pub fn cleanup(&self) -> &Self {
        let (renderer, mounted) = {
            let mut driver = self.inner.borrow_mut();
            (driver.renderer().clone(), driver.take_mounted())
        };
        if let Some(mounted) = mounted {
            mounted.release(&renderer);
        }
        self
    }

    /// Clone of the mounted handle, if any
    #[must_use]
    pub fn handle(&self) -> Option<R::Handle>
    where
        R::Handle: Clone,
    {
        self.inner.borrow().handle().cloned()
    }

    /// Whether the mounted handle still resolves to anything
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.inner
            .borrow()
            .handle()
            .is_some_and(MountedTree::exists)
    }
}

/// Consumer methods composed over one driver.
///
/// Dereferences to the methods; `driver` is the back-reference to the
/// underlying driver's full lifecycle.
pub struct Composed<M, R: Renderer> {
    methods: M,
    /// The driver the methods were built over
    pub driver: SharedDriver<R>,
}

impl<M, R: Renderer> Deref for Composed<M, R> {
    type Target = M;

    fn deref(&self) -> &M {
        &self.methods
    }
}

impl<M: std::fmt::Debug, R: Renderer> std::fmt::Debug for Composed<M, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Composed")
            .field("methods", &self.methods)
            .field("driver", &self.driver)
            .finish()
    }
}

impl<M, R: Renderer> Composed<M, R> {
    /// Split into methods and driver
    pub fn into_parts(self) -> (M, SharedDriver<R>) {
        (self.methods, self.driver)
    }
}

/// Composes consumer method sets over drivers from one template.
///
/// Every [`compose`](Self::compose) call builds a fresh driver, so two
/// composed values never share state. Consumers that want several method
/// sets over one driver clone the [`SharedDriver`] they are handed inside a
/// single `compose` call.
pub struct DriverFactory<R: Renderer> {
    template: DriverTemplate<R>,
}

impl<R: Renderer> std::fmt::Debug for DriverFactory<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriverFactory")
            .field("template", &self.template)
            .finish()
    }
}

impl<R: Renderer + Default> Default for DriverFactory<R> {
    fn default() -> Self {
        driver_factory(DriverTemplate::default())
    }
}

impl<R: Renderer> DriverFactory<R> {
    /// Create one driver and build the consumer's methods over it
    pub fn compose<M, F>(&self, consumer: F) -> Composed<M, R>
    where
        F: FnOnce(SharedDriver<R>) -> M,
    {
        let driver = SharedDriver::new(self.template.create());
        let methods = consumer(driver.clone());
        Composed { methods, driver }
    }
}

/// Factory composing consumer drivers over `template`
#[must_use]
pub fn driver_factory<R: Renderer>(template: DriverTemplate<R>) -> DriverFactory<R> {
    DriverFactory { template }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DriverConfig;
    use crate::driver::create_test_driver;
    use crate::vdom::{Component, Element, VirtualRenderer};
    use serde_json::json;

    fn content() -> Component {
        Component::new("Content", |props| {
            Element::host("div").child(
                Element::host("span")
                    .data_hook("content")
                    .child(Element::text(
                        props.get("text").and_then(Value::as_str).unwrap_or(""),
                    )),
            )
        })
    }

    struct ContentDriver {
        driver: SharedDriver<VirtualRenderer>,
    }

    impl ContentDriver {
        fn given_text(&self, text: &str) -> &Self {
            self.driver.given_prop("text", text);
            self
        }

        async fn created(&self) -> DriverResult<()> {
            self.driver
                .render(&content(), RenderOptions::default())
                .await?;
            Ok(())
        }

        fn content(&self) -> DriverResult<String> {
            Ok(self.driver.get_by_data_hook("content")?.text())
        }
    }

    #[tokio::test]
    async fn test_compose_methods_and_back_reference() {
        let factory = DriverFactory::<VirtualRenderer>::default();
        let composed = factory.compose(|driver| ContentDriver { driver });

        composed.given_text("hello world");
        composed.created().await.unwrap();

        assert_eq!(composed.content().unwrap(), "hello world");
        assert!(composed.driver.is_rendered());
        assert_eq!(composed.driver.get_prop("text"), Some(json!("hello world")));
        assert!(composed.driver.ptr_eq(&composed.methods.driver));
    }

    #[tokio::test]
    async fn test_each_compose_gets_its_own_driver() {
        let factory = driver_factory(create_test_driver(
            VirtualRenderer::new(),
            DriverConfig::new(),
        ));
        let a = factory.compose(|driver| ContentDriver { driver });
        let b = factory.compose(|driver| ContentDriver { driver });

        a.given_text("a");
        assert!(!a.driver.ptr_eq(&b.driver));
        assert!(b.driver.get_prop("text").is_none());
    }

    #[tokio::test]
    async fn test_lifecycle_through_back_reference() {
        let composed = DriverFactory::<VirtualRenderer>::default().compose(|driver| driver);

        assert!(composed.driver.exists().is_err());
        composed
            .driver
            .given_prop("text", "x")
            .render(&content(), RenderOptions::default())
            .await
            .unwrap();
        assert!(composed.driver.is_live());

        let err = composed
            .driver
            .render(&content(), RenderOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DriverError::AlreadyRendered));

        composed.driver.update().await.unwrap();
        composed.driver.cleanup().cleanup();
        assert!(!composed.driver.is_live());
    }

    #[tokio::test]
    async fn test_component_reads_shared_driver_while_rendering() {
        let composed = DriverFactory::<VirtualRenderer>::default().compose(|driver| driver);
        let reader = composed.driver.clone();
        let titled = Component::new("Titled", move |_| {
            let title = reader.get_env("title");
            Element::host("h1")
                .data_hook("title")
                .child(Element::text(
                    title.as_ref().and_then(Value::as_str).unwrap_or("untitled"),
                ))
        });

        composed.driver.given_env("title", "Shared");
        composed
            .driver
            .render(&titled, RenderOptions::default())
            .await
            .unwrap();
        assert_eq!(
            composed.driver.get_by_data_hook("title").unwrap().text(),
            "Shared"
        );

        composed.driver.update().await.unwrap();
        composed.driver.cleanup();
        assert!(!composed.driver.is_live());
    }

    #[tokio::test]
    async fn test_hooks_and_callbacks_read_shared_driver() {
        let slot: Rc<RefCell<Option<SharedDriver<VirtualRenderer>>>> = Rc::default();
        let seen = Rc::new(RefCell::new(Vec::<usize>::new()));

        let wrap_slot = Rc::clone(&slot);
        let mock_slot = Rc::clone(&slot);
        let mock_seen = Rc::clone(&seen);
        let template = create_test_driver(
            VirtualRenderer::new(),
            DriverConfig::new()
                .wrap_with(move |_, element| {
                    let rendered = wrap_slot
                        .borrow()
                        .as_ref()
                        .is_some_and(SharedDriver::is_rendered);
                    Element::host("main")
                        .attr("data-rendered", rendered.to_string())
                        .child(element)
                })
                .apply_mocks(move |_, _| {
                    if let Some(driver) = mock_slot.borrow().as_ref() {
                        mock_seen.borrow_mut().push(driver.api_mock_count());
                    }
                }),
        );
        let composed = driver_factory(template).compose(|driver| driver);
        *slot.borrow_mut() = Some(composed.driver.clone());

        let unmount_reader = composed.driver.clone();
        let unmounted_with = Rc::new(RefCell::new(None));
        let unmount_sink = Rc::clone(&unmounted_with);
        let comp = content().on_unmount(move || {
            *unmount_sink.borrow_mut() = unmount_reader.get_prop("text");
        });

        composed.driver.given_prop("text", "x");
        composed
            .driver
            .render(&comp, RenderOptions::default())
            .await
            .unwrap();
        composed.driver.given_api_mock(
            crate::api_mock::create_api_mock(crate::api_mock::ApiMockRequest::get("/a"))
                .reply_with(crate::api_mock::ApiMockResponse::new("ok"))
                .unwrap(),
        );
        composed.driver.cleanup();

        assert_eq!(*seen.borrow(), vec![0, 1]);
        assert_eq!(*unmounted_with.borrow(), Some(json!("x")));
        *slot.borrow_mut() = None;
    }

    #[test]
    fn test_with_mut_reaches_driver() {
        let composed = DriverFactory::<VirtualRenderer>::default().compose(|_| ());
        composed.driver.with_mut(|d| {
            d.given_env("theme", "dark");
        });
        assert_eq!(
            composed.driver.with(|d| d.get_env("theme").cloned()),
            Some(json!("dark"))
        );
        let ((), driver) = composed.into_parts();
        assert_eq!(driver.api_mock_count(), 0);
    }
}
