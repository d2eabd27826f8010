//! TestDriver - Component Lifecycle Engine
//!
//! A driver owns one component's props, environment and API mock queue, and
//! the handle to the tree it mounts.
//!
//! # Lifecycle
//!
//! ```text
//! ┌────────────┐  render (once)  ┌──────────┐  cleanup (idempotent)  ┌──────────┐
//! │ Unrendered │ ──────────────► │ Rendered │ ─────────────────────► │ released │
//! └────────────┘                 └──────────┘                        └──────────┘
//!   given_prop / given_env / given_api_mock are valid in every state
//! ```
//!
//! `render` runs its steps in a fixed order: build the element from props,
//! wrap it using the environment, apply every queued mock, mount, then await
//! one settlement and refresh the handle. Mocks are applied before mounting
//! so network activity triggered by the mount already sees them.

use crate::api_mock::ApiMock;
use crate::config::{DriverConfig, DriverHooks};
use crate::renderer::{Environment, MountedTree, Props, RenderOptions, Renderer};
use crate::result::{DriverError, DriverResult};
use crate::selector::by_data_hook;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

/// Whether a driver has rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderState {
    /// `render` has not been called
    #[default]
    Unrendered,
    /// `render` has been called
    Rendered,
}

enum Ownership<C> {
    /// Mounted by this driver, optionally inside a document container
    Owned { container: Option<C> },
    /// Borrowed view of a tree another driver owns
    Scoped,
}

pub(crate) struct Mounted<R: Renderer> {
    handle: R::Handle,
    ownership: Ownership<R::Container>,
}

impl<R: Renderer> Mounted<R> {
    /// Refresh the cached view of the tree
    pub(crate) fn update(&mut self) {
        self.handle.update();
    }

    /// Tear the tree down according to who owns it
    pub(crate) fn release(self, renderer: &R) {
        let Self {
            mut handle,
            ownership,
        } = self;
        match ownership {
            Ownership::Scoped => {
                debug!("sub-driver released its handle");
            }
            Ownership::Owned {
                container: Some(container),
            } => {
                if let Err(err) = handle.detach() {
                    warn!(error = %err, "detach failed during cleanup");
                }
                if let Err(err) = renderer.remove_container(container) {
                    warn!(error = %err, "container removal failed during cleanup");
                }
                debug!("attached component cleaned up");
            }
            Ownership::Owned { container: None } => {
                if let Err(err) = handle.unmount() {
                    warn!(error = %err, "unmount failed during cleanup");
                }
                debug!("component cleaned up");
            }
        }
    }
}

/// Everything `render` needs, detached from the driver.
///
/// Hooks and component render functions run against this snapshot, so they
/// may freely read a driver that is shared behind a `RefCell`.
pub(crate) struct RenderPlan<R: Renderer> {
    renderer: R,
    hooks: DriverHooks<R>,
    props: Props,
    environment: Environment,
    api_mocks: Vec<ApiMock>,
    attach_to_dom: bool,
}

impl<R: Renderer> RenderPlan<R> {
    /// Build, wrap, apply mocks, and mount.
    pub(crate) fn mount(self, component: &R::Component) -> DriverResult<Mounted<R>> {
        let element = self.renderer.create_element(component, &self.props);
        let wrapped = self.hooks.wrap(&self.environment, element);

        debug!(count = self.api_mocks.len(), "applying api mocks");
        self.hooks.apply_mocks(&self.api_mocks, &self.environment);

        let container = if self.attach_to_dom {
            Some(self.renderer.create_container()?)
        } else {
            None
        };

        let handle = match self.renderer.mount(wrapped, container.as_ref()) {
            Ok(handle) => handle,
            Err(err) => {
                if let Some(container) = container {
                    if let Err(remove_err) = self.renderer.remove_container(container) {
                        warn!(error = %remove_err, "could not remove container after failed mount");
                    }
                }
                return Err(err);
            }
        };

        debug!(attach_to_dom = self.attach_to_dom, "component mounted");
        Ok(Mounted {
            handle,
            ownership: Ownership::Owned { container },
        })
    }
}

/// Mock queue and environment captured for one `apply_mocks` call
pub(crate) struct MockSnapshot<R: Renderer> {
    hooks: DriverHooks<R>,
    api_mocks: Vec<ApiMock>,
    environment: Environment,
}

impl<R: Renderer> MockSnapshot<R> {
    pub(crate) fn apply(&self) {
        debug!(count = self.api_mocks.len(), "applying api mocks");
        self.hooks.apply_mocks(&self.api_mocks, &self.environment);
    }
}

/// Stateful driver for a single component under test.
///
/// # Example
///
/// ```ignore
/// let mut driver = create_test_driver(VirtualRenderer::new(), config).create();
/// driver
///     .given_prop("text", "hello")
///     .given_api_mock(settings_mock)
///     .render(&text_component, RenderOptions::default())
///     .await?;
/// assert_eq!(driver.get_by_data_hook("content")?.text(), "hello");
/// driver.cleanup();
/// ```
pub struct TestDriver<R: Renderer> {
    renderer: R,
    hooks: DriverHooks<R>,
    props: Props,
    environment: Environment,
    api_mocks: Vec<ApiMock>,
    render_state: RenderState,
    attached_to_dom: bool,
    sub_driver: bool,
    mounted: Option<Mounted<R>>,
}

impl<R: Renderer> std::fmt::Debug for TestDriver<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestDriver")
            .field("props", &self.props)
            .field("environment", &self.environment)
            .field("api_mocks", &self.api_mocks.len())
            .field("render_state", &self.render_state)
            .field("attached_to_dom", &self.attached_to_dom)
            .field("mounted", &self.mounted.is_some())
            .field("scoped", &self.is_scoped())
            .finish()
    }
}

impl<R: Renderer> TestDriver<R> {
    /// Create a driver, seeding environment and mocks from the hooks
    #[must_use]
    pub fn new(renderer: R, hooks: DriverHooks<R>) -> Self {
        let environment = hooks.initial_environment();
        let api_mocks = hooks.default_api_mocks();
        debug!(
            environment_keys = environment.len(),
            default_mocks = api_mocks.len(),
            "driver created"
        );
        Self {
            renderer,
            hooks,
            props: Props::new(),
            environment,
            api_mocks,
            render_state: RenderState::Unrendered,
            attached_to_dom: false,
            sub_driver: false,
            mounted: None,
        }
    }

    /// Create a sub-driver over an existing handle.
    ///
    /// The sub-driver can query the handle but never tears it down, and it
    /// cannot render, not even after `cleanup` released the handle.
    #[must_use]
    pub fn scoped(renderer: R, hooks: DriverHooks<R>, handle: R::Handle) -> Self {
        let mut driver = Self::new(renderer, hooks);
        driver.sub_driver = true;
        driver.mounted = Some(Mounted {
            handle,
            ownership: Ownership::Scoped,
        });
        driver
    }

    /// Set a prop
    pub fn given_prop(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        let key = key.into();
        if self.is_rendered() {
            debug!(%key, "prop set after render; mounted tree is not re-rendered");
        }
        let _ = self.props.insert(key, value.into());
        self
    }

    /// Current value of a prop
    #[must_use]
    pub fn get_prop(&self, key: &str) -> Option<&Value> {
        self.props.get(key)
    }

    /// Current value of a prop, deserialized
    pub fn get_prop_as<T: DeserializeOwned>(&self, key: &str) -> DriverResult<Option<T>> {
        read_as(self.props.get(key))
    }

    /// Set an environment entry
    pub fn given_env(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        let _ = self.environment.insert(key.into(), value.into());
        self
    }

    /// Current value of an environment entry
    #[must_use]
    pub fn get_env(&self, key: &str) -> Option<&Value> {
        self.environment.get(key)
    }

    /// Current value of an environment entry, deserialized
    pub fn get_env_as<T: DeserializeOwned>(&self, key: &str) -> DriverResult<Option<T>> {
        read_as(self.environment.get(key))
    }

    /// Queue an API mock.
    ///
    /// After render the full queue is applied again right away, so the new
    /// mock takes effect without another render.
    pub fn given_api_mock(&mut self, mock: ApiMock) -> &mut Self {
        if self.queue_api_mock(mock) {
            self.apply_api_mocks();
        }
        self
    }

    /// Append a mock; returns whether the queue must be re-applied now.
    pub(crate) fn queue_api_mock(&mut self, mock: ApiMock) -> bool {
        debug!(method = %mock.method, url = %mock.url, "api mock queued");
        self.api_mocks.push(mock);
        self.is_rendered()
    }

    /// Apply the full mock queue through the `apply_mocks` hook
    pub fn apply_api_mocks(&mut self) -> &mut Self {
        self.mock_snapshot().apply();
        self
    }

    pub(crate) fn mock_snapshot(&self) -> MockSnapshot<R> {
        MockSnapshot {
            hooks: self.hooks.clone(),
            api_mocks: self.api_mocks.clone(),
            environment: self.environment.clone(),
        }
    }

    /// Render a component with the current props.
    ///
    /// # Errors
    ///
    /// - [`DriverError::AlreadyRendered`] on a second call
    /// - [`DriverError::ScopedRender`] on a sub-driver
    /// - any error the renderer reports while mounting
    pub async fn render(
        &mut self,
        component: &R::Component,
        options: RenderOptions,
    ) -> DriverResult<&mut Self> {
        let plan = self.begin_render(options)?;
        self.mounted = Some(plan.mount(component)?);
        self.renderer.settle().await;
        self.refresh()?;
        Ok(self)
    }

    /// Check that rendering is allowed, mark the driver rendered, and capture
    /// what the mount needs.
    ///
    /// A failed mount afterwards still leaves the driver rendered.
    pub(crate) fn begin_render(&mut self, options: RenderOptions) -> DriverResult<RenderPlan<R>> {
        if self.is_rendered() {
            return Err(DriverError::AlreadyRendered);
        }
        if self.sub_driver {
            return Err(DriverError::ScopedRender);
        }

        self.render_state = RenderState::Rendered;
        self.attached_to_dom = options.attach_to_dom;

        Ok(RenderPlan {
            renderer: self.renderer.clone(),
            hooks: self.hooks.clone(),
            props: self.props.clone(),
            environment: self.environment.clone(),
            api_mocks: self.api_mocks.clone(),
            attach_to_dom: options.attach_to_dom,
        })
    }

    /// Install the result of a successful mount
    pub(crate) fn set_mounted(&mut self, mounted: Mounted<R>) {
        self.mounted = Some(mounted);
    }

    /// Take the mounted tree out of the driver, leaving no handle behind
    pub(crate) fn take_mounted(&mut self) -> Option<Mounted<R>> {
        self.mounted.take()
    }

    /// Refresh the cached view of the mounted tree without settling.
    pub(crate) fn refresh(&mut self) -> DriverResult<()> {
        self.mounted
            .as_mut()
            .ok_or(DriverError::NotMounted { operation: "update" })?
            .update();
        Ok(())
    }

    /// Handle over elements tagged with a semantic hook
    pub fn get_by_data_hook(&self, hook: &str) -> DriverResult<R::Handle> {
        let handle = self.handle_for("query")?;
        Ok(self.get_by_data_hook_in(hook, handle))
    }

    /// Handle over elements tagged with a semantic hook inside a scope
    pub fn get_by_data_hook_in(&self, hook: &str, scope: &R::Handle) -> R::Handle {
        scope.find(&by_data_hook(hook))
    }

    /// Whether the handle resolves to at least one element
    pub fn exists(&self) -> DriverResult<bool> {
        Ok(self.handle_for("check existence")?.exists())
    }

    /// Await one settlement, then refresh the cached view.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::NotMounted`] if there is no handle.
    pub async fn update(&mut self) -> DriverResult<&mut Self> {
        let _ = self.handle_for("update")?;
        self.renderer.settle().await;
        self.refresh()?;
        Ok(self)
    }

    /// Tear down the mounted tree.
    ///
    /// Safe to call any number of times, and before render. Sub-drivers
    /// release their borrowed handle without tearing it down. Teardown
    /// failures are logged and otherwise ignored.
    pub fn cleanup(&mut self) -> &mut Self {
        if let Some(mounted) = self.mounted.take() {
            mounted.release(&self.renderer);
        }
        self
    }

    /// The mounted handle, if any
    #[must_use]
    pub fn handle(&self) -> Option<&R::Handle> {
        self.mounted.as_ref().map(|m| &m.handle)
    }

    /// Current props
    #[must_use]
    pub const fn props(&self) -> &Props {
        &self.props
    }

    /// Current environment
    #[must_use]
    pub const fn environment(&self) -> &Environment {
        &self.environment
    }

    /// Every mock queued so far, in order
    #[must_use]
    pub fn api_mocks(&self) -> &[ApiMock] {
        &self.api_mocks
    }

    /// Render state
    #[must_use]
    pub const fn render_state(&self) -> RenderState {
        self.render_state
    }

    /// Whether `render` has been called
    #[must_use]
    pub fn is_rendered(&self) -> bool {
        self.render_state == RenderState::Rendered
    }

    /// Whether the render attached to the document
    #[must_use]
    pub const fn is_attached_to_dom(&self) -> bool {
        self.attached_to_dom
    }

    /// Whether this is a sub-driver over a borrowed handle
    #[must_use]
    pub const fn is_scoped(&self) -> bool {
        self.sub_driver
    }

    /// The renderer
    #[must_use]
    pub const fn renderer(&self) -> &R {
        &self.renderer
    }

    /// The resolved hooks
    #[must_use]
    pub const fn hooks(&self) -> &DriverHooks<R> {
        &self.hooks
    }

    fn handle_for(&self, operation: &'static str) -> DriverResult<&R::Handle> {
        self.handle().ok_or(DriverError::NotMounted { operation })
    }
}

fn read_as<T: DeserializeOwned>(value: Option<&Value>) -> DriverResult<Option<T>> {
    value
        .map(|v| serde_json::from_value(v.clone()))
        .transpose()
        .map_err(DriverError::from)
}

/// A renderer paired with resolved hooks, stamping out drivers.
pub struct DriverTemplate<R: Renderer> {
    renderer: R,
    hooks: DriverHooks<R>,
}

impl<R: Renderer> Clone for DriverTemplate<R> {
    fn clone(&self) -> Self {
        Self {
            renderer: self.renderer.clone(),
            hooks: self.hooks.clone(),
        }
    }
}

impl<R: Renderer> std::fmt::Debug for DriverTemplate<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriverTemplate")
            .field("hooks", &self.hooks)
            .finish_non_exhaustive()
    }
}

impl<R: Renderer> DriverTemplate<R> {
    /// New driver with fresh state
    #[must_use]
    pub fn create(&self) -> TestDriver<R> {
        TestDriver::new(self.renderer.clone(), self.hooks.clone())
    }

    /// New sub-driver over an existing handle
    #[must_use]
    pub fn sub_driver(&self, handle: R::Handle) -> TestDriver<R> {
        TestDriver::scoped(self.renderer.clone(), self.hooks.clone(), handle)
    }

    /// The resolved hooks
    #[must_use]
    pub const fn hooks(&self) -> &DriverHooks<R> {
        &self.hooks
    }

    /// The renderer
    #[must_use]
    pub const fn renderer(&self) -> &R {
        &self.renderer
    }
}

/// Resolve a configuration once and pair it with a renderer
#[must_use]
pub fn create_test_driver<R: Renderer>(
    renderer: R,
    config: impl Into<DriverHooks<R>>,
) -> DriverTemplate<R> {
    DriverTemplate {
        renderer,
        hooks: config.into(),
    }
}

impl<R: Renderer + Default> Default for DriverTemplate<R> {
    fn default() -> Self {
        create_test_driver(R::default(), DriverConfig::new())
    }
}
