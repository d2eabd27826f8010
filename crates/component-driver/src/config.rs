//! Driver Configuration
//!
//! A [`DriverConfig`] carries up to four caller-supplied hooks. Resolving it
//! fills every missing hook with its default and yields [`DriverHooks`], the
//! strategy object a driver consults for its whole lifetime.
//!
//! | Hook | Default |
//! |------|---------|
//! | `wrap_with(env, element)` | returns `element` unchanged |
//! | `initial_environment()` | empty environment |
//! | `default_api_mocks()` | no mocks |
//! | `apply_mocks(mocks, env)` | does nothing |

use crate::api_mock::ApiMock;
use crate::renderer::{Environment, Renderer};
use std::rc::Rc;

type WrapFn<R> = Rc<dyn Fn(&Environment, <R as Renderer>::Element) -> <R as Renderer>::Element>;
type InitialEnvironmentFn = Rc<dyn Fn() -> Environment>;
type DefaultApiMocksFn = Rc<dyn Fn() -> Vec<ApiMock>>;
type ApplyMocksFn = Rc<dyn Fn(&[ApiMock], &Environment)>;

/// Partial driver configuration.
///
/// # Example
///
/// ```ignore
/// let hooks = DriverConfig::<VirtualRenderer>::new()
///     .initial_environment(|| env_from([("headerText", "Header!")]))
///     .wrap_with(|env, element| Element::host("main").child(element))
///     .resolve();
/// ```
pub struct DriverConfig<R: Renderer> {
    wrap_with: Option<WrapFn<R>>,
    initial_environment: Option<InitialEnvironmentFn>,
    default_api_mocks: Option<DefaultApiMocksFn>,
    apply_mocks: Option<ApplyMocksFn>,
}

impl<R: Renderer> Default for DriverConfig<R> {
    fn default() -> Self {
        Self {
            wrap_with: None,
            initial_environment: None,
            default_api_mocks: None,
            apply_mocks: None,
        }
    }
}

impl<R: Renderer> std::fmt::Debug for DriverConfig<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriverConfig")
            .field("wrap_with", &self.wrap_with.is_some())
            .field("initial_environment", &self.initial_environment.is_some())
            .field("default_api_mocks", &self.default_api_mocks.is_some())
            .field("apply_mocks", &self.apply_mocks.is_some())
            .finish()
    }
}

impl<R: Renderer> DriverConfig<R> {
    /// Create an empty configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap the component in ambient structure built from the environment
    #[must_use]
    pub fn wrap_with<F>(mut self, wrap: F) -> Self
    where
        F: Fn(&Environment, R::Element) -> R::Element + 'static,
    {
        self.wrap_with = Some(Rc::new(wrap));
        self
    }

    /// Seed each driver's environment
    #[must_use]
    pub fn initial_environment<F>(mut self, init: F) -> Self
    where
        F: Fn() -> Environment + 'static,
    {
        self.initial_environment = Some(Rc::new(init));
        self
    }

    /// Seed each driver's mock queue
    #[must_use]
    pub fn default_api_mocks<F>(mut self, mocks: F) -> Self
    where
        F: Fn() -> Vec<ApiMock> + 'static,
    {
        self.default_api_mocks = Some(Rc::new(mocks));
        self
    }

    /// Install queued mocks into whatever intercepts network calls
    #[must_use]
    pub fn apply_mocks<F>(mut self, apply: F) -> Self
    where
        F: Fn(&[ApiMock], &Environment) + 'static,
    {
        self.apply_mocks = Some(Rc::new(apply));
        self
    }

    /// Merge with the defaults into a total set of hooks
    #[must_use]
    pub fn resolve(self) -> DriverHooks<R> {
        DriverHooks {
            wrap_with: self.wrap_with.unwrap_or_else(identity_wrap::<R>),
            initial_environment: self.initial_environment.unwrap_or_else(empty_environment),
            default_api_mocks: self.default_api_mocks.unwrap_or_else(no_api_mocks),
            apply_mocks: self.apply_mocks.unwrap_or_else(skip_apply_mocks),
        }
    }
}

fn identity_wrap<R: Renderer>() -> WrapFn<R> {
    Rc::new(|_env: &Environment, element: R::Element| element)
}

fn empty_environment() -> InitialEnvironmentFn {
    Rc::new(Environment::new)
}

fn no_api_mocks() -> DefaultApiMocksFn {
    Rc::new(Vec::<ApiMock>::new)
}

fn skip_apply_mocks() -> ApplyMocksFn {
    Rc::new(|_mocks: &[ApiMock], _env: &Environment| {})
}

/// Resolved driver hooks; every hook is always callable.
pub struct DriverHooks<R: Renderer> {
    wrap_with: WrapFn<R>,
    initial_environment: InitialEnvironmentFn,
    default_api_mocks: DefaultApiMocksFn,
    apply_mocks: ApplyMocksFn,
}

impl<R: Renderer> Clone for DriverHooks<R> {
    fn clone(&self) -> Self {
        Self {
            wrap_with: Rc::clone(&self.wrap_with),
            initial_environment: Rc::clone(&self.initial_environment),
            default_api_mocks: Rc::clone(&self.default_api_mocks),
            apply_mocks: Rc::clone(&self.apply_mocks),
        }
    }
}

impl<R: Renderer> Default for DriverHooks<R> {
    fn default() -> Self {
        DriverConfig::new().resolve()
    }
}

impl<R: Renderer> std::fmt::Debug for DriverHooks<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriverHooks").finish_non_exhaustive()
    }
}

impl<R: Renderer> From<DriverConfig<R>> for DriverHooks<R> {
    fn from(config: DriverConfig<R>) -> Self {
        config.resolve()
    }
}

impl<R: Renderer> DriverHooks<R> {
    /// Wrap an element using the environment
    pub fn wrap(&self, environment: &Environment, element: R::Element) -> R::Element {
        (self.wrap_with)(environment, element)
    }

    /// Fresh initial environment
    pub fn initial_environment(&self) -> Environment {
        (self.initial_environment)()
    }

    /// Fresh default mock list
    pub fn default_api_mocks(&self) -> Vec<ApiMock> {
        (self.default_api_mocks)()
    }

    /// Apply the full mock list
    pub fn apply_mocks(&self, mocks: &[ApiMock], environment: &Environment) {
        (self.apply_mocks)(mocks, environment);
    }
}
