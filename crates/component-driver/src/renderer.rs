//! Renderer - Abstract Mounting Seam
//!
//! The driver never renders anything itself. It builds an element, hands it
//! to a [`Renderer`], and keeps the returned [`MountedTree`] handle.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  TestDriver<R: Renderer>                                      │
//! ├──────────────────────────────────────────────────────────────┤
//! │   create_element ─► wrap_with ─► apply_mocks ─► mount ─► settle │
//! │                                                     │          │
//! │                                             R::Handle (owned)  │
//! │                                     find / exists / update     │
//! │                                     unmount / detach           │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Implementations:
//!
//! - [`crate::vdom::VirtualRenderer`] - in-memory tree for unit tests

use crate::result::DriverResult;
use crate::selector::Selector;
use async_trait::async_trait;
use serde_json::{Map, Value};

/// Property bag handed to a component
pub type Props = Map<String, Value>;

/// Ambient data injected around a component
pub type Environment = Map<String, Value>;

/// Handle to a mounted tree, or to a scoped view of one.
pub trait MountedTree: Sized {
    /// Whether the handle resolves to at least one element
    fn exists(&self) -> bool;

    /// Scoped handle over descendants matching a selector
    fn find(&self, selector: &Selector) -> Self;

    /// Refresh the cached view after the tree changed
    fn update(&mut self);

    /// Tear down a tree that was not attached to the document
    fn unmount(&mut self) -> DriverResult<()>;

    /// Tear down a tree attached to the document, leaving its container
    fn detach(&mut self) -> DriverResult<()>;
}

/// Mount primitive plus the settlement primitive of a rendering engine.
///
/// Single-threaded: futures are not required to be `Send`.
#[async_trait(?Send)]
pub trait Renderer: Clone {
    /// Renderable unit accepting a property bag
    type Component;
    /// Description of what to mount
    type Element;
    /// Attachment point inside the document
    type Container;
    /// Handle returned by `mount`
    type Handle: MountedTree;

    /// Build an element from a component and its props
    fn create_element(&self, component: &Self::Component, props: &Props) -> Self::Element;

    /// Append a fresh container to the document root
    fn create_container(&self) -> DriverResult<Self::Container>;

    /// Remove a container from the document root
    fn remove_container(&self, container: Self::Container) -> DriverResult<()>;

    /// Mount an element, detached or inside a container
    fn mount(
        &self,
        element: Self::Element,
        attach_to: Option<&Self::Container>,
    ) -> DriverResult<Self::Handle>;

    /// Yield until one pass of pending scheduled work has completed
    async fn settle(&self);
}

/// Options for a single render
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderOptions {
    /// Mount inside a live container appended to the document root
    pub attach_to_dom: bool,
}

impl RenderOptions {
    /// Create options with defaults (detached)
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach to the document
    #[must_use]
    pub const fn attach_to_dom(mut self, attach: bool) -> Self {
        self.attach_to_dom = attach;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_options_default_detached() {
        assert!(!RenderOptions::default().attach_to_dom);
        assert!(RenderOptions::new().attach_to_dom(true).attach_to_dom);
    }
}
