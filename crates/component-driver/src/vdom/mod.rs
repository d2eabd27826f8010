//! Virtual Renderer
//!
//! An in-memory implementation of [`Renderer`](crate::Renderer) for driving
//! components in unit tests without a real UI engine.
//!
//! - [`Element`]: host tags, text, and component elements
//! - [`Component`]: render function plus `on_mount` / `on_unmount`
//! - [`VirtualDocument`]: a body of mount containers
//! - [`VirtualRenderer`] / [`VirtualHandle`]: mount, query, tear down
//!
//! Updates re-render the whole tree from its root element; there is no
//! diffing.
//!
//! ## Example
//!
//! ```rust,ignore
//! let child = Component::new("Child", |_| {
//!     Element::host("span").data_hook("child").child("Child".into())
//! });
//! let mut driver = TestDriver::new(VirtualRenderer::new(), DriverHooks::default());
//! driver.render(&child, RenderOptions::default()).await?;
//! assert_eq!(driver.get_by_data_hook("child")?.text(), "Child");
//! ```

mod document;
mod element;
mod mount;

pub use document::{VirtualContainer, VirtualDocument};
pub use element::{Component, ComponentElement, Element, HostElement};
pub use mount::{RenderedNode, VirtualHandle, VirtualRenderer};
