//! Elements and components of the virtual tree.

use crate::renderer::Props;
use std::collections::BTreeMap;
use std::rc::Rc;

type RenderFn = Rc<dyn Fn(&Props) -> Element>;
type MountFn = Rc<dyn Fn(&Props)>;
type UnmountFn = Rc<dyn Fn()>;

/// Description of what to mount
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    /// Plain tag with attributes and children
    Host(HostElement),
    /// Text node
    Text(String),
    /// Component instantiated with props
    Component(ComponentElement),
}

/// Tag with attributes and children
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HostElement {
    /// Tag name
    pub tag: String,
    /// Attributes, ordered by name
    pub attributes: BTreeMap<String, String>,
    /// Child elements
    pub children: Vec<Element>,
}

/// Component paired with the props it renders with
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentElement {
    /// Component to render
    pub component: Component,
    /// Props handed to the component
    pub props: Props,
}

impl Element {
    /// Host element with no attributes or children
    #[must_use]
    pub fn host(tag: impl Into<String>) -> Self {
        Self::Host(HostElement {
            tag: tag.into(),
            ..HostElement::default()
        })
    }

    /// Text node
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Component element
    #[must_use]
    pub fn component(component: &Component, props: Props) -> Self {
        Self::Component(ComponentElement {
            component: component.clone(),
            props,
        })
    }

    /// Set an attribute. Only host elements carry attributes.
    #[must_use]
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        if let Self::Host(host) = &mut self {
            let _ = host.attributes.insert(name.into(), value.into());
        }
        self
    }

    /// Set the `data-hook` attribute
    #[must_use]
    pub fn data_hook(self, hook: impl Into<String>) -> Self {
        self.attr(crate::selector::DATA_HOOK_ATTRIBUTE, hook)
    }

    /// Append a child. Only host elements carry children.
    #[must_use]
    pub fn child(mut self, child: Element) -> Self {
        if let Self::Host(host) = &mut self {
            host.children.push(child);
        }
        self
    }
}

impl From<&str> for Element {
    fn from(text: &str) -> Self {
        Self::text(text)
    }
}

impl From<String> for Element {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

/// Renderable unit: a render function plus lifecycle notifications.
///
/// `on_mount` effects run during the settlement that follows a mount;
/// `on_unmount` fires once when the tree holding the instance is torn down.
#[derive(Clone)]
pub struct Component {
    name: Rc<str>,
    render: RenderFn,
    on_mount: Option<MountFn>,
    on_unmount: Option<UnmountFn>,
}

impl Component {
    /// Create a component from its render function
    pub fn new<F>(name: &str, render: F) -> Self
    where
        F: Fn(&Props) -> Element + 'static,
    {
        Self {
            name: Rc::from(name),
            render: Rc::new(render),
            on_mount: None,
            on_unmount: None,
        }
    }

    /// Effect run after mount, once pending work settles
    #[must_use]
    pub fn on_mount<F>(mut self, effect: F) -> Self
    where
        F: Fn(&Props) + 'static,
    {
        self.on_mount = Some(Rc::new(effect));
        self
    }

    /// Notification fired on teardown
    #[must_use]
    pub fn on_unmount<F>(mut self, notify: F) -> Self
    where
        F: Fn() + 'static,
    {
        self.on_unmount = Some(Rc::new(notify));
        self
    }

    /// Component name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn render(&self, props: &Props) -> Element {
        (self.render)(props)
    }

    pub(crate) fn mount_effect(&self) -> Option<MountFn> {
        self.on_mount.clone()
    }

    pub(crate) fn notify_unmount(&self) {
        if let Some(notify) = &self.on_unmount {
            notify();
        }
    }
}

impl PartialEq for Component {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.render, &other.render)
    }
}

impl std::fmt::Debug for Component {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Component")
            .field("name", &self.name)
            .field("on_mount", &self.on_mount.is_some())
            .field("on_unmount", &self.on_unmount.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_host_builder() {
        let el = Element::host("div")
            .data_hook("wrapper")
            .child(Element::text("hi"));
        let Element::Host(host) = el else {
            panic!("expected host element");
        };
        assert_eq!(host.tag, "div");
        assert_eq!(host.attributes["data-hook"], "wrapper");
        assert_eq!(host.children, vec![Element::text("hi")]);
    }

    #[test]
    fn test_attr_ignored_on_text() {
        assert_eq!(Element::text("a").attr("x", "y"), Element::text("a"));
    }

    #[test]
    fn test_component_identity() {
        let a = Component::new("A", |_| Element::text("a"));
        let b = Component::new("A", |_| Element::text("a"));
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn test_component_renders_props() {
        let comp = Component::new("Greeting", |props| {
            Element::text(props.get("name").and_then(|v| v.as_str()).unwrap_or("?"))
        });
        let mut props = Props::new();
        props.insert("name".into(), json!("ada"));
        assert_eq!(comp.render(&props), Element::text("ada"));
        assert_eq!(comp.name(), "Greeting");
    }
}
