//! Mounting, querying and tearing down virtual trees.

use super::document::{VirtualContainer, VirtualDocument};
use super::element::{Component, Element};
use crate::renderer::{MountedTree, Props, Renderer};
use crate::result::{DriverError, DriverResult};
use crate::selector::Selector;
use async_trait::async_trait;
use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::rc::Rc;

/// A node of a rendered tree; components have been expanded away.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderedNode {
    /// Tag node
    Host {
        /// Tag name
        tag: String,
        /// Attributes
        attributes: BTreeMap<String, String>,
        /// Children
        children: Vec<RenderedNode>,
    },
    /// Text node
    Text(String),
}

impl RenderedNode {
    /// Concatenated text of this node and its descendants
    #[must_use]
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Self::Text(text) => out.push_str(text),
            Self::Host { children, .. } => {
                for child in children {
                    child.collect_text(out);
                }
            }
        }
    }

    fn matches(&self, selector: &Selector) -> bool {
        match self {
            Self::Host {
                tag, attributes, ..
            } => selector.matches(tag, attributes),
            Self::Text(_) => false,
        }
    }

    fn children(&self) -> &[Self] {
        match self {
            Self::Host { children, .. } => children,
            Self::Text(_) => &[],
        }
    }

    fn collect_matches(&self, selector: &Selector, include_self: bool, out: &mut Vec<Self>) {
        if include_self && self.matches(selector) {
            out.push(self.clone());
        }
        for child in self.children() {
            child.collect_matches(selector, true, out);
        }
    }
}

struct Instance {
    component: Component,
    props: Props,
}

fn expand(element: &Element, instances: &mut Vec<Instance>) -> Vec<RenderedNode> {
    match element {
        Element::Text(text) => vec![RenderedNode::Text(text.clone())],
        Element::Host(host) => vec![RenderedNode::Host {
            tag: host.tag.clone(),
            attributes: host.attributes.clone(),
            children: host
                .children
                .iter()
                .flat_map(|child| expand(child, instances))
                .collect(),
        }],
        Element::Component(el) => {
            let output = el.component.render(&el.props);
            instances.push(Instance {
                component: el.component.clone(),
                props: el.props.clone(),
            });
            expand(&output, instances)
        }
    }
}

struct TreeState {
    element: Element,
    roots: Vec<RenderedNode>,
    instances: Vec<Instance>,
    container: Option<VirtualContainer>,
    mounted: bool,
}

impl TreeState {
    fn teardown(&mut self) {
        self.mounted = false;
        self.roots.clear();
        for instance in self.instances.drain(..) {
            instance.component.notify_unmount();
        }
    }
}

/// Handle to a mounted virtual tree, or to the matches of a query on one.
///
/// Scoped handles re-run their query against the live tree, so they always
/// reflect the latest [`MountedTree::update`].
#[derive(Clone)]
pub struct VirtualHandle {
    tree: Rc<RefCell<TreeState>>,
    document: VirtualDocument,
    query: Vec<Selector>,
}

impl std::fmt::Debug for VirtualHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VirtualHandle")
            .field("query", &self.query)
            .field("matches", &self.len())
            .finish()
    }
}

impl VirtualHandle {
    /// Nodes this handle currently resolves to
    #[must_use]
    pub fn nodes(&self) -> Vec<RenderedNode> {
        let tree = self.tree.borrow();
        if !tree.mounted {
            return Vec::new();
        }
        let mut current = tree.roots.clone();
        for (step, selector) in self.query.iter().enumerate() {
            let mut next = Vec::new();
            for node in &current {
                node.collect_matches(selector, step == 0, &mut next);
            }
            current = next;
        }
        current
    }

    /// Number of matched nodes
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes().len()
    }

    /// Whether nothing matched
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Text content of all matched nodes
    #[must_use]
    pub fn text(&self) -> String {
        self.nodes().iter().map(RenderedNode::text_content).collect()
    }

    /// Attribute of the first matched node
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<String> {
        self.nodes().into_iter().find_map(|node| match node {
            RenderedNode::Host { attributes, .. } => attributes.get(name).cloned(),
            RenderedNode::Text(_) => None,
        })
    }

    /// Tags of the matched nodes
    #[must_use]
    pub fn tags(&self) -> Vec<String> {
        self.nodes()
            .into_iter()
            .filter_map(|node| match node {
                RenderedNode::Host { tag, .. } => Some(tag),
                RenderedNode::Text(_) => None,
            })
            .collect()
    }

    /// Whether this handle is a query result rather than a whole tree
    #[must_use]
    pub fn is_scoped(&self) -> bool {
        !self.query.is_empty()
    }

    fn require_root(&self, operation: &str) -> DriverResult<()> {
        if self.is_scoped() {
            return Err(DriverError::Teardown {
                message: format!("cannot {operation} a query result"),
            });
        }
        Ok(())
    }
}

impl MountedTree for VirtualHandle {
    fn exists(&self) -> bool {
        !self.is_empty()
    }

    fn find(&self, selector: &Selector) -> Self {
        let mut query = self.query.clone();
        query.push(selector.clone());
        Self {
            tree: Rc::clone(&self.tree),
            document: self.document.clone(),
            query,
        }
    }

    fn update(&mut self) {
        let mut tree = self.tree.borrow_mut();
        if !tree.mounted {
            return;
        }
        let mut instances = Vec::new();
        let roots = expand(&tree.element, &mut instances);
        tree.roots = roots;
        tree.instances = instances;
    }

    fn unmount(&mut self) -> DriverResult<()> {
        self.require_root("unmount")?;
        let mut tree = self.tree.borrow_mut();
        if !tree.mounted {
            return Err(DriverError::Teardown {
                message: "tree is already unmounted".to_string(),
            });
        }
        if let Some(container) = tree.container.take() {
            self.document.vacate(&container)?;
        }
        tree.teardown();
        Ok(())
    }

    fn detach(&mut self) -> DriverResult<()> {
        self.require_root("detach")?;
        let mut tree = self.tree.borrow_mut();
        let container = tree.container.take().ok_or_else(|| DriverError::Teardown {
            message: "tree is not attached to the document".to_string(),
        })?;
        self.document.vacate(&container)?;
        tree.teardown();
        Ok(())
    }
}

type PendingEffect = (Rc<dyn Fn(&Props)>, Props);

/// In-memory [`Renderer`] over a [`VirtualDocument`].
///
/// Mount effects are queued and only run during [`Renderer::settle`].
#[derive(Clone, Default)]
pub struct VirtualRenderer {
    document: VirtualDocument,
    pending: Rc<RefCell<VecDeque<PendingEffect>>>,
}

impl std::fmt::Debug for VirtualRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VirtualRenderer")
            .field("document", &self.document)
            .field("pending_effects", &self.pending.borrow().len())
            .finish()
    }
}

impl VirtualRenderer {
    /// Renderer over a fresh document
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Renderer over an existing document
    #[must_use]
    pub fn with_document(document: VirtualDocument) -> Self {
        Self {
            document,
            pending: Rc::default(),
        }
    }

    /// The document containers are appended to
    #[must_use]
    pub const fn document(&self) -> &VirtualDocument {
        &self.document
    }

    /// Number of mount effects waiting for settlement
    #[must_use]
    pub fn pending_effects(&self) -> usize {
        self.pending.borrow().len()
    }

    fn flush_effects(&self) {
        loop {
            // Pop before running so an effect may schedule more work.
            let next = self.pending.borrow_mut().pop_front();
            let Some((effect, props)) = next else {
                break;
            };
            effect(&props);
        }
    }
}

#[async_trait(?Send)]
impl Renderer for VirtualRenderer {
    type Component = Component;
    type Element = Element;
    type Container = VirtualContainer;
    type Handle = VirtualHandle;

    fn create_element(&self, component: &Component, props: &Props) -> Element {
        Element::component(component, props.clone())
    }

    fn create_container(&self) -> DriverResult<VirtualContainer> {
        Ok(self.document.append_container())
    }

    fn remove_container(&self, container: VirtualContainer) -> DriverResult<()> {
        self.document.remove_container(&container)
    }

    fn mount(
        &self,
        element: Element,
        attach_to: Option<&VirtualContainer>,
    ) -> DriverResult<VirtualHandle> {
        if let Some(container) = attach_to {
            self.document.occupy(container)?;
        }

        let mut instances = Vec::new();
        let roots = expand(&element, &mut instances);
        {
            let mut pending = self.pending.borrow_mut();
            for instance in &instances {
                if let Some(effect) = instance.component.mount_effect() {
                    pending.push_back((effect, instance.props.clone()));
                }
            }
        }

        Ok(VirtualHandle {
            tree: Rc::new(RefCell::new(TreeState {
                element,
                roots,
                instances,
                container: attach_to.cloned(),
                mounted: true,
            })),
            document: self.document.clone(),
            query: Vec::new(),
        })
    }

    async fn settle(&self) {
        tokio::task::yield_now().await;
        self.flush_effects();
    }
}
