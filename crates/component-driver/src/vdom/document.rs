//! In-memory document with a body of mount containers.

use crate::result::{DriverError, DriverResult};
use std::cell::RefCell;
use std::rc::Rc;
use uuid::Uuid;

/// A container appended to the document body
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VirtualContainer {
    id: Uuid,
}

impl VirtualContainer {
    /// Unique container id
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug)]
struct Slot {
    container: VirtualContainer,
    occupied: bool,
}

/// Shared document; clones see the same body.
#[derive(Debug, Clone, Default)]
pub struct VirtualDocument {
    body: Rc<RefCell<Vec<Slot>>>,
}

impl VirtualDocument {
    /// Create an empty document
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of children of the body
    #[must_use]
    pub fn body_child_count(&self) -> usize {
        self.body.borrow().len()
    }

    /// Whether a container is still in the body
    #[must_use]
    pub fn contains(&self, container: &VirtualContainer) -> bool {
        self.body.borrow().iter().any(|s| &s.container == container)
    }

    /// Whether a container currently holds a mounted tree
    #[must_use]
    pub fn is_occupied(&self, container: &VirtualContainer) -> bool {
        self.body
            .borrow()
            .iter()
            .any(|s| &s.container == container && s.occupied)
    }

    pub(crate) fn append_container(&self) -> VirtualContainer {
        let container = VirtualContainer { id: Uuid::new_v4() };
        self.body.borrow_mut().push(Slot {
            container: container.clone(),
            occupied: false,
        });
        container
    }

    pub(crate) fn remove_container(&self, container: &VirtualContainer) -> DriverResult<()> {
        let mut body = self.body.borrow_mut();
        let before = body.len();
        body.retain(|s| &s.container != container);
        if body.len() == before {
            return Err(DriverError::Teardown {
                message: format!("container {} is not in the document", container.id),
            });
        }
        Ok(())
    }

    pub(crate) fn occupy(&self, container: &VirtualContainer) -> DriverResult<()> {
        let mut body = self.body.borrow_mut();
        let slot = body
            .iter_mut()
            .find(|s| &s.container == container)
            .ok_or_else(|| DriverError::Mount {
                message: format!("container {} is not in the document", container.id),
            })?;
        if slot.occupied {
            return Err(DriverError::Mount {
                message: format!("container {} already holds a tree", container.id),
            });
        }
        slot.occupied = true;
        Ok(())
    }

    pub(crate) fn vacate(&self, container: &VirtualContainer) -> DriverResult<()> {
        let mut body = self.body.borrow_mut();
        match body.iter_mut().find(|s| &s.container == container) {
            Some(slot) if slot.occupied => {
                slot.occupied = false;
                Ok(())
            }
            _ => Err(DriverError::Teardown {
                message: format!("container {} holds no tree", container.id),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_and_remove() {
        let doc = VirtualDocument::new();
        let c = doc.append_container();
        assert_eq!(doc.body_child_count(), 1);
        assert!(doc.contains(&c));

        doc.remove_container(&c).unwrap();
        assert_eq!(doc.body_child_count(), 0);
        assert!(doc.remove_container(&c).is_err());
    }

    #[test]
    fn test_occupancy() {
        let doc = VirtualDocument::new();
        let c = doc.append_container();
        doc.occupy(&c).unwrap();
        assert!(doc.is_occupied(&c));
        assert!(doc.occupy(&c).is_err());

        doc.vacate(&c).unwrap();
        assert!(!doc.is_occupied(&c));
        assert!(doc.vacate(&c).is_err());
    }

    #[test]
    fn test_clones_share_body() {
        let doc = VirtualDocument::new();
        let other = doc.clone();
        let _ = doc.append_container();
        assert_eq!(other.body_child_count(), 1);
    }
}
