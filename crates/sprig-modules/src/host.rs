use std::rc::Rc;

use sprig_core::{DataValue, EventListener, MemoryTree, NodeError, NodeId, TreeAdapter};

/// Element-level operations the property modules need on top of the
/// structural [`TreeAdapter`] capabilities.
pub trait ElementHost: TreeAdapter {
    fn attribute(&self, element: NodeId, name: &str) -> Result<Option<String>, NodeError>;
    /// Every attribute of `element` in document order.
    fn attributes(&self, element: NodeId) -> Result<Vec<(String, String)>, NodeError>;
    fn set_attribute(&self, element: NodeId, name: &str, value: &str) -> Result<(), NodeError>;
    fn set_attribute_ns(
        &self,
        element: NodeId,
        namespace: &str,
        name: &str,
        value: &str,
    ) -> Result<(), NodeError>;
    fn remove_attribute(&self, element: NodeId, name: &str) -> Result<(), NodeError>;

    fn add_class(&self, element: NodeId, class: &str) -> Result<(), NodeError>;
    fn remove_class(&self, element: NodeId, class: &str) -> Result<(), NodeError>;
    fn has_class(&self, element: NodeId, class: &str) -> Result<bool, NodeError>;

    fn property(&self, element: NodeId, name: &str) -> Result<Option<DataValue>, NodeError>;
    fn set_property(&self, element: NodeId, name: &str, value: DataValue)
        -> Result<(), NodeError>;
    fn remove_property(&self, element: NodeId, name: &str) -> Result<(), NodeError>;

    fn style(&self, element: NodeId, name: &str) -> Result<Option<String>, NodeError>;
    fn set_style(&self, element: NodeId, name: &str, value: &str) -> Result<(), NodeError>;
    fn remove_style(&self, element: NodeId, name: &str) -> Result<(), NodeError>;
    /// Style properties the element animates when they change.
    fn transition_properties(&self, element: NodeId) -> Result<Vec<String>, NodeError>;

    fn add_event_listener(
        &self,
        element: NodeId,
        kind: &str,
        listener: Rc<dyn EventListener>,
    ) -> Result<(), NodeError>;
    fn remove_event_listener(
        &self,
        element: NodeId,
        kind: &str,
        listener: &Rc<dyn EventListener>,
    ) -> Result<(), NodeError>;

    fn child_nodes(&self, node: NodeId) -> Result<Vec<NodeId>, NodeError>;
}

impl ElementHost for MemoryTree {
    fn attribute(&self, element: NodeId, name: &str) -> Result<Option<String>, NodeError> {
        MemoryTree::attribute(self, element, name)
    }

    fn attributes(&self, element: NodeId) -> Result<Vec<(String, String)>, NodeError> {
        MemoryTree::attributes(self, element)
    }

    fn set_attribute(&self, element: NodeId, name: &str, value: &str) -> Result<(), NodeError> {
        MemoryTree::set_attribute(self, element, name, value)
    }

    fn set_attribute_ns(
        &self,
        element: NodeId,
        namespace: &str,
        name: &str,
        value: &str,
    ) -> Result<(), NodeError> {
        MemoryTree::set_attribute_ns(self, element, namespace, name, value)
    }

    fn remove_attribute(&self, element: NodeId, name: &str) -> Result<(), NodeError> {
        MemoryTree::remove_attribute(self, element, name)
    }

    fn add_class(&self, element: NodeId, class: &str) -> Result<(), NodeError> {
        MemoryTree::add_class(self, element, class)
    }

    fn remove_class(&self, element: NodeId, class: &str) -> Result<(), NodeError> {
        MemoryTree::remove_class(self, element, class)
    }

    fn has_class(&self, element: NodeId, class: &str) -> Result<bool, NodeError> {
        MemoryTree::has_class(self, element, class)
    }

    fn property(&self, element: NodeId, name: &str) -> Result<Option<DataValue>, NodeError> {
        MemoryTree::property(self, element, name)
    }

    fn set_property(
        &self,
        element: NodeId,
        name: &str,
        value: DataValue,
    ) -> Result<(), NodeError> {
        MemoryTree::set_property(self, element, name, value)
    }

    fn remove_property(&self, element: NodeId, name: &str) -> Result<(), NodeError> {
        MemoryTree::remove_property(self, element, name)
    }

    fn style(&self, element: NodeId, name: &str) -> Result<Option<String>, NodeError> {
        MemoryTree::style(self, element, name)
    }

    fn set_style(&self, element: NodeId, name: &str, value: &str) -> Result<(), NodeError> {
        MemoryTree::set_style(self, element, name, value)
    }

    fn remove_style(&self, element: NodeId, name: &str) -> Result<(), NodeError> {
        MemoryTree::remove_style(self, element, name)
    }

    fn transition_properties(&self, element: NodeId) -> Result<Vec<String>, NodeError> {
        MemoryTree::transition_properties(self, element)
    }

    fn add_event_listener(
        &self,
        element: NodeId,
        kind: &str,
        listener: Rc<dyn EventListener>,
    ) -> Result<(), NodeError> {
        MemoryTree::add_event_listener(self, element, kind, listener)
    }

    fn remove_event_listener(
        &self,
        element: NodeId,
        kind: &str,
        listener: &Rc<dyn EventListener>,
    ) -> Result<(), NodeError> {
        MemoryTree::remove_event_listener(self, element, kind, listener)
    }

    fn child_nodes(&self, node: NodeId) -> Result<Vec<NodeId>, NodeError> {
        MemoryTree::children(self, node)
    }
}
