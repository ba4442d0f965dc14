//! Abstract live-tree operations the engine drives.
//!
//! Adapters are shared handles: every method takes `&self` and the live tree
//! itself is expected to use interior mutability, the way a DOM document does.
//! This lets deferred removals keep a clone of the adapter and detach their
//! node long after the patch that scheduled them has returned.

use crate::{NodeError, NodeId};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Element,
    Text,
    Comment,
}

pub trait TreeAdapter {
    fn create_element(&self, tag: &str) -> Result<NodeId, NodeError>;
    fn create_element_ns(&self, namespace: &str, tag: &str) -> Result<NodeId, NodeError>;
    fn create_text_node(&self, text: &str) -> Result<NodeId, NodeError>;
    fn create_comment(&self, text: &str) -> Result<NodeId, NodeError>;

    /// Inserts `node` before `reference`, or appends when `reference` is `None`.
    /// A node that already has a parent is moved.
    fn insert_before(
        &self,
        parent: NodeId,
        node: NodeId,
        reference: Option<NodeId>,
    ) -> Result<(), NodeError>;
    fn remove_child(&self, parent: NodeId, child: NodeId) -> Result<(), NodeError>;
    fn append_child(&self, parent: NodeId, child: NodeId) -> Result<(), NodeError>;

    fn parent_node(&self, node: NodeId) -> Result<Option<NodeId>, NodeError>;
    fn next_sibling(&self, node: NodeId) -> Result<Option<NodeId>, NodeError>;
    fn tag_name(&self, element: NodeId) -> Result<String, NodeError>;

    fn set_text_content(&self, node: NodeId, text: Option<&str>) -> Result<(), NodeError>;
    fn text_content(&self, node: NodeId) -> Result<Option<String>, NodeError>;

    fn node_kind(&self, node: NodeId) -> Result<NodeKind, NodeError>;

    fn is_element(&self, node: NodeId) -> bool {
        matches!(self.node_kind(node), Ok(NodeKind::Element))
    }

    fn is_text(&self, node: NodeId) -> bool {
        matches!(self.node_kind(node), Ok(NodeKind::Text))
    }

    fn is_comment(&self, node: NodeId) -> bool {
        matches!(self.node_kind(node), Ok(NodeKind::Comment))
    }

    fn set_id(&self, element: NodeId, id: &str) -> Result<(), NodeError>;
    fn set_class_name(&self, element: NodeId, class_name: &str) -> Result<(), NodeError>;
    fn id_of(&self, element: NodeId) -> Result<Option<String>, NodeError>;
    fn class_name_of(&self, element: NodeId) -> Result<Option<String>, NodeError>;
}
