use crate::vnode::{DataValue, VNode};
use crate::{NodeError, NodeId};

/// Event delivered by a live tree to listeners attached on one of its elements.
#[derive(Clone, Debug, PartialEq)]
pub struct Event {
    pub kind: String,
    pub target: NodeId,
    pub detail: Option<DataValue>,
}

impl Event {
    pub fn new(kind: impl Into<String>, target: NodeId) -> Self {
        Self {
            kind: kind.into(),
            target,
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<DataValue>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// Listener attached to a live element that dispatches into whichever
/// virtual node currently describes that element.
pub trait EventListener {
    fn handle_event(&self, event: &Event) -> Result<(), NodeError>;

    /// Points the listener at the newest virtual node for its element.
    fn rebind(&self, node: &VNode);
}
