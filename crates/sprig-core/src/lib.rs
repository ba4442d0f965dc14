#![doc = r"Virtual tree reconciliation engine: diffs two virtual node trees and applies the
minimal set of mutations to a live tree through a [`TreeAdapter`]."]

pub mod adapter;
pub mod builder;
mod collections;
pub mod event;
pub mod hooks;
pub mod memory;
pub mod patch;
pub mod removal;
pub mod vnode;

pub use adapter::{NodeKind, TreeAdapter};
pub use builder::{comment, h, text, VNodeBuilder, SVG_NAMESPACE};
pub use event::{Event, EventListener};
pub use hooks::{Hooks, Module, ModuleRegistry};
pub use memory::MemoryTree;
pub use patch::{init, PatchTarget, Patcher, PatcherBuilder};
pub use removal::RemovalHandle;
pub use vnode::{
    nested_map_mut, same_vnode, DataMap, DataValue, Handler, Key, Selector, VNode, VNodeData,
    WeakVNode, COMMENT_SELECTOR,
};

/// Handle of a node in the live tree.
pub type NodeId = usize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeError {
    Missing { id: NodeId },
    NotAnElement { id: NodeId },
    NotAChild { parent: NodeId, child: NodeId },
    InvalidHierarchy { parent: NodeId, child: NodeId },
    Unmounted,
    Hook { hook: &'static str, message: String },
}

impl NodeError {
    /// Failure reported by a module or per-node hook.
    pub fn hook(hook: &'static str, message: impl Into<String>) -> Self {
        NodeError::Hook {
            hook,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for NodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeError::Missing { id } => write!(f, "node {id} missing"),
            NodeError::NotAnElement { id } => write!(f, "node {id} is not an element"),
            NodeError::NotAChild { parent, child } => {
                write!(f, "node {child} is not a child of node {parent}")
            }
            NodeError::InvalidHierarchy { parent, child } => {
                write!(f, "node {child} cannot be placed under its descendant {parent}")
            }
            NodeError::Unmounted => write!(f, "virtual node has no live counterpart"),
            NodeError::Hook { hook, message } => write!(f, "{hook} hook failed: {message}"),
        }
    }
}

impl std::error::Error for NodeError {}
