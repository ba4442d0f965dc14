use std::cell::RefCell;
use std::rc::Rc;

use sprig_core::{
    MemoryTree, Module, NodeError, NodeId, NodeKind, RemovalHandle, TreeAdapter, VNode,
};

/// One mutating call made on a [`RecordingTree`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TreeOp {
    CreateElement {
        id: NodeId,
        tag: String,
        namespace: Option<String>,
    },
    CreateText {
        id: NodeId,
        text: String,
    },
    CreateComment {
        id: NodeId,
        text: String,
    },
    InsertBefore {
        parent: NodeId,
        node: NodeId,
        reference: Option<NodeId>,
    },
    AppendChild {
        parent: NodeId,
        child: NodeId,
    },
    RemoveChild {
        parent: NodeId,
        child: NodeId,
    },
    SetText {
        node: NodeId,
        text: Option<String>,
    },
    SetId {
        element: NodeId,
        id: String,
    },
    SetClassName {
        element: NodeId,
        class_name: String,
    },
}

impl TreeOp {
    pub fn is_create(&self) -> bool {
        matches!(
            self,
            TreeOp::CreateElement { .. } | TreeOp::CreateText { .. } | TreeOp::CreateComment { .. }
        )
    }
}

/// Headless adapter that logs every mutating call before forwarding it to a
/// [`MemoryTree`]. Clones share both the tree and the log.
#[derive(Clone, Default)]
pub struct RecordingTree {
    tree: MemoryTree,
    ops: Rc<RefCell<Vec<TreeOp>>>,
}

impl RecordingTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Underlying tree, for inspection and for setup that should not be logged.
    pub fn inner(&self) -> &MemoryTree {
        &self.tree
    }

    pub fn ops(&self) -> Vec<TreeOp> {
        self.ops.borrow().clone()
    }

    pub fn take_ops(&self) -> Vec<TreeOp> {
        std::mem::take(&mut *self.ops.borrow_mut())
    }

    pub fn clear(&self) {
        self.ops.borrow_mut().clear();
    }

    pub fn mutation_count(&self) -> usize {
        self.ops.borrow().len()
    }

    pub fn count(&self, predicate: impl Fn(&TreeOp) -> bool) -> usize {
        self.ops.borrow().iter().filter(|op| predicate(op)).count()
    }

    pub fn render(&self, node: NodeId) -> Result<String, NodeError> {
        self.tree.render(node)
    }

    fn record(&self, op: TreeOp) {
        self.ops.borrow_mut().push(op);
    }
}

impl TreeAdapter for RecordingTree {
    fn create_element(&self, tag: &str) -> Result<NodeId, NodeError> {
        let id = self.tree.create_element(tag)?;
        self.record(TreeOp::CreateElement {
            id,
            tag: tag.to_string(),
            namespace: None,
        });
        Ok(id)
    }

    fn create_element_ns(&self, namespace: &str, tag: &str) -> Result<NodeId, NodeError> {
        let id = self.tree.create_element_ns(namespace, tag)?;
        self.record(TreeOp::CreateElement {
            id,
            tag: tag.to_string(),
            namespace: Some(namespace.to_string()),
        });
        Ok(id)
    }

    fn create_text_node(&self, text: &str) -> Result<NodeId, NodeError> {
        let id = self.tree.create_text_node(text)?;
        self.record(TreeOp::CreateText {
            id,
            text: text.to_string(),
        });
        Ok(id)
    }

    fn create_comment(&self, text: &str) -> Result<NodeId, NodeError> {
        let id = self.tree.create_comment(text)?;
        self.record(TreeOp::CreateComment {
            id,
            text: text.to_string(),
        });
        Ok(id)
    }

    fn insert_before(
        &self,
        parent: NodeId,
        node: NodeId,
        reference: Option<NodeId>,
    ) -> Result<(), NodeError> {
        self.tree.insert_before(parent, node, reference)?;
        self.record(TreeOp::InsertBefore {
            parent,
            node,
            reference,
        });
        Ok(())
    }

    fn remove_child(&self, parent: NodeId, child: NodeId) -> Result<(), NodeError> {
        self.tree.remove_child(parent, child)?;
        self.record(TreeOp::RemoveChild { parent, child });
        Ok(())
    }

    fn append_child(&self, parent: NodeId, child: NodeId) -> Result<(), NodeError> {
        self.tree.append_child(parent, child)?;
        self.record(TreeOp::AppendChild { parent, child });
        Ok(())
    }

    fn parent_node(&self, node: NodeId) -> Result<Option<NodeId>, NodeError> {
        self.tree.parent_node(node)
    }

    fn next_sibling(&self, node: NodeId) -> Result<Option<NodeId>, NodeError> {
        self.tree.next_sibling(node)
    }

    fn tag_name(&self, element: NodeId) -> Result<String, NodeError> {
        self.tree.tag_name(element)
    }

    fn set_text_content(&self, node: NodeId, text: Option<&str>) -> Result<(), NodeError> {
        self.tree.set_text_content(node, text)?;
        self.record(TreeOp::SetText {
            node,
            text: text.map(str::to_string),
        });
        Ok(())
    }

    fn text_content(&self, node: NodeId) -> Result<Option<String>, NodeError> {
        self.tree.text_content(node)
    }

    fn node_kind(&self, node: NodeId) -> Result<NodeKind, NodeError> {
        self.tree.node_kind(node)
    }

    fn set_id(&self, element: NodeId, id: &str) -> Result<(), NodeError> {
        self.tree.set_id(element, id)?;
        self.record(TreeOp::SetId {
            element,
            id: id.to_string(),
        });
        Ok(())
    }

    fn set_class_name(&self, element: NodeId, class_name: &str) -> Result<(), NodeError> {
        self.tree.set_class_name(element, class_name)?;
        self.record(TreeOp::SetClassName {
            element,
            class_name: class_name.to_string(),
        });
        Ok(())
    }

    fn id_of(&self, element: NodeId) -> Result<Option<String>, NodeError> {
        self.tree.id_of(element)
    }

    fn class_name_of(&self, element: NodeId) -> Result<Option<String>, NodeError> {
        self.tree.class_name_of(element)
    }
}

/// One module hook invocation, labelled by the node's key, else its selector,
/// else its text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HookCall {
    Pre,
    Create(String),
    Update(String),
    Destroy(String),
    Remove(String),
    Post,
}

pub fn node_label(node: &VNode) -> String {
    match (node.key(), node.sel()) {
        (Some(key), _) => key.to_string(),
        (None, Some(sel)) => sel.to_string(),
        (None, None) => node.text().unwrap_or_default().to_string(),
    }
}

/// Module that records every lifecycle call it receives.
///
/// By default it agrees to removals immediately; [`RecordingModule::deferring`]
/// keeps the removal handles until [`RecordingModule::release_removals`].
#[derive(Clone, Default)]
pub struct RecordingModule {
    calls: Rc<RefCell<Vec<HookCall>>>,
    held: Option<Rc<RefCell<Vec<RemovalHandle>>>>,
}

impl RecordingModule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deferring() -> Self {
        Self {
            calls: Rc::default(),
            held: Some(Rc::default()),
        }
    }

    pub fn calls(&self) -> Vec<HookCall> {
        self.calls.borrow().clone()
    }

    pub fn take_calls(&self) -> Vec<HookCall> {
        std::mem::take(&mut *self.calls.borrow_mut())
    }

    pub fn count(&self, predicate: impl Fn(&HookCall) -> bool) -> usize {
        self.calls.borrow().iter().filter(|call| predicate(call)).count()
    }

    pub fn pending_removals(&self) -> usize {
        self.held
            .as_ref()
            .map_or(0, |held| held.borrow().len())
    }

    /// Completes every removal this module is holding back.
    pub fn release_removals(&self) -> Result<(), NodeError> {
        let handles = match &self.held {
            Some(held) => std::mem::take(&mut *held.borrow_mut()),
            None => Vec::new(),
        };
        for handle in handles {
            handle.done()?;
        }
        Ok(())
    }

    pub fn module<A: 'static>(&self) -> Module<A> {
        let pre = Rc::clone(&self.calls);
        let create = Rc::clone(&self.calls);
        let update = Rc::clone(&self.calls);
        let destroy = Rc::clone(&self.calls);
        let remove = Rc::clone(&self.calls);
        let post = Rc::clone(&self.calls);
        let held = self.held.clone();
        Module::new("recording")
            .on_pre(move |_| {
                pre.borrow_mut().push(HookCall::Pre);
                Ok(())
            })
            .on_create(move |_, _, node| {
                create.borrow_mut().push(HookCall::Create(node_label(node)));
                Ok(())
            })
            .on_update(move |_, _, node| {
                update.borrow_mut().push(HookCall::Update(node_label(node)));
                Ok(())
            })
            .on_destroy(move |_, node| {
                destroy.borrow_mut().push(HookCall::Destroy(node_label(node)));
                Ok(())
            })
            .on_remove(move |_, node, done| {
                remove.borrow_mut().push(HookCall::Remove(node_label(node)));
                match &held {
                    Some(held) => {
                        held.borrow_mut().push(done);
                        Ok(())
                    }
                    None => done.done(),
                }
            })
            .on_post(move |_| {
                post.borrow_mut().push(HookCall::Post);
                Ok(())
            })
    }
}
