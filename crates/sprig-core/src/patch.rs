//! Reconciliation engine: materialization, child-list diffing, in-place
//! patching and coordinated removal.

use std::rc::Rc;

use crate::adapter::TreeAdapter;
use crate::collections::{map_with_capacity, HashMap};
use crate::hooks::{Module, ModuleRegistry};
use crate::removal::RemovalHandle;
use crate::vnode::{Key, Selector, VNode, VNodeData, COMMENT_SELECTOR};
use crate::{NodeError, NodeId};

/// Old side of a patch: a previous virtual tree or a live node to adopt.
#[derive(Clone, Debug)]
pub enum PatchTarget {
    VNode(VNode),
    Live(NodeId),
}

impl From<VNode> for PatchTarget {
    fn from(node: VNode) -> Self {
        PatchTarget::VNode(node)
    }
}

impl From<&VNode> for PatchTarget {
    fn from(node: &VNode) -> Self {
        PatchTarget::VNode(node.clone())
    }
}

impl From<NodeId> for PatchTarget {
    fn from(elm: NodeId) -> Self {
        PatchTarget::Live(elm)
    }
}

type InsertQueue = Vec<VNode>;

fn live(node: &VNode) -> Result<NodeId, NodeError> {
    node.elm().ok_or(NodeError::Unmounted)
}

fn key_to_old_index(old: &[Option<VNode>], start: usize, end: usize) -> HashMap<Key, usize> {
    let mut index = map_with_capacity(end - start);
    for (offset, slot) in old[start..end].iter().enumerate() {
        if let Some(key) = slot.as_ref().and_then(VNode::key) {
            index.insert(key.clone(), start + offset);
        }
    }
    index
}

/// Builds a [`Patcher`] from a module list and a live tree handle.
pub fn init<A>(modules: impl IntoIterator<Item = Module<A>>, tree: A) -> Patcher<A>
where
    A: TreeAdapter + Clone + 'static,
{
    Patcher::builder(tree).modules(modules).build()
}

pub struct PatcherBuilder<A> {
    tree: A,
    modules: Vec<Module<A>>,
}

impl<A> PatcherBuilder<A>
where
    A: TreeAdapter + Clone + 'static,
{
    pub fn module(mut self, module: Module<A>) -> Self {
        self.modules.push(module);
        self
    }

    pub fn modules(mut self, modules: impl IntoIterator<Item = Module<A>>) -> Self {
        self.modules.extend(modules);
        self
    }

    pub fn build(self) -> Patcher<A> {
        Patcher::new(self.tree, ModuleRegistry::new(self.modules))
    }
}

/// Reconciliation engine bound to one live tree and a fixed module registry.
pub struct Patcher<A> {
    tree: A,
    modules: ModuleRegistry<A>,
    /// Shared "old" placeholder handed to every `create` hook.
    empty: VNode,
}

impl<A> Patcher<A>
where
    A: TreeAdapter + Clone + 'static,
{
    pub fn new(tree: A, modules: ModuleRegistry<A>) -> Self {
        Self {
            tree,
            modules,
            empty: VNode::empty(),
        }
    }

    pub fn builder(tree: A) -> PatcherBuilder<A> {
        PatcherBuilder {
            tree,
            modules: Vec::new(),
        }
    }

    pub fn tree(&self) -> &A {
        &self.tree
    }

    pub fn modules(&self) -> &ModuleRegistry<A> {
        &self.modules
    }

    /// Brings the live tree from `old` to `new` and returns `new` as the
    /// baseline for the next call.
    pub fn patch(&self, old: impl Into<PatchTarget>, new: VNode) -> Result<VNode, NodeError> {
        let mut queue = InsertQueue::new();
        for pre in &self.modules.pre {
            pre(&self.tree)?;
        }

        let old = match old.into() {
            PatchTarget::VNode(node) => node,
            PatchTarget::Live(elm) => {
                log::trace!("adopting live node {elm} as patch root");
                self.empty_node_at(elm)?
            }
        };

        if old.same_vnode(&new) {
            log::trace!("patching root {:?} in place", new.sel());
            self.patch_vnode(&old, &new, &mut queue)?;
        } else {
            log::trace!("replacing root {:?} with {:?}", old.sel(), new.sel());
            let elm = live(&old)?;
            let parent = self.tree.parent_node(elm)?;
            let new_elm = self.create_elm(&new, &mut queue)?;
            if let Some(parent) = parent {
                let next = self.tree.next_sibling(elm)?;
                self.tree.insert_before(parent, new_elm, next)?;
                self.remove_vnodes(parent, [&old])?;
            }
        }

        self.fire_insert_hooks(queue)?;
        for post in &self.modules.post {
            post(&self.tree)?;
        }
        Ok(new)
    }

    /// Creates the live subtree for `vnode` without attaching it anywhere.
    ///
    /// `insert` hooks do not run: the subtree is not part of the live tree
    /// yet. Use [`Patcher::mount`] to attach and notify in one step.
    pub fn materialize(&self, vnode: &VNode) -> Result<NodeId, NodeError> {
        let mut queue = InsertQueue::new();
        self.create_elm(vnode, &mut queue)
    }

    /// Creates the live subtree for `vnode`, inserts it under `parent` before
    /// `before` (appending when `None`), then fires the subtree's `insert` hooks.
    pub fn mount(
        &self,
        parent: NodeId,
        before: Option<NodeId>,
        vnode: &VNode,
    ) -> Result<NodeId, NodeError> {
        let mut queue = InsertQueue::new();
        let elm = self.create_elm(vnode, &mut queue)?;
        self.tree.insert_before(parent, elm, before)?;
        self.fire_insert_hooks(queue)?;
        Ok(elm)
    }

    fn fire_insert_hooks(&self, queue: InsertQueue) -> Result<(), NodeError> {
        for node in queue {
            if let Some(insert) = node.hooks().and_then(|hooks| hooks.insert.clone()) {
                insert(&node)?;
            }
        }
        Ok(())
    }

    /// Wraps an existing live element in a childless virtual node whose
    /// selector is rebuilt from its tag, id and classes.
    fn empty_node_at(&self, elm: NodeId) -> Result<VNode, NodeError> {
        let mut sel = self.tree.tag_name(elm)?.to_lowercase();
        if let Some(id) = self.tree.id_of(elm)?.filter(|id| !id.is_empty()) {
            sel.push('#');
            sel.push_str(&id);
        }
        if let Some(class_name) = self.tree.class_name_of(elm)? {
            for class in class_name.split_whitespace() {
                sel.push('.');
                sel.push_str(class);
            }
        }
        Ok(VNode::new(
            Some(sel),
            Some(VNodeData::default()),
            Some(Vec::new()),
            None,
            Some(elm),
        ))
    }

    fn create_elm(&self, vnode: &VNode, queue: &mut InsertQueue) -> Result<NodeId, NodeError> {
        if let Some(init) = vnode.hooks().and_then(|hooks| hooks.init.clone()) {
            init(vnode)?;
        }

        let elm = match vnode.sel() {
            Some(COMMENT_SELECTOR) => self.tree.create_comment(vnode.text().unwrap_or(""))?,
            Some(sel) => {
                let selector = Selector::parse(sel);
                let elm = match vnode.namespace() {
                    Some(namespace) => self.tree.create_element_ns(&namespace, selector.tag)?,
                    None => self.tree.create_element(selector.tag)?,
                };
                if let Some(id) = selector.id {
                    self.tree.set_id(elm, id)?;
                }
                if let Some(class_name) = &selector.class_name {
                    self.tree.set_class_name(elm, class_name)?;
                }
                vnode.set_elm(Some(elm));

                for create in &self.modules.create {
                    create(&self.tree, &self.empty, vnode)?;
                }
                if let Some(children) = vnode.children() {
                    for child in children.iter() {
                        let child_elm = self.create_elm(child, queue)?;
                        self.tree.append_child(elm, child_elm)?;
                    }
                } else if let Some(text) = vnode.text() {
                    let text_elm = self.tree.create_text_node(text)?;
                    self.tree.append_child(elm, text_elm)?;
                }
                if let Some(hooks) = vnode.hooks() {
                    if let Some(create) = &hooks.create {
                        create(&self.empty, vnode)?;
                    }
                    if hooks.insert.is_some() {
                        queue.push(vnode.clone());
                    }
                }
                elm
            }
            None => self.tree.create_text_node(vnode.text().unwrap_or(""))?,
        };
        vnode.set_elm(Some(elm));
        Ok(elm)
    }

    fn add_vnodes(
        &self,
        parent: NodeId,
        before: Option<NodeId>,
        vnodes: &[VNode],
        queue: &mut InsertQueue,
    ) -> Result<(), NodeError> {
        for vnode in vnodes {
            let elm = self.create_elm(vnode, queue)?;
            self.tree.insert_before(parent, elm, before)?;
        }
        Ok(())
    }

    fn invoke_destroy_hook(&self, vnode: &VNode) -> Result<(), NodeError> {
        if !vnode.has_data() {
            return Ok(());
        }
        if let Some(destroy) = vnode.hooks().and_then(|hooks| hooks.destroy.clone()) {
            destroy(vnode)?;
        }
        for destroy in &self.modules.destroy {
            destroy(&self.tree, vnode)?;
        }
        if let Some(children) = vnode.children() {
            for child in children.iter() {
                self.invoke_destroy_hook(child)?;
            }
        }
        Ok(())
    }

    fn removal_handle(&self, elm: NodeId) -> RemovalHandle {
        let tree = self.tree.clone();
        RemovalHandle::new(self.modules.remove_participants() + 1, elm, move || {
            match tree.parent_node(elm)? {
                Some(parent) => tree.remove_child(parent, elm),
                None => {
                    log::warn!("node {elm} was already detached when its removal completed");
                    Ok(())
                }
            }
        })
    }

    fn remove_vnodes<'a>(
        &self,
        parent: NodeId,
        vnodes: impl IntoIterator<Item = &'a VNode>,
    ) -> Result<(), NodeError> {
        for vnode in vnodes {
            let elm = live(vnode)?;
            if vnode.sel().is_none() {
                self.tree.remove_child(parent, elm)?;
                continue;
            }

            self.invoke_destroy_hook(vnode)?;
            let handle = self.removal_handle(elm);
            for remove in &self.modules.remove {
                remove(&self.tree, vnode, handle.clone())?;
            }
            match vnode.hooks().and_then(|hooks| hooks.remove.clone()) {
                Some(remove) => remove(vnode, handle.clone())?,
                None => handle.done()?,
            }
            if !handle.is_complete() {
                log::debug!(
                    "removal of node {elm} deferred, {} participant(s) pending",
                    handle.remaining()
                );
            }
        }
        Ok(())
    }

    fn update_children(
        &self,
        parent: NodeId,
        old_ch: &[VNode],
        new_ch: &[VNode],
        queue: &mut InsertQueue,
    ) -> Result<(), NodeError> {
        // Spans are half-open: [start, end).
        let mut old: Vec<Option<VNode>> = old_ch.iter().cloned().map(Some).collect();
        let mut old_start = 0;
        let mut old_end = old.len();
        let mut new_start = 0;
        let mut new_end = new_ch.len();
        let mut key_index: Option<HashMap<Key, usize>> = None;

        while old_start < old_end && new_start < new_end {
            let Some(old_start_vnode) = old[old_start].clone() else {
                old_start += 1;
                continue;
            };
            let Some(old_end_vnode) = old[old_end - 1].clone() else {
                old_end -= 1;
                continue;
            };
            let new_start_vnode = &new_ch[new_start];
            let new_end_vnode = &new_ch[new_end - 1];

            if old_start_vnode.same_vnode(new_start_vnode) {
                self.patch_vnode(&old_start_vnode, new_start_vnode, queue)?;
                old_start += 1;
                new_start += 1;
            } else if old_end_vnode.same_vnode(new_end_vnode) {
                self.patch_vnode(&old_end_vnode, new_end_vnode, queue)?;
                old_end -= 1;
                new_end -= 1;
            } else if old_start_vnode.same_vnode(new_end_vnode) {
                // Moved right.
                self.patch_vnode(&old_start_vnode, new_end_vnode, queue)?;
                let after = self.tree.next_sibling(live(&old_end_vnode)?)?;
                self.tree.insert_before(parent, live(&old_start_vnode)?, after)?;
                old_start += 1;
                new_end -= 1;
            } else if old_end_vnode.same_vnode(new_start_vnode) {
                // Moved left.
                self.patch_vnode(&old_end_vnode, new_start_vnode, queue)?;
                self.tree.insert_before(
                    parent,
                    live(&old_end_vnode)?,
                    Some(live(&old_start_vnode)?),
                )?;
                old_end -= 1;
                new_start += 1;
            } else {
                let index =
                    key_index.get_or_insert_with(|| key_to_old_index(&old, old_start, old_end));
                let matched = new_start_vnode
                    .key()
                    .and_then(|key| index.get(key).copied())
                    .filter(|&idx| idx >= old_start && idx < old_end)
                    .and_then(|idx| old[idx].clone().map(|node| (idx, node)));
                let before = Some(live(&old_start_vnode)?);
                match matched {
                    Some((idx, to_move)) if to_move.sel() == new_start_vnode.sel() => {
                        self.patch_vnode(&to_move, new_start_vnode, queue)?;
                        old[idx] = None;
                        self.tree.insert_before(parent, live(&to_move)?, before)?;
                    }
                    // Unknown key, or same key with a different selector: the
                    // stale old node stays in its slot and is removed with the
                    // rest of the unmatched old span.
                    _ => {
                        let elm = self.create_elm(new_start_vnode, queue)?;
                        self.tree.insert_before(parent, elm, before)?;
                    }
                }
                new_start += 1;
            }
        }

        if old_start >= old_end {
            let before = new_ch.get(new_end).and_then(VNode::elm);
            self.add_vnodes(parent, before, &new_ch[new_start..new_end], queue)?;
        } else if new_start >= new_end {
            self.remove_vnodes(parent, old[old_start..old_end].iter().flatten())?;
        }
        Ok(())
    }

    fn patch_vnode(&self, old: &VNode, new: &VNode, queue: &mut InsertQueue) -> Result<(), NodeError> {
        let hooks = new.hooks();
        if let Some(prepatch) = hooks.as_ref().and_then(|hooks| hooks.prepatch.clone()) {
            prepatch(old, new)?;
        }
        let elm = live(old)?;
        new.set_elm(Some(elm));
        if old.ptr_eq(new) {
            return Ok(());
        }

        if new.has_data() {
            for update in &self.modules.update {
                update(&self.tree, old, new)?;
            }
            if let Some(update) = hooks.as_ref().and_then(|hooks| hooks.update.clone()) {
                update(old, new)?;
            }
        }

        match new.text() {
            None => match (old.children(), new.children()) {
                (Some(old_ch), Some(new_ch)) => {
                    if !Rc::ptr_eq(old_ch, new_ch) {
                        self.update_children(elm, old_ch, new_ch, queue)?;
                    }
                }
                (None, Some(new_ch)) => {
                    if old.text().is_some() {
                        self.tree.set_text_content(elm, Some(""))?;
                    }
                    self.add_vnodes(elm, None, new_ch, queue)?;
                }
                (Some(old_ch), None) => self.remove_vnodes(elm, old_ch.iter())?,
                (None, None) => {
                    if old.text().is_some() {
                        self.tree.set_text_content(elm, Some(""))?;
                    }
                }
            },
            Some(text) => {
                if old.text() != Some(text) {
                    if let Some(old_ch) = old.children() {
                        self.remove_vnodes(elm, old_ch.iter())?;
                    }
                    self.tree.set_text_content(elm, Some(text))?;
                }
            }
        }

        if let Some(postpatch) = hooks.as_ref().and_then(|hooks| hooks.postpatch.clone()) {
            postpatch(old, new)?;
        }
        Ok(())
    }
}

impl<A> std::fmt::Debug for Patcher<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Patcher")
            .field("modules", &self.modules)
            .finish()
    }
}

#[cfg(test)]
#[path = "tests/patch_tests.rs"]
mod tests;
