//! Lifecycle callbacks.
//!
//! [`Hooks`] are per-node overrides stored in a node's data. A [`Module`] is a
//! named set of global callbacks invoked for every node; the
//! [`ModuleRegistry`] flattens a module list into one ordered list per
//! lifecycle name when the engine is built.

use std::fmt;
use std::rc::Rc;

use crate::removal::RemovalHandle;
use crate::vnode::VNode;
use crate::NodeError;

pub type NodeHookFn = dyn Fn(&VNode) -> Result<(), NodeError>;
pub type PairHookFn = dyn Fn(&VNode, &VNode) -> Result<(), NodeError>;
pub type RemoveHookFn = dyn Fn(&VNode, RemovalHandle) -> Result<(), NodeError>;

/// Per-node lifecycle overrides.
#[derive(Clone, Default)]
pub struct Hooks {
    /// Runs before materialization; may rewrite the node's data.
    pub init: Option<Rc<NodeHookFn>>,
    /// Receives the shared empty placeholder and the node.
    pub create: Option<Rc<PairHookFn>>,
    /// Fires once the whole subtree of the current patch is attached.
    pub insert: Option<Rc<NodeHookFn>>,
    pub prepatch: Option<Rc<PairHookFn>>,
    pub update: Option<Rc<PairHookFn>>,
    pub postpatch: Option<Rc<PairHookFn>>,
    pub destroy: Option<Rc<NodeHookFn>>,
    /// Takes over the node's own share of the removal countdown.
    pub remove: Option<Rc<RemoveHookFn>>,
}

impl Hooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_init(mut self, hook: impl Fn(&VNode) -> Result<(), NodeError> + 'static) -> Self {
        self.init = Some(Rc::new(hook));
        self
    }

    pub fn on_create(
        mut self,
        hook: impl Fn(&VNode, &VNode) -> Result<(), NodeError> + 'static,
    ) -> Self {
        self.create = Some(Rc::new(hook));
        self
    }

    pub fn on_insert(mut self, hook: impl Fn(&VNode) -> Result<(), NodeError> + 'static) -> Self {
        self.insert = Some(Rc::new(hook));
        self
    }

    pub fn on_prepatch(
        mut self,
        hook: impl Fn(&VNode, &VNode) -> Result<(), NodeError> + 'static,
    ) -> Self {
        self.prepatch = Some(Rc::new(hook));
        self
    }

    pub fn on_update(
        mut self,
        hook: impl Fn(&VNode, &VNode) -> Result<(), NodeError> + 'static,
    ) -> Self {
        self.update = Some(Rc::new(hook));
        self
    }

    pub fn on_postpatch(
        mut self,
        hook: impl Fn(&VNode, &VNode) -> Result<(), NodeError> + 'static,
    ) -> Self {
        self.postpatch = Some(Rc::new(hook));
        self
    }

    pub fn on_destroy(mut self, hook: impl Fn(&VNode) -> Result<(), NodeError> + 'static) -> Self {
        self.destroy = Some(Rc::new(hook));
        self
    }

    pub fn on_remove(
        mut self,
        hook: impl Fn(&VNode, RemovalHandle) -> Result<(), NodeError> + 'static,
    ) -> Self {
        self.remove = Some(Rc::new(hook));
        self
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("init", &self.init.is_some())
            .field("create", &self.create.is_some())
            .field("insert", &self.insert.is_some())
            .field("prepatch", &self.prepatch.is_some())
            .field("update", &self.update.is_some())
            .field("postpatch", &self.postpatch.is_some())
            .field("destroy", &self.destroy.is_some())
            .field("remove", &self.remove.is_some())
            .finish()
    }
}

pub type CycleHook<A> = Rc<dyn Fn(&A) -> Result<(), NodeError>>;
pub type ProjectHook<A> = Rc<dyn Fn(&A, &VNode, &VNode) -> Result<(), NodeError>>;
pub type DestroyHook<A> = Rc<dyn Fn(&A, &VNode) -> Result<(), NodeError>>;
pub type RemoveHook<A> = Rc<dyn Fn(&A, &VNode, RemovalHandle) -> Result<(), NodeError>>;

/// Globally registered property projector, generic over the live tree adapter.
pub struct Module<A> {
    name: &'static str,
    pre: Option<CycleHook<A>>,
    create: Option<ProjectHook<A>>,
    update: Option<ProjectHook<A>>,
    destroy: Option<DestroyHook<A>>,
    remove: Option<RemoveHook<A>>,
    post: Option<CycleHook<A>>,
}

impl<A> Clone for Module<A> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            pre: self.pre.clone(),
            create: self.create.clone(),
            update: self.update.clone(),
            destroy: self.destroy.clone(),
            remove: self.remove.clone(),
            post: self.post.clone(),
        }
    }
}

impl<A> Module<A> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            pre: None,
            create: None,
            update: None,
            destroy: None,
            remove: None,
            post: None,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn on_pre(mut self, hook: impl Fn(&A) -> Result<(), NodeError> + 'static) -> Self {
        self.pre = Some(Rc::new(hook));
        self
    }

    pub fn on_create(
        mut self,
        hook: impl Fn(&A, &VNode, &VNode) -> Result<(), NodeError> + 'static,
    ) -> Self {
        self.create = Some(Rc::new(hook));
        self
    }

    pub fn on_update(
        mut self,
        hook: impl Fn(&A, &VNode, &VNode) -> Result<(), NodeError> + 'static,
    ) -> Self {
        self.update = Some(Rc::new(hook));
        self
    }

    pub fn on_destroy(mut self, hook: impl Fn(&A, &VNode) -> Result<(), NodeError> + 'static) -> Self {
        self.destroy = Some(Rc::new(hook));
        self
    }

    pub fn on_remove(
        mut self,
        hook: impl Fn(&A, &VNode, RemovalHandle) -> Result<(), NodeError> + 'static,
    ) -> Self {
        self.remove = Some(Rc::new(hook));
        self
    }

    pub fn on_post(mut self, hook: impl Fn(&A) -> Result<(), NodeError> + 'static) -> Self {
        self.post = Some(Rc::new(hook));
        self
    }
}

impl<A> fmt::Debug for Module<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Module")
            .field("name", &self.name)
            .field("pre", &self.pre.is_some())
            .field("create", &self.create.is_some())
            .field("update", &self.update.is_some())
            .field("destroy", &self.destroy.is_some())
            .field("remove", &self.remove.is_some())
            .field("post", &self.post.is_some())
            .finish()
    }
}

/// Ordered callback lists per lifecycle name, fixed at construction.
pub struct ModuleRegistry<A> {
    names: Vec<&'static str>,
    pub(crate) pre: Vec<CycleHook<A>>,
    pub(crate) create: Vec<ProjectHook<A>>,
    pub(crate) update: Vec<ProjectHook<A>>,
    pub(crate) destroy: Vec<DestroyHook<A>>,
    pub(crate) remove: Vec<RemoveHook<A>>,
    pub(crate) post: Vec<CycleHook<A>>,
}

impl<A> ModuleRegistry<A> {
    pub fn new(modules: impl IntoIterator<Item = Module<A>>) -> Self {
        let mut registry = Self {
            names: Vec::new(),
            pre: Vec::new(),
            create: Vec::new(),
            update: Vec::new(),
            destroy: Vec::new(),
            remove: Vec::new(),
            post: Vec::new(),
        };
        for module in modules {
            registry.names.push(module.name);
            registry.pre.extend(module.pre);
            registry.create.extend(module.create);
            registry.update.extend(module.update);
            registry.destroy.extend(module.destroy);
            registry.remove.extend(module.remove);
            registry.post.extend(module.post);
        }
        registry
    }

    pub fn module_names(&self) -> &[&'static str] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Number of modules taking part in removals.
    pub fn remove_participants(&self) -> usize {
        self.remove.len()
    }
}

impl<A> Default for ModuleRegistry<A> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl<A> fmt::Debug for ModuleRegistry<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleRegistry")
            .field("modules", &self.names)
            .field("pre", &self.pre.len())
            .field("create", &self.create.len())
            .field("update", &self.update.len())
            .field("destroy", &self.destroy.len())
            .field("remove", &self.remove.len())
            .field("post", &self.post.len())
            .finish()
    }
}
