//! Virtual node model.
//!
//! A [`VNode`] is a cheap, shared handle describing one tree position. Its
//! selector, key, children and text never change after construction; the
//! live reference and listener back-reference are owned mutable slots kept in
//! sync by the patcher and the event listener module.

use std::cell::{Cell, Ref, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;

use crate::event::{Event, EventListener};
use crate::hooks::Hooks;
use crate::{NodeError, NodeId};

/// Selector reserved for comment nodes.
pub const COMMENT_SELECTOR: &str = "!";

/// Identity token among siblings.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    Str(Rc<str>),
    Num(i64),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Str(value) => f.write_str(value),
            Key::Num(value) => write!(f, "{value}"),
        }
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Key::Str(Rc::from(value))
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Key::Str(Rc::from(value))
    }
}

impl From<i64> for Key {
    fn from(value: i64) -> Self {
        Key::Num(value)
    }
}

impl From<i32> for Key {
    fn from(value: i32) -> Self {
        Key::Num(i64::from(value))
    }
}

impl From<usize> for Key {
    /// Values beyond `i64::MAX` become string keys rather than wrapping.
    fn from(value: usize) -> Self {
        match i64::try_from(value) {
            Ok(num) => Key::Num(num),
            Err(_) => Key::Str(Rc::from(value.to_string())),
        }
    }
}

pub type DataMap = IndexMap<String, DataValue>;

type HandlerFn = dyn Fn(&Event, &VNode, &[DataValue]) -> Result<(), NodeError>;

/// Event handler stored in a node's data. Handlers compare by identity.
#[derive(Clone)]
pub struct Handler(Rc<HandlerFn>);

impl Handler {
    pub fn new(
        handler: impl Fn(&Event, &VNode, &[DataValue]) -> Result<(), NodeError> + 'static,
    ) -> Self {
        Self(Rc::new(handler))
    }

    pub fn call(&self, event: &Event, node: &VNode, args: &[DataValue]) -> Result<(), NodeError> {
        (self.0)(event, node, args)
    }
}

impl PartialEq for Handler {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Rc::as_ptr(&self.0), Rc::as_ptr(&other.0))
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Handler(..)")
    }
}

/// Tagged value held in a node's capability map.
#[derive(Clone, Debug, PartialEq)]
pub enum DataValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<DataValue>),
    Map(DataMap),
    Handler(Handler),
}

impl DataValue {
    /// Truthiness in the sense the property modules use to decide add vs. remove.
    pub fn is_truthy(&self) -> bool {
        match self {
            DataValue::Bool(value) => *value,
            DataValue::Int(value) => *value != 0,
            DataValue::Float(value) => *value != 0.0 && !value.is_nan(),
            DataValue::Str(value) => !value.is_empty(),
            DataValue::List(_) | DataValue::Map(_) | DataValue::Handler(_) => true,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            DataValue::Str(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&DataMap> {
        match self {
            DataValue::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[DataValue]> {
        match self {
            DataValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_handler(&self) -> Option<&Handler> {
        match self {
            DataValue::Handler(handler) => Some(handler),
            _ => None,
        }
    }
}

impl fmt::Display for DataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataValue::Bool(value) => write!(f, "{value}"),
            DataValue::Int(value) => write!(f, "{value}"),
            DataValue::Float(value) => write!(f, "{value}"),
            DataValue::Str(value) => f.write_str(value),
            DataValue::List(items) => {
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
            DataValue::Map(_) => f.write_str("[map]"),
            DataValue::Handler(_) => f.write_str("[handler]"),
        }
    }
}

impl From<bool> for DataValue {
    fn from(value: bool) -> Self {
        DataValue::Bool(value)
    }
}

impl From<i64> for DataValue {
    fn from(value: i64) -> Self {
        DataValue::Int(value)
    }
}

impl From<i32> for DataValue {
    fn from(value: i32) -> Self {
        DataValue::Int(i64::from(value))
    }
}

impl From<f64> for DataValue {
    fn from(value: f64) -> Self {
        DataValue::Float(value)
    }
}

impl From<&str> for DataValue {
    fn from(value: &str) -> Self {
        DataValue::Str(value.to_string())
    }
}

impl From<String> for DataValue {
    fn from(value: String) -> Self {
        DataValue::Str(value)
    }
}

impl From<DataMap> for DataValue {
    fn from(value: DataMap) -> Self {
        DataValue::Map(value)
    }
}

impl From<Vec<DataValue>> for DataValue {
    fn from(value: Vec<DataValue>) -> Self {
        DataValue::List(value)
    }
}

impl From<Handler> for DataValue {
    fn from(value: Handler) -> Self {
        DataValue::Handler(value)
    }
}

/// Entry `name` of `map` as a nested map, replacing it with an empty map when
/// it is absent or holds another kind of value.
pub fn nested_map_mut<'a>(map: &'a mut DataMap, name: &str) -> &'a mut DataMap {
    let slot = map
        .entry(name.to_string())
        .or_insert_with(|| DataValue::Map(DataMap::new()));
    if !matches!(slot, DataValue::Map(_)) {
        *slot = DataValue::Map(DataMap::new());
    }
    match slot {
        DataValue::Map(map) => map,
        _ => unreachable!("slot was just replaced with a map"),
    }
}

/// Property bag of a virtual node.
///
/// The engine reads only `key`, `ns` and `hook`; every other entry lives in the
/// capability map and belongs to whichever module claims its name.
#[derive(Clone, Default)]
pub struct VNodeData {
    pub key: Option<Key>,
    pub ns: Option<String>,
    pub hook: Option<Rc<Hooks>>,
    entries: DataMap,
}

impl VNodeData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&DataValue> {
        self.entries.get(name)
    }

    pub fn get_map(&self, name: &str) -> Option<&DataMap> {
        self.entries.get(name).and_then(DataValue::as_map)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<DataValue>) -> Option<DataValue> {
        self.entries.insert(name.into(), value.into())
    }

    pub fn remove(&mut self, name: &str) -> Option<DataValue> {
        self.entries.shift_remove(name)
    }

    /// Map entry `name`, created empty when absent or not a map.
    pub fn map_mut(&mut self, name: &str) -> &mut DataMap {
        nested_map_mut(&mut self.entries, name)
    }

    pub fn entries(&self) -> &DataMap {
        &self.entries
    }
}

impl fmt::Debug for VNodeData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VNodeData")
            .field("key", &self.key)
            .field("ns", &self.ns)
            .field("hook", &self.hook.is_some())
            .field("entries", &self.entries)
            .finish()
    }
}

struct VNodeInner {
    sel: Option<String>,
    key: Option<Key>,
    data: RefCell<Option<VNodeData>>,
    children: Option<Rc<[VNode]>>,
    text: Option<String>,
    elm: Cell<Option<NodeId>>,
    listener: RefCell<Option<Rc<dyn EventListener>>>,
}

/// One position in a virtual tree.
#[derive(Clone)]
pub struct VNode {
    inner: Rc<VNodeInner>,
}

impl VNode {
    /// Raw constructor; the key is taken from `data.key`.
    pub fn new(
        sel: Option<String>,
        data: Option<VNodeData>,
        children: Option<Vec<VNode>>,
        text: Option<String>,
        elm: Option<NodeId>,
    ) -> Self {
        let key = data.as_ref().and_then(|data| data.key.clone());
        Self {
            inner: Rc::new(VNodeInner {
                sel,
                key,
                data: RefCell::new(data),
                children: children.map(Rc::from),
                text,
                elm: Cell::new(elm),
                listener: RefCell::new(None),
            }),
        }
    }

    /// Node sharing an existing child list; the patcher skips child
    /// reconciliation when both sides hold the same list.
    pub fn with_shared_children(
        sel: Option<String>,
        data: Option<VNodeData>,
        children: Rc<[VNode]>,
    ) -> Self {
        let key = data.as_ref().and_then(|data| data.key.clone());
        Self {
            inner: Rc::new(VNodeInner {
                sel,
                key,
                data: RefCell::new(data),
                children: Some(children),
                text: None,
                elm: Cell::new(None),
                listener: RefCell::new(None),
            }),
        }
    }

    /// Selector-less leaf carrying only text.
    pub fn text_node(text: impl Into<String>) -> Self {
        Self::new(None, None, None, Some(text.into()), None)
    }

    /// Placeholder handed to `create` hooks as the "old" node.
    pub(crate) fn empty() -> Self {
        Self::new(
            Some(String::new()),
            Some(VNodeData::default()),
            Some(Vec::new()),
            None,
            None,
        )
    }

    pub fn sel(&self) -> Option<&str> {
        self.inner.sel.as_deref()
    }

    pub fn key(&self) -> Option<&Key> {
        self.inner.key.as_ref()
    }

    pub fn is_comment(&self) -> bool {
        self.sel() == Some(COMMENT_SELECTOR)
    }

    pub fn data(&self) -> Ref<'_, Option<VNodeData>> {
        self.inner.data.borrow()
    }

    pub fn has_data(&self) -> bool {
        self.inner.data.borrow().is_some()
    }

    /// Replaces the data bag. Intended for `init` hooks; the key is fixed at
    /// construction and does not follow.
    pub fn set_data(&self, data: Option<VNodeData>) {
        *self.inner.data.borrow_mut() = data;
    }

    /// Runs `f` on the data bag, creating an empty one first if needed.
    pub fn update_data<R>(&self, f: impl FnOnce(&mut VNodeData) -> R) -> R {
        let mut data = self.inner.data.borrow_mut();
        f(data.get_or_insert_with(VNodeData::default))
    }

    /// Runs `f` only when the node carries data.
    pub(crate) fn with_existing_data<R>(&self, f: impl FnOnce(&mut VNodeData) -> R) -> Option<R> {
        self.inner.data.borrow_mut().as_mut().map(f)
    }

    pub fn hooks(&self) -> Option<Rc<Hooks>> {
        self.inner
            .data
            .borrow()
            .as_ref()
            .and_then(|data| data.hook.clone())
    }

    /// Cloned capability map entry.
    pub fn get(&self, name: &str) -> Option<DataValue> {
        self.inner
            .data
            .borrow()
            .as_ref()
            .and_then(|data| data.get(name).cloned())
    }

    /// Cloned capability map entry when it is a map.
    pub fn get_map(&self, name: &str) -> Option<DataMap> {
        self.inner
            .data
            .borrow()
            .as_ref()
            .and_then(|data| data.get_map(name).cloned())
    }

    pub fn namespace(&self) -> Option<String> {
        self.inner
            .data
            .borrow()
            .as_ref()
            .and_then(|data| data.ns.clone())
    }

    pub fn children(&self) -> Option<&Rc<[VNode]>> {
        self.inner.children.as_ref()
    }

    pub fn text(&self) -> Option<&str> {
        self.inner.text.as_deref()
    }

    pub fn elm(&self) -> Option<NodeId> {
        self.inner.elm.get()
    }

    pub fn set_elm(&self, elm: Option<NodeId>) {
        self.inner.elm.set(elm);
    }

    pub fn listener(&self) -> Option<Rc<dyn EventListener>> {
        self.inner.listener.borrow().clone()
    }

    pub fn set_listener(&self, listener: Option<Rc<dyn EventListener>>) {
        *self.inner.listener.borrow_mut() = listener;
    }

    pub fn ptr_eq(&self, other: &VNode) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Identity test: equal key and equal selector.
    pub fn same_vnode(&self, other: &VNode) -> bool {
        self.inner.key == other.inner.key && self.inner.sel == other.inner.sel
    }

    pub fn downgrade(&self) -> WeakVNode {
        WeakVNode(Rc::downgrade(&self.inner))
    }
}

impl fmt::Debug for VNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VNode")
            .field("sel", &self.inner.sel)
            .field("key", &self.inner.key)
            .field("text", &self.inner.text)
            .field("children", &self.inner.children.as_ref().map(|c| c.len()))
            .field("elm", &self.inner.elm.get())
            .finish()
    }
}

impl From<&str> for VNode {
    fn from(value: &str) -> Self {
        VNode::text_node(value)
    }
}

impl From<String> for VNode {
    fn from(value: String) -> Self {
        VNode::text_node(value)
    }
}

/// Non-owning reference to a [`VNode`].
#[derive(Clone, Default)]
pub struct WeakVNode(Weak<VNodeInner>);

impl WeakVNode {
    pub fn upgrade(&self) -> Option<VNode> {
        self.0.upgrade().map(|inner| VNode { inner })
    }
}

pub fn same_vnode(a: &VNode, b: &VNode) -> bool {
    a.same_vnode(b)
}

/// Tag, id and class list encoded in an element selector such as `div#main.a.b`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selector<'a> {
    pub tag: &'a str,
    pub id: Option<&'a str>,
    /// Classes joined by single spaces, ready for a `class` attribute.
    pub class_name: Option<String>,
}

impl<'a> Selector<'a> {
    /// Locates the first `#` and the first `.` after it; the tag is everything
    /// before whichever comes first.
    pub fn parse(sel: &'a str) -> Self {
        let len = sel.len();
        let hash_idx = sel.find('#');
        let dot_idx = match hash_idx {
            Some(hash) => sel[hash..].find('.').map(|offset| hash + offset),
            None => sel.find('.'),
        };
        let hash = hash_idx.filter(|&idx| idx > 0).unwrap_or(len);
        let dot = dot_idx.filter(|&idx| idx > 0).unwrap_or(len);
        let tag = if hash_idx.is_some() || dot_idx.is_some() {
            &sel[..hash.min(dot)]
        } else {
            sel
        };
        let id = (hash < dot).then(|| &sel[hash + 1..dot]);
        let class_name = dot_idx
            .filter(|&idx| idx > 0)
            .map(|_| sel[dot + 1..].replace('.', " "));
        Self { tag, id, class_name }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selector_parses_tag_id_and_classes() {
        let parsed = Selector::parse("div#main.a.b");
        assert_eq!(parsed.tag, "div");
        assert_eq!(parsed.id, Some("main"));
        assert_eq!(parsed.class_name.as_deref(), Some("a b"));
    }

    #[test]
    fn selector_without_shorthand_is_just_a_tag() {
        let parsed = Selector::parse("span");
        assert_eq!(parsed.tag, "span");
        assert_eq!(parsed.id, None);
        assert_eq!(parsed.class_name, None);
    }

    #[test]
    fn selector_with_classes_only() {
        let parsed = Selector::parse("p.lead.muted");
        assert_eq!(parsed.tag, "p");
        assert_eq!(parsed.id, None);
        assert_eq!(parsed.class_name.as_deref(), Some("lead muted"));
    }

    #[test]
    fn selector_id_only() {
        let parsed = Selector::parse("section#intro");
        assert_eq!(parsed.tag, "section");
        assert_eq!(parsed.id, Some("intro"));
        assert_eq!(parsed.class_name, None);
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn oversized_usize_keys_do_not_wrap() {
        assert_eq!(Key::from(42usize), Key::Num(42));
        let huge = Key::from(usize::MAX);
        assert_eq!(huge, Key::from(usize::MAX.to_string()));
        assert_ne!(huge, Key::Num(-1));
    }

    #[test]
    fn nested_maps_replace_scalar_entries() {
        let mut map = DataMap::new();
        map.insert("style".into(), DataValue::from("color: red"));
        nested_map_mut(&mut map, "style").insert("color".into(), DataValue::from("red"));
        nested_map_mut(&mut map, "style").insert("width".into(), DataValue::from("1px"));
        let style = map.get("style").and_then(DataValue::as_map).expect("map");
        assert_eq!(style.len(), 2);
    }

    #[test]
    fn identity_is_key_and_selector() {
        let mut keyed = VNodeData::new();
        keyed.key = Some(Key::from("a"));
        let a = VNode::new(Some("li".into()), Some(keyed.clone()), None, Some("one".into()), None);
        let b = VNode::new(Some("li".into()), Some(keyed.clone()), None, Some("two".into()), None);
        let c = VNode::new(Some("p".into()), Some(keyed), None, None, None);
        let unkeyed = VNode::new(Some("li".into()), None, None, None, None);

        assert!(a.same_vnode(&b));
        assert!(!a.same_vnode(&c));
        assert!(!a.same_vnode(&unkeyed));
        assert!(!a.ptr_eq(&b));
        assert!(a.ptr_eq(&a.clone()));
    }

    #[test]
    fn key_is_fixed_at_construction() {
        let mut data = VNodeData::new();
        data.key = Some(Key::from(1));
        let node = VNode::new(Some("li".into()), Some(data), None, None, None);
        node.set_data(Some(VNodeData::new()));
        assert_eq!(node.key(), Some(&Key::Num(1)));
    }

    #[test]
    fn map_mut_replaces_non_map_entries() {
        let mut data = VNodeData::new();
        data.insert("attrs", "oops");
        data.map_mut("attrs").insert("href".into(), DataValue::from("/"));
        assert_eq!(
            data.get_map("attrs").and_then(|attrs| attrs.get("href")),
            Some(&DataValue::from("/"))
        );
    }

    #[test]
    fn truthiness_follows_value_kind() {
        assert!(DataValue::from(true).is_truthy());
        assert!(!DataValue::from(false).is_truthy());
        assert!(!DataValue::from(0).is_truthy());
        assert!(DataValue::from(3).is_truthy());
        assert!(!DataValue::from("").is_truthy());
        assert!(DataValue::from("x").is_truthy());
        assert!(!DataValue::Float(f64::NAN).is_truthy());
    }

    #[test]
    fn handlers_compare_by_identity() {
        let handler = Handler::new(|_, _, _| Ok(()));
        let same = handler.clone();
        let other = Handler::new(|_, _, _| Ok(()));
        assert_eq!(handler, same);
        assert_ne!(handler, other);
    }

    #[test]
    fn weak_reference_does_not_keep_node_alive() {
        let node = VNode::text_node("hi");
        let weak = node.downgrade();
        assert!(weak.upgrade().is_some());
        drop(node);
        assert!(weak.upgrade().is_none());
    }
}
