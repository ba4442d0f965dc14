//! Headless in-memory live tree with DOM-like semantics.

use std::cell::RefCell;
use std::fmt::Write as _;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::adapter::{NodeKind, TreeAdapter};
use crate::event::{Event, EventListener};
use crate::vnode::DataValue;
use crate::{NodeError, NodeId};

/// Element payload of a live node.
#[derive(Clone, Default)]
pub struct ElementRecord {
    pub tag: String,
    pub namespace: Option<String>,
    pub attributes: IndexMap<String, String>,
    /// Namespace URI of attributes set through `set_attribute_ns`.
    pub attribute_namespaces: IndexMap<String, String>,
    pub properties: IndexMap<String, DataValue>,
    pub styles: IndexMap<String, String>,
    listeners: Vec<(String, Rc<dyn EventListener>)>,
}

enum LiveData {
    Element(ElementRecord),
    Text(String),
    Comment(String),
}

struct LiveNode {
    data: LiveData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Default)]
struct TreeStore {
    nodes: Vec<LiveNode>,
}

impl TreeStore {
    fn node(&self, id: NodeId) -> Result<&LiveNode, NodeError> {
        self.nodes.get(id).ok_or(NodeError::Missing { id })
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut LiveNode, NodeError> {
        self.nodes.get_mut(id).ok_or(NodeError::Missing { id })
    }

    fn element(&self, id: NodeId) -> Result<&ElementRecord, NodeError> {
        match &self.node(id)?.data {
            LiveData::Element(element) => Ok(element),
            _ => Err(NodeError::NotAnElement { id }),
        }
    }

    fn element_mut(&mut self, id: NodeId) -> Result<&mut ElementRecord, NodeError> {
        match &mut self.node_mut(id)?.data {
            LiveData::Element(element) => Ok(element),
            _ => Err(NodeError::NotAnElement { id }),
        }
    }

    fn push(&mut self, data: LiveData) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(LiveNode {
            data,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    fn detach(&mut self, id: NodeId) -> Result<(), NodeError> {
        if let Some(parent) = self.node_mut(id)?.parent.take() {
            self.node_mut(parent)?.children.retain(|&child| child != id);
        }
        Ok(())
    }

    fn is_ancestor(&self, ancestor: NodeId, mut node: NodeId) -> Result<bool, NodeError> {
        loop {
            if node == ancestor {
                return Ok(true);
            }
            match self.node(node)?.parent {
                Some(parent) => node = parent,
                None => return Ok(false),
            }
        }
    }

    fn collect_text(&self, id: NodeId, out: &mut String) -> Result<(), NodeError> {
        let node = self.node(id)?;
        match &node.data {
            LiveData::Text(text) => out.push_str(text),
            LiveData::Comment(_) => {}
            LiveData::Element(_) => {
                for &child in &node.children {
                    self.collect_text(child, out)?;
                }
            }
        }
        Ok(())
    }
}

/// Arena-backed live tree. Cloning yields another handle to the same tree.
///
/// Removed nodes stay in the arena, detached, so a virtual node that still
/// refers to them can be inspected or re-inserted.
#[derive(Clone, Default)]
pub struct MemoryTree {
    store: Rc<RefCell<TreeStore>>,
}

impl MemoryTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes ever created, attached or not.
    pub fn len(&self) -> usize {
        self.store.borrow().nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: NodeId) -> bool {
        id < self.len()
    }

    pub fn children(&self, id: NodeId) -> Result<Vec<NodeId>, NodeError> {
        Ok(self.store.borrow().node(id)?.children.clone())
    }

    /// Runs `f` against the element record of `id`.
    pub fn with_element<R>(
        &self,
        id: NodeId,
        f: impl FnOnce(&ElementRecord) -> R,
    ) -> Result<R, NodeError> {
        let store = self.store.borrow();
        Ok(f(store.element(id)?))
    }

    fn with_element_mut<R>(
        &self,
        id: NodeId,
        f: impl FnOnce(&mut ElementRecord) -> R,
    ) -> Result<R, NodeError> {
        let mut store = self.store.borrow_mut();
        Ok(f(store.element_mut(id)?))
    }

    pub fn attribute(&self, element: NodeId, name: &str) -> Result<Option<String>, NodeError> {
        self.with_element(element, |record| record.attributes.get(name).cloned())
    }

    pub fn attributes(&self, element: NodeId) -> Result<Vec<(String, String)>, NodeError> {
        self.with_element(element, |record| {
            record
                .attributes
                .iter()
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect()
        })
    }

    pub fn set_attribute(&self, element: NodeId, name: &str, value: &str) -> Result<(), NodeError> {
        self.with_element_mut(element, |record| {
            record.attribute_namespaces.shift_remove(name);
            record.attributes.insert(name.to_string(), value.to_string());
        })
    }

    pub fn set_attribute_ns(
        &self,
        element: NodeId,
        namespace: &str,
        name: &str,
        value: &str,
    ) -> Result<(), NodeError> {
        self.with_element_mut(element, |record| {
            record
                .attribute_namespaces
                .insert(name.to_string(), namespace.to_string());
            record.attributes.insert(name.to_string(), value.to_string());
        })
    }

    pub fn attribute_namespace(
        &self,
        element: NodeId,
        name: &str,
    ) -> Result<Option<String>, NodeError> {
        self.with_element(element, |record| record.attribute_namespaces.get(name).cloned())
    }

    pub fn remove_attribute(&self, element: NodeId, name: &str) -> Result<(), NodeError> {
        self.with_element_mut(element, |record| {
            record.attribute_namespaces.shift_remove(name);
            record.attributes.shift_remove(name);
        })
    }

    pub fn class_list(&self, element: NodeId) -> Result<Vec<String>, NodeError> {
        Ok(self
            .attribute(element, "class")?
            .map(|class| class.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default())
    }

    pub fn has_class(&self, element: NodeId, class: &str) -> Result<bool, NodeError> {
        Ok(self.class_list(element)?.iter().any(|name| name == class))
    }

    pub fn add_class(&self, element: NodeId, class: &str) -> Result<(), NodeError> {
        let mut classes = self.class_list(element)?;
        if !classes.iter().any(|name| name == class) {
            classes.push(class.to_string());
            self.set_attribute(element, "class", &classes.join(" "))?;
        }
        Ok(())
    }

    pub fn remove_class(&self, element: NodeId, class: &str) -> Result<(), NodeError> {
        let mut classes = self.class_list(element)?;
        let before = classes.len();
        classes.retain(|name| name != class);
        if classes.len() != before {
            self.set_attribute(element, "class", &classes.join(" "))?;
        }
        Ok(())
    }

    pub fn property(&self, element: NodeId, name: &str) -> Result<Option<DataValue>, NodeError> {
        self.with_element(element, |record| record.properties.get(name).cloned())
    }

    pub fn set_property(
        &self,
        element: NodeId,
        name: &str,
        value: DataValue,
    ) -> Result<(), NodeError> {
        self.with_element_mut(element, |record| {
            record.properties.insert(name.to_string(), value);
        })
    }

    pub fn remove_property(&self, element: NodeId, name: &str) -> Result<(), NodeError> {
        self.with_element_mut(element, |record| {
            record.properties.shift_remove(name);
        })
    }

    pub fn style(&self, element: NodeId, name: &str) -> Result<Option<String>, NodeError> {
        self.with_element(element, |record| record.styles.get(name).cloned())
    }

    pub fn set_style(&self, element: NodeId, name: &str, value: &str) -> Result<(), NodeError> {
        self.with_element_mut(element, |record| {
            if value.is_empty() {
                record.styles.shift_remove(name);
            } else {
                record.styles.insert(name.to_string(), value.to_string());
            }
        })
    }

    pub fn remove_style(&self, element: NodeId, name: &str) -> Result<(), NodeError> {
        self.with_element_mut(element, |record| {
            record.styles.shift_remove(name);
        })
    }

    /// Properties listed in the element's `transition-property` style.
    pub fn transition_properties(&self, element: NodeId) -> Result<Vec<String>, NodeError> {
        Ok(self
            .style(element, "transition-property")?
            .map(|value| {
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default())
    }

    /// Attaches `listener` for `kind`; attaching the same listener twice is a no-op.
    pub fn add_event_listener(
        &self,
        element: NodeId,
        kind: &str,
        listener: Rc<dyn EventListener>,
    ) -> Result<(), NodeError> {
        self.with_element_mut(element, |record| {
            let present = record.listeners.iter().any(|(name, existing)| {
                name == kind && std::ptr::addr_eq(Rc::as_ptr(existing), Rc::as_ptr(&listener))
            });
            if !present {
                record.listeners.push((kind.to_string(), listener));
            }
        })
    }

    pub fn remove_event_listener(
        &self,
        element: NodeId,
        kind: &str,
        listener: &Rc<dyn EventListener>,
    ) -> Result<(), NodeError> {
        self.with_element_mut(element, |record| {
            record.listeners.retain(|(name, existing)| {
                !(name == kind && std::ptr::addr_eq(Rc::as_ptr(existing), Rc::as_ptr(listener)))
            });
        })
    }

    pub fn listener_count(&self, element: NodeId, kind: &str) -> Result<usize, NodeError> {
        self.with_element(element, |record| {
            record
                .listeners
                .iter()
                .filter(|(name, _)| name == kind)
                .count()
        })
    }

    /// Delivers `event` to the listeners of its target for its kind.
    pub fn dispatch_event(&self, event: &Event) -> Result<(), NodeError> {
        let listeners: Vec<Rc<dyn EventListener>> = self.with_element(event.target, |record| {
            record
                .listeners
                .iter()
                .filter(|(name, _)| *name == event.kind)
                .map(|(_, listener)| Rc::clone(listener))
                .collect()
        })?;
        for listener in listeners {
            listener.handle_event(event)?;
        }
        Ok(())
    }

    /// HTML-like serialization of the subtree rooted at `id`.
    pub fn render(&self, id: NodeId) -> Result<String, NodeError> {
        let mut out = String::new();
        self.render_into(id, &mut out)?;
        Ok(out)
    }

    fn render_into(&self, id: NodeId, out: &mut String) -> Result<(), NodeError> {
        let children = {
            let store = self.store.borrow();
            let node = store.node(id)?;
            match &node.data {
                LiveData::Text(text) => {
                    out.push_str(text);
                    return Ok(());
                }
                LiveData::Comment(text) => {
                    let _ = write!(out, "<!--{text}-->");
                    return Ok(());
                }
                LiveData::Element(record) => {
                    let _ = write!(out, "<{}", record.tag);
                    for (name, value) in &record.attributes {
                        let _ = write!(out, " {name}=\"{value}\"");
                    }
                    if !record.styles.is_empty() {
                        let style = record
                            .styles
                            .iter()
                            .map(|(name, value)| format!("{name}: {value}"))
                            .collect::<Vec<_>>()
                            .join("; ");
                        let _ = write!(out, " style=\"{style}\"");
                    }
                    out.push('>');
                }
            }
            node.children.clone()
        };
        for child in children {
            self.render_into(child, out)?;
        }
        let tag = self.with_element(id, |record| record.tag.clone())?;
        let _ = write!(out, "</{tag}>");
        Ok(())
    }

    /// Indented outline of the subtree, one node per line.
    pub fn dump_tree(&self, root: Option<NodeId>) -> String {
        let mut output = String::new();
        if let Some(root_id) = root {
            self.dump_node(&mut output, root_id, 0);
        } else {
            output.push_str("(no root)\n");
        }
        output
    }

    fn dump_node(&self, output: &mut String, id: NodeId, depth: usize) {
        let indent = "  ".repeat(depth);
        let children = {
            let store = self.store.borrow();
            match store.node(id) {
                Ok(node) => {
                    match &node.data {
                        LiveData::Element(record) => {
                            let _ = writeln!(output, "{indent}[{id}] <{}>", record.tag);
                        }
                        LiveData::Text(text) => {
                            let _ = writeln!(output, "{indent}[{id}] {text:?}");
                        }
                        LiveData::Comment(text) => {
                            let _ = writeln!(output, "{indent}[{id}] <!--{text}-->");
                        }
                    }
                    node.children.clone()
                }
                Err(_) => {
                    let _ = writeln!(output, "{indent}[{id}] (missing)");
                    Vec::new()
                }
            }
        };
        for child in children {
            self.dump_node(output, child, depth + 1);
        }
    }
}

impl TreeAdapter for MemoryTree {
    fn create_element(&self, tag: &str) -> Result<NodeId, NodeError> {
        Ok(self.store.borrow_mut().push(LiveData::Element(ElementRecord {
            tag: tag.to_string(),
            ..ElementRecord::default()
        })))
    }

    fn create_element_ns(&self, namespace: &str, tag: &str) -> Result<NodeId, NodeError> {
        Ok(self.store.borrow_mut().push(LiveData::Element(ElementRecord {
            tag: tag.to_string(),
            namespace: Some(namespace.to_string()),
            ..ElementRecord::default()
        })))
    }

    fn create_text_node(&self, text: &str) -> Result<NodeId, NodeError> {
        Ok(self.store.borrow_mut().push(LiveData::Text(text.to_string())))
    }

    fn create_comment(&self, text: &str) -> Result<NodeId, NodeError> {
        Ok(self.store.borrow_mut().push(LiveData::Comment(text.to_string())))
    }

    fn insert_before(
        &self,
        parent: NodeId,
        node: NodeId,
        reference: Option<NodeId>,
    ) -> Result<(), NodeError> {
        let mut store = self.store.borrow_mut();
        store.element(parent)?;
        store.node(node)?;
        if let Some(reference) = reference {
            if store.node(reference)?.parent != Some(parent) {
                return Err(NodeError::NotAChild {
                    parent,
                    child: reference,
                });
            }
            if reference == node {
                return Ok(());
            }
        }
        if store.is_ancestor(node, parent)? {
            return Err(NodeError::InvalidHierarchy {
                parent,
                child: node,
            });
        }
        store.detach(node)?;
        let siblings = &mut store.node_mut(parent)?.children;
        let index = reference
            .and_then(|reference| siblings.iter().position(|&child| child == reference))
            .unwrap_or(siblings.len());
        siblings.insert(index, node);
        store.node_mut(node)?.parent = Some(parent);
        Ok(())
    }

    fn remove_child(&self, parent: NodeId, child: NodeId) -> Result<(), NodeError> {
        let mut store = self.store.borrow_mut();
        if store.node(child)?.parent != Some(parent) {
            return Err(NodeError::NotAChild { parent, child });
        }
        store.detach(child)
    }

    fn append_child(&self, parent: NodeId, child: NodeId) -> Result<(), NodeError> {
        self.insert_before(parent, child, None)
    }

    fn parent_node(&self, node: NodeId) -> Result<Option<NodeId>, NodeError> {
        Ok(self.store.borrow().node(node)?.parent)
    }

    fn next_sibling(&self, node: NodeId) -> Result<Option<NodeId>, NodeError> {
        let store = self.store.borrow();
        let Some(parent) = store.node(node)?.parent else {
            return Ok(None);
        };
        let siblings = &store.node(parent)?.children;
        Ok(siblings
            .iter()
            .position(|&child| child == node)
            .and_then(|index| siblings.get(index + 1).copied()))
    }

    fn tag_name(&self, element: NodeId) -> Result<String, NodeError> {
        self.with_element(element, |record| match record.namespace {
            Some(_) => record.tag.clone(),
            None => record.tag.to_uppercase(),
        })
    }

    fn set_text_content(&self, node: NodeId, text: Option<&str>) -> Result<(), NodeError> {
        let text = text.unwrap_or("");
        let mut store = self.store.borrow_mut();
        let live = store.node_mut(node)?;
        if let LiveData::Text(data) | LiveData::Comment(data) = &mut live.data {
            *data = text.to_string();
            return Ok(());
        }
        let children = std::mem::take(&mut live.children);
        for child in children {
            store.node_mut(child)?.parent = None;
        }
        if !text.is_empty() {
            let child = store.push(LiveData::Text(text.to_string()));
            store.node_mut(child)?.parent = Some(node);
            store.node_mut(node)?.children.push(child);
        }
        Ok(())
    }

    fn text_content(&self, node: NodeId) -> Result<Option<String>, NodeError> {
        let store = self.store.borrow();
        match &store.node(node)?.data {
            LiveData::Text(text) | LiveData::Comment(text) => Ok(Some(text.clone())),
            LiveData::Element(_) => {
                let mut out = String::new();
                store.collect_text(node, &mut out)?;
                Ok(Some(out))
            }
        }
    }

    fn node_kind(&self, node: NodeId) -> Result<NodeKind, NodeError> {
        Ok(match self.store.borrow().node(node)?.data {
            LiveData::Element(_) => NodeKind::Element,
            LiveData::Text(_) => NodeKind::Text,
            LiveData::Comment(_) => NodeKind::Comment,
        })
    }

    fn set_id(&self, element: NodeId, id: &str) -> Result<(), NodeError> {
        self.set_attribute(element, "id", id)
    }

    fn set_class_name(&self, element: NodeId, class_name: &str) -> Result<(), NodeError> {
        self.set_attribute(element, "class", class_name)
    }

    fn id_of(&self, element: NodeId) -> Result<Option<String>, NodeError> {
        self.attribute(element, "id")
    }

    fn class_name_of(&self, element: NodeId) -> Result<Option<String>, NodeError> {
        self.attribute(element, "class")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element_with_children(tree: &MemoryTree, count: usize) -> (NodeId, Vec<NodeId>) {
        let parent = tree.create_element("ul").expect("parent");
        let children = (0..count)
            .map(|index| {
                let child = tree.create_text_node(&index.to_string()).expect("child");
                tree.append_child(parent, child).expect("append");
                child
            })
            .collect();
        (parent, children)
    }

    #[test]
    fn insert_before_moves_existing_child() {
        let tree = MemoryTree::new();
        let (parent, children) = element_with_children(&tree, 3);

        tree.insert_before(parent, children[2], Some(children[0]))
            .expect("move last to front");

        assert_eq!(
            tree.children(parent).expect("children"),
            vec![children[2], children[0], children[1]]
        );
        assert_eq!(tree.render(parent).expect("render"), "<ul>201</ul>");
    }

    #[test]
    fn insert_before_self_is_a_no_op() {
        let tree = MemoryTree::new();
        let (parent, children) = element_with_children(&tree, 2);
        tree.insert_before(parent, children[0], Some(children[0]))
            .expect("self insert");
        assert_eq!(tree.children(parent).expect("children"), children);
    }

    #[test]
    fn reference_must_be_a_child() {
        let tree = MemoryTree::new();
        let (parent, _) = element_with_children(&tree, 1);
        let stranger = tree.create_text_node("x").expect("stranger");
        let node = tree.create_text_node("y").expect("node");
        assert_eq!(
            tree.insert_before(parent, node, Some(stranger)),
            Err(NodeError::NotAChild {
                parent,
                child: stranger
            })
        );
    }

    #[test]
    fn cannot_insert_ancestor_into_descendant() {
        let tree = MemoryTree::new();
        let outer = tree.create_element("div").expect("outer");
        let inner = tree.create_element("div").expect("inner");
        tree.append_child(outer, inner).expect("append");
        assert_eq!(
            tree.append_child(inner, outer),
            Err(NodeError::InvalidHierarchy {
                parent: inner,
                child: outer
            })
        );
    }

    #[test]
    fn remove_child_detaches_but_keeps_node() {
        let tree = MemoryTree::new();
        let (parent, children) = element_with_children(&tree, 2);
        tree.remove_child(parent, children[0]).expect("remove");
        assert_eq!(tree.children(parent).expect("children"), vec![children[1]]);
        assert_eq!(tree.parent_node(children[0]).expect("parent"), None);
        assert_eq!(
            tree.remove_child(parent, children[0]),
            Err(NodeError::NotAChild {
                parent,
                child: children[0]
            })
        );
    }

    #[test]
    fn next_sibling_follows_child_order() {
        let tree = MemoryTree::new();
        let (parent, children) = element_with_children(&tree, 2);
        assert_eq!(tree.next_sibling(children[0]).expect("sibling"), Some(children[1]));
        assert_eq!(tree.next_sibling(children[1]).expect("sibling"), None);
        assert_eq!(tree.next_sibling(parent).expect("detached"), None);
    }

    #[test]
    fn text_content_replaces_element_children() {
        let tree = MemoryTree::new();
        let (parent, children) = element_with_children(&tree, 2);
        tree.set_text_content(parent, Some("hello")).expect("set text");
        assert_eq!(tree.render(parent).expect("render"), "<ul>hello</ul>");
        assert_eq!(tree.parent_node(children[0]).expect("parent"), None);

        tree.set_text_content(parent, Some("")).expect("clear");
        assert!(tree.children(parent).expect("children").is_empty());
        assert_eq!(tree.text_content(parent).expect("text"), Some(String::new()));
    }

    #[test]
    fn tag_name_is_upper_case_for_html_elements() {
        let tree = MemoryTree::new();
        let div = tree.create_element("div").expect("div");
        let svg = tree
            .create_element_ns("http://www.w3.org/2000/svg", "svg")
            .expect("svg");
        assert_eq!(tree.tag_name(div).expect("tag"), "DIV");
        assert_eq!(tree.tag_name(svg).expect("tag"), "svg");
        let text = tree.create_text_node("t").expect("text");
        assert_eq!(tree.tag_name(text), Err(NodeError::NotAnElement { id: text }));
    }

    #[test]
    fn class_list_round_trips_through_attribute() {
        let tree = MemoryTree::new();
        let div = tree.create_element("div").expect("div");
        tree.set_class_name(div, "a b").expect("class name");
        tree.add_class(div, "c").expect("add");
        tree.add_class(div, "a").expect("add duplicate");
        tree.remove_class(div, "b").expect("remove");
        assert_eq!(tree.class_name_of(div).expect("class"), Some("a c".to_string()));
        assert!(tree.has_class(div, "c").expect("has"));
    }

    #[test]
    fn transition_properties_come_from_style() {
        let tree = MemoryTree::new();
        let div = tree.create_element("div").expect("div");
        tree.set_style(div, "transition-property", "opacity, transform")
            .expect("style");
        assert_eq!(
            tree.transition_properties(div).expect("props"),
            vec!["opacity".to_string(), "transform".to_string()]
        );
    }

    #[test]
    fn dump_tree_outlines_structure() {
        let tree = MemoryTree::new();
        let root = tree.create_element("div").expect("root");
        let text = tree.create_text_node("hi").expect("text");
        tree.append_child(root, text).expect("append");
        assert_eq!(
            tree.dump_tree(Some(root)),
            format!("[{root}] <div>\n  [{text}] \"hi\"\n")
        );
        assert_eq!(tree.dump_tree(None), "(no root)\n");
    }
}
