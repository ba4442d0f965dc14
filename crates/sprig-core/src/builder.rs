//! Convenience constructors for virtual nodes.

use std::rc::Rc;

use crate::hooks::Hooks;
use crate::vnode::{DataValue, Key, VNode, VNodeData, COMMENT_SELECTOR};

pub const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";

/// Starts an element node for `sel` (`tag#id.class1.class2`).
pub fn h(sel: impl Into<String>) -> VNodeBuilder {
    VNodeBuilder {
        sel: sel.into(),
        data: VNodeData::default(),
        children: None,
        text: None,
    }
}

/// Selector-less text leaf.
pub fn text(content: impl Into<String>) -> VNode {
    VNode::text_node(content)
}

pub fn comment(content: impl Into<String>) -> VNode {
    VNode::new(
        Some(COMMENT_SELECTOR.to_string()),
        Some(VNodeData::default()),
        None,
        Some(content.into()),
        None,
    )
}

#[must_use]
pub struct VNodeBuilder {
    sel: String,
    data: VNodeData,
    children: Option<Vec<VNode>>,
    text: Option<String>,
}

impl VNodeBuilder {
    pub fn key(mut self, key: impl Into<Key>) -> Self {
        self.data.key = Some(key.into());
        self
    }

    pub fn ns(mut self, namespace: impl Into<String>) -> Self {
        self.data.ns = Some(namespace.into());
        self
    }

    pub fn hooks(mut self, hooks: Hooks) -> Self {
        self.data.hook = Some(Rc::new(hooks));
        self
    }

    /// Sets a raw capability map entry.
    pub fn set(mut self, name: impl Into<String>, value: impl Into<DataValue>) -> Self {
        self.data.insert(name, value);
        self
    }

    /// Edits the data bag in place.
    pub fn update(mut self, f: impl FnOnce(&mut VNodeData)) -> Self {
        f(&mut self.data);
        self
    }

    pub fn text(mut self, content: impl Into<String>) -> Self {
        self.text = Some(content.into());
        self
    }

    pub fn child(mut self, child: impl Into<VNode>) -> Self {
        self.children.get_or_insert_with(Vec::new).push(child.into());
        self
    }

    pub fn children<I>(mut self, children: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<VNode>,
    {
        self.children
            .get_or_insert_with(Vec::new)
            .extend(children.into_iter().map(Into::into));
        self
    }

    pub fn build(self) -> VNode {
        let Self {
            sel,
            mut data,
            children,
            text,
        } = self;
        if is_svg_selector(&sel) {
            data.ns = Some(SVG_NAMESPACE.to_string());
            if let Some(children) = &children {
                for child in children {
                    add_ns(child);
                }
            }
        }
        VNode::new(Some(sel), Some(data), children, text, None)
    }
}

impl From<VNodeBuilder> for VNode {
    fn from(builder: VNodeBuilder) -> Self {
        builder.build()
    }
}

fn is_svg_selector(sel: &str) -> bool {
    sel.strip_prefix("svg")
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('.') || rest.starts_with('#'))
}

/// Marks `node` and its descendants as SVG, stopping below `foreignObject`.
fn add_ns(node: &VNode) {
    let marked = node
        .with_existing_data(|data| data.ns = Some(SVG_NAMESPACE.to_string()))
        .is_some();
    if !marked || node.sel() == Some("foreignObject") {
        return;
    }
    if let Some(children) = node.children() {
        for child in children.iter() {
            add_ns(child);
        }
    }
}
