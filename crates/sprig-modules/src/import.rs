use sprig_core::{comment, DataMap, DataValue, NodeError, NodeId, NodeKind, VNode, VNodeData};

use crate::host::ElementHost;

/// Describes an existing live subtree as a virtual tree whose nodes already
/// point at their live counterparts, so it can serve as the old side of a
/// patch. `id` and `class` move into the selector; every other attribute
/// lands in `attrs`.
pub fn to_vnode<A: ElementHost>(host: &A, node: NodeId) -> Result<VNode, NodeError> {
    match host.node_kind(node)? {
        NodeKind::Text => {
            let text = host.text_content(node)?.unwrap_or_default();
            let vnode = VNode::text_node(text);
            vnode.set_elm(Some(node));
            Ok(vnode)
        }
        NodeKind::Comment => {
            let vnode = comment(host.text_content(node)?.unwrap_or_default());
            vnode.set_elm(Some(node));
            Ok(vnode)
        }
        NodeKind::Element => {
            let mut id = None;
            let mut class_name = None;
            let mut attrs = DataMap::new();
            for (name, value) in host.attributes(node)? {
                match name.as_str() {
                    "id" => id = Some(value),
                    "class" => class_name = Some(value),
                    _ => {
                        attrs.insert(name, DataValue::Str(value));
                    }
                }
            }
            // Always tag, then `#id`, then classes, whatever the attribute order.
            let mut sel = host.tag_name(node)?.to_lowercase();
            if let Some(id) = id.filter(|id| !id.is_empty()) {
                sel.push('#');
                sel.push_str(&id);
            }
            for class in class_name.iter().flat_map(|classes| classes.split_whitespace()) {
                sel.push('.');
                sel.push_str(class);
            }
            let children = host
                .child_nodes(node)?
                .into_iter()
                .map(|child| to_vnode(host, child))
                .collect::<Result<Vec<_>, _>>()?;

            let mut data = VNodeData::new();
            if !attrs.is_empty() {
                data.insert("attrs", attrs);
            }
            Ok(VNode::new(Some(sel), Some(data), Some(children), None, Some(node)))
        }
    }
}
