use sprig_core::{DataValue, Module, NodeError, VNode};

use crate::host::ElementHost;
use crate::{live, module_maps};

/// Mirrors the `props` map onto element properties.
pub fn props_module<A: ElementHost + 'static>() -> Module<A> {
    Module::new("props")
        .on_create(update_props::<A>)
        .on_update(update_props::<A>)
}

fn update_props<A: ElementHost>(host: &A, old: &VNode, new: &VNode) -> Result<(), NodeError> {
    let Some((old_props, props)) = module_maps(old, new, "props") else {
        return Ok(());
    };
    let elm = live(new)?;

    for name in old_props.keys() {
        if !props.get(name).is_some_and(DataValue::is_truthy) {
            host.remove_property(elm, name)?;
        }
    }
    for (name, cur) in &props {
        if old_props.get(name) == Some(cur) {
            continue;
        }
        // A live `value` may have been edited in place; leave it alone when it
        // already matches.
        if name == "value" && host.property(elm, name)?.as_ref() == Some(cur) {
            continue;
        }
        host.set_property(elm, name, cur.clone())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ModuleDataExt;
    use sprig_core::{h, init, MemoryTree, TreeAdapter};

    #[test]
    fn properties_follow_the_map() {
        let tree = MemoryTree::new();
        let patcher = init(vec![props_module()], tree.clone());
        let root = tree.create_element("input").expect("root");
        let old = patcher
            .patch(
                root,
                h("input").prop("value", "a").prop("checked", true).build(),
            )
            .expect("mount");
        assert_eq!(
            tree.property(root, "checked").expect("checked"),
            Some(DataValue::Bool(true))
        );

        patcher
            .patch(old, h("input").prop("value", "b").build())
            .expect("patch");
        assert_eq!(tree.property(root, "checked").expect("checked"), None);
        assert_eq!(
            tree.property(root, "value").expect("value"),
            Some(DataValue::from("b"))
        );
    }

    #[test]
    fn matching_live_value_is_not_rewritten() {
        let tree = MemoryTree::new();
        let patcher = init(vec![props_module()], tree.clone());
        let root = tree.create_element("input").expect("root");
        let old = patcher
            .patch(root, h("input").prop("value", "a").build())
            .expect("mount");
        tree.set_property(root, "value", DataValue::from("typed"))
            .expect("user edit");

        let old = patcher
            .patch(old, h("input").prop("value", "typed").build())
            .expect("patch");
        assert_eq!(
            tree.property(root, "value").expect("value"),
            Some(DataValue::from("typed"))
        );

        patcher
            .patch(old, h("input").prop("value", "reset").build())
            .expect("reset");
        assert_eq!(
            tree.property(root, "value").expect("value"),
            Some(DataValue::from("reset"))
        );
    }
}
