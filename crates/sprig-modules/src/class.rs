use sprig_core::{DataValue, Module, NodeError, VNode};

use crate::host::ElementHost;
use crate::{live, module_maps};

/// Toggles classes from the `class` map (class name to truthy flag).
pub fn class_module<A: ElementHost + 'static>() -> Module<A> {
    Module::new("class")
        .on_create(update_class::<A>)
        .on_update(update_class::<A>)
}

fn update_class<A: ElementHost>(host: &A, old: &VNode, new: &VNode) -> Result<(), NodeError> {
    let Some((old_class, class)) = module_maps(old, new, "class") else {
        return Ok(());
    };
    let elm = live(new)?;

    for name in old_class.keys() {
        if !class.get(name).is_some_and(DataValue::is_truthy) {
            host.remove_class(elm, name)?;
        }
    }
    for (name, cur) in &class {
        if old_class.get(name) == Some(cur) {
            continue;
        }
        if cur.is_truthy() {
            host.add_class(elm, name)?;
        } else {
            host.remove_class(elm, name)?;
        }
    }
    Ok(())
}
