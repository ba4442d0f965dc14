use sprig_core::{DataValue, Module, NodeError, VNode};

use crate::host::ElementHost;
use crate::{live, module_maps};

/// `fooBar` becomes `data-foo-bar`.
pub fn data_attribute_name(key: &str) -> String {
    let mut name = String::with_capacity(key.len() + 8);
    name.push_str("data-");
    for ch in key.chars() {
        if ch.is_ascii_uppercase() {
            name.push('-');
            name.push(ch.to_ascii_lowercase());
        } else {
            name.push(ch);
        }
    }
    name
}

/// Mirrors the `dataset` map onto `data-*` attributes.
pub fn dataset_module<A: ElementHost + 'static>() -> Module<A> {
    Module::new("dataset")
        .on_create(update_dataset::<A>)
        .on_update(update_dataset::<A>)
}

fn update_dataset<A: ElementHost>(host: &A, old: &VNode, new: &VNode) -> Result<(), NodeError> {
    let Some((old_dataset, dataset)) = module_maps(old, new, "dataset") else {
        return Ok(());
    };
    let elm = live(new)?;

    for key in old_dataset.keys() {
        if !dataset.get(key).is_some_and(DataValue::is_truthy) {
            host.remove_attribute(elm, &data_attribute_name(key))?;
        }
    }
    for (key, cur) in &dataset {
        if old_dataset.get(key) != Some(cur) {
            host.set_attribute(elm, &data_attribute_name(key), &cur.to_string())?;
        }
    }
    Ok(())
}
