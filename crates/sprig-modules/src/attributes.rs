use sprig_core::{Module, NodeError, VNode};

use crate::host::ElementHost;
use crate::{live, module_maps};

pub const XLINK_NAMESPACE: &str = "http://www.w3.org/1999/xlink";

/// Attributes rendered as present-and-empty when truthy and removed otherwise.
const BOOLEAN_ATTRS: &[&str] = &[
    "allowfullscreen",
    "async",
    "autofocus",
    "autoplay",
    "checked",
    "compact",
    "controls",
    "declare",
    "default",
    "defaultchecked",
    "defaultmuted",
    "defaultselected",
    "defer",
    "disabled",
    "draggable",
    "enabled",
    "formnovalidate",
    "hidden",
    "indeterminate",
    "inert",
    "ismap",
    "itemscope",
    "loop",
    "multiple",
    "muted",
    "nohref",
    "noresize",
    "noshade",
    "novalidate",
    "nowrap",
    "open",
    "pauseonexit",
    "readonly",
    "required",
    "reversed",
    "scoped",
    "seamless",
    "selected",
    "sortable",
    "spellcheck",
    "translate",
    "truespeed",
    "typemustmatch",
    "visible",
];

fn namespace_of(name: &str) -> Option<&'static str> {
    match name.split_once(':') {
        Some(("xlink", _)) => Some(XLINK_NAMESPACE),
        _ => None,
    }
}

/// Mirrors the `attrs` map onto element attributes.
pub fn attributes_module<A: ElementHost + 'static>() -> Module<A> {
    Module::new("attributes")
        .on_create(update_attrs::<A>)
        .on_update(update_attrs::<A>)
}

fn update_attrs<A: ElementHost>(host: &A, old: &VNode, new: &VNode) -> Result<(), NodeError> {
    let Some((old_attrs, attrs)) = module_maps(old, new, "attrs") else {
        return Ok(());
    };
    let elm = live(new)?;

    for (name, cur) in &attrs {
        if old_attrs.get(name) == Some(cur) {
            continue;
        }
        if BOOLEAN_ATTRS.contains(&name.as_str()) {
            if cur.is_truthy() {
                host.set_attribute(elm, name, "")?;
            } else {
                host.remove_attribute(elm, name)?;
            }
        } else if let Some(namespace) = namespace_of(name) {
            host.set_attribute_ns(elm, namespace, name, &cur.to_string())?;
        } else {
            host.set_attribute(elm, name, &cur.to_string())?;
        }
    }
    for name in old_attrs.keys() {
        if !attrs.contains_key(name) {
            host.remove_attribute(elm, name)?;
        }
    }
    Ok(())
}
