#![doc = r"Property modules for the sprig reconciliation engine. Each module projects one
named entry of a virtual node's data (`attrs`, `class`, `props`, `dataset`,
`style`, `on`) onto the live element through an [`ElementHost`]."]

pub mod attributes;
pub mod class;
pub mod data;
pub mod dataset;
pub mod host;
pub mod import;
pub mod listeners;
pub mod props;
pub mod style;

pub use attributes::{attributes_module, XLINK_NAMESPACE};
pub use class::class_module;
pub use data::ModuleDataExt;
pub use dataset::{data_attribute_name, dataset_module};
pub use host::ElementHost;
pub use import::to_vnode;
pub use listeners::{event_listeners_module, NodeListener};
pub use props::props_module;
pub use style::StyleModule;

use sprig_core::{DataMap, Module, NodeError, NodeId, Patcher, VNode};

/// Live element of a node the engine has already materialized.
pub(crate) fn live(node: &VNode) -> Result<NodeId, NodeError> {
    node.elm().ok_or(NodeError::Unmounted)
}

/// Old and new contents of the map entry `key`, or `None` when the module has
/// nothing to do (both absent, or unchanged).
pub(crate) fn module_maps(old: &VNode, new: &VNode, key: &str) -> Option<(DataMap, DataMap)> {
    let old_map = old.get_map(key);
    let new_map = new.get_map(key);
    if old_map.is_none() && new_map.is_none() {
        return None;
    }
    if old_map == new_map {
        return None;
    }
    Some((old_map.unwrap_or_default(), new_map.unwrap_or_default()))
}

/// The standard module set in registration order, sharing `style`'s frame
/// queue with the caller.
pub fn default_modules<A: ElementHost + Clone + 'static>(style: &StyleModule) -> Vec<Module<A>> {
    vec![
        attributes_module(),
        class_module(),
        props_module(),
        dataset_module(),
        style.module(),
        event_listeners_module(),
    ]
}

/// Patcher over `tree` with every standard module registered.
pub fn bundle<A: ElementHost + Clone + 'static>(tree: A) -> (Patcher<A>, StyleModule) {
    let style = StyleModule::new();
    let patcher = sprig_core::init(default_modules(&style), tree);
    (patcher, style)
}
