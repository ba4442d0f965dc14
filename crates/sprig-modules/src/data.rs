//! Builder shorthands for the entries each module reads.

use sprig_core::{nested_map_mut, DataValue, VNodeBuilder};

pub trait ModuleDataExt: Sized {
    /// `attrs[name] = value`
    fn attr(self, name: &str, value: impl Into<DataValue>) -> Self;
    /// `class[name] = enabled`
    fn class(self, name: &str, enabled: bool) -> Self;
    /// `props[name] = value`
    fn prop(self, name: &str, value: impl Into<DataValue>) -> Self;
    fn dataset(self, name: &str, value: impl Into<DataValue>) -> Self;
    fn style(self, name: &str, value: impl Into<DataValue>) -> Self;
    /// Style applied two frames after the element is patched.
    fn delayed_style(self, name: &str, value: impl Into<DataValue>) -> Self;
    /// Style applied when the element is removed.
    fn remove_style(self, name: &str, value: impl Into<DataValue>) -> Self;
    /// Style applied when the element is destroyed.
    fn destroy_style(self, name: &str, value: impl Into<DataValue>) -> Self;
    /// `on[event] = handler`; the handler is a [`sprig_core::Handler`],
    /// `[handler, args..]`, or a list of either.
    fn on(self, event: &str, handler: impl Into<DataValue>) -> Self;
}

impl ModuleDataExt for VNodeBuilder {
    fn attr(self, name: &str, value: impl Into<DataValue>) -> Self {
        put(self, &["attrs"], name, value.into())
    }

    fn class(self, name: &str, enabled: bool) -> Self {
        put(self, &["class"], name, DataValue::Bool(enabled))
    }

    fn prop(self, name: &str, value: impl Into<DataValue>) -> Self {
        put(self, &["props"], name, value.into())
    }

    fn dataset(self, name: &str, value: impl Into<DataValue>) -> Self {
        put(self, &["dataset"], name, value.into())
    }

    fn style(self, name: &str, value: impl Into<DataValue>) -> Self {
        put(self, &["style"], name, value.into())
    }

    fn delayed_style(self, name: &str, value: impl Into<DataValue>) -> Self {
        put(self, &["style", "delayed"], name, value.into())
    }

    fn remove_style(self, name: &str, value: impl Into<DataValue>) -> Self {
        put(self, &["style", "remove"], name, value.into())
    }

    fn destroy_style(self, name: &str, value: impl Into<DataValue>) -> Self {
        put(self, &["style", "destroy"], name, value.into())
    }

    fn on(self, event: &str, handler: impl Into<DataValue>) -> Self {
        put(self, &["on"], event, handler.into())
    }
}

fn put(builder: VNodeBuilder, path: &[&str], name: &str, value: DataValue) -> VNodeBuilder {
    builder.update(|data| {
        let Some((first, rest)) = path.split_first() else {
            return;
        };
        let mut map = data.map_mut(first);
        for section in rest {
            map = nested_map_mut(map, section);
        }
        map.insert(name.to_string(), value);
    })
}
