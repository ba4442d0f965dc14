use std::cell::RefCell;
use std::rc::Rc;

use sprig_core::{DataValue, Event, EventListener, Module, NodeError, VNode, WeakVNode};

use crate::host::ElementHost;
use crate::live;

/// Listener attached once per live element. It dispatches into whichever
/// virtual node last described the element.
#[derive(Default)]
pub struct NodeListener {
    node: RefCell<WeakVNode>,
}

impl NodeListener {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventListener for NodeListener {
    fn handle_event(&self, event: &Event) -> Result<(), NodeError> {
        let Some(node) = self.node.borrow().upgrade() else {
            log::debug!("{} event on node {} outlived its virtual node", event.kind, event.target);
            return Ok(());
        };
        let handler = node
            .get_map("on")
            .and_then(|on| on.get(&event.kind).cloned());
        match handler {
            Some(handler) => invoke_handler(&handler, event, &node),
            None => Ok(()),
        }
    }

    fn rebind(&self, node: &VNode) {
        *self.node.borrow_mut() = node.downgrade();
    }
}

/// Calls a handler value: a handler, `[handler, args..]`, or a list of those.
fn invoke_handler(value: &DataValue, event: &Event, node: &VNode) -> Result<(), NodeError> {
    match value {
        DataValue::Handler(handler) => handler.call(event, node, &[]),
        DataValue::List(items) => match items.split_first() {
            Some((DataValue::Handler(handler), args)) => handler.call(event, node, args),
            _ => {
                for item in items {
                    invoke_handler(item, event, node)?;
                }
                Ok(())
            }
        },
        other => {
            log::warn!("ignoring non-callable {} handler {other:?}", event.kind);
            Ok(())
        }
    }
}

/// Binds the `on` map (event name to handler value).
pub fn event_listeners_module<A: ElementHost + 'static>() -> Module<A> {
    Module::new("eventlisteners")
        .on_create(|host: &A, old: &VNode, new: &VNode| update_listeners(host, old, Some(new)))
        .on_update(|host: &A, old: &VNode, new: &VNode| update_listeners(host, old, Some(new)))
        .on_destroy(|host: &A, node: &VNode| update_listeners(host, node, None))
}

fn update_listeners<A: ElementHost>(
    host: &A,
    old: &VNode,
    new: Option<&VNode>,
) -> Result<(), NodeError> {
    let old_on = old.get_map("on");
    let on = new.and_then(|node| node.get_map("on"));
    if old_on.is_none() && on.is_none() {
        return Ok(());
    }
    let old_listener = old.listener();

    if let (Some(old_on), Some(listener)) = (&old_on, &old_listener) {
        let old_elm = live(old)?;
        for name in old_on.keys() {
            if !on.as_ref().is_some_and(|on| on.contains_key(name)) {
                host.remove_event_listener(old_elm, name, listener)?;
            }
        }
    }

    if let (Some(on), Some(new)) = (&on, new) {
        let listener: Rc<dyn EventListener> = match old_listener {
            Some(listener) => listener,
            None => Rc::new(NodeListener::new()),
        };
        listener.rebind(new);
        new.set_listener(Some(Rc::clone(&listener)));
        let elm = live(new)?;
        for name in on.keys() {
            if !old_on.as_ref().is_some_and(|old_on| old_on.contains_key(name)) {
                host.add_event_listener(elm, name, Rc::clone(&listener))?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ModuleDataExt;
    use sprig_core::{h, init, Handler, MemoryTree, TreeAdapter};

    fn counter(log: &Rc<RefCell<Vec<String>>>, tag: &'static str) -> Handler {
        let log = Rc::clone(log);
        Handler::new(move |event, node, args| {
            let args: Vec<String> = args.iter().map(ToString::to_string).collect();
            log.borrow_mut().push(format!(
                "{tag}:{}:{}:{}",
                event.kind,
                node.text().unwrap_or(""),
                args.join("|")
            ));
            Ok(())
        })
    }

    #[test]
    fn events_reach_the_newest_virtual_node() {
        let tree = MemoryTree::new();
        let patcher = init(vec![event_listeners_module()], tree.clone());
        let root = tree.create_element("button").expect("root");
        let log = Rc::new(RefCell::new(Vec::new()));
        let click = counter(&log, "click");

        let first = patcher
            .patch(root, h("button").text("first").on("click", click.clone()).build())
            .expect("mount");
        tree.dispatch_event(&Event::new("click", root)).expect("click 1");

        let second = patcher
            .patch(first, h("button").text("second").on("click", click).build())
            .expect("patch");
        tree.dispatch_event(&Event::new("click", root)).expect("click 2");

        assert_eq!(*log.borrow(), vec!["click:click:first:", "click:click:second:"]);
        assert_eq!(tree.listener_count(root, "click").expect("count"), 1);
        assert!(second.listener().is_some());
    }

    #[test]
    fn handler_lists_pass_arguments() {
        let tree = MemoryTree::new();
        let patcher = init(vec![event_listeners_module()], tree.clone());
        let log = Rc::new(RefCell::new(Vec::new()));
        let node = h("a")
            .on(
                "click",
                vec![DataValue::from(counter(&log, "with")), 1.into(), "x".into()],
            )
            .on(
                "focus",
                vec![
                    DataValue::List(vec![counter(&log, "a").into(), 2.into()]),
                    DataValue::from(counter(&log, "b")),
                ],
            )
            .build();
        let elm = patcher.materialize(&node).expect("materialize");

        tree.dispatch_event(&Event::new("click", elm)).expect("click");
        tree.dispatch_event(&Event::new("focus", elm)).expect("focus");
        assert_eq!(
            *log.borrow(),
            vec!["with:click::1|x", "a:focus::2", "b:focus::"]
        );
    }

    #[test]
    fn listeners_are_removed_when_unbound_or_destroyed() {
        let tree = MemoryTree::new();
        let patcher = init(vec![event_listeners_module()], tree.clone());
        let root = tree.create_element("div").expect("root");
        let noop = Handler::new(|_, _, _| Ok(()));
        let old = patcher
            .patch(
                root,
                h("div")
                    .on("click", noop.clone())
                    .on("input", noop.clone())
                    .child(h("span").on("click", noop.clone()))
                    .build(),
            )
            .expect("mount");
        let span = old.children().expect("children")[0].elm().expect("span");

        patcher
            .patch(old, h("div").on("click", noop).build())
            .expect("patch");

        assert_eq!(tree.listener_count(root, "click").expect("click"), 1);
        assert_eq!(tree.listener_count(root, "input").expect("input"), 0);
        assert_eq!(tree.listener_count(span, "click").expect("span"), 0);
    }
}
