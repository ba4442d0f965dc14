//! Inline styles with delayed application and transition-aware removal.
//!
//! The `style` map holds plain properties plus three reserved sub-maps:
//! `delayed` (applied two frames after being set, so a just-inserted element
//! can transition into them), `destroy` (applied when the node is destroyed)
//! and `remove` (applied when the node is removed; physical removal then
//! waits until every transitioning property among them has finished).
//!
//! Frames and transition ends come from the host application through
//! [`StyleModule::next_frame`] and [`StyleModule::transition_end`].

use std::cell::RefCell;
use std::rc::Rc;

use sprig_core::{DataMap, DataValue, Module, NodeError, NodeId, RemovalHandle, VNode};

use crate::host::ElementHost;
use crate::{live, module_maps};

const DELAYED: &str = "delayed";
const REMOVE: &str = "remove";
const DESTROY: &str = "destroy";

/// Frames between scheduling a delayed property and applying it.
const DELAY_FRAMES: u8 = 2;

type FrameTask = Box<dyn FnOnce() -> Result<(), NodeError>>;

struct ScheduledStyle {
    frames_left: u8,
    apply: FrameTask,
}

struct PendingRemoval {
    elm: NodeId,
    remaining: usize,
    handle: RemovalHandle,
}

#[derive(Default)]
struct StyleState {
    scheduled: RefCell<Vec<ScheduledStyle>>,
    removals: RefCell<Vec<PendingRemoval>>,
}

/// Shared handle to the style module's frame queue and pending removals.
#[derive(Clone, Default)]
pub struct StyleModule {
    state: Rc<StyleState>,
}

impl StyleModule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn module<A: ElementHost + Clone + 'static>(&self) -> Module<A> {
        let create = self.clone();
        let update = self.clone();
        let remove = self.clone();
        Module::new("style")
            .on_create(move |host, old, new| create.update_style(host, old, new))
            .on_update(move |host, old, new| update.update_style(host, old, new))
            .on_destroy(apply_destroy_style::<A>)
            .on_remove(move |host, node, done| remove.apply_remove_style(host, node, done))
    }

    /// Advances one animation frame, applying delayed properties that are due.
    pub fn next_frame(&self) -> Result<(), NodeError> {
        let due: Vec<FrameTask> = {
            let mut scheduled = self.state.scheduled.borrow_mut();
            let mut due = Vec::new();
            let mut waiting = Vec::with_capacity(scheduled.len());
            for mut entry in scheduled.drain(..) {
                entry.frames_left = entry.frames_left.saturating_sub(1);
                if entry.frames_left == 0 {
                    due.push(entry.apply);
                } else {
                    waiting.push(entry);
                }
            }
            *scheduled = waiting;
            due
        };
        for apply in due {
            apply()?;
        }
        Ok(())
    }

    /// Reports that a transition on `elm` finished.
    pub fn transition_end(&self, elm: NodeId) -> Result<(), NodeError> {
        let finished: Vec<RemovalHandle> = {
            let mut removals = self.state.removals.borrow_mut();
            let mut finished = Vec::new();
            removals.retain_mut(|pending| {
                if pending.elm != elm {
                    return true;
                }
                pending.remaining = pending.remaining.saturating_sub(1);
                if pending.remaining == 0 {
                    finished.push(pending.handle.clone());
                    false
                } else {
                    true
                }
            });
            finished
        };
        for handle in finished {
            handle.done()?;
        }
        Ok(())
    }

    pub fn scheduled_count(&self) -> usize {
        self.state.scheduled.borrow().len()
    }

    pub fn pending_removals(&self) -> usize {
        self.state.removals.borrow().len()
    }

    fn schedule<A: ElementHost + Clone + 'static>(
        &self,
        host: &A,
        elm: NodeId,
        name: &str,
        value: &DataValue,
    ) {
        let host = host.clone();
        let name = name.to_string();
        let value = value.to_string();
        self.state.scheduled.borrow_mut().push(ScheduledStyle {
            frames_left: DELAY_FRAMES,
            apply: Box::new(move || host.set_style(elm, &name, &value)),
        });
    }

    fn update_style<A: ElementHost + Clone + 'static>(
        &self,
        host: &A,
        old: &VNode,
        new: &VNode,
    ) -> Result<(), NodeError> {
        let Some((old_style, style)) = module_maps(old, new, "style") else {
            return Ok(());
        };
        let elm = live(new)?;
        let old_delayed = old_style.get(DELAYED).and_then(DataValue::as_map);

        for name in old_style.keys() {
            if is_reserved(name) {
                continue;
            }
            if !style.get(name).is_some_and(DataValue::is_truthy) {
                host.remove_style(elm, name)?;
            }
        }
        for (name, cur) in &style {
            match name.as_str() {
                DELAYED => {
                    let Some(delayed) = cur.as_map() else { continue };
                    for (prop, value) in delayed {
                        if old_delayed.map_or(true, |old| old.get(prop) != Some(value)) {
                            self.schedule(host, elm, prop, value);
                        }
                    }
                }
                REMOVE | DESTROY => {}
                _ => {
                    if old_style.get(name) != Some(cur) {
                        host.set_style(elm, name, &cur.to_string())?;
                    }
                }
            }
        }
        Ok(())
    }

    fn apply_remove_style<A: ElementHost>(
        &self,
        host: &A,
        node: &VNode,
        done: RemovalHandle,
    ) -> Result<(), NodeError> {
        let Some(remove) = style_section(node, REMOVE) else {
            return done.done();
        };
        let elm = live(node)?;
        let mut applied = Vec::with_capacity(remove.len());
        for (name, value) in &remove {
            host.set_style(elm, name, &value.to_string())?;
            applied.push(name.as_str());
        }
        let transitioning = host
            .transition_properties(elm)?
            .iter()
            .filter(|name| applied.contains(&name.as_str()))
            .count();
        if transitioning == 0 {
            return done.done();
        }
        log::debug!("node {elm} waits for {transitioning} transition(s) before removal");
        self.state.removals.borrow_mut().push(PendingRemoval {
            elm,
            remaining: transitioning,
            handle: done,
        });
        Ok(())
    }
}

fn is_reserved(name: &str) -> bool {
    matches!(name, DELAYED | REMOVE | DESTROY)
}

fn style_section(node: &VNode, section: &str) -> Option<DataMap> {
    node.get_map("style")
        .and_then(|style| style.get(section).and_then(DataValue::as_map).cloned())
}

fn apply_destroy_style<A: ElementHost>(host: &A, node: &VNode) -> Result<(), NodeError> {
    let Some(destroy) = style_section(node, DESTROY) else {
        return Ok(());
    };
    let elm = live(node)?;
    for (name, value) in &destroy {
        host.set_style(elm, name, &value.to_string())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ModuleDataExt;
    use sprig_core::{h, init, MemoryTree, TreeAdapter};

    fn setup() -> (MemoryTree, StyleModule, sprig_core::Patcher<MemoryTree>) {
        let tree = MemoryTree::new();
        let styles = StyleModule::new();
        let patcher = init(vec![styles.module()], tree.clone());
        (tree, styles, patcher)
    }

    #[test]
    fn plain_styles_are_set_and_cleared() {
        let (tree, _, patcher) = setup();
        let root = tree.create_element("div").expect("root");
        let old = patcher
            .patch(root, h("div").style("color", "red").style("width", "10px").build())
            .expect("mount");
        patcher
            .patch(old, h("div").style("color", "blue").build())
            .expect("patch");
        assert_eq!(tree.style(root, "color").expect("color").as_deref(), Some("blue"));
        assert_eq!(tree.style(root, "width").expect("width"), None);
    }

    #[test]
    fn delayed_styles_wait_two_frames() {
        let (tree, styles, patcher) = setup();
        let node = h("div")
            .style("opacity", "0")
            .delayed_style("opacity", "1")
            .build();
        let elm = patcher.materialize(&node).expect("materialize");

        assert_eq!(tree.style(elm, "opacity").expect("opacity").as_deref(), Some("0"));
        styles.next_frame().expect("frame 1");
        assert_eq!(tree.style(elm, "opacity").expect("opacity").as_deref(), Some("0"));
        styles.next_frame().expect("frame 2");
        assert_eq!(tree.style(elm, "opacity").expect("opacity").as_deref(), Some("1"));
        assert_eq!(styles.scheduled_count(), 0);
        assert_eq!(tree.style(elm, "delayed").expect("reserved"), None);
    }

    #[test]
    fn destroy_styles_apply_on_destroy() {
        let (tree, _, patcher) = setup();
        let root = tree.create_element("ul").expect("root");
        let old = patcher
            .patch(
                root,
                h("ul")
                    .child(h("li").destroy_style("display", "none"))
                    .build(),
            )
            .expect("mount");
        let li = old.children().expect("children")[0].elm().expect("li");
        patcher.patch(old, h("ul").build()).expect("patch");
        assert_eq!(tree.style(li, "display").expect("display").as_deref(), Some("none"));
    }

    #[test]
    fn removal_waits_for_transitioning_properties() {
        let (tree, styles, patcher) = setup();
        let root = tree.create_element("ul").expect("root");
        let old = patcher
            .patch(
                root,
                h("ul")
                    .child(
                        h("li")
                            .style("transition-property", "opacity, transform")
                            .remove_style("opacity", "0")
                            .remove_style("transform", "scale(0)")
                            .remove_style("color", "gray"),
                    )
                    .build(),
            )
            .expect("mount");
        let li = old.children().expect("children")[0].elm().expect("li");

        patcher.patch(old, h("ul").build()).expect("patch");
        assert_eq!(tree.style(li, "opacity").expect("opacity").as_deref(), Some("0"));
        assert_eq!(tree.parent_node(li).expect("parent"), Some(root));
        assert_eq!(styles.pending_removals(), 1);

        styles.transition_end(li).expect("opacity done");
        assert_eq!(tree.parent_node(li).expect("parent"), Some(root));
        styles.transition_end(li).expect("transform done");
        assert_eq!(tree.parent_node(li).expect("parent"), None);
        assert_eq!(styles.pending_removals(), 0);
    }

    #[test]
    fn removal_without_transitions_is_immediate() {
        let (tree, styles, patcher) = setup();
        let root = tree.create_element("ul").expect("root");
        let old = patcher
            .patch(
                root,
                h("ul")
                    .child(h("li").remove_style("opacity", "0"))
                    .build(),
            )
            .expect("mount");
        let li = old.children().expect("children")[0].elm().expect("li");

        patcher.patch(old, h("ul").build()).expect("patch");
        assert_eq!(tree.parent_node(li).expect("parent"), None);
        assert_eq!(styles.pending_removals(), 0);
    }
}
