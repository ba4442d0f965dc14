use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::{NodeError, NodeId};

type Detach = Box<dyn FnOnce() -> Result<(), NodeError> + 'static>;

struct Countdown {
    remaining: Cell<usize>,
    detach: RefCell<Option<Detach>>,
}

/// Shared countdown for one pending removal.
///
/// Every `remove` participant receives a clone and calls [`RemovalHandle::done`]
/// once it is ready for the node to go. The last call detaches the live node
/// from its current parent; any call after that is ignored.
#[derive(Clone)]
pub struct RemovalHandle {
    inner: Rc<Countdown>,
    node: NodeId,
}

impl RemovalHandle {
    pub(crate) fn new(
        participants: usize,
        node: NodeId,
        detach: impl FnOnce() -> Result<(), NodeError> + 'static,
    ) -> Self {
        Self {
            inner: Rc::new(Countdown {
                remaining: Cell::new(participants),
                detach: RefCell::new(Some(Box::new(detach))),
            }),
            node,
        }
    }

    /// Live node waiting to be removed.
    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn remaining(&self) -> usize {
        self.inner.remaining.get()
    }

    pub fn is_complete(&self) -> bool {
        self.remaining() == 0
    }

    pub fn done(&self) -> Result<(), NodeError> {
        let remaining = self.inner.remaining.get();
        if remaining == 0 {
            return Ok(());
        }
        self.inner.remaining.set(remaining - 1);
        if remaining > 1 {
            return Ok(());
        }
        let detach = self.inner.detach.borrow_mut().take();
        match detach {
            Some(detach) => {
                log::debug!("removal of node {} complete, detaching", self.node);
                detach()
            }
            None => Ok(()),
        }
    }
}

impl fmt::Debug for RemovalHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemovalHandle")
            .field("node", &self.node)
            .field("remaining", &self.remaining())
            .finish()
    }
}
