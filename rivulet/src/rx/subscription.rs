//! Subscription handle (RxJS-like)

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use tracing::trace;

/// Cleanup handed back by a producer, run when its subscription closes
pub enum Teardown {
    None,
    Action(Box<dyn FnOnce()>),
    Child(Subscription),
}

impl Teardown {
    pub fn new(action: impl FnOnce() + 'static) -> Self {
        Self::Action(Box::new(action))
    }

    fn run(self) {
        match self {
            Self::None => {}
            Self::Action(action) => action(),
            Self::Child(subscription) => subscription.unsubscribe(),
        }
    }

    fn is_spent(&self) -> bool {
        matches!(self, Self::Child(child) if child.is_closed())
    }
}

impl From<()> for Teardown {
    fn from(_: ()) -> Self {
        Self::None
    }
}

impl From<Subscription> for Teardown {
    fn from(subscription: Subscription) -> Self {
        Self::Child(subscription)
    }
}

struct Inner {
    closed: Cell<bool>,
    teardowns: RefCell<Vec<Teardown>>,
}

/// One producer/consumer link. Clones share the same state.
#[derive(Clone)]
pub struct Subscription {
    inner: Rc<Inner>,
}

impl Subscription {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(Inner {
                closed: Cell::new(false),
                teardowns: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Check if the subscription was torn down
    pub fn is_closed(&self) -> bool {
        self.inner.closed.get()
    }

    /// Register cleanup. Runs immediately if already closed.
    pub fn add(&self, teardown: impl Into<Teardown>) {
        let teardown = teardown.into();
        match &teardown {
            Teardown::None => return,
            Teardown::Child(child) if Rc::ptr_eq(&child.inner, &self.inner) => return,
            _ => {}
        }

        if self.is_closed() {
            teardown.run();
            return;
        }

        let mut teardowns = self.inner.teardowns.borrow_mut();
        teardowns.retain(|t| !t.is_spent());
        teardowns.push(teardown);
    }

    /// Unsubscribe: runs every teardown once, further calls are no-ops
    pub fn unsubscribe(&self) {
        if self.inner.closed.replace(true) {
            return;
        }

        let teardowns = std::mem::take(&mut *self.inner.teardowns.borrow_mut());
        trace!(teardowns = teardowns.len(), "subscription closed");
        for teardown in teardowns {
            teardown.run();
        }
    }
}

impl Default for Subscription {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsubscribe_runs_teardown_once() {
        let runs = Rc::new(Cell::new(0));
        let subscription = Subscription::new();

        let r = Rc::clone(&runs);
        subscription.add(Teardown::new(move || r.set(r.get() + 1)));

        subscription.unsubscribe();
        subscription.unsubscribe();
        subscription.clone().unsubscribe();

        assert!(subscription.is_closed());
        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn test_add_after_close_runs_immediately() {
        let subscription = Subscription::new();
        subscription.unsubscribe();

        let ran = Rc::new(Cell::new(false));
        let r = Rc::clone(&ran);
        subscription.add(Teardown::new(move || r.set(true)));

        assert!(ran.get());
    }

    #[test]
    fn test_child_closes_with_parent() {
        let parent = Subscription::new();
        let child = Subscription::new();
        parent.add(child.clone());

        parent.unsubscribe();
        assert!(child.is_closed());
    }

    #[test]
    fn test_closing_child_leaves_parent_open() {
        let parent = Subscription::new();
        let child = Subscription::new();
        parent.add(child.clone());

        child.unsubscribe();
        assert!(!parent.is_closed());
    }

    #[test]
    fn test_spent_children_are_pruned() {
        let parent = Subscription::new();
        for _ in 0..10 {
            let child = Subscription::new();
            parent.add(child.clone());
            child.unsubscribe();
        }
        parent.add(Subscription::new());

        assert_eq!(parent.inner.teardowns.borrow().len(), 1);
    }

    #[test]
    fn test_self_add_is_ignored() {
        let subscription = Subscription::new();
        subscription.add(subscription.clone());
        subscription.unsubscribe();
        assert!(subscription.is_closed());
    }
}
