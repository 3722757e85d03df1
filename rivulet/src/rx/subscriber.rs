//! Engine-side observer wrapper
//!
//! A [`Subscriber`] is what a producer function receives. It owns the user's
//! [`Observer`] for the lifetime of one subscription, drops everything after a
//! terminal notification, and never re-enters the observer: notifications raised
//! while a delivery is running are queued and drained in order by the outer call.

use super::{Observer, Subscription, Teardown};
use crate::error::RxError;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

enum Notification<T> {
    Next(T),
    Error(RxError),
    Complete,
}

struct Inner<T> {
    observer: RefCell<Observer<T>>,
    queue: RefCell<VecDeque<Notification<T>>>,
    delivering: Cell<bool>,
    stopped: Cell<bool>,
    subscription: Subscription,
}

/// Handle a producer uses to emit into one subscription
pub struct Subscriber<T> {
    inner: Rc<Inner<T>>,
}

impl<T> Clone for Subscriber<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: 'static> Subscriber<T> {
    pub(crate) fn new(observer: Observer<T>) -> Self {
        let inner = Rc::new(Inner {
            observer: RefCell::new(observer),
            queue: RefCell::new(VecDeque::new()),
            delivering: Cell::new(false),
            stopped: Cell::new(false),
            subscription: Subscription::new(),
        });

        // Release the observer's captures once the link is torn down. If a
        // delivery is in progress the drain loop releases it instead.
        let weak = Rc::downgrade(&inner);
        inner.subscription.add(Teardown::new(move || {
            if let Some(inner) = weak.upgrade() {
                if let Ok(mut observer) = inner.observer.try_borrow_mut() {
                    *observer = Observer::new();
                }
            }
        }));

        Self { inner }
    }

    /// Emit a value
    pub fn next(&self, value: T) {
        if self.is_closed() {
            return;
        }
        self.push(Notification::Next(value));
    }

    /// Terminate with an error
    pub fn error(&self, error: RxError) {
        if self.is_closed() || self.inner.stopped.replace(true) {
            return;
        }
        self.push(Notification::Error(error));
    }

    /// Terminate successfully
    pub fn complete(&self) {
        if self.is_closed() || self.inner.stopped.replace(true) {
            return;
        }
        self.push(Notification::Complete);
    }

    /// True once terminated or unsubscribed
    pub fn is_closed(&self) -> bool {
        self.inner.stopped.get() || self.inner.subscription.is_closed()
    }

    /// Register cleanup on this subscription
    pub fn add(&self, teardown: impl Into<Teardown>) {
        self.inner.subscription.add(teardown);
    }

    pub fn subscription(&self) -> &Subscription {
        &self.inner.subscription
    }

    fn push(&self, notification: Notification<T>) {
        self.inner.queue.borrow_mut().push_back(notification);
        if self.inner.delivering.replace(true) {
            return;
        }

        loop {
            let Some(notification) = self.inner.queue.borrow_mut().pop_front() else {
                break;
            };
            if self.inner.subscription.is_closed() {
                self.inner.queue.borrow_mut().clear();
                break;
            }

            match notification {
                Notification::Next(value) => self.inner.observer.borrow_mut().deliver_next(value),
                Notification::Error(error) => {
                    self.inner.observer.borrow_mut().deliver_error(error);
                    self.inner.subscription.unsubscribe();
                }
                Notification::Complete => {
                    self.inner.observer.borrow_mut().deliver_complete();
                    self.inner.subscription.unsubscribe();
                }
            }
        }

        self.inner.delivering.set(false);
        if self.inner.subscription.is_closed() {
            *self.inner.observer.borrow_mut() = Observer::new();
        }
    }
}
