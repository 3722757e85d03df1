//! Observable implementation (RxJS-like)

use super::{Observer, Subscriber, Subscription, Teardown};
use std::rc::Rc;

type Producer<T> = dyn Fn(Subscriber<T>) -> Teardown;

/// Lazy push-based producer of values.
///
/// Every call to [`Observable::subscribe`] runs the producer function again with
/// a fresh [`Subscriber`], so iteration state, timers and side effects are never
/// shared between subscriptions.
pub struct Observable<T> {
    producer: Rc<Producer<T>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            producer: Rc::clone(&self.producer),
        }
    }
}

impl<T: 'static> Observable<T> {
    /// Create an Observable from a producer function
    ///
    /// The producer may return a cleanup action, a child [`Subscription`], or `()`.
    ///
    /// # Example
    /// ```
    /// # use rivulet::rx::{Observable, Teardown};
    /// let obs = Observable::new(|subscriber| {
    ///     subscriber.next(1);
    ///     subscriber.next(2);
    ///     subscriber.complete();
    ///     Teardown::new(|| println!("cleaned up"))
    /// });
    /// obs.subscribe_next(|value: i32| println!("Next: {}", value));
    /// ```
    pub fn new<F, R>(producer: F) -> Self
    where
        F: Fn(Subscriber<T>) -> R + 'static,
        R: Into<Teardown>,
    {
        Self {
            producer: Rc::new(move |subscriber| producer(subscriber).into()),
        }
    }

    /// Subscribe with a (possibly partial) observer
    pub fn subscribe(&self, observer: Observer<T>) -> Subscription {
        let subscriber = Subscriber::new(observer);
        self.run(&subscriber);
        subscriber.subscription().clone()
    }

    /// Subscribe with only next callback (simplified)
    pub fn subscribe_next<F>(&self, next: F) -> Subscription
    where
        F: FnMut(T) + 'static,
    {
        self.subscribe(Observer::new().on_next(next))
    }

    /// Subscribe as a child of `parent`.
    ///
    /// The new subscription is attached before the producer runs, so closing
    /// `parent` stops even a synchronous source mid-emission.
    pub fn subscribe_within(&self, parent: &Subscription, observer: Observer<T>) -> Subscription {
        let subscriber = Subscriber::new(observer);
        parent.add(subscriber.subscription().clone());
        self.run(&subscriber);
        subscriber.subscription().clone()
    }

    /// Apply an `Observable -> Observable` function, for hand-written operators
    pub fn pipe<U, F>(self, operator: F) -> Observable<U>
    where
        F: FnOnce(Self) -> Observable<U>,
    {
        operator(self)
    }

    fn run(&self, subscriber: &Subscriber<T>) {
        if subscriber.is_closed() {
            return;
        }
        let teardown = (self.producer)(subscriber.clone());
        subscriber.add(teardown);
    }
}
