//! Observer capability struct (RxJS-like partial observers)

use super::Subscriber;
use crate::error::RxError;
use tracing::debug;

/// Sink with optional `next`, `error` and `complete` handlers.
///
/// Missing handlers are no-ops. An error reaching an observer without an error
/// handler is dropped.
///
/// # Example
/// ```
/// # use rivulet::rx::{of, Observer};
/// of(vec![1, 2, 3]).subscribe(
///     Observer::new()
///         .on_next(|value: i32| println!("Next: {}", value))
///         .on_error(|err| eprintln!("Error: {}", err))
///         .on_complete(|| println!("Complete!")),
/// );
/// ```
pub struct Observer<T> {
    next: Option<Box<dyn FnMut(T)>>,
    error: Option<Box<dyn FnOnce(RxError)>>,
    complete: Option<Box<dyn FnOnce()>>,
}

impl<T> Observer<T> {
    /// Observer with no handlers
    pub fn new() -> Self {
        Self {
            next: None,
            error: None,
            complete: None,
        }
    }

    pub fn on_next(mut self, next: impl FnMut(T) + 'static) -> Self {
        self.next = Some(Box::new(next));
        self
    }

    pub fn on_error(mut self, error: impl FnOnce(RxError) + 'static) -> Self {
        self.error = Some(Box::new(error));
        self
    }

    pub fn on_complete(mut self, complete: impl FnOnce() + 'static) -> Self {
        self.complete = Some(Box::new(complete));
        self
    }

    pub(crate) fn deliver_next(&mut self, value: T) {
        if let Some(next) = self.next.as_mut() {
            next(value);
        }
    }

    pub(crate) fn deliver_error(&mut self, error: RxError) {
        match self.error.take() {
            Some(handler) => handler(error),
            None => debug!(%error, "unhandled stream error dropped"),
        }
    }

    pub(crate) fn deliver_complete(&mut self) {
        if let Some(complete) = self.complete.take() {
            complete();
        }
    }
}

impl<T: 'static> Observer<T> {
    /// Observer relaying every notification to `downstream`
    pub fn forward_to(downstream: &Subscriber<T>) -> Self {
        let next = downstream.clone();
        let error = downstream.clone();
        let complete = downstream.clone();
        Self::new()
            .on_next(move |value| next.next(value))
            .on_error(move |err| error.error(err))
            .on_complete(move || complete.complete())
    }
}

impl<T> Default for Observer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, F> From<F> for Observer<T>
where
    F: FnMut(T) + 'static,
{
    fn from(next: F) -> Self {
        Self::new().on_next(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_partial_observer_ignores_missing_handlers() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        let mut observer: Observer<i32> = Observer::from(move |v| s.borrow_mut().push(v));

        observer.deliver_next(1);
        observer.deliver_error(RxError::source("ignored"));
        observer.deliver_complete();

        assert_eq!(*seen.borrow(), vec![1]);
    }

    #[test]
    fn test_terminal_handlers_fire_once() {
        let completions = Rc::new(RefCell::new(0));
        let c = Rc::clone(&completions);
        let mut observer = Observer::<()>::new().on_complete(move || *c.borrow_mut() += 1);

        observer.deliver_complete();
        observer.deliver_complete();

        assert_eq!(*completions.borrow(), 1);
    }
}
