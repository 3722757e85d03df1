//! Recording observer for unit tests

use super::Observer;
use crate::error::RxError;
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Event<T> {
    Next(T),
    Error(RxError),
    Complete,
}

pub(crate) struct Recorder<T> {
    events: Rc<RefCell<Vec<Event<T>>>>,
}

impl<T: Clone + 'static> Recorder<T> {
    pub(crate) fn new() -> Self {
        Self {
            events: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub(crate) fn observer(&self) -> Observer<T> {
        let next = Rc::clone(&self.events);
        let error = Rc::clone(&self.events);
        let complete = Rc::clone(&self.events);
        Observer::new()
            .on_next(move |v| next.borrow_mut().push(Event::Next(v)))
            .on_error(move |e| error.borrow_mut().push(Event::Error(e)))
            .on_complete(move || complete.borrow_mut().push(Event::Complete))
    }

    pub(crate) fn events(&self) -> Vec<Event<T>> {
        self.events.borrow().clone()
    }

    pub(crate) fn values(&self) -> Vec<T> {
        self.events
            .borrow()
            .iter()
            .filter_map(|event| match event {
                Event::Next(v) => Some(v.clone()),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn is_complete(&self) -> bool {
        matches!(self.events.borrow().last(), Some(Event::Complete))
    }
}
