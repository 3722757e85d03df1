//! Push-based reactive streams
//!
//! An [`Observable`] is a cold, lazily evaluated producer. Operators such as
//! [`Observable::map`], [`Observable::merge`] or [`Observable::retry_when`]
//! wrap the source in a new Observable, and nothing runs until
//! [`Observable::subscribe`] is called. Time-based sources are driven by a
//! [`Scheduler`].

mod bridge;
mod combine;
mod observable;
mod observer;
mod operators;
mod recover;
mod scheduler;
mod sources;
mod subscriber;
mod subscription;
mod trampoline;

#[cfg(test)]
pub(crate) mod testing;

pub use bridge::{ObservableStream, from_future, from_stream};
pub use combine::{concat_all, merge_all, zip, zip_all, zip_with};
pub use observable::Observable;
pub use observer::Observer;
pub use recover::retry_policy;
pub use scheduler::{Scheduler, Task, TaskHandle, TokioScheduler, VirtualScheduler};
pub use sources::{
    defer, empty, from_iter, interval, never, of, range, throw_error, timer, timer_periodic,
};
pub use subscriber::Subscriber;
pub use subscription::{Subscription, Teardown};
