//! Error recovery operators: retry, retry_when, catch_error

use super::trampoline::Trampoline;
use super::{Observable, Observer, Scheduler, Subscriber, Subscription, of, timer};
use crate::config::RetryConfig;
use crate::error::RxError;
use std::cell::Cell;
use std::rc::Rc;
use tracing::debug;

impl<T: 'static> Observable<T> {
    /// Resubscribe to the source up to `count` times after an error.
    ///
    /// Values emitted before an error are kept. Once the budget is spent the
    /// latest error is delivered.
    ///
    /// # Example
    /// ```
    /// # use rivulet::rx::range;
    /// # use rivulet::RxError;
    /// range(1, 5)
    ///     .try_map(|v| if v == 4 { Err(RxError::operator("unlucky")) } else { Ok(v) })
    ///     .retry(2)
    ///     .subscribe_next(|v| println!("{}", v)); // 1 2 3 1 2 3 1 2 3
    /// ```
    pub fn retry(self, count: usize) -> Observable<T> {
        Observable::new(move |downstream: Subscriber<T>| {
            retry_attempt(self.clone(), downstream, Rc::new(Cell::new(count)));
        })
    }

    /// Resubscribe whenever the stream returned by `notifier` emits.
    ///
    /// `notifier` is called once per source error with a single-event stream
    /// carrying that error. If the returned stream errors, the error goes
    /// downstream; if it completes without emitting, the result completes.
    pub fn retry_when<S, F>(self, notifier: F) -> Observable<T>
    where
        S: 'static,
        F: Fn(Observable<RxError>) -> Observable<S> + 'static,
    {
        let notifier = Rc::new(notifier);
        Observable::new(move |downstream: Subscriber<T>| {
            retry_when_attempt(self.clone(), Rc::clone(&notifier), downstream);
        })
    }

    /// Delay-based retry driven by `config`, with a fresh attempt counter per
    /// subscription
    pub fn retry_with<S>(self, config: RetryConfig, scheduler: &S) -> Observable<T>
    where
        S: Scheduler + Clone + 'static,
    {
        let scheduler = scheduler.clone();
        Observable::new(move |downstream: Subscriber<T>| {
            let notifier = retry_policy(config.clone(), &scheduler);
            self.clone().retry_when(notifier).subscribe_within(
                downstream.subscription(),
                Observer::forward_to(&downstream),
            );
        })
    }

    /// Replace an error with the stream produced by `handler`
    ///
    /// # Example
    /// ```
    /// # use rivulet::rx::{of, throw_error};
    /// # use rivulet::RxError;
    /// throw_error::<&str>(RxError::source("offline"))
    ///     .catch_error(|_| of(vec!["fallback"]))
    ///     .subscribe_next(|v| println!("{}", v));
    /// ```
    pub fn catch_error<F>(self, handler: F) -> Observable<T>
    where
        F: Fn(RxError) -> Observable<T> + 'static,
    {
        let handler = Rc::new(handler);
        Observable::new(move |downstream: Subscriber<T>| {
            let handler = Rc::clone(&handler);
            let fallback_to = downstream.clone();
            self.subscribe_within(
                downstream.subscription(),
                Observer::forward_to(&downstream).on_error(move |err| {
                    if fallback_to.is_closed() {
                        return;
                    }
                    debug!(%err, "source failed, switching to fallback");
                    handler(err).subscribe_within(
                        fallback_to.subscription(),
                        Observer::forward_to(&fallback_to),
                    );
                }),
            );
        })
    }
}

fn retry_attempt<T: 'static>(source: Observable<T>, downstream: Subscriber<T>, remaining: Rc<Cell<usize>>) {
    let trampoline = Rc::new(Trampoline::default());
    trampoline.run(|| {
        if downstream.is_closed() {
            return;
        }

        let on_error = downstream.clone();
        let retry_source = source.clone();
        let remaining = Rc::clone(&remaining);
        let trampoline = Rc::clone(&trampoline);
        source.subscribe_within(
            downstream.subscription(),
            Observer::forward_to(&downstream).on_error(move |err| {
                let left = remaining.get();
                if left == 0 {
                    on_error.error(err);
                    return;
                }
                remaining.set(left - 1);
                debug!(%err, remaining = left - 1, "resubscribing after error");
                if !trampoline.defer() {
                    retry_attempt(retry_source, on_error, remaining);
                }
            }),
        );
    });
}

fn retry_when_attempt<T, S, F>(source: Observable<T>, notifier: Rc<F>, downstream: Subscriber<T>)
where
    T: 'static,
    S: 'static,
    F: Fn(Observable<RxError>) -> Observable<S> + 'static,
{
    let trampoline = Rc::new(Trampoline::default());
    trampoline.run(|| {
        if downstream.is_closed() {
            return;
        }

        let on_error = downstream.clone();
        let retry_source = source.clone();
        let notifier = Rc::clone(&notifier);
        let trampoline = Rc::clone(&trampoline);
        source.subscribe_within(
            downstream.subscription(),
            Observer::forward_to(&downstream).on_error(move |err| {
                if on_error.is_closed() {
                    return;
                }

                let signals = notifier(of(vec![err]));
                let scope = Subscription::new();
                on_error.add(scope.clone());

                let signal_scope = scope.clone();
                let (retry_out, failed_out, done_out) =
                    (on_error.clone(), on_error.clone(), on_error.clone());
                signals.subscribe_within(
                    &scope,
                    Observer::new()
                        .on_next(move |_| {
                            signal_scope.unsubscribe();
                            debug!("retry signal received, resubscribing");
                            if !trampoline.defer() {
                                retry_when_attempt(
                                    retry_source.clone(),
                                    Rc::clone(&notifier),
                                    retry_out.clone(),
                                );
                            }
                        })
                        .on_error(move |err| failed_out.error(err))
                        .on_complete(move || done_out.complete()),
                );
            }),
        );
    });
}

/// Notifier for [`Observable::retry_when`] that waits `config.delay_for(n)`
/// before retry `n` and fails with a policy error after `config.max_retries`.
///
/// The attempt counter lives in the returned closure; build one per
/// subscription (as [`Observable::retry_with`] does) for independent budgets.
pub fn retry_policy<S>(
    config: RetryConfig,
    scheduler: &S,
) -> impl Fn(Observable<RxError>) -> Observable<u64> + 'static
where
    S: Scheduler + Clone + 'static,
{
    let scheduler = scheduler.clone();
    let attempts = Cell::new(0u32);
    move |errors: Observable<RxError>| {
        let attempt = attempts.get().saturating_add(1);
        attempts.set(attempt);

        if attempt > config.max_retries {
            let max = config.max_retries;
            return errors.try_map(move |err| {
                Err(RxError::policy(format!(
                    "gave up after {} retries: {}",
                    max,
                    err.message()
                )))
            });
        }

        let delay = config.delay_for(attempt);
        debug!(attempt, delay_ms = delay.as_millis() as u64, "scheduling retry");
        timer(delay, &scheduler)
    }
}
