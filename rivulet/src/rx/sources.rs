//! Creation functions: synchronous sources, `defer`, and timers

use super::{Observable, Observer, Scheduler, Subscriber, TaskHandle, Teardown};
use crate::error::RxError;
use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;
use tracing::trace;

/// Emit every item of `iter`, then complete. Each subscription iterates a fresh clone.
pub fn from_iter<T, I>(iter: I) -> Observable<T>
where
    T: 'static,
    I: IntoIterator<Item = T> + Clone + 'static,
{
    Observable::new(move |subscriber: Subscriber<T>| {
        for value in iter.clone() {
            if subscriber.is_closed() {
                return;
            }
            subscriber.next(value);
        }
        subscriber.complete();
    })
}

/// Emit the given values in order, then complete
pub fn of<T: Clone + 'static>(values: Vec<T>) -> Observable<T> {
    from_iter(values)
}

/// Emit `count` consecutive integers starting at `start`, stopping early at `i64::MAX`
pub fn range(start: i64, count: usize) -> Observable<i64> {
    from_iter((0..count).map_while(move |offset| {
        i64::try_from(offset)
            .ok()
            .and_then(|offset| start.checked_add(offset))
    }))
}

/// Complete immediately
pub fn empty<T: 'static>() -> Observable<T> {
    Observable::new(|subscriber: Subscriber<T>| subscriber.complete())
}

/// Never emit, never terminate
pub fn never<T: 'static>() -> Observable<T> {
    Observable::new(|_subscriber: Subscriber<T>| {})
}

/// Fail immediately with `error`
pub fn throw_error<T: 'static>(error: RxError) -> Observable<T> {
    Observable::new(move |subscriber: Subscriber<T>| subscriber.error(error.clone()))
}

/// Build the source lazily, once per subscription
pub fn defer<T, F>(factory: F) -> Observable<T>
where
    T: 'static,
    F: Fn() -> Observable<T> + 'static,
{
    Observable::new(move |subscriber: Subscriber<T>| {
        factory().subscribe_within(subscriber.subscription(), Observer::forward_to(&subscriber));
    })
}

/// Emit `0` after `delay`, then complete
pub fn timer<S>(delay: Duration, scheduler: &S) -> Observable<u64>
where
    S: Scheduler + Clone + 'static,
{
    ticks(delay, None, Rc::new(scheduler.clone()))
}

/// Emit `0` after `delay`, then `1, 2, …` every `period`
pub fn timer_periodic<S>(delay: Duration, period: Duration, scheduler: &S) -> Observable<u64>
where
    S: Scheduler + Clone + 'static,
{
    ticks(delay, Some(period), Rc::new(scheduler.clone()))
}

/// Emit `0, 1, 2, …` every `period`, starting one period after subscribing
pub fn interval<S>(period: Duration, scheduler: &S) -> Observable<u64>
where
    S: Scheduler + Clone + 'static,
{
    timer_periodic(period, period, scheduler)
}

fn ticks(delay: Duration, period: Option<Duration>, scheduler: Rc<dyn Scheduler>) -> Observable<u64> {
    Observable::new(move |subscriber: Subscriber<u64>| {
        let state = Rc::new(TickState {
            subscriber,
            scheduler: Rc::clone(&scheduler),
            period,
            count: Cell::new(0),
            pending: Cell::new(None),
        });
        TickState::schedule(&state, delay);
        Teardown::new(move || state.cancel())
    })
}

/// Per-subscription timer state
struct TickState {
    subscriber: Subscriber<u64>,
    scheduler: Rc<dyn Scheduler>,
    period: Option<Duration>,
    count: Cell<u64>,
    pending: Cell<Option<TaskHandle>>,
}

impl TickState {
    fn schedule(state: &Rc<Self>, delay: Duration) {
        let task_state = Rc::clone(state);
        let handle = state
            .scheduler
            .schedule_once(delay, Box::new(move || TickState::fire(&task_state)));
        state.pending.set(Some(handle));
    }

    fn fire(state: &Rc<Self>) {
        state.pending.set(None);
        if state.subscriber.is_closed() {
            return;
        }

        let tick = state.count.get();
        state.count.set(tick + 1);
        state.subscriber.next(tick);

        match state.period {
            None => state.subscriber.complete(),
            Some(period) if !state.subscriber.is_closed() => TickState::schedule(state, period),
            Some(_) => {}
        }
    }

    fn cancel(&self) {
        if let Some(handle) = self.pending.take() {
            trace!(?handle, "timer cancelled");
            self.scheduler.cancel(handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rx::VirtualScheduler;
    use crate::rx::testing::{Event, Recorder};

    #[test]
    fn test_of_emits_then_completes() {
        let recorder = Recorder::new();
        of(vec!["a", "b"]).subscribe(recorder.observer());
        assert_eq!(
            recorder.events(),
            vec![Event::Next("a"), Event::Next("b"), Event::Complete]
        );
    }

    #[test]
    fn test_range() {
        let recorder = Recorder::new();
        range(1, 5).subscribe(recorder.observer());
        assert_eq!(recorder.values(), vec![1, 2, 3, 4, 5]);
        assert!(recorder.is_complete());
    }

    #[test]
    fn test_range_stops_at_i64_max() {
        let recorder = Recorder::new();
        range(i64::MAX - 1, 5).subscribe(recorder.observer());
        assert_eq!(
            recorder.events(),
            vec![Event::Next(i64::MAX - 1), Event::Next(i64::MAX), Event::Complete]
        );

        let negative = Recorder::new();
        range(-2, 3).subscribe(negative.observer());
        assert_eq!(negative.values(), vec![-2, -1, 0]);
    }

    #[test]
    fn test_empty_and_throw() {
        let completed = Recorder::<i32>::new();
        empty().subscribe(completed.observer());
        assert_eq!(completed.events(), vec![Event::Complete]);

        let failed = Recorder::<i32>::new();
        throw_error(RxError::source("nope")).subscribe(failed.observer());
        assert_eq!(failed.events(), vec![Event::Error(RxError::source("nope"))]);
    }

    #[test]
    fn test_never_stays_open() {
        let recorder = Recorder::<i32>::new();
        let subscription = never().subscribe(recorder.observer());
        assert!(recorder.events().is_empty());
        assert!(!subscription.is_closed());
    }

    #[test]
    fn test_defer_calls_factory_per_subscription() {
        let calls = Rc::new(Cell::new(0));
        let c = Rc::clone(&calls);
        let obs = defer(move || {
            c.set(c.get() + 1);
            of(vec![c.get()])
        });

        let first = Recorder::new();
        let second = Recorder::new();
        obs.subscribe(first.observer());
        obs.subscribe(second.observer());

        assert_eq!(first.values(), vec![1]);
        assert_eq!(second.values(), vec![2]);
    }

    #[test]
    fn test_timer_emits_once_then_completes() {
        let scheduler = VirtualScheduler::new();
        let recorder = Recorder::new();
        timer(Duration::from_millis(100), &scheduler).subscribe(recorder.observer());

        scheduler.advance_by(Duration::from_millis(99));
        assert!(recorder.events().is_empty());

        scheduler.advance_by(Duration::from_millis(1));
        assert_eq!(recorder.events(), vec![Event::Next(0), Event::Complete]);
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn test_interval_ticks_until_unsubscribed() {
        let scheduler = VirtualScheduler::new();
        let recorder = Recorder::new();
        let subscription =
            interval(Duration::from_secs(1), &scheduler).subscribe(recorder.observer());

        scheduler.advance_by(Duration::from_millis(3500));
        assert_eq!(recorder.values(), vec![0, 1, 2]);
        assert_eq!(scheduler.pending(), 1);

        subscription.unsubscribe();
        assert_eq!(scheduler.pending(), 0);

        scheduler.advance_by(Duration::from_secs(5));
        assert_eq!(recorder.values(), vec![0, 1, 2]);
    }

    #[test]
    fn test_timer_periodic_first_delay() {
        let scheduler = VirtualScheduler::new();
        let recorder = Recorder::new();
        let subscription = timer_periodic(
            Duration::from_millis(500),
            Duration::from_millis(1000),
            &scheduler,
        )
        .subscribe(recorder.observer());

        scheduler.advance_to(Duration::from_millis(500));
        assert_eq!(recorder.values(), vec![0]);
        scheduler.advance_to(Duration::from_millis(2500));
        assert_eq!(recorder.values(), vec![0, 1, 2]);
        subscription.unsubscribe();
    }

    #[test]
    fn test_each_timer_subscription_counts_from_zero() {
        let scheduler = VirtualScheduler::new();
        let ticks = interval(Duration::from_secs(1), &scheduler);

        let first = Recorder::new();
        let s1 = ticks.subscribe(first.observer());
        scheduler.advance_by(Duration::from_secs(2));

        let second = Recorder::new();
        let s2 = ticks.subscribe(second.observer());
        scheduler.advance_by(Duration::from_secs(1));

        assert_eq!(first.values(), vec![0, 1, 2]);
        assert_eq!(second.values(), vec![0]);
        s1.unsubscribe();
        s2.unsubscribe();
    }
}
