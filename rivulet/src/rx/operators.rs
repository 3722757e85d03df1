//! RxJS-style transform operators

use super::{Observable, Observer, Subscriber};
use crate::error::Result;
use std::rc::Rc;

impl<T: 'static> Observable<T> {
    /// Map operator - transform values
    ///
    /// # Example
    /// ```
    /// # use rivulet::rx::of;
    /// let squares = of(vec![1, 2, 3]).map(|v| v * v);
    /// squares.subscribe_next(|v| println!("{}", v));
    /// ```
    pub fn map<U, F>(self, f: F) -> Observable<U>
    where
        U: 'static,
        F: Fn(T) -> U + 'static,
    {
        self.try_map(move |value| Ok(f(value)))
    }

    /// Fallible map. The first `Err` is delivered as `error` and the source is
    /// torn down, so later source values are dropped.
    pub fn try_map<U, F>(self, f: F) -> Observable<U>
    where
        U: 'static,
        F: Fn(T) -> Result<U> + 'static,
    {
        let f = Rc::new(f);
        Observable::new(move |downstream: Subscriber<U>| {
            let f = Rc::clone(&f);
            let next = downstream.clone();
            let error = downstream.clone();
            let complete = downstream.clone();
            self.subscribe_within(
                downstream.subscription(),
                Observer::new()
                    .on_next(move |value| match f(value) {
                        Ok(mapped) => next.next(mapped),
                        Err(err) => next.error(err),
                    })
                    .on_error(move |err| error.error(err))
                    .on_complete(move || complete.complete()),
            );
        })
    }

    /// Take operator - take first N values, then complete and release the source
    pub fn take(self, count: usize) -> Observable<T> {
        Observable::new(move |downstream: Subscriber<T>| {
            if count == 0 {
                downstream.complete();
                return;
            }

            let mut seen = 0;
            let next = downstream.clone();
            self.subscribe_within(
                downstream.subscription(),
                Observer::forward_to(&downstream).on_next(move |value| {
                    seen += 1;
                    next.next(value);
                    if seen >= count {
                        next.complete();
                    }
                }),
            );
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::error::RxError;
    use crate::rx::testing::{Event, Recorder};
    use crate::rx::{Observable, Subscriber, VirtualScheduler, interval, never, of, range};
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Duration;

    #[test]
    fn test_map() {
        let recorder = Recorder::new();
        of(vec![1, 2, 3]).map(|x| x * 2).subscribe(recorder.observer());
        assert_eq!(
            recorder.events(),
            vec![Event::Next(2), Event::Next(4), Event::Next(6), Event::Complete]
        );
    }

    #[test]
    fn test_map_forwards_error() {
        let recorder = Recorder::new();
        crate::rx::throw_error::<i32>(RxError::source("upstream"))
            .map(|x| x + 1)
            .subscribe(recorder.observer());
        assert_eq!(
            recorder.events(),
            vec![Event::Error(RxError::source("upstream"))]
        );
    }

    #[test]
    fn test_try_map_failure_stops_forwarding() {
        let produced = Rc::new(RefCell::new(Vec::new()));
        let p = Rc::clone(&produced);
        let source = Observable::new(move |sub: Subscriber<i64>| {
            for v in 1..=5 {
                p.borrow_mut().push(v);
                sub.next(v);
            }
            sub.complete();
        });

        let recorder = Recorder::new();
        source
            .try_map(|v| {
                if v == 4 {
                    Err(RxError::operator("unlucky number"))
                } else {
                    Ok(v)
                }
            })
            .subscribe(recorder.observer());

        assert_eq!(
            recorder.events(),
            vec![
                Event::Next(1),
                Event::Next(2),
                Event::Next(3),
                Event::Error(RxError::operator("unlucky number")),
            ]
        );
        // Producer keeps looping; the closed subscriber drops everything past 4
        assert_eq!(produced.borrow().len(), 5);
    }

    #[test]
    fn test_try_map_stops_sync_source_iteration() {
        let touched = Rc::new(RefCell::new(Vec::new()));
        let t = Rc::clone(&touched);
        let recorder = Recorder::new();
        range(1, 100)
            .map(move |v| {
                t.borrow_mut().push(v);
                v
            })
            .try_map(|v| {
                if v == 3 {
                    Err(RxError::operator("stop"))
                } else {
                    Ok(v)
                }
            })
            .subscribe(recorder.observer());

        assert_eq!(recorder.values(), vec![1, 2]);
        assert_eq!(*touched.borrow(), vec![1, 2, 3]);
    }

    #[test]
    fn test_take_completes_early() {
        let recorder = Recorder::new();
        range(0, 10).take(3).subscribe(recorder.observer());
        assert_eq!(
            recorder.events(),
            vec![Event::Next(0), Event::Next(1), Event::Next(2), Event::Complete]
        );
    }

    #[test]
    fn test_take_zero_never_subscribes() {
        let recorder = Recorder::<i32>::new();
        never().take(0).subscribe(recorder.observer());
        assert_eq!(recorder.events(), vec![Event::Complete]);
    }

    #[test]
    fn test_take_cancels_timer() {
        let scheduler = VirtualScheduler::new();
        let recorder = Recorder::new();
        interval(Duration::from_secs(1), &scheduler)
            .take(3)
            .subscribe(recorder.observer());

        scheduler.advance_by(Duration::from_secs(10));
        assert_eq!(
            recorder.events(),
            vec![Event::Next(0), Event::Next(1), Event::Next(2), Event::Complete]
        );
        assert_eq!(scheduler.pending(), 0);
    }
}
