//! Combination operators: concat, merge and zip

use super::trampoline::Trampoline;
use super::{Observable, Observer, Subscriber, Subscription};
use crate::error::{Result, RxError};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use tracing::debug;

impl<T: 'static> Observable<T> {
    /// Emit all of this source, then all of `other`
    ///
    /// # Example
    /// ```
    /// # use rivulet::rx::of;
    /// of(vec![1, 2, 3])
    ///     .concat(of(vec![4, 5, 6]))
    ///     .subscribe_next(|v| println!("{}", v)); // 1, 2, 3, 4, 5, 6
    /// ```
    pub fn concat(self, other: Observable<T>) -> Observable<T> {
        concat_all(vec![self, other])
    }

    /// Interleave this source with `other`
    pub fn merge(self, other: Observable<T>) -> Observable<T> {
        merge_all(vec![self, other])
    }

    /// Pair values from this source and `other` by arrival index
    pub fn zip<U: 'static>(self, other: Observable<U>) -> Observable<(T, U)> {
        zip(self, other)
    }
}

/// Subscribe to each source in turn, starting the next when the previous completes
pub fn concat_all<T: 'static>(sources: Vec<Observable<T>>) -> Observable<T> {
    let sources: Rc<[Observable<T>]> = sources.into();
    Observable::new(move |downstream: Subscriber<T>| {
        concat_from(Rc::clone(&sources), 0, downstream);
    })
}

fn concat_from<T: 'static>(sources: Rc<[Observable<T>]>, start: usize, downstream: Subscriber<T>) {
    let next_index = Rc::new(Cell::new(start));
    let trampoline = Rc::new(Trampoline::default());
    trampoline.run(|| {
        if downstream.is_closed() {
            return;
        }
        let index = next_index.get();
        let Some(source) = sources.get(index).cloned() else {
            downstream.complete();
            return;
        };

        let on_complete = downstream.clone();
        let rest = Rc::clone(&sources);
        let next_index = Rc::clone(&next_index);
        let trampoline = Rc::clone(&trampoline);
        source.subscribe_within(
            downstream.subscription(),
            Observer::forward_to(&downstream).on_complete(move || {
                next_index.set(index + 1);
                if !trampoline.defer() {
                    concat_from(rest, index + 1, on_complete);
                }
            }),
        );
    });
}

/// Subscribe to every source at once and forward values as they arrive.
///
/// Completes when all sources complete. The first error cancels the other
/// sources before it is delivered.
pub fn merge_all<T: 'static>(sources: Vec<Observable<T>>) -> Observable<T> {
    let sources: Rc<[Observable<T>]> = sources.into();
    Observable::new(move |downstream: Subscriber<T>| {
        if sources.is_empty() {
            downstream.complete();
            return;
        }

        let scopes = open_scopes(&downstream, sources.len());
        let active = Rc::new(Cell::new(sources.len()));

        for (index, source) in sources.iter().enumerate() {
            if downstream.is_closed() {
                break;
            }

            let on_error = downstream.clone();
            let on_complete = downstream.clone();
            let siblings = Rc::clone(&scopes);
            let active = Rc::clone(&active);
            source.subscribe_within(
                &scopes[index],
                Observer::forward_to(&downstream)
                    .on_error(move |err| {
                        debug!(source = index, %err, "merge source failed, cancelling siblings");
                        cancel_siblings(&siblings, index);
                        on_error.error(err);
                    })
                    .on_complete(move || {
                        let remaining = active.get() - 1;
                        active.set(remaining);
                        if remaining == 0 {
                            on_complete.complete();
                        }
                    }),
            );
        }
    })
}

struct ZipState<T> {
    queues: Vec<VecDeque<T>>,
    completed: Vec<bool>,
}

impl<T> ZipState<T> {
    fn new(width: usize) -> Self {
        Self {
            queues: (0..width).map(|_| VecDeque::new()).collect(),
            completed: vec![false; width],
        }
    }

    /// Dequeue one value per source once every queue has one
    fn take_row(&mut self) -> Option<Vec<T>> {
        if self.queues.iter().any(VecDeque::is_empty) {
            return None;
        }
        self.queues.iter_mut().map(VecDeque::pop_front).collect()
    }

    /// No further row can ever be formed
    fn exhausted(&self) -> bool {
        self.queues
            .iter()
            .zip(&self.completed)
            .any(|(queue, done)| *done && queue.is_empty())
    }
}

/// Combine same-index values from every source.
///
/// Output length equals the shortest input. A combiner or source error cancels
/// every source and is delivered downstream.
///
/// # Example
/// ```
/// # use rivulet::rx::{of, zip_all};
/// let sums = zip_all(vec![of(vec![1, 2]), of(vec![10, 20, 30])], |row| {
///     Ok(row.iter().sum::<i32>())
/// });
/// sums.subscribe_next(|v| println!("{}", v)); // 11, 22
/// ```
pub fn zip_all<T, U, F>(sources: Vec<Observable<T>>, combiner: F) -> Observable<U>
where
    T: 'static,
    U: 'static,
    F: Fn(Vec<T>) -> Result<U> + 'static,
{
    let sources: Rc<[Observable<T>]> = sources.into();
    let combiner = Rc::new(combiner);
    Observable::new(move |downstream: Subscriber<U>| {
        if sources.is_empty() {
            downstream.complete();
            return;
        }

        let scopes = open_scopes(&downstream, sources.len());
        let state = Rc::new(RefCell::new(ZipState::new(sources.len())));

        for (index, source) in sources.iter().enumerate() {
            if downstream.is_closed() {
                break;
            }

            let (next_state, next_out, next_scopes) =
                (Rc::clone(&state), downstream.clone(), Rc::clone(&scopes));
            let combiner = Rc::clone(&combiner);
            let (error_out, error_scopes) = (downstream.clone(), Rc::clone(&scopes));
            let (complete_state, complete_out) = (Rc::clone(&state), downstream.clone());

            source.subscribe_within(
                &scopes[index],
                Observer::new()
                    .on_next(move |value| {
                        let row = {
                            let mut state = next_state.borrow_mut();
                            state.queues[index].push_back(value);
                            state.take_row()
                        };
                        let Some(row) = row else {
                            return;
                        };

                        match combiner(row) {
                            Ok(combined) => next_out.next(combined),
                            Err(err) => {
                                cancel_siblings(&next_scopes, usize::MAX);
                                next_out.error(err);
                                return;
                            }
                        }
                        if next_state.borrow().exhausted() {
                            next_out.complete();
                        }
                    })
                    .on_error(move |err| {
                        debug!(source = index, %err, "zip source failed, cancelling siblings");
                        cancel_siblings(&error_scopes, index);
                        error_out.error(err);
                    })
                    .on_complete(move || {
                        let exhausted = {
                            let mut state = complete_state.borrow_mut();
                            state.completed[index] = true;
                            state.exhausted()
                        };
                        if exhausted {
                            complete_out.complete();
                        }
                    }),
            );
        }
    })
}

enum Either<A, B> {
    Left(A),
    Right(B),
}

/// Pair two differently typed sources by arrival index
pub fn zip<A, B>(left: Observable<A>, right: Observable<B>) -> Observable<(A, B)>
where
    A: 'static,
    B: 'static,
{
    zip_all(
        vec![left.map(Either::Left), right.map(Either::Right)],
        |row| {
            let mut row = row.into_iter();
            match (row.next(), row.next()) {
                (Some(Either::Left(a)), Some(Either::Right(b))) => Ok((a, b)),
                _ => Err(RxError::operator("zip row out of source order")),
            }
        },
    )
}

/// Pair two sources and combine each pair with a fallible function
pub fn zip_with<A, B, U, F>(left: Observable<A>, right: Observable<B>, combiner: F) -> Observable<U>
where
    A: 'static,
    B: 'static,
    U: 'static,
    F: Fn(A, B) -> Result<U> + 'static,
{
    zip(left, right).try_map(move |(a, b)| combiner(a, b))
}

/// One child subscription per source, attached to the downstream link up front
/// so error handlers can reach siblings that are still subscribing.
fn open_scopes<T: 'static>(downstream: &Subscriber<T>, count: usize) -> Rc<Vec<Subscription>> {
    let scopes: Vec<Subscription> = (0..count)
        .map(|_| {
            let scope = Subscription::new();
            downstream.add(scope.clone());
            scope
        })
        .collect();
    Rc::new(scopes)
}

fn cancel_siblings(scopes: &[Subscription], failed: usize) {
    for (index, scope) in scopes.iter().enumerate() {
        if index != failed {
            scope.unsubscribe();
        }
    }
}
