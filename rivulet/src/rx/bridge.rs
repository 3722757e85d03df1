//! Bridges between Observables and async Rust (futures and streams)
//!
//! Everything here spawns onto the current [`tokio::task::LocalSet`], so
//! subscribing outside one panics.

use super::{Observable, Observer, Subscriber, Subscription, Teardown};
use crate::error::Result;
use futures::{Stream, StreamExt};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::trace;

/// Run a fresh future per subscription and emit its output.
///
/// Unsubscribing aborts the spawned task.
pub fn from_future<T, F, Fut>(factory: F) -> Observable<T>
where
    T: 'static,
    F: Fn() -> Fut + 'static,
    Fut: Future<Output = Result<T>> + 'static,
{
    Observable::new(move |subscriber: Subscriber<T>| {
        let future = factory();
        let task = tokio::task::spawn_local(async move {
            match future.await {
                Ok(value) => {
                    subscriber.next(value);
                    subscriber.complete();
                }
                Err(err) => subscriber.error(err),
            }
        });
        Teardown::new(move || task.abort())
    })
}

/// Drive a fresh stream per subscription, forwarding items until the first
/// `Err` or the end of the stream
pub fn from_stream<T, F, St>(factory: F) -> Observable<T>
where
    T: 'static,
    F: Fn() -> St + 'static,
    St: Stream<Item = Result<T>> + 'static,
{
    Observable::new(move |subscriber: Subscriber<T>| {
        let stream = factory();
        let task = tokio::task::spawn_local(async move {
            let mut stream = Box::pin(stream);
            while let Some(item) = stream.next().await {
                if subscriber.is_closed() {
                    return;
                }
                match item {
                    Ok(value) => subscriber.next(value),
                    Err(err) => {
                        subscriber.error(err);
                        return;
                    }
                }
            }
            subscriber.complete();
        });
        Teardown::new(move || task.abort())
    })
}

impl<T: 'static> Observable<T> {
    /// Subscribe and expose the notifications as a [`Stream`].
    ///
    /// Values arrive as `Ok`, an error as a final `Err`; completion ends the
    /// stream. Dropping the stream unsubscribes.
    pub fn into_stream(self) -> ObservableStream<T> {
        let (tx, rx) = mpsc::unbounded_channel();
        let (error_tx, complete_tx) = (tx.clone(), tx.clone());

        let subscription = self.subscribe(
            Observer::new()
                .on_next(move |value| {
                    let _ = tx.send(Ok(value));
                })
                .on_error(move |err| {
                    let _ = error_tx.send(Err(err));
                })
                .on_complete(move || drop(complete_tx)),
        );

        ObservableStream {
            inner: UnboundedReceiverStream::new(rx),
            subscription,
        }
    }
}

/// Stream returned by [`Observable::into_stream`]
pub struct ObservableStream<T> {
    inner: UnboundedReceiverStream<Result<T>>,
    subscription: Subscription,
}

impl<T> ObservableStream<T> {
    /// Subscription feeding this stream
    pub fn subscription(&self) -> &Subscription {
        &self.subscription
    }
}

impl<T> Stream for ObservableStream<T> {
    type Item = Result<T>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

impl<T> Drop for ObservableStream<T> {
    fn drop(&mut self) {
        if !self.subscription.is_closed() {
            trace!("observable stream dropped, unsubscribing");
        }
        self.subscription.unsubscribe();
    }
}
