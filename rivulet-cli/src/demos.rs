//! Demo scenarios, one per subcommand

use crate::config::DemoConfig;
use anyhow::Result;
use colored::Colorize;
use futures::StreamExt;
use rivulet::RxError;
use rivulet::rx::{
    Observable, Observer, Subscriber, TokioScheduler, from_future, from_iter, interval, of, range,
    timer_periodic, zip, zip_with,
};
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;
use tracing::{debug, info};

/// Shared state for every scenario
pub struct DemoContext {
    pub config: DemoConfig,
    pub scheduler: TokioScheduler,
}

impl DemoContext {
    pub fn new(config: DemoConfig) -> Self {
        Self {
            config,
            scheduler: TokioScheduler::new(),
        }
    }
}

fn header(name: &str) {
    println!("{}", format!("== {} ==", name).bold().cyan());
}

/// Print every notification of `source` until it terminates
async fn drain<T: fmt::Display + 'static>(label: &str, source: Observable<T>) {
    let mut stream = source.into_stream();
    while let Some(item) = stream.next().await {
        match item {
            Ok(value) => println!("{}{}", label, value),
            Err(err) => {
                println!("{}{}", label, format!("error: {}", err).red());
                return;
            }
        }
    }
    println!("{}{}", label, "complete".dimmed());
}

/// Like [`drain`], but unsubscribe after `run_for` if the source is still open
async fn drain_for<T: fmt::Display + 'static>(label: &str, source: Observable<T>, run_for: Duration) {
    if tokio::time::timeout(run_for, drain(label, source)).await.is_err() {
        println!("{}", format!("(unsubscribed after {:?})", run_for).dimmed());
    }
}

/// Two subscribers on one interval each get their own ticks
pub async fn cold(ctx: &DemoContext) -> Result<()> {
    header("cold interval");
    let timing = &ctx.config.timing;
    let tick = interval(timing.tick(), &ctx.scheduler).take(3);

    let late = tick.clone();
    tokio::join!(drain("observable 1: ", tick), async move {
        tokio::time::sleep(timing.second_subscriber_delay()).await;
        drain("observable 2: ", late).await;
    });
    Ok(())
}

fn multiply_by_ten(input: Observable<i64>) -> Observable<i64> {
    Observable::new(move |output: Subscriber<i64>| {
        let (next, error, complete) = (output.clone(), output.clone(), output.clone());
        input.subscribe_within(
            output.subscription(),
            Observer::new()
                .on_next(move |v| next.next(10 * v))
                .on_error(move |err| error.error(err))
                .on_complete(move || complete.complete()),
        );
    })
}

/// A hand-written operator plugged in with `pipe`
pub async fn custom_operator(_ctx: &DemoContext) -> Result<()> {
    header("custom operator");
    drain("", from_iter(vec![1, 2, 3, 4]).pipe(multiply_by_ten)).await;

    let squares = of(vec![1, 2, 3]).map(|v| v * v);
    drain("squared: ", squares).await;
    Ok(())
}

pub async fn concat(_ctx: &DemoContext) -> Result<()> {
    header("concat");
    drain("", of(vec![1, 2, 3]).concat(of(vec![4, 5, 6]))).await;
    Ok(())
}

pub async fn merge(ctx: &DemoContext) -> Result<()> {
    header("merge");
    let timing = &ctx.config.timing;
    let a = timer_periodic(Duration::ZERO, timing.tick(), &ctx.scheduler).map(|v| format!("{}A", v));
    let b = timer_periodic(timing.merge_offset(), timing.tick(), &ctx.scheduler)
        .map(|v| format!("{}B", v));
    drain_for("", a.merge(b), timing.run_for()).await;
    Ok(())
}

struct Developer {
    age: u32,
    name: &'static str,
    is_dev: bool,
}

impl fmt::Display for Developer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{ age: {}, name: '{}', isDev: {} }}",
            self.age, self.name, self.is_dev
        )
    }
}

pub async fn zip_records(_ctx: &DemoContext) -> Result<()> {
    header("zip");
    let age = of(vec![27, 25, 29]);
    let name = of(vec!["Foo", "Bar", "Beer"]);
    let is_dev = of(vec![true, true, false]);

    let developers = zip_with(zip(age, name), is_dev, |(age, name), is_dev| {
        Ok(Developer { age, name, is_dev })
    });
    drain("", developers).await;
    Ok(())
}

fn throw_unlucky_number(v: i64) -> rivulet::Result<i64> {
    if v == 4 {
        Err(RxError::operator("unlucky number"))
    } else {
        Ok(v)
    }
}

/// Synchronous failure retried twice, then replaced
pub async fn retry(_ctx: &DemoContext) -> Result<()> {
    header("retry");
    let source = range(1, 5)
        .try_map(throw_unlucky_number)
        .map(|v| v.to_string())
        .retry(2)
        .catch_error(|_| of(vec!["new observable".to_string()]));
    drain("", source).await;
    Ok(())
}

/// Async task that prints its attempt number and fails after one tick
fn failing_task(tick: Duration) -> Observable<String> {
    let times = Rc::new(Cell::new(1u32));
    from_future(move || {
        println!("{}", times.get());
        times.set(times.get() + 1);
        async move {
            tokio::time::sleep(tick).await;
            Err::<String, _>(RxError::source("error from task"))
        }
    })
}

/// A failing async task retried immediately three times, then replaced
fn retry_task_source(ctx: &DemoContext) -> Observable<String> {
    failing_task(ctx.config.timing.tick())
        .retry(3)
        .catch_error(|_| of(vec!["catchError".to_string()]))
}

pub async fn retry_task(ctx: &DemoContext) -> Result<()> {
    header("retry task");
    drain("", retry_task_source(ctx)).await;
    Ok(())
}

/// The same task retried with the configured delay and backoff
fn retry_policy_source(ctx: &DemoContext) -> Observable<String> {
    debug!(retry = ?ctx.config.retry, "retrying task with delay policy");
    failing_task(ctx.config.timing.tick())
        .retry_with(ctx.config.retry.clone(), &ctx.scheduler)
        .catch_error(|err| {
            info!(%err, "giving up on task");
            of(vec!["catchError".to_string()])
        })
}

pub async fn retry_policy(ctx: &DemoContext) -> Result<()> {
    header("retry policy");
    drain("", retry_policy_source(ctx)).await;
    Ok(())
}

/// Resubscribe on every interval tick until stopped
pub async fn retry_when(ctx: &DemoContext) -> Result<()> {
    header("retry when");
    let timing = &ctx.config.timing;
    let scheduler = ctx.scheduler.clone();
    let tick = timing.tick();

    let source = range(1, 5)
        .try_map(throw_unlucky_number)
        .map(|v| v.to_string())
        .retry_when(move |_errors| interval(tick, &scheduler))
        .catch_error(|_| of(vec!["new observable".to_string()]));
    drain_for("", source, timing.run_for()).await;
    Ok(())
}
