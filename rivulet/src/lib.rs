//! # Rivulet
//!
//! Single-threaded, push-based reactive streams.
//!
//! ## Features
//!
//! - **Cold Observables**: every subscription re-runs the producer
//! - **Operators**: `map`, `take`, `concat`, `merge`, `zip`, `retry`, `retry_when`, `catch_error`
//! - **Schedulers**: a virtual clock for tests and a Tokio-backed one for real time
//! - **Async bridge**: turn futures and streams into Observables and back
//!
//! ## Quick Start
//!
//! ```rust
//! use rivulet::rx::{of, range};
//!
//! range(1, 3)
//!     .map(|v| v * 10)
//!     .concat(of(vec![99]))
//!     .subscribe_next(|v| println!("{}", v)); // 10 20 30 99
//! ```

pub mod config;
pub mod error;
pub mod rx;

pub use config::RetryConfig;
pub use error::{ErrorKind, Result, RxError};
pub use rx::{Observable, Observer, Scheduler, Subscription};
