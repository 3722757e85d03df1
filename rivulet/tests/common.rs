//! Common test utilities

use rivulet::rx::Observer;
use std::cell::RefCell;
use std::fmt::Display;
use std::rc::Rc;

/// Install a tracing subscriber honouring `RUST_LOG` (once per test binary)
#[allow(dead_code)] // Used by other test modules
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Shared log of rendered notifications
#[derive(Clone, Default)]
pub struct Log {
    lines: Rc<RefCell<Vec<String>>>,
}

#[allow(dead_code)] // Used by other test modules
impl Log {
    pub fn new() -> Self {
        Self::default()
    }

    /// Observer that records `"<label><value>"`, `"error: <message>"` and `"complete"`
    pub fn observer<T: Display + 'static>(&self, label: &str) -> Observer<T> {
        let (next, error, complete) = (self.clone(), self.clone(), self.clone());
        let label = label.to_string();
        Observer::new()
            .on_next(move |value| next.push(format!("{}{}", label, value)))
            .on_error(move |err: rivulet::RxError| error.push(format!("error: {}", err.message())))
            .on_complete(move || complete.push("complete"))
    }

    pub fn push(&self, line: impl Into<String>) {
        self.lines.borrow_mut().push(line.into());
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.borrow().clone()
    }
}
