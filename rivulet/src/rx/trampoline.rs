//! Loop-based resubscription for operators that chain subscriptions

use std::cell::Cell;

/// Turns "subscribe again from inside a handler" into a loop.
///
/// While [`Trampoline::run`] is inside `attempt`, a handler that wants another
/// round calls [`Trampoline::defer`] and returns; the loop then runs `attempt`
/// again once the current subscribe call has unwound. A handler firing later
/// (after `run` returned) gets `false` from `defer` and starts a fresh run.
#[derive(Default)]
pub(crate) struct Trampoline {
    subscribing: Cell<bool>,
    again: Cell<bool>,
}

impl Trampoline {
    pub(crate) fn run(&self, mut attempt: impl FnMut()) {
        loop {
            self.again.set(false);
            self.subscribing.set(true);
            attempt();
            self.subscribing.set(false);
            if !self.again.get() {
                return;
            }
        }
    }

    /// Queue another round on the running loop. `false` if no loop is running.
    pub(crate) fn defer(&self) -> bool {
        if self.subscribing.get() {
            self.again.set(true);
            true
        } else {
            false
        }
    }
}
