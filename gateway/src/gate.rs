use std::sync::{Condvar, Mutex};
use std::time::Duration;

/// Set-once completion signal bridging the asynchronous logout ack to the
/// synchronous shutdown path. Created unset, set exactly once per session
/// lifecycle, never reset.
#[derive(Debug, Default)]
pub struct ShutdownGate {
    signaled: Mutex<bool>,
    waiters: Condvar,
}

impl ShutdownGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Idempotent: wakes all current waiters, and any later waiter observes
    /// the signal immediately.
    pub fn set(&self) {
        let mut signaled = match self.signaled.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if !*signaled {
            *signaled = true;
            self.waiters.notify_all();
        }
    }

    /// Blocks until `set` has been called or `timeout` elapses.
    /// Returns `true` if the gate was signaled.
    pub fn wait(&self, timeout: Duration) -> bool {
        let signaled = match self.signaled.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let (signaled, _) = self
            .waiters
            .wait_timeout_while(signaled, timeout, |signaled| !*signaled)
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *signaled
    }

    pub fn is_set(&self) -> bool {
        match self.signaled.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}
