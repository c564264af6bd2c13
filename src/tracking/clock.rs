use async_trait::async_trait;
use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

pub trait Clock {
    fn now_ms(&self) -> u64;
}

#[async_trait(?Send)]
pub trait Sleeper {
    async fn sleep(&self, duration: Duration);
}

/// Wall clock of the worker isolate.
#[derive(Debug, Default, Clone, Copy)]
pub struct WorkerClock;

impl Clock for WorkerClock {
    fn now_ms(&self) -> u64 {
        worker::Date::now().as_millis()
    }
}

/// Timer backed by the runtime's `setTimeout`.
#[derive(Debug, Default, Clone, Copy)]
pub struct WorkerSleeper;

#[async_trait(?Send)]
impl Sleeper for WorkerSleeper {
    async fn sleep(&self, duration: Duration) {
        worker::Delay::from(duration).await;
    }
}

/// Shared flag that ends a polling session. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Rc<Cell<bool>>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.get()
    }
}
