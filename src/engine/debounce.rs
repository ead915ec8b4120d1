// src/engine/debounce.rs

//! Per-action debouncing.
//!
//! After the first event of a burst, a deadline `delay` in the future is
//! armed; every further event pushes it back by `delay`. The burst settles
//! when the deadline passes with no new event, and only the latest event is
//! kept. No timer exists while the action is idle.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;

use crate::watch::Event;

#[derive(Debug, Clone, Copy)]
pub struct Debouncer {
    delay: Duration,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// Absorb the rest of the burst that started with `first`.
    ///
    /// Returns the last event of the burst, or `None` if `cancel` fired
    /// first. With a zero delay the first event is returned immediately.
    pub async fn settle(
        &self,
        first: Event,
        events: &mut mpsc::Receiver<Event>,
        cancel: &CancellationToken,
    ) -> Option<Event> {
        if self.delay.is_zero() {
            return Some(first);
        }

        let mut latest = first;
        let deadline = sleep(self.delay);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return None,
                next = events.recv() => match next {
                    Some(event) => {
                        latest = event;
                        deadline.as_mut().reset(Instant::now() + self.delay);
                    }
                    None => return Some(latest),
                },
                _ = &mut deadline => return Some(latest),
            }
        }
    }
}
