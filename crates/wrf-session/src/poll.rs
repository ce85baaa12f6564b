//! Periodic polling for cloud messages.
//!
//! The module only forwards a waiting cloud message when asked, so an
//! application polls on an interval. A poll stays in flight until it is
//! answered (`EMPTY`, a message, or a non-busy error); an unanswered poll is
//! given up after three intervals so polling resumes.
//!
//! The scheduler holds no clock. The caller passes a monotonic `now`.

use std::time::Duration;

use tracing::{debug, trace};
use wrf_protocol::Response;

use crate::config::PollConfig;

/// Intervals an unanswered poll is kept before it is abandoned.
const POLL_TIMEOUT_INTERVALS: u32 = 3;

#[derive(Debug, Clone)]
pub struct PollScheduler {
    interval: Duration,
    running: bool,
    awaiting: bool,
    last_poll: Duration,
}

impl PollScheduler {
    pub fn new(config: &PollConfig) -> Self {
        PollScheduler {
            interval: Duration::from_millis(config.interval_ms),
            running: false,
            awaiting: false,
            last_poll: Duration::ZERO,
        }
    }

    /// Start polling. The first poll is due one interval after `now`.
    pub fn start(&mut self, now: Duration) {
        self.running = true;
        self.awaiting = false;
        self.last_poll = now;
    }

    pub fn stop(&mut self) {
        self.running = false;
        self.awaiting = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Whether a poll has been sent and not answered.
    pub fn is_awaiting(&self) -> bool {
        self.awaiting
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Returns `true` when a poll should be sent now.
    pub fn tick(&mut self, now: Duration) -> bool {
        if !self.running {
            return false;
        }

        let elapsed = now.saturating_sub(self.last_poll);
        if !self.awaiting && elapsed > self.interval {
            trace!("PollScheduler: poll due");
            self.last_poll = now;
            self.awaiting = true;
            return true;
        }
        if self.awaiting && elapsed > self.interval * POLL_TIMEOUT_INTERVALS {
            debug!("PollScheduler: poll unanswered, giving up");
            self.awaiting = false;
        }
        false
    }

    /// Feed every decoded response so an answered poll is released.
    pub fn observe(&mut self, response: &Response) {
        match response {
            Response::Empty | Response::Message(_) => self.awaiting = false,
            Response::LocalError(_) | Response::RemoteError(_) if !response.is_busy() => {
                self.awaiting = false
            }
            _ => {}
        }
    }
}
