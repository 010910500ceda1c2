//! Polling monitor for the bot reply pipeline.
//!
//! After a message that mentions an active bot is posted, the client polls
//! the backend's debug endpoint on a fixed interval until the pipeline
//! reports `completed` or `error`, the attempt budget runs out, or the
//! caller cancels. [`PollMonitor`] is the state machine; [`PollMonitor::run`]
//! drives it against any [`DebugSource`].

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::models::{DebugInfo, DebugStep};

/// Anything that can report the pipeline state for a message.
#[async_trait]
pub trait DebugSource: Send + Sync {
    /// Failure to reach or read the source.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Current pipeline state for `message_id`.
    async fn debug_state(&self, message_id: &str) -> Result<DebugInfo, Self::Error>;
}

/// Interval and attempt budget for one polling sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    /// Delay between two polls.
    pub interval: Duration,
    /// Polls allowed before the sequence times out.
    pub max_attempts: u32,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(1_000),
            max_attempts: 60,
        }
    }
}

/// Where a polling sequence stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollState {
    /// Not started.
    Idle,
    /// Waiting for a terminal step.
    Polling {
        /// Polls made so far.
        attempts: u32,
        /// Last step reported, if any.
        step: Option<DebugStep>,
    },
    /// The bot replied.
    Completed(DebugInfo),
    /// The pipeline reported an error or the backend could not be reached.
    Failed(String),
    /// The attempt budget ran out.
    TimedOut {
        /// Polls made.
        attempts: u32,
    },
}

impl PollState {
    /// Terminal states absorb every further observation.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        matches!(
            self,
            Self::Completed(_) | Self::Failed(_) | Self::TimedOut { .. }
        )
    }
}

/// How a polling sequence ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// Final debug payload of a finished pipeline.
    Completed(DebugInfo),
    /// Error text from the pipeline or the transport.
    Failed(String),
    /// No terminal step within the budget.
    TimedOut {
        /// Polls made.
        attempts: u32,
    },
    /// The caller stopped waiting.
    Cancelled,
}

/// State machine for one message's pipeline.
#[derive(Debug, Clone)]
pub struct PollMonitor {
    settings: PollSettings,
    state: PollState,
    latest: DebugInfo,
}

impl PollMonitor {
    /// A monitor in [`PollState::Idle`].
    #[must_use]
    pub fn new(settings: PollSettings) -> Self {
        Self {
            settings,
            state: PollState::Idle,
            latest: DebugInfo::default(),
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> &PollState {
        &self.state
    }

    /// Most recent debug payload, with prompts kept across an `error` step.
    #[must_use]
    pub const fn latest(&self) -> &DebugInfo {
        &self.latest
    }

    /// Idle → Polling. Has no effect once started.
    pub fn start(&mut self) {
        if self.state == PollState::Idle {
            self.state = PollState::Polling {
                attempts: 0,
                step: None,
            };
        }
    }

    /// Feeds one poll result into the machine and returns the new state.
    pub fn observe(&mut self, info: DebugInfo) -> &PollState {
        if self.state.is_finished() {
            return &self.state;
        }
        self.start();
        let attempts = match self.state {
            PollState::Polling { attempts, .. } => attempts.saturating_add(1),
            _ => 1,
        };

        self.state = match info.step {
            Some(DebugStep::Completed) => PollState::Completed(info.clone()),
            Some(DebugStep::Error) => PollState::Failed(info.error_message()),
            step if attempts >= self.settings.max_attempts => {
                debug!(?step, attempts, "poll budget exhausted");
                PollState::TimedOut { attempts }
            }
            step => PollState::Polling { attempts, step },
        };

        if info.step == Some(DebugStep::Error) {
            self.latest.step = info.step;
            self.latest.error = Some(info.error_message());
        } else {
            self.latest = info;
        }
        &self.state
    }

    /// Records a failed poll request. Transport failures end the sequence.
    pub fn observe_failure(&mut self, reason: impl Into<String>) -> &PollState {
        if !self.state.is_finished() {
            let reason = reason.into();
            self.latest.step = Some(DebugStep::Error);
            self.latest.error = Some(reason.clone());
            self.state = PollState::Failed(reason);
        }
        &self.state
    }

    /// How the sequence ended, once it has.
    #[must_use]
    pub fn outcome(&self) -> Option<PollOutcome> {
        match &self.state {
            PollState::Completed(info) => Some(PollOutcome::Completed(info.clone())),
            PollState::Failed(reason) => Some(PollOutcome::Failed(reason.clone())),
            PollState::TimedOut { attempts } => Some(PollOutcome::TimedOut {
                attempts: *attempts,
            }),
            PollState::Idle | PollState::Polling { .. } => None,
        }
    }

    /// Polls `source` every interval until the sequence finishes or `cancel`
    /// fires. `on_update` runs after every poll.
    pub async fn run<S, F>(
        &mut self,
        source: &S,
        message_id: &str,
        cancel: &CancellationToken,
        mut on_update: F,
    ) -> PollOutcome
    where
        S: DebugSource + ?Sized,
        F: FnMut(&PollState, &DebugInfo) + Send,
    {
        self.start();
        let period = self.settings.interval;
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(message_id, ?period, max_attempts = self.settings.max_attempts, "polling bot pipeline");

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    info!(message_id, "polling cancelled");
                    return PollOutcome::Cancelled;
                }
                _ = ticker.tick() => {}
            }

            let result = tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    info!(message_id, "polling cancelled");
                    return PollOutcome::Cancelled;
                }
                result = source.debug_state(message_id) => result,
            };

            match result {
                Ok(info) => {
                    debug!(message_id, step = ?info.step, "debug state received");
                    self.observe(info);
                }
                Err(err) => {
                    warn!(message_id, error = %err, "debug state request failed");
                    self.observe_failure(format!("Failed to get debug information: {err}"));
                }
            }
            on_update(&self.state, &self.latest);

            if let Some(outcome) = self.outcome() {
                info!(message_id, ?outcome, "polling finished");
                return outcome;
            }
        }
    }
}
