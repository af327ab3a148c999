//! Recurring countdown to the event start.
//!
//! Before the target instant the countdown shows the time remaining. For 24
//! hours after it the event is "today". Past that window the target moves to
//! the same calendar date one year later, and so on for every following year.

use chrono::{DateTime, Duration, Months, Utc};
use serde::Serialize;
use std::time::Duration as StdDuration;
use tokio::{sync::watch, task::JoinHandle, time::MissedTickBehavior};

/// How long after the start instant the event counts as "today"
#[must_use]
pub fn event_day() -> Duration {
    Duration::hours(24)
}

/// Time left until the target, split for display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Remaining {
    /// Whole days
    pub days: i64,
    /// Hours after whole days
    pub hours: i64,
    /// Minutes after whole hours
    pub minutes: i64,
    /// Seconds after whole minutes
    pub seconds: i64,
    /// Total remaining seconds
    pub total_seconds: i64,
}

impl Remaining {
    /// Splits a positive duration into days/hours/minutes/seconds
    #[must_use]
    pub fn from_duration(duration: Duration) -> Self {
        let total_seconds = duration.num_seconds();
        Self {
            days: total_seconds / 86_400,
            hours: (total_seconds % 86_400) / 3_600,
            minutes: (total_seconds % 3_600) / 60,
            seconds: total_seconds % 60,
            total_seconds,
        }
    }
}

/// What the countdown shows at a given instant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CountdownState {
    /// The configured event is still ahead
    CountingDown {
        /// Instant being counted down to
        target: DateTime<Utc>,
        /// Time left
        remaining: Remaining,
    },
    /// Within 24 hours after the start instant
    EventDay {
        /// Start instant of the event taking place
        target: DateTime<Utc>,
    },
    /// The configured event is over; counting down to its next anniversary
    CountingDownToNextYear {
        /// Same calendar date and time, one or more years after the configured one
        target: DateTime<Utc>,
        /// Time left
        remaining: Remaining,
    },
}

impl CountdownState {
    /// Instant the state refers to
    #[must_use]
    pub const fn target(&self) -> DateTime<Utc> {
        match self {
            Self::CountingDown { target, .. }
            | Self::EventDay { target }
            | Self::CountingDownToNextYear { target, .. } => *target,
        }
    }
}

/// Same calendar date and time one year later; Feb 29 becomes Feb 28.
#[must_use]
pub fn one_year_after(instant: DateTime<Utc>) -> DateTime<Utc> {
    instant
        .checked_add_months(Months::new(12))
        .unwrap_or(instant + Duration::days(365))
}

/// Classifies `now` against a configured event start `target`.
#[must_use]
pub fn evaluate(target: DateTime<Utc>, now: DateTime<Utc>) -> CountdownState {
    let mut current = target;
    loop {
        let remaining = current - now;
        if remaining > Duration::zero() {
            let remaining = Remaining::from_duration(remaining);
            return if current == target {
                CountdownState::CountingDown {
                    target: current,
                    remaining,
                }
            } else {
                CountdownState::CountingDownToNextYear {
                    target: current,
                    remaining,
                }
            };
        }
        if now - current <= event_day() {
            return CountdownState::EventDay { target: current };
        }
        current = one_year_after(current);
    }
}

/// Re-evaluates the countdown every second on a background task.
///
/// This is for in-process consumers that render a live countdown, such as an
/// embedding front end. The HTTP route does not use it; it calls [`evaluate`]
/// once per request. The task is aborted when the ticker is dropped, so a
/// ticker owned by a view or connection stops with it.
#[derive(Debug)]
pub struct CountdownTicker {
    receiver: watch::Receiver<CountdownState>,
    handle: JoinHandle<()>,
}

impl CountdownTicker {
    /// Starts ticking towards `target`. Must be called inside a tokio runtime.
    #[must_use]
    pub fn start(target: DateTime<Utc>) -> Self {
        let (sender, receiver) = watch::channel(evaluate(target, Utc::now()));
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(StdDuration::from_secs(1));
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                if sender.send(evaluate(target, Utc::now())).is_err() {
                    break;
                }
            }
        });
        Self { receiver, handle }
    }

    /// Latest evaluated state
    #[must_use]
    pub fn current(&self) -> CountdownState {
        *self.receiver.borrow()
    }

    /// A receiver notified on every tick
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CountdownState> {
        self.receiver.clone()
    }
}

impl Drop for CountdownTicker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
