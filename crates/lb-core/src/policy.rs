use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_MIN_SESSION_SECS;
use crate::item::ItemLedger;
use crate::place::Place;

/// Error type surfaced by a reminder channel. Logged, never propagated.
pub type DeliveryError = Box<dyn std::error::Error + Send + Sync>;

/// Dwell gate for departure reminders. Short visits (GPS jitter across a
/// boundary) exit silently.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionPolicy {
    min_session_secs: u64,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            min_session_secs: DEFAULT_MIN_SESSION_SECS,
        }
    }
}

impl SessionPolicy {
    pub fn new(min_session_secs: u64) -> Self {
        Self { min_session_secs }
    }

    pub fn min_session_secs(&self) -> u64 {
        self.min_session_secs
    }

    /// Takes effect at the next departure.
    pub fn set_min_session_secs(&mut self, secs: u64) {
        self.min_session_secs = secs;
    }

    pub fn should_remind(&self, elapsed_secs: u64) -> bool {
        elapsed_secs >= self.min_session_secs
    }

    /// Build the reminder for a departure, or `None` if the visit was too short.
    pub fn evaluate(&self, place: &Place, elapsed_secs: u64, items: &ItemLedger) -> Option<Reminder> {
        if !self.should_remind(elapsed_secs) {
            tracing::debug!(
                "left '{}' after {elapsed_secs}s (< {}s), no reminder",
                place.name,
                self.min_session_secs
            );
            return None;
        }
        Some(Reminder {
            place: place.clone(),
            elapsed_secs,
            items: items.candidates_always(),
        })
    }
}

/// A departure reminder: the place just left and what to take along.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Reminder {
    pub place: Place,
    pub elapsed_secs: u64,
    pub items: Vec<String>,
}

impl Reminder {
    pub fn title(&self) -> &'static str {
        "Reminder"
    }

    pub fn subtitle(&self) -> String {
        format!("Leaving {}", self.place.name)
    }

    pub fn body(&self) -> String {
        if self.items.is_empty() {
            "Did you take everything?".to_string()
        } else {
            format!("Take with you:\n• {}", self.items.join("\n• "))
        }
    }
}

/// Where reminders go. Delivery is fire-and-forget from the tracker's view.
pub trait ReminderSink {
    fn deliver(&mut self, reminder: &Reminder) -> Result<(), DeliveryError>;
}

/// Collects reminders, e.g. for a host that drains them after each call.
impl ReminderSink for Vec<Reminder> {
    fn deliver(&mut self, reminder: &Reminder) -> Result<(), DeliveryError> {
        self.push(reminder.clone());
        Ok(())
    }
}
