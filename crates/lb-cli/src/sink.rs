use std::io::Write;

use lb_core::{DeliveryError, Reminder, ReminderSink};

/// Prints reminders to stdout as a notification-style block.
pub struct StdoutSink;

pub fn render(reminder: &Reminder) -> String {
    format!(
        "{}: {}\n{}",
        reminder.title(),
        reminder.subtitle(),
        reminder.body()
    )
}

impl ReminderSink for StdoutSink {
    fn deliver(&mut self, reminder: &Reminder) -> Result<(), DeliveryError> {
        tracing::info!(
            "reminder for '{}' ({} items)",
            reminder.place.name,
            reminder.items.len()
        );
        let mut out = std::io::stdout().lock();
        writeln!(out, "{}", render(reminder))?;
        out.flush()?;
        Ok(())
    }
}
