// ABOUTME: Outgoing email and scheduled notification jobs for Robodesk
// ABOUTME: Notifier abstraction, HTTP email client, follow-up reminders and KPI reports

pub mod email;
pub mod job;
pub mod notifier;
pub mod reminders;
pub mod reports;
mod templates;

pub use email::HttpEmailNotifier;
pub use job::JobSummary;
pub use notifier::{Attachment, Notifier, NotifierError, OutgoingEmail};
pub use reminders::ReminderScheduler;
pub use reports::{already_sent_in_period, report_window, ReportScheduler};
