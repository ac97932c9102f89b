// ABOUTME: Daily follow-up reminder sweep over open leads
// ABOUTME: Sends one overdue/due-soon digest per salesperson

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use futures::future::join_all;
use sqlx::SqlitePool;
use tracing::{debug, error, info, warn};

use robodesk_core::{ServiceError, ServiceResult, REMINDER_LOOKAHEAD_DAYS};
use robodesk_storage::{DueLead, ProfileStorage, ReportingStorage};

use crate::job::JobSummary;
use crate::notifier::{Notifier, OutgoingEmail};
use crate::templates::reminder_digest;

/// Follow-up reminder job
///
/// A lead is due when it sits in `leads`, is not closed, and its next
/// action date is no later than today plus the look-ahead window. Dates
/// before today are overdue; the rest are due soon.
pub struct ReminderScheduler {
    reporting: ReportingStorage,
    profiles: ProfileStorage,
    notifier: Arc<dyn Notifier>,
    sender: String,
    lookahead_days: i64,
}

impl ReminderScheduler {
    pub fn new(pool: SqlitePool, notifier: Arc<dyn Notifier>, sender: impl Into<String>) -> Self {
        Self {
            reporting: ReportingStorage::new(pool.clone()),
            profiles: ProfileStorage::new(pool),
            notifier,
            sender: sender.into(),
            lookahead_days: REMINDER_LOOKAHEAD_DAYS,
        }
    }

    pub fn with_lookahead_days(mut self, days: i64) -> Self {
        self.lookahead_days = days.max(0);
        self
    }

    pub async fn run(&self) -> ServiceResult<JobSummary> {
        self.run_at(Utc::now()).await
    }

    /// Run the sweep as of `now` (UTC calendar date)
    pub async fn run_at(&self, now: DateTime<Utc>) -> ServiceResult<JobSummary> {
        let today = now.date_naive();
        let until = today + Duration::days(self.lookahead_days);

        let leads = self.reporting.due_leads(until).await?;
        debug!("Found {} due leads up to {}", leads.len(), until);

        let mut by_salesperson: BTreeMap<&str, Vec<&DueLead>> = BTreeMap::new();
        for lead in &leads {
            by_salesperson
                .entry(lead.offer.salesperson_id.as_str())
                .or_default()
                .push(lead);
        }

        let mut emails = Vec::new();
        for (salesperson_id, owned) in by_salesperson {
            let (overdue, due_soon): (Vec<&DueLead>, Vec<&DueLead>) = owned
                .into_iter()
                .partition(|lead| lead.offer.next_action_date.is_some_and(|d| d < today));

            let Some(profile) = self.profiles.get_profile(salesperson_id).await? else {
                warn!(
                    "Skipping reminders for salesperson {}: profile not found",
                    salesperson_id
                );
                continue;
            };

            let rendered = reminder_digest(&profile.full_name, today, &overdue, &due_soon);
            emails.push(OutgoingEmail {
                from: self.sender.clone(),
                to: profile.email,
                subject: rendered.subject,
                html: rendered.html,
                attachments: Vec::new(),
            });
        }

        let results = join_all(emails.iter().map(|email| self.notifier.send(email))).await;

        let mut sent = 0;
        let mut first_error = None;
        for (email, result) in emails.iter().zip(results) {
            match result {
                Ok(()) => sent += 1,
                Err(e) => {
                    error!("Failed to send reminder to {}: {}", email.to, e);
                    first_error.get_or_insert(e);
                }
            }
        }

        if let Some(err) = first_error {
            return Err(ServiceError::from(err));
        }

        info!("Sent {} follow-up reminder digests", sent);
        Ok(JobSummary::new(format!("Sent {} reminder emails", sent), sent))
    }
}
