// ABOUTME: Recurring KPI report delivery to report subscriptions
// ABOUTME: One summary per enabled subscription, deduplicated per cadence period

use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};
use futures::future::join_all;
use sqlx::SqlitePool;
use tracing::{error, info};

use robodesk_core::{Frequency, ReportSubscription, ServiceError, ServiceResult};
use robodesk_storage::{ReportingStorage, SubscriptionStorage};

use crate::job::JobSummary;
use crate::notifier::{Notifier, OutgoingEmail};
use crate::templates::{report_summary, ReportContext};

/// Aggregation window ending at `now`
///
/// Weekly reports cover the trailing seven days; monthly reports cover the
/// current calendar month from the 1st at 00:00 UTC.
pub fn report_window(frequency: Frequency, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    match frequency {
        Frequency::Weekly => (now - Duration::days(7), now),
        Frequency::Monthly => {
            let start = Utc
                .with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0)
                .single()
                .unwrap_or(now);
            (start, now)
        }
    }
}

/// Whether a subscription was already served in the cadence period containing `now`
pub fn already_sent_in_period(
    last_sent_at: Option<DateTime<Utc>>,
    frequency: Frequency,
    now: DateTime<Utc>,
) -> bool {
    let Some(last) = last_sent_at else {
        return false;
    };
    match frequency {
        Frequency::Weekly => last.iso_week() == now.iso_week(),
        Frequency::Monthly => last.year() == now.year() && last.month() == now.month(),
    }
}

pub struct ReportScheduler {
    subscriptions: SubscriptionStorage,
    reporting: ReportingStorage,
    notifier: Arc<dyn Notifier>,
    sender: String,
    currency: String,
}

impl ReportScheduler {
    pub fn new(
        pool: SqlitePool,
        notifier: Arc<dyn Notifier>,
        sender: impl Into<String>,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            subscriptions: SubscriptionStorage::new(pool.clone()),
            reporting: ReportingStorage::new(pool),
            notifier,
            sender: sender.into(),
            currency: currency.into(),
        }
    }

    /// Run for a raw cadence name (`weekly` or `monthly`)
    pub async fn run_str(&self, frequency: &str, force: bool) -> ServiceResult<JobSummary> {
        let frequency: Frequency = frequency.parse()?;
        self.run(frequency, force).await
    }

    pub async fn run(&self, frequency: Frequency, force: bool) -> ServiceResult<JobSummary> {
        self.run_at(frequency, force, Utc::now()).await
    }

    /// Send reports for one cadence as of `now`
    ///
    /// A failed send leaves that subscription's `last_sent_at` untouched and
    /// does not stop the others. The run only fails when every attempted
    /// send failed.
    pub async fn run_at(
        &self,
        frequency: Frequency,
        force: bool,
        now: DateTime<Utc>,
    ) -> ServiceResult<JobSummary> {
        let subscriptions = self.subscriptions.list_enabled(frequency).await?;

        let (due, skipped): (Vec<ReportSubscription>, Vec<ReportSubscription>) =
            subscriptions.into_iter().partition(|s| {
                force || !already_sent_in_period(s.last_sent_at, frequency, now)
            });
        for subscription in &skipped {
            info!(
                "Skipping {} report for {}: already sent this period",
                frequency, subscription.recipient_email
            );
        }

        if due.is_empty() {
            return Ok(JobSummary::new(
                format!(
                    "No {} reports to send ({} already sent)",
                    frequency,
                    skipped.len()
                ),
                0,
            ));
        }

        let (window_start, window_end) = report_window(frequency, now);
        let aggregates = self
            .reporting
            .period_aggregates(window_start, window_end)
            .await?;

        let emails: Vec<OutgoingEmail> = due
            .iter()
            .map(|subscription| {
                let recipient_name = subscription
                    .recipient_name
                    .as_deref()
                    .filter(|n| !n.trim().is_empty())
                    .unwrap_or(subscription.recipient_email.as_str());
                let rendered = report_summary(
                    &ReportContext {
                        report_type: &subscription.report_type,
                        recipient_name,
                        frequency,
                        window_start,
                        window_end,
                        currency: &self.currency,
                    },
                    &aggregates,
                );
                OutgoingEmail {
                    from: self.sender.clone(),
                    to: subscription.recipient_email.clone(),
                    subject: rendered.subject,
                    html: rendered.html,
                    attachments: Vec::new(),
                }
            })
            .collect();

        let results = join_all(emails.iter().map(|email| self.notifier.send(email))).await;

        let mut sent = 0;
        let mut failed = 0;
        let mut first_error: Option<ServiceError> = None;
        for (subscription, result) in due.iter().zip(results) {
            if let Err(e) = result {
                error!(
                    "Failed to send {} report to {}: {}",
                    frequency, subscription.recipient_email, e
                );
                failed += 1;
                first_error.get_or_insert(e.into());
                continue;
            }

            if let Err(e) = self.subscriptions.mark_sent(&subscription.id, now).await {
                error!(
                    "Report sent to {} but last_sent_at was not recorded: {}",
                    subscription.recipient_email, e
                );
            }
            sent += 1;
        }

        if sent == 0 {
            if let Some(err) = first_error {
                return Err(err);
            }
        }

        info!(
            "Sent {} {} reports ({} failed, {} skipped)",
            sent,
            frequency,
            failed,
            skipped.len()
        );
        Ok(JobSummary::new(
            format!(
                "Sent {} {} reports ({} failed, {} skipped)",
                sent,
                frequency,
                failed,
                skipped.len()
            ),
            sent,
        ))
    }
}
