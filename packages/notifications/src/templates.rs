// ABOUTME: Fixed HTML layouts for reminder digests and KPI reports
// ABOUTME: Every interpolated value passes through escape_html

use chrono::{DateTime, NaiveDate, Utc};

use robodesk_core::{escape_html, Frequency};
use robodesk_storage::{DueLead, PeriodAggregates};

const TABLE_STYLE: &str = "border-collapse:collapse;width:100%;margin-bottom:24px";
const CELL_STYLE: &str = "border:1px solid #d0d7de;padding:6px 8px;text-align:left";

pub(crate) struct Rendered {
    pub subject: String,
    pub html: String,
}

pub(crate) fn reminder_digest(
    salesperson_name: &str,
    today: NaiveDate,
    overdue: &[&DueLead],
    due_soon: &[&DueLead],
) -> Rendered {
    let subject = format!(
        "Follow-up reminder: {} overdue, {} due soon",
        overdue.len(),
        due_soon.len()
    );

    let mut html = String::new();
    html.push_str("<html><body style=\"font-family:Arial,sans-serif;color:#1f2328\">");
    html.push_str(&format!("<p>Hello {},</p>", escape_html(salesperson_name)));
    html.push_str(&format!(
        "<p>These leads need your attention as of {}.</p>",
        today.format("%Y-%m-%d")
    ));

    if !overdue.is_empty() {
        html.push_str("<h2 style=\"color:#cf222e\">Overdue</h2>");
        push_lead_table(&mut html, overdue);
    }
    if !due_soon.is_empty() {
        html.push_str("<h2>Due soon</h2>");
        push_lead_table(&mut html, due_soon);
    }

    html.push_str("</body></html>");
    Rendered { subject, html }
}

fn push_lead_table(html: &mut String, leads: &[&DueLead]) {
    html.push_str(&format!("<table style=\"{}\"><thead><tr>", TABLE_STYLE));
    for heading in ["Offer", "Title", "Client", "Status", "Next action", "Notes"] {
        html.push_str(&format!("<th style=\"{}\">{}</th>", CELL_STYLE, heading));
    }
    html.push_str("</tr></thead><tbody>");

    for lead in leads {
        let offer = &lead.offer;
        let client = match (&lead.client_name, &lead.client_contact) {
            (Some(name), Some(contact)) => format!("{} ({})", name, contact),
            (Some(name), None) => name.clone(),
            (None, _) => "-".to_string(),
        };
        let status = offer.lead_status.map(|s| s.label()).unwrap_or("-");
        let next_action = offer
            .next_action_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default();

        html.push_str("<tr>");
        for value in [
            offer.offer_number.as_str(),
            offer.title.as_str(),
            client.as_str(),
            status,
            next_action.as_str(),
            offer.follow_up_notes.as_deref().unwrap_or(""),
        ] {
            html.push_str(&format!("<td style=\"{}\">{}</td>", CELL_STYLE, escape_html(value)));
        }
        html.push_str("</tr>");
    }

    html.push_str("</tbody></table>");
}

pub(crate) struct ReportContext<'a> {
    pub report_type: &'a str,
    pub recipient_name: &'a str,
    pub frequency: Frequency,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub currency: &'a str,
}

pub(crate) fn report_summary(ctx: &ReportContext<'_>, aggregates: &PeriodAggregates) -> Rendered {
    let cadence = match ctx.frequency {
        Frequency::Weekly => "Weekly",
        Frequency::Monthly => "Monthly",
    };
    let start = ctx.window_start.format("%Y-%m-%d").to_string();
    let end = ctx.window_end.format("%Y-%m-%d").to_string();

    let subject = format!("{} sales report {} to {}", cadence, start, end);

    let rows = [
        (
            "Revenue (closed won)",
            format!("{} {}", format_amount(aggregates.revenue), ctx.currency),
        ),
        ("Deals won", aggregates.won_deals.to_string()),
        ("Offers created", aggregates.offers_created.to_string()),
        ("New clients", aggregates.new_clients.to_string()),
        ("Active contracts", aggregates.active_contracts.to_string()),
    ];

    let mut html = String::new();
    html.push_str("<html><body style=\"font-family:Arial,sans-serif;color:#1f2328\">");
    html.push_str(&format!(
        "<h1>{} {}</h1>",
        cadence,
        escape_html(&ctx.report_type.replace('_', " "))
    ));
    html.push_str(&format!("<p>Hello {},</p>", escape_html(ctx.recipient_name)));
    html.push_str(&format!(
        "<p>Figures for {} to {}.</p>",
        escape_html(&start),
        escape_html(&end)
    ));
    html.push_str(&format!("<table style=\"{}\"><tbody>", TABLE_STYLE));
    for (label, value) in rows {
        html.push_str(&format!(
            "<tr><th style=\"{}\">{}</th><td style=\"{}\">{}</td></tr>",
            CELL_STYLE,
            label,
            CELL_STYLE,
            escape_html(&value)
        ));
    }
    html.push_str("</tbody></table></body></html>");

    Rendered { subject, html }
}

/// Two decimals with thousands separators, e.g. `12,500.00`
pub(crate) fn format_amount(value: f64) -> String {
    let formatted = format!("{:.2}", value.abs());
    let (whole, fraction) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));

    let mut grouped = String::new();
    for (i, c) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let sign = if value < 0.0 { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, fraction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use robodesk_core::{LeadStatus, Offer, Stage};

    fn lead(number: &str, title: &str, date: NaiveDate) -> DueLead {
        DueLead {
            offer: Offer {
                id: format!("off-{}", number),
                offer_number: number.to_string(),
                title: title.to_string(),
                stage: Stage::Leads,
                lead_status: Some(LeadStatus::FollowUp),
                next_action_date: Some(date),
                total_price: 0.0,
                currency: "EUR".to_string(),
                salesperson_id: "usr-1".to_string(),
                client_id: "cli-1".to_string(),
                follow_up_notes: Some("Call back <after> lunch".to_string()),
                created_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
                updated_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            },
            client_name: Some("Smith & Sons".to_string()),
            client_contact: None,
        }
    }

    #[test]
    fn test_reminder_digest_escapes_and_orders_sections() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let late = lead("OF-1", "<script>alert(1)</script>", today.pred_opt().unwrap());
        let soon = lead("OF-2", "Welding cell", today);

        let rendered = reminder_digest("O'Brien", today, &[&late], &[&soon]);

        assert_eq!(rendered.subject, "Follow-up reminder: 1 overdue, 1 due soon");
        assert!(rendered.html.contains("Hello O&#39;Brien"));
        assert!(rendered.html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(!rendered.html.contains("<script>"));
        assert!(rendered.html.contains("Smith &amp; Sons"));
        assert!(rendered.html.contains("Call back &lt;after&gt; lunch"));

        let overdue_at = rendered.html.find("Overdue").unwrap();
        let due_soon_at = rendered.html.find("Due soon").unwrap();
        assert!(overdue_at < due_soon_at);
    }

    #[test]
    fn test_reminder_digest_omits_empty_section() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let soon = lead("OF-2", "Welding cell", today);
        let rendered = reminder_digest("Anna", today, &[], &[&soon]);
        assert!(!rendered.html.contains("Overdue"));
    }

    #[test]
    fn test_report_summary_contains_aggregates() {
        let ctx = ReportContext {
            report_type: "sales_summary",
            recipient_name: "Board <team>",
            frequency: Frequency::Monthly,
            window_start: Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap(),
            window_end: Utc.with_ymd_and_hms(2025, 3, 17, 8, 0, 0).unwrap(),
            currency: "EUR",
        };
        let aggregates = PeriodAggregates {
            revenue: 1_234_567.5,
            won_deals: 3,
            offers_created: 11,
            new_clients: 2,
            active_contracts: 4,
        };

        let rendered = report_summary(&ctx, &aggregates);
        assert_eq!(rendered.subject, "Monthly sales report 2025-03-01 to 2025-03-17");
        assert!(rendered.html.contains("1,234,567.50 EUR"));
        assert!(rendered.html.contains("Board &lt;team&gt;"));
        assert!(rendered.html.contains("sales summary"));
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(0.0), "0.00");
        assert_eq!(format_amount(999.994), "999.99");
        assert_eq!(format_amount(12_500.0), "12,500.00");
        assert_eq!(format_amount(-1_000.0), "-1,000.00");
    }
}
