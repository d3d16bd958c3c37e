use crate::notify::ReminderSummary;

/// "$20/month", trimming a pointless ".00".
pub fn format_cost(summary: &ReminderSummary) -> String {
    format!("{}/{}", format_amount(summary.cost), summary.billing_period.unit())
}

pub fn format_amount(cost: f64) -> String {
    if cost.fract() == 0.0 {
        format!("${:.0}", cost)
    } else {
        format!("${:.2}", cost)
    }
}

/// "October 18, 2026"
pub fn format_long_date(date: &chrono::NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}

fn day_word(days: i64) -> &'static str {
    if days == 1 {
        "day"
    } else {
        "days"
    }
}

pub fn email_subject(summary: &ReminderSummary) -> String {
    format!(
        "⏰ Reminder: {} renewal in {} {}",
        summary.name,
        summary.days_until_renewal,
        day_word(summary.days_until_renewal)
    )
}

pub fn email_html(summary: &ReminderSummary) -> String {
    let name = escape_html(&summary.name);
    let website = summary
        .website
        .as_deref()
        .map(|url| {
            format!(
                r#"<p><a href="{}" style="color: #0066cc;">Visit {} website →</a></p>"#,
                escape_html(url),
                name
            )
        })
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html>
  <head><meta charset="utf-8"><title>Subscription Renewal Reminder</title></head>
  <body style="font-family: -apple-system, 'Segoe UI', Roboto, Arial, sans-serif; line-height: 1.6; color: #333; max-width: 600px; margin: 0 auto; padding: 20px;">
    <h1 style="font-size: 22px;">🔔 Subscription Renewal Reminder</h1>
    <h2 style="color: #667eea;">{name}</h2>
    <div style="padding: 16px; border-left: 4px solid #667eea; background: #f9f9f9;">
      <p><strong>Renewal Date:</strong> {date}</p>
      <p><strong>Days Until Renewal:</strong> {days} {unit}</p>
      <p><strong>Cost:</strong> {cost}</p>
    </div>
    {website}
    <p style="color: #666; font-size: 13px;">This is an automated reminder from subtrack.</p>
  </body>
</html>"#,
        name = name,
        date = format_long_date(&summary.renewal_date),
        days = summary.days_until_renewal,
        unit = day_word(summary.days_until_renewal),
        cost = format_cost(summary),
        website = website,
    )
}

/// Legacy Telegram Markdown body.
pub fn telegram_markdown(summary: &ReminderSummary) -> String {
    let mut message = format!(
        "🔔 *Renewal Reminder*\n\n\
        *{}*\n\
        📅 Renews: {}\n\
        ⏳ In {} {}\n\
        💰 Cost: {}",
        escape_markdown(&summary.name),
        format_long_date(&summary.renewal_date),
        summary.days_until_renewal,
        day_word(summary.days_until_renewal),
        escape_markdown(&format_cost(summary)),
    );
    if let Some(url) = &summary.website {
        message.push_str(&format!("\n🔗 {}", escape_markdown(url)));
    }
    message
}

fn escape_html(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn escape_markdown(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '_' | '*' | '`' | '[') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::models::BillingPeriod;
    use chrono::NaiveDate;

    fn summary(cost: f64, period: BillingPeriod, website: Option<&str>) -> ReminderSummary {
        ReminderSummary {
            name: "ChatGPT Plus".to_string(),
            cost,
            billing_period: period,
            renewal_date: NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
            website: website.map(str::to_string),
            days_until_renewal: 3,
        }
    }

    #[test]
    fn cost_uses_period_unit() {
        assert_eq!(format_cost(&summary(20.0, BillingPeriod::Monthly, None)), "$20/month");
        assert_eq!(format_cost(&summary(99.5, BillingPeriod::Yearly, None)), "$99.50/year");
    }

    #[test]
    fn subject_names_subscription_and_days() {
        let s = summary(20.0, BillingPeriod::Monthly, None);
        assert_eq!(email_subject(&s), "⏰ Reminder: ChatGPT Plus renewal in 3 days");

        let mut tomorrow = s.clone();
        tomorrow.days_until_renewal = 1;
        assert!(email_subject(&tomorrow).ends_with("in 1 day"));
    }

    #[test]
    fn html_includes_all_fields() {
        let html = email_html(&summary(20.0, BillingPeriod::Monthly, Some("https://openai.com")));
        assert!(html.contains("ChatGPT Plus"));
        assert!(html.contains("February 1, 2026"));
        assert!(html.contains("3 days"));
        assert!(html.contains("$20/month"));
        assert!(html.contains(r#"href="https://openai.com""#));
    }

    #[test]
    fn html_omits_link_without_website() {
        let html = email_html(&summary(20.0, BillingPeriod::Monthly, None));
        assert!(!html.contains("href="));
    }

    #[test]
    fn html_escapes_names() {
        let mut s = summary(1.0, BillingPeriod::Monthly, None);
        s.name = "<script>".to_string();
        assert!(email_html(&s).contains("&lt;script&gt;"));
    }

    #[test]
    fn markdown_escapes_special_characters() {
        let mut s = summary(5.0, BillingPeriod::Monthly, Some("https://x.io/a_b"));
        s.name = "my_app*pro".to_string();
        let text = telegram_markdown(&s);
        assert!(text.contains("my\\_app\\*pro"));
        assert!(text.contains("a\\_b"));
        assert!(text.contains("$5/month"));
    }
}
