//! Plain-text projections of backend records.
//!
//! Shared by chat notices and the headless subcommands, so nothing here emits ANSI styling.

use mail_backend::{Category, EmailRecord, Evidence};
use time::macros::format_description;
use time::PrimitiveDateTime;

const LISTING_SUMMARY_CHARS: usize = 60;

/// Formats a backend timestamp as `YYYY. MM. DD. HH:MM`.
///
/// Fractional seconds and UTC offsets are ignored. Unparseable input is returned unchanged.
pub fn format_timestamp(raw: &str) -> String {
    let normalized = raw.trim().replacen(' ', "T", 1);
    let Some(head) = normalized.get(..19) else {
        return raw.to_string();
    };

    let input = format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");
    let output = format_description!("[year]. [month]. [day]. [hour]:[minute]");
    PrimitiveDateTime::parse(head, input)
        .ok()
        .and_then(|parsed| parsed.format(output).ok())
        .unwrap_or_else(|| raw.to_string())
}

pub fn category_lines(categories: &[Category]) -> Vec<String> {
    if categories.is_empty() {
        return vec!["등록된 카테고리가 없습니다.".to_string()];
    }

    categories
        .iter()
        .map(|category| match category.description.as_deref() {
            Some(description) if !description.trim().is_empty() => {
                format!("- {}: {}", category.name, description.trim())
            }
            _ => format!("- {}", category.name),
        })
        .collect()
}

/// One line per email: id, category, subject, sender, date and a shortened summary.
pub fn email_list_lines(emails: &[EmailRecord]) -> Vec<String> {
    if emails.is_empty() {
        return vec!["저장된 메일이 없습니다.".to_string()];
    }

    emails
        .iter()
        .map(|email| {
            format!(
                "#{} [{}] {} · {} · {} · {}",
                email.id,
                email.category,
                email.subject_label(),
                email.sender_label(),
                format_timestamp(&email.created_at),
                shorten(&email.summary, LISTING_SUMMARY_CHARS)
            )
        })
        .collect()
}

pub fn email_detail_lines(email: &EmailRecord) -> Vec<String> {
    let mut lines = vec![
        format!("#{} {}", email.id, email.subject_label()),
        format!("보낸 사람: {}", email.sender_label()),
        format!("카테고리: {}", email.category),
        format!("받은 시각: {}", format_timestamp(&email.created_at)),
        format!("요약: {}", email.summary),
        String::new(),
    ];
    lines.extend(email.body.lines().map(str::to_string));
    lines
}

/// Citation heading for one evidence entry: `#id sender · subject`.
pub fn evidence_heading(evidence: &Evidence) -> String {
    format!(
        "#{} {} · {}",
        evidence.email_id,
        evidence.sender_label(),
        evidence.subject_label()
    )
}

fn shorten(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut shortened: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    shortened.push('…');
    shortened
}

#[cfg(test)]
mod tests {
    use super::*;
    use mail_backend::{NO_SENDER_PLACEHOLDER, NO_SUBJECT_PLACEHOLDER};
    use pretty_assertions::assert_eq;

    fn record() -> EmailRecord {
        EmailRecord {
            id: 7,
            body: "첫 줄\n둘째 줄".to_string(),
            sender: None,
            subject: Some("주간 회의".to_string()),
            category: "일정".to_string(),
            summary: "회의가 화요일로 변경됩니다.".to_string(),
            created_at: "2025-02-24T08:30:00.123456".to_string(),
        }
    }

    #[test]
    fn timestamps_use_dotted_date_and_minute_precision() {
        assert_eq!(format_timestamp("2025-01-06T09:12:00"), "2025. 01. 06. 09:12");
        assert_eq!(
            format_timestamp("2025-01-06 21:05:59.5+09:00"),
            "2025. 01. 06. 21:05"
        );
        assert_eq!(format_timestamp("yesterday"), "yesterday");
    }

    #[test]
    fn email_listing_uses_placeholders_and_formatted_dates() {
        let lines = email_list_lines(&[record()]);
        assert_eq!(
            lines,
            vec![format!(
                "#7 [일정] 주간 회의 · {NO_SENDER_PLACEHOLDER} · 2025. 02. 24. 08:30 · 회의가 화요일로 변경됩니다."
            )]
        );
        assert_eq!(email_list_lines(&[]), vec!["저장된 메일이 없습니다.".to_string()]);
    }

    #[test]
    fn email_detail_includes_body_lines() {
        let lines = email_detail_lines(&record());
        assert_eq!(lines[0], "#7 주간 회의");
        assert_eq!(lines[1], format!("보낸 사람: {NO_SENDER_PLACEHOLDER}"));
        assert_eq!(&lines[lines.len() - 2..], ["첫 줄", "둘째 줄"]);
    }

    #[test]
    fn category_lines_omit_blank_descriptions() {
        let categories = vec![
            Category {
                id: 1,
                name: "일정".to_string(),
                description: Some("회의 조율".to_string()),
            },
            Category {
                id: 2,
                name: "미분류".to_string(),
                description: Some("  ".to_string()),
            },
        ];
        assert_eq!(
            category_lines(&categories),
            vec!["- 일정: 회의 조율".to_string(), "- 미분류".to_string()]
        );
    }

    #[test]
    fn evidence_heading_falls_back_to_placeholders() {
        let evidence = Evidence {
            email_id: 3,
            sender: Some(" ".to_string()),
            subject: None,
            summary: "요약".to_string(),
        };
        assert_eq!(
            evidence_heading(&evidence),
            format!("#3 {NO_SENDER_PLACEHOLDER} · {NO_SUBJECT_PLACEHOLDER}")
        );
    }

    #[test]
    fn long_summaries_are_shortened_in_listings() {
        let mut email = record();
        email.summary = "가".repeat(100);
        let line = &email_list_lines(&[email])[0];
        assert!(line.ends_with('…'));
    }
}
