use chrono::{DateTime, Duration, Utc};

use crate::models::{AttendeeStatus, Event};

const PRODID: &str = "-//EventSync//Event Export//EN";
const MAX_LINE_OCTETS: usize = 75;
const DEFAULT_DURATION_HOURS: i64 = 1;

/// Renders `event` as a single-event iCalendar (RFC 5545) document.
///
/// Start and end are floating local times, matching how events are stored.
pub fn render_event(event: &Event, stamp: DateTime<Utc>) -> String {
    let starts_at = event.starts_at();
    let ends_at = starts_at
        .checked_add_signed(Duration::hours(DEFAULT_DURATION_HOURS))
        .unwrap_or(starts_at);

    let mut lines = vec![
        "BEGIN:VCALENDAR".to_string(),
        "VERSION:2.0".to_string(),
        format!("PRODID:{}", PRODID),
        "CALSCALE:GREGORIAN".to_string(),
        "METHOD:PUBLISH".to_string(),
        "BEGIN:VEVENT".to_string(),
        format!("UID:{}@eventsync", event.id),
        format!("DTSTAMP:{}", stamp.format("%Y%m%dT%H%M%SZ")),
        format!("DTSTART:{}", starts_at.format("%Y%m%dT%H%M%S")),
        format!("DTEND:{}", ends_at.format("%Y%m%dT%H%M%S")),
        format!("SUMMARY:{}", escape_text(&event.title)),
    ];
    if !event.location.is_empty() {
        lines.push(format!("LOCATION:{}", escape_text(&event.location)));
    }
    if !event.description.is_empty() {
        lines.push(format!("DESCRIPTION:{}", escape_text(&event.description)));
    }
    lines.push("STATUS:CONFIRMED".to_string());
    for attendee in &event.attendees {
        lines.push(format!(
            "ATTENDEE;PARTSTAT={};RSVP=TRUE:mailto:{}",
            participation_status(attendee.status),
            mailto_address(&attendee.email)
        ));
    }
    lines.push("END:VEVENT".to_string());
    lines.push("END:VCALENDAR".to_string());

    let mut out = String::new();
    for line in lines {
        out.push_str(&fold_line(&line));
        out.push_str("\r\n");
    }
    out
}

/// File name for the download: the title with anything unsafe in a header replaced.
pub fn attachment_filename(title: &str) -> String {
    let stem: String = title
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, ' ' | '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if stem.trim_matches(|c| c == '_' || c == ' ' || c == '.').is_empty() {
        "event.ics".to_string()
    } else {
        format!("{}.ics", stem)
    }
}

fn participation_status(status: AttendeeStatus) -> &'static str {
    match status {
        AttendeeStatus::Pending => "NEEDS-ACTION",
        AttendeeStatus::Confirmed => "ACCEPTED",
        AttendeeStatus::Declined => "DECLINED",
    }
}

/// Address part of a `mailto:` value; control characters would end the content line.
fn mailto_address(email: &str) -> String {
    email.trim().chars().filter(|c| !c.is_control()).collect()
}

fn escape_text(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            ';' => escaped.push_str("\\;"),
            ',' => escaped.push_str("\\,"),
            '\n' => escaped.push_str("\\n"),
            '\r' => {}
            other => escaped.push(other),
        }
    }
    escaped
}

/// Splits a content line into 75-octet chunks without breaking a UTF-8 sequence.
fn fold_line(line: &str) -> String {
    if line.len() <= MAX_LINE_OCTETS {
        return line.to_string();
    }

    let mut folded = String::with_capacity(line.len() + line.len() / MAX_LINE_OCTETS * 3);
    let mut current = 0;
    for c in line.chars() {
        // Continuation lines start with a space, which counts toward the limit
        if current + c.len_utf8() > MAX_LINE_OCTETS {
            folded.push_str("\r\n ");
            current = 1;
        }
        folded.push(c);
        current += c.len_utf8();
    }
    folded
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Attendee, EventDraft};
    use chrono::{NaiveDate, NaiveTime, TimeZone};

    fn sample() -> Event {
        EventDraft {
            id: Some(1714557600000),
            title: "Design review, round 2".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            time: NaiveTime::from_hms_opt(18, 30, 0).unwrap(),
            location: "Room 4; east wing".to_string(),
            description: "Bring notes\nand laptops".to_string(),
            attendees: vec![
                Attendee {
                    id: 1.0,
                    email: "ana@example.com".to_string(),
                    status: AttendeeStatus::Confirmed,
                },
                Attendee {
                    id: 2.0,
                    email: "bo@example.com".to_string(),
                    status: AttendeeStatus::Pending,
                },
            ],
            notifications: vec![],
        }
        .into_event(1714557600000, NaiveDate::from_ymd_opt(2024, 4, 1).unwrap().and_hms_opt(0, 0, 0).unwrap())
    }

    #[test]
    fn test_render_event_fields() {
        let stamp = Utc.with_ymd_and_hms(2024, 4, 2, 8, 0, 0).unwrap();
        let ics = render_event(&sample(), stamp);
        let lines: Vec<&str> = ics.split("\r\n").collect();

        assert_eq!(lines[0], "BEGIN:VCALENDAR");
        assert!(lines.contains(&"UID:1714557600000@eventsync"));
        assert!(lines.contains(&"DTSTAMP:20240402T080000Z"));
        assert!(lines.contains(&"DTSTART:20240501T183000"));
        assert!(lines.contains(&"DTEND:20240501T193000"));
        assert!(lines.contains(&"SUMMARY:Design review\\, round 2"));
        assert!(lines.contains(&"LOCATION:Room 4\\; east wing"));
        assert!(lines.contains(&"DESCRIPTION:Bring notes\\nand laptops"));
        assert!(lines.contains(&"ATTENDEE;PARTSTAT=ACCEPTED;RSVP=TRUE:mailto:ana@example.com"));
        assert!(lines.contains(&"ATTENDEE;PARTSTAT=NEEDS-ACTION;RSVP=TRUE:mailto:bo@example.com"));
        assert!(ics.ends_with("END:VCALENDAR\r\n"));
    }

    #[test]
    fn test_long_lines_are_folded() {
        let line = format!("DESCRIPTION:{}", "é".repeat(60));
        let folded = fold_line(&line);

        for (i, part) in folded.split("\r\n").enumerate() {
            assert!(part.len() <= MAX_LINE_OCTETS, "line {} too long", i);
            if i > 0 {
                assert!(part.starts_with(' '));
            }
        }
        assert_eq!(folded.replace("\r\n ", ""), line);
    }

    #[test]
    fn test_attachment_filename() {
        assert_eq!(attachment_filename("Team Sync"), "Team Sync.ics");
        assert_eq!(attachment_filename("a\"b/c"), "a_b_c.ics");
        assert_eq!(attachment_filename("   "), "event.ics");
    }

    #[test]
    fn test_attendee_email_cannot_break_lines() {
        let mut event = sample();
        event.attendees[0].email = "a@b.c\r\nBEGIN:VALARM\r\nX-EVIL:1".to_string();
        let ics = render_event(&event, Utc::now());

        assert!(!ics.split("\r\n").any(|line| line == "BEGIN:VALARM"));
        assert!(ics.contains("mailto:a@b.cBEGIN:VALARMX-EVIL:1\r\n"));
    }

    #[test]
    fn test_render_at_edge_of_date_range() {
        let mut event = sample();
        event.date = NaiveDate::MAX;
        event.time = NaiveTime::from_hms_opt(23, 59, 0).unwrap();

        let ics = render_event(&event, Utc::now());
        assert!(ics.contains("BEGIN:VEVENT\r\n"));
    }
}
