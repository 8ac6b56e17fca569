//! Calendar invite generation.
//!
//! Builds the single-event REQUEST document attached to each notification.
//! The output format is pinned: CRLF line endings, content lines folded at
//! 70 octets with one-space continuations, text fields escaped per calendar
//! text rules, and event times anchored to the market's civil offset.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, TimeZone, Utc};
use sha2::{Digest, Sha256};

use crate::error::{ReminderError, ReminderResult};
use crate::offering::Offering;

/// Civil time of the target market, UTC+05:45. A fixed constant, never
/// derived from the host locale.
const MARKET_UTC_OFFSET_SECS: i32 = 5 * 3600 + 45 * 60;

/// The reminder window starts at 09:00 market-local on the closing date.
const EVENT_START_HOUR: u32 = 9;

/// Maximum octets per content line before folding.
const FOLD_LIMIT: usize = 70;

const PRODID: &str = "-//ipo-reminder//EN";

/// Escape free text for embedding in a calendar property value.
///
/// Backslash must be escaped first; reversing the order would double-escape
/// the backslashes introduced by the later rules.
pub fn escape_text(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace(';', "\\;")
        .replace(',', "\\,")
        .replace('\n', "\\n")
}

/// Inverse of [`escape_text`].
pub fn unescape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some(';') => out.push(';'),
            Some(',') => out.push(','),
            Some('n') => out.push('\n'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Fold every content line of a CRLF-terminated document at [`FOLD_LIMIT`]
/// octets. Continuation lines begin with one space. Cuts back off UTF-8
/// sequence boundaries so a multi-byte character is never split.
pub fn fold(document: &str) -> String {
    let mut folded = Vec::new();
    for line in document.split("\r\n") {
        if line.len() <= FOLD_LIMIT {
            folded.push(line.to_string());
            continue;
        }
        let mut rest = line.to_string();
        while rest.len() > FOLD_LIMIT {
            let mut cut = FOLD_LIMIT;
            while !rest.is_char_boundary(cut) {
                cut -= 1;
            }
            folded.push(rest[..cut].to_string());
            rest = format!(" {}", &rest[cut..]);
        }
        folded.push(rest);
    }
    folded.join("\r\n")
}

/// Inverse of [`fold`]: strip CRLF-plus-space continuations.
pub fn unfold(document: &str) -> String {
    document.replace("\r\n ", "")
}

/// Stable event UID: SHA-256 hex of the offering identity.
///
/// Recipient-independent, so every recipient of one offering receives the
/// same UID and a calendar backend may conflate their copies.
pub fn invite_uid(offering_identity: &str) -> String {
    hex::encode(Sha256::digest(offering_identity.as_bytes()))
}

/// Build the invite document for one offering and one recipient.
///
/// The event runs 09:00–10:00 market-local on the closing date, expressed in
/// UTC. `now` stamps DTSTAMP and is injected so runs are reproducible under
/// test. Fails with [`ReminderError::InvalidDate`] when the closing date is
/// absent or unparsable; the caller skips the offering rather than send a
/// malformed invite.
pub fn build_invite(
    offering: &Offering,
    offering_identity: &str,
    recipient: &str,
    organizer_email: &str,
    organizer_name: &str,
    now: DateTime<Utc>,
) -> ReminderResult<String> {
    let closing = offering.closing_date.trim();
    let date = NaiveDate::parse_from_str(closing, "%Y-%m-%d")
        .map_err(|_| ReminderError::InvalidDate(closing.to_string()))?;

    let offset = FixedOffset::east_opt(MARKET_UTC_OFFSET_SECS).expect("offset is in range");
    let wall_clock = date
        .and_hms_opt(EVENT_START_HOUR, 0, 0)
        .expect("09:00 is a valid wall-clock time");
    let start_local = offset
        .from_local_datetime(&wall_clock)
        .single()
        .expect("fixed offsets have no DST gaps");
    let end_local = start_local + Duration::hours(1);

    let start_utc = start_local.with_timezone(&Utc).format("%Y%m%dT%H%M%SZ");
    let end_utc = end_local.with_timezone(&Utc).format("%Y%m%dT%H%M%SZ");
    let dtstamp = now.format("%Y%m%dT%H%M%SZ");

    let uid = invite_uid(offering_identity);
    let summary = escape_text(&format!(
        "Final Day: {} {} ({})",
        offering.offering_type.label(),
        offering.company_name,
        offering.symbol
    ));
    let description = escape_text(&format!(
        "Final day to apply (9:00–10:00 AM NPT reminder).\nClose: {}\nIssue Manager: {}",
        offering.closing_date, offering.issue_manager
    ));

    let lines = [
        "BEGIN:VCALENDAR".to_string(),
        "VERSION:2.0".to_string(),
        format!("PRODID:{PRODID}"),
        "CALSCALE:GREGORIAN".to_string(),
        "METHOD:REQUEST".to_string(),
        "BEGIN:VEVENT".to_string(),
        format!("UID:{uid}"),
        format!("DTSTAMP:{dtstamp}"),
        format!(
            "ORGANIZER;CN={}:mailto:{}",
            escape_text(organizer_name),
            organizer_email
        ),
        format!(
            "ATTENDEE;CN={};ROLE=REQ-PARTICIPANT;PARTSTAT=NEEDS-ACTION;RSVP=TRUE:mailto:{}",
            escape_text(recipient),
            recipient
        ),
        format!("SUMMARY:{summary}"),
        format!("DESCRIPTION:{description}"),
        format!("DTSTART:{start_utc}"),
        format!("DTEND:{end_utc}"),
        "SEQUENCE:0".to_string(),
        "STATUS:CONFIRMED".to_string(),
        "TRANSP:OPAQUE".to_string(),
        "END:VEVENT".to_string(),
        "END:VCALENDAR".to_string(),
    ];

    Ok(fold(&(lines.join("\r\n") + "\r\n")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::offering::OfferingType;
    use proptest::prelude::*;

    fn make_offering() -> Offering {
        Offering {
            symbol: "SRBL".to_string(),
            company_name: "Sunrise Bank".to_string(),
            opening_date: "2026-02-05".to_string(),
            closing_date: "2026-02-09".to_string(),
            issue_manager: "NIBL Ace Capital".to_string(),
            offering_type: OfferingType::Ipo,
        }
    }

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 1, 12, 30, 0).unwrap()
    }

    fn build(offering: &Offering) -> String {
        build_invite(
            offering,
            "SRBL|2026-02-05",
            "subscriber@example.com",
            "noreply@example.com",
            "IPO Alerts",
            fixed_now(),
        )
        .unwrap()
    }

    #[test]
    fn test_event_times_map_market_morning_to_utc() {
        let ics = build(&make_offering());
        // 09:00-10:00 at UTC+05:45 on the closing date is 03:15-04:15 UTC.
        assert!(ics.contains("DTSTART:20260209T031500Z\r\n"));
        assert!(ics.contains("DTEND:20260209T041500Z\r\n"));
    }

    #[test]
    fn test_summary_line_format() {
        let ics = build(&make_offering());
        let summary = unfold(&ics)
            .lines()
            .find(|l| l.starts_with("SUMMARY:"))
            .expect("summary line")
            .to_string();
        assert_eq!(summary, "SUMMARY:Final Day: IPO Sunrise Bank (SRBL)");
    }

    #[test]
    fn test_summary_is_escaped() {
        let mut offering = make_offering();
        offering.company_name = "Sunrise, Bank; Ltd".to_string();
        let ics = build(&offering);
        assert!(unfold(&ics).contains("SUMMARY:Final Day: IPO Sunrise\\, Bank\\; Ltd (SRBL)"));
    }

    #[test]
    fn test_dtstamp_uses_injected_now() {
        let ics = build(&make_offering());
        assert!(ics.contains("DTSTAMP:20260201T123000Z\r\n"));
    }

    #[test]
    fn test_uid_depends_on_offering_identity_only() {
        let offering = make_offering();
        let a = build_invite(
            &offering,
            "SRBL|2026-02-05",
            "one@example.com",
            "noreply@example.com",
            "IPO Alerts",
            fixed_now(),
        )
        .unwrap();
        let b = build_invite(
            &offering,
            "SRBL|2026-02-05",
            "two@example.com",
            "noreply@example.com",
            "IPO Alerts",
            fixed_now(),
        )
        .unwrap();
        let uid = |ics: &str| {
            unfold(ics)
                .lines()
                .find(|l| l.starts_with("UID:"))
                .map(str::to_string)
        };
        assert_eq!(uid(&a), uid(&b));
        assert_eq!(uid(&a), Some(format!("UID:{}", invite_uid("SRBL|2026-02-05"))));
    }

    #[test]
    fn test_request_semantics_present() {
        let ics = unfold(&build(&make_offering()));
        assert!(ics.contains("METHOD:REQUEST"));
        assert!(ics.contains("ROLE=REQ-PARTICIPANT"));
        assert!(ics.contains("PARTSTAT=NEEDS-ACTION"));
        assert!(ics.contains("RSVP=TRUE"));
        assert!(ics.contains("SEQUENCE:0"));
        assert!(ics.contains("STATUS:CONFIRMED"));
        assert!(ics.contains("TRANSP:OPAQUE"));
    }

    #[test]
    fn test_blank_closing_date_is_invalid() {
        let mut offering = make_offering();
        offering.closing_date = "  ".to_string();
        let result = build_invite(
            &offering,
            "SRBL|2026-02-05",
            "subscriber@example.com",
            "noreply@example.com",
            "IPO Alerts",
            fixed_now(),
        );
        assert!(matches!(result, Err(ReminderError::InvalidDate(_))));
    }

    #[test]
    fn test_unparsable_closing_date_is_invalid() {
        let mut offering = make_offering();
        offering.closing_date = "09/02/2026".to_string();
        let result = build_invite(
            &offering,
            "SRBL|2026-02-05",
            "subscriber@example.com",
            "noreply@example.com",
            "IPO Alerts",
            fixed_now(),
        );
        assert!(matches!(result, Err(ReminderError::InvalidDate(_))));
    }

    #[test]
    fn test_every_line_is_crlf_terminated_and_folded() {
        let mut offering = make_offering();
        offering.company_name = "A Very Long Company Name That Will Definitely Need Folding \
                                 Because It Exceeds The Limit"
            .to_string();
        let ics = build(&offering);
        assert!(ics.ends_with("\r\n"));
        for line in ics.split("\r\n") {
            assert!(
                line.len() <= FOLD_LIMIT,
                "line exceeds {FOLD_LIMIT} octets: {line:?}"
            );
        }
    }

    #[test]
    fn test_folding_never_splits_multibyte_chars() {
        let mut offering = make_offering();
        // En-dashes are three octets each; pile them up around the limit.
        offering.company_name = "–".repeat(60);
        let ics = build(&offering);
        for line in ics.split("\r\n") {
            assert!(line.len() <= FOLD_LIMIT);
        }
        assert_eq!(unfold(&fold(&unfold(&ics))), unfold(&ics));
    }

    #[test]
    fn test_unfold_reconstructs_original_content() {
        let offering = make_offering();
        let ics = build(&offering);
        let unfolded = unfold(&ics);
        assert_eq!(fold(&unfolded), ics);
    }

    #[test]
    fn test_escape_applies_all_rules() {
        assert_eq!(escape_text("a\\b;c,d\ne"), "a\\\\b\\;c\\,d\\ne");
    }

    #[test]
    fn test_escape_backslash_first() {
        // A pre-existing "\n" sequence must come back out as itself, not as a
        // newline.
        let escaped = escape_text("literal \\n stays");
        assert_eq!(escaped, "literal \\\\n stays");
        assert_eq!(unescape_text(&escaped), "literal \\n stays");
    }

    proptest! {
        /// Escaping round-trips through its inverse for arbitrary text.
        #[test]
        fn prop_escape_roundtrip(text: String) {
            prop_assert_eq!(unescape_text(&escape_text(&text)), text);
        }

        /// Folding any single-line content keeps lines within the limit and
        /// unfolds back to the original.
        #[test]
        fn prop_fold_roundtrip(line in "[^\\r\\n]*") {
            let folded = fold(&line);
            for piece in folded.split("\r\n") {
                prop_assert!(piece.len() <= FOLD_LIMIT);
            }
            prop_assert_eq!(unfold(&folded), line);
        }
    }
}
