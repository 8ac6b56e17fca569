//! Send orchestration.
//!
//! One pass over (open offerings × recipients): compose once per offering,
//! build the invite, consult the ledger, hand the message to the transport,
//! record the send. Fully sequential; a transport failure propagates and
//! aborts the run with the ledger unsaved.

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::dedupe::dedupe_key;
use crate::error::{ReminderError, ReminderResult};
use crate::invite::build_invite;
use crate::ledger::Ledger;
use crate::offering::{offering_identity, Offering};

/// Transport seam. Implementations deliver one composed message and either
/// succeed or fail with [`ReminderError::Transport`].
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutgoingEmail<'_>) -> ReminderResult<()>;
}

/// One fully composed notification, ready for the wire.
pub struct OutgoingEmail<'a> {
    pub recipient: &'a str,
    pub subject: &'a str,
    pub text_body: &'a str,
    pub html_body: &'a str,
    /// `text/calendar` REQUEST document.
    pub invite: &'a str,
}

/// Sender identity placed on outgoing messages and invites.
#[derive(Debug, Clone)]
pub struct Sender {
    pub name: String,
    pub email: String,
}

/// Mode flags for one run.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunMode {
    /// Send even when the ledger already records the pair.
    pub force_send: bool,
    /// Dev runs bypass dedupe and never mutate the ledger.
    pub dev_mode: bool,
}

/// Counters reported at the end of a run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunStats {
    pub sent: usize,
    /// Pairs skipped because the ledger already records them.
    pub suppressed: usize,
    /// Offerings skipped for missing or invalid fields.
    pub skipped_offerings: usize,
}

/// One run's orchestration context. Salt, sender, and time are provided by
/// the caller; nothing here reads ambient state.
pub struct Notifier<'a> {
    pub salt: &'a str,
    pub sender: &'a Sender,
    pub mode: RunMode,
    pub now: DateTime<Utc>,
    /// When set, each built invite is written here (last one wins).
    pub dump_invite_to: Option<&'a Path>,
}

impl Notifier<'_> {
    /// Notify every recipient about every offering, deduplicating through
    /// the ledger. The caller decides whether to persist the ledger after.
    pub async fn run(
        &self,
        offerings: &[Offering],
        recipients: &[String],
        ledger: &mut Ledger,
        mailer: &dyn Mailer,
    ) -> ReminderResult<RunStats> {
        let mut stats = RunStats::default();

        'offerings: for offering in offerings {
            let identity = match offering_identity(offering) {
                Ok(identity) => identity,
                Err(err) => {
                    warn!("skipping offering: {err}");
                    stats.skipped_offerings += 1;
                    continue;
                }
            };
            if offering.closing_date.trim().is_empty() {
                warn!("skipping {identity}: missing closing date");
                stats.skipped_offerings += 1;
                continue;
            }

            // Composed once per offering, shared across recipients.
            let subject = compose_subject(offering);
            let text_body = compose_text_body(offering);
            let html_body = compose_html_body(offering);

            for recipient in recipients {
                let invite = match build_invite(
                    offering,
                    &identity,
                    recipient,
                    &self.sender.email,
                    &self.sender.name,
                    self.now,
                ) {
                    Ok(invite) => invite,
                    Err(err @ ReminderError::InvalidDate(_)) => {
                        warn!("skipping {identity}: {err}");
                        stats.skipped_offerings += 1;
                        continue 'offerings;
                    }
                    Err(err) => return Err(err),
                };

                if let Some(path) = self.dump_invite_to {
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(path, &invite)?;
                }

                let key = dedupe_key(self.salt, recipient, &identity);
                if !(self.mode.force_send || self.mode.dev_mode)
                    && ledger.contains(&identity, &key)
                {
                    debug!("suppressing duplicate send for {identity}");
                    stats.suppressed += 1;
                    continue;
                }

                // Transport failure is not caught: it aborts the run and
                // leaves this and later pairs unrecorded.
                mailer
                    .send(&OutgoingEmail {
                        recipient,
                        subject: &subject,
                        text_body: &text_body,
                        html_body: &html_body,
                        invite: &invite,
                    })
                    .await?;

                if !self.mode.dev_mode {
                    ledger.record(&identity, &key, self.now);
                }
                stats.sent += 1;
            }
        }

        Ok(stats)
    }
}

pub fn compose_subject(offering: &Offering) -> String {
    format!(
        "Final Day: {} {} ({})",
        offering.offering_type.label(),
        offering.company_name,
        offering.symbol
    )
}

pub fn compose_text_body(offering: &Offering) -> String {
    format!(
        "Final day to apply for {} ({}).\n\n\
         Reminder time: 9:00–10:00 AM NPT\n\
         Type: {}\n\
         Close: {}\n\
         Issue Manager: {}\n",
        offering.company_name,
        offering.symbol,
        offering.offering_type.label(),
        offering.closing_date,
        offering.issue_manager
    )
}

pub fn compose_html_body(offering: &Offering) -> String {
    let company = html_escape(&offering.company_name);
    let symbol = html_escape(&offering.symbol);
    let label = html_escape(offering.offering_type.label());
    let closing = html_escape(&offering.closing_date);
    let manager = html_escape(&offering.issue_manager);
    format!(
        r#"<html>
  <body style="font-family: Arial, sans-serif; background:#f6f7fb; padding:24px;">
    <div style="max-width:640px;margin:0 auto;background:#ffffff;border-radius:12px;padding:24px;border:1px solid #e6e8ef;">
      <div style="font-size:14px;color:#6b7280;text-transform:uppercase;letter-spacing:.06em;margin-bottom:8px;">
        {label} OPEN
      </div>
      <h1 style="font-size:22px;margin:0 0 12px 0;color:#111827;">
        {company} ({symbol})
      </h1>
      <p style="font-size:15px;color:#374151;line-height:1.5;margin:0 0 16px 0;">
        Final day to apply. Your calendar reminder is set for 9:00–10:00 AM NPT.
      </p>
      <table style="width:100%;border-collapse:collapse;font-size:14px;color:#111827;">
        <tr><td style="padding:8px 0;color:#6b7280;">Close</td><td style="padding:8px 0;">{closing}</td></tr>
        <tr><td style="padding:8px 0;color:#6b7280;">Reminder</td><td style="padding:8px 0;">9:00–10:00 AM NPT</td></tr>
        <tr><td style="padding:8px 0;color:#6b7280;">Issue Manager</td><td style="padding:8px 0;">{manager}</td></tr>
        <tr><td style="padding:8px 0;color:#6b7280;">Type</td><td style="padding:8px 0;">{label}</td></tr>
      </table>
      <p style="font-size:12px;color:#9ca3af;margin-top:16px;">
        You're receiving this because you subscribed to IPO alerts.
      </p>
    </div>
  </body>
</html>
"#
    )
}

fn html_escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
