//! One notification run, end to end.
//!
//! Wiring only: scrape, early-exit when nothing is open, contact fetch,
//! ledger load and prune, orchestration, conditional save. The decisions
//! with invariants live in the core crate.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use ipo_reminder_core::ledger::{LEDGER_PATH, RETENTION_DAYS};
use ipo_reminder_core::{Ledger, Notifier, RunMode, Sender};
use tracing::info;

use crate::config::Config;
use crate::contacts::ContactsClient;
use crate::mailer::SmtpMailer;
use crate::scrape;

/// Dev-mode sends all go to this address instead of the list.
const DEV_RECIPIENT: &str = "dev@example.com";

/// Invite dump location for `--dump-ics`.
const INVITE_DUMP_PATH: &str = "data/last_invite.ics";

#[derive(Debug, Clone, Copy, Default)]
pub struct RunFlags {
    pub force_send: bool,
    pub dev_mode: bool,
    pub dump_invite: bool,
    pub all_types: bool,
}

pub async fn run(config: &Config, flags: RunFlags) -> Result<()> {
    let types = if flags.all_types {
        scrape::ALL_TYPES
    } else {
        scrape::DEFAULT_TYPES
    };
    let offerings = scrape::fetch_open_offerings(types).await?;
    info!("open offerings: {}", offerings.len());
    if offerings.is_empty() {
        println!("No open offerings today.");
        return Ok(());
    }

    let recipients = if flags.dev_mode {
        info!("dev mode: sending only to {DEV_RECIPIENT}");
        vec![DEV_RECIPIENT.to_string()]
    } else {
        let contacts = ContactsClient::new(&config.brevo_api_key)?;
        contacts
            .fetch_recipients(&config.brevo_list_id)
            .await
            .context("mailing-list fetch failed")?
    };
    info!("recipients: {}", recipients.len());

    let now = Utc::now();
    let ledger_path = Path::new(LEDGER_PATH);

    // Dev runs work against a throwaway empty ledger: nothing is loaded,
    // pruned, or saved.
    let mut ledger = if flags.dev_mode {
        Ledger::default()
    } else {
        let mut ledger = Ledger::load(ledger_path)?;
        ledger.prune(now, RETENTION_DAYS);
        ledger
    };

    let mailer = SmtpMailer::from_config(config)?;
    let sender = Sender {
        name: config.sender_name.clone(),
        email: config.sender_email.clone(),
    };
    let notifier = Notifier {
        salt: &config.dedupe_salt,
        sender: &sender,
        mode: RunMode {
            force_send: flags.force_send,
            dev_mode: flags.dev_mode,
        },
        now,
        dump_invite_to: flags.dump_invite.then(|| Path::new(INVITE_DUMP_PATH)),
    };

    let stats = notifier
        .run(&offerings, &recipients, &mut ledger, &mailer)
        .await?;

    if stats.sent > 0 && !flags.dev_mode {
        ledger.save(ledger_path)?;
    }

    println!(
        "Sent {} emails ({} suppressed as duplicates, {} offerings skipped).",
        stats.sent, stats.suppressed, stats.skipped_offerings
    );
    Ok(())
}
