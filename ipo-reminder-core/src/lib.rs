//! Core logic for ipo-reminder.
//!
//! This crate holds the parts with real invariants:
//! - `offering` / `dedupe`: stable offering identity and salted dedupe keys
//! - `invite`: timezone-correct, escaped, line-folded calendar invites
//! - `ledger`: the persisted send ledger (load, prune, save)
//! - `notify`: the send orchestrator over the `Mailer` transport seam
//!
//! Network collaborators (scraper, contact list, SMTP) live in the binary.

pub mod dedupe;
pub mod error;
pub mod invite;
pub mod ledger;
pub mod notify;
pub mod offering;

pub use error::{ReminderError, ReminderResult};
pub use ledger::Ledger;
pub use notify::{Mailer, Notifier, OutgoingEmail, RunMode, RunStats, Sender};
pub use offering::{offering_identity, Offering, OfferingType};
