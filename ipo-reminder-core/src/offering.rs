//! Offering records and identity derivation.
//!
//! An [`Offering`] is one open row from the listings page, validated into a
//! typed record at the scraper boundary. The core never sees raw table cells.

use serde::{Deserialize, Serialize};

use crate::error::{ReminderError, ReminderResult};

/// The closed set of offering categories the listings page exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OfferingType {
    Ipo,
    Fpo,
    RightShare,
    MutualFund,
    IpoLocal,
    BondsDebentures,
    IpoMigrant,
    IpoQiis,
}

impl OfferingType {
    /// Human-readable label used in subjects and invite summaries.
    pub fn label(&self) -> &'static str {
        match self {
            OfferingType::Ipo => "IPO",
            OfferingType::Fpo => "FPO",
            OfferingType::RightShare => "Right Share",
            OfferingType::MutualFund => "Mutual Fund",
            OfferingType::IpoLocal => "IPO-Local",
            OfferingType::BondsDebentures => "Bonds/Debentures",
            OfferingType::IpoMigrant => "IPO to Migrant Workers",
            OfferingType::IpoQiis => "IPO for QIIs",
        }
    }
}

/// One open offering.
///
/// Dates are kept as the listing page's ISO-8601 strings: the opening date
/// participates verbatim in the ledger key, and a blank closing date is a
/// per-offering skip rather than a parse failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Offering {
    pub symbol: String,
    pub company_name: String,
    /// ISO-8601 calendar date (`YYYY-MM-DD`).
    pub opening_date: String,
    /// ISO-8601 calendar date; blank when the listing omits it.
    pub closing_date: String,
    pub issue_manager: String,
    pub offering_type: OfferingType,
}

/// Derive the ledger key for an offering: `Symbol|OpeningDate`.
///
/// Two offerings with equal symbol and opening date are the same offering,
/// across runs. Fails when either part is blank after trimming, since such a
/// row cannot be tracked in the ledger.
pub fn offering_identity(offering: &Offering) -> ReminderResult<String> {
    let symbol = offering.symbol.trim();
    let opening = offering.opening_date.trim();
    if symbol.is_empty() {
        return Err(ReminderError::MissingField("symbol"));
    }
    if opening.is_empty() {
        return Err(ReminderError::MissingField("opening date"));
    }
    Ok(format!("{symbol}|{opening}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_offering() -> Offering {
        Offering {
            symbol: "SRBL".to_string(),
            company_name: "Sunrise Bank Limited".to_string(),
            opening_date: "2026-02-05".to_string(),
            closing_date: "2026-02-09".to_string(),
            issue_manager: "NIBL Ace Capital".to_string(),
            offering_type: OfferingType::Ipo,
        }
    }

    #[test]
    fn test_identity_is_symbol_pipe_opening_date() {
        let offering = make_offering();
        assert_eq!(offering_identity(&offering).unwrap(), "SRBL|2026-02-05");
    }

    #[test]
    fn test_identity_is_stable_across_calls() {
        let offering = make_offering();
        assert_eq!(
            offering_identity(&offering).unwrap(),
            offering_identity(&offering).unwrap()
        );
    }

    #[test]
    fn test_identity_trims_whitespace() {
        let mut offering = make_offering();
        offering.symbol = "  SRBL ".to_string();
        offering.opening_date = " 2026-02-05\t".to_string();
        assert_eq!(offering_identity(&offering).unwrap(), "SRBL|2026-02-05");
    }

    #[test]
    fn test_blank_symbol_is_rejected() {
        let mut offering = make_offering();
        offering.symbol = "   ".to_string();
        assert!(matches!(
            offering_identity(&offering),
            Err(ReminderError::MissingField("symbol"))
        ));
    }

    #[test]
    fn test_blank_opening_date_is_rejected() {
        let mut offering = make_offering();
        offering.opening_date = String::new();
        assert!(matches!(
            offering_identity(&offering),
            Err(ReminderError::MissingField("opening date"))
        ));
    }
}
