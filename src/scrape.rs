//! Listings-page collaborator.
//!
//! Fetches the public listings page and extracts open offering rows from the
//! per-type tables. Rows are validated into typed [`Offering`] records here,
//! at the boundary; the core never sees raw table cells.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use ipo_reminder_core::{Offering, OfferingType};
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

const LISTINGS_URL: &str = "https://www.sharesansar.com/existing-issues";
const FETCH_TIMEOUT_SECS: u64 = 30;

/// The types covered by a default run.
pub const DEFAULT_TYPES: &[OfferingType] =
    &[OfferingType::Ipo, OfferingType::Fpo, OfferingType::RightShare];

/// Every type tab the listings page exposes.
pub const ALL_TYPES: &[OfferingType] = &[
    OfferingType::Ipo,
    OfferingType::Fpo,
    OfferingType::RightShare,
    OfferingType::MutualFund,
    OfferingType::IpoLocal,
    OfferingType::BondsDebentures,
    OfferingType::IpoMigrant,
    OfferingType::IpoQiis,
];

/// Table id on the listings page for each offering type tab.
fn table_id(offering_type: OfferingType) -> &'static str {
    match offering_type {
        OfferingType::Ipo => "#myTableEip",
        OfferingType::Fpo => "#myTableEfp",
        OfferingType::RightShare => "#myTableErs",
        OfferingType::MutualFund => "#myTableEmf",
        OfferingType::IpoLocal => "#myTableEipl",
        OfferingType::BondsDebentures => "#myTableEbd",
        OfferingType::IpoMigrant => "#myTableEim",
        OfferingType::IpoQiis => "#myTableQiis",
    }
}

/// Fetch the listings page and return every row with `Status == Open` across
/// the requested type tabs.
pub async fn fetch_open_offerings(types: &[OfferingType]) -> Result<Vec<Offering>> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
        .build()
        .context("failed to build HTTP client")?;
    let page = client
        .get(LISTINGS_URL)
        .send()
        .await
        .context("listings page fetch failed")?
        .error_for_status()
        .context("listings page returned an error status")?
        .text()
        .await
        .context("listings page body was unreadable")?;

    extract_all_open_rows(&page, types)
}

/// Parse the page HTML and extract open rows for each requested type.
pub fn extract_all_open_rows(page: &str, types: &[OfferingType]) -> Result<Vec<Offering>> {
    let document = Html::parse_document(page);
    let mut offerings = Vec::new();
    for &offering_type in types {
        offerings.extend(extract_open_rows(&document, offering_type)?);
    }
    Ok(offerings)
}

fn extract_open_rows(document: &Html, offering_type: OfferingType) -> Result<Vec<Offering>> {
    let table_sel = Selector::parse(table_id(offering_type)).expect("static selector");
    let header_sel = Selector::parse("thead tr th").expect("static selector");
    let row_sel = Selector::parse("tbody tr").expect("static selector");
    let cell_sel = Selector::parse("td").expect("static selector");

    let Some(table) = document.select(&table_sel).next() else {
        bail!(
            "{} table not found on listings page (layout change?)",
            offering_type.label()
        );
    };

    let headers: Vec<String> = table.select(&header_sel).map(cell_text).collect();
    let column = |name: &str| {
        headers
            .iter()
            .position(|header| header.eq_ignore_ascii_case(name))
    };

    // Symbol, opening date, and status are structural; the rest degrade to
    // blank cells.
    let status_idx = column("status").with_context(|| {
        format!("status column not found in {} table", offering_type.label())
    })?;
    let symbol_idx = column("symbol").with_context(|| {
        format!("symbol column not found in {} table", offering_type.label())
    })?;
    let opening_idx = column("opening date").with_context(|| {
        format!("opening date column not found in {} table", offering_type.label())
    })?;
    let company_idx = column("company").or_else(|| column("company name"));
    let closing_idx = column("closing date");
    let manager_idx = column("issue manager");

    let mut rows = Vec::new();
    for row in table.select(&row_sel) {
        let cells: Vec<String> = row.select(&cell_sel).map(cell_text).collect();
        if cells.is_empty() {
            continue;
        }
        let cell = |idx: Option<usize>| {
            idx.and_then(|i| cells.get(i)).cloned().unwrap_or_default()
        };
        if !cell(Some(status_idx)).eq_ignore_ascii_case("open") {
            continue;
        }
        rows.push(Offering {
            symbol: cell(Some(symbol_idx)),
            company_name: cell(company_idx),
            opening_date: cell(Some(opening_idx)),
            closing_date: cell(closing_idx),
            issue_manager: cell(manager_idx),
            offering_type,
        });
    }

    debug!("{}: {} open rows", offering_type.label(), rows.len());
    Ok(rows)
}

fn cell_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}
