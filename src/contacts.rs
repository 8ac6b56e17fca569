//! Mailing-list collaborator (Brevo contacts API).
//!
//! Pages through the configured list and flattens it to bare email
//! addresses. The core consumes the flattened result and never sees the
//! contact records themselves.

use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://api.brevo.com/v3";
const PAGE_SIZE: usize = 500;
const FETCH_TIMEOUT_SECS: u64 = 30;

pub struct ContactsClient {
    base_url: String,
    api_key: String,
    page_size: usize,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct ContactsPage {
    #[serde(default)]
    contacts: Vec<Contact>,
}

#[derive(Debug, Deserialize)]
struct Contact {
    #[serde(default)]
    email: Option<String>,
}

impl ContactsClient {
    pub fn new(api_key: &str) -> Result<Self> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(api_key: &str, base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            page_size: PAGE_SIZE,
            client,
        })
    }

    /// Fetch every subscriber address on the list, flattened across pages.
    /// Contacts without an email address are dropped.
    pub async fn fetch_recipients(&self, list_id: &str) -> Result<Vec<String>> {
        let url = format!("{}/contacts/lists/{}/contacts", self.base_url, list_id);
        let mut emails = Vec::new();
        let mut offset = 0usize;

        loop {
            let page: ContactsPage = self
                .client
                .get(&url)
                .header("api-key", &self.api_key)
                .header("accept", "application/json")
                .query(&[("limit", self.page_size), ("offset", offset)])
                .send()
                .await
                .with_context(|| format!("contact fetch failed at offset {offset}"))?
                .error_for_status()
                .context("contact API returned an error status")?
                .json()
                .await
                .context("contact API returned malformed JSON")?;

            let batch = page.contacts.len();
            debug!("fetched {batch} contacts (offset={offset})");
            emails.extend(
                page.contacts
                    .into_iter()
                    .filter_map(|contact| contact.email)
                    .filter(|email| !email.trim().is_empty()),
            );

            if batch < self.page_size {
                break;
            }
            offset += self.page_size;
        }

        Ok(emails)
    }
}
