//! Environment-backed configuration.
//!
//! The full configuration surface is read once at startup into a [`Config`]
//! value and passed by reference; core logic never reads ambient state.

use ipo_reminder_core::{ReminderError, ReminderResult};

const DEFAULT_SMTP_HOST: &str = "smtp-relay.brevo.com";
const DEFAULT_SMTP_PORT: u16 = 587;
const DEFAULT_SENDER_EMAIL: &str = "noreply@example.com";
const DEFAULT_SENDER_NAME: &str = "IPO Alerts";

#[derive(Debug, Clone)]
pub struct Config {
    pub brevo_api_key: String,
    pub brevo_list_id: String,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_user: String,
    pub smtp_pass: String,
    pub sender_email: String,
    pub sender_name: String,
    pub dedupe_salt: String,
}

impl Config {
    /// Read configuration from the environment (a `.env` file is honored).
    ///
    /// Every missing required variable is collected into one
    /// [`ReminderError::Config`] so the operator sees the complete list, not
    /// just the first gap.
    pub fn from_env() -> ReminderResult<Self> {
        dotenvy::dotenv().ok();

        let mut missing = Vec::new();
        let mut required = |name: &'static str| match std::env::var(name) {
            Ok(value) if !value.trim().is_empty() => value,
            _ => {
                missing.push(name);
                String::new()
            }
        };

        let brevo_api_key = required("BREVO_API_KEY");
        let brevo_list_id = required("BREVO_LIST_ID");
        let smtp_user = required("BREVO_SMTP_USER");
        let smtp_pass = required("BREVO_SMTP_PASS");
        let dedupe_salt = required("DEDUPE_SALT");

        if !missing.is_empty() {
            return Err(ReminderError::Config(missing.join(", ")));
        }

        let smtp_port = std::env::var("BREVO_SMTP_PORT")
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(DEFAULT_SMTP_PORT);

        Ok(Config {
            brevo_api_key,
            brevo_list_id,
            smtp_host: env_or("BREVO_SMTP_HOST", DEFAULT_SMTP_HOST),
            smtp_port,
            smtp_user,
            smtp_pass,
            sender_email: env_or("BREVO_SENDER_EMAIL", DEFAULT_SENDER_EMAIL),
            sender_name: env_or("BREVO_SENDER_NAME", DEFAULT_SENDER_NAME),
            dedupe_salt,
        })
    }
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}
