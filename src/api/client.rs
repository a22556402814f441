use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use log::debug;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::settings::ClientSettings;
use crate::domain::time::TimeOfDay;
use crate::gesture::{MoveCommand, StretchCommand};

use super::instructions::Instructions;

const POLLING_PATH: &str = "polling";
const VALIDATE_PATH: &str = "ordertime/validate";
const MOVE_PATH: &str = "ordertime/move";
const STRETCH_PATH: &str = "ordertime/stretch";
const SEASON_PRICE_PATH: &str = "order/price";

/// Availability check payload; time values travel as "HH:MM" strings.
#[derive(Debug, Clone, Serialize)]
pub struct ValidateRequest {
    pub order_id: i64,
    pub date_at: NaiveDate,
    pub court_id: i64,
    pub time_from: TimeOfDay,
    pub time_to: TimeOfDay,
}

/// `dates` lists the conflicting occurrences, populated only on failure.
#[derive(Debug, Clone, Deserialize)]
pub struct ValidateResponse {
    pub success: bool,
    #[serde(default)]
    pub dates: Vec<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RefreshResponse {
    #[serde(default)]
    pub instructions: Instructions,
}

#[derive(Debug, Clone, Serialize)]
pub struct SeasonPriceEntry {
    pub court_id: i64,
    pub time_from: TimeOfDay,
    pub time_to: TimeOfDay,
}

#[derive(Debug, Clone, Serialize)]
pub struct SeasonPriceOrder {
    pub type_id: u8,
    pub discount: f64,
}

/// Remote season price lookup: one entry per selected group, keyed by
/// position.
#[derive(Debug, Clone, Serialize)]
pub struct SeasonPriceRequest {
    pub date: NaiveDate,
    pub ordertime: BTreeMap<String, SeasonPriceEntry>,
    pub order: SeasonPriceOrder,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeasonPriceResponse {
    pub price: f64,
}

/// HTTP client against the booking backend.
pub struct BookingClient {
    client: Client,
    base_url: String,
    poll_timeout: Duration,
}

impl BookingClient {
    pub fn new(base_url: &str, settings: &ClientSettings) -> Result<Self> {
        let client = Self::build_client(settings)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            poll_timeout: Duration::from_secs(settings.poll_timeout_secs),
        })
    }

    fn build_client(settings: &ClientSettings) -> Result<Client> {
        Client::builder()
            .user_agent(settings.user_agent)
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .context("Failed to build HTTP client")
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    // --- Refresh Pull ---

    /// Pull the day diff. Bounded by the poll timeout so a slow backend
    /// only costs one skipped cycle.
    pub async fn poll(&self, date: NaiveDate, viewing_type: u8) -> Result<RefreshResponse> {
        let url = self.url(POLLING_PATH);
        debug!("polling {} for {}", url, date);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("date", date.format("%Y-%m-%d").to_string()),
                ("type", viewing_type.to_string()),
            ])
            .timeout(self.poll_timeout)
            .send()
            .await
            .context("Failed to poll day state")?;

        if !response.status().is_success() {
            anyhow::bail!("HTTP error: {}", response.status());
        }

        response
            .json()
            .await
            .context("Failed to parse polling response")
    }

    // --- Availability Validator ---

    /// Ask whether the proposed range is free on every occurrence date.
    pub async fn validate(&self, request: &ValidateRequest) -> Result<ValidateResponse> {
        let body = serde_json::to_string(request).context("Failed to encode ordertime")?;

        let response = self
            .client
            .post(self.url(VALIDATE_PATH))
            .form(&[("ordertime", body)])
            .send()
            .await
            .context("Failed to validate free time")?;

        if !response.status().is_success() {
            anyhow::bail!("HTTP error: {}", response.status());
        }

        response
            .json()
            .await
            .context("Failed to parse validation response")
    }

    // --- Commits ---

    pub async fn commit_move(&self, command: &MoveCommand, viewing_type: u8) -> Result<()> {
        let payload = serde_json::json!({
            "ordertime": {
                "id": command.booking_id,
                "court_id": command.court_id,
                "time_from": command.time_from,
                "time_to": command.time_to,
            },
            "type": viewing_type,
        });
        self.post_command(MOVE_PATH, &payload).await
    }

    /// Stretch never changes the court, so no court travels with it.
    pub async fn commit_stretch(&self, command: &StretchCommand, viewing_type: u8) -> Result<()> {
        let payload = serde_json::json!({
            "ordertime": {
                "id": command.booking_id,
                "time_from": command.time_from,
                "time_to": command.time_to,
            },
            "type": viewing_type,
        });
        self.post_command(STRETCH_PATH, &payload).await
    }

    async fn post_command(&self, path: &str, payload: &serde_json::Value) -> Result<()> {
        let response = self
            .client
            .post(self.url(path))
            .json(payload)
            .send()
            .await
            .with_context(|| format!("Failed to post {path}"))?;

        if !response.status().is_success() {
            anyhow::bail!("HTTP error: {}", response.status());
        }
        Ok(())
    }

    // --- Season Price ---

    pub async fn season_price(&self, request: &SeasonPriceRequest) -> Result<SeasonPriceResponse> {
        let response = self
            .client
            .post(self.url(SEASON_PRICE_PATH))
            .json(request)
            .send()
            .await
            .context("Failed to request season price")?;

        if !response.status().is_success() {
            anyhow::bail!("HTTP error: {}", response.status());
        }

        response
            .json()
            .await
            .context("Failed to parse season price response")
    }
}
