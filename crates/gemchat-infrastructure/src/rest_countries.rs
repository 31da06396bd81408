//! Country list provider backed by the REST Countries API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use gemchat_core::config::CountriesConfig;
use gemchat_core::country::{Country, CountryProvider};
use gemchat_core::error::{ChatError, Result};

#[derive(Debug, Deserialize)]
struct RawCountry {
    name: RawName,
    #[serde(default)]
    idd: RawIdd,
    #[serde(default)]
    cca2: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawName {
    common: String,
}

#[derive(Debug, Default, Deserialize)]
struct RawIdd {
    #[serde(default)]
    root: Option<String>,
    #[serde(default)]
    suffixes: Vec<String>,
}

/// Fetches `{name, idd, cca2}` records and turns them into selector entries.
#[derive(Debug, Clone)]
pub struct RestCountriesProvider {
    client: Client,
    endpoint: String,
}

impl RestCountriesProvider {
    pub fn new(config: &CountriesConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ChatError::network(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }
}

#[async_trait]
impl CountryProvider for RestCountriesProvider {
    async fn list_countries(&self) -> Result<Vec<Country>> {
        let response = self
            .client
            .get(&self.endpoint)
            .send()
            .await
            .map_err(|e| ChatError::network(format!("Country list request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(ChatError::network(format!(
                "Country list request returned {}",
                response.status()
            )));
        }

        let raw: Vec<RawCountry> = response
            .json()
            .await
            .map_err(|e| ChatError::network(format!("Invalid country list payload: {}", e)))?;

        let countries = to_countries(raw);
        debug!(count = countries.len(), "Fetched country list");
        Ok(countries)
    }
}

/// Keeps entries that have a dial root, joins root and first suffix, and
/// sorts by name.
fn to_countries(raw: Vec<RawCountry>) -> Vec<Country> {
    let mut countries: Vec<Country> = raw
        .into_iter()
        .filter_map(|entry| {
            let root = entry.idd.root.filter(|r| !r.is_empty())?;
            let suffix = entry.idd.suffixes.into_iter().next().unwrap_or_default();
            Some(Country::new(
                entry.cca2.unwrap_or_default(),
                format!("{}{}", root, suffix),
                entry.name.common,
            ))
        })
        .collect();
    countries.sort_by(|a, b| a.label.cmp(&b.label));
    countries
}
