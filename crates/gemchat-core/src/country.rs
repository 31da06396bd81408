//! Country dial-code list used by the login form.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Dial prefix selected when the list contains it.
pub const DEFAULT_DIAL_PREFIX: &str = "+91";

/// One entry of the country selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Country {
    /// ISO 3166-1 alpha-2 code, e.g. `"IN"`.
    pub code: String,
    /// Dial prefix including the plus sign, e.g. `"+91"`.
    pub dial_prefix: String,
    /// Human readable name.
    pub label: String,
}

impl Country {
    pub fn new(
        code: impl Into<String>,
        dial_prefix: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            dial_prefix: dial_prefix.into(),
            label: label.into(),
        }
    }
}

/// Built-in list used when the provider cannot be reached.
pub fn fallback_countries() -> Vec<Country> {
    vec![
        Country::new("IN", "+91", "India"),
        Country::new("GB", "+44", "UK"),
        Country::new("US", "+1", "USA"),
    ]
}

/// Source of the country list.
#[async_trait]
pub trait CountryProvider: Send + Sync {
    /// Returns countries ordered for display.
    async fn list_countries(&self) -> Result<Vec<Country>>;
}

/// Provider serving a fixed list.
#[derive(Debug, Clone)]
pub struct StaticCountryProvider {
    countries: Vec<Country>,
}

impl StaticCountryProvider {
    pub fn new(countries: Vec<Country>) -> Self {
        Self { countries }
    }
}

impl Default for StaticCountryProvider {
    fn default() -> Self {
        Self::new(fallback_countries())
    }
}

#[async_trait]
impl CountryProvider for StaticCountryProvider {
    async fn list_countries(&self) -> Result<Vec<Country>> {
        Ok(self.countries.clone())
    }
}
