//! Country selector data with offline fallback.

use tracing::warn;

use gemchat_core::country::{Country, CountryProvider, DEFAULT_DIAL_PREFIX, fallback_countries};

/// Loaded country list plus the default selection.
#[derive(Debug, Clone)]
pub struct CountryCatalog {
    countries: Vec<Country>,
    from_fallback: bool,
}

impl CountryCatalog {
    /// Fetches from `provider`; any failure or an empty list yields the
    /// built-in set.
    pub async fn load(provider: &dyn CountryProvider) -> Self {
        match provider.list_countries().await {
            Ok(countries) if !countries.is_empty() => Self {
                countries,
                from_fallback: false,
            },
            Ok(_) => {
                warn!("Country provider returned an empty list, using fallback");
                Self::fallback()
            }
            Err(e) => {
                warn!(error = %e, "Country list unavailable, using fallback");
                Self::fallback()
            }
        }
    }

    pub fn fallback() -> Self {
        Self {
            countries: fallback_countries(),
            from_fallback: true,
        }
    }

    pub fn countries(&self) -> &[Country] {
        &self.countries
    }

    pub fn is_fallback(&self) -> bool {
        self.from_fallback
    }

    /// The `+91` entry when present, otherwise the first entry.
    pub fn default_country(&self) -> Option<&Country> {
        self.find_by_dial_prefix(DEFAULT_DIAL_PREFIX)
            .or_else(|| self.countries.first())
    }

    pub fn find_by_dial_prefix(&self, dial_prefix: &str) -> Option<&Country> {
        self.countries.iter().find(|c| c.dial_prefix == dial_prefix)
    }
}
