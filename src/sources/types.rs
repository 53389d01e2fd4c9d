//! Upstream payload shapes

use serde::Deserialize;
use std::collections::HashMap;

/// One entry of the country directory
#[derive(Debug, Clone, Deserialize)]
pub struct CountryPayload {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub capital: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    pub population: u64,
    #[serde(default, rename = "flag")]
    pub flag_url: Option<String>,
    #[serde(default)]
    pub currencies: Option<Vec<CurrencyPayload>>,
}

impl CountryPayload {
    /// Code of the first listed currency, the only one used for rate lookup
    pub fn primary_currency(&self) -> Option<&str> {
        self.currencies
            .as_ref()?
            .first()?
            .code
            .as_deref()
            .map(str::trim)
            .filter(|code| !code.is_empty())
    }

    /// True when the directory lists no currency at all
    pub fn has_no_currencies(&self) -> bool {
        self.currencies.as_ref().map_or(true, |c| c.is_empty())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CurrencyPayload {
    #[serde(default)]
    pub code: Option<String>,
}

/// Exchange rate directory, rates are quoted against a single base currency
#[derive(Debug, Clone, Deserialize)]
pub struct RatesPayload {
    #[serde(default)]
    pub rates: Option<HashMap<String, f64>>,
}
