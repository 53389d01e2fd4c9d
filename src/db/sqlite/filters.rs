//! Translation of list filters and sort intent into SQL
//!
//! Sort keys are a closed set so the ORDER BY clause is never built from
//! caller input. Every ordering ends with `name ASC` to keep results stable.

use rusqlite::types::Value;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    #[default]
    NameAsc,
    NameDesc,
    PopulationAsc,
    PopulationDesc,
    GdpAsc,
    GdpDesc,
}

impl SortKey {
    /// Parse a caller-supplied key, unknown or empty keys fall back to the default
    pub fn parse_or_default(raw: Option<&str>) -> Self {
        raw.and_then(|s| s.parse().ok()).unwrap_or_default()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::NameAsc => "name_asc",
            SortKey::NameDesc => "name_desc",
            SortKey::PopulationAsc => "population_asc",
            SortKey::PopulationDesc => "population_desc",
            SortKey::GdpAsc => "gdp_asc",
            SortKey::GdpDesc => "gdp_desc",
        }
    }

    /// ORDER BY clause; null GDP always sorts after real values
    pub fn order_by(&self) -> &'static str {
        match self {
            SortKey::NameAsc => "ORDER BY name ASC",
            SortKey::NameDesc => "ORDER BY name DESC",
            SortKey::PopulationAsc => "ORDER BY population ASC, name ASC",
            SortKey::PopulationDesc => "ORDER BY population DESC, name ASC",
            SortKey::GdpAsc => "ORDER BY estimated_gdp IS NULL ASC, estimated_gdp ASC, name ASC",
            SortKey::GdpDesc => "ORDER BY estimated_gdp IS NULL ASC, estimated_gdp DESC, name ASC",
        }
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "name_asc" => Ok(SortKey::NameAsc),
            "name_desc" => Ok(SortKey::NameDesc),
            "population_asc" => Ok(SortKey::PopulationAsc),
            "population_desc" => Ok(SortKey::PopulationDesc),
            "gdp_asc" => Ok(SortKey::GdpAsc),
            "gdp_desc" => Ok(SortKey::GdpDesc),
            other => Err(format!("Unknown sort key: {}", other)),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// List query descriptor
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountryFilters {
    pub region: Option<String>,
    pub currency: Option<String>,
    pub sort: SortKey,
}

impl CountryFilters {
    /// Build filters from raw request values.
    ///
    /// Blank values impose no constraint. Region is case-folded to match the
    /// stored form.
    pub fn new(region: Option<&str>, currency: Option<&str>, sort: Option<&str>) -> Self {
        let non_blank = |v: Option<&str>| {
            v.map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        Self {
            region: non_blank(region).map(|r| r.to_lowercase()),
            currency: non_blank(currency),
            sort: SortKey::parse_or_default(sort),
        }
    }

    /// WHERE clause (possibly empty) and its bound parameters
    pub fn where_clause(&self) -> (String, Vec<Value>) {
        let mut clauses = Vec::new();
        let mut params = Vec::new();

        if let Some(region) = &self.region {
            clauses.push("region = ?");
            params.push(Value::Text(region.clone()));
        }
        if let Some(currency) = &self.currency {
            clauses.push("currency_code = ? COLLATE NOCASE");
            params.push(Value::Text(currency.clone()));
        }

        if clauses.is_empty() {
            (String::new(), params)
        } else {
            (format!("WHERE {}", clauses.join(" AND ")), params)
        }
    }
}
