//! Summary artifact rendering
//!
//! Produces a self-contained SVG card: total country count, the top countries
//! by estimated GDP and the time of the last refresh.

use crate::db::sqlite::models::SummarySnapshot;

const WIDTH: u32 = 1000;
const HEIGHT: u32 = 700;
const PADDING: u32 = 50;
const ROW_HEIGHT: u32 = 60;

pub const CONTENT_TYPE: &str = "image/svg+xml";

/// Render the snapshot as an SVG document
pub fn render_summary(snapshot: &SummarySnapshot) -> String {
    let refreshed = snapshot
        .last_refreshed_at
        .map(|ts| ts.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "never".to_string());

    let mut rows = String::new();
    for (rank, country) in snapshot.top_by_gdp.iter().enumerate() {
        let y = 300 + rank as u32 * ROW_HEIGHT;
        let gdp = country
            .estimated_gdp
            .map(format_amount)
            .unwrap_or_else(|| "n/a".to_string());

        rows.push_str(&format!(
            r##"  <text x="{x}" y="{y}" class="rank">{rank}.</text>
  <text x="{name_x}" y="{y}" class="name">{name}</text>
  <text x="{gdp_x}" y="{y}" class="gdp" text-anchor="end">{gdp}</text>
"##,
            x = PADDING + 40,
            name_x = PADDING + 90,
            gdp_x = WIDTH - PADDING - 40,
            y = y,
            rank = rank + 1,
            name = escape_xml(&title_case(&country.name)),
            gdp = escape_xml(&gdp),
        ));
    }

    if snapshot.top_by_gdp.is_empty() {
        rows.push_str(&format!(
            "  <text x=\"{}\" y=\"300\" class=\"name\">No countries stored yet</text>\n",
            PADDING + 40
        ));
    }

    format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">
  <style>
    .title {{ font: bold 34px sans-serif; fill: #ffffff; }}
    .label {{ font: 20px sans-serif; fill: #555555; }}
    .value {{ font: bold 26px sans-serif; fill: #1f3f73; }}
    .rank {{ font: bold 22px sans-serif; fill: #1f3f73; }}
    .name {{ font: 22px sans-serif; fill: #222222; }}
    .gdp {{ font: 22px monospace; fill: #222222; }}
  </style>
  <rect width="{w}" height="{h}" fill="#e8eef7"/>
  <rect x="{p}" y="{p}" width="{box_w}" height="{box_h}" rx="15" fill="#ffffff" stroke="#cccccc" stroke-width="2"/>
  <rect x="{p}" y="{p}" width="{box_w}" height="90" rx="15" fill="#3366b3"/>
  <text x="{title_x}" y="{title_y}" class="title">Country Summary</text>
  <text x="{col_x}" y="190" class="label">Total countries</text>
  <text x="{col_x}" y="225" class="value">{total}</text>
  <text x="{col2_x}" y="190" class="label">Last refreshed</text>
  <text x="{col2_x}" y="225" class="value">{refreshed}</text>
  <text x="{col_x}" y="265" class="label">Top {count} by estimated GDP</text>
{rows}</svg>
"##,
        w = WIDTH,
        h = HEIGHT,
        p = PADDING,
        box_w = WIDTH - 2 * PADDING,
        box_h = HEIGHT - 2 * PADDING,
        title_x = PADDING + 40,
        title_y = PADDING + 58,
        col_x = PADDING + 40,
        col2_x = WIDTH / 2,
        total = snapshot.total_countries,
        refreshed = escape_xml(&refreshed),
        count = snapshot.top_by_gdp.len(),
        rows = rows,
    )
}

/// Group an amount with thousands separators, two decimals
fn format_amount(value: f64) -> String {
    let formatted = format!("{:.2}", value.abs());
    let (int_part, frac_part) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, frac_part)
}

fn title_case(name: &str) -> String {
    name.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn escape_xml(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::models::CountryRecord;
    use chrono::{TimeZone, Utc};

    fn country(name: &str, gdp: Option<f64>) -> CountryRecord {
        CountryRecord {
            id: Some(1),
            name: name.to_string(),
            capital: None,
            region: None,
            population: 10,
            currency_code: None,
            exchange_rate: None,
            estimated_gdp: gdp,
            flag_url: None,
            last_refreshed_at: Utc::now(),
        }
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(0.0), "0.00");
        assert_eq!(format_amount(999.5), "999.50");
        assert_eq!(format_amount(1234567.891), "1,234,567.89");
        assert_eq!(format_amount(-1000.0), "-1,000.00");
    }

    #[test]
    fn test_render_contains_snapshot_data() {
        let snapshot = SummarySnapshot {
            total_countries: 250,
            top_by_gdp: vec![
                country("united states of america", Some(25_000_000.0)),
                country("trinidad & tobago", None),
            ],
            last_refreshed_at: Some(Utc.with_ymd_and_hms(2025, 10, 22, 8, 30, 0).unwrap()),
        };

        let svg = render_summary(&snapshot);
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains(">250<"));
        assert!(svg.contains("United States Of America"));
        assert!(svg.contains("Trinidad &amp; Tobago"));
        assert!(svg.contains("25,000,000.00"));
        assert!(svg.contains("n/a"));
        assert!(svg.contains("2025-10-22 08:30:00 UTC"));
        assert!(svg.contains("Top 2 by estimated GDP"));
    }

    #[test]
    fn test_render_empty_snapshot() {
        let snapshot = SummarySnapshot {
            total_countries: 0,
            top_by_gdp: Vec::new(),
            last_refreshed_at: None,
        };

        let svg = render_summary(&snapshot);
        assert!(svg.contains("No countries stored yet"));
        assert!(svg.contains("never"));
    }
}
