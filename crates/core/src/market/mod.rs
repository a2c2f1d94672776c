//! Consolidated market figures and the fixed region / zip code scope of the dashboard.

use crate::ingest::types::{AttomTrend, RedfinStats};
use crate::series::select_latest_with_fallback;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const REGIONS: [&str; 5] = ["Las Vegas", "Summerlin", "Henderson", "Southwest", "Enterprise"];

pub const TRACKED_ZIP_CODES: [&str; 4] = ["89148", "89141", "89044", "89135"];

pub const METRO: &str = "Las Vegas";
pub const STATE: &str = "NV";

pub fn is_tracked_zip(zip: &str) -> bool {
    TRACKED_ZIP_CODES.contains(&zip)
}

/// The tracked region spelled as stored, matched case-insensitively.
pub fn canonical_region(region: &str) -> Option<&'static str> {
    let region = region.trim();
    REGIONS.iter().copied().find(|r| r.eq_ignore_ascii_case(region))
}

/// Values used when no provider reports a figure.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketDefaults {
    pub median_price: f64,
    pub inventory: f64,
    pub days_on_market: f64,
}

impl Default for MarketDefaults {
    fn default() -> Self {
        Self {
            median_price: 462_000.0,
            inventory: 3_450.0,
            days_on_market: 42.0,
        }
    }
}

impl MarketDefaults {
    pub fn from_env() -> Self {
        let mut out = Self::default();

        if let Some(v) = env_f64("HOMEWATCH_DEFAULT_MEDIAN_PRICE") {
            out.median_price = v;
        }
        if let Some(v) = env_f64("HOMEWATCH_DEFAULT_INVENTORY") {
            out.inventory = v;
        }
        if let Some(v) = env_f64("HOMEWATCH_DEFAULT_DOM") {
            out.days_on_market = v;
        }

        out
    }
}

fn env_f64(key: &str) -> Option<f64> {
    std::env::var(key).ok().and_then(|s| s.parse::<f64>().ok())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub median_price: f64,
    pub inventory: f64,
    pub days_on_market: f64,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricName {
    MedianSalePrice,
    Inventory,
    DaysOnMarket,
}

impl MetricName {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MedianSalePrice => "median_sale_price",
            Self::Inventory => "inventory",
            Self::DaysOnMarket => "days_on_market",
        }
    }
}

// Providers report 0 when they have nothing for a location.
fn reported(v: Option<f64>) -> Option<f64> {
    v.filter(|x| x.is_finite() && *x != 0.0)
}

fn median_price_candidates(attom: Option<&AttomTrend>, redfin: Option<&RedfinStats>) -> [Option<f64>; 2] {
    [
        reported(attom.and_then(|a| a.median_value)),
        reported(redfin.and_then(|r| r.median_sale_price)),
    ]
}

fn inventory_candidates(attom: Option<&AttomTrend>, redfin: Option<&RedfinStats>) -> [Option<f64>; 2] {
    [
        reported(redfin.and_then(|r| r.active_listings)),
        reported(attom.and_then(|a| a.inventory_count)),
    ]
}

fn dom_candidates(attom: Option<&AttomTrend>, redfin: Option<&RedfinStats>) -> [Option<f64>; 2] {
    [
        reported(redfin.and_then(|r| r.median_days_on_market)),
        reported(attom.and_then(|a| a.avg_days_on_market)),
    ]
}

/// Headline figures for the metro: price prefers ATTOM, inventory and days on market prefer
/// Redfin, and anything neither provider reports comes from `defaults`.
pub fn consolidate_snapshot(
    attom: Option<&AttomTrend>,
    redfin: Option<&RedfinStats>,
    defaults: &MarketDefaults,
    date: NaiveDate,
) -> MarketSnapshot {
    MarketSnapshot {
        median_price: select_latest_with_fallback(
            median_price_candidates(attom, redfin),
            defaults.median_price,
        ),
        inventory: select_latest_with_fallback(
            inventory_candidates(attom, redfin),
            defaults.inventory,
        ),
        days_on_market: select_latest_with_fallback(
            dom_candidates(attom, redfin),
            defaults.days_on_market,
        ),
        date,
    }
}

/// Zip-level figures use the same precedence but no defaults: a metric no provider reports is
/// left out.
pub fn zip_metrics(attom: Option<&AttomTrend>, redfin: Option<&RedfinStats>) -> Vec<(MetricName, f64)> {
    let inventory = inventory_candidates(attom, redfin).into_iter().flatten().next();
    let dom = dom_candidates(attom, redfin).into_iter().flatten().next();

    [(MetricName::Inventory, inventory), (MetricName::DaysOnMarket, dom)]
        .into_iter()
        .filter_map(|(name, value)| value.map(|v| (name, v)))
        .collect()
}

/// Per-region Zillow metrics kept in their own tables, each charted across [`REGIONS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RegionMetric {
    Zhvi,
    Zori,
    NewListings,
    SalesCount,
    PriceCuts,
    Forecast,
}

impl RegionMetric {
    pub fn table(self) -> &'static str {
        match self {
            Self::Zhvi => "zillow_home_value_index",
            Self::Zori => "zillow_rent_index",
            Self::NewListings => "zillow_new_listings",
            Self::SalesCount => "zillow_sales_count",
            Self::PriceCuts => "zillow_price_cuts",
            Self::Forecast => "zillow_forecast",
        }
    }

    /// Suffix appended to the region name when several metrics share one chart table.
    pub fn field_suffix(self) -> &'static str {
        match self {
            Self::Zhvi => "zhvi",
            Self::Zori => "zori",
            Self::NewListings => "newListings",
            Self::SalesCount => "salesCount",
            Self::PriceCuts => "priceCuts",
            Self::Forecast => "forecast",
        }
    }

    pub fn field_for(self, region: &str) -> String {
        format!("{region}_{}", self.field_suffix())
    }
}
