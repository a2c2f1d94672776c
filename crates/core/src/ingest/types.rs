use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FredObservation {
    pub date: String,
    pub value: String,
}

impl FredObservation {
    /// FRED reports missing observations as `"."`.
    pub fn value_f64(&self) -> Option<f64> {
        self.value.trim().parse::<f64>().ok().filter(|v| v.is_finite())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FredResponse {
    #[serde(default)]
    pub observations: Vec<FredObservation>,
}

/// One entry of ATTOM's `market/trend` response. Fields arrive as numbers or numeric strings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttomTrend {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub median_value: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub inventory_count: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub avg_days_on_market: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttomTrendResponse {
    #[serde(default)]
    pub market_trends: Vec<AttomTrend>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RedfinStats {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub median_sale_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub active_listings: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub median_days_on_market: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsArticle {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub url: String,
    pub published_at: String,
    pub source: NewsSource,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsSource {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewsResponse {
    #[serde(default)]
    pub articles: Vec<NewsArticle>,
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match v {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().replace(',', "").parse::<f64>().ok(),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fred_missing_value_is_none() {
        let obs = FredObservation {
            date: "2025-01-02".to_string(),
            value: ".".to_string(),
        };
        assert_eq!(obs.value_f64(), None);

        let obs = FredObservation {
            date: "2025-01-02".to_string(),
            value: "6.91".to_string(),
        };
        assert_eq!(obs.value_f64(), Some(6.91));
    }

    #[test]
    fn attom_trend_accepts_numbers_and_strings() {
        let v = json!({
            "marketTrends": [
                {"medianValue": "462,500", "inventoryCount": 3100, "avgDaysOnMarket": null}
            ]
        });
        let parsed: AttomTrendResponse = serde_json::from_value(v).unwrap();
        let trend = &parsed.market_trends[0];
        assert_eq!(trend.median_value, Some(462_500.0));
        assert_eq!(trend.inventory_count, Some(3100.0));
        assert_eq!(trend.avg_days_on_market, None);
    }

    #[test]
    fn redfin_stats_tolerate_missing_and_unknown_fields() {
        let v = json!({"active_listings": 2900, "region": "Las Vegas"});
        let parsed: RedfinStats = serde_json::from_value(v).unwrap();
        assert_eq!(parsed.active_listings, Some(2900.0));
        assert_eq!(parsed.median_sale_price, None);
    }
}
