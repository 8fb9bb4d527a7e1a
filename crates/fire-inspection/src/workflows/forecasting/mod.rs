//! Deterministic short-horizon forecasts for planning: incident volume, resource consumption,
//! and training priorities. Three-point linear extrapolation only.

mod history;

use std::collections::BTreeMap;

use axum::{http::StatusCode, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

pub use history::{HistoryImportError, HistoryImporter};

/// Fixed confidence figure reported with incident predictions.
pub const INCIDENT_CONFIDENCE: u8 = 75;
/// Fixed confidence figure reported with resource predictions.
pub const RESOURCE_CONFIDENCE: u8 = 70;
const RESOURCE_BUFFER: f64 = 1.1;
const TRAINING_SLOTS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Stable,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IncidentPrediction {
    pub category: String,
    /// Average month-over-month change across the last three months.
    pub trend: f64,
    pub predicted_count: u32,
    pub direction: TrendDirection,
    pub confidence: u8,
}

/// Predict next month's count per category from its last three monthly totals.
///
/// Categories with fewer than three points are omitted. Output is ordered by category.
pub fn forecast_incident_counts(series: &BTreeMap<String, Vec<u32>>) -> Vec<IncidentPrediction> {
    series
        .iter()
        .filter_map(|(category, counts)| {
            let [c0, _, c2] = match counts.len() {
                len if len >= 3 => [counts[len - 3], counts[len - 2], counts[len - 1]],
                _ => return None,
            };
            let trend = (f64::from(c2) - f64::from(c0)) / 2.0;
            let predicted = (f64::from(c2) + trend)
                .round()
                .clamp(0.0, f64::from(u32::MAX));
            let direction = if trend > 0.0 {
                TrendDirection::Increasing
            } else if trend < 0.0 {
                TrendDirection::Decreasing
            } else {
                TrendDirection::Stable
            };
            Some(IncidentPrediction {
                category: category.clone(),
                trend,
                predicted_count: predicted as u32,
                direction,
                confidence: INCIDENT_CONFIDENCE,
            })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceUsage {
    pub resource_type: String,
    pub avg_monthly_usage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourcePrediction {
    pub resource_type: String,
    pub avg_monthly_usage: f64,
    pub predicted_need: f64,
    pub confidence: u8,
}

/// Average usage plus a ten percent buffer, rounded to a whole unit.
pub fn forecast_resource_need(usage: &[ResourceUsage]) -> Vec<ResourcePrediction> {
    usage
        .iter()
        .map(|entry| ResourcePrediction {
            resource_type: entry.resource_type.clone(),
            avg_monthly_usage: entry.avg_monthly_usage,
            predicted_need: (entry.avg_monthly_usage * RESOURCE_BUFFER).round(),
            confidence: RESOURCE_CONFIDENCE,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentFrequency {
    pub category: String,
    pub count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrainingPriority {
    High,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrainingRecommendation {
    pub category: String,
    pub incident_count: u64,
    pub recommended_training: &'static str,
    pub priority: TrainingPriority,
}

pub fn training_topics(category: &str) -> &'static str {
    match category.trim().to_ascii_lowercase().as_str() {
        "fire" => "Fire Safety Basics, Advanced Firefighting",
        "medical" => "Emergency Medical Response, First Aid/CPR",
        "rescue" => "Advanced Rescue Techniques, Vehicle Extrication",
        "other" => "Incident Command System",
        _ => "General Emergency Response",
    }
}

/// Training for the three most frequent incident categories, highest count first.
pub fn recommend_training(frequencies: &[IncidentFrequency]) -> Vec<TrainingRecommendation> {
    let mut ranked: Vec<&IncidentFrequency> = frequencies.iter().collect();
    ranked.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.category.cmp(&b.category))
    });
    ranked
        .into_iter()
        .take(TRAINING_SLOTS)
        .map(|entry| TrainingRecommendation {
            category: entry.category.clone(),
            incident_count: entry.count,
            recommended_training: training_topics(&entry.category),
            priority: TrainingPriority::High,
        })
        .collect()
}

/// Total incidents per category across the whole series, widened so long histories cannot
/// overflow.
pub fn incident_frequencies(series: &BTreeMap<String, Vec<u32>>) -> Vec<IncidentFrequency> {
    series
        .iter()
        .map(|(category, counts)| IncidentFrequency {
            category: category.clone(),
            count: counts.iter().map(|&count| u64::from(count)).sum(),
        })
        .collect()
}

/// Historical aggregates supplied for a planning run.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ForecastInput {
    #[serde(default)]
    pub incidents: BTreeMap<String, Vec<u32>>,
    #[serde(default)]
    pub resources: Vec<ResourceUsage>,
    /// Derived from `incidents` when empty.
    #[serde(default)]
    pub incident_frequency: Vec<IncidentFrequency>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastSummary {
    pub incidents: Vec<IncidentPrediction>,
    pub resources: Vec<ResourcePrediction>,
    pub training: Vec<TrainingRecommendation>,
}

impl ForecastSummary {
    pub fn build(input: &ForecastInput) -> Self {
        let training = if input.incident_frequency.is_empty() {
            recommend_training(&incident_frequencies(&input.incidents))
        } else {
            recommend_training(&input.incident_frequency)
        };
        Self {
            incidents: forecast_incident_counts(&input.incidents),
            resources: forecast_resource_need(&input.resources),
            training,
        }
    }
}

/// `POST /api/v1/forecast`.
pub fn forecast_router() -> Router {
    Router::new().route("/api/v1/forecast", post(forecast_handler))
}

async fn forecast_handler(Json(input): Json<ForecastInput>) -> (StatusCode, Json<ForecastSummary>) {
    (StatusCode::OK, Json(ForecastSummary::build(&input)))
}
