use crate::domain::errors::PricingError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Hold-out evaluation of a freshly trained model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingMetrics {
    pub mse: f64,
    pub rmse: f64,
    pub r2_score: f64,
    pub trained_at: DateTime<Utc>,
}

impl TrainingMetrics {
    pub fn evaluate(predictions: &[f64], actuals: &[f64], trained_at: DateTime<Utc>) -> Self {
        let mse = mean_squared_error(predictions, actuals);
        Self {
            mse,
            rmse: mse.sqrt(),
            r2_score: r2_score(predictions, actuals),
            trained_at,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.mse.is_finite() && self.rmse.is_finite() && self.r2_score.is_finite()
    }
}

/// JSON shape of a training attempt: the metrics, or `{"error": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TrainingReport {
    Completed(TrainingMetrics),
    Failed { error: String },
}

impl From<&Result<TrainingMetrics, PricingError>> for TrainingReport {
    fn from(result: &Result<TrainingMetrics, PricingError>) -> Self {
        match result {
            Ok(metrics) => TrainingReport::Completed(metrics.clone()),
            Err(e) => TrainingReport::Failed {
                error: e.to_string(),
            },
        }
    }
}

pub fn mean_squared_error(predictions: &[f64], actuals: &[f64]) -> f64 {
    if predictions.is_empty() {
        return f64::NAN;
    }
    let sq_err: f64 = predictions
        .iter()
        .zip(actuals.iter())
        .map(|(p, t)| (p - t).powi(2))
        .sum();
    sq_err / predictions.len() as f64
}

/// Coefficient of determination. A constant target scores 1.0 when matched
/// exactly and 0.0 otherwise.
pub fn r2_score(predictions: &[f64], actuals: &[f64]) -> f64 {
    if actuals.is_empty() {
        return f64::NAN;
    }
    let mean_y = actuals.iter().sum::<f64>() / actuals.len() as f64;
    let ss_tot: f64 = actuals.iter().map(|t| (t - mean_y).powi(2)).sum();
    let ss_res: f64 = predictions
        .iter()
        .zip(actuals.iter())
        .map(|(p, t)| (t - p).powi(2))
        .sum();

    if ss_tot > 0.0 {
        1.0 - ss_res / ss_tot
    } else if ss_res == 0.0 {
        1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfect_predictions() {
        let y = vec![1.0, 2.0, 3.0, 4.0];
        let metrics = TrainingMetrics::evaluate(&y, &y, Utc::now());
        assert_eq!(metrics.mse, 0.0);
        assert_eq!(metrics.rmse, 0.0);
        assert_eq!(metrics.r2_score, 1.0);
    }

    #[test]
    fn test_mean_predictor_scores_zero_r2() {
        let actuals = vec![1.0, 2.0, 3.0, 4.0];
        let predictions = vec![2.5; 4];
        assert!(r2_score(&predictions, &actuals).abs() < 1e-12);
        assert!((mean_squared_error(&predictions, &actuals) - 1.25).abs() < 1e-12);
    }

    #[test]
    fn test_report_shapes() {
        let ok: Result<TrainingMetrics, PricingError> =
            Ok(TrainingMetrics::evaluate(&[1.0, 2.0], &[1.0, 3.0], Utc::now()));
        let json = serde_json::to_value(TrainingReport::from(&ok)).unwrap();
        assert!(json.get("rmse").is_some());
        assert!(json.get("r2_score").is_some());
        assert!(json.get("trained_at").unwrap().is_string());

        let failed: Result<TrainingMetrics, PricingError> =
            Err(PricingError::training("no samples"));
        let json = serde_json::to_value(TrainingReport::from(&failed)).unwrap();
        assert_eq!(json["error"], "Training failed: no samples");
        assert!(json.get("rmse").is_none());
    }
}
