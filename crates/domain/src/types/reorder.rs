//! Reorder-level job input, output and intermediate aggregates

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::constants::{DEFAULT_INVENTORY_TURNOVER_DAYS, DEFAULT_LOOK_BACK_DAYS};
use crate::errors::{Result, SuiteLinkError};
use crate::impl_text_enum_conversions;

/// Job request as received from the outer wrapper.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderJobRequest {
    pub look_back_days: Option<f64>,
    pub inventory_turnover_days: Option<f64>,
}

impl ReorderJobRequest {
    /// Apply defaults and reject non-positive or non-finite values.
    ///
    /// # Errors
    /// Returns `SuiteLinkError::InvalidInput` naming the offending parameter.
    pub fn validate(&self) -> Result<ReorderParams> {
        self.validate_with(ReorderParams::default())
    }

    /// Same as [`validate`](Self::validate) with caller-supplied defaults.
    ///
    /// # Errors
    /// Returns `SuiteLinkError::InvalidInput` naming the offending parameter.
    pub fn validate_with(&self, defaults: ReorderParams) -> Result<ReorderParams> {
        let look_back_days = positive("lookBackDays", self.look_back_days, defaults.look_back_days)?;
        let inventory_turnover_days = positive(
            "inventoryTurnoverDays",
            self.inventory_turnover_days,
            defaults.inventory_turnover_days,
        )?;
        Ok(ReorderParams { look_back_days, inventory_turnover_days })
    }
}

fn positive(name: &str, value: Option<f64>, default: f64) -> Result<f64> {
    match value {
        None => Ok(default),
        Some(v) if v.is_finite() && v > 0.0 => Ok(v),
        Some(v) => Err(SuiteLinkError::InvalidInput(format!("{name} must be a positive number, got {v}"))),
    }
}

/// Validated job parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderParams {
    pub look_back_days: f64,
    pub inventory_turnover_days: f64,
}

impl Default for ReorderParams {
    fn default() -> Self {
        Self {
            look_back_days: DEFAULT_LOOK_BACK_DAYS,
            inventory_turnover_days: DEFAULT_INVENTORY_TURNOVER_DAYS,
        }
    }
}

/// Line items grouped under one SKU (or item id when the SKU is absent).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LineItemAggregate {
    pub sku: Option<String>,
    pub item_id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub rate: Option<f64>,
    pub total_quantity: f64,
    pub total_amount: f64,
    pub line_count: usize,
}

/// Per-row failure collected while the job continues.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowError {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub error: String,
}

impl RowError {
    pub fn new(error: impl Into<String>) -> Self {
        Self { sku: None, item_id: None, name: None, error: error.into() }
    }
}

/// What the job did to an item row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemAction {
    Created,
    Updated,
}

impl_text_enum_conversions!(ItemAction {
    Created => "created",
    Updated => "updated",
});

/// Computation trace for one written item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDetail {
    pub sku: Option<String>,
    pub item_id: Option<String>,
    pub name: Option<String>,
    pub total_quantity: f64,
    pub line_count: usize,
    pub daily_average: f64,
    pub expected_sales: f64,
    pub reorder_level: i64,
    pub action: ItemAction,
}

/// Job outcome when no fatal error occurred.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderJobResult {
    pub updated: usize,
    pub errors: Vec<RowError>,
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_details: Option<Vec<ItemDetail>>,
}

impl ReorderJobResult {
    /// Result for a run that found nothing to process.
    pub fn empty(summary: impl Into<String>, errors: Vec<RowError>) -> Self {
        Self { updated: 0, errors, summary: summary.into(), item_details: None }
    }
}

/// Wrapper-facing response: HTTP-equivalent status plus JSON body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReorderJobResponse {
    pub success: bool,
    pub status: u16,
    pub body: Value,
}

impl ReorderJobResponse {
    /// Map a job outcome to the response the outer wrapper returns.
    ///
    /// Completed jobs are always 200; row errors only flip `success`.
    pub fn from_outcome(outcome: Result<ReorderJobResult>) -> Self {
        match outcome {
            Ok(result) => {
                let success = result.errors.is_empty();
                let mut body = serde_json::to_value(&result).unwrap_or_else(|_| json!({}));
                if let Value::Object(map) = &mut body {
                    map.insert("success".into(), Value::Bool(success));
                }
                Self { success, status: 200, body }
            }
            Err(err) => {
                let status = match &err {
                    SuiteLinkError::InvalidInput(_) => 400,
                    _ => 500,
                };
                let mut body = json!({ "success": false, "error": err.to_string() });
                if let SuiteLinkError::Persistence(failure) = &err {
                    body["code"] = json!(failure.code);
                    body["details"] = json!(failure.details);
                    body["hint"] = json!(failure.hint);
                }
                Self { success: false, status, body }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::PersistenceFailure;

    #[test]
    fn request_defaults_apply() {
        let params = ReorderJobRequest::default().validate().unwrap();
        assert_eq!(params, ReorderParams::default());
    }

    #[test]
    fn request_rejects_non_positive_values() {
        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let request = ReorderJobRequest { look_back_days: Some(bad), inventory_turnover_days: None };
            assert!(matches!(request.validate(), Err(SuiteLinkError::InvalidInput(_))));
        }
    }

    #[test]
    fn request_deserializes_camel_case() {
        let request: ReorderJobRequest =
            serde_json::from_str(r#"{"lookBackDays": 30, "inventoryTurnoverDays": 15.5}"#).unwrap();
        let params = request.validate().unwrap();
        assert!((params.look_back_days - 30.0).abs() < f64::EPSILON);
        assert!((params.inventory_turnover_days - 15.5).abs() < f64::EPSILON);
    }

    #[test]
    fn row_errors_yield_200_without_success() {
        let result = ReorderJobResult {
            updated: 2,
            errors: vec![RowError::new("write failed")],
            summary: "done".into(),
            item_details: None,
        };
        let response = ReorderJobResponse::from_outcome(Ok(result));
        assert_eq!(response.status, 200);
        assert!(!response.success);
        assert_eq!(response.body["updated"], 2);
        assert_eq!(response.body["errors"][0]["error"], "write failed");
        assert!(response.body.get("itemDetails").is_none());
    }

    #[test]
    fn fatal_errors_yield_500_with_diagnostics() {
        let err = SuiteLinkError::Persistence(PersistenceFailure::new("down").with_code("SQLITE_BUSY"));
        let response = ReorderJobResponse::from_outcome(Err(err));
        assert_eq!(response.status, 500);
        assert_eq!(response.body["code"], "SQLITE_BUSY");
    }

    #[test]
    fn invalid_input_yields_400() {
        let response =
            ReorderJobResponse::from_outcome(Err(SuiteLinkError::InvalidInput("lookBackDays".into())));
        assert_eq!(response.status, 400);
        assert_eq!(response.body["success"], false);
    }
}
