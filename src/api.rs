//! HTTP API for the calculator UI
//!
//! Every request decodes its own InputState from the share-link query
//! parameters, so handlers share no state.
//!
//! - `GET /api/health`
//! - `GET /api/contracts`
//! - `GET /api/prop-firms`
//! - `GET /api/metrics?<share params>`
//! - `GET /api/presets/{style}?<share params>`
//! - `GET /api/prop-firms/{key}?<share params>`

use axum::{
    extract::{Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;

use crate::contracts::{self, Instrument};
use crate::engine::{compute_metrics, DerivedMetrics};
use crate::format::{format_currency, format_horizon, format_percentage, format_r_ratio};
use crate::presets::{self, PropFirm, PropFirmRules, TargetStyle};
use crate::share::{self, ParamSet};
use crate::state::InputState;

/// Body shared by the metrics and preset endpoints
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsResponse {
    pub state: InputState,
    pub metrics: DerivedMetrics,
    /// Validation messages; metrics are still computed when non-empty
    pub errors: Vec<String>,
    /// Share-link query string for `state`
    pub query: String,
    pub summary: MetricsSummary,
}

/// Display strings for the headline numbers
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSummary {
    pub win_rate: String,
    pub r_ratio: String,
    pub expectancy: String,
    pub net_daily_total: String,
    pub weekly_net_total: String,
    pub monthly_net_total: String,
    pub days_to_target: String,
    pub risk_of_ruin: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropFirmEntry {
    pub key: &'static str,
    #[serde(flatten)]
    pub rules: PropFirmRules,
}

pub fn router() -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/contracts", get(get_contracts))
        .route("/api/prop-firms", get(get_prop_firms))
        .route("/api/prop-firms/{key}", get(apply_prop_firm))
        .route("/api/metrics", get(get_metrics))
        .route("/api/presets/{style}", get(apply_target_style))
}

fn metrics_response(state: InputState) -> MetricsResponse {
    let instrument: &Instrument = state
        .instrument()
        .unwrap_or_else(|_| contracts::default_instrument());
    let metrics = compute_metrics(&state, instrument);

    let summary = MetricsSummary {
        win_rate: format_percentage(metrics.win_rate * 100.0, 1),
        r_ratio: format_r_ratio(metrics.r_value),
        expectancy: format_currency(metrics.expectancy),
        net_daily_total: format_currency(metrics.net_daily_gain_total),
        weekly_net_total: format_currency(metrics.weekly_net_total),
        monthly_net_total: format_currency(metrics.monthly_net_total),
        days_to_target: format_horizon(metrics.days_to_target_all_accounts),
        risk_of_ruin: format_percentage(metrics.risk_of_ruin * 100.0, 2),
    };

    MetricsResponse {
        errors: state.validate(),
        query: share::encode(&state).to_query_string(),
        state,
        metrics,
        summary,
    }
}

fn bad_request(message: String) -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({ "error": message })),
    )
}

/// GET /api/health
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// GET /api/contracts - Instrument registry
pub async fn get_contracts() -> impl IntoResponse {
    let contracts: Vec<&Instrument> = contracts::all().collect();
    Json(serde_json::json!({ "contracts": contracts }))
}

/// GET /api/prop-firms - Evaluation presets
pub async fn get_prop_firms() -> impl IntoResponse {
    let firms: Vec<PropFirmEntry> = PropFirm::all()
        .map(|firm| PropFirmEntry {
            key: firm.key(),
            rules: firm.rules(),
        })
        .collect();
    Json(serde_json::json!({ "propFirms": firms }))
}

/// GET /api/metrics - Compute metrics for a share-link state
pub async fn get_metrics(Query(params): Query<ParamSet>) -> impl IntoResponse {
    let state = share::decode(&params);
    (StatusCode::OK, Json(serde_json::json!(metrics_response(state))))
}

/// GET /api/presets/{style} - Apply a target preset, then compute
pub async fn apply_target_style(
    Path(style): Path<String>,
    Query(params): Query<ParamSet>,
) -> impl IntoResponse {
    let style: TargetStyle = match style.parse() {
        Ok(style) => style,
        Err(e) => return bad_request(e.to_string()),
    };

    let mut state = share::decode(&params);
    let instrument = state
        .instrument()
        .unwrap_or_else(|_| contracts::default_instrument());
    presets::apply_target_preset(style, &mut state, instrument);

    (StatusCode::OK, Json(serde_json::json!(metrics_response(state))))
}

/// GET /api/prop-firms/{key} - Apply a prop firm preset, then compute
pub async fn apply_prop_firm(
    Path(key): Path<String>,
    Query(params): Query<ParamSet>,
) -> impl IntoResponse {
    let firm: PropFirm = match key.parse() {
        Ok(firm) => firm,
        Err(e) => return bad_request(e.to_string()),
    };

    let mut state = share::decode(&params);
    presets::apply_prop_firm_preset(firm, &mut state);

    (StatusCode::OK, Json(serde_json::json!(metrics_response(state))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    async fn get_json(uri: &str) -> (StatusCode, serde_json::Value) {
        let response = router()
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = get_json("/api/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_contracts_listed() {
        let (status, body) = get_json("/api/contracts").await;
        assert_eq!(status, StatusCode::OK);
        let contracts = body["contracts"].as_array().unwrap();
        assert_eq!(contracts.len(), 12);
        assert_eq!(contracts[0]["symbol"], "MNQ");
        assert_eq!(contracts[0]["tickValue"], 0.5);
    }

    #[tokio::test]
    async fn test_prop_firms_listed() {
        let (_, body) = get_json("/api/prop-firms").await;
        let firms = body["propFirms"].as_array().unwrap();
        assert_eq!(firms.len(), 18);
        assert_eq!(firms[0]["key"], "custom");
        assert!(firms.iter().all(|f| f["maxDrawdown"].is_number()));
    }

    #[tokio::test]
    async fn test_metrics_default_state() {
        let (status, body) = get_json("/api/metrics").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["state"]["contract"], "MNQ");
        assert_eq!(body["metrics"]["totalTrades"], 4);
        assert_eq!(body["summary"]["netDailyTotal"], "$46.60");
        assert_eq!(body["summary"]["rRatio"], "1.76:1");
        assert!(body["errors"].as_array().unwrap().is_empty());
        assert!(body["query"].as_str().unwrap().starts_with("c=MNQ"));
    }

    #[tokio::test]
    async fn test_metrics_with_accounts() {
        let (_, body) = get_json("/api/metrics?c=MNQ&wt=2&lt=2&tg=120&tl=68&na=5").await;
        assert_eq!(body["summary"]["netDailyTotal"], "$233.00");
        assert_eq!(body["summary"]["weeklyNetTotal"], "$1,165.00");
    }

    #[tokio::test]
    async fn test_malformed_params_fall_back() {
        let (status, body) = get_json("/api/metrics?tg=-5&nc=0&c=XYZ").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["state"]["ticksGained"], 120.0);
        assert_eq!(body["state"]["numContracts"], 1);
        assert_eq!(body["state"]["contract"], "MNQ");
        assert!(body["errors"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_target_preset_applied() {
        let (status, body) = get_json("/api/presets/conservative?nc=3").await;
        assert_eq!(status, StatusCode::OK);
        let legs = body["state"]["targets"]["legs"].as_array().unwrap();
        assert_eq!(legs[0]["contracts"], 2);
        assert_eq!(legs[0]["points"], 17.0);
        assert_eq!(legs[2]["contracts"], 1);
        assert_eq!(body["metrics"]["totalTargetContracts"], 3);
    }

    #[tokio::test]
    async fn test_unknown_style_rejected() {
        let (status, body) = get_json("/api/presets/yolo").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("yolo"));
    }

    #[tokio::test]
    async fn test_prop_firm_preset_applied() {
        let (status, body) = get_json("/api/prop-firms/topstep_50k").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["state"]["propFirm"], "topstep_50k");
        assert_eq!(body["state"]["profitTarget"], 3000.0);
        assert_eq!(body["state"]["maxDrawdown"], 2000.0);
    }

    #[tokio::test]
    async fn test_unknown_prop_firm_rejected() {
        let (status, _) = get_json("/api/prop-firms/nope").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
