mod cli;

pub use cli::{Cli, run_cli};

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    extract::{
        Json, Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::core::{CalculationInput, CalculationResult, InvalidInputError, compute};
use crate::profile::{InMemoryProfileStore, Profile, ProfileStore};
use crate::scenario::{Baseline, BreakdownRow, Comparison, Scenario, write_comparison_csv};
use cli::{InputArgs, build_inputs, default_input_args};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiBaseline {
    #[serde(alias = "noEv", alias = "no_ev", alias = "ev")]
    NoEv,
    #[serde(alias = "noOtherSacrifice", alias = "no_other_sacrifice", alias = "other")]
    NoOtherSacrifice,
    #[serde(alias = "noSacrifice", alias = "no_sacrifice", alias = "all")]
    NoSacrifice,
}

impl From<ApiBaseline> for Baseline {
    fn from(value: ApiBaseline) -> Self {
        match value {
            ApiBaseline::NoEv => Baseline::NoEv,
            ApiBaseline::NoOtherSacrifice => Baseline::NoOtherSacrifice,
            ApiBaseline::NoSacrifice => Baseline::NoSacrifice,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct CalculatePayload {
    /// Saved profile to start from; explicit fields below still win.
    session: Option<String>,

    #[serde(alias = "salary", alias = "gross")]
    base_salary: Option<f64>,
    bonus: Option<f64>,
    employee_pension_pct: Option<f64>,
    employer_pension_pct: Option<f64>,
    pension_applies_to_bonus: Option<bool>,
    #[serde(alias = "lease")]
    ev_lease_monthly: Option<f64>,
    #[serde(alias = "p11d")]
    ev_p11d_value: Option<f64>,
    other_sacrifice_monthly: Option<f64>,
    #[serde(alias = "children")]
    num_children: Option<u32>,

    baseline: Option<ApiBaseline>,
}

#[derive(Debug)]
struct ApiRequest {
    input: CalculationInput,
    baseline: Baseline,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CalculateResponse {
    input: CalculationInput,
    result: CalculationResult,
    take_home_monthly: f64,
    in_allowance_taper: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CompareResponse {
    scenario_a: Scenario,
    scenario_b: Scenario,
    take_home_difference_annual: f64,
    effective_monthly_cost: f64,
    gross_monthly_sacrifice: f64,
    tax_relief_monthly: f64,
    rows: Vec<BreakdownRow>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<&'static str>,
}

#[derive(Clone)]
pub struct AppState {
    profiles: Arc<dyn ProfileStore>,
}

impl AppState {
    pub fn new(profiles: Arc<dyn ProfileStore>) -> Self {
        Self { profiles }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Arc::new(InMemoryProfileStore::new()))
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/calculate",
            get(calculate_get_handler).post(calculate_post_handler),
        )
        .route(
            "/api/compare",
            get(compare_get_handler).post(compare_post_handler),
        )
        .route(
            "/api/compare.csv",
            get(compare_csv_get_handler).post(compare_csv_post_handler),
        )
        .route(
            "/api/profile/:session",
            get(profile_get_handler).put(profile_put_handler),
        )
        .fallback(not_found_handler)
        .with_state(state)
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = router(AppState::default());

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "take-home HTTP API listening");
    info!("Local access: http://127.0.0.1:{port}/api/calculate");

    axum::serve(listener, app).await
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found", None)
}

async fn calculate_get_handler(
    State(state): State<AppState>,
    payload: Result<Query<CalculatePayload>, QueryRejection>,
) -> Response {
    match from_query(payload) {
        Ok(payload) => calculate_handler_impl(&state, payload),
        Err(response) => response,
    }
}

async fn calculate_post_handler(
    State(state): State<AppState>,
    payload: Result<Json<CalculatePayload>, JsonRejection>,
) -> Response {
    match from_json(payload) {
        Ok(payload) => calculate_handler_impl(&state, payload),
        Err(response) => response,
    }
}

async fn compare_get_handler(
    State(state): State<AppState>,
    payload: Result<Query<CalculatePayload>, QueryRejection>,
) -> Response {
    match from_query(payload) {
        Ok(payload) => compare_handler_impl(&state, payload),
        Err(response) => response,
    }
}

async fn compare_post_handler(
    State(state): State<AppState>,
    payload: Result<Json<CalculatePayload>, JsonRejection>,
) -> Response {
    match from_json(payload) {
        Ok(payload) => compare_handler_impl(&state, payload),
        Err(response) => response,
    }
}

async fn compare_csv_get_handler(
    State(state): State<AppState>,
    payload: Result<Query<CalculatePayload>, QueryRejection>,
) -> Response {
    match from_query(payload) {
        Ok(payload) => compare_csv_handler_impl(&state, payload),
        Err(response) => response,
    }
}

async fn compare_csv_post_handler(
    State(state): State<AppState>,
    payload: Result<Json<CalculatePayload>, JsonRejection>,
) -> Response {
    match from_json(payload) {
        Ok(payload) => compare_csv_handler_impl(&state, payload),
        Err(response) => response,
    }
}

async fn profile_get_handler(
    State(state): State<AppState>,
    Path(session): Path<String>,
) -> Response {
    match state.profiles.load(&session) {
        Some(profile) => json_response(StatusCode::OK, profile),
        None => error_response(StatusCode::NOT_FOUND, "No profile saved for session", None),
    }
}

async fn profile_put_handler(
    State(state): State<AppState>,
    Path(session): Path<String>,
    profile: Result<Json<Profile>, JsonRejection>,
) -> Response {
    let profile = match from_json(profile) {
        Ok(profile) => profile,
        Err(response) => return response,
    };
    if let Err(err) = profile.validate() {
        warn!(%session, field = err.field(), "rejected profile");
        return invalid_input_response(&err);
    }
    info!(%session, "profile saved");
    state.profiles.save(&session, profile.clone());
    json_response(StatusCode::OK, profile)
}

fn calculate_handler_impl(state: &AppState, payload: CalculatePayload) -> Response {
    let request = match resolve_request(state, payload) {
        Ok(request) => request,
        Err(response) => return response,
    };

    let result = compute(&request.input);
    debug!(
        take_home = result.take_home_annual,
        adjusted_net_income = result.adjusted_net_income_annual,
        "calculated"
    );
    json_response(StatusCode::OK, build_calculate_response(request.input, result))
}

fn compare_handler_impl(state: &AppState, payload: CalculatePayload) -> Response {
    let request = match resolve_request(state, payload) {
        Ok(request) => request,
        Err(response) => return response,
    };

    let comparison = Comparison::against_baseline(&request.input, request.baseline);
    debug!(
        effective_monthly_cost = comparison.effective_monthly_cost(),
        "compared"
    );
    json_response(StatusCode::OK, build_compare_response(comparison))
}

fn compare_csv_handler_impl(state: &AppState, payload: CalculatePayload) -> Response {
    let request = match resolve_request(state, payload) {
        Ok(request) => request,
        Err(response) => return response,
    };

    let comparison = Comparison::against_baseline(&request.input, request.baseline);
    let mut body = Vec::new();
    if let Err(err) = write_comparison_csv(&comparison, &mut body) {
        warn!(error = %err, "CSV export failed");
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, "CSV export failed", None);
    }

    with_cache_control((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"comparison.csv\"",
            ),
        ],
        body,
    ))
}

/// Malformed bodies get the same JSON error shape as validation failures.
fn from_json<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, Response> {
    match payload {
        Ok(Json(payload)) => Ok(payload),
        Err(rejection) => Err(rejected_payload(rejection.status(), &rejection.body_text())),
    }
}

fn from_query<T>(payload: Result<Query<T>, QueryRejection>) -> Result<T, Response> {
    match payload {
        Ok(Query(payload)) => Ok(payload),
        Err(rejection) => Err(rejected_payload(rejection.status(), &rejection.body_text())),
    }
}

fn rejected_payload(status: StatusCode, msg: &str) -> Response {
    warn!(%status, "rejected payload: {msg}");
    error_response(status, msg, None)
}

fn resolve_request(state: &AppState, payload: CalculatePayload) -> Result<ApiRequest, Response> {
    let profile = payload
        .session
        .as_deref()
        .and_then(|session| state.profiles.load(session));
    api_request_from_payload(payload, profile.as_ref()).map_err(|err| {
        warn!(field = err.field(), "rejected input: {err}");
        invalid_input_response(&err)
    })
}

fn with_cache_control<R: IntoResponse>(response: R) -> Response {
    let mut response = response.into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    with_cache_control((status, Json(body)))
}

fn error_response(status: StatusCode, msg: &str, field: Option<&'static str>) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
            field,
        },
    )
}

fn invalid_input_response(err: &InvalidInputError) -> Response {
    error_response(StatusCode::BAD_REQUEST, &err.to_string(), Some(err.field()))
}

#[cfg(test)]
fn api_request_from_json(
    json: &str,
    profile: Option<&Profile>,
) -> Result<ApiRequest, String> {
    let payload = serde_json::from_str::<CalculatePayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    api_request_from_payload(payload, profile).map_err(|e| e.to_string())
}

/// Defaults, then the saved profile, then explicit payload fields.
fn api_request_from_payload(
    payload: CalculatePayload,
    profile: Option<&Profile>,
) -> Result<ApiRequest, InvalidInputError> {
    let mut args = default_input_args();
    if let Some(profile) = profile {
        apply_profile(&mut args, profile);
    }

    if let Some(v) = payload.base_salary {
        args.base_salary = v;
    }
    if let Some(v) = payload.bonus {
        args.bonus = v;
    }
    if let Some(v) = payload.employee_pension_pct {
        args.employee_pension_pct = v;
    }
    if let Some(v) = payload.employer_pension_pct {
        args.employer_pension_pct = v;
    }
    if let Some(v) = payload.pension_applies_to_bonus {
        args.pension_applies_to_bonus = v;
    }
    if let Some(v) = payload.ev_lease_monthly {
        args.ev_lease_monthly = v;
    }
    if let Some(v) = payload.ev_p11d_value {
        args.ev_p11d_value = v;
    }
    if let Some(v) = payload.other_sacrifice_monthly {
        args.other_sacrifice_monthly = v;
    }
    if let Some(v) = payload.num_children {
        args.num_children = v;
    }

    let input = build_inputs(args)?;
    Ok(ApiRequest {
        input,
        baseline: payload.baseline.map(Into::into).unwrap_or_default(),
    })
}

fn apply_profile(args: &mut InputArgs, profile: &Profile) {
    args.base_salary = profile.base_salary;
    args.bonus = profile.bonus;
    args.employee_pension_pct = profile.employee_pension_pct;
    args.employer_pension_pct = profile.employer_pension_pct;
    args.num_children = profile.num_children;
}

fn build_calculate_response(
    input: CalculationInput,
    result: CalculationResult,
) -> CalculateResponse {
    CalculateResponse {
        take_home_monthly: result.take_home_monthly(),
        in_allowance_taper: result.in_allowance_taper(),
        input,
        result,
    }
}

fn build_compare_response(comparison: Comparison) -> CompareResponse {
    let rows = comparison.rows();
    CompareResponse {
        take_home_difference_annual: comparison.b.result.take_home_annual
            - comparison.a.result.take_home_annual,
        effective_monthly_cost: comparison.effective_monthly_cost(),
        gross_monthly_sacrifice: comparison.gross_monthly_sacrifice(),
        tax_relief_monthly: comparison.tax_relief_monthly(),
        rows,
        scenario_a: comparison.a,
        scenario_b: comparison.b,
    }
}
