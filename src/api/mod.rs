use axum::{
    Router,
    extract::{
        Json, Query,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use clap::{Parser, ValueEnum};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::core::{
    ParameterError, ProjectionResult, ProjectionSummary, RoundingPolicy, SimulationParameters,
    project_with_rounding, summarize,
};

/// The original form took the monthly amount in units of ten thousand.
const TEN_THOUSAND: f64 = 10_000.0;
const DEFAULT_MONTHLY_CONTRIBUTION: f64 = 3.0 * TEN_THOUSAND;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliRoundingPolicy {
    SeparateFields,
    RoundedDifference,
}

impl From<CliRoundingPolicy> for RoundingPolicy {
    fn from(value: CliRoundingPolicy) -> Self {
        match value {
            CliRoundingPolicy::SeparateFields => RoundingPolicy::SeparateFields,
            CliRoundingPolicy::RoundedDifference => RoundingPolicy::RoundedDifference,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiRoundingPolicy {
    #[serde(alias = "separateFields", alias = "separate_fields", alias = "separate")]
    SeparateFields,
    #[serde(
        alias = "roundedDifference",
        alias = "rounded_difference",
        alias = "difference"
    )]
    RoundedDifference,
}

impl From<ApiRoundingPolicy> for CliRoundingPolicy {
    fn from(value: ApiRoundingPolicy) -> Self {
        match value {
            ApiRoundingPolicy::SeparateFields => CliRoundingPolicy::SeparateFields,
            ApiRoundingPolicy::RoundedDifference => CliRoundingPolicy::RoundedDifference,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SimulatePayload {
    initial_investment: Option<f64>,
    monthly_contribution: Option<f64>,
    monthly_contribution_ten_thousands: Option<f64>,
    #[serde(alias = "annualReturnRatePercent")]
    annual_return_rate: Option<f64>,
    #[serde(alias = "investmentPeriodYears")]
    investment_period: Option<u32>,
    rounding: Option<ApiRoundingPolicy>,
}

#[derive(Parser, Debug)]
#[command(
    name = "compound",
    about = "Compound growth projection for a lump sum plus monthly contributions"
)]
struct Cli {
    #[arg(long, default_value_t = 1_000_000.0, help = "Initial lump sum")]
    initial_investment: f64,
    #[arg(
        long,
        help = "Monthly contribution in currency units; defaults to 30000"
    )]
    monthly_contribution: Option<f64>,
    #[arg(
        long,
        conflicts_with = "monthly_contribution",
        help = "Monthly contribution in units of ten thousand, e.g. 3 for 30000"
    )]
    monthly_contribution_ten_thousands: Option<f64>,
    #[arg(
        long,
        default_value_t = 5.0,
        help = "Fixed annual return in percent, e.g. 5"
    )]
    annual_return_rate: f64,
    #[arg(long, default_value_t = 30, help = "Investment horizon in whole years")]
    investment_period: u32,
    #[arg(
        long,
        value_enum,
        default_value_t = CliRoundingPolicy::SeparateFields,
        help = "How the yearly accrued return is rounded"
    )]
    rounding: CliRoundingPolicy,
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,
}

#[derive(Debug, Clone, Copy)]
struct ProjectionRequest {
    params: SimulationParameters,
    rounding: RoundingPolicy,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SimulateResponse {
    parameters: SimulationParameters,
    rounding: RoundingPolicy,
    years: ProjectionResult,
    summary: Option<ProjectionSummary>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Args(#[from] clap::Error),

    #[error("invalid input: {0}")]
    Input(#[from] ParameterError),

    #[error("failed to encode projection: {0}")]
    Json(#[from] serde_json::Error),
}

fn resolve_monthly_contribution(cli: &Cli) -> Result<f64, ParameterError> {
    match (
        cli.monthly_contribution,
        cli.monthly_contribution_ten_thousands,
    ) {
        (Some(_), Some(_)) => Err(ParameterError::ConflictingContribution),
        (Some(direct), None) => Ok(direct),
        (None, Some(units)) => Ok(units * TEN_THOUSAND),
        (None, None) => Ok(DEFAULT_MONTHLY_CONTRIBUTION),
    }
}

fn build_inputs(cli: &Cli) -> Result<ProjectionRequest, ParameterError> {
    let params = SimulationParameters {
        initial_investment: cli.initial_investment,
        monthly_contribution: resolve_monthly_contribution(cli)?,
        annual_return_rate_percent: cli.annual_return_rate,
        investment_period_years: cli.investment_period,
    };
    params.validate()?;

    Ok(ProjectionRequest {
        params,
        rounding: cli.rounding.into(),
    })
}

/// Parses command-line arguments (binary name first) and renders the projection.
pub fn run_cli<I, T>(args: I) -> Result<String, CliError>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = Cli::try_parse_from(args)?;
    let request = build_inputs(&cli)?;
    debug!("cli projection: {:?}", request.params);

    let response = build_simulate_response(request)?;
    match cli.format {
        OutputFormat::Table => Ok(render_table(&response)),
        OutputFormat::Json => Ok(format!("{}\n", serde_json::to_string_pretty(&response)?)),
    }
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route(
            "/api/simulate",
            get(simulate_get_handler).post(simulate_post_handler),
        )
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    info!("projection HTTP API listening on http://{addr}");
    info!("local access: http://127.0.0.1:{port}/api/simulate");

    axum::serve(listener, app).await
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn simulate_get_handler(
    payload: Result<Query<SimulatePayload>, QueryRejection>,
) -> Response {
    match payload {
        Ok(Query(payload)) => simulate_handler_impl(payload),
        Err(rejection) => rejected_payload_response(&rejection.body_text()),
    }
}

async fn simulate_post_handler(
    payload: Result<Json<SimulatePayload>, JsonRejection>,
) -> Response {
    match payload {
        Ok(Json(payload)) => simulate_handler_impl(payload),
        Err(rejection) => rejected_payload_response(&rejection.body_text()),
    }
}

fn rejected_payload_response(msg: &str) -> Response {
    warn!("unreadable simulate payload: {msg}");
    error_response(StatusCode::BAD_REQUEST, msg)
}

fn simulate_handler_impl(payload: SimulatePayload) -> Response {
    let response = api_request_from_payload(payload).and_then(|request| {
        debug!(
            "simulate request: {:?} rounding={:?}",
            request.params, request.rounding
        );
        build_simulate_response(request)
    });

    match response {
        Ok(response) => json_response(StatusCode::OK, response),
        Err(err) => {
            warn!("rejected simulate request: {err}");
            error_response(StatusCode::BAD_REQUEST, &err.to_string())
        }
    }
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
fn api_request_from_json(json: &str) -> Result<ProjectionRequest, String> {
    let payload = serde_json::from_str::<SimulatePayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    api_request_from_payload(payload).map_err(|e| e.to_string())
}

fn api_request_from_payload(payload: SimulatePayload) -> Result<ProjectionRequest, ParameterError> {
    let mut cli = default_cli_for_api();

    if let Some(v) = payload.initial_investment {
        cli.initial_investment = v;
    }
    if let Some(v) = payload.monthly_contribution {
        cli.monthly_contribution = Some(v);
    }
    if let Some(v) = payload.monthly_contribution_ten_thousands {
        cli.monthly_contribution_ten_thousands = Some(v);
    }
    if let Some(v) = payload.annual_return_rate {
        cli.annual_return_rate = v;
    }
    if let Some(v) = payload.investment_period {
        cli.investment_period = v;
    }
    if let Some(v) = payload.rounding {
        cli.rounding = v.into();
    }

    build_inputs(&cli)
}

fn default_cli_for_api() -> Cli {
    Cli {
        initial_investment: 1_000_000.0,
        monthly_contribution: None,
        monthly_contribution_ten_thousands: None,
        annual_return_rate: 5.0,
        investment_period: 30,
        rounding: CliRoundingPolicy::SeparateFields,
        format: OutputFormat::Json,
    }
}

fn build_simulate_response(request: ProjectionRequest) -> Result<SimulateResponse, ParameterError> {
    let years = project_with_rounding(request.params, request.rounding);
    if let Some(overflowed) = years.iter().find(|snapshot| !snapshot.is_finite()) {
        return Err(ParameterError::NonFiniteResult(overflowed.year_index));
    }

    let summary = summarize(&years);
    Ok(SimulateResponse {
        parameters: request.params,
        rounding: request.rounding,
        years,
        summary,
    })
}

fn render_table(response: &SimulateResponse) -> String {
    let mut out = format!(
        "{:<8} {:>16} {:>20} {:>16}\n",
        "", "total value", "invested principal", "accrued return"
    );
    for snapshot in &response.years {
        out.push_str(&format!(
            "{:<8} {:>16} {:>20} {:>16}\n",
            format!("year {}", snapshot.year_index),
            format_currency(snapshot.total_value),
            format_currency(snapshot.invested_principal),
            format_currency(snapshot.accrued_return),
        ));
    }
    if let Some(summary) = response.summary {
        out.push_str(&format!(
            "return on investment: {:.2}%\n",
            summary.return_on_investment_percent
        ));
    }
    out
}

/// Whole currency units with comma thousands separators.
fn format_currency(value: f64) -> String {
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if rounded < 0.0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}
