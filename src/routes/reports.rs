// SPDX-License-Identifier: MIT

//! Usage report routes: paginated JSON for the report view and a CSV
//! download of the same data.

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, HeaderValue},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::models::UsageEvent;
use crate::services::report::{usage_report_csv, usage_report_filename};
use crate::AppState;

const DEFAULT_LIMIT: usize = 25;
const MAX_LIMIT: usize = 200;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/reports/usage", get(usage_report))
        .route("/reports/usage.csv", get(usage_report_download))
}

#[derive(Deserialize)]
pub struct ReportParams {
    /// Restrict to one account's events (matched on email, case-insensitive).
    #[serde(default)]
    account: Option<String>,
    #[serde(default)]
    limit: Option<usize>,
    #[serde(default)]
    offset: Option<usize>,
}

impl ReportParams {
    fn account_filter(&self) -> Option<String> {
        self.account
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(str::to_lowercase)
    }
}

fn filtered_events(events: Vec<UsageEvent>, user: Option<&str>) -> Vec<UsageEvent> {
    match user {
        Some(user) => events
            .into_iter()
            .filter(|e| e.email.to_lowercase() == user)
            .collect(),
        None => events,
    }
}

#[derive(Serialize)]
pub struct UsageReportPage {
    pub events: Vec<UsageEvent>,
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
}

/// Paginated usage log, newest first.
async fn usage_report(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ReportParams>,
) -> Result<Json<UsageReportPage>> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT);
    if limit == 0 || limit > MAX_LIMIT {
        return Err(AppError::BadRequest(format!(
            "limit must be 1-{}",
            MAX_LIMIT
        )));
    }
    let offset = params.offset.unwrap_or(0);

    let events = filtered_events(
        state.cache.usage_events().await,
        params.account_filter().as_deref(),
    );
    let total = events.len();

    let events: Vec<UsageEvent> = events.into_iter().skip(offset).take(limit).collect();

    Ok(Json(UsageReportPage {
        events,
        total,
        limit,
        offset,
    }))
}

/// CSV download of the usage log (full result set, no pagination).
async fn usage_report_download(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ReportParams>,
) -> Result<(HeaderMap, Vec<u8>)> {
    let account = params.account_filter();
    let events = filtered_events(state.cache.usage_events().await, account.as_deref());

    let scope = account.as_deref().unwrap_or("general");
    let filename = usage_report_filename(scope);

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/csv; charset=utf-8"),
    );
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&format!("attachment; filename=\"{}\"", filename))
            .map_err(|e| AppError::Internal(anyhow::anyhow!("invalid filename header: {}", e)))?,
    );

    Ok((headers, usage_report_csv(&events)))
}
