// SPDX-License-Identifier: MIT

//! Dashboard and analytics routes, served from the cached event stream.

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;

use crate::models::{DashboardStats, UsageEvent};
use crate::services::analytics::{
    activity_timeline, dashboard_stats, widget_usage_ranking, TimelinePoint, WidgetRankEntry,
};
use crate::AppState;

const RECENT_EVENTS: usize = 10;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/dashboard", get(dashboard))
        .route("/analytics", get(analytics))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    #[serde(flatten)]
    pub stats: DashboardStats,
    pub recent_events: Vec<UsageEvent>,
}

/// Headline numbers plus the most recent activity for the dashboard view.
async fn dashboard(State(state): State<Arc<AppState>>) -> Json<DashboardResponse> {
    let accounts = state.cache.accounts().await;
    let mut events = state.cache.usage_events().await;

    let stats = dashboard_stats(accounts.len(), &events);
    events.truncate(RECENT_EVENTS);

    Json(DashboardResponse {
        stats,
        recent_events: events,
    })
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsResponse {
    pub top_widgets: Vec<WidgetRankEntry>,
    pub timeline: Vec<TimelinePoint>,
}

/// Widget ranking and per-day activity timeline.
async fn analytics(State(state): State<Arc<AppState>>) -> Json<AnalyticsResponse> {
    let events = state.cache.usage_events().await;
    Json(AnalyticsResponse {
        top_widgets: widget_usage_ranking(&events),
        timeline: activity_timeline(&events),
    })
}
