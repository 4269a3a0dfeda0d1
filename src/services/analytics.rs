// SPDX-License-Identifier: MIT

//! Usage analytics derived from the cached event stream.

use crate::models::{DashboardStats, UsageEvent};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;

const RANKING_SIZE: usize = 5;

/// One entry of the widget popularity ranking.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WidgetRankEntry {
    pub widget: String,
    pub sessions: u64,
}

/// One day of the activity timeline.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TimelinePoint {
    pub date: NaiveDate,
    pub sessions: u64,
}

/// Top widgets by session count, most used first, at most five entries.
///
/// Ties break on the widget label so the ranking is stable across calls.
pub fn widget_usage_ranking(events: &[UsageEvent]) -> Vec<WidgetRankEntry> {
    let mut counts: HashMap<String, u64> = HashMap::new();
    for event in events {
        *counts.entry(event.widget_key().to_string()).or_default() += 1;
    }

    let mut ranking: Vec<WidgetRankEntry> = counts
        .into_iter()
        .map(|(widget, sessions)| WidgetRankEntry { widget, sessions })
        .collect();

    ranking.sort_by(|a, b| b.sessions.cmp(&a.sessions).then(a.widget.cmp(&b.widget)));
    ranking.truncate(RANKING_SIZE);
    ranking
}

/// Session counts per UTC calendar day, oldest first.
pub fn activity_timeline(events: &[UsageEvent]) -> Vec<TimelinePoint> {
    let mut per_day: HashMap<NaiveDate, u64> = HashMap::new();
    for event in events {
        *per_day.entry(event.started_at.date_naive()).or_default() += 1;
    }

    let mut timeline: Vec<TimelinePoint> = per_day
        .into_iter()
        .map(|(date, sessions)| TimelinePoint { date, sessions })
        .collect();

    timeline.sort_by_key(|point| point.date);
    timeline
}

/// Headline numbers for the dashboard.
pub fn dashboard_stats(total_users: usize, events: &[UsageEvent]) -> DashboardStats {
    let total_sessions = events.len() as u32;
    let total_duration: i64 = events.iter().map(|e| e.duration.max(0)).sum();
    let avg_duration_secs = if total_sessions > 0 {
        total_duration / i64::from(total_sessions)
    } else {
        0
    };

    let mut widgets: Vec<&str> = events.iter().map(|e| e.widget_key()).collect();
    widgets.sort_unstable();
    widgets.dedup();

    DashboardStats {
        total_users: total_users as u32,
        total_sessions,
        avg_duration_secs,
        active_widgets: widgets.len() as u32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn event(widget: &str, day: u32, duration: i64) -> UsageEvent {
        UsageEvent {
            id: None,
            uid: "uid-1".to_string(),
            email: "user@psia.test".to_string(),
            widget_id: widget.to_string(),
            widget_title: Some(widget.to_string()),
            started_at: Utc.with_ymd_and_hms(2026, 3, day, 12, 0, 0).unwrap(),
            ended_at: None,
            duration,
        }
    }

    #[test]
    fn test_ranking_orders_by_count_descending() {
        let events = vec![
            event("A", 1, 60),
            event("A", 2, 60),
            event("B", 1, 60),
            event("C", 1, 60),
            event("C", 2, 60),
            event("C", 3, 60),
        ];

        let ranking = widget_usage_ranking(&events);
        let labels: Vec<(&str, u64)> = ranking
            .iter()
            .map(|e| (e.widget.as_str(), e.sessions))
            .collect();
        assert_eq!(labels, vec![("C", 3), ("A", 2), ("B", 1)]);
    }

    #[test]
    fn test_ranking_truncates_to_five() {
        let mut events = Vec::new();
        for (i, widget) in ["A", "B", "C", "D", "E", "F", "G"].iter().enumerate() {
            for _ in 0..=(i as u32) {
                events.push(event(widget, 1, 60));
            }
        }

        let ranking = widget_usage_ranking(&events);
        assert_eq!(ranking.len(), 5);
        // Most used first; the two least used widgets fall off.
        assert_eq!(ranking[0].widget, "G");
        assert!(!ranking.iter().any(|e| e.widget == "A" || e.widget == "B"));
    }

    #[test]
    fn test_ranking_ties_break_on_label() {
        let events = vec![event("B", 1, 60), event("A", 1, 60)];
        let ranking = widget_usage_ranking(&events);
        assert_eq!(ranking[0].widget, "A");
        assert_eq!(ranking[1].widget, "B");
    }

    #[test]
    fn test_timeline_groups_by_day_oldest_first() {
        let events = vec![
            event("A", 3, 60),
            event("A", 1, 60),
            event("B", 1, 60),
            event("C", 2, 60),
        ];

        let timeline = activity_timeline(&events);
        let sessions: Vec<u64> = timeline.iter().map(|p| p.sessions).collect();
        assert_eq!(sessions, vec![2, 1, 1]);
        assert!(timeline.windows(2).all(|w| w[0].date < w[1].date));
    }

    #[test]
    fn test_dashboard_stats_empty_events() {
        let stats = dashboard_stats(4, &[]);
        assert_eq!(stats.total_users, 4);
        assert_eq!(stats.total_sessions, 0);
        assert_eq!(stats.avg_duration_secs, 0);
        assert_eq!(stats.active_widgets, 0);
    }

    #[test]
    fn test_dashboard_stats_average_duration() {
        let events = vec![event("A", 1, 30), event("B", 1, 90)];
        let stats = dashboard_stats(2, &events);
        assert_eq!(stats.total_sessions, 2);
        assert_eq!(stats.avg_duration_secs, 60);
        assert_eq!(stats.active_widgets, 2);
    }
}
