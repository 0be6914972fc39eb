//! Runtime counters.
//!
//! Cheap saturating counters the runtime bumps as it works; snapshots turn
//! into structured log events so they travel the same pipe as everything
//! else.

use serde_json::json;

use crate::logging::{LogEvent, LogFields, LogLevel};

#[derive(Debug, Default, Clone)]
pub struct MenuMetrics {
    displays: u64,
    commits: u64,
    refreshes: u64,
    element_hits: u64,
    fallback_clicks: u64,
    soft_aborts: u64,
}

impl MenuMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_display(&mut self) {
        self.displays = self.displays.saturating_add(1);
    }

    pub fn record_commit(&mut self) {
        self.commits = self.commits.saturating_add(1);
    }

    pub fn record_refresh(&mut self) {
        self.refreshes = self.refreshes.saturating_add(1);
    }

    pub fn record_element_hit(&mut self) {
        self.element_hits = self.element_hits.saturating_add(1);
    }

    pub fn record_fallback_click(&mut self) {
        self.fallback_clicks = self.fallback_clicks.saturating_add(1);
    }

    pub fn record_soft_abort(&mut self) {
        self.soft_aborts = self.soft_aborts.saturating_add(1);
    }

    pub fn snapshot(&self) -> MetricSnapshot {
        MetricSnapshot {
            displays: self.displays,
            commits: self.commits,
            refreshes: self.refreshes,
            element_hits: self.element_hits,
            fallback_clicks: self.fallback_clicks,
            soft_aborts: self.soft_aborts,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricSnapshot {
    pub displays: u64,
    pub commits: u64,
    pub refreshes: u64,
    pub element_hits: u64,
    pub fallback_clicks: u64,
    pub soft_aborts: u64,
}

impl MetricSnapshot {
    pub fn as_fields(&self) -> LogFields {
        let mut map = LogFields::new();
        map.insert("displays".to_string(), json!(self.displays));
        map.insert("commits".to_string(), json!(self.commits));
        map.insert("refreshes".to_string(), json!(self.refreshes));
        map.insert("element_hits".to_string(), json!(self.element_hits));
        map.insert("fallback_clicks".to_string(), json!(self.fallback_clicks));
        map.insert("soft_aborts".to_string(), json!(self.soft_aborts));
        map
    }

    pub fn to_log_event(&self, target: &str) -> LogEvent {
        LogEvent::with_fields(LogLevel::Info, target, "menu_metrics", self.as_fields())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_land_in_snapshot() {
        let mut metrics = MenuMetrics::new();
        metrics.record_display();
        metrics.record_display();
        metrics.record_commit();
        metrics.record_fallback_click();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.displays, 2);
        assert_eq!(snapshot.commits, 1);
        assert_eq!(snapshot.fallback_clicks, 1);
        assert_eq!(snapshot.soft_aborts, 0);

        let event = snapshot.to_log_event("menu::metrics");
        assert_eq!(event.fields.get("displays"), Some(&json!(2)));
    }
}
