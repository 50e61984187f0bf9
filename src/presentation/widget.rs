//! Floating status widget

use async_trait::async_trait;
use serde::Serialize;

use super::views::{DetailedView, IndicatorView, StatusPresentation};
use crate::monitoring::health::{BackendStatusSnapshot, CycleOutcome, HealthMonitor, OverallStatus};

/// The one action a view may trigger
#[async_trait]
pub trait RefreshAction: Send + Sync {
    async fn refresh(&self) -> CycleOutcome;
}

#[async_trait]
impl RefreshAction for HealthMonitor {
    async fn refresh(&self) -> CycleOutcome {
        HealthMonitor::refresh(self).await
    }
}

/// What the widget shows right now
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WidgetView {
    pub indicator: IndicatorView,
    /// Services not active, shown whenever the rollup is not active
    pub badge: Option<usize>,
    /// Detailed panel, present while the modal is open
    pub panel: Option<DetailedView>,
}

/// Floating button that opens a detailed modal
#[derive(Debug, Clone, Default)]
pub struct StatusWidget {
    open: bool,
}

impl StatusWidget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn open(&mut self) {
        self.open = true;
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    pub fn toggle(&mut self) {
        self.open = !self.open;
    }

    pub fn render(&self, snapshot: &BackendStatusSnapshot) -> WidgetView {
        let indicator = StatusPresentation::indicator(snapshot);
        let badge = (indicator.overall != OverallStatus::Active)
            .then(|| snapshot.total_count() - snapshot.active_count());

        WidgetView {
            indicator,
            badge,
            panel: self.open.then(|| StatusPresentation::detailed(snapshot)),
        }
    }

    /// Refresh button in the modal
    pub async fn request_refresh<R>(&self, action: &R) -> CycleOutcome
    where
        R: RefreshAction + ?Sized,
    {
        action.refresh().await
    }
}
