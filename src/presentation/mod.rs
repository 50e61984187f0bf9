//! Status presentation
//!
//! Pure consumers of a snapshot: a compact indicator, a detailed panel and a
//! floating widget. The only action a view can trigger is a refresh.

pub mod views;
pub mod widget;

pub use views::{
    DetailedView, IndicatorView, ServiceRow, StatusPresentation, StatusTone, format_response_time,
};
pub use widget::{RefreshAction, StatusWidget, WidgetView};
