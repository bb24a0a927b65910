pub mod application;
pub mod common;
pub mod infrastructure;
pub mod overview;

pub use self::common::{
    Dashboard, DashboardSection, Panel, PanelGroup, PanelOptions, PanelType, QueryDef, Unit,
};

/// Get dashboard definition by name
pub fn get_dashboard(name: &str) -> Option<Dashboard> {
    match name {
        "overview" => Some(overview::dashboard()),
        "application" => Some(application::dashboard()),
        "infrastructure" => Some(infrastructure::dashboard()),
        _ => None,
    }
}

/// Generate all dashboard definitions
pub fn all_dashboards() -> Vec<Dashboard> {
    vec![
        overview::dashboard(),
        application::dashboard(),
        infrastructure::dashboard(),
    ]
}
