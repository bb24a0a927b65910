use serde::{Deserialize, Serialize};

/// Unit types for dashboard panels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Count,
    Rate,
    Time,
    Bytes,
    Datarate,
    Percentage,
}

/// Dashboard definition built from query expressions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dashboard {
    pub name: String,
    pub sections: Vec<DashboardSection>,
    pub groups: Vec<PanelGroup>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardSection {
    pub name: String,
    pub route: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanelGroup {
    pub name: String,
    pub id: String,
    pub panels: Vec<Panel>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Panel {
    pub title: String,
    pub id: String,
    #[serde(rename = "type")]
    pub panel_type: PanelType,
    pub queries: Vec<QueryDef>,
    pub unit: Unit,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<PanelOptions>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PanelType {
    Line,
    Band,
    Stat,
    Gauge,
    Table,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryDef {
    pub expr: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legend: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PanelOptions {
    /// Draw min/max reference lines computed over the full loaded window.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub band: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_scale: Option<bool>,
}

pub fn default_sections() -> Vec<DashboardSection> {
    vec![
        DashboardSection {
            name: "Overview".to_string(),
            route: "/overview".to_string(),
        },
        DashboardSection {
            name: "Application".to_string(),
            route: "/application".to_string(),
        },
        DashboardSection {
            name: "Infrastructure".to_string(),
            route: "/infrastructure".to_string(),
        },
    ]
}
