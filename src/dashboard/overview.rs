use super::common::*;

/// Overview dashboard with key service metrics
pub fn dashboard() -> Dashboard {
    Dashboard {
        name: "Overview".to_string(),
        sections: default_sections(),
        groups: vec![PanelGroup {
            name: "Service".to_string(),
            id: "service".to_string(),
            panels: vec![
                Panel {
                    title: "Request Rate".to_string(),
                    id: "request-rate".to_string(),
                    panel_type: PanelType::Stat,
                    queries: vec![QueryDef {
                        expr: "sum(irate(http_requests_total[1m]))".to_string(),
                        legend: None,
                        interval: None,
                    }],
                    unit: Unit::Rate,
                    options: None,
                },
                Panel {
                    title: "Error Rate".to_string(),
                    id: "error-rate".to_string(),
                    panel_type: PanelType::Gauge,
                    queries: vec![QueryDef {
                        expr: "sum(irate(http_requests_total{status=~\"5..\"}[1m])) / sum(irate(http_requests_total[1m])) * 100".to_string(),
                        legend: None,
                        interval: None,
                    }],
                    unit: Unit::Percentage,
                    options: None,
                },
                Panel {
                    title: "CPU Usage".to_string(),
                    id: "cpu".to_string(),
                    panel_type: PanelType::Band,
                    queries: vec![QueryDef {
                        expr: "avg(cpu_percent)".to_string(),
                        legend: Some("cpu".to_string()),
                        interval: None,
                    }],
                    unit: Unit::Percentage,
                    options: Some(PanelOptions {
                        band: Some(true),
                        ..Default::default()
                    }),
                },
                Panel {
                    title: "Memory Usage".to_string(),
                    id: "memory".to_string(),
                    panel_type: PanelType::Band,
                    queries: vec![QueryDef {
                        expr: "avg(memory_percent)".to_string(),
                        legend: Some("memory".to_string()),
                        interval: None,
                    }],
                    unit: Unit::Percentage,
                    options: Some(PanelOptions {
                        band: Some(true),
                        ..Default::default()
                    }),
                },
            ],
        }],
    }
}
