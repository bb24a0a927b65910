use super::common::*;

/// Host-level dashboard
pub fn dashboard() -> Dashboard {
    Dashboard {
        name: "Infrastructure".to_string(),
        sections: default_sections(),
        groups: vec![
            PanelGroup {
                name: "Hosts".to_string(),
                id: "hosts".to_string(),
                panels: vec![
                    Panel {
                        title: "CPU by Host".to_string(),
                        id: "cpu-by-host".to_string(),
                        panel_type: PanelType::Line,
                        queries: vec![QueryDef {
                            expr: "cpu_percent".to_string(),
                            legend: Some("{host}".to_string()),
                            interval: None,
                        }],
                        unit: Unit::Percentage,
                        options: None,
                    },
                    Panel {
                        title: "Disk Used".to_string(),
                        id: "disk-used".to_string(),
                        panel_type: PanelType::Gauge,
                        queries: vec![QueryDef {
                            expr: "disk_used_percent".to_string(),
                            legend: None,
                            interval: None,
                        }],
                        unit: Unit::Percentage,
                        options: None,
                    },
                ],
            },
            PanelGroup {
                name: "Network".to_string(),
                id: "network".to_string(),
                panels: vec![Panel {
                    title: "Throughput".to_string(),
                    id: "throughput".to_string(),
                    panel_type: PanelType::Line,
                    queries: vec![
                        QueryDef {
                            expr: "sum(irate(network_receive_bytes[1m]))".to_string(),
                            legend: Some("rx".to_string()),
                            interval: None,
                        },
                        QueryDef {
                            expr: "sum(irate(network_transmit_bytes[1m]))".to_string(),
                            legend: Some("tx".to_string()),
                            interval: None,
                        },
                    ],
                    unit: Unit::Datarate,
                    options: None,
                }],
            },
        ],
    }
}
