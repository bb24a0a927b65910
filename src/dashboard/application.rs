use super::common::*;

/// Per-application dashboard: traffic, latency, runtime internals
pub fn dashboard() -> Dashboard {
    Dashboard {
        name: "Application".to_string(),
        sections: default_sections(),
        groups: vec![
            PanelGroup {
                name: "Traffic".to_string(),
                id: "traffic".to_string(),
                panels: vec![
                    Panel {
                        title: "Requests".to_string(),
                        id: "requests".to_string(),
                        panel_type: PanelType::Line,
                        queries: vec![
                            QueryDef {
                                expr: "sum by (instance) (irate(http_requests_total[1m]))"
                                    .to_string(),
                                legend: Some("{instance}".to_string()),
                                interval: None,
                            },
                        ],
                        unit: Unit::Rate,
                        options: Some(PanelOptions {
                            stack: Some(true),
                            ..Default::default()
                        }),
                    },
                    Panel {
                        title: "Latency P99".to_string(),
                        id: "latency-p99".to_string(),
                        panel_type: PanelType::Line,
                        queries: vec![
                            QueryDef {
                                expr:
                                    "histogram_quantile(0.99, http_request_duration_seconds[5m])"
                                        .to_string(),
                                legend: Some("p99".to_string()),
                                interval: None,
                            },
                            QueryDef {
                                expr:
                                    "histogram_quantile(0.50, http_request_duration_seconds[5m])"
                                        .to_string(),
                                legend: Some("p50".to_string()),
                                interval: None,
                            },
                        ],
                        unit: Unit::Time,
                        options: None,
                    },
                ],
            },
            PanelGroup {
                name: "Runtime".to_string(),
                id: "runtime".to_string(),
                panels: vec![
                    Panel {
                        title: "Heap".to_string(),
                        id: "heap".to_string(),
                        panel_type: PanelType::Band,
                        queries: vec![QueryDef {
                            expr: "jvm_heap_used_bytes / jvm_heap_max_bytes * 100".to_string(),
                            legend: Some("heap".to_string()),
                            interval: None,
                        }],
                        unit: Unit::Percentage,
                        options: Some(PanelOptions {
                            band: Some(true),
                            fill: Some(true),
                            ..Default::default()
                        }),
                    },
                    Panel {
                        title: "GC Pause".to_string(),
                        id: "gc-pause".to_string(),
                        panel_type: PanelType::Line,
                        queries: vec![QueryDef {
                            expr: "sum(irate(jvm_gc_pause_seconds_sum[5m]))".to_string(),
                            legend: None,
                            interval: None,
                        }],
                        unit: Unit::Time,
                        options: None,
                    },
                    Panel {
                        title: "Threads".to_string(),
                        id: "threads".to_string(),
                        panel_type: PanelType::Line,
                        queries: vec![QueryDef {
                            expr: "jvm_threads_live".to_string(),
                            legend: None,
                            interval: None,
                        }],
                        unit: Unit::Count,
                        options: None,
                    },
                ],
            },
        ],
    }
}
