//! Tests for configuration validation

use std::collections::HashMap;
use std::time::Duration;

use remesh_scheduler::config::SchedulerConfig;

fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    move |key| vars.get(key).cloned()
}

#[test]
fn test_default_config_is_valid() {
    let cfg = SchedulerConfig::default();
    assert!(cfg.validate().is_ok());
    assert_eq!(cfg.capacity, 4);
    assert_eq!(cfg.mip_count, 4);
    assert_eq!(cfg.max_retries, None);
    assert_eq!(cfg.telemetry_interval(), Duration::from_secs(30));
}

#[test]
fn test_capacity_below_minimum() {
    let cfg = SchedulerConfig {
        capacity: 1,
        ..SchedulerConfig::default()
    };
    assert!(cfg.validate().is_err());
}

#[test]
fn test_memory_threshold_range() {
    for threshold in [0.0, 1.5, f64::NAN] {
        let cfg = SchedulerConfig {
            memory_pressure_threshold: threshold,
            ..SchedulerConfig::default()
        };
        assert!(cfg.validate().is_err(), "threshold {threshold} accepted");
    }
}

#[test]
fn test_zero_max_retries_rejected() {
    let cfg = SchedulerConfig {
        max_retries: Some(0),
        ..SchedulerConfig::default()
    };
    assert!(cfg.validate().is_err());
    assert!(SchedulerConfig::from_json_str(r#"{ "max_retries": 0 }"#).is_err());
}

#[test]
fn test_notify_template_requires_placeholder() {
    let cfg = SchedulerConfig {
        notify_url_template: Some("http://site/mesh_updated/".into()),
        ..SchedulerConfig::default()
    };
    assert!(cfg.validate().is_err());
}

#[test]
fn test_from_json_str_partial() {
    let cfg = SchedulerConfig::from_json_str(
        r#"{ "capacity": 8, "max_retries": 3, "generation_timeout_secs": 120 }"#,
    )
    .unwrap();
    assert_eq!(cfg.capacity, 8);
    assert_eq!(cfg.max_retries, Some(3));
    assert_eq!(
        cfg.pipeline_settings().generation_timeout,
        Some(Duration::from_secs(120))
    );
    assert_eq!(cfg.segmentation_file, "segmentation.lzma");
}

#[test]
fn test_from_json_str_rejects_invalid() {
    assert!(SchedulerConfig::from_json_str(r#"{ "capacity": 0 }"#).is_err());
    assert!(SchedulerConfig::from_json_str("not json").is_err());
}

#[test]
fn test_from_lookup_overrides() {
    let cfg = SchedulerConfig::from_lookup(lookup(&[
        ("REMESH_THREADS", "6"),
        ("REMESH_MEMORY_THRESHOLD", "0.8"),
        ("REMESH_NOTIFY_URL", "http://site/1.0/task/{task_id}/mesh_updated/"),
    ]))
    .unwrap();
    assert_eq!(cfg.capacity, 6);
    assert_eq!(cfg.admission_policy().capacity(), 6);
    assert!((cfg.memory_pressure_threshold - 0.8).abs() < f64::EPSILON);
    assert!(cfg.notify_url_template.is_some());
}

#[test]
fn test_from_lookup_rejects_garbage() {
    let err = SchedulerConfig::from_lookup(lookup(&[("REMESH_THREADS", "many")])).unwrap_err();
    assert!(err.contains("REMESH_THREADS"));
}
