//! Tests for utility functions

use remesh_scheduler::util::{parse_meminfo, MemoryProbe, Priority, StaticMemoryProbe, TaskId};

#[test]
fn test_priority_ordering() {
    assert!(Priority::High > Priority::Low);
}

#[test]
fn test_priority_serde() {
    assert_eq!(serde_json::to_string(&Priority::High).unwrap(), "\"high\"");
    let low: Priority = serde_json::from_str("\"low\"").unwrap();
    assert_eq!(low, Priority::Low);
}

#[test]
fn test_task_id() {
    let id: TaskId = 12345;
    assert_eq!(id, 12345);
}

#[test]
fn test_static_probe_is_adjustable() {
    let probe = StaticMemoryProbe::new(0.25);
    let shared = probe.clone();
    shared.set(0.95);
    assert!((probe.memory_pressure() - 0.95).abs() < f64::EPSILON);
}

#[test]
fn test_parse_meminfo_pressure() {
    let snapshot = parse_meminfo("MemTotal: 1000 kB\nMemFree: 10 kB\nMemAvailable: 250 kB\n").unwrap();
    assert!((snapshot.pressure() - 0.75).abs() < 1e-9);
}
