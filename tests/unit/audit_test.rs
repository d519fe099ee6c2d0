//! Tests for audit sink

use remesh_scheduler::core::{build_audit_event, AuditAction, AuditSink, InMemoryAuditSink};

#[test]
fn test_in_memory_audit_sink() {
    let sink = InMemoryAuditSink::new(10);

    let event = build_audit_event(7, Some(1), AuditAction::Dispatched, None);
    sink.record(event);
    assert_eq!(sink.events().len(), 1);

    let events = sink.events();
    assert_eq!(events[0].task_id, 7);
    assert_eq!(events[0].attempt_id, Some(1));
    assert_eq!(events[0].action, AuditAction::Dispatched);
}

#[test]
fn test_audit_sink_overflow() {
    let sink = InMemoryAuditSink::new(2);

    sink.record(build_audit_event(1, None, AuditAction::Submitted, None));
    sink.record(build_audit_event(2, None, AuditAction::Submitted, None));
    sink.record(build_audit_event(3, None, AuditAction::Submitted, None));

    let events = sink.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].task_id, 2); // First one popped
    assert_eq!(events[1].task_id, 3);
}

#[test]
fn test_clones_share_buffer() {
    let sink = InMemoryAuditSink::new(4);
    let clone = sink.clone();
    clone.record(build_audit_event(5, Some(9), AuditAction::Published, None));
    assert_eq!(sink.events_for(5).len(), 1);
    assert!(sink.events_for(6).is_empty());
}

#[test]
fn test_build_audit_event() {
    let event = build_audit_event(
        4,
        Some(2),
        AuditAction::Failed,
        Some("fetch failed: timeout".to_string()),
    );

    assert_eq!(event.action.as_str(), "failed");
    assert_eq!(event.detail.as_deref(), Some("fetch failed: timeout"));
    assert!(event.created_at_ms > 0);
}
