//! Tests for error types

use remesh_scheduler::core::RemeshError;

#[test]
fn test_fetch_error_display() {
    let err = RemeshError::Fetch("HTTP 404 from gs://bucket".to_string());
    assert_eq!(format!("{}", err), "fetch failed: HTTP 404 from gs://bucket");
}

#[test]
fn test_cache_store_error_display() {
    let err = RemeshError::CacheStore("connection refused".to_string());
    assert_eq!(format!("{}", err), "cache store error: connection refused");
}

#[test]
fn test_invalid_request_display() {
    let err = RemeshError::InvalidRequest("source bucket is empty".to_string());
    assert_eq!(format!("{}", err), "invalid request: source bucket is empty");
}

#[test]
fn test_requeueable_errors() {
    assert!(RemeshError::Fetch(String::new()).is_requeueable());
    assert!(RemeshError::Generation(String::new()).is_requeueable());
    assert!(RemeshError::Publish(String::new()).is_requeueable());
}

#[test]
fn test_non_requeueable_errors() {
    assert!(!RemeshError::CacheStore(String::new()).is_requeueable());
    assert!(!RemeshError::Notify(String::new()).is_requeueable());
    assert!(!RemeshError::InvalidRequest(String::new()).is_requeueable());
    assert!(!RemeshError::Config(String::new()).is_requeueable());
    assert!(!RemeshError::Backend(String::new()).is_requeueable());
}
