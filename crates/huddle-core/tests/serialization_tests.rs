use std::time::Duration;

use huddle_core::{ContainerLookup, LookupState, Role, RoleSet, SessionContext};

#[test]
fn test_lookup_from_directory_json() {
    let json = r#"{"state":"NotFound","shouldCreate":false,"retryAfter":250}"#;
    let lookup: ContainerLookup = serde_json::from_str(json).unwrap();

    assert_eq!(lookup.state(), LookupState::NotFound);
    assert!(!lookup.should_create());
    assert!(lookup.container_id().is_none());
    assert_eq!(lookup.retry_delay(), Duration::from_millis(250));
}

#[test]
fn test_lookup_missing_fields_default() {
    let json = r#"{"state":"AlreadyExists","containerId":"c-77"}"#;
    let lookup: ContainerLookup = serde_json::from_str(json).unwrap();

    assert_eq!(lookup.container_id(), Some("c-77"));
    assert!(!lookup.should_create());
    assert_eq!(lookup.retry_delay(), Duration::ZERO);
}

#[test]
fn test_lookup_serializes_camel_case() {
    let json = serde_json::to_string(&ContainerLookup::retry_after(Duration::from_millis(50))).unwrap();

    assert!(json.contains("\"shouldCreate\":false"));
    assert!(json.contains("\"retryAfter\":50"));
    assert!(!json.contains("containerId"));
}

#[test]
fn test_conflicting_lookup_fails_validation() {
    let json = r#"{"state":"NotFound","containerId":"c-1","shouldCreate":true}"#;
    let lookup: ContainerLookup = serde_json::from_str(json).unwrap();

    let err = lookup.validate().unwrap_err();
    assert!(err.is_upstream());
}

#[test]
fn test_role_set_deduplicates_wire_data() {
    let roles: RoleSet = serde_json::from_str(r#"["Presenter","Attendee","Presenter"]"#).unwrap();

    assert_eq!(roles.len(), 2);
    assert!(roles.contains(&Role::presenter()));
    assert_eq!(serde_json::to_string(&roles).unwrap(), r#"["Presenter","Attendee"]"#);
}

#[test]
fn test_session_context_json() {
    let ctx = SessionContext::new("meeting-1");
    let json = serde_json::to_string(&ctx).unwrap();
    assert_eq!(json, r#"{"sessionId":"meeting-1"}"#);
}
