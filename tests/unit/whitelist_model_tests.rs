//! Unit tests for the whitelist document model.

use channel_bouncer::models::whitelist::Whitelist;
use channel_bouncer::EventError;

#[test]
fn parses_channel_map_preserving_user_order() {
    let wl = Whitelist::from_document(r#"{"general": ["carol", "alice"], "ops": []}"#)
        .expect("valid")
        .expect("present");

    assert_eq!(wl.len(), 2);
    assert_eq!(
        wl.allowed_users("general").expect("well-formed entry"),
        Some(&["carol".to_owned(), "alice".to_owned()][..])
    );
    assert!(wl.is_governed("ops"), "empty list still governs the channel");
}

#[test]
fn absent_channel_is_not_governed() {
    let wl = Whitelist::from_document(r#"{"general": ["alice"]}"#)
        .expect("valid")
        .expect("present");

    assert!(!wl.is_governed("random"));
    assert_eq!(wl.allowed_users("random").expect("lookup"), None);
}

#[test]
fn channel_keys_are_case_sensitive() {
    let wl: Whitelist = [("general", vec!["alice"])].into_iter().collect();
    assert!(!wl.is_governed("General"));
}

#[test]
fn non_string_member_fails_lookup_of_that_channel() {
    let wl = Whitelist::from_document(r#"{"general": ["alice", 7]}"#)
        .expect("object parses")
        .expect("present");

    assert!(wl.is_governed("general"));
    assert!(matches!(
        wl.allowed_users("general"),
        Err(EventError::Configuration(_))
    ));
}

#[test]
fn invalid_entry_does_not_affect_other_channels() {
    let wl = Whitelist::from_document(r#"{"general": ["alice"], "ops": "dave"}"#)
        .expect("object parses")
        .expect("present");

    assert_eq!(wl.allowed_users("random").expect("ungoverned"), None);
    assert_eq!(
        wl.allowed_users("general").expect("well-formed entry"),
        Some(&["alice".to_owned()][..])
    );
    assert!(matches!(wl.validate(), Err(EventError::Configuration(_))));
}

#[test]
fn well_formed_document_validates() {
    let wl = Whitelist::from_document(r#"{"general": ["alice"], "ops": []}"#)
        .expect("valid")
        .expect("present");
    assert!(wl.validate().is_ok());
}

#[test]
fn invalid_entry_survives_edits_of_other_channels() {
    let mut wl = Whitelist::from_document(r#"{"ops": "dave"}"#)
        .expect("object parses")
        .expect("present");
    wl.allow("general", "alice");

    assert_eq!(
        wl.to_document().expect("serialize"),
        r#"{"general":["alice"],"ops":"dave"}"#
    );
}

#[test]
fn invalid_json_is_configuration_error() {
    let result = Whitelist::from_document("{general: alice");
    assert!(matches!(result, Err(EventError::Configuration(_))));
}

#[test]
fn allow_is_idempotent() {
    let mut wl = Whitelist::new();
    assert!(wl.allow("general", "alice"));
    assert!(!wl.allow("general", "alice"));
    assert_eq!(wl.allowed_users("general").expect("lookup").map(<[String]>::len), Some(1));
}

#[test]
fn revoke_unknown_is_noop() {
    let mut wl: Whitelist = [("general", vec!["alice"])].into_iter().collect();
    assert!(!wl.revoke("general", "bob"));
    assert!(!wl.revoke("random", "alice"));
    assert_eq!(wl.allowed_users("general").expect("lookup").map(<[String]>::len), Some(1));
}

#[test]
fn open_channel_removes_governance() {
    let mut wl: Whitelist = [("general", vec!["alice"])].into_iter().collect();
    assert!(wl.open_channel("general"));
    assert!(!wl.is_governed("general"));
    assert!(!wl.open_channel("general"));
}

#[test]
fn document_round_trips_through_storage_form() {
    let wl: Whitelist = [("general", vec!["alice", "carol"]), ("ops", vec![])]
        .into_iter()
        .collect();
    let raw = wl.to_document().expect("serialize");

    assert_eq!(raw, r#"{"general":["alice","carol"],"ops":[]}"#);
    assert_eq!(Whitelist::from_document(&raw).expect("valid"), Some(wl));
}
