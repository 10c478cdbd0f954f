mod support;

use og_catalog_core::{
    ApiError, GroupKey, PrivacyCatalogService, SaveOutcome, ServiceError, SessionError,
};
use support::{group, privacy_control, FakeCatalogApi};

fn seeded() -> FakeCatalogApi {
    FakeCatalogApi::with_state(|state| {
        let mut access = privacy_control("P-01", "Access control policy", Some("tom-access-control"));
        access.tom_id = Some("AC-02".to_string());
        access.risk_hint = Some("High".to_string());
        let mut login = privacy_control("P-02", "Login throttling", Some("tom-access-control"));
        login.tom_id = Some("AC-01".to_string());
        let orphan = privacy_control("P-03", "Retention", Some("tom-retention"));
        let loose = privacy_control("P-04", "Awareness", None);
        for control in [access, login, orphan, loose] {
            state.privacy_controls.insert(control.id.clone(), control);
        }
        state.groups = vec![group("tom-access-control", "Access control", 2)];
    })
}

#[test]
fn grouped_controls_follow_group_then_tom_order() {
    let api = seeded();
    let mut service = PrivacyCatalogService::new(&api);
    service.load_controls().unwrap();
    let groups = api.state().groups.clone();

    let blocks = service.grouped_controls(&groups, "");
    let keys: Vec<_> = blocks.iter().map(|block| block.key.clone()).collect();
    assert_eq!(
        keys,
        vec![
            GroupKey::Known("tom-access-control".to_string()),
            GroupKey::Unknown("tom-retention".to_string()),
            GroupKey::Ungrouped,
        ]
    );
    let first: Vec<_> = blocks[0].items.iter().map(|item| item.id.as_str()).collect();
    assert_eq!(first, vec!["P-02", "P-01"]);

    let filtered = service.grouped_controls(&groups, "throttling");
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].items.len(), 1);
}

#[test]
fn save_replaces_snapshot_with_canonical_record() {
    let api = seeded();
    let mut service = PrivacyCatalogService::new(&api);
    service.load_controls().unwrap();
    service.select_control("P-01", false).unwrap();

    service.draft_mut().unwrap().title = "  Access control policy v2 ".to_string();
    assert!(service.is_dirty());
    let diff = service.local_diff().unwrap();
    assert_eq!(diff.changed_fields.len(), 1);

    let outcome = service.save_control().unwrap();
    let SaveOutcome::Saved(saved) = outcome else {
        panic!("expected a saved outcome");
    };
    assert_eq!(saved.title, "Access control policy v2");
    assert_eq!(service.session.draft().unwrap().title, "Access control policy v2");
    assert!(!service.is_dirty());
    assert_eq!(service.session.version(), Some("\"v2\""));
    assert!(service.session.notice.is_some());

    let entry = service
        .controls()
        .iter()
        .find(|control| control.id == "P-01")
        .unwrap();
    assert_eq!(entry.title, "Access control policy v2");
}

#[test]
fn failed_save_keeps_draft_and_reports_status_body() {
    let api = seeded();
    let mut service = PrivacyCatalogService::new(&api);
    service.select_control("P-01", false).unwrap();
    service
        .draft_mut()
        .unwrap()
        .set_typical_measures_text("MFA\n\n  Role review ");

    api.fail_next(
        "save_privacy_control",
        ApiError::Status {
            status: 500,
            body: "write failed".to_string(),
        },
    );
    let err = service.save_control().unwrap_err();
    assert!(matches!(err, ServiceError::Api(ApiError::Status { status: 500, .. })));
    assert_eq!(
        service.session.error.as_deref(),
        Some("Failed to save: HTTP 500: write failed")
    );
    assert_eq!(
        service.session.draft().unwrap().typical_measures,
        vec!["MFA".to_string(), "Role review".to_string()]
    );
    assert!(service.is_dirty());
}

#[test]
fn conflicting_save_reports_stored_diff_and_rebase_allows_retry() {
    let api = seeded();
    let mut service = PrivacyCatalogService::new(&api);
    service.select_control("P-01", false).unwrap();
    service.draft_mut().unwrap().statement = Some("Access is role based".to_string());

    {
        let mut state = api.state();
        state.privacy_controls.get_mut("P-01").unwrap().title = "Changed elsewhere".to_string();
        state.touch("privacy/P-01");
    }

    let SaveOutcome::Conflict(diff) = service.save_control().unwrap() else {
        panic!("expected a conflict");
    };
    assert!(diff.field_change("title").is_some());
    assert!(diff.field_change("statement").is_some());
    assert!(service.session.error.is_some());
    assert_eq!(
        service.session.draft().unwrap().statement.as_deref(),
        Some("Access is role based")
    );

    service.rebase_onto_stored().unwrap();
    assert_eq!(service.session.version(), Some("\"v2\""));
    assert_eq!(service.session.draft().unwrap().title, "Changed elsewhere");
    let pending = service.local_diff().unwrap();
    assert!(pending.field_change("title").is_none());
    assert!(pending.field_change("statement").is_some());

    assert!(matches!(
        service.save_control().unwrap(),
        SaveOutcome::Saved(_)
    ));
    let state = api.state();
    let stored = &state.privacy_controls["P-01"];
    assert_eq!(stored.title, "Changed elsewhere");
    assert_eq!(stored.statement.as_deref(), Some("Access is role based"));
}

#[test]
fn clearing_risk_hint_shows_up_in_stored_diff() {
    let api = seeded();
    let mut service = PrivacyCatalogService::new(&api);
    service.select_control("P-01", false).unwrap();
    service.draft_mut().unwrap().risk_hint = Some(String::new());

    let diff = service.diff_against_stored().unwrap();
    let change = diff.field_change("riskHint").unwrap();
    assert_eq!(change.before.as_deref(), Some("High"));
    assert_eq!(change.after, None);
}

#[test]
fn unsaved_changes_block_switching_until_discarded() {
    let api = seeded();
    let mut service = PrivacyCatalogService::new(&api);
    service.select_control("P-01", false).unwrap();
    service.draft_mut().unwrap().title = "Edited".to_string();

    let err = service.select_control("P-02", false).unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Session(SessionError::UnsavedChanges { .. })
    ));
    assert_eq!(service.session.selected_id(), Some("P-01"));

    service.select_control("P-02", true).unwrap();
    assert_eq!(service.session.draft().unwrap().id, "P-02");
}

#[test]
fn unknown_control_reports_not_found() {
    let api = seeded();
    let mut service = PrivacyCatalogService::new(&api);

    let err = service.select_control("P-99", false).unwrap_err();
    assert!(matches!(err, ServiceError::RecordNotFound(ref id) if id == "P-99"));
    assert!(service.session.draft().is_none());
    assert_eq!(
        service.session.error.as_deref(),
        Some("Failed to load details: record `P-99` not found")
    );
}
