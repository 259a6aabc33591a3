//! Integration tests for retention enforcement
//!
//! These tests drive the router and the enforcer over shared in-memory stores
//! and verify that:
//! - Consent revocations are honoured only after the grace period
//! - Erasure requests are honoured at the next pass
//! - PHI past the retention window is purged, recent PHI survives
//! - Audit entries inside the audit window survive every pass
//! - Overlapping passes are rejected

use chrono::{Duration, Utc};
use fake::faker::internet::en::SafeEmail;
use fake::Fake;
use phigate::adapters::memory::{InMemoryGeneralStore, InMemoryPhiStore};
use phigate::audit::{AuditLogger, AuditOperation, AuditSink, MemoryAuditSink};
use phigate::classification::{Classifier, CollectionPolicy};
use phigate::core::retention::{RetentionEnforcer, RetentionPolicy, DELETION_REQUESTS_TABLE, PHI_TABLE};
use phigate::core::router::Router;
use phigate::crypto::{EncryptionEngine, IndexHasher, KeyMaterial, StaticKeyResolver};
use phigate::domain::{
    AccessContext, CrudOperation, DeletionReason, KeyVersion, PhiGateError, StoreOutcome,
};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

struct Harness {
    router: Router,
    enforcer: Arc<RetentionEnforcer>,
    phi: Arc<InMemoryPhiStore>,
    sink: Arc<MemoryAuditSink>,
}

fn harness() -> Harness {
    let version = KeyVersion::new("v1").unwrap();
    let mut keys = HashMap::new();
    keys.insert(version.clone(), KeyMaterial::from_slice(&[9u8; 32]).unwrap());
    let engine = Arc::new(EncryptionEngine::new(Arc::new(
        StaticKeyResolver::new(version, keys).unwrap(),
    )));
    let hasher = IndexHasher::new(b"retention-integration-pepper").unwrap();

    let phi = Arc::new(InMemoryPhiStore::new());
    let sink = Arc::new(MemoryAuditSink::new());
    let audit = AuditLogger::new(sink.clone(), hasher.clone());

    let router = Router::new(
        Arc::new(Classifier::new(CollectionPolicy::default_health_platform())),
        engine,
        hasher,
        phi.clone(),
        Arc::new(InMemoryGeneralStore::new()),
        audit.clone(),
    );
    let enforcer = Arc::new(RetentionEnforcer::new(
        phi.clone(),
        audit,
        RetentionPolicy::default(),
    ));

    Harness {
        router,
        enforcer,
        phi,
        sink,
    }
}

fn ctx(user: &str) -> AccessContext {
    AccessContext::new(user, "self_access").with_consent(true)
}

async fn create_symptom(h: &Harness, user: &str) -> phigate::domain::RecordId {
    match h
        .router
        .store(
            json!({"user_id": user, "severity": 5}),
            "menopause_symptoms",
            CrudOperation::Create,
            &ctx(user),
        )
        .await
        .unwrap()
    {
        StoreOutcome::Created { id } => id,
        other => panic!("expected Created, got {other:?}"),
    }
}

#[tokio::test]
async fn test_consent_revocation_waits_for_grace_period() {
    let h = harness();
    create_symptom(&h, "user-a").await;
    create_symptom(&h, "user-a").await;
    create_symptom(&h, "user-b").await;

    let now = Utc::now();
    h.enforcer
        .file_deletion_request("user-a", DeletionReason::ConsentRevoked, &ctx("user-a"), now)
        .await
        .unwrap();

    let early = h.enforcer.run_pass(now + Duration::days(29)).await.unwrap();
    assert!(early.is_successful());
    assert_eq!(early.requests_processed, 0);
    assert_eq!(h.phi.raw_rows().await.len(), 3);

    let due = h.enforcer.run_pass(now + Duration::days(31)).await.unwrap();
    assert!(due.is_successful());
    assert_eq!(due.requests_processed, 1);
    assert_eq!(h.phi.raw_rows().await.len(), 1);

    let requests = h.phi.deletion_requests().await;
    assert_eq!(requests.len(), 1);
    assert!(requests[0].processed_at.is_some());

    let again = h.enforcer.run_pass(now + Duration::days(32)).await.unwrap();
    assert_eq!(again.requests_processed, 0);
}

#[tokio::test]
async fn test_erasure_request_is_due_immediately() {
    let h = harness();
    create_symptom(&h, "user-a").await;

    let now = Utc::now();
    let request = h
        .enforcer
        .file_deletion_request("user-a", DeletionReason::ErasureRequest, &ctx("user-a"), now)
        .await
        .unwrap();
    assert_eq!(request.effective_at, now);
    assert_ne!(request.owner_hash, "user-a");

    let summary = h.enforcer.run_pass(now).await.unwrap();
    assert_eq!(summary.requests_processed, 1);
    assert!(h.phi.raw_rows().await.is_empty());
}

#[tokio::test]
async fn test_deletion_request_filing_and_processing_are_audited() {
    let h = harness();
    create_symptom(&h, "user-a").await;

    let now = Utc::now();
    let request = h
        .enforcer
        .file_deletion_request("user-a", DeletionReason::ErasureRequest, &ctx("user-a"), now)
        .await
        .unwrap();
    h.enforcer.run_pass(now).await.unwrap();

    let filed = h.sink.entries(Some(DELETION_REQUESTS_TABLE)).await.unwrap();
    assert_eq!(filed.len(), 1);
    assert_eq!(filed[0].operation, AuditOperation::Insert);
    assert_eq!(filed[0].record_id.as_deref(), Some(request.id.to_string().as_str()));

    let cleanups: Vec<_> = h
        .sink
        .entries(Some(PHI_TABLE))
        .await
        .unwrap()
        .into_iter()
        .filter(|e| e.record_id.as_deref() == Some(request.id.to_string().as_str()))
        .collect();
    assert_eq!(cleanups.len(), 1);
    assert_eq!(cleanups[0].operation, AuditOperation::Cleanup);
    assert!(cleanups[0].success);
    let details = cleanups[0].details.as_ref().unwrap();
    assert_eq!(details["rows"], 1);
    assert_eq!(details["reason"], "erasure_request");
    assert!(!details.to_string().contains("user-a"));
}

#[tokio::test]
async fn test_phi_past_retention_window_is_purged() {
    let h = harness();
    let old = create_symptom(&h, "user-a").await;
    let recent = create_symptom(&h, "user-a").await;

    let now = Utc::now();
    h.phi.backdate(old, now - Duration::days(2556)).await;

    let summary = h.enforcer.run_pass(now).await.unwrap();
    assert!(summary.is_successful());
    assert_eq!(summary.phi_purged, 1);

    let remaining = h.phi.raw_rows().await;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, recent);
}

#[tokio::test]
async fn test_audit_entries_inside_window_survive() {
    let h = harness();
    create_symptom(&h, "user-a").await;

    let mut ancient = h
        .router
        .audit()
        .entry(&ctx("user-a"), "menopause_symptoms", AuditOperation::Select);
    ancient.timestamp = Utc::now() - Duration::days(3651);
    h.sink.append(&ancient).await.unwrap();

    let summary = h.enforcer.run_pass(Utc::now()).await.unwrap();
    assert_eq!(summary.audit_purged, 1);

    let entries = h.sink.entries(None).await.unwrap();
    assert!(entries.iter().all(|e| e.id != ancient.id));
    assert!(entries
        .iter()
        .any(|e| e.table_name == "menopause_symptoms" && e.operation == AuditOperation::Insert));
}

#[tokio::test]
async fn test_store_outage_is_reported_and_audited() {
    let h = harness();
    h.phi.set_available(false);

    let summary = h.enforcer.run_pass(Utc::now()).await.unwrap();
    assert!(!summary.is_successful());
    let steps: Vec<&str> = summary.errors.iter().map(|e| e.step.as_str()).collect();
    assert_eq!(steps, vec!["deletion_requests", PHI_TABLE]);

    let failed: Vec<_> = h
        .sink
        .entries(Some(PHI_TABLE))
        .await
        .unwrap()
        .into_iter()
        .filter(|e| !e.success)
        .collect();
    assert_eq!(failed.len(), 2);
}

#[tokio::test]
async fn test_concurrent_passes_do_not_overlap() {
    let h = harness();
    let (a, b) = tokio::join!(h.enforcer.run_pass(Utc::now()), h.enforcer.run_pass(Utc::now()));

    let outcomes = [a, b];
    let rejected = outcomes
        .iter()
        .filter(|r| matches!(r, Err(PhiGateError::EnforcementInProgress)))
        .count();
    let completed = outcomes.iter().filter(|r| r.is_ok()).count();
    assert_eq!(completed + rejected, 2);
    assert!(completed >= 1);
}

#[tokio::test]
async fn test_deletion_request_requires_access_context() {
    let h = harness();
    let err = h
        .enforcer
        .file_deletion_request(
            "user-a",
            DeletionReason::ConsentRevoked,
            &AccessContext::new("", "consent_revoked"),
            Utc::now(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, PhiGateError::Validation(_)));
    assert!(h.phi.deletion_requests().await.is_empty());
}

#[tokio::test]
async fn test_erasure_removes_only_the_requesting_owner() {
    let h = harness();
    let owners: Vec<String> = (0..5).map(|_| SafeEmail().fake()).collect();
    for owner in &owners {
        create_symptom(&h, owner).await;
    }

    let now = Utc::now();
    h.enforcer
        .file_deletion_request(&owners[0], DeletionReason::ErasureRequest, &ctx(&owners[0]), now)
        .await
        .unwrap();
    h.enforcer.run_pass(now).await.unwrap();

    let erased = h.router.audit().hasher().owner(&owners[0]);
    let remaining = h.phi.raw_rows().await;
    assert!(remaining.iter().all(|r| r.owner_hash != erased));
    assert_eq!(
        remaining.len(),
        owners.iter().filter(|o| *o != &owners[0]).count()
    );
}

#[tokio::test]
async fn test_erasure_covers_records_edited_by_a_clinician() {
    let h = harness();
    let id = create_symptom(&h, "patient-1").await;

    let clinician = AccessContext::new("clinician-7", "treatment");
    let outcome = h
        .router
        .store(
            json!({"id": id.to_string(), "severity": 6}),
            "menopause_symptoms",
            CrudOperation::Update,
            &clinician,
        )
        .await
        .unwrap();
    assert!(matches!(outcome, StoreOutcome::Updated { affected: 1 }));

    let now = Utc::now();
    h.enforcer
        .file_deletion_request(
            "patient-1",
            DeletionReason::ErasureRequest,
            &ctx("patient-1"),
            now,
        )
        .await
        .unwrap();
    let processed = h.enforcer.process_deletion_requests(now).await.unwrap();
    assert_eq!(processed, 1);

    assert!(h.phi.raw_rows().await.is_empty());
}
