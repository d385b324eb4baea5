//! HTTP surface and cache behavior of the analysis service.

mod common {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::sync::Notify;
    use tokio_util::sync::CancellationToken;

    use association_pulse::advisors::{AdvisorManager, AdvisorRegistry};
    use association_pulse::cache::AnalysisCache;
    use association_pulse::completion::{
        CompletionClient, CompletionError, CompletionRequest, CompletionResponse,
    };
    use association_pulse::repository::{RepositoryError, SubmissionRepository};
    use association_pulse::scoring::{OrganizationId, Submission};
    use association_pulse::AnalysisService;

    #[derive(Default)]
    pub(super) struct MemoryRepository {
        submissions: Mutex<HashMap<OrganizationId, Vec<Submission>>>,
    }

    impl SubmissionRepository for MemoryRepository {
        fn insert(&self, submission: Submission) -> Result<Submission, RepositoryError> {
            let mut guard = self
                .submissions
                .lock()
                .map_err(|_| RepositoryError::Unavailable("poisoned".into()))?;
            guard
                .entry(submission.organization_id.clone())
                .or_default()
                .push(submission.clone());
            Ok(submission)
        }

        fn latest(
            &self,
            organization_id: &OrganizationId,
        ) -> Result<Option<Submission>, RepositoryError> {
            let guard = self
                .submissions
                .lock()
                .map_err(|_| RepositoryError::Unavailable("poisoned".into()))?;
            Ok(guard
                .get(organization_id)
                .and_then(|history| history.iter().max_by_key(|s| s.timestamp))
                .cloned())
        }

        fn history(
            &self,
            organization_id: &OrganizationId,
        ) -> Result<Vec<Submission>, RepositoryError> {
            let guard = self
                .submissions
                .lock()
                .map_err(|_| RepositoryError::Unavailable("poisoned".into()))?;
            Ok(guard.get(organization_id).cloned().unwrap_or_default())
        }
    }

    pub(super) struct UnavailableRepository;

    impl SubmissionRepository for UnavailableRepository {
        fn insert(&self, _submission: Submission) -> Result<Submission, RepositoryError> {
            Err(RepositoryError::Unavailable("database offline".into()))
        }

        fn latest(&self, _: &OrganizationId) -> Result<Option<Submission>, RepositoryError> {
            Err(RepositoryError::Unavailable("database offline".into()))
        }

        fn history(&self, _: &OrganizationId) -> Result<Vec<Submission>, RepositoryError> {
            Err(RepositoryError::Unavailable("database offline".into()))
        }
    }

    /// Always fails, counting calls so cache hits are observable.
    #[derive(Default)]
    pub(super) struct CountingClient {
        pub(super) calls: AtomicUsize,
    }

    #[async_trait]
    impl CompletionClient for CountingClient {
        async fn generate_analysis(
            &self,
            _request: &CompletionRequest,
            _cancel: &CancellationToken,
        ) -> Result<CompletionResponse, CompletionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(CompletionError::Api {
                status: 500,
                message: "upstream error".into(),
            })
        }
    }

    /// Holds every call until released, signalling when the first arrives.
    #[derive(Default)]
    pub(super) struct GatedClient {
        pub(super) calls: AtomicUsize,
        pub(super) started: Notify,
        pub(super) release: CancellationToken,
    }

    #[async_trait]
    impl CompletionClient for GatedClient {
        async fn generate_analysis(
            &self,
            _request: &CompletionRequest,
            _cancel: &CancellationToken,
        ) -> Result<CompletionResponse, CompletionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.started.notify_one();
            self.release.cancelled().await;
            Err(CompletionError::Transport("gate released".into()))
        }
    }

    pub(super) fn service_with<R, C>(repository: R, client: Arc<C>) -> Arc<AnalysisService<R>>
    where
        R: SubmissionRepository + 'static,
        C: CompletionClient + 'static,
    {
        let client: Arc<dyn CompletionClient> = client;
        let manager = AdvisorManager::new(Arc::new(AdvisorRegistry::standard()), Some(client));
        Arc::new(AnalysisService::new(
            Arc::new(repository),
            manager,
            AnalysisCache::new(Duration::from_secs(300)),
        ))
    }

    pub(super) fn service() -> (Arc<AnalysisService<MemoryRepository>>, Arc<CountingClient>) {
        let client = Arc::new(CountingClient::default());
        (service_with(MemoryRepository::default(), client.clone()), client)
    }
}

use std::sync::atomic::Ordering;
use std::sync::Arc;

use association_pulse::analysis_router;
use association_pulse::scoring::{OrganizationId, Submission};
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use chrono::{Duration, Utc};
use common::*;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

async fn send(router: &axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn post_json(uri: &str, payload: &Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(payload).unwrap()))
        .unwrap()
}

fn submission_payload(organization_id: &str) -> Value {
    json!({
        "organizationId": organization_id,
        "responses": {
            "FI.LQ.001": "Yes",
            "FI.LQ.002": "Yes",
            "OP.SR.001": "Yes",
            "ZZ.UNKNOWN.001": "Yes"
        }
    })
}

#[tokio::test]
async fn submission_returns_snapshot_and_is_readable() {
    let (service, _) = service();
    let router = analysis_router(service);

    let (status, body) = send(
        &router,
        post_json("/api/v1/submissions", &submission_payload("ymca-api")),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["organizationId"], "ymca-api");
    assert_eq!(body["totalPoints"], 12);
    assert_eq!(body["categoryTotals"]["financial"], 8);
    assert_eq!(body["performanceTier"], "low");
    assert_eq!(body["supportDesignation"], "Y-USA Support");

    let (status, body) = send(
        &router,
        Request::get("/api/v1/organizations/ymca-api/snapshot?filter=unrestricted-access-only")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalPoints"], 8);
}

#[tokio::test]
async fn unknown_organization_and_bad_filter_are_client_errors() {
    let (service, _) = service();
    let router = analysis_router(service);

    let (status, body) = send(
        &router,
        Request::get("/api/v1/organizations/missing/snapshot")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "record not found");

    let (status, _) = send(
        &router,
        Request::post("/api/v1/organizations/missing/analysis")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(
        &router,
        Request::get("/api/v1/rubric/questions?filter=everything")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("everything"));
}

#[tokio::test]
async fn blank_organization_is_unprocessable() {
    let (service, _) = service();
    let router = analysis_router(service);

    let (status, _) = send(
        &router,
        post_json("/api/v1/submissions", &submission_payload("  ")),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn repository_outage_is_service_unavailable() {
    let client = Arc::new(CountingClient::default());
    let router = analysis_router(service_with(UnavailableRepository, client));

    let (status, _) = send(
        &router,
        post_json("/api/v1/submissions", &submission_payload("ymca-api")),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn analysis_is_cached_until_invalidated() {
    let (service, client) = service();
    let router = analysis_router(service);
    send(
        &router,
        post_json("/api/v1/submissions", &submission_payload("ymca-cache")),
    )
    .await;

    let analysis_request = || {
        Request::post("/api/v1/organizations/ymca-cache/analysis")
            .body(Body::empty())
            .unwrap()
    };

    let (status, first) = send(&router, analysis_request()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["summary"]["fallbackAnalyses"], 5);
    assert!(first["advisorInsights"]["financial"]["recommendedActions"]["immediate"]
        .as_array()
        .is_some_and(|items| !items.is_empty()));
    assert_eq!(client.calls.load(Ordering::SeqCst), 5);

    let (_, second) = send(&router, analysis_request()).await;
    assert_eq!(second["timestamp"], first["timestamp"]);
    assert_eq!(client.calls.load(Ordering::SeqCst), 5);

    let (status, body) = send(
        &router,
        Request::delete("/api/v1/organizations/ymca-cache/analysis")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    send(&router, analysis_request()).await;
    assert_eq!(client.calls.load(Ordering::SeqCst), 10);
}

#[tokio::test]
async fn new_submission_invalidates_cached_analysis() {
    let (service, client) = service();
    let org = OrganizationId::new("ymca-resubmit");

    let mut first = Submission::new(org.clone(), [("FI.LQ.001", "Yes")].into_iter().collect());
    first.timestamp = Utc::now() - Duration::days(30);
    service.submit(first).expect("stored");

    let before = service
        .comprehensive_analysis(&org, &CancellationToken::new())
        .await
        .expect("analysis");
    assert_eq!(before.overall_assessment.score, 4);

    let all_liquidity = [
        ("FI.LQ.001", "Yes"),
        ("FI.LQ.002", "Yes"),
        ("FI.LQ.003", "Yes"),
    ];
    service
        .submit(Submission::new(org.clone(), all_liquidity.into_iter().collect()))
        .expect("stored");

    let after = service
        .comprehensive_analysis(&org, &CancellationToken::new())
        .await
        .expect("analysis");
    assert_eq!(after.overall_assessment.score, 12);
    assert_eq!(client.calls.load(Ordering::SeqCst), 10);
    assert_eq!(service.history(&org).expect("history").len(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn submission_during_a_run_keeps_the_old_report_out_of_the_cache() {
    let client = Arc::new(GatedClient::default());
    let service = service_with(MemoryRepository::default(), Arc::clone(&client));
    let org = OrganizationId::new("ymca-race");

    let mut first = Submission::new(org.clone(), [("FI.LQ.001", "Yes")].into_iter().collect());
    first.timestamp = Utc::now() - Duration::days(30);
    service.submit(first).expect("stored");

    let running = {
        let service = Arc::clone(&service);
        let org = org.clone();
        tokio::spawn(async move {
            service
                .comprehensive_analysis(&org, &CancellationToken::new())
                .await
        })
    };

    client.started.notified().await;
    let all_liquidity = [
        ("FI.LQ.001", "Yes"),
        ("FI.LQ.002", "Yes"),
        ("FI.LQ.003", "Yes"),
    ];
    service
        .submit(Submission::new(org.clone(), all_liquidity.into_iter().collect()))
        .expect("stored");
    client.release.cancel();

    let stale = running.await.expect("task joins").expect("analysis");
    assert_eq!(stale.overall_assessment.score, 4);

    let fresh = service
        .comprehensive_analysis(&org, &CancellationToken::new())
        .await
        .expect("analysis");
    assert_eq!(fresh.overall_assessment.score, 12);
    assert_eq!(client.calls.load(Ordering::SeqCst), 10);
}

#[tokio::test]
async fn cancelled_analysis_is_not_cached() {
    let (service, client) = service();
    let org = OrganizationId::new("ymca-cancel");
    service
        .submit(Submission::new(org.clone(), Default::default()))
        .expect("stored");

    let cancel = CancellationToken::new();
    cancel.cancel();
    assert!(service.comprehensive_analysis(&org, &cancel).await.is_err());

    service
        .comprehensive_analysis(&org, &CancellationToken::new())
        .await
        .expect("fresh run");
    assert_eq!(client.calls.load(Ordering::SeqCst), 5);
}

#[tokio::test]
async fn rubric_and_advisor_catalog_are_listed() {
    let (service, _) = service();
    let router = analysis_router(service);

    let (status, body) = send(
        &router,
        Request::get("/api/v1/rubric/questions?filter=restricted-access-only")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["filter"], "restricted-access-only");
    let questions = body["questions"].as_array().unwrap();
    assert!(!questions.is_empty());
    assert!(questions.iter().all(|q| q["access"] == "restricted"));

    let (status, body) = send(
        &router,
        Request::get("/api/v1/advisors").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["completionService"], true);
    assert_eq!(body["advisors"][0]["id"], "financial");
    assert_eq!(body["advisors"].as_array().map(Vec::len), Some(5));
}
