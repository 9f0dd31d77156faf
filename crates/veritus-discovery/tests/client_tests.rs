//! Veritus client tests against a mock server.

use futures::StreamExt;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use veritus_discovery::config::Config;
use veritus_discovery::coordinator::{Caller, JobCoordinator, PollEvent};
use veritus_discovery::error::{ClientError, PollFailure, SubmissionError};
use veritus_discovery::models::{CreateJobOptions, JobId, JobState, SearchType};
use veritus_discovery::VeritusClient;

async fn setup() -> (MockServer, VeritusClient) {
    let server = MockServer::start().await;
    let client = VeritusClient::new(&Config::for_testing(&server.uri())).unwrap();
    (server, client)
}

// =============================================================================
// Job creation
// =============================================================================

#[tokio::test]
async fn test_create_job_sends_body_and_filters() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/job/querySearch"))
        .and(header("authorization", "Bearer test-key"))
        .and(query_param("limit", "100"))
        .and(query_param("year", "2020:2024"))
        .and(body_json(json!({"query": "graph neural networks for chemistry", "enrich": true})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"jobId": "job-42"})))
        .expect(1)
        .mount(&server)
        .await;

    let options = CreateJobOptions::for_topic("graph neural networks for chemistry".into());

    let job_id = client.create_job(SearchType::QuerySearch, &options).await.unwrap();
    assert_eq!(job_id, JobId::new("job-42"));
}

#[tokio::test]
async fn test_create_job_error_body_message() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/job/keywordSearch"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"error": "phrases must not be empty"})),
        )
        .mount(&server)
        .await;

    let options = CreateJobOptions { phrases: Some(vec![]), ..CreateJobOptions::default() };
    let err = client.create_job(SearchType::KeywordSearch, &options).await.unwrap_err();

    match err {
        ClientError::BadRequest { message } => assert_eq!(message, "phrases must not be empty"),
        other => panic!("unexpected: {other:?}"),
    }
}

// =============================================================================
// Status mapping
// =============================================================================

#[tokio::test]
async fn test_rate_limit_maps_to_rate_limited() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/job/job-1"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "30"))
        .mount(&server)
        .await;

    let err = client.job_status(&JobId::new("job-1")).await.unwrap_err();
    assert!(err.is_rate_limited());
    assert_eq!(err.retry_after(), Some(std::time::Duration::from_secs(30)));
}

#[tokio::test]
async fn test_server_error_without_json_uses_fallback_message() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/job/job-1"))
        .respond_with(ResponseTemplate::new(503).set_body_string("<html>down</html>"))
        .mount(&server)
        .await;

    match client.job_status(&JobId::new("job-1")).await.unwrap_err() {
        ClientError::Server { status, message } => {
            assert_eq!(status, 503);
            assert_eq!(message, "Request failed with status 503");
        }
        other => panic!("unexpected: {other:?}"),
    }
}

#[tokio::test]
async fn test_not_found_and_unexpected_statuses() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/papers/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "Paper not found"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/papers/teapot"))
        .respond_with(ResponseTemplate::new(418))
        .mount(&server)
        .await;

    let err = client.get_paper("missing").await.unwrap_err();
    assert!(matches!(err, ClientError::NotFound { ref resource } if resource == "Paper not found"));
    assert_eq!(err.status(), Some(404));

    let err = client.get_paper("teapot").await.unwrap_err();
    assert!(matches!(err, ClientError::UnexpectedStatus { status: 418, .. }));
}

#[tokio::test]
async fn test_undecodable_body_is_parse_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/job/job-1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = client.job_status(&JobId::new("job-1")).await.unwrap_err();
    assert!(matches!(err, ClientError::Parse(_)));
    assert_eq!(err.status(), None);
}

// =============================================================================
// Paper normalization over the wire
// =============================================================================

#[tokio::test]
async fn test_job_results_are_normalized() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/job/job-7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{
                "id": 12345,
                "title": "Attention Is All You Need",
                "authors": [{"name": "Ashish Vaswani"}, {"name": "Noam Shazeer"}],
                "citationCount": 90000,
                "v_journal_name": "NeurIPS",
                "v_quartile_ranking": "Q1",
                "titleLink": "https://example.org/attention"
            }]
        })))
        .mount(&server)
        .await;

    let payload = client.job_status(&JobId::new("job-7")).await.unwrap();
    let JobState::Succeeded(papers) = payload.into_state() else {
        panic!("results without status should count as success");
    };

    let paper = &papers[0];
    assert_eq!(paper.id, "12345");
    assert_eq!(paper.authors, "Ashish Vaswani, Noam Shazeer");
    assert_eq!(paper.citations(), 90000);
    assert_eq!(paper.journal_name.as_deref(), Some("NeurIPS"));
    assert_eq!(paper.quartile_ranking.as_deref(), Some("Q1"));
    assert_eq!(paper.best_link().as_deref(), Some("https://example.org/attention"));
}

#[tokio::test]
async fn test_search_papers_by_title() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/papers/search"))
        .and(query_param("title", "mamba"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "a", "title": "Mamba", "impactFactor": {"citationCount": 3100}}
        ])))
        .mount(&server)
        .await;

    let papers = client.search_papers("mamba").await.unwrap();
    assert_eq!(papers.len(), 1);
    assert_eq!(papers[0].citations(), 3100);
}

// =============================================================================
// Coordinator over HTTP
// =============================================================================

#[tokio::test]
async fn test_topic_search_end_to_end() {
    let server = MockServer::start().await;
    let config = Config::for_testing(&server.uri());
    let client = VeritusClient::new(&config).unwrap();
    let coordinator = JobCoordinator::new(std::sync::Arc::new(client), config.poll_policy.clone());

    Mock::given(method("POST"))
        .and(path("/api/v1/job/querySearch"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"jobId": "job-42"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/job/job-42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "queued"})))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/job/job-42"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .with_priority(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/job/job-42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "results": [{"id": "p1", "title": "Quantum advantage"}]
        })))
        .mount(&server)
        .await;

    let handle = coordinator.submit(&Caller::User("u".into()), "quantum computing").await.unwrap();
    let events: Vec<PollEvent> = coordinator.poll(handle).collect().await;

    assert_eq!(events.len(), 2);
    assert!(matches!(events[0], PollEvent::Pending { attempt: 1, .. }));
    assert!(matches!(events[1], PollEvent::Succeeded(ref papers) if papers[0].title == "Quantum advantage"));
}

#[tokio::test]
async fn test_poll_fails_on_server_error() {
    let server = MockServer::start().await;
    let config = Config::for_testing(&server.uri());
    let coordinator = JobCoordinator::new(
        std::sync::Arc::new(VeritusClient::new(&config).unwrap()),
        config.poll_policy.clone(),
    );

    Mock::given(method("GET"))
        .and(path("/api/v1/job/job-9"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": "boom"})))
        .expect(1)
        .mount(&server)
        .await;

    let handle = veritus_discovery::JobHandle::from_id(JobId::new("job-9"));
    let events: Vec<PollEvent> = coordinator.poll(handle).collect().await;

    assert!(matches!(&events[..], [PollEvent::Failed(PollFailure::Transient(reason))] if reason.contains("boom")));
}

#[tokio::test]
async fn test_mistyped_paper_fields_do_not_fail_the_job() {
    let server = MockServer::start().await;
    let config = Config::for_testing(&server.uri());
    let coordinator = JobCoordinator::new(
        std::sync::Arc::new(VeritusClient::new(&config).unwrap()),
        config.poll_policy.clone(),
    );

    Mock::given(method("GET"))
        .and(path("/api/v1/job/job-5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "results": [
                {"id": "p1"},
                {"id": "p2", "year": "2023", "score": "high", "citationCount": "7",
                 "fieldsOfStudy": [{"category": "Physics"}], "isOpenAccess": 1}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let handle = veritus_discovery::JobHandle::from_id(JobId::new("job-5"));
    let events: Vec<PollEvent> = coordinator.poll(handle).collect().await;

    let [PollEvent::Succeeded(papers)] = &events[..] else {
        panic!("expected a single success, got {events:?}");
    };
    assert_eq!(papers.len(), 2);
    assert_eq!(papers[0].id, "p1");
    assert_eq!(papers[1].year, Some(2023));
    assert_eq!(papers[1].score, None);
    assert_eq!(papers[1].citations(), 7);
    assert_eq!(papers[1].fields_of_study, vec!["Physics".to_string()]);
    assert_eq!(papers[1].is_open_access, None);
}

#[tokio::test]
async fn test_credits_passthrough() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/user/getCredits"))
        .and(header("authorization", "Bearer test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"credits": 120})))
        .expect(1)
        .mount(&server)
        .await;

    assert_eq!(client.credits().await.unwrap(), json!({"credits": 120}));
}

#[tokio::test]
async fn test_unreachable_service_is_network_error() {
    let config = Config::for_testing("http://127.0.0.1:1");
    let coordinator = JobCoordinator::new(
        std::sync::Arc::new(VeritusClient::new(&config).unwrap()),
        config.poll_policy.clone(),
    );

    let err = coordinator.submit(&Caller::User("u".into()), "graphs").await.unwrap_err();
    assert!(matches!(err, SubmissionError::Network(_)));
}
