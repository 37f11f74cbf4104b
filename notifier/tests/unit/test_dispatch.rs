//! Dispatcher tests against the mock API

use tokio_test::{assert_err, assert_ok};

use nrnotify::credentials::OwnerScope;
use nrnotify::dispatch::DispatchState;
use nrnotify::errors::NotifierError;
use nrnotify::models::{BuildResult, DeploymentRequest, FailureReason};
use nrnotify::template::Environment;

use crate::mock_api::{capture_logs, credential, MockApi, API_KEY};

fn owner() -> OwnerScope {
    OwnerScope::job("p")
}

#[tokio::test]
async fn test_failed_and_aborted_builds_are_skipped() {
    let mock = MockApi::start().await;
    let dispatcher = mock.dispatcher(vec![credential("cred1")]);
    let requests = vec![DeploymentRequest::new("cred1", "app1")];

    for build in [BuildResult::Failure, BuildResult::Aborted] {
        let outcome = assert_ok!(
            dispatcher
                .perform(build, &owner(), Some(&requests), &Environment::new())
                .await
        );
        assert_eq!(outcome.state, DispatchState::Skipped);
        assert!(outcome.overall_success());
        assert!(outcome.results.is_empty());
    }

    assert!(mock.requests().is_empty());
}

#[tokio::test]
async fn test_skip_applies_even_without_requests() {
    let mock = MockApi::start().await;
    let dispatcher = mock.dispatcher(vec![]);

    let outcome = assert_ok!(
        dispatcher
            .dispatch(BuildResult::Failure, &owner(), None, &Environment::new())
            .await
    );
    assert!(outcome.is_skipped());
}

#[tokio::test]
async fn test_missing_notifications_abort() {
    let mock = MockApi::start().await;
    let dispatcher = mock.dispatcher(vec![credential("cred1")]);
    let (logs, _guard) = capture_logs();

    let absent = dispatcher
        .dispatch(BuildResult::Success, &owner(), None, &Environment::new())
        .await;
    let err = assert_err!(absent);
    assert!(matches!(err, NotifierError::ConfigError(ref msg) if msg == "Missing notifications!"));
    assert!(err.is_fatal());

    let empty: Vec<DeploymentRequest> = Vec::new();
    let err = assert_err!(
        dispatcher
            .perform(BuildResult::Unstable, &owner(), Some(&empty), &Environment::new())
            .await
    );
    assert!(matches!(err, NotifierError::ConfigError(_)));

    assert!(mock.requests().is_empty());
    assert!(logs.contents().contains("Missing notifications!"));
}

#[tokio::test]
async fn test_round_trip_single_request() {
    let mock = MockApi::start().await;
    let dispatcher = mock.dispatcher(vec![credential("cred1")]);
    let requests = vec![DeploymentRequest::new("cred1", "app1")
        .with_description("d")
        .with_revision("r1")
        .with_changelog("c")
        .with_user("u")];

    let outcome = assert_ok!(
        dispatcher
            .perform(BuildResult::Success, &owner(), Some(&requests), &Environment::new())
            .await
    );

    assert!(outcome.overall_success());
    assert_eq!(outcome.state, DispatchState::Succeeded);
    assert_eq!(outcome.results.len(), 1);
    assert_eq!(outcome.results[0].application_id, "app1");
    assert!(outcome.results[0].succeeded());

    let posts = mock.deployment_posts();
    assert_eq!(posts.len(), 1);
    let post = &posts[0];
    assert_eq!(post.path, "/v2/applications/app1/deployments.json");
    assert_eq!(post.header("x-api-key"), Some(API_KEY));
    assert_eq!(post.header("accept"), Some("application/json"));
    assert_eq!(post.header("content-type"), Some("application/json"));
    assert_eq!(
        post.json(),
        serde_json::json!({
            "deployment": {"revision": "r1", "changelog": "c", "description": "d", "user": "u"}
        })
    );
}

#[tokio::test]
async fn test_remote_rejection_fails_dispatch() {
    let mock = MockApi::start().await;
    mock.set_deployment_status("app1", 403);
    let dispatcher = mock.dispatcher(vec![credential("cred1")]);
    let requests = vec![DeploymentRequest::new("cred1", "app1").with_revision("r1")];
    let (logs, _guard) = capture_logs();

    let outcome = assert_ok!(
        dispatcher
            .dispatch(BuildResult::Success, &owner(), Some(&requests), &Environment::new())
            .await
    );
    assert!(!outcome.overall_success());
    assert_eq!(outcome.state, DispatchState::Failed);
    assert!(matches!(
        outcome.results[0].failure(),
        Some(FailureReason::Remote(_))
    ));

    let err = assert_err!(outcome.into_result());
    assert!(matches!(err, NotifierError::NotifyFailed(_)));
    assert!(err.to_string().contains("Failed to notify"));

    let err = assert_err!(
        dispatcher
            .perform(BuildResult::Success, &owner(), Some(&requests), &Environment::new())
            .await
    );
    assert_eq!(err.to_string(), "Failed to notify New Relic");

    let output = logs.contents();
    assert!(output.contains("Failed to notify New Relic. Application ID: app1"));
    assert!(output.contains("403"));
    assert!(!output.contains(API_KEY));
}

#[tokio::test]
async fn test_unresolvable_and_valid_credentials() {
    let mock = MockApi::start().await;
    let dispatcher = mock.dispatcher(vec![credential("good-cred")]);
    let requests = vec![
        DeploymentRequest::new("bad-cred", "app-bad"),
        DeploymentRequest::new("good-cred", "app-good"),
    ];
    let (logs, _guard) = capture_logs();

    let outcome = assert_ok!(
        dispatcher
            .dispatch(BuildResult::Success, &owner(), Some(&requests), &Environment::new())
            .await
    );

    assert!(!outcome.overall_success());
    assert_eq!(
        outcome.results[0].failure(),
        Some(&FailureReason::InvalidCredentials)
    );
    assert!(outcome.results[1].succeeded());

    let output = logs.contents();
    let error_lines: Vec<&str> = output.lines().filter(|l| l.contains("ERROR")).collect();
    assert_eq!(error_lines.len(), 1);
    assert!(error_lines[0].contains("Invalid credentials for Application ID: app-bad"));
    assert!(output.contains("Notified New Relic. Application ID: app-good"));
    assert!(!output.contains(API_KEY));

    assert_eq!(mock.deployment_posts().len(), 1);
}

#[tokio::test]
async fn test_credential_failures_do_not_stop_other_requests() {
    let mock = MockApi::start().await;
    let dispatcher = mock.dispatcher(vec![credential("ok-1"), credential("ok-2")]);
    let requests = vec![
        DeploymentRequest::new("missing-1", "a"),
        DeploymentRequest::new("ok-1", "b"),
        DeploymentRequest::new("missing-2", "c"),
        DeploymentRequest::new("ok-2", "d"),
    ];

    let outcome = assert_ok!(
        dispatcher
            .dispatch(BuildResult::Success, &owner(), Some(&requests), &Environment::new())
            .await
    );

    let order: Vec<&str> = outcome
        .results
        .iter()
        .map(|r| r.application_id.as_str())
        .collect();
    assert_eq!(order, vec!["a", "b", "c", "d"]);

    let failed: Vec<&str> = outcome.failed().map(|r| r.api_key.as_str()).collect();
    assert_eq!(failed, vec!["missing-1", "missing-2"]);
    assert_eq!(outcome.succeeded().count(), 2);

    let paths: Vec<String> = mock.deployment_posts().into_iter().map(|r| r.path).collect();
    assert_eq!(
        paths,
        vec![
            "/v2/applications/b/deployments.json",
            "/v2/applications/d/deployments.json"
        ]
    );
}

#[tokio::test]
async fn test_job_scoped_credentials_follow_owner() {
    use nrnotify::credentials::CredentialScope;

    let mock = MockApi::start().await;
    let dispatcher = mock.dispatcher(vec![
        credential("scoped").with_scope(CredentialScope::Job("other".to_string()))
    ]);
    let requests = vec![DeploymentRequest::new("scoped", "app1")];

    let outcome = assert_ok!(
        dispatcher
            .dispatch(BuildResult::Success, &owner(), Some(&requests), &Environment::new())
            .await
    );
    assert_eq!(
        outcome.results[0].failure(),
        Some(&FailureReason::InvalidCredentials)
    );
    assert!(mock.requests().is_empty());
}

#[tokio::test]
async fn test_revision_length_boundary() {
    let mock = MockApi::start().await;
    let dispatcher = mock.dispatcher(vec![credential("cred1")]);

    let too_long = vec![DeploymentRequest::new("cred1", "app1").with_revision("r".repeat(127))];
    let outcome = assert_ok!(
        dispatcher
            .dispatch(BuildResult::Success, &owner(), Some(&too_long), &Environment::new())
            .await
    );
    assert!(matches!(
        outcome.results[0].failure(),
        Some(FailureReason::Validation(_))
    ));
    assert!(mock.requests().is_empty());

    let fits = vec![DeploymentRequest::new("cred1", "app1").with_revision("r".repeat(126))];
    let outcome = assert_ok!(
        dispatcher
            .dispatch(BuildResult::Success, &owner(), Some(&fits), &Environment::new())
            .await
    );
    assert!(outcome.overall_success());

    let posts = mock.deployment_posts();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].json()["deployment"]["revision"], "r".repeat(126));
}

#[tokio::test]
async fn test_validation_failure_does_not_stop_loop() {
    let mock = MockApi::start().await;
    let dispatcher = mock.dispatcher(vec![credential("cred1")]);
    let requests = vec![
        DeploymentRequest::new("cred1", "app1").with_user("u".repeat(40)),
        DeploymentRequest::new("cred1", "app2").with_user("deployer"),
    ];

    let outcome = assert_ok!(
        dispatcher
            .dispatch(BuildResult::Success, &owner(), Some(&requests), &Environment::new())
            .await
    );
    assert!(!outcome.results[0].succeeded());
    assert!(outcome.results[1].succeeded());
    assert_eq!(mock.deployment_posts().len(), 1);
}

#[tokio::test]
async fn test_placeholders_expand_from_build_environment() {
    let mock = MockApi::start().await;
    let dispatcher = mock.dispatcher(vec![credential("cred1")]);
    let requests = vec![DeploymentRequest::new("cred1", "app1")
        .with_description("Build #${BUILD_NUMBER}")
        .with_revision("%GIT_COMMIT%")
        .with_user("${UNSET_VARIABLE}")];

    let mut env = Environment::new();
    env.insert("BUILD_NUMBER", "17");
    env.insert("GIT_COMMIT", "0a1b2c3");

    assert_ok!(
        dispatcher
            .perform(BuildResult::Success, &owner(), Some(&requests), &env)
            .await
    );

    let body = mock.deployment_posts()[0].json();
    assert_eq!(body["deployment"]["description"], "Build #17");
    assert_eq!(body["deployment"]["revision"], "0a1b2c3");
    assert_eq!(body["deployment"]["user"], "${UNSET_VARIABLE}");
    assert!(body["deployment"].get("changelog").is_none());
}

#[tokio::test]
async fn test_transport_failure_is_recorded_per_request() {
    // bind and drop a listener to get a port nothing listens on
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = std::sync::Arc::new(
        nrnotify::http::newrelic::NewRelicClient::with_endpoint(format!("http://{}", addr))
            .unwrap(),
    );
    let store = std::sync::Arc::new(nrnotify::credentials::CredentialStore::new(vec![
        credential("cred1"),
    ]));
    let dispatcher = nrnotify::dispatch::DeploymentDispatcher::new(client, store);
    let requests = vec![
        DeploymentRequest::new("cred1", "app1"),
        DeploymentRequest::new("cred1", "app2"),
    ];

    let outcome = assert_ok!(
        dispatcher
            .dispatch(BuildResult::Success, &owner(), Some(&requests), &Environment::new())
            .await
    );
    assert_eq!(outcome.results.len(), 2);
    for result in &outcome.results {
        assert!(matches!(result.failure(), Some(FailureReason::Remote(_))));
    }
}
