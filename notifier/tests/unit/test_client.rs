//! New Relic client tests against the mock API

use tokio_test::{assert_err, assert_ok};

use nrnotify::credentials::ResolvedCredential;
use nrnotify::errors::NotifierError;
use nrnotify::http::{ApiVersion, ClientOptions, NewRelicClient, NotificationClient};

use crate::mock_api::{capture_logs, MockApi, API_KEY};

fn api_key() -> ResolvedCredential {
    ResolvedCredential::new("NewRelicCredential", API_KEY.to_string().into())
}

#[tokio::test]
async fn test_list_applications() {
    let mock = MockApi::start().await;
    let client = mock.client();

    let applications = assert_ok!(client.list_applications(&api_key()).await);
    assert_eq!(applications.len(), 2);
    assert_eq!(applications[0].id, "applicationId");
    assert_eq!(applications[0].name, "test");
    assert_eq!(applications[1].id, "12345");

    let requests = mock.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].path, "/v2/applications.json");
    assert_eq!(requests[0].header("x-api-key"), Some(API_KEY));
    assert_eq!(requests[0].header("accept"), Some("application/json"));
}

#[tokio::test]
async fn test_list_applications_unauthorized() {
    let mock = MockApi::start().await;
    mock.set_applications_response(401, r#"{"error":{"title":"Invalid API key"}}"#);

    let err = assert_err!(mock.client().list_applications(&api_key()).await);
    assert!(matches!(err, NotifierError::RemoteError(ref msg) if msg.contains("Invalid API key")));
    assert!(!err.to_string().contains(API_KEY));
}

#[tokio::test]
async fn test_list_applications_unparseable() {
    let mock = MockApi::start().await;

    mock.set_applications_response(200, "<html>not json</html>");
    let err = assert_err!(mock.client().list_applications(&api_key()).await);
    assert!(matches!(err, NotifierError::ProtocolError(_)));

    mock.set_applications_response(200, "");
    let err = assert_err!(mock.client().list_applications(&api_key()).await);
    assert!(matches!(err, NotifierError::ProtocolError(_)));
}

#[tokio::test]
async fn test_non_created_status_is_not_success() {
    let mock = MockApi::start().await;
    mock.set_deployment_status("app1", 500);
    mock.set_deployment_status("app2", 200);
    let client = mock.client();

    let sent = assert_ok!(
        client
            .send_notification(&api_key(), "app1", None, Some("r1"), None, None)
            .await
    );
    assert!(!sent);

    let sent = assert_ok!(
        client
            .send_notification(&api_key(), "app2", None, Some("r1"), None, None)
            .await
    );
    assert!(!sent);

    let sent = assert_ok!(
        client
            .send_notification(&api_key(), "app3", None, Some("r1"), None, None)
            .await
    );
    assert!(sent);
}

#[tokio::test]
async fn test_absent_fields_are_omitted() {
    let mock = MockApi::start().await;

    assert_ok!(
        mock.client()
            .send_notification(&api_key(), "app1", None, Some("r1"), None, None)
            .await
    );

    let body = mock.deployment_posts()[0].json();
    assert_eq!(body, serde_json::json!({"deployment": {"revision": "r1"}}));
}

#[tokio::test]
async fn test_oversized_fields_are_never_sent() {
    let mock = MockApi::start().await;
    let client = mock.client();
    let user = "u".repeat(31);

    let err = assert_err!(
        client
            .send_notification(&api_key(), "app1", None, None, None, Some(&user))
            .await
    );
    assert!(matches!(err, NotifierError::ValidationError(ref msg) if msg.contains("user")));
    assert!(mock.requests().is_empty());
}

#[tokio::test]
async fn test_legacy_form_notification() {
    let mock = MockApi::start().await;
    let client = NewRelicClient::new(&ClientOptions {
        endpoint: mock.url.clone(),
        api_version: ApiVersion::Legacy,
        ..Default::default()
    })
    .unwrap();

    let sent = assert_ok!(
        client
            .send_notification(
                &api_key(),
                "app1",
                Some("release notes"),
                Some("r1"),
                None,
                Some("deployer"),
            )
            .await
    );
    assert!(sent);

    let posts = mock.deployment_posts();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].path, "/deployments.xml");
    assert_eq!(posts[0].header("x-api-key"), Some(API_KEY));
    assert_eq!(
        posts[0].header("content-type"),
        Some("application/x-www-form-urlencoded")
    );
    assert_eq!(
        posts[0].body,
        "deployment%5Bapplication_id%5D=app1\
         &deployment%5Bdescription%5D=release+notes\
         &deployment%5Brevision%5D=r1\
         &deployment%5Buser%5D=deployer"
    );
}

#[tokio::test]
async fn test_application_id_stays_in_its_path_segment() {
    let mock = MockApi::start().await;
    let client = mock.client();

    for id in ["app1#frag", "../../deployments.xml?x=", "team/app"] {
        assert_ok!(
            client
                .send_notification(&api_key(), id, None, Some("r1"), None, None)
                .await
        );
    }

    let paths: Vec<String> = mock.deployment_posts().into_iter().map(|r| r.path).collect();
    assert_eq!(
        paths,
        vec![
            "/v2/applications/app1%23frag/deployments.json",
            "/v2/applications/..%2F..%2Fdeployments.xml%3Fx=/deployments.json",
            "/v2/applications/team%2Fapp/deployments.json",
        ]
    );
}

#[tokio::test]
async fn test_empty_application_id_is_rejected() {
    let mock = MockApi::start().await;
    let client = mock.client();

    for id in ["", "  ", ".."] {
        let err = assert_err!(
            client
                .send_notification(&api_key(), id, None, Some("r1"), None, None)
                .await
        );
        assert!(matches!(err, NotifierError::ValidationError(_)));
    }
    assert!(mock.requests().is_empty());
}

#[tokio::test]
async fn test_deployment_payload_is_logged() {
    let mock = MockApi::start().await;
    let (logs, _guard) = capture_logs();

    assert_ok!(
        mock.client()
            .send_notification(&api_key(), "app1", Some("d"), Some("r1"), None, None)
            .await
    );

    let output = logs.contents();
    assert!(output.contains(r#"Deployment for app1: {"deployment":{"revision":"r1","description":"d"}}"#));
    assert!(!output.contains(API_KEY));
}
