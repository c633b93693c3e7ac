use secrecy::SecretString;
use serde_json::{Map, Value, json};
use strava_notion_client::config::NotionConfig;
use strava_notion_client::notion::ReqwestNotionClient;
use strava_notion_client::retry::RetryPolicy;
use strava_notion_client::{ClientError, NotionClient};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> ReqwestNotionClient {
    ReqwestNotionClient::new(NotionConfig {
        token: SecretString::new("secret_tok".into()),
        base_url: server.uri(),
    })
    .expect("client")
    .with_retry(RetryPolicy {
        max_retries: 2,
        base_delay: std::time::Duration::from_millis(1),
    })
}

#[tokio::test]
async fn query_follows_cursor_and_sends_headers() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/databases/db1/query"))
        .and(header("authorization", "Bearer secret_tok"))
        .and(header("notion-version", "2022-06-28"))
        .and(body_partial_json(json!({"start_cursor": "c2"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{"id": "p3", "properties": {}}],
            "has_more": false,
            "next_cursor": null
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/databases/db1/query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{"id": "p1", "properties": {}}, {"id": "p2", "properties": {}}],
            "has_more": true,
            "next_cursor": "c2"
        })))
        .mount(&server)
        .await;

    let filter = json!({"property": "Strava ID", "number": {"equals": 42}});
    let pages = client(&server)
        .query_database("db1", Some(filter.clone()))
        .await
        .expect("pages");
    assert_eq!(
        pages.iter().map(|p| p.id.as_str()).collect::<Vec<_>>(),
        vec!["p1", "p2", "p3"]
    );

    let received = server.received_requests().await.unwrap();
    let first: Value = serde_json::from_slice(&received[0].body).unwrap();
    assert_eq!(first["filter"], filter);
    assert!(first.get("start_cursor").is_none());
}

#[tokio::test]
async fn create_page_sends_parent_properties_and_icon() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/pages"))
        .and(body_partial_json(json!({
            "parent": {"database_id": "acts"},
            "icon": {"type": "emoji", "emoji": "\u{1F3C3}"},
            "properties": {"Strava ID": {"number": 42}}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "new-page"})))
        .expect(1)
        .mount(&server)
        .await;

    let mut props = Map::new();
    props.insert("Strava ID".into(), json!({"number": 42}));
    let page = client(&server)
        .create_page("acts", props, Some("\u{1F3C3}"))
        .await
        .expect("created");
    assert_eq!(page.id, "new-page");
}

#[tokio::test]
async fn update_page_patches_properties() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/pages/plan-1"))
        .and(body_partial_json(json!({
            "properties": {"Selection status": {"select": {"name": "Done"}}}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "plan-1"})))
        .expect(1)
        .mount(&server)
        .await;

    let mut props = Map::new();
    props.insert("Selection status".into(), json!({"select": {"name": "Done"}}));
    let page = client(&server)
        .update_page("plan-1", props)
        .await
        .expect("updated");
    assert_eq!(page.id, "plan-1");
}

#[tokio::test]
async fn rate_limit_is_retried_then_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/databases/db1/query"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/databases/db1/query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": [], "has_more": false})))
        .mount(&server)
        .await;

    let pages = client(&server)
        .query_database("db1", None)
        .await
        .expect("query after 429");
    assert!(pages.is_empty());
}

#[tokio::test]
async fn validation_errors_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/pages"))
        .respond_with(
            ResponseTemplate::new(400).set_body_string("Pace is not a property that exists."),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server)
        .create_page("acts", Map::new(), None)
        .await
        .unwrap_err();
    match err {
        ClientError::InvalidInput(msg) => assert!(msg.contains("Pace")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn empty_database_id_is_a_config_error() {
    let server = MockServer::start().await;
    let err = client(&server).query_database("", None).await.unwrap_err();
    assert!(matches!(err, ClientError::Config(_)));
}
