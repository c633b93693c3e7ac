use chrono::{TimeZone, Utc};
use secrecy::{ExposeSecret, SecretString};
use strava_notion_client::config::StravaConfig;
use strava_notion_client::retry::RetryPolicy;
use strava_notion_client::strava::ReqwestStravaClient;
use strava_notion_client::{ClientError, StravaClient};
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config(server: &MockServer) -> StravaConfig {
    StravaConfig {
        client_id: "123".into(),
        client_secret: SecretString::new("shh".into()),
        refresh_token: SecretString::new("refresh-me".into()),
        base_url: format!("{}/api/v3", server.uri()),
        oauth_url: format!("{}/oauth/token", server.uri()),
    }
}

fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_retries: 2,
        base_delay: std::time::Duration::from_millis(1),
    }
}

async fn mount_token(server: &MockServer, token: &str) {
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=refresh-me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": token,
            "refresh_token": "refresh-me",
            "expires_at": 1717430400
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn authenticate_exchanges_refresh_token() {
    let server = MockServer::start().await;
    mount_token(&server, "access-1").await;

    let client = ReqwestStravaClient::new(config(&server)).expect("client");
    let token = client.authenticate().await.expect("token");
    assert_eq!(token.expose_secret(), "access-1");
}

#[tokio::test]
async fn authenticate_rejected_refresh_token_is_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "message": "Bad Request",
            "errors": [{"resource": "RefreshToken", "code": "invalid"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = ReqwestStravaClient::new(config(&server))
        .expect("client")
        .with_retry(fast_retry());
    let err = client.authenticate().await.unwrap_err();
    assert!(matches!(err, ClientError::Auth(_)), "got {err:?}");
}

#[tokio::test]
async fn list_activities_pages_until_short_page() {
    let server = MockServer::start().await;
    mount_token(&server, "access-1").await;

    Mock::given(method("GET"))
        .and(path("/api/v3/athlete/activities"))
        .and(header("authorization", "Bearer access-1"))
        .and(query_param("page", "1"))
        .and(query_param("per_page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"id": 1, "name": "Morning Run", "type": "Run"},
            {"id": 2, "name": "Yoga", "type": "Yoga"}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v3/athlete/activities"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"id": 3, "name": "Commute", "sport_type": "Ride"}
        ])))
        .mount(&server)
        .await;

    let client = ReqwestStravaClient::new(config(&server))
        .expect("client")
        .with_page_size(2);
    let since = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
    let until = Utc.with_ymd_and_hms(2024, 6, 8, 0, 0, 0).unwrap();
    let acts = client.list_activities(since, until).await.expect("activities");

    assert_eq!(acts.iter().map(|a| a.id).collect::<Vec<_>>(), vec![1, 2, 3]);

    let received = server.received_requests().await.unwrap();
    let first_list = received
        .iter()
        .find(|r| r.url.path() == "/api/v3/athlete/activities")
        .expect("list request");
    let query = first_list.url.query().unwrap_or_default();
    assert!(query.contains(&format!("after={}", since.timestamp())));
    assert!(query.contains(&format!("before={}", until.timestamp())));
}

#[tokio::test]
async fn list_activities_retries_server_errors() {
    let server = MockServer::start().await;
    mount_token(&server, "access-1").await;

    Mock::given(method("GET"))
        .and(path("/api/v3/athlete/activities"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v3/athlete/activities"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!([{"id": 7, "type": "Swim"}])),
        )
        .mount(&server)
        .await;

    let client = ReqwestStravaClient::new(config(&server))
        .expect("client")
        .with_retry(fast_retry());
    let acts = client
        .list_activities(Utc::now() - chrono::Duration::days(7), Utc::now())
        .await
        .expect("activities after retry");
    assert_eq!(acts.len(), 1);
}

#[tokio::test]
async fn list_activities_surfaces_permanent_errors() {
    let server = MockServer::start().await;
    mount_token(&server, "access-1").await;

    Mock::given(method("GET"))
        .and(path("/api/v3/athlete/activities"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such athlete"))
        .expect(1)
        .mount(&server)
        .await;

    let client = ReqwestStravaClient::new(config(&server))
        .expect("client")
        .with_retry(fast_retry());
    let err = client
        .list_activities(Utc::now() - chrono::Duration::days(7), Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::NotFound(_)), "got {err:?}");
}
