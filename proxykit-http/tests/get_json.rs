use proxykit_http::{HttpClient, HttpError};
use serde::Deserialize;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Debug, Deserialize)]
struct Ip {
    ip: String,
}

#[tokio::test]
async fn decodes_success_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ip"))
        .and(query_param("format", "json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ip": "203.0.113.7"})))
        .mount(&server)
        .await;

    let client = HttpClient::new().unwrap();
    let got: Ip = client
        .get_json(&format!("{}/ip?format=json", server.uri()))
        .await
        .unwrap();
    assert_eq!(got.ip, "203.0.113.7");
}

#[tokio::test]
async fn server_errors_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/down"))
        .respond_with(ResponseTemplate::new(503).set_body_json(serde_json::json!({"error": "boom"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::new().unwrap();
    let err = client
        .get_json::<Ip>(&format!("{}/down", server.uri()))
        .await
        .unwrap_err();
    match err {
        HttpError::Api { status, message } => {
            assert_eq!(status.as_u16(), 503);
            assert_eq!(message, "boom");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn malformed_body_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/html"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .mount(&server)
        .await;

    let client = HttpClient::new().unwrap();
    let err = client
        .get_json::<Ip>(&format!("{}/html", server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(err, HttpError::Decode(_, ref snippet) if snippet.contains("<html>")));
}

#[tokio::test]
async fn invalid_url_is_rejected_before_sending() {
    let client = HttpClient::new().unwrap();
    let err = client.get_json::<Ip>("not a url").await.unwrap_err();
    assert!(matches!(err, HttpError::Url(_)));
}
