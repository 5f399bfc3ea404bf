use proxykit_config::ProbeSettings;
use proxykit_probe::{HttpIpProbe, IpProbe, IpReport, ProbeContext, ProbeError};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn settings(server: &MockServer) -> ProbeSettings {
    ProbeSettings {
        primary_ip_url: format!("{}/ipify", server.uri()),
        primary_geo_url: format!("{}/geo/", server.uri()),
        fallback_url: format!("{}/ipapi/json/", server.uri()),
        timeout_secs: 2,
        route_through_proxy: false,
    }
}

#[tokio::test]
async fn primary_lookup_fills_unknown_fields() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ipify"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ip": "203.0.113.7"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/geo/203.0.113.7/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "city": "Austin",
            "country": "US",
            "loc": "30.2,-97.7",
            "org": "AS64500 Example"
        })))
        .mount(&server)
        .await;

    let probe = HttpIpProbe::new(&settings(&server)).unwrap();
    let info = probe
        .detect(&ProbeContext::direct("firefox-container-1"))
        .await
        .unwrap();
    assert_eq!(info.ip, "203.0.113.7");
    assert_eq!(info.region, "Unknown");
    assert_eq!(info.location, "30.2,-97.7");
    assert!(info.detected > 0);
    assert_eq!(IpReport::from(&info).location, "Austin, Unknown US");
}

#[tokio::test]
async fn falls_back_when_primary_fails() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ipify"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ipapi/json/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ip": "198.51.100.4",
            "city": "Berlin",
            "region": "Land Berlin",
            "country_name": "Germany",
            "latitude": 52.5,
            "longitude": 13.4
        })))
        .mount(&server)
        .await;

    let probe = HttpIpProbe::new(&settings(&server)).unwrap();
    let info = probe.detect(&ProbeContext::direct("c")).await.unwrap();
    assert_eq!(info.ip, "198.51.100.4");
    assert_eq!(info.place(), "Berlin, Land Berlin Germany");
    assert_eq!(info.location, "52.5,13.4");
}

#[tokio::test]
async fn both_lookups_failing_is_exhausted() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let probe = HttpIpProbe::new(&settings(&server)).unwrap();
    let err = probe.detect(&ProbeContext::direct("c")).await.unwrap_err();
    assert!(matches!(err, ProbeError::Exhausted { .. }));
    let kit: proxykit_common::ProxyKitError = err.into();
    assert!(!kit.is_user_correctable());
}
