use authkestra_core::{AuthError, OAuthProvider};
use authkestra_providers_fortytwo::{FortyTwoConfig, FortyTwoProvider};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CODOOKU: &str = include_str!("fixtures/codooku.json");

fn provider_for(server: &MockServer) -> FortyTwoProvider {
    FortyTwoProvider::from_config(FortyTwoConfig {
        client_id: "ABC123".to_string(),
        client_secret: "secret".to_string(),
        callback_url: "http://localhost:3000/auth/42/callback".to_string(),
        profile_url: Some(format!("{}/v2/me", server.uri())),
        user_agent: Some("example.test".to_string()),
        ..FortyTwoConfig::default()
    })
    .unwrap()
}

#[tokio::test]
async fn fetches_and_maps_the_profile() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/me"))
        .and(header("authorization", "Bearer s3cr1t-t0k3n"))
        .and(header("user-agent", "example.test"))
        .respond_with(ResponseTemplate::new(200).set_body_string(CODOOKU))
        .expect(1)
        .mount(&server)
        .await;

    let profile = provider_for(&server)
        .user_profile("s3cr1t-t0k3n")
        .await
        .unwrap();

    assert_eq!(profile.provider, "42");
    assert_eq!(profile.id(), Some("46"));
    assert_eq!(profile.username(), Some("codooku"));
    assert_eq!(profile.email(), Some("codooku@student.42.fr"));
    assert_eq!(profile.json["cursus_users"][0]["grade"], "Cadet");
}

#[tokio::test]
async fn rejected_token_reports_the_api_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/me"))
        .respond_with(
            ResponseTemplate::new(401).set_body_string(r#"{"message":"Bad credentials"}"#),
        )
        .mount(&server)
        .await;

    let err = provider_for(&server)
        .user_profile("expired")
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::Upstream { .. }));
    assert_eq!(err.to_string(), "Bad credentials");
}

#[tokio::test]
async fn html_error_page_uses_generic_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/me"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<h1>Bad Gateway</h1>"))
        .mount(&server)
        .await;

    let err = provider_for(&server)
        .user_profile("token")
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Failed to fetch user profile");
}
