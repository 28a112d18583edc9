use async_trait::async_trait;
use authkestra_core::{AuthError, FetchError, OAuth2Client, OAuthProvider};
use authkestra_providers_fortytwo::{FieldSpec, FortyTwoProvider, PROFILE_URL};
use http::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use std::time::Duration;

const BODY: &str = r#"{ "id": 46, "email": "codooku@student.42.fr", "login": "codooku", "first_name": "Count", "last_name": "Dooku", "url": "https://api.intra.42.fr/v2/users/codooku", "phone": null, "displayname": "Count Dooku", "image_url": "https://cdn.intra.42.fr/images/empty.png" }"#;

/// Answers every request with the same outcome and records what it was asked.
struct StubClient {
    expected_url: String,
    outcome: fn() -> Result<String, FetchError>,
    delay: Option<Duration>,
    seen_headers: Mutex<Option<HeaderMap>>,
}

impl StubClient {
    fn new(expected_url: &str, outcome: fn() -> Result<String, FetchError>) -> Self {
        Self {
            expected_url: expected_url.to_string(),
            outcome,
            delay: None,
            seen_headers: Mutex::new(None),
        }
    }
}

#[async_trait]
impl OAuth2Client for StubClient {
    async fn get(
        &self,
        url: &str,
        access_token: &str,
        headers: &HeaderMap,
    ) -> Result<String, FetchError> {
        *self.seen_headers.lock().unwrap() = Some(headers.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if url != self.expected_url {
            return Err(FetchError::new("wrong url argument"));
        }
        if access_token != "token" {
            return Err(FetchError::new("wrong token argument"));
        }
        (self.outcome)()
    }
}

fn provider(client: Arc<StubClient>) -> FortyTwoProvider {
    FortyTwoProvider::new(
        "ABC123".to_string(),
        "secret".to_string(),
        "https://www.example.net/auth/42/callback".to_string(),
    )
    .with_client(client)
}

fn ok_body() -> Result<String, FetchError> {
    Ok(BODY.to_string())
}

#[tokio::test]
async fn fetches_from_default_endpoint() {
    let client = Arc::new(StubClient::new(PROFILE_URL, ok_body));
    let profile = provider(client.clone()).user_profile("token").await.unwrap();

    assert_eq!(profile.provider, "42");
    assert_eq!(profile.id(), Some("46"));
    assert_eq!(profile.username(), Some("codooku"));
    assert_eq!(profile.display_name(), Some("Count Dooku"));
    assert_eq!(
        profile.get("profileUrl"),
        Some(&Value::from("https://api.intra.42.fr/v2/users/codooku"))
    );
    assert_eq!(profile.email(), Some("codooku@student.42.fr"));
    assert_eq!(profile.fields["emails"].as_array().map(Vec::len), Some(1));
    assert_eq!(
        profile.get("photos.0.value"),
        Some(&Value::from("https://cdn.intra.42.fr/images/empty.png"))
    );
    assert_eq!(profile.get("phoneNumbers.0.value"), Some(&Value::Null));
    assert_eq!(profile.raw, BODY);
    assert!(profile.json.is_object());

    let headers = client.seen_headers.lock().unwrap().clone().unwrap();
    assert_eq!(headers[USER_AGENT], "authkestra-providers-fortytwo");
}

#[tokio::test]
async fn fetches_from_custom_endpoint() {
    let client = Arc::new(StubClient::new("https://api.intra.42.fr/alpha/me", ok_body));
    let profile = provider(client)
        .with_profile_url("https://api.intra.42.fr/alpha/me")
        .user_profile("token")
        .await
        .unwrap();

    assert_eq!(profile.id(), Some("46"));
    assert_eq!(profile.username(), Some("codooku"));
}

#[tokio::test]
async fn applies_custom_profile_fields() {
    let client = Arc::new(StubClient::new(PROFILE_URL, ok_body));
    let profile = provider(client)
        .with_profile_fields(FieldSpec::from_paths([("login", "login")]))
        .user_profile("token")
        .await
        .unwrap();

    assert_eq!(profile.fields.len(), 1);
    assert_eq!(profile.fields["login"], "codooku");
    assert_eq!(profile.json["id"], 46);
}

#[tokio::test]
async fn fields_cannot_overwrite_the_provider_stamp() {
    let client = Arc::new(StubClient::new(PROFILE_URL, ok_body));
    let err = provider(client)
        .with_profile_fields(FieldSpec::from_paths([("provider", "login")]))
        .user_profile("token")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Mapping(_)), "{err:?}");

    let client = Arc::new(StubClient::new(PROFILE_URL, ok_body));
    let profile = provider(client).user_profile("token").await.unwrap();
    let serialized = serde_json::to_string(&profile).unwrap();
    assert_eq!(serialized.matches(r#""provider":"#).count(), 1);
}

#[tokio::test]
async fn error_body_message_is_surfaced() {
    let client = Arc::new(StubClient::new(PROFILE_URL, || {
        Err(FetchError::new("Request failed with status 400")
            .with_status(400)
            .with_data(r#"{"message":"Bad credentials"}"#))
    }));
    let err = provider(client).user_profile("token").await.unwrap_err();

    match err {
        AuthError::Upstream { ref message, ref source } => {
            assert_eq!(message, "Bad credentials");
            assert_eq!(source.status, Some(400));
        }
        other => panic!("expected an upstream error, got {other:?}"),
    }
    assert_eq!(err.to_string(), "Bad credentials");
}

#[tokio::test]
async fn internal_error_falls_back_to_generic_message() {
    let client = Arc::new(StubClient::new(PROFILE_URL, || {
        Err(FetchError::new("something went wrong"))
    }));
    let err = provider(client).user_profile("token").await.unwrap_err();

    match err {
        AuthError::Upstream { message, source } => {
            assert_eq!(message, "Failed to fetch user profile");
            assert_eq!(source.to_string(), "something went wrong");
        }
        other => panic!("expected an upstream error, got {other:?}"),
    }
}

#[tokio::test]
async fn malformed_response_is_a_parse_error() {
    let client = Arc::new(StubClient::new(PROFILE_URL, || Ok("Hello, world.".to_string())));
    let err = provider(client).user_profile("token").await.unwrap_err();

    assert!(matches!(err, AuthError::Parse(_)));
    assert_eq!(err.to_string(), "Failed to parse user profile");
}

#[tokio::test]
async fn slow_responses_hit_the_deadline() {
    let mut stub = StubClient::new(PROFILE_URL, ok_body);
    stub.delay = Some(Duration::from_secs(5));
    let err = provider(Arc::new(stub))
        .with_timeout(Duration::from_millis(20))
        .user_profile("token")
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::Upstream { .. }));
    assert_eq!(err.to_string(), "Timed out fetching user profile");
}

#[tokio::test]
async fn custom_headers_are_forwarded() {
    let client = Arc::new(StubClient::new(PROFILE_URL, ok_body));
    provider(client.clone())
        .with_header(USER_AGENT, HeaderValue::from_static("example.test"))
        .user_profile("token")
        .await
        .unwrap();

    let headers = client.seen_headers.lock().unwrap().clone().unwrap();
    assert_eq!(headers[USER_AGENT], "example.test");
}
