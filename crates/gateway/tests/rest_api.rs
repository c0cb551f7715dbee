use http_body_util::BodyExt;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{
        header::{
            ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
            ACCESS_CONTROL_REQUEST_HEADERS, ACCESS_CONTROL_REQUEST_METHOD, CONTENT_TYPE, ORIGIN,
        },
        Method, Request, StatusCode,
    },
    Router,
};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;
use vicinity_config::{DatabaseConfig, DiscoveryConfig};
use vicinity_database::{GeoPoint, MessageKind, NewMessage};
use vicinity_gateway::rest::IDENTITY_HEADER;
use vicinity_gateway::{create_router, GatewayState};

type TestResult<T = ()> = anyhow::Result<T>;

struct TestContext {
    _temp_dir: TempDir,
    state: GatewayState,
}

impl TestContext {
    async fn new() -> TestResult<Self> {
        let temp_dir = TempDir::new()?;
        let db_path = temp_dir.path().join("rest_api.sqlite");

        let config = DatabaseConfig {
            url: format!("sqlite://{}", db_path.display()),
            max_connections: 5,
        };
        let pool = vicinity_database::initialize_database(&config).await?;
        let state = GatewayState::new(pool, DiscoveryConfig::default());

        Ok(Self {
            _temp_dir: temp_dir,
            state,
        })
    }

    fn router(&self) -> Router {
        create_router(self.state.clone())
    }

    async fn insert_user(&self, username: &str, location: Option<GeoPoint>) -> TestResult<()> {
        self.state.users.register(username).await?;
        if let Some(point) = location {
            self.state.users.set_location(username, point).await?;
        }
        Ok(())
    }

    async fn send_text(&self, from: &str, to: &str, body: &str) -> TestResult<()> {
        self.state
            .messages
            .create(&NewMessage {
                from_user: from.to_string(),
                to_user: to.to_string(),
                body: body.to_string(),
                kind: MessageKind::Text,
            })
            .await?;
        Ok(())
    }
}

fn get_as(path: &str, caller: &str) -> TestResult<Request<Body>> {
    Ok(Request::builder()
        .uri(path)
        .header(IDENTITY_HEADER, caller)
        .body(Body::empty())?)
}

fn post_as(path: &str, caller: &str, payload: &Value) -> TestResult<Request<Body>> {
    Ok(Request::builder()
        .method(Method::POST)
        .uri(path)
        .header(IDENTITY_HEADER, caller)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(payload)?))?)
}

async fn json_body(response: axum::response::Response) -> TestResult<Value> {
    let bytes = response.into_body().collect().await?.to_bytes();
    Ok(serde_json::from_slice(&bytes)?)
}

mod router_tests {
    use super::*;

    #[tokio::test]
    async fn health_reports_ok() -> TestResult {
        let ctx = TestContext::new().await?;
        let response = ctx
            .router()
            .oneshot(Request::builder().uri("/api/health").body(Body::empty())?)
            .await?;

        assert_eq!(response.status(), StatusCode::OK);
        let payload = json_body(response).await?;
        assert_eq!(payload["status"], "ok");

        Ok(())
    }

    #[tokio::test]
    async fn openapi_document_is_served() -> TestResult {
        let ctx = TestContext::new().await?;
        let response = ctx
            .router()
            .oneshot(
                Request::builder()
                    .uri("/api-docs/openapi.json")
                    .body(Body::empty())?,
            )
            .await?;

        assert_eq!(response.status(), StatusCode::OK);
        let payload = json_body(response).await?;
        assert!(payload["paths"]["/api/discover"].is_object());

        Ok(())
    }

    #[tokio::test]
    async fn cors_preflight_allows_any_origin() -> TestResult {
        let ctx = TestContext::new().await?;
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/health")
            .header(ORIGIN, "https://example.com")
            .header(ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .header(ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
            .body(Body::empty())?;

        let response = ctx.router().oneshot(request).await?;
        assert!(
            matches!(
                response.status(),
                StatusCode::NO_CONTENT | StatusCode::OK
            ),
            "expected CORS preflight to succeed, got {}",
            response.status()
        );

        let allow_origin = response
            .headers()
            .get(ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();
        assert_eq!(allow_origin, "*");

        let allow_methods = response
            .headers()
            .get(ACCESS_CONTROL_ALLOW_METHODS)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_ascii_uppercase();
        assert!(
            allow_methods.contains("POST") && allow_methods.contains("DELETE"),
            "expected allowed methods to include POST and DELETE, got {}",
            allow_methods
        );

        Ok(())
    }
}

mod identity_tests {
    use super::*;

    #[tokio::test]
    async fn discover_without_identity_header_is_rejected() -> TestResult {
        let ctx = TestContext::new().await?;
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/discover")
            .body(Body::empty())?;

        let response = ctx.router().oneshot(request).await?;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let payload = json_body(response).await?;
        let message = payload["message"].as_str().unwrap_or_default();
        assert!(
            message.contains(IDENTITY_HEADER),
            "expected the missing header to be named, got {}",
            message
        );

        Ok(())
    }

    #[tokio::test]
    async fn blank_identity_header_is_rejected() -> TestResult {
        let ctx = TestContext::new().await?;
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/discover")
            .header(IDENTITY_HEADER, "   ")
            .body(Body::empty())?;

        let response = ctx.router().oneshot(request).await?;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        Ok(())
    }
}

mod discovery_tests {
    use super::*;

    #[tokio::test]
    async fn discover_for_unknown_caller_is_not_found() -> TestResult {
        let ctx = TestContext::new().await?;
        let response = ctx
            .router()
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/api/discover")
                    .header(IDENTITY_HEADER, "nobody")
                    .body(Body::empty())?,
            )
            .await?;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        Ok(())
    }

    #[tokio::test]
    async fn update_location_then_discover_ranks_peers() -> TestResult {
        let ctx = TestContext::new().await?;
        ctx.insert_user("alice", None).await?;
        ctx.insert_user("bob", Some(GeoPoint::new(13.405, 52.52)))
            .await?;
        // roughly 1100 km from Berlin, outside the default radius
        ctx.insert_user("carol", Some(GeoPoint::new(2.3522, 48.8566)))
            .await?;

        let router = ctx.router();
        let response = router
            .clone()
            .oneshot(post_as(
                "/api/update-location",
                "alice",
                &json!({ "longitude": 13.4, "latitude": 52.51 }),
            )?)
            .await?;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = router
            .oneshot(post_as("/api/discover", "alice", &json!({}))?)
            .await?;
        assert_eq!(response.status(), StatusCode::OK);

        let payload = json_body(response).await?;
        let peers = payload.as_array().expect("array of peers");
        assert_eq!(peers.len(), 1);
        assert_eq!(peers[0]["username"], "bob");
        assert!(peers[0]["distance_km"].as_f64().expect("ranked peer") < 2.0);

        Ok(())
    }

    #[tokio::test]
    async fn discover_without_location_lists_everyone_unranked() -> TestResult {
        let ctx = TestContext::new().await?;
        ctx.insert_user("alice", None).await?;
        ctx.insert_user("bob", Some(GeoPoint::new(13.405, 52.52)))
            .await?;
        ctx.insert_user("carol", None).await?;

        let response = ctx
            .router()
            .oneshot(post_as("/api/discover", "alice", &json!({}))?)
            .await?;
        assert_eq!(response.status(), StatusCode::OK);

        let payload = json_body(response).await?;
        let peers = payload.as_array().expect("array of peers");
        assert_eq!(peers.len(), 2);
        for peer in peers {
            assert!(peer.get("distance_km").is_none());
        }

        Ok(())
    }
}

mod chat_tests {
    use super::*;

    #[tokio::test]
    async fn history_active_chats_and_removal() -> TestResult {
        let ctx = TestContext::new().await?;
        ctx.insert_user("alice", None).await?;
        ctx.insert_user("bob", None).await?;

        ctx.state.sessions.find_or_create("alice", "bob").await?;
        ctx.send_text("alice", "bob", "hello").await?;
        ctx.send_text("bob", "alice", "hi back").await?;

        let router = ctx.router();

        let response = router
            .clone()
            .oneshot(get_as("/api/chat-history/bob", "alice")?)
            .await?;
        assert_eq!(response.status(), StatusCode::OK);
        let history = json_body(response).await?;
        let messages = history.as_array().expect("array of messages");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["body"], "hello");
        assert_eq!(messages[1]["from"], "bob");

        let response = router
            .clone()
            .oneshot(get_as("/api/active-chats", "bob")?)
            .await?;
        assert_eq!(response.status(), StatusCode::OK);
        let chats = json_body(response).await?;
        assert_eq!(chats.as_array().map(Vec::len), Some(1));
        assert_eq!(chats[0]["username"], "alice");

        let response = router
            .clone()
            .oneshot(post_as(
                "/api/remove-chat",
                "alice",
                &json!({ "username": "bob" }),
            )?)
            .await?;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = router
            .oneshot(get_as("/api/chat-history/bob", "alice")?)
            .await?;
        let history = json_body(response).await?;
        assert_eq!(history.as_array().map(Vec::len), Some(0));

        Ok(())
    }
}
