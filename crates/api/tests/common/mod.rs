#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, Method, Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use qgig_api::auth::jwt::JwtConfig;
use qgig_api::auth::roles::LegacyRolePolicy;
use qgig_api::config::ServerConfig;
use qgig_api::routes;
use qgig_api::state::AppState;
use qgig_db::{MemoryStore, PoolSettings};
use qgig_payments::{GatewayError, OrderRequest, OrderResponse, PaymentGateway, TransactionStatus};

pub const PASSWORD: &str = "correct-horse-battery";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        db: PoolSettings::default(),
        store_timeout: Duration::from_secs(5),
        gateway_timeout: Duration::from_millis(500),
        job_expiry_sweep: Duration::from_secs(60),
        legacy_role_policy: LegacyRolePolicy::Both,
        jwt: JwtConfig {
            secret: "integration-test-secret".to_string(),
            access_token_expiry_mins: 60,
            session_expiry_days: 7,
        },
    }
}

// ---------------------------------------------------------------------------
// Recording gateway
// ---------------------------------------------------------------------------

#[derive(Default)]
struct GatewayScript {
    fail_submit: bool,
    submit_delay: Option<Duration>,
    statuses: HashMap<String, String>,
}

/// In-process payment gateway that records every order and answers status
/// queries from a script.
#[derive(Default)]
pub struct RecordingGateway {
    script: Mutex<GatewayScript>,
    orders: Mutex<Vec<OrderRequest>>,
    status_queries: Mutex<Vec<String>>,
    next_id: AtomicU64,
}

impl RecordingGateway {
    /// Make every later order submission fail.
    pub fn fail_submissions(&self) {
        self.script.lock().unwrap().fail_submit = true;
    }

    /// Delay every later order submission.
    pub fn delay_submissions(&self, delay: Duration) {
        self.script.lock().unwrap().submit_delay = Some(delay);
    }

    /// Report `description` for `tracking_id` from now on.
    pub fn set_status(&self, tracking_id: &str, description: &str) {
        self.script
            .lock()
            .unwrap()
            .statuses
            .insert(tracking_id.to_string(), description.to_string());
    }

    pub fn orders(&self) -> Vec<OrderRequest> {
        self.orders.lock().unwrap().clone()
    }

    pub fn status_query_count(&self) -> usize {
        self.status_queries.lock().unwrap().len()
    }
}

#[async_trait]
impl PaymentGateway for RecordingGateway {
    fn currency(&self) -> &str {
        "UGX"
    }

    async fn request_auth_token(&self) -> Result<String, GatewayError> {
        Ok("test-token".to_string())
    }

    async fn register_callback_url(&self, _token: &str) -> Result<String, GatewayError> {
        Ok("test-ipn".to_string())
    }

    async fn submit_order(&self, order: &OrderRequest) -> Result<OrderResponse, GatewayError> {
        let (fail, delay) = {
            let script = self.script.lock().unwrap();
            (script.fail_submit, script.submit_delay)
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.orders.lock().unwrap().push(order.clone());
        if fail {
            return Err(GatewayError::Rejected("declined by test gateway".to_string()));
        }

        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(OrderResponse {
            order_tracking_id: Some(format!("TRK-{n}")),
            redirect_url: Some(format!("https://pay.test/redirect/{n}")),
            merchant_reference: Some(order.merchant_reference.clone()),
        })
    }

    async fn get_transaction_status(
        &self,
        order_tracking_id: &str,
    ) -> Result<TransactionStatus, GatewayError> {
        self.status_queries
            .lock()
            .unwrap()
            .push(order_tracking_id.to_string());
        let description = self
            .script
            .lock()
            .unwrap()
            .statuses
            .get(order_tracking_id)
            .cloned()
            .unwrap_or_else(|| "Pending".to_string());
        Ok(TransactionStatus {
            payment_status_description: description,
            transaction_id: Some(format!("TX-{order_tracking_id}")),
            payment_method: Some("MobileMoney".to_string()),
            amount: None,
            currency: None,
        })
    }
}

// ---------------------------------------------------------------------------
// App construction
// ---------------------------------------------------------------------------

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub gateway: Arc<RecordingGateway>,
}

/// Build the full application router over an in-memory store.
///
/// Mirrors the router construction in `main.rs` so integration tests
/// exercise the same middleware stack production uses.
pub fn build_test_app() -> TestApp {
    build_test_app_with(test_config())
}

pub fn build_test_app_with(config: ServerConfig) -> TestApp {
    let gateway = Arc::new(RecordingGateway::default());
    let request_timeout = Duration::from_secs(config.request_timeout_secs);
    let state = AppState::new(
        Arc::new(MemoryStore::new()),
        Arc::clone(&gateway) as Arc<dyn PaymentGateway>,
        config,
    );

    let cors = CorsLayer::new()
        .allow_origin(["http://localhost:5173".parse().unwrap()])
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600));

    let request_id_header = HeaderName::from_static("x-request-id");

    let router = Router::new()
        .merge(routes::health::router())
        .nest("/api/v1", routes::api_routes())
        .layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .layer(cors)
        .with_state(state.clone());

    TestApp {
        router,
        state,
        gateway,
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.clone().oneshot(request).await.unwrap()
}

pub async fn get(app: &Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None, None).await
}

pub async fn get_auth(app: &Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::GET, uri, Some(token), None).await
}

pub async fn post_json(app: &Router, uri: &str, body: Value) -> Response<Body> {
    send(app, Method::POST, uri, None, Some(body)).await
}

pub async fn post_json_auth(app: &Router, uri: &str, token: &str, body: Value) -> Response<Body> {
    send(app, Method::POST, uri, Some(token), Some(body)).await
}

pub async fn post_auth(app: &Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::POST, uri, Some(token), None).await
}

pub async fn put_json_auth(app: &Router, uri: &str, token: &str, body: Value) -> Response<Body> {
    send(app, Method::PUT, uri, Some(token), Some(body)).await
}

pub async fn delete_auth(app: &Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::DELETE, uri, Some(token), None).await
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Assert the status and the machine-readable error code of a response.
pub async fn assert_error(response: Response<Body>, status: StatusCode, code: &str) {
    assert_eq!(response.status(), status);
    let json = body_json(response).await;
    assert_eq!(json["code"], code, "unexpected error body: {json}");
}

// ---------------------------------------------------------------------------
// Actors
// ---------------------------------------------------------------------------

/// A registered, logged-in user.
#[derive(Debug, Clone)]
pub struct TestUser {
    pub user_id: i64,
    pub email: String,
    /// Token for the user's current active role.
    pub token: String,
    pub session_token: String,
    pub professional_id: i64,
    pub institution_id: i64,
}

/// Register and log in. The active role after login is `professional`.
pub async fn sign_up(app: &Router, name: &str) -> TestUser {
    let email = format!("{name}@qgig.test");
    let response = post_json(
        app,
        "/api/v1/auth/register",
        json!({ "email": email, "password": PASSWORD, "username": name }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = post_json(
        app,
        "/api/v1/auth/login",
        json!({ "email": email, "password": PASSWORD }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let login = body_json(response).await;
    let token = login["data"]["access_token"].as_str().unwrap().to_string();
    let session_token = login["data"]["session_token"].as_str().unwrap().to_string();

    let me = body_json(get_auth(app, "/api/v1/auth/me", &token).await).await;
    TestUser {
        user_id: me["data"]["user"]["id"].as_i64().unwrap(),
        email,
        token,
        session_token,
        professional_id: me["data"]["professional_id"].as_i64().unwrap(),
        institution_id: me["data"]["institution_id"].as_i64().unwrap(),
    }
}

/// Switch the user's active role and return a token claiming it.
pub async fn switch_role(app: &Router, user: &TestUser, role: &str) -> String {
    let response = post_json_auth(
        app,
        "/api/v1/auth/switch-role",
        &user.token,
        json!({ "role": role }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    json["data"]["access_token"].as_str().unwrap().to_string()
}

/// A user acting as an institution.
pub async fn institution(app: &Router, name: &str) -> TestUser {
    let mut user = sign_up(app, name).await;
    user.token = switch_role(app, &user, "institution").await;
    user
}

/// A user acting as a professional.
pub async fn professional(app: &Router, name: &str) -> TestUser {
    sign_up(app, name).await
}

/// Post a gig and return its JSON representation.
pub async fn create_job(app: &Router, owner: &TestUser, title: &str) -> Value {
    let response = post_json_auth(
        app,
        "/api/v1/jobs",
        &owner.token,
        json!({
            "title": title,
            "description": "Night shift cover on the medical ward",
            "location": "Kampala",
            "pay_amount": 150000.0,
            "duration_hours": 12.0,
            "is_urgent": true
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"].clone()
}

/// Express interest and return the interest JSON.
pub async fn express_interest(app: &Router, pro: &TestUser, job_id: i64) -> Value {
    let response = post_auth(
        app,
        &format!("/api/v1/jobs/{job_id}/express-interest"),
        &pro.token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"].clone()
}

/// Accept an interest as the job owner.
pub async fn accept_interest(app: &Router, owner: &TestUser, interest_id: i64) -> Value {
    let response = post_json_auth(
        app,
        &format!("/api/v1/interests/{interest_id}/respond"),
        &owner.token,
        json!({ "action": "accept" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await["data"].clone()
}

/// Notifications of `user`, newest first.
pub async fn notifications(app: &Router, user: &TestUser) -> Vec<Value> {
    let response = get_auth(app, "/api/v1/notifications", &user.token).await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await["data"]
        .as_array()
        .unwrap()
        .clone()
}

/// Gig with one accepted professional: `(owner, professional, job_id)`.
pub async fn assigned_gig(app: &Router) -> (TestUser, TestUser, i64) {
    let owner = institution(app, "ward_admin").await;
    let pro = professional(app, "nurse_amy").await;
    let job = create_job(app, &owner, "Ward cover").await;
    let job_id = job["id"].as_i64().unwrap();
    let interest = express_interest(app, &pro, job_id).await;
    accept_interest(app, &owner, interest["id"].as_i64().unwrap()).await;
    (owner, pro, job_id)
}
