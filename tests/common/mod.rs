#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, Response};
use axum::Router;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

use marketplace::db::services::{self as db_services, NewUser, ProductInput};
use marketplace::db::{self, entities::product, schema};
use marketplace::notifications::models::MailMessage;
use marketplace::notifications::senders::{MailSender, SenderError};
use marketplace::notifications::service::EmailService;
use marketplace::security::Role;
use marketplace::server::config::ServerConfig;
use marketplace::services::auth_service;
use marketplace::web::{create_axum_router, AppState};

pub const PASSWORD: &str = "password123";

/// Keeps every email instead of sending it, or fails every delivery.
#[derive(Default)]
pub struct RecordingSender {
    pub sent: Mutex<Vec<MailMessage>>,
    pub fail: bool,
}

#[async_trait]
impl MailSender for RecordingSender {
    async fn send(&self, message: &MailMessage) -> Result<(), SenderError> {
        if self.fail {
            return Err(SenderError::SendFailed("relay unavailable".to_string()));
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    pub mail: Arc<RecordingSender>,
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with_mail(RecordingSender::default()).await
}

pub async fn spawn_app_with_mail(sender: RecordingSender) -> TestApp {
    let mut config = ServerConfig::for_database("sqlite::memory:", "integration-secret");
    config.password_cost = 4;
    config.secure_cookies = false;

    let db_pool = db::connect(&config.database_url).await.unwrap();
    schema::bootstrap(&db_pool).await.unwrap();

    let mail = Arc::new(sender);
    let email_service = Arc::new(EmailService::new(mail.clone(), "shop@example.com"));
    let state = Arc::new(AppState::new(db_pool, Arc::new(config), email_service).unwrap());
    let router = create_axum_router(state.clone());
    TestApp { router, state, mail }
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn create_user(&self, email: &str, roles: &[Role]) -> i32 {
        let password_hash = auth_service::hash_password(PASSWORD, 4).unwrap();
        let new_user = NewUser {
            first_name: "Test".to_string(),
            surname: "User".to_string(),
            address: "1 Test Street".to_string(),
            email: email.to_string(),
            password_hash,
        };
        db_services::create_user(&self.state.db_pool, new_user, roles)
            .await
            .unwrap()
            .id
    }

    pub async fn client(&self, email: &str) -> (i32, String) {
        let id = self.create_user(email, &[Role::Client]).await;
        (id, self.token_for(email).await)
    }

    pub async fn admin(&self, email: &str) -> (i32, String) {
        let id = self.create_user(email, &[Role::Client, Role::Admin]).await;
        (id, self.token_for(email).await)
    }

    pub async fn token_for(&self, email: &str) -> String {
        let request = marketplace::web::models::LoginRequest {
            email: email.to_string(),
            password: PASSWORD.to_string(),
        };
        auth_service::login_user(&self.state.db_pool, request, &self.state.config.jwt_secret)
            .await
            .unwrap()
            .token
    }

    pub async fn product(&self, category: &str, price: f64) -> product::Model {
        let input = ProductInput {
            category: category.to_string(),
            price,
            ram: 8,
            cores: 4,
            storage: 160,
            transfer: 2000,
        };
        db_services::create_product(&self.state.db_pool, &input).await.unwrap()
    }
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

/// A page request carrying the session cookie.
pub fn page(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::COOKIE, format!("token={token}"))
        .body(Body::empty())
        .unwrap()
}

pub fn api(method: &str, uri: &str, token: Option<&str>, body: Option<serde_json::Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

pub fn location(response: &Response<Body>) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}
