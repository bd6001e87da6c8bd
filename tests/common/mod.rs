#![allow(dead_code)]

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use eventhub_server::config::Config;
use eventhub_server::routes::create_routes;
use eventhub_server::state::AppState;

pub const ADMIN_EMAIL: &str = "admin@eventhub.test";
pub const PASSWORD: &str = "password123";
pub const QR: &str = "data:image/png;base64,iVBORw0KGgo=";

pub struct TestApp {
    pub router: Router,
    pub config: Config,
    // Keeps the upload directory alive for the test's duration
    _uploads: TempDir,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Value,
}

impl TestResponse {
    pub fn data(&self) -> &Value {
        &self.body["data"]
    }

    pub fn error_message(&self) -> &str {
        self.body["error"]["message"].as_str().unwrap_or_default()
    }

    /// Value of the `token` cookie set by this response, if any.
    pub fn token(&self) -> Option<String> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find_map(|raw| {
                let pair = raw.split(';').next()?;
                let (name, value) = pair.split_once('=')?;
                (name.trim() == "token").then(|| value.trim().to_string())
            })
    }
}

impl TestApp {
    pub fn new() -> Self {
        let uploads = TempDir::new().unwrap();
        let config = Config::for_testing(uploads.path());
        let router = create_routes(AppState::in_memory(config.clone()));
        Self {
            router,
            config,
            _uploads: uploads,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// Raw body of a successful GET, for static files.
    pub async fn get_bytes(&self, uri: &str) -> Vec<u8> {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = self.router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec()
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::COOKIE, format!("token={token}"));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        self.send(builder.body(body).unwrap()).await
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.request(Method::GET, uri, None, token).await
    }

    pub async fn post(&self, uri: &str, body: Value, token: Option<&str>) -> TestResponse {
        self.request(Method::POST, uri, Some(body), token).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.request(Method::DELETE, uri, None, token).await
    }

    pub async fn register(&self, name: &str, email: &str) -> Value {
        let response = self
            .post(
                "/register",
                json!({ "name": name, "email": email, "password": PASSWORD }),
                None,
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
        response.data().clone()
    }

    /// Registers and logs in; returns the user id and the credential.
    pub async fn sign_up(&self, name: &str, email: &str) -> (String, String) {
        let profile = self.register(name, email).await;
        let login = self
            .post("/login", json!({ "email": email, "password": PASSWORD }), None)
            .await;
        assert_eq!(login.status, StatusCode::OK, "{:?}", login.body);
        let token = login.token().expect("login sets a token cookie");
        (profile["id"].as_str().unwrap().to_string(), token)
    }

    pub async fn create_event(&self, token: &str, title: &str) -> Value {
        let response = self
            .post(
                "/createEvent",
                json!({
                    "title": title,
                    "description": "An evening of demos",
                    "organizedBy": "Demo Club",
                    "eventDate": "2030-01-01",
                    "eventTime": "18:00",
                    "location": "Hall A",
                    "ticketPrice": 0
                }),
                Some(token),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
        response.data().clone()
    }

    pub async fn create_ticket(&self, token: &str, user_id: &str, event: &Value) -> TestResponse {
        self.post("/tickets", ticket_body(user_id, event), Some(token))
            .await
    }
}

pub fn ticket_body(user_id: &str, event: &Value) -> Value {
    json!({
        "userid": user_id,
        "eventid": event["id"],
        "ticketDetails": {
            "name": "Alice",
            "email": "alice@x.com",
            "eventname": event["title"],
            "eventdate": event["eventDate"],
            "eventtime": event["eventTime"],
            "ticketprice": event["ticketPrice"],
            "qr": QR
        }
    })
}
