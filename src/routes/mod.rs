use std::time::Duration;

use axum::error_handling::HandleErrorLayer;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::{BoxError, Router};
use tower::timeout::{error::Elapsed, TimeoutLayer};
use tower::ServiceBuilder;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::{create_cors_layer, create_security_headers_layer};
use crate::handlers::{events, health_check, tickets, users};
use crate::state::AppState;
use crate::utils::error::AppError;

/// Room for multipart boundaries and the text fields next to the image.
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn create_routes(state: AppState) -> Router {
    let config = state.config.clone();

    let api = Router::new()
        .nest("/users", user_routes())
        .nest("/events", event_routes())
        .nest("/tickets", ticket_routes());

    let router = Router::new()
        .route("/health", get(health_check))
        .merge(user_routes())
        // `/createEvent` and `/event/:id` are the paths the web client uses
        .route(
            "/createEvent",
            post(events::create_event).get(events::list_events),
        )
        .route(
            "/event/:id",
            get(events::get_event)
                .post(events::like_event)
                .delete(events::delete_event),
        )
        .route("/event/:id/ordersummary", get(events::get_event))
        .route(
            "/event/:id/ordersummary/paymentsummary",
            get(events::get_event),
        )
        .nest("/events", event_routes())
        .nest("/tickets", ticket_routes())
        .nest("/api", api)
        .nest_service("/uploads", ServeDir::new(state.images.dir()))
        .layer(DefaultBodyLimit::max(
            config.max_upload_bytes + FORM_OVERHEAD_BYTES,
        ));

    with_request_timeout(router, config.request_timeout)
        .layer(TraceLayer::new_for_http())
        .layer(create_security_headers_layer(&config))
        .layer(create_cors_layer(&config))
        .with_state(state)
}

fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(users::register))
        .route("/login", post(users::login))
        .route("/logout", post(users::logout))
        .route("/profile", get(users::profile).put(users::update_profile))
}

fn event_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(events::create_event).get(events::list_events))
        .route("/:id", get(events::get_event).delete(events::delete_event))
        .route("/:id/like", post(events::like_event))
}

fn ticket_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(tickets::create_ticket).get(tickets::list_tickets))
        .route(
            "/:id",
            get(tickets::get_ticket).delete(tickets::delete_ticket),
        )
        .route("/user/:user_id", get(tickets::list_tickets_for_user))
}

/// Requests running past `timeout` get a 408 in the usual error envelope.
fn with_request_timeout<S>(router: Router<S>, timeout: Duration) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(
        ServiceBuilder::new()
            .layer(HandleErrorLayer::new(handle_middleware_error))
            .layer(TimeoutLayer::new(timeout)),
    )
}

async fn handle_middleware_error(err: BoxError) -> AppError {
    if err.is::<Elapsed>() {
        AppError::Timeout("The request took too long to complete".to_string())
    } else {
        AppError::InternalServerError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_timeout_uses_error_envelope() {
        let slow = Router::new().route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_millis(500)).await;
                "late"
            }),
        );
        let app = with_request_timeout(slow, Duration::from_millis(10));

        let response = app
            .oneshot(Request::builder().uri("/slow").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "TIMEOUT");
        assert!(body["error"]["message"].as_str().is_some());
    }

    #[tokio::test]
    async fn test_fast_requests_pass_through() {
        let fast = Router::new().route("/fast", get(|| async { "ok" }));
        let app = with_request_timeout(fast, Duration::from_secs(5));

        let response = app
            .oneshot(Request::builder().uri("/fast").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
