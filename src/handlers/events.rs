use axum::extract::rejection::QueryRejection;
use axum::extract::{FromRequest, Multipart, Path, Query, Request, State};
use axum::http::header;
use axum::response::Response;
use axum::{async_trait, Json};
use tracing::{info, warn};

use super::parse_id;
use crate::auth::AuthUser;
use crate::models::{EventInput, PageParams, Paginated, PublicProfile};
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::{created, empty_success, success};

const IMAGE_FIELD: &str = "image";

/// Event creation body: `multipart/form-data` (with an optional `image` file) or JSON.
pub struct EventSubmission {
    pub input: EventInput,
    pub image: Option<UploadedImage>,
}

pub struct UploadedImage {
    pub file_name: Option<String>,
    pub bytes: Vec<u8>,
}

#[async_trait]
impl<S> FromRequest<S> for EventSubmission
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("multipart/form-data"));

        if !is_multipart {
            let Json(input) = Json::<EventInput>::from_request(req, state).await?;
            return Ok(Self { input, image: None });
        }

        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| AppError::ValidationError(e.body_text()))?;

        let mut input = EventInput::default();
        let mut image = None;
        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            if name == IMAGE_FIELD {
                let file_name = field.file_name().map(str::to_string);
                let bytes = field.bytes().await?;
                // Browsers send an empty part when no file was chosen
                if !bytes.is_empty() {
                    image = Some(UploadedImage {
                        file_name,
                        bytes: bytes.to_vec(),
                    });
                }
            } else {
                let value = field.text().await?;
                input.set_field(&name, value)?;
            }
        }

        Ok(Self { input, image })
    }
}

pub async fn create_event(
    State(state): State<AppState>,
    caller: AuthUser,
    submission: EventSubmission,
) -> Result<Response, AppError> {
    let owner = state
        .users
        .find_user(caller.id)
        .await?
        .map(|user| PublicProfile::from(&user))
        .ok_or_else(|| AppError::AuthError("Account no longer exists".to_string()))?;

    // Validate before touching the disk
    submission.input.validate()?;

    let image_path = match &submission.image {
        Some(image) => {
            state
                .images
                .save(image.file_name.as_deref(), &image.bytes)
                .await?
        }
        None => String::new(),
    };

    let new_event = submission.input.into_new_event(&owner, image_path.clone())?;
    let event = match state.events.create_event(new_event).await {
        Ok(event) => event,
        Err(e) => {
            if !image_path.is_empty() {
                state.images.remove(&image_path).await;
            }
            return Err(e);
        }
    };

    info!(event_id = %event.id, owner_id = %event.owner_id, "Event created");
    Ok(created(event, "Event created"))
}

pub async fn list_events(
    State(state): State<AppState>,
    params: Result<Query<PageParams>, QueryRejection>,
) -> Result<Response, AppError> {
    let Query(params) = params?;
    let (events, total) = state.events.list_events(params).await?;

    Ok(success(
        Paginated::new(events, total, params),
        "Events loaded",
    ))
}

pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = parse_id(&id, "Event")?;
    let event = state
        .events
        .find_event(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Event '{id}' was not found")))?;

    Ok(success(event, "Event loaded"))
}

/// Anyone may like, any number of times.
pub async fn like_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = parse_id(&id, "Event")?;
    let event = state
        .events
        .increment_likes(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Event '{id}' was not found")))?;

    info!(event_id = %event.id, likes = event.likes, "Event liked");
    Ok(success(event, "Event liked"))
}

pub async fn delete_event(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = parse_id(&id, "Event")?;
    let event = state
        .events
        .find_event(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Event '{id}' was not found")))?;

    caller.ensure_can_manage(event.owner_id, "event")?;

    let removed = state
        .events
        .delete_event(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Event '{id}' was not found")))?;

    if !removed.image.is_empty() {
        state.images.remove(&removed.image).await;
    }
    if caller.id != removed.owner_id {
        warn!(event_id = %id, admin = %caller.id, "Event deleted by admin");
    }

    info!(event_id = %id, "Event deleted");
    Ok(empty_success("Event deleted successfully"))
}
