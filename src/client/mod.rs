//! HTTP client for the API, used by front ends and tooling.
//!
//! There is no ambient "current user": [`ApiClient::login`] returns a [`Session`]
//! that callers pass to every authenticated call, and [`ApiClient::logout`]
//! consumes it.

use std::time::Duration;

use reqwest::header::COOKIE;
use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::auth::TOKEN_COOKIE;
use crate::models::{Event, EventInput, NewTicket, PageParams, Paginated, ProfileUpdate, PublicProfile, Ticket};
use crate::utils::response::{ApiErrorResponse, ApiResponse};

pub mod calendar;
pub mod purchase;

use purchase::{CardDetails, PayerDetails, PurchaseError, PurchaseFlow};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{message} ({status})")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    #[error("response carried no data")]
    EmptyResponse,

    #[error("login response did not set a credential cookie")]
    MissingCredential,

    #[error(transparent)]
    Purchase(#[from] PurchaseError),
}

/// Coarse category a UI can map to one notification style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Auth,
    Forbidden,
    NotFound,
    Conflict,
    Server,
    Transport,
}

impl ClientError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::Api { status, .. } => match StatusCode::from_u16(*status) {
                Ok(StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY) => {
                    ErrorKind::Validation
                }
                Ok(StatusCode::UNAUTHORIZED) => ErrorKind::Auth,
                Ok(StatusCode::FORBIDDEN) => ErrorKind::Forbidden,
                Ok(StatusCode::NOT_FOUND) => ErrorKind::NotFound,
                Ok(StatusCode::CONFLICT) => ErrorKind::Conflict,
                _ => ErrorKind::Server,
            },
            ClientError::Transport(_) => ErrorKind::Transport,
            ClientError::EmptyResponse | ClientError::MissingCredential => ErrorKind::Server,
            ClientError::Purchase(_) => ErrorKind::Validation,
        }
    }
}

/// A signed-in user plus the credential that proves it.
#[derive(Debug, Clone)]
pub struct Session {
    profile: PublicProfile,
    token: String,
}

impl Session {
    pub fn profile(&self) -> &PublicProfile {
        &self.profile
    }

    pub fn user_id(&self) -> Uuid {
        self.profile.id
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn authed(&self, request: RequestBuilder, session: &Session) -> RequestBuilder {
        with_credential(request, &session.token)
    }

    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<PublicProfile, ClientError> {
        let request = self
            .http
            .post(self.url("/register"))
            .json(&json!({ "name": name, "email": email, "password": password }));
        data(request.send().await?).await
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Session, ClientError> {
        let response = self
            .http
            .post(self.url("/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;

        let token = credential(&response);
        let profile: PublicProfile = data(response).await?;
        Ok(Session {
            profile,
            token: token.ok_or(ClientError::MissingCredential)?,
        })
    }

    /// Re-creates a session from a stored credential, e.g. after a restart.
    /// `None` when the server no longer accepts it.
    pub async fn resume(&self, token: String) -> Result<Option<Session>, ClientError> {
        let request = with_credential(self.http.get(self.url("/profile")), &token);

        match optional_data::<PublicProfile>(request.send().await?).await {
            Ok(Some(profile)) => Ok(Some(Session { profile, token })),
            Ok(None) => Ok(None),
            Err(e) if e.kind() == ErrorKind::Auth => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn logout(&self, session: Session) -> Result<(), ClientError> {
        let request = self.authed(self.http.post(self.url("/logout")), &session);
        ignore_data(request.send().await?).await
    }

    pub async fn profile(&self, session: &Session) -> Result<Option<PublicProfile>, ClientError> {
        let request = self.authed(self.http.get(self.url("/profile")), session);
        optional_data(request.send().await?).await
    }

    /// Updates the session in place, including its refreshed credential.
    pub async fn update_profile(
        &self,
        session: &mut Session,
        update: &ProfileUpdate,
    ) -> Result<PublicProfile, ClientError> {
        let request = self.authed(self.http.put(self.url("/profile")), session);
        let response = request.json(update).send().await?;

        let token = credential(&response);
        let profile: PublicProfile = data(response).await?;
        if let Some(token) = token {
            session.token = token;
        }
        session.profile = profile.clone();
        Ok(profile)
    }

    pub async fn list_events(&self, page: PageParams) -> Result<Paginated<Event>, ClientError> {
        let request = self.http.get(self.url("/events")).query(&[
            ("page", page.page()),
            ("limit", page.limit()),
        ]);
        data(request.send().await?).await
    }

    pub async fn get_event(&self, id: Uuid) -> Result<Event, ClientError> {
        data(self.http.get(self.url(&format!("/event/{id}"))).send().await?).await
    }

    pub async fn like_event(&self, id: Uuid) -> Result<Event, ClientError> {
        data(self.http.post(self.url(&format!("/event/{id}"))).send().await?).await
    }

    pub async fn create_event(
        &self,
        session: &Session,
        input: &EventInput,
    ) -> Result<Event, ClientError> {
        let request = self.authed(self.http.post(self.url("/createEvent")), session);
        data(request.json(input).send().await?).await
    }

    /// Same as [`create_event`](Self::create_event) but as a multipart form with a poster image.
    pub async fn create_event_with_image(
        &self,
        session: &Session,
        input: &EventInput,
        file_name: &str,
        image: Vec<u8>,
    ) -> Result<Event, ClientError> {
        let mut form = Form::new()
            .text("title", input.title.clone())
            .text("description", input.description.clone());
        if let Some(date) = input.event_date {
            form = form.text("eventDate", date.format("%Y-%m-%d").to_string());
        }
        for (name, value) in [
            ("organizedBy", &input.organized_by),
            ("eventTime", &input.event_time),
            ("location", &input.location),
        ] {
            if let Some(value) = value {
                form = form.text(name, value.clone());
            }
        }
        if let Some(price) = input.ticket_price {
            form = form.text("ticketPrice", price.to_string());
        }
        form = form.part("image", Part::bytes(image).file_name(file_name.to_string()));

        let request = self.authed(self.http.post(self.url("/createEvent")), session);
        data(request.multipart(form).send().await?).await
    }

    pub async fn delete_event(&self, session: &Session, id: Uuid) -> Result<(), ClientError> {
        let request = self.authed(self.http.delete(self.url(&format!("/event/{id}"))), session);
        ignore_data(request.send().await?).await
    }

    pub async fn create_ticket(
        &self,
        session: &Session,
        ticket: &NewTicket,
    ) -> Result<Ticket, ClientError> {
        let request = self.authed(self.http.post(self.url("/tickets")), session);
        data(request.json(ticket).send().await?).await
    }

    /// The signed-in user's tickets.
    pub async fn wallet(&self, session: &Session) -> Result<Vec<Ticket>, ClientError> {
        let path = format!("/tickets/user/{}", session.user_id());
        let request = self.authed(self.http.get(self.url(&path)), session);
        data(request.send().await?).await
    }

    pub async fn get_ticket(&self, session: &Session, id: Uuid) -> Result<Ticket, ClientError> {
        let request = self.authed(self.http.get(self.url(&format!("/tickets/{id}"))), session);
        data(request.send().await?).await
    }

    pub async fn delete_ticket(&self, session: &Session, id: Uuid) -> Result<(), ClientError> {
        let request = self.authed(self.http.delete(self.url(&format!("/tickets/{id}"))), session);
        ignore_data(request.send().await?).await
    }

    /// Runs the last two purchase steps: build the ticket, issue it, mark the flow issued.
    pub async fn purchase(
        &self,
        session: &Session,
        flow: &mut PurchaseFlow,
        payer: &PayerDetails,
        card: &CardDetails,
    ) -> Result<Ticket, ClientError> {
        let request = flow.prepare_ticket(payer, card)?;
        let ticket = self.create_ticket(session, &request).await?;
        flow.complete(ticket.clone())?;
        Ok(ticket)
    }
}

fn with_credential(request: RequestBuilder, token: &str) -> RequestBuilder {
    request.header(COOKIE, format!("{TOKEN_COOKIE}={token}"))
}

fn credential(response: &reqwest::Response) -> Option<String> {
    response
        .cookies()
        .find(|cookie| cookie.name() == TOKEN_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
}

async fn api_error(response: reqwest::Response) -> ClientError {
    let status = response.status();
    match response.json::<ApiErrorResponse>().await {
        Ok(body) => ClientError::Api {
            status: status.as_u16(),
            code: body.error.code,
            message: body.error.message,
        },
        Err(_) => ClientError::Api {
            status: status.as_u16(),
            code: "UNKNOWN".to_string(),
            message: status
                .canonical_reason()
                .unwrap_or("Unexpected response")
                .to_string(),
        },
    }
}

async fn optional_data<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<Option<T>, ClientError> {
    if !response.status().is_success() {
        return Err(api_error(response).await);
    }
    let body: ApiResponse<T> = response.json().await?;
    Ok(body.data)
}

async fn data<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
    optional_data(response).await?.ok_or(ClientError::EmptyResponse)
}

async fn ignore_data(response: reqwest::Response) -> Result<(), ClientError> {
    optional_data::<serde_json::Value>(response).await.map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(status: u16) -> ClientError {
        ClientError::Api {
            status,
            code: String::new(),
            message: String::new(),
        }
    }

    #[test]
    fn test_error_kinds_follow_status() {
        assert_eq!(api(400).kind(), ErrorKind::Validation);
        assert_eq!(api(401).kind(), ErrorKind::Auth);
        assert_eq!(api(403).kind(), ErrorKind::Forbidden);
        assert_eq!(api(404).kind(), ErrorKind::NotFound);
        assert_eq!(api(409).kind(), ErrorKind::Conflict);
        assert_eq!(api(500).kind(), ErrorKind::Server);
        assert_eq!(api(408).kind(), ErrorKind::Server);
    }

    #[test]
    fn test_base_url_is_normalized() {
        let client = ApiClient::new("http://localhost:4000/").unwrap();
        assert_eq!(client.url("/events"), "http://localhost:4000/events");
    }
}
