use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::Json;
use tracing::info;
use uuid::Uuid;

use super::parse_id;
use crate::auth::AuthUser;
use crate::models::{NewTicket, PageParams, Paginated, Ticket};
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::{created, empty_success, success};

async fn load_ticket(state: &AppState, raw_id: &str) -> Result<Ticket, AppError> {
    let id = parse_id(raw_id, "Ticket")?;
    state
        .tickets
        .find_ticket(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Ticket '{id}' was not found")))
}

/// The event reference is stored as given; the ticket is a receipt, not a live link.
pub async fn create_ticket(
    State(state): State<AppState>,
    caller: AuthUser,
    payload: Result<Json<NewTicket>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(ticket) = payload?;

    if ticket.user_id != caller.id {
        return Err(AppError::Forbidden(
            "Tickets can only be issued to the signed-in user".to_string(),
        ));
    }
    ticket.validate()?;

    let ticket = state.tickets.create_ticket(ticket).await?;

    info!(ticket_id = %ticket.id, user_id = %ticket.user_id, event_id = %ticket.event_id, "Ticket issued");
    Ok(created(ticket, "Ticket created"))
}

pub async fn list_tickets_for_user(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(user_id): Path<String>,
) -> Result<Response, AppError> {
    let user_id = Uuid::parse_str(&user_id)
        .map_err(|_| AppError::ValidationError(format!("'{user_id}' is not a user id")))?;
    caller.ensure_can_manage(user_id, "wallet")?;

    let tickets = state.tickets.list_tickets_for_user(user_id).await?;
    Ok(success(tickets, "Tickets loaded"))
}

pub async fn get_ticket(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let ticket = load_ticket(&state, &id).await?;
    caller.ensure_can_manage(ticket.user_id, "ticket")?;

    Ok(success(ticket, "Ticket loaded"))
}

pub async fn delete_ticket(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let ticket = load_ticket(&state, &id).await?;
    caller.ensure_can_manage(ticket.user_id, "ticket")?;

    if !state.tickets.delete_ticket(ticket.id).await? {
        return Err(AppError::NotFound(format!("Ticket '{}' was not found", ticket.id)));
    }

    info!(ticket_id = %ticket.id, "Ticket deleted");
    Ok(empty_success("Ticket deleted successfully"))
}

/// Admin-only view across all wallets.
pub async fn list_tickets(
    State(state): State<AppState>,
    caller: AuthUser,
    params: Result<Query<PageParams>, QueryRejection>,
) -> Result<Response, AppError> {
    if !caller.is_admin {
        return Err(AppError::Forbidden("Admin privileges required".to_string()));
    }

    let Query(params) = params?;
    let (tickets, total) = state.tickets.list_tickets(params).await?;

    Ok(success(
        Paginated::new(tickets, total, params),
        "Tickets loaded",
    ))
}
