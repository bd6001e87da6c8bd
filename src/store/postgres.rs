use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use super::{EventStore, TicketStore, UserStore, EMAIL_TAKEN};
use crate::models::{Event, NewEvent, NewTicket, NewUser, PageParams, ProfileUpdate, Ticket, User};
use crate::utils::error::AppError;

const USER_COLUMNS: &str = "id, name, email, password_hash, created_at, updated_at";

const EVENT_COLUMNS: &str = "id, owner_id, owner, title, description, organized_by, event_date, \
     event_time, location, ticket_price, likes, image, participants, quantity, income, \
     created_at, updated_at";

const TICKET_COLUMNS: &str = "id, user_id, event_id, name, email, event_name, event_date, \
     event_time, ticket_price, qr, count, created_at";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn page_bounds(page: PageParams) -> (i64, i64) {
    let offset = i64::try_from(page.offset()).unwrap_or(i64::MAX);
    (offset, i64::from(page.limit()))
}

#[async_trait]
impl UserStore for PgStore {
    async fn create_user(&self, user: NewUser) -> Result<User, AppError> {
        let now = Utc::now();
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (id, name, email, password_hash, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $5) RETURNING {USER_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(user.name)
        .bind(user.email)
        .bind(user.password_hash)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::from_unique_violation(e, EMAIL_TAKEN))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn update_user(&self, id: Uuid, update: ProfileUpdate) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, User>(&format!(
            "UPDATE users \
             SET name = COALESCE($2, name), email = COALESCE($3, email), updated_at = $4 \
             WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(update.name)
        .bind(update.email)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::from_unique_violation(e, EMAIL_TAKEN))
    }
}

#[async_trait]
impl EventStore for PgStore {
    async fn create_event(&self, event: NewEvent) -> Result<Event, AppError> {
        let now = Utc::now();
        let created = sqlx::query_as::<_, Event>(&format!(
            "INSERT INTO events (id, owner_id, owner, title, description, organized_by, \
             event_date, event_time, location, ticket_price, image, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $12) \
             RETURNING {EVENT_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(event.owner_id)
        .bind(event.owner)
        .bind(event.title)
        .bind(event.description)
        .bind(event.organized_by)
        .bind(event.event_date)
        .bind(event.event_time)
        .bind(event.location)
        .bind(event.ticket_price)
        .bind(event.image)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn list_events(&self, page: PageParams) -> Result<(Vec<Event>, u64), AppError> {
        let (offset, limit) = page_bounds(page);

        let events = sqlx::query_as::<_, Event>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events ORDER BY created_at ASC, id ASC \
             OFFSET $1 LIMIT $2"
        ))
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM events")
            .fetch_one(&self.pool)
            .await?;

        Ok((events, u64::try_from(total).unwrap_or(0)))
    }

    async fn find_event(&self, id: Uuid) -> Result<Option<Event>, AppError> {
        let event = sqlx::query_as::<_, Event>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(event)
    }

    async fn increment_likes(&self, id: Uuid) -> Result<Option<Event>, AppError> {
        let event = sqlx::query_as::<_, Event>(&format!(
            "UPDATE events SET likes = likes + 1, updated_at = $2 WHERE id = $1 \
             RETURNING {EVENT_COLUMNS}"
        ))
        .bind(id)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        Ok(event)
    }

    async fn delete_event(&self, id: Uuid) -> Result<Option<Event>, AppError> {
        let event = sqlx::query_as::<_, Event>(&format!(
            "DELETE FROM events WHERE id = $1 RETURNING {EVENT_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(event)
    }
}

#[async_trait]
impl TicketStore for PgStore {
    async fn create_ticket(&self, ticket: NewTicket) -> Result<Ticket, AppError> {
        let d = ticket.details;
        let created = sqlx::query_as::<_, Ticket>(&format!(
            "INSERT INTO tickets (id, user_id, event_id, name, email, event_name, event_date, \
             event_time, ticket_price, qr, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             RETURNING {TICKET_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(ticket.user_id)
        .bind(ticket.event_id)
        .bind(d.name)
        .bind(d.email)
        .bind(d.event_name)
        .bind(d.event_date)
        .bind(d.event_time)
        .bind(d.ticket_price)
        .bind(d.qr)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn find_ticket(&self, id: Uuid) -> Result<Option<Ticket>, AppError> {
        let ticket = sqlx::query_as::<_, Ticket>(&format!(
            "SELECT {TICKET_COLUMNS} FROM tickets WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(ticket)
    }

    async fn list_tickets_for_user(&self, user_id: Uuid) -> Result<Vec<Ticket>, AppError> {
        let tickets = sqlx::query_as::<_, Ticket>(&format!(
            "SELECT {TICKET_COLUMNS} FROM tickets WHERE user_id = $1 \
             ORDER BY created_at ASC, id ASC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(tickets)
    }

    async fn list_tickets(&self, page: PageParams) -> Result<(Vec<Ticket>, u64), AppError> {
        let (offset, limit) = page_bounds(page);

        let tickets = sqlx::query_as::<_, Ticket>(&format!(
            "SELECT {TICKET_COLUMNS} FROM tickets ORDER BY created_at ASC, id ASC \
             OFFSET $1 LIMIT $2"
        ))
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tickets")
            .fetch_one(&self.pool)
            .await?;

        Ok((tickets, u64::try_from(total).unwrap_or(0)))
    }

    async fn delete_ticket(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM tickets WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
