//! Persistence seams.
//!
//! Handlers only see these traits. `PgStore` backs them with PostgreSQL,
//! `MemoryStore` keeps everything in process for tests and local runs.

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{Event, NewEvent, NewTicket, NewUser, PageParams, ProfileUpdate, Ticket, User};
use crate::utils::error::AppError;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

pub const EMAIL_TAKEN: &str = "Email already registered";

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `Conflict` when the email is taken.
    async fn create_user(&self, user: NewUser) -> Result<User, AppError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, AppError>;

    /// Returns `None` when the user does not exist.
    async fn update_user(&self, id: Uuid, update: ProfileUpdate) -> Result<Option<User>, AppError>;
}

#[async_trait]
pub trait EventStore: Send + Sync {
    async fn create_event(&self, event: NewEvent) -> Result<Event, AppError>;

    /// One page in creation order, plus the total number of events.
    async fn list_events(&self, page: PageParams) -> Result<(Vec<Event>, u64), AppError>;

    async fn find_event(&self, id: Uuid) -> Result<Option<Event>, AppError>;

    /// Adds exactly one like in a single atomic step.
    async fn increment_likes(&self, id: Uuid) -> Result<Option<Event>, AppError>;

    /// Returns the removed event, if there was one.
    async fn delete_event(&self, id: Uuid) -> Result<Option<Event>, AppError>;
}

#[async_trait]
pub trait TicketStore: Send + Sync {
    async fn create_ticket(&self, ticket: NewTicket) -> Result<Ticket, AppError>;

    async fn find_ticket(&self, id: Uuid) -> Result<Option<Ticket>, AppError>;

    async fn list_tickets_for_user(&self, user_id: Uuid) -> Result<Vec<Ticket>, AppError>;

    async fn list_tickets(&self, page: PageParams) -> Result<(Vec<Ticket>, u64), AppError>;

    async fn delete_ticket(&self, id: Uuid) -> Result<bool, AppError>;
}
