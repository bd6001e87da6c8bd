use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::{EventStore, TicketStore, UserStore, EMAIL_TAKEN};
use crate::models::{
    stored_price, Event, NewEvent, NewTicket, NewUser, PageParams, ProfileUpdate, Ticket,
    TicketDetails, User,
};
use crate::utils::error::AppError;

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    events: Vec<Event>,
    tickets: Vec<Ticket>,
}

/// In-process store. Vectors keep insertion order, which is the listing order.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>, AppError> {
        self.tables
            .lock()
            .map_err(|_| AppError::InternalServerError("memory store lock poisoned".to_string()))
    }
}

fn page_of<T: Clone>(rows: &[T], page: PageParams) -> (Vec<T>, u64) {
    let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
    let items = rows
        .iter()
        .skip(offset)
        .take(page.limit() as usize)
        .cloned()
        .collect();
    (items, rows.len() as u64)
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, user: NewUser) -> Result<User, AppError> {
        let mut tables = self.tables()?;
        if tables.users.iter().any(|u| u.email == user.email) {
            return Err(AppError::Conflict(EMAIL_TAKEN.to_string()));
        }

        let now = Utc::now();
        let created = User {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            created_at: now,
            updated_at: now,
        };
        tables.users.push(created.clone());
        Ok(created)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let tables = self.tables()?;
        Ok(tables.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let tables = self.tables()?;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn update_user(&self, id: Uuid, update: ProfileUpdate) -> Result<Option<User>, AppError> {
        let mut tables = self.tables()?;
        if let Some(email) = &update.email {
            if tables.users.iter().any(|u| u.id != id && u.email == *email) {
                return Err(AppError::Conflict(EMAIL_TAKEN.to_string()));
            }
        }

        let Some(user) = tables.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        if let Some(name) = update.name {
            user.name = name;
        }
        if let Some(email) = update.email {
            user.email = email;
        }
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }
}

#[async_trait]
impl EventStore for MemoryStore {
    async fn create_event(&self, event: NewEvent) -> Result<Event, AppError> {
        let now = Utc::now();
        let created = Event {
            id: Uuid::new_v4(),
            owner_id: event.owner_id,
            owner: event.owner,
            title: event.title,
            description: event.description,
            organized_by: event.organized_by,
            event_date: event.event_date,
            event_time: event.event_time,
            location: event.location,
            ticket_price: stored_price(event.ticket_price),
            likes: 0,
            image: event.image,
            participants: 0,
            quantity: 0,
            income: stored_price(Decimal::ZERO),
            created_at: now,
            updated_at: now,
        };

        self.tables()?.events.push(created.clone());
        Ok(created)
    }

    async fn list_events(&self, page: PageParams) -> Result<(Vec<Event>, u64), AppError> {
        let tables = self.tables()?;
        Ok(page_of(&tables.events, page))
    }

    async fn find_event(&self, id: Uuid) -> Result<Option<Event>, AppError> {
        let tables = self.tables()?;
        Ok(tables.events.iter().find(|e| e.id == id).cloned())
    }

    async fn increment_likes(&self, id: Uuid) -> Result<Option<Event>, AppError> {
        let mut tables = self.tables()?;
        Ok(tables.events.iter_mut().find(|e| e.id == id).map(|event| {
            event.likes += 1;
            event.updated_at = Utc::now();
            event.clone()
        }))
    }

    async fn delete_event(&self, id: Uuid) -> Result<Option<Event>, AppError> {
        let mut tables = self.tables()?;
        let position = tables.events.iter().position(|e| e.id == id);
        Ok(position.map(|i| tables.events.remove(i)))
    }
}

#[async_trait]
impl TicketStore for MemoryStore {
    async fn create_ticket(&self, ticket: NewTicket) -> Result<Ticket, AppError> {
        let created = Ticket {
            id: Uuid::new_v4(),
            user_id: ticket.user_id,
            event_id: ticket.event_id,
            details: TicketDetails {
                ticket_price: stored_price(ticket.details.ticket_price),
                ..ticket.details
            },
            count: 0,
            created_at: Utc::now(),
        };

        self.tables()?.tickets.push(created.clone());
        Ok(created)
    }

    async fn find_ticket(&self, id: Uuid) -> Result<Option<Ticket>, AppError> {
        let tables = self.tables()?;
        Ok(tables.tickets.iter().find(|t| t.id == id).cloned())
    }

    async fn list_tickets_for_user(&self, user_id: Uuid) -> Result<Vec<Ticket>, AppError> {
        let tables = self.tables()?;
        Ok(tables
            .tickets
            .iter()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn list_tickets(&self, page: PageParams) -> Result<(Vec<Ticket>, u64), AppError> {
        let tables = self.tables()?;
        Ok(page_of(&tables.tickets, page))
    }

    async fn delete_ticket(&self, id: Uuid) -> Result<bool, AppError> {
        let mut tables = self.tables()?;
        let before = tables.tickets.len();
        tables.tickets.retain(|t| t.id != id);
        Ok(tables.tickets.len() != before)
    }
}
