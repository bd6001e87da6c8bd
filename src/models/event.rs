use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::{flexible_date, require_text, validate_price, PublicProfile};
use crate::utils::error::AppError;

pub const TITLE_MAX_CHARS: usize = 100;
pub const DESCRIPTION_MAX_CHARS: usize = 1000;
const LABEL_MAX_CHARS: usize = 200;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: Uuid,
    pub owner_id: Uuid,
    /// Owner's display name when the event was created.
    pub owner: String,
    pub title: String,
    pub description: String,
    pub organized_by: String,
    #[serde(with = "flexible_date")]
    pub event_date: NaiveDate,
    pub event_time: String,
    pub location: String,
    pub ticket_price: Decimal,
    pub likes: i64,
    pub image: String,
    // Reserved counters; nothing maintains them yet.
    pub participants: i32,
    pub quantity: i32,
    pub income: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Event submission as sent by the client, either as JSON or multipart text fields.
///
/// An `owner` field may be present in client payloads; it is ignored in favour of
/// the authenticated caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventInput {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub organized_by: Option<String>,
    #[serde(
        default,
        deserialize_with = "flexible_date::option::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub event_date: Option<NaiveDate>,
    #[serde(default)]
    pub event_time: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub ticket_price: Option<Decimal>,
}

impl EventInput {
    /// Applies one multipart text field. Unknown fields are ignored.
    pub fn set_field(&mut self, name: &str, value: String) -> Result<(), AppError> {
        match name {
            "title" => self.title = value,
            "description" => self.description = value,
            "organizedBy" => self.organized_by = Some(value),
            "eventTime" => self.event_time = Some(value),
            "location" => self.location = Some(value),
            "eventDate" => {
                self.event_date = if value.trim().is_empty() {
                    None
                } else {
                    Some(flexible_date::parse(&value).ok_or_else(|| {
                        AppError::ValidationError(format!("eventDate '{value}' is not a date"))
                    })?)
                };
            }
            "ticketPrice" => {
                self.ticket_price = if value.trim().is_empty() {
                    None
                } else {
                    Some(Decimal::from_str(value.trim()).map_err(|_| {
                        AppError::ValidationError(format!("ticketPrice '{value}' is not a number"))
                    })?)
                };
            }
            _ => {}
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), AppError> {
        require_text("title", &self.title, TITLE_MAX_CHARS)?;
        require_text("description", &self.description, DESCRIPTION_MAX_CHARS)?;
        if self.event_date.is_none() {
            return Err(AppError::ValidationError("eventDate is required".to_string()));
        }
        for (field, value) in [
            ("organizedBy", &self.organized_by),
            ("eventTime", &self.event_time),
            ("location", &self.location),
        ] {
            if let Some(value) = value {
                if value.trim().chars().count() > LABEL_MAX_CHARS {
                    return Err(AppError::ValidationError(format!(
                        "{field} must be at most {LABEL_MAX_CHARS} characters"
                    )));
                }
            }
        }
        if let Some(price) = self.ticket_price {
            validate_price("ticketPrice", price)?;
        }
        Ok(())
    }

    /// Validates and binds the submission to its owner.
    pub fn into_new_event(self, owner: &PublicProfile, image: String) -> Result<NewEvent, AppError> {
        self.validate()?;
        let event_date = self
            .event_date
            .ok_or_else(|| AppError::ValidationError("eventDate is required".to_string()))?;

        let trimmed = |v: Option<String>| v.map(|s| s.trim().to_string()).unwrap_or_default();

        Ok(NewEvent {
            owner_id: owner.id,
            owner: owner.name.clone(),
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            organized_by: trimmed(self.organized_by),
            event_date,
            event_time: trimmed(self.event_time),
            location: trimmed(self.location),
            ticket_price: self.ticket_price.unwrap_or(Decimal::ZERO),
            image,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewEvent {
    pub owner_id: Uuid,
    pub owner: String,
    pub title: String,
    pub description: String,
    pub organized_by: String,
    pub event_date: NaiveDate,
    pub event_time: String,
    pub location: String,
    pub ticket_price: Decimal,
    pub image: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner() -> PublicProfile {
        PublicProfile {
            id: Uuid::new_v4(),
            name: "Alice".into(),
            email: "alice@x.com".into(),
        }
    }

    fn demo() -> EventInput {
        EventInput {
            title: "Demo".into(),
            description: "d".into(),
            event_date: NaiveDate::from_ymd_opt(2030, 1, 1),
            ..EventInput::default()
        }
    }

    #[test]
    fn test_minimal_event_accepted() {
        let owner = owner();
        let event = demo().into_new_event(&owner, String::new()).unwrap();

        assert_eq!(event.owner_id, owner.id);
        assert_eq!(event.owner, "Alice");
        assert_eq!(event.ticket_price, Decimal::ZERO);
        assert_eq!(event.location, "");
    }

    #[test]
    fn test_required_fields() {
        let mut input = demo();
        input.title = " ".into();
        assert!(input.validate().is_err());

        let mut input = demo();
        input.event_date = None;
        assert!(input.validate().is_err());

        let mut input = demo();
        input.description = "x".repeat(DESCRIPTION_MAX_CHARS + 1);
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_price_must_fit_storage() {
        let mut input = demo();
        input.ticket_price = Some(Decimal::new(-1, 0));
        assert!(input.validate().is_err());

        let mut input = demo();
        input.set_field("ticketPrice", "12345678901234.567".into()).unwrap();
        assert!(input.validate().is_err());

        let mut input = demo();
        input.set_field("ticketPrice", "10000000000".into()).unwrap();
        assert!(input.validate().is_err());

        let mut input = demo();
        input.set_field("ticketPrice", "9.999".into()).unwrap();
        assert!(input.validate().is_err());

        let mut input = demo();
        input.set_field("ticketPrice", "9999999999.99".into()).unwrap();
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_multipart_fields() {
        let mut input = EventInput::default();
        input.set_field("title", "Gig".into()).unwrap();
        input.set_field("description", "Live".into()).unwrap();
        input.set_field("eventDate", "2031-05-06".into()).unwrap();
        input.set_field("ticketPrice", "12.50".into()).unwrap();
        input.set_field("owner", "Mallory".into()).unwrap();

        assert_eq!(input.ticket_price, Some(Decimal::new(1250, 2)));
        assert!(input.validate().is_ok());

        assert!(input.set_field("ticketPrice", "free".into()).is_err());
        assert!(input.set_field("eventDate", "someday".into()).is_err());
    }

    #[test]
    fn test_json_payload_accepts_numeric_price_and_timestamp_date() {
        let input: EventInput = serde_json::from_value(serde_json::json!({
            "title": "Demo",
            "description": "d",
            "eventDate": "2030-01-01T00:00:00.000Z",
            "ticketPrice": 15,
            "owner": "ignored"
        }))
        .unwrap();

        assert_eq!(input.event_date, NaiveDate::from_ymd_opt(2030, 1, 1));
        assert_eq!(input.ticket_price, Some(Decimal::new(15, 0)));
    }
}
