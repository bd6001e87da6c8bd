use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::{flexible_date, user::validate_email, validate_price};
use crate::utils::error::AppError;

/// Point-in-time receipt. The embedded details are a copy taken at purchase and
/// never follow later changes to the event or the user.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Ticket {
    pub id: Uuid,
    #[serde(rename = "userid")]
    pub user_id: Uuid,
    #[serde(rename = "eventid")]
    pub event_id: Uuid,
    #[serde(rename = "ticketDetails")]
    #[sqlx(flatten)]
    pub details: TicketDetails,
    /// Reserved; always 0.
    pub count: i32,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct TicketDetails {
    pub name: String,
    pub email: String,
    #[serde(rename = "eventname")]
    pub event_name: String,
    #[serde(rename = "eventdate", with = "flexible_date")]
    pub event_date: NaiveDate,
    #[serde(rename = "eventtime")]
    pub event_time: String,
    #[serde(rename = "ticketprice")]
    pub ticket_price: Decimal,
    pub qr: String,
}

/// Body of `POST /tickets`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTicket {
    #[serde(rename = "userid")]
    pub user_id: Uuid,
    #[serde(rename = "eventid")]
    pub event_id: Uuid,
    #[serde(rename = "ticketDetails")]
    pub details: TicketDetails,
}

impl NewTicket {
    pub fn validate(&self) -> Result<(), AppError> {
        let d = &self.details;
        for (field, value) in [
            ("name", &d.name),
            ("email", &d.email),
            ("eventname", &d.event_name),
            ("eventtime", &d.event_time),
            ("qr", &d.qr),
        ] {
            if value.trim().is_empty() {
                return Err(AppError::ValidationError(format!(
                    "ticketDetails.{field} is required"
                )));
            }
        }
        validate_email(&d.email)?;
        validate_price("ticketDetails.ticketprice", d.ticket_price)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload() -> serde_json::Value {
        json!({
            "userid": Uuid::new_v4(),
            "eventid": Uuid::new_v4(),
            "ticketDetails": {
                "name": "Alice",
                "email": "alice@x.com",
                "eventname": "Demo",
                "eventdate": "2030-01-01",
                "eventtime": "18:00",
                "ticketprice": 0,
                "qr": "data:image/png;base64,AAAA"
            }
        })
    }

    #[test]
    fn test_valid_ticket() {
        let ticket: NewTicket = serde_json::from_value(payload()).unwrap();
        assert!(ticket.validate().is_ok());
        assert_eq!(ticket.details.ticket_price, Decimal::ZERO);
    }

    #[test]
    fn test_missing_embedded_field_is_rejected_at_decode() {
        let mut body = payload();
        body["ticketDetails"].as_object_mut().unwrap().remove("qr");
        assert!(serde_json::from_value::<NewTicket>(body).is_err());
    }

    #[test]
    fn test_blank_fields_rejected() {
        let mut ticket: NewTicket = serde_json::from_value(payload()).unwrap();
        ticket.details.event_time = "  ".into();
        assert!(ticket.validate().is_err());

        let mut ticket: NewTicket = serde_json::from_value(payload()).unwrap();
        ticket.details.email = "not-an-email".into();
        assert!(ticket.validate().is_err());

        let mut ticket: NewTicket = serde_json::from_value(payload()).unwrap();
        ticket.details.ticket_price = Decimal::new(-5, 0);
        assert!(ticket.validate().is_err());

        let mut ticket: NewTicket = serde_json::from_value(payload()).unwrap();
        ticket.details.ticket_price = Decimal::new(1_000_000_000_000, 2);
        assert!(ticket.validate().is_err());

        let mut ticket: NewTicket = serde_json::from_value(payload()).unwrap();
        ticket.details.ticket_price = Decimal::new(1999, 3);
        assert!(ticket.validate().is_err());

        let mut ticket: NewTicket = serde_json::from_value(payload()).unwrap();
        ticket.details.email = format!("{}@x.com", "a".repeat(320));
        assert!(ticket.validate().is_err());
    }

    #[test]
    fn test_wire_keys() {
        let ticket: NewTicket = serde_json::from_value(payload()).unwrap();
        let json = serde_json::to_value(&ticket).unwrap();
        assert!(json.get("userid").is_some());
        assert!(json["ticketDetails"].get("eventname").is_some());
        assert_eq!(json["ticketDetails"]["eventdate"], "2030-01-01");
    }
}
