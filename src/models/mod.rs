pub mod event;
pub mod ticket;
pub mod user;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub use event::{Event, EventInput, NewEvent};
pub use ticket::{NewTicket, Ticket, TicketDetails};
pub use user::{NewUser, ProfileUpdate, PublicProfile, User};

use crate::utils::error::AppError;

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Prices are stored as `NUMERIC(12, 2)`.
pub const PRICE_MAX_SCALE: u32 = 2;
pub const PRICE_MAX: Decimal = Decimal::from_parts(3_567_587_327, 232, 0, false, 2);

/// `?page=&limit=` query parameters, 1-based.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl PageParams {
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page: Some(page),
            limit: Some(limit),
        }
    }

    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn limit(&self) -> u32 {
        self.limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page() - 1) * u64::from(self.limit())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub pages: u32,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, total: u64, params: PageParams) -> Self {
        let limit = params.limit();
        let pages = total.div_ceil(u64::from(limit));

        Self {
            items,
            total,
            page: params.page(),
            limit,
            pages: u32::try_from(pages).unwrap_or(u32::MAX),
        }
    }
}

/// Non-negative, at most two decimal places, and within the stored precision.
pub(crate) fn validate_price(field: &str, price: Decimal) -> Result<(), AppError> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err(AppError::ValidationError(format!("{field} must not be negative")));
    }
    if price.normalize().scale() > PRICE_MAX_SCALE {
        return Err(AppError::ValidationError(format!(
            "{field} must have at most {PRICE_MAX_SCALE} decimal places"
        )));
    }
    if price > PRICE_MAX {
        return Err(AppError::ValidationError(format!(
            "{field} must be at most {PRICE_MAX}"
        )));
    }
    Ok(())
}

/// The price as the database column returns it, padded to two decimal places.
pub fn stored_price(mut price: Decimal) -> Decimal {
    price.rescale(PRICE_MAX_SCALE);
    price
}

pub(crate) fn require_text(field: &str, value: &str, max_chars: usize) -> Result<(), AppError> {
    let len = value.trim().chars().count();
    if len == 0 {
        return Err(AppError::ValidationError(format!("{field} is required")));
    }
    if len > max_chars {
        return Err(AppError::ValidationError(format!(
            "{field} must be at most {max_chars} characters"
        )));
    }
    Ok(())
}

/// Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp and keeps only the date.
pub mod flexible_date {
    use chrono::{DateTime, NaiveDate};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn parse(raw: &str) -> Option<NaiveDate> {
        let raw = raw.trim();
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
    }

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&date.format("%Y-%m-%d"))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| de::Error::custom(format!("invalid date '{raw}'")))
    }

    pub mod option {
        use super::*;

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<NaiveDate>, D::Error> {
            match Option::<String>::deserialize(deserializer)? {
                None => Ok(None),
                Some(raw) if raw.trim().is_empty() => Ok(None),
                Some(raw) => parse(&raw)
                    .map(Some)
                    .ok_or_else(|| de::Error::custom(format!("invalid date '{raw}'"))),
            }
        }
    }
}
