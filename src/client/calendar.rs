//! Month grid, upcoming list and title search over already fetched events.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};

use crate::models::Event;

#[derive(Debug, Clone)]
pub struct CalendarDay<'a> {
    pub date: NaiveDate,
    pub events: Vec<&'a Event>,
}

#[derive(Debug, Clone)]
pub struct MonthView<'a> {
    pub year: i32,
    pub month: u32,
    /// Empty cells before the 1st in a week starting on Sunday.
    pub leading_blank_days: u32,
    pub days: Vec<CalendarDay<'a>>,
}

/// Every day of the month, each with the events on that day.
/// `None` when `month` is not 1..=12 or the year is out of range.
pub fn month_view(events: &[Event], year: i32, month: u32) -> Option<MonthView<'_>> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };

    let mut by_date = group_by_date(events);
    let days = first
        .iter_days()
        .take_while(|date| *date < next)
        .map(|date| CalendarDay {
            date,
            events: by_date.remove(&date).unwrap_or_default(),
        })
        .collect();

    Some(MonthView {
        year,
        month,
        leading_blank_days: first.weekday().num_days_from_sunday(),
        days,
    })
}

/// Events from `today` on, soonest first. Events happening today are included.
pub fn upcoming(events: &[Event], today: NaiveDate) -> Vec<&Event> {
    let mut upcoming: Vec<&Event> = events.iter().filter(|e| e.event_date >= today).collect();
    upcoming.sort_by_key(|e| e.event_date);
    upcoming
}

/// Case-insensitive title substring match. A blank query matches everything.
pub fn search_by_title<'a>(events: &'a [Event], query: &str) -> Vec<&'a Event> {
    let query = query.trim().to_lowercase();
    events
        .iter()
        .filter(|e| e.title.to_lowercase().contains(&query))
        .collect()
}

pub fn group_by_date(events: &[Event]) -> BTreeMap<NaiveDate, Vec<&Event>> {
    let mut grouped: BTreeMap<NaiveDate, Vec<&Event>> = BTreeMap::new();
    for event in events {
        grouped.entry(event.event_date).or_default().push(event);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    fn event(title: &str, date: NaiveDate) -> Event {
        Event {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            owner: "Org".into(),
            title: title.into(),
            description: "d".into(),
            organized_by: String::new(),
            event_date: date,
            event_time: String::new(),
            location: String::new(),
            ticket_price: Decimal::ZERO,
            likes: 0,
            image: String::new(),
            participants: 0,
            quantity: 0,
            income: Decimal::ZERO,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_month_has_every_day() {
        let events = vec![
            event("a", date(2024, 2, 29)),
            event("b", date(2024, 2, 29)),
            event("c", date(2024, 3, 1)),
        ];

        let view = month_view(&events, 2024, 2).unwrap();
        assert_eq!(view.days.len(), 29);
        // 2024-02-01 was a Thursday
        assert_eq!(view.leading_blank_days, 4);
        assert_eq!(view.days[28].events.len(), 2);
        assert!(view.days[..28].iter().all(|d| d.events.is_empty()));

        assert_eq!(month_view(&events, 2024, 12).unwrap().days.len(), 31);
        assert!(month_view(&events, 2024, 13).is_none());
    }

    #[test]
    fn test_upcoming_keeps_today_and_drops_past() {
        let today = date(2030, 6, 15);
        let events = vec![
            event("later", date(2030, 7, 1)),
            event("past", date(2030, 6, 1)),
            event("today", today),
            event("tomorrow", date(2030, 6, 16)),
        ];

        let titles: Vec<&str> = upcoming(&events, today)
            .iter()
            .map(|e| e.title.as_str())
            .collect();
        assert_eq!(titles, ["today", "tomorrow", "later"]);
    }

    #[test]
    fn test_search_by_title() {
        let day = date(2030, 1, 1);
        let events = vec![
            event("Rust Meetup", day),
            event("Jazz night", day),
            event("TRUSTED advisors", day),
        ];

        let titles = |query: &str| -> Vec<String> {
            search_by_title(&events, query)
                .iter()
                .map(|e| e.title.clone())
                .collect()
        };

        assert_eq!(titles("rust"), ["Rust Meetup", "TRUSTED advisors"]);
        assert_eq!(titles("  JAZZ "), ["Jazz night"]);
        assert!(titles("opera").is_empty());
        assert_eq!(titles("").len(), 3);
    }
}
