//! Ticket purchase as the client walks through it.
//!
//! `EventSelected` → `OrderReview` (terms must be accepted) → `PaymentEntry` →
//! `Issued`. Payment is simulated: card fields are checked for shape only and
//! nothing is charged. The server never sees this state; it only receives the
//! finished ticket.

use thiserror::Error;

use crate::models::user::validate_email;
use crate::models::{Event, NewTicket, PublicProfile, Ticket, TicketDetails};
use crate::qr::ticket_qr_data_url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurchaseStep {
    EventSelected,
    OrderReview,
    PaymentEntry,
    Issued,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PurchaseError {
    #[error("cannot {action} at step {step:?}")]
    OutOfOrder {
        step: PurchaseStep,
        action: &'static str,
    },

    #[error("the terms and conditions must be accepted first")]
    TermsNotAccepted,

    #[error("invalid payment details: {0}")]
    InvalidPayment(String),

    #[error("ticket QR code could not be generated: {0}")]
    Qr(String),

    #[error("issued ticket does not match this purchase")]
    TicketMismatch,
}

#[derive(Debug, Clone, Default)]
pub struct PayerDetails {
    pub name: String,
    pub email: String,
    pub contact_no: String,
}

#[derive(Debug, Clone, Default)]
pub struct CardDetails {
    pub name_on_card: String,
    pub card_number: String,
    /// `MM/YY`
    pub expiry_date: String,
    pub cvv: String,
}

impl PayerDetails {
    pub fn validate(&self) -> Result<(), PurchaseError> {
        if self.name.trim().is_empty() {
            return Err(PurchaseError::InvalidPayment("payer name is required".into()));
        }
        validate_email(&self.email)
            .map_err(|_| PurchaseError::InvalidPayment("payer email is invalid".into()))?;
        let digits = self.contact_no.chars().filter(char::is_ascii_digit).count();
        if digits < 7 {
            return Err(PurchaseError::InvalidPayment(
                "contact number is too short".into(),
            ));
        }
        Ok(())
    }
}

impl CardDetails {
    pub fn validate(&self) -> Result<(), PurchaseError> {
        if self.name_on_card.trim().is_empty() {
            return Err(PurchaseError::InvalidPayment("name on card is required".into()));
        }

        let number: String = self.card_number.chars().filter(|c| *c != ' ').collect();
        if !(13..=19).contains(&number.len()) || !number.chars().all(|c| c.is_ascii_digit()) {
            return Err(PurchaseError::InvalidPayment(
                "card number must be 13 to 19 digits".into(),
            ));
        }

        let month = self
            .expiry_date
            .trim()
            .split_once('/')
            .filter(|(mm, yy)| mm.len() == 2 && yy.len() == 2)
            .and_then(|(mm, yy)| yy.parse::<u8>().ok().and(mm.parse::<u8>().ok()));
        if !matches!(month, Some(1..=12)) {
            return Err(PurchaseError::InvalidPayment("expiry date must be MM/YY".into()));
        }

        let cvv = self.cvv.trim();
        if !(3..=4).contains(&cvv.len()) || !cvv.chars().all(|c| c.is_ascii_digit()) {
            return Err(PurchaseError::InvalidPayment("CVV must be 3 or 4 digits".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct PurchaseFlow {
    event: Event,
    buyer: PublicProfile,
    step: PurchaseStep,
    terms_accepted: bool,
    ticket: Option<Ticket>,
}

impl PurchaseFlow {
    pub fn start(event: Event, buyer: PublicProfile) -> Self {
        Self {
            event,
            buyer,
            step: PurchaseStep::EventSelected,
            terms_accepted: false,
            ticket: None,
        }
    }

    pub fn step(&self) -> PurchaseStep {
        self.step
    }

    pub fn event(&self) -> &Event {
        &self.event
    }

    pub fn ticket(&self) -> Option<&Ticket> {
        self.ticket.as_ref()
    }

    fn require_step(&self, step: PurchaseStep, action: &'static str) -> Result<(), PurchaseError> {
        if self.step == step {
            Ok(())
        } else {
            Err(PurchaseError::OutOfOrder {
                step: self.step,
                action,
            })
        }
    }

    pub fn review_order(&mut self) -> Result<(), PurchaseError> {
        self.require_step(PurchaseStep::EventSelected, "review the order")?;
        self.step = PurchaseStep::OrderReview;
        Ok(())
    }

    pub fn accept_terms(&mut self, accepted: bool) -> Result<(), PurchaseError> {
        self.require_step(PurchaseStep::OrderReview, "accept the terms")?;
        self.terms_accepted = accepted;
        Ok(())
    }

    pub fn proceed_to_payment(&mut self) -> Result<(), PurchaseError> {
        self.require_step(PurchaseStep::OrderReview, "proceed to payment")?;
        if !self.terms_accepted {
            return Err(PurchaseError::TermsNotAccepted);
        }
        self.step = PurchaseStep::PaymentEntry;
        Ok(())
    }

    /// Checks the payment form and builds the ticket request, QR code included.
    /// The ticket snapshots the event as it is now.
    pub fn prepare_ticket(
        &self,
        payer: &PayerDetails,
        card: &CardDetails,
    ) -> Result<NewTicket, PurchaseError> {
        self.require_step(PurchaseStep::PaymentEntry, "pay")?;
        payer.validate()?;
        card.validate()?;

        let qr = ticket_qr_data_url(&self.event.title, &self.buyer.name)
            .map_err(|e| PurchaseError::Qr(e.to_string()))?;

        Ok(NewTicket {
            user_id: self.buyer.id,
            event_id: self.event.id,
            details: TicketDetails {
                name: self.buyer.name.clone(),
                email: self.buyer.email.clone(),
                event_name: self.event.title.clone(),
                event_date: self.event.event_date,
                event_time: ticket_time(&self.event.event_time),
                ticket_price: self.event.ticket_price,
                qr,
            },
        })
    }

    pub fn complete(&mut self, ticket: Ticket) -> Result<(), PurchaseError> {
        self.require_step(PurchaseStep::PaymentEntry, "complete the purchase")?;
        if ticket.event_id != self.event.id || ticket.user_id != self.buyer.id {
            return Err(PurchaseError::TicketMismatch);
        }
        self.ticket = Some(ticket);
        self.step = PurchaseStep::Issued;
        Ok(())
    }
}

/// Tickets require a time; events may leave it open.
fn ticket_time(event_time: &str) -> String {
    let time = event_time.trim();
    if time.is_empty() {
        "TBA".to_string()
    } else {
        time.to_string()
    }
}
