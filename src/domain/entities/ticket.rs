//! Support ticket entities and repository trait.
//!
//! Maps to the `support_tickets` and `support_ticket_messages` tables.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::error::AppError;

/// Ticket lifecycle.
///
/// - `NotOpened`: created by the user, no staff member looked at it yet
/// - `Opened`: a staff member viewed it
/// - `InProgress`: two-way conversation under way
/// - `PendingConfirmation`: staff asked the user to confirm closure
/// - `Closed`: no further messages accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    #[default]
    NotOpened,
    Opened,
    InProgress,
    PendingConfirmation,
    Closed,
}

impl TicketStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "not_opened" => Some(Self::NotOpened),
            "opened" => Some(Self::Opened),
            "in_progress" => Some(Self::InProgress),
            "pending_confirmation" => Some(Self::PendingConfirmation),
            "closed" => Some(Self::Closed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotOpened => "not_opened",
            Self::Opened => "opened",
            Self::InProgress => "in_progress",
            Self::PendingConfirmation => "pending_confirmation",
            Self::Closed => "closed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TicketCategory {
    #[default]
    General,
    Billing,
    Technical,
    Course,
    Account,
    Other,
}

impl TicketCategory {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "general" => Some(Self::General),
            "billing" => Some(Self::Billing),
            "technical" => Some(Self::Technical),
            "course" => Some(Self::Course),
            "account" => Some(Self::Account),
            "other" => Some(Self::Other),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Billing => "billing",
            Self::Technical => "technical",
            Self::Course => "course",
            Self::Account => "account",
            Self::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TicketPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl TicketPriority {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            "urgent" => Some(Self::Urgent),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorType {
    User,
    Admin,
}

impl AuthorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "admin" => Self::Admin,
            _ => Self::User,
        }
    }
}

/// A user support request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: Uuid,
    pub user_id: Uuid,
    pub subject: String,
    pub category: TicketCategory,
    pub priority: TicketPriority,
    pub status: TicketStatus,
    pub message_count: i32,
    pub last_message_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Ticket {
    pub fn is_closed(&self) -> bool {
        self.status == TicketStatus::Closed
    }

    /// Count a new message; anything but a pending confirmation moves to in progress
    pub fn record_message(&mut self, at: DateTime<Utc>) {
        self.message_count += 1;
        self.last_message_at = at;
        self.updated_at = at;
        if self.status != TicketStatus::PendingConfirmation {
            self.status = TicketStatus::InProgress;
        }
    }
}

/// One message in a ticket thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketMessage {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub author_type: AuthorType,
    pub author_id: Uuid,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// Repository trait for support tickets.
#[async_trait]
pub trait TicketRepository: Send + Sync {
    /// Insert a ticket together with its opening message.
    async fn create(&self, ticket: &Ticket, first_message: &TicketMessage) -> Result<Ticket, AppError>;

    /// Find a ticket owned by the given user.
    async fn find_for_user(&self, id: Uuid, user_id: Uuid) -> Result<Option<Ticket>, AppError>;

    /// List a user's tickets, most recent activity first.
    async fn list_for_user(
        &self,
        user_id: Uuid,
        status: Option<TicketStatus>,
    ) -> Result<Vec<Ticket>, AppError>;

    /// Messages of a ticket in chronological order.
    async fn messages(&self, ticket_id: Uuid) -> Result<Vec<TicketMessage>, AppError>;

    /// Append a message and bump the ticket's counters in one step.
    ///
    /// Fails with `Conflict` when the ticket is closed.
    async fn append_message(&self, message: &TicketMessage) -> Result<Ticket, AppError>;

    /// Replace the stored ticket.
    async fn update(&self, ticket: &Ticket) -> Result<Ticket, AppError>;
}
