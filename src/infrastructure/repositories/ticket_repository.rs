//! Ticket Repository Implementation
//!
//! PostgreSQL implementation of the TicketRepository trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{
    AuthorType, Ticket, TicketCategory, TicketMessage, TicketPriority, TicketRepository,
    TicketStatus,
};
use crate::shared::error::AppError;

#[derive(Debug, sqlx::FromRow)]
struct TicketRow {
    id: Uuid,
    user_id: Uuid,
    subject: String,
    category: String,
    priority: String,
    status: String,
    message_count: i32,
    last_message_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<TicketRow> for Ticket {
    fn from(row: TicketRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            subject: row.subject,
            category: TicketCategory::parse(&row.category).unwrap_or_default(),
            priority: TicketPriority::parse(&row.priority).unwrap_or_default(),
            status: TicketStatus::parse(&row.status).unwrap_or_default(),
            message_count: row.message_count,
            last_message_at: row.last_message_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct TicketMessageRow {
    id: Uuid,
    ticket_id: Uuid,
    author_type: String,
    author_id: Uuid,
    body: String,
    created_at: DateTime<Utc>,
}

impl From<TicketMessageRow> for TicketMessage {
    fn from(row: TicketMessageRow) -> Self {
        Self {
            id: row.id,
            ticket_id: row.ticket_id,
            author_type: AuthorType::from_str(&row.author_type),
            author_id: row.author_id,
            body: row.body,
            created_at: row.created_at,
        }
    }
}

const TICKET_COLUMNS: &str = "id, user_id, subject, category, priority, status, message_count, \
                              last_message_at, created_at, updated_at";

/// PostgreSQL ticket repository.
#[derive(Clone)]
pub struct PgTicketRepository {
    pool: PgPool,
}

impl PgTicketRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TicketRepository for PgTicketRepository {
    async fn create(&self, ticket: &Ticket, first_message: &TicketMessage) -> Result<Ticket, AppError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, TicketRow>(&format!(
            r#"
            INSERT INTO support_tickets ({TICKET_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {TICKET_COLUMNS}
            "#
        ))
        .bind(ticket.id)
        .bind(ticket.user_id)
        .bind(&ticket.subject)
        .bind(ticket.category.as_str())
        .bind(ticket.priority.as_str())
        .bind(ticket.status.as_str())
        .bind(ticket.message_count)
        .bind(ticket.last_message_at)
        .bind(ticket.created_at)
        .bind(ticket.updated_at)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO support_ticket_messages (id, ticket_id, author_type, author_id, body, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(first_message.id)
        .bind(first_message.ticket_id)
        .bind(first_message.author_type.as_str())
        .bind(first_message.author_id)
        .bind(&first_message.body)
        .bind(first_message.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(row.into())
    }

    async fn find_for_user(&self, id: Uuid, user_id: Uuid) -> Result<Option<Ticket>, AppError> {
        let row = sqlx::query_as::<_, TicketRow>(&format!(
            "SELECT {TICKET_COLUMNS} FROM support_tickets WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Ticket::from))
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
        status: Option<TicketStatus>,
    ) -> Result<Vec<Ticket>, AppError> {
        let rows = sqlx::query_as::<_, TicketRow>(&format!(
            r#"
            SELECT {TICKET_COLUMNS} FROM support_tickets
            WHERE user_id = $1 AND ($2::text IS NULL OR status = $2)
            ORDER BY last_message_at DESC
            "#
        ))
        .bind(user_id)
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Ticket::from).collect())
    }

    async fn messages(&self, ticket_id: Uuid) -> Result<Vec<TicketMessage>, AppError> {
        let rows = sqlx::query_as::<_, TicketMessageRow>(
            r#"
            SELECT id, ticket_id, author_type, author_id, body, created_at
            FROM support_ticket_messages
            WHERE ticket_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(ticket_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(TicketMessage::from).collect())
    }

    async fn append_message(&self, message: &TicketMessage) -> Result<Ticket, AppError> {
        let mut tx = self.pool.begin().await?;

        // Row lock on the ticket orders concurrent posts.
        let row = sqlx::query_as::<_, TicketRow>(&format!(
            r#"
            UPDATE support_tickets
            SET message_count = message_count + 1,
                last_message_at = $2,
                updated_at = $2,
                status = CASE WHEN status = 'pending_confirmation' THEN status ELSE 'in_progress' END
            WHERE id = $1 AND status <> 'closed'
            RETURNING {TICKET_COLUMNS}
            "#
        ))
        .bind(message.ticket_id)
        .bind(message.created_at)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::Conflict("This ticket is closed.".into()))?;

        sqlx::query(
            r#"
            INSERT INTO support_ticket_messages (id, ticket_id, author_type, author_id, body, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(message.id)
        .bind(message.ticket_id)
        .bind(message.author_type.as_str())
        .bind(message.author_id)
        .bind(&message.body)
        .bind(message.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(row.into())
    }

    async fn update(&self, ticket: &Ticket) -> Result<Ticket, AppError> {
        let row = sqlx::query_as::<_, TicketRow>(&format!(
            r#"
            UPDATE support_tickets
            SET subject = $2, category = $3, priority = $4, status = $5, message_count = $6,
                last_message_at = $7, updated_at = $8
            WHERE id = $1
            RETURNING {TICKET_COLUMNS}
            "#
        ))
        .bind(ticket.id)
        .bind(&ticket.subject)
        .bind(ticket.category.as_str())
        .bind(ticket.priority.as_str())
        .bind(ticket.status.as_str())
        .bind(ticket.message_count)
        .bind(ticket.last_message_at)
        .bind(ticket.updated_at)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Ticket not found".into()))?;
        Ok(row.into())
    }
}
