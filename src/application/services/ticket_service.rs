//! Support Ticket Service
//!
//! Learner-side support threads: open a ticket, follow up, close it.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::domain::{
    AuthorType, Ticket, TicketCategory, TicketMessage, TicketPriority, TicketRepository,
    TicketStatus,
};
use crate::shared::error::AppError;

/// Ticket service trait
#[async_trait]
pub trait TicketService: Send + Sync {
    /// Tickets of a user, most recent activity first
    async fn list_tickets(
        &self,
        user_id: Uuid,
        status: Option<TicketStatus>,
    ) -> Result<Vec<Ticket>, TicketError>;

    /// Open a ticket; the description becomes the first message
    async fn create_ticket(
        &self,
        user_id: Uuid,
        request: CreateTicketDto,
    ) -> Result<(Ticket, Vec<TicketMessage>), TicketError>;

    async fn get_ticket(
        &self,
        user_id: Uuid,
        ticket_id: Uuid,
    ) -> Result<(Ticket, Vec<TicketMessage>), TicketError>;

    async fn post_message(
        &self,
        user_id: Uuid,
        ticket_id: Uuid,
        body: &str,
    ) -> Result<(Ticket, TicketMessage), TicketError>;

    async fn close_ticket(&self, user_id: Uuid, ticket_id: Uuid) -> Result<Ticket, TicketError>;
}

/// Create ticket input
#[derive(Debug, Clone)]
pub struct CreateTicketDto {
    pub subject: String,
    pub description: String,
    pub category: TicketCategory,
    pub priority: TicketPriority,
}

/// Ticket service errors
#[derive(Debug, thiserror::Error)]
pub enum TicketError {
    #[error("Ticket not found")]
    NotFound,

    #[error("This ticket is closed.")]
    Closed,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<AppError> for TicketError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::NotFound(_) => Self::NotFound,
            AppError::Conflict(_) => Self::Closed,
            other => Self::Internal(other.to_string()),
        }
    }
}

/// TicketService implementation
pub struct TicketServiceImpl<T: TicketRepository> {
    tickets: Arc<T>,
}

impl<T: TicketRepository> TicketServiceImpl<T> {
    pub fn new(tickets: Arc<T>) -> Self {
        Self { tickets }
    }

    async fn find(&self, user_id: Uuid, ticket_id: Uuid) -> Result<Ticket, TicketError> {
        self.tickets
            .find_for_user(ticket_id, user_id)
            .await?
            .ok_or(TicketError::NotFound)
    }
}

#[async_trait]
impl<T: TicketRepository + 'static> TicketService for TicketServiceImpl<T> {
    async fn list_tickets(
        &self,
        user_id: Uuid,
        status: Option<TicketStatus>,
    ) -> Result<Vec<Ticket>, TicketError> {
        Ok(self.tickets.list_for_user(user_id, status).await?)
    }

    async fn create_ticket(
        &self,
        user_id: Uuid,
        request: CreateTicketDto,
    ) -> Result<(Ticket, Vec<TicketMessage>), TicketError> {
        let now = Utc::now();
        let ticket = Ticket {
            id: Uuid::new_v4(),
            user_id,
            subject: request.subject.trim().to_string(),
            category: request.category,
            priority: request.priority,
            status: TicketStatus::NotOpened,
            message_count: 1,
            last_message_at: now,
            created_at: now,
            updated_at: now,
        };
        let message = TicketMessage {
            id: Uuid::new_v4(),
            ticket_id: ticket.id,
            author_type: AuthorType::User,
            author_id: user_id,
            body: request.description.trim().to_string(),
            created_at: now,
        };

        let ticket = self.tickets.create(&ticket, &message).await?;
        tracing::info!(ticket_id = %ticket.id, %user_id, category = ticket.category.as_str(), "Support ticket created");

        Ok((ticket, vec![message]))
    }

    async fn get_ticket(
        &self,
        user_id: Uuid,
        ticket_id: Uuid,
    ) -> Result<(Ticket, Vec<TicketMessage>), TicketError> {
        let ticket = self.find(user_id, ticket_id).await?;
        let messages = self.tickets.messages(ticket.id).await?;
        Ok((ticket, messages))
    }

    async fn post_message(
        &self,
        user_id: Uuid,
        ticket_id: Uuid,
        body: &str,
    ) -> Result<(Ticket, TicketMessage), TicketError> {
        let ticket = self.find(user_id, ticket_id).await?;
        if ticket.is_closed() {
            return Err(TicketError::Closed);
        }

        let message = TicketMessage {
            id: Uuid::new_v4(),
            ticket_id: ticket.id,
            author_type: AuthorType::User,
            author_id: user_id,
            body: body.trim().to_string(),
            created_at: Utc::now(),
        };
        let ticket = self.tickets.append_message(&message).await?;

        Ok((ticket, message))
    }

    async fn close_ticket(&self, user_id: Uuid, ticket_id: Uuid) -> Result<Ticket, TicketError> {
        let mut ticket = self.find(user_id, ticket_id).await?;
        if ticket.is_closed() {
            return Ok(ticket);
        }

        ticket.status = TicketStatus::Closed;
        ticket.updated_at = Utc::now();
        let ticket = self.tickets.update(&ticket).await?;

        tracing::info!(ticket_id = %ticket.id, %user_id, "Support ticket closed");
        Ok(ticket)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::repositories::InMemoryTicketRepository;
    use pretty_assertions::assert_eq;

    fn service() -> TicketServiceImpl<InMemoryTicketRepository> {
        TicketServiceImpl::new(Arc::new(InMemoryTicketRepository::new()))
    }

    fn request(subject: &str) -> CreateTicketDto {
        CreateTicketDto {
            subject: subject.into(),
            description: "The join button does nothing".into(),
            category: TicketCategory::Technical,
            priority: TicketPriority::Medium,
        }
    }

    #[tokio::test]
    async fn test_description_becomes_first_message() {
        let service = service();
        let user = Uuid::new_v4();
        let (ticket, messages) = service.create_ticket(user, request("Join")).await.unwrap();

        assert_eq!(ticket.status, TicketStatus::NotOpened);
        assert_eq!(ticket.message_count, 1);
        let (_, stored) = service.get_ticket(user, ticket.id).await.unwrap();
        assert_eq!(stored, messages);
        assert_eq!(stored[0].body, "The join button does nothing");
    }

    #[tokio::test]
    async fn test_posting_moves_to_in_progress() {
        let service = service();
        let user = Uuid::new_v4();
        let (ticket, _) = service.create_ticket(user, request("Join")).await.unwrap();

        let (ticket, _) = service
            .post_message(user, ticket.id, "Still broken")
            .await
            .unwrap();
        assert_eq!(ticket.status, TicketStatus::InProgress);
        assert_eq!(ticket.message_count, 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_posts_are_all_counted() {
        let service = Arc::new(service());
        let user = Uuid::new_v4();
        let (ticket, _) = service.create_ticket(user, request("Join")).await.unwrap();
        let ticket_id = ticket.id;

        let posts: Vec<_> = (0..16)
            .map(|i| {
                let service = service.clone();
                tokio::spawn(async move {
                    service
                        .post_message(user, ticket_id, &format!("update {i}"))
                        .await
                })
            })
            .collect();
        for post in posts {
            post.await.unwrap().unwrap();
        }

        let (ticket, messages) = service.get_ticket(user, ticket_id).await.unwrap();
        assert_eq!(ticket.message_count, 17);
        assert_eq!(messages.len(), 17);
        assert_eq!(ticket.status, TicketStatus::InProgress);
    }

    #[tokio::test]
    async fn test_closed_ticket_rejects_messages() {
        let service = service();
        let user = Uuid::new_v4();
        let (ticket, _) = service.create_ticket(user, request("Join")).await.unwrap();
        service.close_ticket(user, ticket.id).await.unwrap();

        let err = service
            .post_message(user, ticket.id, "hello?")
            .await
            .unwrap_err();
        assert!(matches!(err, TicketError::Closed));
    }

    #[tokio::test]
    async fn test_other_users_cannot_see_ticket() {
        let service = service();
        let (ticket, _) = service
            .create_ticket(Uuid::new_v4(), request("Join"))
            .await
            .unwrap();
        let err = service
            .get_ticket(Uuid::new_v4(), ticket.id)
            .await
            .unwrap_err();
        assert!(matches!(err, TicketError::NotFound));
    }

    #[tokio::test]
    async fn test_list_sorted_by_last_message() {
        let service = service();
        let user = Uuid::new_v4();
        let (first, _) = service.create_ticket(user, request("First")).await.unwrap();
        let (second, _) = service.create_ticket(user, request("Second")).await.unwrap();
        service
            .post_message(user, first.id, "bump")
            .await
            .unwrap();

        let tickets = service.list_tickets(user, None).await.unwrap();
        let ids: Vec<Uuid> = tickets.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![first.id, second.id]);

        let open = service
            .list_tickets(user, Some(TicketStatus::NotOpened))
            .await
            .unwrap();
        assert_eq!(open.len(), 1);
    }
}
