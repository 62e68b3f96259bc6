//! Help widget: assistant chat and support tickets.

use std::sync::Arc;

use parking_lot::Mutex;
use uuid::Uuid;

use crate::application::dto::request::{
    AssistantChatRequest, ChatRole, ChatTurn, CreateTicketRequest, PageContext,
};
use crate::application::dto::response::{TicketDetailResponse, TicketView};
use crate::application::services::assistant_service::MAX_HISTORY_TURNS;
use crate::client::{ClientError, SupportApi};
use crate::domain::TicketStatus;

const EMPTY_REPLY: &str =
    "I'm having trouble finding that information right now. Please try again in a moment.";
const CONNECTION_REPLY: &str =
    "I couldn't connect to the server. Please check your connection and try again.";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WidgetMode {
    #[default]
    Assistant,
    Tickets,
}

#[derive(Debug, Default)]
struct WidgetState {
    mode: WidgetMode,
    transcript: Vec<ChatTurn>,
    page: Option<PageContext>,
    tickets: Vec<TicketView>,
    open_ticket: Option<TicketDetailResponse>,
    support_error: Option<String>,
}

/// Two-mode help panel. The mode is a plain flag; switching does not fetch.
pub struct HelpWidget<S: SupportApi> {
    api: Arc<S>,
    state: Mutex<WidgetState>,
}

impl<S: SupportApi> HelpWidget<S> {
    pub fn new(api: Arc<S>) -> Self {
        Self {
            api,
            state: Mutex::new(WidgetState::default()),
        }
    }

    pub fn mode(&self) -> WidgetMode {
        self.state.lock().mode
    }

    pub fn set_mode(&self, mode: WidgetMode) {
        self.state.lock().mode = mode;
    }

    /// Page the learner is currently on, sent along with questions
    pub fn set_page(&self, page: PageContext) {
        self.state.lock().page = Some(page);
    }

    pub fn transcript(&self) -> Vec<ChatTurn> {
        self.state.lock().transcript.clone()
    }

    /// Ask the assistant. Failures are answered in the transcript like any reply.
    pub async fn ask(&self, message: &str) -> Option<String> {
        let message = message.trim();
        if message.is_empty() {
            return None;
        }

        let request = {
            let mut state = self.state.lock();
            state.transcript.push(ChatTurn {
                role: ChatRole::User,
                content: message.to_string(),
            });
            let start = state.transcript.len().saturating_sub(MAX_HISTORY_TURNS);
            AssistantChatRequest {
                message: message.to_string(),
                history: state.transcript[start..].to_vec(),
                page_context: state.page.clone(),
            }
        };

        let reply = match self.api.chat(&request).await {
            Ok(reply) if reply.reply.trim().is_empty() => EMPTY_REPLY.to_string(),
            Ok(reply) => reply.reply.trim().to_string(),
            Err(ClientError::Http(e)) => {
                tracing::warn!(error = %e, "Assistant unreachable");
                CONNECTION_REPLY.to_string()
            }
            Err(e) => {
                tracing::warn!(error = %e, "Assistant request failed");
                e.user_message()
            }
        };

        self.state.lock().transcript.push(ChatTurn {
            role: ChatRole::Assistant,
            content: reply.clone(),
        });
        Some(reply)
    }

    pub fn tickets(&self) -> Vec<TicketView> {
        self.state.lock().tickets.clone()
    }

    pub fn open_ticket(&self) -> Option<TicketDetailResponse> {
        self.state.lock().open_ticket.clone()
    }

    pub fn support_error(&self) -> Option<String> {
        self.state.lock().support_error.clone()
    }

    /// Reload the ticket list; whichever response lands last is shown
    pub async fn refresh_tickets(&self, status: Option<TicketStatus>) -> Result<(), ClientError> {
        self.state.lock().support_error = None;
        let result = self.api.list_tickets(status).await;

        let mut state = self.state.lock();
        match result {
            Ok(tickets) => {
                state.tickets = tickets;
                Ok(())
            }
            Err(e) => {
                state.support_error = Some(e.user_message());
                state.tickets.clear();
                Err(e)
            }
        }
    }

    /// Open a ticket, then refresh the list and show its thread
    pub async fn create_ticket(&self, request: CreateTicketRequest) -> Result<Uuid, ClientError> {
        if request.subject.trim().is_empty() || request.description.trim().is_empty() {
            return Err(ClientError::Protocol(
                "Subject and description are required".into(),
            ));
        }

        let created = self
            .api
            .create_ticket(&request)
            .await
            .inspect_err(|e| self.state.lock().support_error = Some(e.user_message()))?;
        let ticket_id = created.ticket.id;
        tracing::info!(%ticket_id, "Support ticket opened");

        // List failures are recorded on the widget; the ticket itself exists
        let _ = self.refresh_tickets(None).await;
        self.state.lock().open_ticket = Some(created);
        Ok(ticket_id)
    }

    pub async fn open(&self, ticket_id: Uuid) -> Result<(), ClientError> {
        self.state.lock().support_error = None;
        match self.api.get_ticket(ticket_id).await {
            Ok(detail) => {
                let mut state = self.state.lock();
                state.open_ticket = Some(detail);
                state.mode = WidgetMode::Tickets;
                Ok(())
            }
            Err(e) => {
                self.state.lock().support_error = Some(e.user_message());
                Err(e)
            }
        }
    }

    /// Follow up on the open ticket
    pub async fn post(&self, body: &str) -> Result<(), ClientError> {
        let body = body.trim();
        let ticket_id = {
            let state = self.state.lock();
            match &state.open_ticket {
                Some(detail) if !body.is_empty() => detail.ticket.id,
                _ => return Ok(()),
            }
        };

        let result = self.api.post_message(ticket_id, body).await;

        let mut state = self.state.lock();
        match result {
            Ok(posted) => {
                if let Some(detail) = state.open_ticket.as_mut().filter(|d| d.ticket.id == ticket_id) {
                    detail.ticket = posted.ticket.clone();
                    detail.messages.push(posted.message);
                }
                if let Some(listed) = state.tickets.iter_mut().find(|t| t.id == ticket_id) {
                    *listed = posted.ticket;
                }
                Ok(())
            }
            Err(e) => {
                state.support_error = Some(e.user_message());
                Err(e)
            }
        }
    }

    pub async fn close(&self, ticket_id: Uuid) -> Result<TicketView, ClientError> {
        let closed = self
            .api
            .close_ticket(ticket_id)
            .await
            .inspect_err(|e| self.state.lock().support_error = Some(e.user_message()))?;

        let mut state = self.state.lock();
        if let Some(detail) = state.open_ticket.as_mut().filter(|d| d.ticket.id == ticket_id) {
            detail.ticket = closed.clone();
        }
        if let Some(listed) = state.tickets.iter_mut().find(|t| t.id == ticket_id) {
            *listed = closed.clone();
        }
        Ok(closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    use crate::application::dto::response::{
        AssistantReply, ReplySource, TicketMessageResponse, TicketMessageView,
    };
    use crate::client::MockSupportApi;
    use crate::domain::{AuthorType, TicketCategory, TicketPriority};

    fn ticket(id: u128, status: TicketStatus) -> TicketView {
        TicketView {
            id: Uuid::from_u128(id),
            subject: "Join button".into(),
            category: TicketCategory::Technical,
            priority: TicketPriority::Medium,
            status,
            message_count: 1,
            last_message_at: Utc::now(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn message(body: &str) -> TicketMessageView {
        TicketMessageView {
            id: Uuid::new_v4(),
            author_type: AuthorType::User,
            body: body.into(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_history_is_capped() {
        let mut api = MockSupportApi::new();
        api.expect_chat()
            .withf(|request| request.history.len() <= MAX_HISTORY_TURNS)
            .returning(|request| {
                Ok(AssistantReply {
                    reply: format!("echo {}", request.message),
                    source: ReplySource::Fallback,
                    contexts: Vec::new(),
                })
            });
        let widget = HelpWidget::new(Arc::new(api));

        for n in 0..5 {
            widget.ask(&format!("question {n}")).await;
        }
        assert_eq!(widget.transcript().len(), 10);
        assert_eq!(widget.ask("   ").await, None);
    }

    #[tokio::test]
    async fn test_page_context_and_latest_turn_are_sent() {
        let mut api = MockSupportApi::new();
        api.expect_chat()
            .withf(|request| {
                request.page_context.as_ref().map(|p| p.path.as_str()) == Some("/our-courses/rust")
                    && request.history.last().map(|t| t.content.as_str()) == Some("how do I join")
            })
            .times(1)
            .returning(|_| {
                Ok(AssistantReply {
                    reply: "  ".into(),
                    source: ReplySource::Fallback,
                    contexts: Vec::new(),
                })
            });
        let widget = HelpWidget::new(Arc::new(api));
        widget.set_page(PageContext {
            path: "/our-courses/rust".into(),
            title: "Rust".into(),
            course_slug: Some("rust".into()),
        });

        assert_eq!(widget.ask("how do I join").await.as_deref(), Some(EMPTY_REPLY));
    }

    #[tokio::test]
    async fn test_assistant_errors_land_in_transcript() {
        let mut api = MockSupportApi::new();
        api.expect_chat().returning(|_| {
            Err(ClientError::Status {
                status: 500,
                message: "Internal server error".into(),
            })
        });
        let widget = HelpWidget::new(Arc::new(api));

        widget.ask("hello").await;
        let transcript = widget.transcript();
        assert_eq!(transcript[1].role, ChatRole::Assistant);
        assert_eq!(transcript[1].content, "Internal server error");
    }

    #[tokio::test]
    async fn test_create_refreshes_and_opens() {
        let created = TicketDetailResponse {
            ticket: ticket(1, TicketStatus::NotOpened),
            messages: vec![message("The join button does nothing")],
        };
        let mut api = MockSupportApi::new();
        let detail = created.clone();
        api.expect_create_ticket()
            .times(1)
            .returning(move |_| Ok(detail.clone()));
        api.expect_list_tickets()
            .returning(|_| Ok(vec![ticket(1, TicketStatus::NotOpened), ticket(2, TicketStatus::Closed)]));
        let widget = HelpWidget::new(Arc::new(api));

        let id = widget
            .create_ticket(CreateTicketRequest {
                subject: "Join button".into(),
                description: "The join button does nothing".into(),
                category: None,
                priority: None,
            })
            .await
            .unwrap();

        assert_eq!(id, Uuid::from_u128(1));
        assert_eq!(widget.tickets().len(), 2);
        assert_eq!(widget.open_ticket().unwrap().messages.len(), 1);
    }

    #[tokio::test]
    async fn test_blank_ticket_is_not_sent() {
        let mut api = MockSupportApi::new();
        api.expect_create_ticket().never();
        let widget = HelpWidget::new(Arc::new(api));

        let result = widget
            .create_ticket(CreateTicketRequest {
                subject: " ".into(),
                description: "text".into(),
                category: None,
                priority: None,
            })
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_post_appends_and_updates_status() {
        let mut api = MockSupportApi::new();
        api.expect_get_ticket().returning(|_| {
            Ok(TicketDetailResponse {
                ticket: ticket(1, TicketStatus::NotOpened),
                messages: vec![message("first")],
            })
        });
        api.expect_post_message().returning(|_, body| {
            let mut updated = ticket(1, TicketStatus::InProgress);
            updated.message_count = 2;
            Ok(TicketMessageResponse {
                ticket: updated,
                message: message(body),
            })
        });
        let widget = HelpWidget::new(Arc::new(api));

        widget.open(Uuid::from_u128(1)).await.unwrap();
        assert_eq!(widget.mode(), WidgetMode::Tickets);
        widget.post("still broken").await.unwrap();

        let detail = widget.open_ticket().unwrap();
        assert_eq!(detail.ticket.status, TicketStatus::InProgress);
        assert_eq!(detail.messages.last().unwrap().body, "still broken");
    }

    #[tokio::test]
    async fn test_list_failure_is_recorded() {
        let mut api = MockSupportApi::new();
        api.expect_list_tickets()
            .returning(|_| Err(ClientError::Unauthenticated));
        let widget = HelpWidget::new(Arc::new(api));

        assert!(widget.refresh_tickets(None).await.is_err());
        assert!(widget.support_error().is_some());
        assert!(widget.tickets().is_empty());
    }

    #[tokio::test]
    async fn test_close_updates_open_ticket() {
        let mut api = MockSupportApi::new();
        api.expect_get_ticket().returning(|_| {
            Ok(TicketDetailResponse {
                ticket: ticket(1, TicketStatus::InProgress),
                messages: Vec::new(),
            })
        });
        api.expect_close_ticket()
            .returning(|_| Ok(ticket(1, TicketStatus::Closed)));
        let widget = HelpWidget::new(Arc::new(api));

        widget.open(Uuid::from_u128(1)).await.unwrap();
        widget.close(Uuid::from_u128(1)).await.unwrap();
        assert_eq!(widget.open_ticket().unwrap().ticket.status, TicketStatus::Closed);
    }
}
