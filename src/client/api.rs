//! REST client for the live class and support endpoints.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;
use uuid::Uuid;

use crate::application::dto::request::{
    AssistantChatRequest, CreateTicketRequest, PingRequest, PostTicketMessageRequest,
};
use crate::application::dto::response::{
    ActiveSessionResponse, AssistantReply, CourseResponse, CourseView, JoinResponse,
    StatsResponse, TicketDetailResponse, TicketListResponse, TicketMessageResponse, TicketView,
};
use crate::client::{ClientError, ClientSettings};
use crate::domain::{AttendanceStats, TicketStatus};

/// Learner live-class endpoints
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LiveSessionApi: Send + Sync {
    /// Whether requests carry a signed-in token
    fn is_authenticated(&self) -> bool;

    async fn course(&self, slug: &str) -> Result<CourseView, ClientError>;

    async fn active_session(&self, course_slug: &str)
        -> Result<ActiveSessionResponse, ClientError>;

    async fn join(&self, session_id: Uuid) -> Result<JoinResponse, ClientError>;

    async fn ping(&self, session_id: Uuid, elapsed_ms: i64)
        -> Result<AttendanceStats, ClientError>;

    async fn leave(&self, session_id: Uuid) -> Result<AttendanceStats, ClientError>;
}

/// Help widget endpoints
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SupportApi: Send + Sync {
    async fn chat(&self, request: &AssistantChatRequest) -> Result<AssistantReply, ClientError>;

    async fn list_tickets(&self, status: Option<TicketStatus>)
        -> Result<Vec<TicketView>, ClientError>;

    async fn create_ticket(
        &self,
        request: &CreateTicketRequest,
    ) -> Result<TicketDetailResponse, ClientError>;

    async fn get_ticket(&self, ticket_id: Uuid) -> Result<TicketDetailResponse, ClientError>;

    async fn post_message(
        &self,
        ticket_id: Uuid,
        body: &str,
    ) -> Result<TicketMessageResponse, ClientError>;

    async fn close_ticket(&self, ticket_id: Uuid) -> Result<TicketView, ClientError>;
}

/// Error body returned by the server
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// reqwest-backed implementation of both APIs
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base: Url,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(settings: &ClientSettings) -> Result<Self, ClientError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()?;
        Self::with_client(http, &settings.api_url, settings.token().map(str::to_string))
    }

    pub fn with_client(http: Client, api_url: &str, token: Option<String>) -> Result<Self, ClientError> {
        // Trailing slash so joins append instead of replacing the last segment
        let base = if api_url.ends_with('/') {
            Url::parse(api_url)?
        } else {
            Url::parse(&format!("{api_url}/"))?
        };
        Ok(Self { http, base, token })
    }

    fn url(&self, path: &str) -> Result<Url, ClientError> {
        Ok(self.base.join(path.trim_start_matches('/'))?)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn require_token(&self) -> Result<(), ClientError> {
        if self.token.is_some() {
            Ok(())
        } else {
            Err(ClientError::Unauthenticated)
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        let response = self.authorize(request).send().await?;
        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    if status.is_success() {
        let bytes = response.bytes().await?;
        return Ok(serde_json::from_slice(&bytes)?);
    }
    if status == StatusCode::UNAUTHORIZED {
        return Err(ClientError::Unauthenticated);
    }

    let message = response
        .json::<ErrorBody>()
        .await
        .map(|body| body.message)
        .unwrap_or_else(|_| status.canonical_reason().unwrap_or("Request failed").to_string());
    Err(ClientError::Status {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl LiveSessionApi for ApiClient {
    fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    async fn course(&self, slug: &str) -> Result<CourseView, ClientError> {
        let url = self.url(&format!("courses/{slug}"))?;
        let response: CourseResponse = self.send(self.http.get(url)).await?;
        Ok(response.course)
    }

    async fn active_session(
        &self,
        course_slug: &str,
    ) -> Result<ActiveSessionResponse, ClientError> {
        let url = self.url(&format!("live-sessions/courses/{course_slug}/active"))?;
        self.send(self.http.get(url)).await
    }

    async fn join(&self, session_id: Uuid) -> Result<JoinResponse, ClientError> {
        self.require_token()?;
        let url = self.url(&format!("live-sessions/{session_id}/join"))?;
        self.send(self.http.post(url)).await
    }

    async fn ping(
        &self,
        session_id: Uuid,
        elapsed_ms: i64,
    ) -> Result<AttendanceStats, ClientError> {
        self.require_token()?;
        let url = self.url(&format!("live-sessions/{session_id}/ping"))?;
        let response: StatsResponse = self
            .send(self.http.post(url).json(&PingRequest { elapsed_ms }))
            .await?;
        Ok(response.stats)
    }

    async fn leave(&self, session_id: Uuid) -> Result<AttendanceStats, ClientError> {
        self.require_token()?;
        let url = self.url(&format!("live-sessions/{session_id}/leave"))?;
        let response: StatsResponse = self.send(self.http.post(url)).await?;
        Ok(response.stats)
    }
}

#[async_trait]
impl SupportApi for ApiClient {
    async fn chat(&self, request: &AssistantChatRequest) -> Result<AssistantReply, ClientError> {
        let url = self.url("assistant/chat")?;
        self.send(self.http.post(url).json(request)).await
    }

    async fn list_tickets(
        &self,
        status: Option<TicketStatus>,
    ) -> Result<Vec<TicketView>, ClientError> {
        self.require_token()?;
        let mut url = self.url("tickets")?;
        if let Some(status) = status {
            url.query_pairs_mut().append_pair("status", status.as_str());
        }
        let response: TicketListResponse = self.send(self.http.get(url)).await?;
        Ok(response.tickets)
    }

    async fn create_ticket(
        &self,
        request: &CreateTicketRequest,
    ) -> Result<TicketDetailResponse, ClientError> {
        self.require_token()?;
        let url = self.url("tickets")?;
        self.send(self.http.post(url).json(request)).await
    }

    async fn get_ticket(&self, ticket_id: Uuid) -> Result<TicketDetailResponse, ClientError> {
        self.require_token()?;
        let url = self.url(&format!("tickets/{ticket_id}"))?;
        self.send(self.http.get(url)).await
    }

    async fn post_message(
        &self,
        ticket_id: Uuid,
        body: &str,
    ) -> Result<TicketMessageResponse, ClientError> {
        self.require_token()?;
        let url = self.url(&format!("tickets/{ticket_id}/messages"))?;
        let request = PostTicketMessageRequest {
            body: body.to_string(),
        };
        self.send(self.http.post(url).json(&request)).await
    }

    async fn close_ticket(&self, ticket_id: Uuid) -> Result<TicketView, ClientError> {
        self.require_token()?;
        let url = self.url(&format!("tickets/{ticket_id}/close"))?;
        self.send(self.http.post(url)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls_keep_api_prefix() {
        let client =
            ApiClient::with_client(Client::new(), "http://localhost:3000/api/v1", None).unwrap();
        assert_eq!(
            client.url("live-sessions/courses/intro-to-python/active").unwrap().as_str(),
            "http://localhost:3000/api/v1/live-sessions/courses/intro-to-python/active"
        );
        assert!(!client.is_authenticated());
    }

    #[tokio::test]
    async fn test_attendance_calls_require_token() {
        let client =
            ApiClient::with_client(Client::new(), "http://localhost:3000/api/v1/", None).unwrap();
        assert!(matches!(
            client.join(Uuid::new_v4()).await,
            Err(ClientError::Unauthenticated)
        ));
    }
}
