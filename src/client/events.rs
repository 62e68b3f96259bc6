//! Real-time listener.
//!
//! Connects to the gateway, follows one course room and turns
//! `live-session-started` / `live-session-ended` dispatches into
//! [`LiveEvent`]s. There is no reconnection: when the socket closes the
//! event stream ends.

use std::time::Duration;

use futures::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use url::Url;

use crate::application::dto::response::{LiveSessionView, SessionEventPayload};
use crate::application::services::LiveSessionEvent;
use crate::client::ClientError;
use crate::presentation::websocket::messages::{
    GatewayReceive, GatewaySend, HelloPayload, IdentifyPayload, OpCode, READY_EVENT,
};

/// Session lifecycle change pushed by the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiveEvent {
    Started(LiveSessionView),
    Ended(LiveSessionView),
}

impl LiveEvent {
    pub fn session(&self) -> &LiveSessionView {
        match self {
            Self::Started(session) | Self::Ended(session) => session,
        }
    }

    /// Decode a dispatch frame; anything else yields `None`
    pub fn from_frame(frame: &GatewaySend) -> Option<Self> {
        if frame.opcode() != Some(OpCode::Dispatch) {
            return None;
        }
        let name = frame.t.as_deref()?;
        let decode = || {
            let payload = frame.d.clone()?;
            serde_json::from_value::<SessionEventPayload>(payload)
                .map_err(|e| tracing::warn!(error = %e, event = name, "Malformed session event"))
                .ok()
                .map(|p| p.session)
        };

        if name == LiveSessionEvent::Started.name() {
            decode().map(Self::Started)
        } else if name == LiveSessionEvent::Ended.name() {
            decode().map(Self::Ended)
        } else {
            None
        }
    }
}

/// Gateway connector
#[derive(Debug, Clone)]
pub struct RealtimeListener {
    url: Url,
    token: Option<String>,
}

/// Live connection; dropping it closes the socket
#[derive(Debug)]
pub struct RealtimeSubscription {
    pub events: mpsc::UnboundedReceiver<LiveEvent>,
    task: JoinHandle<()>,
}

impl RealtimeSubscription {
    pub fn is_connected(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for RealtimeSubscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl RealtimeListener {
    pub fn new(gateway_url: &str, token: Option<String>) -> Result<Self, ClientError> {
        Ok(Self {
            url: Url::parse(gateway_url)?,
            token,
        })
    }

    /// Connect, identify and follow the course room
    pub async fn connect(&self, course_slug: &str) -> Result<RealtimeSubscription, ClientError> {
        let (socket, _) = tokio_tungstenite::connect_async(self.url.as_str()).await?;
        let (mut sink, mut stream) = socket.split();

        let hello = next_frame(&mut stream).await?;
        if hello.opcode() != Some(OpCode::Hello) {
            return Err(ClientError::Protocol("expected HELLO".into()));
        }
        let hello: HelloPayload = serde_json::from_value(
            hello
                .d
                .ok_or_else(|| ClientError::Protocol("HELLO without payload".into()))?,
        )?;

        let identify = GatewayReceive::identify(&IdentifyPayload {
            token: self.token.clone(),
            courses: vec![course_slug.to_string()],
        });
        send_frame(&mut sink, &identify).await?;

        loop {
            let frame = next_frame(&mut stream).await?;
            match frame.opcode() {
                Some(OpCode::Dispatch) if frame.t.as_deref() == Some(READY_EVENT) => break,
                Some(OpCode::InvalidSession) => return Err(ClientError::Unauthenticated),
                _ => continue,
            }
        }
        tracing::debug!(course = course_slug, "Gateway ready");

        let (events_tx, events) = mpsc::unbounded_channel();
        let period = Duration::from_millis(hello.heartbeat_interval.max(1));
        let task = tokio::spawn(run_connection(sink, stream, period, events_tx));

        Ok(RealtimeSubscription { events, task })
    }
}

async fn run_connection<Si, St>(
    mut sink: Si,
    mut stream: St,
    period: Duration,
    events: mpsc::UnboundedSender<LiveEvent>,
) where
    Si: Sink<Message, Error = WsError> + Unpin,
    St: Stream<Item = Result<Message, WsError>> + Unpin,
{
    let mut heartbeat = tokio::time::interval(period);
    heartbeat.tick().await;

    loop {
        tokio::select! {
            _ = heartbeat.tick() => {
                if send_frame(&mut sink, &GatewayReceive::heartbeat()).await.is_err() {
                    break;
                }
            }
            msg = stream.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let Ok(frame) = serde_json::from_str::<GatewaySend>(text.as_str()) else {
                            continue;
                        };
                        match frame.opcode() {
                            Some(OpCode::InvalidSession) => break,
                            _ => {
                                if let Some(event) = LiveEvent::from_frame(&frame) {
                                    if events.send(event).is_err() {
                                        break;
                                    }
                                }
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        tracing::debug!(error = %e, "Gateway connection error");
                        break;
                    }
                    _ => {}
                }
            }
        }
    }
    tracing::debug!("Gateway connection closed");
}

async fn next_frame<St>(stream: &mut St) -> Result<GatewaySend, ClientError>
where
    St: Stream<Item = Result<Message, WsError>> + Unpin,
{
    while let Some(msg) = stream.next().await {
        match msg? {
            Message::Text(text) => return Ok(serde_json::from_str(text.as_str())?),
            Message::Close(_) => break,
            _ => continue,
        }
    }
    Err(ClientError::Protocol("connection closed".into()))
}

async fn send_frame<Si>(sink: &mut Si, frame: &GatewayReceive) -> Result<(), ClientError>
where
    Si: Sink<Message, Error = WsError> + Unpin,
{
    let text = serde_json::to_string(frame)?;
    sink.send(Message::Text(text.into())).await?;
    Ok(())
}
