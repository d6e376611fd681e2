use std::{sync::Arc, time::Duration};

use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::blocks::MessageTemplate;
use crate::events::{ChatEnvelope, ChatEventType, EventContext, EventDispatcher, HandlerResult};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("transport failed to connect: {0}")]
    Connect(String),
    #[error("transport read failed: {0}")]
    Receive(String),
    #[error("transport ack failed: {0}")]
    Acknowledge(String),
    #[error("transport send failed: {0}")]
    Send(String),
    #[error("transport disconnect failed: {0}")]
    Disconnect(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self { max_retries: 5, base_delay_ms: 250, max_delay_ms: 5_000 }
    }
}

impl ReconnectPolicy {
    fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.min(16);
        let multiplier = 1_u64 << exponent;
        let delay_ms = self.base_delay_ms.saturating_mul(multiplier).min(self.max_delay_ms);
        Duration::from_millis(delay_ms)
    }
}

#[async_trait]
pub trait GatewayTransport: Send + Sync {
    async fn connect(&self) -> Result<(), TransportError>;
    async fn next_envelope(&self) -> Result<Option<ChatEnvelope>, TransportError>;
    async fn acknowledge(&self, envelope_id: &str) -> Result<(), TransportError>;
    async fn send(&self, channel_id: &str, message: &MessageTemplate)
        -> Result<(), TransportError>;
    async fn disconnect(&self) -> Result<(), TransportError>;
}

#[derive(Default)]
pub struct NoopGatewayTransport;

#[async_trait]
impl GatewayTransport for NoopGatewayTransport {
    async fn connect(&self) -> Result<(), TransportError> {
        Ok(())
    }

    async fn next_envelope(&self) -> Result<Option<ChatEnvelope>, TransportError> {
        Ok(None)
    }

    async fn acknowledge(&self, _envelope_id: &str) -> Result<(), TransportError> {
        Ok(())
    }

    async fn send(
        &self,
        _channel_id: &str,
        _message: &MessageTemplate,
    ) -> Result<(), TransportError> {
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        Ok(())
    }
}

pub struct GatewayRunner {
    transport: Arc<dyn GatewayTransport>,
    dispatcher: Arc<EventDispatcher>,
    reconnect_policy: ReconnectPolicy,
}

type CommandLane = mpsc::UnboundedSender<ChatEnvelope>;

impl GatewayRunner {
    pub fn new(
        transport: Arc<dyn GatewayTransport>,
        dispatcher: EventDispatcher,
        reconnect_policy: ReconnectPolicy,
    ) -> Self {
        Self { transport, dispatcher: Arc::new(dispatcher), reconnect_policy }
    }

    /// Pumps the transport until the stream closes or retries run out.
    ///
    /// Plain messages are handled in arrival order on the reading loop.
    /// Commands run one at a time on their own lane, so a long bulk scan
    /// never holds up the live path. Pending commands finish before this
    /// returns.
    pub async fn start(&self) -> Result<()> {
        let (commands, command_lane) = self.spawn_command_lane();
        let outcome = self.pump_with_retries(&commands).await;

        drop(commands);
        if let Err(error) = command_lane.await {
            warn!(error = %error, "command lane stopped unexpectedly");
        }
        outcome
    }

    async fn pump_with_retries(&self, commands: &CommandLane) -> Result<()> {
        for attempt in 0..=self.reconnect_policy.max_retries {
            match self.connect_and_pump(attempt, commands).await {
                Ok(()) => return Ok(()),
                Err(transport_error) => {
                    warn!(
                        attempt,
                        max_retries = self.reconnect_policy.max_retries,
                        error = %transport_error,
                        "gateway transport failed"
                    );

                    if attempt >= self.reconnect_policy.max_retries {
                        warn!(
                            max_retries = self.reconnect_policy.max_retries,
                            "gateway retries exhausted; continuing process without crash"
                        );
                        return Ok(());
                    }

                    let delay = self.reconnect_policy.backoff(attempt);
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        Ok(())
    }

    fn spawn_command_lane(&self) -> (CommandLane, JoinHandle<()>) {
        let (sender, mut receiver) = mpsc::unbounded_channel::<ChatEnvelope>();
        let dispatcher = self.dispatcher.clone();
        let transport = self.transport.clone();

        let lane = tokio::spawn(async move {
            while let Some(envelope) = receiver.recv().await {
                dispatch_isolated(dispatcher.clone(), transport.clone(), envelope).await;
            }
        });
        (sender, lane)
    }

    async fn connect_and_pump(
        &self,
        attempt: u32,
        commands: &CommandLane,
    ) -> Result<(), TransportError> {
        info!(attempt, "opening gateway connection");
        self.transport.connect().await?;
        info!(attempt, "gateway connected");

        loop {
            let Some(envelope) = self.transport.next_envelope().await? else {
                info!(attempt, "gateway stream closed");
                self.transport.disconnect().await?;
                return Ok(());
            };

            info!(
                event_name = "ingress.chat.envelope_received",
                envelope_id = %envelope.envelope_id,
                event_type = ?envelope.event.event_type(),
                correlation_id = %envelope.envelope_id,
                channel_id = %envelope.event.channel_id().unwrap_or("unknown"),
                "received chat envelope"
            );

            if let Err(error) = self.transport.acknowledge(&envelope.envelope_id).await {
                warn!(
                    event_name = "ingress.chat.ack_sent",
                    envelope_id = %envelope.envelope_id,
                    correlation_id = %envelope.envelope_id,
                    error = %error,
                    "failed to acknowledge chat envelope"
                );
            } else {
                debug!(
                    event_name = "ingress.chat.ack_sent",
                    envelope_id = %envelope.envelope_id,
                    correlation_id = %envelope.envelope_id,
                    "acknowledged chat envelope"
                );
            }

            if envelope.event.event_type() == ChatEventType::Command {
                match commands.send(envelope) {
                    Ok(()) => continue,
                    Err(mpsc::error::SendError(envelope)) => {
                        warn!(
                            correlation_id = %envelope.envelope_id,
                            "command lane closed; handling command inline"
                        );
                        dispatch_isolated(self.dispatcher.clone(), self.transport.clone(), envelope)
                            .await;
                    }
                }
            } else {
                dispatch_isolated(self.dispatcher.clone(), self.transport.clone(), envelope).await;
            }
        }
    }
}

/// Runs one dispatch on its own task, so a panicking handler loses only
/// its envelope.
async fn dispatch_isolated(
    dispatcher: Arc<EventDispatcher>,
    transport: Arc<dyn GatewayTransport>,
    envelope: ChatEnvelope,
) {
    let envelope_id = envelope.envelope_id.clone();
    let task =
        tokio::spawn(async move { deliver(&dispatcher, transport.as_ref(), envelope).await });

    if let Err(error) = task.await {
        warn!(
            event_name = "ingress.chat.handler_aborted",
            correlation_id = %envelope_id,
            error = %error,
            "event handler aborted; continuing gateway loop"
        );
    }
}

async fn deliver(
    dispatcher: &EventDispatcher,
    transport: &dyn GatewayTransport,
    envelope: ChatEnvelope,
) {
    let channel_id = envelope.event.channel_id().unwrap_or("unknown").to_owned();
    let context = EventContext { correlation_id: envelope.envelope_id.clone() };

    match dispatcher.dispatch(&envelope, &context).await {
        Ok(HandlerResult::Responded(message)) => {
            if let Err(error) = transport.send(&channel_id, &message).await {
                warn!(
                    event_name = "egress.chat.reply_failed",
                    correlation_id = %envelope.envelope_id,
                    channel_id = %channel_id,
                    error = %error,
                    "failed to deliver reply; continuing gateway loop"
                );
            }
        }
        Ok(HandlerResult::Processed | HandlerResult::Ignored) => {}
        Err(error) => {
            warn!(
                envelope_id = %envelope.envelope_id,
                correlation_id = %envelope.envelope_id,
                channel_id = %channel_id,
                error = %error,
                "event dispatch failed; continuing gateway loop"
            );
        }
    }
}
