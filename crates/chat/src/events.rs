use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use thiserror::Error;

use trivia_core::domain::message::ChannelMessage;
use trivia_core::links::is_command_with_marker;

use crate::{
    blocks::MessageTemplate,
    commands::{
        CommandParseError, CommandPayload, CommandRouteError, CommandRouter, TriviaCommandService,
    },
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatEnvelope {
    pub envelope_id: String,
    pub event: ChatEvent,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChatEvent {
    Message(MessageEvent),
    Command(CommandPayload),
    Unsupported { event_type: String },
}

impl ChatEvent {
    /// Classifies an incoming channel message. Prefixed text from a human
    /// becomes a command; everything else goes to the live scrape path.
    pub fn from_message(
        channel_id: impl Into<String>,
        message: ChannelMessage,
        prefix: &str,
        request_id: impl Into<String>,
    ) -> Self {
        let channel_id = channel_id.into();
        if !message.is_from_bot && is_command_with_marker(&message.text, prefix) {
            if let Ok(payload) = CommandPayload::parse(
                &message.text,
                prefix,
                channel_id.clone(),
                message.author_name.clone(),
                request_id,
            ) {
                return Self::Command(payload);
            }
        }

        Self::Message(MessageEvent { channel_id, message })
    }

    pub fn event_type(&self) -> ChatEventType {
        match self {
            Self::Message(_) => ChatEventType::Message,
            Self::Command(_) => ChatEventType::Command,
            Self::Unsupported { .. } => ChatEventType::Unsupported,
        }
    }

    pub fn channel_id(&self) -> Option<&str> {
        match self {
            Self::Message(event) => Some(&event.channel_id),
            Self::Command(payload) => Some(&payload.channel_id),
            Self::Unsupported { .. } => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ChatEventType {
    Message,
    Command,
    Unsupported,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageEvent {
    pub channel_id: String,
    pub message: ChannelMessage,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventContext {
    pub correlation_id: String,
}

impl Default for EventContext {
    fn default() -> Self {
        Self { correlation_id: "unknown-correlation-id".to_owned() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HandlerResult {
    Responded(MessageTemplate),
    Processed,
    Ignored,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EventHandlerError {
    #[error(transparent)]
    Parse(#[from] CommandParseError),
    #[error(transparent)]
    Route(#[from] CommandRouteError),
    #[error("message handler failure: {0}")]
    Message(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error(transparent)]
    Handler(#[from] EventHandlerError),
}

#[async_trait]
pub trait EventHandler: Send + Sync {
    fn event_type(&self) -> ChatEventType;
    async fn handle(
        &self,
        envelope: &ChatEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError>;
}

#[derive(Default)]
pub struct EventDispatcher {
    handlers: HashMap<ChatEventType, Arc<dyn EventHandler>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<H>(&mut self, handler: H)
    where
        H: EventHandler + 'static,
    {
        self.handlers.insert(handler.event_type(), Arc::new(handler));
    }

    pub async fn dispatch(
        &self,
        envelope: &ChatEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, DispatchError> {
        let Some(handler) = self.handlers.get(&envelope.event.event_type()) else {
            return Ok(HandlerResult::Ignored);
        };

        handler.handle(envelope, ctx).await.map_err(DispatchError::from)
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }
}

pub struct CommandHandler<S> {
    router: CommandRouter<S>,
}

impl<S> CommandHandler<S>
where
    S: TriviaCommandService,
{
    pub fn new(service: S, prefix: impl Into<String>) -> Self {
        Self { router: CommandRouter::new(service, prefix) }
    }
}

#[async_trait]
impl<S> EventHandler for CommandHandler<S>
where
    S: TriviaCommandService + 'static,
{
    fn event_type(&self) -> ChatEventType {
        ChatEventType::Command
    }

    async fn handle(
        &self,
        envelope: &ChatEnvelope,
        _ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let ChatEvent::Command(payload) = &envelope.event else {
            return Ok(HandlerResult::Ignored);
        };

        let message = self.router.route(payload).await?;
        Ok(HandlerResult::Responded(message))
    }
}

#[async_trait]
pub trait MessageService: Send + Sync {
    async fn handle_message(
        &self,
        event: &MessageEvent,
        ctx: &EventContext,
    ) -> Result<Option<MessageTemplate>, EventHandlerError>;
}

pub struct MessageHandler<S> {
    service: S,
}

impl<S> MessageHandler<S>
where
    S: MessageService,
{
    pub fn new(service: S) -> Self {
        Self { service }
    }
}

#[async_trait]
impl<S> EventHandler for MessageHandler<S>
where
    S: MessageService + 'static,
{
    fn event_type(&self) -> ChatEventType {
        ChatEventType::Message
    }

    async fn handle(
        &self,
        envelope: &ChatEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let ChatEvent::Message(event) = &envelope.event else {
            return Ok(HandlerResult::Ignored);
        };

        let message = self.service.handle_message(event, ctx).await?;
        Ok(match message {
            Some(message) => HandlerResult::Responded(message),
            None => HandlerResult::Processed,
        })
    }
}
