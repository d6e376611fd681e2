//! Chat-facing services: the live scrape handler for plain messages and
//! the `??` command implementations.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use tracing::{info, warn};

use trivia_chat::blocks::{self, MessageTemplate};
use trivia_chat::channel::{ChannelError, ChannelHistory, ChannelPurge, VoiceRoster};
use trivia_chat::commands::{CommandPayload, CommandRouteError, TriviaCommandService};
use trivia_chat::events::{EventContext, EventHandlerError, MessageEvent, MessageService};
use trivia_core::domain::scrape::{LiveOutcome, ScrapeScope};
use trivia_core::errors::ApplicationError;
use trivia_core::session::TriviaSession;

use crate::scrape::ScrapeOrchestrator;

/// Runs every non-command channel message through the live scrape path.
pub struct LiveScrapeService {
    scraper: Arc<ScrapeOrchestrator>,
}

impl LiveScrapeService {
    pub fn new(scraper: Arc<ScrapeOrchestrator>) -> Self {
        Self { scraper }
    }
}

#[async_trait]
impl MessageService for LiveScrapeService {
    async fn handle_message(
        &self,
        event: &MessageEvent,
        ctx: &EventContext,
    ) -> Result<Option<MessageTemplate>, EventHandlerError> {
        let outcome = self
            .scraper
            .live(&event.message, &ctx.correlation_id)
            .await
            .map_err(|error| EventHandlerError::Message(error.to_string()))?;

        Ok(match outcome {
            LiveOutcome::Ignored => None,
            LiveOutcome::Inserted { url, title } => {
                Some(blocks::link_inserted_message(&url, title.as_deref()))
            }
            LiveOutcome::AlreadyPresent { url } => {
                Some(blocks::link_already_present_message(&url))
            }
        })
    }
}

pub struct TriviaCommands {
    scraper: Arc<ScrapeOrchestrator>,
    history: Arc<dyn ChannelHistory>,
    roster: Arc<dyn VoiceRoster>,
    purge: Arc<dyn ChannelPurge>,
    session: Mutex<TriviaSession>,
    voice_channel_id: Option<String>,
    history_limit: u32,
}

impl TriviaCommands {
    pub fn new(
        scraper: Arc<ScrapeOrchestrator>,
        history: Arc<dyn ChannelHistory>,
        roster: Arc<dyn VoiceRoster>,
        purge: Arc<dyn ChannelPurge>,
        voice_channel_id: Option<String>,
        history_limit: u32,
    ) -> Self {
        Self {
            scraper,
            history,
            roster,
            purge,
            session: Mutex::new(TriviaSession::new()),
            voice_channel_id,
            history_limit,
        }
    }

    async fn form_teams(
        &self,
        team_count: usize,
        names: &[String],
        payload: &CommandPayload,
    ) -> Result<MessageTemplate, CommandRouteError> {
        let mut session = self.session.lock().await;
        let teams = session
            .form_teams(team_count, names, &mut rand::thread_rng())
            .map_err(|error| rejected(error, payload))?;

        info!(
            event_name = "trivia.session.teams_formed",
            correlation_id = %payload.request_id,
            channel_id = %payload.channel_id,
            team_count = teams.len(),
            participants = names.len(),
            "teams formed"
        );
        Ok(blocks::teams_message(teams))
    }
}

fn rejected(error: impl Into<ApplicationError>, payload: &CommandPayload) -> CommandRouteError {
    CommandRouteError::Rejected(error.into().into_interface(payload.request_id.clone()))
}

fn channel_failure(error: ChannelError, payload: &CommandPayload) -> CommandRouteError {
    warn!(
        event_name = "trivia.channel.read_failed",
        correlation_id = %payload.request_id,
        channel_id = %payload.channel_id,
        error = %error,
        "chat platform read failed"
    );
    rejected(ApplicationError::Integration(error.to_string()), payload)
}

#[async_trait]
impl TriviaCommandService for TriviaCommands {
    async fn scrape(
        &self,
        scope: ScrapeScope,
        payload: &CommandPayload,
    ) -> Result<MessageTemplate, CommandRouteError> {
        let messages = self
            .history
            .recent_messages(&payload.channel_id, self.history_limit)
            .await
            .map_err(|error| channel_failure(error, payload))?;

        let summary =
            self.scraper.bulk_scan(scope, &messages, Utc::now(), &payload.request_id).await;

        Ok(blocks::scrape_summary_message(&summary))
    }

    async fn make_teams(
        &self,
        team_count: usize,
        names: Vec<String>,
        payload: &CommandPayload,
    ) -> Result<MessageTemplate, CommandRouteError> {
        self.form_teams(team_count, &names, payload).await
    }

    async fn make_teams_auto(
        &self,
        team_count: usize,
        payload: &CommandPayload,
    ) -> Result<MessageTemplate, CommandRouteError> {
        let Some(voice_channel_id) = self.voice_channel_id.as_deref() else {
            return Ok(blocks::error_message(
                "No voice channel is configured for automatic teams (chat.voice_channel_id).",
                &payload.request_id,
            ));
        };

        let names = self
            .roster
            .member_names(voice_channel_id)
            .await
            .map_err(|error| channel_failure(error, payload))?;

        self.form_teams(team_count, &names, payload).await
    }

    async fn add_scores(
        &self,
        deltas: Vec<Decimal>,
        payload: &CommandPayload,
    ) -> Result<MessageTemplate, CommandRouteError> {
        let mut session = self.session.lock().await;
        let scores = session.add_scores(&deltas).map_err(|error| rejected(error, payload))?;
        Ok(blocks::scores_message(&scores))
    }

    async fn update_scores(
        &self,
        values: Vec<Decimal>,
        payload: &CommandPayload,
    ) -> Result<MessageTemplate, CommandRouteError> {
        let mut session = self.session.lock().await;
        let scores = session.set_scores(&values).map_err(|error| rejected(error, payload))?;
        Ok(blocks::scores_message(&scores))
    }

    async fn show_scores(
        &self,
        payload: &CommandPayload,
    ) -> Result<MessageTemplate, CommandRouteError> {
        let scores =
            self.session.lock().await.show_scores().map_err(|error| rejected(error, payload))?;
        Ok(blocks::scores_message(&scores))
    }

    async fn show_teams(
        &self,
        payload: &CommandPayload,
    ) -> Result<MessageTemplate, CommandRouteError> {
        let session = self.session.lock().await;
        let teams = session.teams().map_err(|error| rejected(error, payload))?;
        Ok(blocks::teams_message(teams))
    }

    async fn delete_previous(
        &self,
        count: u32,
        payload: &CommandPayload,
    ) -> Result<MessageTemplate, CommandRouteError> {
        let deleted = self
            .purge
            .delete_recent(&payload.channel_id, count)
            .await
            .map_err(|error| channel_failure(error, payload))?;

        info!(
            event_name = "trivia.channel.purged",
            correlation_id = %payload.request_id,
            channel_id = %payload.channel_id,
            author = %payload.author_name,
            requested = count,
            deleted,
            "deleted recent channel messages"
        );
        Ok(blocks::messages_deleted_message(deleted))
    }
}
