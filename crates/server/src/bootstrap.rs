use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use trivia_chat::channel::{
    ChannelHistory, ChannelPurge, NoopChannelHistory, NoopChannelPurge, NoopVoiceRoster,
    VoiceRoster,
};
use trivia_chat::events::{CommandHandler, EventDispatcher, MessageHandler};
use trivia_chat::gateway::{GatewayRunner, GatewayTransport, NoopGatewayTransport, ReconnectPolicy};
use trivia_core::config::{AppConfig, ConfigError};
use trivia_db::{connect_with_config, migrations, DbPool, LinkRepository, SqlLinkRepository};

use crate::scrape::ScrapeOrchestrator;
use crate::service::{LiveScrapeService, TriviaCommands};
use crate::sheets::{MirrorError, MirrorSink, NoopMirrorSink, SheetsMirror};
use crate::title::{HttpTitleResolver, TitleResolver};

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub links: Arc<dyn LinkRepository>,
    pub gateway: GatewayRunner,
}

/// Platform adapters plugged into the bot. Anything left unset falls back
/// to a no-op adapter, or to the HTTP resolver for titles.
pub struct Collaborators {
    pub transport: Arc<dyn GatewayTransport>,
    pub history: Arc<dyn ChannelHistory>,
    pub roster: Arc<dyn VoiceRoster>,
    pub purge: Arc<dyn ChannelPurge>,
    pub titles: Option<Arc<dyn TitleResolver>>,
}

impl Default for Collaborators {
    fn default() -> Self {
        Self {
            transport: Arc::new(NoopGatewayTransport),
            history: Arc::new(NoopChannelHistory),
            roster: Arc::new(NoopVoiceRoster),
            purge: Arc::new(NoopChannelPurge),
            titles: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("http client construction failed: {0}")]
    HttpClient(#[source] reqwest::Error),
    #[error("sheet mirror setup failed: {0}")]
    Mirror(#[source] MirrorError),
}

pub async fn bootstrap_with_config(
    config: AppConfig,
    collaborators: Collaborators,
) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let db_pool =
        connect_with_config(&config.database).await.map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    let links: Arc<dyn LinkRepository> = Arc::new(SqlLinkRepository::new(db_pool.clone()));
    let titles: Arc<dyn TitleResolver> = match collaborators.titles {
        Some(titles) => titles,
        None => Arc::new(
            HttpTitleResolver::from_config(&config.scrape).map_err(BootstrapError::HttpClient)?,
        ),
    };
    let mirror: Arc<dyn MirrorSink> = if config.sheets.is_enabled() {
        Arc::new(SheetsMirror::from_config(&config.sheets).map_err(BootstrapError::Mirror)?)
    } else {
        Arc::new(NoopMirrorSink)
    };
    info!(
        event_name = "system.bootstrap.mirror_selected",
        correlation_id = "bootstrap",
        sheets_enabled = config.sheets.is_enabled(),
        "sheet mirror configured"
    );

    let prefix = config.chat.command_prefix.clone();
    let scraper = Arc::new(ScrapeOrchestrator::new(links.clone(), titles, mirror, prefix.clone()));

    let mut dispatcher = EventDispatcher::new();
    dispatcher.register(MessageHandler::new(LiveScrapeService::new(scraper.clone())));
    dispatcher.register(CommandHandler::new(
        TriviaCommands::new(
            scraper,
            collaborators.history,
            collaborators.roster,
            collaborators.purge,
            config.chat.voice_channel_id.clone(),
            config.scrape.history_limit,
        ),
        prefix,
    ));

    let gateway =
        GatewayRunner::new(collaborators.transport, dispatcher, ReconnectPolicy::default());

    Ok(Application { config, db_pool, links, gateway })
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;
    use chrono::Utc;

    use trivia_chat::blocks::MessageTemplate;
    use trivia_chat::channel::{ChannelError, ChannelHistory, ChannelPurge};
    use trivia_chat::events::{ChatEnvelope, ChatEvent};
    use trivia_chat::gateway::{GatewayTransport, TransportError};
    use trivia_core::config::{AppConfig, ConfigOverrides, LoadOptions};
    use trivia_core::domain::message::ChannelMessage;

    use super::{bootstrap_with_config, Application, BootstrapError, Collaborators};
    use crate::title::TitleResolver;

    struct FixedTitle;

    #[async_trait]
    impl TitleResolver for FixedTitle {
        async fn resolve(&self, _url: &str) -> Option<String> {
            Some("Quiz Night".to_owned())
        }
    }

    /// History that takes a while to page through, like a full channel scan.
    struct SlowHistory;

    #[async_trait]
    impl ChannelHistory for SlowHistory {
        async fn recent_messages(
            &self,
            _channel_id: &str,
            _limit: u32,
        ) -> Result<Vec<ChannelMessage>, ChannelError> {
            tokio::time::sleep(Duration::from_millis(400)).await;
            Ok(vec![ChannelMessage::new("https://forms.gle/older", "host", Utc::now())])
        }
    }

    #[derive(Default)]
    struct CountingPurge {
        requests: Mutex<Vec<(String, u32)>>,
    }

    #[async_trait]
    impl ChannelPurge for CountingPurge {
        async fn delete_recent(&self, channel_id: &str, limit: u32) -> Result<u32, ChannelError> {
            self.requests.lock().expect("purge lock").push((channel_id.to_owned(), limit));
            Ok(limit)
        }
    }

    #[derive(Default)]
    struct ScriptedTransport {
        inbound: Mutex<VecDeque<ChatEnvelope>>,
        sent: Mutex<Vec<(String, MessageTemplate)>>,
    }

    impl ScriptedTransport {
        fn with(envelopes: Vec<ChatEnvelope>) -> Self {
            Self { inbound: Mutex::new(envelopes.into()), sent: Mutex::default() }
        }

        fn sent(&self) -> Vec<(String, MessageTemplate)> {
            self.sent.lock().expect("sent lock").clone()
        }
    }

    #[async_trait]
    impl GatewayTransport for ScriptedTransport {
        async fn connect(&self) -> Result<(), TransportError> {
            Ok(())
        }

        async fn next_envelope(&self) -> Result<Option<ChatEnvelope>, TransportError> {
            Ok(self.inbound.lock().expect("inbound lock").pop_front())
        }

        async fn acknowledge(&self, _envelope_id: &str) -> Result<(), TransportError> {
            Ok(())
        }

        async fn send(
            &self,
            channel_id: &str,
            message: &MessageTemplate,
        ) -> Result<(), TransportError> {
            self.sent.lock().expect("sent lock").push((channel_id.to_owned(), message.clone()));
            Ok(())
        }

        async fn disconnect(&self) -> Result<(), TransportError> {
            Ok(())
        }
    }

    fn config(database_url: &str) -> AppConfig {
        AppConfig::load(LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some(database_url.to_string()),
                bot_token: Some("test-bot-token".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .expect("valid config")
    }

    async fn bootstrap(collaborators: Collaborators) -> Result<Application, BootstrapError> {
        bootstrap_with_config(config("sqlite::memory:"), collaborators).await
    }

    fn envelope(id: &str, text: &str, author: &str) -> ChatEnvelope {
        envelope_for(id, ChannelMessage::new(text, author, Utc::now()))
    }

    fn envelope_for(id: &str, message: ChannelMessage) -> ChatEnvelope {
        ChatEnvelope {
            envelope_id: id.to_owned(),
            event: ChatEvent::from_message("channel-1", message, "??", id),
        }
    }

    #[tokio::test]
    async fn bootstrap_reports_an_unreachable_database() {
        let result = bootstrap_with_config(
            config("sqlite:///nonexistent-trivia-dir/nested/trivia.db"),
            Collaborators::default(),
        )
        .await;

        assert!(matches!(result, Err(BootstrapError::DatabaseConnect(_))));
    }

    #[tokio::test]
    async fn bootstrap_migrates_the_archive() {
        let app = bootstrap(Collaborators::default()).await.expect("bootstrap");

        let (table_count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'link_record'",
        )
        .fetch_one(&app.db_pool)
        .await
        .expect("table lookup");
        assert_eq!(table_count, 1);
        assert_eq!(app.links.count().await.expect("count"), 0);

        app.db_pool.close().await;
    }

    #[tokio::test]
    async fn gateway_archives_live_links_and_answers_commands() {
        let transport = Arc::new(ScriptedTransport::with(vec![
            envelope("env-1", "tonight: https://forms.gle/quiz1", "host"),
            envelope("env-2", "https://forms.gle/quiz1", "guest"),
            envelope("env-3", "??mt 2 Ann Bob Cat", "host"),
            envelope_for(
                "env-4",
                ChannelMessage::new("https://forms.gle/echo", "trivia-bot", Utc::now()).from_bot(),
            ),
        ]));
        let app = bootstrap(Collaborators {
            transport: transport.clone(),
            titles: Some(Arc::new(FixedTitle)),
            ..Collaborators::default()
        })
        .await
        .expect("bootstrap");

        app.gateway.start().await.expect("gateway run");

        let replies: Vec<String> =
            transport.sent().into_iter().map(|(_, message)| message.fallback_text).collect();
        assert_eq!(replies[0], "Howdy, Quiz Night was just scraped and added to the DB!");
        assert_eq!(replies[1], "Howdy, looks like this round is already in the DB!");
        assert!(replies[2].starts_with("Team 1: "));
        assert_eq!(replies.len(), 3);
        assert_eq!(app.links.count().await.expect("count"), 1);

        let stored = app.links.find("https://forms.gle/quiz1").await.expect("find").expect("row");
        assert_eq!(stored.submitter, "host");
        assert_eq!(stored.title.as_deref(), Some("Quiz Night"));

        app.db_pool.close().await;
    }

    #[tokio::test]
    async fn a_slow_full_scrape_does_not_delay_live_replies() {
        let transport = Arc::new(ScriptedTransport::with(vec![
            envelope("env-1", "??scrape full", "host"),
            envelope("env-2", "https://forms.gle/live", "guest"),
        ]));
        let app = bootstrap(Collaborators {
            transport: transport.clone(),
            history: Arc::new(SlowHistory),
            titles: Some(Arc::new(FixedTitle)),
            ..Collaborators::default()
        })
        .await
        .expect("bootstrap");

        app.gateway.start().await.expect("gateway run");

        let replies: Vec<String> =
            transport.sent().into_iter().map(|(_, message)| message.fallback_text).collect();
        assert_eq!(replies.len(), 2);
        assert_eq!(replies[0], "Howdy, Quiz Night was just scraped and added to the DB!");
        assert!(replies[1].starts_with("Howdy! I scraped a total of 1 links."));
        assert_eq!(app.links.count().await.expect("count"), 2);

        app.db_pool.close().await;
    }

    #[tokio::test]
    async fn delete_previous_reaches_the_channel_purge() {
        let purge = Arc::new(CountingPurge::default());
        let transport =
            Arc::new(ScriptedTransport::with(vec![envelope("env-1", "??dp 2", "host")]));
        let app = bootstrap(Collaborators {
            transport: transport.clone(),
            purge: purge.clone(),
            ..Collaborators::default()
        })
        .await
        .expect("bootstrap");

        app.gateway.start().await.expect("gateway run");

        assert_eq!(
            *purge.requests.lock().expect("purge lock"),
            vec![("channel-1".to_owned(), 2)]
        );
        let replies: Vec<String> =
            transport.sent().into_iter().map(|(_, message)| message.fallback_text).collect();
        assert_eq!(replies, vec!["Deleted 2 messages.".to_owned()]);

        app.db_pool.close().await;
    }
}
