//! Link archiving pipeline shared by the bulk `scrape` command and the
//! live message path.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use tracing::{debug, info, warn};

use trivia_core::domain::link::{LinkKind, LinkRecord, MirrorRow};
use trivia_core::domain::message::ChannelMessage;
use trivia_core::domain::scrape::{LiveOutcome, ScrapeScope, ScrapeSummary};
use trivia_core::links::{classify, is_command_with_marker, LinkMatch};
use trivia_db::{InsertOutcome, LinkRepository, RepositoryError};

use crate::sheets::MirrorSink;
use crate::title::TitleResolver;

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("link archive failed: {0}")]
    Repository(#[from] RepositoryError),
}

pub struct ScrapeOrchestrator {
    links: Arc<dyn LinkRepository>,
    titles: Arc<dyn TitleResolver>,
    mirror: Arc<dyn MirrorSink>,
    command_prefix: String,
}

impl ScrapeOrchestrator {
    pub fn new(
        links: Arc<dyn LinkRepository>,
        titles: Arc<dyn TitleResolver>,
        mirror: Arc<dyn MirrorSink>,
        command_prefix: impl Into<String>,
    ) -> Self {
        Self { links, titles, mirror, command_prefix: command_prefix.into() }
    }

    /// Archives every new link found in `messages`. `LastDay` only looks at
    /// messages created less than 24 hours before `now`. A link the archive
    /// fails to store is counted as failed and the scan moves on; rows that
    /// were inserted are mirrored as one batch once the scan completes.
    pub async fn bulk_scan(
        &self,
        scope: ScrapeScope,
        messages: &[ChannelMessage],
        now: DateTime<Utc>,
        correlation_id: &str,
    ) -> ScrapeSummary {
        let cutoff = match scope {
            ScrapeScope::LastDay => Some(now - Duration::hours(24)),
            ScrapeScope::FullHistory => None,
        };

        let mut summary = ScrapeSummary::default();
        let mut mirrored = Vec::new();

        for message in messages {
            if cutoff.is_some_and(|cutoff| message.created_at <= cutoff) {
                continue;
            }
            let Some(found) = self.matching_link(message) else {
                continue;
            };

            match found.kind {
                LinkKind::Form => summary.forms += 1,
                LinkKind::Folder => summary.folders += 1,
            }

            let url = found.url.clone();
            match self.archive(message, found).await {
                Ok((record, InsertOutcome::Inserted)) => {
                    summary.inserted += 1;
                    mirrored.push(record.mirror_row());
                }
                Ok((_, InsertOutcome::AlreadyPresent)) => {}
                Err(error) => {
                    summary.failed += 1;
                    warn!(
                        event_name = "trivia.scrape.archive_failed",
                        correlation_id,
                        url = %url,
                        error = %error,
                        "could not archive link; continuing scan"
                    );
                }
            }
        }

        self.mirror_rows(&mirrored, correlation_id).await;

        info!(
            event_name = "trivia.scrape.bulk_completed",
            correlation_id,
            scope = scope.as_str(),
            scanned = messages.len(),
            forms = summary.forms,
            folders = summary.folders,
            inserted = summary.inserted,
            repeats = summary.repeats(),
            failed = summary.failed,
            "bulk scrape completed"
        );

        summary
    }

    /// Archives the link in a single freshly posted message, if any.
    pub async fn live(
        &self,
        message: &ChannelMessage,
        correlation_id: &str,
    ) -> Result<LiveOutcome, ScrapeError> {
        let Some(found) = self.matching_link(message) else {
            return Ok(LiveOutcome::Ignored);
        };

        match self.archive(message, found).await? {
            (record, InsertOutcome::Inserted) => {
                self.mirror_rows(&[record.mirror_row()], correlation_id).await;
                info!(
                    event_name = "trivia.scrape.live_inserted",
                    correlation_id,
                    url = %record.url,
                    kind = %record.kind,
                    "archived live link"
                );
                Ok(LiveOutcome::Inserted { url: record.url, title: record.title })
            }
            (record, InsertOutcome::AlreadyPresent) => {
                debug!(
                    event_name = "trivia.scrape.live_repeat",
                    correlation_id,
                    url = %record.url,
                    "live link already archived"
                );
                Ok(LiveOutcome::AlreadyPresent { url: record.url })
            }
        }
    }

    fn matching_link(&self, message: &ChannelMessage) -> Option<LinkMatch> {
        if message.is_from_bot || is_command_with_marker(&message.text, &self.command_prefix) {
            return None;
        }
        classify(&message.text)
    }

    /// Stores the record for `found`. Titles are only fetched for URLs that
    /// are not archived yet; a lost insert race after the fetch is still
    /// settled by the repository.
    async fn archive(
        &self,
        message: &ChannelMessage,
        found: LinkMatch,
    ) -> Result<(LinkRecord, InsertOutcome), ScrapeError> {
        let title = if self.links.exists(&found.url).await? {
            None
        } else {
            self.titles.resolve(&found.url).await
        };

        let record = LinkRecord {
            url: found.url,
            captured_at: message.created_at,
            submitter: message.author_name.clone(),
            title,
            kind: found.kind,
        };
        let outcome = self.links.insert(&record).await?;
        Ok((record, outcome))
    }

    async fn mirror_rows(&self, rows: &[MirrorRow], correlation_id: &str) {
        if rows.is_empty() {
            return;
        }
        if let Err(error) = self.mirror.append_rows(rows).await {
            warn!(
                event_name = "trivia.mirror.append_failed",
                correlation_id,
                rows = rows.len(),
                error = %error,
                "sheet mirror append failed; archive is unaffected"
            );
        }
    }
}
