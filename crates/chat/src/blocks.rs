use serde::Serialize;

use trivia_core::domain::scrape::ScrapeSummary;
use trivia_core::errors::InterfaceError;
use trivia_core::scores::TeamScore;
use trivia_core::teams::Team;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbedColor {
    Info,
    Success,
    Warning,
    Error,
}

impl EmbedColor {
    /// RGB value as the chat platform expects it.
    pub fn rgb(&self) -> u32 {
        match self {
            Self::Info => 0x3498DB,
            Self::Success => 0x2ECC71,
            Self::Warning => 0xF1C40F,
            Self::Error => 0xE74C3C,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Embed {
    pub block_id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub color: EmbedColor,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<EmbedField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MessageTemplate {
    pub fallback_text: String,
    pub embeds: Vec<Embed>,
}

pub struct MessageBuilder {
    fallback_text: String,
    embeds: Vec<Embed>,
}

impl MessageBuilder {
    pub fn new(fallback_text: impl Into<String>) -> Self {
        Self { fallback_text: fallback_text.into(), embeds: Vec::new() }
    }

    pub fn embed<F>(
        mut self,
        block_id: impl Into<String>,
        title: impl Into<String>,
        build: F,
    ) -> Self
    where
        F: FnOnce(&mut EmbedBuilder),
    {
        let mut builder = EmbedBuilder::default();
        build(&mut builder);
        self.embeds.push(builder.build(block_id.into(), title.into()));
        self
    }

    pub fn build(self) -> MessageTemplate {
        MessageTemplate { fallback_text: self.fallback_text, embeds: self.embeds }
    }
}

#[derive(Default)]
pub struct EmbedBuilder {
    description: Option<String>,
    color: Option<EmbedColor>,
    fields: Vec<EmbedField>,
    footer: Option<String>,
}

impl EmbedBuilder {
    pub fn description(&mut self, text: impl Into<String>) -> &mut Self {
        self.description = Some(text.into());
        self
    }

    pub fn color(&mut self, color: EmbedColor) -> &mut Self {
        self.color = Some(color);
        self
    }

    pub fn field(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.fields.push(EmbedField { name: name.into(), value: value.into(), inline: false });
        self
    }

    pub fn inline_field(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.fields.push(EmbedField { name: name.into(), value: value.into(), inline: true });
        self
    }

    pub fn footer(&mut self, text: impl Into<String>) -> &mut Self {
        self.footer = Some(text.into());
        self
    }

    fn build(self, block_id: String, title: String) -> Embed {
        Embed {
            block_id,
            title,
            description: self.description,
            color: self.color.unwrap_or(EmbedColor::Info),
            fields: self.fields,
            footer: self.footer,
        }
    }
}

pub fn scrape_summary_message(summary: &ScrapeSummary) -> MessageTemplate {
    let mut text = format!(
        "Howdy! I scraped a total of {} links. I found {} forms and {} folders! \
         {} were added to DB and {} were repeat links",
        summary.total(),
        summary.forms,
        summary.folders,
        summary.inserted,
        summary.repeats()
    );
    if summary.failed > 0 {
        text.push_str(&format!(
            ". {} could not be archived; scrape again to retry them",
            summary.failed
        ));
    }

    MessageBuilder::new(text.clone())
        .embed("scrape.summary.v1", "Scrape complete", |embed| {
            embed
                .description(text)
                .color(if summary.failed > 0 { EmbedColor::Warning } else { EmbedColor::Success })
                .inline_field("Forms", summary.forms.to_string())
                .inline_field("Folders", summary.folders.to_string())
                .inline_field("Added", summary.inserted.to_string())
                .inline_field("Repeats", summary.repeats().to_string());
            if summary.failed > 0 {
                embed.inline_field("Failed", summary.failed.to_string());
            }
        })
        .build()
}

pub fn messages_deleted_message(count: u32) -> MessageTemplate {
    let noun = if count == 1 { "message" } else { "messages" };
    MessageBuilder::new(format!("Deleted {count} {noun}."))
        .embed("channel.purge.v1", "Channel tidied", |embed| {
            embed.description(format!("Deleted {count} {noun}.")).color(EmbedColor::Info);
        })
        .build()
}

pub fn link_inserted_message(url: &str, title: Option<&str>) -> MessageTemplate {
    let name = title.filter(|title| !title.trim().is_empty()).unwrap_or(url);
    MessageBuilder::new(format!("Howdy, {name} was just scraped and added to the DB!"))
        .embed("scrape.live.inserted.v1", "Round archived", |embed| {
            embed
                .description(format!("Howdy, **{name}** was just scraped and added to the DB!"))
                .color(EmbedColor::Success)
                .field("Link", url);
        })
        .build()
}

pub fn link_already_present_message(url: &str) -> MessageTemplate {
    MessageBuilder::new("Howdy, looks like this round is already in the DB!")
        .embed("scrape.live.repeat.v1", "Already archived", |embed| {
            embed
                .description("Howdy, looks like this round is already in the DB!")
                .color(EmbedColor::Info)
                .field("Link", url);
        })
        .build()
}

pub fn teams_message(teams: &[Team]) -> MessageTemplate {
    let fallback = teams
        .iter()
        .enumerate()
        .map(|(index, members)| format!("Team {}: {}", index + 1, members.join(", ")))
        .collect::<Vec<_>>()
        .join("\n");

    MessageBuilder::new(fallback)
        .embed("teams.list.v1", "Teams", |embed| {
            embed.color(EmbedColor::Info);
            for (index, members) in teams.iter().enumerate() {
                embed.field(format!("Team {}", index + 1), members.join("\n"));
            }
        })
        .build()
}

pub fn scores_message(scores: &[TeamScore]) -> MessageTemplate {
    let fallback = scores
        .iter()
        .map(|entry| format!("Team {}: {}", entry.team_number, entry.score.normalize()))
        .collect::<Vec<_>>()
        .join("\n");

    MessageBuilder::new(fallback)
        .embed("scores.list.v1", "Scores", |embed| {
            embed.color(EmbedColor::Info);
            for entry in scores {
                embed.inline_field(
                    format!("Team {}", entry.team_number),
                    entry.score.normalize().to_string(),
                );
            }
        })
        .build()
}

pub fn usage_message(command: &str, usage: &str, prefix: &str) -> MessageTemplate {
    MessageBuilder::new(format!("Usage: {prefix}{usage}"))
        .embed("command.usage.v1", format!("Could not read `{prefix}{command}`"), |embed| {
            embed
                .description(format!("Usage: `{prefix}{usage}`"))
                .color(EmbedColor::Warning)
                .footer(format!("Try {prefix}help for the full command list."));
        })
        .build()
}

pub fn unknown_command_message(name: &str, prefix: &str) -> MessageTemplate {
    MessageBuilder::new(format!("`{prefix}{name}` is not a command. Try {prefix}help"))
        .embed("command.unknown.v1", "Unknown command", |embed| {
            embed
                .description(format!("`{prefix}{name}` is not a command. Try `{prefix}help`."))
                .color(EmbedColor::Warning);
        })
        .build()
}

pub fn error_message(summary: &str, correlation_id: &str) -> MessageTemplate {
    MessageBuilder::new(summary.to_owned())
        .embed("command.error.v1", "Something went wrong", |embed| {
            embed
                .description(format!(":warning: {summary}"))
                .color(EmbedColor::Error)
                .footer(format!("Correlation ID: {correlation_id}"));
        })
        .build()
}

/// Renders a rejected command. Bad requests carry a detail that is safe to
/// show; everything else falls back to the generic user message.
pub fn interface_error_message(error: &InterfaceError) -> MessageTemplate {
    match error {
        InterfaceError::BadRequest { message, correlation_id } => {
            error_message(message, correlation_id)
        }
        InterfaceError::ServiceUnavailable { correlation_id, .. }
        | InterfaceError::Internal { correlation_id, .. } => {
            error_message(error.user_message(), correlation_id)
        }
    }
}

pub fn help_message(prefix: &str) -> MessageTemplate {
    let lines = [
        ("scrape [full]", "Archive form and folder links from this channel (last 24h, or all)"),
        ("make_teams | mt COUNT NAME...", "Split the given names into COUNT random teams"),
        ("make_teams_auto | mta [COUNT]", "Split the voice channel into COUNT teams (default 2)"),
        ("add_scores | as SCORE...", "Add one score per team"),
        ("update_scores | us SCORE...", "Overwrite the score of every team"),
        ("show_scores | ss", "Show the scoreboard"),
        ("show_teams | st", "Show the current teams"),
        ("help", "Show this message"),
    ];

    MessageBuilder::new("Trivia bot command help")
        .embed("command.help.v1", "Available commands", |embed| {
            embed.color(EmbedColor::Info);
            for (usage, summary) in lines {
                embed.field(format!("{prefix}{usage}"), summary);
            }
        })
        .build()
}
