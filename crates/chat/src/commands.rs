use async_trait::async_trait;
use rust_decimal::Decimal;
use std::str::FromStr;
use thiserror::Error;

use trivia_core::domain::scrape::ScrapeScope;
use trivia_core::errors::InterfaceError;

use crate::blocks::{self, MessageTemplate};

pub const DEFAULT_AUTO_TEAM_COUNT: usize = 2;
pub const DEFAULT_DELETE_COUNT: u32 = 1;
/// Chat platforms bulk-delete at most this many messages per call.
pub const MAX_DELETE_COUNT: u32 = 100;

/// A prefixed chat message split into a command name and its arguments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandPayload {
    pub name: String,
    pub args: Vec<String>,
    pub channel_id: String,
    pub author_name: String,
    pub request_id: String,
}

impl CommandPayload {
    pub fn parse(
        text: &str,
        prefix: &str,
        channel_id: impl Into<String>,
        author_name: impl Into<String>,
        request_id: impl Into<String>,
    ) -> Result<Self, CommandParseError> {
        let mut tokens = text.split_whitespace();
        let head = tokens.next().unwrap_or_default();
        let Some(name) = head.strip_prefix(prefix) else {
            return Err(CommandParseError::MissingPrefix { prefix: prefix.to_owned() });
        };

        Ok(Self {
            name: name.to_ascii_lowercase(),
            args: tokens.map(str::to_owned).collect(),
            channel_id: channel_id.into(),
            author_name: author_name.into(),
            request_id: request_id.into(),
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TriviaCommand {
    Scrape { scope: ScrapeScope },
    MakeTeams { team_count: usize, names: Vec<String> },
    MakeTeamsAuto { team_count: usize },
    AddScores { deltas: Vec<Decimal> },
    UpdateScores { values: Vec<Decimal> },
    ShowScores,
    ShowTeams,
    /// Hidden from `help`. The count includes the invoking command.
    DeletePrevious { count: u32 },
    Help,
    Unknown { name: String },
}

impl TriviaCommand {
    pub fn parse(name: &str, args: &[String]) -> Result<Self, CommandParseError> {
        match name {
            "scrape" => {
                let raw = args.first().map(String::as_str).unwrap_or_default();
                let scope = ScrapeScope::from_str(raw)
                    .map_err(|_| invalid_arguments("scrape", "scrape [full]"))?;
                Ok(Self::Scrape { scope })
            }
            "make_teams" | "mt" => {
                let (count, names) =
                    args.split_first().ok_or_else(|| invalid_arguments("mt", MAKE_TEAMS_USAGE))?;
                let team_count =
                    parse_count(count).ok_or_else(|| invalid_arguments("mt", MAKE_TEAMS_USAGE))?;
                Ok(Self::MakeTeams { team_count, names: names.to_vec() })
            }
            "make_teams_auto" | "mta" => {
                let team_count = match args {
                    [] => DEFAULT_AUTO_TEAM_COUNT,
                    [count] => parse_count(count)
                        .ok_or_else(|| invalid_arguments("mta", "mta [COUNT]"))?,
                    _ => return Err(invalid_arguments("mta", "mta [COUNT]")),
                };
                Ok(Self::MakeTeamsAuto { team_count })
            }
            "add_scores" | "as" => {
                let deltas =
                    parse_scores(args).ok_or_else(|| invalid_arguments("as", "as SCORE..."))?;
                Ok(Self::AddScores { deltas })
            }
            "update_scores" | "us" => {
                let values =
                    parse_scores(args).ok_or_else(|| invalid_arguments("us", "us SCORE..."))?;
                Ok(Self::UpdateScores { values })
            }
            "show_scores" | "ss" => Ok(Self::ShowScores),
            "show_teams" | "st" => Ok(Self::ShowTeams),
            "del_prev" | "dp" => {
                let count = match args {
                    [] => DEFAULT_DELETE_COUNT,
                    [count] => count
                        .parse::<u32>()
                        .ok()
                        .filter(|count| (1..=MAX_DELETE_COUNT).contains(count))
                        .ok_or_else(|| invalid_arguments("dp", DELETE_PREVIOUS_USAGE))?,
                    _ => return Err(invalid_arguments("dp", DELETE_PREVIOUS_USAGE)),
                };
                Ok(Self::DeletePrevious { count })
            }
            "help" | "" => Ok(Self::Help),
            other => Ok(Self::Unknown { name: other.to_owned() }),
        }
    }
}

const MAKE_TEAMS_USAGE: &str = "mt COUNT NAME...";
const DELETE_PREVIOUS_USAGE: &str = "dp [COUNT up to 100]";

fn invalid_arguments(command: &'static str, usage: &'static str) -> CommandParseError {
    CommandParseError::InvalidArguments { command, usage }
}

fn parse_count(raw: &str) -> Option<usize> {
    raw.parse::<usize>().ok()
}

fn parse_scores(args: &[String]) -> Option<Vec<Decimal>> {
    if args.is_empty() {
        return None;
    }
    args.iter().map(|raw| Decimal::from_str(raw.trim_end_matches(',')).ok()).collect()
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandParseError {
    #[error("message does not start with the command prefix `{prefix}`")]
    MissingPrefix { prefix: String },
    #[error("invalid arguments for `{command}`; usage: {usage}")]
    InvalidArguments { command: &'static str, usage: &'static str },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandRouteError {
    #[error(transparent)]
    Parse(#[from] CommandParseError),
    #[error("command rejected: {0}")]
    Rejected(InterfaceError),
    #[error("command service failed: {0}")]
    Service(String),
}

impl From<InterfaceError> for CommandRouteError {
    fn from(error: InterfaceError) -> Self {
        Self::Rejected(error)
    }
}

pub struct CommandRouter<S> {
    service: S,
    prefix: String,
}

impl<S> CommandRouter<S>
where
    S: TriviaCommandService,
{
    pub fn new(service: S, prefix: impl Into<String>) -> Self {
        Self { service, prefix: prefix.into() }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Runs one command. Bad arguments and rejected commands become reply
    /// messages; only service failures surface as errors.
    pub async fn route(
        &self,
        payload: &CommandPayload,
    ) -> Result<MessageTemplate, CommandRouteError> {
        let command = match TriviaCommand::parse(&payload.name, &payload.args) {
            Ok(command) => command,
            Err(CommandParseError::InvalidArguments { command, usage }) => {
                return Ok(blocks::usage_message(command, usage, &self.prefix));
            }
            Err(error) => return Err(error.into()),
        };

        let result = match command {
            TriviaCommand::Scrape { scope } => self.service.scrape(scope, payload).await,
            TriviaCommand::MakeTeams { team_count, names } => {
                self.service.make_teams(team_count, names, payload).await
            }
            TriviaCommand::MakeTeamsAuto { team_count } => {
                self.service.make_teams_auto(team_count, payload).await
            }
            TriviaCommand::AddScores { deltas } => self.service.add_scores(deltas, payload).await,
            TriviaCommand::UpdateScores { values } => {
                self.service.update_scores(values, payload).await
            }
            TriviaCommand::ShowScores => self.service.show_scores(payload).await,
            TriviaCommand::ShowTeams => self.service.show_teams(payload).await,
            TriviaCommand::DeletePrevious { count } => {
                self.service.delete_previous(count, payload).await
            }
            TriviaCommand::Help => Ok(blocks::help_message(&self.prefix)),
            TriviaCommand::Unknown { name } => {
                Ok(blocks::unknown_command_message(&name, &self.prefix))
            }
        };

        match result {
            Err(CommandRouteError::Rejected(error)) => Ok(blocks::interface_error_message(&error)),
            other => other,
        }
    }
}

#[async_trait]
pub trait TriviaCommandService: Send + Sync {
    async fn scrape(
        &self,
        scope: ScrapeScope,
        payload: &CommandPayload,
    ) -> Result<MessageTemplate, CommandRouteError>;

    async fn make_teams(
        &self,
        team_count: usize,
        names: Vec<String>,
        payload: &CommandPayload,
    ) -> Result<MessageTemplate, CommandRouteError>;

    async fn make_teams_auto(
        &self,
        team_count: usize,
        payload: &CommandPayload,
    ) -> Result<MessageTemplate, CommandRouteError>;

    async fn add_scores(
        &self,
        deltas: Vec<Decimal>,
        payload: &CommandPayload,
    ) -> Result<MessageTemplate, CommandRouteError>;

    async fn update_scores(
        &self,
        values: Vec<Decimal>,
        payload: &CommandPayload,
    ) -> Result<MessageTemplate, CommandRouteError>;

    async fn show_scores(
        &self,
        payload: &CommandPayload,
    ) -> Result<MessageTemplate, CommandRouteError>;

    async fn show_teams(&self, payload: &CommandPayload)
        -> Result<MessageTemplate, CommandRouteError>;

    async fn delete_previous(
        &self,
        count: u32,
        payload: &CommandPayload,
    ) -> Result<MessageTemplate, CommandRouteError>;
}
