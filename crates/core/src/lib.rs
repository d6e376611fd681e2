pub mod config;
pub mod domain;
pub mod errors;
pub mod links;
pub mod scores;
pub mod session;
pub mod teams;

pub use domain::link::{LinkKind, LinkRecord, MirrorRow};
pub use domain::message::ChannelMessage;
pub use domain::scrape::{LiveOutcome, ScrapeScope, ScrapeSummary};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use links::{classify, is_command, LinkMatch};
pub use scores::{ScoreBoard, TeamScore};
pub use session::{SessionState, TriviaSession};
pub use teams::Team;
