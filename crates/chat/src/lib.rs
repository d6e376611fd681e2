//! Chat platform interface for the trivia bot.
//!
//! - **Gateway** (`gateway`) - event loop over a platform transport with reconnection
//! - **Commands** (`commands`) - `??`-prefixed commands and their aliases
//! - **Events** (`events`) - channel messages and commands routed to handlers
//! - **Blocks** (`blocks`) - reply templates rendered as embeds
//! - **Channel** (`channel`) - history and voice roster readers
//!
//! # Architecture
//!
//! ```text
//! Transport → GatewayRunner → EventDispatcher → CommandHandler → TriviaCommandService
//!                                    ↓                 MessageHandler → MessageService
//!                              MessageTemplate → Transport::send
//! ```

pub mod blocks;
pub mod channel;
pub mod commands;
pub mod events;
pub mod gateway;
