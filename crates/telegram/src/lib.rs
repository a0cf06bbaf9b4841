//! Telegram Integration - long-polling bot interface
//!
//! This crate connects the interaction core to the Telegram Bot API:
//! - **Wire types** (`api`) - the subset of Bot API objects the bot reads and writes
//! - **Client** (`client`) - `BotApi` trait and its reqwest implementation
//! - **Events** (`events`) - `Update` → `InboundEvent` mapping
//! - **Rendering** (`render`) - `OutboundAction` → `sendMessage` payload
//! - **Polling** (`poller`) - `getUpdates` loop with backoff and shutdown
//!
//! # Architecture
//!
//! ```text
//! getUpdates → classify → InteractionHandler → render → sendMessage
//!                 ↓
//!        answerCallbackQuery / sendChatAction
//! ```

pub mod api;
pub mod client;
pub mod events;
pub mod poller;
pub mod render;

pub use client::{BotApi, HttpBotApi, TelegramApiError};
pub use events::{classify, ClassifiedUpdate};
pub use poller::{LongPollRunner, PollError, ReconnectPolicy};
pub use render::{render, RenderError, SAVE_CALLBACK_DATA};
