//! Solved Notifier - a Reddit bot that tells subscribers when a thread is marked solved.
//!
//! Three independent workers share two key-value namespaces:
//!
//! - the thread scanner posts a tracking artifact under each new matching
//!   thread and records it in the Post Index
//! - the request handler subscribes users who message the bot a thread id
//! - the solution detector resolves a thread when its author (or a moderator)
//!   says "solved", and messages every subscriber
//!
//! Platform calls are described as [`effects::PlatformEffect`] values and
//! executed by a [`effects::PlatformInterpreter`]: the OAuth client in
//! [`reddit`] in production, a recording mock in tests.

pub mod commands;
pub mod config;
pub mod effects;
pub mod messages;
pub mod reddit;
pub mod retry;
pub mod server;
pub mod store;
pub mod types;
pub mod worker;

#[cfg(test)]
pub mod test_utils;
