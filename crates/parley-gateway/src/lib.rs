// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP admin API for Parley.
//!
//! Exposes the desk's listings, statistics, and admin actions as JSON.
//! Replies posted here take the same append-and-deliver path as replies
//! typed into the chat transport.

pub mod auth;
pub mod handlers;
pub mod server;

pub use auth::{ADMIN_HEADER, AdminId, AuthConfig};
pub use server::{GatewayState, app, start_server};
