// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Parley integration tests.
//!
//! Provides a mock transport and a harness that wires a real router to a
//! throwaway SQLite database, so tests run without a bot token.
//!
//! # Components
//!
//! - [`MockChannel`] - Mock transport with event injection, send capture, and failure injection
//! - [`TestHarness`] - Router + storage + mock transport with helpers for customer and admin traffic

pub mod harness;
pub mod mock_channel;

pub use harness::{TestHarness, TestHarnessBuilder};
pub use mock_channel::MockChannel;
