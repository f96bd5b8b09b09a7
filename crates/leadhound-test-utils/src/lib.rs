// SPDX-FileCopyrightText: 2026 Leadhound Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Leadhound.
//!
//! Scripted in-process implementations of every port, so pipeline tests run
//! without Discord, an HTTP classifier, or a database.
//!
//! - [`MockSource`] - channel histories with injectable rate limits and denials
//! - [`MockStageClassifier`] - programmable stage verdicts with call accounting
//! - [`MemoryStore`] - permalink-unique in-memory store
//! - [`RecordingSink`] / [`FailingSink`] - export sinks for isolation tests

pub mod fixtures;
pub mod memory_store;
pub mod mock_classifier;
pub mod mock_sink;
pub mod mock_source;

pub use memory_store::MemoryStore;
pub use mock_classifier::MockStageClassifier;
pub use mock_sink::{FailingSink, RecordingSink};
pub use mock_source::{MockSource, ScriptedFailure};
