// SPDX-FileCopyrightText: 2026 Leadhound Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Port traits implemented by adapters.

pub mod adapter;
pub mod classifier;
pub mod sink;
pub mod source;
pub mod storage;

pub use adapter::PluginAdapter;
pub use classifier::StageClassifier;
pub use sink::OpportunitySink;
pub use source::{HistoryPageRequest, MessageSource};
pub use storage::OpportunityStore;
