//! recall-core: offline free-response answer grading.
//!
//! The engine ([`normalize`], [`distance`], [`scorer`]) is pure and total: any
//! two strings produce one of six grade buckets. Around it sit the collaborator
//! contracts for remote grading and card generation, the grading orchestrator
//! that decides between them, and the deck model, parser and reports used by
//! the CLI.

pub mod config;
pub mod distance;
pub mod error;
pub mod grading;
pub mod mock;
pub mod model;
pub mod normalize;
pub mod parser;
pub mod report;
pub mod scorer;
pub mod statistics;
pub mod traits;

pub use normalize::{normalize, NormalizedAnswer};
pub use scorer::{assess, score, score_percent, Assessment, Grade, Rule};
