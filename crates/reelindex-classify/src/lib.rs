//! Reelindex Classify crate - deterministic hashtag-to-category classification.
//!
//! Provides the pure [`classify`] function mapping raw hashtag text to the
//! fixed six-key metadata record, backed by immutable keyword membership
//! sets built once at process start.

pub mod classifier;
mod keywords;

pub use classifier::classify;
