//! Provisioning pipeline for a runnable game client.
//!
//! # Stages
//!
//! 1. [`manifest`] - version index lookup, descriptor fetch and persistence
//! 2. [`libraries`] - client binary and library downloads, classpath
//! 3. [`natives`] - platform archives unpacked into the natives root
//! 4. [`assets`] - content-addressed object sync
//! 5. [`loader`] - loader overlay with a bundled fallback profile
//! 6. [`addons`] - best-effort registry add-ons
//!
//! [`Pipeline`] drives them in order and folds their progress into one
//! monotonic value through a [`ProgressSink`].

pub mod addons;
pub mod assets;
mod config;
mod context;
mod error;
mod layout;
pub mod libraries;
pub mod loader;
pub mod manifest;
pub mod natives;
mod pipeline;
pub mod progress;

pub use config::InstallerConfig;
pub use context::Context;
pub use error::{InstallError, Result};
pub use layout::Layout;
pub use pipeline::{InstallReport, Phase, Pipeline, PipelineState, StageOutcome};
pub use progress::{NoProgress, ProgressSink, Reporter, Stage};
