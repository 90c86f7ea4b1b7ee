//! # Engine Module
//!
//! Turns a validated run request into per-replicate simulation configurations and hands
//! them to a simulation engine.
//!
//! - **Parameters** ([`params`]) - Raw requests, validation, and replicate enumeration
//! - **Configuration** ([`config`]) - Immutable simulation configurations and engine settings
//! - **Working Directories** ([`workdir`]) - Deterministic output paths and their lifecycle
//! - **Runners** ([`runner`]) - The seam to the external simulation engine
//! - **Progress Monitoring** ([`progress`]) - Progress events for user feedback
//! - **Error Handling** ([`error`]) - Engine-level error types

pub mod config;
pub mod error;
pub mod params;
pub mod progress;
pub mod runner;
pub mod workdir;
