//! # Ringbreak Core Library
//!
//! Configuration and orchestration for relative binding free-energy simulations of
//! ring-breaking perturbations. The simulation engine itself is external; this library
//! decides what to run and where.
//!
//! - **[`core`]: The Foundation.** Typed quantities, lambda schedules, restraint requests,
//!   the registry of supported perturbation families and prepared-system handles.
//!
//! - **[`engine`]: The Logic Core.** Validation of run requests, assembly of immutable
//!   simulation configurations, working-directory management and the runner seam.
//!
//! - **[`workflows`]: The Public API.** The end-to-end procedure over replicates.

pub mod core;
pub mod engine;
pub mod workflows;
