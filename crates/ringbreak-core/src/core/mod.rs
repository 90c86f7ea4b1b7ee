//! # Core Module
//!
//! Stateless building blocks shared by the engine: typed physical quantities, lambda
//! schedules, restraint requests, the registry of supported perturbation families, and
//! handles to prepared molecular systems.

pub mod lambda;
pub mod protocol;
pub mod quantity;
pub mod restraint;
pub mod system;
