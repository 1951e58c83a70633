//! KappaML API client.
//!
//! Developer-friendly goal: keep the public surface small and predictable.
//! Implementation details are split into submodules under `src/client/`.

pub mod builder;
pub mod core;
pub mod deployment;
mod error_classification;
pub mod signals;

pub use builder::KappaClientBuilder;
pub use core::KappaClient;
pub use deployment::CreateModelRequest;
pub use signals::SessionSignals;
