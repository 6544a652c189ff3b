//! BotBoundary Engine - Behavioral risk decision engine for login attempts
//!
//! The engine turns behavioral telemetry captured during a login attempt into
//! a bounded Allow/Challenge/Deny decision through a deterministic pipeline:
//! feature encoding -> model routing -> inference -> score normalization ->
//! threshold policy.
//!
//! ## Modules
//!
//! - **encoder**: nested telemetry record -> fixed 28-dimensional vector
//! - **registry**: population/per-user routing with single-flight model caching
//! - **model**: reconstruction-error and boundary-distance inference adapters
//! - **normalizer**: heterogeneous model outputs -> one 0..1 risk scale
//! - **policy**: risk + thresholds -> final decision
//! - **pipeline**: orchestration, fail-open fallback, audit surface
//!
//! Transport, credential handling, persistence, and model training live in
//! external collaborators; trained artifacts are consumed as opaque inputs.

pub mod artifact;
pub mod config;
pub mod encoder;
pub mod error;
pub mod model;
pub mod normalizer;
pub mod pipeline;
pub mod policy;
pub mod registry;
pub mod remote;
pub mod types;

pub use config::{EngineConfig, Thresholds};
pub use encoder::{FeatureEncoder, FEATURE_COUNT, FEATURE_ORDER};
pub use error::EngineError;
pub use pipeline::RiskEngine;
pub use types::{
    Decision, FeatureVector, ModelFamily, ModelKey, NormalizedRisk, RawModelOutput,
    RiskAssessment, ScoreRequest,
};

/// Engine version embedded in audit output
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for audit output
pub const PRODUCER_NAME: &str = "botboundary-engine";
