//! Core library for the SICRO self-healing replica controller
//!
//! This crate provides the full decision pipeline:
//! - Anomaly classification over standardized resource features
//! - Windowed alert/stability voting to suppress flapping
//! - A pure scale-up/scale-down decision engine
//! - The controller loop that owns replica state and emits scaling events
//! - Metric sources, the audit log, and observability

pub mod audit;
pub mod classifier;
pub mod config;
pub mod controller;
pub mod decision;
pub mod error;
pub mod models;
pub mod observability;
pub mod source;
pub mod stability;

pub use config::{ClassifierConfig, ClassifierKind, ControllerConfig, WindowConfig};
pub use controller::{ControllerLoop, ControllerState, Pipeline, RunReport};
pub use decision::{Decision, DecisionEngine};
pub use error::ControllerError;
pub use models::*;
pub use observability::{ControllerMetrics, StructuredLogger};
pub use stability::StabilityAggregator;
