//! Application Workflow Engine
//!
//! This crate sequences an Application's workflow: it submits one object
//! per step, in order, and decides from the status the platform reports on
//! each object whether to advance, wait for another pass, or stop.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │              WorkflowEngine                         │
//! │  ┌─────────────────────────────────────────────┐    │
//! │  │   WorkflowContext annotation + owner ref    │    │
//! │  └─────────────────────────────────────────────┘    │
//! │                      │                              │
//! │                      ▼                              │
//! │  ┌─────────────────────────────────────────────┐    │
//! │  │           Applicator                        │    │
//! │  │   Kubernetes (server-side apply) | Memory   │    │
//! │  └─────────────────────────────────────────────┘    │
//! │                      │                              │
//! │                      ▼                              │
//! │  ┌─────────────────────────────────────────────┐    │
//! │  │        StepStatusEvaluator                  │    │
//! │  │   workflow-progress condition -> phase      │    │
//! │  └─────────────────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use appflow_workflow::{KubeApplicator, WorkflowEngine};
//! use std::sync::Arc;
//!
//! let applicator = Arc::new(KubeApplicator::try_default().await?);
//! let engine = WorkflowEngine::new(applicator);
//!
//! let finished = engine.execute_steps(&mut app, "shop-v3", &objects).await?;
//! ```

pub mod applicator;
pub mod cluster;
pub mod error;
pub mod evaluator;
pub mod executor;
pub mod reader;

pub use applicator::*;
pub use cluster::*;
pub use error::*;
pub use evaluator::*;
pub use executor::*;
pub use reader::*;
