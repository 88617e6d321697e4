//! Application workflow resource types
//!
//! This crate provides the resource types exchanged between the workflow
//! engine and the orchestration platform. It performs no I/O.
//!
//! # API Group
//!
//! The owning `Application` uses the `core.oam.dev/v1beta1` API group.
//! Step objects are free-form and carry whatever apiVersion/kind their
//! rendered template declares.
//!
//! # Resources
//!
//! - `Application` - Owning entity with an ordered workflow and its status
//! - `UnstructuredObject` - A rendered step target submitted to the platform
//! - `Condition` - Status signal reported back on a submitted object
//! - `WorkflowContext` - Per-step execution context carried as an annotation

pub mod application;
pub mod condition;
pub mod context;
pub mod error;
pub mod metadata;
pub mod object;

pub use application::*;
pub use condition::*;
pub use context::*;
pub use error::*;
pub use metadata::*;
pub use object::*;

/// API version of the Application resource
pub const API_VERSION: &str = "core.oam.dev/v1beta1";

/// API group of the Application resource
pub const API_GROUP: &str = "core.oam.dev";

/// Kind of the Application resource
pub const APPLICATION_KIND: &str = "Application";
