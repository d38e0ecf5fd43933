//! # Contracts
//!
//! Frozen interface contracts, defining inter-module data structures and traits.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Data Model
//! - `ExecutionResult` + `ProducedFile`: what the engine hands back once work is done
//! - `RowSet`: rows from the output step, frozen before dispatch
//! - `OutputSink`: where serialized bytes go

mod collaborator;
mod dispatch_config;
mod error;
mod result;
mod row_set;
mod sink;
mod value;

pub use collaborator::*;
pub use dispatch_config::*;
pub use error::*;
pub use result::*;
pub use row_set::*;
pub use sink::*;
pub use value::*;
