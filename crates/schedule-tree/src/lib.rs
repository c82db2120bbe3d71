//! Polyhedral schedule trees.
//!
//! A [`Schedule`] orders the instances of a region's statements with a tree
//! of band, mark, filter, sequence and set nodes. Iteration domains are
//! rectangular with concrete bounds, which keeps every set operation exact.
//!
//! Trees are plain values. Editing goes through a [`ScheduleNode`], an owned
//! cursor that each navigation step and structural edit consumes and returns:
//!
//! ```ignore
//! let node = schedule.into_root().band_tile(&[32, 32]).child(0);
//! let schedule = node.insert_mark("Points").into_schedule();
//! ```

pub mod affine;
pub mod cursor;
pub mod domain;
mod edit;
pub mod node;
mod printer;
pub mod statement;
pub mod timeline;
pub mod walk;

pub use affine::{AffineExpr, QuasiAffine};
pub use cursor::ScheduleNode;
pub use domain::{BoxSet, InstanceSet, Interval};
pub use node::{AstOption, Band, BandMember, Node, NodeKind, Schedule, ValidationError};
pub use statement::{AccessKind, MemoryAccess, Statement, StmtId, Stride};
pub use timeline::{ScheduledInstance, Timestamp};
pub use walk::WalkAction;
