//! Planning and executing bumps.
//!
//! - [stack]: the generic one-shot operation queue
//! - [edit]: the file edits a bump is made of
//! - [planner]: the cascading walk that fills the queue

pub mod edit;
pub mod planner;
pub mod stack;

pub use edit::{BumpPlan, FileEdit};
pub use planner::{plan_bump, BumpPlanner};
pub use stack::{Apply, Operation, OperationStack};
