//! Planning and orchestration.
//!
//! The planner turns a user request into an ordered, typed task list; the
//! executor runs that list task by task, threading each output into the
//! next task's context and streaming progress events.

pub mod executor;
pub mod plan;
pub mod schemas;
pub mod task;
pub mod task_planner;

pub use executor::PlanExecutor;
pub use plan::Plan;
pub use task::{Task, TaskParameters, TaskResult, TaskType};
pub use task_planner::Planner;
