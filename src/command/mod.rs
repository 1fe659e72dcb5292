//! Command execution pipeline
//!
//! Converts command text into tab mutations:
//! text -> CommandResolver -> Resolution -> ActionExecutor -> ExecutionReport

pub mod executor;
pub mod plan;
pub mod resolver;

pub use executor::{ActionExecutor, ExecutionReport, MutationOutcome};
pub use plan::{ActionPlan, TabMutation};
pub use resolver::{resolve, CommandResolver, LocalPattern, RemoteCommand, Resolution};
