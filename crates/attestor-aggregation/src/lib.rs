pub mod scheduler;
pub mod state;

pub use scheduler::{AggregationScheduler, SchedulerHandle};
pub use state::{AggregationStatus, TaskAggregationState};
