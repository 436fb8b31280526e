//! Background job scheduler and job implementations.

mod overdue_escalation;
mod pool_metrics;
mod scheduler;

pub use overdue_escalation::OverdueEscalationJob;
pub use pool_metrics::PoolMetricsJob;
pub use scheduler::{Job, JobFrequency, JobScheduler};
