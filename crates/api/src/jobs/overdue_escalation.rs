//! Escalates complaints whose deadline has passed.
//!
//! Each (complaint, deadline) pair is alerted once. Extending a deadline
//! creates a new pair, so a complaint that misses its extended deadline is
//! escalated again.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use domain::services::{ComplaintLifecycleEngine, NotificationResult};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::scheduler::{Job, JobFrequency};
use crate::middleware::metrics::record_overdue_alert_sent;

pub struct OverdueEscalationJob {
    engine: ComplaintLifecycleEngine,
    interval_minutes: u64,
    alerted: Mutex<HashSet<(Uuid, DateTime<Utc>)>>,
}

/// Outcome of one scan.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct EscalationReport {
    pub overdue: usize,
    pub alerted: usize,
    pub failed: usize,
}

impl OverdueEscalationJob {
    pub fn new(engine: ComplaintLifecycleEngine, interval_minutes: u64) -> Self {
        Self {
            engine,
            interval_minutes,
            alerted: Mutex::new(HashSet::new()),
        }
    }

    /// Alerts every overdue complaint not yet alerted for its current
    /// deadline. Failed alerts are retried on the next scan.
    pub async fn scan(&self) -> anyhow::Result<EscalationReport> {
        let overdue = self.engine.overdue_complaints().await?;
        let mut alerted = self.alerted.lock().await;

        let current: HashSet<(Uuid, DateTime<Utc>)> = overdue
            .iter()
            .filter_map(|c| c.deadline.map(|d| (c.id, d)))
            .collect();
        // Forget pairs that are no longer overdue.
        alerted.retain(|key| current.contains(key));

        let mut report = EscalationReport {
            overdue: overdue.len(),
            ..Default::default()
        };

        for complaint in &overdue {
            let Some(deadline) = complaint.deadline else {
                continue;
            };
            if alerted.contains(&(complaint.id, deadline)) {
                debug!(complaint_id = %complaint.id, "Overdue alert already sent");
                continue;
            }

            match self.engine.send_overdue_alert(complaint).await {
                NotificationResult::Sent => {
                    alerted.insert((complaint.id, deadline));
                    record_overdue_alert_sent();
                    report.alerted += 1;
                }
                NotificationResult::Failed(reason) => {
                    warn!(
                        complaint_id = %complaint.id,
                        reason = %reason,
                        "Overdue alert not delivered"
                    );
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }
}

#[async_trait::async_trait]
impl Job for OverdueEscalationJob {
    fn name(&self) -> &'static str {
        "overdue_escalation"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Minutes(self.interval_minutes)
    }

    async fn execute(&self) -> anyhow::Result<()> {
        let report = self.scan().await?;
        info!(
            overdue = report.overdue,
            alerted = report.alerted,
            failed = report.failed,
            "Overdue scan finished"
        );
        Ok(())
    }
}
