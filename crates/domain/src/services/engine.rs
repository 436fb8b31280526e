//! Complaint lifecycle engine.
//!
//! Composes the guarded transitions in [`lifecycle`](super::lifecycle) with
//! the storage, notification and clock collaborators. Every operation checks
//! the actor's role before touching the store, reads the clock once, and
//! hands the transition to the store so it is applied under the store's
//! per-complaint lock.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::errors::LifecycleError;
use crate::models::{
    Action, Actor, Complaint, DashboardSummary, NewComplaint, Stage, Urgency, Visibility,
};
use crate::services::clock::Clock;
use crate::services::lifecycle;
use crate::services::notification::{
    HighUrgencyAlertPayload, NotificationResult, NotificationService, OverdueAlertPayload,
};
use crate::services::store::{ComplaintChange, ComplaintQuery, ComplaintStore};

// ============================================================================
// Engine
// ============================================================================

#[derive(Clone)]
pub struct ComplaintLifecycleEngine {
    store: Arc<dyn ComplaintStore>,
    notifier: Arc<dyn NotificationService>,
    clock: Arc<dyn Clock>,
}

fn can_see(actor: &Actor, complaint: &Complaint) -> bool {
    complaint.visibility == Visibility::Public
        || actor.role.sees_private()
        || complaint.is_submitted_by(&actor.id)
}

impl ComplaintLifecycleEngine {
    pub fn new(
        store: Arc<dyn ComplaintStore>,
        notifier: Arc<dyn NotificationService>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            notifier,
            clock,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    fn authorize(&self, actor: &Actor, action: Action) -> Result<(), LifecycleError> {
        if actor.role.can(action) {
            Ok(())
        } else {
            warn!(
                actor_id = %actor.id,
                role = %actor.role,
                action = %action,
                "Actor lacks capability"
            );
            Err(LifecycleError::Unauthorized {
                role: actor.role,
                action,
            })
        }
    }

    /// Restricts a query to what the actor may see.
    fn scoped(&self, actor: &Actor, query: &ComplaintQuery) -> ComplaintQuery {
        let mut query = query.clone();
        if !actor.role.sees_private() {
            query.visible_to = Some(actor.id.clone());
        }
        query
    }

    async fn mutate<F>(
        &self,
        actor: &Actor,
        id: Uuid,
        action: Action,
        apply: F,
    ) -> Result<Complaint, LifecycleError>
    where
        F: Fn(&mut Complaint, DateTime<Utc>) -> Result<(), LifecycleError> + Send + Sync,
    {
        self.authorize(actor, action)?;
        let now = self.clock.now();

        let mutation = |complaint: &mut Complaint| {
            if !can_see(actor, complaint) {
                return Err(LifecycleError::NotFound(complaint.id));
            }
            apply(complaint, now)
        };

        match self.store.update(id, &mutation).await {
            Ok(complaint) => {
                info!(
                    complaint_id = %id,
                    actor_id = %actor.id,
                    action = %action,
                    status = %complaint.status,
                    "Complaint updated"
                );
                Ok(complaint)
            }
            Err(e) => {
                debug!(
                    complaint_id = %id,
                    actor_id = %actor.id,
                    action = %action,
                    error = %e,
                    "Complaint update rejected"
                );
                Err(e)
            }
        }
    }

    // ========================================================================
    // Student operations
    // ========================================================================

    pub async fn submit_complaint(
        &self,
        actor: &Actor,
        draft: NewComplaint,
    ) -> Result<Complaint, LifecycleError> {
        self.authorize(actor, Action::Submit)?;
        let complaint = lifecycle::new_complaint(draft, &actor.id, Uuid::new_v4(), self.clock.now())?;
        self.store.create(&complaint).await?;

        info!(
            complaint_id = %complaint.id,
            actor_id = %actor.id,
            category = %complaint.category,
            visibility = %complaint.visibility,
            "Complaint submitted"
        );
        Ok(complaint)
    }

    pub async fn toggle_upvote(
        &self,
        actor: &Actor,
        id: Uuid,
    ) -> Result<Complaint, LifecycleError> {
        self.mutate(actor, id, Action::Upvote, |c, now| {
            lifecycle::toggle_upvote(c, &actor.id, now).map(|_| ())
        })
        .await
    }

    /// Repeated confirmations from the same actor leave the complaint as is.
    pub async fn confirm_resolution(
        &self,
        actor: &Actor,
        id: Uuid,
    ) -> Result<Complaint, LifecycleError> {
        self.mutate(actor, id, Action::Confirm, |c, now| {
            lifecycle::confirm_resolution(c, &actor.id, now).map(|_| ())
        })
        .await
    }

    pub async fn flag_complaint(
        &self,
        actor: &Actor,
        id: Uuid,
    ) -> Result<Complaint, LifecycleError> {
        self.mutate(actor, id, Action::Flag, lifecycle::flag).await
    }

    // ========================================================================
    // Committee operations
    // ========================================================================

    /// Assigns urgency and, for `high`, emits a high-urgency alert. A failed
    /// alert does not undo the assignment.
    pub async fn assign_urgency(
        &self,
        actor: &Actor,
        id: Uuid,
        urgency: Urgency,
    ) -> Result<Complaint, LifecycleError> {
        let complaint = self
            .mutate(actor, id, Action::AssignUrgency, |c, now| {
                lifecycle::assign_urgency(c, urgency, now)
            })
            .await?;

        if let (Urgency::High, Some(deadline)) = (urgency, complaint.deadline) {
            let payload =
                HighUrgencyAlertPayload::new(&complaint, deadline, &actor.id, complaint.updated_at);
            if let NotificationResult::Failed(reason) =
                self.notifier.send_high_urgency_alert(payload).await
            {
                warn!(complaint_id = %id, reason = %reason, "High-urgency alert not delivered");
            }
        }

        Ok(complaint)
    }

    pub async fn reject_complaint(
        &self,
        actor: &Actor,
        id: Uuid,
        reason: &str,
    ) -> Result<Complaint, LifecycleError> {
        self.mutate(actor, id, Action::Reject, |c, now| {
            lifecycle::reject(c, reason, now)
        })
        .await
    }

    // ========================================================================
    // Admin operations
    // ========================================================================

    pub async fn respond_to_complaint(
        &self,
        actor: &Actor,
        id: Uuid,
        message: Option<String>,
    ) -> Result<Complaint, LifecycleError> {
        self.mutate(actor, id, Action::Respond, |c, now| {
            lifecycle::respond(c, message.clone(), now)
        })
        .await
    }

    pub async fn resolve_complaint(
        &self,
        actor: &Actor,
        id: Uuid,
        summary: Option<String>,
        proof: Option<String>,
    ) -> Result<Complaint, LifecycleError> {
        self.mutate(actor, id, Action::Resolve, |c, now| {
            lifecycle::resolve(c, summary.clone(), proof.clone(), now)
        })
        .await
    }

    pub async fn extend_deadline(
        &self,
        actor: &Actor,
        id: Uuid,
    ) -> Result<Complaint, LifecycleError> {
        self.mutate(actor, id, Action::ExtendDeadline, lifecycle::extend_deadline)
            .await
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Private complaints of other students read as missing.
    pub async fn get_complaint(&self, actor: &Actor, id: Uuid) -> Result<Complaint, LifecycleError> {
        match self.store.get(id).await? {
            Some(complaint) if can_see(actor, &complaint) => Ok(complaint),
            _ => Err(LifecycleError::NotFound(id)),
        }
    }

    pub async fn list_complaints(
        &self,
        actor: &Actor,
        query: &ComplaintQuery,
    ) -> Result<Vec<Complaint>, LifecycleError> {
        Ok(self.store.list(&self.scoped(actor, query)).await?)
    }

    pub async fn count_complaints(
        &self,
        actor: &Actor,
        query: &ComplaintQuery,
    ) -> Result<u64, LifecycleError> {
        Ok(self.store.count(&self.scoped(actor, query)).await?)
    }

    pub async fn dashboard_summary(&self, actor: &Actor) -> Result<DashboardSummary, LifecycleError> {
        let now = self.clock.now();
        let complaints = self
            .store
            .list(&self.scoped(actor, &ComplaintQuery::all()))
            .await?;
        Ok(DashboardSummary::from_complaints(&complaints, &actor.id, now))
    }

    pub fn is_overdue(&self, complaint: &Complaint) -> bool {
        lifecycle::is_overdue(complaint, self.clock.now())
    }

    /// Whole days left before the deadline, from the engine clock.
    pub fn days_remaining(&self, complaint: &Complaint) -> Option<i64> {
        lifecycle::days_remaining(complaint, self.clock.now())
    }

    pub fn stage(&self, complaint: &Complaint) -> Stage {
        lifecycle::compute_active_stage(complaint)
    }

    // ========================================================================
    // Escalation
    // ========================================================================

    /// Overdue complaints that still need attention. Rejected complaints are
    /// closed and never escalated.
    pub async fn overdue_complaints(&self) -> Result<Vec<Complaint>, LifecycleError> {
        let now = self.clock.now();
        let query = ComplaintQuery {
            overdue_at: Some(now),
            ..Default::default()
        };
        let mut complaints = self.store.list(&query).await?;
        complaints.retain(|c| lifecycle::needs_escalation(c, now));
        Ok(complaints)
    }

    pub async fn send_overdue_alert(&self, complaint: &Complaint) -> NotificationResult {
        let Some(deadline) = complaint.deadline else {
            return NotificationResult::Failed("complaint has no deadline".to_string());
        };
        let payload = OverdueAlertPayload::new(complaint, deadline, self.clock.now());
        self.notifier.send_overdue_alert(payload).await
    }

    // ========================================================================
    // Subscriptions
    // ========================================================================

    /// Live view of a query. The feed yields the full ordered result first
    /// and again after every committed change.
    pub fn subscribe(&self, actor: &Actor, query: &ComplaintQuery) -> ComplaintFeed {
        ComplaintFeed {
            store: self.store.clone(),
            query: self.scoped(actor, query),
            changes: self.store.watch(),
            primed: false,
        }
    }
}

/// Stream of query snapshots returned by [`ComplaintLifecycleEngine::subscribe`].
pub struct ComplaintFeed {
    store: Arc<dyn ComplaintStore>,
    query: ComplaintQuery,
    changes: broadcast::Receiver<ComplaintChange>,
    primed: bool,
}

impl ComplaintFeed {
    /// Waits for the next snapshot. `None` once the store shuts down.
    pub async fn next(&mut self) -> Option<Result<Vec<Complaint>, LifecycleError>> {
        if !self.primed {
            self.primed = true;
            return Some(self.snapshot().await);
        }

        match self.changes.recv().await {
            Ok(_) => Some(self.snapshot().await),
            Err(RecvError::Lagged(skipped)) => {
                debug!(skipped, "Complaint feed lagged, refreshing");
                Some(self.snapshot().await)
            }
            Err(RecvError::Closed) => None,
        }
    }

    async fn snapshot(&self) -> Result<Vec<Complaint>, LifecycleError> {
        Ok(self.store.list(&self.query).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, ComplaintStatus, CONFIRMATION_QUORUM};
    use crate::services::clock::FixedClock;
    use crate::services::memory::InMemoryComplaintStore;
    use crate::services::notification::{MockNotificationService, NotificationPayload};
    use chrono::Duration;

    struct Harness {
        engine: ComplaintLifecycleEngine,
        clock: Arc<FixedClock>,
        notifier: MockNotificationService,
    }

    fn start() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-01-12T08:30:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn harness() -> Harness {
        harness_with(MockNotificationService::new())
    }

    fn harness_with(notifier: MockNotificationService) -> Harness {
        let clock = Arc::new(FixedClock::new(start()));
        let engine = ComplaintLifecycleEngine::new(
            Arc::new(InMemoryComplaintStore::new()),
            Arc::new(notifier.clone()),
            clock.clone(),
        );
        Harness {
            engine,
            clock,
            notifier,
        }
    }

    fn draft(visibility: Visibility) -> NewComplaint {
        NewComplaint {
            title: "Broken bench outside Block-B".to_string(),
            description: "The seat plank has snapped".to_string(),
            category: Some(Category::Infrastructure),
            department: Some("Civil Engineering".to_string()),
            location: Some("Block-B courtyard".to_string()),
            visibility,
            image: None,
        }
    }

    async fn submitted(h: &Harness, visibility: Visibility) -> Complaint {
        h.engine
            .submit_complaint(&Actor::student("stu-001"), draft(visibility))
            .await
            .unwrap()
    }

    async fn resolved(h: &Harness) -> Complaint {
        let c = submitted(h, Visibility::Public).await;
        h.engine
            .assign_urgency(&Actor::committee("com-001"), c.id, Urgency::Medium)
            .await
            .unwrap();
        h.engine
            .respond_to_complaint(&Actor::admin("adm-001"), c.id, Some("Carpenter booked".into()))
            .await
            .unwrap();
        h.engine
            .resolve_complaint(&Actor::admin("adm-001"), c.id, Some("Plank replaced".into()), None)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_submit_complaint() {
        let h = harness();
        let c = submitted(&h, Visibility::Public).await;
        assert_eq!(c.status, ComplaintStatus::PendingReview);
        assert_eq!(c.created_at, start());
        assert_eq!(c.submitted_by, "stu-001");

        let fetched = h
            .engine
            .get_complaint(&Actor::student("stu-002"), c.id)
            .await
            .unwrap();
        assert_eq!(fetched, c);
    }

    #[tokio::test]
    async fn test_submit_requires_department() {
        let h = harness();
        let mut d = draft(Visibility::Public);
        d.department = None;
        let err = h
            .engine
            .submit_complaint(&Actor::student("stu-001"), d)
            .await
            .unwrap_err();
        assert!(matches!(err, LifecycleError::Validation(_)));
        assert_eq!(
            h.engine
                .count_complaints(&Actor::admin("adm-001"), &ComplaintQuery::all())
                .await
                .unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_roles_are_enforced() {
        let h = harness();
        let c = submitted(&h, Visibility::Public).await;

        let err = h
            .engine
            .submit_complaint(&Actor::admin("adm-001"), draft(Visibility::Public))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LifecycleError::Unauthorized {
                role: crate::models::Role::Admin,
                action: Action::Submit
            }
        ));

        let err = h
            .engine
            .assign_urgency(&Actor::student("stu-001"), c.id, Urgency::High)
            .await
            .unwrap_err();
        assert!(matches!(err, LifecycleError::Unauthorized { .. }));

        let err = h
            .engine
            .resolve_complaint(&Actor::committee("com-001"), c.id, None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, LifecycleError::Unauthorized { .. }));

        let err = h
            .engine
            .toggle_upvote(&Actor::admin("adm-001"), c.id)
            .await
            .unwrap_err();
        assert!(matches!(err, LifecycleError::Unauthorized { .. }));
    }

    #[tokio::test]
    async fn test_unknown_complaint_is_not_found() {
        let h = harness();
        let id = Uuid::new_v4();
        let err = h
            .engine
            .assign_urgency(&Actor::committee("com-001"), id, Urgency::Low)
            .await
            .unwrap_err();
        assert!(matches!(err, LifecycleError::NotFound(missing) if missing == id));
    }

    #[tokio::test]
    async fn test_high_urgency_sets_deadline_and_alerts() {
        let h = harness();
        let c = submitted(&h, Visibility::Public).await;

        let c = h
            .engine
            .assign_urgency(&Actor::committee("com-001"), c.id, Urgency::High)
            .await
            .unwrap();

        assert_eq!(c.status, ComplaintStatus::Open);
        assert_eq!(c.urgency, Some(Urgency::High));
        assert_eq!(c.deadline, Some(start() + Duration::days(7)));

        let sent = h.notifier.sent();
        assert_eq!(sent.len(), 1);
        match &sent[0] {
            NotificationPayload::HighUrgencyAlert(p) => {
                assert_eq!(p.complaint_id, c.id);
                assert_eq!(p.assigned_by, "com-001");
            }
            other => panic!("unexpected payload {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_notification_failure_does_not_fail_assignment() {
        let h = harness_with(MockNotificationService::failing());
        let c = submitted(&h, Visibility::Public).await;

        let c = h
            .engine
            .assign_urgency(&Actor::committee("com-001"), c.id, Urgency::High)
            .await
            .unwrap();
        assert_eq!(c.urgency, Some(Urgency::High));
    }

    #[tokio::test]
    async fn test_extend_deadline_limit() {
        let h = harness();
        let admin = Actor::admin("adm-001");
        let c = submitted(&h, Visibility::Public).await;
        h.engine
            .assign_urgency(&Actor::committee("com-001"), c.id, Urgency::High)
            .await
            .unwrap();

        h.clock.advance(Duration::days(6));
        let c = h.engine.extend_deadline(&admin, c.id).await.unwrap();
        assert_eq!(c.deadline, Some(h.clock.now() + Duration::days(7)));
        assert_eq!(c.extensions, 1);

        h.clock.advance(Duration::days(1));
        let c = h.engine.extend_deadline(&admin, c.id).await.unwrap();
        assert_eq!(c.extensions, 2);

        h.clock.advance(Duration::days(1));
        let err = h.engine.extend_deadline(&admin, c.id).await.unwrap_err();
        assert!(matches!(err, LifecycleError::ExtensionLimitExceeded(2)));

        let unchanged = h.engine.get_complaint(&admin, c.id).await.unwrap();
        assert_eq!(unchanged.deadline, c.deadline);
        assert_eq!(unchanged.extensions, 2);
    }

    #[tokio::test]
    async fn test_rejected_blocks_everything() {
        let h = harness();
        let c = submitted(&h, Visibility::Public).await;
        let committee = Actor::committee("com-001");
        let admin = Actor::admin("adm-001");
        let student = Actor::student("stu-002");

        h.engine
            .reject_complaint(&committee, c.id, "Not a campus issue")
            .await
            .unwrap();

        let results = vec![
            h.engine.assign_urgency(&committee, c.id, Urgency::Low).await,
            h.engine.reject_complaint(&committee, c.id, "again").await,
            h.engine.respond_to_complaint(&admin, c.id, None).await,
            h.engine.resolve_complaint(&admin, c.id, None, None).await,
            h.engine.extend_deadline(&admin, c.id).await,
            h.engine.toggle_upvote(&student, c.id).await,
            h.engine.confirm_resolution(&student, c.id).await,
            h.engine.flag_complaint(&student, c.id).await,
        ];
        for result in results {
            assert!(matches!(
                result,
                Err(LifecycleError::InvalidTransition { .. })
            ));
        }
    }

    #[tokio::test]
    async fn test_upvote_toggle_sequence() {
        let h = harness();
        let c = submitted(&h, Visibility::Public).await;
        let a = Actor::student("stu-a");
        let b = Actor::student("stu-b");

        h.engine.toggle_upvote(&a, c.id).await.unwrap();
        h.engine.toggle_upvote(&b, c.id).await.unwrap();
        let c = h.engine.toggle_upvote(&a, c.id).await.unwrap();

        assert_eq!(c.upvotes(), 1);
        assert_eq!(c.upvoted_by.iter().collect::<Vec<_>>(), vec!["stu-b"]);
    }

    #[tokio::test]
    async fn test_concurrent_upvotes() {
        let h = harness();
        let id = submitted(&h, Visibility::Public).await.id;
        let engine = h.engine.clone();

        let mut handles = Vec::new();
        for i in 0..40 {
            let engine = engine.clone();
            handles.push(tokio::spawn(async move {
                engine
                    .toggle_upvote(&Actor::student(format!("stu-{i}")), id)
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let c = engine
            .get_complaint(&Actor::admin("adm-001"), id)
            .await
            .unwrap();
        assert_eq!(c.upvotes(), 40);
    }

    #[tokio::test]
    async fn test_private_complaint_privacy() {
        let h = harness();
        let c = submitted(&h, Visibility::Private).await;
        let owner = Actor::student("stu-001");
        let other = Actor::student("stu-002");

        assert!(h.engine.get_complaint(&owner, c.id).await.is_ok());
        assert!(h
            .engine
            .get_complaint(&Actor::committee("com-001"), c.id)
            .await
            .is_ok());
        assert!(matches!(
            h.engine.get_complaint(&other, c.id).await,
            Err(LifecycleError::NotFound(_))
        ));

        assert!(matches!(
            h.engine.toggle_upvote(&owner, c.id).await,
            Err(LifecycleError::PrivateComplaint)
        ));
        assert!(matches!(
            h.engine.toggle_upvote(&other, c.id).await,
            Err(LifecycleError::NotFound(_))
        ));

        let visible = h
            .engine
            .list_complaints(&other, &ComplaintQuery::all())
            .await
            .unwrap();
        assert!(visible.is_empty());
        let own = h
            .engine
            .list_complaints(&owner, &ComplaintQuery::all())
            .await
            .unwrap();
        assert_eq!(own.len(), 1);
    }

    #[tokio::test]
    async fn test_confirmation_quorum() {
        let h = harness();
        let c = resolved(&h).await;

        for i in 0..CONFIRMATION_QUORUM {
            h.engine
                .confirm_resolution(&Actor::student(format!("stu-{i}")), c.id)
                .await
                .unwrap();
        }
        let c = h
            .engine
            .confirm_resolution(&Actor::student("stu-0"), c.id)
            .await
            .unwrap();

        assert_eq!(c.confirmations(), CONFIRMATION_QUORUM);
        assert_eq!(h.engine.stage(&c), Stage::Confirmed);
        assert_eq!(c.status, ComplaintStatus::Resolved);

        let err = h
            .engine
            .flag_complaint(&Actor::student("stu-99"), c.id)
            .await
            .unwrap_err();
        assert!(matches!(err, LifecycleError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn test_flag_reopen_and_reresolve() {
        let h = harness();
        let admin = Actor::admin("adm-001");
        let c = resolved(&h).await;
        assert_eq!(c.resolved_at, Some(start()));

        h.engine
            .confirm_resolution(&Actor::student("stu-7"), c.id)
            .await
            .unwrap();
        let c = h
            .engine
            .flag_complaint(&Actor::student("stu-8"), c.id)
            .await
            .unwrap();
        assert!(c.flagged);
        assert_eq!(c.status, ComplaintStatus::Open);
        assert_eq!(c.urgency, Some(Urgency::Medium));

        h.clock.advance(Duration::days(2));
        h.engine.respond_to_complaint(&admin, c.id, None).await.unwrap();
        let c = h
            .engine
            .resolve_complaint(&admin, c.id, None, Some("c0ffee-proof.png".into()))
            .await
            .unwrap();
        assert_eq!(c.status, ComplaintStatus::Resolved);
        assert_eq!(c.confirmations(), 0);
        assert_eq!(c.resolved_at, Some(h.clock.now()));
        assert_eq!(c.admin_response.as_deref(), Some("Plank replaced"));
    }

    #[tokio::test]
    async fn test_overdue_complaints_and_alert() {
        let h = harness();
        let c = submitted(&h, Visibility::Public).await;
        h.engine
            .assign_urgency(&Actor::committee("com-001"), c.id, Urgency::High)
            .await
            .unwrap();

        assert!(h.engine.overdue_complaints().await.unwrap().is_empty());

        h.clock.advance(Duration::days(8));
        let overdue = h.engine.overdue_complaints().await.unwrap();
        assert_eq!(overdue.len(), 1);
        assert!(h.engine.is_overdue(&overdue[0]));

        let result = h.engine.send_overdue_alert(&overdue[0]).await;
        assert_eq!(result, NotificationResult::Sent);
        assert!(matches!(
            h.notifier.sent().last(),
            Some(NotificationPayload::OverdueAlert(p)) if p.complaint_id == c.id
        ));
    }

    #[tokio::test]
    async fn test_dashboard_summary_respects_visibility() {
        let h = harness();
        submitted(&h, Visibility::Public).await;
        submitted(&h, Visibility::Private).await;

        let admin = h
            .engine
            .dashboard_summary(&Actor::admin("adm-001"))
            .await
            .unwrap();
        assert_eq!(admin.total, 2);
        assert_eq!(admin.by_status.pending_review, 2);
        assert_eq!(admin.by_category.get(&Category::Infrastructure), Some(&2));

        let other = h
            .engine
            .dashboard_summary(&Actor::student("stu-002"))
            .await
            .unwrap();
        assert_eq!(other.total, 1);
    }

    #[tokio::test]
    async fn test_subscribe_yields_snapshots() {
        let h = harness();
        let viewer = Actor::student("stu-002");
        let mut feed = h.engine.subscribe(&viewer, &ComplaintQuery::all());

        let first = feed.next().await.unwrap().unwrap();
        assert!(first.is_empty());

        let c = submitted(&h, Visibility::Public).await;
        let second = feed.next().await.unwrap().unwrap();
        assert_eq!(second.len(), 1);

        h.engine.toggle_upvote(&viewer, c.id).await.unwrap();
        let third = feed.next().await.unwrap().unwrap();
        assert_eq!(third[0].upvotes(), 1);
    }
}
