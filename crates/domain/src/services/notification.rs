//! Notification intents emitted by the complaint lifecycle.
//!
//! Delivery (push, email, SMS) belongs to an external notifier. The engine
//! only hands over a payload and never fails a mutation because a
//! notification could not be sent.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Category, Complaint};

/// Notification type enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    HighUrgencyAlert,
    OverdueAlert,
}

impl std::fmt::Display for NotificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationType::HighUrgencyAlert => write!(f, "high_urgency_alert"),
            NotificationType::OverdueAlert => write!(f, "overdue_alert"),
        }
    }
}

/// Sent when the committee marks a complaint as high urgency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HighUrgencyAlertPayload {
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub complaint_id: Uuid,
    pub title: String,
    pub category: Category,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    pub deadline: DateTime<Utc>,
    pub assigned_by: String,
    pub timestamp: DateTime<Utc>,
}

impl HighUrgencyAlertPayload {
    pub fn new(
        complaint: &Complaint,
        deadline: DateTime<Utc>,
        assigned_by: &str,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            notification_type: NotificationType::HighUrgencyAlert,
            complaint_id: complaint.id,
            title: complaint.title.clone(),
            category: complaint.category,
            department: complaint.department.clone(),
            deadline,
            assigned_by: assigned_by.to_string(),
            timestamp: now,
        }
    }
}

/// Sent to the committee when a deadline passes without a resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverdueAlertPayload {
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub complaint_id: Uuid,
    pub title: String,
    pub category: Category,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    pub deadline: DateTime<Utc>,
    pub extensions: u8,
    pub timestamp: DateTime<Utc>,
}

impl OverdueAlertPayload {
    pub fn new(complaint: &Complaint, deadline: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        Self {
            notification_type: NotificationType::OverdueAlert,
            complaint_id: complaint.id,
            title: complaint.title.clone(),
            category: complaint.category,
            department: complaint.department.clone(),
            deadline,
            extensions: complaint.extensions,
            timestamp: now,
        }
    }
}

/// Generic notification payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NotificationPayload {
    HighUrgencyAlert(HighUrgencyAlertPayload),
    OverdueAlert(OverdueAlertPayload),
}

/// Result of a notification send attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationResult {
    /// Notification was handed to the notifier.
    Sent,
    /// Notification sending failed (but was non-blocking).
    Failed(String),
}

/// Notifier collaborator.
#[async_trait::async_trait]
pub trait NotificationService: Send + Sync {
    async fn send_high_urgency_alert(&self, payload: HighUrgencyAlertPayload)
        -> NotificationResult;

    async fn send_overdue_alert(&self, payload: OverdueAlertPayload) -> NotificationResult;
}

/// Notifier that records intents in the structured log.
///
/// Used when no delivery channel is configured.
#[derive(Debug, Clone, Default)]
pub struct LoggingNotificationService;

#[async_trait::async_trait]
impl NotificationService for LoggingNotificationService {
    async fn send_high_urgency_alert(
        &self,
        payload: HighUrgencyAlertPayload,
    ) -> NotificationResult {
        tracing::info!(
            notification = %payload.notification_type,
            complaint_id = %payload.complaint_id,
            category = %payload.category,
            deadline = %payload.deadline,
            assigned_by = %payload.assigned_by,
            "High-urgency complaint alert"
        );
        NotificationResult::Sent
    }

    async fn send_overdue_alert(&self, payload: OverdueAlertPayload) -> NotificationResult {
        tracing::warn!(
            notification = %payload.notification_type,
            complaint_id = %payload.complaint_id,
            category = %payload.category,
            deadline = %payload.deadline,
            extensions = payload.extensions,
            "Complaint deadline missed"
        );
        NotificationResult::Sent
    }
}

/// Mock notification service for tests.
///
/// Records every payload it receives.
#[derive(Debug, Clone, Default)]
pub struct MockNotificationService {
    /// Whether to simulate failures for testing.
    pub simulate_failure: bool,
    sent: Arc<Mutex<Vec<NotificationPayload>>>,
}

impl MockNotificationService {
    /// Create a new mock notification service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock service that simulates failures.
    pub fn failing() -> Self {
        Self {
            simulate_failure: true,
            ..Self::default()
        }
    }

    /// Payloads received so far, including those that "failed".
    pub fn sent(&self) -> Vec<NotificationPayload> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    fn record(&self, payload: NotificationPayload) -> NotificationResult {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(payload);
        }
        if self.simulate_failure {
            NotificationResult::Failed("Simulated failure".to_string())
        } else {
            NotificationResult::Sent
        }
    }
}

#[async_trait::async_trait]
impl NotificationService for MockNotificationService {
    async fn send_high_urgency_alert(
        &self,
        payload: HighUrgencyAlertPayload,
    ) -> NotificationResult {
        self.record(NotificationPayload::HighUrgencyAlert(payload))
    }

    async fn send_overdue_alert(&self, payload: OverdueAlertPayload) -> NotificationResult {
        self.record(NotificationPayload::OverdueAlert(payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ComplaintStatus, Visibility};
    use std::collections::BTreeSet;

    fn sample_complaint() -> Complaint {
        let now = Utc::now();
        Complaint {
            id: Uuid::nil(),
            title: "Street lights not working near Hostel-C".to_string(),
            description: "Three of five lights are out".to_string(),
            category: Category::Safety,
            department: None,
            location: None,
            visibility: Visibility::Public,
            status: ComplaintStatus::Open,
            urgency: None,
            upvoted_by: BTreeSet::new(),
            confirmed_by: BTreeSet::new(),
            deadline: None,
            extensions: 1,
            admin_response: None,
            image: None,
            proof_image: None,
            flagged: false,
            submitted_by: "stu-005".to_string(),
            created_at: now,
            updated_at: now,
            resolved_at: None,
        }
    }

    #[test]
    fn test_notification_type_display() {
        assert_eq!(
            NotificationType::HighUrgencyAlert.to_string(),
            "high_urgency_alert"
        );
        assert_eq!(NotificationType::OverdueAlert.to_string(), "overdue_alert");
    }

    #[test]
    fn test_high_urgency_payload_serialization() {
        let now = Utc::now();
        let payload = HighUrgencyAlertPayload::new(&sample_complaint(), now, "com-001", now);

        let json = serde_json::to_string(&payload).unwrap();
        assert!(json.contains("\"type\":\"high_urgency_alert\""));
        assert!(json.contains("\"complaintId\""));
        assert!(json.contains("\"assignedBy\":\"com-001\""));
        assert!(!json.contains("department"));
        assert!(!json.contains("stu-005"));
    }

    #[test]
    fn test_overdue_payload_carries_extensions() {
        let now = Utc::now();
        let payload = OverdueAlertPayload::new(&sample_complaint(), now, now);
        assert_eq!(payload.extensions, 1);
        assert_eq!(payload.notification_type, NotificationType::OverdueAlert);
    }

    #[tokio::test]
    async fn test_mock_notification_service_records() {
        let service = MockNotificationService::new();
        let now = Utc::now();

        let result = service
            .send_overdue_alert(OverdueAlertPayload::new(&sample_complaint(), now, now))
            .await;

        assert_eq!(result, NotificationResult::Sent);
        assert_eq!(service.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_mock_notification_service_failure() {
        let service = MockNotificationService::failing();
        let now = Utc::now();

        let result = service
            .send_high_urgency_alert(HighUrgencyAlertPayload::new(
                &sample_complaint(),
                now,
                "com-001",
                now,
            ))
            .await;

        assert!(matches!(result, NotificationResult::Failed(_)));
        assert_eq!(service.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_logging_notification_service_sends() {
        let service = LoggingNotificationService;
        let now = Utc::now();
        let result = service
            .send_overdue_alert(OverdueAlertPayload::new(&sample_complaint(), now, now))
            .await;
        assert_eq!(result, NotificationResult::Sent);
    }
}
