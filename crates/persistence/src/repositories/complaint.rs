//! PostgreSQL complaint repository.
//!
//! Mutations lock the row with `SELECT ... FOR UPDATE`, apply the guarded
//! transition in memory and write the result back in the same transaction.

use domain::errors::{LifecycleError, StoreError};
use domain::models::Complaint;
use domain::services::{ChangeKind, ComplaintChange, ComplaintQuery, ComplaintStore, Mutation};
use sqlx::PgPool;
use tokio::sync::broadcast;
use tracing::error;
use uuid::Uuid;

use crate::entities::{ComplaintEntity, ComplaintStatusDb, UrgencyDb, VisibilityDb};
use crate::metrics::QueryTimer;

const CHANGE_CHANNEL_CAPACITY: usize = 256;

const COMPLAINT_COLUMNS: &str = r#"
    id, title, description, category, department, location, visibility, status,
    urgency, upvoted_by, upvotes, confirmed_by, confirmations, deadline,
    extensions, admin_response, image, proof_image, flagged, submitted_by,
    created_at, updated_at, resolved_at
"#;

const QUERY_FILTER: &str = r#"
    WHERE ($1::complaint_status IS NULL OR status = $1)
      AND ($2::TEXT IS NULL OR category = $2)
      AND ($3::complaint_urgency IS NULL OR urgency = $3)
      AND ($4::TEXT IS NULL OR submitted_by = $4)
      AND ($5::TEXT IS NULL OR visibility = 'public' OR submitted_by = $5)
      AND ($6::TIMESTAMPTZ IS NULL
           OR (deadline IS NOT NULL AND status <> 'resolved' AND deadline < $6))
"#;

fn db_error(err: sqlx::Error) -> StoreError {
    error!(error = %err, "Complaint query failed");
    StoreError::Backend(err.to_string())
}

/// Repository for complaint persistence.
#[derive(Debug, Clone)]
pub struct ComplaintRepository {
    pool: PgPool,
    changes: broadcast::Sender<ComplaintChange>,
}

impl ComplaintRepository {
    /// Create a new complaint repository.
    pub fn new(pool: PgPool) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self { pool, changes }
    }

    fn publish(&self, id: Uuid, kind: ChangeKind) {
        let _ = self.changes.send(ComplaintChange { id, kind });
    }

    fn bind_filters<'q, O>(
        query: sqlx::query::QueryAs<'q, sqlx::Postgres, O, sqlx::postgres::PgArguments>,
        filter: &'q ComplaintQuery,
    ) -> sqlx::query::QueryAs<'q, sqlx::Postgres, O, sqlx::postgres::PgArguments> {
        query
            .bind(filter.status.map(ComplaintStatusDb::from))
            .bind(filter.category.map(|c| c.as_str()))
            .bind(filter.urgency.map(UrgencyDb::from))
            .bind(filter.submitted_by.as_deref())
            .bind(filter.visible_to.as_deref())
            .bind(filter.overdue_at)
    }
}

#[async_trait::async_trait]
impl ComplaintStore for ComplaintRepository {
    async fn create(&self, complaint: &Complaint) -> Result<Uuid, StoreError> {
        let timer = QueryTimer::new("create_complaint");
        let result = sqlx::query(
            r#"
            INSERT INTO complaints (
                id, title, description, category, department, location, visibility,
                status, urgency, upvoted_by, confirmed_by, deadline, extensions,
                admin_response, image, proof_image, flagged, submitted_by,
                created_at, updated_at, resolved_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
                    $15, $16, $17, $18, $19, $20, $21)
            "#,
        )
        .bind(complaint.id)
        .bind(&complaint.title)
        .bind(&complaint.description)
        .bind(complaint.category.as_str())
        .bind(&complaint.department)
        .bind(&complaint.location)
        .bind(VisibilityDb::from(complaint.visibility))
        .bind(ComplaintStatusDb::from(complaint.status))
        .bind(complaint.urgency.map(UrgencyDb::from))
        .bind(complaint.upvoted_by.iter().cloned().collect::<Vec<_>>())
        .bind(complaint.confirmed_by.iter().cloned().collect::<Vec<_>>())
        .bind(complaint.deadline)
        .bind(i16::from(complaint.extensions))
        .bind(&complaint.admin_response)
        .bind(&complaint.image)
        .bind(&complaint.proof_image)
        .bind(complaint.flagged)
        .bind(&complaint.submitted_by)
        .bind(complaint.created_at)
        .bind(complaint.updated_at)
        .bind(complaint.resolved_at)
        .execute(&self.pool)
        .await;
        timer.record();

        match result {
            Ok(_) => {
                self.publish(complaint.id, ChangeKind::Created);
                Ok(complaint.id)
            }
            Err(sqlx::Error::Database(db_err)) if db_err.code().as_deref() == Some("23505") => {
                Err(StoreError::Duplicate(complaint.id))
            }
            Err(e) => Err(db_error(e)),
        }
    }

    async fn get(&self, id: Uuid) -> Result<Option<Complaint>, StoreError> {
        let timer = QueryTimer::new("get_complaint");
        let sql = format!("SELECT {} FROM complaints WHERE id = $1", COMPLAINT_COLUMNS);
        let entity = sqlx::query_as::<_, ComplaintEntity>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;
        timer.record();

        entity.map(Complaint::try_from).transpose()
    }

    async fn update(&self, id: Uuid, mutation: &Mutation<'_>) -> Result<Complaint, LifecycleError> {
        let timer = QueryTimer::new("update_complaint");
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        let sql = format!(
            "SELECT {} FROM complaints WHERE id = $1 FOR UPDATE",
            COMPLAINT_COLUMNS
        );
        let entity = sqlx::query_as::<_, ComplaintEntity>(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_error)?
            .ok_or(LifecycleError::NotFound(id))?;

        let mut complaint = Complaint::try_from(entity)?;
        // Dropping `tx` on error rolls back and releases the row lock.
        mutation(&mut complaint)?;

        sqlx::query(
            r#"
            UPDATE complaints
            SET status = $2,
                urgency = $3,
                upvoted_by = $4,
                confirmed_by = $5,
                deadline = $6,
                extensions = $7,
                admin_response = $8,
                proof_image = $9,
                flagged = $10,
                updated_at = $11,
                resolved_at = $12
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(ComplaintStatusDb::from(complaint.status))
        .bind(complaint.urgency.map(UrgencyDb::from))
        .bind(complaint.upvoted_by.iter().cloned().collect::<Vec<_>>())
        .bind(complaint.confirmed_by.iter().cloned().collect::<Vec<_>>())
        .bind(complaint.deadline)
        .bind(i16::from(complaint.extensions))
        .bind(&complaint.admin_response)
        .bind(&complaint.proof_image)
        .bind(complaint.flagged)
        .bind(complaint.updated_at)
        .bind(complaint.resolved_at)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;

        tx.commit().await.map_err(db_error)?;
        timer.record();

        self.publish(id, ChangeKind::Updated);
        Ok(complaint)
    }

    async fn list(&self, query: &ComplaintQuery) -> Result<Vec<Complaint>, StoreError> {
        let timer = QueryTimer::new("list_complaints");
        let sql = format!(
            "SELECT {} FROM complaints {} ORDER BY created_at DESC, id DESC LIMIT $7 OFFSET $8",
            COMPLAINT_COLUMNS, QUERY_FILTER
        );
        let limit = query.limit.map(|l| l as i64);
        let offset = query.offset as i64;

        let entities = Self::bind_filters(sqlx::query_as::<_, ComplaintEntity>(&sql), query)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;
        timer.record();

        entities.into_iter().map(Complaint::try_from).collect()
    }

    async fn count(&self, query: &ComplaintQuery) -> Result<u64, StoreError> {
        let timer = QueryTimer::new("count_complaints");
        let sql = format!("SELECT COUNT(*) FROM complaints {}", QUERY_FILTER);
        let (count,): (i64,) = Self::bind_filters(sqlx::query_as(&sql), query)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)?;
        timer.record();

        Ok(count.max(0) as u64)
    }

    fn watch(&self) -> broadcast::Receiver<ComplaintChange> {
        self.changes.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use domain::models::{Category, ComplaintStatus, Urgency, Visibility};
    use std::collections::BTreeSet;

    async fn test_pool() -> PgPool {
        let url = std::env::var("TEST_DATABASE_URL")
            .expect("TEST_DATABASE_URL must be set for database tests");
        let pool = PgPool::connect(&url).await.unwrap();
        sqlx::migrate!("./src/migrations").run(&pool).await.unwrap();
        pool
    }

    fn complaint(submitted_by: &str, visibility: Visibility) -> Complaint {
        let now = Utc::now();
        Complaint {
            id: Uuid::new_v4(),
            title: "Bus 14 skips the hostel stop".to_string(),
            description: "Happens on the 8am run most days".to_string(),
            category: Category::Transport,
            department: None,
            location: None,
            visibility,
            status: ComplaintStatus::PendingReview,
            urgency: None,
            upvoted_by: BTreeSet::new(),
            confirmed_by: BTreeSet::new(),
            deadline: None,
            extensions: 0,
            admin_response: None,
            image: None,
            proof_image: None,
            flagged: false,
            submitted_by: submitted_by.to_string(),
            created_at: now,
            updated_at: now,
            resolved_at: None,
        }
    }

    #[tokio::test]
    #[ignore = "requires TEST_DATABASE_URL"]
    async fn test_create_get_update() {
        let repo = ComplaintRepository::new(test_pool().await);
        let c = complaint("stu-db-1", Visibility::Public);
        repo.create(&c).await.unwrap();

        let fetched = repo.get(c.id).await.unwrap().unwrap();
        assert_eq!(fetched.title, c.title);
        assert_eq!(fetched.category, Category::Transport);

        let updated = repo
            .update(c.id, &|c: &mut Complaint| {
                c.status = ComplaintStatus::Open;
                c.urgency = Some(Urgency::High);
                c.deadline = Some(Utc::now() + Duration::days(7));
                c.upvoted_by.insert("stu-db-2".to_string());
                Ok(())
            })
            .await
            .unwrap();
        assert_eq!(updated.upvotes(), 1);

        let reread = repo.get(c.id).await.unwrap().unwrap();
        assert_eq!(reread.status, ComplaintStatus::Open);
        assert_eq!(reread.urgency, Some(Urgency::High));
        assert!(reread.has_upvoted("stu-db-2"));
    }

    #[tokio::test]
    #[ignore = "requires TEST_DATABASE_URL"]
    async fn test_failed_mutation_rolls_back() {
        let repo = ComplaintRepository::new(test_pool().await);
        let c = complaint("stu-db-3", Visibility::Public);
        repo.create(&c).await.unwrap();

        let result = repo
            .update(c.id, &|c: &mut Complaint| {
                c.flagged = true;
                Err(LifecycleError::Validation("rejected".into()))
            })
            .await;
        assert!(result.is_err());
        assert!(!repo.get(c.id).await.unwrap().unwrap().flagged);
    }

    #[tokio::test]
    #[ignore = "requires TEST_DATABASE_URL"]
    async fn test_list_visibility_filter() {
        let repo = ComplaintRepository::new(test_pool().await);
        let owner = format!("stu-{}", Uuid::new_v4());
        let private = complaint(&owner, Visibility::Private);
        repo.create(&private).await.unwrap();

        let mine = ComplaintQuery {
            submitted_by: Some(owner.clone()),
            visible_to: Some(owner.clone()),
            ..Default::default()
        };
        assert_eq!(repo.count(&mine).await.unwrap(), 1);

        let someone_else = ComplaintQuery {
            submitted_by: Some(owner),
            visible_to: Some("stu-other".to_string()),
            ..Default::default()
        };
        assert!(repo.list(&someone_else).await.unwrap().is_empty());
    }

    #[tokio::test]
    #[ignore = "requires TEST_DATABASE_URL"]
    async fn test_duplicate_create() {
        let repo = ComplaintRepository::new(test_pool().await);
        let c = complaint("stu-db-4", Visibility::Public);
        repo.create(&c).await.unwrap();
        assert!(matches!(
            repo.create(&c).await,
            Err(StoreError::Duplicate(id)) if id == c.id
        ));
    }
}
