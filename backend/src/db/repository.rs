use std::future::Future;
use std::time::Duration;

use chrono::{SubsecRound, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::AppError;
use crate::models::{FieldChange, FilterType, NewTaskRequest, Task, TaskId, TaskStats, UpdateTaskRequest};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

const SELECT_TASK: &str = "SELECT id, text, completed, created_at FROM tasks";
const SELECT_TASK_BY_ID: &str =
    "SELECT id, text, completed, created_at FROM tasks WHERE id = ?1";

/// Persistence adapter for the `tasks` collection.
///
/// Cheap to clone; every clone shares the same pool. Each public operation
/// is bounded by `timeout` and reports expiry as [`AppError::Timeout`].
#[derive(Clone)]
pub struct TaskRepository {
    db: SqlitePool,
    timeout: Duration,
}

impl TaskRepository {
    pub fn new(db: SqlitePool) -> Self {
        Self::with_timeout(db, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(db: SqlitePool, timeout: Duration) -> Self {
        Self { db, timeout }
    }

    pub async fn create(&self, req: NewTaskRequest) -> Result<Task, AppError> {
        let task = Task {
            id: TaskId::generate(),
            text: req.text,
            completed: false,
            created_at: Utc::now().trunc_subsecs(3),
        };

        self.bounded(
            sqlx::query("INSERT INTO tasks (id, text, completed, created_at) VALUES (?1, ?2, ?3, ?4)")
                .bind(task.id)
                .bind(&task.text)
                .bind(task.completed)
                .bind(task.created_at)
                .execute(&self.db),
        )
        .await?;

        Ok(task)
    }

    pub async fn list(&self, filter: FilterType) -> Result<Vec<Task>, AppError> {
        let mut query = QueryBuilder::<Sqlite>::new(SELECT_TASK);
        if let Some(completed) = filter.completed() {
            query.push(" WHERE completed = ").push_bind(completed);
        }

        self.bounded(query.build_query_as::<Task>().fetch_all(&self.db))
            .await
    }

    pub async fn find(&self, id: &str) -> Result<Task, AppError> {
        let id: TaskId = id.parse()?;
        self.find_by_id(id).await
    }

    async fn find_by_id(&self, id: TaskId) -> Result<Task, AppError> {
        self.bounded(
            sqlx::query_as::<_, Task>(SELECT_TASK_BY_ID)
                .bind(id)
                .fetch_optional(&self.db),
        )
        .await?
        .ok_or(AppError::NotFound)
    }

    /// Applies only the fields present in `req` and returns the stored task.
    pub async fn update(&self, id: &str, req: UpdateTaskRequest) -> Result<Task, AppError> {
        let id: TaskId = id.parse()?;
        let changes = req.into_changes();
        if changes.is_empty() {
            return self.find_by_id(id).await;
        }

        let mut query = QueryBuilder::<Sqlite>::new("UPDATE tasks SET ");
        let mut assignments = query.separated(", ");
        for change in changes {
            match change {
                FieldChange::Text(text) => {
                    assignments.push("text = ").push_bind_unseparated(text);
                }
                FieldChange::Completed(completed) => {
                    assignments.push("completed = ").push_bind_unseparated(completed);
                }
            }
        }
        query.push(" WHERE id = ").push_bind(id);

        let result = self.bounded(query.build().execute(&self.db)).await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }

        self.find_by_id(id).await
    }

    /// Flips `completed` in a single statement.
    pub async fn toggle(&self, id: &str) -> Result<Task, AppError> {
        let id: TaskId = id.parse()?;

        let result = self
            .bounded(
                sqlx::query("UPDATE tasks SET completed = NOT completed WHERE id = ?1")
                    .bind(id)
                    .execute(&self.db),
            )
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }

        self.find_by_id(id).await
    }

    /// Removes one task. Unknown and malformed ids are a no-op, reported as
    /// zero rows.
    pub async fn delete(&self, id: &str) -> Result<u64, AppError> {
        let Ok(id) = id.parse::<TaskId>() else {
            debug!("delete of malformed id {:?} ignored", id);
            return Ok(0);
        };

        let result = self
            .bounded(
                sqlx::query("DELETE FROM tasks WHERE id = ?1")
                    .bind(id)
                    .execute(&self.db),
            )
            .await?;

        Ok(result.rows_affected())
    }

    pub async fn delete_all(&self) -> Result<u64, AppError> {
        let result = self
            .bounded(sqlx::query("DELETE FROM tasks").execute(&self.db))
            .await?;

        Ok(result.rows_affected())
    }

    pub async fn stats(&self) -> Result<TaskStats, AppError> {
        let (total, completed) = self
            .bounded(async {
                let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tasks")
                    .fetch_one(&self.db)
                    .await?;
                let completed: i64 =
                    sqlx::query_scalar("SELECT COUNT(*) FROM tasks WHERE completed = ?1")
                        .bind(true)
                        .fetch_one(&self.db)
                        .await?;
                Ok::<_, sqlx::Error>((total, completed))
            })
            .await?;

        Ok(TaskStats::from_counts(total, completed))
    }

    pub async fn ping(&self) -> Result<(), AppError> {
        self.bounded(sqlx::query("select 1").execute(&self.db))
            .await?;
        Ok(())
    }

    async fn bounded<T, F>(&self, operation: F) -> Result<T, AppError>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        tokio::time::timeout(self.timeout, operation)
            .await
            .map_err(|_| AppError::Timeout(self.timeout))?
            .map_err(AppError::from)
    }
}
