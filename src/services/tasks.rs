use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite};

use crate::db::DbPool;
use crate::error::AppError;
use crate::models::{NewTask, OwnerId, Task, TaskChanges, TaskFilter, TaskQuery, TaskSort};

const TASK_COLUMNS: &str = "id, title, description, is_completed, deadline, created_at, updated_at";

fn not_found() -> AppError {
    AppError::NotFound("Todo not found".into())
}

/// Ownership-scoped create/list/update/delete over the `todos` table.
///
/// Every public method takes the caller's `OwnerId` and every statement binds it, so a
/// task belonging to another account behaves exactly like one that does not exist.
/// Concurrent updates to the same task are last-write-wins.
#[derive(Clone)]
pub struct TaskService {
    pool: DbPool,
}

impl TaskService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Lists the caller's tasks. With a default query this is every task in insertion order.
    pub async fn list(&self, owner: OwnerId, query: &TaskQuery) -> Result<Vec<Task>, AppError> {
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {} FROM todos WHERE user_id = ", TASK_COLUMNS));
        builder.push_bind(owner.get());

        match query.status.unwrap_or_default() {
            TaskFilter::All => {}
            TaskFilter::Completed => {
                builder.push(" AND is_completed = 1");
            }
            TaskFilter::Pending => {
                builder.push(" AND is_completed = 0");
            }
            TaskFilter::Overdue => {
                builder.push(" AND is_completed = 0 AND deadline IS NOT NULL AND deadline < ");
                builder.push_bind(Utc::now().date_naive());
            }
        }

        if let Some(deadline) = query.deadline {
            builder.push(" AND deadline = ");
            builder.push_bind(deadline);
        }

        builder.push(match query.sort_by {
            None => " ORDER BY id",
            Some(TaskSort::CreatedAt) => " ORDER BY created_at, id",
            Some(TaskSort::UpdatedAt) => " ORDER BY updated_at, id",
            Some(TaskSort::Deadline) => " ORDER BY deadline IS NULL, deadline, id",
        });

        let mut tasks = builder
            .build_query_as::<Task>()
            .fetch_all(&self.pool)
            .await?;

        // SQLite's lower() only folds ASCII, so the text search runs here.
        let needle = query
            .search
            .as_deref()
            .map(|search| search.trim().to_lowercase())
            .filter(|search| !search.is_empty());
        if let Some(needle) = needle {
            tasks.retain(|task| task.mentions(&needle));
        }

        Ok(tasks)
    }

    pub async fn find(&self, owner: OwnerId, id: i64) -> Result<Task, AppError> {
        let sql = format!(
            "SELECT {} FROM todos WHERE id = ? AND user_id = ?",
            TASK_COLUMNS
        );
        sqlx::query_as::<_, Task>(&sql)
            .bind(id)
            .bind(owner.get())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(not_found)
    }

    pub async fn create(&self, owner: OwnerId, task: NewTask) -> Result<Task, AppError> {
        let now = Utc::now();
        let sql = format!(
            "INSERT INTO todos (user_id, title, description, is_completed, deadline, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?) RETURNING {}",
            TASK_COLUMNS
        );

        let created = sqlx::query_as::<_, Task>(&sql)
            .bind(owner.get())
            .bind(&task.title)
            .bind(&task.description)
            .bind(task.is_completed)
            .bind(task.deadline)
            .bind(now)
            .bind(now)
            .fetch_one(&self.pool)
            .await
            .map_err(|err| {
                log::error!("failed to create todo for account {}: {}", owner.get(), err);
                AppError::InternalServerError("Failed to create todo".into())
            })?;

        log::debug!("account {} created todo {}", owner.get(), created.id);
        Ok(created)
    }

    /// Overwrites only the fields present in `changes`. When nothing would change the
    /// row, including its `updated_at`, is left as it was.
    ///
    /// This is a single `UPDATE`, so there is no read-then-write window: concurrent
    /// writers to other tasks only queue on SQLite's write lock, and writers to the same
    /// task are last-write-wins.
    pub async fn update(
        &self,
        owner: OwnerId,
        id: i64,
        changes: TaskChanges,
    ) -> Result<Task, AppError> {
        let TaskChanges {
            title,
            description,
            is_completed,
            deadline,
        } = changes;
        if title.is_none() && description.is_none() && is_completed.is_none() && deadline.is_none() {
            return self.find(owner, id).await;
        }

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE todos SET ");
        let mut assignments = builder.separated(", ");
        if let Some(title) = &title {
            assignments.push("title = ").push_bind_unseparated(title.clone());
        }
        if let Some(description) = &description {
            assignments
                .push("description = ")
                .push_bind_unseparated(description.clone());
        }
        if let Some(is_completed) = is_completed {
            assignments
                .push("is_completed = ")
                .push_bind_unseparated(is_completed);
        }
        if let Some(deadline) = deadline {
            assignments.push("deadline = ").push_bind_unseparated(deadline);
        }

        // SET expressions all see the old row, so this compares against stored values.
        builder.push(", updated_at = CASE WHEN ");
        let mut differs = builder.separated(" OR ");
        if let Some(title) = title {
            differs.push("title IS NOT ").push_bind_unseparated(title);
        }
        if let Some(description) = description {
            differs
                .push("description IS NOT ")
                .push_bind_unseparated(description);
        }
        if let Some(is_completed) = is_completed {
            differs
                .push("is_completed IS NOT ")
                .push_bind_unseparated(is_completed);
        }
        if let Some(deadline) = deadline {
            differs.push("deadline IS NOT ").push_bind_unseparated(deadline);
        }
        builder
            .push(" THEN ")
            .push_bind(Utc::now())
            .push(" ELSE updated_at END WHERE id = ")
            .push_bind(id)
            .push(" AND user_id = ")
            .push_bind(owner.get())
            .push(" RETURNING ")
            .push(TASK_COLUMNS);

        let updated = builder
            .build_query_as::<Task>()
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(not_found)?;

        log::debug!("account {} updated todo {}", owner.get(), id);
        Ok(updated)
    }

    /// Permanently removes the task.
    pub async fn delete(&self, owner: OwnerId, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM todos WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(owner.get())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(not_found());
        }

        log::debug!("account {} deleted todo {}", owner.get(), id);
        Ok(())
    }
}
