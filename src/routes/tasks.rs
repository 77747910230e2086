use crate::{
    auth::{AuthMiddleware, AuthenticatedAccount},
    error::AppError,
    models::{NewTask, TaskChanges, TaskQuery},
    models::task::{CreateTaskRequest, UpdateTaskRequest},
    services::TaskService,
};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use serde_json::json;

/// Lists the caller's tasks.
///
/// With no query parameters this is every task of the caller in insertion order.
///
/// ## Query Parameters:
/// - `status` (optional): `all`, `completed`, `pending` or `overdue`.
/// - `search` (optional): case-insensitive substring of the title or description.
/// - `deadline` (optional): only tasks due on this `YYYY-MM-DD` date.
/// - `sort_by` (optional): `created_at`, `updated_at` or `deadline`, ascending.
///
/// ## Responses:
/// - `200 OK`: a JSON array of tasks, possibly empty.
/// - `401 Unauthorized`: missing or revoked token.
#[get("", wrap = "AuthMiddleware")]
pub async fn list_tasks(
    tasks: web::Data<TaskService>,
    caller: AuthenticatedAccount,
    query: web::Query<TaskQuery>,
) -> Result<impl Responder, AppError> {
    let tasks = tasks.list(caller.owner(), &query).await?;
    Ok(HttpResponse::Ok().json(tasks))
}

/// Creates a task owned by the caller.
///
/// ## Responses:
/// - `201 Created`: the stored task.
/// - `401 Unauthorized`: missing or revoked token.
/// - `422 Unprocessable Entity`: missing title, over-long text or an unparseable deadline.
/// - `500 Internal Server Error`: `{"error": "Failed to create todo"}`.
#[post("", wrap = "AuthMiddleware")]
pub async fn create_task(
    tasks: web::Data<TaskService>,
    caller: AuthenticatedAccount,
    body: web::Json<CreateTaskRequest>,
) -> Result<impl Responder, AppError> {
    let task = NewTask::try_from(body.into_inner())?;
    let created = tasks.create(caller.owner(), task).await?;
    Ok(HttpResponse::Created().json(created))
}

#[get("/{id}", wrap = "AuthMiddleware")]
pub async fn get_task(
    tasks: web::Data<TaskService>,
    caller: AuthenticatedAccount,
    path: web::Path<i64>,
) -> Result<impl Responder, AppError> {
    let task = tasks.find(caller.owner(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(task))
}

/// Partially updates one of the caller's tasks.
///
/// Only fields present in the body are written. A task owned by another account is
/// reported exactly like a missing one.
///
/// ## Responses:
/// - `200 OK`: the task as stored after the update.
/// - `404 Not Found`: `{"error": "Todo not found"}`.
/// - `422 Unprocessable Entity`: invalid field values.
#[put("/{id}", wrap = "AuthMiddleware")]
pub async fn update_task(
    tasks: web::Data<TaskService>,
    caller: AuthenticatedAccount,
    path: web::Path<i64>,
    body: web::Json<UpdateTaskRequest>,
) -> Result<impl Responder, AppError> {
    let changes = TaskChanges::try_from(body.into_inner())?;
    let task = tasks
        .update(caller.owner(), path.into_inner(), changes)
        .await?;
    Ok(HttpResponse::Ok().json(task))
}

/// Permanently deletes one of the caller's tasks.
#[delete("/{id}", wrap = "AuthMiddleware")]
pub async fn delete_task(
    tasks: web::Data<TaskService>,
    caller: AuthenticatedAccount,
    path: web::Path<i64>,
) -> Result<impl Responder, AppError> {
    tasks.delete(caller.owner(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Todo deleted successfully" })))
}
