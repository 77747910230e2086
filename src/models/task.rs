use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use std::borrow::Cow;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::error::AppError;

/// Maximum length of a task title, in characters.
pub const TITLE_MAX_LEN: u64 = 255;
/// Maximum length of a task description, in characters.
pub const DESCRIPTION_MAX_LEN: u64 = 1000;

/// Represents a task as stored in the database and returned by the API.
///
/// The owning account is not part of the projection: every query is already scoped to the
/// caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Task {
    /// Unique identifier for the task.
    pub id: i64,
    /// The title of the task.
    pub title: String,
    /// An optional description for the task.
    pub description: Option<String>,
    /// Whether the task has been completed.
    pub is_completed: bool,
    /// Optional due date for the task.
    pub deadline: Option<NaiveDate>,
    /// Timestamp of when the task was created.
    pub created_at: DateTime<Utc>,
    /// Timestamp of the last update to the task.
    pub updated_at: DateTime<Utc>,
}

/// Request body for creating a task.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct CreateTaskRequest {
    #[validate(required, length(min = 1, max = 255))]
    pub title: Option<String>,

    #[validate(length(max = 1000))]
    pub description: Option<String>,

    pub is_completed: Option<bool>,

    #[validate(custom = "validate_deadline")]
    pub deadline: Option<String>,
}

/// A task ready to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub is_completed: bool,
    pub deadline: Option<NaiveDate>,
}

impl TryFrom<CreateTaskRequest> for NewTask {
    type Error = AppError;

    fn try_from(request: CreateTaskRequest) -> Result<Self, Self::Error> {
        let request = CreateTaskRequest {
            title: request.title.map(|title| title.trim().to_string()),
            description: blank_to_none(request.description),
            is_completed: request.is_completed,
            deadline: blank_to_none(request.deadline),
        };
        request.validate()?;

        Ok(NewTask {
            title: request.title.unwrap_or_default(),
            description: request.description,
            is_completed: request.is_completed.unwrap_or(false),
            deadline: request.deadline.as_deref().and_then(parse_deadline),
        })
    }
}

/// Request body for a partial update.
///
/// The outer `Option` records whether the field was present at all; for nullable
/// fields the inner `Option` carries an explicit `null`.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateTaskRequest {
    #[serde(default, deserialize_with = "present")]
    pub title: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub is_completed: Option<bool>,
    #[serde(default, deserialize_with = "present")]
    pub deadline: Option<Option<String>>,
}

impl Validate for UpdateTaskRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        match &self.title {
            Some(None) => errors.add("title", ValidationError::new("required")),
            Some(Some(title)) => {
                if let Some(err) = check_length(title, Some(1), Some(TITLE_MAX_LEN)) {
                    errors.add("title", err);
                }
            }
            None => {}
        }

        if let Some(Some(description)) = &self.description {
            if let Some(err) = check_length(description, None, Some(DESCRIPTION_MAX_LEN)) {
                errors.add("description", err);
            }
        }

        if let Some(Some(deadline)) = &self.deadline {
            if let Err(err) = validate_deadline(deadline) {
                errors.add("deadline", err);
            }
        }

        if errors.errors().is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// The validated set of fields a partial update touches.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TaskChanges {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub is_completed: Option<bool>,
    pub deadline: Option<Option<NaiveDate>>,
}

impl TryFrom<UpdateTaskRequest> for TaskChanges {
    type Error = AppError;

    fn try_from(request: UpdateTaskRequest) -> Result<Self, Self::Error> {
        let request = UpdateTaskRequest {
            title: request
                .title
                .map(|title| title.map(|title| title.trim().to_string())),
            description: request.description.map(blank_to_none),
            is_completed: request.is_completed,
            deadline: request.deadline.map(blank_to_none),
        };
        request.validate()?;

        Ok(TaskChanges {
            title: request.title.flatten(),
            description: request.description,
            is_completed: request.is_completed,
            deadline: request
                .deadline
                .map(|deadline| deadline.as_deref().and_then(parse_deadline)),
        })
    }
}

impl Task {
    /// Whether the title or description contains `needle`, which must already be
    /// lower-cased. Case folding is Unicode-aware.
    pub fn mentions(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle)
            || self
                .description
                .as_deref()
                .map_or(false, |description| description.to_lowercase().contains(needle))
    }
}

/// Completion-state filter for listing tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskFilter {
    #[default]
    All,
    Completed,
    /// Not yet completed.
    Pending,
    /// Not completed and due before today.
    Overdue,
}

/// Sort key for listing tasks. Ordering is always ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskSort {
    CreatedAt,
    UpdatedAt,
    Deadline,
}

/// Optional query parameters when listing tasks. With every field absent the
/// listing is the caller's full task list in insertion order.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct TaskQuery {
    pub status: Option<TaskFilter>,
    /// Case-insensitive substring match on title or description.
    pub search: Option<String>,
    /// Only tasks due on this date.
    pub deadline: Option<NaiveDate>,
    pub sort_by: Option<TaskSort>,
}

/// Parses a deadline given either as a calendar date or as a timestamp, keeping the date.
pub fn parse_deadline(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|timestamp| timestamp.date_naive())
        })
        .or_else(|| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|timestamp| timestamp.date())
        })
}

fn validate_deadline(value: &str) -> Result<(), ValidationError> {
    match parse_deadline(value) {
        Some(_) => Ok(()),
        None => Err(ValidationError::new("date")),
    }
}

fn check_length(value: &str, min: Option<u64>, max: Option<u64>) -> Option<ValidationError> {
    let len = value.chars().count() as u64;
    let too_short = min.map_or(false, |min| len < min);
    let too_long = max.map_or(false, |max| len > max);
    if !too_short && !too_long {
        return None;
    }

    let mut err = ValidationError::new("length");
    if let Some(min) = min {
        err.add_param(Cow::from("min"), &min);
    }
    if let Some(max) = max {
        err.add_param(Cow::from("max"), &max);
    }
    err.add_param(Cow::from("value"), &value);
    Some(err)
}

/// Trims text input and treats blank strings as absent.
fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Wraps any present value, including `null`, in `Some`.
fn present<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}
