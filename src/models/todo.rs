use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Column list shared by every todo query.
pub const TODO_COLUMNS: &str = "id, text, completed, created, updated, user_id";

/// Input for creating a todo, and for a full (`PUT`) update.
///
/// On update a missing `completed` leaves the stored value untouched.
#[derive(Debug, Deserialize, Validate)]
pub struct TodoInput {
    /// The todo text. Must be between 1 and 255 characters.
    #[validate(length(min = 1, max = 255))]
    pub text: String,

    /// Whether the todo is done. Defaults to `false` on creation.
    pub completed: Option<bool>,
}

/// Input for a partial (`PATCH`) update. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct TodoPatch {
    #[validate(length(min = 1, max = 255))]
    pub text: Option<String>,

    pub completed: Option<bool>,
}

impl From<TodoInput> for TodoPatch {
    fn from(input: TodoInput) -> Self {
        Self {
            text: Some(input.text),
            completed: input.completed,
        }
    }
}

/// A todo as stored in the database and returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Todo {
    /// Identifier assigned by the database; never reused.
    pub id: i64,
    pub text: String,
    pub completed: bool,
    /// Set once at creation.
    pub created: DateTime<Utc>,
    /// Refreshed on every mutation.
    pub updated: DateTime<Utc>,
    /// Owning user, only set when todos are scoped to users.
    #[serde(rename = "user", default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
}

/// A todo that has not been inserted yet.
#[derive(Debug)]
pub struct NewTodo {
    pub text: String,
    pub completed: bool,
    pub created: DateTime<Utc>,
    pub user_id: Option<i64>,
}

impl NewTodo {
    /// Builds a new todo from `TodoInput`, stamped with the current time.
    pub fn new(input: TodoInput, user_id: Option<i64>) -> Self {
        Self {
            text: input.text,
            completed: input.completed.unwrap_or(false),
            created: Utc::now(),
            user_id,
        }
    }
}
