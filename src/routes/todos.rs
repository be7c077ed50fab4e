use crate::{
    auth::TodoScope,
    error::AppError,
    models::{NewTodo, Todo, TodoInput, TodoPatch, TODO_COLUMNS},
};
use actix_web::{delete, get, patch, post, put, web, HttpResponse, Responder};
use chrono::Utc;
use sqlx::SqlitePool;
use validator::Validate;

// `? IS NULL OR user_id = ?` takes the scope owner twice: unscoped requests bind NULL
// and match every row.

fn not_found() -> AppError {
    AppError::NotFound("Not found.".into())
}

/// Lists todos, completed ones first, then by id.
///
/// ## Responses:
/// - `200 OK`: JSON array of `Todo` objects.
/// - `401 Unauthorized`: todos are scoped to users and the caller is not logged in.
#[get("/")]
pub async fn list_todos(
    pool: web::Data<SqlitePool>,
    scope: TodoScope,
) -> Result<impl Responder, AppError> {
    let owner = scope.owner();
    let todos = sqlx::query_as::<_, Todo>(&format!(
        "SELECT {} FROM todos WHERE (? IS NULL OR user_id = ?) ORDER BY completed DESC, id ASC",
        TODO_COLUMNS
    ))
    .bind(owner)
    .bind(owner)
    .fetch_all(&**pool)
    .await?;

    Ok(HttpResponse::Ok().json(todos))
}

/// Creates a todo.
///
/// ## Request Body:
/// - `text`: 1 to 255 characters (required).
/// - `completed` (optional): defaults to `false`.
///
/// ## Responses:
/// - `201 Created`: the stored `Todo`, with server-assigned `id`, `created` and `updated`.
/// - `400 Bad Request`: malformed JSON or missing `text`.
/// - `422 Unprocessable Entity`: `text` empty or too long.
#[post("/")]
pub async fn create_todo(
    pool: web::Data<SqlitePool>,
    scope: TodoScope,
    todo_data: web::Json<TodoInput>,
) -> Result<impl Responder, AppError> {
    todo_data.validate()?;

    let todo = NewTodo::new(todo_data.into_inner(), scope.owner());

    let created = sqlx::query_as::<_, Todo>(&format!(
        "INSERT INTO todos (text, completed, created, updated, user_id) \
         VALUES (?, ?, ?, ?, ?) RETURNING {}",
        TODO_COLUMNS
    ))
    .bind(todo.text)
    .bind(todo.completed)
    .bind(todo.created)
    .bind(todo.created)
    .bind(todo.user_id)
    .fetch_one(&**pool)
    .await?;

    log::debug!("Created todo {}", created.id);
    Ok(HttpResponse::Created().json(created))
}

/// Retrieves one todo by id.
///
/// ## Responses:
/// - `200 OK`: the `Todo`.
/// - `404 Not Found`: no such todo, or it belongs to another user.
#[get("/{id}/")]
pub async fn get_todo(
    pool: web::Data<SqlitePool>,
    scope: TodoScope,
    todo_id: web::Path<i64>,
) -> Result<impl Responder, AppError> {
    let owner = scope.owner();
    let todo = sqlx::query_as::<_, Todo>(&format!(
        "SELECT {} FROM todos WHERE id = ? AND (? IS NULL OR user_id = ?)",
        TODO_COLUMNS
    ))
    .bind(todo_id.into_inner())
    .bind(owner)
    .bind(owner)
    .fetch_optional(&**pool)
    .await?
    .ok_or_else(not_found)?;

    Ok(HttpResponse::Ok().json(todo))
}

/// Writes the present fields of `changes` and refreshes `updated`. Last writer wins.
async fn apply_update(
    pool: &SqlitePool,
    scope: TodoScope,
    todo_id: i64,
    changes: TodoPatch,
) -> Result<Todo, AppError> {
    changes.validate()?;
    let owner = scope.owner();

    sqlx::query_as::<_, Todo>(&format!(
        "UPDATE todos SET text = COALESCE(?, text), completed = COALESCE(?, completed), updated = ? \
         WHERE id = ? AND (? IS NULL OR user_id = ?) RETURNING {}",
        TODO_COLUMNS
    ))
    .bind(changes.text)
    .bind(changes.completed)
    .bind(Utc::now())
    .bind(todo_id)
    .bind(owner)
    .bind(owner)
    .fetch_optional(pool)
    .await?
    .ok_or_else(not_found)
}

/// Replaces a todo's text (and `completed`, when given).
///
/// ## Responses:
/// - `200 OK`: the updated `Todo`.
/// - `404 Not Found`: no such todo, or it belongs to another user.
/// - `422 Unprocessable Entity`: invalid `text`.
#[put("/{id}/")]
pub async fn update_todo(
    pool: web::Data<SqlitePool>,
    scope: TodoScope,
    todo_id: web::Path<i64>,
    todo_data: web::Json<TodoInput>,
) -> Result<impl Responder, AppError> {
    let changes = TodoPatch::from(todo_data.into_inner());
    let todo = apply_update(&pool, scope, todo_id.into_inner(), changes).await?;
    Ok(HttpResponse::Ok().json(todo))
}

/// Updates only the fields present in the body.
#[patch("/{id}/")]
pub async fn partial_update_todo(
    pool: web::Data<SqlitePool>,
    scope: TodoScope,
    todo_id: web::Path<i64>,
    todo_data: web::Json<TodoPatch>,
) -> Result<impl Responder, AppError> {
    let todo = apply_update(&pool, scope, todo_id.into_inner(), todo_data.into_inner()).await?;
    Ok(HttpResponse::Ok().json(todo))
}

/// Deletes a todo.
///
/// ## Responses:
/// - `204 No Content`: deleted.
/// - `404 Not Found`: no such todo (including one already deleted), or another user's.
#[delete("/{id}/")]
pub async fn delete_todo(
    pool: web::Data<SqlitePool>,
    scope: TodoScope,
    todo_id: web::Path<i64>,
) -> Result<impl Responder, AppError> {
    let owner = scope.owner();
    let result = sqlx::query("DELETE FROM todos WHERE id = ? AND (? IS NULL OR user_id = ?)")
        .bind(todo_id.into_inner())
        .bind(owner)
        .bind(owner)
        .execute(&**pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(not_found());
    }

    Ok(HttpResponse::NoContent().finish())
}
