pub mod todo;
pub mod user;

pub use todo::{NewTodo, Todo, TodoInput, TodoPatch, TODO_COLUMNS};
pub use user::User;
