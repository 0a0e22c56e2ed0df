//! View state for the screens that mutate optimistically.

pub mod habits;
pub mod tasks;

pub use habits::HabitBoard;
pub use tasks::{TaskBoard, TaskFilter, TaskTab};
