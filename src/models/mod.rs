pub mod account;
pub mod task;

pub use account::{Account, NewAccount, OwnerId};
pub use task::{NewTask, Task, TaskChanges, TaskFilter, TaskQuery, TaskSort};
