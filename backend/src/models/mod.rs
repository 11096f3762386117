pub mod task;

pub use task::{
    FieldChange, FilterType, InvalidTaskId, NewTaskRequest, Task, TaskId, TaskStats,
    UpdateTaskRequest,
};
