use crate::db::TaskRepository;

#[derive(Clone)]
pub struct AppState {
    pub tasks: TaskRepository,
}
