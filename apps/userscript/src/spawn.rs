use futures::future::LocalBoxFuture;
use gitlab_focus_core::tasks::TaskSpawner;

/// Spawns fetch tasks on the browser's microtask queue.
#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserSpawner;

impl TaskSpawner for BrowserSpawner {
    fn spawn_task(&self, task: LocalBoxFuture<'static, ()>) {
        wasm_bindgen_futures::spawn_local(task);
    }
}
