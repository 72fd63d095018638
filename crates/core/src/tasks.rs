//! Element-bound fetch tasks.
//!
//! Every fetch runs as a local task wrapped in [`Abortable`] and tracked
//! together with the element it will render into. When the host removes
//! nodes, tasks whose element is no longer connected are aborted instead of
//! completing against a detached node.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::future::Future;

use futures::executor::LocalSpawner;
use futures::future::{AbortHandle, AbortRegistration, Abortable, LocalBoxFuture};
use futures::task::LocalSpawnExt;
use log::{debug, warn};

use crate::dom::HostElement;

/// Runs `'static` local futures on the page's single event loop.
pub trait TaskSpawner {
    fn spawn_task(&self, task: LocalBoxFuture<'static, ()>);
}

impl TaskSpawner for LocalSpawner {
    fn spawn_task(&self, task: LocalBoxFuture<'static, ()>) {
        if let Err(e) = self.spawn_local(task) {
            warn!("Failed to spawn enrichment task: {}", e);
        }
    }
}

/// Identifier of a tracked task.
pub type TaskId = u64;

struct Tracked<E> {
    element: E,
    handle: AbortHandle,
}

/// In-flight tasks keyed by id, each bound to its target element.
pub struct TaskRegistry<E> {
    next_id: Cell<TaskId>,
    live: RefCell<HashMap<TaskId, Tracked<E>>>,
}

impl<E> Default for TaskRegistry<E> {
    fn default() -> Self {
        Self {
            next_id: Cell::new(0),
            live: RefCell::new(HashMap::new()),
        }
    }
}

impl<E: HostElement> TaskRegistry<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tracks a new task for `element`; the registration goes into
    /// [`Abortable::new`].
    pub fn register(&self, element: &E) -> (TaskId, AbortRegistration) {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        let (handle, registration) = AbortHandle::new_pair();
        self.live.borrow_mut().insert(
            id,
            Tracked {
                element: element.clone(),
                handle,
            },
        );
        (id, registration)
    }

    /// Wraps `future` so it is tracked while it runs and can be aborted.
    pub fn bind<F>(&self, element: &E, future: F) -> (TaskId, Abortable<F>)
    where
        F: Future<Output = ()>,
    {
        let (id, registration) = self.register(element);
        (id, Abortable::new(future, registration))
    }

    /// Forgets a finished (or aborted) task.
    pub fn finish(&self, id: TaskId) {
        self.live.borrow_mut().remove(&id);
    }

    /// Aborts every task whose element left the document and returns those
    /// elements.
    pub fn abort_detached(&self) -> Vec<E> {
        let mut live = self.live.borrow_mut();
        let detached: Vec<TaskId> = live
            .iter()
            .filter(|(_, tracked)| !tracked.element.is_connected())
            .map(|(id, _)| *id)
            .collect();
        detached
            .into_iter()
            .filter_map(|id| {
                let tracked = live.remove(&id)?;
                tracked.handle.abort();
                debug!("Aborted task {} for a removed element", id);
                Some(tracked.element)
            })
            .collect()
    }

    pub fn in_flight(&self) -> usize {
        self.live.borrow().len()
    }
}
