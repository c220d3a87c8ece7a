use std::{future, pin::Pin, time::Duration};

use tokio::time::{self, Instant, Sleep};

use crate::id_type;

id_type!(TaskId);

pub struct ScheduledTask<T> {
    pub id: TaskId,
    pub deadline: Instant,
    sleep: Pin<Box<Sleep>>,
    payload: Option<T>,
}

impl<T> ScheduledTask<T> {
    fn new(delay: Duration, payload: T) -> Self {
        let deadline = Instant::now() + delay;
        Self {
            id: TaskId::new(),
            deadline,
            sleep: Box::pin(time::sleep_until(deadline)),
            payload: Some(payload),
        }
    }
}

/// Holds at most one pending task. Scheduling a new task supersedes the
/// previous one, which never fires.
pub struct TaskSlot<T> {
    name: &'static str,
    task: Option<ScheduledTask<T>>,
}

impl<T> TaskSlot<T> {
    pub fn new(name: &'static str) -> Self {
        Self { name, task: None }
    }

    pub fn schedule(&mut self, delay: Duration, payload: T) -> TaskId {
        self.cancel();
        let task = ScheduledTask::new(delay, payload);
        let id = task.id;
        log::debug!("Scheduled {} task {id} in {delay:?}", self.name);
        self.task = Some(task);
        id
    }

    /// Returns whether a pending task was dropped.
    pub fn cancel(&mut self) -> bool {
        let Some(task) = self.task.take() else {
            return false;
        };
        log::debug!("Cancelled {} task {}", self.name, task.id);
        true
    }

    pub fn is_pending(&self) -> bool {
        self.task.is_some()
    }

    /// Resolves with the payload once the pending task is due; never resolves
    /// while the slot is empty.
    ///
    /// Cancel safe: dropping the future before completion leaves the task in
    /// the slot.
    pub async fn next_due(&mut self) -> T {
        let Some(task) = self.task.as_mut() else {
            return future::pending().await;
        };
        task.sleep.as_mut().await;

        match self.task.take().and_then(|mut task| task.payload.take()) {
            Some(payload) => payload,
            None => future::pending().await,
        }
    }
}
