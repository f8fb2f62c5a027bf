//! Timed and next-frame actions with explicit cancellation.
//!
//! The editor runs on a single UI thread; work that must happen "a little
//! later" (re-enabling clicks on a freshly opened menu, re-positioning a popup
//! once its size is known) is queued here and drained once per frame.

use std::cell::Cell;
use std::rc::Rc;

/// Shared flag that cancels the tasks it was handed to.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Rc<Cell<bool>>);

impl CancellationToken {
    /// Creates a live token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancels every task holding this token.
    pub fn cancel(&self) {
        self.0.set(true);
    }

    /// Whether [`cancel`](Self::cancel) was called.
    pub fn is_cancelled(&self) -> bool {
        self.0.get()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Due {
    At(f64),
    Frame(u64),
}

#[derive(Debug)]
struct Scheduled<T> {
    due: Due,
    token: CancellationToken,
    task: T,
}

/// Queue of pending tasks of type `T`.
#[derive(Debug)]
pub struct DeferredQueue<T> {
    frame: u64,
    tasks: Vec<Scheduled<T>>,
}

impl<T> Default for DeferredQueue<T> {
    fn default() -> Self {
        Self {
            frame: 0,
            tasks: Vec::new(),
        }
    }
}

impl<T> DeferredQueue<T> {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `task` once the clock reaches `due_ms`.
    pub fn schedule_at(&mut self, due_ms: f64, task: T, token: &CancellationToken) {
        self.tasks.push(Scheduled {
            due: Due::At(due_ms),
            token: token.clone(),
            task,
        });
    }

    /// Runs `task` on the next call to [`run_due`](Self::run_due).
    pub fn schedule_next_frame(&mut self, task: T, token: &CancellationToken) {
        self.tasks.push(Scheduled {
            due: Due::Frame(self.frame + 1),
            token: token.clone(),
            task,
        });
    }

    /// Advances one frame and returns the tasks that are due, in schedule order.
    ///
    /// Cancelled tasks are dropped without being returned.
    pub fn run_due(&mut self, now_ms: f64) -> Vec<T> {
        self.frame += 1;
        let frame = self.frame;
        let (due, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut self.tasks)
            .into_iter()
            .filter(|s| !s.token.is_cancelled())
            .partition(|s| match s.due {
                Due::At(at) => at <= now_ms,
                Due::Frame(f) => f <= frame,
            });
        self.tasks = pending;
        due.into_iter().map(|s| s.task).collect()
    }

    /// Number of tasks still waiting, cancelled ones included until the next drain.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether nothing is waiting.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Drops every pending task.
    pub fn clear(&mut self) {
        self.tasks.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timed_tasks_wait_for_their_time() {
        let mut queue = DeferredQueue::new();
        let token = CancellationToken::new();
        queue.schedule_at(100.0, "guard", &token);
        assert!(queue.run_due(50.0).is_empty());
        assert_eq!(queue.run_due(100.0), vec!["guard"]);
        assert!(queue.is_empty());
    }

    #[test]
    fn next_frame_tasks_run_once_on_following_frame() {
        let mut queue = DeferredQueue::new();
        let token = CancellationToken::new();
        queue.run_due(0.0);
        queue.schedule_next_frame(1, &token);
        assert_eq!(queue.run_due(16.0), vec![1]);
        assert!(queue.run_due(32.0).is_empty());
    }

    #[test]
    fn cancelled_tasks_never_run() {
        let mut queue = DeferredQueue::new();
        let menu = CancellationToken::new();
        let other = CancellationToken::new();
        queue.schedule_at(10.0, "menu", &menu);
        queue.schedule_at(10.0, "other", &other);
        menu.cancel();
        assert_eq!(queue.run_due(20.0), vec!["other"]);
    }
}
