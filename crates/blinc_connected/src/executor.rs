//! UI-affinity task scheduling
//!
//! List animations need to wait for a scroll and layout pass before they can
//! start. That wait is a continuation scheduled on the UI thread rather than
//! a parallel task. [`FrameExecutor`] is a single-threaded executor the host
//! ticks once per frame; every tick polls each queued task once.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

use futures::future::LocalBoxFuture;
use futures::FutureExt;

use crate::error::{ConnectedError, Result};

/// Schedules continuations on the UI execution context
pub trait UiDispatcher {
    /// Queue `future` to run on the UI thread
    fn spawn_local(&self, future: LocalBoxFuture<'static, ()>);
}

/// A frame-driven single-threaded executor
///
/// Cloning yields another handle to the same queue.
#[derive(Clone, Default)]
pub struct FrameExecutor {
    inner: Rc<RefCell<VecDeque<LocalBoxFuture<'static, ()>>>>,
    frame: Rc<Cell<u64>>,
}

impl FrameExecutor {
    /// Create a new executor with an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Poll every queued task once
    ///
    /// Tasks spawned while ticking run on the next tick. Returns the number
    /// of tasks that completed.
    pub fn tick(&self) -> usize {
        let batch = std::mem::take(&mut *self.inner.borrow_mut());
        let mut cx = Context::from_waker(futures::task::noop_waker_ref());
        let mut completed = 0;

        for mut task in batch {
            match task.as_mut().poll(&mut cx) {
                Poll::Ready(()) => completed += 1,
                Poll::Pending => self.inner.borrow_mut().push_back(task),
            }
        }

        self.frame.set(self.frame.get() + 1);
        completed
    }

    /// Tick until the queue drains, giving up after `max_frames` ticks
    ///
    /// Returns the number of ticks run.
    pub fn run_until_stalled(&self, max_frames: u32) -> u32 {
        let mut frames = 0;
        while self.has_pending_tasks() && frames < max_frames {
            self.tick();
            frames += 1;
        }
        frames
    }

    /// Check if there are pending tasks
    pub fn has_pending_tasks(&self) -> bool {
        !self.inner.borrow().is_empty()
    }

    /// Number of pending tasks
    pub fn pending_task_count(&self) -> usize {
        self.inner.borrow().len()
    }

    /// Number of ticks run so far
    pub fn frame(&self) -> u64 {
        self.frame.get()
    }
}

impl UiDispatcher for FrameExecutor {
    fn spawn_local(&self, future: LocalBoxFuture<'static, ()>) {
        self.inner.borrow_mut().push_back(future);
    }
}

impl std::fmt::Debug for FrameExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameExecutor")
            .field("pending", &self.pending_task_count())
            .field("frame", &self.frame())
            .finish()
    }
}

/// Future that is pending exactly once
#[derive(Debug, Default)]
pub struct YieldFrame {
    yielded: bool,
}

impl Future for YieldFrame {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.yielded {
            Poll::Ready(())
        } else {
            self.yielded = true;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    }
}

/// Give up the rest of this frame
pub fn yield_frame() -> YieldFrame {
    YieldFrame::default()
}

/// Run `future`, failing with [`ConnectedError::BudgetExceeded`] if it is
/// still pending after `frames` polls
pub fn with_frame_budget<T: 'static>(
    future: LocalBoxFuture<'static, Result<T>>,
    frames: u32,
) -> LocalBoxFuture<'static, Result<T>> {
    FrameBudget {
        inner: future,
        remaining: frames,
        frames,
    }
    .boxed_local()
}

struct FrameBudget<T> {
    inner: LocalBoxFuture<'static, Result<T>>,
    remaining: u32,
    frames: u32,
}

impl<T> Future for FrameBudget<T> {
    type Output = Result<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<T>> {
        if let Poll::Ready(result) = self.inner.as_mut().poll(cx) {
            return Poll::Ready(result);
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            Poll::Ready(Err(ConnectedError::BudgetExceeded {
                frames: self.frames,
            }))
        } else {
            Poll::Pending
        }
    }
}
