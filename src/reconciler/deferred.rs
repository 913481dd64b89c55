//! Handle for a commit waiting on a deferred transform result.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use crate::error::StoreError;
use crate::reconciler::Resolved;

pub(crate) type CommitFuture = Pin<Box<dyn Future<Output = Result<Resolved, StoreError>> + Send>>;

/// Awaits the deferred value, then commits it.
///
/// The commit runs inside `poll`, on whichever task awaits the handle, so
/// it can never land while the caller is still running synchronous code.
/// Dropping the handle before it settles abandons the commit and drops the
/// user's future with it.
#[must_use = "a deferred result is only committed when its handle is awaited"]
pub struct Deferred {
    action: String,
    commit: CommitFuture,
    settled: bool,
}

impl Deferred {
    pub(crate) fn new(action: String, commit: CommitFuture) -> Self {
        Self {
            action,
            commit,
            settled: false,
        }
    }

    /// Path of the action that produced this handle.
    pub fn action(&self) -> &str {
        &self.action
    }

    /// Whether the deferred value has resolved or been rejected.
    pub fn is_settled(&self) -> bool {
        self.settled
    }
}

impl Future for Deferred {
    type Output = Result<Resolved, StoreError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let result = self.commit.as_mut().poll(cx);
        if result.is_ready() {
            self.settled = true;
        }
        result
    }
}

impl fmt::Debug for Deferred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferred")
            .field("action", &self.action)
            .field("settled", &self.settled)
            .finish()
    }
}
