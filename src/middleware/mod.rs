//! Interceptors wrapping every action call.
//!
//! A store's middleware list is composed once, at construction, into a
//! single handler:
//!
//! ```text
//! call ──→ m0 ──→ m1 ──→ … ──→ reconciler
//!          │      │              │
//!          ←──────←──────────────┘
//! ```
//!
//! Each layer may run code before and after `next.run(ctx)`, rewrite the
//! arguments, or return its own result without calling `next` at all.

pub(crate) mod chain;
mod context;
pub mod logger;

pub use context::Invocation;
pub use logger::Logger;

use crate::error::StoreError;
use crate::reconciler::Dispatched;

/// Composed chain, or one link of it.
pub(crate) type Handler = Box<dyn Fn(Invocation) -> Result<Dispatched, StoreError> + Send + Sync>;

/// One interceptor in the chain.
pub trait Middleware: Send + Sync + 'static {
    fn handle(&self, ctx: Invocation, next: Next<'_>) -> Result<Dispatched, StoreError>;
}

/// The rest of the chain below the current middleware.
pub struct Next<'a> {
    inner: &'a (dyn Fn(Invocation) -> Result<Dispatched, StoreError> + Send + Sync),
}

impl<'a> Next<'a> {
    pub(crate) fn new(
        inner: &'a (dyn Fn(Invocation) -> Result<Dispatched, StoreError> + Send + Sync),
    ) -> Self {
        Self { inner }
    }

    /// Hand the call to the next link and return its result.
    pub fn run(self, ctx: Invocation) -> Result<Dispatched, StoreError> {
        (self.inner)(ctx)
    }
}

/// Middleware built from a closure. See [`from_fn`].
pub struct FromFn<F> {
    f: F,
}

/// Turn a closure into a boxed middleware.
///
/// ```
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
///
/// use anystate::{from_fn, Definitions, Outcome, Slice, Snapshot, Store};
/// use serde_json::json;
///
/// let calls = Arc::new(AtomicUsize::new(0));
/// let counted = calls.clone();
/// let audit = from_fn(move |ctx, next| {
///     counted.fetch_add(1, Ordering::SeqCst);
///     tracing::info!(action = %ctx.path(), "calling");
///     next.run(ctx)
/// });
///
/// let defs = Definitions::new().slice(
///     "count",
///     Slice::new(|_| json!(0))
///         .action("inc", |n, _| Outcome::Value(json!(n.as_i64().unwrap_or(0) + 1))),
/// );
/// let store = Store::with_middleware(Snapshot::new(), defs, vec![audit])?;
/// store.dispatch("count.inc", vec![])?;
///
/// assert_eq!(calls.load(Ordering::SeqCst), 1);
/// assert_eq!(store.get_state()["count"], json!(1));
/// # Ok::<(), anystate::StoreError>(())
/// ```
pub fn from_fn<F>(f: F) -> Box<dyn Middleware>
where
    F: Fn(Invocation, Next<'_>) -> Result<Dispatched, StoreError> + Send + Sync + 'static,
{
    Box::new(FromFn { f })
}

impl<F> Middleware for FromFn<F>
where
    F: Fn(Invocation, Next<'_>) -> Result<Dispatched, StoreError> + Send + Sync + 'static,
{
    fn handle(&self, ctx: Invocation, next: Next<'_>) -> Result<Dispatched, StoreError> {
        (self.f)(ctx, next)
    }
}
