//! Folds the middleware list into a single handler.

use crate::middleware::{Handler, Invocation, Middleware, Next};
use crate::reconciler;

/// Compose right to left: the first middleware ends up outermost and the
/// reconciler is always the innermost link. Built once per store.
pub(crate) fn compose(middleware: Vec<Box<dyn Middleware>>) -> Handler {
    let terminus: Handler = Box::new(reconciler::reconcile);
    middleware
        .into_iter()
        .rev()
        .fold(terminus, |inner, layer| {
            let outer: Handler =
                Box::new(move |ctx: Invocation| layer.handle(ctx, Next::new(&*inner)));
            outer
        })
}
