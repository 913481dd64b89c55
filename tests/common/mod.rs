//! Shared test fixtures.

#![allow(dead_code)]

use std::io;
use std::sync::Arc;

use anystate::{from_fn, Definitions, Middleware, Outcome, Slice, Snapshot, Store};
use parking_lot::Mutex;
use serde_json::{json, Value};

pub type Log = Arc<Mutex<Vec<String>>>;

/// `users` slice (array of user objects) plus a `count` slice and a root
/// `reset` action.
pub fn app_definitions() -> Definitions {
    Definitions::new()
        .action("reset", |_, _| Outcome::Value(Snapshot::new()))
        .selector("slice_count", |root, _| json!(root.len()))
        .slice(
            "users",
            Slice::new(|_| json!([]))
                .action("add_user", |users, args| {
                    let mut users = users.as_array().cloned().unwrap_or_default();
                    users.extend(args.iter().cloned());
                    Outcome::Value(Value::Array(users))
                })
                .selector("names", |users, _| {
                    let names: Vec<Value> = users
                        .as_array()
                        .into_iter()
                        .flatten()
                        .filter_map(|user| user.get("name").cloned())
                        .collect();
                    Value::Array(names)
                }),
        )
        .slice(
            "count",
            Slice::new(|prior| prior.cloned().unwrap_or(json!(0)))
                .action("inc", |n, _| Outcome::Value(json!(n.as_i64().unwrap_or(0) + 1)))
                .action("add", |n, args| {
                    let by = args.first().and_then(Value::as_i64).unwrap_or(0);
                    Outcome::Value(json!(n.as_i64().unwrap_or(0) + by))
                })
                .selector("doubled", |n, _| json!(n.as_i64().unwrap_or(0) * 2)),
        )
}

pub fn app_store() -> Store {
    Store::new(Snapshot::new(), app_definitions()).expect("valid definitions")
}

/// Middleware that records `label:before` / `label:after` around each call.
pub fn recorder(label: &'static str, log: Log) -> Box<dyn Middleware> {
    from_fn(move |ctx, next| {
        log.lock().push(format!("{label}:before {}", ctx.path()));
        let result = next.run(ctx);
        log.lock().push(format!("{label}:after {}", outcome_label(&result)));
        result
    })
}

fn outcome_label(result: &Result<anystate::Dispatched, anystate::StoreError>) -> &'static str {
    match result {
        Ok(dispatched) => dispatched.kind(),
        Err(_) => "error",
    }
}

/// In-memory writer for capturing formatted tracing output.
#[derive(Clone, Default)]
pub struct CaptureWriter {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl CaptureWriter {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buffer.lock()).into_owned()
    }
}

impl io::Write for CaptureWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
