//! Action logger built on `tracing`.
//!
//! Each call gets an `action` span, the moral equivalent of a console
//! group: previous state and arguments are logged on the way in, the
//! outcome, next state and elapsed time on the way out. When the
//! configured level is disabled for the active subscriber the logger is a
//! pure pass-through.

use std::time::{Duration, Instant};

use tracing::{Level, Span};

use crate::config::{Config, LogLevel, LoggerConfig};
use crate::definitions::SliceId;
use crate::error::StoreError;
use crate::middleware::{Invocation, Middleware, Next};
use crate::reconciler::Dispatched;
use crate::store::binder;

macro_rules! log_at {
    ($level:expr, $($arg:tt)+) => {
        match $level {
            LogLevel::Trace => tracing::trace!($($arg)+),
            LogLevel::Debug => tracing::debug!($($arg)+),
            LogLevel::Info => tracing::info!($($arg)+),
        }
    };
}

/// Logs every action passing through the chain.
#[derive(Debug, Clone, Default)]
pub struct Logger {
    config: LoggerConfig,
}

impl Logger {
    pub fn new(config: LoggerConfig) -> Self {
        Self { config }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.logger.clone())
    }

    pub fn config(&self) -> &LoggerConfig {
        &self.config
    }

    fn is_active(&self, path: &str) -> bool {
        self.config.enabled
            && level_enabled(self.config.level)
            && !self.config.skip.iter().any(|skipped| skipped == path)
    }
}

fn level_enabled(level: LogLevel) -> bool {
    match level {
        LogLevel::Trace => tracing::enabled!(Level::TRACE),
        LogLevel::Debug => tracing::enabled!(Level::DEBUG),
        LogLevel::Info => tracing::enabled!(Level::INFO),
    }
}

/// Whole microseconds, saturating at `u64::MAX`.
fn micros(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX)
}

fn group(level: LogLevel, path: &str) -> Span {
    match level {
        LogLevel::Trace => tracing::trace_span!("action", path = %path),
        LogLevel::Debug => tracing::debug_span!("action", path = %path),
        LogLevel::Info => tracing::info_span!("action", path = %path),
    }
}

impl Middleware for Logger {
    fn handle(&self, ctx: Invocation, next: Next<'_>) -> Result<Dispatched, StoreError> {
        let path = ctx.path();
        if !self.is_active(&path) {
            return next.run(ctx);
        }

        let level = self.config.level;
        let span = group(level, &path);
        let _guard = span.enter();

        let store = ctx.store().clone();
        let slice = ctx.slice().name().map(str::to_string);
        let bind = || binder::resolve(&store, slice.as_deref().map_or(SliceId::Root, SliceId::Named));

        if self.config.include_state {
            log_at!(level, state = %bind(), "prev state");
        }
        if self.config.include_args {
            let args = serde_json::Value::Array(ctx.args().to_vec());
            log_at!(level, args = %args, "action");
        }

        let started = Instant::now();
        let result = next.run(ctx);
        let elapsed_us = micros(started.elapsed());

        match &result {
            Ok(dispatched) => {
                log_at!(level, outcome = %dispatched.kind(), elapsed_us, "done");
                if self.config.include_state {
                    log_at!(level, state = %bind(), "next state");
                }
            }
            Err(err) => tracing::warn!(error = %err, elapsed_us, "action failed"),
        }

        result
    }
}
