//! In-memory log ring for the interactive shell.
//!
//! A `tracing` layer that keeps the most recent formatted events, with its
//! own level that can be changed while the program runs.

use chrono::{SecondsFormat, Utc};
use std::collections::VecDeque;
use std::fmt::{self, Write as _};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

/// Number of lines kept by default.
pub const DEFAULT_CAPACITY: usize = 400;

fn level_to_u8(level: Level) -> u8 {
    match level {
        Level::ERROR => 0,
        Level::WARN => 1,
        Level::INFO => 2,
        Level::DEBUG => 3,
        Level::TRACE => 4,
    }
}

fn u8_to_level(value: u8) -> Level {
    match value {
        0 => Level::ERROR,
        1 => Level::WARN,
        2 => Level::INFO,
        3 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

struct Inner {
    lines: Mutex<VecDeque<String>>,
    capacity: usize,
    level: AtomicU8,
}

/// Bounded ring of formatted log lines. Clones share the same buffer.
#[derive(Clone)]
pub struct LogRing {
    inner: Arc<Inner>,
}

impl LogRing {
    pub fn new(capacity: usize, level: Level) -> Self {
        Self {
            inner: Arc::new(Inner {
                lines: Mutex::new(VecDeque::with_capacity(capacity)),
                capacity,
                level: AtomicU8::new(level_to_u8(level)),
            }),
        }
    }

    pub fn level(&self) -> Level {
        u8_to_level(self.inner.level.load(Ordering::Relaxed))
    }

    /// Change the most verbose level recorded from now on.
    pub fn set_level(&self, level: Level) {
        self.inner.level.store(level_to_u8(level), Ordering::Relaxed);
        tracing::info!("log level -> {}", level.as_str().to_lowercase());
    }

    /// Snapshot of the buffered lines, oldest first.
    pub fn dump(&self) -> Vec<String> {
        match self.inner.lines.lock() {
            Ok(lines) => lines.iter().cloned().collect(),
            Err(_) => Vec::new(),
        }
    }

    /// The last `n` lines, oldest first.
    pub fn tail(&self, n: usize) -> Vec<String> {
        let lines = self.dump();
        let skip = lines.len().saturating_sub(n);
        lines.into_iter().skip(skip).collect()
    }

    fn push(&self, line: String) {
        if let Ok(mut lines) = self.inner.lines.lock() {
            if lines.len() == self.inner.capacity {
                lines.pop_front();
            }
            lines.push_back(line);
        }
    }
}

impl Default for LogRing {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, Level::INFO)
    }
}

/// Collects an event's message and fields into one line.
#[derive(Default)]
struct LineVisitor {
    message: String,
    fields: String,
}

impl LineVisitor {
    fn field(&mut self, name: &str, value: fmt::Arguments<'_>) {
        if name == "message" {
            let _ = self.message.write_fmt(value);
        } else {
            let _ = write!(self.fields, " {}={}", name, value);
        }
    }
}

impl Visit for LineVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.field(field.name(), format_args!("{}", value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.field(field.name(), format_args!("{:?}", value));
    }
}

impl<S: Subscriber> Layer<S> for LogRing {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let level = *event.metadata().level();
        if level > self.level() {
            return;
        }

        let mut visitor = LineVisitor::default();
        event.record(&mut visitor);

        self.push(format!(
            "[{}][{}] {}{}",
            Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            level.as_str().to_lowercase(),
            visitor.message,
            visitor.fields
        ));
    }
}
