//! Terminal output for streamed events.
//!
//! Tokens go to stdout as they arrive; done metadata and errors go to
//! stderr so stdout carries only generated text.

use std::io::{self, Write};
use std::sync::{Mutex, MutexGuard};

use serde_json::Value;

use crate::sse::DomainEvent;
use crate::traits::EventSink;

/// Event sink writing to a pair of writers.
pub struct TerminalSink<O, E> {
    out: Mutex<O>,
    err: Mutex<E>,
}

impl TerminalSink<io::Stdout, io::Stderr> {
    /// Sink bound to the process's stdout and stderr.
    pub fn stdio() -> Self {
        Self::new(io::stdout(), io::stderr())
    }
}

impl<O, E> TerminalSink<O, E> {
    pub fn new(out: O, err: E) -> Self {
        Self {
            out: Mutex::new(out),
            err: Mutex::new(err),
        }
    }

    /// Take the writers back.
    pub fn into_inner(self) -> (O, E) {
        let out = self.out.into_inner().unwrap_or_else(|p| p.into_inner());
        let err = self.err.into_inner().unwrap_or_else(|p| p.into_inner());
        (out, err)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl<O, E> TerminalSink<O, E>
where
    O: Write,
    E: Write,
{
    fn write(&self, event: DomainEvent) -> io::Result<()> {
        match event {
            DomainEvent::Token(text) => {
                let mut out = lock(&self.out);
                out.write_all(text.as_bytes())?;
                out.flush()
            }
            DomainEvent::Done(meta) => {
                writeln!(lock(&self.out))?;
                if !meta.is_empty() {
                    writeln!(lock(&self.err), "done: {}", Value::Object(meta))?;
                }
                Ok(())
            }
            DomainEvent::Error(descriptor) => {
                writeln!(lock(&self.out))?;
                writeln!(lock(&self.err), "error: {}", Value::Object(descriptor))
            }
        }
    }
}

impl<O, E> EventSink for TerminalSink<O, E>
where
    O: Write + Send,
    E: Write + Send,
{
    fn emit(&self, event: DomainEvent) {
        if let Err(e) = self.write(event) {
            tracing::debug!(error = %e, "Failed to write event to terminal");
        }
    }
}
