// {{{ Copyright (c) Paul R. Tagliamonte <paultag@debian.org>, 2024
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in
// all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN
// THE SOFTWARE. }}}

//! The `output` module carries diagnostics from the engine to the caller.
//!
//! The engine never prints. Everything it has to say is delivered as an
//! [Event] to an injected [Sink]; the default sink forwards events to the
//! [log] crate facade so embedding applications get the usual `env_logger`
//! style behavior for free.
//!
//! [Output] also counts warnings and errors. Validation pipelines record
//! problems as they walk the package set and keep going; a session is valid
//! if and only if the error counter did not move. See the `validate()`
//! functions in [crate::install] and [crate::remove].

use std::cell::Cell;

/// Severity of an [Event].
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    /// Progress and diagnostics; not shown by default.
    Debug,

    /// Informational messages ("removing foo").
    Info,

    /// The operation continues, but the caller should know about this.
    Warning,

    /// The operation cannot succeed. Validation keeps scanning so that all
    /// errors of a package set are reported in one pass.
    Error,

    /// The operation must stop immediately.
    Fatal,
}

impl Level {
    /// Return the [Level] as a borrowed string ref.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Fatal => "fatal",
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One diagnostic emitted by the engine.
#[derive(Clone, Debug)]
pub struct Event {
    /// Severity of the event.
    pub level: Level,

    /// Engine component that emitted the event (`"validate-installation"`,
    /// `"remove-package"`, ...).
    pub module: String,

    /// Name of the package the event is about, when there is one.
    pub package: Option<String>,

    /// Short machine-readable tag for the action being performed.
    pub action: String,

    /// Human readable message.
    pub message: String,
}

/// Destination for [Event]s. Implemented by the embedding application; the
/// crate ships [LogSink] as a reasonable default.
pub trait Sink {
    /// Deliver one event. Must not panic.
    fn emit(&self, event: &Event);
}

/// A [Sink] forwarding every event to the [log] crate facade.
#[derive(Copy, Clone, Debug, Default)]
pub struct LogSink;

impl Sink for LogSink {
    fn emit(&self, event: &Event) {
        let level = match event.level {
            Level::Debug => log::Level::Debug,
            Level::Info => log::Level::Info,
            Level::Warning => log::Level::Warn,
            Level::Error | Level::Fatal => log::Level::Error,
        };
        match &event.package {
            Some(package) => log::log!(
                level,
                "{}: {}: package {:?}: {}",
                event.module,
                event.action,
                package,
                event.message
            ),
            None => log::log!(
                level,
                "{}: {}: {}",
                event.module,
                event.action,
                event.message
            ),
        }
    }
}

/// The injected logging sink plus the session's warning and error counters.
pub struct Output {
    sink: Box<dyn Sink>,
    warnings: Cell<u64>,
    errors: Cell<u64>,
}

impl Default for Output {
    fn default() -> Self {
        Self::new(Box::new(LogSink))
    }
}

impl Output {
    /// Create an [Output] delivering events to the given sink.
    pub fn new(sink: Box<dyn Sink>) -> Self {
        Output {
            sink,
            warnings: Cell::new(0),
            errors: Cell::new(0),
        }
    }

    /// Deliver one event, bumping the warning or error counter as
    /// appropriate for its level.
    pub fn emit(&self, event: Event) {
        match event.level {
            Level::Warning => self.warnings.set(self.warnings.get() + 1),
            Level::Error | Level::Fatal => self.errors.set(self.errors.get() + 1),
            _ => {}
        }
        self.sink.emit(&event);
    }

    /// Shorthand to emit an event from its five fields.
    pub fn log(
        &self,
        level: Level,
        module: &str,
        package: Option<&str>,
        action: &str,
        message: impl Into<String>,
    ) {
        self.emit(Event {
            level,
            module: module.to_owned(),
            package: package.map(|v| v.to_owned()),
            action: action.to_owned(),
            message: message.into(),
        });
    }

    /// Number of warnings recorded so far.
    pub fn warning_count(&self) -> u64 {
        self.warnings.get()
    }

    /// Number of errors (and fatals) recorded so far.
    pub fn error_count(&self) -> u64 {
        self.errors.get()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::{Event, Sink};
    use std::cell::RefCell;
    use std::rc::Rc;

    /// A [Sink] that records every event so tests can assert on them.
    #[derive(Clone, Default)]
    pub struct CaptureSink {
        events: Rc<RefCell<Vec<Event>>>,
    }

    impl CaptureSink {
        pub fn events(&self) -> Vec<Event> {
            self.events.borrow().clone()
        }
    }

    impl Sink for CaptureSink {
        fn emit(&self, event: &Event) {
            self.events.borrow_mut().push(event.clone());
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn counters_follow_levels() {
        let output = Output::new(Box::new(test_support::CaptureSink::default()));
        output.log(Level::Info, "test", None, "noop", "nothing to see");
        output.log(Level::Warning, "test", None, "noop", "a warning");
        output.log(Level::Error, "test", Some("foo"), "noop", "an error");
        output.log(Level::Fatal, "test", None, "noop", "a fatal");
        assert_eq!(1, output.warning_count());
        assert_eq!(2, output.error_count());
    }

    #[test]
    fn capture_sink_records() {
        let sink = test_support::CaptureSink::default();
        let output = Output::new(Box::new(sink.clone()));
        output.log(Level::Info, "test", Some("foo"), "noop", "hello");
        let events = sink.events();
        assert_eq!(1, events.len());
        assert_eq!(Some("foo".to_owned()), events[0].package);
        assert_eq!("hello", events[0].message);
    }
}

// vim: foldmethod=marker
