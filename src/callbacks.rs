/*!
Diagnostic channels used while a model is evaluated.

- [`Messages`] is the optional text stream a density writes warnings to.
- [`Logger`] is a leveled sink; [`Diagnostics::Logger`] asks the evaluator to
  capture the density's messages and forward them to it.
- [`Interrupt`] is polled by long-running diagnostics.
- [`Writer`] receives names, values and free-form messages.

All callbacks run synchronously inside the evaluation call that invokes them.
*/

use std::cell::RefCell;
use std::fmt;

/// Optional message stream handed to a density.
///
/// Writing to an empty `Messages` is a no-op, so densities may always
/// `write!` into it.
#[derive(Default)]
pub struct Messages<'a>(Option<&'a mut dyn fmt::Write>);

impl<'a> Messages<'a> {
    /// A stream that discards everything.
    pub fn none() -> Self {
        Messages(None)
    }

    /// A stream that appends to `out`.
    pub fn to(out: &'a mut dyn fmt::Write) -> Self {
        Messages(Some(out))
    }

    /// Whether anything written will be kept.
    pub fn is_active(&self) -> bool {
        self.0.is_some()
    }

    /// Borrows this stream for a shorter call.
    pub fn reborrow(&mut self) -> Messages<'_> {
        Messages(self.0.as_mut().map(|w| &mut **w as &mut dyn fmt::Write))
    }
}

impl fmt::Write for Messages<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        match self.0.as_mut() {
            Some(w) => w.write_str(s),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for Messages<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Messages").field(&self.is_active()).finish()
    }
}

/// Leveled text sink.
pub trait Logger {
    fn debug(&self, message: &str);
    fn info(&self, message: &str);
    fn warn(&self, message: &str);
    fn error(&self, message: &str);
    fn fatal(&self, message: &str);
}

/// Where an evaluator sends the text a density produces.
#[derive(Debug)]
pub enum Diagnostics<'a> {
    /// Pass the stream straight through to the density.
    Stream(Messages<'a>),
    /// Capture the density's messages and forward them to the logger at info
    /// level once evaluation finishes, whether it succeeded or not.
    Logger(&'a dyn Logger),
}

impl Default for Diagnostics<'_> {
    fn default() -> Self {
        Diagnostics::Stream(Messages::none())
    }
}

impl<'a> From<Messages<'a>> for Diagnostics<'a> {
    fn from(msgs: Messages<'a>) -> Self {
        Diagnostics::Stream(msgs)
    }
}

impl fmt::Debug for dyn Logger + '_ {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Logger")
    }
}

/// Forwards to the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogLogger;

impl Logger for LogLogger {
    fn debug(&self, message: &str) {
        log::debug!("{}", message);
    }

    fn info(&self, message: &str) {
        log::info!("{}", message);
    }

    fn warn(&self, message: &str) {
        log::warn!("{}", message);
    }

    fn error(&self, message: &str) {
        log::error!("{}", message);
    }

    fn fatal(&self, message: &str) {
        log::error!("FATAL: {}", message);
    }
}

/// Drops every message.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLogger;

impl Logger for NoopLogger {
    fn debug(&self, _message: &str) {}
    fn info(&self, _message: &str) {}
    fn warn(&self, _message: &str) {}
    fn error(&self, _message: &str) {}
    fn fatal(&self, _message: &str) {}
}

/// Appends `"[level] message"` lines to a buffer.
#[derive(Debug, Default)]
pub struct StreamLogger<W: fmt::Write> {
    out: RefCell<W>,
}

impl<W: fmt::Write> StreamLogger<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: RefCell::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }

    fn emit(&self, level: &str, message: &str) {
        // A failing sink must not turn into an evaluation error.
        let _ = writeln!(self.out.borrow_mut(), "[{}] {}", level, message);
    }
}

impl<W: fmt::Write> Logger for StreamLogger<W> {
    fn debug(&self, message: &str) {
        self.emit("debug", message);
    }

    fn info(&self, message: &str) {
        self.emit("info", message);
    }

    fn warn(&self, message: &str) {
        self.emit("warn", message);
    }

    fn error(&self, message: &str) {
        self.emit("error", message);
    }

    fn fatal(&self, message: &str) {
        self.emit("fatal", message);
    }
}

/// Callback polled between units of work; returning `true` requests a stop.
pub trait Interrupt {
    fn check(&self) -> bool;
}

/// Never interrupts.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoInterrupt;

impl Interrupt for NoInterrupt {
    fn check(&self) -> bool {
        false
    }
}

impl<F: Fn() -> bool> Interrupt for F {
    fn check(&self) -> bool {
        self()
    }
}

/// Receives tabular output: a header of names, rows of values, blank
/// separators and free-form messages.
pub trait Writer {
    fn names(&mut self, names: &[String]);
    fn values(&mut self, values: &[f64]);
    fn blank(&mut self);
    fn message(&mut self, message: &str);
}

/// Keeps everything it is given in memory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryWriter {
    pub names: Vec<String>,
    pub rows: Vec<Vec<f64>>,
    pub messages: Vec<String>,
}

impl Writer for MemoryWriter {
    fn names(&mut self, names: &[String]) {
        self.names = names.to_vec();
    }

    fn values(&mut self, values: &[f64]) {
        self.rows.push(values.to_vec());
    }

    fn blank(&mut self) {
        self.messages.push(String::new());
    }

    fn message(&mut self, message: &str) {
        self.messages.push(message.to_owned());
    }
}
