use std::fs::File;
use std::io::{self, IsTerminal, Write};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use anyhow::{Context, Result};
use chrono::Local;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::{
    EnvFilter,
    Layer, // for .with_filter() on the terminal layer
    fmt::{
        FmtContext, MakeWriter,
        format::{FormatEvent, FormatFields, Writer},
    },
    layer::SubscriberExt,
    registry::LookupSpan,
    reload,
    util::SubscriberInitExt,
};

pub const DEFAULT_FILTER: &str = "info";

// --- Formatter ---

/// `time LEVEL target: fields`, coloured only on a terminal.
struct CliFmt;

impl<S, N> FormatEvent<S, N> for CliFmt
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let meta = event.metadata();
        let ansi = writer.has_ansi_escapes();
        let paint = |code: &'static str| if ansi { code } else { "" };

        write!(
            writer,
            "{}{}{} ",
            paint("\x1b[2m"),
            Local::now().format("%H:%M:%S%.3f"),
            paint("\x1b[0m")
        )?;

        let colour = match *meta.level() {
            Level::ERROR => "\x1b[1;31m",
            Level::WARN => "\x1b[1;33m",
            Level::INFO => "\x1b[1;32m",
            Level::DEBUG => "\x1b[1;34m",
            Level::TRACE => "\x1b[1;35m",
        };
        write!(writer, "{}{:>5}{} ", paint(colour), meta.level(), paint("\x1b[0m"))?;

        // crate name only: solar_http::client -> solar_http
        let target = meta.target().split("::").next().unwrap_or_default();
        write!(writer, "{}{target}:{} ", paint("\x1b[36m"), paint("\x1b[0m"))?;

        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

// --- Late-bound file writer ---

/// Writer that discards everything until a file is attached.
#[derive(Clone)]
struct FileSlot(Arc<Mutex<Option<File>>>);

struct SlotWriter<'a>(MutexGuard<'a, Option<File>>);

impl Write for SlotWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match &mut *self.0 {
            Some(f) => f.write(buf),
            None => Ok(buf.len()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut *self.0 {
            Some(f) => f.flush(),
            None => Ok(()),
        }
    }
}

impl<'a> MakeWriter<'a> for FileSlot {
    type Writer = SlotWriter<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        SlotWriter(self.0.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

// --- Handles ---

type LevelHandle = Box<dyn Fn(EnvFilter) -> Result<()> + Send + Sync>;

static LEVEL: OnceLock<LevelHandle> = OnceLock::new();
static TERMINAL: OnceLock<LevelHandle> = OnceLock::new();
static FILE_SLOT: OnceLock<Arc<Mutex<Option<File>>>> = OnceLock::new();

fn store<S>(cell: &OnceLock<LevelHandle>, handle: reload::Handle<EnvFilter, S>)
where
    S: Subscriber + Send + Sync + 'static,
{
    let _ = cell.set(Box::new(move |filter| {
        handle
            .reload(filter)
            .context("log filter reload failed")
    }));
}

fn reload_with(cell: &OnceLock<LevelHandle>, filter: EnvFilter) -> Result<()> {
    match cell.get() {
        Some(reload) => reload(filter),
        None => anyhow::bail!("logging not yet initialized"),
    }
}

// --- Public API ---

/// Installs the global subscriber: a reloadable level filter over a terminal
/// layer (on stderr, leaving stdout to command output) and a file layer that
/// stays silent until [`enable_file_logging`].
///
/// `RUST_LOG` wins over [`DEFAULT_FILTER`] at startup; [`set_log_level`]
/// wins over both afterwards. Calling this twice is harmless.
pub fn init_logging() {
    let file_inner: Arc<Mutex<Option<File>>> = Arc::new(Mutex::new(None));
    let _ = FILE_SLOT.set(file_inner.clone());

    let initial = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let (level_filter, level_handle) = reload::Layer::new(initial);
    // terminal gate: "trace" lets the global level through, "off" mutes it
    let (terminal_gate, terminal_handle) = reload::Layer::new(EnvFilter::new("trace"));

    let terminal_layer = tracing_subscriber::fmt::layer()
        .event_format(CliFmt)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_filter(terminal_gate);

    let file_layer = tracing_subscriber::fmt::layer()
        .event_format(CliFmt)
        .with_ansi(false)
        .with_writer(FileSlot(file_inner));

    if tracing_subscriber::registry()
        .with(level_filter)
        .with(terminal_layer)
        .with(file_layer)
        .try_init()
        .is_ok()
    {
        store(&LEVEL, level_handle);
        store(&TERMINAL, terminal_handle);
    }
}

/// Replaces the active filter. Accepts a bare level or any `EnvFilter`
/// directive such as `info,solar_http=debug`.
pub fn set_log_level(level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(level)
        .with_context(|| format!("invalid log level '{level}'"))?;
    reload_with(&LEVEL, filter)
}

/// Mutes or restores terminal output; file logging is unaffected.
pub fn set_terminal_enabled(enabled: bool) -> Result<()> {
    let filter = if enabled {
        EnvFilter::new("trace")
    } else {
        EnvFilter::new("off")
    };
    reload_with(&TERMINAL, filter)
}

/// Appends log records to `path`, replacing any file already attached.
/// The parent directory must exist.
pub fn enable_file_logging(path: &Path) -> Result<()> {
    let file = File::options()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("cannot open log file '{}'", path.display()))?;

    let slot = FILE_SLOT
        .get()
        .context("logging not yet initialized")?;
    *slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(file);
    Ok(())
}
