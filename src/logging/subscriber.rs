//! Tracing subscriber setup: console formatter, file layer, and initialisation.
use std::fs;
use std::io::Write as _;
use std::path::Path;
use std::sync::Mutex;

use tracing::Level;

use super::utils::{header_timestamp, line_timestamp, log_file_path, strip_ansi};

/// Target used by [`Logger::stage`](super::Logger::stage).
pub(super) const STAGE_TARGET: &str = "dotsync::stage";
/// Target used by [`Logger::dry_run`](super::Logger::dry_run).
pub(super) const DRY_RUN_TARGET: &str = "dotsync::dry_run";

/// Environment variable holding an optional console filter directive.
const FILTER_ENV: &str = "DOTSYNC_LOG";

/// How a single event is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Stage,
    DryRun,
    Error,
    Warn,
    Info,
    Debug,
}

/// Split an event into its [`Kind`] and `message` field.
fn decode(event: &tracing::Event<'_>) -> (Kind, String) {
    #[derive(Default)]
    struct Message(String);

    impl tracing::field::Visit for Message {
        fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
            if field.name() == "message" {
                self.0 = format!("{value:?}");
            }
        }

        fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
            if field.name() == "message" {
                self.0 = value.to_string();
            }
        }
    }

    let mut message = Message::default();
    event.record(&mut message);

    let metadata = event.metadata();
    let kind = match (*metadata.level(), metadata.target()) {
        (Level::ERROR, _) => Kind::Error,
        (Level::WARN, _) => Kind::Warn,
        (Level::INFO, STAGE_TARGET) => Kind::Stage,
        (Level::INFO, DRY_RUN_TARGET) => Kind::DryRun,
        (Level::INFO, _) => Kind::Info,
        _ => Kind::Debug,
    };
    (kind, message.0)
}

/// A [`tracing_subscriber::Layer`] appending every event, debug included, to
/// the per-command log file. Lines carry a UTC time and no ANSI codes.
#[derive(Debug)]
pub(super) struct FileLayer {
    file: Mutex<fs::File>,
}

impl FileLayer {
    /// Truncate `path`, write a run header, and return a layer appending to it.
    ///
    /// Returns `None` if the file cannot be written.
    pub(super) fn create(path: &Path) -> Option<Self> {
        let version =
            option_env!("DOTSYNC_VERSION").unwrap_or(concat!("dev-", env!("CARGO_PKG_VERSION")));
        let rule = "-".repeat(48);
        let header = format!("{rule}\ndotsync {version} {}\n{rule}\n", header_timestamp());
        fs::write(path, header).ok()?;
        let file = fs::OpenOptions::new().append(true).open(path).ok()?;
        Some(Self {
            file: Mutex::new(file),
        })
    }
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for FileLayer {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        let (kind, msg) = decode(event);
        let msg = strip_ansi(&msg);
        let tag = match kind {
            Kind::Stage => "==> ",
            Kind::DryRun => "    [dry run] ",
            Kind::Error => "    [error] ",
            Kind::Warn => "    [warn] ",
            Kind::Debug => "    [debug] ",
            Kind::Info => "    ",
        };
        if let Ok(mut f) = self.file.lock() {
            writeln!(f, "[{}] {tag}{msg}", line_timestamp()).ok();
        }
    }
}

/// Console output: coloured stage headers and level tags, indented entries.
struct ConsoleFormatter;

impl<S, N> tracing_subscriber::fmt::FormatEvent<S, N> for ConsoleFormatter
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    N: for<'a> tracing_subscriber::fmt::FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &tracing_subscriber::fmt::FmtContext<'_, S, N>,
        mut writer: tracing_subscriber::fmt::format::Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let (kind, msg) = decode(event);
        match kind {
            Kind::Stage => writeln!(writer, "\x1b[1;36m==>\x1b[0m \x1b[1m{msg}\x1b[0m"),
            Kind::DryRun => writeln!(writer, "  \x1b[35m[dry run]\x1b[0m {msg}"),
            Kind::Error => writeln!(writer, "\x1b[31merror:\x1b[0m {msg}"),
            Kind::Warn => writeln!(writer, "\x1b[33mwarning:\x1b[0m {msg}"),
            Kind::Info => writeln!(writer, "  {msg}"),
            Kind::Debug => writeln!(writer, "  \x1b[2m{msg}\x1b[0m"),
        }
    }
}

/// Install the global [`tracing`] subscriber.
///
/// The console shows `info` and above (`debug` with `verbose`), unless
/// `DOTSYNC_LOG` holds a filter directive. Warnings and errors go to stderr.
/// Every event reaches `<command>.log` in the cache directory. Call once at
/// startup, before any logging.
pub fn init_subscriber(verbose: bool, command: &str) {
    use tracing_subscriber::fmt::writer::MakeWriterExt as _;
    use tracing_subscriber::{
        EnvFilter, Layer as _, filter::LevelFilter, fmt, layer::SubscriberExt as _,
        util::SubscriberInitExt as _,
    };

    let default_level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let console_filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .with_env_var(FILTER_ENV)
        .from_env_lossy();

    let make_writer = std::io::stderr
        .with_max_level(Level::WARN)
        .and(std::io::stdout.with_min_level(Level::INFO));

    let console_layer = fmt::layer()
        .event_format(ConsoleFormatter)
        .with_writer(make_writer)
        .with_filter(console_filter);

    let file_layer = log_file_path(command)
        .and_then(|path| FileLayer::create(&path))
        .map(|l| l.with_filter(LevelFilter::DEBUG));

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();
}
