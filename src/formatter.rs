//! Log formatting that stamps each line with the simulation tick and clock.
//!
//! The game loop publishes its progress through [`record_tick`]; every event logged
//! afterwards carries that tick, which keeps logs from a replayed seed comparable.

use std::fmt;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use time::macros::format_description;
use time::{format_description::FormatItem, OffsetDateTime};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields, FormattedFields};
use tracing_subscriber::registry::LookupSpan;

static TICK: AtomicU64 = AtomicU64::new(0);
/// Bits of the simulated clock, in seconds.
static CLOCK_BITS: AtomicU32 = AtomicU32::new(0);

const WALL_CLOCK_FORMAT: &[FormatItem<'static>] = format_description!("[hour]:[minute]:[second].[subsecond digits:3]");

/// Publishes the tick that just finished and the simulated time it ended at.
pub fn record_tick(tick: u64, clock: f32) {
    TICK.store(tick, Ordering::Relaxed);
    CLOCK_BITS.store(clock.to_bits(), Ordering::Relaxed);
}

pub fn current_tick() -> u64 {
    TICK.load(Ordering::Relaxed)
}

pub fn current_clock() -> f32 {
    f32::from_bits(CLOCK_BITS.load(Ordering::Relaxed))
}

/// `HH:MM:SS.mmm #tick @clock LEVEL spans: target: fields`
pub struct SimFormatter;

impl<S, N> FormatEvent<S, N> for SimFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(&self, ctx: &FmtContext<'_, S, N>, mut writer: Writer<'_>, event: &Event<'_>) -> fmt::Result {
        let meta = event.metadata();
        let ansi = writer.has_ansi_escapes();

        let wall = OffsetDateTime::now_utc()
            .format(&WALL_CLOCK_FORMAT)
            .map_err(|_| fmt::Error)?;
        let stamp = format!("{wall} #{:<6} @{:>8.3}s", current_tick(), current_clock());
        styled(&mut writer, ansi, "2", stamp)?;
        writer.write_char(' ')?;

        let (color, label) = level_style(meta.level());
        styled(&mut writer, ansi, color, label)?;
        writer.write_char(' ')?;

        if let Some(scope) = ctx.event_scope() {
            for span in scope.from_root() {
                styled(&mut writer, ansi, "1", span.metadata().name())?;
                let ext = span.extensions();
                if let Some(fields) = ext.get::<FormattedFields<N>>() {
                    if !fields.is_empty() {
                        write!(writer, "{{{fields}}}")?;
                    }
                }
                writer.write_str(": ")?;
            }
        }

        styled(&mut writer, ansi, "2", format_args!("{}:", meta.target()))?;
        writer.write_char(' ')?;
        ctx.format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

fn level_style(level: &Level) -> (&'static str, &'static str) {
    match *level {
        Level::TRACE => ("35", "TRACE"),
        Level::DEBUG => ("34", "DEBUG"),
        Level::INFO => ("32", " INFO"),
        Level::WARN => ("33", " WARN"),
        Level::ERROR => ("31", "ERROR"),
    }
}

/// Writes `value` wrapped in the SGR code when ANSI output is enabled.
fn styled(writer: &mut Writer<'_>, ansi: bool, sgr: &str, value: impl fmt::Display) -> fmt::Result {
    if ansi {
        write!(writer, "\x1b[{sgr}m{value}\x1b[0m")
    } else {
        write!(writer, "{value}")
    }
}
