use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use bat::PrettyPrinter;
use console::{measure_text_width, style, Term};

/// Refreshes per second for the live view.
pub const LIVE_REFRESH_PER_SECOND: u32 = 4;

/// Destination for the accumulated response text.
///
/// `render` is called with the whole buffer each time it changes; the
/// buffer only ever grows by appending within one stream. `tick` is called
/// for every other line pulled from the stream.
pub trait OutputSink {
    fn render(&mut self, buffer: &str) -> Result<()>;
    fn tick(&mut self, _buffer: &str) -> Result<()> {
        Ok(())
    }
    fn finalize(&mut self, buffer: &str) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Live,
    Raw,
}

impl OutputMode {
    pub fn select(raw: bool, output: Option<&Path>, interactive: bool) -> Self {
        if raw || output.is_some() || !interactive {
            OutputMode::Raw
        } else {
            OutputMode::Live
        }
    }

    /// Select against the real stdout.
    pub fn detect(raw: bool, output: Option<&Path>) -> Self {
        Self::select(raw, output, Term::stdout().is_term())
    }
}

/// Build the sink for `mode`, writing to stdout.
pub fn stdout_sink(mode: OutputMode, output: Option<PathBuf>) -> Box<dyn OutputSink> {
    match mode {
        OutputMode::Live => Box::new(LiveSink::new(Term::stdout())),
        OutputMode::Raw => Box::new(RawSink::new(io::stdout(), output)),
    }
}

/// Writes each newly appended slice of the buffer as-is.
pub struct RawSink<W: Write> {
    out: W,
    emitted: usize,
    output_file: Option<PathBuf>,
}

impl<W: Write> RawSink<W> {
    pub fn new(out: W, output_file: Option<PathBuf>) -> Self {
        Self {
            out,
            emitted: 0,
            output_file,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> OutputSink for RawSink<W> {
    fn render(&mut self, buffer: &str) -> Result<()> {
        if let Some(delta) = buffer.get(self.emitted..) {
            if !delta.is_empty() {
                self.out.write_all(delta.as_bytes())?;
                self.out.flush()?;
            }
        }
        self.emitted = buffer.len();
        Ok(())
    }

    fn finalize(&mut self, buffer: &str) -> Result<()> {
        self.render(buffer)?;
        writeln!(self.out)?;
        self.out.flush()?;

        if let Some(path) = &self.output_file {
            fs::write(path, buffer)
                .with_context(|| format!("failed to write output to {}", path.display()))?;
            Term::stderr().write_line(&format!(
                "{}",
                style(format!("Output saved to {}", path.display())).dim()
            ))?;
        }
        Ok(())
    }
}

/// Re-renders the full buffer as formatted markdown in place.
pub struct LiveSink {
    term: Term,
    throttle: Throttle,
    drawn_lines: usize,
    dirty: bool,
}

impl LiveSink {
    pub fn new(term: Term) -> Self {
        Self {
            term,
            throttle: Throttle::per_second(LIVE_REFRESH_PER_SECOND),
            drawn_lines: 0,
            dirty: false,
        }
    }

    fn draw(&mut self, buffer: &str) -> Result<()> {
        let columns = self.term.size().1 as usize;
        let mut rendered = render_markdown(buffer, columns)?;
        if !rendered.ends_with('\n') {
            rendered.push('\n');
        }

        self.term.clear_last_lines(self.drawn_lines)?;
        self.term.write_str(&rendered)?;
        self.term.flush()?;

        self.drawn_lines = rendered_height(&rendered, columns);
        self.dirty = false;
        Ok(())
    }

    fn render_at(&mut self, buffer: &str, now: Instant) -> Result<()> {
        self.dirty = true;
        self.tick_at(buffer, now)
    }

    fn tick_at(&mut self, buffer: &str, now: Instant) -> Result<()> {
        if self.dirty && self.throttle.ready(now) {
            self.draw(buffer)?;
        }
        Ok(())
    }
}

impl OutputSink for LiveSink {
    fn render(&mut self, buffer: &str) -> Result<()> {
        self.render_at(buffer, Instant::now())
    }

    fn tick(&mut self, buffer: &str) -> Result<()> {
        self.tick_at(buffer, Instant::now())
    }

    fn finalize(&mut self, buffer: &str) -> Result<()> {
        if self.dirty {
            self.draw(buffer)?;
        }
        Ok(())
    }
}

fn render_markdown(buffer: &str, columns: usize) -> Result<String> {
    let mut rendered = String::new();
    PrettyPrinter::new()
        .input_from_bytes(buffer.as_bytes())
        .language("markdown")
        .term_width(columns.max(1))
        .print_with_writer(Some(&mut rendered))
        .map_err(|e| anyhow!("failed to render markdown: {}", e))?;
    Ok(rendered)
}

/// Terminal rows taken by `text` once soft-wrapped at `columns`.
pub fn rendered_height(text: &str, columns: usize) -> usize {
    let columns = columns.max(1);
    text.lines()
        .map(|line| measure_text_width(line).div_ceil(columns).max(1))
        .sum()
}

/// Coalesces redraw requests down to a fixed rate.
#[derive(Debug)]
pub struct Throttle {
    interval: Duration,
    last: Option<Instant>,
}

impl Throttle {
    pub fn per_second(rate: u32) -> Self {
        Self {
            interval: Duration::from_secs(1) / rate.max(1),
            last: None,
        }
    }

    pub fn ready(&mut self, now: Instant) -> bool {
        match self.last {
            Some(last) if now.saturating_duration_since(last) < self.interval => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }
}
