// SPDX-License-Identifier: MIT
//
// rawterm — drive the terminal layer from the command line.
//
//   keys     echo decoded keypresses until `q`, Ctrl-C, or a count
//   palette  paint the 256-color palette as one frame, then wait for a key
//   styles   print a styled sample (plain text when stdout is piped)
//
// Logging never writes to the terminal being driven. It is off unless
// `--log-file` names a file; `RAWTERM_LOG` sets the filter.
//
// Raw mode output has no post-processing, so everything printed while a
// guard is held spells out `\r\n`.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use rawterm_tty::color::Color;
use rawterm_tty::grid::Grid;
use rawterm_tty::input::{Key, KeyReader};
use rawterm_tty::source::StdinSource;
use rawterm_tty::style::{Style, StyledText};
use rawterm_tty::terminal::Terminal;

// ─── CLI ────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "rawterm")]
#[command(about = "Raw-mode terminal driver: decode keys, paint styled frames")]
#[command(version)]
struct Cli {
    /// Write diagnostics to this file (filter with RAWTERM_LOG)
    #[arg(long, global = true, env = "RAWTERM_LOG_FILE")]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Commands {
    /// Echo decoded keypresses until `q` or Ctrl-C
    Keys {
        /// Stop after this many keys
        #[arg(long)]
        count: Option<usize>,
    },

    /// Render the 256-color palette, then wait for a key
    Palette,

    /// Print a styled text sample
    Styles,
}

// ─── Logging ────────────────────────────────────────────────────────────────

const LOG_FILTER_ENV: &str = "RAWTERM_LOG";

fn init_logging(path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("cannot open log file {}", path.display()))?;
    let filter =
        EnvFilter::try_from_env(LOG_FILTER_ENV).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow!("cannot install log subscriber: {e}"))
}

// ─── Commands ───────────────────────────────────────────────────────────────

/// Runs [`Terminal::cleanup`] however `main` exits.
struct Restore<'t>(&'t Terminal);

impl Drop for Restore<'_> {
    fn drop(&mut self) {
        self.0.cleanup();
    }
}

fn is_quit(key: &Key) -> bool {
    matches!(key, Key::Control('c')) || matches!(key, Key::Char(s) if s == "q")
}

/// One echo-loop line: the key's name, then its structure.
fn key_line(key: &Key) -> StyledText {
    StyledText::new()
        .bold()
        .fg(Color::GREEN)
        .text(key.to_string().escape_debug().to_string())
        .reset()
        .fg(Color::LIGHT_BLACK)
        .text(format!("  {key:?}"))
        .reset()
        .text("\r\n")
}

fn keys(term: &Terminal, count: Option<usize>) -> Result<()> {
    let _raw = term
        .enter_raw_mode()
        .context("reading keys needs an interactive terminal")?;
    let mut reader = KeyReader::new(StdinSource::new());

    term.print(
        &StyledText::new()
            .inverse()
            .text(" press keys; q or C-c quits ")
            .reset()
            .text("\r\n"),
    )?;
    term.flush()?;

    let mut seen = 0;
    while count.is_none_or(|n| seen < n) {
        let key = reader.read_key(term)?;
        seen += 1;
        term.print(&key_line(&key))?;
        term.flush()?;
        if is_quit(&key) {
            break;
        }
    }

    info!(seen, "key loop finished");
    Ok(())
}

/// Width of one palette swatch: three digits and a gap.
const SWATCH: u16 = 4;
const SWATCHES_PER_ROW: u16 = 16;

/// Whether dark text reads better on palette entry `i`.
fn is_light(i: u8) -> bool {
    match i {
        0..=15 => matches!(i, 3 | 7 | 10 | 11 | 14 | 15),
        16..=231 => {
            let n = i - 16;
            let (r, g, b) = (n / 36, n / 6 % 6, n % 6);
            r * 3 + g * 6 + b > 20
        }
        _ => i >= 244,
    }
}

/// The palette frame: a title row, a blank row, then 16 swatches per row.
fn palette_grid(cols: u16, rows: u16) -> Grid {
    let mut grid = Grid::new(cols, rows);
    grid.put_str(0, 0, "256-color palette (any key exits)", Style::blank().bold());

    for i in 0..=u8::MAX {
        let x = u16::from(i) % SWATCHES_PER_ROW * SWATCH;
        let y = 2 + u16::from(i) / SWATCHES_PER_ROW;
        let text = if is_light(i) { Color::BLACK } else { Color::WHITE };
        let style = Style::blank().fg(text).bg(Color::index(i));
        grid.put_str(x, y, &format!("{i:>3} "), style);
    }
    grid
}

fn palette(term: &Terminal) -> Result<()> {
    let size = term.size();
    debug!(cols = size.cols, rows = size.rows, "painting palette");

    let _raw = term
        .enter_raw_mode()
        .context("the palette needs an interactive terminal")?;
    term.hide_cursor()?;
    term.clear_screen()?;
    term.render(&palette_grid(size.cols, size.rows))?;

    let key = KeyReader::new(StdinSource::new()).read_key(term)?;
    debug!(%key, "palette dismissed");
    term.print(&StyledText::new().text("\r\n"))?;
    Ok(())
}

fn styles_sample() -> Vec<StyledText> {
    let attrs = StyledText::new()
        .bold()
        .text("bold")
        .reset()
        .text(" ")
        .underlined()
        .text("underlined")
        .reset()
        .text(" ")
        .blink()
        .text("blink")
        .reset()
        .text(" ")
        .inverse()
        .text("inverse")
        .reset()
        .text(" [")
        .hidden()
        .text("hidden")
        .reset()
        .text("]");

    let base = [
        ("black", Color::BLACK),
        ("red", Color::RED),
        ("green", Color::GREEN),
        ("yellow", Color::YELLOW),
        ("blue", Color::BLUE),
        ("magenta", Color::MAGENTA),
        ("cyan", Color::CYAN),
        ("white", Color::WHITE),
    ];
    let mut colors = StyledText::new();
    for (name, color) in base {
        colors = colors.fg(color).text(name).reset().text(" ");
    }

    let extended = StyledText::new()
        .fg(Color::index(208))
        .bg(Color::index(236))
        .text(" 256-color ")
        .reset();

    vec![attrs, colors, extended]
}

fn styles(term: &Terminal) -> Result<()> {
    for line in styles_sample() {
        term.print_line(&line)?;
    }
    term.flush()?;
    Ok(())
}

// ─── Entry point ────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    if let Some(path) = &cli.log_file {
        init_logging(path)?;
    }
    info!(command = ?cli.command, "starting");

    let term = Terminal::stdio();
    let _restore = Restore(&term);

    match cli.command {
        Commands::Keys { count } => keys(&term, count),
        Commands::Palette => palette(&term),
        Commands::Styles => styles(&term),
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use rawterm_tty::style::strip_styles;

    // ── CLI ───────────────────────────────────────────────────────────────

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_keys_with_count() {
        let cli = Cli::try_parse_from(["rawterm", "keys", "--count", "3"]).unwrap();
        assert_eq!(cli.command, Commands::Keys { count: Some(3) });
    }

    #[test]
    fn log_file_is_global() {
        let cli = Cli::try_parse_from(["rawterm", "styles", "--log-file", "/tmp/x.log"]).unwrap();
        assert_eq!(cli.log_file, Some(PathBuf::from("/tmp/x.log")));
        assert_eq!(cli.command, Commands::Styles);
    }

    #[test]
    fn subcommand_is_required() {
        assert!(Cli::try_parse_from(["rawterm"]).is_err());
    }

    // ── keys ──────────────────────────────────────────────────────────────

    #[test]
    fn quit_keys() {
        assert!(is_quit(&Key::Char("q".into())));
        assert!(is_quit(&Key::Control('c')));
        assert!(!is_quit(&Key::Char("Q".into())));
        assert!(!is_quit(&Key::Escape));
    }

    #[test]
    fn key_line_names_the_key() {
        assert_eq!(strip_styles(&key_line(&Key::Escape)), "escape  Escape\r\n");
        assert_eq!(
            strip_styles(&key_line(&Key::Char("\x1b[99~".into()))),
            "\\u{1b}[99~  Char(\"\\u{1b}[99~\")\r\n"
        );
    }

    // ── palette ───────────────────────────────────────────────────────────

    #[test]
    fn palette_places_every_swatch() {
        let grid = palette_grid(64, 18);
        let first = grid.get(0, 2).unwrap();
        assert_eq!(first.ch, " ");
        assert_eq!(first.style.background, Color::index(0));
        let last = grid.get(63, 17).unwrap();
        assert_eq!(last.style.background, Color::index(255));
        assert_eq!(grid.get(2, 17).unwrap().ch, "0");
    }

    #[test]
    fn palette_clips_to_small_terminals() {
        let grid = palette_grid(10, 3);
        assert_eq!(grid.cols(), 10);
        assert_eq!(grid.get(2, 2).unwrap().ch, "0");
    }

    #[test]
    fn light_swatches_get_dark_text() {
        assert!(is_light(15));
        assert!(!is_light(0));
        assert!(is_light(231));
        assert!(!is_light(16));
        assert!(is_light(255));
        assert!(!is_light(232));
    }

    // ── styles ────────────────────────────────────────────────────────────

    #[test]
    fn styles_sample_reads_as_plain_text() {
        let plain: Vec<String> = styles_sample().iter().map(strip_styles).collect();
        assert_eq!(plain[0], "bold underlined blink inverse [hidden]");
        assert!(plain[1].starts_with("black red green"));
        assert_eq!(plain[2], " 256-color ");
    }
}
