//! Display backends.
//!
//! - [`ConsoleDisplay`]: one line per update on stdout (or any writer)
//! - [`LogDisplay`]: updates go to the log, for headless hosts
//! - [`TerminalDisplay`]: a small ratatui panel in an inline viewport, with
//!   a companion [`TerminalIndicator`] that colours its status badge

use std::io::{self, Stdout, Write};
use std::sync::Arc;

use parking_lot::Mutex;
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::{Frame, Terminal, TerminalOptions, Viewport};
use tracing::{info, warn};

use super::{DeviceError, Indicator, Theme};
use crate::data::{SeverityBand, TraceBuffer};

const SPARKLINE_CHARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Rows used by the inline terminal panel: border, reading, trend, border.
const PANEL_HEIGHT: u16 = 4;

/// Render the last `width` readings of a trace as a sparkline.
///
/// Each trace is scaled against its own minimum and maximum, so a flat trace
/// renders as a row of the lowest bar.
pub fn sparkline(trace: &[f64], width: usize) -> String {
    if width == 0 {
        return String::new();
    }
    let mut window = TraceBuffer::new(width);
    window.extend(trace.iter().copied());
    window
        .normalized(SPARKLINE_CHARS.len() as u8)
        .into_iter()
        .map(|level| SPARKLINE_CHARS[level as usize])
        .collect()
}

/// Writes each update as a line of text.
#[derive(Debug)]
pub struct ConsoleDisplay<W: Write = Stdout> {
    out: W,
    width: usize,
    destroyed: bool,
}

impl ConsoleDisplay<Stdout> {
    pub fn stdout(width: usize) -> Self {
        Self::new(io::stdout(), width)
    }
}

impl<W: Write> ConsoleDisplay<W> {
    /// Display writing to `out`, with trend lines up to `width` characters.
    pub fn new(out: W, width: usize) -> Self {
        Self {
            out,
            width,
            destroyed: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send + std::fmt::Debug> super::Display for ConsoleDisplay<W> {
    fn display(&mut self, text: &str, trace: Option<&[f64]>) -> Result<(), DeviceError> {
        if self.destroyed {
            return Err(DeviceError::Unavailable("console display destroyed".to_string()));
        }
        match trace.filter(|t| !t.is_empty()) {
            Some(trace) => writeln!(self.out, "{}  {}", text, sparkline(trace, self.width))?,
            None => writeln!(self.out, "{}", text)?,
        }
        self.out.flush()?;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), DeviceError> {
        Ok(())
    }

    fn destroy(&mut self) -> Result<(), DeviceError> {
        if !self.destroyed {
            self.destroyed = true;
            self.out.flush()?;
        }
        Ok(())
    }
}

/// Sends each update to the log at info level.
#[derive(Debug)]
pub struct LogDisplay {
    width: usize,
}

impl LogDisplay {
    pub fn new(width: usize) -> Self {
        Self { width }
    }
}

impl super::Display for LogDisplay {
    fn display(&mut self, text: &str, trace: Option<&[f64]>) -> Result<(), DeviceError> {
        match trace.filter(|t| !t.is_empty()) {
            Some(trace) => info!(trace = %sparkline(trace, self.width), "{}", text),
            None => info!("{}", text),
        }
        Ok(())
    }

    fn clear(&mut self) -> Result<(), DeviceError> {
        Ok(())
    }

    fn destroy(&mut self) -> Result<(), DeviceError> {
        Ok(())
    }
}

/// State shared between a terminal display and its indicator.
#[derive(Debug)]
struct Screen<B: Backend> {
    terminal: Option<Terminal<B>>,
    theme: Theme,
    width: usize,
    text: String,
    trace: Vec<f64>,
    band: Option<SeverityBand>,
}

impl<B: Backend> Screen<B> {
    fn draw(&mut self) -> Result<(), DeviceError> {
        let Some(terminal) = self.terminal.as_mut() else {
            return Err(DeviceError::Unavailable("terminal display destroyed".to_string()));
        };
        let (theme, width, text, trace, band) =
            (&self.theme, self.width, &self.text, &self.trace, self.band);
        terminal.draw(|frame| {
            let area = frame.area();
            render(frame, area, theme, width, text, trace, band);
        })?;
        Ok(())
    }
}

fn render(
    frame: &mut Frame,
    area: Rect,
    theme: &Theme,
    width: usize,
    text: &str,
    trace: &[f64],
    band: Option<SeverityBand>,
) {
    let mut reading = vec![Span::styled(text.to_string(), Style::default().fg(theme.text))];
    if let Some(band) = band {
        reading.push(Span::raw("  "));
        reading.push(Span::styled(band.symbol(), theme.band_style(band)));
    }

    let inner_width = (area.width.saturating_sub(2) as usize).min(width);
    let trend = Span::styled(
        sparkline(trace, inner_width),
        Style::default().fg(theme.trace),
    );

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(theme.border_type)
        .border_style(Style::default().fg(theme.border))
        .title(Span::styled(" sensor panel ", theme.title));

    let paragraph = Paragraph::new(vec![Line::from(reading), Line::from(trend)]).block(block);
    frame.render_widget(paragraph, area);
}

/// A bordered panel drawn in an inline viewport below the cursor.
#[derive(Debug)]
pub struct TerminalDisplay<B: Backend = CrosstermBackend<Stdout>> {
    screen: Arc<Mutex<Screen<B>>>,
}

impl TerminalDisplay<CrosstermBackend<Stdout>> {
    /// Open the panel on stdout.
    pub fn stdout(theme: Theme, width: usize) -> Result<Self, DeviceError> {
        crossterm::terminal::size()
            .map_err(|e| DeviceError::Unavailable(format!("not a terminal: {}", e)))?;
        let terminal = Terminal::with_options(
            CrosstermBackend::new(io::stdout()),
            TerminalOptions {
                viewport: Viewport::Inline(PANEL_HEIGHT),
            },
        )?;
        Ok(Self::with_terminal(terminal, theme, width))
    }
}

impl<B: Backend> TerminalDisplay<B> {
    pub fn with_terminal(terminal: Terminal<B>, theme: Theme, width: usize) -> Self {
        Self {
            screen: Arc::new(Mutex::new(Screen {
                terminal: Some(terminal),
                theme,
                width,
                text: String::new(),
                trace: Vec::new(),
                band: None,
            })),
        }
    }

    /// An indicator that shows the lit band as a badge on this panel.
    pub fn indicator(&self) -> TerminalIndicator<B> {
        TerminalIndicator {
            screen: Arc::clone(&self.screen),
        }
    }
}

impl<B: Backend + Send + std::fmt::Debug> super::Display for TerminalDisplay<B> {
    fn display(&mut self, text: &str, trace: Option<&[f64]>) -> Result<(), DeviceError> {
        let mut screen = self.screen.lock();
        screen.text = text.to_string();
        screen.trace = trace.map(<[f64]>::to_vec).unwrap_or_default();
        screen.draw()
    }

    fn clear(&mut self) -> Result<(), DeviceError> {
        let mut screen = self.screen.lock();
        screen.text.clear();
        screen.trace.clear();
        match screen.terminal.as_mut() {
            Some(terminal) => Ok(terminal.clear()?),
            None => Ok(()),
        }
    }

    fn destroy(&mut self) -> Result<(), DeviceError> {
        let mut screen = self.screen.lock();
        if let Some(mut terminal) = screen.terminal.take() {
            terminal.show_cursor()?;
        }
        Ok(())
    }
}

/// Severity badge on a [`TerminalDisplay`].
#[derive(Debug)]
pub struct TerminalIndicator<B: Backend = CrosstermBackend<Stdout>> {
    screen: Arc<Mutex<Screen<B>>>,
}

impl<B: Backend> TerminalIndicator<B> {
    fn set(&mut self, band: Option<SeverityBand>) {
        let mut screen = self.screen.lock();
        if screen.band == band || screen.terminal.is_none() {
            return;
        }
        screen.band = band;
        if let Err(e) = screen.draw() {
            warn!(error = %e, "Failed to redraw indicator");
        }
    }
}

impl<B: Backend + Send + std::fmt::Debug> Indicator for TerminalIndicator<B> {
    fn light(&mut self, band: SeverityBand) {
        self.set(Some(band));
    }

    fn clear(&mut self) {
        self.set(None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::Display;
    use ratatui::backend::TestBackend;

    fn rendered(display: &TerminalDisplay<TestBackend>) -> String {
        let screen = display.screen.lock();
        let terminal = screen.terminal.as_ref().unwrap();
        terminal.backend().buffer().content().iter().map(|cell| cell.symbol()).collect()
    }

    fn terminal_display() -> TerminalDisplay<TestBackend> {
        let terminal = Terminal::new(TestBackend::new(40, PANEL_HEIGHT)).unwrap();
        TerminalDisplay::with_terminal(terminal, Theme::dark(), 16)
    }

    #[test]
    fn test_sparkline_scales_to_range() {
        assert_eq!(sparkline(&[0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0], 8), "▁▂▃▄▅▆▇█");
        assert_eq!(sparkline(&[3.0, 3.0, 3.0], 8), "▁▁▁");
        assert_eq!(sparkline(&[], 8), "");
    }

    #[test]
    fn test_sparkline_keeps_newest() {
        let trace: Vec<f64> = (0..20).map(f64::from).collect();
        let line = sparkline(&trace, 4);
        assert_eq!(line.chars().count(), 4);
        assert!(line.ends_with('█'));
    }

    #[test]
    fn test_console_display_lines() {
        let mut display = ConsoleDisplay::new(Vec::new(), 8);
        display.display("cpu: 48.3 C", Some(&[1.0, 2.0])).unwrap();
        display.display("cpu: Err", None).unwrap();
        display.destroy().unwrap();
        assert!(display.display("late", None).is_err());

        let out = String::from_utf8(display.into_inner()).unwrap();
        assert_eq!(out, "cpu: 48.3 C  ▁█\ncpu: Err\n");
    }

    #[test]
    fn test_terminal_display_renders_text_and_badge() {
        let mut display = terminal_display();
        let mut indicator = display.indicator();

        display.display("cpu: 48.3 C", Some(&[1.0, 2.0, 3.0])).unwrap();
        let screen = rendered(&display);
        assert!(screen.contains("cpu: 48.3 C"));
        assert!(!screen.contains("WARN"));

        indicator.light(SeverityBand::Warning);
        assert!(rendered(&display).contains("WARN"));

        indicator.clear();
        assert!(!rendered(&display).contains("WARN"));
    }

    #[test]
    fn test_terminal_display_destroy() {
        let mut display = terminal_display();
        let mut indicator = display.indicator();
        display.destroy().unwrap();
        display.destroy().unwrap();
        assert!(matches!(display.display("x", None), Err(DeviceError::Unavailable(_))));
        indicator.light(SeverityBand::Critical);
    }
}
