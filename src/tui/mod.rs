use crate::cli::{build_config, Cli};
use crate::controller::{self, UiCommand};
use crate::model::ViewState;
use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Wrap},
    Frame, Terminal,
};
use std::{io, time::Duration, time::Instant};
use tokio::sync::mpsc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Delay before the confidence bar fills, purely for visual effect.
const BAR_REVEAL_DELAY: Duration = Duration::from_millis(100);

/// Canned messages for the F1/F2 preset keys: one typical spam text, one
/// ordinary text.
const EXAMPLE_MESSAGES: [&str; 2] = [
    "Congratulations! You've won a $1000 gift card. Click here to claim your prize now!",
    "Hey, are we still meeting for lunch tomorrow at noon?",
];

#[derive(Default)]
struct UiState {
    input: String,
    view: ViewState,
    /// When the current result was first shown; drives the bar reveal.
    result_shown_at: Option<Instant>,
    ticks: usize,
}

impl UiState {
    fn char_count(&self) -> usize {
        self.input.chars().count()
    }

    /// Replace the input with a preset example message.
    fn load_example(&mut self, slot: usize) {
        if let Some(text) = EXAMPLE_MESSAGES.get(slot) {
            self.input = (*text).to_string();
        }
    }

    fn apply_snapshot(&mut self, next: ViewState) {
        if matches!(next, ViewState::Result(_)) && next != self.view {
            self.result_shown_at = Some(Instant::now());
        }
        self.view = next;
    }
}

pub async fn run(args: Cli) -> Result<()> {
    // Unbounded channels avoid backpressure between the UI thread and the controller.
    let (view_tx, view_rx) = mpsc::unbounded_channel::<ViewState>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();

    // TUI runs in a dedicated thread to keep all blocking I/O out of the Tokio runtime.
    let ui_handle = std::thread::spawn(move || run_threaded(view_rx, cmd_tx));

    let res = controller::run_controller(build_config(&args), view_tx, cmd_rx).await;

    let join_res = tokio::task::spawn_blocking(move || ui_handle.join()).await;
    if let Ok(joined) = join_res {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(anyhow::anyhow!("TUI thread panicked")),
        }
    }

    res
}

/// Run the TUI loop on a dedicated thread.
fn run_threaded(
    mut view_rx: UnboundedReceiver<ViewState>,
    cmd_tx: UnboundedSender<UiCommand>,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).ok();

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;
    terminal.clear().ok();

    // UiState is owned by the UI thread only; the controller pushes snapshots.
    let mut state = UiState::default();

    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now();

    let res = loop {
        // Drain snapshots without blocking to keep the UI responsive.
        while let Ok(view) = view_rx.try_recv() {
            state.apply_snapshot(view);
        }

        if last_tick.elapsed() >= tick_rate {
            state.ticks = state.ticks.wrapping_add(1);
            terminal.draw(|f| draw(f.area(), f, &state)).ok();
            last_tick = Instant::now();
        }

        // Poll input with a short timeout to avoid blocking the render loop.
        if event::poll(Duration::from_millis(10)).unwrap_or(false) {
            if let Ok(Event::Key(k)) = event::read() {
                if k.kind != KeyEventKind::Press {
                    continue;
                }
                match (k.modifiers, k.code) {
                    (KeyModifiers::CONTROL, KeyCode::Char('c')) => {
                        let _ = cmd_tx.send(UiCommand::Quit);
                        break Ok(());
                    }
                    (_, KeyCode::Esc) => {
                        state.input.clear();
                        let _ = cmd_tx.send(UiCommand::Clear);
                    }
                    (_, KeyCode::Enter) => {
                        let _ = cmd_tx.send(UiCommand::Submit(state.input.clone()));
                    }
                    (_, KeyCode::Backspace) => {
                        state.input.pop();
                    }
                    (_, KeyCode::F(n)) if (1..=2).contains(&n) => {
                        state.load_example((n - 1) as usize);
                    }
                    (m, KeyCode::Char(c)) if !m.contains(KeyModifiers::CONTROL) => {
                        state.input.push(c);
                    }
                    _ => {}
                }
            }
        }
    };

    disable_raw_mode().ok();
    let mut stdout = io::stdout();
    execute!(stdout, LeaveAlternateScreen).ok();
    res
}

/// Project the current state onto the frame. Pure function of `UiState`;
/// exactly one of the four body regions is rendered.
fn draw(area: Rect, f: &mut Frame, state: &UiState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(1),
        ])
        .split(area);

    draw_input(rows[0], f, state);

    match &state.view {
        ViewState::Initial => draw_initial(rows[1], f),
        ViewState::Loading => draw_loading(rows[1], f, state),
        ViewState::Result(result) => draw_result(rows[1], f, state, result),
        ViewState::Error { message } => draw_error(rows[1], f, message),
    }

    draw_footer(rows[2], f, state);
}

fn draw_input(area: Rect, f: &mut Frame, state: &UiState) {
    let title = format!("Message ({} chars)", state.char_count());
    let input = Paragraph::new(state.input.as_str())
        .block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(input, area);
}

fn draw_initial(area: Rect, f: &mut Frame) {
    let hint = Paragraph::new("Type an SMS message and press Enter to analyze it.")
        .style(Style::default().fg(Color::DarkGray))
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title("Ready"));
    f.render_widget(hint, area);
}

fn draw_loading(area: Rect, f: &mut Frame, state: &UiState) {
    let frame = SPINNER_FRAMES[state.ticks % SPINNER_FRAMES.len()];
    let busy = Paragraph::new(format!("{frame} Analyzing…"))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL).title("Analyzing"));
    f.render_widget(busy, area);
}

fn draw_result(
    area: Rect,
    f: &mut Frame,
    state: &UiState,
    result: &crate::model::ClassificationResult,
) {
    let (accent, icon) = if result.is_spam {
        (Color::Red, "⚠")
    } else {
        (Color::Green, "✓")
    };

    let block = Block::default().borders(Borders::ALL).title("Result");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(1),
        ])
        .split(inner);

    let badge = Line::from(Span::styled(
        format!("{icon} {}", result.prediction),
        Style::default().fg(accent).add_modifier(Modifier::BOLD),
    ));
    f.render_widget(Paragraph::new(badge), rows[0]);

    // The bar stays empty for a beat after the result lands, then fills on
    // the next tick. Cosmetic only.
    let revealed = state
        .result_shown_at
        .map(|t| t.elapsed() >= BAR_REVEAL_DELAY)
        .unwrap_or(true);
    let ratio = if revealed {
        (result.confidence / 100.0).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let bar = Gauge::default()
        .gauge_style(Style::default().fg(accent))
        .ratio(ratio)
        .label(format!("{}%", result.confidence));
    f.render_widget(bar, rows[1]);

    let verdict = Paragraph::new(result.verdict_text()).style(Style::default().fg(accent));
    f.render_widget(verdict, rows[2]);

    let accuracy = Paragraph::new(Line::from(vec![
        Span::styled("Accuracy: ", Style::default().fg(Color::Gray)),
        Span::raw(result.accuracy_text()),
    ]));
    f.render_widget(accuracy, rows[3]);

    let echoed = Paragraph::new(Line::from(vec![
        Span::styled("Analyzed: ", Style::default().fg(Color::Gray)),
        Span::raw(result.message.clone()),
    ]))
    .wrap(Wrap { trim: true });
    f.render_widget(echoed, rows[4]);
}

fn draw_error(area: Rect, f: &mut Frame, message: &str) {
    let error = Paragraph::new(message)
        .style(Style::default().fg(Color::Red))
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Red))
                .title("Error"),
        );
    f.render_widget(error, area);
}

fn draw_footer(area: Rect, f: &mut Frame, state: &UiState) {
    // Trigger label swaps to a busy caption while a request is in flight and
    // is restored on every exit path.
    let trigger = if matches!(state.view, ViewState::Loading) {
        Span::styled("Enter: Analyzing…", Style::default().fg(Color::DarkGray))
    } else {
        Span::styled("Enter: Analyze", Style::default().fg(Color::Cyan))
    };
    let hints = Line::from(vec![
        trigger,
        Span::raw("  "),
        Span::styled("Esc: Clear", Style::default().fg(Color::Gray)),
        Span::raw("  "),
        Span::styled("F1/F2: Example", Style::default().fg(Color::Gray)),
        Span::raw("  "),
        Span::styled("Ctrl+C: Quit", Style::default().fg(Color::Gray)),
    ]);
    f.render_widget(Paragraph::new(hints), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn example_keys_fill_the_input() {
        let mut state = UiState::default();
        state.load_example(0);
        assert_eq!(state.input, EXAMPLE_MESSAGES[0]);
        assert_eq!(state.char_count(), EXAMPLE_MESSAGES[0].chars().count());

        state.load_example(1);
        assert_eq!(state.input, EXAMPLE_MESSAGES[1]);
    }

    #[test]
    fn out_of_range_example_slot_leaves_input_alone() {
        let mut state = UiState {
            input: "draft".into(),
            ..Default::default()
        };
        state.load_example(5);
        assert_eq!(state.input, "draft");
    }

    #[test]
    fn new_result_snapshot_restarts_the_bar_reveal() {
        let mut state = UiState::default();
        state.apply_snapshot(ViewState::Loading);
        assert!(state.result_shown_at.is_none());

        state.apply_snapshot(ViewState::Result(crate::model::ClassificationResult {
            message: "hello there".into(),
            is_spam: false,
            prediction: "Not Spam".into(),
            confidence: 55.0,
        }));
        assert!(state.result_shown_at.is_some());
    }
}
