use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Span;
use ratatui::Frame;

use crate::error::Result;
use crate::fmt::money;

pub const HEADER_STYLE: Style = Style::new()
    .fg(Color::Yellow)
    .add_modifier(Modifier::BOLD);

pub const FOOTER_STYLE: Style = Style::new().fg(Color::DarkGray);

pub const SELECTED_STYLE: Style = Style::new()
    .bg(Color::Rgb(40, 40, 60))
    .add_modifier(Modifier::BOLD);

pub const OK_STYLE: Style = Style::new().fg(Color::Rgb(80, 220, 100));
pub const WARN_STYLE: Style = Style::new().fg(Color::Yellow);
pub const ERROR_STYLE: Style = Style::new().fg(Color::Red);

pub fn money_span(amount: f64) -> Span<'static> {
    Span::styled(money(amount), OK_STYLE)
}

/// What a key press did to an interactive screen.
pub enum Flow<T> {
    Continue,
    Cancel,
    Done(T),
}

pub trait Screen {
    type Output;
    fn draw(&self, frame: &mut Frame);
    fn handle_key(&mut self, code: KeyCode) -> Flow<Self::Output>;
}

/// Run one interactive screen to completion. Sets up the terminal and a
/// panic hook, restores on exit. Returns None when the user cancelled.
pub fn run_screen<S: Screen>(screen: &mut S) -> Result<Option<S::Output>> {
    let hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        ratatui::restore();
        hook(info);
    }));

    let mut terminal = ratatui::init();

    let result = loop {
        if let Err(e) = terminal.draw(|frame| screen.draw(frame)) {
            break Err(e.into());
        }

        match event::read() {
            Err(e) => break Err(e.into()),
            Ok(Event::Key(key)) => {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
                    break Ok(None);
                }
                match screen.handle_key(key.code) {
                    Flow::Continue => {}
                    Flow::Cancel => break Ok(None),
                    Flow::Done(value) => break Ok(Some(value)),
                }
            }
            _ => {}
        }
    };

    drop(terminal);
    ratatui::restore();
    result
}
