use crossterm::event::KeyCode;
use ratatui::{
    layout::{Constraint, Layout},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::mapping::{ColumnMapping, Field, MappingDraft, REQUIRED_FIELDS};
use crate::tui::{Flow, Screen, FOOTER_STYLE, HEADER_STYLE, OK_STYLE, SELECTED_STYLE, WARN_STYLE};

const SAMPLE_ROWS: usize = 3;

/// Click-to-assign mapper: pick a field, move the column cursor, bind
/// with Enter. Binding a column steals it from any other field.
pub struct GridMapper {
    headers: Vec<String>,
    sample: Vec<Vec<String>>,
    draft: MappingDraft,
    field_idx: usize,
    cursor: usize,
}

impl GridMapper {
    pub fn new(headers: Vec<String>, rows: &[Vec<String>]) -> Self {
        let sample = rows.iter().take(SAMPLE_ROWS).cloned().collect();
        Self {
            headers,
            sample,
            draft: MappingDraft::default(),
            field_idx: 0,
            cursor: 0,
        }
    }

    fn current_field(&self) -> Field {
        REQUIRED_FIELDS[self.field_idx]
    }
}

impl Screen for GridMapper {
    type Output = ColumnMapping;

    fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let [header_area, fields_area, grid_area, hints_area] = Layout::vertical([
            Constraint::Length(2),
            Constraint::Length(REQUIRED_FIELDS.len() as u16 + 1),
            Constraint::Fill(1),
            Constraint::Length(1),
        ])
        .areas(area);

        frame.render_widget(
            Paragraph::new(" Map columns: assign each field to a column").style(HEADER_STYLE),
            header_area,
        );

        let mut field_lines = Vec::new();
        for (i, field) in REQUIRED_FIELDS.iter().enumerate() {
            let marker = if i == self.field_idx { ">" } else { " " };
            let bound = match self.draft.get(*field) {
                Some(col) => Span::styled(
                    format!("column {} ({})", col, self.headers.get(col).map(|s| s.as_str()).unwrap_or("?")),
                    OK_STYLE,
                ),
                None => Span::styled("unassigned".to_string(), WARN_STYLE),
            };
            let label_style = if i == self.field_idx {
                Style::default().add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            field_lines.push(Line::from(vec![
                Span::styled(format!(" {marker} {:<18}", field.label()), label_style),
                bound,
            ]));
        }
        field_lines.push(Line::from(""));
        frame.render_widget(Paragraph::new(field_lines), fields_area);

        // One line per column: header plus a few sample values.
        let mut grid_lines = Vec::new();
        for (col, header) in self.headers.iter().enumerate() {
            let samples: Vec<String> = self
                .sample
                .iter()
                .map(|row| row.get(col).cloned().unwrap_or_default())
                .collect();
            let badge = match self.draft.column_field(col) {
                Some(f) => format!(" [{}]", f.label()),
                None => String::new(),
            };
            let text = format!(" {col:>2}  {header}{badge}  |  {}", samples.join(" / "));
            let style = if col == self.cursor {
                SELECTED_STYLE
            } else {
                Style::default()
            };
            grid_lines.push(Line::from(Span::styled(text, style)));
        }
        frame.render_widget(Paragraph::new(grid_lines), grid_area);

        let hints = if self.draft.is_complete() {
            " Up/Down=field  Left/Right=column  Enter=bind  c=clear  i=import  Esc=cancel"
        } else {
            " Up/Down=field  Left/Right=column  Enter=bind  c=clear  Esc=cancel"
        };
        frame.render_widget(Paragraph::new(hints).style(FOOTER_STYLE), hints_area);
    }

    fn handle_key(&mut self, code: KeyCode) -> Flow<ColumnMapping> {
        match code {
            KeyCode::Esc | KeyCode::Char('q') => return Flow::Cancel,
            KeyCode::Up | KeyCode::BackTab => {
                self.field_idx = if self.field_idx == 0 {
                    REQUIRED_FIELDS.len() - 1
                } else {
                    self.field_idx - 1
                };
            }
            KeyCode::Down | KeyCode::Tab => {
                self.field_idx = (self.field_idx + 1) % REQUIRED_FIELDS.len();
            }
            KeyCode::Left => {
                self.cursor = if self.cursor == 0 {
                    self.headers.len().saturating_sub(1)
                } else {
                    self.cursor - 1
                };
            }
            KeyCode::Right => {
                if !self.headers.is_empty() {
                    self.cursor = (self.cursor + 1) % self.headers.len();
                }
            }
            KeyCode::Enter => {
                self.draft.set(self.current_field(), self.cursor);
                if self.field_idx + 1 < REQUIRED_FIELDS.len() {
                    self.field_idx += 1;
                }
            }
            KeyCode::Char('c') | KeyCode::Backspace => {
                self.draft.clear(self.current_field());
            }
            KeyCode::Char('i') => {
                // Import is gated on a complete mapping.
                if let Some(mapping) = self.draft.build() {
                    return Flow::Done(mapping);
                }
            }
            _ => {}
        }
        Flow::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapper() -> GridMapper {
        let headers = vec!["Name".into(), "From".into(), "To".into(), "Total".into()];
        let rows = vec![vec!["Ana".into(), "01/03/2024".into(), "05/03/2024".into(), "100".into()]];
        GridMapper::new(headers, &rows)
    }

    fn bind(m: &mut GridMapper, field_idx: usize, col: usize) {
        m.field_idx = field_idx;
        m.cursor = col;
        m.handle_key(KeyCode::Enter);
    }

    #[test]
    fn test_import_gated_until_complete() {
        let mut m = mapper();
        bind(&mut m, 0, 0);
        bind(&mut m, 1, 1);
        bind(&mut m, 2, 2);
        assert!(matches!(m.handle_key(KeyCode::Char('i')), Flow::Continue));
        bind(&mut m, 3, 3);
        match m.handle_key(KeyCode::Char('i')) {
            Flow::Done(mapping) => {
                assert_eq!(mapping.guest_name, 0);
                assert_eq!(mapping.amount, 3);
            }
            _ => panic!("expected complete mapping"),
        }
    }

    #[test]
    fn test_binding_steals_column_from_other_field() {
        let mut m = mapper();
        bind(&mut m, 0, 2);
        bind(&mut m, 1, 2);
        assert_eq!(m.draft.get(Field::GuestName), None);
        assert_eq!(m.draft.get(Field::CheckIn), Some(2));
    }

    #[test]
    fn test_clear_unbinds_current_field() {
        let mut m = mapper();
        bind(&mut m, 0, 1);
        m.field_idx = 0;
        m.handle_key(KeyCode::Char('c'));
        assert_eq!(m.draft.get(Field::GuestName), None);
    }

    #[test]
    fn test_escape_cancels() {
        let mut m = mapper();
        assert!(matches!(m.handle_key(KeyCode::Esc), Flow::Cancel));
    }
}
