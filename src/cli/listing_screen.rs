use crossterm::event::KeyCode;
use ratatui::{
    layout::{Constraint, Layout},
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::matcher::{ListingInfo, ListingMapping, MatchTier};
use crate::models::BillingUnit;
use crate::tui::{Flow, Screen, ERROR_STYLE, FOOTER_STYLE, HEADER_STYLE, OK_STYLE, SELECTED_STYLE, WARN_STYLE};

struct Row {
    info: ListingInfo,
    /// Index into units, None until the user (or a suggestion) picks one.
    selected: Option<usize>,
    save_alias: bool,
}

/// Routes each distinct listing name to a billing unit. The import cannot
/// proceed until every listing has a unit.
pub struct ListingScreen {
    units: Vec<BillingUnit>,
    rows: Vec<Row>,
    cursor: usize,
}

impl ListingScreen {
    pub fn new(listings: Vec<ListingInfo>, units: Vec<BillingUnit>) -> Self {
        let rows = listings
            .into_iter()
            .map(|info| {
                let selected = info
                    .suggested_unit_id
                    .and_then(|id| units.iter().position(|u| u.id == id));
                // Exact names need no alias; everything else defaults to
                // remembering the assignment.
                let exact = info
                    .possible_matches
                    .first()
                    .map(|m| m.tier == MatchTier::Exact)
                    .unwrap_or(false);
                Row { info, selected, save_alias: !exact }
            })
            .collect();
        Self { units, rows, cursor: 0 }
    }

    fn cycle(&mut self, forward: bool) {
        if self.units.is_empty() {
            return;
        }
        let len = self.units.len();
        let row = &mut self.rows[self.cursor];
        row.selected = if forward {
            match row.selected {
                None => Some(0),
                Some(i) if i + 1 < len => Some(i + 1),
                Some(_) => None,
            }
        } else {
            match row.selected {
                None => Some(len - 1),
                Some(0) => None,
                Some(i) => Some(i - 1),
            }
        };
    }

    fn all_assigned(&self) -> bool {
        self.rows.iter().all(|r| r.selected.is_some())
    }

    fn build(&self) -> Option<Vec<ListingMapping>> {
        self.rows
            .iter()
            .map(|row| {
                row.selected.map(|i| ListingMapping {
                    listing_name: row.info.name.clone(),
                    unit_id: self.units[i].id,
                    save_as_alias: row.save_alias,
                })
            })
            .collect()
    }
}

impl Screen for ListingScreen {
    type Output = Vec<ListingMapping>;

    fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let [header_area, list_area, hints_area] = Layout::vertical([
            Constraint::Length(2),
            Constraint::Fill(1),
            Constraint::Length(1),
        ])
        .areas(area);

        let unassigned = self.rows.iter().filter(|r| r.selected.is_none()).count();
        let title = if unassigned == 0 {
            " Assign listings to units".to_string()
        } else {
            format!(" Assign listings to units ({unassigned} unassigned)")
        };
        frame.render_widget(Paragraph::new(title).style(HEADER_STYLE), header_area);

        let mut lines = Vec::new();
        for (i, row) in self.rows.iter().enumerate() {
            let marker = if i == self.cursor { ">" } else { " " };
            let style = if i == self.cursor { SELECTED_STYLE } else { Style::default() };
            let target = match row.selected {
                Some(u) => Span::styled(format!("-> {}", self.units[u].name), OK_STYLE),
                None => Span::styled("-> (unassigned)".to_string(), ERROR_STYLE),
            };
            let alias_badge = if row.save_alias { " [alias]" } else { "" };
            lines.push(Line::from(vec![
                Span::styled(
                    format!(" {marker} {} ({} rows) ", row.info.name, row.info.count),
                    style,
                ),
                target,
                Span::styled(alias_badge.to_string(), FOOTER_STYLE),
            ]));
            if i == self.cursor {
                let hint = match row.info.possible_matches.first() {
                    Some(best) => format!(
                        "     best match: {} ({}, {}%)",
                        best.unit_name,
                        best.tier.label(),
                        best.confidence
                    ),
                    None => "     no close match among known units".to_string(),
                };
                lines.push(Line::from(Span::styled(hint, WARN_STYLE)));
            }
        }
        frame.render_widget(Paragraph::new(lines), list_area);

        let hints = if self.all_assigned() {
            " Up/Down=listing  Left/Right=unit  a=toggle alias  Enter=confirm  Esc=cancel"
        } else {
            " Up/Down=listing  Left/Right=unit  a=toggle alias  Esc=cancel"
        };
        frame.render_widget(Paragraph::new(hints).style(FOOTER_STYLE), hints_area);
    }

    fn handle_key(&mut self, code: KeyCode) -> Flow<Vec<ListingMapping>> {
        match code {
            KeyCode::Esc | KeyCode::Char('q') => return Flow::Cancel,
            KeyCode::Up => {
                self.cursor = if self.cursor == 0 { self.rows.len() - 1 } else { self.cursor - 1 };
            }
            KeyCode::Down | KeyCode::Tab => {
                self.cursor = (self.cursor + 1) % self.rows.len();
            }
            KeyCode::Left => self.cycle(false),
            KeyCode::Right => self.cycle(true),
            KeyCode::Char('a') => {
                let row = &mut self.rows[self.cursor];
                row.save_alias = !row.save_alias;
            }
            KeyCode::Enter => {
                if let Some(mappings) = self.build() {
                    return Flow::Done(mappings);
                }
            }
            _ => {}
        }
        Flow::Continue
    }
}
