use crossterm::event::KeyCode;
use ratatui::{
    layout::{Constraint, Layout},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::mapping::{
    AmountType, ColumnMapping, DateFormat, Field, ImportConfig, MappingDraft, NumberFormat,
    OPTIONAL_FIELDS, REQUIRED_FIELDS,
};
use crate::models::ImportTemplate;
use crate::preview::build_preview;
use crate::tui::{
    money_span, Flow, Screen, ERROR_STYLE, FOOTER_STYLE, HEADER_STYLE, OK_STYLE, SELECTED_STYLE,
    WARN_STYLE,
};

const SAMPLE_ROWS: usize = 10;

/// What the form mapper hands back to the import command.
pub struct FormResult {
    pub mapping: ColumnMapping,
    pub config: ImportConfig,
    /// When set, the caller persists the mapping under this template name.
    pub save_template: Option<String>,
}

enum Mode {
    Editing,
    NamingTemplate(String),
}

/// Form-style mapper: one selector row per field cycling through the file's
/// columns, plus locale rows, with live sample stats at the bottom.
pub struct FormMapper {
    headers: Vec<String>,
    sample: Vec<Vec<String>>,
    templates: Vec<ImportTemplate>,
    draft: MappingDraft,
    config: ImportConfig,
    row: usize,
    mode: Mode,
    next_template: usize,
    status_line: Option<String>,
}

const CONFIG_ROWS: usize = 3;

impl FormMapper {
    pub fn new(
        headers: Vec<String>,
        rows: &[Vec<String>],
        config: ImportConfig,
        templates: Vec<ImportTemplate>,
    ) -> Self {
        Self {
            sample: rows.iter().take(SAMPLE_ROWS).cloned().collect(),
            headers,
            templates,
            draft: MappingDraft::default(),
            config,
            row: 0,
            mode: Mode::Editing,
            next_template: 0,
            status_line: None,
        }
    }

    fn fields() -> Vec<Field> {
        REQUIRED_FIELDS.iter().chain(OPTIONAL_FIELDS.iter()).copied().collect()
    }

    fn row_count(&self) -> usize {
        Self::fields().len() + CONFIG_ROWS
    }

    fn cycle_field(&mut self, field: Field, forward: bool) {
        let len = self.headers.len();
        if len == 0 {
            return;
        }
        let current = self.draft.get(field);
        let next = if forward {
            match current {
                None => Some(0),
                Some(i) if i + 1 < len => Some(i + 1),
                Some(_) => None,
            }
        } else {
            match current {
                None => Some(len - 1),
                Some(0) => None,
                Some(i) => Some(i - 1),
            }
        };
        match next {
            Some(col) => self.draft.set(field, col),
            None => self.draft.clear(field),
        }
    }

    fn cycle_config(&mut self, config_row: usize, forward: bool) {
        match config_row {
            0 => {
                let all = DateFormat::ALL;
                let pos = all.iter().position(|f| *f == self.config.date_format).unwrap_or(0);
                let next = if forward { (pos + 1) % all.len() } else { (pos + all.len() - 1) % all.len() };
                self.config.date_format = all[next];
            }
            1 => {
                self.config.number_format = match self.config.number_format {
                    NumberFormat::Eu => NumberFormat::Us,
                    NumberFormat::Us => NumberFormat::Eu,
                };
            }
            _ => {
                self.config.amount_type = match self.config.amount_type {
                    AmountType::Net => AmountType::Gross,
                    AmountType::Gross => AmountType::Net,
                };
            }
        }
    }

    fn load_next_template(&mut self) {
        if self.templates.is_empty() {
            self.status_line = Some("No saved templates".to_string());
            return;
        }
        let idx = self.next_template % self.templates.len();
        self.next_template += 1;
        let tpl = self.templates[idx].clone();
        self.draft = MappingDraft::default();
        apply_mapping(&mut self.draft, &tpl.mapping, self.headers.len());
        self.config = tpl.config;
        self.status_line = Some(format!("Loaded template '{}'", tpl.name));
    }

    fn finish(&self, save_template: Option<String>) -> Option<FormResult> {
        self.draft.build().map(|mapping| FormResult {
            mapping,
            config: self.config,
            save_template,
        })
    }
}

fn apply_mapping(draft: &mut MappingDraft, mapping: &ColumnMapping, column_count: usize) {
    for field in REQUIRED_FIELDS.iter().chain(OPTIONAL_FIELDS.iter()) {
        if let Some(col) = mapping.get(*field) {
            if col < column_count {
                draft.set(*field, col);
            }
        }
    }
}

impl Screen for FormMapper {
    type Output = FormResult;

    fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let [header_area, form_area, stats_area, hints_area] = Layout::vertical([
            Constraint::Length(2),
            Constraint::Length(self.row_count() as u16 + 2),
            Constraint::Fill(1),
            Constraint::Length(1),
        ])
        .areas(area);

        frame.render_widget(
            Paragraph::new(" Import settings").style(HEADER_STYLE),
            header_area,
        );

        let fields = Self::fields();
        let mut lines = Vec::new();
        for (i, field) in fields.iter().enumerate() {
            let required = REQUIRED_FIELDS.contains(field);
            let value = match self.draft.get(*field) {
                Some(col) => Span::styled(
                    format!("{} (column {col})", self.headers.get(col).map(|s| s.as_str()).unwrap_or("?")),
                    OK_STYLE,
                ),
                None if required => Span::styled("required".to_string(), ERROR_STYLE),
                None => Span::styled("-".to_string(), FOOTER_STYLE),
            };
            lines.push(selector_line(self.row == i, field.label(), value));
        }
        lines.push(Line::from(""));
        let base = fields.len();
        lines.push(selector_line(
            self.row == base,
            "Date format",
            Span::raw(self.config.date_format.label()),
        ));
        lines.push(selector_line(
            self.row == base + 1,
            "Number format",
            Span::raw(self.config.number_format.label()),
        ));
        lines.push(selector_line(
            self.row == base + 2,
            "Amount type",
            Span::raw(self.config.amount_type.label()),
        ));
        frame.render_widget(Paragraph::new(lines), form_area);

        let mut stats_lines = Vec::new();
        if let Some(mapping) = self.draft.build() {
            let preview = build_preview(&self.sample, &mapping, &self.config, Some(SAMPLE_ROWS));
            stats_lines.push(Line::from(vec![
                Span::raw(format!(
                    " Sample: {} valid, {} with errors, {} nights, ",
                    preview.stats.valid, preview.stats.invalid, preview.stats.total_nights
                )),
                money_span(preview.stats.total_amount),
            ]));
            for r in preview.rows.iter().filter(|r| !r.is_valid()).take(3) {
                stats_lines.push(Line::from(Span::styled(
                    format!("   row {}: {}", r.row_index + 2, r.errors.join("; ")),
                    WARN_STYLE,
                )));
            }
        } else {
            stats_lines.push(Line::from(Span::styled(
                " Assign all required fields to see a sample preview",
                FOOTER_STYLE,
            )));
        }
        if let Some(msg) = &self.status_line {
            stats_lines.push(Line::from(Span::styled(format!(" {msg}"), FOOTER_STYLE)));
        }
        frame.render_widget(Paragraph::new(stats_lines), stats_area);

        let hints = match &self.mode {
            Mode::NamingTemplate(name) => {
                frame.render_widget(
                    Paragraph::new(format!(" Template name: {name}\u{2588}  (Enter=save, Esc=back)"))
                        .style(HEADER_STYLE),
                    hints_area,
                );
                return;
            }
            Mode::Editing if self.draft.is_complete() => {
                " Up/Down=field  Left/Right=value  t=load template  s=save template  i=import  Esc=cancel"
            }
            Mode::Editing => " Up/Down=field  Left/Right=value  t=load template  Esc=cancel",
        };
        frame.render_widget(Paragraph::new(hints).style(FOOTER_STYLE), hints_area);
    }

    fn handle_key(&mut self, code: KeyCode) -> Flow<FormResult> {
        if let Mode::NamingTemplate(name) = &mut self.mode {
            match code {
                KeyCode::Esc => self.mode = Mode::Editing,
                KeyCode::Backspace => {
                    name.pop();
                }
                KeyCode::Enter => {
                    let trimmed = name.trim().to_string();
                    if !trimmed.is_empty() {
                        if let Some(result) = self.finish(Some(trimmed)) {
                            return Flow::Done(result);
                        }
                    }
                }
                KeyCode::Char(c) => name.push(c),
                _ => {}
            }
            return Flow::Continue;
        }

        match code {
            KeyCode::Esc | KeyCode::Char('q') => return Flow::Cancel,
            KeyCode::Up | KeyCode::BackTab => {
                self.row = if self.row == 0 { self.row_count() - 1 } else { self.row - 1 };
            }
            KeyCode::Down | KeyCode::Tab => {
                self.row = (self.row + 1) % self.row_count();
            }
            KeyCode::Left | KeyCode::Right => {
                let forward = code == KeyCode::Right;
                let fields = Self::fields();
                if self.row < fields.len() {
                    self.cycle_field(fields[self.row], forward);
                } else {
                    self.cycle_config(self.row - fields.len(), forward);
                }
                self.status_line = None;
            }
            KeyCode::Char('t') => self.load_next_template(),
            KeyCode::Char('s') => {
                if self.draft.is_complete() {
                    self.mode = Mode::NamingTemplate(String::new());
                }
            }
            KeyCode::Char('i') | KeyCode::Enter => {
                if let Some(result) = self.finish(None) {
                    return Flow::Done(result);
                }
            }
            _ => {}
        }
        Flow::Continue
    }
}

fn selector_line(selected: bool, label: &str, value: Span<'static>) -> Line<'static> {
    let marker = if selected { ">" } else { " " };
    let style = if selected {
        SELECTED_STYLE
    } else {
        Style::default()
    };
    Line::from(vec![
        Span::styled(format!(" {marker} {label:<18} < "), style),
        value,
        Span::styled(" >".to_string(), Style::default().add_modifier(Modifier::DIM)),
    ])
}
