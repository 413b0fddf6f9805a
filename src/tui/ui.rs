use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Wrap},
    Frame,
};

use super::app::{App, Focus, Mode, ResultGrid};
use crate::sql::lexer::is_keyword;

const EDITOR_HEIGHT: u16 = 7;

pub fn draw(frame: &mut Frame, app: &App) {
    let [title, editor, results, status] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(EDITOR_HEIGHT),
        Constraint::Min(10),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    draw_title(frame, app, title);
    draw_editor(frame, app, editor);
    draw_results(frame, app, results);

    if app.mode == Mode::Command {
        draw_command_line(frame, app, status);
    } else {
        draw_status_bar(frame, app, status);
    }
}

fn pane(title: String, focused: bool) -> Block<'static> {
    let color = if focused { Color::Cyan } else { Color::DarkGray };
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
}

/// Program name and the directory databases live in.
fn draw_title(frame: &mut Frame, app: &App, area: Rect) {
    let line = Line::from(vec![
        Span::styled(
            " flatsql ",
            Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!(" {}", app.session.root().display()),
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn draw_editor(frame: &mut Frame, app: &App, area: Rect) {
    let focused = app.focus == Focus::Query;
    let block = pane(" Statement ".to_string(), focused);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let lines: Vec<Line> = app.query.split('\n').map(highlight_line).collect();
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);

    if focused && app.mode == Mode::Insert {
        let (row, col) = cursor_cell(&app.query, app.cursor_pos);
        frame.set_cursor_position((inner.x + col, inner.y + row));
    }
}

/// Row and column, in chars, of a byte offset into the editor text.
fn cursor_cell(text: &str, offset: usize) -> (u16, u16) {
    let before = &text[..offset.min(text.len())];
    let row = before.matches('\n').count();
    let col = before.rsplit('\n').next().map_or(0, |line| line.chars().count());
    (row as u16, col as u16)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Piece {
    Keyword,
    Number,
    Quoted,
    Comparator,
    Punctuation,
    Plain,
}

impl Piece {
    fn style(self) -> Style {
        match self {
            Piece::Keyword => Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            Piece::Number => Style::default().fg(Color::Cyan),
            Piece::Quoted => Style::default().fg(Color::Green),
            Piece::Comparator => Style::default().fg(Color::Magenta),
            Piece::Punctuation => Style::default().fg(Color::Yellow),
            Piece::Plain => Style::default(),
        }
    }
}

/// Splits one editor line into styled pieces. Unclosed quotes run to the end of the line.
fn highlight_line(line: &str) -> Line<'static> {
    let mut spans = Vec::new();
    let mut rest = line;

    while let Some(c) = rest.chars().next() {
        let (len, piece) = match c {
            '\'' | '"' => {
                let close = rest[1..].find(c).map_or(rest.len(), |i| i + 2);
                (close, Piece::Quoted)
            }
            c if c.is_alphanumeric() || c == '_' => {
                let len = rest
                    .find(|ch: char| !(ch.is_alphanumeric() || ch == '_' || ch == '.'))
                    .unwrap_or(rest.len());
                let word = &rest[..len];
                let piece = if is_keyword(word) {
                    Piece::Keyword
                } else if word.chars().all(|ch| ch.is_ascii_digit() || ch == '.') {
                    Piece::Number
                } else {
                    Piece::Plain
                };
                (len, piece)
            }
            '=' | '<' | '>' | '!' => (1, Piece::Comparator),
            '(' | ')' | ',' | '*' | ';' => (1, Piece::Punctuation),
            c => (c.len_utf8(), Piece::Plain),
        };

        spans.push(Span::styled(rest[..len].to_string(), piece.style()));
        rest = &rest[len..];
    }

    Line::from(spans)
}

fn draw_results(frame: &mut Frame, app: &App, area: Rect) {
    let title = match (&app.result, &app.error) {
        (_, Some(_)) => " Error ".to_string(),
        (Some(grid), None) => format!(" Results ({} rows) ", grid.row_count()),
        (None, None) => " Results ".to_string(),
    };
    let block = pane(title, app.focus == Focus::Results);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if let Some(error) = &app.error {
        let text = Paragraph::new(error.as_str())
            .style(Style::default().fg(Color::Red))
            .wrap(Wrap { trim: true });
        frame.render_widget(text, inner);
        return;
    }

    match &app.result {
        Some(grid) if grid.row_count() == 0 => {
            frame.render_widget(Paragraph::new("(0 rows)"), inner);
        }
        Some(grid) => draw_grid(frame, app, grid, inner),
        None => {
            let (text, color) = match &app.message {
                Some(message) => (message.as_str(), Color::Green),
                None => ("Type a statement and press Enter", Color::DarkGray),
            };
            frame.render_widget(Paragraph::new(text).style(Style::default().fg(color)), inner);
        }
    }
}

fn draw_grid(frame: &mut Frame, app: &App, grid: &ResultGrid, area: Rect) {
    let skip = app.result_horizontal_scroll;
    let cells = |values: &[String]| -> Vec<Cell<'static>> {
        values
            .iter()
            .zip(&grid.column_widths)
            .skip(skip)
            .map(|(value, &width)| Cell::from(truncate_string(value, width)))
            .collect()
    };

    let header = Row::new(cells(&grid.columns))
        .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));
    let body_height = area.height.saturating_sub(1) as usize;
    let rows: Vec<Row> = grid
        .rows
        .iter()
        .skip(app.result_scroll)
        .take(body_height)
        .map(|row| Row::new(cells(row)))
        .collect();
    let widths: Vec<Constraint> = grid
        .column_widths
        .iter()
        .skip(skip)
        .map(|&w| Constraint::Length(w as u16 + 2))
        .collect();

    frame.render_widget(Table::new(rows, widths).header(header), area);
}

/// Cuts `s` to `max_len` chars, marking the cut with `...` when there is room.
fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        return s.to_string();
    }
    if max_len > 3 {
        let kept: String = s.chars().take(max_len - 3).collect();
        format!("{}...", kept)
    } else {
        s.chars().take(max_len).collect()
    }
}

fn key_hints(mode: Mode) -> &'static str {
    match mode {
        Mode::Normal => "i:insert  j/k:move  Tab:focus  Enter:execute  :use NAME  q:quit",
        Mode::Insert => "Esc:normal  Enter:execute  Shift+Enter:newline  Up/Down:history",
        Mode::Command => "use NAME  e:execute  clear  q:quit  Esc:cancel",
    }
}

fn draw_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let (mode, color) = match app.mode {
        Mode::Normal => ("NORMAL", Color::Blue),
        Mode::Insert => ("INSERT", Color::Green),
        Mode::Command => ("COMMAND", Color::Yellow),
    };
    let database = match app.database_name() {
        Some(name) => Span::styled(format!(" db:{} ", name), Style::default().fg(Color::Cyan)),
        None => Span::styled(" no database ", Style::default().fg(Color::Red)),
    };

    let line = Line::from(vec![
        Span::styled(format!(" {} ", mode), Style::default().fg(Color::Black).bg(color)),
        database,
        Span::styled(key_hints(app.mode), Style::default().fg(Color::DarkGray)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn draw_command_line(frame: &mut Frame, app: &App, area: Rect) {
    frame.render_widget(Clear, area);
    frame.render_widget(Paragraph::new(format!(":{}", app.command_buffer)), area);
    let col = 1 + app.command_buffer.chars().count() as u16;
    frame.set_cursor_position((area.x + col, area.y));
}
