use crate::session::Session;
use crate::sql::QueryOutput;
use crate::storage::Record;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Mode {
    Normal,
    Insert,
    Command,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Focus {
    Query,
    Results,
}

/// Rows of the last record-producing statement, ready for drawing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultGrid {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub column_widths: Vec<usize>,
}

impl ResultGrid {
    pub fn from_records(records: &[Record]) -> Self {
        let columns: Vec<String> = records
            .first()
            .map(|r| r.columns().map(str::to_string).collect())
            .unwrap_or_default();
        let rows = records
            .iter()
            .map(|r| r.values().map(str::to_string).collect())
            .collect();
        Self::new(columns, rows)
    }

    pub fn from_tables(tables: &[String]) -> Self {
        let rows = tables.iter().map(|t| vec![t.clone()]).collect();
        Self::new(vec!["table".to_string()], rows)
    }

    fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let column_widths = columns
            .iter()
            .enumerate()
            .map(|(i, col)| {
                let max_value_width = rows
                    .iter()
                    .filter_map(|row: &Vec<String>| row.get(i))
                    .map(|v| v.chars().count())
                    .max()
                    .unwrap_or(0);
                col.chars().count().max(max_value_width).max(4) // minimum width of 4
            })
            .collect();
        Self {
            columns,
            rows,
            column_widths,
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

pub struct App {
    pub query: String,
    /// Byte offset into `query`, always on a char boundary.
    pub cursor_pos: usize,
    pub result: Option<ResultGrid>,
    pub message: Option<String>,
    pub error: Option<String>,
    pub mode: Mode,
    pub focus: Focus,
    pub should_quit: bool,
    pub session: Session,
    pub command_buffer: String,
    pub result_scroll: usize,
    pub result_horizontal_scroll: usize,
    pub history: Vec<String>,
    pub history_index: Option<usize>,
}

impl App {
    pub fn new(session: Session) -> Self {
        Self {
            query: String::new(),
            cursor_pos: 0,
            result: None,
            message: None,
            error: None,
            mode: Mode::Normal,
            focus: Focus::Query,
            should_quit: false,
            session,
            command_buffer: String::new(),
            result_scroll: 0,
            result_horizontal_scroll: 0,
            history: Vec::new(),
            history_index: None,
        }
    }

    /// Name shown in the status bar.
    pub fn database_name(&self) -> Option<&str> {
        self.session.database().map(|db| db.name())
    }

    /// Runs every statement in the editor. The last output is shown; the first error
    /// stops the run.
    pub fn execute_query(&mut self) {
        if self.query.trim().is_empty() {
            return;
        }

        if self.history.last() != Some(&self.query) {
            self.history.push(self.query.clone());
        }
        self.history_index = None;

        match self.session.execute_script(&self.query) {
            Ok(outputs) => match outputs.last() {
                Some(output) => self.show(output),
                None => self.message = None,
            },
            Err(e) => {
                self.error = Some(e.to_string());
                self.result = None;
                self.message = None;
            }
        }
    }

    fn show(&mut self, output: &QueryOutput) {
        self.error = None;
        self.result_scroll = 0;
        self.result_horizontal_scroll = 0;
        match output {
            QueryOutput::Records(records) => {
                self.result = Some(ResultGrid::from_records(records));
                self.message = None;
            }
            QueryOutput::Tables(tables) => {
                self.result = Some(ResultGrid::from_tables(tables));
                self.message = None;
            }
            other => {
                self.result = None;
                self.message = Some(other.to_string());
            }
        }
    }

    fn use_database(&mut self, name: &str) {
        match self.session.use_database(name) {
            Ok(db) => {
                self.message = Some(format!("Using database: {}", db.name()));
                self.error = None;
            }
            Err(e) => self.error = Some(e.to_string()),
        }
    }

    fn prev_boundary(&self) -> usize {
        self.query[..self.cursor_pos]
            .char_indices()
            .next_back()
            .map(|(i, _)| i)
            .unwrap_or(0)
    }

    fn next_boundary(&self) -> usize {
        self.query[self.cursor_pos..]
            .chars()
            .next()
            .map(|c| self.cursor_pos + c.len_utf8())
            .unwrap_or(self.query.len())
    }

    pub fn insert_char(&mut self, c: char) {
        self.query.insert(self.cursor_pos, c);
        self.cursor_pos += c.len_utf8();
    }

    pub fn delete_char(&mut self) {
        if self.cursor_pos > 0 {
            self.cursor_pos = self.prev_boundary();
            self.query.remove(self.cursor_pos);
        }
    }

    pub fn delete_char_forward(&mut self) {
        if self.cursor_pos < self.query.len() {
            self.query.remove(self.cursor_pos);
        }
    }

    pub fn move_cursor_left(&mut self) {
        self.cursor_pos = self.prev_boundary();
    }

    pub fn move_cursor_right(&mut self) {
        self.cursor_pos = self.next_boundary();
    }

    pub fn move_cursor_start(&mut self) {
        self.cursor_pos = 0;
    }

    pub fn move_cursor_end(&mut self) {
        self.cursor_pos = self.query.len();
    }

    pub fn move_cursor_word_forward(&mut self) {
        let rest = &self.query[self.cursor_pos..];
        let word_end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        let next_word = rest[word_end..]
            .find(|c: char| !c.is_whitespace())
            .map(|i| word_end + i)
            .unwrap_or(rest.len());
        self.cursor_pos += next_word;
    }

    pub fn move_cursor_word_backward(&mut self) {
        let before = self.query[..self.cursor_pos].trim_end();
        self.cursor_pos = before
            .rfind(char::is_whitespace)
            .map(|i| i + before[i..].chars().next().map_or(1, char::len_utf8))
            .unwrap_or(0);
    }

    pub fn move_cursor_up(&mut self) {
        let line_start = self.query[..self.cursor_pos]
            .rfind('\n')
            .map(|i| i + 1)
            .unwrap_or(0);
        if line_start == 0 {
            return;
        }

        let col = self.query[line_start..self.cursor_pos].chars().count();
        let prev_end = line_start - 1;
        let prev_start = self.query[..prev_end].rfind('\n').map(|i| i + 1).unwrap_or(0);
        self.cursor_pos = offset_of_column(&self.query, prev_start, prev_end, col);
    }

    pub fn move_cursor_down(&mut self) {
        let line_start = self.query[..self.cursor_pos]
            .rfind('\n')
            .map(|i| i + 1)
            .unwrap_or(0);
        let Some(line_end) = self.query[self.cursor_pos..]
            .find('\n')
            .map(|i| self.cursor_pos + i)
        else {
            return;
        };

        let col = self.query[line_start..self.cursor_pos].chars().count();
        let next_start = line_end + 1;
        let next_end = self.query[next_start..]
            .find('\n')
            .map(|i| next_start + i)
            .unwrap_or(self.query.len());
        self.cursor_pos = offset_of_column(&self.query, next_start, next_end, col);
    }

    pub fn delete_word_backward(&mut self) {
        let end = self.cursor_pos;
        self.move_cursor_word_backward();
        self.query.drain(self.cursor_pos..end);
    }

    pub fn delete_to_end(&mut self) {
        self.query.truncate(self.cursor_pos);
    }

    pub fn delete_to_start(&mut self) {
        self.query.drain(..self.cursor_pos);
        self.cursor_pos = 0;
    }

    pub fn clear_query(&mut self) {
        self.query.clear();
        self.cursor_pos = 0;
    }

    pub fn history_up(&mut self) {
        if self.history.is_empty() {
            return;
        }

        let new_index = match self.history_index {
            None => self.history.len() - 1,
            Some(i) => i.saturating_sub(1),
        };

        self.history_index = Some(new_index);
        self.query = self.history[new_index].clone();
        self.cursor_pos = self.query.len();
    }

    pub fn history_down(&mut self) {
        let Some(i) = self.history_index else {
            return;
        };

        if i + 1 >= self.history.len() {
            self.history_index = None;
            self.clear_query();
        } else {
            self.history_index = Some(i + 1);
            self.query = self.history[i + 1].clone();
            self.cursor_pos = self.query.len();
        }
    }

    fn last_row(&self) -> usize {
        self.result
            .as_ref()
            .map_or(0, |grid| grid.row_count().saturating_sub(1))
    }

    pub fn scroll_results_up(&mut self) {
        self.result_scroll = self.result_scroll.saturating_sub(1);
    }

    pub fn scroll_results_down(&mut self) {
        if self.result_scroll < self.last_row() {
            self.result_scroll += 1;
        }
    }

    pub fn scroll_results_left(&mut self) {
        self.result_horizontal_scroll = self.result_horizontal_scroll.saturating_sub(1);
    }

    pub fn scroll_results_right(&mut self) {
        let columns = self.result.as_ref().map_or(0, |grid| grid.columns.len());
        if self.result_horizontal_scroll + 1 < columns {
            self.result_horizontal_scroll += 1;
        }
    }

    pub fn page_up(&mut self) {
        self.result_scroll = self.result_scroll.saturating_sub(10);
    }

    pub fn page_down(&mut self) {
        self.result_scroll = (self.result_scroll + 10).min(self.last_row());
    }

    pub fn scroll_to_top(&mut self) {
        self.result_scroll = 0;
    }

    pub fn scroll_to_bottom(&mut self) {
        self.result_scroll = self.last_row();
    }

    pub fn enter_insert_mode(&mut self) {
        self.mode = Mode::Insert;
        self.focus = Focus::Query;
    }

    pub fn enter_normal_mode(&mut self) {
        self.mode = Mode::Normal;
    }

    pub fn enter_command_mode(&mut self) {
        self.mode = Mode::Command;
        self.command_buffer.clear();
    }

    pub fn execute_command(&mut self) {
        let buffer = std::mem::take(&mut self.command_buffer);
        let mut parts = buffer.split_whitespace();
        match (parts.next(), parts.next()) {
            (Some("q" | "quit"), None) => self.should_quit = true,
            (Some("e" | "exec" | "execute"), None) => self.execute_query(),
            (Some("use"), Some(name)) => self.use_database(name),
            (Some("clear"), None) => {
                self.clear_query();
                self.result = None;
                self.message = None;
                self.error = None;
            }
            (Some(_), _) => self.error = Some(format!("Unknown command: {}", buffer.trim())),
            (None, _) => {}
        }
        self.mode = Mode::Normal;
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Query => Focus::Results,
            Focus::Results => Focus::Query,
        };
    }
}

/// Byte offset of the `col`-th char of the line `text[start..end]`, clamped to its end.
fn offset_of_column(text: &str, start: usize, end: usize, col: usize) -> usize {
    text[start..end]
        .char_indices()
        .nth(col)
        .map(|(i, _)| start + i)
        .unwrap_or(end)
}
