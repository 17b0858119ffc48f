use crate::comparator::ChangeKind;
use crate::config::Config;
use crate::history::ChipsetHistory;
use crate::period::PeriodKey;
use crate::present::{NumberedTable, ReportTables};
use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;

const PAGE_JUMP: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Preview,
    Changes(ChangeKind),
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::Preview => Page::Changes(ChangeKind::Added),
            Page::Changes(ChangeKind::Added) => Page::Changes(ChangeKind::Removed),
            Page::Changes(ChangeKind::Removed) => Page::Changes(ChangeKind::Reappeared),
            Page::Changes(ChangeKind::Reappeared) => Page::Preview,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Page::Preview => Page::Changes(ChangeKind::Reappeared),
            Page::Changes(ChangeKind::Added) => Page::Preview,
            Page::Changes(ChangeKind::Removed) => Page::Changes(ChangeKind::Added),
            Page::Changes(ChangeKind::Reappeared) => Page::Changes(ChangeKind::Removed),
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Preview => "Data Preview",
            Page::Changes(kind) => kind.name(),
        }
    }

    fn color(&self) -> Color {
        match self {
            Page::Preview => Color::Cyan,
            Page::Changes(ChangeKind::Added) => Color::Green,
            Page::Changes(ChangeKind::Removed) => Color::Red,
            Page::Changes(ChangeKind::Reappeared) => Color::Yellow,
        }
    }
}

pub struct App {
    pub periods: Vec<(PeriodKey, NumberedTable)>,
    pub tables: ReportTables,
    pub current_page: Page,
    pub current_period: usize,
    pub state: TableState,
    pub show_detail: bool,
    /// Column highlighted in every table
    pub identifier_field: String,
}

impl App {
    pub fn new(history: &ChipsetHistory, tables: ReportTables, config: &Config) -> Self {
        let periods = history
            .iter()
            .map(|(key, records)| {
                (key.clone(), NumberedTable::from_records(records, &config.serial_column))
            })
            .collect();

        let mut app = Self {
            periods,
            tables,
            identifier_field: config.identifier_field.clone(),
            current_page: Page::Preview,
            current_period: 0,
            state: TableState::default(),
            show_detail: false,
        };
        app.reset_selection();
        app
    }

    /// Table shown on the current page
    pub fn current_table(&self) -> Option<&NumberedTable> {
        match self.current_page {
            Page::Preview => self.periods.get(self.current_period).map(|(_, t)| t),
            Page::Changes(kind) => Some(self.tables.get(kind)),
        }
    }

    fn row_count(&self) -> usize {
        self.current_table().map_or(0, |t| t.len())
    }

    fn reset_selection(&mut self) {
        let selected = if self.row_count() > 0 { Some(0) } else { None };
        self.state.select(selected);
    }

    /// Position of the identifier column in the current table, if present
    pub fn identifier_column(&self) -> Option<usize> {
        self.current_table()?
            .columns
            .iter()
            .position(|c| *c == self.identifier_field)
    }

    pub fn toggle_detail(&mut self) {
        self.show_detail = !self.show_detail;
    }

    pub fn selected_row(&self) -> Option<(&[String], &[String])> {
        let table = self.current_table()?;
        let row = table.rows.get(self.state.selected()?)?;
        Some((table.columns.as_slice(), row.as_slice()))
    }

    pub fn next_page(&mut self) {
        self.current_page = self.current_page.next();
        self.reset_selection();
    }

    pub fn previous_page(&mut self) {
        self.current_page = self.current_page.previous();
        self.reset_selection();
    }

    pub fn next_period(&mut self) {
        if self.current_page == Page::Preview && !self.periods.is_empty() {
            self.current_period = (self.current_period + 1) % self.periods.len();
            self.reset_selection();
        }
    }

    pub fn previous_period(&mut self) {
        if self.current_page == Page::Preview && !self.periods.is_empty() {
            self.current_period = (self.current_period + self.periods.len() - 1) % self.periods.len();
            self.reset_selection();
        }
    }

    pub fn next(&mut self) {
        let len = self.row_count();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.row_count();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(i));
    }

    pub fn page_down(&mut self) {
        let len = self.row_count();
        if len == 0 {
            return;
        }
        let i = self.state.selected().map_or(0, |i| (i + PAGE_JUMP).min(len - 1));
        self.state.select(Some(i));
    }

    pub fn page_up(&mut self) {
        if self.row_count() == 0 {
            return;
        }
        let i = self.state.selected().map_or(0, |i| i.saturating_sub(PAGE_JUMP));
        self.state.select(Some(i));
    }

    pub fn first(&mut self) {
        if self.row_count() > 0 {
            self.state.select(Some(0));
        }
    }

    pub fn last(&mut self) {
        let len = self.row_count();
        if len > 0 {
            self.state.select(Some(len - 1));
        }
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res.map_err(Into::into)
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Enter => app.toggle_detail(),
                KeyCode::Tab => app.next_page(),
                KeyCode::BackTab => app.previous_page(),
                KeyCode::Right | KeyCode::Char('l') => app.next_period(),
                KeyCode::Left | KeyCode::Char('h') => app.previous_period(),
                KeyCode::Down | KeyCode::Char('j') => app.next(),
                KeyCode::Up | KeyCode::Char('k') => app.previous(),
                KeyCode::PageDown => app.page_down(),
                KeyCode::PageUp => app.page_up(),
                KeyCode::Home => app.first(),
                KeyCode::End => app.last(),
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return Ok(()),
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with navigation
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    if app.show_detail {
        let content_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(chunks[1]);

        render_table(f, content_chunks[0], app);
        render_detail_panel(f, content_chunks[1], app);
    } else {
        render_table(f, chunks[1], app);
    }

    render_status_bar(f, chunks[2], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let pages = [
        Page::Preview,
        Page::Changes(ChangeKind::Added),
        Page::Changes(ChangeKind::Removed),
        Page::Changes(ChangeKind::Reappeared),
    ];

    let mut tab_spans = vec![];
    for (i, page) in pages.iter().enumerate() {
        if i > 0 {
            tab_spans.push(Span::raw(" │ "));
        }

        let label = match page {
            Page::Preview => page.title().to_string(),
            Page::Changes(kind) => format!("{} ({})", kind.name(), app.tables.get(*kind).len()),
        };

        let style = if *page == app.current_page {
            Style::default()
                .fg(page.color())
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        tab_spans.push(Span::styled(label, style));
    }

    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Years: {}", app.periods.len()),
        Style::default().fg(Color::White),
    ));

    let header = Paragraph::new(vec![Line::from(tab_spans)])
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)));

    f.render_widget(header, area);
}

fn render_table(f: &mut Frame, area: Rect, app: &mut App) {
    let title = match app.current_page {
        Page::Preview => match app.periods.get(app.current_period) {
            Some((key, _)) => format!(" 📆 {} Data ({}/{}) ", key, app.current_period + 1, app.periods.len()),
            None => " No data ".to_string(),
        },
        Page::Changes(kind) => format!(" {} Chipsets ", kind.name()),
    };
    let color = app.current_page.color();

    let Some(table) = app.current_table() else {
        let empty = Paragraph::new("  No periods loaded")
            .block(Block::default().borders(Borders::ALL).title(title));
        f.render_widget(empty, area);
        return;
    };

    let widths = column_widths(table);
    let key_column = app.identifier_column();

    let header_cells = table.columns.iter().map(|h| {
        Cell::from(h.clone()).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
    });
    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows: Vec<Row> = table
        .rows
        .iter()
        .map(|row| {
            let cells = row.iter().enumerate().map(|(i, cell)| {
                let text = truncate(cell, widths[i] as usize);
                if Some(i) == key_column {
                    Cell::from(text).style(Style::default().fg(color))
                } else {
                    Cell::from(text)
                }
            });
            Row::new(cells).height(1)
        })
        .collect();

    let constraints: Vec<Constraint> = widths.iter().map(|w| Constraint::Length(*w + 2)).collect();

    let widget = Table::new(rows, constraints)
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(title),
        )
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
        .highlight_symbol("→ ");

    f.render_stateful_widget(widget, area, &mut app.state);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let selected = app.state.selected().map(|i| i + 1).unwrap_or(0);
    let total = app.row_count();

    let mut status_spans = vec![Span::styled(
        format!(" Row: {}/{} ", selected, total),
        Style::default().fg(Color::Cyan),
    )];

    status_spans.push(Span::raw(" | "));
    status_spans.push(Span::styled("Enter", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Details | "));
    status_spans.push(Span::styled("Tab", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Page | "));
    if app.current_page == Page::Preview {
        status_spans.push(Span::styled("←/→", Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(" Year | "));
    }
    status_spans.push(Span::styled("↑/↓", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Nav | "));
    status_spans.push(Span::styled("PgUp/PgDn", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Fast | "));
    status_spans.push(Span::styled("q", Style::default().fg(Color::Red)));
    status_spans.push(Span::raw(" Quit"));

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn render_detail_panel(f: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Chipset Details ");

    let Some((columns, row)) = app.selected_row() else {
        f.render_widget(Paragraph::new("No row selected").block(block), area);
        return;
    };

    let mut content = vec![Line::from("")];
    for (name, value) in columns.iter().zip(row) {
        content.push(Line::from(vec![
            Span::styled(
                format!("  {}: ", name),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
            Span::raw(value.clone()),
        ]));
        content.push(Line::from(""));
    }
    content.push(Line::from(vec![Span::styled(
        "  Press Enter to close",
        Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
    )]));

    f.render_widget(Paragraph::new(content).block(block), area);
}

/// Display width per column, capped so wide payload columns don't crowd the rest
fn column_widths(table: &NumberedTable) -> Vec<u16> {
    const MAX_WIDTH: usize = 32;

    table
        .columns
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let widest = table
                .rows
                .iter()
                .filter_map(|r| r.get(i))
                .map(|c| c.chars().count())
                .max()
                .unwrap_or(0);
            widest.max(name.chars().count()).min(MAX_WIDTH) as u16
        })
        .collect()
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comparator::compare;
    use crate::record::ChipsetRecord;

    fn app() -> App {
        let chip = |id: &str| ChipsetRecord::new().with("Chipset SP", id);
        let mut history = ChipsetHistory::new();
        history.insert_period(PeriodKey::new("2022").unwrap(), vec![chip("a"), chip("b")]);
        history.insert_period(PeriodKey::new("2023").unwrap(), vec![chip("b")]);

        let report = compare(&history).unwrap();
        App::new(&history, ReportTables::new(&report, true, "Sr. No"), &Config::default())
    }

    #[test]
    fn test_page_cycle() {
        let mut page = Page::Preview;
        for _ in 0..4 {
            page = page.next();
        }
        assert_eq!(page, Page::Preview);
        assert_eq!(Page::Preview.previous(), Page::Changes(ChangeKind::Reappeared));
        assert_eq!(Page::Changes(ChangeKind::Removed).title(), "Removed");
    }

    #[test]
    fn test_navigation_wraps() {
        let mut app = app();
        assert_eq!(app.state.selected(), Some(0));

        app.next();
        assert_eq!(app.state.selected(), Some(1));
        app.next();
        assert_eq!(app.state.selected(), Some(0));
        app.previous();
        assert_eq!(app.state.selected(), Some(1));
    }

    #[test]
    fn test_period_switching_only_on_preview() {
        let mut app = app();
        app.next_period();
        assert_eq!(app.current_period, 1);
        assert_eq!(app.current_table().unwrap().len(), 1);

        app.next_page();
        app.next_period();
        assert_eq!(app.current_period, 1);
        assert_eq!(app.current_page, Page::Changes(ChangeKind::Added));
    }

    #[test]
    fn test_empty_page_has_no_selection() {
        let mut app = app();
        app.current_page = Page::Changes(ChangeKind::Removed);
        app.next_page();
        assert_eq!(app.current_page, Page::Changes(ChangeKind::Reappeared));
        assert_eq!(app.state.selected(), None);
        assert!(app.selected_row().is_none());
        app.page_down();
        assert_eq!(app.state.selected(), None);
    }

    #[test]
    fn test_selected_row_detail() {
        let mut app = app();
        app.next_page();
        let (columns, row) = app.selected_row().unwrap();
        assert_eq!(columns[1], "Year");
        assert_eq!(row[2], "a");
    }

    #[test]
    fn test_identifier_column_found_by_name() {
        let mut app = app();
        // Preview tables have no Year column
        assert_eq!(app.identifier_column(), Some(1));
        app.next_page();
        assert_eq!(app.identifier_column(), Some(2));

        app.identifier_field = "Stamp".to_string();
        assert_eq!(app.identifier_column(), None);
    }

    #[test]
    fn test_preview_uses_configured_serial_column() {
        let chip = ChipsetRecord::new().with("Chipset SP", "a");
        let mut history = ChipsetHistory::new();
        history.insert_period(PeriodKey::new("2022").unwrap(), vec![chip]);
        let report = compare(&history).unwrap();

        let config = Config {
            serial_column: "Row".to_string(),
            ..Config::default()
        };
        let app = App::new(&history, ReportTables::new(&report, false, "Row"), &config);
        assert_eq!(app.current_table().unwrap().columns, vec!["Row", "Chipset SP"]);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("SP100", 10), "SP100");
        assert_eq!(truncate("Very long customer name", 10), "Very lo...");
    }
}
