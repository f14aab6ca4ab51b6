mod app;

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use combat_etl::config::{DEFAULT_COMBATS_CSV, DEFAULT_DETAILS_CSV};
use combat_etl::table::TablePreview;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Cell, Paragraph, Row, Table, Tabs},
    Frame, Terminal,
};

use app::{format_opt, format_rate, heat_color, truncate, AppState, LoadStatus, Tab};

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() -> io::Result<()> {
    let combats_path = PathBuf::from(
        std::env::var("COMBATS_CSV").unwrap_or_else(|_| DEFAULT_COMBATS_CSV.to_string()),
    );
    let details_path = PathBuf::from(
        std::env::var("DETAILS_CSV").unwrap_or_else(|_| DEFAULT_DETAILS_CSV.to_string()),
    );

    // Load before touching the terminal so a missing file is reported plainly.
    let mut app = match AppState::new(combats_path, details_path) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Failed to load tables: {e}");
            std::process::exit(1);
        }
    };

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_loop(&mut terminal, &mut app);

    // Restore terminal regardless of result
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

// ---------------------------------------------------------------------------
// Main event loop
// ---------------------------------------------------------------------------

fn run_loop(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut AppState) -> io::Result<()> {
    loop {
        terminal.draw(|f| render(f, app))?;

        if !event::poll(Duration::from_millis(250))? {
            continue;
        }
        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match key.code {
                KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => return Ok(()),
                KeyCode::Char('r') | KeyCode::Char('R') => app.reload(),
                KeyCode::Tab | KeyCode::Right => app.switch_tab(app.tab.next()),
                KeyCode::BackTab | KeyCode::Left => app.switch_tab(app.tab.prev()),
                KeyCode::Down | KeyCode::Char('j') => app.scroll_down(),
                KeyCode::Up | KeyCode::Char('k') => app.scroll_up(),
                _ => {}
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn render(f: &mut Frame, app: &AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // header
            Constraint::Length(3), // tabs
            Constraint::Min(0),    // body
            Constraint::Length(1), // footer
        ])
        .split(f.area());

    render_header(f, app, chunks[0]);
    render_tabs(f, app, chunks[1]);
    match app.tab {
        Tab::Overview => render_overview(f, app, chunks[2]),
        Tab::Stats => render_stats(f, app, chunks[2]),
        Tab::Matchups => render_matchups(f, app, chunks[2]),
        Tab::Samples => render_samples(f, app, chunks[2]),
    }
    render_footer(f, chunks[3]);
}

fn panel(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            format!(" {title} "),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ))
}

fn header_row(cells: &[&str]) -> Row<'static> {
    let cells: Vec<Cell> = cells
        .iter()
        .map(|h| {
            Cell::from(h.to_string())
                .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
        })
        .collect();
    Row::new(cells).height(1)
}

fn render_header(f: &mut Frame, app: &AppState, area: Rect) {
    let data = &app.snapshot.data;
    let (status_text, status_color) = match &app.status {
        LoadStatus::Loaded => ("● loaded".to_string(), Color::Green),
        LoadStatus::Error(e) => (format!("✗ {}", truncate(e, 50)), Color::Red),
    };
    let avg_attack = data
        .avg_winner_attack
        .map_or("—".to_string(), |a| format!("{a:.2}"));

    let line = Line::from(vec![
        Span::styled(
            " Combat Dashboard  ",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::styled(status_text, Style::default().fg(status_color)),
        Span::raw("  │  "),
        Span::styled(
            format!("{} combats", data.general.total_combats),
            Style::default().fg(Color::White),
        ),
        Span::raw("  │  "),
        Span::styled(
            format!("{} unique pokemon", data.general.unique_pokemon),
            Style::default().fg(Color::White),
        ),
        Span::raw("  │  "),
        Span::styled(
            format!("avg winner attack {avg_attack}"),
            Style::default().fg(Color::White),
        ),
    ]);
    let paragraph = Paragraph::new(line).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    f.render_widget(paragraph, area);
}

fn render_tabs(f: &mut Frame, app: &AppState, area: Rect) {
    let titles: Vec<Line> = Tab::ALL.iter().map(|t| Line::from(t.title())).collect();
    let tabs = Tabs::new(titles)
        .select(app.tab.index())
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::DarkGray)))
        .style(Style::default().fg(Color::White))
        .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));
    f.render_widget(tabs, area);
}

fn bar_chart<'a>(title: &'a str, bars: Vec<Bar<'a>>, direction: Direction) -> BarChart<'a> {
    BarChart::default()
        .block(panel(title))
        .data(BarGroup::default().bars(&bars))
        .direction(direction)
        .bar_width(1)
        .bar_gap(0)
        .bar_style(Style::default().fg(Color::LightYellow))
        .value_style(Style::default().fg(Color::Black).bg(Color::LightYellow))
}

fn render_overview(f: &mut Frame, app: &AppState, area: Rect) {
    let data = &app.snapshot.data;
    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let bars: Vec<Bar> = data
        .top_winners
        .iter()
        .map(|w| {
            Bar::default()
                .value(w.count)
                .label(Line::from(truncate(&w.name, 14)))
                .text_value(w.count.to_string())
        })
        .collect();
    f.render_widget(
        bar_chart("TOP 10 WINNERS", bars, Direction::Horizontal),
        halves[0],
    );

    let rows: Vec<Row> = data
        .win_rates
        .iter()
        .enumerate()
        .skip(app.scroll)
        .map(|(i, r)| {
            Row::new(vec![
                Cell::from(format!("{}", i + 1)).style(Style::default().fg(Color::DarkGray)),
                Cell::from(truncate(&r.name, 20)),
                Cell::from(format_rate(r.win_rate)).style(Style::default().fg(Color::Green)),
                Cell::from(r.wins.to_string()),
                Cell::from(r.appearances.to_string()).style(Style::default().fg(Color::Cyan)),
            ])
        })
        .collect();
    let table = Table::new(
        rows,
        [
            Constraint::Length(4),
            Constraint::Min(10),
            Constraint::Length(8),
            Constraint::Length(5),
            Constraint::Length(7),
        ],
    )
    .header(header_row(&["#", "Pokemon", "Win %", "Wins", "Combats"]))
    .block(panel("WIN RATE RANKING"));
    f.render_widget(table, halves[1]);
}

fn render_stats(f: &mut Frame, app: &AppState, area: Rect) {
    let data = &app.snapshot.data;
    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(area);

    let rows: Vec<Row> = data
        .winner_profiles
        .iter()
        .skip(app.scroll)
        .map(|p| {
            Row::new(vec![
                Cell::from(truncate(&p.name, 18)),
                Cell::from(p.wins.to_string()).style(Style::default().fg(Color::Cyan)),
                Cell::from(format_opt(p.attack)).style(Style::default().fg(Color::LightRed)),
                Cell::from(format_opt(p.defense)).style(Style::default().fg(Color::LightBlue)),
            ])
        })
        .collect();
    let table = Table::new(
        rows,
        [
            Constraint::Min(10),
            Constraint::Length(5),
            Constraint::Length(7),
            Constraint::Length(7),
        ],
    )
    .header(header_row(&["Top winner", "Wins", "Attack", "Defense"]))
    .block(panel("ATTACK VS DEFENSE"));
    f.render_widget(table, halves[0]);

    match &data.speed {
        Some(dist) => {
            let title = format!(
                "SPEED DISTRIBUTION  n={} p50={} p90={} max={}",
                dist.samples, dist.p50, dist.p90, dist.max
            );
            let bars: Vec<Bar> = dist
                .bins
                .iter()
                .map(|b| {
                    Bar::default()
                        .value(b.count)
                        .label(Line::from(format!("{:.0}", b.lower)))
                        .text_value(b.count.to_string())
                })
                .collect();
            let chart = bar_chart(&title, bars, Direction::Vertical).bar_width(4).bar_gap(1);
            f.render_widget(chart, halves[1]);
        }
        None => {
            let empty = Paragraph::new("No speed values in the details table")
                .style(Style::default().fg(Color::DarkGray))
                .block(panel("SPEED DISTRIBUTION"));
            f.render_widget(empty, halves[1]);
        }
    }
}

fn render_matchups(f: &mut Frame, app: &AppState, area: Rect) {
    let matrix = &app.snapshot.data.matrix;
    if matrix.is_empty() {
        let empty = Paragraph::new("No battles between single-type pokemon")
            .style(Style::default().fg(Color::DarkGray))
            .block(panel("TYPE MATCHUPS"));
        f.render_widget(empty, area);
        return;
    }

    let losers = matrix.loser_types();
    let most_beaten = matrix.most_beaten_type();
    let max = matrix.max_count();

    let mut header_cells = vec![Cell::from("winner ↓ / loser →")
        .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))];
    header_cells.extend(losers.iter().map(|l| {
        let highlighted = most_beaten.is_some_and(|(t, _)| t == *l);
        let style = if highlighted {
            Style::default().fg(Color::Black).bg(Color::LightRed).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        };
        Cell::from(truncate(l, 8)).style(style)
    }));

    let rows: Vec<Row> = matrix
        .winner_types()
        .into_iter()
        .skip(app.scroll)
        .map(|w| {
            let mut cells = vec![Cell::from(truncate(w, 18)).style(Style::default().fg(Color::Cyan))];
            cells.extend(losers.iter().map(|l| {
                let n = matrix.get(w, l);
                Cell::from(n.to_string()).style(Style::default().fg(heat_color(n, max)))
            }));
            Row::new(cells)
        })
        .collect();

    let mut widths = vec![Constraint::Length(19)];
    widths.extend(std::iter::repeat(Constraint::Length(8)).take(losers.len()));

    let title = match most_beaten {
        Some((t, n)) => format!("TYPE MATCHUPS  {} battles  most beaten: {t} ({n})", matrix.total()),
        None => "TYPE MATCHUPS".to_string(),
    };
    let table = Table::new(rows, widths)
        .header(Row::new(header_cells).height(1))
        .block(panel(&title));
    f.render_widget(table, area);
}

fn preview_table<'a>(preview: &'a TablePreview, title: &'a str) -> Table<'a> {
    let header: Vec<&str> = preview.headers.iter().map(String::as_str).collect();
    let rows: Vec<Row> = preview
        .rows
        .iter()
        .map(|r| Row::new(r.iter().map(|c| Cell::from(truncate(c, 14))).collect::<Vec<_>>()))
        .collect();
    let widths = vec![Constraint::Min(6); preview.headers.len().max(1)];
    Table::new(rows, widths)
        .header(header_row(&header))
        .block(panel(title))
}

fn render_samples(f: &mut Frame, app: &AppState, area: Rect) {
    let halves = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    f.render_widget(
        preview_table(&app.snapshot.combats_preview, "COMBATS SAMPLE"),
        halves[0],
    );
    f.render_widget(
        preview_table(&app.snapshot.details_preview, "POKEMON DETAILS SAMPLE"),
        halves[1],
    );
}

fn render_footer(f: &mut Frame, area: Rect) {
    let line = Line::from(vec![
        Span::styled(" [q] ", Style::default().fg(Color::Yellow)),
        Span::raw("quit  "),
        Span::styled("[r] ", Style::default().fg(Color::Yellow)),
        Span::raw("reload files  "),
        Span::styled("[tab / ← →] ", Style::default().fg(Color::Yellow)),
        Span::raw("switch view  "),
        Span::styled("[↑↓ / j k] ", Style::default().fg(Color::Yellow)),
        Span::raw("scroll"),
    ]);
    let paragraph = Paragraph::new(line).style(Style::default().fg(Color::White));
    f.render_widget(paragraph, area);
}
