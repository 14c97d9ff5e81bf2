mod tui_app;

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap},
    Frame, Terminal,
};
use tui_app::{
    format_latency_us, format_listing_mode, format_price, format_tier, showing_line, truncate,
    AppState, AssetDetailResponse, ConnectionStatus, TIERS,
};

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> io::Result<()> {
    let base_url = std::env::var("API_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
        .expect("failed to build HTTP client");

    let mut app = AppState::new(base_url);

    // Initial fetch before rendering
    app.refresh(&client).await;

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut table_state = TableState::default();
    table_state.select(None);

    let result = run_loop(&mut terminal, &mut app, &client, &mut table_state).await;

    // Restore terminal regardless of result
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

// ---------------------------------------------------------------------------
// Main event loop
// ---------------------------------------------------------------------------

async fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut AppState,
    client: &reqwest::Client,
    table_state: &mut TableState,
) -> io::Result<()> {
    let refresh_interval = Duration::from_secs(5);
    let mut last_tick = std::time::Instant::now();

    loop {
        terminal.draw(|f| render(f, app, table_state))?;

        let timeout = refresh_interval
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);

        let mut requery = false;
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    if app.search_mode {
                        match key.code {
                            KeyCode::Char(c) => app.query.search.push(c),
                            KeyCode::Backspace => {
                                app.query.search.pop();
                            }
                            KeyCode::Enter | KeyCode::Esc => app.search_mode = false,
                            _ => {}
                        }
                        requery = true;
                    } else {
                        match key.code {
                            KeyCode::Char('q') | KeyCode::Char('Q') => return Ok(()),
                            KeyCode::Char('r') | KeyCode::Char('R') => requery = true,
                            KeyCode::Char('/') => app.search_mode = true,
                            KeyCode::Char('w') => {
                                app.query.watch = !app.query.watch;
                                requery = true;
                            }
                            KeyCode::Char('t') => {
                                app.query.trait_kind = !app.query.trait_kind;
                                requery = true;
                            }
                            KeyCode::Char('l') => {
                                app.query.toggle_listed();
                                requery = true;
                            }
                            KeyCode::Char('a') => {
                                app.query.toggle_show_all();
                                requery = true;
                            }
                            KeyCode::Char(c @ '1'..='5') => {
                                app.query.toggle_tier(c as usize - '1' as usize);
                                requery = true;
                            }
                            KeyCode::Char('s') => {
                                app.query.cycle_sort();
                                requery = true;
                            }
                            KeyCode::Char('p') => {
                                app.query.basic_profile = !app.query.basic_profile;
                                requery = true;
                            }
                            KeyCode::Char('c') => {
                                app.query.clear();
                                requery = true;
                            }
                            KeyCode::Down | KeyCode::Char('j') => {
                                let max = app.catalog.assets.len().saturating_sub(1);
                                let next = table_state.selected().map_or(0, |i| (i + 1).min(max));
                                table_state.select(Some(next));
                            }
                            KeyCode::Up | KeyCode::Char('k') => {
                                let prev = table_state
                                    .selected()
                                    .map_or(0, |i| i.saturating_sub(1));
                                table_state.select(Some(prev));
                            }
                            KeyCode::Enter => {
                                let selected = table_state
                                    .selected()
                                    .and_then(|i| app.catalog.assets.get(i))
                                    .map(|a| a.id.clone());
                                if let Some(id) = selected {
                                    app.fetch_detail(client, &id).await;
                                }
                            }
                            KeyCode::Esc => app.clear_detail(),
                            _ => {}
                        }
                    }
                }
            }
        }

        if requery || last_tick.elapsed() >= refresh_interval {
            app.refresh(client).await;
            clamp_selection(table_state, app.catalog.assets.len());
            last_tick = std::time::Instant::now();
        }
    }
}

fn clamp_selection(state: &mut TableState, len: usize) {
    match (state.selected(), len) {
        (_, 0) => state.select(None),
        (Some(i), n) if i >= n => state.select(Some(n - 1)),
        _ => {}
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn render(f: &mut Frame, app: &AppState, table_state: &mut TableState) {
    let area = f.area();

    // Outer vertical split: header | filters | body | footer
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // header
            Constraint::Length(3), // filters
            Constraint::Min(0),    // body
            Constraint::Length(1), // footer
        ])
        .split(area);

    render_header(f, app, chunks[0]);
    render_filters(f, app, chunks[1]);
    render_body(f, app, table_state, chunks[2]);
    render_footer(f, app, chunks[3]);
}

fn render_header(f: &mut Frame, app: &AppState, area: Rect) {
    let (status_text, status_color) = match &app.status {
        ConnectionStatus::Connected => ("● connected".to_string(), Color::Green),
        ConnectionStatus::Connecting => ("◌ connecting".to_string(), Color::Yellow),
        ConnectionStatus::Error(e) => (format!("✗ {}", truncate(e, 40)), Color::Red),
    };

    let title_spans = vec![
        Span::styled(
            " Xioverse Marketplace  ",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(status_text, Style::default().fg(status_color)),
        Span::raw("  │  "),
        Span::styled(
            showing_line(app.catalog.showing, app.catalog.total),
            Style::default().fg(Color::White),
        ),
        Span::raw("  │  "),
        Span::styled(
            format!("p99 {}", format_latency_us(app.latency.p99_us)),
            Style::default().fg(Color::White),
        ),
        Span::raw("  │  "),
        Span::styled(
            format!("{} owned", app.health.owned_assets),
            Style::default().fg(Color::White),
        ),
    ];

    let paragraph = Paragraph::new(Line::from(title_spans))
        .block(Block::default().borders(Borders::ALL).border_style(
            Style::default().fg(Color::DarkGray),
        ));

    f.render_widget(paragraph, area);
}

fn toggle_span(label: &str, on: bool) -> Span<'static> {
    let style = if on {
        Style::default().fg(Color::Black).bg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    Span::styled(format!(" {label} "), style)
}

fn render_filters(f: &mut Frame, app: &AppState, area: Rect) {
    let q = &app.query;
    let search_style = if app.search_mode {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::White)
    };
    let cursor = if app.search_mode { "▏" } else { "" };

    let mut spans = vec![
        Span::styled(" search: ", Style::default().fg(Color::DarkGray)),
        Span::styled(format!("{}{cursor}", truncate(&q.search, 20)), search_style),
        Span::raw("  "),
        toggle_span("All", q.show_all),
        toggle_span("Listed", q.listed),
        Span::raw(" "),
        toggle_span("Watch", q.watch),
        toggle_span("Trait", q.trait_kind),
        Span::raw(" "),
    ];
    for (i, tier) in TIERS.iter().enumerate() {
        spans.push(toggle_span(tier, q.tiers.contains(&i)));
    }
    spans.push(Span::raw("  "));
    spans.push(Span::styled(q.sort_label(), Style::default().fg(Color::Magenta)));
    if q.basic_profile {
        spans.push(Span::styled("  [basic]", Style::default().fg(Color::DarkGray)));
    }

    let paragraph = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(Span::styled(
                " FILTERS ",
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            )),
    );
    f.render_widget(paragraph, area);
}

fn render_body(f: &mut Frame, app: &AppState, table_state: &mut TableState, area: Rect) {
    match &app.detail {
        Some(detail) => {
            // Horizontal split: catalog (55%) | detail (45%)
            let halves = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
                .split(area);
            render_catalog_table(f, app, table_state, halves[0]);
            render_detail(f, detail, halves[1]);
        }
        None => render_catalog_table(f, app, table_state, area),
    }
}

fn render_catalog_table(f: &mut Frame, app: &AppState, state: &mut TableState, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            " CATALOG ",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ));

    if app.catalog.assets.is_empty() {
        let message = if app.catalog.total == 0 {
            "Catalog is empty."
        } else {
            "No items match the current filters. Press [c] to clear them."
        };
        let paragraph = Paragraph::new(Line::from(Span::styled(
            message,
            Style::default().fg(Color::DarkGray),
        )))
        .block(block);
        f.render_widget(paragraph, area);
        return;
    }

    let header_cells = ["#", "Name", "Kind", "Theme", "Tier", "Score", "Price", "Mode"]
        .iter()
        .map(|h| Cell::from(*h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)));
    let header = Row::new(header_cells).height(1);

    let rows: Vec<Row> = app
        .catalog
        .assets
        .iter()
        .enumerate()
        .map(|(i, a)| {
            let kind = match &a.trait_type {
                Some(t) => format!("Trait/{t}"),
                None => a.kind.clone(),
            };
            let score_color = if a.rarity_score >= 90.0 {
                Color::Magenta
            } else if a.rarity_score >= 75.0 {
                Color::Green
            } else {
                Color::White
            };

            Row::new(vec![
                Cell::from(format!("{}", i + 1)).style(Style::default().fg(Color::DarkGray)),
                Cell::from(truncate(&a.name, 24)),
                Cell::from(kind).style(Style::default().fg(Color::Cyan)),
                Cell::from(a.theme.clone()),
                Cell::from(format_tier(&a.rarity_tier)),
                Cell::from(format!("{:.1}", a.rarity_score)).style(Style::default().fg(score_color)),
                Cell::from(format_price(a.price)),
                Cell::from(format_listing_mode(&a.listing_mode))
                    .style(Style::default().fg(Color::DarkGray)),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(3),
            Constraint::Min(12),
            Constraint::Length(14),
            Constraint::Length(12),
            Constraint::Length(10),
            Constraint::Length(6),
            Constraint::Length(10),
            Constraint::Length(8),
        ],
    )
    .header(header)
    .block(block)
    .row_highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    );

    f.render_stateful_widget(table, area, state);
}

fn render_detail(f: &mut Frame, detail: &AssetDetailResponse, area: Rect) {
    let a = &detail.asset;
    let label = Style::default().fg(Color::DarkGray);
    let field = |name: &str, value: String| {
        Line::from(vec![
            Span::styled(format!("{name:<12}"), label),
            Span::raw(value),
        ])
    };

    let mut lines = vec![
        Line::from(Span::styled(
            a.name.clone(),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        field("Token", detail.token_id.clone()),
        field("Kind", a.trait_type.clone().map_or(a.kind.clone(), |t| format!("{} ({t})", a.kind))),
        field("Theme", a.theme.clone()),
        field("Tier", format_tier(&a.rarity_tier)),
        field("Score", format!("{:.1}", a.rarity_score)),
        field("Price", format_price(a.price)),
        field("Last sold", format_price(a.last_sold_price)),
        field("Listing", format_listing_mode(&a.listing_mode).to_string()),
    ];
    if let Some(auction) = &a.auction {
        lines.push(field("Top bid", format_price(auction.highest_bid)));
        lines.push(field("Ends in", auction.ends_at.clone()));
    }
    let owner = if detail.owned_by_session {
        format!("{} (you)", detail.owner_short)
    } else {
        detail.owner_short.clone()
    };
    lines.push(field("Owner", owner));
    lines.push(field("Explorer", detail.token_url.clone()));

    if let Some(components) = &detail.components {
        lines.push(Line::raw(""));
        let slots = [
            ("Strap", &components.strap),
            ("Dial", &components.dial),
            ("Item", &components.item),
            ("Hologram", &components.hologram),
        ];
        for (slot, c) in slots {
            lines.push(field(slot, format!("{} · {} · {:.1}", c.name, c.theme, c.rarity_score)));
        }
    }
    if let Some(lore) = &detail.lore {
        lines.push(Line::raw(""));
        lines.push(Line::from(Span::styled(
            lore.clone(),
            Style::default().fg(Color::White).add_modifier(Modifier::ITALIC),
        )));
    }

    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true }).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(Span::styled(
                format!(" #{} ", a.id),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            )),
    );
    f.render_widget(paragraph, area);
}

fn render_footer(f: &mut Frame, app: &AppState, area: Rect) {
    let key = Style::default().fg(Color::Yellow);
    let line = if app.search_mode {
        Line::from(vec![
            Span::styled(" typing search ", key),
            Span::raw("[enter/esc] done  "),
            Span::styled("[backspace] ", key),
            Span::raw("delete"),
        ])
    } else {
        Line::from(vec![
            Span::styled(" [q] ", key),
            Span::raw("quit  "),
            Span::styled("[/] ", key),
            Span::raw("search  "),
            Span::styled("[w t] ", key),
            Span::raw("kind  "),
            Span::styled("[l a] ", key),
            Span::raw("listed/all  "),
            Span::styled("[1-5] ", key),
            Span::raw("tier  "),
            Span::styled("[s] ", key),
            Span::raw("sort  "),
            Span::styled("[p] ", key),
            Span::raw("profile  "),
            Span::styled("[c] ", key),
            Span::raw("clear  "),
            Span::styled("[↑↓ enter esc] ", key),
            Span::raw("detail  "),
            Span::styled("auto-refresh: 5s", Style::default().fg(Color::DarkGray)),
        ])
    };
    let paragraph = Paragraph::new(line).style(Style::default().fg(Color::White));
    f.render_widget(paragraph, area);
}
