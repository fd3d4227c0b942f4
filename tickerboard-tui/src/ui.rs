use crate::app::{App, InputMode, Screen};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Cell, Paragraph, Row, Table, TableState},
};
use rust_decimal::Decimal;
use tickerboard_data::{
    feed::ConnectionStatus,
    portfolio::ValuedPosition,
    storage::Theme,
    views::{self, QuoteFilter},
};

/// Colours of one [`Theme`].
struct Palette {
    background: Color,
    row_alt: Color,
    text: Color,
    muted: Color,
    accent: Color,
    border: Color,
    up: Color,
    down: Color,
    highlight: Color,
}

impl Palette {
    fn of(theme: Theme) -> Self {
        match theme {
            Theme::Dark => Self {
                background: Color::Rgb(15, 15, 25),
                row_alt: Color::Rgb(25, 25, 35),
                text: Color::Rgb(200, 200, 220),
                muted: Color::Rgb(128, 128, 150),
                accent: Color::Rgb(255, 215, 0),
                border: Color::Rgb(138, 43, 226),
                up: Color::Rgb(0, 255, 127),
                down: Color::Rgb(255, 69, 58),
                highlight: Color::Rgb(45, 45, 70),
            },
            Theme::Light => Self {
                background: Color::Rgb(250, 250, 252),
                row_alt: Color::Rgb(236, 236, 242),
                text: Color::Rgb(30, 30, 40),
                muted: Color::Rgb(110, 110, 125),
                accent: Color::Rgb(0, 102, 204),
                border: Color::Rgb(120, 120, 140),
                up: Color::Rgb(0, 140, 70),
                down: Color::Rgb(200, 30, 30),
                highlight: Color::Rgb(210, 220, 245),
            },
        }
    }

    fn signed(&self, value: Decimal) -> Color {
        if value >= Decimal::ZERO { self.up } else { self.down }
    }
}

pub fn render(f: &mut Frame, app: &App) {
    let palette = Palette::of(app.settings.theme);
    f.render_widget(Block::default().style(Style::default().bg(palette.background)), f.area());

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(banner_height(app)),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(f.area());

    render_status_bar(f, chunks[0], app, &palette);
    render_banner(f, chunks[1], app, &palette);

    match app.screen {
        Screen::Markets => render_markets(f, chunks[2], app, &palette),
        Screen::Portfolio => render_portfolio(f, chunks[2], app, &palette),
    }

    render_footer(f, chunks[3], app, &palette);
}

fn banner_height(app: &App) -> u16 {
    if app.last_error.is_some() { 1 } else { 0 }
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App, palette: &Palette) {
    let (symbol, text, color) = match app.live_status {
        ConnectionStatus::Connected => ("●", "LIVE", palette.up),
        ConnectionStatus::Reconnecting => ("◐", "RECONNECTING", palette.accent),
        ConnectionStatus::Disconnected => ("○", "OFFLINE", palette.down),
    };

    let tabs = QuoteFilter::ALL.iter().enumerate().map(|(index, filter)| {
        let style = if *filter == app.query.class {
            Style::default().fg(palette.accent).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(palette.muted)
        };
        Span::styled(format!(" {}:{} ", index + 1, filter), style)
    });

    let mut spans = vec![
        Span::styled(
            format!(" {symbol} {text} "),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            " ◆ TICKERBOARD ◆ ",
            Style::default().fg(palette.accent).add_modifier(Modifier::BOLD),
        ),
    ];
    spans.extend(tabs);
    spans.push(Span::styled(
        format!(" {} tickers ", app.mapping.len()),
        Style::default().fg(palette.muted),
    ));

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Double)
        .border_style(Style::default().fg(palette.border))
        .style(Style::default().bg(palette.background));

    let paragraph = Paragraph::new(Line::from(spans))
        .block(block)
        .alignment(Alignment::Center);

    f.render_widget(paragraph, area);
}

fn render_banner(f: &mut Frame, area: Rect, app: &App, palette: &Palette) {
    let Some(error) = &app.last_error else {
        return;
    };

    let banner = Paragraph::new(Line::from(Span::styled(
        format!(" ⚠ failed to load: {error} (showing last good data) "),
        Style::default()
            .fg(Color::Rgb(255, 255, 255))
            .bg(palette.down)
            .add_modifier(Modifier::BOLD),
    )));

    f.render_widget(banner, area);
}

fn render_markets(f: &mut Frame, area: Rect, app: &App, palette: &Palette) {
    let records = app.rows();

    let header_cells = ["", "SYMBOL", "PAIR", "PRICE", "24H %", "VOLUME"].iter().map(|h| {
        Cell::from(*h).style(Style::default().fg(palette.accent).add_modifier(Modifier::BOLD))
    });
    let header = Row::new(header_cells).height(1);

    let rows = records.iter().enumerate().map(|(index, record)| {
        let bg = if index % 2 == 0 { palette.background } else { palette.row_alt };
        let change_color = match record.price_change_percent {
            Some(change) => palette.signed(change),
            None => palette.muted,
        };
        let star = if app.favorites.contains(&record.symbol) { "★" } else { " " };

        Row::new(vec![
            Cell::from(star).style(Style::default().fg(palette.accent)),
            Cell::from(record.symbol.to_string()).style(Style::default().fg(palette.text)),
            Cell::from(record.display_pair.to_string()).style(Style::default().fg(palette.muted)),
            Cell::from(views::format_price(record))
                .style(Style::default().fg(palette.text).add_modifier(Modifier::BOLD)),
            Cell::from(views::format_change(record)).style(Style::default().fg(change_color)),
            Cell::from(views::format_volume(record)).style(Style::default().fg(palette.muted)),
        ])
        .style(Style::default().bg(bg))
    });

    let title = Line::from(vec![
        Span::styled(
            " MARKETS ",
            Style::default().fg(palette.text).add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!(
                "({}) sort: {} {} ",
                records.len(),
                app.query.column.as_str(),
                match app.query.direction {
                    views::SortDirection::Ascending => "▲",
                    views::SortDirection::Descending => "▼",
                }
            ),
            Style::default().fg(palette.muted),
        ),
    ]);

    let table = Table::new(
        rows,
        [
            Constraint::Length(2),
            Constraint::Length(14),
            Constraint::Length(12),
            Constraint::Length(16),
            Constraint::Length(10),
            Constraint::Min(14),
        ],
    )
    .header(header)
    .row_highlight_style(Style::default().bg(palette.highlight).add_modifier(Modifier::BOLD))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(palette.border))
            .title_top(title.alignment(Alignment::Center)),
    );

    let mut state = TableState::default().with_selected((!records.is_empty()).then_some(app.selected));
    f.render_stateful_widget(table, area, &mut state);
}

fn render_portfolio(f: &mut Frame, area: Rect, app: &App, palette: &Palette) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(4)])
        .split(area);

    let valuation = app.portfolio.valuation();

    let header_cells = ["SYMBOL", "AMOUNT", "BUY", "PRICE", "VALUE", "P&L", "P&L %"].iter().map(|h| {
        Cell::from(*h).style(Style::default().fg(palette.accent).add_modifier(Modifier::BOLD))
    });
    let header = Row::new(header_cells).height(1);

    let rows = valuation
        .positions
        .iter()
        .map(|valued| position_row(valued, palette));

    let table = Table::new(
        rows,
        [
            Constraint::Length(12),
            Constraint::Length(14),
            Constraint::Length(14),
            Constraint::Length(14),
            Constraint::Length(16),
            Constraint::Length(16),
            Constraint::Min(10),
        ],
    )
    .header(header)
    .row_highlight_style(Style::default().bg(palette.highlight).add_modifier(Modifier::BOLD))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(palette.border))
            .title_top(
                Line::from(Span::styled(
                    format!(" PORTFOLIO ({}) ", valuation.positions.len()),
                    Style::default().fg(palette.text).add_modifier(Modifier::BOLD),
                ))
                .alignment(Alignment::Center),
            ),
    );

    let mut state = TableState::default()
        .with_selected((!valuation.positions.is_empty()).then_some(app.position_selected));
    f.render_stateful_widget(table, chunks[0], &mut state);

    let totals = &valuation.totals;
    let mut lines = vec![Line::from(vec![
        Span::styled(" Invested ", Style::default().fg(palette.muted)),
        Span::styled(
            format!("${} ", views::fixed_decimals(totals.investment, 2)),
            Style::default().fg(palette.text),
        ),
        Span::styled(" Value ", Style::default().fg(palette.muted)),
        Span::styled(
            format!("${} ", views::fixed_decimals(totals.current_value, 2)),
            Style::default().fg(palette.text).add_modifier(Modifier::BOLD),
        ),
        Span::styled(" P&L ", Style::default().fg(palette.muted)),
        Span::styled(
            format!(
                "${} ({}%)",
                views::fixed_decimals(totals.profit, 2),
                views::fixed_decimals(totals.profit_percent, 2)
            ),
            Style::default().fg(palette.signed(totals.profit)).add_modifier(Modifier::BOLD),
        ),
    ])];

    if totals.unpriced > 0 || totals.stale > 0 {
        lines.push(Line::from(Span::styled(
            format!(
                " {} awaiting price, {} showing last known value",
                totals.unpriced, totals.stale
            ),
            Style::default().fg(palette.muted),
        )));
    }

    let summary = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(palette.border))
            .title(" TOTALS "),
    );
    f.render_widget(summary, chunks[1]);
}

fn position_row<'a>(valued: &'a ValuedPosition, palette: &Palette) -> Row<'a> {
    let position = &valued.position;
    let mut cells = vec![
        Cell::from(position.symbol.to_string()).style(Style::default().fg(palette.text)),
        Cell::from(position.amount.normalize().to_string()).style(Style::default().fg(palette.text)),
        Cell::from(position.buy_price.normalize().to_string()).style(Style::default().fg(palette.muted)),
    ];

    match &valued.quote {
        Some(quote) => {
            let stale = if valued.stale { "*" } else { "" };
            let color = palette.signed(quote.profit);
            cells.extend([
                Cell::from(format!("{}{stale}", quote.current_price.normalize()))
                    .style(Style::default().fg(palette.text)),
                Cell::from(views::fixed_decimals(quote.current_value, 2))
                    .style(Style::default().fg(palette.text).add_modifier(Modifier::BOLD)),
                Cell::from(views::fixed_decimals(quote.profit, 2)).style(Style::default().fg(color)),
                Cell::from(format!("{}%", views::fixed_decimals(quote.profit_percent, 2)))
                    .style(Style::default().fg(color)),
            ]);
        }
        None => cells.extend(
            std::iter::repeat_n("-", 4).map(|text| Cell::from(text).style(Style::default().fg(palette.muted))),
        ),
    }

    Row::new(cells)
}

fn render_footer(f: &mut Frame, area: Rect, app: &App, palette: &Palette) {
    let line = match app.input_mode {
        InputMode::Normal => {
            let mut spans = Vec::new();
            if let Some((form, calculation)) = &app.calculation {
                spans.push(Span::styled(
                    format!(
                        " {} → {} × {}: net ${} ({}%) fees ${} ",
                        form.entry_price,
                        form.exit_price,
                        form.amount,
                        views::fixed_decimals(calculation.net_profit, 2),
                        views::fixed_decimals(calculation.roi_percent, 2),
                        views::fixed_decimals(calculation.fees, 2),
                    ),
                    Style::default().fg(palette.signed(calculation.net_profit)),
                ));
            }
            match &app.message {
                Some(message) => spans.push(Span::styled(
                    format!(" {message} "),
                    Style::default().fg(palette.accent),
                )),
                None => spans.push(Span::styled(help(app.screen), Style::default().fg(palette.muted))),
            }
            Line::from(spans)
        }
        mode => {
            let prompt = match mode {
                InputMode::Search => "search",
                InputMode::AddPosition => "add SYMBOL AMOUNT PRICE",
                InputMode::Calculator => "calc ENTRY EXIT AMOUNT [FEE%]",
                InputMode::Normal => "",
            };
            Line::from(vec![
                Span::styled(
                    format!(" {prompt} › "),
                    Style::default().fg(palette.accent).add_modifier(Modifier::BOLD),
                ),
                Span::styled(format!("{}█", app.input), Style::default().fg(palette.text)),
            ])
        }
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(palette.border));

    f.render_widget(Paragraph::new(line).block(block), area);
}

fn help(screen: Screen) -> &'static str {
    match screen {
        Screen::Markets => {
            " [1-4] filter [s] sort [r] reverse [/] search [f] fav [Tab] portfolio [c] calc [t] theme [F5] refresh [q] quit "
        }
        Screen::Portfolio => {
            " [a] add [d] remove [↑/↓] select [Tab] markets [c] calc [t] theme [q] quit "
        }
    }
}
