pub mod animation;
pub mod screen;

use std::time::Instant;

use brailler::{
    braille,
    chord::DOT_KEYS,
    runtime::InputMode,
    scheduler::ActiveCharacter,
    util::format_time,
};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::App;

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

/// Width and height of one rendered braille cell, border included.
const CELL_WIDTH: u16 = 7;
const CELL_HEIGHT: u16 = 5;

/// Dot rows of a braille cell: (left dot, right dot).
const CELL_ROWS: [(u8, u8); 3] = [(1, 4), (2, 5), (3, 6)];

pub fn draw(app: &App, f: &mut Frame) {
    screen::current_screen(app.game.phase()).render(app, f);
}

pub fn render_countdown(app: &App, f: &mut Frame) {
    let area = f.area();
    let bold_style = Style::default().add_modifier(Modifier::BOLD);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(45),
            Constraint::Length(1),
            Constraint::Length(2),
            Constraint::Min(0),
        ])
        .split(area);

    let digit = Paragraph::new(Span::styled(
        app.game.countdown().to_string(),
        bold_style.fg(Color::Cyan),
    ))
    .alignment(Alignment::Center);
    f.render_widget(digit, chunks[1]);

    let hint = Paragraph::new(Span::styled(
        key_legend(app.input_mode),
        Style::default().add_modifier(Modifier::DIM),
    ))
    .alignment(Alignment::Center);
    f.render_widget(hint, chunks[2]);
}

pub fn render_gameplay(app: &App, f: &mut Frame) {
    let area = f.area();
    let now = Instant::now();
    let game = &app.game;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([
            Constraint::Length(3), // header
            Constraint::Length(3), // target word
            Constraint::Min(CELL_HEIGHT + 2), // playfield
            Constraint::Length(2), // chord + legend
        ])
        .split(area);

    render_header(app, f, chunks[0]);
    render_word(app, f, chunks[1]);

    let playfield = Block::default().borders(Borders::LEFT | Borders::RIGHT);
    let inner = playfield.inner(chunks[2]);
    f.render_widget(playfield, chunks[2]);

    let word_len = game.word().map_or(0, |w| w.len());
    let current = game.current().map(|c| c.index);
    for active in game.active().iter().filter(|a| !a.completed) {
        let is_current = current == Some(active.index);
        let progress = app.animations.entry_progress(active.index, now);
        render_falling_cell(f, inner, active, word_len, is_current, progress, now);
    }

    let pending = game.pending_chord();
    let chord_line = if pending.is_empty() {
        Line::from(Span::styled("chord: -", Style::default().add_modifier(Modifier::DIM)))
    } else {
        Line::from(vec![
            Span::raw("chord: "),
            Span::styled(
                format!("{} {}", braille::glyph(&pending), pending),
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
        ])
    };
    let footer = Paragraph::new(vec![
        chord_line,
        Line::from(Span::styled(
            key_legend(app.input_mode),
            Style::default().add_modifier(Modifier::DIM | Modifier::ITALIC),
        )),
    ])
    .alignment(Alignment::Center);
    f.render_widget(footer, chunks[3]);
}

fn render_header(app: &App, f: &mut Frame, area: Rect) {
    let game = &app.game;
    let bold_style = Style::default().add_modifier(Modifier::BOLD);

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(25),
            Constraint::Percentage(50),
            Constraint::Percentage(25),
        ])
        .split(area);

    let topic = Paragraph::new(Span::styled(
        game.settings().topic.to_string(),
        Style::default().fg(Color::Gray),
    ))
    .block(Block::default().borders(Borders::ALL))
    .alignment(Alignment::Center);
    f.render_widget(topic, chunks[0]);

    if game.settings().time_limit {
        let total = game.settings().session_length_secs().max(1);
        let ratio = game.seconds_remaining() as f64 / total as f64;
        let timer = Gauge::default()
            .block(Block::default().borders(Borders::ALL))
            .gauge_style(Style::default().fg(Color::Magenta))
            .ratio(ratio.clamp(0.0, 1.0))
            .label(format_time(game.seconds_remaining()));
        f.render_widget(timer, chunks[1]);
    } else {
        let untimed = Paragraph::new(Span::styled(
            format!("words {}", game.words_started()),
            Style::default().add_modifier(Modifier::DIM),
        ))
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Center);
        f.render_widget(untimed, chunks[1]);
    }

    let points_style = if game.score().points < 0 {
        bold_style.fg(Color::Red)
    } else {
        bold_style.fg(Color::Green)
    };
    let points = Paragraph::new(Span::styled(
        format!("Points: {}", game.score().points),
        points_style,
    ))
    .block(Block::default().borders(Borders::ALL))
    .alignment(Alignment::Center);
    f.render_widget(points, chunks[2]);
}

fn render_word(app: &App, f: &mut Frame, area: Rect) {
    let game = &app.game;
    let Some(word) = game.word() else {
        return;
    };

    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let done_style = bold_style.fg(Color::Green);
    let current_style = bold_style.add_modifier(Modifier::UNDERLINED);
    let pending_style = bold_style.add_modifier(Modifier::DIM);

    let style_for = |idx: usize| {
        if game.highlighted().contains(&idx) {
            done_style
        } else if idx == game.cursor() {
            current_style
        } else {
            pending_style
        }
    };

    let mut spans: Vec<Span> = word
        .entries
        .iter()
        .enumerate()
        .map(|(idx, entry)| Span::styled(entry.character.to_string(), style_for(idx)))
        .collect();

    let glyphs = braille::glyphs(&word.text);
    let combined_width = word.text.width() + glyphs.width() + 4;
    let separator = if combined_width as u16 <= area.width { "  ( " } else { " (" };
    spans.push(Span::raw(separator));
    spans.extend(
        glyphs
            .chars()
            .enumerate()
            .map(|(idx, glyph)| Span::styled(glyph.to_string(), style_for(idx))),
    );
    spans.push(Span::raw(" )"));

    let widget = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::BOTTOM))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    f.render_widget(widget, area);
}

/// Draw one active character as a 2x3 dot cell. It falls from the top of the
/// playfield to the bottom over its time to live; dots other than 1 and 4
/// fade in while the entry animation runs.
fn render_falling_cell(
    f: &mut Frame,
    area: Rect,
    active: &ActiveCharacter,
    word_len: usize,
    is_current: bool,
    entry_progress: f64,
    now: Instant,
) {
    if area.width < CELL_WIDTH || area.height < CELL_HEIGHT {
        return;
    }

    let fall = (active.age(now).as_secs_f64() / active.time_to_live.as_secs_f64()).min(1.0);
    let travel = (area.height - CELL_HEIGHT) as f64;
    let y = area.y + (fall * travel).round() as u16;

    let slots = word_len.max(1) as u16 + 1;
    let column = area.width / slots * (active.index as u16 + 1);
    let x = (area.x + column.saturating_sub(CELL_WIDTH / 2)).min(area.right() - CELL_WIDTH);

    let dot_style = if is_current {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::White)
    };
    let entering_style = Style::default().add_modifier(Modifier::DIM);

    let lines: Vec<Line> = CELL_ROWS
        .iter()
        .map(|(left, right)| {
            let spans = [*left, *right]
                .iter()
                .flat_map(|dot| {
                    let settled = *dot == 1 || *dot == 4 || entry_progress >= 1.0;
                    let symbol = if braille::has_dot(&active.expected_encoding, *dot) {
                        "●"
                    } else {
                        "○"
                    };
                    let style = if settled { dot_style } else { entering_style };
                    [Span::styled(symbol, style), Span::raw(" ")]
                })
                .collect::<Vec<Span>>();
            Line::from(spans)
        })
        .collect();

    let remaining = active.remaining(now).as_secs();
    let cell = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("{remaining}s")),
        )
        .alignment(Alignment::Center);

    f.render_widget(
        cell,
        Rect {
            x,
            y,
            width: CELL_WIDTH,
            height: CELL_HEIGHT,
        },
    );
}

pub fn render_game_over(app: &App, f: &mut Frame) {
    let area = f.area();
    let score = app.game.score();
    let bold_style = Style::default().add_modifier(Modifier::BOLD);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(3),
            Constraint::Length(6),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(area);

    let title = Paragraph::new(Span::styled(
        "Game Over!",
        bold_style.fg(Color::Cyan),
    ))
    .block(Block::default().borders(Borders::ALL))
    .alignment(Alignment::Center);
    f.render_widget(title, chunks[1]);

    let accuracy = score
        .accuracy()
        .map_or("-".to_string(), |a| format!("{a:.1}%"));
    let rows = vec![
        Line::from(Span::styled(format!("Final score  {}", score.points), bold_style)),
        Line::from(Span::styled(
            format!("Correct      {}", score.correct),
            Style::default().fg(Color::Green),
        )),
        Line::from(Span::styled(
            format!("Incorrect    {}", score.incorrect),
            Style::default().fg(Color::Red),
        )),
        Line::from(Span::styled(
            format!("Skipped      {}", score.skipped),
            Style::default().fg(Color::Blue),
        )),
        Line::from(format!("Accuracy     {accuracy}")),
    ];
    f.render_widget(Paragraph::new(rows).alignment(Alignment::Center), chunks[2]);

    if let Some(best) = app.best_points {
        let best = Paragraph::new(Span::styled(
            format!("personal best {best}"),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::ITALIC),
        ))
        .alignment(Alignment::Center);
        f.render_widget(best, chunks[3]);
    }

    let legend = Paragraph::new(Span::styled(
        "(r)estart (q/esc)ape",
        Style::default().add_modifier(Modifier::ITALIC),
    ))
    .alignment(Alignment::Center);
    f.render_widget(legend, chunks[4]);
}

fn key_legend(mode: InputMode) -> String {
    let keys: String = DOT_KEYS
        .iter()
        .enumerate()
        .map(|(idx, key)| format!("{key}={}", idx + 1))
        .collect::<Vec<_>>()
        .join(" ");

    match mode {
        InputMode::Enhanced => format!("{keys} | (tab) end round (esc)ape"),
        InputMode::Latched => format!("{keys} | (space) commit chord (tab) end round (esc)ape"),
    }
}
