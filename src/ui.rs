//! Layout and drawing: board, sidebar, mascot bubble, title and game-over overlays.

use crate::app::Screen;
use crate::theme::Theme;
use matchtui::{Coord, GameSession, SessionState, TileColor};
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Gauge, Paragraph, Widget, Wrap};
use std::collections::HashSet;
use std::time::Instant;
use tachyonfx::{
    CellFilter, Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx, ref_count,
};

/// Terminal cells per tile.
const CELL_WIDTH: u16 = 4;
const CELL_HEIGHT: u16 = 2;

const SIDEBAR_WIDTH: u16 = 26;
const SIDEBAR_MIN_HEIGHT: u16 = 18;

/// Fade-in of freshly spawned tiles, in ms.
const SPAWN_FADE_MS: u32 = 250;

const SPECIAL_GLYPH: &str = "★";

/// `n` tiles of `per` cells each, saturating at `u16::MAX`.
fn span(n: usize, per: u16) -> u16 {
    u16::try_from(n).unwrap_or(u16::MAX).saturating_mul(per)
}

/// Board with border, in terminal cells.
fn playfield_size(rows: usize, cols: usize) -> (u16, u16) {
    (
        span(cols, CELL_WIDTH).saturating_add(2),
        span(rows, CELL_HEIGHT).saturating_add(2),
    )
}

/// Playfield outer rect for given area; matches draw_game layout.
fn playfield_rect(area: Rect, rows: usize, cols: usize) -> Rect {
    let (pw, ph) = playfield_size(rows, cols);
    let total_w = pw.saturating_add(SIDEBAR_WIDTH);
    Rect {
        x: area.x + area.width.saturating_sub(total_w) / 2,
        y: area.y + area.height.saturating_sub(ph) / 2,
        width: pw.min(area.width),
        height: ph.min(area.height),
    }
}

/// Board inner rect (tiles only, no border).
pub fn board_rect(area: Rect, rows: usize, cols: usize) -> Rect {
    let outer = playfield_rect(area, rows, cols);
    Rect {
        x: outer.x.saturating_add(1),
        y: outer.y.saturating_add(1),
        width: span(cols, CELL_WIDTH).min(outer.width.saturating_sub(2)),
        height: span(rows, CELL_HEIGHT).min(outer.height.saturating_sub(2)),
    }
}

/// Tile under a terminal position, for mouse clicks.
pub fn cell_at(board: Rect, column: u16, row: u16) -> Option<Coord> {
    if !board.contains(Position::new(column, row)) {
        return None;
    }
    Some(Coord::new(
        ((row - board.y) / CELL_HEIGHT) as usize,
        ((column - board.x) / CELL_WIDTH) as usize,
    ))
}

/// Top-left terminal position of a tile.
fn tile_origin(board: Rect, at: Coord) -> (u16, u16) {
    (
        board.x.saturating_add(span(at.col, CELL_WIDTH)),
        board.y.saturating_add(span(at.row, CELL_HEIGHT)),
    )
}

/// Spawn flash: tiles that just dropped in fade up from the background.
#[derive(Default)]
pub struct Flash {
    cells: Vec<Coord>,
    effect: Option<Effect>,
    process_time: Option<Instant>,
}

impl Flash {
    /// Flash `cells`, replacing any running flash.
    pub fn trigger(&mut self, cells: impl IntoIterator<Item = Coord>) {
        self.cells = cells.into_iter().collect();
        self.effect = None;
        self.process_time = None;
    }

    pub fn is_done(&self) -> bool {
        self.effect.as_ref().is_none_or(Effect::done)
    }

    pub fn clear(&mut self) {
        self.trigger([]);
    }

    fn is_active(&self) -> bool {
        !self.cells.is_empty()
    }
}

/// Build set of buffer (x, y) positions covered by the given tiles.
fn tile_buffer_positions(board: Rect, cells: &[Coord]) -> HashSet<(u16, u16)> {
    let mut set = HashSet::new();
    for &at in cells {
        let (x0, y0) = tile_origin(board, at);
        for bx in x0..x0.saturating_add(CELL_WIDTH).min(board.right()) {
            for by in y0..y0.saturating_add(CELL_HEIGHT).min(board.bottom()) {
                set.insert((bx, by));
            }
        }
    }
    set
}

/// Create or update the spawn fade and process it.
fn apply_spawn_effect(frame: &mut Frame, board: Rect, theme: &Theme, flash: &mut Flash, now: Instant) {
    let delta = flash
        .process_time
        .map(|t| now.saturating_duration_since(t))
        .unwrap_or(std::time::Duration::ZERO);
    let delta_ms = delta.as_millis().min(u32::MAX as u128) as u32;
    flash.process_time = Some(now);

    if flash.effect.is_none() {
        let spawned = tile_buffer_positions(board, &flash.cells);
        let filter = CellFilter::PositionFn(ref_count(move |pos: Position| {
            spawned.contains(&(pos.x, pos.y))
        }));
        let effect = fx::fade_from(theme.bg, theme.bg, (SPAWN_FADE_MS, Interpolation::QuadOut))
            .with_filter(filter)
            .with_area(board);
        flash.effect = Some(effect);
    }

    if let Some(effect) = flash.effect.as_mut() {
        frame.render_effect(effect, board, TfxDuration::from_millis(delta_ms));
    }
}

/// Draw the current screen. The board is always visible; title and game-over
/// sit on top of it.
pub fn draw(
    frame: &mut Frame,
    screen: Screen,
    session: &GameSession,
    theme: &Theme,
    cursor: Coord,
    speech: Option<&str>,
    flash: &mut Flash,
    now: Instant,
) {
    let area = frame.area();
    draw_game(frame, session, theme, cursor, speech, area);
    if flash.is_active() {
        let board = board_rect(area, session.grid().rows(), session.grid().cols()).intersection(area);
        apply_spawn_effect(frame, board, theme, flash, now);
    }
    match screen {
        Screen::Title => draw_title(frame, session, theme, area),
        Screen::Playing => {}
        Screen::GameOver => draw_game_over(frame, session, theme, area),
    }
}

fn popup_rect(area: Rect, w: u16, h: u16) -> Rect {
    Rect {
        x: area.x + area.width.saturating_sub(w) / 2,
        y: area.y + area.height.saturating_sub(h) / 2,
        width: w.min(area.width),
        height: h.min(area.height),
    }
}

fn popup_block(theme: &Theme) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
        .style(Style::default().bg(theme.bg))
}

fn key_hint(theme: &Theme, key: &'static str, what: &'static str) -> Vec<Span<'static>> {
    vec![
        Span::styled(key, Style::default().fg(theme.tile_color(TileColor::Yellow))),
        Span::styled(what, Style::default().fg(theme.main_fg)),
    ]
}

fn draw_title(frame: &mut Frame, session: &GameSession, theme: &Theme, area: Rect) {
    let popup = popup_rect(area, 40, 11);
    let title = Line::from(vec![
        Span::styled(" Match ", Style::default().fg(theme.tile_color(TileColor::Red)).bold()),
        Span::styled(" tui ", Style::default().fg(theme.main_fg).bold()),
    ]);
    let mut hints = key_hint(theme, " S/ENTER ", "START   ");
    hints.extend(key_hint(theme, " Q ", "QUIT"));
    let lines = vec![
        Line::from(""),
        title,
        Line::from(""),
        Line::from(Span::styled(
            format!(" Line up three. {} seconds. ", session.clock().duration()),
            Style::default().fg(theme.main_fg),
        )),
        Line::from(Span::styled(
            format!(" {} tiles clear their colour. ", SPECIAL_GLYPH),
            Style::default().fg(theme.main_fg),
        )),
        Line::from(""),
        Line::from(hints),
    ];
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(popup_block(theme))
        .render(popup, frame.buffer_mut());
}

fn draw_game_over(frame: &mut Frame, session: &GameSession, theme: &Theme, area: Rect) {
    let popup = popup_rect(area, 36, 10);
    let faulted = matches!(session.state(), SessionState::Ended { faulted: true });
    let (title, title_style) = if faulted {
        (" Board fault ", Style::default().fg(Color::White).bg(Color::Red))
    } else {
        (" Time's up! ", Style::default().fg(Color::Black).bg(theme.title))
    };
    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(title, title_style)),
        Line::from(""),
        Line::from(Span::styled(
            format!(" Score: {} ", session.score()),
            Style::default().fg(theme.main_fg).bold(),
        )),
    ];
    if faulted {
        lines.push(Line::from(Span::styled(
            " The board would not settle. ",
            Style::default().fg(theme.inactive_fg),
        )));
    }
    let mut hints = key_hint(theme, " R ", "RESTART   ");
    hints.extend(key_hint(theme, " Q ", "QUIT"));
    lines.extend([Line::from(""), Line::from(hints)]);
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(popup_block(theme).title(Span::styled(" Matchtui ", theme.title)))
        .render(popup, frame.buffer_mut());
}

/// Draw game: board + sidebar, centred in the full area.
fn draw_game(
    frame: &mut Frame,
    session: &GameSession,
    theme: &Theme,
    cursor: Coord,
    speech: Option<&str>,
    area: Rect,
) {
    let grid = session.grid();
    let playfield_area = playfield_rect(area, grid.rows(), grid.cols());
    let sidebar_area = Rect {
        x: playfield_area.right(),
        y: playfield_area.y,
        width: SIDEBAR_WIDTH.min(area.right().saturating_sub(playfield_area.right())),
        height: playfield_area
            .height
            .max(SIDEBAR_MIN_HEIGHT)
            .min(area.bottom().saturating_sub(playfield_area.y)),
    };
    draw_board(frame, session, theme, cursor, playfield_area);
    draw_sidebar(frame, session, theme, speech, sidebar_area);
}

fn draw_board(frame: &mut Frame, session: &GameSession, theme: &Theme, cursor: Coord, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
        .title(Span::styled(" Matchtui ", theme.title));
    let inner = block.inner(area);
    block.render(area, frame.buffer_mut());

    let grid = session.grid();
    let board = board_rect(frame.area(), grid.rows(), grid.cols()).intersection(inner);
    let running = session.is_running();
    let selection = session.selection();
    let buf = frame.buffer_mut();

    for at in grid.coords() {
        let (x0, y0) = tile_origin(board, at);
        // Tiles past a too-small terminal are not drawn.
        if x0 >= board.right() || y0 >= board.bottom() {
            continue;
        }
        let (fill, glyph_fg) = match grid.get(at) {
            Some(tile) => (theme.tile_color(tile.color), Color::White),
            None => (theme.bg, theme.bg),
        };
        let mut style = Style::default().fg(glyph_fg).bg(fill);
        if !running {
            style = style.add_modifier(Modifier::DIM);
        }
        for dy in 0..CELL_HEIGHT {
            for dx in 0..CELL_WIDTH {
                let (x, y) = (x0.saturating_add(dx), y0.saturating_add(dy));
                if x < board.right() && y < board.bottom() {
                    buf[(x, y)].set_symbol(" ").set_style(style);
                }
            }
        }
        let special = grid.get(at).is_some_and(|t| t.special);
        let (cx, cy) = (x0.saturating_add(CELL_WIDTH / 2 - 1), y0);
        if special && cx < board.right() && cy < board.bottom() {
            buf[(cx, cy)].set_symbol(SPECIAL_GLYPH);
        }

        // Selection wins over the cursor when both sit on one tile.
        let marker = if selection == Some(at) {
            Some(Style::default().fg(theme.title).bg(fill).bold())
        } else if running && cursor == at {
            Some(Style::default().fg(theme.main_fg).bg(fill).bold())
        } else {
            None
        };
        if let Some(style) = marker {
            let corners = [
                (x0, y0, "┏"),
                (x0.saturating_add(CELL_WIDTH - 1), y0, "┓"),
                (x0, y0.saturating_add(CELL_HEIGHT - 1), "┗"),
                (
                    x0.saturating_add(CELL_WIDTH - 1),
                    y0.saturating_add(CELL_HEIGHT - 1),
                    "┛",
                ),
            ];
            for (x, y, sym) in corners {
                if x < board.right() && y < board.bottom() {
                    buf[(x, y)].set_symbol(sym).set_style(style);
                }
            }
        }
    }
}

fn draw_sidebar(
    frame: &mut Frame,
    session: &GameSession,
    theme: &Theme,
    speech: Option<&str>,
    area: Rect,
) {
    let title_style = Style::default().fg(theme.title);
    let fg_style = Style::default().fg(theme.main_fg);
    let border_style = Style::default().fg(theme.div_line).bg(theme.bg);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5), // Score + time bar
            Constraint::Length(1), // gap
            Constraint::Length(4), // Colours
            Constraint::Length(1), // gap
            Constraint::Min(5),    // Mascot
        ])
        .split(area);

    // --- Stats ---
    let stats_block = Block::default().borders(Borders::ALL).border_style(border_style);
    let stats_inner = stats_block.inner(chunks[0]);
    stats_block.render(chunks[0], frame.buffer_mut());
    let stats_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1), Constraint::Length(1)])
        .split(stats_inner);
    let clock = session.clock();
    let remaining = clock.remaining();
    Paragraph::new(Line::from(vec![
        Span::styled("Score: ", title_style),
        Span::styled(session.score().to_string(), fg_style),
    ]))
    .render(stats_layout[0], frame.buffer_mut());
    Paragraph::new(Line::from(vec![
        Span::styled("Time: ", title_style),
        Span::styled(format!("{:02}:{:02}", remaining / 60, remaining % 60), fg_style),
    ]))
    .render(stats_layout[1], frame.buffer_mut());
    let ratio = if clock.duration() > 0 {
        (f64::from(remaining) / f64::from(clock.duration())).min(1.0)
    } else {
        0.0
    };
    let bar_color = if ratio > 0.5 {
        Color::Green
    } else if ratio > 0.2 {
        Color::Yellow
    } else {
        Color::Red
    };
    Gauge::default()
        .ratio(ratio)
        .label("")
        .gauge_style(Style::default().fg(bar_color))
        .render(stats_layout[2], frame.buffer_mut());

    // --- Colours in play ---
    let colours_block = Block::default().borders(Borders::ALL).border_style(border_style);
    let colours_inner = colours_block.inner(chunks[2]);
    colours_block.render(chunks[2], frame.buffer_mut());
    let colours_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1)])
        .split(colours_inner);
    Paragraph::new(Line::from(Span::styled("Colours", title_style)))
        .render(colours_layout[0], frame.buffer_mut());
    draw_colour_strip(frame, session, theme, colours_layout[1]);

    // --- Mascot ---
    let mascot_block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(Span::styled(" (^o^) ", title_style));
    let mascot_inner = mascot_block.inner(chunks[4]);
    mascot_block.render(chunks[4], frame.buffer_mut());
    if let Some(line) = speech {
        Paragraph::new(Line::from(Span::styled(format!("\u{201c}{line}\u{201d}"), fg_style.bold())))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .render(mascot_inner, frame.buffer_mut());
    }
}

/// One swatch per colour in play, special glyph on top.
fn draw_colour_strip(frame: &mut Frame, session: &GameSession, theme: &Theme, area: Rect) {
    let count = session.config().color_count.min(TileColor::ALL.len());
    let block_w = (area.width / 6).max(1);
    for (i, color) in TileColor::ALL.iter().take(count).enumerate() {
        let r = Rect {
            x: area.x + i as u16 * block_w,
            y: area.y,
            width: block_w.saturating_sub(1).max(1),
            height: area.height.min(1),
        };
        let c = theme.tile_color(*color);
        Paragraph::new(" ")
            .style(Style::default().bg(c))
            .render(r.intersection(area), frame.buffer_mut());
    }
}
