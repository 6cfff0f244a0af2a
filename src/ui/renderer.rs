/// Double-buffered, diff-based terminal renderer for the room walker.
///
/// Each frame is composed into `front`, compared cell by cell against
/// `back` (the previous frame), and only changed cells are emitted. All
/// commands are queued and flushed once, then the buffers swap.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::actor::Actor;
use crate::domain::geom::{tile_of, Facing, Rect};
use crate::domain::tile::CollisionCode;
use crate::sim::room::Room;
use crate::sim::transition::TransitionPoint;
use crate::sim::world_graph::WorldGraph;

// ── Cell ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Differs from every real cell; used to force a full repaint.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        Cell { ch, fg, bg }
    }
}

// ── FrameBuffer ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width {
                break;
            }
            self.set(x + i, y, Cell::new(ch, fg, bg));
        }
    }

    /// Two-column glyph for one tile.
    fn put_tile(&mut self, col: usize, row: usize, glyph: [char; 2], fg: Color, bg: Color) {
        self.set(col, row, Cell::new(glyph[0], fg, bg));
        self.set(col + 1, row, Cell::new(glyph[1], fg, bg));
    }
}

// ── What to draw ──

/// Everything one frame needs, borrowed from the caller's state.
pub struct Frame<'a> {
    pub room: &'a dyn Room,
    pub actor: &'a Actor,
    pub triggers: &'a [TransitionPoint],
    pub graph: &'a WorldGraph,
    pub show_map: bool,
    pub messages: &'a [String],
}

/// Terminal columns per tile.
const CELL_W: usize = 2;
const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;
/// HUD, gap, two message lines and the help line.
const RESERVED_ROWS: usize = MAP_ROW + 3;

const MINIMAP_W: usize = 40;
const MINIMAP_H: usize = 14;

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_room: Option<String>,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_room: None,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        self.back.cells.fill(Cell::INVALID);
        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(self.writer, ResetColor, cursor::Show, terminal::LeaveAlternateScreen)?;
        terminal::disable_raw_mode()
    }

    pub fn render(&mut self, frame: &Frame) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.invalidate()?;
        }

        // Full repaint on room change.
        if self.last_room.as_deref() != Some(frame.room.zone_id()) {
            self.last_room = Some(frame.room.zone_id().to_string());
            self.invalidate()?;
        }

        self.front.clear();
        compose(&mut self.front, frame);
        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    fn invalidate(&mut self) -> io::Result<()> {
        self.back.cells.fill(Cell::INVALID);
        queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))
    }

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut cursor_at: Option<(usize, usize)> = None;

        queue!(self.writer, SetForegroundColor(last_fg), SetBackgroundColor(last_bg))?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    continue;
                }
                if cursor_at != Some((x, y)) {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }
                queue!(self.writer, Print(cell.ch))?;
                cursor_at = Some((x + 1, y));
            }
        }
        self.writer.flush()
    }
}

// ══════════════════════════════════════════════════════════════
// Compose
// ══════════════════════════════════════════════════════════════

fn compose(buf: &mut FrameBuffer, frame: &Frame) {
    compose_hud(buf, frame);
    compose_room(buf, frame);
    if frame.show_map {
        compose_minimap(buf, frame);
    }
    compose_footer(buf, frame);
}

fn compose_hud(buf: &mut FrameBuffer, frame: &Frame) {
    let room = frame.room;
    let text = format!(
        " {} [{}]  pos {},{}  rooms {}",
        room.display_name(),
        room.zone_id(),
        frame.actor.x,
        frame.actor.y,
        frame.graph.len(),
    );
    buf.put_str(0, HUD_ROW, &text, Color::Yellow, Cell::BASE_BG);
}

fn compose_footer(buf: &mut FrameBuffer, frame: &Frame) {
    if buf.height < RESERVED_ROWS {
        return;
    }
    let help_row = buf.height - 1;
    let first_msg_row = help_row - 2;
    let recent = frame.messages.iter().rev().take(2).rev();
    for (i, msg) in recent.enumerate() {
        buf.put_str(1, first_msg_row + i, msg, Color::Cyan, Cell::BASE_BG);
    }
    buf.put_str(1, help_row, "←/→ walk  ↑ use door  m map  q quit", Color::DarkGrey, Cell::BASE_BG);
}

/// First visible tile on one axis: centred on `focus`, clamped to the room.
fn camera_origin(focus: i32, view: usize, extent: usize) -> i32 {
    if extent <= view {
        return 0;
    }
    let max = (extent - view) as i32;
    (focus - view as i32 / 2).clamp(0, max)
}

fn compose_room(buf: &mut FrameBuffer, frame: &Frame) {
    let resolver = frame.room.resolver();
    let grid = resolver.grid();
    let unit = resolver.unit();

    let view_w = (buf.width / CELL_W).min(grid.width);
    let view_h = buf.height.saturating_sub(RESERVED_ROWS).min(grid.height);
    if view_w == 0 || view_h == 0 {
        return;
    }

    let center = frame.actor.center();
    let cam_x = camera_origin(tile_of(center.x, unit), view_w, grid.width);
    let cam_y = camera_origin(tile_of(center.y, unit), view_h, grid.height);
    let actor_box = frame.actor.collision_box();

    for vy in 0..view_h {
        for vx in 0..view_w {
            let (tx, ty) = (cam_x + vx as i32, cam_y + vy as i32);
            let (col, row) = (vx * CELL_W, MAP_ROW + vy);
            let cell_rect = Rect::new(tx * unit, ty * unit, unit, unit);

            if cell_rect.intersects(&actor_box) {
                let glyph = match frame.actor.facing {
                    Facing::Left => ['<', '@'],
                    Facing::Right => ['@', '>'],
                };
                buf.put_tile(col, row, glyph, Color::White, Cell::BASE_BG);
                continue;
            }
            if let Some(tp) = frame.triggers.iter().find(|t| t.trigger.intersects(&cell_rect)) {
                let fg = if tp.enabled { Color::Green } else { Color::DarkGrey };
                buf.put_tile(col, row, ['[', ']'], fg, Cell::BASE_BG);
                continue;
            }
            let (glyph, fg) = tile_glyph(frame.room, tx, ty);
            buf.put_tile(col, row, glyph, fg, Cell::BASE_BG);
        }
    }
}

fn tile_glyph(room: &dyn Room, tx: i32, ty: i32) -> ([char; 2], Color) {
    let resolver = room.resolver();
    match resolver.code_at(tx, ty) {
        CollisionCode::Solid => return (['▓', '▓'], Color::Grey),
        CollisionCode::Platform => return (['=', '='], Color::Grey),
        CollisionCode::Empty => {}
    }
    if resolver.is_solid(tx, ty) {
        return (['█', '█'], Color::Rgb { r: 110, g: 90, b: 70 });
    }
    match resolver.properties_at(tx, ty) {
        Some(p) if p.one_way.is_some() => (['▔', '▔'], Color::Rgb { r: 150, g: 120, b: 80 }),
        Some(_) => (['░', '░'], Color::DarkGrey),
        None => ([' ', ' '], Color::White),
    }
}

fn compose_minimap(buf: &mut FrameBuffer, frame: &Frame) {
    let rooms = frame.graph.discovered_rooms();
    let bounds = frame.graph.map_bounds();
    if rooms.is_empty() || bounds.is_empty() || buf.width < MINIMAP_W + 2 || buf.height < MAP_ROW + MINIMAP_H {
        return;
    }
    let left = buf.width - MINIMAP_W - 1;
    let top = MAP_ROW;
    let inner_w = (MINIMAP_W - 2) as i64;
    let inner_h = (MINIMAP_H - 2) as i64;

    // World-map pixels to minimap cells, one scale for both axes.
    let scale = (bounds.width as i64 / inner_w).max(bounds.height as i64 / inner_h).max(1) + 1;
    let to_cell = |x: i32, y: i32| -> (usize, usize) {
        let cx = ((x - bounds.x) as i64 / scale).clamp(0, inner_w - 1) as usize;
        let cy = ((y - bounds.y) as i64 / scale).clamp(0, inner_h - 1) as usize;
        (left + 1 + cx, top + 1 + cy)
    };

    for row in top..top + MINIMAP_H {
        for col in left..left + MINIMAP_W {
            let edge_y = row == top || row == top + MINIMAP_H - 1;
            let edge_x = col == left || col == left + MINIMAP_W - 1;
            let ch = match (edge_x, edge_y) {
                (true, true) => '+',
                (false, true) => '-',
                (true, false) => '|',
                _ => ' ',
            };
            buf.set(col, row, Cell::new(ch, Color::DarkGrey, Color::Black));
        }
    }

    let current = frame.graph.current_room();
    for room in &rooms {
        let p = room.placement;
        let (x0, y0) = to_cell(p.x, p.y);
        let (x1, y1) = to_cell(p.right() - 1, p.bottom() - 1);
        let here = current.as_deref() == Some(room.zone_id.as_str());
        let (fg, ch) = match (here, room.explored) {
            (true, _) => (Color::Yellow, '#'),
            (false, true) => (Color::Grey, '#'),
            (false, false) => (Color::DarkGrey, '.'),
        };
        for y in y0..=y1 {
            for x in x0..=x1 {
                buf.set(x, y, Cell::new(ch, fg, Color::Black));
            }
        }
    }

    for point in frame.graph.player_trail() {
        let (x, y) = to_cell(point.x, point.y);
        buf.set(x, y, Cell::new('*', Color::Cyan, Color::Black));
    }
}
