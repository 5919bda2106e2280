/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Compose the next frame into `front` (a grid of Cell)
///   2. Compare each cell with `back` (the previous frame)
///   3. Emit terminal commands only for changed cells, batched with `queue!`
///   4. Swap front/back
///
/// World entities are painted as boxes of cells through the Camera, lowest
/// layer first: platforms, ladders, stations, door, flag, player. Overlays
/// (challenge panel, logbook, end banner) are drawn last.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::challenge::ChallengeStep;
use crate::domain::entity::{Facing, Rect, StationStatus};
use crate::sim::logbook;
use crate::sim::world::WorldState;
use super::camera::{Camera, CELL_PX_H, CELL_PX_W};

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit background for every empty cell, so row gaps match on VTE terminals.
    const BASE_BG: Color = Color::Rgb { r: 38, g: 18, b: 14 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Never equal to a real cell; forces a full repaint.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        let bg = if bg == Color::Reset { Self::BASE_BG } else { bg };
        Cell { ch, fg, bg }
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

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
            if x + i >= self.width { break; }
            self.set(x + i, y, Cell::new(ch, fg, bg));
        }
    }

    fn fill_row(&mut self, y: usize, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Cell::new(' ', Color::White, bg));
        }
    }

    fn fill_box(&mut self, x: usize, y: usize, w: usize, h: usize, bg: Color) {
        for row in y..y + h {
            for col in x..x + w {
                self.set(col, row, Cell::new(' ', Color::White, bg));
            }
        }
    }
}

// ── Panel: a box that clips the text drawn into it ──

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Panel {
    x: usize,
    y: usize,
    w: usize,
    h: usize,
}

impl Panel {
    /// Text at (dx, dy) inside the panel, cut at the right margin.
    /// Rows at or past the bottom edge are dropped.
    fn put(&self, fb: &mut FrameBuffer, dx: usize, dy: usize, s: &str, fg: Color) {
        if dy + 1 >= self.h { return; }
        let room = self.w.saturating_sub(dx + 1);
        let clipped: String = s.chars().take(room).collect();
        fb.put_str(self.x + dx, self.y + dy, &clipped, fg, PANEL_BG);
    }
}

/// Centered in the map area; never taller than the view.
fn centered_panel(fb: &mut FrameBuffer, view_h: usize, w: usize, h: usize) -> Panel {
    let w = w.min(fb.width);
    let h = h.min(view_h);
    let x = fb.width.saturating_sub(w) / 2;
    let y = MAP_ROW + view_h.saturating_sub(h) / 2;
    fb.fill_box(x, y, w, h, PANEL_BG);
    Panel { x, y, w, h }
}

/// Greedy word wrap; words longer than `width` are split.
fn wrap(s: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut line = String::new();
    for word in s.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > width {
            if !line.is_empty() { lines.push(std::mem::take(&mut line)); }
            lines.push(word.drain(..width).collect());
        }
        let len = line.chars().count();
        if len > 0 && len + 1 + word.len() > width {
            lines.push(std::mem::take(&mut line));
        }
        if !line.is_empty() { line.push(' '); }
        line.extend(word);
    }
    if !line.is_empty() || lines.is_empty() {
        lines.push(line);
    }
    lines
}

// ── Layout ──

const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;
/// HUD + gap above the map, message + help below.
const RESERVED_ROWS: usize = MAP_ROW + 3;

const HUD_BG: Color = Color::Rgb { r: 60, g: 24, b: 16 };
const MSG_BG: Color = Color::Rgb { r: 220, g: 140, b: 60 };
const PANEL_BG: Color = Color::Rgb { r: 30, g: 30, b: 46 };
const HEADER_FG: Color = Color::Rgb { r: 255, g: 200, b: 80 };
const TEXT_FG: Color = Color::Rgb { r: 210, g: 210, b: 210 };
const KEY_FG: Color = Color::Rgb { r: 100, g: 200, b: 255 };
/// Widest a challenge panel grows before its prompt wraps.
const CHALLENGE_W: usize = 64;

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    camera: Camera,
    term_w: usize,
    term_h: usize,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            camera: Camera::new(),
            term_w: 0,
            term_h: 0,
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
        self.resize(tw as usize, th as usize);
        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(self.writer, ResetColor, cursor::Show, terminal::LeaveAlternateScreen)?;
        terminal::disable_raw_mode()
    }

    fn resize(&mut self, w: usize, h: usize) {
        self.term_w = w;
        self.term_h = h;
        self.front.resize(w, h);
        self.back.resize(w, h);
        self.back.cells.fill(Cell::INVALID);
        self.camera.view_w = w;
        self.camera.view_h = h.saturating_sub(RESERVED_ROWS).max(1);
    }

    pub fn render(&mut self, world: &WorldState) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.resize(tw as usize, th as usize);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        let p = &world.player;
        self.camera.follow(p.x, p.y, world.width, world.height);

        self.front.clear();
        self.compose_hud(world);
        self.compose_world(world);
        self.compose_footer(world);
        if world.flag.reached {
            self.compose_banner(world);
        }
        if let Some(step) = world.active_step() {
            self.compose_challenge(world, step);
        }
        if world.logbook_visible {
            self.compose_logbook(world);
        }

        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut cursor_at: Option<(usize, usize)> = None;

        queue!(self.writer, SetForegroundColor(last_fg), SetBackgroundColor(last_bg))?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) { continue; }

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

    // ── Compose: build front buffer content ──

    fn compose_hud(&mut self, w: &WorldState) {
        let hud = format!(
            " MARS EXPLORER   Score:{:<6}  {}   {}",
            w.score,
            logbook::hud_line(&w.stations),
            w.badges.earned_names().join(" · "),
        );
        self.front.fill_row(HUD_ROW, HUD_BG);
        self.front.put_str(0, HUD_ROW, &hud, Color::White, HUD_BG);
    }

    fn compose_world(&mut self, w: &WorldState) {
        let ground = Color::Rgb { r: 150, g: 70, b: 40 };
        for plat in &w.platforms {
            self.paint(plat, '▀', Color::Rgb { r: 200, g: 110, b: 70 }, ground);
        }
        for ladder in &w.ladders {
            self.paint(ladder, 'H', Color::Rgb { r: 200, g: 200, b: 120 }, Color::Reset);
        }
        for s in &w.stations {
            let (ch, fg) = match s.status {
                StationStatus::Pending => ('?', Color::Rgb { r: 255, g: 220, b: 60 }),
                StationStatus::InChallenge => ('!', Color::Rgb { r: 255, g: 120, b: 60 }),
                StationStatus::Completed => ('✔', Color::Rgb { r: 80, g: 230, b: 120 }),
            };
            self.paint(&s.bounds, ch, fg, Color::Rgb { r: 40, g: 40, b: 70 });
        }
        if w.door.present {
            self.paint(&w.door.bounds, '#', Color::Rgb { r: 170, g: 170, b: 190 }, Color::Rgb { r: 70, g: 70, b: 90 });
        }
        let flag_fg = if w.flag.reached { Color::Rgb { r: 80, g: 230, b: 120 } } else { Color::White };
        self.paint(&w.flag.bounds, '⚑', flag_fg, Color::Reset);

        let glyph = match (w.player.is_climbing(), w.player.facing) {
            (true, _) => 'Ħ',
            (false, Facing::Left) => '◄',
            (false, Facing::Right) => '►',
        };
        self.paint(&w.player.bounds(), glyph, Color::Rgb { r: 120, g: 220, b: 255 }, Color::Reset);
    }

    /// Fill every on-screen cell that a world rect covers.
    fn paint(&mut self, r: &Rect, ch: char, fg: Color, bg: Color) {
        let x0 = (r.x / CELL_PX_W).floor() as i32;
        let x1 = (r.right() / CELL_PX_W).ceil() as i32;
        let y0 = (r.y / CELL_PX_H).floor() as i32;
        let y1 = (r.bottom() / CELL_PX_H).ceil() as i32;
        for cy in y0..y1.max(y0 + 1) {
            for cx in x0..x1.max(x0 + 1) {
                let px = cx as f32 * CELL_PX_W;
                let py = cy as f32 * CELL_PX_H;
                if let Some((col, row)) = self.camera.project(px, py) {
                    self.front.set(col, MAP_ROW + row, Cell::new(ch, fg, bg));
                }
            }
        }
    }

    fn compose_footer(&mut self, w: &WorldState) {
        let msg_row = MAP_ROW + self.camera.view_h;
        if msg_row < self.front.height && !w.message.is_empty() {
            self.front.fill_row(msg_row, MSG_BG);
            self.front.put_str(1, msg_row, &w.message, Color::Black, MSG_BG);
        }
        let help_row = msg_row + 1;
        if help_row < self.front.height {
            let help = " ←→/AD:Walk  ↑↓/WS:Climb  Space:Jump  Tab/L:Logbook  Esc/Q:Quit";
            self.front.put_str(0, help_row, help, Color::DarkGrey, Color::Reset);
        }
    }

    fn panel(&mut self, w: usize, h: usize) -> Panel {
        centered_panel(&mut self.front, self.camera.view_h, w, h)
    }

    fn compose_challenge(&mut self, w: &WorldState, step: &ChallengeStep) {
        let title = w.challenge.as_ref()
            .and_then(|c| w.station_index(c.station_id))
            .map(|i| w.stations[i].title.as_str())
            .unwrap_or("Station");
        let header = format!("▶ {} ◀", title);
        let width = CHALLENGE_W.min(self.front.width);

        match step {
            ChallengeStep::Sequence { prompt, options } => {
                let prompt = wrap(prompt, width.saturating_sub(3));
                let options: Vec<_> = options.iter().take(9).collect();
                let p = self.panel(width, prompt.len() + options.len() + 5);
                p.put(&mut self.front, 2, 1, &header, HEADER_FG);
                for (i, line) in prompt.iter().enumerate() {
                    p.put(&mut self.front, 2, 3 + i, line, TEXT_FG);
                }
                let top = 3 + prompt.len();
                for (i, opt) in options.iter().enumerate() {
                    p.put(&mut self.front, 4, top + i, &format!("{}  {}", i + 1, opt), KEY_FG);
                }
            }
            ChallengeStep::TrueFalse { prompt, .. } => {
                let prompt = wrap(prompt, width.saturating_sub(3));
                let p = self.panel(width, prompt.len() + 6);
                p.put(&mut self.front, 2, 1, &header, HEADER_FG);
                for (i, line) in prompt.iter().enumerate() {
                    p.put(&mut self.front, 2, 3 + i, line, TEXT_FG);
                }
                p.put(&mut self.front, 4, 4 + prompt.len(), "T  True     F  False", KEY_FG);
            }
        }
    }

    fn compose_logbook(&mut self, w: &WorldState) {
        let lines = logbook::logbook_lines(&w.stations, w.score, &w.badges);
        let width = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0) + 6;
        let p = self.panel(width.max(40), lines.len() + 2);
        for (i, line) in lines.iter().enumerate() {
            let fg = if i == 0 { HEADER_FG } else { TEXT_FG };
            p.put(&mut self.front, 3, 1 + i, line, fg);
        }
    }

    fn compose_banner(&mut self, w: &WorldState) {
        let p = self.panel(40, 5);
        p.put(&mut self.front, 10, 1, "★ MISSION COMPLETE ★", HEADER_FG);
        if w.badges.all_complete {
            p.put(&mut self.front, 12, 2, "Martian Explorer", Color::Rgb { r: 80, g: 230, b: 120 });
        }
        p.put(&mut self.front, 12, 3, &format!("Score: {}", w.score), TEXT_FG);
    }
}
