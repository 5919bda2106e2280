/// Camera follow: maps world pixels onto a grid of terminal cells.
///
/// The world is sampled at `CELL_PX_W × CELL_PX_H` pixels per cell. The
/// camera scrolls with a dead zone: the target moves freely inside the
/// inner 60% of the view and only pushes the camera near the edges.

pub const CELL_PX_W: f32 = 20.0;
pub const CELL_PX_H: f32 = 40.0;

#[derive(Clone, Copy, Debug, Default)]
pub struct Camera {
    /// World cell of the top-left visible cell (negative when centering).
    pub x: i32,
    pub y: i32,
    /// Visible size in cells.
    pub view_w: usize,
    pub view_h: usize,
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    /// Follow a target given in world pixels.
    pub fn follow(&mut self, target_x: f32, target_y: f32, world_w: f32, world_h: f32) {
        if self.view_w == 0 || self.view_h == 0 { return; }
        let (cols, rows) = world_cells(world_w, world_h);
        let (tx, ty) = to_cell(target_x, target_y);
        self.x = follow_axis(self.x, tx, self.view_w as i32, cols);
        self.y = follow_axis(self.y, ty, self.view_h as i32, rows);
    }

    /// Screen cell of a world pixel, if it falls in view.
    pub fn project(&self, wx: f32, wy: f32) -> Option<(usize, usize)> {
        let (cx, cy) = to_cell(wx, wy);
        let (vx, vy) = (cx - self.x, cy - self.y);
        if vx < 0 || vy < 0 || vx >= self.view_w as i32 || vy >= self.view_h as i32 {
            return None;
        }
        Some((vx as usize, vy as usize))
    }
}

pub fn world_cells(world_w: f32, world_h: f32) -> (i32, i32) {
    ((world_w / CELL_PX_W).ceil() as i32, (world_h / CELL_PX_H).ceil() as i32)
}

pub fn to_cell(wx: f32, wy: f32) -> (i32, i32) {
    ((wx / CELL_PX_W).floor() as i32, (wy / CELL_PX_H).floor() as i32)
}

fn follow_axis(pos: i32, target: i32, view: i32, world: i32) -> i32 {
    // Whole axis fits: center it
    if world <= view {
        return -((view - world) / 2);
    }
    let margin = view / 5;
    let mut pos = pos;
    if target < pos + margin {
        pos = target - margin;
    } else if target > pos + view - margin - 1 {
        pos = target - view + margin + 1;
    }
    pos.max(0).min(world - view)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cam(w: usize, h: usize) -> Camera {
        Camera { x: 0, y: 0, view_w: w, view_h: h }
    }

    #[test]
    fn small_world_is_centered() {
        let mut c = cam(100, 30);
        c.follow(10.0, 10.0, 400.0, 400.0);
        assert_eq!(c.x, -40);
        assert_eq!(c.y, -10);
    }

    #[test]
    fn scrolls_only_outside_dead_zone() {
        let mut c = cam(50, 10);
        c.follow(300.0, 0.0, 3000.0, 400.0);
        assert_eq!(c.x, 0);
        c.follow(1000.0, 0.0, 3000.0, 400.0);
        assert_eq!(c.x, 11);
    }

    #[test]
    fn clamped_to_world_edge() {
        let mut c = cam(50, 10);
        c.follow(2999.0, 0.0, 3000.0, 400.0);
        assert_eq!(c.x, 150 - 50);
    }

    #[test]
    fn projection_respects_view() {
        let c = Camera { x: 10, y: 0, view_w: 20, view_h: 15 };
        assert_eq!(c.project(200.0, 0.0), Some((0, 0)));
        assert_eq!(c.project(199.0, 0.0), None);
        assert_eq!(c.project(220.0, 80.0), Some((1, 2)));
        assert_eq!(c.project(600.0, 0.0), None);
    }
}
