//! Toroidal coordinate math and the screen-to-tile hit test.

use serde::{Deserialize, Serialize};

/// Orthogonal neighbor offsets: east, west, north, south.
pub const ORTHOGONAL: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, -1), (0, 1)];

/// Wrap `v` into `[0, n)`. `n` must be positive.
pub fn wrap(v: i32, n: i32) -> i32 {
    v.rem_euclid(n)
}

/// Shortest distance between `a` and `b` along one axis of length `n`.
pub fn axis_distance(a: i32, b: i32, n: i32) -> i32 {
    let d = (wrap(a, n) - wrap(b, n)).abs();
    d.min(n - d)
}

/// Chebyshev distance on a `width` x `height` torus.
pub fn wrapped_distance(ax: i32, ay: i32, bx: i32, by: i32, width: i32, height: i32) -> i32 {
    axis_distance(ax, bx, width).max(axis_distance(ay, by, height))
}

/// Screen layout of the tile area, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub cell_w: f64,
    pub cell_h: f64,
    pub origin_x: f64,
    pub origin_y: f64,
    pub canvas_w: f64,
    pub canvas_h: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Viewport {
            cell_w: 18.0,
            cell_h: 24.0,
            origin_x: 360.0,
            origin_y: 20.0,
            canvas_w: 1280.0,
            canvas_h: 720.0,
        }
    }
}

/// Margin kept free on the right and bottom of the canvas.
const VIEWPORT_MARGIN: f64 = 20.0;

impl Viewport {
    /// Whole tiles visible across and down.
    pub fn tiles_visible(&self) -> (i32, i32) {
        let w = ((self.canvas_w - self.origin_x - VIEWPORT_MARGIN) / self.cell_w).floor();
        let h = ((self.canvas_h - self.origin_y - VIEWPORT_MARGIN) / self.cell_h).floor();
        (w as i32, h as i32)
    }

    fn local_tile(&self, px: f64, py: f64) -> (i32, i32) {
        let lx = ((px - self.origin_x) / self.cell_w).floor();
        let ly = ((py - self.origin_y) / self.cell_h).floor();
        (lx as i32, ly as i32)
    }
}

/// World tile the viewport is centred on.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Camera {
    pub x: f64,
    pub y: f64,
}

/// Map a pixel to a tile. With a camera the result is a wrapped world
/// coordinate; without one the tile area is treated as the whole unscrolled
/// grid. `None` when the pixel falls outside.
pub fn hit_test(
    px: f64,
    py: f64,
    viewport: &Viewport,
    camera: Option<Camera>,
    width: i32,
    height: i32,
) -> Option<(i32, i32)> {
    let (lx, ly) = viewport.local_tile(px, py);
    if lx < 0 || ly < 0 {
        return None;
    }
    match camera {
        Some(cam) => {
            let (vw, vh) = viewport.tiles_visible();
            // The partially visible last column and row still count.
            if lx > vw || ly > vh {
                return None;
            }
            let start_x = (cam.x - vw as f64 / 2.0).floor() as i32;
            let start_y = (cam.y - vh as f64 / 2.0).floor() as i32;
            Some((wrap(start_x + lx, width), wrap(start_y + ly, height)))
        }
        None => (lx < width && ly < height).then_some((lx, ly)),
    }
}
