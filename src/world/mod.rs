pub mod generation;
pub mod tile;
pub mod topology;

use crate::config::generation::GridParams;
pub use tile::{Placement, Position, Tile};
pub use topology::{Camera, Viewport};

/// Fixed-size toroidal tile map with a parallel deposit layer.
///
/// Coordinates passed to the `*_wrapped` accessors, `set`, `is_empty` and
/// `is_connector` wrap modulo the grid size. `get` does not wrap and returns
/// `None` outside the grid.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    params: GridParams,
    tiles: Vec<Tile>,
    deposits: Vec<bool>,
}

impl Grid {
    /// Build a grid and lay out deposits from `params.seed`. The seed is used
    /// as given; resolve 0 first with `generation::generate_grid`.
    ///
    /// `params` must already pass `GridParams::validate`: every coordinate
    /// wraps modulo the grid size, so a zero side cannot be represented.
    pub fn generate(params: GridParams) -> Self {
        let total = params.width as usize * params.height as usize;
        let mut grid = Grid {
            params,
            tiles: vec![Tile::Ground; total],
            deposits: vec![false; total],
        };
        let seed = grid.params.seed;
        grid.regenerate(seed);
        grid
    }

    /// Re-roll the deposit layer from `seed`, clearing every built tile.
    pub fn regenerate(&mut self, seed: u64) {
        self.params.seed = seed;
        self.deposits = generation::deposit_layout(
            self.params.width,
            self.params.height,
            seed,
            self.params.deposit_chance,
        );
        for (tile, &deposit) in self.tiles.iter_mut().zip(&self.deposits) {
            *tile = if deposit { Tile::Deposit } else { Tile::Ground };
        }
    }

    pub fn params(&self) -> &GridParams {
        &self.params
    }

    pub fn seed(&self) -> u64 {
        self.params.seed
    }

    pub fn width(&self) -> i32 {
        self.params.width as i32
    }

    pub fn height(&self) -> i32 {
        self.params.height as i32
    }

    pub fn wrap(&self, x: i32, y: i32) -> (i32, i32) {
        (
            topology::wrap(x, self.width()),
            topology::wrap(y, self.height()),
        )
    }

    fn index_wrapped(&self, x: i32, y: i32) -> usize {
        let (x, y) = self.wrap(x, y);
        y as usize * self.params.width as usize + x as usize
    }

    pub fn get(&self, x: i32, y: i32) -> Option<Tile> {
        if x < 0 || y < 0 || x >= self.width() || y >= self.height() {
            return None;
        }
        Some(self.tiles[y as usize * self.params.width as usize + x as usize])
    }

    pub fn get_wrapped(&self, x: i32, y: i32) -> Tile {
        self.tiles[self.index_wrapped(x, y)]
    }

    pub fn has_deposit_wrapped(&self, x: i32, y: i32) -> bool {
        self.deposits[self.index_wrapped(x, y)]
    }

    pub fn set(&mut self, x: i32, y: i32, tile: Tile) {
        let i = self.index_wrapped(x, y);
        self.tiles[i] = tile;
    }

    /// Nothing built here; a bare deposit counts as empty.
    pub fn is_empty(&self, x: i32, y: i32) -> bool {
        self.get_wrapped(x, y).is_open()
    }

    pub fn is_connector(&self, x: i32, y: i32) -> bool {
        self.get_wrapped(x, y).is_connector()
    }

    /// True if any of the four orthogonal neighbors is a connector.
    pub fn touches_connector(&self, x: i32, y: i32) -> bool {
        topology::ORTHOGONAL
            .iter()
            .any(|&(dx, dy)| self.is_connector(x + dx, y + dy))
    }

    pub fn wrapped_distance(&self, a: Position, b: Position) -> i32 {
        topology::wrapped_distance(a.x, a.y, b.x, b.y, self.width(), self.height())
    }

    pub fn hit_test(
        &self,
        px: f64,
        py: f64,
        viewport: &Viewport,
        camera: Option<Camera>,
    ) -> Option<(i32, i32)> {
        topology::hit_test(px, py, viewport, camera, self.width(), self.height())
    }

    pub fn deposit_count(&self) -> usize {
        self.deposits.iter().filter(|&&d| d).count()
    }

    pub fn deposits(&self) -> &[bool] {
        &self.deposits
    }

    /// Every built tile as `(x, y, kind)`, row-major.
    pub fn module_tiles(&self) -> impl Iterator<Item = Placement> + '_ {
        let w = self.params.width as usize;
        self.tiles.iter().enumerate().filter_map(move |(i, t)| {
            t.module().map(|kind| Placement {
                x: (i % w) as i32,
                y: (i / w) as i32,
                kind,
            })
        })
    }

    /// Text map of the square of side `2 * radius + 1` centred on `center`.
    pub fn render_around(&self, center: Position, radius: i32) -> Vec<String> {
        (-radius..=radius)
            .map(|dy| {
                (-radius..=radius)
                    .map(|dx| self.get_wrapped(center.x + dx, center.y + dy).glyph())
                    .collect()
            })
            .collect()
    }
}
