use crate::error::MazeError;
use crate::rng::Rng;
use crate::types::{Cell, CellKind, Direction, MazeView, PelletCounts, PelletKind, Personality, Vec2};

const CLASSIC_WIDTH: usize = 28;
const CLASSIC_HEIGHT: usize = 31;

#[rustfmt::skip]
const CLASSIC_LAYOUT: [[u8; CLASSIC_WIDTH]; CLASSIC_HEIGHT] = [
    [1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1],
    [1, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 1, 1, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 1],
    [1, 2, 1, 1, 1, 1, 2, 1, 1, 1, 1, 1, 2, 1, 1, 2, 1, 1, 1, 1, 1, 2, 1, 1, 1, 1, 2, 1],
    [1, 3, 1, 1, 1, 1, 2, 1, 1, 1, 1, 1, 2, 1, 1, 2, 1, 1, 1, 1, 1, 2, 1, 1, 1, 1, 3, 1],
    [1, 2, 1, 1, 1, 1, 2, 1, 1, 1, 1, 1, 2, 1, 1, 2, 1, 1, 1, 1, 1, 2, 1, 1, 1, 1, 2, 1],
    [1, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 1],
    [1, 2, 1, 1, 1, 1, 2, 1, 1, 2, 1, 1, 1, 1, 1, 1, 1, 1, 2, 1, 1, 2, 1, 1, 1, 1, 2, 1],
    [1, 2, 1, 1, 1, 1, 2, 1, 1, 2, 1, 1, 1, 1, 1, 1, 1, 1, 2, 1, 1, 2, 1, 1, 1, 1, 2, 1],
    [1, 2, 2, 2, 2, 2, 2, 1, 1, 2, 2, 2, 2, 1, 1, 2, 2, 2, 2, 1, 1, 2, 2, 2, 2, 2, 2, 1],
    [1, 1, 1, 1, 1, 1, 2, 1, 1, 1, 1, 1, 0, 1, 1, 0, 1, 1, 1, 1, 1, 2, 1, 1, 1, 1, 1, 1],
    [0, 0, 0, 0, 0, 1, 2, 1, 1, 1, 1, 1, 0, 1, 1, 0, 1, 1, 1, 1, 1, 2, 1, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 1, 2, 1, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 2, 1, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 1, 2, 1, 1, 0, 1, 1, 1, 5, 5, 1, 1, 1, 0, 1, 1, 2, 1, 0, 0, 0, 0, 0],
    [1, 1, 1, 1, 1, 1, 2, 1, 1, 0, 1, 4, 4, 4, 4, 4, 4, 1, 0, 1, 1, 2, 1, 1, 1, 1, 1, 1],
    [0, 0, 0, 0, 0, 0, 2, 0, 0, 0, 1, 4, 4, 4, 4, 4, 4, 1, 0, 0, 0, 2, 0, 0, 0, 0, 0, 0],
    [1, 1, 1, 1, 1, 1, 2, 1, 1, 0, 1, 4, 4, 4, 4, 4, 4, 1, 0, 1, 1, 2, 1, 1, 1, 1, 1, 1],
    [0, 0, 0, 0, 0, 1, 2, 1, 1, 0, 1, 1, 1, 1, 1, 1, 1, 1, 0, 1, 1, 2, 1, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 1, 2, 1, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 2, 1, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 1, 2, 1, 1, 0, 1, 1, 1, 1, 1, 1, 1, 1, 0, 1, 1, 2, 1, 0, 0, 0, 0, 0],
    [1, 1, 1, 1, 1, 1, 2, 1, 1, 0, 1, 1, 1, 1, 1, 1, 1, 1, 0, 1, 1, 2, 1, 1, 1, 1, 1, 1],
    [1, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 1, 1, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 1],
    [1, 2, 1, 1, 1, 1, 2, 1, 1, 1, 1, 1, 2, 1, 1, 2, 1, 1, 1, 1, 1, 2, 1, 1, 1, 1, 2, 1],
    [1, 2, 1, 1, 1, 1, 2, 1, 1, 1, 1, 1, 2, 1, 1, 2, 1, 1, 1, 1, 1, 2, 1, 1, 1, 1, 2, 1],
    [1, 3, 2, 2, 1, 1, 2, 2, 2, 2, 2, 2, 2, 0, 0, 2, 2, 2, 2, 2, 2, 2, 1, 1, 2, 2, 3, 1],
    [1, 1, 1, 2, 1, 1, 2, 1, 1, 2, 1, 1, 1, 1, 1, 1, 1, 1, 2, 1, 1, 2, 1, 1, 2, 1, 1, 1],
    [1, 1, 1, 2, 1, 1, 2, 1, 1, 2, 1, 1, 1, 1, 1, 1, 1, 1, 2, 1, 1, 2, 1, 1, 2, 1, 1, 1],
    [1, 2, 2, 2, 2, 2, 2, 1, 1, 2, 2, 2, 2, 1, 1, 2, 2, 2, 2, 1, 1, 2, 2, 2, 2, 2, 2, 1],
    [1, 2, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 2, 1, 1, 2, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 2, 1],
    [1, 2, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 2, 1, 1, 2, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 2, 1],
    [1, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 1],
    [1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1],
];

/// Extra walls switched on from level 3.
const LEVEL_THREE_WALLS: [(i32, i32); 6] = [(13, 8), (14, 8), (6, 15), (21, 15), (9, 21), (18, 21)];
/// Extra walls switched on from level 5.
const LEVEL_FIVE_WALLS: [(i32, i32); 6] =
    [(8, 10), (19, 10), (11, 16), (16, 16), (13, 20), (14, 20)];

/// Fraction of the cell a wall actually occupies, measured from its top-left corner.
const WALL_EXTENT: f32 = 0.8;
/// Walls are tested against a circle smaller than the body radius.
const WALL_CHECK_FACTOR: f32 = 0.6;

pub const PLAYER_START: Vec2 = Vec2::new(13.5, 23.0);

pub fn ghost_start(personality: Personality) -> Vec2 {
    match personality {
        Personality::Chaser => Vec2::new(13.5, 11.0),
        Personality::Ambusher => Vec2::new(13.5, 14.0),
        Personality::Fickle => Vec2::new(11.5, 14.0),
        Personality::Shy => Vec2::new(15.5, 14.0),
    }
}

#[derive(Clone, Debug)]
pub struct GridMap {
    width: i32,
    height: i32,
    cells: Vec<CellKind>,
    tunnel_rows: Vec<bool>,
    pellets_total: u32,
    pellets_eaten: u32,
    power_pellets_total: u32,
    power_pellets_eaten: u32,
}

impl GridMap {
    pub fn from_codes<R: AsRef<[u8]>>(rows: &[R]) -> Result<Self, MazeError> {
        let width = rows.first().map(|row| row.as_ref().len()).unwrap_or(0);
        if width == 0 {
            return Err(MazeError::EmptyLayout);
        }

        let mut cells = Vec::with_capacity(width * rows.len());
        for (y, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != width {
                return Err(MazeError::RaggedRow {
                    row: y,
                    expected: width,
                    actual: row.len(),
                });
            }
            for (x, &code) in row.iter().enumerate() {
                let kind =
                    CellKind::from_code(code).ok_or(MazeError::UnknownCellCode { x, y, code })?;
                cells.push(kind);
            }
        }

        Ok(Self::with_cells(width as i32, rows.len() as i32, cells))
    }

    pub fn classic() -> Self {
        let cells = CLASSIC_LAYOUT
            .iter()
            .flat_map(|row| row.iter())
            .map(|&code| CellKind::from_code(code).unwrap_or(CellKind::Wall))
            .collect();
        Self::with_cells(CLASSIC_WIDTH as i32, CLASSIC_HEIGHT as i32, cells)
    }

    /// Classic layout with the walls unlocked at `level` placed over pellet cells.
    pub fn for_level(level: u32) -> Self {
        let mut map = Self::classic();
        if level >= 3 {
            map.raise_walls(&LEVEL_THREE_WALLS);
        }
        if level >= 5 {
            map.raise_walls(&LEVEL_FIVE_WALLS);
        }
        map
    }

    fn with_cells(width: i32, height: i32, cells: Vec<CellKind>) -> Self {
        let mut map = Self {
            width,
            height,
            cells,
            tunnel_rows: Vec::new(),
            pellets_total: 0,
            pellets_eaten: 0,
            power_pellets_total: 0,
            power_pellets_eaten: 0,
        };
        for kind in &map.cells {
            match kind {
                CellKind::Pellet => map.pellets_total += 1,
                CellKind::PowerPellet => map.power_pellets_total += 1,
                _ => {}
            }
        }
        map.tunnel_rows = (0..height)
            .map(|y| {
                map.cell_kind(Cell::new(0, y)) != CellKind::Wall
                    && map.cell_kind(Cell::new(width - 1, y)) != CellKind::Wall
            })
            .collect();
        map
    }

    fn raise_walls(&mut self, walls: &[(i32, i32)]) {
        for &(x, y) in walls {
            let Some(idx) = self.index(Cell::new(x, y)) else {
                continue;
            };
            if self.cells[idx] == CellKind::Pellet {
                self.cells[idx] = CellKind::Wall;
                self.pellets_total -= 1;
            }
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    fn index(&self, cell: Cell) -> Option<usize> {
        if cell.x < 0 || cell.y < 0 || cell.x >= self.width || cell.y >= self.height {
            return None;
        }
        Some((cell.y * self.width + cell.x) as usize)
    }

    pub fn in_bounds(&self, cell: Cell) -> bool {
        self.index(cell).is_some()
    }

    /// Out of bounds reads as wall.
    pub fn cell_kind(&self, at: impl Into<Cell>) -> CellKind {
        self.index(at.into())
            .map(|idx| self.cells[idx])
            .unwrap_or(CellKind::Wall)
    }

    pub fn is_wall(&self, at: impl Into<Cell>) -> bool {
        self.cell_kind(at) == CellKind::Wall
    }

    pub fn is_ghost_door(&self, at: impl Into<Cell>) -> bool {
        self.cell_kind(at) == CellKind::GhostDoor
    }

    pub fn is_in_ghost_house(&self, at: impl Into<Cell>) -> bool {
        self.cell_kind(at) == CellKind::GhostHouse
    }

    pub fn is_open(&self, at: impl Into<Cell>, allow_door: bool) -> bool {
        match self.cell_kind(at) {
            CellKind::Wall => false,
            CellKind::GhostDoor => allow_door,
            _ => true,
        }
    }

    pub fn is_tunnel_row(&self, y: i32) -> bool {
        y >= 0 && (y as usize) < self.tunnel_rows.len() && self.tunnel_rows[y as usize]
    }

    /// Adjacent cell, wrapping horizontally on tunnel rows.
    pub fn neighbor(&self, cell: Cell, dir: Direction) -> Cell {
        let next = cell.step(dir);
        if self.is_tunnel_row(next.y) && (next.x < 0 || next.x >= self.width) {
            return Cell::new(next.x.rem_euclid(self.width), next.y);
        }
        next
    }

    pub fn wrap_x(&self, x: f32) -> f32 {
        if x < 0.0 {
            (self.width - 1) as f32
        } else if x >= self.width as f32 {
            0.0
        } else {
            x
        }
    }

    pub fn consume_pellet(&mut self, at: impl Into<Cell>) -> Option<PelletKind> {
        let idx = self.index(at.into())?;
        let eaten = match self.cells[idx] {
            CellKind::Pellet => {
                self.pellets_eaten += 1;
                PelletKind::Pellet
            }
            CellKind::PowerPellet => {
                self.power_pellets_eaten += 1;
                PelletKind::PowerPellet
            }
            _ => return None,
        };
        self.cells[idx] = CellKind::Empty;
        Some(eaten)
    }

    pub fn all_pellets_consumed(&self) -> bool {
        self.pellets_eaten == self.pellets_total
            && self.power_pellets_eaten == self.power_pellets_total
    }

    pub fn pellet_counts(&self) -> PelletCounts {
        PelletCounts {
            pellets_total: self.pellets_total,
            pellets_eaten: self.pellets_eaten,
            power_pellets_total: self.power_pellets_total,
            power_pellets_eaten: self.power_pellets_eaten,
        }
    }

    pub fn is_valid_position(&self, pos: Vec2, radius: f32) -> bool {
        let width = self.width as f32;
        let height = self.height as f32;
        if pos.x < 0.0 || pos.x >= width || pos.y < 0.0 || pos.y >= height {
            let off_side = pos.x < 0.0 || pos.x >= width;
            let row_in_range = pos.y >= 0.0 && pos.y < height;
            return off_side && row_in_range && self.is_tunnel_row(pos.y.floor() as i32);
        }

        let check = radius * WALL_CHECK_FACTOR;
        let min_x = (pos.x - check).floor() as i32;
        let max_x = (pos.x + check).floor() as i32;
        let min_y = (pos.y - check).floor() as i32;
        let max_y = (pos.y + check).floor() as i32;
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let cell = Cell::new(x, y);
                if !self.in_bounds(cell) || !self.is_wall(cell) {
                    continue;
                }
                if circle_hits_wall(pos, check, cell) {
                    return false;
                }
            }
        }
        true
    }

    /// Bounded retry for an interior non-wall cell.
    pub fn random_open_cell(&self, rng: &mut Rng, attempts: u32) -> Option<Cell> {
        for _ in 0..attempts {
            let x = rng.int_between(1, self.width - 2);
            let y = rng.int_between(1, self.height - 2);
            let cell = Cell::new(x, y);
            if !self.is_wall(cell) {
                return Some(cell);
            }
        }
        None
    }

    pub fn maze_view(&self) -> MazeView {
        let rows = self
            .cells
            .chunks(self.width as usize)
            .map(|row| row.iter().map(|kind| kind.code()).collect())
            .collect();
        MazeView {
            width: self.width,
            height: self.height,
            rows,
            pellets: self.pellet_counts(),
        }
    }
}

fn circle_hits_wall(center: Vec2, radius: f32, wall: Cell) -> bool {
    let left = wall.x as f32;
    let top = wall.y as f32;
    let closest_x = center.x.clamp(left, left + WALL_EXTENT);
    let closest_y = center.y.clamp(top, top + WALL_EXTENT);
    let dx = center.x - closest_x;
    let dy = center.y - closest_y;
    dx * dx + dy * dy < radius * radius
}
