use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    None,
}

impl Direction {
    /// Fixed scan order used everywhere a direction list is built.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Right,
        Direction::Down,
        Direction::Left,
    ];

    pub fn opposite(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
            Self::None => Self::None,
        }
    }

    pub fn delta(self) -> (i32, i32) {
        match self {
            Self::Up => (0, -1),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
            Self::None => (0, 0),
        }
    }

    pub fn unit(self) -> Vec2 {
        let (dx, dy) = self.delta();
        Vec2::new(dx as f32, dy as f32)
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, Self::Left | Self::Right)
    }

    pub fn is_vertical(self) -> bool {
        matches!(self, Self::Up | Self::Down)
    }

    /// Facing for a displacement, by dominant axis. Ties go vertical.
    pub fn from_delta(dx: f32, dy: f32) -> Self {
        if dx == 0.0 && dy == 0.0 {
            return Self::None;
        }
        if dx.abs() > dy.abs() {
            if dx > 0.0 {
                Self::Right
            } else {
                Self::Left
            }
        } else if dy > 0.0 {
            Self::Down
        } else {
            Self::Up
        }
    }
}

/// Continuous position in grid units. The owning cell is `floor` of each axis.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn cell(self) -> Cell {
        Cell {
            x: self.x.floor() as i32,
            y: self.y.floor() as i32,
        }
    }

    pub fn distance(self, other: Vec2) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn offset(self, dir: Direction, amount: f32) -> Vec2 {
        let unit = dir.unit();
        Vec2::new(self.x + unit.x * amount, self.y + unit.y * amount)
    }
}

impl From<(f32, f32)> for Vec2 {
    fn from(value: (f32, f32)) -> Self {
        Vec2::new(value.0, value.1)
    }
}

impl From<Vec2> for Cell {
    fn from(value: Vec2) -> Self {
        value.cell()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn center(self) -> Vec2 {
        Vec2::new(self.x as f32 + 0.5, self.y as f32 + 0.5)
    }

    pub fn step(self, dir: Direction) -> Cell {
        let (dx, dy) = dir.delta();
        Cell::new(self.x + dx, self.y + dy)
    }

    pub fn manhattan(self, other: Cell) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CellKind {
    Empty,
    Wall,
    Pellet,
    PowerPellet,
    GhostHouse,
    GhostDoor,
}

impl CellKind {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Empty),
            1 => Some(Self::Wall),
            2 => Some(Self::Pellet),
            3 => Some(Self::PowerPellet),
            4 => Some(Self::GhostHouse),
            5 => Some(Self::GhostDoor),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Self::Empty => 0,
            Self::Wall => 1,
            Self::Pellet => 2,
            Self::PowerPellet => 3,
            Self::GhostHouse => 4,
            Self::GhostDoor => 5,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PelletKind {
    Pellet,
    PowerPellet,
}

impl PelletKind {
    pub fn points(self) -> u32 {
        match self {
            Self::Pellet => crate::constants::PELLET_POINTS,
            Self::PowerPellet => crate::constants::POWER_PELLET_POINTS,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Personality {
    Chaser,
    Ambusher,
    Fickle,
    Shy,
}

impl Personality {
    pub const ROSTER: [Personality; 4] = [
        Personality::Chaser,
        Personality::Ambusher,
        Personality::Fickle,
        Personality::Shy,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Chaser => "blinky",
            Self::Ambusher => "pinky",
            Self::Fickle => "inky",
            Self::Shy => "clyde",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GhostMode {
    WaitingInHouse,
    LeavingHouse,
    Scatter,
    Chase,
    Frightened,
    Eaten,
    Recovering,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    Ready,
    Playing,
    Dying,
    LevelComplete,
    GameOver,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FruitKind {
    Cherry,
    Strawberry,
    Orange,
}

impl FruitKind {
    pub fn for_level(level: u32) -> Self {
        if level <= 2 {
            Self::Cherry
        } else if level <= 4 {
            Self::Strawberry
        } else {
            Self::Orange
        }
    }

    pub fn base_points(self) -> u32 {
        match self {
            Self::Cherry => 100,
            Self::Strawberry => 300,
            Self::Orange => 500,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct PlayerView {
    pub x: f32,
    pub y: f32,
    pub dir: Direction,
    #[serde(rename = "nextDir")]
    pub next_dir: Direction,
    pub alive: bool,
    pub powered: bool,
    #[serde(rename = "powerEnding")]
    pub power_ending: bool,
    pub score: u32,
    pub lives: u32,
}

#[derive(Clone, Debug, Serialize)]
pub struct GhostView {
    pub name: &'static str,
    pub personality: Personality,
    pub x: f32,
    pub y: f32,
    pub dir: Direction,
    pub mode: GhostMode,
    pub frightened: bool,
    pub blinking: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct FruitView {
    pub kind: FruitKind,
    pub x: f32,
    pub y: f32,
    pub points: u32,
}

#[derive(Clone, Copy, Debug, Serialize)]
pub struct PelletCounts {
    #[serde(rename = "pelletsTotal")]
    pub pellets_total: u32,
    #[serde(rename = "pelletsEaten")]
    pub pellets_eaten: u32,
    #[serde(rename = "powerPelletsTotal")]
    pub power_pellets_total: u32,
    #[serde(rename = "powerPelletsEaten")]
    pub power_pellets_eaten: u32,
}

#[derive(Clone, Debug, Serialize)]
pub struct MazeView {
    pub width: i32,
    pub height: i32,
    pub rows: Vec<Vec<u8>>,
    pub pellets: PelletCounts,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuntimeEvent {
    PelletEaten {
        x: i32,
        y: i32,
    },
    PowerPelletEaten {
        x: i32,
        y: i32,
    },
    GhostsFrightened {
        #[serde(rename = "durationMs")]
        duration_ms: u64,
    },
    GhostEaten {
        ghost: &'static str,
        points: u32,
        chain: u32,
    },
    PlayerDied {
        #[serde(rename = "livesLeft")]
        lives_left: u32,
    },
    FruitSpawned {
        kind: FruitKind,
        points: u32,
    },
    FruitEaten {
        kind: FruitKind,
        points: u32,
    },
    FruitExpired {
        kind: FruitKind,
    },
    LevelCompleted {
        level: u32,
        bonus: u32,
    },
    LevelStarted {
        level: u32,
    },
    GameOver {
        score: u32,
    },
}

#[derive(Clone, Debug, Serialize)]
pub struct Snapshot {
    pub tick: u64,
    #[serde(rename = "elapsedMs")]
    pub elapsed_ms: u64,
    pub level: u32,
    pub phase: GamePhase,
    pub player: PlayerView,
    pub ghosts: Vec<GhostView>,
    pub pellets: PelletCounts,
    pub fruit: Option<FruitView>,
    pub events: Vec<RuntimeEvent>,
}

#[derive(Clone, Debug, Serialize)]
pub struct GameSummary {
    pub score: u32,
    pub level: u32,
    #[serde(rename = "levelsCleared")]
    pub levels_cleared: u32,
    #[serde(rename = "livesLeft")]
    pub lives_left: u32,
    #[serde(rename = "ghostsEaten")]
    pub ghosts_eaten: u32,
    #[serde(rename = "pelletsEaten")]
    pub pellets_eaten: u32,
    #[serde(rename = "fruitsEaten")]
    pub fruits_eaten: u32,
    #[serde(rename = "durationMs")]
    pub duration_ms: u64,
    #[serde(rename = "gameOver")]
    pub game_over: bool,
}
