use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MazeError {
    EmptyLayout,
    RaggedRow { row: usize, expected: usize, actual: usize },
    UnknownCellCode { x: usize, y: usize, code: u8 },
}

impl fmt::Display for MazeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyLayout => write!(f, "maze layout has no cells"),
            Self::RaggedRow {
                row,
                expected,
                actual,
            } => write!(
                f,
                "maze row {row} has {actual} cells, expected {expected}"
            ),
            Self::UnknownCellCode { x, y, code } => {
                write!(f, "unknown cell code {code} at ({x}, {y})")
            }
        }
    }
}

impl std::error::Error for MazeError {}
