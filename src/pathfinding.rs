use std::collections::HashSet;

use crate::types::{Cell, Direction, Vec2};
use crate::world::GridMap;

struct Node {
    cell: Cell,
    g: i32,
    f: i32,
    parent: Option<usize>,
}

/// A* over the 4-connected grid with unit step cost and a Manhattan heuristic.
///
/// Returns cell-center waypoints from the first step after `start` through
/// `target`. Empty when the two share a cell or no route exists. Tunnels are
/// not followed.
pub fn find_path(
    map: &GridMap,
    start: impl Into<Cell>,
    target: impl Into<Cell>,
    allow_door: bool,
) -> Vec<Vec2> {
    let start = start.into();
    let target = target.into();
    if start == target {
        return Vec::new();
    }

    let mut nodes = vec![Node {
        cell: start,
        g: 0,
        f: start.manhattan(target),
        parent: None,
    }];
    let mut open: Vec<usize> = vec![0];
    let mut closed: HashSet<Cell> = HashSet::new();

    while !open.is_empty() {
        let mut lowest = 0;
        for (slot, &idx) in open.iter().enumerate() {
            if nodes[idx].f < nodes[open[lowest]].f {
                lowest = slot;
            }
        }
        let current = open.remove(lowest);
        let current_cell = nodes[current].cell;

        if current_cell == target {
            return rebuild(&nodes, current);
        }
        closed.insert(current_cell);

        for dir in Direction::ALL {
            let next = current_cell.step(dir);
            if closed.contains(&next) || !map.is_open(next, allow_door) {
                continue;
            }
            let g = nodes[current].g + 1;
            match open.iter().copied().find(|&idx| nodes[idx].cell == next) {
                Some(idx) => {
                    if g < nodes[idx].g {
                        let h = nodes[idx].f - nodes[idx].g;
                        nodes[idx].g = g;
                        nodes[idx].f = g + h;
                        nodes[idx].parent = Some(current);
                    }
                }
                None => {
                    nodes.push(Node {
                        cell: next,
                        g,
                        f: g + next.manhattan(target),
                        parent: Some(current),
                    });
                    open.push(nodes.len() - 1);
                }
            }
        }
    }

    Vec::new()
}

fn rebuild(nodes: &[Node], end: usize) -> Vec<Vec2> {
    let mut path = Vec::new();
    let mut cursor = end;
    while let Some(parent) = nodes[cursor].parent {
        path.push(nodes[cursor].cell.center());
        cursor = parent;
    }
    path.reverse();
    path
}
