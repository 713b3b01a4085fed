//! A* pathfinding on a ground grid
//!
//! The grid covers the XZ plane. Cells are walkable or blocked, and
//! traversal links join two cells that are not adjacent (a gap to jump, a
//! ledge to drop from). Paths report which legs cross a link so the
//! navigator can hand those legs to the agent.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use glam::{Vec2, Vec3};
use rustc_hash::FxHashMap;

use crate::core::GridConfig;

/// A connection between two cells that must be crossed by a special move
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraversalLink {
    /// Where the agent leaves the ground
    pub start: Vec3,
    /// Where the agent lands
    pub end: Vec3,
}

impl TraversalLink {
    /// Create a link between two points
    #[must_use]
    pub fn new(start: Vec3, end: Vec3) -> Self {
        Self { start, end }
    }
}

type Cell = (usize, usize);

/// A 2D navigation grid on the XZ plane
#[derive(Debug, Clone)]
pub struct Grid {
    /// Width in cells (X)
    pub width: usize,
    /// Depth in cells (Z)
    pub height: usize,
    /// Cell size in world units
    pub cell_size: f32,
    /// Walkable cells (true = walkable)
    cells: Vec<bool>,
    /// World XZ position of the grid corner
    pub origin: Vec2,
    /// Link adjacency: cell -> (destination cell, link index)
    links: FxHashMap<Cell, Vec<(Cell, usize)>>,
    link_list: Vec<TraversalLink>,
}

impl Grid {
    /// Create a new grid (all cells walkable by default)
    #[must_use]
    pub fn new(width: usize, height: usize, cell_size: f32) -> Self {
        Self {
            width,
            height,
            cell_size,
            cells: vec![true; width * height],
            origin: Vec2::ZERO,
            links: FxHashMap::default(),
            link_list: Vec::new(),
        }
    }

    /// Create a grid from configuration
    #[must_use]
    pub fn from_config(config: &GridConfig) -> Self {
        Self::new(config.width, config.height, config.cell_size).with_origin(config.origin)
    }

    /// Set the world origin
    #[must_use]
    pub fn with_origin(mut self, origin: Vec2) -> Self {
        self.origin = origin;
        self
    }

    /// Set a cell's walkability
    pub fn set_walkable(&mut self, x: usize, y: usize, walkable: bool) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = walkable;
        }
    }

    /// Block every cell whose center lies inside the XZ rectangle
    pub fn block_rect(&mut self, min: Vec3, max: Vec3) {
        for y in 0..self.height {
            for x in 0..self.width {
                let center = self.cell_center(x, y);
                if center.x >= min.x && center.x <= max.x && center.z >= min.z && center.z <= max.z
                {
                    self.set_walkable(x, y, false);
                }
            }
        }
    }

    /// Check if a cell is walkable
    #[must_use]
    pub fn is_walkable(&self, x: usize, y: usize) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        self.cells[y * self.width + x]
    }

    /// Check if a world position lies on a walkable cell
    #[must_use]
    pub fn is_walkable_at(&self, position: Vec3) -> bool {
        self.world_to_cell(position)
            .is_some_and(|(x, y)| self.is_walkable(x, y))
    }

    /// Convert world position to grid coordinates
    #[must_use]
    pub fn world_to_grid(&self, pos: Vec3) -> (i32, i32) {
        let local = Vec2::new(pos.x, pos.z) - self.origin;
        (
            (local.x / self.cell_size).floor() as i32,
            (local.y / self.cell_size).floor() as i32,
        )
    }

    /// Convert world position to a cell inside the grid
    #[must_use]
    pub fn world_to_cell(&self, pos: Vec3) -> Option<(usize, usize)> {
        let (x, y) = self.world_to_grid(pos);
        let x = usize::try_from(x).ok()?;
        let y = usize::try_from(y).ok()?;
        (x < self.width && y < self.height).then_some((x, y))
    }

    /// Convert grid coordinates to world position (center of cell, on the ground)
    #[must_use]
    pub fn cell_center(&self, x: usize, y: usize) -> Vec3 {
        let flat = self.origin
            + Vec2::new(
                (x as f32 + 0.5) * self.cell_size,
                (y as f32 + 0.5) * self.cell_size,
            );
        Vec3::new(flat.x, 0.0, flat.y)
    }

    /// Register a traversal link usable in both directions.
    ///
    /// Returns `false` if either end is off the walkable surface.
    pub fn add_link(&mut self, start: Vec3, end: Vec3) -> bool {
        let (Some(a), Some(b)) = (self.world_to_cell(start), self.world_to_cell(end)) else {
            return false;
        };
        if !self.is_walkable(a.0, a.1) || !self.is_walkable(b.0, b.1) {
            return false;
        }

        let forward = self.link_list.len();
        self.link_list.push(TraversalLink::new(start, end));
        self.link_list.push(TraversalLink::new(end, start));
        self.links.entry(a).or_default().push((b, forward));
        self.links.entry(b).or_default().push((a, forward + 1));
        true
    }

    /// Registered links (each direction listed separately)
    #[must_use]
    pub fn links(&self) -> &[TraversalLink] {
        &self.link_list
    }

    /// Nearest point on the walkable surface within `max_distance`.
    ///
    /// A point already on a walkable cell is returned as-is (flattened).
    #[must_use]
    pub fn sample_position(&self, point: Vec3, max_distance: f32) -> Option<Vec3> {
        let flat = Vec3::new(point.x, 0.0, point.z);
        if self.is_walkable_at(flat) {
            return Some(flat);
        }

        let (cx, cy) = self.world_to_grid(flat);
        let reach = (max_distance / self.cell_size).ceil() as i32;
        let mut best: Option<(f32, Vec3)> = None;

        for dy in -reach..=reach {
            for dx in -reach..=reach {
                let (Ok(x), Ok(y)) = (usize::try_from(cx + dx), usize::try_from(cy + dy)) else {
                    continue;
                };
                if !self.is_walkable(x, y) {
                    continue;
                }
                let center = self.cell_center(x, y);
                let distance = center.distance(flat);
                if distance <= max_distance && best.is_none_or(|(d, _)| distance < d) {
                    best = Some((distance, center));
                }
            }
        }

        best.map(|(_, position)| position)
    }

    /// Get neighbors of a cell (4-directional plus links) with step cost
    fn neighbors(&self, x: usize, y: usize) -> Vec<(Cell, f32, Option<usize>)> {
        let mut result = Vec::with_capacity(4);

        if x > 0 && self.is_walkable(x - 1, y) {
            result.push(((x - 1, y), 1.0, None));
        }
        if x + 1 < self.width && self.is_walkable(x + 1, y) {
            result.push(((x + 1, y), 1.0, None));
        }
        if y > 0 && self.is_walkable(x, y - 1) {
            result.push(((x, y - 1), 1.0, None));
        }
        if y + 1 < self.height && self.is_walkable(x, y + 1) {
            result.push(((x, y + 1), 1.0, None));
        }

        if let Some(links) = self.links.get(&(x, y)) {
            for &(cell, link) in links {
                let span = self.link_list[link].start.distance(self.link_list[link].end);
                result.push((cell, (span / self.cell_size).max(1.0), Some(link)));
            }
        }

        result
    }
}

/// One corner of a path
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Waypoint {
    /// Position to reach
    pub position: Vec3,
    /// Reaching this waypoint crosses the given link
    pub link: Option<TraversalLink>,
}

/// Result of pathfinding
#[derive(Debug, Clone, Default)]
pub struct PathResult {
    /// Waypoints in world coordinates, excluding the start
    pub waypoints: Vec<Waypoint>,
    /// Total path length
    pub length: f32,
}

impl PathResult {
    /// Check if path was found
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }
}

/// A* node for priority queue
#[derive(Debug, Clone)]
struct Node {
    cell: Cell,
    f_cost: f32, // g_cost + heuristic
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.cell == other.cell
    }
}

impl Eq for Node {}

impl Ord for Node {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse for min-heap
        other
            .f_cost
            .partial_cmp(&self.f_cost)
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for Node {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Find a path using A* algorithm.
///
/// The final waypoint is `goal` itself; an empty result means no path.
#[must_use]
pub fn find_path(grid: &Grid, start: Vec3, goal: Vec3) -> PathResult {
    let (Some(start_cell), Some(goal_cell)) = (grid.world_to_cell(start), grid.world_to_cell(goal))
    else {
        return PathResult::default();
    };

    if !grid.is_walkable(start_cell.0, start_cell.1) || !grid.is_walkable(goal_cell.0, goal_cell.1)
    {
        return PathResult::default();
    }

    let goal_flat = Vec3::new(goal.x, 0.0, goal.z);
    if start_cell == goal_cell {
        return PathResult {
            waypoints: vec![Waypoint {
                position: goal_flat,
                link: None,
            }],
            length: Vec3::new(start.x, 0.0, start.z).distance(goal_flat),
        };
    }

    let mut open_set = BinaryHeap::new();
    let mut came_from: FxHashMap<Cell, (Cell, Option<usize>)> = FxHashMap::default();
    let mut g_score: FxHashMap<Cell, f32> = FxHashMap::default();

    // Straight-line distance in cells stays admissible with links
    let heuristic = |(x, y): Cell| -> f32 {
        let dx = x as f32 - goal_cell.0 as f32;
        let dy = y as f32 - goal_cell.1 as f32;
        (dx * dx + dy * dy).sqrt()
    };

    g_score.insert(start_cell, 0.0);
    open_set.push(Node {
        cell: start_cell,
        f_cost: heuristic(start_cell),
    });

    while let Some(current) = open_set.pop() {
        if current.cell == goal_cell {
            return reconstruct(grid, &came_from, start, goal_flat, goal_cell);
        }

        let current_g = g_score.get(&current.cell).copied().unwrap_or(f32::MAX);
        for (next, cost, link) in grid.neighbors(current.cell.0, current.cell.1) {
            let tentative_g = current_g + cost;

            if tentative_g < g_score.get(&next).copied().unwrap_or(f32::MAX) {
                came_from.insert(next, (current.cell, link));
                g_score.insert(next, tentative_g);
                open_set.push(Node {
                    cell: next,
                    f_cost: tentative_g + heuristic(next),
                });
            }
        }
    }

    // No path found
    PathResult::default()
}

fn reconstruct(
    grid: &Grid,
    came_from: &FxHashMap<Cell, (Cell, Option<usize>)>,
    start: Vec3,
    goal: Vec3,
    goal_cell: Cell,
) -> PathResult {
    let mut steps = Vec::new();
    let mut cell = goal_cell;
    while let Some(&(prev, link)) = came_from.get(&cell) {
        steps.push((cell, link));
        cell = prev;
    }
    steps.reverse();

    let last = steps.len().saturating_sub(1);
    let mut waypoints = Vec::with_capacity(steps.len() + 1);
    for (i, &((x, y), link)) in steps.iter().enumerate() {
        match link.map(|index| grid.link_list[index]) {
            Some(link) => {
                // Walk to the take-off point, then cross
                waypoints.push(Waypoint {
                    position: link.start,
                    link: None,
                });
                waypoints.push(Waypoint {
                    position: link.end,
                    link: Some(link),
                });
            }
            None if i == last => {}
            None => waypoints.push(Waypoint {
                position: grid.cell_center(x, y),
                link: None,
            }),
        }
    }
    waypoints.push(Waypoint {
        position: goal,
        link: None,
    });

    let length = calculate_path_length(Vec3::new(start.x, 0.0, start.z), &waypoints);
    PathResult { waypoints, length }
}

/// Calculate total path length
fn calculate_path_length(start: Vec3, waypoints: &[Waypoint]) -> f32 {
    let mut length = 0.0;
    let mut previous = start;
    for waypoint in waypoints {
        length += waypoint.position.distance(previous);
        previous = waypoint.position;
    }
    length
}
