//! Grid cells, static obstacles, food storage and the creature bucket index.

use crate::geometry::Point;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Integer grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Cell containing a continuous position
    #[inline]
    pub fn containing(p: Point) -> Self {
        Self {
            x: p.x.floor() as i32,
            y: p.y.floor() as i32,
        }
    }

    /// The cell's integer coordinates as a point. Food and obstacles are
    /// positioned here, not at the geometric middle of the cell.
    #[inline]
    pub fn to_point(self) -> Point {
        Point::new(self.x as f32, self.y as f32)
    }
}

/// Interior obstacle layout tuned for a 50x50 grid: vertical and horizontal
/// segments, four corner L-shapes and two bends.
const DEFAULT_LAYOUT: &[(i32, i32)] = &[
    // vertical segments
    (6, 6), (6, 7), (6, 8), (6, 9),
    (22, 6), (22, 7), (22, 8), (22, 9),
    (6, 28), (6, 29), (6, 30), (6, 31),
    (22, 36), (22, 37), (22, 38), (22, 39),
    (38, 28), (38, 29), (38, 30), (38, 31),
    (42, 18), (42, 19), (42, 20), (42, 21),
    // horizontal segments
    (10, 12), (11, 12), (12, 12), (13, 12),
    (28, 12), (29, 12), (30, 12), (31, 12),
    (10, 22), (11, 22), (12, 22), (13, 22),
    (28, 22), (29, 22), (30, 22), (31, 22),
    (18, 42), (19, 42), (20, 42), (21, 42),
    // L-shapes
    (4, 4), (5, 4), (4, 5), (4, 6),
    (44, 4), (43, 4), (44, 5), (44, 6),
    (4, 44), (5, 44), (4, 43), (4, 42),
    (44, 44), (43, 44), (44, 43), (44, 42),
    // bends
    (17, 17), (18, 17), (19, 17), (20, 17), (20, 18), (20, 19),
    (30, 32), (30, 33), (30, 34), (31, 34), (32, 34), (33, 34),
];

/// The default interior obstacle layout
pub fn default_obstacle_layout() -> Vec<Cell> {
    DEFAULT_LAYOUT.iter().map(|&(x, y)| Cell::new(x, y)).collect()
}

/// Static obstacles: an interior set plus the four grid edges.
///
/// Border cells are never stored; they are synthesized on demand.
#[derive(Debug, Clone)]
pub struct ObstacleMap {
    grid_size: i32,
    interior: Vec<Cell>,
    lookup: HashSet<Cell>,
}

impl ObstacleMap {
    /// Build the map, dropping layout cells outside the grid
    pub fn new(grid_size: usize, layout: &[Cell]) -> Self {
        let grid_size = grid_size as i32;
        let mut lookup = HashSet::with_capacity(layout.len());
        let interior: Vec<Cell> = layout
            .iter()
            .copied()
            .filter(|c| c.x >= 0 && c.x < grid_size && c.y >= 0 && c.y < grid_size)
            .filter(|c| lookup.insert(*c))
            .collect();

        Self {
            grid_size,
            interior,
            lookup,
        }
    }

    #[inline]
    pub fn grid_size(&self) -> i32 {
        self.grid_size
    }

    #[inline]
    pub fn in_bounds(&self, cell: Cell) -> bool {
        cell.x >= 0 && cell.x < self.grid_size && cell.y >= 0 && cell.y < self.grid_size
    }

    #[inline]
    pub fn is_border(&self, cell: Cell) -> bool {
        self.in_bounds(cell)
            && (cell.x == 0 || cell.y == 0 || cell.x == self.grid_size - 1 || cell.y == self.grid_size - 1)
    }

    /// Interior or border obstacle at this cell
    #[inline]
    pub fn is_obstacle(&self, cell: Cell) -> bool {
        self.is_border(cell) || self.lookup.contains(&cell)
    }

    /// Interior obstacles only
    pub fn interior(&self) -> &[Cell] {
        &self.interior
    }

    /// Border cells inside the axis-aligned box around `center`.
    pub fn border_cells_near(&self, center: Point, radius: f32) -> Vec<Cell> {
        let last = self.grid_size - 1;
        let x_min = ((center.x - radius).floor() as i32).max(0);
        let x_max = ((center.x + radius).ceil() as i32).min(last);
        let y_min = ((center.y - radius).floor() as i32).max(0);
        let y_max = ((center.y + radius).ceil() as i32).min(last);

        let mut cells = Vec::new();
        if x_min > x_max || y_min > y_max {
            return cells;
        }

        for edge_y in [0, last] {
            if edge_y >= y_min && edge_y <= y_max {
                cells.extend((x_min..=x_max).map(|x| Cell::new(x, edge_y)));
            }
        }
        for edge_x in [0, last] {
            if edge_x >= x_min && edge_x <= x_max {
                cells.extend(
                    (y_min.max(1)..=y_max.min(last - 1)).map(|y| Cell::new(edge_x, y)),
                );
            }
        }
        cells
    }
}

/// Food items with an O(1) cell lookup kept in sync on every change.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Cell>", into = "Vec<Cell>")]
pub struct FoodField {
    cells: Vec<Cell>,
    lookup: HashSet<Cell>,
}

impl From<Vec<Cell>> for FoodField {
    fn from(cells: Vec<Cell>) -> Self {
        let mut field = FoodField::default();
        for cell in cells {
            field.insert(cell);
        }
        field
    }
}

impl From<FoodField> for Vec<Cell> {
    fn from(field: FoodField) -> Self {
        field.cells
    }
}

impl FoodField {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    #[inline]
    pub fn contains(&self, cell: Cell) -> bool {
        self.lookup.contains(&cell)
    }

    /// Add food; returns false if the cell already holds food
    pub fn insert(&mut self, cell: Cell) -> bool {
        if self.lookup.insert(cell) {
            self.cells.push(cell);
            true
        } else {
            false
        }
    }

    /// Remove food; returns false if there was none
    pub fn remove(&mut self, cell: Cell) -> bool {
        if !self.lookup.remove(&cell) {
            return false;
        }
        if let Some(pos) = self.cells.iter().position(|&c| c == cell) {
            self.cells.remove(pos);
        }
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = Cell> + '_ {
        self.cells.iter().copied()
    }

    pub fn as_slice(&self) -> &[Cell] {
        &self.cells
    }

    /// Closest food cell within `radius` of `p`
    pub fn nearest_within(&self, p: Point, radius: f32) -> Option<Cell> {
        let r2 = radius * radius;
        self.cells
            .iter()
            .map(|&c| (c, c.to_point().distance_sq(p)))
            .filter(|&(_, d2)| d2 < r2)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(c, _)| c)
    }
}

/// Spatial index for fast creature lookups by bucket (floor of position).
///
/// Rebuilt from scratch whenever creature positions change, so it never
/// carries stale entries across ticks.
#[derive(Clone, Debug, Default)]
pub struct SpatialIndex {
    buckets: HashMap<Cell, Vec<usize>>,
}

impl SpatialIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all entries
    pub fn clear(&mut self) {
        self.buckets.clear();
    }

    /// Rebuild from positions; stored values are indices into the slice
    pub fn rebuild<I>(&mut self, positions: I)
    where
        I: IntoIterator<Item = Point>,
    {
        self.clear();
        for (idx, p) in positions.into_iter().enumerate() {
            self.insert(p, idx);
        }
    }

    #[inline]
    pub fn insert(&mut self, p: Point, idx: usize) {
        self.buckets.entry(Cell::containing(p)).or_default().push(idx);
    }

    /// Indices in the bucket of a cell
    #[inline]
    pub fn get(&self, cell: Cell) -> &[usize] {
        self.buckets.get(&cell).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Indices in the 3x3 block of buckets around `p`
    pub fn neighbors(&self, p: Point) -> impl Iterator<Item = usize> + '_ {
        let center = Cell::containing(p);
        (-1..=1)
            .flat_map(move |dy| (-1..=1).map(move |dx| Cell::new(center.x + dx, center.y + dy)))
            .flat_map(move |cell| self.get(cell).iter().copied())
    }

    /// Indices in every bucket overlapping the box of `radius` around `p`
    pub fn query_radius(&self, p: Point, radius: f32) -> Vec<usize> {
        let x_min = (p.x - radius).floor() as i32;
        let x_max = (p.x + radius).floor() as i32;
        let y_min = (p.y - radius).floor() as i32;
        let y_max = (p.y + radius).floor() as i32;

        let mut results = Vec::new();
        for y in y_min..=y_max {
            for x in x_min..=x_max {
                results.extend_from_slice(self.get(Cell::new(x, y)));
            }
        }
        results
    }
}

/// Cell blocked for placement: obstacle (interior or border) or food
#[inline]
pub fn is_occupied(obstacles: &ObstacleMap, food: &FoodField, cell: Cell) -> bool {
    obstacles.is_obstacle(cell) || food.contains(cell)
}

/// Random cell holding neither food nor an obstacle, or `None` after a bounded search.
pub fn random_free_cell<R: Rng + ?Sized>(
    rng: &mut R,
    obstacles: &ObstacleMap,
    food: &FoodField,
) -> Option<Cell> {
    let n = obstacles.grid_size();
    if n < 3 {
        return None;
    }
    let inner = ((n - 2) * (n - 2)) as usize;

    for _ in 0..inner {
        // Border cells are always obstacles, so only the interior is sampled
        let cell = Cell::new(rng.gen_range(1..n - 1), rng.gen_range(1..n - 1));
        if !is_occupied(obstacles, food, cell) {
            return Some(cell);
        }
    }

    // Crowded grid: fall back to an exhaustive scan
    let free: Vec<Cell> = (1..n - 1)
        .flat_map(|y| (1..n - 1).map(move |x| Cell::new(x, y)))
        .filter(|&c| !is_occupied(obstacles, food, c))
        .collect();
    if free.is_empty() {
        None
    } else {
        Some(free[rng.gen_range(0..free.len())])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_cell_to_point_uses_integer_coordinates() {
        let cell = Cell::new(3, 7);
        assert_eq!(cell.to_point(), Point::new(3.0, 7.0));
        assert_eq!(Cell::containing(cell.to_point()), cell);
        assert_eq!(Cell::containing(Point::new(3.9, 7.9)), cell);
    }

    #[test]
    fn test_obstacle_map_border_and_interior() {
        let map = ObstacleMap::new(10, &[Cell::new(4, 4), Cell::new(20, 20)]);

        assert_eq!(map.interior().len(), 1, "out-of-grid cells are dropped");
        assert!(map.is_obstacle(Cell::new(4, 4)));
        assert!(map.is_obstacle(Cell::new(0, 5)));
        assert!(map.is_obstacle(Cell::new(9, 9)));
        assert!(!map.is_obstacle(Cell::new(5, 5)));
        assert!(!map.is_border(Cell::new(-1, 5)));
    }

    #[test]
    fn test_border_cells_near() {
        let map = ObstacleMap::new(20, &[]);

        let near_corner = map.border_cells_near(Point::new(1.5, 1.5), 2.0);
        assert!(near_corner.contains(&Cell::new(0, 0)));
        assert!(near_corner.contains(&Cell::new(3, 0)));
        assert!(near_corner.contains(&Cell::new(0, 3)));
        assert!(near_corner.iter().all(|&c| map.is_border(c)));

        let unique: HashSet<_> = near_corner.iter().collect();
        assert_eq!(unique.len(), near_corner.len(), "corner cells are not duplicated");

        assert!(map.border_cells_near(Point::new(10.0, 10.0), 3.0).is_empty());
    }

    #[test]
    fn test_food_field_tracks_lookup() {
        let mut food = FoodField::new();
        assert!(food.insert(Cell::new(3, 3)));
        assert!(!food.insert(Cell::new(3, 3)));
        assert!(food.insert(Cell::new(5, 1)));
        assert_eq!(food.len(), 2);

        assert!(food.remove(Cell::new(3, 3)));
        assert!(!food.contains(Cell::new(3, 3)));
        assert!(!food.remove(Cell::new(3, 3)));
        assert_eq!(food.len(), 1);
    }

    #[test]
    fn test_food_field_serde_rebuilds_lookup() {
        let food = FoodField::from(vec![Cell::new(1, 2), Cell::new(3, 4)]);
        let json = serde_json::to_string(&food).unwrap();
        let back: FoodField = serde_json::from_str(&json).unwrap();
        assert!(back.contains(Cell::new(3, 4)));
        assert_eq!(back.len(), 2);
    }

    #[test]
    fn test_food_nearest_within() {
        let food = FoodField::from(vec![Cell::new(5, 5), Cell::new(6, 5)]);
        assert_eq!(food.nearest_within(Point::new(5.8, 5.0), 0.5), Some(Cell::new(6, 5)));
        assert_eq!(food.nearest_within(Point::new(8.0, 8.0), 0.5), None);
    }

    #[test]
    fn test_spatial_index_neighbors() {
        let mut index = SpatialIndex::new();
        index.rebuild(vec![
            Point::new(10.2, 10.7),
            Point::new(11.9, 9.1),
            Point::new(12.5, 10.0),
            Point::new(30.0, 30.0),
        ]);

        let found: Vec<usize> = index.neighbors(Point::new(10.5, 10.5)).collect();
        assert!(found.contains(&0));
        assert!(found.contains(&1));
        assert!(!found.contains(&2), "two buckets away");
        assert!(!found.contains(&3));
    }

    #[test]
    fn test_spatial_query_radius() {
        let mut index = SpatialIndex::new();
        index.rebuild(vec![Point::new(10.0, 10.0), Point::new(14.0, 10.0), Point::new(30.0, 30.0)]);

        let results = index.query_radius(Point::new(10.0, 10.0), 5.0);
        assert!(results.contains(&0));
        assert!(results.contains(&1));
        assert!(!results.contains(&2));
    }

    #[test]
    fn test_random_free_cell_avoids_occupied() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let map = ObstacleMap::new(5, &[Cell::new(1, 1), Cell::new(2, 2)]);
        let food = FoodField::from(vec![Cell::new(3, 3), Cell::new(1, 2)]);

        for _ in 0..50 {
            let cell = random_free_cell(&mut rng, &map, &food).unwrap();
            assert!(!is_occupied(&map, &food, cell));
        }
    }

    #[test]
    fn test_random_free_cell_full_grid() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let map = ObstacleMap::new(3, &[Cell::new(1, 1)]);
        assert_eq!(random_free_cell(&mut rng, &map, &FoodField::new()), None);
    }
}
