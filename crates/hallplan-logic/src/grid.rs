//! Floor grid generation from a [`ShapeConfig`].
//!
//! Two variants are produced from the same configuration:
//!
//! - **Browsing** ([`browsing_grid`]): compact, room cells only. One row per
//!   present top/bottom wing, plus `max(left, right, 1)` middle rows whose
//!   first and last columns hold the left/right wings.
//! - **Authoring** ([`authoring_grid`]): `(max(top, bottom) + 2)` columns by
//!   `(max(left, right) + 2)` rows. Rooms run along the border with the four
//!   corners left [`GridCell::Void`], and each room's inward neighbour is a
//!   [`GridCell::Walkway`] tagged with the room's wing.
//!
//! ```text
//! u / open bottom, top=3 left=2 right=2     authoring, same config
//!
//!   T T T                                    # T T T #
//!   L . R                                    L = = = R
//!   L . R                                    L | . | R
//!                                            # . . . #
//! ```
//!
//! Both are pure functions of the configuration, so callers may regenerate
//! them on every render. [`GridCache`] memoizes them for hot paths.

use crate::shape::{GridKey, ShapeConfig, Side};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// One cell of a floor grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GridCell {
    /// A room slot belonging to the given wing.
    Room(Side),
    /// Authoring-only corridor cell; clicking it selects the entrance wing.
    Walkway(Side),
    /// Structural corner of the authoring grid.
    Void,
    /// Unused padding.
    Empty,
}

impl GridCell {
    pub fn is_room(self) -> bool {
        matches!(self, GridCell::Room(_))
    }

    pub fn side(self) -> Option<Side> {
        match self {
            GridCell::Room(side) | GridCell::Walkway(side) => Some(side),
            GridCell::Void | GridCell::Empty => None,
        }
    }

    fn glyph(self) -> char {
        match self {
            GridCell::Room(Side::Top) => 'T',
            GridCell::Room(Side::Bottom) => 'B',
            GridCell::Room(Side::Left) => 'L',
            GridCell::Room(Side::Right) => 'R',
            GridCell::Walkway(Side::Top | Side::Bottom) => '=',
            GridCell::Walkway(Side::Left | Side::Right) => '|',
            GridCell::Void => '#',
            GridCell::Empty => '.',
        }
    }
}

/// A rectangular grid for one floor. Row 0 is the top of the footprint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FloorGrid {
    cells: Vec<Vec<GridCell>>,
}

impl FloorGrid {
    fn filled(height: usize, width: usize) -> Self {
        Self {
            cells: vec![vec![GridCell::Empty; width]; height],
        }
    }

    pub fn rows(&self) -> &[Vec<GridCell>] {
        &self.cells
    }

    pub fn height(&self) -> usize {
        self.cells.len()
    }

    pub fn width(&self) -> usize {
        self.cells.first().map_or(0, Vec::len)
    }

    pub fn get(&self, row: u32, col: u32) -> Option<GridCell> {
        self.cells
            .get(row as usize)
            .and_then(|r| r.get(col as usize))
            .copied()
    }

    fn set(&mut self, row: usize, col: usize, cell: GridCell) {
        self.cells[row][col] = cell;
    }

    /// All cells with their coordinates, row-major.
    pub fn iter(&self) -> impl Iterator<Item = (u32, u32, GridCell)> + '_ {
        self.cells.iter().enumerate().flat_map(|(r, row)| {
            row.iter()
                .enumerate()
                .map(move |(c, cell)| (r as u32, c as u32, *cell))
        })
    }

    /// Room cells with their coordinates, row-major.
    pub fn room_cells(&self) -> impl Iterator<Item = (u32, u32, Side)> + '_ {
        self.iter().filter_map(|(r, c, cell)| match cell {
            GridCell::Room(side) => Some((r, c, side)),
            _ => None,
        })
    }

    pub fn count(&self, pred: impl Fn(GridCell) -> bool) -> usize {
        self.iter().filter(|(_, _, cell)| pred(*cell)).count()
    }
}

impl fmt::Display for FloorGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.cells {
            let line: Vec<String> = row.iter().map(|c| c.glyph().to_string()).collect();
            writeln!(f, "{}", line.join(" "))?;
        }
        Ok(())
    }
}

fn browsing_width(config: &ShapeConfig) -> usize {
    [
        1,
        config.top_count,
        config.bottom_count,
        config.left_count,
        config.right_count,
    ]
    .into_iter()
    .max()
    .unwrap_or(1) as usize
}

fn middle_height(config: &ShapeConfig) -> usize {
    config.left_count.max(config.right_count).max(1) as usize
}

/// Compact room-only grid for the browsing view.
pub fn browsing_grid(config: &ShapeConfig) -> FloorGrid {
    let sides = config.present_sides();
    let width = browsing_width(config);
    let height = middle_height(config);

    let wing_row = |side: Side, count: u32| -> Vec<GridCell> {
        (0..width)
            .map(|i| {
                if (i as u32) < count {
                    GridCell::Room(side)
                } else {
                    GridCell::Empty
                }
            })
            .collect()
    };

    let mut cells = Vec::with_capacity(height + 2);
    if sides.contains(Side::Top) {
        cells.push(wing_row(Side::Top, config.top_count));
    }
    for r in 0..height as u32 {
        let mut row = vec![GridCell::Empty; width];
        if sides.contains(Side::Right) && r < config.right_count {
            row[width - 1] = GridCell::Room(Side::Right);
        }
        // on a one-column grid the left wing takes the shared cell
        if sides.contains(Side::Left) && r < config.left_count {
            row[0] = GridCell::Room(Side::Left);
        }
        cells.push(row);
    }
    if sides.contains(Side::Bottom) {
        cells.push(wing_row(Side::Bottom, config.bottom_count));
    }

    FloorGrid { cells }
}

/// Editing grid with void corners and a walkway ring inside the wings.
pub fn authoring_grid(config: &ShapeConfig) -> FloorGrid {
    let sides = config.present_sides();
    let width = config.top_count.max(config.bottom_count) as usize + 2;
    let height = config.left_count.max(config.right_count) as usize + 2;
    let mut grid = FloorGrid::filled(height, width);

    for (r, c) in [
        (0, 0),
        (0, width - 1),
        (height - 1, 0),
        (height - 1, width - 1),
    ] {
        grid.set(r, c, GridCell::Void);
    }

    // rooms first so walkways never overwrite a slot
    let mut rooms: Vec<(Side, usize, usize)> = Vec::new();
    for side in sides.iter() {
        for i in 1..=config.count(side) as usize {
            let (r, c) = match side {
                Side::Top => (0, i),
                Side::Bottom => (height - 1, i),
                Side::Left => (i, 0),
                Side::Right => (i, width - 1),
            };
            grid.set(r, c, GridCell::Room(side));
            rooms.push((side, r, c));
        }
    }

    for (side, r, c) in rooms {
        let (wr, wc) = match side {
            Side::Top => (r + 1, c),
            Side::Bottom => (r - 1, c),
            Side::Left => (r, c + 1),
            Side::Right => (r, c - 1),
        };
        if grid.cells[wr][wc] == GridCell::Empty {
            grid.set(wr, wc, GridCell::Walkway(side));
        }
    }

    grid
}

/// Map an authoring room slot to the browsing cell at the same position
/// along the same wing.
///
/// Returns `None` if `(row, col)` is not a room cell of the authoring grid.
pub fn authoring_to_browsing(config: &ShapeConfig, row: u32, col: u32) -> Option<(u32, u32)> {
    let side = match authoring_grid(config).get(row, col)? {
        GridCell::Room(side) => side,
        _ => return None,
    };
    let top_offset = u32::from(config.present_sides().contains(Side::Top));
    let width = browsing_width(config) as u32;
    let height = middle_height(config) as u32;

    Some(match side {
        Side::Top => (0, col - 1),
        Side::Bottom => (top_offset + height, col - 1),
        Side::Left => (top_offset + row - 1, 0),
        Side::Right => (top_offset + row - 1, width - 1),
    })
}

/// Bounded memo of generated grids keyed on the geometry-relevant config.
pub struct GridCache {
    browsing: HashMap<GridKey, Arc<FloorGrid>>,
    authoring: HashMap<GridKey, Arc<FloorGrid>>,
    capacity: usize,
    hits: u64,
    misses: u64,
}

impl Default for GridCache {
    fn default() -> Self {
        Self::with_capacity(32)
    }
}

impl GridCache {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            browsing: HashMap::new(),
            authoring: HashMap::new(),
            capacity: capacity.max(1),
            hits: 0,
            misses: 0,
        }
    }

    pub fn browsing(&mut self, config: &ShapeConfig) -> Arc<FloorGrid> {
        let capacity = self.capacity;
        Self::lookup(
            &mut self.browsing,
            capacity,
            &mut self.hits,
            &mut self.misses,
            config,
            browsing_grid,
        )
    }

    pub fn authoring(&mut self, config: &ShapeConfig) -> Arc<FloorGrid> {
        let capacity = self.capacity;
        Self::lookup(
            &mut self.authoring,
            capacity,
            &mut self.hits,
            &mut self.misses,
            config,
            authoring_grid,
        )
    }

    /// (hits, misses) since creation.
    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }

    fn lookup(
        map: &mut HashMap<GridKey, Arc<FloorGrid>>,
        capacity: usize,
        hits: &mut u64,
        misses: &mut u64,
        config: &ShapeConfig,
        generate: fn(&ShapeConfig) -> FloorGrid,
    ) -> Arc<FloorGrid> {
        let key = config.grid_key();
        if let Some(grid) = map.get(&key) {
            *hits += 1;
            return Arc::clone(grid);
        }
        *misses += 1;
        if map.len() >= capacity {
            // Evict an arbitrary entry (HashMap iteration order)
            if let Some(&evict) = map.keys().next() {
                map.remove(&evict);
            }
        }
        let grid = Arc::new(generate(config));
        map.insert(key, Arc::clone(&grid));
        grid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::{Orientation, ShapeKind};

    fn config(kind: ShapeKind, top: u32, bottom: u32, left: u32, right: u32) -> ShapeConfig {
        ShapeConfig {
            shape_kind: kind,
            floors: 2,
            top_count: top,
            bottom_count: bottom,
            left_count: left,
            right_count: right,
            orientation: Orientation::TopLeft,
            open_side: Side::Bottom,
            entrance_side: Some(Side::Top),
        }
    }

    #[test]
    fn browsing_u_open_bottom() {
        let grid = browsing_grid(&config(ShapeKind::U, 3, 5, 2, 2));
        let top_row = &grid.rows()[0];
        assert_eq!(
            top_row.iter().filter(|c| **c == GridCell::Room(Side::Top)).count(),
            3
        );
        assert_eq!(grid.count(|c| c == GridCell::Room(Side::Bottom)), 0);

        let width = grid.width();
        assert_eq!(width, 5);
        // top row + 2 middle rows, no bottom row
        assert_eq!(grid.height(), 3);
        for r in 1..=2u32 {
            assert_eq!(grid.get(r, 0), Some(GridCell::Room(Side::Left)));
            assert_eq!(grid.get(r, width as u32 - 1), Some(GridCell::Room(Side::Right)));
        }
        assert_eq!(grid.count(|c| c == GridCell::Room(Side::Left)), 2);
        assert_eq!(grid.count(|c| c == GridCell::Room(Side::Right)), 2);
    }

    #[test]
    fn browsing_single_is_one_wing() {
        let grid = browsing_grid(&config(ShapeKind::Single, 4, 2, 3, 3));
        assert_eq!(grid.count(GridCell::is_room), 4);
        // middle rows are still emitted, just empty
        assert_eq!(grid.height(), 1 + 3);
    }

    #[test]
    fn browsing_square_has_all_wings_regardless_of_selectors() {
        let mut cfg = config(ShapeKind::Square, 2, 2, 2, 2);
        for open_side in Side::ALL {
            cfg.open_side = open_side;
            cfg.orientation = Orientation::BottomRight;
            let grid = browsing_grid(&cfg);
            for side in Side::ALL {
                assert_eq!(grid.count(|c| c == GridCell::Room(side)), 2, "{side}");
            }
        }
    }

    #[test]
    fn browsing_minimum_width_is_one() {
        let grid = browsing_grid(&config(ShapeKind::Square, 0, 0, 0, 0));
        assert_eq!(grid.width(), 1);
        assert_eq!(grid.height(), 3);
        assert_eq!(grid.count(GridCell::is_room), 0);
    }

    #[test]
    fn browsing_is_deterministic() {
        let cfg = config(ShapeKind::L, 5, 1, 4, 2);
        assert_eq!(browsing_grid(&cfg), browsing_grid(&cfg));
        assert_eq!(browsing_grid(&cfg).to_string(), browsing_grid(&cfg).to_string());
    }

    #[test]
    fn authoring_has_four_voids() {
        for kind in [ShapeKind::Single, ShapeKind::L, ShapeKind::U, ShapeKind::Square] {
            for (t, b, l, r) in [(0, 0, 0, 0), (1, 0, 0, 0), (3, 5, 2, 7), (6, 6, 6, 6)] {
                let grid = authoring_grid(&config(kind, t, b, l, r));
                assert_eq!(grid.count(|c| c == GridCell::Void), 4, "{kind} {t}/{b}/{l}/{r}");
                let (h, w) = (grid.height() as u32, grid.width() as u32);
                for (r, c) in [(0, 0), (0, w - 1), (h - 1, 0), (h - 1, w - 1)] {
                    assert_eq!(grid.get(r, c), Some(GridCell::Void));
                }
            }
        }
    }

    #[test]
    fn authoring_dimensions() {
        let grid = authoring_grid(&config(ShapeKind::U, 3, 5, 2, 4));
        assert_eq!(grid.width(), 5 + 2);
        assert_eq!(grid.height(), 4 + 2);
    }

    #[test]
    fn authoring_rooms_have_inward_walkways() {
        let grid = authoring_grid(&config(ShapeKind::Square, 3, 3, 3, 3));
        assert_eq!(grid.count(GridCell::is_room), 12);
        // top room at (0, 2) → walkway below it
        assert_eq!(grid.get(0, 2), Some(GridCell::Room(Side::Top)));
        assert_eq!(grid.get(1, 2), Some(GridCell::Walkway(Side::Top)));
        // bottom room at (4, 2) → walkway above it
        assert_eq!(grid.get(3, 2), Some(GridCell::Walkway(Side::Bottom)));
        // left room at (2, 0) → walkway to its right
        assert_eq!(grid.get(2, 1), Some(GridCell::Walkway(Side::Left)));
        assert_eq!(grid.get(2, 3), Some(GridCell::Walkway(Side::Right)));
        // shared ring corner goes to the top wing
        assert_eq!(grid.get(1, 1), Some(GridCell::Walkway(Side::Top)));
        assert_eq!(grid.get(2, 2), Some(GridCell::Empty));
    }

    #[test]
    fn authoring_absent_wings_have_no_cells() {
        let grid = authoring_grid(&config(ShapeKind::U, 3, 5, 2, 2));
        assert_eq!(grid.count(|c| c == GridCell::Room(Side::Bottom)), 0);
        assert_eq!(grid.count(|c| c == GridCell::Walkway(Side::Bottom)), 0);
    }

    #[test]
    fn authoring_walkway_never_replaces_room() {
        // two rows tall: top walkways would land on the bottom wing
        let mut cfg = config(ShapeKind::U, 3, 3, 0, 0);
        cfg.open_side = Side::Left;
        let grid = authoring_grid(&cfg);
        assert_eq!(grid.height(), 2);
        assert_eq!(grid.count(|c| c == GridCell::Room(Side::Top)), 3);
        assert_eq!(grid.count(|c| c == GridCell::Room(Side::Bottom)), 3);
        assert_eq!(grid.count(|c| matches!(c, GridCell::Walkway(_))), 0);
    }

    #[test]
    fn authoring_maps_onto_browsing_rooms() {
        for kind in [ShapeKind::Single, ShapeKind::L, ShapeKind::U, ShapeKind::Square] {
            let cfg = config(kind, 4, 3, 2, 5);
            let authoring = authoring_grid(&cfg);
            let browsing = browsing_grid(&cfg);
            let mut seen = std::collections::HashSet::new();
            for (r, c, side) in authoring.room_cells() {
                let (br, bc) = authoring_to_browsing(&cfg, r, c).unwrap();
                assert_eq!(browsing.get(br, bc), Some(GridCell::Room(side)), "{kind} ({r},{c})");
                assert!(seen.insert((br, bc)));
            }
            assert_eq!(seen.len(), browsing.count(GridCell::is_room));
        }
    }

    #[test]
    fn authoring_to_browsing_rejects_non_rooms() {
        let cfg = config(ShapeKind::Square, 2, 2, 2, 2);
        assert_eq!(authoring_to_browsing(&cfg, 0, 0), None); // void
        assert_eq!(authoring_to_browsing(&cfg, 1, 1), None); // walkway
        assert_eq!(authoring_to_browsing(&cfg, 40, 40), None);
    }

    #[test]
    fn cache_hits_on_same_geometry() {
        let mut cache = GridCache::with_capacity(2);
        let mut cfg = config(ShapeKind::U, 3, 5, 2, 2);
        let a = cache.browsing(&cfg);
        // floors/entrance don't affect geometry
        cfg.floors = 9;
        cfg.entrance_side = Some(Side::Left);
        let b = cache.browsing(&cfg);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.stats(), (1, 1));

        cfg.top_count = 4;
        let c = cache.browsing(&cfg);
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(*c, browsing_grid(&cfg));
    }

    #[test]
    fn cache_respects_capacity() {
        let mut cache = GridCache::with_capacity(1);
        let a = config(ShapeKind::Single, 1, 0, 0, 0);
        let b = config(ShapeKind::Single, 2, 0, 0, 0);
        cache.authoring(&a);
        cache.authoring(&b);
        cache.authoring(&a);
        assert_eq!(cache.stats(), (0, 3));
    }
}
