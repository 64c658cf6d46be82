//! Building footprint configuration and validation.
//!
//! A [`ShapeConfig`] describes which wings of a building exist, how many
//! rooms run along each wing, how many floors are stacked, and which wing
//! holds the entrance. Every grid in [`crate::grid`] is a deterministic
//! function of this struct.
//!
//! # Wing presence
//!
//! | Shape | Present wings |
//! |-------|---------------|
//! | `single` | top |
//! | `l` | the two wings named by `orientation` |
//! | `u` | all except `open_side` |
//! | `square` | all four |
//!
//! ```
//! use hallplan_logic::shape::{validate_shape, ShapeConfig, ShapeKind, Side};
//!
//! let mut config = ShapeConfig::default();
//! config.shape_kind = ShapeKind::U;
//! config.open_side = Side::Bottom;
//! config.entrance_side = Some(Side::Bottom);
//! assert!(!validate_shape(&config).is_empty());
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the four cardinal wings of a footprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Side {
    Top,
    Bottom,
    Left,
    Right,
}

impl Side {
    /// All sides, in grid emission order.
    pub const ALL: [Side; 4] = [Side::Top, Side::Bottom, Side::Left, Side::Right];

    pub fn name(self) -> &'static str {
        match self {
            Side::Top => "top",
            Side::Bottom => "bottom",
            Side::Left => "left",
            Side::Right => "right",
        }
    }

    fn bit(self) -> u8 {
        match self {
            Side::Top => 0b0001,
            Side::Bottom => 0b0010,
            Side::Left => 0b0100,
            Side::Right => 0b1000,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Footprint grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Single,
    L,
    U,
    Square,
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ShapeKind::Single => "single",
            ShapeKind::L => "l",
            ShapeKind::U => "u",
            ShapeKind::Square => "square",
        })
    }
}

/// Corner an L-shaped building turns around. Ignored by other shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Orientation {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Orientation {
    /// The two wings an L with this orientation occupies.
    pub fn sides(self) -> [Side; 2] {
        match self {
            Orientation::TopLeft => [Side::Top, Side::Left],
            Orientation::TopRight => [Side::Top, Side::Right],
            Orientation::BottomLeft => [Side::Bottom, Side::Left],
            Orientation::BottomRight => [Side::Bottom, Side::Right],
        }
    }
}

/// A set of sides, stored as a bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SideSet(u8);

impl SideSet {
    pub fn empty() -> Self {
        Self(0)
    }

    pub fn all() -> Self {
        Side::ALL.iter().copied().collect()
    }

    pub fn insert(&mut self, side: Side) {
        self.0 |= side.bit();
    }

    pub fn remove(&mut self, side: Side) {
        self.0 &= !side.bit();
    }

    pub fn contains(self, side: Side) -> bool {
        self.0 & side.bit() != 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Members in [`Side::ALL`] order.
    pub fn iter(self) -> impl Iterator<Item = Side> {
        Side::ALL.into_iter().filter(move |s| self.contains(*s))
    }
}

impl FromIterator<Side> for SideSet {
    fn from_iter<I: IntoIterator<Item = Side>>(iter: I) -> Self {
        let mut set = SideSet::empty();
        for side in iter {
            set.insert(side);
        }
        set
    }
}

/// Declarative descriptor of a building footprint.
///
/// Serialized with camelCase keys, matching the persisted layout record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeConfig {
    pub shape_kind: ShapeKind,
    /// Number of stacked floors (must be positive).
    pub floors: u32,
    pub top_count: u32,
    pub bottom_count: u32,
    pub left_count: u32,
    pub right_count: u32,
    /// Only meaningful for [`ShapeKind::L`].
    pub orientation: Orientation,
    /// Only meaningful for [`ShapeKind::U`].
    pub open_side: Side,
    /// Wing holding the entrance. `None` means the author has not picked one,
    /// or the previous pick was cleared by a shape edit.
    pub entrance_side: Option<Side>,
}

impl Default for ShapeConfig {
    fn default() -> Self {
        Self {
            shape_kind: ShapeKind::Single,
            floors: 1,
            top_count: 4,
            bottom_count: 0,
            left_count: 0,
            right_count: 0,
            orientation: Orientation::TopLeft,
            open_side: Side::Bottom,
            entrance_side: Some(Side::Top),
        }
    }
}

/// The subset of [`ShapeConfig`] that determines grid geometry.
///
/// Floors and entrance are excluded: they never change a single floor's grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridKey {
    pub shape_kind: ShapeKind,
    pub top_count: u32,
    pub bottom_count: u32,
    pub left_count: u32,
    pub right_count: u32,
    pub orientation: Orientation,
    pub open_side: Side,
}

impl ShapeConfig {
    /// Wings that structurally exist for this shape.
    pub fn present_sides(&self) -> SideSet {
        match self.shape_kind {
            ShapeKind::Single => [Side::Top].into_iter().collect(),
            ShapeKind::Square => SideSet::all(),
            ShapeKind::L => self.orientation.sides().into_iter().collect(),
            ShapeKind::U => {
                let mut sides = SideSet::all();
                sides.remove(self.open_side);
                sides
            }
        }
    }

    /// Sides an author may pick as the entrance.
    pub fn valid_entrance_sides(&self) -> SideSet {
        self.present_sides()
    }

    /// Room count configured for a side, whether or not the side is present.
    pub fn count(&self, side: Side) -> u32 {
        match side {
            Side::Top => self.top_count,
            Side::Bottom => self.bottom_count,
            Side::Left => self.left_count,
            Side::Right => self.right_count,
        }
    }

    /// Room count for a side, or 0 if the side is absent from this shape.
    pub fn effective_count(&self, side: Side) -> u32 {
        if self.present_sides().contains(side) {
            self.count(side)
        } else {
            0
        }
    }

    /// Rooms on one floor across all present wings.
    pub fn rooms_per_floor(&self) -> u32 {
        Side::ALL.iter().map(|s| self.effective_count(*s)).sum()
    }

    /// Clear an entrance that no longer names a present side.
    ///
    /// Returns `true` if the entrance was cleared.
    pub fn normalize_entrance(&mut self) -> bool {
        match self.entrance_side {
            Some(side) if !self.valid_entrance_sides().contains(side) => {
                self.entrance_side = None;
                true
            }
            _ => false,
        }
    }

    pub fn grid_key(&self) -> GridKey {
        GridKey {
            shape_kind: self.shape_kind,
            top_count: self.top_count,
            bottom_count: self.bottom_count,
            left_count: self.left_count,
            right_count: self.right_count,
            orientation: self.orientation,
            open_side: self.open_side,
        }
    }
}

/// Shape validation error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShapeError {
    /// `floors` must be at least 1.
    NoFloors,
    /// Every present wing has zero rooms.
    NoRooms,
    /// No entrance selected.
    MissingEntrance,
    /// Entrance names a wing this shape doesn't have.
    EntranceNotPresent { entrance: Side, shape: ShapeKind },
}

impl fmt::Display for ShapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShapeError::NoFloors => write!(f, "building must have at least one floor"),
            ShapeError::NoRooms => write!(f, "no present wing has any rooms"),
            ShapeError::MissingEntrance => write!(f, "no entrance side selected"),
            ShapeError::EntranceNotPresent { entrance, shape } => {
                write!(f, "entrance side '{entrance}' does not exist on a '{shape}' shape")
            }
        }
    }
}

impl std::error::Error for ShapeError {}

/// Validate a shape configuration, returning all errors found.
pub fn validate_shape(config: &ShapeConfig) -> Vec<ShapeError> {
    let mut errors = Vec::new();

    if config.floors == 0 {
        errors.push(ShapeError::NoFloors);
    }
    if config.rooms_per_floor() == 0 {
        errors.push(ShapeError::NoRooms);
    }
    match config.entrance_side {
        None => errors.push(ShapeError::MissingEntrance),
        Some(entrance) if !config.valid_entrance_sides().contains(entrance) => {
            errors.push(ShapeError::EntranceNotPresent {
                entrance,
                shape: config.shape_kind,
            });
        }
        Some(_) => {}
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    fn u_open_bottom() -> ShapeConfig {
        ShapeConfig {
            shape_kind: ShapeKind::U,
            floors: 3,
            top_count: 3,
            bottom_count: 5,
            left_count: 2,
            right_count: 2,
            open_side: Side::Bottom,
            entrance_side: Some(Side::Top),
            ..ShapeConfig::default()
        }
    }

    #[test]
    fn default_config_is_valid() {
        let errors = validate_shape(&ShapeConfig::default());
        assert!(errors.is_empty(), "default config should be valid: {errors:?}");
    }

    #[test]
    fn single_has_only_top() {
        let sides = ShapeConfig::default().present_sides();
        assert_eq!(sides.iter().collect::<Vec<_>>(), vec![Side::Top]);
    }

    #[test]
    fn square_ignores_orientation_and_open_side() {
        for orientation in [
            Orientation::TopLeft,
            Orientation::TopRight,
            Orientation::BottomLeft,
            Orientation::BottomRight,
        ] {
            for open_side in Side::ALL {
                let config = ShapeConfig {
                    shape_kind: ShapeKind::Square,
                    orientation,
                    open_side,
                    ..ShapeConfig::default()
                };
                assert_eq!(config.present_sides(), SideSet::all());
            }
        }
    }

    #[test]
    fn l_follows_orientation() {
        let config = ShapeConfig {
            shape_kind: ShapeKind::L,
            orientation: Orientation::BottomRight,
            ..ShapeConfig::default()
        };
        let sides = config.present_sides();
        assert!(sides.contains(Side::Bottom));
        assert!(sides.contains(Side::Right));
        assert_eq!(sides.len(), 2);
    }

    #[test]
    fn u_drops_open_side() {
        let sides = u_open_bottom().present_sides();
        assert_eq!(sides.len(), 3);
        assert!(!sides.contains(Side::Bottom));
    }

    #[test]
    fn entrance_on_open_side_rejected() {
        let mut config = u_open_bottom();
        config.entrance_side = Some(Side::Bottom);
        let errors = validate_shape(&config);
        assert!(errors.contains(&ShapeError::EntranceNotPresent {
            entrance: Side::Bottom,
            shape: ShapeKind::U,
        }));
    }

    #[test]
    fn zero_floors_rejected() {
        let mut config = ShapeConfig::default();
        config.floors = 0;
        assert!(validate_shape(&config).contains(&ShapeError::NoFloors));
    }

    #[test]
    fn missing_entrance_rejected() {
        let mut config = ShapeConfig::default();
        config.entrance_side = None;
        assert!(validate_shape(&config).contains(&ShapeError::MissingEntrance));
    }

    #[test]
    fn counts_on_absent_sides_do_not_count_as_rooms() {
        let mut config = ShapeConfig::default();
        config.top_count = 0;
        config.left_count = 6;
        assert_eq!(config.rooms_per_floor(), 0);
        assert!(validate_shape(&config).contains(&ShapeError::NoRooms));
    }

    #[test]
    fn normalize_clears_invalid_entrance() {
        let mut config = u_open_bottom();
        config.entrance_side = Some(Side::Bottom);
        assert!(config.normalize_entrance());
        assert_eq!(config.entrance_side, None);
        // already valid: untouched
        config.entrance_side = Some(Side::Left);
        assert!(!config.normalize_entrance());
        assert_eq!(config.entrance_side, Some(Side::Left));
    }

    #[test]
    fn serde_uses_persisted_names() {
        let config = ShapeConfig {
            shape_kind: ShapeKind::L,
            orientation: Orientation::TopRight,
            ..ShapeConfig::default()
        };
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["shapeKind"], "l");
        assert_eq!(json["orientation"], "top-right");
        assert_eq!(json["entranceSide"], "top");
        assert_eq!(json["topCount"], 4);
        let back: ShapeConfig = serde_json::from_value(json).unwrap();
        assert_eq!(back, config);
    }
}
