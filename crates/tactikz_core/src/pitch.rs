//! Pitch geometry constants and axis helpers
//!
//! All engine coordinates are in meters on a FIFA-standard 105x68 field:
//! - X: 0 = left goal line, 105 = right goal line (length direction)
//! - Y: 0 = near touchline, 68 = far touchline (width direction)
//!
//! The loader is responsible for normalizing provider coordinates (centered
//! origins, centimeter units) into this frame before handing data to the
//! engine.

/// Field dimensions (meters).
pub mod field {
    /// Goal line to goal line.
    pub const LENGTH_M: f32 = 105.0;

    /// Touchline to touchline.
    pub const WIDTH_M: f32 = 68.0;

    /// Midfield point, length direction.
    pub const HALFWAY_X: f32 = LENGTH_M / 2.0;

    /// Midfield point, width direction.
    pub const CENTER_Y: f32 = WIDTH_M / 2.0;
}

/// Marked zones (meters), used by camera presets.
pub mod zones {
    pub const GOAL_WIDTH: f32 = 7.32;
    pub const PENALTY_AREA_LENGTH: f32 = 16.5;
    pub const PENALTY_AREA_WIDTH: f32 = 40.3;
    pub const GOAL_AREA_LENGTH: f32 = 5.5;
    pub const GOAL_AREA_WIDTH: f32 = 18.32;
    pub const CENTER_CIRCLE_RADIUS: f32 = 9.15;
    pub const PENALTY_SPOT_DIST: f32 = 11.0;
}

/// Which goal line a team attacks toward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackingSide {
    /// Attacking toward x = 0.
    Left,
    /// Attacking toward x = 105.
    Right,
}

impl AttackingSide {
    pub fn flipped(self) -> AttackingSide {
        match self {
            AttackingSide::Left => AttackingSide::Right,
            AttackingSide::Right => AttackingSide::Left,
        }
    }

    /// X coordinate of the goal line this side attacks toward.
    pub fn target_goal_x(self) -> f32 {
        match self {
            AttackingSide::Left => 0.0,
            AttackingSide::Right => field::LENGTH_M,
        }
    }

    /// X coordinate of the defended goal line.
    pub fn own_goal_x(self) -> f32 {
        self.flipped().target_goal_x()
    }
}

/// Clamp a point to the field bounds.
pub fn clamp_to_field(x: f32, y: f32) -> (f32, f32) {
    (x.clamp(0.0, field::LENGTH_M), y.clamp(0.0, field::WIDTH_M))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_goal_lines() {
        assert_eq!(AttackingSide::Right.target_goal_x(), field::LENGTH_M);
        assert_eq!(AttackingSide::Right.own_goal_x(), 0.0);
        assert_eq!(AttackingSide::Left.own_goal_x(), field::LENGTH_M);
        assert_eq!(AttackingSide::Left.flipped(), AttackingSide::Right);
    }

    #[test]
    fn test_clamp_to_field() {
        assert_eq!(clamp_to_field(-3.0, 70.0), (0.0, field::WIDTH_M));
        assert_eq!(clamp_to_field(52.5, 34.0), (52.5, 34.0));
    }
}
