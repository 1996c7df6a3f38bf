//! Static table geometry
//!
//! The playfield is an axis-aligned rectangle with cushions of equal
//! thickness on every side and circular capture zones at the pockets.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Constant playfield description for a match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableGeometry {
    /// Outer playfield size
    pub size: Vec2,
    /// Cushion thickness measured inward from each edge
    pub cushion_width: f32,
    /// Diameter shared by every ball
    pub ball_diameter: f32,
    /// Pocket centers
    pub pockets: Vec<Vec2>,
    /// Capture radius around each pocket center
    pub pocket_radius: f32,
    /// Normalization constant for collision feedback (not used by physics)
    pub max_expected_collision_force: f32,
}

impl Default for TableGeometry {
    fn default() -> Self {
        Self {
            size: Vec2::new(TABLE_WIDTH, TABLE_HEIGHT),
            cushion_width: CUSHION_WIDTH,
            ball_diameter: BALL_DIAMETER,
            pockets: vec![
                Vec2::new(62.0, 62.0),
                Vec2::new(750.0, 40.0),
                Vec2::new(1435.0, 62.0),
                Vec2::new(62.0, 762.0),
                Vec2::new(750.0, 785.0),
                Vec2::new(1435.0, 762.0),
            ],
            pocket_radius: POCKET_RADIUS,
            max_expected_collision_force: MAX_EXPECTED_COLLISION_FORCE,
        }
    }
}

impl TableGeometry {
    #[inline]
    pub fn ball_radius(&self) -> f32 {
        self.ball_diameter / 2.0
    }

    /// Inner cushion line for the top and left borders
    #[inline]
    pub fn min_inner(&self) -> Vec2 {
        Vec2::splat(self.cushion_width)
    }

    /// Inner cushion line for the bottom and right borders
    #[inline]
    pub fn max_inner(&self) -> Vec2 {
        self.size - Vec2::splat(self.cushion_width)
    }

    pub fn crosses_top(&self, pos: Vec2) -> bool {
        pos.y - self.ball_radius() <= self.cushion_width
    }

    pub fn crosses_left(&self, pos: Vec2) -> bool {
        pos.x - self.ball_radius() <= self.cushion_width
    }

    pub fn crosses_right(&self, pos: Vec2) -> bool {
        pos.x + self.ball_radius() >= self.size.x - self.cushion_width
    }

    pub fn crosses_bottom(&self, pos: Vec2) -> bool {
        pos.y + self.ball_radius() >= self.size.y - self.cushion_width
    }

    /// True if a ball centered at `pos` touches none of the four cushions
    pub fn is_within_cushions(&self, pos: Vec2) -> bool {
        !(self.crosses_top(pos)
            || self.crosses_left(pos)
            || self.crosses_right(pos)
            || self.crosses_bottom(pos))
    }

    /// True if `pos` lies within the capture radius of any pocket
    pub fn is_inside_pocket(&self, pos: Vec2) -> bool {
        self.pockets
            .iter()
            .any(|pocket| pos.distance(*pocket) <= self.pocket_radius)
    }

    /// Playable area for a ball center: inside the cushions and clear of pockets
    pub fn is_inside_table(&self, pos: Vec2) -> bool {
        !self.is_inside_pocket(pos) && self.is_within_cushions(pos)
    }
}
