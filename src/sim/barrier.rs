//! Ice barriers: static rectangular cover on the battlefield

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Axis-aligned footprint of a barrier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_x: f32,
    pub max_x: f32,
    pub min_z: f32,
    pub max_z: f32,
    pub height: f32,
}

impl Bounds {
    /// Grow the footprint by `margin` on every side
    pub fn expanded(&self, margin: f32) -> Self {
        Self {
            min_x: self.min_x - margin,
            max_x: self.max_x + margin,
            min_z: self.min_z - margin,
            max_z: self.max_z + margin,
            height: self.height,
        }
    }

    /// Inclusive containment test on the ground plane
    #[inline]
    pub fn contains(&self, x: f32, z: f32) -> bool {
        x >= self.min_x && x <= self.max_x && z >= self.min_z && z <= self.max_z
    }
}

/// A static, immutable obstacle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Barrier {
    pub id: u32,
    /// Footprint center on the ground plane
    pub position: Vec2,
    pub width: f32,
    pub height: f32,
    pub depth: f32,
}

impl Barrier {
    /// Barrier with the default 2 x 2 x 0.5 ice block dimensions
    pub fn new(id: u32, x: f32, z: f32) -> Self {
        Self::with_size(id, x, z, BARRIER_WIDTH, BARRIER_HEIGHT, BARRIER_DEPTH)
    }

    pub fn with_size(id: u32, x: f32, z: f32, width: f32, height: f32, depth: f32) -> Self {
        Self {
            id,
            position: Vec2::new(x, z),
            width,
            height,
            depth,
        }
    }

    /// Box center in world space (barriers stand on the ground)
    pub fn center(&self) -> Vec3 {
        Vec3::new(self.position.x, self.height / 2.0, self.position.y)
    }

    pub fn half_extents(&self) -> Vec3 {
        Vec3::new(self.width / 2.0, self.height / 2.0, self.depth / 2.0)
    }

    pub fn bounds(&self) -> Bounds {
        Bounds {
            min_x: self.position.x - self.width / 2.0,
            max_x: self.position.x + self.width / 2.0,
            min_z: self.position.y - self.depth / 2.0,
            max_z: self.position.y + self.depth / 2.0,
            height: self.height,
        }
    }

    pub fn contains_point(&self, x: f32, z: f32) -> bool {
        self.bounds().contains(x, z)
    }

    /// Coarse line-of-throw cover test.
    ///
    /// The barrier protects `target` from `shooter` when it lies in roughly the
    /// same direction as the shooter (cosine above 0.7) and strictly closer.
    /// This is intentionally not a raycast.
    pub fn provides_protection(&self, target: Vec2, shooter: Vec2) -> bool {
        let to_barrier = self.position - target;
        let to_shooter = shooter - target;

        let barrier_dist = to_barrier.length();
        let shooter_dist = to_shooter.length();
        if barrier_dist == 0.0 || shooter_dist == 0.0 {
            return false;
        }

        let dot = (to_barrier / barrier_dist).dot(to_shooter / shooter_dist);
        dot > PROTECTION_DOT && barrier_dist < shooter_dist
    }

    /// Lobbed projectiles clear the barrier when they fly higher than it plus one unit
    pub fn blocks_projectile(&self, target: Vec2, shooter: Vec2, projectile_height: f32) -> bool {
        if projectile_height > self.height + 1.0 {
            return false;
        }
        self.provides_protection(target, shooter)
    }

    /// Nearest point half a unit outside the footprint, aligned to one of its edges
    pub fn closest_safe_position(&self, x: f32, z: f32) -> Vec2 {
        let b = self.bounds();
        let candidates = [
            (Vec2::new(b.min_x - 0.5, z), (x - (b.min_x - 0.5)).abs()),
            (Vec2::new(b.max_x + 0.5, z), (x - (b.max_x + 0.5)).abs()),
            (Vec2::new(x, b.min_z - 0.5), (z - (b.min_z - 0.5)).abs()),
            (Vec2::new(x, b.max_z + 0.5), (z - (b.max_z + 0.5)).abs()),
        ];

        candidates
            .into_iter()
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(pos, _)| pos)
            .unwrap_or(self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds() {
        let barrier = Barrier::new(1, 4.0, -6.0);
        let b = barrier.bounds();
        assert_eq!((b.min_x, b.max_x), (3.0, 5.0));
        assert_eq!((b.min_z, b.max_z), (-6.25, -5.75));
        assert_eq!(b.height, 2.0);

        assert!(barrier.contains_point(4.0, -6.0));
        assert!(barrier.contains_point(5.0, -5.75));
        assert!(!barrier.contains_point(4.0, -5.0));
    }

    #[test]
    fn test_expanded_bounds() {
        let barrier = Barrier::with_size(1, 0.0, 0.0, 2.0, 2.0, 2.0);
        let expanded = barrier.bounds().expanded(CHARACTER_RADIUS);
        assert!((expanded.min_x + 1.6).abs() < 1e-6);
        assert!((expanded.max_z - 1.6).abs() < 1e-6);
        assert!(expanded.contains(1.5, 0.0));
        assert!(!expanded.contains(1.7, 0.0));
    }

    #[test]
    fn test_protection_barrier_between() {
        // Barrier exactly between target and shooter
        let barrier = Barrier::new(1, 0.0, 5.0);
        assert!(barrier.provides_protection(Vec2::ZERO, Vec2::new(0.0, 10.0)));
    }

    #[test]
    fn test_protection_off_axis() {
        // Barrier 90 degrees off the throw line
        let barrier = Barrier::new(1, 5.0, 0.0);
        assert!(!barrier.provides_protection(Vec2::ZERO, Vec2::new(0.0, 10.0)));
    }

    #[test]
    fn test_protection_barrier_behind_shooter() {
        // Same direction but farther than the shooter
        let barrier = Barrier::new(1, 0.0, 12.0);
        assert!(!barrier.provides_protection(Vec2::ZERO, Vec2::new(0.0, 10.0)));
    }

    #[test]
    fn test_protection_threshold() {
        let target = Vec2::ZERO;
        let shooter = Vec2::new(0.0, 10.0);
        // cos(40deg) ~ 0.766 passes, cos(50deg) ~ 0.643 fails
        let inside = Vec2::new(40f32.to_radians().sin(), 40f32.to_radians().cos()) * 3.0;
        let outside = Vec2::new(50f32.to_radians().sin(), 50f32.to_radians().cos()) * 3.0;
        assert!(Barrier::new(1, inside.x, inside.y).provides_protection(target, shooter));
        assert!(!Barrier::new(2, outside.x, outside.y).provides_protection(target, shooter));
    }

    #[test]
    fn test_protection_degenerate() {
        let barrier = Barrier::new(1, 0.0, 0.0);
        assert!(!barrier.provides_protection(Vec2::ZERO, Vec2::new(0.0, 10.0)));
        let barrier = Barrier::new(2, 0.0, 5.0);
        assert!(!barrier.provides_protection(Vec2::ZERO, Vec2::ZERO));
    }

    #[test]
    fn test_blocks_projectile_height() {
        let barrier = Barrier::new(1, 0.0, 5.0);
        let target = Vec2::ZERO;
        let shooter = Vec2::new(0.0, 10.0);
        assert!(barrier.blocks_projectile(target, shooter, 2.5));
        assert!(!barrier.blocks_projectile(target, shooter, 3.5));
    }

    #[test]
    fn test_closest_safe_position() {
        let barrier = Barrier::new(1, 0.0, 0.0);
        // Just inside the right edge -> pushed right
        let safe = barrier.closest_safe_position(0.9, 0.0);
        assert_eq!(safe, Vec2::new(1.5, 0.0));
        // Near the front face -> pushed along z
        let safe = barrier.closest_safe_position(0.0, -0.2);
        assert_eq!(safe, Vec2::new(0.0, -0.75));
    }
}
