//! Collision layer filtering
//!
//! Each collider sits on one or more layers and carries a mask of the layers it
//! wants to hit. A pair is only considered when each side's layer is in the
//! other side's mask.

use bitflags::bitflags;

bitflags! {
    /// Collision layer bits
    ///
    /// Bits 0-7 have conventional names, the rest are free for game use.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CollisionLayers: u32 {
        /// Player controlled bodies
        const PLAYER = 1 << 0;
        /// Enemy bodies
        const ENEMY = 1 << 1;
        /// Projectiles (bullets, missiles, etc.)
        const PROJECTILE = 1 << 2;
        /// Static level geometry
        const ENVIRONMENT = 1 << 3;
        /// Trigger areas
        const TRIGGER = 1 << 4;
        /// Debris and other small bodies
        const DEBRIS = 1 << 5;
        /// Vehicles
        const VEHICLE = 1 << 6;
        /// Pickups and collectibles
        const PICKUP = 1 << 7;

        // Custom layers 8-31
        const _ = !0;
    }
}

impl CollisionLayers {
    /// Layer bit `index` (0-31), or empty if out of range
    pub fn custom(index: u32) -> Self {
        1u32.checked_shl(index).map_or(Self::empty(), Self::from_bits_retain)
    }

    /// Check if two colliders should collide based on their layers and masks
    ///
    /// # Example
    /// ```
    /// use collision2d::physics::CollisionLayers;
    ///
    /// let player = (CollisionLayers::PLAYER, CollisionLayers::ENEMY | CollisionLayers::ENVIRONMENT);
    /// let enemy = (CollisionLayers::ENEMY, CollisionLayers::PLAYER | CollisionLayers::PROJECTILE);
    ///
    /// assert!(CollisionLayers::should_collide(player.0, player.1, enemy.0, enemy.1));
    /// ```
    pub fn should_collide(
        layer_a: CollisionLayers,
        mask_a: CollisionLayers,
        layer_b: CollisionLayers,
        mask_b: CollisionLayers,
    ) -> bool {
        layer_a.intersects(mask_b) && layer_b.intersects(mask_a)
    }
}

impl Default for CollisionLayers {
    fn default() -> Self {
        Self::all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_collide_mutual() {
        assert!(CollisionLayers::should_collide(
            CollisionLayers::PLAYER,
            CollisionLayers::ENEMY,
            CollisionLayers::ENEMY,
            CollisionLayers::PLAYER,
        ));
    }

    #[test]
    fn test_should_not_collide_one_way() {
        // Player wants enemies, enemy only wants projectiles
        assert!(!CollisionLayers::should_collide(
            CollisionLayers::PLAYER,
            CollisionLayers::ENEMY,
            CollisionLayers::ENEMY,
            CollisionLayers::PROJECTILE,
        ));
    }

    #[test]
    fn test_default_collides_with_everything() {
        let default = CollisionLayers::default();
        assert!(CollisionLayers::should_collide(
            default,
            default,
            CollisionLayers::DEBRIS,
            CollisionLayers::DEBRIS,
        ));
    }

    #[test]
    fn test_custom_layers() {
        assert_eq!(CollisionLayers::custom(3), CollisionLayers::ENVIRONMENT);
        assert_eq!(CollisionLayers::custom(31).bits(), 1 << 31);
        assert!(CollisionLayers::custom(32).is_empty());
    }
}
