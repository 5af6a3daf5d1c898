//! Playfield geometry shared by physics, generation, collision and rendering

/// Logical surface width
pub const WIDTH: f32 = 400.0;
/// Logical surface height
pub const HEIGHT: f32 = 600.0;
/// Height of the lethal ground strip
pub const GROUND_HEIGHT: f32 = 50.0;
/// Actor bounding box edge length
pub const ACTOR_SIZE: f32 = 65.0;
/// Horizontal stagger between actor slots
pub const SLOT_STAGGER: f32 = 20.0;

/// Playfield dimensions, all in world units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Playfield {
    pub width: f32,
    pub height: f32,
    pub ground_height: f32,
    pub actor_size: f32,
}

impl Default for Playfield {
    fn default() -> Self {
        Self {
            width: WIDTH,
            height: HEIGHT,
            ground_height: GROUND_HEIGHT,
            actor_size: ACTOR_SIZE,
        }
    }
}

impl Playfield {
    /// Y of the ground surface
    pub fn ground_y(&self) -> f32 {
        self.height - self.ground_height
    }

    pub fn actor_half(&self) -> f32 {
        self.actor_size / 2.0
    }

    /// Highest allowed actor center (top edge touching y = 0)
    pub fn ceiling_limit(&self) -> f32 {
        self.actor_half()
    }

    /// Lowest actor center before the box touches the ground
    pub fn floor_limit(&self) -> f32 {
        self.ground_y() - self.actor_half()
    }

    /// Vertical spawn position for every actor
    pub fn spawn_y(&self) -> f32 {
        self.height / 2.0
    }

    /// Horizontal position of an actor slot. Slot 0 leads.
    pub fn slot_x(&self, slot: usize) -> f32 {
        self.width / 4.0 - slot as f32 * SLOT_STAGGER
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_limits() {
        let field = Playfield::default();
        assert_eq!(field.ground_y(), 550.0);
        assert_eq!(field.floor_limit(), 517.5);
        assert_eq!(field.ceiling_limit(), 32.5);
        assert_eq!(field.spawn_y(), 300.0);
    }

    #[test]
    fn slot_zero_leads() {
        let field = Playfield::default();
        assert!(field.slot_x(0) > field.slot_x(1));
        assert_eq!(field.slot_x(0), 100.0);
    }
}
