//! Obstacle generation and scrolling

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::util::time::frames_to_secs;

use super::field::Playfield;

/// Obstacle tuning constants
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObstacleStats {
    /// Horizontal thickness of each barrier
    pub width: f32,
    /// Vertical size of the passable gap
    pub gap_height: f32,
    /// Minimum distance between the gap and the ceiling or ground
    pub gap_margin: f32,
    /// Seconds between emissions
    pub spawn_interval: f32,
    /// Scroll speed at t = 0, units per frame
    pub base_speed: f32,
    /// Speed gained per elapsed second
    pub speed_ramp: f32,
}

impl Default for ObstacleStats {
    fn default() -> Self {
        Self {
            width: 60.0,
            gap_height: 160.0,
            gap_margin: 80.0,
            spawn_interval: 1.2,
            base_speed: 3.0,
            speed_ramp: 0.05,
        }
    }
}

impl ObstacleStats {
    /// Scroll speed after `elapsed_secs` of play. Non-decreasing in time.
    pub fn speed_at(&self, elapsed_secs: f32) -> f32 {
        self.base_speed + self.speed_ramp * elapsed_secs.max(0.0)
    }

    /// Lowest allowed gap top
    pub fn min_gap(&self) -> f32 {
        self.gap_margin
    }

    /// Highest allowed gap top
    pub fn max_gap(&self, field: &Playfield) -> f32 {
        field.ground_y() - self.gap_height - self.gap_margin
    }

    /// Whether the gap and both margins fit between the ceiling and the ground
    pub fn fits(&self, field: &Playfield) -> bool {
        self.max_gap(field) >= self.min_gap()
    }
}

/// A top/bottom barrier pair with a gap
#[derive(Debug, Clone, PartialEq)]
pub struct Obstacle {
    /// Left edge
    pub x: f32,
    pub gap_top: f32,
    pub gap_height: f32,
    /// Set once the obstacle has contributed to the score
    pub scored: bool,
}

impl Obstacle {
    pub fn new(x: f32, gap_top: f32, gap_height: f32) -> Self {
        Self {
            x,
            gap_top,
            gap_height,
            scored: false,
        }
    }

    pub fn gap_bottom(&self) -> f32 {
        self.gap_top + self.gap_height
    }

    pub fn center_x(&self, width: f32) -> f32 {
        self.x + width / 2.0
    }
}

/// Emits obstacles on a fixed interval and scrolls the active set
pub struct ObstacleGenerator {
    stats: ObstacleStats,
    rng: ChaCha8Rng,
    /// Frames since the last emission (or since the match started)
    since_spawn: f32,
}

impl ObstacleGenerator {
    pub fn new(stats: ObstacleStats, rng: ChaCha8Rng) -> Self {
        Self {
            stats,
            rng,
            since_spawn: 0.0,
        }
    }

    pub fn stats(&self) -> &ObstacleStats {
        &self.stats
    }

    /// Restart the emission timer (new match)
    pub fn reset(&mut self) {
        self.since_spawn = 0.0;
    }

    /// Draw a gap top uniformly from the integer range [min_gap, max_gap]
    pub fn roll_gap(&mut self, field: &Playfield) -> f32 {
        debug_assert!(self.stats.fits(field), "gap does not fit the playfield");
        let min = self.stats.min_gap().ceil() as i32;
        let max = (self.stats.max_gap(field).floor() as i32).max(min);
        self.rng.gen_range(min..=max) as f32
    }

    /// Scroll, prune and maybe emit. Returns true when a new obstacle spawned.
    pub fn advance(
        &mut self,
        obstacles: &mut Vec<Obstacle>,
        field: &Playfield,
        speed: f32,
        dt_frames: f32,
    ) -> bool {
        let travel = speed * dt_frames;
        for obstacle in obstacles.iter_mut() {
            obstacle.x -= travel;
        }

        let width = self.stats.width;
        obstacles.retain(|o| o.x + width > 0.0);

        self.since_spawn += dt_frames;
        if frames_to_secs(self.since_spawn) > self.stats.spawn_interval {
            let gap_top = self.roll_gap(field);
            obstacles.push(Obstacle::new(field.width, gap_top, self.stats.gap_height));
            self.since_spawn = 0.0;
            return true;
        }

        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn generator(seed: u64) -> ObstacleGenerator {
        ObstacleGenerator::new(ObstacleStats::default(), ChaCha8Rng::seed_from_u64(seed))
    }

    #[test]
    fn speed_never_decreases() {
        let stats = ObstacleStats::default();
        let mut previous = stats.speed_at(0.0);
        for step in 1..2_000 {
            let t = step as f32 * 0.37;
            let speed = stats.speed_at(t);
            assert!(speed >= previous, "speed dropped at t={}", t);
            previous = speed;
        }
    }

    #[test]
    fn gaps_stay_clear_of_ground_and_ceiling() {
        let field = Playfield::default();
        for seed in 0..8 {
            let mut gen = generator(seed);
            let stats = *gen.stats();
            for _ in 0..500 {
                let gap_top = gen.roll_gap(&field);
                assert!(gap_top >= stats.min_gap());
                assert!(gap_top + stats.gap_height <= field.height - field.ground_height);
                assert!(gap_top <= stats.max_gap(&field));
            }
        }
    }

    #[test]
    fn default_gap_range_matches_playfield() {
        let field = Playfield::default();
        let stats = ObstacleStats::default();
        assert_eq!(stats.min_gap(), 80.0);
        assert_eq!(stats.max_gap(&field), 310.0);
    }

    #[test]
    fn oversized_gap_does_not_fit() {
        let field = Playfield::default();
        let stats = ObstacleStats {
            gap_height: 400.0,
            ..ObstacleStats::default()
        };
        assert!(!stats.fits(&field));
        assert!(ObstacleStats::default().fits(&field));
        // Exactly filling the space between the margins still fits
        let tight = ObstacleStats {
            gap_height: field.ground_y() - 160.0,
            ..ObstacleStats::default()
        };
        assert!(tight.fits(&field));
        assert_eq!(tight.max_gap(&field), tight.min_gap());
    }

    #[test]
    fn emits_after_interval_at_right_edge() {
        let field = Playfield::default();
        let mut gen = generator(7);
        let mut obstacles = Vec::new();

        let mut spawned_at = None;
        for tick in 1..=200 {
            if gen.advance(&mut obstacles, &field, 3.0, 1.0) {
                spawned_at = Some(tick);
                break;
            }
        }

        // 1.2 s at 60 frames per second, strictly exceeded
        assert_eq!(spawned_at, Some(73));
        assert_eq!(obstacles.len(), 1);
        assert_eq!(obstacles[0].x, field.width);
        assert!(!obstacles[0].scored);
    }

    #[test]
    fn scrolled_out_obstacles_are_pruned() {
        let field = Playfield::default();
        let mut gen = generator(1);
        let mut obstacles = vec![Obstacle::new(-59.0, 100.0, 160.0), Obstacle::new(200.0, 100.0, 160.0)];
        gen.advance(&mut obstacles, &field, 3.0, 1.0);
        assert_eq!(obstacles.len(), 1);
        assert_eq!(obstacles[0].x, 197.0);
    }

    #[test]
    fn active_set_stays_bounded() {
        let field = Playfield::default();
        let stats = ObstacleStats::default();
        let mut gen = generator(3);
        let mut obstacles = Vec::new();
        let speed = stats.speed_at(0.0);
        for _ in 0..10_000 {
            gen.advance(&mut obstacles, &field, speed, 1.0);
        }
        let travel_per_interval = speed * stats.spawn_interval * 60.0;
        let bound = ((field.width + stats.width) / travel_per_interval).ceil() as usize + 1;
        assert!(obstacles.len() <= bound, "{} > {}", obstacles.len(), bound);
    }
}
