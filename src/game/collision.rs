//! Collision detection and pass-through scoring

use super::field::Playfield;
use super::obstacles::Obstacle;
use super::physics::Actor;

/// Collision and scoring rules
pub struct CollisionSystem;

impl CollisionSystem {
    /// Does the actor's box overlap the obstacle's horizontal span?
    pub fn overlaps_span(actor: &Actor, obstacle: &Obstacle, field: &Playfield, width: f32) -> bool {
        let half = field.actor_half();
        actor.x + half > obstacle.x && actor.x - half < obstacle.x + width
    }

    /// Is the actor's vertical box outside the gap? Touching a gap edge is safe.
    pub fn outside_gap(actor: &Actor, obstacle: &Obstacle, field: &Playfield) -> bool {
        actor.top(field) < obstacle.gap_top || actor.bottom(field) > obstacle.gap_bottom()
    }

    /// Check an actor against every obstacle
    pub fn hits_any(actor: &Actor, obstacles: &[Obstacle], field: &Playfield, width: f32) -> bool {
        obstacles.iter().any(|obstacle| {
            Self::overlaps_span(actor, obstacle, field, width)
                && Self::outside_gap(actor, obstacle, field)
        })
    }

    /// X of the rightmost live actor, if any actor is alive
    pub fn leading_x(actors: &[Actor]) -> Option<f32> {
        actors
            .iter()
            .filter(|a| a.alive)
            .map(|a| a.x)
            .fold(None, |lead, x| Some(lead.map_or(x, |l: f32| l.max(x))))
    }

    /// Mark every obstacle whose center has fallen more than one tick of travel
    /// behind `lead_x`. Returns the number newly scored.
    pub fn score_passes(obstacles: &mut [Obstacle], lead_x: f32, travel: f32, width: f32) -> u32 {
        let mut passed = 0;
        for obstacle in obstacles.iter_mut() {
            if !obstacle.scored && obstacle.center_x(width) < lead_x - travel {
                obstacle.scored = true;
                passed += 1;
            }
        }
        passed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WIDTH: f32 = 60.0;

    fn actor_at(y: f32) -> Actor {
        let field = Playfield::default();
        let mut actor = Actor::spawn(0, &field);
        actor.y = y;
        actor
    }

    fn obstacle_over_actor(gap_top: f32, gap_height: f32) -> Obstacle {
        // Spans x in [80, 140], covering the slot-0 actor at x = 100
        Obstacle::new(80.0, gap_top, gap_height)
    }

    #[test]
    fn inside_gap_survives_above_gap_dies() {
        let field = Playfield::default();
        let obstacle = obstacle_over_actor(200.0, 140.0);

        let inside = actor_at(270.0);
        assert!(!CollisionSystem::hits_any(&inside, &[obstacle.clone()], &field, WIDTH));

        let above = actor_at(150.0);
        assert!(CollisionSystem::hits_any(&above, &[obstacle], &field, WIDTH));
    }

    #[test]
    fn touching_the_gap_edge_is_not_a_hit() {
        let field = Playfield::default();
        let obstacle = obstacle_over_actor(200.0, 140.0);
        let half = field.actor_half();

        // Top edge exactly on the gap top, then one unit higher
        assert!(!CollisionSystem::outside_gap(&actor_at(200.0 + half), &obstacle, &field));
        assert!(CollisionSystem::outside_gap(&actor_at(199.0 + half), &obstacle, &field));

        // Bottom edge exactly on the gap bottom, then one unit lower
        assert!(!CollisionSystem::outside_gap(&actor_at(340.0 - half), &obstacle, &field));
        assert!(CollisionSystem::outside_gap(&actor_at(341.0 - half), &obstacle, &field));
    }

    #[test]
    fn horizontal_edges_must_strictly_overlap() {
        let field = Playfield::default();
        let actor = actor_at(300.0);
        let half = field.actor_half();

        let just_right = Obstacle::new(actor.x + half, 0.0, 10.0);
        assert!(!CollisionSystem::overlaps_span(&actor, &just_right, &field, WIDTH));

        let just_left = Obstacle::new(actor.x - half - WIDTH, 0.0, 10.0);
        assert!(!CollisionSystem::overlaps_span(&actor, &just_left, &field, WIDTH));

        let inside = Obstacle::new(actor.x + half - 1.0, 0.0, 10.0);
        assert!(CollisionSystem::overlaps_span(&actor, &inside, &field, WIDTH));
    }

    #[test]
    fn each_obstacle_scores_once() {
        let mut obstacles = vec![Obstacle::new(0.0, 100.0, 160.0)];
        // center at 30, lead at 100, travel 3 => passed
        assert_eq!(CollisionSystem::score_passes(&mut obstacles, 100.0, 3.0, WIDTH), 1);
        for _ in 0..50 {
            assert_eq!(CollisionSystem::score_passes(&mut obstacles, 100.0, 3.0, WIDTH), 0);
        }
        assert!(obstacles[0].scored);
    }

    #[test]
    fn scoring_waits_for_one_tick_of_travel() {
        let mut obstacles = vec![Obstacle::new(68.0, 100.0, 160.0)];
        // center at 98: behind the actor but within one tick of travel
        assert_eq!(CollisionSystem::score_passes(&mut obstacles, 100.0, 3.0, WIDTH), 0);
        obstacles[0].x = 66.0;
        assert_eq!(CollisionSystem::score_passes(&mut obstacles, 100.0, 3.0, WIDTH), 1);
    }

    #[test]
    fn leading_actor_ignores_the_dead() {
        let field = Playfield::default();
        let mut front = Actor::spawn(0, &field);
        let back = Actor::spawn(1, &field);
        assert_eq!(CollisionSystem::leading_x(&[front.clone(), back.clone()]), Some(100.0));

        front.alive = false;
        assert_eq!(CollisionSystem::leading_x(&[front.clone(), back.clone()]), Some(80.0));

        let mut gone = back;
        gone.alive = false;
        assert_eq!(CollisionSystem::leading_x(&[front, gone]), None);
    }
}
