//! Collision detection and response
//!
//! Two interactions are resolved each tick, in a single pass:
//! ball-cushion (axis-aligned reflection against the inner cushion lines)
//! and ball-ball (equal-mass elastic exchange along the line of centers).

use glam::Vec2;

use super::state::{Ball, BallColor, GameEvent, MatchState};
use super::table::TableGeometry;
use crate::map_range;

/// Center distance below which two balls are treated as coincident
pub const MIN_CONTACT_DISTANCE: f32 = 1e-4;

/// Reflect a ball off any cushion its next position crosses.
///
/// Each crossed border clamps the ball's edge onto the cushion line and
/// negates the perpendicular velocity component. The loss factor is
/// applied once per call, however many borders were crossed.
///
/// Cushions are open at the pocket mouths: a ball whose next position
/// falls inside a capture radius rolls on and is taken by the pocket.
pub fn resolve_cushion_collision(
    ball: &mut Ball,
    table: &TableGeometry,
    collision_loss: f32,
    dt: f32,
) -> bool {
    let next = ball.next_pos(dt);
    if table.is_inside_pocket(next) {
        return false;
    }

    let r = table.ball_radius();
    let min = table.min_inner();
    let max = table.max_inner();
    let mut collided = false;

    if table.crosses_top(next) {
        ball.pos = Vec2::new(ball.pos.x, min.y + r);
        ball.vel = Vec2::new(ball.vel.x, -ball.vel.y);
        collided = true;
    }
    if table.crosses_left(next) {
        ball.pos = Vec2::new(min.x + r, ball.pos.y);
        ball.vel = Vec2::new(-ball.vel.x, ball.vel.y);
        collided = true;
    }
    if table.crosses_right(next) {
        ball.pos = Vec2::new(max.x - r, ball.pos.y);
        ball.vel = Vec2::new(-ball.vel.x, ball.vel.y);
        collided = true;
    }
    if table.crosses_bottom(next) {
        ball.pos = Vec2::new(ball.pos.x, max.y - r);
        ball.vel = Vec2::new(ball.vel.x, -ball.vel.y);
        collided = true;
    }

    if collided {
        ball.vel = ball.vel * (1.0 - collision_loss);
    }
    collided
}

/// Resolve contact between two balls.
///
/// Overlapping balls are pushed apart symmetrically along the line of
/// centers until they just touch, then their normal velocity components
/// are swapped (equal masses, frictionless tangential contact) and both
/// velocities are scaled by `1 - collision_loss`.
///
/// Returns false if either ball is hidden or the balls do not touch.
pub fn resolve_ball_collision(
    first: &mut Ball,
    second: &mut Ball,
    diameter: f32,
    collision_loss: f32,
) -> bool {
    if !first.visible || !second.visible {
        return false;
    }
    let Some(un) = separate_balls(first, second, diameter) else {
        return false;
    };

    let ut = Vec2::new(-un.y, un.x);

    let v1n = un.dot(first.vel);
    let v1t = ut.dot(first.vel);
    let v2n = un.dot(second.vel);
    let v2t = ut.dot(second.vel);

    let keep = 1.0 - collision_loss;
    first.vel = (un * v2n + ut * v1t) * keep;
    second.vel = (un * v1n + ut * v2t) * keep;

    true
}

/// Push touching balls apart symmetrically until their centers are
/// `diameter` apart. Returns the unit normal from `second` to `first`, or
/// `None` if the balls do not touch.
fn separate_balls(first: &mut Ball, second: &mut Ball, diameter: f32) -> Option<Vec2> {
    let mut n = first.pos - second.pos;
    let mut dist = n.length();

    if dist > diameter {
        return None;
    }

    // Coincident centers: pick a direction rather than divide by zero
    if dist < MIN_CONTACT_DISTANCE {
        let dir = if dist > 0.0 { n / dist } else { Vec2::X };
        n = dir * MIN_CONTACT_DISTANCE;
        dist = MIN_CONTACT_DISTANCE;
    }

    // Minimum translation distance
    let mtd = n * ((diameter - dist) / dist);
    first.pos = first.pos + mtd * 0.5;
    second.pos = second.pos - mtd * 0.5;

    Some(n / dist)
}

/// True if the pair's relative velocity closes the gap between centers
pub fn is_approaching(first: &Ball, second: &Ball) -> bool {
    (first.vel - second.vel).dot(first.pos - second.pos) < 0.0
}

/// Mutable access to two distinct elements of a slice
fn pair_mut(balls: &mut [Ball], i: usize, j: usize) -> (&mut Ball, &mut Ball) {
    debug_assert!(i < j);
    let (head, tail) = balls.split_at_mut(j);
    (&mut head[i], &mut tail[0])
}

/// Color recorded as the turn's first contact for a colliding pair
pub fn contact_color(first: &Ball, second: &Ball) -> BallColor {
    if first.color == BallColor::White {
        second.color
    } else {
        first.color
    }
}

/// Run one collision pass over the active balls.
///
/// Cushions first, then every unordered pair in index order. Each ball-ball
/// impact raises a [`GameEvent::BallsCollided`] and may set the turn's
/// first contact color. Touching balls that are not closing on each other
/// (resting contact) are only kept apart, never counted as a hit.
pub fn handle_collisions(state: &mut MatchState) {
    let table = state.config.table.clone();
    let loss = state.config.physics.collision_loss;
    let dt = state.config.physics.dt;

    for ball in state.balls.iter_mut().filter(|b| b.visible) {
        resolve_cushion_collision(ball, &table, loss, dt);
    }

    let count = state.balls.len();
    for i in 0..count {
        for j in (i + 1)..count {
            let (first, second) = pair_mut(&mut state.balls, i, j);
            if !first.visible || !second.visible {
                continue;
            }
            if !is_approaching(first, second) {
                separate_balls(first, second, table.ball_diameter);
                continue;
            }

            // Combined impact speed, as distance travelled per tick
            let incoming = (first.vel.length() + second.vel.length()) * dt;

            if !resolve_ball_collision(first, second, table.ball_diameter, loss) {
                continue;
            }

            let color = contact_color(first, second);
            log::debug!("balls {} and {} collided", first.id, second.id);

            let intensity = map_range(incoming, 0.0, table.max_expected_collision_force, 0.0, 1.0)
                .clamp(0.0, 1.0);

            state.balls_collided = true;
            state.turn.record_first_collision(color);
            state.push_event(GameEvent::BallsCollided { intensity });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn table() -> TableGeometry {
        TableGeometry::default()
    }

    /// Closed cushions all round, for exercising the corners
    fn pocketless_table() -> TableGeometry {
        TableGeometry {
            pockets: Vec::new(),
            ..TableGeometry::default()
        }
    }

    #[test]
    fn test_top_cushion_reflection() {
        let table = table();
        let r = table.ball_radius();
        let mut ball = Ball::new(0, BallColor::Red, Vec2::new(400.0, 60.0 + r + 2.0));
        ball.vel = Vec2::new(300.0, -900.0);

        let hit = resolve_cushion_collision(&mut ball, &table, 0.1, 1.0 / 177.0);
        assert!(hit);
        // Edge sits exactly on the cushion line
        assert!((ball.pos.y - r - table.cushion_width).abs() < 1e-4);
        assert!((ball.vel.x - 300.0 * 0.9).abs() < 1e-3);
        assert!((ball.vel.y - 900.0 * 0.9).abs() < 1e-3);
    }

    #[test]
    fn test_no_cushion_hit_in_open_cloth() {
        let table = table();
        let mut ball = Ball::new(0, BallColor::Red, Vec2::new(700.0, 400.0));
        ball.vel = Vec2::new(100.0, 100.0);

        assert!(!resolve_cushion_collision(&mut ball, &table, 0.1, 1.0 / 177.0));
        assert_eq!(ball.vel, Vec2::new(100.0, 100.0));
    }

    #[test]
    fn test_corner_double_cushion_single_loss() {
        let table = pocketless_table();
        let r = table.ball_radius();
        let mut ball = Ball::new(0, BallColor::Yellow, Vec2::new(60.0 + r + 1.0, 60.0 + r + 1.0));
        ball.vel = Vec2::new(-500.0, -400.0);

        let hit = resolve_cushion_collision(&mut ball, &table, 0.1, 1.0 / 177.0);
        assert!(hit);
        assert!((ball.pos.x - (60.0 + r)).abs() < 1e-4);
        assert!((ball.pos.y - (60.0 + r)).abs() < 1e-4);
        // 0.9, not 0.81
        assert!((ball.vel.x - 450.0).abs() < 1e-3);
        assert!((ball.vel.y - 360.0).abs() < 1e-3);
    }

    #[test]
    fn test_right_and_bottom_cushions_clamp_inside() {
        let table = pocketless_table();
        let r = table.ball_radius();
        let mut ball = Ball::new(0, BallColor::Red, Vec2::new(1440.0 - r - 1.0, 765.0 - r - 1.0));
        ball.vel = Vec2::new(600.0, 600.0);

        assert!(resolve_cushion_collision(&mut ball, &table, 0.0, 1.0 / 177.0));
        assert!((ball.pos.x + r - 1440.0).abs() < 1e-3);
        assert!((ball.pos.y + r - 765.0).abs() < 1e-3);
        assert!(ball.vel.x < 0.0 && ball.vel.y < 0.0);
    }

    #[test]
    fn test_cushion_open_at_pocket_mouth() {
        let table = table();
        let r = table.ball_radius();
        // Rolling straight at the top side pocket
        let mut ball = Ball::new(0, BallColor::Red, Vec2::new(750.0, 60.0 + r + 5.0));
        ball.vel = Vec2::new(0.0, -2000.0);

        assert!(!resolve_cushion_collision(&mut ball, &table, 0.1, 1.0 / 177.0));
        assert_eq!(ball.vel, Vec2::new(0.0, -2000.0));
        assert!(table.is_inside_pocket(ball.next_pos(1.0 / 177.0)));

        // Same approach beside the pocket still bounces
        let mut ball = Ball::new(0, BallColor::Red, Vec2::new(400.0, 60.0 + r + 5.0));
        ball.vel = Vec2::new(0.0, -2000.0);
        assert!(resolve_cushion_collision(&mut ball, &table, 0.1, 1.0 / 177.0));
    }

    #[test]
    fn test_head_on_exchange_with_loss() {
        let d = 38.0;
        let mut cue = Ball::new(0, BallColor::White, Vec2::new(200.0, 300.0));
        let mut red = Ball::new(1, BallColor::Red, Vec2::new(237.0, 300.0));
        cue.vel = Vec2::new(1000.0, 0.0);

        assert!(resolve_ball_collision(&mut cue, &mut red, d, 0.1));
        assert!((red.vel.x - 900.0).abs() < 1e-2);
        assert!(red.vel.y.abs() < 1e-3);
        assert!(cue.vel.length() < 1e-2);
        assert!((cue.pos.distance(red.pos) - d).abs() < 1e-3);
    }

    #[test]
    fn test_no_contact_when_apart() {
        let mut a = Ball::new(0, BallColor::White, Vec2::new(0.0, 0.0));
        let mut b = Ball::new(1, BallColor::Red, Vec2::new(38.5, 0.0));
        a.vel = Vec2::new(10.0, 0.0);
        assert!(!resolve_ball_collision(&mut a, &mut b, 38.0, 0.1));
        assert_eq!(a.vel, Vec2::new(10.0, 0.0));
    }

    #[test]
    fn test_hidden_ball_ignored() {
        let mut a = Ball::new(0, BallColor::White, Vec2::new(0.0, 0.0));
        let mut b = Ball::new(1, BallColor::Red, Vec2::new(10.0, 0.0));
        b.hide();
        assert!(!resolve_ball_collision(&mut a, &mut b, 38.0, 0.1));
    }

    #[test]
    fn test_coincident_centers_stay_finite() {
        let mut a = Ball::new(0, BallColor::White, Vec2::new(300.0, 300.0));
        let mut b = Ball::new(1, BallColor::Red, Vec2::new(300.0, 300.0));
        a.vel = Vec2::new(50.0, 20.0);

        assert!(resolve_ball_collision(&mut a, &mut b, 38.0, 0.0));
        assert!(a.pos.is_finite() && b.pos.is_finite());
        assert!(a.vel.is_finite() && b.vel.is_finite());
        assert!((a.pos.distance(b.pos) - 38.0).abs() < 1e-2);
    }

    #[test]
    fn test_contact_color_prefers_non_white() {
        let cue = Ball::new(0, BallColor::White, Vec2::ZERO);
        let red = Ball::new(1, BallColor::Red, Vec2::ZERO);
        let yellow = Ball::new(2, BallColor::Yellow, Vec2::ZERO);
        assert_eq!(contact_color(&cue, &red), BallColor::Red);
        assert_eq!(contact_color(&red, &cue), BallColor::Red);
        assert_eq!(contact_color(&yellow, &red), BallColor::Yellow);
    }

    #[test]
    fn test_collision_pass_raises_scaled_event() {
        let mut state = MatchState::new(crate::config::MatchConfig::manual());
        state.balls = vec![
            Ball::new(0, BallColor::White, Vec2::new(400.0, 400.0)),
            Ball::new(1, BallColor::Yellow, Vec2::new(430.0, 400.0)),
        ];
        state.balls[0].vel = Vec2::new(2000.0, 0.0);

        handle_collisions(&mut state);

        assert!(state.balls_collided);
        assert_eq!(state.turn.first_collided, Some(BallColor::Yellow));
        let events = state.drain_events();
        assert_eq!(events.len(), 1);
        match events[0] {
            GameEvent::BallsCollided { intensity } => {
                assert!(intensity > 0.0 && intensity < 1.0, "intensity = {}", intensity);
            }
            ref other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_resting_contact_is_not_a_hit() {
        let mut state = MatchState::new(crate::config::MatchConfig::manual());
        state.balls = vec![
            Ball::new(0, BallColor::White, Vec2::new(400.0, 400.0)),
            Ball::new(1, BallColor::Red, Vec2::new(1000.0, 400.0)),
            Ball::new(2, BallColor::Red, Vec2::new(1038.0, 400.0)),
        ];
        // Cue ball heads away from the touching pair
        state.balls[0].vel = Vec2::new(-1000.0, 0.0);

        handle_collisions(&mut state);

        assert!(!state.balls_collided);
        assert_eq!(state.turn.first_collided, None);
        assert!(state.drain_events().is_empty());
        assert_eq!(state.balls[1].pos, Vec2::new(1000.0, 400.0));
        assert_eq!(state.balls[2].pos, Vec2::new(1038.0, 400.0));
    }

    #[test]
    fn test_overlap_at_rest_is_separated_quietly() {
        let mut state = MatchState::new(crate::config::MatchConfig::manual());
        state.balls = vec![
            Ball::new(0, BallColor::Yellow, Vec2::new(600.0, 400.0)),
            Ball::new(1, BallColor::Red, Vec2::new(630.0, 400.0)),
        ];

        handle_collisions(&mut state);

        assert!((state.balls[0].pos.distance(state.balls[1].pos) - 38.0).abs() < 1e-3);
        assert_eq!(state.balls[0].vel, Vec2::ZERO);
        assert_eq!(state.balls[1].vel, Vec2::ZERO);
        assert_eq!(state.turn.first_collided, None);
        assert!(state.drain_events().is_empty());
    }

    #[test]
    fn test_separating_pair_is_not_a_hit() {
        let mut a = Ball::new(0, BallColor::White, Vec2::new(300.0, 300.0));
        let mut b = Ball::new(1, BallColor::Red, Vec2::new(338.0, 300.0));
        a.vel = Vec2::new(-200.0, 0.0);
        b.vel = Vec2::new(200.0, 0.0);
        assert!(!is_approaching(&a, &b));

        b.vel = Vec2::new(-500.0, 0.0);
        assert!(is_approaching(&a, &b));
        assert!(is_approaching(&b, &a));
    }

    fn arb_ball_pair() -> impl Strategy<Value = (Vec2, Vec2, Vec2, Vec2)> {
        (
            (0.5f32..37.5, 0.0f32..std::f32::consts::TAU),
            (-2000.0f32..2000.0, -2000.0f32..2000.0),
            (-2000.0f32..2000.0, -2000.0f32..2000.0),
        )
            .prop_map(|((dist, angle), (v1x, v1y), (v2x, v2y))| {
                let a = Vec2::new(500.0, 400.0);
                let b = a + crate::polar_to_cartesian(dist, angle);
                (a, b, Vec2::new(v1x, v1y), Vec2::new(v2x, v2y))
            })
    }

    proptest! {
        #[test]
        fn prop_separation_equals_diameter((pa, pb, va, vb) in arb_ball_pair()) {
            let mut a = Ball::new(0, BallColor::White, pa);
            let mut b = Ball::new(1, BallColor::Red, pb);
            a.vel = va;
            b.vel = vb;

            prop_assert!(resolve_ball_collision(&mut a, &mut b, 38.0, 0.018));
            let dist = a.pos.distance(b.pos);
            prop_assert!((dist - 38.0).abs() < 1e-2, "dist = {}", dist);
        }

        #[test]
        fn prop_lossless_exchange_conserves_energy_and_momentum((pa, pb, va, vb) in arb_ball_pair()) {
            let mut a = Ball::new(0, BallColor::White, pa);
            let mut b = Ball::new(1, BallColor::Red, pb);
            a.vel = va;
            b.vel = vb;
            let un = (pa - pb).normalize();

            let energy_before = va.length_squared() + vb.length_squared();
            let momentum_before = va + vb;
            let normal_before = un.dot(va) + un.dot(vb);

            prop_assert!(resolve_ball_collision(&mut a, &mut b, 38.0, 0.0));

            let energy_after = a.vel.length_squared() + b.vel.length_squared();
            let momentum_after = a.vel + b.vel;
            let normal_after = un.dot(a.vel) + un.dot(b.vel);

            let tol = 1e-3 * energy_before.max(1.0);
            prop_assert!((energy_after - energy_before).abs() < tol);
            prop_assert!((momentum_after - momentum_before).length() < 0.05);
            prop_assert!((normal_after - normal_before).abs() < 0.05);
        }
    }
}
