//! Projectile motion and collision against the lattice
//!
//! A shot travels in a straight line, reflects off the side walls, and
//! resolves the moment it reaches the ceiling or comes within contact
//! distance of an occupied cell. Resolution snaps it onto an empty lattice
//! slot next to whatever it touched.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::bubble::Bubble;
use super::error::SimError;
use super::geometry::{nearest_empty_cell, nearest_empty_in_row, nearest_empty_slot, row_at};
use super::grid::Grid;
use crate::aim_direction;
use crate::consts::*;

/// The bubble currently in flight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projectile {
    pub pos: Vec2,
    /// Unit direction
    pub dir: Vec2,
    /// Pixels per second
    pub speed: f32,
    pub bubble: Bubble,
    pub fired_at_ms: f64,
}

impl Projectile {
    pub fn new(origin: Vec2, aim_angle: f32, speed: f32, bubble: Bubble, now_ms: f64) -> Self {
        Self {
            pos: origin,
            dir: aim_direction(aim_angle),
            speed,
            bubble,
            fired_at_ms: now_ms,
        }
    }
}

/// What the projectile hit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Contact {
    Ceiling,
    Bubble { row: usize, col: usize },
}

/// A resolved collision: where the projectile was and what it touched
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Impact {
    pub point: Vec2,
    pub contact: Contact,
}

/// Reflect off the side walls. Returns true if a bounce happened.
pub fn bounce_walls(projectile: &mut Projectile) -> bool {
    if projectile.pos.x < LEFT_BOUND {
        projectile.pos.x = LEFT_BOUND;
        projectile.dir.x = projectile.dir.x.abs();
        true
    } else if projectile.pos.x > RIGHT_BOUND {
        projectile.pos.x = RIGHT_BOUND;
        projectile.dir.x = -projectile.dir.x.abs();
        true
    } else {
        false
    }
}

/// Closest occupied cell within contact distance of `pos`.
///
/// Obstacles collide like any other bubble.
pub fn find_contact(grid: &Grid, pos: Vec2) -> Option<(usize, usize)> {
    let reach = 2.0 * BUBBLE_RADIUS - OVERLAP_TOLERANCE;
    let reach_sq = reach * reach;

    grid.occupied()
        .map(|(r, c, _)| ((r, c), grid.position(r, c).distance_squared(pos)))
        .filter(|&(_, d)| d <= reach_sq)
        .fold(None, |best: Option<((usize, usize), f32)>, (cell, d)| match best {
            Some((_, best_d)) if best_d <= d => best,
            _ => Some((cell, d)),
        })
        .map(|(cell, _)| cell)
}

/// One collision step: integrate, bounce, then ceiling and bubble checks
pub fn step(projectile: &mut Projectile, grid: &Grid, dt: f32) -> Option<Impact> {
    projectile.pos += projectile.dir * projectile.speed * dt;
    bounce_walls(projectile);

    if projectile.pos.y <= CEILING_Y {
        return Some(Impact {
            point: projectile.pos,
            contact: Contact::Ceiling,
        });
    }

    find_contact(grid, projectile.pos).map(|(row, col)| Impact {
        point: projectile.pos,
        contact: Contact::Bubble { row, col },
    })
}

/// Advance by `dt` seconds, split so no step moves further than
/// `MAX_STEP_DISTANCE`. Stops at the first impact.
pub fn advance(projectile: &mut Projectile, grid: &Grid, dt: f32) -> Option<Impact> {
    let distance = projectile.speed * dt;
    let steps = (distance / MAX_STEP_DISTANCE).ceil().max(1.0) as u32;
    let sub_dt = dt / steps as f32;

    (0..steps).find_map(|_| step(projectile, grid, sub_dt))
}

/// Lattice slot for an impact.
///
/// Bubble contacts try the touched bubble's empty neighbors first. Ceiling
/// contacts go to row 0, or next to the closest ceiling bubble when row 0 is
/// full. Either way a miss falls back to the nearest empty cell scanning
/// rows outward from the impact. `GridFull` only when the whole lattice is
/// taken.
pub fn resolve_slot(grid: &Grid, impact: &Impact) -> Result<(usize, usize), SimError> {
    let (row, col) = match impact.contact {
        Contact::Ceiling => {
            if let Some(col) = nearest_empty_in_row(impact.point, grid, 0) {
                return Ok((0, col));
            }
            // Ceiling row full: treat the closest ceiling bubble as the contact
            let nearest = (0..GRID_COLS)
                .map(|c| (c, grid.position(0, c).distance_squared(impact.point)))
                .fold(None, |best: Option<(usize, f32)>, (c, d)| match best {
                    Some((_, best_d)) if best_d <= d => best,
                    _ => Some((c, d)),
                });
            match nearest {
                Some((col, _)) => (0, col),
                None => return Err(SimError::GridFull),
            }
        }
        Contact::Bubble { row, col } => (row, col),
    };

    match nearest_empty_cell(impact.point, grid, (row, col)) {
        Ok(cell) => Ok(cell),
        Err(SimError::NoSlotAvailable) => {
            log::warn!(
                "No free neighbor around ({}, {}), falling back to row scan",
                row,
                col
            );
            let start = row_at(impact.point.y).max(0) as usize;
            nearest_empty_slot(impact.point, grid, start).ok_or(SimError::GridFull)
        }
        Err(e) => Err(e),
    }
}

/// Snap a resolved projectile onto the lattice and write its bubble there.
///
/// The bubble is never dropped: if the resolved slot cannot take it, the
/// outward scan picks another. `GridFull` means there is no room within the
/// row bound; the caller treats it as a failure-line breach.
pub fn place_projectile(
    grid: &mut Grid,
    projectile: &Projectile,
    impact: &Impact,
) -> Result<(usize, usize), SimError> {
    let (mut row, mut col) = resolve_slot(grid, impact)?;
    if let Err(e) = grid.place(row, col, projectile.bubble) {
        log::warn!("Slot ({}, {}) rejected the bubble: {}", row, col, e);
        (row, col) = nearest_empty_slot(impact.point, grid, row).ok_or(SimError::GridFull)?;
        grid.place(row, col, projectile.bubble)?;
    }
    log::debug!("Placed {:?} at ({}, {})", projectile.bubble, row, col);
    Ok((row, col))
}

/// Path a shot would take: origin, each bounce point, and the final impact
/// point. Stops early after `max_bounces` reflections.
pub fn predict_path(grid: &Grid, origin: Vec2, aim_angle: f32, max_bounces: usize) -> Vec<Vec2> {
    let mut ghost = Projectile::new(origin, aim_angle, MAX_STEP_DISTANCE, Bubble::obstacle(), 0.0);
    let mut points = vec![origin];
    let mut bounces = 0;

    // Each iteration moves MAX_STEP_DISTANCE; bound the walk by a generous path length
    let max_steps = ((SHOOTER_Y + PLAYFIELD_WIDTH) * (max_bounces as f32 + 2.0)
        / MAX_STEP_DISTANCE) as usize;
    for _ in 0..max_steps {
        let before = ghost.dir.x;
        if let Some(impact) = step(&mut ghost, grid, 1.0) {
            points.push(impact.point);
            return points;
        }
        if ghost.dir.x != before {
            points.push(ghost.pos);
            bounces += 1;
            if bounces >= max_bounces {
                return points;
            }
        }
    }
    points.push(ghost.pos);
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::RowWave;
    use crate::sim::bubble::BubbleColor;
    use std::f32::consts::FRAC_PI_2;

    fn shot(pos: Vec2, dir: Vec2) -> Projectile {
        Projectile {
            pos,
            dir,
            speed: 600.0,
            bubble: Bubble::normal(BubbleColor::Red),
            fired_at_ms: 0.0,
        }
    }

    #[test]
    fn test_left_wall_bounce() {
        let mut p = shot(Vec2::new(LEFT_BOUND - 1.0, 200.0), Vec2::new(-1.0, 0.0));
        assert!(bounce_walls(&mut p));
        assert_eq!(p.dir.x, 1.0);
        assert_eq!(p.pos.x, LEFT_BOUND);
    }

    #[test]
    fn test_right_wall_bounce() {
        let mut p = shot(Vec2::new(RIGHT_BOUND + 3.0, 200.0), Vec2::new(0.6, -0.8));
        assert!(bounce_walls(&mut p));
        assert!((p.dir.x + 0.6).abs() < 1e-6);
        assert!((p.dir.y + 0.8).abs() < 1e-6);
        assert_eq!(p.pos.x, RIGHT_BOUND);
    }

    #[test]
    fn test_no_bounce_inside() {
        let mut p = shot(Vec2::new(200.0, 200.0), Vec2::new(-0.6, -0.8));
        assert!(!bounce_walls(&mut p));
        assert!((p.dir.x + 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_ceiling_resolves_into_row_zero() {
        let grid = Grid::new();
        let mut p = Projectile::new(
            Vec2::new(200.0, CEILING_Y + 4.0),
            FRAC_PI_2,
            600.0,
            Bubble::normal(BubbleColor::Red),
            0.0,
        );
        let impact = advance(&mut p, &grid, 0.05).expect("hits ceiling");
        assert_eq!(impact.contact, Contact::Ceiling);
        let (row, _) = resolve_slot(&grid, &impact).unwrap();
        assert_eq!(row, 0);
    }

    #[test]
    fn test_contact_with_bubble() {
        let mut grid = Grid::new();
        grid.set(0, 5, Some(Bubble::normal(BubbleColor::Blue)));
        let target = grid.position(0, 5);
        let mut p = shot(target + Vec2::new(0.0, 200.0), Vec2::new(0.0, -1.0));
        let impact = advance(&mut p, &grid, 1.0).expect("hits bubble");
        assert_eq!(impact.contact, Contact::Bubble { row: 0, col: 5 });
        let dist = impact.point.distance(target);
        assert!(dist <= 2.0 * BUBBLE_RADIUS - OVERLAP_TOLERANCE + 1e-3);
        assert!(dist > 2.0 * BUBBLE_RADIUS - OVERLAP_TOLERANCE - MAX_STEP_DISTANCE - 1e-3);

        let (row, col) = resolve_slot(&grid, &impact).unwrap();
        assert_eq!(row, 1);
        assert!(grid.neighbors(0, 5).contains(&(row, col)));
    }

    #[test]
    fn test_obstacle_collides() {
        let mut grid = Grid::new();
        grid.set(0, 2, Some(Bubble::obstacle()));
        let pos = grid.position(0, 2) + Vec2::new(0.0, 20.0);
        assert_eq!(find_contact(&grid, pos), Some((0, 2)));
    }

    #[test]
    fn test_no_tunneling_at_large_dt() {
        let mut grid = Grid::new();
        grid.set(3, 5, Some(Bubble::normal(BubbleColor::Blue)));
        let target = grid.position(3, 5);
        let mut p = shot(target + Vec2::new(0.0, 300.0), Vec2::new(0.0, -1.0));
        p.speed = 5_000.0;
        let impact = advance(&mut p, &grid, 0.1).expect("must not pass through");
        assert_eq!(impact.contact, Contact::Bubble { row: 3, col: 5 });
    }

    #[test]
    fn test_resolve_slot_fallback_to_row() {
        let mut grid = Grid::new();
        let red = Some(Bubble::normal(BubbleColor::Red));
        // Surround (2, 5) completely
        grid.set(2, 5, red);
        for (r, c) in grid.neighbors(2, 5) {
            grid.set(r, c, red);
        }
        let impact = Impact {
            point: grid.position(2, 5),
            contact: Contact::Bubble { row: 2, col: 5 },
        };
        let (row, col) = resolve_slot(&grid, &impact).unwrap();
        assert_eq!(row, 2);
        assert!(!grid.is_occupied(row, col));
    }

    #[test]
    fn test_resolve_slot_scans_past_full_rows() {
        let mut grid = Grid::new();
        let red = Some(Bubble::normal(BubbleColor::Red));
        for r in 0..5 {
            for c in 0..GRID_COLS {
                grid.set(r, c, red);
            }
        }
        let impact = Impact {
            point: grid.position(2, 5),
            contact: Contact::Bubble { row: 2, col: 5 },
        };
        let (row, col) = resolve_slot(&grid, &impact).unwrap();
        assert_eq!(row, 5);
        assert!(!grid.is_occupied(row, col));
    }

    #[test]
    fn test_resolve_slot_below_last_row_stays_in_bounds() {
        let mut grid = Grid::new();
        let red = Some(Bubble::normal(BubbleColor::Red));
        for c in 0..GRID_COLS {
            grid.set(MAX_ROWS - 1, c, red);
            grid.set(MAX_ROWS - 2, c, red);
        }
        let impact = Impact {
            point: grid.position(MAX_ROWS - 1, 4) + Vec2::new(0.0, ROW_HEIGHT * 0.6),
            contact: Contact::Bubble {
                row: MAX_ROWS - 1,
                col: 4,
            },
        };
        let (row, col) = resolve_slot(&grid, &impact).unwrap();
        assert_eq!(row, MAX_ROWS - 3);
        assert!(!grid.is_occupied(row, col));
    }

    #[test]
    fn test_ceiling_with_full_top_rows() {
        let mut grid = Grid::new();
        let red = Some(Bubble::normal(BubbleColor::Red));
        for r in 0..3 {
            for c in 0..GRID_COLS {
                grid.set(r, c, red);
            }
        }
        let impact = Impact {
            point: Vec2::new(200.0, CEILING_Y),
            contact: Contact::Ceiling,
        };
        let (row, col) = resolve_slot(&grid, &impact).unwrap();
        assert_eq!(row, 3);
        assert!(!grid.is_occupied(row, col));
    }

    #[test]
    fn test_resolve_slot_grid_full() {
        let mut grid = Grid::new();
        for r in 0..MAX_ROWS {
            for c in 0..GRID_COLS {
                grid.set(r, c, Some(Bubble::normal(BubbleColor::Red)));
            }
        }
        let impact = Impact {
            point: grid.position(MAX_ROWS - 1, 4) + Vec2::new(0.0, ROW_HEIGHT * 0.6),
            contact: Contact::Bubble {
                row: MAX_ROWS - 1,
                col: 4,
            },
        };
        assert_eq!(resolve_slot(&grid, &impact), Err(SimError::GridFull));

        let p = shot(impact.point, Vec2::new(0.0, -1.0));
        let before = grid.occupied_count();
        assert_eq!(place_projectile(&mut grid, &p, &impact), Err(SimError::GridFull));
        assert_eq!(grid.occupied_count(), before);
    }

    #[test]
    fn test_contact_uses_row_wave_offset() {
        let mut grid = Grid::new();
        grid.set(2, 5, Some(Bubble::normal(BubbleColor::Blue)));
        let wave = RowWave {
            amplitude: 20.0,
            speed: 0.0,
        };
        grid.apply_row_wave(&wave, 0.0);
        let offset = wave.offset(2, 0.0);
        assert!(offset > 15.0);

        let lattice = grid.cell(2, 5).unwrap().center;
        let moved = grid.position(2, 5);
        // Beside the swayed bubble, far from its lattice center
        assert_eq!(find_contact(&grid, moved + Vec2::new(20.0, 0.0)), Some((2, 5)));
        // Beside the lattice center, far from where the bubble actually is
        assert_eq!(find_contact(&grid, lattice - Vec2::new(20.0, 0.0)), None);

        // A shot straight up the swayed column touches it
        let mut p = shot(moved + Vec2::new(0.0, 200.0), Vec2::new(0.0, -1.0));
        let impact = advance(&mut p, &grid, 1.0).expect("hits swayed bubble");
        assert_eq!(impact.contact, Contact::Bubble { row: 2, col: 5 });
        assert!((impact.point.x - moved.x).abs() < 1e-3);
    }

    #[test]
    fn test_place_projectile_writes_bubble() {
        let mut grid = Grid::new();
        grid.set(0, 5, Some(Bubble::normal(BubbleColor::Blue)));
        let target = grid.position(0, 5);
        let mut p = shot(target + Vec2::new(0.0, 200.0), Vec2::new(0.0, -1.0));
        let impact = advance(&mut p, &grid, 1.0).expect("hits bubble");

        let (row, col) = place_projectile(&mut grid, &p, &impact).unwrap();
        assert_eq!(grid.bubble(row, col), Some(p.bubble));
        assert_eq!(grid.occupied_count(), 2);
    }

    #[test]
    fn test_predict_path_bounces_then_hits_ceiling() {
        let grid = Grid::new();
        let origin = crate::shooter_origin();
        let path = predict_path(&grid, origin, 0.5, 4);
        assert_eq!(path[0], origin);
        assert!(path.len() >= 3, "expected at least one bounce: {:?}", path);
        // First bounce lands on the right wall
        assert!((path[1].x - RIGHT_BOUND).abs() < 1e-3);
        // Final point reached the ceiling
        assert!(path.last().unwrap().y <= CEILING_Y);
    }

    #[test]
    fn test_predict_path_respects_bounce_limit() {
        let grid = Grid::new();
        let path = predict_path(&grid, crate::shooter_origin(), 0.2, 1);
        assert_eq!(path.len(), 2);
    }
}
