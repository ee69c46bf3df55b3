//! Fixed timestep simulation tick
//!
//! Advances a board by one `SIM_DT` step: integration, drag override,
//! pairwise contact resolution (bounce or merge), then the win check.
//! Single-threaded and deterministic; iteration order is creation order.

use crate::consts::*;
use crate::sim::collision;
use crate::sim::state::{Board, DragState, SessionPhase, TickInput};

/// Advance the board by one fixed timestep.
pub fn tick(board: &mut Board, input: &TickInput, dt: f32) {
    // WON and LOST are terminal
    if board.phase != SessionPhase::Playing {
        return;
    }

    board.merge_events.clear();
    apply_drag(board, input, dt);
    integrate(board, dt);
    resolve_contacts(board);
    board.shapes.retain(|s| s.alive);
    win_check(board);
}

/// Pointer authority: a held shape tracks the pointer directly and carries a
/// velocity estimated from the per-tick position delta, so releasing it
/// throws it.
fn apply_drag(board: &mut Board, input: &TickInput, dt: f32) {
    match input.drag {
        Some(drag) => {
            // Switching to another shape releases the old one
            if let Some(prev) = board.drag
                && prev.shape_id != drag.shape_id
                && let Some(old) = board.shapes.iter_mut().find(|s| s.id == prev.shape_id)
            {
                old.dragged = false;
            }

            let bounds = board.bounds;
            let Some(shape) = board
                .shapes
                .iter_mut()
                .find(|s| s.id == drag.shape_id && s.alive)
            else {
                log::debug!("drag targets unknown shape {}", drag.shape_id);
                board.drag = None;
                return;
            };

            // Out-of-bounds pointers are clamped, not rejected
            let target = bounds.clamp(drag.pointer, shape.extent.half_extents());
            shape.vel = (target - shape.pos) / dt;
            shape.pos = target;
            shape.dragged = true;
            board.drag = Some(DragState {
                shape_id: drag.shape_id,
            });
        }
        None => {
            if let Some(prev) = board.drag.take()
                && let Some(shape) = board.shapes.iter_mut().find(|s| s.id == prev.shape_id)
            {
                // Released: keeps the last estimated velocity as the throw
                shape.dragged = false;
            }
        }
    }
}

/// Gravity, damping, position update, and wall bounce for free shapes.
fn integrate(board: &mut Board, dt: f32) {
    let bounds = board.bounds;
    for shape in board.shapes.iter_mut() {
        if !shape.alive || shape.dragged {
            continue;
        }

        shape.vel.y += GRAVITY * dt;
        shape.vel *= (1.0 - LINEAR_DAMPING * dt).max(0.0);
        shape.pos += shape.vel * dt;

        // Clamp to bounds, reflecting velocity on the clamped axis
        let half = shape.extent.half_extents();
        let max_x = (bounds.width - half.x).max(half.x);
        let max_y = (bounds.height - half.y).max(half.y);
        if shape.pos.x < half.x || shape.pos.x > max_x {
            shape.pos.x = shape.pos.x.clamp(half.x, max_x);
            shape.vel.x = -shape.vel.x * WALL_RESTITUTION;
        }
        if shape.pos.y < half.y || shape.pos.y > max_y {
            shape.pos.y = shape.pos.y.clamp(half.y, max_y);
            shape.vel.y = -shape.vel.y * WALL_RESTITUTION;
        }
    }
}

/// O(n²) pairwise resolution in creation order. Fine at puzzle-scale counts.
fn resolve_contacts(board: &mut Board) {
    let n = board.shapes.len();
    for i in 0..n {
        for j in (i + 1)..n {
            if !board.shapes[i].alive || !board.shapes[j].alive {
                continue;
            }

            let (head, tail) = board.shapes.split_at_mut(j);
            let a = &mut head[i];
            let b = &mut tail[0];

            let Some(contact) = collision::contact(a.extent, a.pos, b.extent, b.pos) else {
                continue;
            };

            if a.color == b.color {
                let event = collision::merge_pair(a, b, &contact);
                log::debug!(
                    "merge: {} absorbed {} ({}), area {:.1}",
                    event.survivor,
                    event.absorbed,
                    event.color.as_str(),
                    event.area
                );
                board.last_merged = Some(event.color);
                // A merged-away shape cannot stay held
                if let Some(drag) = board.drag
                    && drag.shape_id == event.absorbed
                {
                    board.drag = None;
                }
                board.merge_events.push(event);
            } else {
                collision::resolve_bounce(a, b, &contact, BOUNCE_RESTITUTION);
            }
        }
    }
}

fn win_check(board: &mut Board) {
    if board.live_count() != 1 {
        return;
    }
    let last = board
        .shapes
        .iter()
        .find(|s| s.alive)
        .expect("live_count was 1");
    board.phase = if last.color == board.border_color {
        log::info!("session won: final shape {} ({})", last.id, last.color.as_str());
        SessionPhase::Won
    } else {
        log::info!(
            "session lost: final shape {} is {}, border is {}",
            last.id,
            last.color.as_str(),
            board.border_color.as_str()
        );
        SessionPhase::Lost
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::Color;
    use crate::sim::shape::{Extent, Shape};
    use crate::sim::state::{Bounds, DragInput};
    use glam::Vec2;

    fn circle(id: u32, color: Color, x: f32, y: f32) -> Shape {
        Shape::new(id, color, Extent::Circle { radius: 20.0 }, Vec2::new(x, y))
    }

    fn board_with(border: Color, shapes: Vec<Shape>) -> Board {
        Board::from_shapes(
            Bounds::new(800.0, 600.0),
            border,
            vec![Color::Mint, Color::Pink],
            shapes,
        )
    }

    #[test]
    fn test_overlapping_same_color_pair_wins_in_one_tick() {
        let mut board = board_with(
            Color::Mint,
            vec![
                circle(1, Color::Mint, 100.0, 100.0),
                circle(2, Color::Mint, 110.0, 100.0),
            ],
        );

        tick(&mut board, &TickInput::default(), SIM_DT);

        assert_eq!(board.live_count(), 1);
        assert_eq!(board.phase, SessionPhase::Won);
        assert_eq!(board.last_merged, Some(Color::Mint));
        let events = board.drain_merge_events();
        assert_eq!(events.len(), 1);
        // Area conservation: two r=20 circles
        let expected = 2.0 * std::f32::consts::PI * 400.0;
        assert!((events[0].area - expected).abs() / expected < 1e-4);
    }

    #[test]
    fn test_final_shape_of_wrong_color_loses() {
        let mut board = board_with(
            Color::Pink,
            vec![
                circle(1, Color::Mint, 100.0, 100.0),
                circle(2, Color::Mint, 110.0, 100.0),
            ],
        );
        tick(&mut board, &TickInput::default(), SIM_DT);
        assert_eq!(board.phase, SessionPhase::Lost);
    }

    #[test]
    fn test_terminal_phase_freezes_board() {
        let mut board = board_with(
            Color::Mint,
            vec![
                circle(1, Color::Mint, 100.0, 100.0),
                circle(2, Color::Mint, 110.0, 100.0),
            ],
        );
        tick(&mut board, &TickInput::default(), SIM_DT);
        assert_eq!(board.phase, SessionPhase::Won);

        let snapshot = board.shapes[0].pos;
        for _ in 0..10 {
            tick(&mut board, &TickInput::default(), SIM_DT);
        }
        assert_eq!(board.shapes[0].pos, snapshot);
    }

    #[test]
    fn test_gravity_and_damping_move_free_shapes() {
        let mut board = board_with(
            Color::Mint,
            vec![
                circle(1, Color::Mint, 100.0, 100.0),
                circle(2, Color::Pink, 700.0, 100.0),
            ],
        );
        for _ in 0..60 {
            tick(&mut board, &TickInput::default(), SIM_DT);
        }
        assert_eq!(board.phase, SessionPhase::Playing);
        // Both shapes fell
        assert!(board.shapes[0].pos.y > 100.0);
        assert!(board.shapes[1].pos.y > 100.0);
    }

    #[test]
    fn test_wall_bounce_reflects_velocity() {
        let mut a = circle(1, Color::Mint, 100.0, 570.0);
        a.vel = Vec2::new(0.0, 300.0);
        let mut board = board_with(Color::Mint, vec![a, circle(2, Color::Pink, 700.0, 100.0)]);

        // At 300 px/s it takes a few 1/120 s steps to cover the 10 px gap
        // to the floor (clamp threshold is 580 for a radius-20 circle)
        for _ in 0..10 {
            tick(&mut board, &TickInput::default(), SIM_DT);
        }

        let a = board.shape(1).unwrap();
        assert!(a.pos.y <= 580.0);
        assert!(a.vel.y < 0.0, "velocity should reflect off the floor");
    }

    #[test]
    fn test_drag_overrides_physics_and_release_throws() {
        let mut board = board_with(
            Color::Mint,
            vec![
                circle(1, Color::Mint, 100.0, 100.0),
                circle(2, Color::Pink, 700.0, 500.0),
            ],
        );

        // Drag shape 1 rightward over a few ticks
        let mut pointer = Vec2::new(100.0, 100.0);
        for _ in 0..5 {
            pointer.x += 10.0;
            let input = TickInput {
                drag: Some(DragInput {
                    shape_id: 1,
                    pointer,
                }),
            };
            tick(&mut board, &input, SIM_DT);
        }
        let held = board.shape(1).unwrap();
        assert_eq!(held.pos, pointer);
        assert!(held.dragged);

        // Release: the throw velocity sticks
        tick(&mut board, &TickInput::default(), SIM_DT);
        let released = board.shape(1).unwrap();
        assert!(!released.dragged);
        assert!(released.vel.x > 0.0);
    }

    #[test]
    fn test_drag_pointer_outside_bounds_is_clamped() {
        let mut board = board_with(
            Color::Mint,
            vec![
                circle(1, Color::Mint, 100.0, 100.0),
                circle(2, Color::Pink, 700.0, 500.0),
            ],
        );
        let input = TickInput {
            drag: Some(DragInput {
                shape_id: 1,
                pointer: Vec2::new(-500.0, 100.0),
            }),
        };
        tick(&mut board, &input, SIM_DT);
        // Clamped to the left wall with the radius as slack
        assert_eq!(board.shape(1).unwrap().pos.x, 20.0);
    }

    #[test]
    fn test_held_shape_surviving_a_merge_stays_held() {
        // Equal areas tie-break to the lower id, so the held shape survives
        let mut board = board_with(
            Color::Mint,
            vec![
                circle(1, Color::Mint, 100.0, 100.0),
                circle(2, Color::Mint, 200.0, 100.0),
                circle(3, Color::Pink, 700.0, 500.0),
            ],
        );

        let input = TickInput {
            drag: Some(DragInput {
                shape_id: 1,
                pointer: Vec2::new(200.0, 100.0),
            }),
        };
        tick(&mut board, &input, SIM_DT);

        assert_eq!(board.live_count(), 2);
        assert_eq!(board.phase, SessionPhase::Playing);
        assert!(board.shape(2).is_none());
        let held = board.shape(1).unwrap();
        assert!(held.dragged);
        assert_eq!(board.drag.unwrap().shape_id, 1);

        // Pointer authority persists over the merged shape
        let input = TickInput {
            drag: Some(DragInput {
                shape_id: 1,
                pointer: Vec2::new(300.0, 300.0),
            }),
        };
        tick(&mut board, &input, SIM_DT);
        assert_eq!(board.shape(1).unwrap().pos, Vec2::new(300.0, 300.0));
    }

    #[test]
    fn test_held_shape_absorbed_by_a_merge_releases_the_drag() {
        let small = Shape::new(
            1,
            Color::Mint,
            Extent::Circle { radius: 15.0 },
            Vec2::new(100.0, 100.0),
        );
        let big = Shape::new(
            2,
            Color::Mint,
            Extent::Circle { radius: 25.0 },
            Vec2::new(140.0, 100.0),
        );
        let mut board = board_with(
            Color::Mint,
            vec![small, big, circle(3, Color::Pink, 700.0, 500.0)],
        );

        let input = TickInput {
            drag: Some(DragInput {
                shape_id: 1,
                pointer: Vec2::new(130.0, 100.0),
            }),
        };
        tick(&mut board, &input, SIM_DT);

        // The larger shape absorbed the held one; nothing stays held
        assert!(board.shape(1).is_none());
        assert!(board.drag.is_none());
        let survivor = board.shape(2).unwrap();
        assert!(!survivor.dragged);

        // And the survivor is back under physics, not frozen
        let y_before = survivor.pos.y;
        for _ in 0..30 {
            tick(&mut board, &TickInput::default(), SIM_DT);
        }
        assert!(board.shape(2).unwrap().pos.y > y_before);
    }

    #[test]
    fn test_unlike_colors_bounce_and_separate() {
        let mut a = circle(1, Color::Mint, 100.0, 100.0);
        let mut b = circle(2, Color::Pink, 130.0, 100.0);
        a.vel = Vec2::new(200.0, 0.0);
        b.vel = Vec2::new(-200.0, 0.0);
        let mut board = board_with(Color::Mint, vec![a, b]);

        for _ in 0..30 {
            tick(&mut board, &TickInput::default(), SIM_DT);
        }

        // Still two shapes, no merge, no penetration
        assert_eq!(board.live_count(), 2);
        let a = board.shape(1).unwrap();
        let b = board.shape(2).unwrap();
        assert!(!a.overlaps(b));
    }

    #[test]
    fn test_determinism_across_identical_runs() {
        let make = || {
            board_with(
                Color::Mint,
                vec![
                    circle(1, Color::Mint, 120.0, 80.0),
                    circle(2, Color::Pink, 400.0, 300.0),
                    circle(3, Color::Pink, 600.0, 150.0),
                ],
            )
        };
        let mut b1 = make();
        let mut b2 = make();

        for t in 0..240 {
            let input = if t % 30 < 10 {
                TickInput {
                    drag: Some(DragInput {
                        shape_id: 1,
                        pointer: Vec2::new(120.0 + t as f32, 90.0),
                    }),
                }
            } else {
                TickInput::default()
            };
            tick(&mut b1, &input, SIM_DT);
            tick(&mut b2, &input, SIM_DT);
        }

        assert_eq!(b1.phase, b2.phase);
        assert_eq!(b1.shapes.len(), b2.shapes.len());
        for (s1, s2) in b1.shapes.iter().zip(&b2.shapes) {
            assert_eq!(s1.pos, s2.pos);
            assert_eq!(s1.vel, s2.vel);
        }
    }
}
