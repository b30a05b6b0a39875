//! Narrow phase: precise overlap tests on broad-phase candidates, plus
//! pursuit/interception geometry.
//!
//! # Invariants
//! - Every function here is pure.
//! - Rectangle and circle overlap is strict: touching edges do not collide.
//! - Triangle containment includes edges, so a vertex on the other triangle's
//!   boundary counts as overlap.
//! - Infeasible geometry yields `false` or `None`, never a panic or NaN.

mod intercept;
mod overlap;

pub use intercept::{Intercept, Mover, angle_between, intercept_by_angle, intercept_point};
pub use overlap::{
    Circle, Collidable, CollisionMode, Triangle, circle_overlap, rect_overlap, test_overlap,
    triangle_overlap,
};
