//! Interception geometry for constant-velocity targets.
//!
//! [`intercept_point`] is the canonical solver. [`intercept_by_angle`] solves
//! the same problem with the law of sines and is kept for callers that only
//! have a target velocity and an interceptor speed; on feasible geometry both
//! agree.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::f32::consts::{FRAC_PI_2, PI};

const ANGLE_EPSILON: f32 = 1e-5;

/// A point mass moving along `direction` at `speed` units per second.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Mover {
    pub position: Vec2,
    pub direction: Vec2,
    pub speed: f32,
}

impl Mover {
    pub fn new(position: Vec2, direction: Vec2, speed: f32) -> Self {
        Self {
            position,
            direction,
            speed,
        }
    }

    /// Velocity; a zero direction means the mover is stationary.
    pub fn velocity(&self) -> Vec2 {
        self.direction.normalize_or_zero() * self.speed
    }
}

/// Where to aim and how long until the two movers meet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Intercept {
    pub aim_point: Vec2,
    pub time_to_impact: f32,
}

/// Solve `|d + v·t| = s·t` for the earliest positive `t`.
///
/// `d` is the offset from predator to prey, `v` the prey velocity and `s` the
/// predator speed. The predator's own direction is irrelevant: the result is
/// the direction it should take. Returns `None` when the predator cannot move,
/// the discriminant is negative, or every root lies in the past.
pub fn intercept_point(predator: &Mover, prey: &Mover) -> Option<Intercept> {
    let s = predator.speed;
    if !(s > 0.0) {
        return None;
    }

    let d = prey.position - predator.position;
    let v = prey.velocity();
    let c = d.dot(d);
    if c == 0.0 {
        return Some(Intercept {
            aim_point: prey.position,
            time_to_impact: 0.0,
        });
    }

    let a = v.dot(v) - s * s;
    let b = 2.0 * v.dot(d);

    let t = if a.abs() <= f32::EPSILON * s * s {
        // Equal speeds: the quadratic collapses to b·t + c = 0.
        if b >= 0.0 {
            return None;
        }
        -c / b
    } else {
        let discriminant = b * b - 4.0 * a * c;
        if discriminant < 0.0 {
            return None;
        }
        let root = discriminant.sqrt();
        let t1 = (-b - root) / (2.0 * a);
        let t2 = (-b + root) / (2.0 * a);
        smallest_positive(t1, t2)?
    };

    Some(Intercept {
        aim_point: prey.position + v * t,
        time_to_impact: t,
    })
}

fn smallest_positive(t1: f32, t2: f32) -> Option<f32> {
    match (t1 > 0.0, t2 > 0.0) {
        (true, true) => Some(t1.min(t2)),
        (true, false) => Some(t1),
        (false, true) => Some(t2),
        (false, false) => None,
    }
}

/// Angle between two vectors in radians, `None` if either is zero length.
pub fn angle_between(a: Vec2, b: Vec2) -> Option<f32> {
    let denom = a.length() * b.length();
    if denom == 0.0 {
        return None;
    }
    Some((a.dot(b) / denom).clamp(-1.0, 1.0).acos())
}

/// Law-of-sines interception.
///
/// Builds the triangle target (A), impact point (B), interceptor (C). The
/// angle at A is known, `sin(B) = sin(A)·|v|/s`, and the side AB gives the
/// distance the target covers before impact.
pub fn intercept_by_angle(
    target_pos: Vec2,
    target_vel: Vec2,
    interceptor_pos: Vec2,
    interceptor_speed: f32,
) -> Option<Intercept> {
    if !(interceptor_speed > 0.0) {
        return None;
    }
    let to_interceptor = interceptor_pos - target_pos;
    let distance = to_interceptor.length();
    if distance == 0.0 {
        return Some(Intercept {
            aim_point: target_pos,
            time_to_impact: 0.0,
        });
    }
    let target_speed = target_vel.length();
    if target_speed == 0.0 {
        return Some(Intercept {
            aim_point: target_pos,
            time_to_impact: distance / interceptor_speed,
        });
    }

    let cab = angle_between(target_vel, to_interceptor)?;
    let sin_abc = cab.sin() * target_speed / interceptor_speed;
    if sin_abc > 1.0 {
        return None;
    }
    let abc = sin_abc.asin();
    let acb = PI - (cab + abc);

    let t = if acb.sin() <= ANGLE_EPSILON {
        // Collinear: the target runs straight at or straight away from us.
        if cab < FRAC_PI_2 {
            distance / (interceptor_speed + target_speed)
        } else if interceptor_speed > target_speed {
            distance / (interceptor_speed - target_speed)
        } else {
            return None;
        }
    } else {
        let j = distance / acb.sin();
        let travelled = j * abc.sin();
        travelled / target_speed
    };

    Some(Intercept {
        aim_point: target_pos + target_vel * t,
        time_to_impact: t,
    })
}
