use glam::Vec2;
use serde::{Deserialize, Serialize};
use topdown_common::Rect;

/// Which bounding shape narrow-phase checks compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CollisionMode {
    #[default]
    Rectangles,
    Circles,
    Triangles,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub center: Vec2,
    pub radius: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Triangle(pub [Vec2; 3]);

impl Triangle {
    /// Twice the signed area.
    fn cross(&self) -> f32 {
        let [a, b, c] = self.0;
        (b - a).perp_dot(c - a)
    }

    pub fn is_degenerate(&self) -> bool {
        self.cross().abs() <= f32::EPSILON
    }

    /// Barycentric containment test, inclusive on edges.
    ///
    /// Degenerate triangles contain nothing.
    pub fn contains(&self, p: Vec2) -> bool {
        let d = self.cross();
        if d.abs() <= f32::EPSILON {
            return false;
        }
        let [a, b, c] = self.0;
        let e0 = p - a;
        let e1 = b - a;
        let e2 = c - a;
        let s = e0.perp_dot(e2) / d;
        let t = e1.perp_dot(e0) / d;
        s >= 0.0 && t >= 0.0 && s + t <= 1.0
    }
}

/// Anything that can present itself to the narrow phase.
pub trait Collidable {
    fn bounds(&self) -> Rect;
    fn bounding_circle(&self) -> Circle;
    fn bounding_triangle(&self) -> Triangle;
}

/// Rectangles overlap when the intersection has positive area.
pub fn rect_overlap(a: &Rect, b: &Rect) -> bool {
    let top = a.top().max(b.top());
    let bottom = a.bottom().min(b.bottom());
    let left = a.left().max(b.left());
    let right = a.right().min(b.right());
    top < bottom && left < right
}

pub fn circle_overlap(c1: Vec2, r1: f32, c2: Vec2, r2: f32) -> bool {
    c1.distance(c2) < r1 + r2
}

/// True when any vertex of one triangle lies inside the other.
pub fn triangle_overlap(t1: &Triangle, t2: &Triangle) -> bool {
    if t1.is_degenerate() || t2.is_degenerate() {
        return false;
    }
    t2.0.iter().any(|p| t1.contains(*p)) || t1.0.iter().any(|p| t2.contains(*p))
}

pub fn test_overlap<A, B>(mode: CollisionMode, a: &A, b: &B) -> bool
where
    A: Collidable + ?Sized,
    B: Collidable + ?Sized,
{
    match mode {
        CollisionMode::Rectangles => rect_overlap(&a.bounds(), &b.bounds()),
        CollisionMode::Circles => {
            let ca = a.bounding_circle();
            let cb = b.bounding_circle();
            circle_overlap(ca.center, ca.radius, cb.center, cb.radius)
        }
        CollisionMode::Triangles => {
            triangle_overlap(&a.bounding_triangle(), &b.bounding_triangle())
        }
    }
}
