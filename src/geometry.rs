//! Small 2D math helpers shared by the map canvas, the connection router and
//! the UI layout engine.
//!
//! Positions are in "map space" (one tile = one unit) unless a function says
//! otherwise; the renderer applies camera scale/offset when drawing.

/// A 2D point or vector in f32 coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn length_squared(self) -> f32 {
        self.x * self.x + self.y * self.y
    }

    pub fn dot(self, other: Vec2) -> f32 {
        self.x * other.x + self.y * other.y
    }

    /// Angle of the vector in radians, measured from the +X axis.
    pub fn angle(self) -> f32 {
        self.y.atan2(self.x)
    }

    /// Linear interpolation between `self` and `other` at parameter `t`.
    pub fn lerp(self, other: Vec2, t: f32) -> Vec2 {
        Vec2::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
        )
    }

    /// Rotate the vector by `angle` radians around the origin.
    pub fn rotated(self, angle: f32) -> Vec2 {
        let (sin, cos) = angle.sin_cos();
        Vec2::new(self.x * cos - self.y * sin, self.x * sin + self.y * cos)
    }

    pub fn distance(self, other: Vec2) -> f32 {
        (other - self).length()
    }
}

impl std::ops::Add for Vec2 {
    type Output = Vec2;
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl std::ops::Mul<f32> for Vec2 {
    type Output = Vec2;
    fn mul(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

impl std::ops::Neg for Vec2 {
    type Output = Vec2;
    fn neg(self) -> Vec2 {
        Vec2::new(-self.x, -self.y)
    }
}

impl From<(f32, f32)> for Vec2 {
    fn from(p: (f32, f32)) -> Vec2 {
        Vec2::new(p.0, p.1)
    }
}

/// Axis-aligned rectangle, position + size.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.x
            && point.x < self.x + self.width
            && point.y >= self.y
            && point.y < self.y + self.height
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// Shrink the rect by `amount` on all four sides.
    pub fn inset(&self, amount: f32) -> Rect {
        Rect::new(
            self.x + amount,
            self.y + amount,
            (self.width - amount * 2.0).max(0.0),
            (self.height - amount * 2.0).max(0.0),
        )
    }
}

/// Projection of `point` onto the segment `a`..`b`.
///
/// Returns `(t, distance)` where `t` is the normalized position along the
/// segment clamped to 0..1 and `distance` is the distance from `point` to
/// that closest position. A degenerate segment (a == b) projects to t = 0.
pub fn project_onto_segment(a: Vec2, b: Vec2, point: Vec2) -> (f32, f32) {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq <= f32::EPSILON {
        return (0.0, point.distance(a));
    }
    let t = ((point - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    let closest = a + ab * t;
    (t, point.distance(closest))
}

/// Test whether `point` lies inside the rectangle of breadth `breadth`
/// centered on the segment `a`..`b` and aligned to it.
///
/// The query point is rotated into the segment's local frame, turning the
/// test into an axis-aligned containment check.
pub fn point_in_segment_rect(a: Vec2, b: Vec2, breadth: f32, point: Vec2) -> bool {
    let ab = b - a;
    let len = ab.length();
    if len <= f32::EPSILON {
        return point.distance(a) <= breadth / 2.0;
    }
    let local = (point - a).rotated(-ab.angle());
    local.x >= 0.0 && local.x <= len && local.y.abs() <= breadth / 2.0
}

/// Integer tile coordinate inside a room grid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct TilePos {
    pub x: i32,
    pub y: i32,
}

impl TilePos {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn to_vec2(self) -> Vec2 {
        Vec2::new(self.x as f32, self.y as f32)
    }
}

impl std::ops::Add for TilePos {
    type Output = TilePos;
    fn add(self, rhs: TilePos) -> TilePos {
        TilePos::new(self.x + rhs.x, self.y + rhs.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_projection_midpoint() {
        let (t, dist) = project_onto_segment(
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
            Vec2::new(5.0, 3.0),
        );
        assert!((t - 0.5).abs() < 1e-6);
        assert!((dist - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_segment_projection_clamps_to_endpoints() {
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(10.0, 0.0);
        let (t, dist) = project_onto_segment(a, b, Vec2::new(-4.0, 0.0));
        assert_eq!(t, 0.0);
        assert!((dist - 4.0).abs() < 1e-6);
        let (t, _) = project_onto_segment(a, b, Vec2::new(25.0, 0.0));
        assert_eq!(t, 1.0);
    }

    #[test]
    fn test_point_in_segment_rect_rotated() {
        // Diagonal segment; a point just off its middle should be inside
        // for a 20-unit breadth and outside for a 2-unit breadth.
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(10.0, 10.0);
        let probe = Vec2::new(4.0, 6.0);
        assert!(point_in_segment_rect(a, b, 20.0, probe));
        assert!(!point_in_segment_rect(a, b, 2.0, probe));
    }

    #[test]
    fn test_point_in_degenerate_segment_rect() {
        let a = Vec2::new(3.0, 3.0);
        assert!(point_in_segment_rect(a, a, 4.0, Vec2::new(4.0, 3.0)));
        assert!(!point_in_segment_rect(a, a, 4.0, Vec2::new(8.0, 3.0)));
    }

    #[test]
    fn test_rect_contains_edges() {
        let r = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(r.contains(Vec2::new(0.0, 0.0)));
        assert!(!r.contains(Vec2::new(10.0, 10.0)));
    }
}
