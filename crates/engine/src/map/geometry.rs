#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn distance(self, other: Vec2) -> f32 {
        Vec2::new(other.x - self.x, other.y - self.y).length()
    }

    pub fn offset(self, dx: f32, dy: f32) -> Vec2 {
        Vec2::new(self.x + dx, self.y + dy)
    }

    pub fn is_zero(self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }
}

/// Axis-aligned rectangle in world pixels, y growing downward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl Rect {
    pub fn from_center(center: Vec2, width: f32, height: f32) -> Self {
        let half_w = width * 0.5;
        let half_h = height * 0.5;
        Self {
            min_x: center.x - half_w,
            min_y: center.y - half_h,
            max_x: center.x + half_w,
            max_y: center.y + half_h,
        }
    }

    pub fn expanded(self, margin: f32) -> Self {
        Self {
            min_x: self.min_x - margin,
            min_y: self.min_y - margin,
            max_x: self.max_x + margin,
            max_y: self.max_y + margin,
        }
    }

    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }

    /// Edges count as inside.
    pub fn contains_inclusive(&self, point: Vec2) -> bool {
        point.x >= self.min_x
            && point.x <= self.max_x
            && point.y >= self.min_y
            && point.y <= self.max_y
    }

    /// Edges count as outside.
    pub fn contains_strict(&self, point: Vec2) -> bool {
        point.x > self.min_x && point.x < self.max_x && point.y > self.min_y && point.y < self.max_y
    }

    /// Rectangles that only share an edge do not overlap.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.min_x < other.max_x
            && other.min_x < self.max_x
            && self.min_y < other.max_y
            && other.min_y < self.max_y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_containment_excludes_edges() {
        let rect = Rect::from_center(Vec2::new(10.0, 10.0), 4.0, 2.0);
        assert!(rect.contains_strict(Vec2::new(10.0, 10.0)));
        assert!(!rect.contains_strict(Vec2::new(8.0, 10.0)));
        assert!(rect.contains_inclusive(Vec2::new(8.0, 10.0)));
        assert!(!rect.contains_inclusive(Vec2::new(7.9, 10.0)));
    }

    #[test]
    fn touching_rects_do_not_overlap() {
        let a = Rect::from_center(Vec2::new(0.0, 0.0), 2.0, 2.0);
        let b = Rect::from_center(Vec2::new(2.0, 0.0), 2.0, 2.0);
        let c = Rect::from_center(Vec2::new(1.5, 0.5), 2.0, 2.0);
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&c));
        assert!(c.overlaps(&a));
    }

    #[test]
    fn distance_is_euclidean() {
        let d = Vec2::new(480.0, 580.0).distance(Vec2::new(480.0, 650.0));
        assert!((d - 70.0).abs() < 0.0001);
        let diagonal = Vec2::new(0.0, 0.0).distance(Vec2::new(3.0, 4.0));
        assert!((diagonal - 5.0).abs() < 0.0001);
    }
}
