use serde::{Deserialize, Serialize};

/// A 2D point in integer pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub const fn zero() -> Self {
        Self { x: 0, y: 0 }
    }
}

impl std::ops::Add for Point {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl std::ops::AddAssign for Point {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl std::ops::Sub for Point {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

/// A bounding box defined by top-left corner, width, and height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl BoundingBox {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Tightest box containing every point. Empty input gives a zero box.
    pub fn from_points(points: &[Point]) -> Self {
        let Some(first) = points.first() else {
            return Self::new(0, 0, 0, 0);
        };

        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in &points[1..] {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }

        // Extents wider than i32 saturate.
        Self::new(
            min_x,
            min_y,
            max_x.saturating_sub(min_x),
            max_y.saturating_sub(min_y),
        )
    }

    pub fn contains(&self, p: Point) -> bool {
        let (px, py) = (i64::from(p.x), i64::from(p.y));
        let (x, y) = (i64::from(self.x), i64::from(self.y));
        px >= x && py >= y && px < x + i64::from(self.width) && py < y + i64::from(self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_arithmetic() {
        let a = Point::new(1, 2);
        let b = Point::new(3, 4);

        assert_eq!(a + b, Point::new(4, 6));
        assert_eq!(b - a, Point::new(2, 2));

        let mut c = a;
        c += b;
        assert_eq!(c, Point::new(4, 6));
    }

    #[test]
    fn bounding_box_from_points() {
        let points = [Point::new(10, 40), Point::new(-5, 12), Point::new(30, 7)];
        let bbox = BoundingBox::from_points(&points);
        assert_eq!(bbox, BoundingBox::new(-5, 7, 35, 33));
        assert_eq!(BoundingBox::from_points(&[]), BoundingBox::new(0, 0, 0, 0));
    }

    #[test]
    fn bounding_box_extreme_points() {
        let points = [Point::new(i32::MIN, 0), Point::new(i32::MAX, i32::MAX)];
        let bbox = BoundingBox::from_points(&points);
        assert_eq!(bbox, BoundingBox::new(i32::MIN, 0, i32::MAX, i32::MAX));

        let far = BoundingBox::new(i32::MAX - 1, i32::MAX - 1, i32::MAX, i32::MAX);
        assert!(far.contains(Point::new(i32::MAX, i32::MAX)));
        assert!(!far.contains(Point::new(0, 0)));
    }

    #[test]
    fn bounding_box_contains() {
        let bbox = BoundingBox::new(100, 100, 200, 200);
        assert!(bbox.contains(Point::new(100, 100)));
        assert!(bbox.contains(Point::new(299, 299)));
        assert!(!bbox.contains(Point::new(300, 150)));
        assert!(!bbox.contains(Point::new(99, 150)));
    }
}
