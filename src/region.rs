use crate::grid::Point;

use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle of grid cells, `[x, x + width) × [y, y + height)`.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct Region {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Region {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Region {
            x,
            y,
            width,
            height,
        }
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2, self.y + self.height / 2)
    }

    pub fn area(&self) -> i64 {
        i64::from(self.width) * i64::from(self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Exclusive upper corner.
    pub fn supremum(&self) -> Point {
        Point::new(self.x + self.width, self.y + self.height)
    }

    /// `supremum`, or `None` if it does not fit in `i32`.
    pub fn checked_supremum(&self) -> Option<Point> {
        Some(Point::new(
            self.x.checked_add(self.width)?,
            self.y.checked_add(self.height)?,
        ))
    }

    pub fn contains(&self, p: &Point) -> bool {
        let sup = self.supremum();

        p.x >= self.x && p.y >= self.y && p.x < sup.x && p.y < sup.y
    }

    pub fn contains_region(&self, other: &Region) -> bool {
        let (sup, other_sup) = (self.supremum(), other.supremum());

        other.x >= self.x && other.y >= self.y && other_sup.x <= sup.x && other_sup.y <= sup.y
    }

    pub fn intersects(&self, other: &Region) -> bool {
        let (sup, other_sup) = (self.supremum(), other.supremum());

        !self.is_empty()
            && !other.is_empty()
            && self.x < other_sup.x
            && other.x < sup.x
            && self.y < other_sup.y
            && other.y < sup.y
    }

    /// Smallest region covering both.
    pub fn union(&self, other: &Region) -> Region {
        let (sup, other_sup) = (self.supremum(), other.supremum());
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);

        Region::new(x, y, sup.x.max(other_sup.x) - x, sup.y.max(other_sup.y) - y)
    }

    /// Row-major iterator over every point inside the region.
    pub fn points(&self) -> impl Iterator<Item = Point> {
        let Region {
            x,
            y,
            width,
            height,
        } = *self;

        (y..y + height.max(0))
            .flat_map(move |py| (x..x + width.max(0)).map(move |px| Point::new(px, py)))
    }
}
