//! Grid cells and Manhattan walking. Nothing on the grid is an obstacle.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridPos {
    pub x: i32,
    pub y: i32,
}

impl GridPos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn manhattan(&self, other: &GridPos) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    /// One cell toward `target`, closing the horizontal gap before the vertical one.
    pub fn step_toward(&self, target: &GridPos) -> GridPos {
        if self.x != target.x {
            GridPos::new(self.x + (target.x - self.x).signum(), self.y)
        } else if self.y != target.y {
            GridPos::new(self.x, self.y + (target.y - self.y).signum())
        } else {
            *self
        }
    }

    /// Clamp into a `width` x `height` grid anchored at the origin.
    pub fn clamp_to(&self, width: i32, height: i32) -> GridPos {
        GridPos::new(
            self.x.clamp(0, (width - 1).max(0)),
            self.y.clamp(0, (height - 1).max(0)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manhattan() {
        let a = GridPos::new(1, 1);
        let b = GridPos::new(4, -1);
        assert_eq!(a.manhattan(&b), 5);
        assert_eq!(b.manhattan(&a), 5);
        assert_eq!(a.manhattan(&a), 0);
    }

    #[test]
    fn test_step_horizontal_first() {
        let start = GridPos::new(0, 0);
        let target = GridPos::new(2, 2);
        let s1 = start.step_toward(&target);
        assert_eq!(s1, GridPos::new(1, 0));
        let s2 = s1.step_toward(&target);
        assert_eq!(s2, GridPos::new(2, 0));
        let s3 = s2.step_toward(&target);
        assert_eq!(s3, GridPos::new(2, 1));
        let s4 = s3.step_toward(&target);
        assert_eq!(s4, target);
        assert_eq!(s4.step_toward(&target), target);
    }

    #[test]
    fn test_steps_equal_distance() {
        let mut pos = GridPos::new(5, 7);
        let target = GridPos::new(1, 3);
        let distance = pos.manhattan(&target);
        for _ in 0..distance {
            pos = pos.step_toward(&target);
        }
        assert_eq!(pos, target);
    }

    #[test]
    fn test_clamp() {
        assert_eq!(GridPos::new(-3, 12).clamp_to(10, 8), GridPos::new(0, 7));
        assert_eq!(GridPos::new(4, 4).clamp_to(10, 8), GridPos::new(4, 4));
    }
}
