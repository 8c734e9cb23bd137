//! Axial Hex Coordinates
//!
//! All tile positions use axial `(q, r)` addressing. The map is a cylinder:
//! neighbor lookups wrap in both axes when dimensions are supplied.

use serde::{Deserialize, Serialize};

/// Axial hex coordinate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HexCoord {
    /// Column coordinate.
    pub q: i32,
    /// Row coordinate.
    pub r: i32,
}

impl HexCoord {
    /// Create a coordinate.
    pub const fn new(q: i32, r: i32) -> Self {
        Self { q, r }
    }

    /// Component-wise sum.
    pub const fn add(self, other: HexCoord) -> HexCoord {
        HexCoord::new(self.q + other.q, self.r + other.r)
    }

    /// Stable tile id for this coordinate (`"q,r"`).
    pub fn tile_id(self) -> String {
        format!("{},{}", self.q, self.r)
    }
}

/// The six hex directions in fixed order (order matters for determinism).
pub const HEX_DIRECTIONS: [HexCoord; 6] = [
    HexCoord::new(1, 0),
    HexCoord::new(1, -1),
    HexCoord::new(0, -1),
    HexCoord::new(-1, 0),
    HexCoord::new(-1, 1),
    HexCoord::new(0, 1),
];

/// The six neighbors of a coordinate, wrapping cylindrically when map
/// dimensions are given.
pub fn neighbors(c: HexCoord, width: Option<u32>, height: Option<u32>) -> [HexCoord; 6] {
    HEX_DIRECTIONS.map(|d| {
        let mut q = c.q + d.q;
        let mut r = c.r + d.r;
        if let Some(w) = width {
            let w = w as i32;
            q = q.rem_euclid(w);
        }
        if let Some(h) = height {
            let h = h as i32;
            r = r.rem_euclid(h);
        }
        HexCoord::new(q, r)
    })
}

/// Hex distance between two axial coordinates.
pub fn distance(a: HexCoord, b: HexCoord) -> u32 {
    let dq = (a.q - b.q).abs();
    let dr = (a.r - b.r).abs();
    let ds = (a.q + a.r - b.q - b.r).abs();
    ((dq + dr + ds) / 2) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neighbors_unwrapped() {
        let n = neighbors(HexCoord::new(2, 3), None, None);
        assert_eq!(n[0], HexCoord::new(3, 3));
        assert_eq!(n[2], HexCoord::new(2, 2));
        assert_eq!(n[4], HexCoord::new(1, 4));
    }

    #[test]
    fn test_neighbors_wrap_cylindrically() {
        let n = neighbors(HexCoord::new(0, 0), Some(10), Some(8));
        // (-1, 0) wraps to (9, 0), (0, -1) wraps to (0, 7)
        assert!(n.contains(&HexCoord::new(9, 0)));
        assert!(n.contains(&HexCoord::new(0, 7)));
    }

    #[test]
    fn test_distance() {
        let origin = HexCoord::new(0, 0);
        assert_eq!(distance(origin, origin), 0);
        assert_eq!(distance(origin, HexCoord::new(3, 0)), 3);
        assert_eq!(distance(origin, HexCoord::new(2, -1)), 2);
        // Moving along +q then +r is not a straight line in hex space.
        assert_eq!(distance(origin, HexCoord::new(2, 2)), 4);
    }

    #[test]
    fn test_tile_id() {
        assert_eq!(HexCoord::new(4, 7).tile_id(), "4,7");
        assert_eq!(HexCoord::new(-1, 0).tile_id(), "-1,0");
    }
}
