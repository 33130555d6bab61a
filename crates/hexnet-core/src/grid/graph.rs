//! Static hex adjacency graph and hex/cartesian conversion.
//!
//! Addresses are `column + row * columns`. The rectangle is trimmed to a
//! hexagonal play area; trimmed addresses are permanently invalid.

use crate::components::{HexCoord, Point};
use crate::config::GridConfig;

/// Axial neighbor offsets, counter-clockwise from +q
const DIRECTIONS: [(i32, i32); 6] = [(1, 0), (1, -1), (0, -1), (-1, 0), (-1, 1), (0, 1)];

const SQRT_3: f32 = 1.732_050_8;

/// Precomputed adjacency over the valid cells of a hex grid
#[derive(Debug, Clone)]
pub struct HexGraph {
    columns: usize,
    rows: usize,
    cell_size: f32,
    coordinates: Vec<Option<HexCoord>>,
    neighbors: Vec<Vec<usize>>,
}

impl HexGraph {
    pub fn new(config: &GridConfig) -> Self {
        let columns = config.columns;
        let rows = config.rows;
        let half = (columns / 2) as i32;
        let upper = columns as i32 + half;

        let coordinates: Vec<Option<HexCoord>> = (0..columns * rows)
            .map(|index| {
                let q = (index % columns) as i32;
                let r = (index / columns) as i32;
                let sum = q + r;
                (sum >= half && sum < upper).then(|| HexCoord::new(q, r))
            })
            .collect();

        let neighbors = coordinates
            .iter()
            .map(|coord| {
                let Some(coord) = coord else { return Vec::new() };
                DIRECTIONS
                    .iter()
                    .filter_map(|(dq, dr)| {
                        Self::address(columns, rows, HexCoord::new(coord.q + dq, coord.r + dr))
                    })
                    .filter(|&neighbor| coordinates[neighbor].is_some())
                    .collect()
            })
            .collect();

        Self {
            columns,
            rows,
            cell_size: config.cell_size,
            coordinates,
            neighbors,
        }
    }

    fn address(columns: usize, rows: usize, coord: HexCoord) -> Option<usize> {
        if coord.q < 0 || coord.r < 0 || coord.q as usize >= columns || coord.r as usize >= rows {
            return None;
        }
        Some(coord.q as usize + coord.r as usize * columns)
    }

    /// Total addresses, valid or not
    pub fn len(&self) -> usize {
        self.coordinates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coordinates.is_empty()
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn is_valid(&self, index: usize) -> bool {
        matches!(self.coordinates.get(index), Some(Some(_)))
    }

    pub fn coord(&self, index: usize) -> Option<HexCoord> {
        self.coordinates.get(index).copied().flatten()
    }

    /// Address of a coordinate, `None` when out of bounds or trimmed
    pub fn index(&self, coord: HexCoord) -> Option<usize> {
        Self::address(self.columns, self.rows, coord).filter(|&index| self.is_valid(index))
    }

    /// Up to six valid neighbors, in direction order
    pub fn neighbors(&self, index: usize) -> &[usize] {
        self.neighbors.get(index).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All valid addresses in ascending order
    pub fn valid_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.coordinates
            .iter()
            .enumerate()
            .filter_map(|(index, coord)| coord.map(|_| index))
    }

    /// Flat-top hex center in world units
    pub fn hex_to_cartesian(&self, coord: HexCoord) -> Point {
        let q = coord.q as f32;
        let r = coord.r as f32;
        Point::new(
            self.cell_size * (1.5 * q),
            self.cell_size * (SQRT_3 / 2.0 * q + SQRT_3 * r),
        )
    }

    /// Nearest hex coordinate to a world point (may lie outside the grid)
    pub fn cartesian_to_hex(&self, point: Point) -> HexCoord {
        let q = (2.0 / 3.0 * point.x) / self.cell_size;
        let r = (-1.0 / 3.0 * point.x + SQRT_3 / 3.0 * point.y) / self.cell_size;
        round_axial(q, r)
    }

    /// Valid address under a world point
    pub fn index_at(&self, point: Point) -> Option<usize> {
        self.index(self.cartesian_to_hex(point))
    }

    pub fn center(&self, index: usize) -> Option<Point> {
        self.coord(index).map(|coord| self.hex_to_cartesian(coord))
    }
}

/// Half-up rounding, so ties resolve the same way on both sides of zero
fn round_half_up(value: f32) -> f32 {
    (value + 0.5).floor()
}

/// Round fractional axial coordinates to a hex. The axis with the larger
/// squared fractional offset is snapped using the other axis as a correction.
pub fn round_axial(q: f32, r: f32) -> HexCoord {
    let q_grid = round_half_up(q);
    let r_grid = round_half_up(r);
    let dq = q - q_grid;
    let dr = r - r_grid;
    if dq * dq >= dr * dr {
        HexCoord::new(
            (q_grid + round_half_up(dq + 0.5 * dr)) as i32,
            r_grid as i32,
        )
    } else {
        HexCoord::new(
            q_grid as i32,
            (r_grid + round_half_up(dr + 0.5 * dq)) as i32,
        )
    }
}
