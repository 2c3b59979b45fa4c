//! # Semi-global cost aggregation
//!
//! This module aggregates a cost volume along four path directions in each of two sweeps over
//! the image, top-left to bottom-right and then bottom-right to top-left, which together cover
//! eight directions. Along every path `r` the aggregated cost is
//!
//! ```text
//! L_r(p, d) = C(p, d) + min(L_r(p - r, d),
//!                           L_r(p - r, d - 1) + P1,
//!                           L_r(p - r, d + 1) + P1,
//!                           min_k L_r(p - r, k) + P2) - min_k L_r(p - r, k)
//! ```
//!
//! Subtracting the predecessor minimum keeps `L_r` below `C_max + P2` however long the path is.
//! Only the current and previous row of each path are kept, so path state is `O(width * range)`.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use crate::cost::CostVolume;
use crate::error::*;

// -----------------------------------------------------------------------------------------------
// CONSTANTS
// -----------------------------------------------------------------------------------------------

/// Number of paths aggregated in one sweep.
pub const NUM_PATHS: usize = 4;

/// Number of sweeps over the image.
pub const NUM_PASSES: usize = 2;

const DIRECTIONS: [Direction; NUM_PATHS] = [
    Direction::Horizontal,
    Direction::UpperLeft,
    Direction::Upper,
    Direction::UpperRight
];

// -----------------------------------------------------------------------------------------------
// ENUMERATIONS
// -----------------------------------------------------------------------------------------------

/// Path directions relative to the sweep order. In the reverse sweep "upper" is the row below
/// and "left" is the column to the right.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Horizontal,
    UpperLeft,
    Upper,
    UpperRight
}

/// Where the predecessor of a pixel along a path is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Predecessor {
    /// First pixel of the path.
    None,

    /// Column of the current row, already computed in this row.
    SameRow(usize),

    /// Column of the previously swept row.
    PreviousRow(usize)
}

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

/// Sum of all path costs, laid out like the cost volume it was aggregated from.
#[derive(Debug, Clone, PartialEq)]
pub struct SummedCost {
    height: usize,
    width: usize,
    range: usize,
    data: Vec<f32>
}

/// Runs the two aggregation sweeps over cost volumes of one width and disparity range.
///
/// The path buffers are reused between rows, so one aggregator must not be shared between
/// concurrent computations.
pub struct PathAggregator {
    width: usize,
    range: usize,
    p1: f32,
    p2: f32,
    paths: [PathBuffers; NUM_PATHS]
}

/// Double-buffered row state of a single path.
struct PathBuffers {
    /// Aggregated costs, `width * range` values per row.
    rows: [Vec<f32>; 2],

    /// Minimum over all disparities of each column in `rows`.
    mins: [Vec<f32>; 2],

    /// Index of the row being written, the other one holds the previous row.
    current: usize
}

/// Maps sweep order onto image coordinates.
#[derive(Debug, Clone, Copy)]
struct Sweep {
    forward: bool,
    width: usize,
    height: usize
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl SummedCost {
    fn zeros(height: usize, width: usize, range: usize) -> Self {
        Self {
            height,
            width,
            range,
            data: vec![0.0; height * width * range]
        }
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn range(&self) -> usize {
        self.range
    }

    /// Summed costs of row `y`, `width * range` values.
    pub fn row(&self, y: usize) -> &[f32] {
        let stride = self.width * self.range;
        &self.data[y * stride..(y + 1) * stride]
    }

    fn row_mut(&mut self, y: usize) -> &mut [f32] {
        let stride = self.width * self.range;
        &mut self.data[y * stride..(y + 1) * stride]
    }

    /// Summed costs of every disparity at pixel `(x, y)`.
    pub fn pixel(&self, x: usize, y: usize) -> &[f32] {
        let start = (y * self.width + x) * self.range;
        &self.data[start..start + self.range]
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }
}

impl PathAggregator {
    /// Allocate path buffers for images `width` pixels wide with `range` disparities.
    pub fn new(width: usize, range: usize, p1: f32, p2: f32) -> Self {
        Self {
            width,
            range,
            p1,
            p2,
            paths: [
                PathBuffers::new(width, range),
                PathBuffers::new(width, range),
                PathBuffers::new(width, range),
                PathBuffers::new(width, range)
            ]
        }
    }

    /// Sum the costs of all paths of both sweeps over `cost`.
    pub fn aggregate(&mut self, cost: &CostVolume) -> Result<SummedCost> {
        if cost.width() != self.width || cost.range() != self.range {
            return Err(Error::InvalidParameter(format!(
                "aggregator sized for width {} and range {} cannot aggregate a {}x{} volume",
                self.width,
                self.range,
                cost.width(),
                cost.range()
            )));
        }

        let (height, width, range) = (cost.height(), self.width, self.range);
        let mut sum = SummedCost::zeros(height, width, range);
        if sum.data.is_empty() {
            return Ok(sum);
        }

        for pass in 0..NUM_PASSES {
            let sweep = Sweep {
                forward: pass == 0,
                width,
                height
            };

            for j in 0..height {
                let y = sweep.y(j);
                let cost_row = cost.row(y);
                let sum_row = sum.row_mut(y);

                for i in 0..width {
                    let x = sweep.x(i);
                    let pixel_cost = &cost_row[x * range..(x + 1) * range];
                    let pixel_sum = &mut sum_row[x * range..(x + 1) * range];

                    for (dir, path) in DIRECTIONS.iter().zip(self.paths.iter_mut()) {
                        let pred = dir.predecessor(&sweep, i, j);
                        path.step(x, pred, pixel_cost, self.p1, self.p2);

                        for (s, l) in pixel_sum.iter_mut().zip(path.current(x, range)) {
                            *s += *l;
                        }
                    }
                }

                for path in self.paths.iter_mut() {
                    path.rotate();
                }
            }
        }

        Ok(sum)
    }
}

impl PathBuffers {
    fn new(width: usize, range: usize) -> Self {
        Self {
            rows: [vec![0.0; width * range], vec![0.0; width * range]],
            mins: [vec![f32::MAX; width], vec![f32::MAX; width]],
            current: 0
        }
    }

    /// Swap the roles of the current and previous row.
    fn rotate(&mut self) {
        self.current ^= 1;
    }

    /// Aggregated costs of column `x` in the current row.
    fn current(&self, x: usize, range: usize) -> &[f32] {
        &self.rows[self.current][x * range..(x + 1) * range]
    }

    /// Compute column `x` of the current row from its predecessor.
    fn step(&mut self, x: usize, pred: Predecessor, cost: &[f32], p1: f32, p2: f32) {
        let range = cost.len();

        let (rows_lo, rows_hi) = self.rows.split_at_mut(1);
        let (mins_lo, mins_hi) = self.mins.split_at_mut(1);
        let (curr, prev, curr_min, prev_min) = if self.current == 0 {
            (&mut rows_lo[0], &rows_hi[0], &mut mins_lo[0], &mins_hi[0])
        }
        else {
            (&mut rows_hi[0], &rows_lo[0], &mut mins_hi[0], &mins_lo[0])
        };

        let min = match pred {
            Predecessor::None => {
                recurrence(cost, None, p1, p2, &mut curr[x * range..(x + 1) * range])
            },
            Predecessor::PreviousRow(px) => recurrence(
                cost,
                Some((&prev[px * range..(px + 1) * range], prev_min[px])),
                p1,
                p2,
                &mut curr[x * range..(x + 1) * range]
            ),
            Predecessor::SameRow(px) => {
                let pred_min = curr_min[px];
                if px < x {
                    let (head, tail) = curr.split_at_mut(x * range);
                    recurrence(
                        cost,
                        Some((&head[px * range..(px + 1) * range], pred_min)),
                        p1,
                        p2,
                        &mut tail[..range]
                    )
                }
                else {
                    let (head, tail) = curr.split_at_mut(px * range);
                    recurrence(
                        cost,
                        Some((&tail[..range], pred_min)),
                        p1,
                        p2,
                        &mut head[x * range..(x + 1) * range]
                    )
                }
            }
        };

        curr_min[x] = min;
    }
}

impl Direction {
    /// Predecessor of the pixel at sweep position `(i, j)` along this direction.
    fn predecessor(self, sweep: &Sweep, i: usize, j: usize) -> Predecessor {
        let first_col = i == 0;
        let last_col = i + 1 == sweep.width;
        let first_row = j == 0;

        match self {
            Direction::Horizontal if !first_col => Predecessor::SameRow(sweep.x(i - 1)),
            Direction::UpperLeft if !first_row && !first_col => {
                Predecessor::PreviousRow(sweep.x(i - 1))
            },
            Direction::Upper if !first_row => Predecessor::PreviousRow(sweep.x(i)),
            Direction::UpperRight if !first_row && !last_col => {
                Predecessor::PreviousRow(sweep.x(i + 1))
            },
            _ => Predecessor::None
        }
    }
}

impl Sweep {
    fn x(&self, i: usize) -> usize {
        if self.forward {
            i
        }
        else {
            self.width - 1 - i
        }
    }

    fn y(&self, j: usize) -> usize {
        if self.forward {
            j
        }
        else {
            self.height - 1 - j
        }
    }
}

/// Evaluate the path recurrence for one pixel into `out`, returning the minimum written.
///
/// Without a predecessor the path starts here and `out` is the matching cost itself.
fn recurrence(
    cost: &[f32],
    pred: Option<(&[f32], f32)>,
    p1: f32,
    p2: f32,
    out: &mut [f32]
) -> f32 {
    let (prev, prev_min) = match pred {
        Some(p) => p,
        None => {
            out.copy_from_slice(cost);
            return cost.iter().copied().fold(f32::MAX, f32::min);
        }
    };

    let n = cost.len();
    let jump = prev_min + p2;
    let mut min = f32::MAX;

    for d in 0..n {
        let mut best = jump.min(prev[d]);
        if d > 0 {
            best = best.min(prev[d - 1] + p1);
        }
        if d + 1 < n {
            best = best.min(prev[d + 1] + p1);
        }

        let l = cost[d] + (best - prev_min);
        debug_assert!(l.is_finite(), "aggregated cost is not finite at disparity {}", d);

        out[d] = l;
        min = min.min(l);
    }

    min
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------
