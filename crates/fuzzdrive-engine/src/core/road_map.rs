use std::fmt;

use serde::{Deserialize, Serialize};

use super::geometry::Point;
use crate::RoadMapError;

/// Sample spacing of [`RoadMap::first_blocked_on_segment`], in cells.
pub const SEGMENT_SAMPLE_STEP: f32 = 0.25;

/// Occupancy grid separating drivable road from everything else.
///
/// Cells are stored row-major; `true` marks a drivable cell. A world point `(x, y)` maps
/// to cell `(floor(x), floor(y))`, and every point outside the grid is non-drivable, so
/// the map needs no explicit border.
///
/// A road map is immutable once built. Evaluations share it by reference.
///
/// # Text form
///
/// [`RoadMap::parse`] and the [`Display`](fmt::Display) implementation use one line per
/// row, `.` for drivable cells and `#` for blocked cells:
///
/// ```
/// use fuzzdrive_engine::RoadMap;
///
/// let map = RoadMap::parse("#####\n#...#\n#####").unwrap();
/// assert_eq!(map.width(), 5);
/// assert_eq!(map.height(), 3);
/// assert_eq!(map.drivable_count(), 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RoadMapRepr", into = "RoadMapRepr")]
pub struct RoadMap {
    width: usize,
    height: usize,
    cells: Vec<bool>,
}

impl RoadMap {
    pub const DRIVABLE_CHAR: char = '.';
    pub const BLOCKED_CHAR: char = '#';

    /// Builds a road map from row-major cells.
    pub fn from_cells(width: usize, height: usize, cells: Vec<bool>) -> Result<Self, RoadMapError> {
        if width == 0 || height == 0 {
            return Err(RoadMapError::EmptyMap);
        }
        let expected = width
            .checked_mul(height)
            .ok_or(RoadMapError::EmptyMap)?;
        if cells.len() != expected {
            return Err(RoadMapError::CellCountMismatch {
                expected,
                actual: cells.len(),
            });
        }
        Ok(Self {
            width,
            height,
            cells,
        })
    }

    /// Builds a fully blocked map, a starting point for rasterisation.
    pub fn blocked(width: usize, height: usize) -> Result<Self, RoadMapError> {
        Self::from_cells(width, height, vec![false; width * height])
    }

    /// Parses the text form. Leading and trailing blank lines are ignored; spaces count
    /// as blocked cells.
    pub fn parse(text: &str) -> Result<Self, RoadMapError> {
        let lines = text
            .lines()
            .map(|l| l.trim_end_matches('\r'))
            .skip_while(|l| l.trim().is_empty())
            .collect::<Vec<_>>();
        let lines = match lines.iter().rposition(|l| !l.trim().is_empty()) {
            Some(last) => &lines[..=last],
            None => return Err(RoadMapError::EmptyMap),
        };

        let width = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
        let mut cells = Vec::with_capacity(width * lines.len());
        for (row, line) in lines.iter().enumerate() {
            let mut count = 0;
            for (column, ch) in line.chars().enumerate() {
                let drivable = match ch {
                    Self::DRIVABLE_CHAR => true,
                    Self::BLOCKED_CHAR | ' ' => false,
                    _ => return Err(RoadMapError::InvalidCell { row, column, ch }),
                };
                cells.push(drivable);
                count += 1;
            }
            if count != width {
                return Err(RoadMapError::RaggedRow {
                    row,
                    expected: width,
                    actual: count,
                });
            }
        }
        Self::from_cells(width, lines.len(), cells)
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns whether the cell at `(column, row)` is drivable. Out-of-range cells are not.
    #[must_use]
    pub fn is_drivable_cell(&self, column: usize, row: usize) -> bool {
        column < self.width && row < self.height && self.cells[row * self.width + column]
    }

    /// Returns whether the world point lies on a drivable cell.
    ///
    /// Non-finite and negative coordinates are off the map and therefore not drivable.
    #[must_use]
    pub fn is_drivable(&self, point: Point) -> bool {
        match Self::cell_of(point) {
            Some((column, row)) => self.is_drivable_cell(column, row),
            None => false,
        }
    }

    /// Cell containing a world point, if the point is finite and non-negative.
    #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    #[must_use]
    pub fn cell_of(point: Point) -> Option<(usize, usize)> {
        if !point.is_finite() || point.x < 0.0 || point.y < 0.0 {
            return None;
        }
        Some((point.x.floor() as usize, point.y.floor() as usize))
    }

    /// First non-drivable point met moving straight from `from` to `to`.
    ///
    /// The segment is sampled every [`SEGMENT_SAMPLE_STEP`] units and always at `to`, so a
    /// wall one cell thick cannot be stepped over. `from` itself is not tested.
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn first_blocked_on_segment(&self, from: Point, to: Point) -> Option<Point> {
        let length = from.distance(to);
        if !length.is_finite() {
            return (!self.is_drivable(to)).then_some(to);
        }
        let samples = ((length / SEGMENT_SAMPLE_STEP).ceil() as usize).max(1);
        (1..=samples)
            .map(|i| from.lerp(to, i as f32 / samples as f32))
            .find(|point| !self.is_drivable(*point))
    }

    /// Number of drivable cells.
    #[must_use]
    pub fn drivable_count(&self) -> usize {
        self.cells.iter().filter(|c| **c).count()
    }

    pub(crate) fn set_cell(&mut self, column: usize, row: usize, drivable: bool) {
        self.cells[row * self.width + column] = drivable;
    }

    /// Iterates rows as slices of cells.
    pub fn rows(&self) -> impl Iterator<Item = &[bool]> {
        self.cells.chunks(self.width)
    }
}

impl fmt::Display for RoadMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, row) in self.rows().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            for drivable in row {
                let ch = if *drivable {
                    Self::DRIVABLE_CHAR
                } else {
                    Self::BLOCKED_CHAR
                };
                write!(f, "{ch}")?;
            }
        }
        Ok(())
    }
}

/// Serialized form: the text rows, one string per row.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RoadMapRepr {
    rows: Vec<String>,
}

impl TryFrom<RoadMapRepr> for RoadMap {
    type Error = RoadMapError;

    fn try_from(repr: RoadMapRepr) -> Result<Self, Self::Error> {
        Self::parse(&repr.rows.join("\n"))
    }
}

impl From<RoadMap> for RoadMapRepr {
    fn from(map: RoadMap) -> Self {
        Self {
            rows: map.to_string().lines().map(str::to_owned).collect(),
        }
    }
}
