use super::{geometry::Point, road_map::RoadMap};
use crate::RoadMapError;

/// Rasterises road polygons into a [`RoadMap`].
///
/// Polygons are painted in order, testing each cell at its centre. Painting follows the
/// alternation used for closed tracks: the first polygon paints road, the second cuts a
/// hole into it, the third paints road again, and so on. A single open track is just one
/// polygon.
///
/// ```
/// use fuzzdrive_engine::{Point, RoadMapBuilder};
///
/// let outer = [
///     Point::new(0.0, 0.0),
///     Point::new(10.0, 0.0),
///     Point::new(10.0, 10.0),
///     Point::new(0.0, 10.0),
/// ];
/// let inner = [
///     Point::new(3.0, 3.0),
///     Point::new(7.0, 3.0),
///     Point::new(7.0, 7.0),
///     Point::new(3.0, 7.0),
/// ];
/// let map = RoadMapBuilder::new(10, 10)
///     .unwrap()
///     .alternating(&[&outer[..], &inner[..]])
///     .build();
/// assert_eq!(map.drivable_count(), 100 - 16);
/// ```
#[derive(Debug, Clone)]
pub struct RoadMapBuilder {
    map: RoadMap,
}

impl RoadMapBuilder {
    /// Starts from a fully blocked map of the given size.
    pub fn new(width: usize, height: usize) -> Result<Self, RoadMapError> {
        Ok(Self {
            map: RoadMap::blocked(width, height)?,
        })
    }

    /// Sets every cell whose centre lies inside `polygon` to `drivable`.
    #[must_use]
    #[expect(clippy::cast_precision_loss)]
    pub fn fill_polygon(mut self, polygon: &[Point], drivable: bool) -> Self {
        if polygon.len() < 3 {
            return self;
        }
        for row in 0..self.map.height() {
            for column in 0..self.map.width() {
                let center = Point::new(column as f32 + 0.5, row as f32 + 0.5);
                if contains(polygon, center) {
                    self.map.set_cell(column, row, drivable);
                }
            }
        }
        self
    }

    /// Paints polygons alternately as road and hole.
    #[must_use]
    pub fn alternating(self, polygons: &[&[Point]]) -> Self {
        polygons
            .iter()
            .enumerate()
            .fold(self, |builder, (i, polygon)| {
                builder.fill_polygon(polygon, i % 2 == 0)
            })
    }

    #[must_use]
    pub fn build(self) -> RoadMap {
        self.map
    }
}

/// Even-odd point-in-polygon test.
fn contains(polygon: &[Point], p: Point) -> bool {
    let mut inside = false;
    let mut j = polygon.len() - 1;
    for (i, a) in polygon.iter().enumerate() {
        let b = polygon[j];
        if (a.y > p.y) != (b.y > p.y) {
            let x = (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x;
            if p.x < x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}
