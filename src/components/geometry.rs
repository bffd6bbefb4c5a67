use geo::{BoundingRect, Geometry, MultiPolygon, Point, Polygon, Rect};
use log::warn;

fn cell_square(point: &Point, half_side: f64) -> Polygon {
    let (x, y) = point.x_y();
    Rect::new((x - half_side, y - half_side), (x + half_side, y + half_side)).to_polygon()
}

/// Turns points into cell sized squares centered on them.
///
/// Points have no area, so area based rasterization would never select
/// a cell for them. Every other geometry type is returned untouched.
pub fn normalize(geometry: Geometry, cell_size: f64) -> Geometry {
    let half_side = cell_size.abs() / 2.;
    match geometry {
        Geometry::Point(point) => {
            warn!("point geometry used as zone, point_query may be a better fit");
            Geometry::Polygon(cell_square(&point, half_side))
        }
        Geometry::MultiPoint(points) => {
            warn!("multipoint geometry used as zone, point_query may be a better fit");
            Geometry::MultiPolygon(MultiPolygon::new(
                points
                    .iter()
                    .map(|point| cell_square(point, half_side))
                    .collect(),
            ))
        }
        other => other,
    }
}

/// Bounding box of a geometry, `None` for empty geometries.
pub fn bounds(geometry: &Geometry) -> Option<Rect> {
    geometry.bounding_rect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{line_string, point, polygon, MultiPoint};

    #[test]
    fn point_becomes_cell_square() {
        let geometry = normalize(Geometry::Point(point!(x: 1.5, y: 1.5)), -1.);
        let Geometry::Polygon(polygon) = geometry else {
            panic!("expected polygon, got {geometry:?}")
        };
        let rect = polygon.bounding_rect().unwrap();
        assert_eq!(rect.min().x_y(), (1., 1.));
        assert_eq!(rect.max().x_y(), (2., 2.));
    }

    #[test]
    fn multipoint_becomes_multipolygon() {
        let points = MultiPoint::from(vec![(0.5, 0.5), (2.5, 2.5)]);
        let geometry = normalize(Geometry::MultiPoint(points), 1.);
        let Geometry::MultiPolygon(polygons) = &geometry else {
            panic!("expected multipolygon, got {geometry:?}")
        };
        assert_eq!(polygons.0.len(), 2);
        let rect = bounds(&geometry).unwrap();
        assert_eq!(rect.min().x_y(), (0., 0.));
        assert_eq!(rect.max().x_y(), (3., 3.));
    }

    #[test]
    fn other_geometries_pass_through() {
        let polygon: Geometry = polygon![(x: 0., y: 0.), (x: 1., y: 0.), (x: 1., y: 1.)].into();
        assert_eq!(normalize(polygon.clone(), 1.), polygon);
        let line: Geometry = line_string![(x: 0., y: 0.), (x: 2., y: 2.)].into();
        assert_eq!(normalize(line.clone(), 1.), line);
    }
}
