//! Simple polygons over lat/lng coordinates.
//!
//! A [`Polygon`] is an ordered vertex ring (the closing edge is implicit)
//! tagged with whether it admits or excludes the area it encloses. Containment
//! uses the crossing-number ray cast with longitude as x and latitude as y.
//! Random sampling draws from the bounding box and rejects points outside the
//! ring, with a bounded number of draws.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{GeometryError, Point};

pub const DEFAULT_SAMPLE_ATTEMPTS: usize = 10_000;

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl BBox {
    /// Smallest box covering every point, or `None` for an empty slice.
    pub fn from_points(points: &[Point]) -> Option<Self> {
        let first = points.first()?;
        let seed = BBox {
            min_lat: first.lat,
            max_lat: first.lat,
            min_lng: first.lng,
            max_lng: first.lng,
        };

        Some(points.iter().skip(1).fold(seed, |bbox, p| BBox {
            min_lat: bbox.min_lat.min(p.lat),
            max_lat: bbox.max_lat.max(p.lat),
            min_lng: bbox.min_lng.min(p.lng),
            max_lng: bbox.max_lng.max(p.lng),
        }))
    }

    pub fn contains(&self, point: &Point) -> bool {
        point.lat >= self.min_lat
            && point.lat <= self.max_lat
            && point.lng >= self.min_lng
            && point.lng <= self.max_lng
    }

    pub fn area(&self) -> f64 {
        (self.max_lat - self.min_lat) * (self.max_lng - self.min_lng)
    }

    /// Uniform point in `[min, max)` on both axes.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Point {
        let lat = self.min_lat + rng.gen_range(0.0..1.0) * (self.max_lat - self.min_lat);
        let lng = self.min_lng + rng.gen_range(0.0..1.0) * (self.max_lng - self.min_lng);
        Point::new(lat, lng)
    }
}

#[derive(Debug, Clone)]
pub struct Polygon {
    vertices: Vec<Point>,
    admits: bool,
    bbox: BBox,
    sample_attempts: usize,
}

impl Polygon {
    pub fn new(vertices: Vec<Point>, admits: bool) -> Result<Self, GeometryError> {
        if let Some(index) = vertices.iter().position(|p| !p.is_finite()) {
            return Err(GeometryError::NonFiniteVertex { index });
        }

        let distinct = distinct_count(&vertices);
        if distinct < 3 {
            return Err(GeometryError::TooFewVertices { count: distinct });
        }

        let bbox = BBox::from_points(&vertices).ok_or(GeometryError::TooFewVertices { count: 0 })?;
        if shoelace_area(&vertices) <= f64::EPSILON * bbox.area() {
            return Err(GeometryError::ZeroArea);
        }

        Ok(Self {
            vertices,
            admits,
            bbox,
            sample_attempts: DEFAULT_SAMPLE_ATTEMPTS,
        })
    }

    /// Inclusive polygon.
    pub fn allowed(vertices: Vec<Point>) -> Result<Self, GeometryError> {
        Self::new(vertices, true)
    }

    /// Exclusive polygon.
    pub fn disallowed(vertices: Vec<Point>) -> Result<Self, GeometryError> {
        Self::new(vertices, false)
    }

    /// Overrides the draw budget of [`Polygon::random_point`]. Zero is raised to one.
    pub fn with_sample_attempts(mut self, attempts: usize) -> Self {
        self.sample_attempts = attempts.max(1);
        self
    }

    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    pub fn bbox(&self) -> BBox {
        self.bbox
    }

    pub fn admits(&self) -> bool {
        self.admits
    }

    pub fn sample_attempts(&self) -> usize {
        self.sample_attempts
    }

    pub fn contains(&self, point: &Point) -> bool {
        if !self.bbox.contains(point) {
            return false;
        }

        let (x, y) = (point.lng, point.lat);
        let mut inside = false;
        let mut j = self.vertices.len() - 1;

        for i in 0..self.vertices.len() {
            let (xi, yi) = (self.vertices[i].lng, self.vertices[i].lat);
            let (xj, yj) = (self.vertices[j].lng, self.vertices[j].lat);

            if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
                inside = !inside;
            }
            j = i;
        }

        inside
    }

    pub fn random_point<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Point, GeometryError> {
        for _ in 0..self.sample_attempts {
            let candidate = self.bbox.sample(rng);
            if self.contains(&candidate) {
                return Ok(candidate);
            }
        }

        Err(GeometryError::SamplingExhausted {
            attempts: self.sample_attempts,
        })
    }
}

fn distinct_count(vertices: &[Point]) -> usize {
    let mut seen: Vec<Point> = Vec::with_capacity(vertices.len());
    for v in vertices {
        if !seen.contains(v) {
            seen.push(*v);
        }
    }
    seen.len()
}

fn shoelace_area(vertices: &[Point]) -> f64 {
    let n = vertices.len();
    let twice_area: f64 = (0..n)
        .map(|i| {
            let a = vertices[i];
            let b = vertices[(i + 1) % n];
            a.lng * b.lat - b.lng * a.lat
        })
        .sum();
    (twice_area / 2.0).abs()
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::{BBox, Polygon};
    use crate::geo::{GeometryError, Point};

    fn square() -> Polygon {
        Polygon::allowed(vec![
            Point::new(0.0, 0.0),
            Point::new(0.0, 10.0),
            Point::new(10.0, 10.0),
            Point::new(10.0, 0.0),
        ])
        .unwrap()
    }

    #[test]
    fn square_contains_center_but_not_outside_point() {
        let polygon = square();
        for _ in 0..100 {
            assert!(polygon.contains(&Point::new(5.0, 5.0)));
            assert!(!polygon.contains(&Point::new(15.0, 15.0)));
        }
    }

    #[test]
    fn concave_notch_is_outside() {
        // U shape open towards high latitude
        let polygon = Polygon::allowed(vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 3.0),
            Point::new(2.0, 3.0),
            Point::new(2.0, 7.0),
            Point::new(10.0, 7.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
        ])
        .unwrap();

        assert!(polygon.contains(&Point::new(1.0, 5.0)));
        assert!(polygon.contains(&Point::new(8.0, 1.5)));
        assert!(!polygon.contains(&Point::new(8.0, 5.0)));
    }

    #[test]
    fn boundary_answer_is_stable() {
        let polygon = square();
        let edge = Point::new(0.0, 5.0);
        let first = polygon.contains(&edge);
        for _ in 0..100 {
            assert_eq!(polygon.contains(&edge), first);
        }
    }

    #[test]
    fn random_points_stay_inside_square() {
        let polygon = square();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..10_000 {
            let p = polygon.random_point(&mut rng).unwrap();
            assert!((0.0..=10.0).contains(&p.lat));
            assert!((0.0..=10.0).contains(&p.lng));
            assert!(polygon.contains(&p));
        }
    }

    #[test]
    fn rejects_degenerate_vertex_sets() {
        let two = Polygon::allowed(vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(0.0, 0.0),
        ]);
        assert_eq!(two.unwrap_err(), GeometryError::TooFewVertices { count: 2 });

        let collinear = Polygon::allowed(vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(2.0, 2.0),
        ]);
        assert_eq!(collinear.unwrap_err(), GeometryError::ZeroArea);

        let nan = Polygon::allowed(vec![
            Point::new(0.0, 0.0),
            Point::new(f64::NAN, 1.0),
            Point::new(2.0, 0.0),
        ]);
        assert_eq!(nan.unwrap_err(), GeometryError::NonFiniteVertex { index: 1 });
    }

    #[test]
    fn sliver_polygon_exhausts_budget_instead_of_hanging() {
        let sliver = Polygon::allowed(vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(1e-9, 0.0),
        ])
        .unwrap()
        .with_sample_attempts(1_000);

        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(
            sliver.random_point(&mut rng),
            Err(GeometryError::SamplingExhausted { attempts: 1_000 })
        );
    }

    #[test]
    fn bbox_covers_all_vertices() {
        let bbox = BBox::from_points(square().vertices()).unwrap();
        assert_eq!(bbox.min_lat, 0.0);
        assert_eq!(bbox.max_lat, 10.0);
        assert_eq!(bbox.min_lng, 0.0);
        assert_eq!(bbox.max_lng, 10.0);
        assert!(BBox::from_points(&[]).is_none());
    }

    proptest! {
        #[test]
        fn sampled_points_are_contained(
            lat in -80.0f64..80.0,
            lng in -170.0f64..170.0,
            height in 0.001f64..5.0,
            width in 0.001f64..5.0,
            seed in any::<u64>(),
        ) {
            let triangle = Polygon::allowed(vec![
                Point::new(lat, lng),
                Point::new(lat + height, lng),
                Point::new(lat, lng + width),
            ])
            .unwrap();

            let mut rng = StdRng::seed_from_u64(seed);
            let p = triangle.random_point(&mut rng).unwrap();
            prop_assert!(triangle.contains(&p));
            prop_assert!(triangle.bbox().contains(&p));
        }
    }
}
