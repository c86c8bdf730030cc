use std::fmt::Debug;
use std::sync::Arc;

use rand::RngCore;

use super::{GeometryError, Point, Polygon, ZoneError};

pub const DEFAULT_ZONE_ATTEMPTS: usize = 1_000;

/// Capability shared by inclusive and exclusive zones.
pub trait ZoneChecker: Debug + Send + Sync {
    fn contains(&self, point: &Point) -> bool;

    /// `true` for an allowed zone, `false` for a disallowed one.
    fn admits(&self) -> bool;

    fn random_point(&self, rng: &mut dyn RngCore) -> Result<Point, GeometryError>;
}

impl ZoneChecker for Polygon {
    fn contains(&self, point: &Point) -> bool {
        Polygon::contains(self, point)
    }

    fn admits(&self) -> bool {
        Polygon::admits(self)
    }

    fn random_point(&self, rng: &mut dyn RngCore) -> Result<Point, GeometryError> {
        Polygon::random_point(self, rng)
    }
}

/// One allowed zone with any number of disallowed zones carved out of it.
#[derive(Debug, Clone)]
pub struct ZoneComposer {
    allowed: Arc<dyn ZoneChecker>,
    disallowed: Vec<Arc<dyn ZoneChecker>>,
    max_attempts: usize,
}

impl ZoneComposer {
    pub fn new(
        allowed: Arc<dyn ZoneChecker>,
        disallowed: Vec<Arc<dyn ZoneChecker>>,
    ) -> Result<Self, ZoneError> {
        if !allowed.admits() {
            return Err(ZoneError::AllowedZoneExcludes);
        }
        if let Some(index) = disallowed.iter().position(|zone| zone.admits()) {
            return Err(ZoneError::DisallowedZoneAdmits { index });
        }

        Ok(Self {
            allowed,
            disallowed,
            max_attempts: DEFAULT_ZONE_ATTEMPTS,
        })
    }

    pub fn from_polygons(allowed: Polygon, disallowed: Vec<Polygon>) -> Result<Self, ZoneError> {
        Self::new(
            Arc::new(allowed),
            disallowed
                .into_iter()
                .map(|zone| Arc::new(zone) as Arc<dyn ZoneChecker>)
                .collect(),
        )
    }

    /// Overrides the outer draw budget of [`ZoneComposer::random_admissible_point`].
    /// Each outer draw is itself bounded by the allowed zone's own sampling budget.
    pub fn with_max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn disallowed_count(&self) -> usize {
        self.disallowed.len()
    }

    pub fn is_admissible(&self, point: &Point) -> bool {
        self.allowed.contains(point) && !self.disallowed.iter().any(|zone| zone.contains(point))
    }

    pub fn random_admissible_point(&self) -> Result<Point, ZoneError> {
        let mut rng = rand::thread_rng();
        self.random_admissible_point_with(&mut rng)
    }

    pub fn random_admissible_point_with(&self, rng: &mut dyn RngCore) -> Result<Point, ZoneError> {
        for _ in 0..self.max_attempts {
            let candidate = self.allowed.random_point(rng)?;
            if self.is_admissible(&candidate) {
                return Ok(candidate);
            }
        }

        Err(ZoneError::NoAdmissiblePoint {
            attempts: self.max_attempts,
        })
    }
}
