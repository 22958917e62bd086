//! Soil property resolver
//!
//! Maps a coordinate pair or a named region to a `SoilSample` by querying
//! the reference soil catalog. Within `nearest_radius_km` of a reference
//! point the sample is that point's measurements (provenance `Measured`);
//! beyond that, inverse-distance-weighted interpolation over the k nearest
//! points (provenance `Interpolated`). Read-only against the catalog.

use rustc_hash::FxHashMap;

use crate::error::{EngineError, EngineResult};
use crate::sample::{Provenance, SoilProperty, SoilSample};

const EARTH_RADIUS_KM: f64 = 6371.0;

/// One reference soil measurement site.
#[derive(Debug, Clone)]
pub struct ReferencePoint {
    pub id: String,
    /// Optional administrative region the site belongs to.
    pub region: Option<String>,
    pub lat: f64,
    pub lon: f64,
    /// Schema-ordered property values; gaps are explicit.
    pub values: [Option<f64>; SoilProperty::COUNT],
}

/// The reference soil catalog, loaded once at startup and immutable for the
/// process lifetime.
#[derive(Debug)]
pub struct SoilCatalog {
    points: Vec<ReferencePoint>,
    /// Lowercased region name → indexes into `points`.
    region_index: FxHashMap<String, Vec<usize>>,
}

impl SoilCatalog {
    pub fn new(points: Vec<ReferencePoint>) -> Self {
        let mut region_index: FxHashMap<String, Vec<usize>> = FxHashMap::default();
        for (idx, point) in points.iter().enumerate() {
            if let Some(region) = &point.region {
                region_index
                    .entry(region.to_lowercase())
                    .or_default()
                    .push(idx);
            }
        }
        Self {
            points,
            region_index,
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[ReferencePoint] {
        &self.points
    }

    pub fn region_points(&self, region: &str) -> Option<Vec<&ReferencePoint>> {
        self.region_index
            .get(&region.to_lowercase())
            .map(|idxs| idxs.iter().map(|&i| &self.points[i]).collect())
    }
}

/// Resolver policy knobs; defaults match the documented engine policy.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// A reference point within this distance is used directly.
    pub nearest_radius_km: f64,
    /// Hard search limit; beyond this a location is unresolvable.
    pub max_radius_km: f64,
    /// Neighbours required for interpolation.
    pub idw_neighbors: usize,
    /// Inverse-distance weighting exponent.
    pub idw_power: f64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            nearest_radius_km: 10.0,
            max_radius_km: 50.0,
            idw_neighbors: 4,
            idw_power: 2.0,
        }
    }
}

/// Resolves locations against the reference catalog.
pub struct SoilResolver<'a> {
    catalog: &'a SoilCatalog,
    config: ResolverConfig,
}

impl<'a> SoilResolver<'a> {
    pub fn new(catalog: &'a SoilCatalog, config: ResolverConfig) -> Self {
        Self { catalog, config }
    }

    /// Resolve a coordinate pair to a soil sample.
    pub fn resolve_coordinates(&self, lat: f64, lon: f64) -> EngineResult<SoilSample> {
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            return Err(EngineError::InvalidCoordinate { lat, lon });
        }

        // Candidates inside the hard search limit, nearest first. Ties on
        // distance break by id so resolution is deterministic.
        let mut candidates: Vec<(f64, &ReferencePoint)> = self
            .catalog
            .points()
            .iter()
            .map(|p| (haversine_km(lat, lon, p.lat, p.lon), p))
            .filter(|(d, _)| *d <= self.config.max_radius_km)
            .collect();
        candidates.sort_by(|(da, pa), (db, pb)| {
            da.partial_cmp(db)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| pa.id.cmp(&pb.id))
        });

        if let Some((distance, nearest)) = candidates.first() {
            if *distance <= self.config.nearest_radius_km {
                tracing::debug!(
                    point = %nearest.id,
                    distance_km = *distance,
                    "resolved to measured reference point"
                );
                return Ok(sample_from_point(nearest, lat, lon));
            }
        }

        if candidates.len() < self.config.idw_neighbors {
            return Err(EngineError::UnresolvableLocation {
                lat,
                lon,
                needed: self.config.idw_neighbors,
                max_radius_km: self.config.max_radius_km,
            });
        }

        let neighbors = &candidates[..self.config.idw_neighbors];
        tracing::debug!(neighbors = neighbors.len(), "interpolating soil sample");
        Ok(self.interpolate(lat, lon, neighbors))
    }

    /// Resolve a named region to a soil sample.
    ///
    /// The region sample is the property-wise mean over the region's
    /// reference sites: a single site keeps provenance `Measured`, an
    /// aggregate over several sites is tagged `Interpolated`.
    pub fn resolve_region(&self, region: &str) -> EngineResult<SoilSample> {
        let points = self
            .catalog
            .region_points(region)
            .ok_or_else(|| EngineError::UnknownRegion(region.to_string()))?;

        if let [only] = points.as_slice() {
            return Ok(sample_from_point(only, only.lat, only.lon));
        }

        let lat = points.iter().map(|p| p.lat).sum::<f64>() / points.len() as f64;
        let lon = points.iter().map(|p| p.lon).sum::<f64>() / points.len() as f64;

        let mut sample = SoilSample::new(
            format!("region:{}", region.to_lowercase()),
            lat,
            lon,
            Provenance::Interpolated,
        );
        for property in SoilProperty::ALL {
            let present: Vec<f64> = points.iter().filter_map(|p| p.values[property.index()]).collect();
            if !present.is_empty() {
                sample.set(property, present.iter().sum::<f64>() / present.len() as f64);
            }
        }
        Ok(sample)
    }

    /// Inverse-distance-weighted interpolation over pre-sorted neighbours.
    ///
    /// A property missing at some neighbours is averaged over the ones that
    /// have it; missing everywhere stays an explicit gap.
    fn interpolate(&self, lat: f64, lon: f64, neighbors: &[(f64, &ReferencePoint)]) -> SoilSample {
        // A zero distance would blow up the weights; the nearest-radius
        // branch normally catches co-located queries, this is the floor for
        // a degenerate config.
        const MIN_DISTANCE_KM: f64 = 1e-6;

        let weights: Vec<f64> = neighbors
            .iter()
            .map(|(d, _)| libm::pow(d.max(MIN_DISTANCE_KM), -self.config.idw_power))
            .collect();

        let mut sample = SoilSample::new(
            format!("idw:{:.4},{:.4}", lat, lon),
            lat,
            lon,
            Provenance::Interpolated,
        );
        for property in SoilProperty::ALL {
            let mut weighted_sum = 0.0;
            let mut weight_total = 0.0;
            for ((_, point), weight) in neighbors.iter().zip(&weights) {
                if let Some(value) = point.values[property.index()] {
                    weighted_sum += weight * value;
                    weight_total += weight;
                }
            }
            if weight_total > 0.0 {
                sample.set(property, weighted_sum / weight_total);
            }
        }
        sample
    }
}

fn sample_from_point(point: &ReferencePoint, lat: f64, lon: f64) -> SoilSample {
    let mut sample = SoilSample::new(point.id.clone(), lat, lon, Provenance::Measured);
    sample.values = point.values;
    sample
}

/// Great-circle distance between two coordinates, in kilometres.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let a = libm::sin(d_phi / 2.0) * libm::sin(d_phi / 2.0)
        + libm::cos(phi1) * libm::cos(phi2) * libm::sin(d_lambda / 2.0) * libm::sin(d_lambda / 2.0);
    2.0 * EARTH_RADIUS_KM * libm::asin(libm::sqrt(a))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn point(id: &str, lat: f64, lon: f64, ph: f64) -> ReferencePoint {
        let mut values = [None; SoilProperty::COUNT];
        values[SoilProperty::Ph.index()] = Some(ph);
        values[SoilProperty::Nitrogen.index()] = Some(30.0);
        ReferencePoint {
            id: id.to_string(),
            region: Some("testland".to_string()),
            lat,
            lon,
            values,
        }
    }

    fn test_catalog() -> SoilCatalog {
        // Roughly 0.1 degree latitude ~= 11 km
        SoilCatalog::new(vec![
            point("a", 0.00, 36.00, 6.0),
            point("b", 0.10, 36.00, 6.5),
            point("c", 0.00, 36.10, 7.0),
            point("d", 0.10, 36.10, 7.5),
        ])
    }

    #[test]
    fn test_haversine_known_distance() {
        // One degree of latitude is ~111.2 km
        let d = haversine_km(0.0, 36.0, 1.0, 36.0);
        assert_relative_eq!(d, 111.2, epsilon = 0.5);
    }

    #[test]
    fn test_invalid_coordinates_rejected() {
        let catalog = test_catalog();
        let resolver = SoilResolver::new(&catalog, ResolverConfig::default());

        assert!(matches!(
            resolver.resolve_coordinates(95.0, 0.0),
            Err(EngineError::InvalidCoordinate { .. })
        ));
        assert!(matches!(
            resolver.resolve_coordinates(0.0, 200.0),
            Err(EngineError::InvalidCoordinate { .. })
        ));
    }

    #[test]
    fn test_near_point_is_measured() {
        let catalog = test_catalog();
        let resolver = SoilResolver::new(&catalog, ResolverConfig::default());

        let sample = resolver.resolve_coordinates(0.001, 36.001).unwrap();
        assert_eq!(sample.provenance, Provenance::Measured);
        assert_eq!(sample.id, "a");
        assert_eq!(sample.get(SoilProperty::Ph), Some(6.0));
    }

    #[test]
    fn test_between_points_is_interpolated() {
        let catalog = test_catalog();
        let config = ResolverConfig {
            nearest_radius_km: 2.0,
            ..ResolverConfig::default()
        };
        let resolver = SoilResolver::new(&catalog, config);

        let sample = resolver.resolve_coordinates(0.05, 36.05).unwrap();
        assert_eq!(sample.provenance, Provenance::Interpolated);
        // Equidistant from all four points: plain average of pH values
        let ph = sample.get(SoilProperty::Ph).unwrap();
        assert_relative_eq!(ph, 6.75, epsilon = 0.05);
    }

    #[test]
    fn test_far_location_is_unresolvable() {
        let catalog = test_catalog();
        let resolver = SoilResolver::new(&catalog, ResolverConfig::default());

        // ~1100 km away from the cluster
        let err = resolver.resolve_coordinates(10.0, 36.0).unwrap_err();
        assert!(matches!(err, EngineError::UnresolvableLocation { .. }));
    }

    #[test]
    fn test_too_few_neighbors_is_unresolvable() {
        // Only 2 points in the catalog but 4 neighbours required
        let catalog = SoilCatalog::new(vec![
            point("a", 0.00, 36.00, 6.0),
            point("b", 0.10, 36.00, 6.5),
        ]);
        let config = ResolverConfig {
            nearest_radius_km: 0.1,
            ..ResolverConfig::default()
        };
        let resolver = SoilResolver::new(&catalog, config);

        let err = resolver.resolve_coordinates(0.05, 36.0).unwrap_err();
        assert!(matches!(err, EngineError::UnresolvableLocation { needed: 4, .. }));
    }

    #[test]
    fn test_region_lookup() {
        let catalog = test_catalog();
        let resolver = SoilResolver::new(&catalog, ResolverConfig::default());

        let sample = resolver.resolve_region("Testland").unwrap();
        assert_eq!(sample.provenance, Provenance::Interpolated);
        assert_relative_eq!(sample.get(SoilProperty::Ph).unwrap(), 6.75, epsilon = 1e-9);

        assert!(matches!(
            resolver.resolve_region("atlantis"),
            Err(EngineError::UnknownRegion(_))
        ));
    }
}
