//! Grouping of mutually exclusive measurements.
//!
//! A group collects measurements that share one surface and readout
//! plane; at most one of them can belong to a given track. Groups carry
//! an optional path-distance key so the fit can visit them in order
//! along the trajectory.

use std::cmp::Ordering;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::hit::KHit;
use crate::surface::SharedSurface;

/// Measurements sharing one surface and plane.
pub struct KHitGroup {
    surface: SharedSurface,
    plane: usize,
    hits: Vec<Arc<dyn KHit>>,
    path: Option<f64>,
}

impl KHitGroup {
    /// Empty group on a surface and plane.
    #[must_use]
    pub fn new(surface: SharedSurface, plane: usize) -> Self {
        Self {
            surface,
            plane,
            hits: Vec::new(),
            path: None,
        }
    }

    /// Group seeded from its first measurement.
    #[must_use]
    pub fn from_hit(hit: Arc<dyn KHit>) -> Self {
        let surface = Arc::clone(hit.surface());
        let plane = hit.plane();
        Self {
            surface,
            plane,
            hits: vec![hit],
            path: None,
        }
    }

    /// Adds a measurement, preserving insertion order.
    ///
    /// # Errors
    ///
    /// [`Error::SurfaceMismatch`] if the measurement lives on a
    /// different surface or plane.
    pub fn add_hit(&mut self, hit: Arc<dyn KHit>) -> Result<()> {
        if hit.plane() != self.plane {
            return Err(Error::SurfaceMismatch("group plane mismatch"));
        }
        if !hit.surface().is_equal(&self.surface) {
            return Err(Error::SurfaceMismatch("group surface mismatch"));
        }
        self.hits.push(hit);
        Ok(())
    }

    #[must_use]
    pub fn surface(&self) -> &SharedSurface {
        &self.surface
    }

    #[must_use]
    pub fn plane(&self) -> usize {
        self.plane
    }

    /// Measurements in insertion order.
    #[must_use]
    pub fn hits(&self) -> &[Arc<dyn KHit>] {
        &self.hits
    }

    /// Path-distance ordering key, if assigned.
    #[must_use]
    pub fn path(&self) -> Option<f64> {
        self.path
    }

    pub fn set_path(&mut self, path: f64) {
        self.path = Some(path);
    }

    /// Orders groups by path key; unkeyed groups sort last.
    #[must_use]
    pub fn cmp_by_path(&self, other: &Self) -> Ordering {
        match (self.path, other.path) {
            (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use crate::surface::{SharedSurface, Surface};

    struct StubHit {
        surface: SharedSurface,
        plane: usize,
        id: usize,
        cache: Mutex<std::sync::Weak<Surface>>,
    }

    impl StubHit {
        fn new(surface: SharedSurface, plane: usize, id: usize) -> Arc<dyn KHit> {
            Arc::new(Self {
                surface,
                plane,
                id,
                cache: Mutex::new(std::sync::Weak::new()),
            })
        }
    }

    impl KHit for StubHit {
        fn surface(&self) -> &SharedSurface {
            &self.surface
        }
        fn plane(&self) -> usize {
            self.plane
        }
        fn id(&self) -> usize {
            self.id
        }
        fn value(&self) -> f64 {
            0.0
        }
        fn variance(&self) -> f64 {
            1.0
        }
        fn cache_prediction_surface(&self, surface: &SharedSurface) {
            *self.cache.lock().unwrap() = Arc::downgrade(surface);
        }
        fn prediction_surface(&self) -> Option<SharedSurface> {
            self.cache.lock().unwrap().upgrade()
        }
    }

    #[test]
    fn test_insertion_order_preserved() {
        let surface = Surface::yz_plane(0.0, 0.0, 0.0, 0.0);
        let mut group = KHitGroup::new(Arc::clone(&surface), 2);
        for id in [5, 1, 9] {
            group
                .add_hit(StubHit::new(Arc::clone(&surface), 2, id))
                .unwrap();
        }
        let ids: Vec<usize> = group.hits().iter().map(|h| h.id()).collect();
        assert_eq!(ids, vec![5, 1, 9]);
    }

    #[test]
    fn test_mismatched_hits_rejected() {
        let surface = Surface::yz_plane(0.0, 0.0, 0.0, 0.0);
        let other = Surface::yz_plane(0.0, 0.0, 4.0, 0.0);
        let mut group = KHitGroup::new(Arc::clone(&surface), 2);
        assert!(group.add_hit(StubHit::new(other, 2, 1)).is_err());
        assert!(group.add_hit(StubHit::new(Arc::clone(&surface), 1, 2)).is_err());
        assert!(group.add_hit(StubHit::new(surface, 2, 3)).is_ok());
    }

    #[test]
    fn test_path_ordering_unkeyed_last() {
        let surface = Surface::yz_plane(0.0, 0.0, 0.0, 0.0);
        let mut near = KHitGroup::new(Arc::clone(&surface), 0);
        near.set_path(1.0);
        let mut far = KHitGroup::new(Arc::clone(&surface), 0);
        far.set_path(7.0);
        let unkeyed = KHitGroup::new(surface, 0);
        assert_eq!(near.cmp_by_path(&far), Ordering::Less);
        assert_eq!(far.cmp_by_path(&near), Ordering::Greater);
        assert_eq!(near.cmp_by_path(&unkeyed), Ordering::Less);
        assert_eq!(unkeyed.cmp_by_path(&near), Ordering::Greater);
    }
}
