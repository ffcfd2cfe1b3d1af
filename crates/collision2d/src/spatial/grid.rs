//! Uniform grid (spatial hash) broadphase
//!
//! Space is cut into square cells of a fixed size. Each proxy is filed under
//! every cell its bounding box touches, and a query only compares against
//! proxies sharing a cell. Proxies spanning too many cells are kept in a
//! separate list that every query scans.

use crate::physics::broadphase::{Broadphase, BroadphaseProxy};
use crate::physics::collider::ColliderHandle;
use crate::physics::collision::{Aabb, BoundingVolume};
use slotmap::SecondaryMap;
use std::collections::{HashMap, HashSet};

/// Proxies covering more cells than this along either axis are kept out of the grid
const MAX_CELL_SPAN: i64 = 64;

type CellKey = (i64, i64);

/// Broadphase over a uniform grid, rebuilt lazily after updates
#[derive(Debug)]
pub struct UniformGridBroadphase {
    cell_size: f32,
    volumes: SecondaryMap<ColliderHandle, BoundingVolume>,
    cells: HashMap<CellKey, Vec<ColliderHandle>>,
    oversized: Vec<ColliderHandle>,
    needs_rebuild: bool,
    visited: HashSet<ColliderHandle>,
}

impl UniformGridBroadphase {
    /// Create a grid with square cells of `cell_size`
    ///
    /// Non-positive or non-finite sizes fall back to 1.
    pub fn new(cell_size: f32) -> Self {
        let cell_size = if cell_size.is_finite() && cell_size > 0.0 {
            cell_size
        } else {
            log::warn!("Invalid grid cell size {cell_size}, using 1.0");
            1.0
        };
        Self {
            cell_size,
            volumes: SecondaryMap::new(),
            cells: HashMap::new(),
            oversized: Vec::new(),
            needs_rebuild: false,
            visited: HashSet::new(),
        }
    }

    /// Cell edge length
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Number of occupied cells (after the last rebuild)
    pub fn occupied_cells(&self) -> usize {
        self.cells.len()
    }

    #[allow(clippy::cast_possible_truncation)]
    fn cell_range(&self, aabb: &Aabb) -> Option<(CellKey, CellKey)> {
        let coords = [aabb.min.x, aabb.min.y, aabb.max.x, aabb.max.y];
        if coords.iter().any(|c| !c.is_finite()) {
            return None;
        }
        let to_cell = |value: f32| (value / self.cell_size).floor() as i64;
        let min = (to_cell(aabb.min.x), to_cell(aabb.min.y));
        let max = (to_cell(aabb.max.x), to_cell(aabb.max.y));
        if max.0 - min.0 >= MAX_CELL_SPAN || max.1 - min.1 >= MAX_CELL_SPAN {
            return None;
        }
        Some((min, max))
    }

    fn rebuild(&mut self) {
        self.cells.clear();
        self.oversized.clear();
        for (handle, volume) in &self.volumes {
            match self.cell_range(&volume.aabb()) {
                Some((min, max)) => {
                    for x in min.0..=max.0 {
                        for y in min.1..=max.1 {
                            self.cells.entry((x, y)).or_default().push(handle);
                        }
                    }
                }
                None => self.oversized.push(handle),
            }
        }
        self.needs_rebuild = false;
        log::trace!(
            "Rebuilt uniform grid: {} proxies, {} cells, {} oversized",
            self.volumes.len(),
            self.cells.len(),
            self.oversized.len()
        );
    }
}

impl Broadphase for UniformGridBroadphase {
    fn name(&self) -> &'static str {
        "uniform-grid"
    }

    fn add(&mut self, proxy: &BroadphaseProxy) {
        self.volumes.insert(proxy.handle, proxy.volume);
        self.needs_rebuild = true;
    }

    fn remove(&mut self, proxy: &BroadphaseProxy) {
        if self.volumes.remove(proxy.handle).is_some() {
            self.needs_rebuild = true;
        }
    }

    fn update(&mut self, proxy: &BroadphaseProxy) {
        if let Some(volume) = self.volumes.get_mut(proxy.handle) {
            if *volume != proxy.volume {
                *volume = proxy.volume;
                self.needs_rebuild = true;
            }
        }
    }

    fn query(&mut self, proxy: &BroadphaseProxy, per_pair: &mut dyn FnMut(ColliderHandle)) {
        if self.needs_rebuild {
            self.rebuild();
        }
        self.visited.clear();
        let range = self.cell_range(&proxy.volume.aabb());

        let Self {
            volumes,
            cells,
            oversized,
            visited,
            ..
        } = self;
        let mut visit = |other: ColliderHandle| {
            if other == proxy.handle || !visited.insert(other) {
                return;
            }
            if volumes
                .get(other)
                .is_some_and(|volume| proxy.volume.intersects(volume))
            {
                per_pair(other);
            }
        };

        match range {
            Some((min, max)) => {
                for x in min.0..=max.0 {
                    for y in min.1..=max.1 {
                        if let Some(cell) = cells.get(&(x, y)) {
                            cell.iter().copied().for_each(&mut visit);
                        }
                    }
                }
            }
            None => volumes.keys().for_each(&mut visit),
        }
        oversized.iter().copied().for_each(&mut visit);
    }

    fn len(&self) -> usize {
        self.volumes.len()
    }

    fn clear(&mut self) {
        self.volumes.clear();
        self.cells.clear();
        self.oversized.clear();
        self.needs_rebuild = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Point2;
    use crate::physics::broadphase::BruteForceBroadphase;
    use slotmap::SlotMap;

    fn boxed(x: f32, y: f32, half: f32) -> BoundingVolume {
        BoundingVolume::Aabb(Aabb::new(
            Point2::new(x - half, y - half),
            Point2::new(x + half, y + half),
        ))
    }

    fn proxies(volumes: &[BoundingVolume]) -> Vec<BroadphaseProxy> {
        let mut keys: SlotMap<ColliderHandle, ()> = SlotMap::with_key();
        volumes
            .iter()
            .map(|volume| BroadphaseProxy::new(keys.insert(()), *volume))
            .collect()
    }

    fn sorted_query(broadphase: &mut dyn Broadphase, proxy: &BroadphaseProxy) -> Vec<ColliderHandle> {
        let mut reported = Vec::new();
        broadphase.query(proxy, &mut |other| reported.push(other));
        reported.sort();
        reported
    }

    #[test]
    fn test_spanning_proxy_reported_once() {
        let proxies = proxies(&[boxed(0.0, 0.0, 3.0), boxed(1.0, 1.0, 3.0)]);
        let mut grid = UniformGridBroadphase::new(1.0);
        for proxy in &proxies {
            grid.add(proxy);
        }

        // Both proxies share dozens of cells but are reported once
        assert_eq!(sorted_query(&mut grid, &proxies[0]), vec![proxies[1].handle]);
        assert!(grid.occupied_cells() > 1);
    }

    #[test]
    fn test_matches_brute_force() {
        let volumes: Vec<BoundingVolume> = (0..40)
            .map(|i| {
                let i = i as f32;
                boxed((i * 1.7) % 13.0, (i * 2.3) % 11.0, 0.4 + (i % 3.0) * 0.5)
            })
            .chain(std::iter::once(boxed(0.0, 0.0, 500.0)))
            .collect();
        let proxies = proxies(&volumes);

        let mut grid = UniformGridBroadphase::new(2.0);
        let mut brute = BruteForceBroadphase::new();
        for proxy in &proxies {
            grid.add(proxy);
            brute.add(proxy);
        }

        for proxy in &proxies {
            assert_eq!(sorted_query(&mut grid, proxy), sorted_query(&mut brute, proxy));
        }
    }

    #[test]
    fn test_update_moves_proxy_between_cells() {
        let mut proxies = proxies(&[boxed(0.0, 0.0, 0.5), boxed(10.0, 10.0, 0.5)]);
        let mut grid = UniformGridBroadphase::new(1.0);
        for proxy in &proxies {
            grid.add(proxy);
        }
        assert!(sorted_query(&mut grid, &proxies[0]).is_empty());

        proxies[1].volume = boxed(0.5, 0.0, 0.5);
        grid.update(&proxies[1]);
        assert_eq!(sorted_query(&mut grid, &proxies[0]), vec![proxies[1].handle]);

        grid.remove(&proxies[1]);
        assert!(sorted_query(&mut grid, &proxies[0]).is_empty());
        assert_eq!(grid.len(), 1);
    }

    #[test]
    fn test_invalid_cell_size_falls_back() {
        assert!((UniformGridBroadphase::new(-2.0).cell_size() - 1.0).abs() < f32::EPSILON);
        assert!((UniformGridBroadphase::new(f32::NAN).cell_size() - 1.0).abs() < f32::EPSILON);
    }
}
