//! Building placement rules.
//!
//! A footprint is checked in a fixed order and the first failure wins:
//!
//! 1. bounds: the whole interior lies on the map;
//! 2. terrain: no interior or in-bounds outline tile is mountain;
//! 3. resources: no deposit tile in the interior or outline;
//! 4. buildings: the interior avoids every building's interior and outline;
//! 5. base: interior and outline avoid the base disc and its outline annulus;
//! 6. connectivity: once any structure exists, the outline must sit within
//!    Chebyshev distance 1 of the base's or some building's outline.
//!
//! Structures therefore form one contiguous colony without ever touching.

use std::collections::HashSet;

use crate::deposits::DepositLedger;
use crate::error::PlacementError;
use crate::spatial::{Footprint, RectFootprint, TilePos, WorldGeometry};
use crate::terrain::TerrainField;

use super::{Base, Building};

/// Read-only view over everything a placement decision depends on.
pub struct PlacementValidator<'a> {
    pub geometry: &'a WorldGeometry,
    pub terrain: &'a TerrainField,
    pub deposits: &'a DepositLedger,
    pub base: Option<&'a Base>,
    pub buildings: &'a [Building],
    pub threshold: f32,
}

impl<'a> PlacementValidator<'a> {
    pub fn can_place(&self, gx: i32, gy: i32, size: (u32, u32)) -> bool {
        self.check(&RectFootprint::new(TilePos::new(gx, gy), size.0, size.1))
            .is_ok()
    }

    pub fn check(&self, site: &RectFootprint) -> Result<(), PlacementError> {
        if !site.fits(self.geometry) {
            return Err(PlacementError::OutOfBounds);
        }

        let interior = site.interior();
        let outline = site.outline();

        let steep = interior
            .iter()
            .chain(outline.iter().filter(|t| self.geometry.in_bounds(**t)))
            .any(|tile| self.terrain.is_mountain(*tile, self.threshold));
        if steep {
            return Err(PlacementError::Terrain);
        }

        let resource_hit = interior
            .iter()
            .chain(outline.iter())
            .find_map(|tile| self.deposits.iter().find(|d| d.contains(*tile)));
        if let Some(deposit) = resource_hit {
            return Err(PlacementError::ResourceConflict(deposit.kind));
        }

        let clashes = self.buildings.iter().any(|existing| {
            interior
                .iter()
                .any(|tile| existing.occupies(*tile) || existing.outline_contains(*tile))
        });
        if clashes {
            return Err(PlacementError::BuildingConflict);
        }

        if let Some(base) = self.base {
            let reserved: HashSet<TilePos> = base.reserved().into_iter().collect();
            if interior.iter().chain(outline.iter()).any(|t| reserved.contains(t)) {
                return Err(PlacementError::BaseConflict);
            }
        }

        if !self.is_connected(site) {
            return Err(PlacementError::NotConnected);
        }
        Ok(())
    }

    /// Bootstrap: with no base and no buildings anything goes.
    fn is_connected(&self, site: &RectFootprint) -> bool {
        if self.base.is_none() && self.buildings.is_empty() {
            return true;
        }
        if let Some(base) = self.base {
            if site.outline_touches(base) {
                return true;
            }
        }
        self.buildings.iter().any(|b| site.outline_touches(b))
    }

    /// First origin, scanning row-major, where `size` may be placed.
    pub fn first_site(&self, size: (u32, u32)) -> Option<TilePos> {
        let max_x = self.geometry.cols().checked_sub(size.0)? as i32;
        let max_y = self.geometry.rows().checked_sub(size.1)? as i32;
        (0..=max_y)
            .flat_map(|y| (0..=max_x).map(move |x| TilePos::new(x, y)))
            .find(|origin| self.can_place(origin.x, origin.y, size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buildings::{BuildingRegistry, BuildingType};
    use crate::deposits::ResourceKind;

    struct Fixture {
        geometry: WorldGeometry,
        terrain: TerrainField,
        deposits: DepositLedger,
        base: Option<Base>,
        registry: BuildingRegistry,
    }

    impl Fixture {
        fn new(size: u32) -> Self {
            Self {
                geometry: WorldGeometry::new(size, size, 10),
                terrain: TerrainField::flat(size, size, 0.2),
                deposits: DepositLedger::new(),
                base: None,
                registry: BuildingRegistry::new(),
            }
        }

        fn validator(&self) -> PlacementValidator<'_> {
            PlacementValidator {
                geometry: &self.geometry,
                terrain: &self.terrain,
                deposits: &self.deposits,
                base: self.base.as_ref(),
                buildings: self.registry.as_slice(),
                threshold: 0.7,
            }
        }

        fn check(&self, x: i32, y: i32, w: u32, h: u32) -> Result<(), PlacementError> {
            self.validator()
                .check(&RectFootprint::new(TilePos::new(x, y), w, h))
        }

        fn place(&mut self, x: i32, y: i32, w: u32, h: u32) -> Result<(), PlacementError> {
            self.check(x, y, w, h)?;
            self.registry
                .push(RectFootprint::new(TilePos::new(x, y), w, h), BuildingType::Generic);
            Ok(())
        }
    }

    #[test]
    fn bounds_come_first() {
        let fixture = Fixture::new(10);
        assert_eq!(fixture.check(-1, 0, 2, 2), Err(PlacementError::OutOfBounds));
        assert_eq!(fixture.check(8, 8, 3, 2), Err(PlacementError::OutOfBounds));
        assert_eq!(fixture.check(8, 8, 2, 2), Ok(()));
    }

    #[test]
    fn mountains_in_the_outline_block_placement() {
        let mut fixture = Fixture::new(10);
        let mut values = vec![0.2; 100];
        values[5 * 10 + 6] = 0.75;
        fixture.terrain = TerrainField::from_values(10, 10, values);
        assert_eq!(fixture.check(3, 3, 3, 3), Err(PlacementError::Terrain));
        assert_eq!(fixture.check(2, 3, 3, 3), Ok(()));
    }

    #[test]
    fn deposits_in_the_outline_block_placement() {
        let mut fixture = Fixture::new(10);
        fixture.deposits.insert(ResourceKind::Ice, vec![TilePos::new(6, 6)]);
        assert_eq!(
            fixture.check(3, 3, 3, 3),
            Err(PlacementError::ResourceConflict(ResourceKind::Ice))
        );
        assert_eq!(fixture.check(1, 1, 3, 3), Ok(()));
    }

    #[test]
    fn bootstrap_then_connectivity() {
        let mut fixture = Fixture::new(30);
        assert_eq!(fixture.place(2, 2, 3, 3), Ok(()));
        assert_eq!(fixture.check(20, 20, 3, 3), Err(PlacementError::NotConnected));
    }

    #[test]
    fn touching_is_rejected_but_one_or_two_tile_gaps_connect() {
        let mut fixture = Fixture::new(30);
        fixture.place(2, 2, 3, 3).unwrap();
        // interior 2..=4; x = 5 touches, x = 6 leaves a one-tile gap
        assert_eq!(fixture.check(5, 2, 3, 3), Err(PlacementError::BuildingConflict));
        assert_eq!(fixture.check(6, 2, 3, 3), Ok(()));
        assert_eq!(fixture.check(7, 2, 3, 3), Ok(()));
        assert_eq!(fixture.check(8, 2, 3, 3), Err(PlacementError::NotConnected));
        assert_eq!(fixture.check(3, 3, 3, 3), Err(PlacementError::BuildingConflict));
    }

    #[test]
    fn base_outline_is_off_limits_but_connects() {
        let mut fixture = Fixture::new(20);
        fixture.base = Some(Base::new(TilePos::new(5, 5), 2));
        assert_eq!(fixture.check(0, 0, 4, 4), Err(PlacementError::BaseConflict));
        assert_eq!(fixture.check(9, 9, 4, 4), Ok(()));
        assert_eq!(fixture.check(14, 14, 4, 4), Err(PlacementError::NotConnected));
    }

    #[test]
    fn first_site_finds_a_connected_spot() {
        let mut fixture = Fixture::new(20);
        fixture.base = Some(Base::new(TilePos::new(10, 10), 2));
        let site = fixture.validator().first_site((4, 4)).expect("room next to the base");
        assert_eq!(fixture.check(site.x, site.y, 4, 4), Ok(()));
    }
}
