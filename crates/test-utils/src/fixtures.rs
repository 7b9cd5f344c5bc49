//! Common test fixtures for iono-grid tests.
//!
//! Small hand-checkable columns and grids, plus closed-form references for
//! volume integrals.

/// Hand-checkable height columns (km).
pub mod columns {
    /// Irregular column used for bracket search checks.
    pub const IRREGULAR: [f64; 4] = [100.0, 110.0, 125.0, 150.0];

    /// Two neighbouring columns at one timestep.
    pub const PAIR_HEIGHTS: [[f64; 3]; 2] = [[100.0, 110.0, 125.0], [100.0, 112.0, 130.0]];

    /// Values carried by [`PAIR_HEIGHTS`].
    pub const PAIR_VALUES: [[f64; 3]; 2] = [[1.0, 2.0, 3.0], [2.0, 3.0, 4.0]];
}

/// Common horizontal grids, in degrees.
pub mod grid {
    /// Horizontal grid specification for testing.
    #[derive(Debug, Clone, Copy)]
    pub struct GridSpec {
        pub nlat: usize,
        pub nlon: usize,
        pub lat_start: f64,
        pub lon_start: f64,
        pub step: f64,
    }

    impl GridSpec {
        /// Returns the total number of horizontal cells.
        pub fn size(&self) -> usize {
            self.nlat * self.nlon
        }

        /// Latitude coordinates of the rows.
        pub fn lat_values(&self) -> Vec<f64> {
            (0..self.nlat)
                .map(|j| self.lat_start + self.step * j as f64)
                .collect()
        }

        /// Longitude coordinates of the columns.
        pub fn lon_values(&self) -> Vec<f64> {
            (0..self.nlon)
                .map(|i| self.lon_start + self.step * i as f64)
                .collect()
        }
    }

    /// Two by two cells at the equator, 2.5 degree spacing.
    pub const EQUATORIAL_2X2: GridSpec = GridSpec {
        nlat: 2,
        nlon: 2,
        lat_start: 0.0,
        lon_start: 0.0,
        step: 2.5,
    };

    /// A high-latitude sector, 2.5 degree spacing.
    pub const AURORAL_SECTOR: GridSpec = GridSpec {
        nlat: 9,
        nlon: 13,
        lat_start: 55.0,
        lon_start: 200.0,
        step: 2.5,
    };

    /// Global 5 degree grid.
    pub const GLOBAL_5DEG: GridSpec = GridSpec {
        nlat: 36,
        nlon: 72,
        lat_start: -87.5,
        lon_start: -180.0,
        step: 5.0,
    };
}

/// Closed-form volumes of spherical boxes.
pub mod reference {
    /// Mean Earth radius in km.
    pub const EARTH_RADIUS_KM: f64 = 6371.0;

    /// Volume (m^3) of the shell segment between altitudes `z1..z2` (km),
    /// latitudes `lat1..lat2` and longitudes `lon1..lon2` (degrees).
    pub fn spherical_box_volume(z: (f64, f64), lat: (f64, f64), lon: (f64, f64)) -> f64 {
        let r1 = (EARTH_RADIUS_KM + z.0) * 1000.0;
        let r2 = (EARTH_RADIUS_KM + z.1) * 1000.0;
        let dlon = (lon.1 - lon.0).to_radians();
        let dsin = lat.1.to_radians().sin() - lat.0.to_radians().sin();
        dlon * dsin * (r2.powi(3) - r1.powi(3)) / 3.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_spec_values() {
        let g = grid::EQUATORIAL_2X2;
        assert_eq!(g.size(), 4);
        assert_eq!(g.lat_values(), vec![0.0, 2.5]);
        assert_eq!(grid::GLOBAL_5DEG.lon_values().len(), 72);
    }

    #[test]
    fn test_box_volume_scales_with_longitude() {
        let a = reference::spherical_box_volume((100.0, 110.0), (0.0, 10.0), (0.0, 10.0));
        let b = reference::spherical_box_volume((100.0, 110.0), (0.0, 10.0), (0.0, 20.0));
        assert!(a > 0.0);
        assert!((b / a - 2.0).abs() < 1e-12);
    }
}
