//! Common test fixtures for regridding tests.

/// Common grid specifications for testing.
pub mod grid {
    /// MeteoSwiss-like 1 km analysis grid over Switzerland (cropped).
    pub const SWISS_1KM: GridSpec = GridSpec {
        ny: 24,
        nx: 36,
        lat0: 45.8,
        lon0: 5.9,
        dlat: 0.009,
        dlon: 0.013,
    };

    /// High-latitude band where cos(lat) varies strongly across a block.
    pub const SUBARCTIC: GridSpec = GridSpec {
        ny: 12,
        nx: 12,
        lat0: 60.0,
        lon0: 10.0,
        dlat: 2.0,
        dlon: 2.0,
    };

    /// Grid whose extents are not divisible by 3.
    pub const ODD_13X7: GridSpec = GridSpec {
        ny: 13,
        nx: 7,
        lat0: 46.0,
        lon0: 7.0,
        dlat: 0.1,
        dlon: 0.1,
    };

    /// Regular lat/lon grid specification.
    #[derive(Debug, Clone, Copy)]
    pub struct GridSpec {
        pub ny: usize,
        pub nx: usize,
        pub lat0: f64,
        pub lon0: f64,
        pub dlat: f64,
        pub dlon: f64,
    }

    impl GridSpec {
        /// Returns the total number of grid cells.
        pub fn size(&self) -> usize {
            self.ny * self.nx
        }

        /// Cell-center coordinates as `(lat, lon)` buffers.
        pub fn latlon(&self) -> (Vec<f64>, Vec<f64>) {
            crate::generators::uniform_latlon(
                self.ny, self.nx, self.lat0, self.lon0, self.dlat, self.dlon,
            )
        }
    }
}

/// Common variable names for testing.
pub mod variables {
    /// Daily mean temperature
    pub const TABSD: &str = "TabsD";

    /// Daily precipitation sum
    pub const RHIRESD: &str = "RhiresD";

    /// Wet-day threshold in mm
    pub const WET_DAY_THRESHOLD: f32 = 0.1;
}
