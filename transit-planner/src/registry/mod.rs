//! Static network configuration.
//!
//! Everything the planner knows about the network without asking the live
//! feed: the major-station catalog, interchange stations, heuristic timing
//! patterns and name-search hints. The planner receives these at
//! construction, so tests can substitute fixtures.

mod areas;
mod catalog;
mod timing;
mod transfers;

pub use areas::{AreaHint, AreaHints, boston_areas};
pub use catalog::{CatalogError, CatalogStation, StationCatalog};
pub use timing::{TimingEstimate, TimingPattern, TimingTable, boston_timings};
pub use transfers::{
    TransferRegistry, TransferRegistryBuilder, TransferStation, boston_interchanges,
};

/// All static configuration the planner needs.
#[derive(Debug, Clone)]
pub struct StaticNetwork {
    pub catalog: StationCatalog,
    pub transfers: TransferRegistry,
    pub timings: TimingTable,
    pub areas: AreaHints,
}

impl StaticNetwork {
    /// Bundle the Boston defaults with the given catalog.
    pub fn boston(catalog: StationCatalog) -> Self {
        Self {
            catalog,
            transfers: boston_interchanges(),
            timings: boston_timings(),
            areas: boston_areas(),
        }
    }

    /// Boston defaults with the bundled catalog.
    pub fn bundled() -> Result<Self, CatalogError> {
        Ok(Self::boston(StationCatalog::bundled()?))
    }
}
