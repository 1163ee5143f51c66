pub mod asset_snapshot;
pub mod market_timeseries;
pub mod raw_snapshot;

pub use asset_snapshot::{AssetSnapshot, AssetSnapshotUpdate, NewAssetSnapshot};
pub use market_timeseries::{MarketTimeseries, MarketTimeseriesUpdate, NewMarketTimeseries};
pub use raw_snapshot::{MarketCoverage, NewRawSnapshot, RawSnapshot};
