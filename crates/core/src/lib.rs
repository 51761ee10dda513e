pub mod config;
pub mod config_loader;
pub mod taxonomy;

pub use config::{ScanConfig, SelectionPolicy, DEFAULT_MATCH_THRESHOLD};
pub use config_loader::ConfigLoader;
pub use taxonomy::{MarketSpec, MarketTranslations, SportCatalog, SportMarkets, WIN_MARKET};
