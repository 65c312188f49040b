pub mod config;
pub mod download;
pub mod import;
pub mod search;
pub mod stats;

pub use download::run_download;
pub use import::run_import;
pub use search::run_search;
pub use stats::show_stats;
