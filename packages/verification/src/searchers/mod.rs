//! Search provider adapters.

pub mod google;
pub mod tavily;

pub use google::GoogleCustomSearcher;
pub use tavily::TavilySearcher;
