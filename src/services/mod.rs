//! Services Layer
//!
//! Business logic called by the REST handlers. Services own the move from
//! async handlers onto blocking database work.
//!
//! # Services
//!
//! - `RefreshService` - Fetch upstream data, compute rows, atomic merge
//! - `CountryService` - List, get, delete countries and read stats
//! - `SummaryService` - Regenerate and load the summary artifact

pub mod country_service;
pub mod refresh_service;
pub mod summary_service;

pub use country_service::CountryService;
pub use refresh_service::RefreshService;
pub use summary_service::SummaryService;
