//! Summary artifact: rendering and storage

mod render;
mod store;

pub use render::{render_summary, CONTENT_TYPE};
pub use store::SummaryStore;
