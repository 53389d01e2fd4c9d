//! Summary Service
//!
//! Projects the stored table into the summary artifact. Runs detached after
//! each committed refresh; failures are logged and never reach the caller.

use crate::db::sqlite::run_blocking;
use crate::error::Result;
use crate::state::AppState;
use crate::summary::render_summary;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Number of countries listed on the summary
pub const TOP_COUNTRIES: usize = 5;

pub struct SummaryService;

impl SummaryService {
    /// Regenerate the artifact in the background
    pub fn spawn_projection(state: Arc<AppState>) -> JoinHandle<()> {
        tokio::spawn(async move {
            if let Err(e) = Self::project(&state).await {
                error!("Failed to generate summary image: {}", e);
            }
        })
    }

    /// Snapshot, render and atomically replace the artifact
    pub async fn project(state: &Arc<AppState>) -> Result<()> {
        let state = Arc::clone(state);

        let (written, path) = run_blocking(move || {
            let snapshot = state.sqlite.summary_snapshot(TOP_COUNTRIES)?;
            let svg = render_summary(&snapshot);
            let written = state.summary.save(svg.as_bytes(), snapshot.last_refreshed_at)?;
            Ok((written, state.summary.path().to_path_buf()))
        })
        .await?;

        if written {
            info!("Summary image written to {:?}", path);
        } else {
            info!("Summary image already reflects a newer refresh");
        }
        Ok(())
    }

    /// Current artifact bytes, `None` if never generated
    pub async fn load(state: &Arc<AppState>) -> Result<Option<Vec<u8>>> {
        let state = Arc::clone(state);
        run_blocking(move || state.summary.load()).await
    }
}
