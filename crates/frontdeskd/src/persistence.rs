//! Fire-and-forget session persistence.
//!
//! Finished turns are spooled as JSON files for the external record system
//! to collect. A write failure is logged and swallowed - persistence must
//! never fail the turn.

use std::path::PathBuf;

use chrono::Utc;
use frontdesk_common::state::ConversationState;
use serde::Serialize;
use tracing::{debug, warn};

use crate::tools::{ClinicianAlert, FollowUpTask, MemoryEntry};

#[derive(Debug, Serialize)]
struct SpoolRecord<'a> {
    state: &'a ConversationState,
    final_response: &'a str,
    memory: &'a [MemoryEntry],
    alerts: &'a [ClinicianAlert],
    followups: &'a [FollowUpTask],
    persisted_at: String,
}

#[derive(Clone)]
pub struct SessionSpool {
    dir: PathBuf,
}

impl SessionSpool {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Write the finished turn to the spool. Synchronous body; callers wrap
    /// it in `tokio::spawn` so the turn response is never held up.
    pub fn persist(
        &self,
        state: &ConversationState,
        final_response: &str,
        memory: &[MemoryEntry],
        alerts: &[ClinicianAlert],
        followups: &[FollowUpTask],
    ) {
        let record = SpoolRecord {
            state,
            final_response,
            memory,
            alerts,
            followups,
            persisted_at: Utc::now().to_rfc3339(),
        };

        if let Err(e) = std::fs::create_dir_all(&self.dir) {
            warn!("[-]  spool dir {:?} unavailable: {}", self.dir, e);
            return;
        }

        let path = self.dir.join(format!(
            "{}-{}.json",
            state.session_id,
            Utc::now().format("%Y%m%dT%H%M%S%f")
        ));
        match serde_json::to_vec_pretty(&record) {
            Ok(bytes) => {
                if let Err(e) = std::fs::write(&path, bytes) {
                    warn!("[-]  failed to spool session {:?}: {}", path, e);
                } else {
                    debug!("spooled session to {:?}", path);
                }
            }
            Err(e) => warn!("[-]  failed to serialize session {}: {}", state.session_id, e),
        }
    }
}
