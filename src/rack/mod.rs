//! The rack aggregator: UDP ingress, periodic spectral summarization, and
//! lazy-reconnect upstream reporting to the datacenter aggregator.

pub mod ingress;
pub mod reporter;
pub mod summarizer;

use std::collections::HashMap;
use std::sync::Mutex;

use crate::stats::ServerStats;

/// State shared between the ingress thread and the summarizer task: one
/// mutex per shared map, held only for the duration of each read or write.
pub struct RackState {
    pub rack_id: i64,
    pub server_stats: Mutex<HashMap<i64, ServerStats>>,
    pub window_counts: Mutex<HashMap<i64, u64>>,
}

impl RackState {
    pub fn new(rack_id: i64) -> Self {
        Self {
            rack_id,
            server_stats: Mutex::new(HashMap::new()),
            window_counts: Mutex::new(HashMap::new()),
        }
    }
}
