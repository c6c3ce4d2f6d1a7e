//! The datacenter aggregator: a multiplexed TCP listener consuming
//! newline-delimited rack reports, and a periodic fleet-health summary with
//! freshness gating.

pub mod connection;
pub mod listener;
pub mod summary;

use std::collections::HashMap;
use std::sync::Mutex;

use crate::protocol::RackReport;

/// State shared between every connection handler and the summary loop.
pub struct DcState {
    pub dc_id: i64,
    pub rack_reports: Mutex<HashMap<i64, RackReport>>,
}

impl DcState {
    pub fn new(dc_id: i64) -> Self {
        Self {
            dc_id,
            rack_reports: Mutex::new(HashMap::new()),
        }
    }
}
