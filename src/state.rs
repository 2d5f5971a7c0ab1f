use crate::report::ReportGenerator;
use crate::service::PlannerService;
use crate::session::SessionStore;
use std::{
    collections::HashSet,
    sync::{Arc, Mutex},
};

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<PlannerService>,
    pub sessions: Arc<SessionStore>,
    pub reports: Arc<dyn ReportGenerator>,
    reports_in_flight: Arc<Mutex<HashSet<String>>>,
}

impl AppState {
    pub fn new(
        service: PlannerService,
        sessions: SessionStore,
        reports: Arc<dyn ReportGenerator>,
    ) -> Self {
        Self {
            service: Arc::new(service),
            sessions: Arc::new(sessions),
            reports,
            reports_in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Claims the single report slot for `user_id`. `None` while another
    /// report for the same board is still running.
    pub fn begin_report(&self, user_id: &str) -> Option<ReportSlot> {
        let mut in_flight = self
            .reports_in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if !in_flight.insert(user_id.to_string()) {
            return None;
        }
        Some(ReportSlot {
            user_id: user_id.to_string(),
            in_flight: Arc::clone(&self.reports_in_flight),
        })
    }
}

/// Releases the report slot when dropped.
pub struct ReportSlot {
    user_id: String,
    in_flight: Arc<Mutex<HashSet<String>>>,
}

impl Drop for ReportSlot {
    fn drop(&mut self) {
        let mut in_flight = self
            .in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        in_flight.remove(&self.user_id);
    }
}
