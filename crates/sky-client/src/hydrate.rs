//! Startup hydration
//!
//! Issues the fixed set of startup fetches at once. Each fetch is
//! independent: a failure is an outcome folded into its own slice and never
//! holds back the others.

use crate::dispatch::RequestInitiator;
use futures::future::join_all;
use serde::Serialize;
use sky_protocol::action::{
    FETCH_DB_INFO, FETCH_GROUPS, FETCH_INSTRUMENTS, FETCH_INSTRUMENT_OBS_PARAMS, FETCH_NEWSFEED,
    FETCH_SYSINFO, FETCH_TAXONOMIES, FETCH_TOP_SOURCES, FETCH_USER_PROFILE,
};
use sky_protocol::{path, ActionType, ApiRequest, OperationKind};
use sky_state::{ResourceReducer, Store, StoreError};
use std::fmt;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// One startup fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HydrationFetch {
    pub action: ActionType,
    pub path: &'static str,
    /// Store slice holding the result
    pub slice: &'static str,
}

/// The startup fetches
pub static HYDRATION_FETCHES: [HydrationFetch; 9] = [
    HydrationFetch {
        action: FETCH_SYSINFO,
        path: path::SYSINFO,
        slice: "sysinfo",
    },
    HydrationFetch {
        action: FETCH_DB_INFO,
        path: path::DB_INFO,
        slice: "dbinfo",
    },
    HydrationFetch {
        action: FETCH_USER_PROFILE,
        path: path::PROFILE,
        slice: "profile",
    },
    HydrationFetch {
        action: FETCH_GROUPS,
        path: path::GROUPS,
        slice: "groups",
    },
    HydrationFetch {
        action: FETCH_NEWSFEED,
        path: path::NEWSFEED,
        slice: "newsfeed",
    },
    HydrationFetch {
        action: FETCH_TOP_SOURCES,
        path: path::TOP_SOURCES,
        slice: "topSources",
    },
    HydrationFetch {
        action: FETCH_INSTRUMENTS,
        path: path::INSTRUMENTS,
        slice: "instruments",
    },
    HydrationFetch {
        action: FETCH_INSTRUMENT_OBS_PARAMS,
        path: path::INSTRUMENT_OBS_PARAMS,
        slice: "instrumentObsParams",
    },
    HydrationFetch {
        action: FETCH_TAXONOMIES,
        path: path::TAXONOMIES,
        slice: "taxonomies",
    },
];

/// Outcome kind of every startup fetch, in table order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HydrationReport {
    pub outcomes: Vec<(ActionType, OperationKind)>,
}

impl HydrationReport {
    /// Number of fetches
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    /// Check if nothing was fetched
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Fetches that resolved OK
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, kind)| *kind == OperationKind::Ok)
            .count()
    }

    /// Fetches that did not resolve OK
    #[must_use]
    pub fn failed(&self) -> Vec<ActionType> {
        self.outcomes
            .iter()
            .filter(|(_, kind)| *kind != OperationKind::Ok)
            .map(|(action, _)| *action)
            .collect()
    }

    /// Outcome of one fetch
    #[must_use]
    pub fn outcome(&self, action: ActionType) -> Option<OperationKind> {
        self.outcomes
            .iter()
            .find(|(a, _)| *a == action)
            .map(|(_, kind)| *kind)
    }
}

/// Issues the startup fetches
#[derive(Clone)]
pub struct HydrationOrchestrator {
    initiator: Arc<dyn RequestInitiator>,
}

impl HydrationOrchestrator {
    /// Create orchestrator issuing through `initiator`
    #[must_use]
    pub fn new(initiator: Arc<dyn RequestInitiator>) -> Self {
        Self { initiator }
    }

    /// Install one [`ResourceReducer`] slice per startup fetch
    ///
    /// # Errors
    /// - `StoreError::SliceAlreadyRegistered` if a slice name is taken
    pub fn install_slices(store: &Store) -> Result<(), StoreError> {
        for fetch in &HYDRATION_FETCHES {
            store.inject_reducer(fetch.slice, ResourceReducer::new(fetch.action))?;
        }
        Ok(())
    }

    /// Issue every startup fetch concurrently and wait for all outcomes
    pub async fn hydrate(&self) -> HydrationReport {
        tracing::info!(fetches = HYDRATION_FETCHES.len(), "hydration started");

        let outcomes = join_all(HYDRATION_FETCHES.iter().map(|fetch| {
            let initiator = Arc::clone(&self.initiator);
            async move {
                let envelope = initiator.issue(ApiRequest::get(fetch.path, fetch.action)).await;
                (fetch.action, envelope.kind())
            }
        }))
        .await;

        let report = HydrationReport { outcomes };
        tracing::info!(
            succeeded = report.succeeded(),
            failed = report.len() - report.succeeded(),
            "hydration finished"
        );
        report
    }

    /// Fire-and-forget hydration
    #[must_use]
    pub fn spawn(&self) -> JoinHandle<HydrationReport> {
        let orchestrator = self.clone();
        tokio::spawn(async move { orchestrator.hydrate().await })
    }
}

impl fmt::Debug for HydrationOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HydrationOrchestrator").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::json;
    use sky_protocol::{OperationEnvelope, Resolution};
    use std::collections::HashSet;

    /// Fails every request to `fail_path`, answers the rest with `[]`
    struct FailOne {
        fail_path: &'static str,
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl RequestInitiator for FailOne {
        async fn issue(&self, request: ApiRequest) -> OperationEnvelope {
            self.seen.lock().push(request.path.clone());
            let resolution = if request.path == self.fail_path {
                Resolution::TransportFailure
            } else {
                Resolution::Ok(json!([]))
            };
            OperationEnvelope::pending(request.action).resolve(resolution)
        }
    }

    #[test]
    fn table_is_unique() {
        let actions: HashSet<_> = HYDRATION_FETCHES.iter().map(|f| f.action).collect();
        let slices: HashSet<_> = HYDRATION_FETCHES.iter().map(|f| f.slice).collect();
        assert_eq!(actions.len(), 9);
        assert_eq!(slices.len(), 9);
    }

    #[test]
    fn slices_installed_once() {
        let store = Store::new();
        HydrationOrchestrator::install_slices(&store).unwrap();
        assert_eq!(store.state().names().count(), 9);
        assert!(HydrationOrchestrator::install_slices(&store).is_err());
    }

    #[tokio::test]
    async fn one_failure_does_not_stop_others() {
        let initiator = Arc::new(FailOne {
            fail_path: path::GROUPS,
            seen: Mutex::new(Vec::new()),
        });
        let orchestrator = HydrationOrchestrator::new(initiator.clone());

        let report = orchestrator.hydrate().await;

        assert_eq!(initiator.seen.lock().len(), 9);
        assert_eq!(report.len(), 9);
        assert_eq!(report.succeeded(), 8);
        assert_eq!(report.failed(), vec![FETCH_GROUPS]);
        assert_eq!(report.outcome(FETCH_GROUPS), Some(OperationKind::TransportFailure));
    }

    #[tokio::test]
    async fn spawn_runs_in_background() {
        let initiator = Arc::new(FailOne {
            fail_path: "",
            seen: Mutex::new(Vec::new()),
        });
        let report = HydrationOrchestrator::new(initiator).spawn().await.unwrap();
        assert_eq!(report.succeeded(), 9);
    }
}
