use flags::client::FlagClient;
use flags::dismissal::{DismissalRecord, OutOfServiceNotice};
use flags::resolver::{ResolvedVisibility, VisibilityDomain};
use flags::types::FlagSet;
use serde::Serialize;
use std::time::UNIX_EPOCH;

/// Snapshot of the synchronized state and everything derived from it.
#[derive(Serialize, Debug)]
pub struct Report {
    pub last_fetch: Option<u64>,
    pub is_fetching: bool,
    pub last_error: Option<String>,
    pub flags: FlagSet,
    pub sections: ResolvedVisibility,
    pub services: ResolvedVisibility,
    pub materials: ResolvedVisibility,
    pub notice: OutOfServiceNotice,
    pub dismissal: DismissalRecord,
}

impl Report {
    pub fn collect(client: &FlagClient) -> Self {
        let state = client.state();
        let last_fetch = state
            .last_fetch
            .and_then(|at| at.duration_since(UNIX_EPOCH).ok())
            .map(|since| since.as_secs());

        Report {
            last_fetch,
            is_fetching: state.is_fetching,
            last_error: state.last_error,
            flags: (*state.flags).clone(),
            sections: client.resolved_visibility(VisibilityDomain::Sections),
            services: client.resolved_visibility(VisibilityDomain::Services),
            materials: client.resolved_visibility(VisibilityDomain::Materials),
            notice: client.notice(),
            dismissal: client.dismissal_record(),
        }
    }
}
