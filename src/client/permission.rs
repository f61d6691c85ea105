use std::fmt;

/// Notification permission as seen by the page.
///
/// `Unsupported` never changes. `Granted` and `Denied` only change through
/// browser settings, which the page cannot observe as a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionState {
    Unsupported,
    Default,
    Granted,
    Denied,
}

/// What the user did with the permission prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionDecision {
    Granted,
    Denied,
    Dismissed,
}

impl PermissionState {
    pub fn after_request(self, decision: PermissionDecision) -> Self {
        match (self, decision) {
            (PermissionState::Default, PermissionDecision::Granted) => PermissionState::Granted,
            (PermissionState::Default, PermissionDecision::Denied) => PermissionState::Denied,
            (state, _) => state,
        }
    }

    pub fn can_request(self) -> bool {
        self == PermissionState::Default
    }
}

impl fmt::Display for PermissionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PermissionState::Unsupported => "unsupported",
            PermissionState::Default => "default",
            PermissionState::Granted => "granted",
            PermissionState::Denied => "denied",
        })
    }
}
