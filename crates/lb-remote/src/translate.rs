//! Data-model translation between local and Remote representations (§4.3).

use lb_core::enums::Status;

/// Remote priority constants (the Remote's own numbering, not ours).
pub const REMOTE_PRIORITY_NONE: i32 = 0;
pub const REMOTE_PRIORITY_URGENT: i32 = 1;
pub const REMOTE_PRIORITY_HIGH: i32 = 2;
pub const REMOTE_PRIORITY_MEDIUM: i32 = 3;
pub const REMOTE_PRIORITY_LOW: i32 = 4;

/// Maps our local `0..=4` scale onto the Remote's `{0 none, 1 urgent, 2
/// high, 3 medium, 4 low}`. The mapping is intentionally asymmetric at both
/// ends: local `0` (most urgent) becomes remote `1` (urgent), and local `4`
/// (least urgent) becomes remote `0` (none) -- there is no local slot for
/// "no priority" (§4.3, §7 "Priority mapping round-trip").
pub fn local_priority_to_remote(local: i32) -> i32 {
    match local {
        0 => REMOTE_PRIORITY_URGENT,
        1 => REMOTE_PRIORITY_HIGH,
        2 => REMOTE_PRIORITY_MEDIUM,
        3 => REMOTE_PRIORITY_LOW,
        _ => REMOTE_PRIORITY_NONE,
    }
}

/// Inverse of [`local_priority_to_remote`].
pub fn remote_priority_to_local(remote: i32) -> i32 {
    match remote {
        REMOTE_PRIORITY_URGENT => 0,
        REMOTE_PRIORITY_HIGH => 1,
        REMOTE_PRIORITY_MEDIUM => 2,
        REMOTE_PRIORITY_LOW => 3,
        _ => 4,
    }
}

/// Statuses map to the Remote's workflow-state *type*, not a specific
/// state -- the client picks some state of that type at creation/update
/// time (§4.3).
pub fn status_to_workflow_state_type(status: &Status) -> &'static str {
    match status {
        Status::Open => "unstarted",
        Status::InProgress => "started",
        Status::Closed => "completed",
        Status::Unknown(_) => "unstarted",
    }
}

/// Workflow-state types that map back to `closed` (the Remote
/// distinguishes "completed" from "canceled"; both collapse to our single
/// `closed` status, §4.3).
pub fn workflow_state_type_to_status(state_type: &str) -> Status {
    match state_type {
        "unstarted" | "backlog" | "triage" => Status::Open,
        "started" => Status::InProgress,
        "completed" | "canceled" => Status::Closed,
        other => Status::Unknown(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_round_trips_for_middle_values() {
        for local in 1..=3 {
            let remote = local_priority_to_remote(local);
            assert_eq!(remote_priority_to_local(remote), local);
        }
    }

    #[test]
    fn priority_asymmetry_at_extremes() {
        assert_eq!(local_priority_to_remote(0), REMOTE_PRIORITY_URGENT);
        assert_eq!(local_priority_to_remote(4), REMOTE_PRIORITY_NONE);
        assert_eq!(remote_priority_to_local(REMOTE_PRIORITY_NONE), 4);
        assert_eq!(remote_priority_to_local(REMOTE_PRIORITY_URGENT), 0);
    }

    #[test]
    fn status_workflow_type_round_trips() {
        assert_eq!(workflow_state_type_to_status("unstarted"), Status::Open);
        assert_eq!(workflow_state_type_to_status("started"), Status::InProgress);
        assert_eq!(workflow_state_type_to_status("completed"), Status::Closed);
        assert_eq!(workflow_state_type_to_status("canceled"), Status::Closed);
    }
}
