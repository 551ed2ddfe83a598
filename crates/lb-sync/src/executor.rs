//! The outbox executor shared by the background worker and the foreground
//! "push-before-pull" step of the sync engine (§4.4.4, §4.5). Draining the
//! outbox is identical whichever caller triggers it; only the caller's
//! polling/idle behaviour differs.

use lb_core::dependency::Dependency;
use lb_core::enums::{DependencyType, Status};
use lb_remote::RemoteClient;
use lb_storage::{OutboxEntry, Store};
use tracing::warn;

use crate::error::Result;
use crate::outbox_ops::{self, kind, CreateIssuePayload, DeleteIssuePayload, RelationPayload, UpdateIssuePayload};

/// Outcome of draining the outbox once (§4.5 "reporting a `{success,
/// failed}` pair").
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PushResult {
    pub success: usize,
    pub failed: usize,
}

impl PushResult {
    pub fn did_work(&self) -> bool {
        self.success > 0
    }
}

/// Applies every currently-queued outbox row once, in ascending `id` order,
/// ack'ing or fail'ing each as it goes. A row added to the outbox by this
/// very drain (parent-status propagation) is picked up by re-peeking, so the
/// whole dependent chain is processed before returning (§9 "FIFO order").
pub fn drain(store: &Store, client: &RemoteClient, failure_backoff: std::time::Duration) -> Result<PushResult> {
    let mut result = PushResult::default();
    loop {
        let batch = store.peek_outbox_batch()?;
        if batch.is_empty() {
            break;
        }
        for entry in &batch {
            match apply(store, client, entry) {
                Ok(()) => {
                    store.ack_outbox(entry.id)?;
                    result.success += 1;
                }
                Err(e) => {
                    warn!(id = entry.id, operation = %entry.operation, error = %e, "outbox item failed");
                    store.fail_outbox(entry.id, &e.to_string())?;
                    result.failed += 1;
                    std::thread::sleep(failure_backoff);
                }
            }
        }
    }
    Ok(result)
}

/// Dispatches one outbox row to the Remote (§4.4.4 "operations map
/// one-to-one to Remote calls").
pub fn apply(store: &Store, client: &RemoteClient, entry: &OutboxEntry) -> Result<()> {
    match entry.operation.as_str() {
        kind::CREATE_ISSUE => apply_create(store, client, &entry.payload),
        kind::UPDATE_ISSUE => apply_update(store, client, &entry.payload),
        kind::DELETE_ISSUE => apply_delete(client, &entry.payload),
        kind::CREATE_RELATION => apply_create_relation(client, &entry.payload),
        kind::DELETE_RELATION => apply_delete_relation(store, client, &entry.payload),
        other => {
            warn!(operation = other, "unknown outbox operation, dropping");
            Ok(())
        }
    }
}

fn apply_create(store: &Store, client: &RemoteClient, payload: &str) -> Result<()> {
    let payload: CreateIssuePayload = outbox_ops::decode(payload)?;
    let remote = client.create_issue(&payload.team_id, &payload.title, &payload.description, payload.priority)?;

    let mut issue = store.get_issue(&payload.local_id)?;
    let deps_out = store.list_deps_out(&payload.local_id)?;
    let deps_in = store.list_deps_in(&payload.local_id)?;

    issue.id = remote.identifier.clone();
    issue.remote_state_id = Some(remote.workflow_state_id.clone());
    // Re-key under the real identifier: the placeholder row and its edges
    // are replaced, not merely renamed, since `id` is the primary key.
    store.delete_issue(&payload.local_id).ok();
    store.upsert_issue(&issue)?;

    for dep in deps_out {
        let dep = Dependency::new(remote.identifier.clone(), dep.depends_on_id, dep.dep_type, dep.created_by);
        store.add_dependency(&dep).ok();
    }
    for dep in deps_in {
        let dep = Dependency::new(dep.issue_id, remote.identifier.clone(), dep.dep_type, dep.created_by);
        store.add_dependency(&dep).ok();
    }
    for (dep_type, target) in &payload.deferred_relations {
        let dep = Dependency::new(remote.identifier.clone(), target.clone(), dep_type.clone(), "");
        store.add_dependency(&dep).ok();
    }
    Ok(())
}

fn apply_update(store: &Store, client: &RemoteClient, payload: &str) -> Result<()> {
    let payload: UpdateIssuePayload = outbox_ops::decode(payload)?;
    let mut fields = serde_json::Map::new();
    if let Some(title) = &payload.title {
        fields.insert("title".into(), title.clone().into());
    }
    if let Some(description) = &payload.description {
        fields.insert("description".into(), description.clone().into());
    }
    if let Some(priority) = payload.priority {
        fields.insert("priority".into(), lb_remote::translate::local_priority_to_remote(priority).into());
    }
    if let Some(assignee) = &payload.assignee {
        fields.insert("assigneeEmail".into(), assignee.clone().into());
    }
    if let Some(status) = &payload.status {
        let state_type = lb_remote::translate::status_to_workflow_state_type(&Status::from(status.as_str()));
        fields.insert("workflowStateType".into(), state_type.into());
    }
    // The cache was already updated optimistically by the command that
    // enqueued this row (§4.4.1); confirming with the Remote is all that
    // remains here.
    client.update_issue(&payload.remote_id, serde_json::Value::Object(fields))?;

    if let Some(status) = &payload.status {
        propagate_parent_status(store, &payload.local_id, &Status::from(status.as_str()))?;
    }
    Ok(())
}

fn apply_delete(client: &RemoteClient, payload: &str) -> Result<()> {
    let payload: DeleteIssuePayload = outbox_ops::decode(payload)?;
    client.delete_issue(&payload.remote_id)?;
    Ok(())
}

fn apply_create_relation(client: &RemoteClient, payload: &str) -> Result<()> {
    let payload: RelationPayload = outbox_ops::decode(payload)?;
    client.create_relation(&payload.issue_remote_id, &payload.related_remote_id, &payload.relation_type)?;
    Ok(())
}

fn apply_delete_relation(store: &Store, client: &RemoteClient, payload: &str) -> Result<()> {
    let payload: RelationPayload = outbox_ops::decode(payload)?;
    client.delete_relation(&payload.issue_remote_id, &payload.related_remote_id)?;
    store.remove_dependency(&payload.issue_remote_id, &payload.related_remote_id).ok();
    Ok(())
}

/// Best-effort parent-status propagation (§4.4.5). Never fails the
/// originating update: a missing parent edge or a store error here is
/// logged and swallowed.
fn propagate_parent_status(store: &Store, child_id: &str, new_status: &Status) -> Result<()> {
    let parent_id = match store
        .list_deps_out(child_id)?
        .into_iter()
        .find(|d| d.dep_type == DependencyType::ParentChild)
    {
        Some(dep) => dep.depends_on_id,
        None => return Ok(()),
    };

    let parent = match store.get_issue(&parent_id) {
        Ok(issue) => issue,
        Err(_) => return Ok(()),
    };

    let next_parent_status = match (new_status, &parent.status) {
        (Status::InProgress, Status::Open) => Some(Status::InProgress),
        (Status::Closed, Status::InProgress) => {
            let any_sibling_in_progress = store
                .list_deps_in(&parent_id)?
                .into_iter()
                .filter(|d| d.dep_type == DependencyType::ParentChild && d.issue_id != child_id)
                .filter_map(|d| store.get_issue(&d.issue_id).ok())
                .any(|sibling| sibling.status == Status::InProgress);
            if any_sibling_in_progress {
                None
            } else {
                Some(Status::Open)
            }
        }
        _ => None,
    };

    let Some(next_status) = next_parent_status else {
        return Ok(());
    };

    let now = chrono::Utc::now();
    store.update_issue(
        &parent_id,
        &lb_storage::IssueUpdates {
            status: Some(next_status.clone()),
            ..Default::default()
        },
        now,
    )?;

    // `parent_id` is already a confirmed identifier (it came off a
    // dependency edge, never a pending placeholder), so it doubles as both
    // the cache key and the Remote identifier here.
    let payload = outbox_ops::encode(&UpdateIssuePayload {
        remote_id: parent_id.clone(),
        local_id: parent_id.clone(),
        title: None,
        description: None,
        status: Some(next_status.as_str().to_string()),
        priority: None,
        assignee: None,
    })?;
    store.enqueue_outbox(kind::UPDATE_ISSUE, &payload)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lb_core::issue::Issue;

    #[test]
    fn propagate_sets_parent_in_progress_when_child_starts() {
        let store = Store::open_in_memory().unwrap();
        store.upsert_issue(&Issue::builder("parent").id("P").build()).unwrap();
        store.upsert_issue(&Issue::builder("child").id("C").build()).unwrap();
        store.add_dependency(&Dependency::new("C", "P", DependencyType::ParentChild, "x")).unwrap();

        propagate_parent_status(&store, "C", &Status::InProgress).unwrap();

        assert_eq!(store.get_issue("P").unwrap().status, Status::InProgress);
        let entry = store.peek_outbox().unwrap().unwrap();
        assert_eq!(entry.operation, kind::UPDATE_ISSUE);
    }

    #[test]
    fn propagate_reopens_parent_only_when_no_sibling_in_progress() {
        let store = Store::open_in_memory().unwrap();
        let mut parent = Issue::builder("parent").id("P").build();
        parent.status = Status::InProgress;
        store.upsert_issue(&parent).unwrap();
        store.upsert_issue(&Issue::builder("c1").id("C1").build()).unwrap();
        let mut c2 = Issue::builder("c2").id("C2").build();
        c2.status = Status::InProgress;
        store.upsert_issue(&c2).unwrap();
        store.add_dependency(&Dependency::new("C1", "P", DependencyType::ParentChild, "x")).unwrap();
        store.add_dependency(&Dependency::new("C2", "P", DependencyType::ParentChild, "x")).unwrap();

        // C2 is still in_progress, so closing C1 must not reopen P.
        propagate_parent_status(&store, "C1", &Status::Closed).unwrap();
        assert_eq!(store.get_issue("P").unwrap().status, Status::InProgress);

        store.close_issue("C2", chrono::Utc::now()).unwrap();
        propagate_parent_status(&store, "C2", &Status::Closed).unwrap();
        assert_eq!(store.get_issue("P").unwrap().status, Status::Open);
    }
}
