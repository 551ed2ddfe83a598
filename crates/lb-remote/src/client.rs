//! A thin, typed layer over the Remote's API (§4.3). GraphQL-style: every
//! capability below is one POST with a JSON body; no REST routing, no
//! retry/backoff (that lives in the outbox, §4.4).

use serde_json::{json, Value};
use tracing::debug;

use crate::error::{RemoteError, Result};
use crate::types::{IssueScopeFilter, Page, RemoteIssue, RemoteLabel, RemoteRelation, RemoteTeam, RemoteUser};

const DEFAULT_ENDPOINT: &str = "https://api.linear.app/graphql";

pub struct RemoteClient {
    agent: ureq::Agent,
    endpoint: String,
    api_key: String,
}

impl RemoteClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            agent: ureq::Agent::new_with_defaults(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: api_key.into(),
        }
    }

    /// Overrides the endpoint -- used by tests against a mock server.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    fn post(&self, query: &str, variables: Value) -> Result<Value> {
        debug!(endpoint = %self.endpoint, "posting to remote");
        let body = json!({ "query": query, "variables": variables });
        let mut response = self
            .agent
            .post(&self.endpoint)
            .header("Authorization", &self.api_key)
            .header("Content-Type", "application/json")
            .send_json(&body)?;

        let parsed: Value = response.body_mut().read_json()?;
        if let Some(errors) = parsed.get("errors").and_then(Value::as_array) {
            if let Some(first) = errors.first() {
                let message = first
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("remote rejected request")
                    .to_string();
                return Err(RemoteError::Rejected { message });
            }
        }
        parsed
            .get("data")
            .cloned()
            .ok_or_else(|| RemoteError::Decode("response missing `data`".into()))
    }

    pub fn identify_current_user(&self) -> Result<RemoteUser> {
        let data = self.post("query { viewer { id email name } }", json!({}))?;
        Ok(serde_json::from_value(
            data.get("viewer").cloned().unwrap_or(Value::Null),
        )?)
    }

    pub fn list_teams(&self) -> Result<Vec<RemoteTeam>> {
        let data = self.post("query { teams { nodes { id key name } } }", json!({}))?;
        let nodes = data
            .pointer("/teams/nodes")
            .cloned()
            .unwrap_or(Value::Array(vec![]));
        Ok(serde_json::from_value(nodes)?)
    }

    pub fn resolve_team_by_key(&self, key: &str) -> Result<Option<RemoteTeam>> {
        Ok(self.list_teams()?.into_iter().find(|t| t.key == key))
    }

    pub fn get_or_create_label(&self, team_id: &str, name: &str) -> Result<RemoteLabel> {
        let data = self.post(
            "mutation($teamId: String!, $name: String!) { issueLabelGetOrCreate(teamId: $teamId, name: $name) { id name } }",
            json!({ "teamId": team_id, "name": name }),
        )?;
        Ok(serde_json::from_value(
            data.get("issueLabelGetOrCreate").cloned().unwrap_or(Value::Null),
        )?)
    }

    pub fn create_issue(&self, team_id: &str, title: &str, description: &str, priority: i32) -> Result<RemoteIssue> {
        let data = self.post(
            "mutation($teamId: String!, $title: String!, $description: String!, $priority: Int!) { issueCreate(teamId: $teamId, title: $title, description: $description, priority: $priority) { issue { id identifier title description workflowStateType workflowStateId priority assigneeEmail createdAt updatedAt parentId } } }",
            json!({ "teamId": team_id, "title": title, "description": description, "priority": priority }),
        )?;
        parse_issue(data.pointer("/issueCreate/issue"))
    }

    pub fn update_issue(&self, remote_id: &str, fields: Value) -> Result<RemoteIssue> {
        let data = self.post(
            "mutation($id: String!, $input: IssueUpdateInput!) { issueUpdate(id: $id, input: $input) { issue { id identifier title description workflowStateType workflowStateId priority assigneeEmail createdAt updatedAt parentId } } }",
            json!({ "id": remote_id, "input": fields }),
        )?;
        parse_issue(data.pointer("/issueUpdate/issue"))
    }

    pub fn delete_issue(&self, remote_id: &str) -> Result<()> {
        self.post(
            "mutation($id: String!) { issueDelete(id: $id) { success } }",
            json!({ "id": remote_id }),
        )?;
        Ok(())
    }

    pub fn set_issue_parent(&self, remote_id: &str, parent_id: Option<&str>) -> Result<()> {
        self.post(
            "mutation($id: String!, $parentId: String) { issueUpdate(id: $id, input: { parentId: $parentId }) { success } }",
            json!({ "id": remote_id, "parentId": parent_id }),
        )?;
        Ok(())
    }

    pub fn create_relation(&self, issue_id: &str, related_issue_id: &str, relation_type: &str) -> Result<()> {
        self.post(
            "mutation($issueId: String!, $relatedIssueId: String!, $type: String!) { issueRelationCreate(issueId: $issueId, relatedIssueId: $relatedIssueId, type: $type) { success } }",
            json!({ "issueId": issue_id, "relatedIssueId": related_issue_id, "type": relation_type }),
        )?;
        Ok(())
    }

    pub fn delete_relation(&self, issue_id: &str, related_issue_id: &str) -> Result<()> {
        self.post(
            "mutation($issueId: String!, $relatedIssueId: String!) { issueRelationDelete(issueId: $issueId, relatedIssueId: $relatedIssueId) { success } }",
            json!({ "issueId": issue_id, "relatedIssueId": related_issue_id }),
        )?;
        Ok(())
    }

    pub fn create_comment(&self, issue_id: &str, body: &str) -> Result<()> {
        self.post(
            "mutation($issueId: String!, $body: String!) { commentCreate(issueId: $issueId, body: $body) { success } }",
            json!({ "issueId": issue_id, "body": body }),
        )?;
        Ok(())
    }

    /// Fetches one page of issues under `filter`'s repo scope (§4.3, §4.5).
    pub fn fetch_issues(&self, filter: &IssueScopeFilter) -> Result<Page<RemoteIssue>> {
        let data = self.post(
            "query($teamId: String!, $label: String, $project: String, $since: DateTime, $after: String, $first: Int!) { \
                issues(teamId: $teamId, label: $label, project: $project, updatedSince: $since, after: $after, first: $first) { \
                    nodes { id identifier title description workflowStateType workflowStateId priority assigneeEmail createdAt updatedAt parentId } \
                    pageInfo { endCursor } \
                } \
             }",
            json!({
                "teamId": filter.team_id,
                "label": filter.label_name,
                "project": filter.project_name,
                "since": filter.updated_since,
                "after": filter.cursor,
                "first": filter.page_size,
            }),
        )?;
        let nodes = data.pointer("/issues/nodes").cloned().unwrap_or(Value::Array(vec![]));
        let items: Vec<RemoteIssue> = serde_json::from_value(nodes)?;
        let next_cursor = data
            .pointer("/issues/pageInfo/endCursor")
            .and_then(Value::as_str)
            .map(str::to_string);
        Ok(Page { items, next_cursor })
    }

    /// Outgoing + incoming relations for one issue (§4.3).
    pub fn fetch_relations(&self, issue_id: &str) -> Result<Vec<RemoteRelation>> {
        let data = self.post(
            "query($id: String!) { issueRelations(issueId: $id) { issueId relatedIssueId relationType } }",
            json!({ "id": issue_id }),
        )?;
        let nodes = data.get("issueRelations").cloned().unwrap_or(Value::Array(vec![]));
        Ok(serde_json::from_value(nodes)?)
    }

    /// Fetches a single issue together with its relations, used by
    /// `show <id> --sync` (§4.5).
    pub fn fetch_issue_with_relations(&self, remote_id: &str) -> Result<(RemoteIssue, Vec<RemoteRelation>)> {
        let data = self.post(
            "query($id: String!) { issue(id: $id) { id identifier title description workflowStateType workflowStateId priority assigneeEmail createdAt updatedAt parentId relations { issueId relatedIssueId relationType } } }",
            json!({ "id": remote_id }),
        )?;
        let issue = parse_issue(data.get("issue"))?;
        let relations_json = data.pointer("/issue/relations").cloned().unwrap_or(Value::Array(vec![]));
        let relations: Vec<RemoteRelation> = serde_json::from_value(relations_json)?;
        Ok((issue, relations))
    }
}

fn parse_issue(value: Option<&Value>) -> Result<RemoteIssue> {
    let value = value.cloned().unwrap_or(Value::Null);
    Ok(serde_json::from_value(value)?)
}
