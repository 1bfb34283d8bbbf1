//! Tool dispatch rendered as text.

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use std::sync::Arc;

use serde_json::json;
use tfc::{ClientError, Dispatcher, Method, ResourceReader, ToolName};

use common::{MockTransport, args, client};

fn dispatcher(mock: &Arc<MockTransport>) -> Dispatcher {
    Dispatcher::new(Arc::new(client(mock)))
}

async fn call(dispatcher: &Dispatcher, name: &str, arguments: serde_json::Value) -> String {
    let results = dispatcher.dispatch(name, &args(arguments)).await;
    assert_eq!(results.len(), 1);
    results.into_iter().next().unwrap().text
}

#[tokio::test]
async fn test_lock_workspace_end_to_end() {
    let mock = MockTransport::new();
    mock.respond(200, json!({"data": {"id": "ws-1", "type": "workspaces"}}));
    let dispatcher = dispatcher(&mock);

    let text = call(
        &dispatcher,
        "lock_workspace",
        json!({"workspace_id": "ws-1", "reason": "maintenance"}),
    )
    .await;

    assert_eq!(text, "Successfully locked workspace ws-1");
    let sent = mock.last();
    assert_eq!(sent.method, Method::Post);
    assert_eq!(sent.path, "/workspaces/ws-1/actions/lock");
    assert_eq!(sent.body, Some(json!({"reason": "maintenance"})));
}

#[tokio::test]
async fn test_unknown_tool() {
    let mock = MockTransport::new();
    let dispatcher = dispatcher(&mock);

    let text = call(&dispatcher, "drop_database", json!({})).await;

    assert_eq!(text, "Unknown tool: drop_database");
    assert_eq!(mock.calls(), 0);
}

#[tokio::test]
async fn test_health_check_text() {
    let mock = MockTransport::new();
    mock.respond(200, json!({"data": {"id": "acme", "type": "organizations"}}))
        .respond(401, json!({"errors": [{"title": "unauthorized"}]}));
    let dispatcher = dispatcher(&mock);

    assert_eq!(call(&dispatcher, "health_check", json!({})).await, "HCP Terraform API is healthy");
    assert_eq!(
        call(&dispatcher, "health_check", json!({})).await,
        "HCP Terraform API is unhealthy"
    );
}

#[tokio::test]
async fn test_create_project_text() {
    let mock = MockTransport::new();
    mock.respond(201, json!({"data": {"id": "prj-42", "type": "projects"}}));
    let dispatcher = dispatcher(&mock);

    let text = call(
        &dispatcher,
        "create_project",
        json!({"name": "core", "description": "shared infra"}),
    )
    .await;

    assert_eq!(text, "Successfully created project 'core' with ID: prj-42");
    let body = mock.last().body.unwrap();
    assert_eq!(
        body["data"]["attributes"],
        json!({"name": "core", "description": "shared infra"})
    );
}

#[tokio::test]
async fn test_api_error_becomes_text() {
    let mock = MockTransport::new();
    mock.respond(
        422,
        json!({"errors": [{"title": "invalid attribute", "detail": "Name has already been taken"}]}),
    );
    let dispatcher = dispatcher(&mock);

    let text = call(&dispatcher, "create_workspace", json!({"name": "w1"})).await;

    assert_eq!(
        text,
        "API Error: API request failed with status 422: invalid attribute: Name has already been taken"
    );
}

#[tokio::test]
async fn test_invalid_arguments_become_text() {
    let mock = MockTransport::new();
    let dispatcher = dispatcher(&mock);

    let missing_name = call(&dispatcher, "create_project", json!({})).await;
    assert!(missing_name.starts_with("Invalid arguments:"), "{}", missing_name);

    let empty_update = call(&dispatcher, "update_project", json!({"project_id": "prj-1"})).await;
    assert!(empty_update.starts_with("Invalid arguments:"), "{}", empty_update);

    let no_scope = call(&dispatcher, "list_runs", json!({})).await;
    assert!(no_scope.contains("organization_runs"), "{}", no_scope);

    let wrong_type = call(&dispatcher, "get_run", json!({"run_id": 7})).await;
    assert!(wrong_type.starts_with("Invalid arguments:"), "{}", wrong_type);

    assert_eq!(mock.calls(), 0);
}

#[tokio::test]
async fn test_transport_error_becomes_text() {
    let mock = MockTransport::new();
    mock.fail(ClientError::Transport("connection refused".into()));
    let dispatcher = dispatcher(&mock);

    let text = call(&dispatcher, "get_workspace", json!({"workspace_id": "ws-1"})).await;

    assert_eq!(text, "Connection error: request failed: connection refused");
}

#[tokio::test]
async fn test_list_workspaces_text() {
    let mock = MockTransport::new();
    mock.respond(
        200,
        json!({"data": [
            {"id": "ws-1", "type": "workspaces", "attributes": {"name": "app", "locked": true}},
            {"id": "ws-2", "type": "workspaces", "attributes": {"name": "db"}}
        ]}),
    )
    .respond(200, json!({"data": []}));
    let dispatcher = dispatcher(&mock);

    let text = call(&dispatcher, "list_workspaces", json!({"search": "a"})).await;
    assert_eq!(text, "Found 2 workspace(s):\n- app (ID: ws-1) [LOCKED]\n- db (ID: ws-2)");
    assert_eq!(mock.last().query, vec![("search[name]".to_string(), "a".to_string())]);

    let text = call(&dispatcher, "list_workspaces", json!({})).await;
    assert_eq!(text, "No workspaces found");
}

#[tokio::test]
async fn test_list_runs_text() {
    let mock = MockTransport::new();
    mock.respond(
        200,
        json!({"data": [
            {"id": "run-1", "type": "runs", "attributes": {"status": "planned", "message": "nightly"}}
        ]}),
    );
    let dispatcher = dispatcher(&mock);

    let text = call(&dispatcher, "list_runs", json!({"organization_runs": true})).await;

    assert_eq!(text, "Found 1 run(s):\n- Run run-1: planned - nightly");
    assert_eq!(mock.last().path, "/organizations/acme/runs");
}

#[tokio::test]
async fn test_run_actions_text() {
    let mock = MockTransport::new();
    mock.respond_raw(202, "")
        .respond_raw(202, "")
        .respond_raw(202, "");
    let dispatcher = dispatcher(&mock);

    assert_eq!(
        call(&dispatcher, "apply_run", json!({"run_id": "run-1", "comment": "go"})).await,
        "Successfully applied run run-1"
    );
    assert_eq!(mock.last().body, Some(json!({"comment": "go"})));
    assert_eq!(
        call(&dispatcher, "cancel_run", json!({"run_id": "run-2"})).await,
        "Successfully cancelled run run-2"
    );
    assert_eq!(mock.last().body, Some(json!({})));
    assert_eq!(
        call(&dispatcher, "discard_run", json!({"run_id": "run-3"})).await,
        "Successfully discarded run run-3"
    );
    assert_eq!(mock.last().path, "/runs/run-3/actions/discard");
}

#[tokio::test]
async fn test_get_run_summary() {
    let mock = MockTransport::new();
    mock.respond(
        200,
        json!({"data": {
            "id": "run-1",
            "type": "runs",
            "attributes": {"status": "applied", "message": "deploy", "is-destroy": false},
            "relationships": {"workspace": {"data": {"id": "ws-1", "type": "workspaces"}}}
        }}),
    );
    let dispatcher = dispatcher(&mock);

    let text = call(&dispatcher, "get_run", json!({"run_id": "run-1"})).await;

    assert_eq!(
        text,
        "Run run-1: applied\nMessage: deploy\nDestroy: false\nWorkspace: ws-1"
    );
}

#[tokio::test]
async fn test_every_tool_renders_text() {
    for tool in ToolName::ALL {
        let mock = MockTransport::new();
        let dispatcher = dispatcher(&mock);
        let results = dispatcher.dispatch(tool.as_str(), &args(json!({}))).await;
        assert_eq!(results.len(), 1, "{}", tool);
        assert!(!results[0].text.is_empty(), "{}", tool);
    }
}

#[tokio::test]
async fn test_resource_listing_tolerates_project_failure() {
    let mock = MockTransport::new();
    mock.respond(500, json!({"errors": [{"title": "boom"}]}));
    let reader = ResourceReader::new(Arc::new(client(&mock)));

    let resources = reader.list().await;

    let uris: Vec<_> = resources.iter().map(|r| r.uri.as_str()).collect();
    assert_eq!(
        uris,
        vec![
            "terraform://organization/info",
            "terraform://projects",
            "terraform://workspaces"
        ]
    );
}

#[tokio::test]
async fn test_resource_listing_includes_projects() {
    let mock = MockTransport::new();
    mock.respond(
        200,
        json!({"data": [{"id": "prj-1", "type": "projects", "attributes": {"name": "core"}}]}),
    );
    let reader = ResourceReader::new(Arc::new(client(&mock)));

    let resources = reader.list().await;

    let project = resources.last().unwrap();
    assert_eq!(project.uri, "terraform://project/prj-1");
    assert_eq!(project.name, "Project: core");
    assert_eq!(project.mime_type, "application/json");
}

#[tokio::test]
async fn test_read_resources() {
    let mock = MockTransport::new();
    mock.respond(
        200,
        json!({"data": {"id": "acme", "type": "organizations", "attributes": {"email": "ops@acme.test"}}}),
    )
    .respond(200, json!({"data": {"id": "ws-1", "type": "workspaces", "attributes": {"name": "app"}}}))
    .respond(404, json!({"errors": [{"title": "not found"}]}));
    let reader = ResourceReader::new(Arc::new(client(&mock)));

    let org = reader.read("terraform://organization/info").await;
    assert!(org.is_json());
    let org: serde_json::Value = serde_json::from_str(&org.text).unwrap();
    assert_eq!(org["name"], "acme");
    assert_eq!(org["status"], "connected");
    assert_eq!(org["data"]["email"], "ops@acme.test");
    assert!(org["retrieved_at"].is_number());

    let workspace = reader.read("terraform://workspace/ws-1").await;
    let workspace: serde_json::Value = serde_json::from_str(&workspace.text).unwrap();
    assert_eq!(workspace["id"], "ws-1");
    assert_eq!(workspace["attributes"]["name"], "app");

    let missing = reader.read("terraform://run/run-404").await;
    assert!(!missing.is_json());
    assert!(missing.text.starts_with("API Error:"), "{}", missing.text);

    let unknown = reader.read("terraform://nothing").await;
    assert_eq!(unknown.text, "Unknown or empty resource: terraform://nothing");
    assert_eq!(mock.calls(), 3);
}
