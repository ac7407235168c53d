//! Task-management tools backed by the todo bridge.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::error::ToolError;
use crate::mcp::McpClient;
use crate::tools::tool::{optional_str, require_str};
use crate::tools::{bridge_call, Tool, ToolOutput, ToolRegistry};

/// Register every todo tool against the given bridge client.
pub fn register_tools(registry: &mut ToolRegistry, client: &McpClient) {
    registry.register(Arc::new(ListTaskListsTool::new(client.clone())));
    registry.register(Arc::new(CreateTaskListTool::new(client.clone())));
    registry.register(Arc::new(DeleteTaskListTool::new(client.clone())));
    registry.register(Arc::new(ListTasksTool::new(client.clone())));
    registry.register(Arc::new(CreateTaskTool::new(client.clone())));
    registry.register(Arc::new(UpdateTaskTool::new(client.clone())));
    registry.register(Arc::new(CompleteTaskTool::new(client.clone())));
    registry.register(Arc::new(UncompleteTaskTool::new(client.clone())));
    registry.register(Arc::new(DeleteTaskTool::new(client.clone())));
}

fn list_id_schema() -> Value {
    json!({"type": "string", "description": "The ID of the task list"})
}

fn task_id_schema() -> Value {
    json!({"type": "string", "description": "The ID of the task"})
}

/// Render one task as a numbered line with a status glyph.
fn format_task_line(index: usize, task: &Value) -> String {
    let status_icon = if task.get("status").and_then(Value::as_str) == Some("completed") {
        "✅"
    } else {
        "⏳"
    };
    let title = task.get("title").and_then(Value::as_str).unwrap_or("(untitled)");
    let id = task.get("id").and_then(Value::as_str).unwrap_or("unknown");
    let due = task
        .get("dueDate")
        .and_then(Value::as_str)
        .filter(|d| !d.is_empty())
        .map(|d| format!(" (Due: {d})"))
        .unwrap_or_default();
    let description = task
        .get("description")
        .and_then(Value::as_str)
        .filter(|d| !d.is_empty())
        .map(|d| {
            let short: String = d.chars().take(50).collect();
            format!(" - {short}...")
        })
        .unwrap_or_default();
    format!("{index}. {status_icon} {title}{due}{description} (ID: {id})")
}

pub struct ListTaskListsTool {
    client: McpClient,
}

impl ListTaskListsTool {
    pub fn new(client: McpClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for ListTaskListsTool {
    fn name(&self) -> &str {
        "list_task_lists"
    }

    fn description(&self) -> &str {
        "Get all task lists for the user"
    }

    fn parameters_schema(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    async fn execute(&self, _params: Value) -> Result<ToolOutput, ToolError> {
        let payload = bridge_call!(&self.client, "list_task_lists", json!({}));

        let empty = Vec::new();
        let lists = payload
            .get("taskLists")
            .and_then(Value::as_array)
            .unwrap_or(&empty);
        if lists.is_empty() {
            return Ok(ToolOutput::text("No task lists found."));
        }

        let mut output = format!("Found {} task lists:\n", lists.len());
        for (i, list) in lists.iter().enumerate() {
            let name = list.get("name").and_then(Value::as_str).unwrap_or("(unnamed)");
            let id = list.get("id").and_then(Value::as_str).unwrap_or("unknown");
            let shared = if list.get("isShared").and_then(Value::as_bool).unwrap_or(false) {
                " (Shared)"
            } else {
                ""
            };
            output.push_str(&format!("{}. {name} (ID: {id}){shared}\n", i + 1));
        }
        Ok(ToolOutput::text(output))
    }
}

pub struct CreateTaskListTool {
    client: McpClient,
}

impl CreateTaskListTool {
    pub fn new(client: McpClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for CreateTaskListTool {
    fn name(&self) -> &str {
        "create_task_list"
    }

    fn description(&self) -> &str {
        "Create a new task list"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "name": {"type": "string", "description": "The name for the new task list"}
            },
            "required": ["name"]
        })
    }

    async fn execute(&self, params: Value) -> Result<ToolOutput, ToolError> {
        let name = require_str(self.name(), &params, "name")?;
        let payload = bridge_call!(&self.client, "create_task_list", json!({"name": name}));

        if payload.get("success").and_then(Value::as_bool).unwrap_or(false) {
            let list = &payload["taskList"];
            let created = list.get("name").and_then(Value::as_str).unwrap_or(name);
            let id = list.get("id").and_then(Value::as_str).unwrap_or("unknown");
            return Ok(ToolOutput::text(format!(
                "Created task list '{created}' (ID: {id})"
            )));
        }
        Ok(ToolOutput::text("Failed to create task list"))
    }
}

pub struct DeleteTaskListTool {
    client: McpClient,
}

impl DeleteTaskListTool {
    pub fn new(client: McpClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for DeleteTaskListTool {
    fn name(&self) -> &str {
        "delete_task_list"
    }

    fn description(&self) -> &str {
        "Delete a task list"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {"list_id": list_id_schema()},
            "required": ["list_id"]
        })
    }

    async fn execute(&self, params: Value) -> Result<ToolOutput, ToolError> {
        let list_id = require_str(self.name(), &params, "list_id")?;
        let payload = bridge_call!(&self.client, "delete_task_list", json!({"list_id": list_id}));

        if payload.get("success").and_then(Value::as_bool).unwrap_or(false) {
            return Ok(ToolOutput::text(format!("Deleted task list (ID: {list_id})")));
        }
        Ok(ToolOutput::text("Failed to delete task list"))
    }
}

pub struct ListTasksTool {
    client: McpClient,
}

impl ListTasksTool {
    pub fn new(client: McpClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for ListTasksTool {
    fn name(&self) -> &str {
        "list_tasks"
    }

    fn description(&self) -> &str {
        "Get all tasks in a specific task list"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {"list_id": list_id_schema()},
            "required": ["list_id"]
        })
    }

    async fn execute(&self, params: Value) -> Result<ToolOutput, ToolError> {
        let list_id = require_str(self.name(), &params, "list_id")?;
        let payload = bridge_call!(&self.client, "list_tasks", json!({"list_id": list_id}));

        let empty = Vec::new();
        let tasks = payload.get("tasks").and_then(Value::as_array).unwrap_or(&empty);
        if tasks.is_empty() {
            return Ok(ToolOutput::text(format!(
                "No tasks found in this list (ID: {list_id})"
            )));
        }

        let mut output = format!("Found {} tasks:\n", tasks.len());
        for (i, task) in tasks.iter().enumerate() {
            output.push_str(&format_task_line(i + 1, task));
            output.push('\n');
        }
        Ok(ToolOutput::text(output))
    }
}

pub struct CreateTaskTool {
    client: McpClient,
}

impl CreateTaskTool {
    pub fn new(client: McpClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for CreateTaskTool {
    fn name(&self) -> &str {
        "create_task"
    }

    fn description(&self) -> &str {
        "Create a new task in a task list"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "list_id": list_id_schema(),
                "title": {"type": "string", "description": "The title of the task"},
                "description": {"type": "string", "description": "The description of the task"},
                "due_date": {"type": "string", "description": "The due date in YYYY-MM-DD format"}
            },
            "required": ["list_id", "title"]
        })
    }

    async fn execute(&self, params: Value) -> Result<ToolOutput, ToolError> {
        let list_id = require_str(self.name(), &params, "list_id")?;
        let title = require_str(self.name(), &params, "title")?;
        let args = json!({
            "list_id": list_id,
            "title": title,
            "description": optional_str(&params, "description").unwrap_or(""),
            "due_date": optional_str(&params, "due_date").unwrap_or(""),
        });
        let payload = bridge_call!(&self.client, "create_task", args);

        if payload.get("success").and_then(Value::as_bool).unwrap_or(false) {
            let task = &payload["task"];
            let created = task.get("title").and_then(Value::as_str).unwrap_or(title);
            let id = task.get("id").and_then(Value::as_str).unwrap_or("unknown");
            let due = task
                .get("dueDate")
                .and_then(Value::as_str)
                .filter(|d| !d.is_empty())
                .map(|d| format!(" (Due: {d})"))
                .unwrap_or_default();
            return Ok(ToolOutput::text(format!(
                "Created task '{created}'{due} (ID: {id})"
            )));
        }
        Ok(ToolOutput::text("Failed to create task"))
    }
}

pub struct UpdateTaskTool {
    client: McpClient,
}

impl UpdateTaskTool {
    pub fn new(client: McpClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for UpdateTaskTool {
    fn name(&self) -> &str {
        "update_task"
    }

    fn description(&self) -> &str {
        "Update an existing task's title, description, due date, or status"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "list_id": list_id_schema(),
                "task_id": task_id_schema(),
                "title": {"type": "string", "description": "New title for the task"},
                "description": {"type": "string", "description": "New description for the task"},
                "due_date": {"type": "string", "description": "New due date in YYYY-MM-DD format, empty string to remove"},
                "status": {"type": "string", "description": "New status, either notStarted or completed"}
            },
            "required": ["list_id", "task_id"]
        })
    }

    async fn execute(&self, params: Value) -> Result<ToolOutput, ToolError> {
        let list_id = require_str(self.name(), &params, "list_id")?;
        let task_id = require_str(self.name(), &params, "task_id")?;

        let mut args = Map::new();
        args.insert("list_id".into(), json!(list_id));
        args.insert("task_id".into(), json!(task_id));
        for key in ["title", "description", "due_date", "status"] {
            if let Some(value) = optional_str(&params, key) {
                args.insert(key.into(), json!(value));
            }
        }
        let payload = bridge_call!(&self.client, "update_task", Value::Object(args));

        if payload.get("success").and_then(Value::as_bool).unwrap_or(false) {
            let task = &payload["task"];
            let title = task.get("title").and_then(Value::as_str).unwrap_or("(untitled)");
            let id = task.get("id").and_then(Value::as_str).unwrap_or(task_id);
            return Ok(ToolOutput::text(format!("Updated task '{title}' (ID: {id})")));
        }
        Ok(ToolOutput::text("Failed to update task"))
    }
}

pub struct CompleteTaskTool {
    client: McpClient,
}

impl CompleteTaskTool {
    pub fn new(client: McpClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for CompleteTaskTool {
    fn name(&self) -> &str {
        "complete_task"
    }

    fn description(&self) -> &str {
        "Mark a task as completed"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {"list_id": list_id_schema(), "task_id": task_id_schema()},
            "required": ["list_id", "task_id"]
        })
    }

    async fn execute(&self, params: Value) -> Result<ToolOutput, ToolError> {
        let list_id = require_str(self.name(), &params, "list_id")?;
        let task_id = require_str(self.name(), &params, "task_id")?;
        let payload = bridge_call!(
            &self.client,
            "complete_task",
            json!({"list_id": list_id, "task_id": task_id})
        );

        if payload.get("success").and_then(Value::as_bool).unwrap_or(false) {
            let title = payload["task"]
                .get("title")
                .and_then(Value::as_str)
                .unwrap_or("(untitled)");
            return Ok(ToolOutput::text(format!(
                "Completed task '{title}' (ID: {task_id})"
            )));
        }
        Ok(ToolOutput::text("Failed to complete task"))
    }
}

pub struct UncompleteTaskTool {
    client: McpClient,
}

impl UncompleteTaskTool {
    pub fn new(client: McpClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for UncompleteTaskTool {
    fn name(&self) -> &str {
        "uncomplete_task"
    }

    fn description(&self) -> &str {
        "Mark a completed task as not started"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {"list_id": list_id_schema(), "task_id": task_id_schema()},
            "required": ["list_id", "task_id"]
        })
    }

    async fn execute(&self, params: Value) -> Result<ToolOutput, ToolError> {
        let list_id = require_str(self.name(), &params, "list_id")?;
        let task_id = require_str(self.name(), &params, "task_id")?;
        let payload = bridge_call!(
            &self.client,
            "uncomplete_task",
            json!({"list_id": list_id, "task_id": task_id})
        );

        if payload.get("success").and_then(Value::as_bool).unwrap_or(false) {
            let title = payload["task"]
                .get("title")
                .and_then(Value::as_str)
                .unwrap_or("(untitled)");
            return Ok(ToolOutput::text(format!(
                "Marked task '{title}' as not started (ID: {task_id})"
            )));
        }
        Ok(ToolOutput::text("Failed to mark task as not started"))
    }
}

pub struct DeleteTaskTool {
    client: McpClient,
}

impl DeleteTaskTool {
    pub fn new(client: McpClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for DeleteTaskTool {
    fn name(&self) -> &str {
        "delete_task"
    }

    fn description(&self) -> &str {
        "Delete a task from a task list"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {"list_id": list_id_schema(), "task_id": task_id_schema()},
            "required": ["list_id", "task_id"]
        })
    }

    async fn execute(&self, params: Value) -> Result<ToolOutput, ToolError> {
        let list_id = require_str(self.name(), &params, "list_id")?;
        let task_id = require_str(self.name(), &params, "task_id")?;
        let payload = bridge_call!(
            &self.client,
            "delete_task",
            json!({"list_id": list_id, "task_id": task_id})
        );

        if payload.get("success").and_then(Value::as_bool).unwrap_or(false) {
            return Ok(ToolOutput::text(format!("Deleted task (ID: {task_id})")));
        }
        Ok(ToolOutput::text("Failed to delete task"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::testing::{tool_result, FakeTransport};

    fn client_with(payloads: Vec<Value>) -> McpClient {
        let responses = payloads.into_iter().map(|p| Ok(tool_result(p))).collect();
        McpClient::new(FakeTransport::with_responses(responses))
    }

    #[tokio::test]
    async fn list_task_lists_formats_numbered_output() {
        let client = client_with(vec![json!({
            "taskLists": [
                {"id": "l1", "name": "Work", "isShared": false},
                {"id": "l2", "name": "Family", "isShared": true},
            ]
        })]);
        let tool = ListTaskListsTool::new(client);

        let out = tool.execute(json!({})).await.unwrap();
        assert!(out.text.contains("Found 2 task lists"));
        assert!(out.text.contains("1. Work (ID: l1)"));
        assert!(out.text.contains("2. Family (ID: l2) (Shared)"));
    }

    #[tokio::test]
    async fn list_tasks_renders_status_and_due_date() {
        let client = client_with(vec![json!({
            "tasks": [
                {"id": "t1", "title": "Buy milk", "status": "completed"},
                {"id": "t2", "title": "File taxes", "status": "notStarted", "dueDate": "2026-04-15"},
            ]
        })]);
        let tool = ListTasksTool::new(client);

        let out = tool.execute(json!({"list_id": "l1"})).await.unwrap();
        assert!(out.text.contains("1. ✅ Buy milk (ID: t1)"));
        assert!(out.text.contains("2. ⏳ File taxes (Due: 2026-04-15) (ID: t2)"));
    }

    #[tokio::test]
    async fn bridge_error_payload_becomes_text() {
        let client = client_with(vec![json!({"error": "Authentication failed"})]);
        let tool = ListTasksTool::new(client);

        let out = tool.execute(json!({"list_id": "l1"})).await.unwrap();
        assert_eq!(out.text, "Error: Authentication failed");
    }

    #[tokio::test]
    async fn transport_failure_becomes_text() {
        let client = McpClient::new(FakeTransport::with_responses(vec![Err(
            crate::error::McpError::Unreachable {
                endpoint: "http://127.0.0.1:8080/mcp/".into(),
                reason: "connection refused".into(),
            },
        )]));
        let tool = ListTaskListsTool::new(client);

        let out = tool.execute(json!({})).await.unwrap();
        assert!(out.text.starts_with("Error calling bridge tool list_task_lists"));
    }

    #[tokio::test]
    async fn create_task_requires_title() {
        let client = client_with(vec![]);
        let tool = CreateTaskTool::new(client);

        let err = tool.execute(json!({"list_id": "l1"})).await.unwrap_err();
        assert!(err.to_string().contains("title"));
    }

    #[tokio::test]
    async fn update_task_forwards_only_present_fields() {
        let transport = FakeTransport::with_responses(vec![Ok(tool_result(json!({
            "success": true,
            "task": {"id": "t1", "title": "New title"}
        })))]);
        let tool = UpdateTaskTool::new(McpClient::new(transport.clone()));

        let out = tool
            .execute(json!({"list_id": "l1", "task_id": "t1", "title": "New title"}))
            .await
            .unwrap();
        assert!(out.text.contains("Updated task 'New title'"));

        let requests = transport.requests.lock().await;
        let args = &requests[0].1["arguments"];
        assert_eq!(args["title"], "New title");
        assert!(args.get("status").is_none());
        assert!(args.get("due_date").is_none());
    }

    #[tokio::test]
    async fn complete_task_reports_title() {
        let client = client_with(vec![json!({
            "success": true,
            "task": {"id": "t1", "title": "Buy milk", "status": "completed"}
        })]);
        let tool = CompleteTaskTool::new(client);

        let out = tool
            .execute(json!({"list_id": "l1", "task_id": "t1"}))
            .await
            .unwrap();
        assert_eq!(out.text, "Completed task 'Buy milk' (ID: t1)");
    }

    #[tokio::test]
    async fn register_tools_adds_all_nine() {
        let mut registry = ToolRegistry::new();
        let client = client_with(vec![]);
        register_tools(&mut registry, &client);
        assert_eq!(registry.len(), 9);
        assert!(registry.get("list_task_lists").is_some());
        assert!(registry.get("delete_task").is_some());
    }
}
