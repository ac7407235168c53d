//! Email tools backed by the gmail bridge.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::error::ToolError;
use crate::mcp::McpClient;
use crate::tools::tool::{optional_str, optional_u64, require_str};
use crate::tools::{bridge_call, Tool, ToolOutput, ToolRegistry};

const DEFAULT_MAX_RESULTS: u64 = 10;
const BODY_PREVIEW_CHARS: usize = 1000;

/// Register every email tool against the given bridge client.
pub fn register_tools(registry: &mut ToolRegistry, client: &McpClient) {
    registry.register(Arc::new(ListMessagesTool::new(client.clone())));
    registry.register(Arc::new(GetMessageTool::new(client.clone())));
    registry.register(Arc::new(SearchMessagesTool::new(client.clone())));
    registry.register(Arc::new(SendMessageTool::new(client.clone())));
    registry.register(Arc::new(ReplyToMessageTool::new(client.clone())));
    registry.register(Arc::new(MarkAsReadTool::new(client.clone())));
    registry.register(Arc::new(MarkAsUnreadTool::new(client.clone())));
    registry.register(Arc::new(AddLabelTool::new(client.clone())));
    registry.register(Arc::new(RemoveLabelTool::new(client.clone())));
    registry.register(Arc::new(ListLabelsTool::new(client.clone())));
}

fn message_id_schema() -> Value {
    json!({"type": "string", "description": "The ID of the message"})
}

fn str_field<'a>(value: &'a Value, key: &str, fallback: &'a str) -> &'a str {
    value.get(key).and_then(Value::as_str).unwrap_or(fallback)
}

fn truncated(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

fn joined_labels(value: &Value, limit: usize) -> String {
    value
        .get("labelIds")
        .and_then(Value::as_array)
        .map(|labels| {
            labels
                .iter()
                .filter_map(Value::as_str)
                .take(limit)
                .collect::<Vec<_>>()
                .join(", ")
        })
        .unwrap_or_default()
}

pub struct ListMessagesTool {
    client: McpClient,
}

impl ListMessagesTool {
    pub fn new(client: McpClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for ListMessagesTool {
    fn name(&self) -> &str {
        "list_messages"
    }

    fn description(&self) -> &str {
        "Get email messages with an optional search query"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {"type": "string", "description": "Search query, e.g. 'from:user@example.com is:unread'"},
                "max_results": {"type": "integer", "description": "Maximum number of messages to return"}
            }
        })
    }

    async fn execute(&self, params: Value) -> Result<ToolOutput, ToolError> {
        let query = optional_str(&params, "query").unwrap_or("");
        let max_results = optional_u64(&params, "max_results").unwrap_or(DEFAULT_MAX_RESULTS);
        let payload = bridge_call!(
            &self.client,
            "list_messages",
            json!({"query": query, "max_results": max_results})
        );

        let empty = Vec::new();
        let messages = payload
            .get("messages")
            .and_then(Value::as_array)
            .unwrap_or(&empty);
        let query_info = if query.is_empty() {
            String::new()
        } else {
            format!(" for query: {query}")
        };
        if messages.is_empty() {
            return Ok(ToolOutput::text(format!("No messages found{query_info}.")));
        }

        let mut output = format!("Found {} messages{query_info}:\n\n", messages.len());
        for (i, msg) in messages.iter().enumerate() {
            output.push_str(&format!(
                "{}. From: {}\n   Subject: {}\n   Date: {}\n   Labels: {}\n   ID: {}\n\n",
                i + 1,
                truncated(str_field(msg, "from", "Unknown"), 30),
                truncated(str_field(msg, "subject", "No Subject"), 50),
                truncated(str_field(msg, "date", "Unknown"), 20),
                joined_labels(msg, 3),
                str_field(msg, "id", "Unknown"),
            ));
        }
        Ok(ToolOutput::text(output))
    }
}

pub struct GetMessageTool {
    client: McpClient,
}

impl GetMessageTool {
    pub fn new(client: McpClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for GetMessageTool {
    fn name(&self) -> &str {
        "get_message"
    }

    fn description(&self) -> &str {
        "Get full details of a specific email message"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {"message_id": message_id_schema()},
            "required": ["message_id"]
        })
    }

    async fn execute(&self, params: Value) -> Result<ToolOutput, ToolError> {
        let message_id = require_str(self.name(), &params, "message_id")?;
        let payload = bridge_call!(&self.client, "get_message", json!({"message_id": message_id}));

        let message = match payload.get("message") {
            Some(m) if m.is_object() => m,
            _ => return Ok(ToolOutput::text("Message not found.")),
        };

        let mut output = String::from("Message details:\n");
        output.push_str(&format!("From: {}\n", str_field(message, "from", "Unknown")));
        output.push_str(&format!("To: {}\n", str_field(message, "to", "Unknown")));
        output.push_str(&format!(
            "Subject: {}\n",
            str_field(message, "subject", "No Subject")
        ));
        output.push_str(&format!("Date: {}\n", str_field(message, "date", "Unknown")));
        output.push_str(&format!("Labels: {}\n", joined_labels(message, usize::MAX)));
        if let Some(cc) = optional_str(message, "cc").filter(|c| !c.is_empty()) {
            output.push_str(&format!("CC: {cc}\n"));
        }

        if let Some(body) = optional_str(message, "body").filter(|b| !b.is_empty()) {
            output.push_str(&format!("\nBody:\n{}", truncated(body, BODY_PREVIEW_CHARS)));
            if body.chars().count() > BODY_PREVIEW_CHARS {
                output.push_str("... (truncated)");
            }
        }

        if let Some(attachments) = message.get("attachments").and_then(Value::as_array) {
            if !attachments.is_empty() {
                output.push_str(&format!("\n\nAttachments ({}):\n", attachments.len()));
                for att in attachments {
                    output.push_str(&format!(
                        "  - {} ({})\n",
                        str_field(att, "filename", "Unknown"),
                        str_field(att, "mimeType", "Unknown type"),
                    ));
                }
            }
        }
        Ok(ToolOutput::text(output))
    }
}

pub struct SearchMessagesTool {
    client: McpClient,
}

impl SearchMessagesTool {
    pub fn new(client: McpClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for SearchMessagesTool {
    fn name(&self) -> &str {
        "search_messages"
    }

    fn description(&self) -> &str {
        "Search email messages with advanced query syntax"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {"type": "string", "description": "Search query, e.g. 'from:boss@company.com after:2023/01/01'"},
                "max_results": {"type": "integer", "description": "Maximum number of results"}
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, params: Value) -> Result<ToolOutput, ToolError> {
        let query = require_str(self.name(), &params, "query")?;
        let max_results = optional_u64(&params, "max_results").unwrap_or(DEFAULT_MAX_RESULTS);
        let payload = bridge_call!(
            &self.client,
            "search_messages",
            json!({"query": query, "max_results": max_results})
        );

        let empty = Vec::new();
        let messages = payload
            .get("messages")
            .and_then(Value::as_array)
            .unwrap_or(&empty);
        if messages.is_empty() {
            return Ok(ToolOutput::text(format!(
                "No messages found for search query: {query}"
            )));
        }

        let mut output = format!("Search results ({} messages) for: {query}\n\n", messages.len());
        for (i, msg) in messages.iter().enumerate() {
            output.push_str(&format!(
                "{}. {}\n   From: {}\n   Date: {}\n   ID: {}\n\n",
                i + 1,
                str_field(msg, "subject", "No Subject"),
                str_field(msg, "from", "Unknown"),
                str_field(msg, "date", "Unknown"),
                str_field(msg, "id", "Unknown"),
            ));
        }
        Ok(ToolOutput::text(output))
    }
}

pub struct SendMessageTool {
    client: McpClient,
}

impl SendMessageTool {
    pub fn new(client: McpClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for SendMessageTool {
    fn name(&self) -> &str {
        "send_message"
    }

    fn description(&self) -> &str {
        "Send a new email message"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "to": {"type": "string", "description": "Recipient email address"},
                "subject": {"type": "string", "description": "Email subject"},
                "body": {"type": "string", "description": "Email body content"},
                "cc": {"type": "string", "description": "CC recipients"},
                "bcc": {"type": "string", "description": "BCC recipients"}
            },
            "required": ["to", "subject", "body"]
        })
    }

    async fn execute(&self, params: Value) -> Result<ToolOutput, ToolError> {
        let to = require_str(self.name(), &params, "to")?;
        let subject = require_str(self.name(), &params, "subject")?;
        let body = require_str(self.name(), &params, "body")?;

        let mut args = Map::new();
        args.insert("to".into(), json!(to));
        args.insert("subject".into(), json!(subject));
        args.insert("body".into(), json!(body));
        for key in ["cc", "bcc"] {
            if let Some(value) = optional_str(&params, key).filter(|v| !v.is_empty()) {
                args.insert(key.into(), json!(value));
            }
        }
        let payload = bridge_call!(&self.client, "send_message", Value::Object(args));

        if payload.get("success").and_then(Value::as_bool).unwrap_or(false) {
            let message_id = str_field(&payload, "messageId", "Unknown");
            return Ok(ToolOutput::text(format!(
                "Email sent.\nTo: {to}\nSubject: {subject}\nMessage ID: {message_id}"
            )));
        }
        Ok(ToolOutput::text("Failed to send email."))
    }
}

pub struct ReplyToMessageTool {
    client: McpClient,
}

impl ReplyToMessageTool {
    pub fn new(client: McpClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for ReplyToMessageTool {
    fn name(&self) -> &str {
        "reply_to_message"
    }

    fn description(&self) -> &str {
        "Reply to an existing email message"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "message_id": message_id_schema(),
                "reply_body": {"type": "string", "description": "Content of the reply"}
            },
            "required": ["message_id", "reply_body"]
        })
    }

    async fn execute(&self, params: Value) -> Result<ToolOutput, ToolError> {
        let message_id = require_str(self.name(), &params, "message_id")?;
        let reply_body = require_str(self.name(), &params, "reply_body")?;
        let payload = bridge_call!(
            &self.client,
            "reply_to_message",
            json!({"message_id": message_id, "reply_body": reply_body})
        );

        if payload.get("success").and_then(Value::as_bool).unwrap_or(false) {
            let reply_id = str_field(&payload, "messageId", "Unknown");
            return Ok(ToolOutput::text(format!(
                "Reply sent.\nOriginal message ID: {message_id}\nReply ID: {reply_id}"
            )));
        }
        Ok(ToolOutput::text("Failed to send reply."))
    }
}

pub struct MarkAsReadTool {
    client: McpClient,
}

impl MarkAsReadTool {
    pub fn new(client: McpClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for MarkAsReadTool {
    fn name(&self) -> &str {
        "mark_message_as_read"
    }

    fn description(&self) -> &str {
        "Mark an email message as read"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {"message_id": message_id_schema()},
            "required": ["message_id"]
        })
    }

    async fn execute(&self, params: Value) -> Result<ToolOutput, ToolError> {
        let message_id = require_str(self.name(), &params, "message_id")?;
        let payload = bridge_call!(
            &self.client,
            "mark_message_as_read",
            json!({"message_id": message_id})
        );

        if payload.get("success").and_then(Value::as_bool).unwrap_or(false) {
            return Ok(ToolOutput::text(format!(
                "Message marked as read (ID: {message_id})"
            )));
        }
        Ok(ToolOutput::text("Failed to mark message as read."))
    }
}

pub struct MarkAsUnreadTool {
    client: McpClient,
}

impl MarkAsUnreadTool {
    pub fn new(client: McpClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for MarkAsUnreadTool {
    fn name(&self) -> &str {
        "mark_message_as_unread"
    }

    fn description(&self) -> &str {
        "Mark an email message as unread"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {"message_id": message_id_schema()},
            "required": ["message_id"]
        })
    }

    async fn execute(&self, params: Value) -> Result<ToolOutput, ToolError> {
        let message_id = require_str(self.name(), &params, "message_id")?;
        let payload = bridge_call!(
            &self.client,
            "mark_message_as_unread",
            json!({"message_id": message_id})
        );

        if payload.get("success").and_then(Value::as_bool).unwrap_or(false) {
            return Ok(ToolOutput::text(format!(
                "Message marked as unread (ID: {message_id})"
            )));
        }
        Ok(ToolOutput::text("Failed to mark message as unread."))
    }
}

pub struct AddLabelTool {
    client: McpClient,
}

impl AddLabelTool {
    pub fn new(client: McpClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for AddLabelTool {
    fn name(&self) -> &str {
        "add_label_to_message"
    }

    fn description(&self) -> &str {
        "Add a label to an email message, e.g. IMPORTANT or STARRED"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "message_id": message_id_schema(),
                "label_id": {"type": "string", "description": "ID of the label to add"}
            },
            "required": ["message_id", "label_id"]
        })
    }

    async fn execute(&self, params: Value) -> Result<ToolOutput, ToolError> {
        let message_id = require_str(self.name(), &params, "message_id")?;
        let label_id = require_str(self.name(), &params, "label_id")?;
        let payload = bridge_call!(
            &self.client,
            "add_label_to_message",
            json!({"message_id": message_id, "label_id": label_id})
        );

        if payload.get("success").and_then(Value::as_bool).unwrap_or(false) {
            let current = joined_labels(&payload, usize::MAX);
            return Ok(ToolOutput::text(format!(
                "Label '{label_id}' added to message (ID: {message_id})\nCurrent labels: {current}"
            )));
        }
        Ok(ToolOutput::text("Failed to add label."))
    }
}

pub struct RemoveLabelTool {
    client: McpClient,
}

impl RemoveLabelTool {
    pub fn new(client: McpClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for RemoveLabelTool {
    fn name(&self) -> &str {
        "remove_label_from_message"
    }

    fn description(&self) -> &str {
        "Remove a label from an email message"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "message_id": message_id_schema(),
                "label_id": {"type": "string", "description": "ID of the label to remove"}
            },
            "required": ["message_id", "label_id"]
        })
    }

    async fn execute(&self, params: Value) -> Result<ToolOutput, ToolError> {
        let message_id = require_str(self.name(), &params, "message_id")?;
        let label_id = require_str(self.name(), &params, "label_id")?;
        let payload = bridge_call!(
            &self.client,
            "remove_label_from_message",
            json!({"message_id": message_id, "label_id": label_id})
        );

        if payload.get("success").and_then(Value::as_bool).unwrap_or(false) {
            let current = joined_labels(&payload, usize::MAX);
            return Ok(ToolOutput::text(format!(
                "Label '{label_id}' removed from message (ID: {message_id})\nCurrent labels: {current}"
            )));
        }
        Ok(ToolOutput::text("Failed to remove label."))
    }
}

pub struct ListLabelsTool {
    client: McpClient,
}

impl ListLabelsTool {
    pub fn new(client: McpClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for ListLabelsTool {
    fn name(&self) -> &str {
        "list_labels"
    }

    fn description(&self) -> &str {
        "Get all available email labels"
    }

    fn parameters_schema(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    async fn execute(&self, _params: Value) -> Result<ToolOutput, ToolError> {
        let payload = bridge_call!(&self.client, "list_labels", json!({}));

        let empty = Vec::new();
        let labels = payload.get("labels").and_then(Value::as_array).unwrap_or(&empty);
        if labels.is_empty() {
            return Ok(ToolOutput::text("No labels found."));
        }

        let mut output = format!("Available labels ({}):\n\n", labels.len());
        for label in labels {
            output.push_str(&format!(
                "- {} (ID: {})\n  Type: {} | Total: {} | Unread: {}\n\n",
                str_field(label, "name", "Unknown"),
                str_field(label, "id", "Unknown"),
                str_field(label, "type", "Unknown"),
                label.get("messagesTotal").and_then(Value::as_u64).unwrap_or(0),
                label.get("messagesUnread").and_then(Value::as_u64).unwrap_or(0),
            ));
        }
        Ok(ToolOutput::text(output))
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
    async fn list_messages_formats_summary_lines() {
        let client = client_with(vec![json!({
            "messages": [
                {
                    "id": "m1",
                    "from": "alice@example.com",
                    "subject": "Quarterly report",
                    "date": "Mon, 2 Mar 2026",
                    "labelIds": ["INBOX", "UNREAD"]
                }
            ]
        })]);
        let tool = ListMessagesTool::new(client);

        let out = tool.execute(json!({"query": "is:unread"})).await.unwrap();
        assert!(out.text.contains("Found 1 messages for query: is:unread"));
        assert!(out.text.contains("From: alice@example.com"));
        assert!(out.text.contains("Labels: INBOX, UNREAD"));
        assert!(out.text.contains("ID: m1"));
    }

    #[tokio::test]
    async fn list_messages_defaults_query_and_limit() {
        let transport = FakeTransport::with_responses(vec![Ok(tool_result(json!({
            "messages": []
        })))]);
        let tool = ListMessagesTool::new(McpClient::new(transport.clone()));

        let out = tool.execute(json!({})).await.unwrap();
        assert_eq!(out.text, "No messages found.");

        let requests = transport.requests.lock().await;
        assert_eq!(requests[0].1["arguments"]["query"], "");
        assert_eq!(requests[0].1["arguments"]["max_results"], 10);
    }

    #[tokio::test]
    async fn get_message_truncates_long_body() {
        let body = "x".repeat(1200);
        let client = client_with(vec![json!({
            "message": {
                "id": "m1",
                "from": "alice@example.com",
                "to": "me@example.com",
                "subject": "Hello",
                "date": "Mon",
                "labelIds": ["INBOX"],
                "body": body,
            }
        })]);
        let tool = GetMessageTool::new(client);

        let out = tool.execute(json!({"message_id": "m1"})).await.unwrap();
        assert!(out.text.contains("... (truncated)"));
        assert!(out.text.contains("Subject: Hello"));
    }

    #[tokio::test]
    async fn send_message_omits_empty_cc() {
        let transport = FakeTransport::with_responses(vec![Ok(tool_result(json!({
            "success": true,
            "messageId": "sent-1"
        })))]);
        let tool = SendMessageTool::new(McpClient::new(transport.clone()));

        let out = tool
            .execute(json!({
                "to": "bob@example.com",
                "subject": "Hi",
                "body": "Hello Bob",
                "cc": ""
            }))
            .await
            .unwrap();
        assert!(out.text.contains("Message ID: sent-1"));

        let requests = transport.requests.lock().await;
        assert!(requests[0].1["arguments"].get("cc").is_none());
    }

    #[tokio::test]
    async fn error_payload_becomes_text() {
        let client = client_with(vec![json!({"error": "Gmail authentication expired"})]);
        let tool = SearchMessagesTool::new(client);

        let out = tool.execute(json!({"query": "from:bob"})).await.unwrap();
        assert_eq!(out.text, "Error: Gmail authentication expired");
    }

    #[tokio::test]
    async fn reply_requires_body() {
        let tool = ReplyToMessageTool::new(client_with(vec![]));
        let err = tool.execute(json!({"message_id": "m1"})).await.unwrap_err();
        assert!(err.to_string().contains("reply_body"));
    }

    #[tokio::test]
    async fn register_tools_adds_all_ten() {
        let mut registry = ToolRegistry::new();
        let client = client_with(vec![]);
        register_tools(&mut registry, &client);
        assert_eq!(registry.len(), 10);
        assert!(registry.get("list_messages").is_some());
        assert!(registry.get("list_labels").is_some());
    }
}
