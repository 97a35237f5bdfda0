//! Thin HTTP client for a running Appium server
//!
//! Only the handful of session endpoints the command catalogue consumes are
//! wrapped here; this is a consumer of an existing server, not a WebDriver
//! protocol implementation.

use crate::error::{Error, Result};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

/// W3C element identifier key in find-element responses
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// Opaque reference to a located element
#[derive(Debug, Clone)]
pub struct ElementRef(pub String);

/// Element or window geometry as reported by the server
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// One entry from a structured log stream
#[derive(Debug, Clone, Deserialize)]
pub struct LogEntry {
    pub timestamp: i64,
    pub level: String,
    pub message: String,
}

pub struct AppiumClient {
    base_url: String,
    client: reqwest::Client,
    session_id: Option<String>,
}

impl AppiumClient {
    pub fn new(server_url: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: server_url.trim_end_matches('/').to_string(),
            client,
            session_id: None,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// Whether the server answers /status with ready=true
    pub async fn status_ready(&self) -> bool {
        let url = format!("{}/status", self.base_url);
        match self.client.get(&url).send().await {
            Ok(resp) if resp.status().is_success() => resp
                .json::<Value>()
                .await
                .ok()
                .and_then(|v| v.pointer("/value/ready").and_then(Value::as_bool))
                .unwrap_or(false),
            _ => false,
        }
    }

    async fn unwrap_value(resp: reqwest::Response) -> Result<Value> {
        let status = resp.status();
        let body: Value = resp.json().await?;
        if !status.is_success() {
            let kind = body
                .pointer("/value/error")
                .and_then(Value::as_str)
                .unwrap_or("unknown error");
            let message = body
                .pointer("/value/message")
                .and_then(Value::as_str)
                .unwrap_or("");
            return Err(Error::ToolOutput {
                tool: "appium".to_string(),
                reason: format!("{} {}: {}", status, kind, message),
            });
        }
        Ok(body.get("value").cloned().unwrap_or(Value::Null))
    }

    async fn post(&self, path: &str, body: Value) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self.client.post(&url).json(&body).send().await?;
        Self::unwrap_value(resp).await
    }

    async fn get(&self, path: &str) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self.client.get(&url).send().await?;
        Self::unwrap_value(resp).await
    }

    fn session_path(&self, suffix: &str) -> Result<String> {
        let id = self.session_id.as_deref().ok_or_else(|| {
            Error::InvalidArgument("no active session - call create_session first".to_string())
        })?;
        Ok(format!("/session/{}{}", id, suffix))
    }

    /// Create a session and return the server-reported capabilities
    pub async fn create_session(&mut self, capabilities: &Value) -> Result<Value> {
        let value = self.post("/session", capabilities.clone()).await?;

        let session_id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::ToolOutput {
                tool: "appium".to_string(),
                reason: "no sessionId in create-session response".to_string(),
            })?;
        self.session_id = Some(session_id.to_string());

        Ok(value.get("capabilities").cloned().unwrap_or(Value::Null))
    }

    pub async fn delete_session(&mut self) -> Result<()> {
        let path = self.session_path("")?;
        let url = format!("{}{}", self.base_url, path);
        let resp = self.client.delete(&url).send().await?;
        Self::unwrap_value(resp).await?;
        self.session_id = None;
        Ok(())
    }

    pub async fn find_element(&self, using: &str, value: &str) -> Result<ElementRef> {
        let path = self.session_path("/element")?;
        match self.post(&path, json!({"using": using, "value": value})).await {
            Ok(v) => element_from_value(&v),
            Err(Error::ToolOutput { reason, .. }) if reason.contains("no such element") => {
                Err(Error::ElementNotFound(format!("{} '{}'", using, value)))
            }
            Err(e) => Err(e),
        }
    }

    pub async fn find_elements(&self, using: &str, value: &str) -> Result<Vec<ElementRef>> {
        let path = self.session_path("/elements")?;
        let v = self
            .post(&path, json!({"using": using, "value": value}))
            .await?;
        let items = v.as_array().cloned().unwrap_or_default();
        items.iter().map(element_from_value).collect()
    }

    pub async fn click(&self, element: &ElementRef) -> Result<()> {
        let path = self.session_path(&format!("/element/{}/click", element.0))?;
        self.post(&path, json!({})).await?;
        Ok(())
    }

    pub async fn send_keys(&self, element: &ElementRef, text: &str) -> Result<()> {
        let path = self.session_path(&format!("/element/{}/value", element.0))?;
        self.post(&path, json!({"text": text})).await?;
        Ok(())
    }

    pub async fn element_text(&self, element: &ElementRef) -> Result<String> {
        let path = self.session_path(&format!("/element/{}/text", element.0))?;
        let v = self.get(&path).await?;
        Ok(v.as_str().unwrap_or_default().to_string())
    }

    pub async fn element_rect(&self, element: &ElementRef) -> Result<Rect> {
        let path = self.session_path(&format!("/element/{}/rect", element.0))?;
        let v = self.get(&path).await?;
        Ok(serde_json::from_value(v)?)
    }

    pub async fn window_rect(&self) -> Result<Rect> {
        let path = self.session_path("/window/rect")?;
        let v = self.get(&path).await?;
        Ok(serde_json::from_value(v)?)
    }

    /// Base64 PNG of the current screen
    pub async fn screenshot_base64(&self) -> Result<String> {
        let path = self.session_path("/screenshot")?;
        let v = self.get(&path).await?;
        v.as_str()
            .map(str::to_string)
            .ok_or_else(|| Error::ToolOutput {
                tool: "appium".to_string(),
                reason: "screenshot response was not a string".to_string(),
            })
    }

    /// Execute a `mobile:` extension script
    pub async fn execute(&self, script: &str, args: Value) -> Result<Value> {
        let path = self.session_path("/execute/sync")?;
        self.post(&path, json!({"script": script, "args": [args]}))
            .await
    }

    /// Drain a structured log stream ("syslog", "logcat", ...)
    pub async fn logs(&self, log_type: &str) -> Result<Vec<LogEntry>> {
        let path = self.session_path("/log")?;
        let v = self.post(&path, json!({"type": log_type})).await?;
        Ok(serde_json::from_value(v)?)
    }
}

pub(crate) fn element_from_value(value: &Value) -> Result<ElementRef> {
    value
        .get(ELEMENT_KEY)
        .or_else(|| value.get("ELEMENT"))
        .and_then(Value::as_str)
        .map(|id| ElementRef(id.to_string()))
        .ok_or_else(|| Error::ToolOutput {
            tool: "appium".to_string(),
            reason: "find-element response carried no element id".to_string(),
        })
}
