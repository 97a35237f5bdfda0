//! Session lifecycle
//!
//! A [`SessionContext`] is an explicit, caller-owned handle to one Appium
//! session: it carries the HTTP client, the platform resolved from the
//! server-reported capabilities, and the parsed platform version. There is no
//! process-global "current driver" - create one, pass it around, destroy it.

pub mod client;
pub mod server;

use crate::error::{Error, Result};
use client::AppiumClient;
use serde_json::{json, Map, Value};

/// Supported target platforms. Anything else a session reports is rejected
/// when the context is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Ios,
    Android,
}

impl Platform {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "ios" => Some(Platform::Ios),
            "android" => Some(Platform::Android),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Ios => "iOS",
            Platform::Android => "Android",
        }
    }
}

/// Parse "17.5" / "8" style platform versions into (major, minor)
pub fn parse_version(version: &str) -> (u32, u32) {
    let mut parts = version.split('.');
    let major = parts
        .next()
        .and_then(|p| p.trim().parse().ok())
        .unwrap_or(0);
    let minor = parts
        .next()
        .and_then(|p| p.trim().parse().ok())
        .unwrap_or(0);
    (major, minor)
}

/// Desired capabilities for one session
#[derive(Debug, Clone, Default)]
pub struct SessionCapabilities {
    pub platform_name: String,
    pub platform_version: String,
    pub device_name: String,
    pub automation_name: Option<String>,
    pub app: Option<String>,
    pub extra: Map<String, Value>,
}

impl SessionCapabilities {
    /// W3C new-session payload
    pub fn to_w3c(&self) -> Value {
        let mut always_match = Map::new();
        always_match.insert("platformName".to_string(), json!(self.platform_name));
        always_match.insert(
            "appium:platformVersion".to_string(),
            json!(self.platform_version),
        );
        always_match.insert("appium:deviceName".to_string(), json!(self.device_name));
        if let Some(ref automation) = self.automation_name {
            always_match.insert("appium:automationName".to_string(), json!(automation));
        }
        if let Some(ref app) = self.app {
            always_match.insert("appium:app".to_string(), json!(app));
        }
        for (key, value) in &self.extra {
            always_match.insert(key.clone(), value.clone());
        }

        json!({"capabilities": {"alwaysMatch": Value::Object(always_match)}})
    }
}

/// One live session with its platform resolved
pub struct SessionContext {
    client: AppiumClient,
    capabilities: Value,
    pub platform: Platform,
    pub platform_version: (u32, u32),
}

impl SessionContext {
    /// Create a session against a running server.
    ///
    /// The platform is resolved from what the server actually reports, not
    /// from what was requested - platform-specific behavior is only knowable
    /// once a session exists. Unsupported platforms are rejected here so
    /// every command downstream can assume iOS or Android.
    pub async fn create(server_url: &str, caps: &SessionCapabilities) -> Result<Self> {
        if caps.platform_name.is_empty() {
            return Err(Error::InvalidArgument(
                "platformName capability must not be empty".to_string(),
            ));
        }
        if caps.device_name.is_empty() {
            return Err(Error::InvalidArgument(
                "deviceName capability must not be empty".to_string(),
            ));
        }

        let mut client = AppiumClient::new(server_url);
        let reported = client.create_session(&caps.to_w3c()).await?;

        let platform_name = reported
            .get("platformName")
            .and_then(Value::as_str)
            .unwrap_or(&caps.platform_name)
            .to_string();

        let platform = match Platform::from_name(&platform_name) {
            Some(p) => p,
            None => {
                let _ = client.delete_session().await;
                return Err(Error::InvalidArgument(format!(
                    "unsupported platform '{}' (expected iOS or Android)",
                    platform_name
                )));
            }
        };

        let version_str = reported
            .get("appium:platformVersion")
            .or_else(|| reported.get("platformVersion"))
            .and_then(Value::as_str)
            .unwrap_or(&caps.platform_version)
            .to_string();

        Ok(Self {
            client,
            capabilities: reported,
            platform,
            platform_version: parse_version(&version_str),
        })
    }

    pub fn client(&self) -> &AppiumClient {
        &self.client
    }

    /// Look up a server-reported capability
    pub fn capability(&self, name: &str) -> Option<&Value> {
        self.capabilities.get(name)
    }

    /// End the session. Consumes the context so a destroyed session cannot
    /// be used again.
    pub async fn destroy(mut self) -> Result<()> {
        self.client.delete_session().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_from_name() {
        assert_eq!(Platform::from_name("iOS"), Some(Platform::Ios));
        assert_eq!(Platform::from_name("ANDROID"), Some(Platform::Android));
        assert_eq!(Platform::from_name("windows"), None);
        assert_eq!(Platform::from_name(""), None);
    }

    #[test]
    fn test_parse_version() {
        assert_eq!(parse_version("17.5"), (17, 5));
        assert_eq!(parse_version("8"), (8, 0));
        assert_eq!(parse_version("7.1.2"), (7, 1));
        assert_eq!(parse_version("garbage"), (0, 0));
    }

    #[test]
    fn test_w3c_payload_shape() {
        let caps = SessionCapabilities {
            platform_name: "iOS".to_string(),
            platform_version: "17.5".to_string(),
            device_name: "iPhone 15".to_string(),
            automation_name: Some("XCUITest".to_string()),
            app: None,
            extra: Map::new(),
        };

        let payload = caps.to_w3c();
        assert_eq!(
            payload.pointer("/capabilities/alwaysMatch/platformName"),
            Some(&json!("iOS"))
        );
        assert_eq!(
            payload.pointer("/capabilities/alwaysMatch/appium:automationName"),
            Some(&json!("XCUITest"))
        );
        assert!(payload
            .pointer("/capabilities/alwaysMatch/appium:app")
            .is_none());
    }
}
