//! Platform-specific primitives behind one trait
//!
//! Each operation in the catalogue dispatches through [`PlatformOps`], chosen
//! once per session, instead of re-branching on a platform string inside
//! every command. The two variants map symbolic element kinds to native
//! classes, build native locator queries, and derive the viewport region
//! used for screenshot cropping.

use crate::error::{Error, Result};
use crate::session::client::{AppiumClient, ElementRef};
use crate::visual::CropRegion;
use async_trait::async_trait;
use serde_json::json;

/// Symbolic element kinds test code refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Button,
    TextField,
    SecureTextField,
    Label,
    Image,
    Switch,
    Cell,
}

impl ElementKind {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol.to_ascii_lowercase().as_str() {
            "button" => Some(ElementKind::Button),
            "textfield" | "input" => Some(ElementKind::TextField),
            "securetextfield" | "password" => Some(ElementKind::SecureTextField),
            "label" | "text" => Some(ElementKind::Label),
            "image" => Some(ElementKind::Image),
            "switch" | "toggle" => Some(ElementKind::Switch),
            "cell" | "row" => Some(ElementKind::Cell),
            _ => None,
        }
    }
}

/// Gesture direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }
}

/// Escape a string literal for embedding in a native locator query
pub fn escape_literal(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Platform-specific primitive operations, selected once per session
#[async_trait]
pub trait PlatformOps: Send + Sync {
    /// Native class name for a symbolic element kind
    fn native_class(&self, kind: ElementKind) -> &'static str;

    /// Structured log stream the platform exposes
    fn log_stream(&self) -> &'static str;

    /// Factor element bounds are scaled by before cropping a capture
    fn pixel_scale(&self) -> f64;

    /// Locate an element by its visible text
    async fn find_by_text(&self, client: &AppiumClient, text: &str) -> Result<ElementRef>;

    /// Locate an element by platform id (accessibility id / resource-id)
    async fn find_by_id(&self, client: &AppiumClient, id: &str) -> Result<ElementRef>;

    /// Locate the `index`-th element of a kind
    async fn find_by_kind(
        &self,
        client: &AppiumClient,
        kind: ElementKind,
        index: usize,
    ) -> Result<ElementRef>;

    /// Scroll the main scrollable area
    async fn scroll(&self, client: &AppiumClient, direction: Direction) -> Result<()>;

    /// Full-screen swipe
    async fn swipe(&self, client: &AppiumClient, direction: Direction) -> Result<()>;

    /// Viewport region for screenshot cropping, already in pixels.
    ///
    /// `None` means no identifiable viewport frame exists and the full
    /// capture is compared.
    async fn viewport_region(&self, client: &AppiumClient) -> Result<Option<CropRegion>>;
}

/// Build the ops for a resolved platform
pub fn ops_for(platform: crate::session::Platform) -> Box<dyn PlatformOps> {
    match platform {
        crate::session::Platform::Ios => Box::new(IosOps),
        crate::session::Platform::Android => Box::new(AndroidOps),
    }
}

// ---------------------------------------------------------------------------
// iOS
// ---------------------------------------------------------------------------

pub struct IosOps;

#[async_trait]
impl PlatformOps for IosOps {
    fn native_class(&self, kind: ElementKind) -> &'static str {
        match kind {
            ElementKind::Button => "XCUIElementTypeButton",
            ElementKind::TextField => "XCUIElementTypeTextField",
            ElementKind::SecureTextField => "XCUIElementTypeSecureTextField",
            ElementKind::Label => "XCUIElementTypeStaticText",
            ElementKind::Image => "XCUIElementTypeImage",
            ElementKind::Switch => "XCUIElementTypeSwitch",
            ElementKind::Cell => "XCUIElementTypeCell",
        }
    }

    fn log_stream(&self) -> &'static str {
        "syslog"
    }

    // bounds come back in points on retina screens
    fn pixel_scale(&self) -> f64 {
        2.0
    }

    async fn find_by_text(&self, client: &AppiumClient, text: &str) -> Result<ElementRef> {
        let literal = escape_literal(text);
        let predicate = format!(
            "label == \"{0}\" OR name == \"{0}\" OR value == \"{0}\"",
            literal
        );
        client
            .find_element("-ios predicate string", &predicate)
            .await
    }

    async fn find_by_id(&self, client: &AppiumClient, id: &str) -> Result<ElementRef> {
        client.find_element("accessibility id", id).await
    }

    async fn find_by_kind(
        &self,
        client: &AppiumClient,
        kind: ElementKind,
        index: usize,
    ) -> Result<ElementRef> {
        let class = self.native_class(kind);
        let matches = client.find_elements("class name", class).await?;
        matches
            .into_iter()
            .nth(index)
            .ok_or_else(|| Error::ElementNotFound(format!("{}[{}]", class, index)))
    }

    async fn scroll(&self, client: &AppiumClient, direction: Direction) -> Result<()> {
        client
            .execute("mobile: scroll", json!({"direction": direction.as_str()}))
            .await?;
        Ok(())
    }

    async fn swipe(&self, client: &AppiumClient, direction: Direction) -> Result<()> {
        client
            .execute("mobile: swipe", json!({"direction": direction.as_str()}))
            .await?;
        Ok(())
    }

    async fn viewport_region(&self, client: &AppiumClient) -> Result<Option<CropRegion>> {
        let window = client.window_rect().await?;

        // application frame minus the status bar; without a status bar the
        // full capture is the comparison surface
        let status_bar = match client
            .find_element("class name", "XCUIElementTypeStatusBar")
            .await
        {
            Ok(el) => el,
            Err(_) => return Ok(None),
        };
        let bar = client.element_rect(&status_bar).await?;

        let region = CropRegion::new(window.width, window.height - bar.height, bar.height)
            .scaled(self.pixel_scale());
        Ok(Some(region))
    }
}

// ---------------------------------------------------------------------------
// Android
// ---------------------------------------------------------------------------

pub struct AndroidOps;

impl AndroidOps {
    async fn gesture(
        &self,
        client: &AppiumClient,
        script: &str,
        direction: Direction,
    ) -> Result<()> {
        let window = client.window_rect().await?;
        client
            .execute(
                script,
                json!({
                    "left": window.x,
                    "top": window.y,
                    "width": window.width,
                    "height": window.height,
                    "direction": direction.as_str(),
                    "percent": 0.7,
                }),
            )
            .await?;
        Ok(())
    }
}

#[async_trait]
impl PlatformOps for AndroidOps {
    fn native_class(&self, kind: ElementKind) -> &'static str {
        match kind {
            ElementKind::Button => "android.widget.Button",
            ElementKind::TextField => "android.widget.EditText",
            ElementKind::SecureTextField => "android.widget.EditText",
            ElementKind::Label => "android.widget.TextView",
            ElementKind::Image => "android.widget.ImageView",
            ElementKind::Switch => "android.widget.Switch",
            ElementKind::Cell => "android.widget.LinearLayout",
        }
    }

    fn log_stream(&self) -> &'static str {
        "logcat"
    }

    // decor bounds are already pixels
    fn pixel_scale(&self) -> f64 {
        1.0
    }

    async fn find_by_text(&self, client: &AppiumClient, text: &str) -> Result<ElementRef> {
        let selector = format!("new UiSelector().text(\"{}\")", escape_literal(text));
        client.find_element("-android uiautomator", &selector).await
    }

    async fn find_by_id(&self, client: &AppiumClient, id: &str) -> Result<ElementRef> {
        client.find_element("id", id).await
    }

    async fn find_by_kind(
        &self,
        client: &AppiumClient,
        kind: ElementKind,
        index: usize,
    ) -> Result<ElementRef> {
        let class = self.native_class(kind);
        let matches = client.find_elements("class name", class).await?;
        matches
            .into_iter()
            .nth(index)
            .ok_or_else(|| Error::ElementNotFound(format!("{}[{}]", class, index)))
    }

    async fn scroll(&self, client: &AppiumClient, direction: Direction) -> Result<()> {
        self.gesture(client, "mobile: scrollGesture", direction).await
    }

    async fn swipe(&self, client: &AppiumClient, direction: Direction) -> Result<()> {
        self.gesture(client, "mobile: swipeGesture", direction).await
    }

    async fn viewport_region(&self, client: &AppiumClient) -> Result<Option<CropRegion>> {
        // decor content frame; absent on fullscreen activities
        let content = match client.find_element("id", "android:id/content").await {
            Ok(el) => el,
            Err(_) => return Ok(None),
        };
        let rect = client.element_rect(&content).await?;

        Ok(Some(CropRegion::new(rect.width, rect.height, rect.y)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbolic_kinds_resolve() {
        assert_eq!(ElementKind::from_symbol("Button"), Some(ElementKind::Button));
        assert_eq!(
            ElementKind::from_symbol("input"),
            Some(ElementKind::TextField)
        );
        assert_eq!(ElementKind::from_symbol("spinner"), None);
    }

    #[test]
    fn test_native_class_mapping_differs_per_platform() {
        assert_eq!(
            IosOps.native_class(ElementKind::Button),
            "XCUIElementTypeButton"
        );
        assert_eq!(
            AndroidOps.native_class(ElementKind::Button),
            "android.widget.Button"
        );
    }

    #[test]
    fn test_escape_literal() {
        assert_eq!(escape_literal(r#"Say "hi""#), r#"Say \"hi\""#);
        assert_eq!(escape_literal(r"a\b"), r"a\\b");
    }

    #[test]
    fn test_pixel_scale_per_platform() {
        assert_eq!(IosOps.pixel_scale(), 2.0);
        assert_eq!(AndroidOps.pixel_scale(), 1.0);
    }

    #[test]
    fn test_log_streams() {
        assert_eq!(IosOps.log_stream(), "syslog");
        assert_eq!(AndroidOps.log_stream(), "logcat");
    }
}
