//! Extended operation catalogue over a live session
//!
//! [`ExtendedSession`] is a thin adapter around a [`SessionContext`] exposing
//! the higher-level operations test code calls: symbolic element lookup,
//! gestures, log assertions, and screenshot testing. Platform-specific
//! behavior lives behind [`platform::PlatformOps`], selected once when the
//! adapter is built.

pub mod logs;
pub mod platform;
pub mod text;

use crate::error::Result;
use crate::session::client::ElementRef;
use crate::session::{Platform, SessionContext};
use crate::visual::compare::{self, ComparisonResult};
use crate::visual::pipeline;
use logs::LogExpectation;
use platform::{ops_for, Direction, ElementKind, PlatformOps};
use std::path::Path;
use text::CasingPolicy;

/// Default allowed mismatch (percent) for the screenshot-test path
pub const DEFAULT_SCREENSHOT_THRESHOLD: f64 = 0.2;
/// Default allowed mismatch (percent) for the direct-compare path
pub const DEFAULT_COMPARE_THRESHOLD: f64 = 0.1;

pub struct ExtendedSession<'a> {
    session: &'a SessionContext,
    ops: Box<dyn PlatformOps>,
    casing: CasingPolicy,
}

impl<'a> ExtendedSession<'a> {
    pub fn new(session: &'a SessionContext) -> Self {
        Self {
            session,
            ops: ops_for(session.platform),
            casing: CasingPolicy::default(),
        }
    }

    pub fn with_casing(mut self, policy: CasingPolicy) -> Self {
        self.casing = policy;
        self
    }

    /// Normalized needle for text matching. iOS labels keep their casing;
    /// Android labels follow the version-dependent casing rule.
    fn matching_text(&self, label: &str, preserve_case: bool) -> String {
        match self.session.platform {
            Platform::Android => text::normalize_label(
                label,
                self.session.platform_version,
                &self.casing,
                preserve_case,
            ),
            Platform::Ios => label.to_string(),
        }
    }

    // -- element lookup ----------------------------------------------------

    pub async fn find_by_kind(&self, kind: ElementKind, index: usize) -> Result<ElementRef> {
        self.ops
            .find_by_kind(self.session.client(), kind, index)
            .await
    }

    pub async fn find_by_text(&self, label: &str, preserve_case: bool) -> Result<ElementRef> {
        let needle = self.matching_text(label, preserve_case);
        self.ops.find_by_text(self.session.client(), &needle).await
    }

    pub async fn find_by_id(&self, id: &str) -> Result<ElementRef> {
        self.ops.find_by_id(self.session.client(), id).await
    }

    // -- taps and input ----------------------------------------------------

    pub async fn tap_by_kind(&self, kind: ElementKind, index: usize) -> Result<()> {
        let element = self.find_by_kind(kind, index).await?;
        self.session.client().click(&element).await
    }

    pub async fn tap_by_text(&self, label: &str, preserve_case: bool) -> Result<()> {
        let element = self.find_by_text(label, preserve_case).await?;
        self.session.client().click(&element).await
    }

    pub async fn tap_by_id(&self, id: &str) -> Result<()> {
        let element = self.find_by_id(id).await?;
        self.session.client().click(&element).await
    }

    pub async fn enter_text(&self, kind: ElementKind, index: usize, input: &str) -> Result<()> {
        let element = self.find_by_kind(kind, index).await?;
        self.session.client().send_keys(&element, input).await
    }

    pub async fn element_text_by_id(&self, id: &str) -> Result<String> {
        let element = self.find_by_id(id).await?;
        self.session.client().element_text(&element).await
    }

    // -- gestures ----------------------------------------------------------

    pub async fn scroll(&self, direction: Direction) -> Result<()> {
        self.ops.scroll(self.session.client(), direction).await
    }

    pub async fn swipe(&self, direction: Direction) -> Result<()> {
        self.ops.swipe(self.session.client(), direction).await
    }

    // -- logs --------------------------------------------------------------

    /// Drain the platform's structured log stream into message bodies
    pub async fn capture_logs(&self) -> Result<Vec<String>> {
        let entries = self
            .session
            .client()
            .logs(self.ops.log_stream())
            .await?;
        Ok(entries.into_iter().map(|e| e.message).collect())
    }

    /// Capture logs and assert every term against them
    pub async fn assert_logged(
        &self,
        terms: &[String],
        expectation: LogExpectation,
    ) -> Result<()> {
        let messages = self.capture_logs().await?;
        logs::assert_terms(&messages, terms, expectation)
    }

    // -- screenshots -------------------------------------------------------

    /// Visual regression test against the named reference under
    /// `<base_dir>/Screen_Shots`.
    ///
    /// `overwrite=true` records the capture as the new baseline. Otherwise
    /// the capture is cropped to the platform viewport, compared, and fails
    /// with a threshold-exceeded error when the mismatch is above
    /// `threshold` percent (default [`DEFAULT_SCREENSHOT_THRESHOLD`]).
    pub async fn screenshot_test(
        &self,
        base_dir: &Path,
        name: &str,
        overwrite: bool,
        threshold: Option<f64>,
    ) -> Result<ComparisonResult> {
        let png_base64 = self.session.client().screenshot_base64().await?;
        let region = self.ops.viewport_region(self.session.client()).await?;
        let reference = pipeline::reference_path(base_dir, name);

        pipeline::process_screenshot(
            &reference,
            &png_base64,
            region.as_ref(),
            overwrite,
            threshold.unwrap_or(DEFAULT_SCREENSHOT_THRESHOLD),
        )
    }

    /// Compare the current full screen directly against a reference file.
    #[deprecated(note = "use screenshot_test, which crops to the platform viewport")]
    pub async fn compare_screen(
        &self,
        reference: &Path,
        threshold: Option<f64>,
    ) -> Result<ComparisonResult> {
        let png_base64 = self.session.client().screenshot_base64().await?;

        let capture = std::env::temp_dir().join(format!("screen_{}.png", uuid::Uuid::new_v4()));
        pipeline::write_png_base64(&capture, &png_base64)?;

        let mismatch = compare::compare_files(&capture, reference);
        let _ = std::fs::remove_file(&capture);

        Ok(compare::verdict(
            mismatch?,
            threshold.unwrap_or(DEFAULT_COMPARE_THRESHOLD),
        ))
    }
}
