//! Hand scanning off to a scanning component and surface its result
//!
//! The relay issues a [`ScanRequest`] tagged with [`SCAN_REQUEST_CODE`] and only
//! renders a [`ScanResponse`] that carries the same tag, a success status and a
//! `"result"` field. Everything else is dropped without rendering.

pub mod capture;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Request code tagging scans issued by [`ResultRelay`]
pub const SCAN_REQUEST_CODE: i32 = 11;
/// Name of the scanning component requests are addressed to
pub const CAPTURE_COMPONENT: &str = "capture";
/// Data key carrying the scanned text
pub const EXTRA_RESULT: &str = "result";
/// Status reported by a successful scan
pub const SCAN_RESULT_SUCCESS: i32 = 1;
/// Status reported when the scan was abandoned
pub const SCAN_RESULT_CANCELED: i32 = 0;

/// String fields returned by a scanning component
pub type ScanData = HashMap<String, String>;

/// Request sent to a scanning component. Carries no payload beyond its tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanRequest {
    /// Tag echoed back in the response
    pub request_code: i32,
    /// Scanning component the request is addressed to
    pub component: String,
}

impl ScanRequest {
    /// Request addressed to the capture component
    pub fn capture() -> Self {
        Self {
            request_code: SCAN_REQUEST_CODE,
            component: CAPTURE_COMPONENT.to_string(),
        }
    }
}

/// Response returned by a scanning component
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanResponse {
    /// Tag of the request being answered
    pub request_code: i32,
    /// Outcome status
    pub result_code: i32,
    /// Returned fields, absent when nothing was produced
    pub data: Option<ScanData>,
}

impl ScanResponse {
    /// Successful response carrying `text` under [`EXTRA_RESULT`]
    pub fn success(request_code: i32, text: impl Into<String>) -> Self {
        let mut data = ScanData::new();
        data.insert(EXTRA_RESULT.to_string(), text.into());
        Self {
            request_code,
            result_code: SCAN_RESULT_SUCCESS,
            data: Some(data),
        }
    }

    /// Canceled response without data
    pub fn canceled(request_code: i32) -> Self {
        Self {
            request_code,
            result_code: SCAN_RESULT_CANCELED,
            data: None,
        }
    }

    /// Look up a returned string field
    pub fn get_string(&self, key: &str) -> Option<&str> {
        self.data.as_ref()?.get(key).map(String::as_str)
    }
}

/// A component that performs a scan on request
#[async_trait]
pub trait ScanLauncher: Send {
    /// Run the scan and answer the request
    async fn launch(&mut self, request: ScanRequest) -> ScanResponse;
}

/// Where scan results are shown
pub trait ResultDisplay {
    /// Replace the displayed text
    fn set_text(&mut self, text: &str);
}

/// Relay progress
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayState {
    /// Nothing requested yet
    Idle,
    /// A request has been issued and no matching result arrived
    AwaitingResult,
    /// A result was rendered
    Displayed(String),
}

/// Issues scan requests and renders matching results
pub struct ResultRelay<D> {
    display: D,
    state: RelayState,
}

impl<D: ResultDisplay> ResultRelay<D> {
    /// Create an idle relay rendering into `display`
    pub fn new(display: D) -> Self {
        Self {
            display,
            state: RelayState::Idle,
        }
    }

    /// Current progress
    pub fn state(&self) -> &RelayState {
        &self.state
    }

    /// Display results are rendered into
    pub fn display(&self) -> &D {
        &self.display
    }

    /// Build the request for a user trigger
    pub fn trigger(&mut self) -> ScanRequest {
        self.state = RelayState::AwaitingResult;
        ScanRequest::capture()
    }

    /// Render `response` if it answers our request successfully. Returns whether it did.
    pub fn on_scan_result(&mut self, response: &ScanResponse) -> bool {
        if response.request_code != SCAN_REQUEST_CODE
            || response.result_code != SCAN_RESULT_SUCCESS
        {
            return false;
        }

        let Some(text) = response.get_string(EXTRA_RESULT) else {
            return false;
        };

        tracing::debug!(result = text, "Scan result received");
        self.display.set_text(text);
        self.state = RelayState::Displayed(text.to_string());
        true
    }

    /// Trigger a scan on `launcher` and render its response
    pub async fn scan_with<L>(&mut self, launcher: &mut L) -> Option<String>
    where
        L: ScanLauncher + ?Sized,
    {
        let request = self.trigger();
        let response = launcher.launch(request).await;

        if self.on_scan_result(&response) {
            response.get_string(EXTRA_RESULT).map(str::to_string)
        } else {
            None
        }
    }
}
