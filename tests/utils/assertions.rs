//! Test assertion helpers - fluent API for verifying response envelopes
#![allow(dead_code)] // Test utilities may not all be used in every test

use axum::http::StatusCode;
use serde_json::Value;

use super::actions::ApiResponse;

// ============================================================================
// Assertion Helpers
// ============================================================================

pub struct ResponseAssertion<'a> {
    response: &'a ApiResponse,
}

impl<'a> ResponseAssertion<'a> {
    pub fn of(response: &'a ApiResponse) -> Self {
        Self { response }
    }

    pub fn has_status(self, expected: StatusCode) -> Self {
        assert_eq!(
            self.response.status, expected,
            "unexpected status, body: {}",
            self.response.body
        );
        self
    }

    /// Assert a successful envelope (`error: false`)
    pub fn succeeded(self) -> Self {
        assert_eq!(
            self.response.body["error"],
            Value::Bool(false),
            "expected success envelope, got {}",
            self.response.body
        );
        self
    }

    /// Assert a failure envelope (`error: true`) without data
    pub fn failed(self) -> Self {
        assert_eq!(
            self.response.body["error"],
            Value::Bool(true),
            "expected error envelope, got {}",
            self.response.body
        );
        assert!(self.response.body.get("data").is_none());
        self
    }

    pub fn with_message(self, expected: &str) -> Self {
        assert_eq!(self.response.body["message"], expected);
        self
    }

    /// Hand back the `data` member for further checks
    pub fn data(self) -> &'a Value {
        &self.response.body["data"]
    }
}
