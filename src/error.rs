//! Error types for the vigil monitoring engine.
//!
//! This module defines all error types used throughout the engine,
//! providing clear and actionable error messages.

use thiserror::Error;

/// Result type alias for vigil operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the vigil monitoring engine
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // ═══════════════════════════════════════════════════════════════════
    // Probe Errors
    // ═══════════════════════════════════════════════════════════════════

    /// Health probe did not answer within its deadline
    #[error("Probe for '{component}' timed out after {timeout_ms}ms")]
    ProbeTimeout {
        /// Component being probed
        component: String,
        /// Deadline that was exceeded
        timeout_ms: u64,
    },

    /// Health probe failed before producing a snapshot
    #[error("Probe for '{component}' failed: {details}")]
    ProbeTransport {
        /// Component being probed
        component: String,
        /// Transport-level failure details
        details: String,
    },

    // ═══════════════════════════════════════════════════════════════════
    // Delivery Errors
    // ═══════════════════════════════════════════════════════════════════

    /// Notification channel rejected or failed a delivery
    #[error("Delivery on channel '{channel}' failed: {details}")]
    ChannelDelivery {
        /// Channel name
        channel: String,
        /// Failure details
        details: String,
    },

    /// Delivery did not complete within its deadline
    #[error("Delivery on channel '{channel}' timed out after {timeout_ms}ms")]
    DeliveryTimeout {
        /// Channel name
        channel: String,
        /// Deadline that was exceeded
        timeout_ms: u64,
    },

    // ═══════════════════════════════════════════════════════════════════
    // Configuration Errors
    // ═══════════════════════════════════════════════════════════════════

    /// Anomaly rule rejected at load time
    #[error("Invalid rule '{rule}': {reason}")]
    InvalidRule {
        /// Rule name or id
        rule: String,
        /// Why the rule was rejected
        reason: String,
    },

    /// Notification channel rejected at load time
    #[error("Invalid channel '{channel}': {reason}")]
    InvalidChannel {
        /// Channel name
        channel: String,
        /// Why the channel was rejected
        reason: String,
    },

    /// Configuration file could not be read or parsed
    #[error("Configuration error: {0}")]
    Config(String),

    // ═══════════════════════════════════════════════════════════════════
    // Validation Errors
    // ═══════════════════════════════════════════════════════════════════

    /// Invalid input parameter
    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter {
        /// Parameter name
        name: String,
        /// Reason for invalidity
        reason: String,
    },

    // ═══════════════════════════════════════════════════════════════════
    // Internal Errors
    // ═══════════════════════════════════════════════════════════════════

    /// Internal error (should not happen in production)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Returns true if this error must abort startup rather than degrade
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::InvalidRule { .. } | Error::InvalidChannel { .. } | Error::Config(_)
        )
    }

    /// Returns true if this error degrades a single probe or delivery
    /// without affecting the surrounding cycle
    pub fn is_degradation(&self) -> bool {
        matches!(
            self,
            Error::ProbeTimeout { .. }
                | Error::ProbeTransport { .. }
                | Error::ChannelDelivery { .. }
                | Error::DeliveryTimeout { .. }
        )
    }

    /// Returns the error code for external systems
    pub fn code(&self) -> u32 {
        match self {
            // Probe errors: 1xxx
            Error::ProbeTimeout { .. } => 1001,
            Error::ProbeTransport { .. } => 1002,

            // Delivery errors: 2xxx
            Error::ChannelDelivery { .. } => 2001,
            Error::DeliveryTimeout { .. } => 2002,

            // Configuration errors: 3xxx
            Error::InvalidRule { .. } => 3001,
            Error::InvalidChannel { .. } => 3002,
            Error::Config(_) => 3003,

            // Validation errors: 5xxx
            Error::InvalidParameter { .. } => 5001,

            // Internal errors: 9xxx
            Error::Internal(_) => 9001,
        }
    }
}
