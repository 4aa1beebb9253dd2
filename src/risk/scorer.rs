//! Behavioral risk scoring.
//!
//! Pure functions mapping per-subject behavioral counters to a bounded
//! score and a derived risk level. No external state; callers supply the
//! reference time.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::rules::events::EventType;

// ═══════════════════════════════════════════════════════════════════════════════
// WEIGHTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Score contribution per failed login
pub const LOGIN_WEIGHT: i32 = 5;
/// Cap on the failed-login contribution
pub const LOGIN_CAP: i32 = 30;
/// Score contribution per suspicious activity
pub const SUSPICIOUS_WEIGHT: i32 = 10;
/// Cap on the suspicious-activity contribution
pub const SUSPICIOUS_CAP: i32 = 30;
/// Score contribution per compliance alert
pub const COMPLIANCE_WEIGHT: i32 = 15;
/// Cap on the compliance contribution
pub const COMPLIANCE_CAP: i32 = 30;
/// Bonus when the last suspicious event is under seven days old
pub const RECENCY_BONUS_FULL: i32 = 20;
/// Bonus when the last suspicious event is under thirty days old
pub const RECENCY_BONUS_HALF: i32 = 10;
/// Score reduction per completed KYC tier
pub const KYC_TIER_WEIGHT: i32 = -5;
/// Score reduction for accounts older than [`ACCOUNT_AGE_DAYS`] days
pub const ACCOUNT_AGE_BONUS: i32 = -10;
/// Account age after which the tenure reduction applies
pub const ACCOUNT_AGE_DAYS: u32 = 180;

/// Score at or above which a subject is in the high-risk band
pub const HIGH_RISK_THRESHOLD: u8 = 70;

// ═══════════════════════════════════════════════════════════════════════════════
// RISK FACTORS
// ═══════════════════════════════════════════════════════════════════════════════

/// Behavioral counters and account attributes for one subject
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RiskFactors {
    /// Failed login attempts in the assessment window
    pub failed_logins: u32,
    /// Suspicious activities in the assessment window
    pub suspicious_activities: u32,
    /// Compliance alerts in the assessment window
    pub compliance_alerts: u32,
    /// Timestamp of the most recent suspicious event, if any
    pub last_suspicious: Option<DateTime<Utc>>,
    /// Completed KYC tier (0 = unverified)
    pub kyc_tier: u8,
    /// Account age in days
    pub account_age_days: u32,
}

// ═══════════════════════════════════════════════════════════════════════════════
// RISK LEVEL
// ═══════════════════════════════════════════════════════════════════════════════

/// Risk bands derived from the score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    /// Score below 30
    Low,
    /// Score in [30, 70)
    Medium,
    /// Score in [70, 90)
    High,
    /// Score of 90 or above
    Critical,
}

impl RiskLevel {
    /// Derive the band for a score
    pub fn from_score(score: u8) -> Self {
        match score {
            0..=29 => RiskLevel::Low,
            30..=69 => RiskLevel::Medium,
            70..=89 => RiskLevel::High,
            _ => RiskLevel::Critical,
        }
    }

    /// Get display string
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
            RiskLevel::Critical => "CRITICAL",
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SCORING
// ═══════════════════════════════════════════════════════════════════════════════

/// Compute the risk score for one subject, clamped to [0, 100].
///
/// Capped positive contributions from behavioral counters, a recency bonus
/// keyed off the single most recent suspicious event (non-compounding), and
/// negative contributions from KYC verification and account tenure.
pub fn score(factors: &RiskFactors, now: DateTime<Utc>) -> u8 {
    let mut total = 0i32;

    total += (factors.failed_logins as i32 * LOGIN_WEIGHT).min(LOGIN_CAP);
    total += (factors.suspicious_activities as i32 * SUSPICIOUS_WEIGHT).min(SUSPICIOUS_CAP);
    total += (factors.compliance_alerts as i32 * COMPLIANCE_WEIGHT).min(COMPLIANCE_CAP);
    total += recency_bonus(factors.last_suspicious, now);
    total += factors.kyc_tier as i32 * KYC_TIER_WEIGHT;
    if factors.account_age_days > ACCOUNT_AGE_DAYS {
        total += ACCOUNT_AGE_BONUS;
    }

    total.clamp(0, 100) as u8
}

/// Recency contribution from the most recent suspicious event
fn recency_bonus(last_suspicious: Option<DateTime<Utc>>, now: DateTime<Utc>) -> i32 {
    let Some(last) = last_suspicious else {
        return 0;
    };
    let age = now.signed_duration_since(last);
    if age < Duration::zero() {
        // Clock skew: treat future timestamps as "just happened"
        return RECENCY_BONUS_FULL;
    }
    if age < Duration::days(7) {
        RECENCY_BONUS_FULL
    } else if age < Duration::days(30) {
        RECENCY_BONUS_HALF
    } else {
        0
    }
}

/// Derive the risk band for a subject
pub fn risk_level(factors: &RiskFactors, now: DateTime<Utc>) -> RiskLevel {
    RiskLevel::from_score(score(factors, now))
}

/// Whether an event should immediately block the subject.
///
/// Security violations always block. Other event types block only from the
/// high-risk band up, and only for the types that directly gate access to
/// funds or credentials.
pub fn should_auto_block(event_type: EventType, score: u8) -> bool {
    if event_type == EventType::SecurityViolation {
        return true;
    }
    if score < HIGH_RISK_THRESHOLD {
        return false;
    }
    matches!(
        event_type,
        EventType::LoginFailure | EventType::TwoFactorFailure | EventType::LargeTransaction
    )
}
