//! Campaign donation policies: amount rules, recurrence rules, and
//! return-URL construction.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Policies
// ---------------------------------------------------------------------------

/// How a campaign lets donors choose the amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AmountType {
    /// Only the preset amounts are accepted.
    Fixed,
    /// Any amount within the min/max bounds.
    Open,
    /// Presets plus an open field.
    Both,
}

impl fmt::Display for AmountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AmountType::Fixed => "fixed",
            AmountType::Open => "open",
            AmountType::Both => "both",
        })
    }
}

/// Which payment cadences a campaign accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DonationType {
    Oneoff,
    Recurring,
    Both,
}

impl DonationType {
    /// Whether this campaign can accept a recurring donation at all.
    pub fn allows_recurring(self) -> bool {
        !matches!(self, DonationType::Oneoff)
    }
}

impl fmt::Display for DonationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DonationType::Oneoff => "oneoff",
            DonationType::Recurring => "recurring",
            DonationType::Both => "both",
        })
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Enforce `minimum_donation <= maximum_donation` when both are set.
pub fn validate_bounds(minimum: f64, maximum: Option<f64>) -> CoreResult<()> {
    if minimum < 0.0 {
        return Err(CoreError::Validation(
            "minimum donation must not be negative".into(),
        ));
    }
    if let Some(max) = maximum {
        if minimum > max {
            return Err(CoreError::Validation(format!(
                "minimum donation {minimum} exceeds maximum donation {max}"
            )));
        }
    }
    Ok(())
}

/// Check a requested donation amount against a campaign's bounds.
pub fn validate_amount(amount: f64, minimum: f64, maximum: Option<f64>) -> CoreResult<()> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(CoreError::Validation(
            "donation amount must be a positive number".into(),
        ));
    }
    if amount < minimum {
        return Err(CoreError::Validation(format!(
            "donation amount {amount} is below the campaign minimum {minimum}"
        )));
    }
    if let Some(max) = maximum {
        if amount > max {
            return Err(CoreError::Validation(format!(
                "donation amount {amount} is above the campaign maximum {max}"
            )));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Return URL
// ---------------------------------------------------------------------------

/// How a campaign wants the donor returned after checkout.
#[derive(Debug, Clone, Default)]
pub struct ReturnUrlPolicy {
    /// Show an in-page message on return: the transaction id is embedded as
    /// a query parameter so the front end can poll and display state.
    pub show_return_message: bool,
    /// Redirect to a campaign-specific URL instead of the requested one.
    pub use_custom_return_url: bool,
    pub custom_return_url: Option<String>,
}

/// Build the redirect URL handed to the payment vendor.
pub fn build_return_url(policy: &ReturnUrlPolicy, requested: &str, transaction_id: DbId) -> String {
    if policy.show_return_message {
        let separator = if requested.contains('?') { '&' } else { '?' };
        return format!("{requested}{separator}donation_id={transaction_id}");
    }
    if policy.use_custom_return_url {
        if let Some(custom) = policy.custom_return_url.as_deref() {
            if !custom.is_empty() {
                // The custom URL is used unmodified.
                return custom.to_string();
            }
        }
    }
    requested.to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn bounds_accept_min_below_max() {
        assert!(validate_bounds(1.0, Some(100.0)).is_ok());
        assert!(validate_bounds(1.0, None).is_ok());
        assert!(validate_bounds(5.0, Some(5.0)).is_ok());
    }

    #[test]
    fn bounds_reject_min_above_max() {
        assert_matches!(
            validate_bounds(10.0, Some(5.0)),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn amount_outside_bounds_is_rejected() {
        assert!(validate_amount(10.0, 1.0, Some(100.0)).is_ok());
        assert_matches!(
            validate_amount(0.5, 1.0, None),
            Err(CoreError::Validation(_))
        );
        assert_matches!(
            validate_amount(500.0, 1.0, Some(100.0)),
            Err(CoreError::Validation(_))
        );
        assert_matches!(
            validate_amount(f64::NAN, 1.0, None),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn return_message_embeds_transaction_id() {
        let policy = ReturnUrlPolicy {
            show_return_message: true,
            ..Default::default()
        };
        assert_eq!(
            build_return_url(&policy, "https://example.org/thanks", 42),
            "https://example.org/thanks?donation_id=42"
        );
        // Existing query string gets an ampersand.
        assert_eq!(
            build_return_url(&policy, "https://example.org/thanks?lang=nl", 42),
            "https://example.org/thanks?lang=nl&donation_id=42"
        );
    }

    #[test]
    fn custom_url_is_used_unmodified() {
        let policy = ReturnUrlPolicy {
            show_return_message: false,
            use_custom_return_url: true,
            custom_return_url: Some("https://example.org/landing".into()),
        };
        assert_eq!(
            build_return_url(&policy, "https://example.org/form", 7),
            "https://example.org/landing"
        );
    }

    #[test]
    fn requested_url_is_the_fallback() {
        let policy = ReturnUrlPolicy::default();
        assert_eq!(
            build_return_url(&policy, "https://example.org/form", 7),
            "https://example.org/form"
        );
    }

    #[test]
    fn recurring_allowed_unless_campaign_is_oneoff() {
        assert!(!DonationType::Oneoff.allows_recurring());
        assert!(DonationType::Recurring.allows_recurring());
        assert!(DonationType::Both.allows_recurring());
    }
}
