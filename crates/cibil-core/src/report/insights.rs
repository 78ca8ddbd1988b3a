//! Derived ratios and rule-based recommendations.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::report::CreditReportSummary;

/// Highest possible CIBIL score, used for the score ratio.
const SCORE_CEILING: u16 = 900;
/// Enquiries are reported for the last twelve months.
const ENQUIRY_MONTHS: u32 = 12;

const HIGH_UTILIZATION: Decimal = Decimal::from_parts(30, 0, 0, false, 2);
const LOW_SCORE: u16 = 650;
const MANY_ENQUIRIES: u32 = 4;

/// Ratios computed from a summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Insights {
    /// Outstanding balance over credit limit.
    pub utilization: Option<Decimal>,
    /// Score over 900.
    pub score_ratio: Option<Decimal>,
    /// Enquiries per month over the last year.
    pub enquiry_intensity: Option<Decimal>,
    pub recommendations: Vec<String>,
}

impl Insights {
    pub fn from_summary(summary: &CreditReportSummary) -> Self {
        let utilization = match (
            summary.total_outstanding_balance.value,
            summary.total_credit_limit.value,
        ) {
            (Some(balance), Some(limit)) if !limit.is_zero() => Some((balance / limit).round_dp(4)),
            _ => None,
        };

        let score_ratio = summary
            .score
            .value
            .map(|score| (Decimal::from(score) / Decimal::from(SCORE_CEILING)).round_dp(4));

        let enquiry_intensity = summary
            .enquiry_count
            .value
            .filter(|&n| n > 0)
            .map(|n| (Decimal::from(n) / Decimal::from(ENQUIRY_MONTHS)).round_dp(4));

        let mut recommendations = Vec::new();
        if utilization.is_some_and(|u| u > HIGH_UTILIZATION) {
            recommendations
                .push("High utilization (>30%): pay down revolving balances to improve score.".to_string());
        }
        if summary.score.value.is_some_and(|s| s < LOW_SCORE) {
            recommendations
                .push("Score below 650: maintain on-time payments for 6 months and avoid new credit.".to_string());
        }
        if summary.enquiry_count.value.is_some_and(|n| n >= MANY_ENQUIRIES) {
            recommendations.push(
                "Multiple recent enquiries: pause new applications to reduce credit-hunger flags.".to_string(),
            );
        }
        if summary.counts.adverse_count > 0 {
            recommendations.push(
                "History of written-off/settled accounts: obtain closure letters and rebuild with a secured card."
                    .to_string(),
            );
        }

        Self {
            utilization,
            score_ratio,
            enquiry_intensity,
            recommendations,
        }
    }

    /// Named ratios in display order.
    pub fn ratios(&self) -> [(&'static str, Option<Decimal>); 3] {
        [
            ("Utilization", self.utilization),
            ("Score/900", self.score_ratio),
            ("Enquiry Intensity (12m)", self.enquiry_intensity),
        ]
    }
}
