//! Acceptance policies and verdict evaluation.
//!
//! Thresholds live only in `Policy` values. The evaluator receives the policy
//! explicitly and reports the applied rule through `Policy::description`, so
//! reports and logs never restate threshold constants on their own.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Comparison context selecting an acceptance policy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonType {
    /// Same-backend desktop renders.
    #[default]
    Desktop,
    /// Web renders checked against desktop goldens.
    WebVsDesktop,
}

impl ComparisonType {
    /// Returns the built-in policy for this comparison type.
    pub fn policy(self) -> Policy {
        match self {
            ComparisonType::Desktop => Policy {
                kind: self,
                ssim_min: 0.995,
                max_channel_diff: Some(2),
            },
            ComparisonType::WebVsDesktop => Policy {
                kind: self,
                ssim_min: 0.990,
                max_channel_diff: None,
            },
        }
    }

    /// Returns the command-line / JSON spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            ComparisonType::Desktop => "desktop",
            ComparisonType::WebVsDesktop => "web_vs_desktop",
        }
    }

    fn label(self) -> &'static str {
        match self {
            ComparisonType::Desktop => "Desktop",
            ComparisonType::WebVsDesktop => "Web vs Desktop",
        }
    }
}

impl fmt::Display for ComparisonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComparisonType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "desktop" => Ok(ComparisonType::Desktop),
            "web_vs_desktop" => Ok(ComparisonType::WebVsDesktop),
            other => Err(format!(
                "unknown comparison type '{other}' (expected desktop or web_vs_desktop)"
            )),
        }
    }
}

/// Immutable acceptance rule.
///
/// A pair passes when `ssim >= ssim_min`, or, if `max_channel_diff` is set,
/// when the largest channel difference is within that bound.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Policy {
    kind: ComparisonType,
    ssim_min: f64,
    max_channel_diff: Option<u8>,
}

impl Policy {
    /// Builds a policy with custom thresholds for a comparison type.
    pub fn new(kind: ComparisonType, ssim_min: f64, max_channel_diff: Option<u8>) -> Self {
        Self {
            kind,
            ssim_min,
            max_channel_diff,
        }
    }

    /// Returns the comparison type this policy belongs to.
    pub fn kind(&self) -> ComparisonType {
        self.kind
    }

    /// Returns the SSIM lower bound.
    pub fn ssim_min(&self) -> f64 {
        self.ssim_min
    }

    /// Returns the channel-difference upper bound, if the policy uses one.
    pub fn max_channel_diff(&self) -> Option<u8> {
        self.max_channel_diff
    }

    /// Human-readable statement of the rule and its thresholds.
    pub fn description(&self) -> String {
        match self.max_channel_diff {
            Some(max_diff) => format!(
                "{} (SSIM ≥ {} OR channel Δ ≤ {})",
                self.kind.label(),
                self.ssim_min,
                max_diff
            ),
            None => format!("{} (SSIM ≥ {})", self.kind.label(), self.ssim_min),
        }
    }

    /// Applies the rule to measured metrics.
    pub fn evaluate(&self, ssim_score: f64, max_channel_diff: u8) -> Verdict {
        let ssim_ok = ssim_score >= self.ssim_min;
        let channel_ok = self
            .max_channel_diff
            .is_some_and(|bound| max_channel_diff <= bound);
        Verdict {
            passed: ssim_ok || channel_ok,
            description: self.description(),
        }
    }
}

impl Default for Policy {
    fn default() -> Self {
        ComparisonType::default().policy()
    }
}

/// Outcome of applying a policy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Verdict {
    /// Whether the pair is accepted.
    pub passed: bool,
    /// The rule that was applied, as reported to operators.
    pub description: String,
}

/// Evaluates `policy` against the measured SSIM and channel difference.
pub fn evaluate(policy: &Policy, ssim_score: f64, max_channel_diff: u8) -> Verdict {
    policy.evaluate(ssim_score, max_channel_diff)
}
