//! Expected and observed authorization outcomes, and the verdict comparing them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::ProbeError;

/// Why access was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DenialKind {
    /// S3 rejected a live call with the `AccessDenied` code
    AccessDenied,
    /// A simulation matched an explicit `Deny` statement
    ExplicitDeny,
    /// A simulation found no `Allow` statement
    ImplicitDeny,
}

impl DenialKind {
    /// Stable kebab-case name used in suites and reports
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AccessDenied => "access-denied",
            Self::ExplicitDeny => "explicit-deny",
            Self::ImplicitDeny => "implicit-deny",
        }
    }
}

impl fmt::Display for DenialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome a probe case expects.
///
/// Written in suites as `allowed`, `denied`, or a refined denial:
/// `access-denied`, `explicit-deny`, `implicit-deny`. A bare `denied` accepts
/// any denial kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ExpectedOutcome {
    /// The operation must succeed
    Allowed,
    /// The operation must be refused, optionally for a specific reason
    Denied(Option<DenialKind>),
}

impl ExpectedOutcome {
    /// True when the case expects access to be granted
    pub const fn is_allowed(self) -> bool {
        matches!(self, Self::Allowed)
    }
}

impl fmt::Display for ExpectedOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Allowed => f.write_str("allowed"),
            Self::Denied(None) => f.write_str("denied"),
            Self::Denied(Some(kind)) => write!(f, "{}", kind),
        }
    }
}

impl FromStr for ExpectedOutcome {
    type Err = ProbeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "allowed" => Ok(Self::Allowed),
            "denied" => Ok(Self::Denied(None)),
            "access-denied" => Ok(Self::Denied(Some(DenialKind::AccessDenied))),
            "explicit-deny" => Ok(Self::Denied(Some(DenialKind::ExplicitDeny))),
            "implicit-deny" => Ok(Self::Denied(Some(DenialKind::ImplicitDeny))),
            other => Err(ProbeError::validation_field(
                format!(
                    "unknown expected outcome '{}' (expected one of: allowed, denied, \
                     access-denied, explicit-deny, implicit-deny)",
                    other
                ),
                "expected",
            )),
        }
    }
}

impl TryFrom<String> for ExpectedOutcome {
    type Error = ProbeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ExpectedOutcome> for String {
    fn from(value: ExpectedOutcome) -> Self {
        value.to_string()
    }
}

/// What actually happened when a probe ran
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "kebab-case")]
pub enum Observation {
    /// The call completed (live) or the simulator answered `allowed`
    Allowed,
    /// Access was refused for a recognised reason
    Denied {
        /// reason for the refusal
        kind: DenialKind,
    },
    /// The provider returned an error that is not a recognised denial
    Error {
        /// provider error code, when the error carried one
        code: Option<String>,
        /// rendered error
        message: String,
    },
    /// Credentials for the probe's principal could not be obtained
    SetupFailed {
        /// the setup error, verbatim
        message: String,
    },
    /// Nothing trustworthy was observed
    Inconclusive {
        /// why the observation cannot be asserted against
        reason: String,
    },
}

impl fmt::Display for Observation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Allowed => f.write_str("allowed"),
            Self::Denied { kind } => write!(f, "{}", kind),
            Self::Error { code: Some(code), .. } => write!(f, "error({})", code),
            Self::Error { code: None, .. } => f.write_str("error"),
            Self::SetupFailed { .. } => f.write_str("setup-failed"),
            Self::Inconclusive { .. } => f.write_str("inconclusive"),
        }
    }
}

/// Result of comparing an observation with an expectation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "kebab-case")]
pub enum Verdict {
    /// Observation satisfies the expectation
    Pass,
    /// Observation contradicts the expectation
    Fail {
        /// diagnostic for the report
        message: String,
    },
    /// Observation cannot be asserted against
    Inconclusive {
        /// why
        reason: String,
    },
}

impl Verdict {
    /// Compare `observed` against `expected`.
    pub fn evaluate(expected: ExpectedOutcome, observed: &Observation) -> Self {
        match (expected, observed) {
            (_, Observation::Inconclusive { reason }) => Self::Inconclusive {
                reason: reason.clone(),
            },
            (_, Observation::SetupFailed { message }) => Self::Fail {
                message: message.clone(),
            },
            (ExpectedOutcome::Allowed, Observation::Allowed) => Self::Pass,
            (ExpectedOutcome::Allowed, Observation::Denied { kind }) => Self::Fail {
                message: format!("expected success, got denial ({})", kind),
            },
            (ExpectedOutcome::Allowed, Observation::Error { message, .. }) => Self::Fail {
                message: format!("expected success, got error: {}", message),
            },
            (ExpectedOutcome::Denied(_), Observation::Allowed) => Self::Fail {
                message: "expected denial, got success (the operation completed without any error)"
                    .to_string(),
            },
            (ExpectedOutcome::Denied(None), Observation::Denied { .. }) => Self::Pass,
            (ExpectedOutcome::Denied(Some(want)), Observation::Denied { kind }) => {
                if want == *kind {
                    Self::Pass
                } else {
                    Self::Fail {
                        message: format!("expected {}, got {}", want, kind),
                    }
                }
            }
            (ExpectedOutcome::Denied(_), Observation::Error { code, message }) => Self::Fail {
                message: format!(
                    "expected AccessDenied error but got: {} ({})",
                    code.as_deref().unwrap_or("no error code"),
                    message
                ),
            },
        }
    }

    /// True for [`Verdict::Pass`]
    pub const fn is_pass(&self) -> bool {
        matches!(self, Self::Pass)
    }

    /// Short label for tables
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Fail { .. } => "FAIL",
            Self::Inconclusive { .. } => "INCONCLUSIVE",
        }
    }
}

/// State of the bucket policy document fetched for diagnostics
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", content = "detail", rename_all = "kebab-case")]
pub enum ResourcePolicy {
    /// Not fetched in this run
    #[default]
    NotFetched,
    /// Policy document attached to the bucket
    Attached(String),
    /// The bucket has no policy
    Absent,
    /// The fetch failed for a reason other than a missing policy
    Unavailable(String),
}
