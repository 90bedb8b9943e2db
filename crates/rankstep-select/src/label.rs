//! Binary class labels.

use std::fmt;
use std::str::FromStr;

use crate::error::SelectError;

/// One of the two recognized classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Label {
    /// The `+1` class.
    Positive,
    /// The `-1` class.
    Negative,
}

impl Label {
    /// Both classes, in the order folds are filled.
    pub const ALL: [Label; 2] = [Label::Positive, Label::Negative];

    /// Return the zero-based class index used by classifiers (`-1` is 0, `+1` is 1).
    #[must_use]
    pub fn class_index(self) -> usize {
        match self {
            Label::Negative => 0,
            Label::Positive => 1,
        }
    }

    /// Return the label for a zero-based class index.
    #[must_use]
    pub fn from_class_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Label::Negative),
            1 => Some(Label::Positive),
            _ => None,
        }
    }

    /// Return the signed value, `1` or `-1`.
    #[must_use]
    pub fn value(self) -> i8 {
        match self {
            Label::Positive => 1,
            Label::Negative => -1,
        }
    }
}

impl TryFrom<f64> for Label {
    type Error = SelectError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if value == 1.0 {
            Ok(Label::Positive)
        } else if value == -1.0 {
            Ok(Label::Negative)
        } else {
            Err(SelectError::UnrecognizedLabel {
                value: value.to_string(),
            })
        }
    }
}

impl TryFrom<i64> for Label {
    type Error = SelectError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Label::Positive),
            -1 => Ok(Label::Negative),
            other => Err(SelectError::UnrecognizedLabel {
                value: other.to_string(),
            }),
        }
    }
}

impl FromStr for Label {
    type Err = SelectError;

    /// Accepts `1`, `+1`, `-1` and float spellings such as `1.0` or `-1.0`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let unrecognized = || SelectError::UnrecognizedLabel {
            value: trimmed.to_string(),
        };
        let value: f64 = trimmed.parse().map_err(|_| unrecognized())?;
        Label::try_from(value).map_err(|_| unrecognized())
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Positive => f.write_str("+1"),
            Label::Negative => f.write_str("-1"),
        }
    }
}
