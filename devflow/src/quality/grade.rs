//! Letter grades for quality scores.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Letter grade derived from a 0-100 score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Grade {
    /// 95 and above.
    A,
    /// 85 and above.
    B,
    /// 70 and above.
    C,
    /// 60 and above.
    D,
    /// Below 60.
    E,
}

impl Grade {
    /// Grades a score.
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score >= 95.0 {
            Self::A
        } else if score >= 85.0 {
            Self::B
        } else if score >= 70.0 {
            Self::C
        } else if score >= 60.0 {
            Self::D
        } else {
            Self::E
        }
    }

    /// The label printed next to the letter in reports.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::A => "优秀",
            Self::B => "良好",
            Self::C => "中等",
            Self::D => "及格",
            Self::E => "不及格",
        }
    }

    /// Returns the grade letter.
    #[must_use]
    pub const fn letter(self) -> char {
        match self {
            Self::A => 'A',
            Self::B => 'B',
            Self::C => 'C',
            Self::D => 'D',
            Self::E => 'E',
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.letter(), self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grade_boundaries() {
        assert_eq!(Grade::from_score(100.0), Grade::A);
        assert_eq!(Grade::from_score(95.0), Grade::A);
        assert_eq!(Grade::from_score(94.99), Grade::B);
        assert_eq!(Grade::from_score(85.0), Grade::B);
        assert_eq!(Grade::from_score(70.0), Grade::C);
        assert_eq!(Grade::from_score(60.0), Grade::D);
        assert_eq!(Grade::from_score(59.9), Grade::E);
        assert_eq!(Grade::from_score(0.0), Grade::E);
    }

    #[test]
    fn test_grade_display() {
        assert_eq!(Grade::A.to_string(), "A(优秀)");
        assert_eq!(Grade::E.to_string(), "E(不及格)");
    }
}
