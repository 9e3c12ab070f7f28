use serde::{Deserialize, Serialize};
use std::fmt;

/// Production lines where mold changes happen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Line {
    #[serde(rename = "TB1")]
    Tb1,
    #[serde(rename = "TB2")]
    Tb2,
    #[serde(rename = "TB3")]
    Tb3,
    #[serde(rename = "EDF1")]
    Edf1,
    #[serde(rename = "EDF2")]
    Edf2,
}

impl Line {
    pub const ALL: [Line; 5] = [Line::Tb1, Line::Tb2, Line::Tb3, Line::Edf1, Line::Edf2];

    pub fn code(&self) -> &'static str {
        match self {
            Line::Tb1 => "TB1",
            Line::Tb2 => "TB2",
            Line::Tb3 => "TB3",
            Line::Edf1 => "EDF1",
            Line::Edf2 => "EDF2",
        }
    }

    /// Convert enum → DB string
    pub fn to_db_str(&self) -> &'static str {
        self.code()
    }

    /// Convert DB string → enum
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "TB1" => Some(Line::Tb1),
            "TB2" => Some(Line::Tb2),
            "TB3" => Some(Line::Tb3),
            "EDF1" => Some(Line::Edf1),
            "EDF2" => Some(Line::Edf2),
            _ => None,
        }
    }

    /// Helper: convert input code from CLI (lowercase or uppercase)
    pub fn from_code(code: &str) -> Option<Self> {
        Line::from_db_str(&code.trim().to_uppercase())
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_code_is_case_insensitive() {
        assert_eq!(Line::from_code("edf2"), Some(Line::Edf2));
        assert_eq!(Line::from_code(" tb1 "), Some(Line::Tb1));
        assert_eq!(Line::from_code("TB4"), None);
    }

    #[test]
    fn serde_uses_line_codes() {
        let json = serde_json::to_string(&Line::Edf1).unwrap();
        assert_eq!(json, "\"EDF1\"");
        let back: Line = serde_json::from_str("\"TB3\"").unwrap();
        assert_eq!(back, Line::Tb3);
    }
}
