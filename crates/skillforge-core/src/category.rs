//! The closed set of skill categories.

use std::fmt;
use std::str::FromStr;

/// A skill's closed-set category, per spec.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Testing,
    Debugging,
    Refactoring,
    Architecture,
    Data,
    Security,
    Devops,
    Toolchain,
    #[default]
    General,
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Testing => "testing",
            Category::Debugging => "debugging",
            Category::Refactoring => "refactoring",
            Category::Architecture => "architecture",
            Category::Data => "data",
            Category::Security => "security",
            Category::Devops => "devops",
            Category::Toolchain => "toolchain",
            Category::General => "general",
            Category::Other => "other",
        }
    }

    pub fn all() -> &'static [Category] {
        &[
            Category::Testing,
            Category::Debugging,
            Category::Refactoring,
            Category::Architecture,
            Category::Data,
            Category::Security,
            Category::Devops,
            Category::Toolchain,
            Category::General,
            Category::Other,
        ]
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Any string not matching a known category falls back to [`Category::Other`]
/// rather than failing parsing; this is intentional — an unrecognized
/// category is a progressive-disclosure concern, not a schema violation.
impl FromStr for Category {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_lowercase().as_str() {
            "testing" => Category::Testing,
            "debugging" => Category::Debugging,
            "refactoring" => Category::Refactoring,
            "architecture" => Category::Architecture,
            "data" => Category::Data,
            "security" => Category::Security,
            "devops" => Category::Devops,
            "toolchain" => Category::Toolchain,
            "general" => Category::General,
            _ => Category::Other,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_str() {
        for cat in Category::all() {
            let parsed: Category = cat.as_str().parse().unwrap();
            assert_eq!(parsed, *cat);
        }
    }

    #[test]
    fn unknown_falls_back_to_other() {
        let parsed: Category = "quantum-computing".parse().unwrap();
        assert_eq!(parsed, Category::Other);
    }

    #[test]
    fn parsing_is_case_insensitive() {
        let parsed: Category = "ToolChain".parse().unwrap();
        assert_eq!(parsed, Category::Toolchain);
    }
}
