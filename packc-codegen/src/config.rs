//! Generator configuration.

use crate::error::CodegenError;
use std::fmt;
use std::str::FromStr;

/// Output language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Target {
    /// C99 header and source.
    #[default]
    C,
    /// Rust declarations and `Default` implementations.
    Rust,
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::C => f.write_str("c"),
            Self::Rust => f.write_str("rust"),
        }
    }
}

impl FromStr for Target {
    type Err = CodegenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "c" => Ok(Self::C),
            "rust" | "rs" => Ok(Self::Rust),
            other => Err(CodegenError::generation(format!(
                "unknown target '{other}' (expected 'c' or 'rust')"
            ))),
        }
    }
}

/// Options controlling generated output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// Output language.
    pub target: Target,
    /// Base file name of the generated units.
    pub unit_name: String,
    /// Include guard for the C header; derived from the unit name if unset.
    pub header_guard: Option<String>,
    /// Whether to prepend a "generated file" banner.
    pub banner: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            target: Target::C,
            unit_name: "packets".to_string(),
            header_guard: None,
            banner: true,
        }
    }
}

impl GeneratorConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the output language.
    #[must_use]
    pub fn target(mut self, target: Target) -> Self {
        self.target = target;
        self
    }

    /// Sets the unit name.
    #[must_use]
    pub fn unit_name(mut self, name: impl Into<String>) -> Self {
        self.unit_name = name.into();
        self
    }

    /// Overrides the C include guard.
    #[must_use]
    pub fn header_guard(mut self, guard: impl Into<String>) -> Self {
        self.header_guard = Some(guard.into());
        self
    }

    /// Enables or disables the banner.
    #[must_use]
    pub fn banner(mut self, enabled: bool) -> Self {
        self.banner = enabled;
        self
    }

    /// Returns the include guard to use.
    #[must_use]
    pub fn guard(&self) -> String {
        self.header_guard.clone().unwrap_or_else(|| {
            let mut guard: String = self
                .unit_name
                .chars()
                .map(|c| {
                    if c.is_ascii_alphanumeric() {
                        c.to_ascii_uppercase()
                    } else {
                        '_'
                    }
                })
                .collect();
            if guard.starts_with(|c: char| c.is_ascii_digit()) {
                guard.insert(0, '_');
            }
            guard.push_str("_H");
            guard
        })
    }

    /// Checks that the unit name is usable as a file stem.
    ///
    /// # Errors
    /// Returns `CodegenError::Generation` for empty names or names with
    /// path separators.
    pub fn validate(&self) -> Result<(), CodegenError> {
        let name = self.unit_name.as_str();
        if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
            return Err(CodegenError::generation(format!(
                "invalid unit name '{name}'"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GeneratorConfig::default();
        assert_eq!(config.target, Target::C);
        assert_eq!(config.unit_name, "packets");
        assert!(config.banner);
        assert_eq!(config.guard(), "PACKETS_H");
    }

    #[test]
    fn test_builder() {
        let config = GeneratorConfig::new()
            .target(Target::Rust)
            .unit_name("wire-v2")
            .banner(false);
        assert_eq!(config.target, Target::Rust);
        assert_eq!(config.guard(), "WIRE_V2_H");
        assert!(!config.banner);

        let config = config.header_guard("MY_GUARD");
        assert_eq!(config.guard(), "MY_GUARD");
    }

    #[test]
    fn test_guard_leading_digit() {
        assert_eq!(GeneratorConfig::new().unit_name("2fa").guard(), "_2FA_H");
    }

    #[test]
    fn test_target_from_str() {
        assert_eq!("C".parse::<Target>().expect("Failed to parse"), Target::C);
        assert_eq!("rust".parse::<Target>().expect("Failed to parse"), Target::Rust);
        assert!("go".parse::<Target>().is_err());
    }

    #[test]
    fn test_validate_unit_name() {
        assert!(GeneratorConfig::new().validate().is_ok());
        assert!(GeneratorConfig::new().unit_name("").validate().is_err());
        assert!(GeneratorConfig::new().unit_name("a/b").validate().is_err());
    }
}
