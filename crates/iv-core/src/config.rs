//! Variable specification and display configuration

use crate::{Error, Result};
use bitflags::bitflags;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

bitflags! {
    /// Which optional outputs a run should produce
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DisplayMode: u8 {
        /// Emit both fitted models' regression summaries per stage
        const SUMMARY = 0b01;
        /// Render the per-stage causal-effect chart
        const PLOT = 0b10;
    }
}

impl DisplayMode {
    pub fn wants_summary(self) -> bool {
        self.contains(Self::SUMMARY)
    }

    pub fn wants_plot(self) -> bool {
        self.contains(Self::PLOT)
    }
}

impl FromStr for DisplayMode {
    type Err = Error;

    /// Parse words such as `"none"`, `"summary"`, `"plot"` or `"summary plot"`
    fn from_str(s: &str) -> Result<Self> {
        let mut mode = Self::empty();
        for word in s
            .split(|c: char| c.is_whitespace() || c == ',' || c == '|')
            .filter(|w| !w.is_empty())
        {
            match word.to_ascii_lowercase().as_str() {
                "none" => {}
                "summary" => mode |= Self::SUMMARY,
                "plot" => mode |= Self::PLOT,
                other => {
                    return Err(Error::InvalidParameter(format!(
                        "Unknown display mode `{other}` (expected none, summary or plot)"
                    )))
                }
            }
        }
        Ok(mode)
    }
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.wants_summary(), self.wants_plot()) {
            (false, false) => write!(f, "none"),
            (true, false) => write!(f, "summary"),
            (false, true) => write!(f, "plot"),
            (true, true) => write!(f, "summary plot"),
        }
    }
}

impl Serialize for DisplayMode {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DisplayMode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Logical roles of the columns entering a 2SLS fit
///
/// The instruments are assumed to affect the outcome only through the
/// treatment (exclusion restriction). That assumption is not testable from
/// the data and is never checked here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableSpec {
    /// Dependent variable of the second stage
    pub outcome_var: String,
    /// Endogenous treatment, typically 0/1 for "advanced"
    pub treatment_var: String,
    /// Excluded instruments, at least one
    pub instrument_vars: Vec<String>,
    /// Covariates included in both stages
    #[serde(default)]
    pub control_vars: Vec<String>,
    #[serde(default)]
    pub display: DisplayMode,
}

impl VariableSpec {
    pub fn new<I, S>(outcome: impl Into<String>, treatment: impl Into<String>, instruments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            outcome_var: outcome.into(),
            treatment_var: treatment.into(),
            instrument_vars: instruments.into_iter().map(Into::into).collect(),
            control_vars: Vec::new(),
            display: DisplayMode::empty(),
        }
    }

    pub fn with_controls<I, S>(mut self, controls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.control_vars = controls.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_display(mut self, display: DisplayMode) -> Self {
        self.display = display;
        self
    }

    /// Parse a specification from JSON
    pub fn from_json_str(json: &str) -> Result<Self> {
        let spec: Self = serde_json::from_str(json)
            .map_err(|e| Error::InvalidSpecification(format!("Malformed JSON: {e}")))?;
        spec.validate()?;
        Ok(spec)
    }

    /// Read a specification from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Check the structural rules of the specification
    pub fn validate(&self) -> Result<()> {
        if self.instrument_vars.is_empty() {
            return Err(Error::InvalidSpecification(
                "At least one instrument variable is required".to_string(),
            ));
        }
        if self.outcome_var == self.treatment_var {
            return Err(Error::InvalidSpecification(format!(
                "Outcome and treatment are the same column `{}`",
                self.outcome_var
            )));
        }
        for (role, name) in [("treatment", &self.treatment_var), ("outcome", &self.outcome_var)] {
            if self.instrument_vars.contains(name) {
                return Err(Error::InvalidSpecification(format!(
                    "The {role} `{name}` is also listed as an instrument"
                )));
            }
            if self.control_vars.contains(name) {
                return Err(Error::InvalidSpecification(format!(
                    "The {role} `{name}` is also listed as a control"
                )));
            }
        }
        Ok(())
    }

    /// Every referenced column once, outcome first
    pub fn all_columns(&self) -> Vec<&str> {
        let mut columns: Vec<&str> = Vec::with_capacity(
            2 + self.instrument_vars.len() + self.control_vars.len(),
        );
        let ordered = std::iter::once(self.outcome_var.as_str())
            .chain(self.instrument_vars.iter().map(String::as_str))
            .chain(std::iter::once(self.treatment_var.as_str()))
            .chain(self.control_vars.iter().map(String::as_str));
        for name in ordered {
            if !columns.contains(&name) {
                columns.push(name);
            }
        }
        columns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cup_spec() -> VariableSpec {
        VariableSpec::new(
            "next_team_points",
            "team_win",
            ["opponent_league_rank_prev", "opponent_division"],
        )
        .with_controls(["team_rank_prev", "team_size", "distance"])
    }

    #[test]
    fn test_display_mode_parsing() {
        assert_eq!("none".parse::<DisplayMode>().unwrap(), DisplayMode::empty());
        assert_eq!("".parse::<DisplayMode>().unwrap(), DisplayMode::empty());
        assert_eq!("summary".parse::<DisplayMode>().unwrap(), DisplayMode::SUMMARY);
        assert_eq!(
            "summary plot".parse::<DisplayMode>().unwrap(),
            DisplayMode::SUMMARY | DisplayMode::PLOT
        );
        assert_eq!("Plot,summary".parse::<DisplayMode>().unwrap().bits(), 0b11);
        assert!("chart".parse::<DisplayMode>().is_err());
    }

    #[test]
    fn test_display_mode_round_trip_text() {
        for mode in ["none", "summary", "plot", "summary plot"] {
            assert_eq!(mode.parse::<DisplayMode>().unwrap().to_string(), mode);
        }
    }

    #[test]
    fn test_spec_validation() {
        assert!(cup_spec().validate().is_ok());

        let no_instruments = VariableSpec::new("y", "d", Vec::<String>::new());
        assert!(matches!(
            no_instruments.validate(),
            Err(Error::InvalidSpecification(_))
        ));

        let same = VariableSpec::new("y", "y", ["z"]);
        assert!(same.validate().is_err());

        let treatment_as_control = VariableSpec::new("y", "d", ["z"]).with_controls(["d"]);
        let err = treatment_as_control.validate().unwrap_err();
        assert!(err.to_string().contains("treatment `d`"));

        let outcome_as_instrument = VariableSpec::new("y", "d", ["y"]);
        assert!(outcome_as_instrument.validate().is_err());

        // An instrument repeated as a control is accepted and counted once
        let overlap = VariableSpec::new("y", "d", ["z"]).with_controls(["z"]);
        assert!(overlap.validate().is_ok());
    }

    #[test]
    fn test_all_columns_deduplicated() {
        let spec = VariableSpec::new("y", "d", ["z", "w"]).with_controls(["w", "c"]);
        assert_eq!(spec.all_columns(), vec!["y", "z", "w", "d", "c"]);
    }

    #[test]
    fn test_spec_from_json() {
        let json = r#"{
            "outcome_var": "team_rank_diff",
            "treatment_var": "team_win",
            "instrument_vars": ["opponent_league_rank_prev"],
            "control_vars": ["team_size", "mean_value"],
            "display": "summary plot"
        }"#;
        let spec = VariableSpec::from_json_str(json).unwrap();
        assert_eq!(spec.outcome_var, "team_rank_diff");
        assert_eq!(spec.control_vars.len(), 2);
        assert!(spec.display.wants_summary());
        assert!(spec.display.wants_plot());

        let minimal = r#"{"outcome_var": "y", "treatment_var": "d", "instrument_vars": ["z"]}"#;
        let spec = VariableSpec::from_json_str(minimal).unwrap();
        assert!(spec.control_vars.is_empty());
        assert_eq!(spec.display, DisplayMode::empty());

        let invalid = r#"{"outcome_var": "y", "treatment_var": "d", "instrument_vars": []}"#;
        assert!(VariableSpec::from_json_str(invalid).is_err());

        let bad_display = r#"{"outcome_var": "y", "treatment_var": "d", "instrument_vars": ["z"], "display": "loud"}"#;
        assert!(VariableSpec::from_json_str(bad_display).is_err());
    }

    #[test]
    fn test_spec_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spec.json");
        let spec = cup_spec().with_display(DisplayMode::PLOT);
        std::fs::write(&path, serde_json::to_string_pretty(&spec).unwrap()).unwrap();

        let loaded = VariableSpec::from_json_file(&path).unwrap();
        assert_eq!(loaded, spec);

        assert!(matches!(
            VariableSpec::from_json_file(dir.path().join("missing.json")),
            Err(Error::Io(_))
        ));
    }
}
