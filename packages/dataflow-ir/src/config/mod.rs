/*
 * Analysis configuration.
 *
 * Analysis configuration is a mapping
 * { analysis-name -> { option -> string } } where the recognised
 * top-level options per analysis are at least `maxPathLength` and
 * per-method classifiers (source/sanitiser/sink predicates as glob
 * patterns).
 *
 * Values are always strings in the wire format (so the config loads
 * cleanly from a flat YAML mapping); recognised options are parsed out of
 * that string map into a typed `AnalysisOptions`, validated once at
 * startup, and the glob-pattern classifiers (string-keyed method
 * matchers like `com.acme.*`) are compiled into a `globset::GlobSet`
 * automaton exactly once and reused across every Runner.
 */

pub mod error;

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

pub use error::{ConfigError, ConfigResult};

/// Selects one of the built-in Unit Resolvers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitResolverKind {
    Method,
    Class,
    Package,
    Singleton,
}

impl UnitResolverKind {
    pub fn parse(s: &str) -> ConfigResult<Self> {
        match s {
            "method" => Ok(Self::Method),
            "class" => Ok(Self::Class),
            "package" => Ok(Self::Package),
            "singleton" => Ok(Self::Singleton),
            other => Err(ConfigError::UnknownResolver(other.to_string())),
        }
    }
}

/// Raw, string-keyed per-analysis options as they appear on the wire.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawAnalysisOptions(pub HashMap<String, String>);

/// Raw top-level configuration: `{ analysis-name -> { option -> string } }`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfig(pub HashMap<String, RawAnalysisOptions>);

/// Validated, typed options for a single analysis.
#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    pub analysis_name: String,
    /// Bound on witness depth, consulted as a post-hoc filter on trace
    /// enumeration rather than an edge-production bound.
    pub max_path_length: Option<usize>,
    /// Maximum number of enumerated traces per vulnerability (default 3).
    pub max_traces: usize,
    pub sources: GlobSet,
    pub sanitizers: GlobSet,
    pub sinks: GlobSet,
}

const DEFAULT_MAX_TRACES: usize = 3;

fn compile_patterns(analysis: &str, raw: &str) -> ConfigResult<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let glob = Glob::new(pattern).map_err(|source| ConfigError::MalformedGlob {
            analysis: analysis.to_string(),
            pattern: pattern.to_string(),
            source,
        })?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|source| ConfigError::MalformedGlob {
            analysis: analysis.to_string(),
            pattern: raw.to_string(),
            source,
        })
}

impl AnalysisOptions {
    fn from_raw(analysis_name: &str, raw: &RawAnalysisOptions) -> ConfigResult<Self> {
        let max_path_length = match raw.0.get("maxPathLength") {
            None => None,
            Some(v) => Some(v.parse::<usize>().map_err(|_| ConfigError::MalformedOption {
                analysis: analysis_name.to_string(),
                option: "maxPathLength".to_string(),
                reason: format!("'{v}' is not a non-negative integer"),
            })?),
        };

        let max_traces = match raw.0.get("maxTraces") {
            None => DEFAULT_MAX_TRACES,
            Some(v) => v.parse::<usize>().map_err(|_| ConfigError::MalformedOption {
                analysis: analysis_name.to_string(),
                option: "maxTraces".to_string(),
                reason: format!("'{v}' is not a non-negative integer"),
            })?,
        };

        let sources = compile_patterns(
            analysis_name,
            raw.0.get("sourcePatterns").map(String::as_str).unwrap_or(""),
        )?;
        let sanitizers = compile_patterns(
            analysis_name,
            raw.0
                .get("sanitizerPatterns")
                .map(String::as_str)
                .unwrap_or(""),
        )?;
        let sinks = compile_patterns(
            analysis_name,
            raw.0.get("sinkPatterns").map(String::as_str).unwrap_or(""),
        )?;

        Ok(Self {
            analysis_name: analysis_name.to_string(),
            max_path_length,
            max_traces,
            sources,
            sanitizers,
            sinks,
        })
    }
}

/// Validated configuration for every analysis named in the run.
#[derive(Debug, Clone, Default)]
pub struct AnalysisConfig {
    pub analyses: HashMap<String, AnalysisOptions>,
}

impl AnalysisConfig {
    pub fn from_yaml_str(yaml: &str) -> ConfigResult<Self> {
        let raw: RawConfig = serde_yaml::from_str(yaml)?;
        Self::from_raw(raw)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    fn from_raw(raw: RawConfig) -> ConfigResult<Self> {
        let mut analyses = HashMap::with_capacity(raw.0.len());
        for (name, options) in &raw.0 {
            analyses.insert(name.clone(), AnalysisOptions::from_raw(name, options)?);
        }
        Ok(Self { analyses })
    }

    pub fn options_for(&self, analysis_name: &str) -> Option<&AnalysisOptions> {
        self.analyses.get(analysis_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_unit_resolver_kinds() {
        assert_eq!(UnitResolverKind::parse("method").unwrap(), UnitResolverKind::Method);
        assert_eq!(UnitResolverKind::parse("singleton").unwrap(), UnitResolverKind::Singleton);
        assert!(UnitResolverKind::parse("bogus").is_err());
    }

    #[test]
    fn loads_analysis_config_from_yaml() {
        let yaml = r#"
taint:
  maxPathLength: "10"
  maxTraces: "5"
  sourcePatterns: "com.acme.*.getUserInput, com.acme.Request.param"
  sinkPatterns: "com.acme.db.*.execute"
"#;
        let config = AnalysisConfig::from_yaml_str(yaml).unwrap();
        let taint = config.options_for("taint").unwrap();
        assert_eq!(taint.max_path_length, Some(10));
        assert_eq!(taint.max_traces, 5);
        assert!(taint.sources.is_match("com.acme.Foo.getUserInput"));
        assert!(taint.sinks.is_match("com.acme.db.Conn.execute"));
        assert!(!taint.sanitizers.is_match("anything"));
    }

    #[test]
    fn rejects_malformed_max_path_length() {
        let yaml = r#"
taint:
  maxPathLength: "not-a-number"
"#;
        let err = AnalysisConfig::from_yaml_str(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::MalformedOption { .. }));
    }

    #[test]
    fn defaults_max_traces_to_three() {
        let yaml = "taint: {}\n";
        let config = AnalysisConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.options_for("taint").unwrap().max_traces, 3);
    }
}
