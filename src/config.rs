//! Engine configuration, loadable from TOML.
//!
//! Every field has a default, so a file only needs the values it changes.
//! Expansion caps cannot be removed by leaving `max_expansions` out, because
//! a missing key means "use the default cap"; set `unlimited = true` instead.
use std::path::Path;
use std::time::Duration;

use crate::engine::GoalRule;
use crate::error::{ConfigError, EngineError};
use crate::hint::HintConfig;
use crate::solver::{Algorithm, HeuristicKind, SearchLimits, SolverConfig};

/// Search settings for full solves.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SolverSettings {
    pub max_expansions: Option<usize>,
    /// Ignore `max_expansions` and search until solved or out of time.
    pub unlimited: bool,
    pub time_limit_ms: Option<u64>,
    pub weight: f64,
    pub algorithm: Algorithm,
    pub heuristic: HeuristicKind,
    pub goal: GoalRule,
}

impl Default for SolverSettings {
    fn default() -> Self {
        SolverSettings {
            max_expansions: Some(200_000),
            unlimited: false,
            time_limit_ms: None,
            weight: 1.0,
            algorithm: Algorithm::AStar,
            heuristic: HeuristicKind::Estimate,
            goal: GoalRule::EmptyOrComplete,
        }
    }
}

/// Search settings for hint requests.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct HintSettings {
    pub max_expansions: Option<usize>,
    /// Ignore `max_expansions` for hint searches.
    pub unlimited: bool,
    pub time_limit_ms: Option<u64>,
    pub fallback: bool,
}

impl Default for HintSettings {
    fn default() -> Self {
        HintSettings {
            max_expansions: Some(20_000),
            unlimited: false,
            time_limit_ms: None,
            fallback: true,
        }
    }
}

/// Top-level engine configuration, loadable from TOML.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Number of branches (N).
    pub branches: usize,
    /// Number of colors (C).
    pub colors: usize,
    /// Reverse moves the generator applies to a solved board.
    pub scramble_moves: usize,
    pub solver: SolverSettings,
    pub hint: HintSettings,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            branches: 7,
            colors: 5,
            scramble_moves: 120,
            solver: SolverSettings::default(),
            hint: HintSettings::default(),
        }
    }
}

fn limits(max_expansions: Option<usize>, unlimited: bool, time_limit_ms: Option<u64>) -> SearchLimits {
    SearchLimits {
        max_expansions: max_expansions.filter(|_| !unlimited),
        time_limit: time_limit_ms.map(Duration::from_millis),
    }
}

impl EngineConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: EngineConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the file
    /// does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            log::warn!("config file '{}' not found, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), EngineError> {
        if !(4..=10).contains(&self.branches) {
            return Err(EngineError::InvalidArgument(format!(
                "branches must be in 4..=10, got {}",
                self.branches
            )));
        }
        if !(3..=8).contains(&self.colors) {
            return Err(EngineError::InvalidArgument(format!(
                "colors must be in 3..=8, got {}",
                self.colors
            )));
        }
        if self.colors >= self.branches {
            return Err(EngineError::InvalidArgument(format!(
                "colors ({}) must be fewer than branches ({})",
                self.colors, self.branches
            )));
        }
        self.solver_config().validate()
    }

    pub fn solver_config(&self) -> SolverConfig {
        SolverConfig {
            limits: limits(
                self.solver.max_expansions,
                self.solver.unlimited,
                self.solver.time_limit_ms,
            ),
            weight: self.solver.weight,
            goal: self.solver.goal,
            algorithm: self.solver.algorithm,
            heuristic: self.solver.heuristic,
        }
    }

    /// Hint searches share the solver's weight, goal and algorithm but use
    /// their own, tighter limits.
    pub fn hint_config(&self) -> HintConfig {
        HintConfig {
            solver: SolverConfig {
                limits: limits(
                    self.hint.max_expansions,
                    self.hint.unlimited,
                    self.hint.time_limit_ms,
                ),
                ..self.solver_config()
            },
            fallback: self.hint.fallback,
        }
    }
}
