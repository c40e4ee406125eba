//! Configuration schema for the trajectory planning core.
//!
//! Mirrors the teacher's section-per-concern split: each section is an
//! independently `Default`-able, `Serialize`/`Deserialize` struct, and the
//! aggregate [`Config`] composes them. Every physical quantity that carries
//! a positivity invariant is a [`typed_floats::StrictlyPositiveFinite`] so a
//! negative or non-finite value cannot round-trip through TOML.

pub mod reader;

use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};
use typed_floats::StrictlyPositiveFinite;

pub use reader::{read_config, ConfigReaderError};

/// Error raised parsing a config file's contents.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Number of spatial dimensions the planner operates in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorldDimension {
    #[serde(rename = "2")]
    Two,
    #[serde(rename = "3")]
    Three,
}

impl WorldDimension {
    #[must_use]
    pub fn count(self) -> usize {
        match self {
            Self::Two => 2,
            Self::Three => 3,
        }
    }
}

impl Default for WorldDimension {
    fn default() -> Self {
        Self::Three
    }
}

/// **World section.**
/// Describes the ambient workspace the planner reasons about.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct WorldSection {
    pub dimension: WorldDimension,
    /// Plane height the z-coordinate is clamped to when `dimension` is
    /// [`WorldDimension::Two`]. Ignored in 3D mode.
    pub z_2d: f64,
}

impl Default for WorldSection {
    fn default() -> Self {
        Self {
            dimension: WorldDimension::default(),
            z_2d: 1.0,
        }
    }
}

/// **Robot section.**
/// Physical and communication parameters shared by every agent using this
/// configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RobotSection {
    /// SI unit: m. The smallest circle/sphere fully encompassing the agent.
    pub radius: StrictlyPositiveFinite<f64>,
    /// Vertical distance-metric scale factor modeling rotor downwash.
    pub downwash_ratio: StrictlyPositiveFinite<f64>,
    /// SI unit: m/s, applied per axis.
    pub v_max: StrictlyPositiveFinite<f64>,
    /// SI unit: m/s^2, applied per axis.
    pub a_max: StrictlyPositiveFinite<f64>,
}

impl Default for RobotSection {
    fn default() -> Self {
        Self {
            radius: StrictlyPositiveFinite::<f64>::new(0.15).expect("0.15 > 0.0"),
            downwash_ratio: StrictlyPositiveFinite::<f64>::new(2.0).expect("2.0 > 0.0"),
            v_max: StrictlyPositiveFinite::<f64>::new(2.0).expect("2.0 > 0.0"),
            a_max: StrictlyPositiveFinite::<f64>::new(4.0).expect("4.0 > 0.0"),
        }
    }
}

/// **Planning section.**
/// Horizon discretization and goal-arrival thresholds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PlanningSection {
    /// SI unit: s. Total lookahead, `segment_count * segment_duration`.
    pub horizon: StrictlyPositiveFinite<f64>,
    /// Number of Bernstein segments `M` the horizon is divided into.
    pub segment_count: NonZeroUsize,
    /// Degree `n` of each segment's Bernstein basis.
    pub basis_degree: NonZeroUsize,
    /// Distance below which the current goal is considered reached.
    pub goal_threshold: StrictlyPositiveFinite<f64>,
    /// Maximum tolerated drift between observed and integrated position
    /// before the planner forces a state reset.
    pub reset_threshold: StrictlyPositiveFinite<f64>,
}

impl PlanningSection {
    /// Duration `Δ` of a single segment.
    #[must_use]
    pub fn segment_duration(&self) -> f64 {
        self.horizon.get() / self.segment_count.get() as f64
    }
}

impl Default for PlanningSection {
    fn default() -> Self {
        Self {
            horizon: StrictlyPositiveFinite::<f64>::new(1.0).expect("1.0 > 0.0"),
            segment_count: NonZeroUsize::new(5).expect("5 > 0"),
            basis_degree: NonZeroUsize::new(5).expect("5 > 0"),
            goal_threshold: StrictlyPositiveFinite::<f64>::new(0.2).expect("0.2 > 0.0"),
            reset_threshold: StrictlyPositiveFinite::<f64>::new(0.3).expect("0.3 > 0.0"),
        }
    }
}

/// Weights and numerical parameters of the objective and solver retry
/// policy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct QpSection {
    /// Weight on integrated squared jerk.
    pub jerk_weight: f64,
    /// Weight on integrated squared snap.
    pub snap_weight: f64,
    /// Weight on deviation from the warm-start control points.
    pub warm_start_weight: f64,
    /// `epsilon` added to the Hessian diagonal on a numerical-failure retry.
    pub regularization_epsilon: StrictlyPositiveFinite<f64>,
    /// Wall-clock deadline for a single solve, in milliseconds. A solve
    /// that overruns this is treated as a numerical failure.
    pub deadline_ms: StrictlyPositiveFinite<f64>,
}

impl Default for QpSection {
    fn default() -> Self {
        Self {
            jerk_weight: 1.0,
            snap_weight: 0.1,
            warm_start_weight: 0.01,
            regularization_epsilon: StrictlyPositiveFinite::<f64>::new(1e-6).expect("1e-6 > 0.0"),
            deadline_ms: StrictlyPositiveFinite::<f64>::new(50.0).expect("50.0 > 0.0"),
        }
    }
}

/// Goal-selection policy, per `spec.md` Open Question (b): the reference
/// implementation ships two interchangeable goal-selection modes; a third,
/// grid-planner-backed mode simply forwards an externally supplied
/// waypoint.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::EnumString, strum_macros::Display,
)]
pub enum GoalMode {
    #[serde(rename = "PRIORBASED")]
    #[strum(serialize = "PRIORBASED")]
    PriorBased,
    #[serde(rename = "RIGHTHANDRULE")]
    #[strum(serialize = "RIGHTHANDRULE")]
    RightHandRule,
    #[serde(rename = "GRIDBASEDPLANNER")]
    #[strum(serialize = "GRIDBASEDPLANNER")]
    GridBasedPlanner,
}

impl Default for GoalMode {
    fn default() -> Self {
        Self::PriorBased
    }
}

/// **Coordination section.**
/// Parameters of the inter-agent coordination protocol: communication
/// range, deadlock-avoidance yielding, and goal arbitration policy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CoordinationSection {
    /// Inter-agent LSCs are only constructed against neighbors within this
    /// range. SI unit: m.
    pub communication_radius: StrictlyPositiveFinite<f64>,
    /// Number of consecutive INFEASIBLE ticks before an agent enters
    /// yielding mode.
    pub infeasible_ticks_before_yield: NonZeroUsize,
    pub goal_mode: GoalMode,
    /// Enables coupling to the external command executor (landing
    /// hand-off, disturbance reporting).
    pub multisim_experiment: bool,
}

impl Default for CoordinationSection {
    fn default() -> Self {
        Self {
            communication_radius: StrictlyPositiveFinite::<f64>::new(20.0).expect("20.0 > 0.0"),
            infeasible_ticks_before_yield: NonZeroUsize::new(3).expect("3 > 0"),
            goal_mode: GoalMode::default(),
            multisim_experiment: false,
        }
    }
}

/// Collection of all configuration sections.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    #[serde(default)]
    pub world: WorldSection,
    #[serde(default)]
    pub robot: RobotSection,
    #[serde(default)]
    pub planning: PlanningSection,
    #[serde(default)]
    pub qp: QpSection,
    #[serde(default)]
    pub coordination: CoordinationSection,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            world: WorldSection::default(),
            robot: RobotSection::default(),
            planning: PlanningSection::default(),
            qp: QpSection::default(),
            coordination: CoordinationSection::default(),
        }
    }
}

impl Config {
    /// Parse a config file from a given path.
    ///
    /// # Errors
    /// Returns [`ParseError::Io`] if the file cannot be read, or
    /// [`ParseError::Toml`] if its contents are not valid TOML for this
    /// schema.
    pub fn from_file<P>(path: P) -> Result<Self, ParseError>
    where
        P: AsRef<std::path::Path>,
    {
        std::fs::read_to_string(path)
            .map_err(Into::into)
            .and_then(|contents| Self::parse(contents.as_str()))
    }

    /// Parse a config file's contents.
    ///
    /// # Errors
    /// Returns [`ParseError::Toml`] if `contents` is not valid TOML for this
    /// schema.
    pub fn parse(contents: &str) -> Result<Self, ParseError> {
        toml::from_str(contents).map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = Config::default();
        let serialized = toml::to_string(&config).expect("default config serializes");
        let parsed = Config::parse(&serialized).expect("serialized default config parses");
        assert_eq!(parsed.robot.radius.get(), config.robot.radius.get());
        assert_eq!(parsed.coordination.goal_mode, config.coordination.goal_mode);
    }

    #[test]
    fn segment_duration_divides_horizon_evenly() {
        let planning = PlanningSection::default();
        assert_eq!(
            planning.segment_duration() * planning.segment_count.get() as f64,
            planning.horizon.get()
        );
    }

    #[test]
    fn goal_mode_parses_reference_literal_strings() {
        assert_eq!(
            "PRIORBASED".parse::<GoalMode>().expect("valid literal"),
            GoalMode::PriorBased
        );
        assert_eq!(
            "RIGHTHANDRULE".parse::<GoalMode>().expect("valid literal"),
            GoalMode::RightHandRule
        );
        assert_eq!(
            "GRIDBASEDPLANNER".parse::<GoalMode>().expect("valid literal"),
            GoalMode::GridBasedPlanner
        );
    }

    #[test]
    fn rejects_non_positive_radius() {
        let toml_src = r#"
            [robot]
            radius = -1.0
            downwash-ratio = 2.0
            v-max = 2.0
            a-max = 4.0
        "#;
        assert!(Config::parse(toml_src).is_err());
    }
}
