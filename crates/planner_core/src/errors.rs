//! Per-subsystem error enums, following the teacher's one-enum-per-module
//! convention. Only [`PlannerError`] is surfaced to a caller of
//! [`crate::Planner::plan`]; everything else is recovered internally and
//! only contributes to [`crate::statistics::PlanningStatistics`].

/// Raised by the LSC/SFC constructors when a single constraint cannot be
/// built. Non-fatal: the caller records it and continues with the
/// remaining constraints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ConstraintError {
    #[error("witness points for this pair coincide, no separating normal exists")]
    DegenerateWitness,
    #[error("geometry kernel could not resolve a closest-point pair")]
    Geometry(#[from] geometry::GeometryError),
}

/// Raised by the solver adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SolveError {
    #[error("qp is infeasible")]
    Infeasible,
    #[error("solver failed numerically: {reason}")]
    NumericalFailure { reason: &'static str },
    #[error("solver exceeded its deadline")]
    DeadlineExceeded,
}

/// Top-level error surfaced by [`crate::Planner::plan`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PlannerError {
    #[error("required inputs are not yet available this tick")]
    InputNotReady,
    #[error("initial trajectory generation failed")]
    InitTrajGenerationFail,
    #[error("too many constraints failed to generate to produce a usable QP")]
    ConstraintGenerationFail,
    #[error("qp solve failed: {0}")]
    QpFail(SolveError),
}
