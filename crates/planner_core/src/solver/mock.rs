//! Deterministic [`QpSolver`] stand-ins used by the planner's own unit
//! tests to exercise the INFEASIBLE / NUMERICAL_FAIL / regularization-retry
//! / fallback paths without linking a real solver.

use std::time::Duration;

use super::{QpProblem, QpSolver, SolveOutcome};

/// Echoes the problem's warm start back as the solution, unconditionally
/// successful. Useful for exercising the assembler/planner wiring without
/// caring about optimality.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoWarmStart;

impl QpSolver for EchoWarmStart {
    fn solve(&self, problem: &QpProblem, _deadline: Duration) -> SolveOutcome {
        SolveOutcome::Success {
            solution: problem.warm_start.clone(),
        }
    }
}

/// Always reports INFEASIBLE.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysInfeasible;

impl QpSolver for AlwaysInfeasible {
    fn solve(&self, _problem: &QpProblem, _deadline: Duration) -> SolveOutcome {
        SolveOutcome::Infeasible
    }
}

/// Always reports NUMERICAL_FAIL, regardless of regularization.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysNumericalFail;

impl QpSolver for AlwaysNumericalFail {
    fn solve(&self, _problem: &QpProblem, _deadline: Duration) -> SolveOutcome {
        SolveOutcome::NumericalFail { reason: "mock always fails" }
    }
}

#[cfg(test)]
mod tests {
    use linalg::{Matrix, Vector};

    use super::*;

    fn problem_with_warm_start(values: &[f64]) -> QpProblem {
        let n = values.len();
        QpProblem {
            hessian: Matrix::from_diag(&Vector::ones(n)),
            gradient: Vector::zeros(n),
            equality_matrix: Matrix::zeros((0, n)),
            equality_rhs: Vector::zeros(0),
            inequality_matrix: Matrix::zeros((0, n)),
            inequality_rhs: Vector::zeros(0),
            warm_start: Vector::from_vec(values.to_vec()),
        }
    }

    #[test]
    fn echo_warm_start_returns_it_unchanged() {
        let problem = problem_with_warm_start(&[1.0, 2.0, 3.0]);
        match EchoWarmStart.solve(&problem, Duration::from_millis(10)) {
            SolveOutcome::Success { solution } => assert_eq!(solution.to_vec(), vec![1.0, 2.0, 3.0]),
            other => panic!("expected Success, got {other:?}"),
        }
    }

    #[test]
    fn always_infeasible_is_deterministic() {
        let problem = problem_with_warm_start(&[0.0]);
        assert_eq!(AlwaysInfeasible.solve(&problem, Duration::from_millis(1)), SolveOutcome::Infeasible);
        assert_eq!(AlwaysInfeasible.solve(&problem, Duration::from_millis(1)), SolveOutcome::Infeasible);
    }
}
