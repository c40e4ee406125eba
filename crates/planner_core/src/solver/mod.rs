//! The solver adapter seam: a narrow interface to an external QP
//! collaborator, per `spec.md` §4.6 and §9 ("Solver coupling").

pub mod clarabel_adapter;
pub mod mock;

use std::time::Duration;

use linalg::{Matrix, Vector};

/// A structured QP in the shape every [`QpSolver`] implementation consumes:
/// minimize `0.5 x^T H x + q^T x` subject to `A_eq x = b_eq` and
/// `A_ineq x >= b_ineq`.
#[derive(Debug, Clone)]
pub struct QpProblem {
    pub hessian: Matrix<f64>,
    pub gradient: Vector<f64>,
    pub equality_matrix: Matrix<f64>,
    pub equality_rhs: Vector<f64>,
    pub inequality_matrix: Matrix<f64>,
    pub inequality_rhs: Vector<f64>,
    pub warm_start: Vector<f64>,
}

impl QpProblem {
    #[must_use]
    pub fn num_variables(&self) -> usize {
        self.warm_start.len()
    }
}

/// A clock the solver adapter can ask for the current deadline budget, so
/// the planning core stays deterministic under test (`spec.md` §5,
/// "Cancellation").
pub trait Clock {
    fn now(&self) -> Duration;
}

/// How a solve attempt concluded.
#[derive(Debug, Clone, PartialEq)]
pub enum SolveOutcome {
    Success { solution: Vector<f64> },
    Infeasible,
    NumericalFail { reason: &'static str },
}

/// The external QP collaborator seam. A production implementation
/// ([`clarabel_adapter::ClarabelSolver`]) and deterministic mocks
/// ([`mock`]) both implement this.
pub trait QpSolver {
    fn solve(&self, problem: &QpProblem, deadline: Duration) -> SolveOutcome;
}

/// Apply regularization (`epsilon * I` added to the Hessian diagonal) and
/// retry once, the recovery rule for a numerical failure (`spec.md` §4.6
/// and §7).
pub fn regularize(problem: &QpProblem, epsilon: f64) -> QpProblem {
    let mut hessian = problem.hessian.clone();
    for i in 0..hessian.nrows().min(hessian.ncols()) {
        hessian[[i, i]] += epsilon;
    }
    QpProblem {
        hessian,
        gradient: problem.gradient.clone(),
        equality_matrix: problem.equality_matrix.clone(),
        equality_rhs: problem.equality_rhs.clone(),
        inequality_matrix: problem.inequality_matrix.clone(),
        inequality_rhs: problem.inequality_rhs.clone(),
        warm_start: problem.warm_start.clone(),
    }
}

/// Run `solver.solve`, retrying once with regularization on numerical
/// failure, per `spec.md` §4.6.
pub fn solve_with_retry(solver: &dyn QpSolver, problem: &QpProblem, deadline: Duration, regularization_epsilon: f64) -> SolveOutcome {
    match solver.solve(problem, deadline) {
        SolveOutcome::NumericalFail { .. } => {
            let regularized = regularize(problem, regularization_epsilon);
            solver.solve(&regularized, deadline)
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::{mock::AlwaysNumericalFail, *};

    fn trivial_problem(n: usize) -> QpProblem {
        QpProblem {
            hessian: Matrix::from_diag(&Vector::ones(n)),
            gradient: Vector::zeros(n),
            equality_matrix: Matrix::zeros((0, n)),
            equality_rhs: Vector::zeros(0),
            inequality_matrix: Matrix::zeros((0, n)),
            inequality_rhs: Vector::zeros(0),
            warm_start: Vector::zeros(n),
        }
    }

    #[test]
    fn retry_gives_up_after_one_regularized_attempt() {
        let problem = trivial_problem(3);
        let outcome = solve_with_retry(&AlwaysNumericalFail, &problem, Duration::from_millis(10), 1e-6);
        assert!(matches!(outcome, SolveOutcome::NumericalFail { .. }));
    }

    #[test]
    fn regularize_only_touches_the_diagonal() {
        let problem = trivial_problem(2);
        let regularized = regularize(&problem, 0.5);
        assert_eq!(regularized.hessian[[0, 0]], 1.5);
        assert_eq!(regularized.hessian[[0, 1]], 0.0);
    }
}
