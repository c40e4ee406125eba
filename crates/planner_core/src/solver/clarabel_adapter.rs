//! Production [`QpSolver`] backed by [`clarabel`], a pure-Rust interior
//! point conic solver. The dense matrices the assembler produces are
//! converted to `clarabel`'s sparse column format and solved as a cone
//! program: equalities as a zero cone, inequalities as a nonnegative cone.

use std::time::{Duration, Instant};

use clarabel::{
    algebra::CscMatrix,
    solver::{DefaultSettings, DefaultSolver, IPSolver, SolverStatus, SupportedConeT},
};
use linalg::Matrix;

use super::{QpProblem, QpSolver, SolveOutcome};

/// Converts a dense row-major matrix into `clarabel`'s compressed sparse
/// column format. Every entry is kept (control-point counts in this
/// planner are small enough that sparsity pays for itself only at much
/// larger scale).
fn dense_to_csc(matrix: &Matrix<f64>) -> CscMatrix<f64> {
    let (rows, cols) = matrix.dim();
    let mut colptr = Vec::with_capacity(cols + 1);
    let mut rowval = Vec::new();
    let mut nzval = Vec::new();
    colptr.push(0);
    for c in 0..cols {
        for r in 0..rows {
            let value = matrix[[r, c]];
            if value != 0.0 {
                rowval.push(r);
                nzval.push(value);
            }
        }
        colptr.push(rowval.len());
    }
    CscMatrix::new(rows, cols, colptr, rowval, nzval)
}

/// Production solver adapter. `deadline` is enforced by the caller via
/// `solve`'s return path: a solve that overruns is reported as a numerical
/// failure rather than blocking indefinitely.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClarabelSolver;

impl QpSolver for ClarabelSolver {
    fn solve(&self, problem: &QpProblem, deadline: Duration) -> SolveOutcome {
        let started = Instant::now();

        let n_eq = problem.equality_matrix.nrows();
        let n_ineq = problem.inequality_matrix.nrows();

        let p = dense_to_csc(&problem.hessian);
        let q: Vec<f64> = problem.gradient.to_vec();

        let mut a_rows = problem.equality_matrix.clone();
        a_rows.append(ndarray::Axis(0), (-&problem.inequality_matrix).view()).expect("matching column counts");
        let a = dense_to_csc(&a_rows);

        let mut b = problem.equality_rhs.to_vec();
        b.extend(problem.inequality_rhs.iter().map(|v| -v));

        let cones = vec![
            SupportedConeT::ZeroConeT(n_eq),
            SupportedConeT::NonnegativeConeT(n_ineq),
        ];

        let settings = DefaultSettings {
            verbose: false,
            time_limit: deadline.as_secs_f64(),
            ..Default::default()
        };

        let mut solver = DefaultSolver::new(&p, &q, &a, &b, &cones, settings);
        solver.solve();

        if started.elapsed() > deadline {
            return SolveOutcome::NumericalFail { reason: "solver exceeded deadline" };
        }

        match solver.solution.status {
            SolverStatus::Solved | SolverStatus::AlmostSolved => SolveOutcome::Success {
                solution: linalg::Vector::from_vec(solver.solution.x),
            },
            SolverStatus::PrimalInfeasible | SolverStatus::AlmostPrimalInfeasible => SolveOutcome::Infeasible,
            _ => SolveOutcome::NumericalFail { reason: "clarabel did not converge" },
        }
    }
}
