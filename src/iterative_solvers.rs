/////////////////////////////////////////////////////////////////////////////////////////////
//
// Implements the conjugate-gradient polish used by the approximate lattice solver.
//
// Created on: 21 Jun 2026     Author: Daniel Owen
//
// Copyright (c) 2026, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # iterative_solvers
//!
//! Conjugate gradient for symmetric positive-definite systems, written
//! against a caller-supplied matrix-vector operator so the normal matrix
//! never has to be materialized.
//!
//! # References
//! 1.  J. R. Shewchuk. An Introduction to the Conjugate Gradient Method
//!     Without the Agonizing Pain. Carnegie Mellon University, 1994.

use crate::progress::{progress_from_rel, ProgressMsg, ProgressSink};
use faer::{Mat, MatRef};
use std::sync::Arc;

/// Conjugate gradient on `A x = b` for a symmetric positive-definite
/// operator `A`.
///
/// Iterates until the residual norm relative to `|b|` drops below
/// `tolerance` or `max_iterations` is reached. If the operator loses
/// positive-definiteness along the way (a zero or negative curvature
/// direction), iteration stops and the estimate reached so far is
/// returned.
///
/// # Parameters
/// - `a`: Operator function `A(x)`
/// - `b`: Right-hand side vector
/// - `x0`: Optional initial guess
/// - `tolerance`: Relative residual stopping criterion
/// - `max_iterations`: Hard iteration cap
/// - `callback`: Optional progress sink receiving one event per iteration
///
/// # Returns
/// - `x`: Approximate solution
pub fn conjugate_gradient<A>(
    a: &A,
    b: MatRef<f64>,
    x0: Option<&Mat<f64>>,
    tolerance: f64,
    max_iterations: usize,
    callback: Option<Arc<dyn ProgressSink>>,
) -> Mat<f64>
where
    A: Fn(&MatRef<f64>) -> Mat<f64>,
{
    let n = b.nrows();
    let mut x = x0.cloned().unwrap_or_else(|| Mat::zeros(n, 1));

    let beta = b.norm_l2();
    if beta == 0.0 {
        return Mat::zeros(n, 1);
    }

    let mut r = b - &a(&x.as_ref());
    let mut p = r.clone();
    let mut rs_old = dot(&r, &r);

    for iteration in 1..=max_iterations {
        let res_norm = rs_old.sqrt() / beta;

        if let Some(sink) = &callback {
            sink.emit(ProgressMsg::SolverIteration {
                iter: iteration,
                residual: res_norm,
                progress: progress_from_rel(res_norm, 1.0, tolerance),
            });
        }

        if res_norm < tolerance || !res_norm.is_finite() {
            break;
        }

        let ap = a(&p.as_ref());
        let curvature = dot(&p, &ap);
        if !(curvature > 0.0) || !curvature.is_finite() {
            break;
        }

        let alpha = rs_old / curvature;
        x += p.clone() * alpha;
        r -= &(ap * alpha);

        let rs_new = dot(&r, &r);
        p = r.clone() + p * (rs_new / rs_old);
        rs_old = rs_new;
    }

    x
}

fn dot(a: &Mat<f64>, b: &Mat<f64>) -> f64 {
    a.col(0)
        .iter()
        .zip(b.col(0).iter())
        .map(|(x, y)| x * y)
        .sum::<f64>()
}
