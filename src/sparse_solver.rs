/////////////////////////////////////////////////////////////////////////////////////////////
//
// Solves the assembled least-squares system exactly via sparse Cholesky on the normal equations.
//
// Created on: 21 Jun 2026     Author: Daniel Owen
//
// Copyright (c) 2026, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # sparse_solver
//!
//! Direct solution of the overdetermined system `A x = b` in the
//! least-squares sense: form the normal equations `(A^T A) x = A^T b` and
//! factor them with faer's sparse Cholesky (which applies its own
//! fill-reducing reordering). A tiny ridge keeps the normal matrix
//! positive-definite when no order-0 prior is present.
//!
//! # References
//! 1.  A. Björck. Numerical Methods for Least Squares Problems. SIAM, 1996.

use faer::prelude::*;
use faer::sparse::{SparseColMat, Triplet as SparseTriplet};
use faer::{Mat, Side};

use crate::equation::Triplet;

/// Diagonal ridge added to `A^T A` so factorization succeeds even for
/// systems that only pin the field up to a constant.
const RIDGE: f64 = 1e-9;

#[derive(Debug)]
pub(crate) enum SolveError {
    /// The triplets could not be assembled into a sparse matrix
    /// (e.g. a column index out of range).
    Assembly,
    /// The normal matrix was not numerically positive-definite.
    NotSpd,
    /// The factorization produced NaN or infinite solution entries.
    NonFinite,
}

/// Solves `A x = b` in the least-squares sense for `num_unknowns` unknowns.
///
/// Returns the solution vector of length `num_unknowns`, or the **empty
/// vector** when the system is singular, ill-conditioned beyond repair, or
/// produces non-finite values. Data-driven failures never panic.
pub fn solve_sparse_linear(num_unknowns: usize, triplets: &[Triplet], rhs: &[f32]) -> Vec<f32> {
    match solve_normal_equations(num_unknowns, triplets, rhs) {
        Ok(solution) => solution,
        Err(_) => Vec::new(),
    }
}

/// Forms and solves the normal equations `(A^T A + ridge I) x = A^T b`.
///
/// `A^T A` is accumulated directly from the per-row coefficient products
/// (each equation touches at most `2^D` unknowns, so the pair expansion is
/// cheap); duplicate triplets are summed on assembly.
pub(crate) fn solve_normal_equations(
    num_unknowns: usize,
    triplets: &[Triplet],
    rhs: &[f32],
) -> Result<Vec<f32>, SolveError> {
    if num_unknowns == 0 {
        return Ok(Vec::new());
    }

    let mut normal = Vec::with_capacity(triplets.len() * 4 + num_unknowns);
    let mut projected_rhs = vec![0.0f64; num_unknowns];

    let mut start = 0usize;
    while start < triplets.len() {
        let row = triplets[start].row;
        let mut end = start;
        while end < triplets.len() && triplets[end].row == row {
            end += 1;
        }

        let b = rhs[row] as f64;
        for i in start..end {
            let (col_i, value_i) = (triplets[i].col, triplets[i].value as f64);
            if col_i >= num_unknowns {
                return Err(SolveError::Assembly);
            }
            projected_rhs[col_i] += value_i * b;
            for j in start..end {
                normal.push(SparseTriplet::new(
                    col_i,
                    triplets[j].col,
                    value_i * triplets[j].value as f64,
                ));
            }
        }
        start = end;
    }

    for i in 0..num_unknowns {
        normal.push(SparseTriplet::new(i, i, RIDGE));
    }

    let matrix = SparseColMat::<usize, f64>::try_new_from_triplets(num_unknowns, num_unknowns, &normal)
        .map_err(|_| SolveError::Assembly)?;
    let y = Mat::<f64>::from_fn(num_unknowns, 1, |i, _| projected_rhs[i]);

    // faer's sparse factorization can panic on degenerate inputs rather
    // than returning an error, and data-driven failures must not cross the
    // library boundary as panics.
    let x = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        let llt = matrix.sp_cholesky(Side::Lower).map_err(|_| SolveError::NotSpd)?;
        Ok(llt.solve(y))
    }))
    .map_err(|_| SolveError::NotSpd)??;

    let mut solution = Vec::with_capacity(num_unknowns);
    for i in 0..num_unknowns {
        let xi = x[(i, 0)];
        if !xi.is_finite() {
            return Err(SolveError::NonFinite);
        }
        solution.push(xi as f32);
    }
    Ok(solution)
}

/// Euclidean norm of the residual `A x - b`.
pub(crate) fn residual_norm(triplets: &[Triplet], rhs: &[f32], solution: &[f32]) -> f64 {
    let mut row_values = vec![0.0f64; rhs.len()];
    for t in triplets {
        row_values[t.row] += t.value as f64 * solution[t.col] as f64;
    }
    row_values
        .iter()
        .zip(rhs)
        .map(|(&ax, &b)| {
            let r = ax - b as f64;
            r * r
        })
        .sum::<f64>()
        .sqrt()
}
