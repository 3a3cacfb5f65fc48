/////////////////////////////////////////////////////////////////////////////////////////////
//
// Projects per-equation residuals back onto the lattice as a blame heat-map.
//
// Created on: 21 Jun 2026     Author: Daniel Owen
//
// Copyright (c) 2026, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # error_map

use crate::equation::Triplet;

/// Calculates `(A x - b)^2` per equation and distributes it onto the
/// solution space for a heat-map of blame.
///
/// Each equation's squared residual is split uniformly across the unknowns
/// its row touches, so the sum of the returned map equals the total squared
/// residual of the system.
pub fn generate_error_map(triplets: &[Triplet], solution: &[f32], rhs: &[f32]) -> Vec<f32> {
    let mut row_values = vec![0.0f64; rhs.len()];
    let mut row_nnz = vec![0usize; rhs.len()];
    for t in triplets {
        row_values[t.row] += t.value as f64 * solution[t.col] as f64;
        row_nnz[t.row] += 1;
    }

    let mut map = vec![0.0f32; solution.len()];
    for t in triplets {
        let residual = row_values[t.row] - rhs[t.row] as f64;
        map[t.col] += (residual * residual / row_nnz[t.row] as f64) as f32;
    }
    map
}
