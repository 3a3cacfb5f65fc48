/////////////////////////////////////////////////////////////////////////////////////////////
//
// Implements the multi-resolution approximate solver: coarse solve, tiled refinement, CG polish.
//
// Created on: 21 Jun 2026     Author: Daniel Owen
//
// Copyright (c) 2026, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # lattice_solver
//!
//! Approximate least-squares solver specialized to the block-structured
//! systems assembled over a lattice. Three stages:
//!
//! 1. **Coarse**: re-assemble the constraints on a down-scaled lattice,
//!    solve exactly, and up-sample the result to full resolution.
//! 2. **Tiled refinement** (optional): partition the lattice into
//!    axis-aligned tiles and re-solve each tile exactly, holding the
//!    out-of-tile unknowns at their up-sampled values. Tiles own disjoint
//!    unknowns, so they solve in parallel.
//! 3. **Conjugate-gradient polish** (optional): iterate on the normal
//!    equations from the best estimate so far.
//!
//! The returned estimate always has one entry per unknown, is never empty,
//! and its residual is never worse than the up-sampled coarse guess.
//!
//! # References
//! 1.  W. L. Briggs, V. E. Henson, and S. F. McCormick. A Multigrid
//!     Tutorial, 2nd ed. SIAM, 2000.

use rayon::prelude::*;
use std::sync::Arc;

use faer::{Mat, MatRef};

use crate::config::SolveOptions;
use crate::equation::{LinearEquation, Triplet};
use crate::iterative_solvers::conjugate_gradient;
use crate::lattice::{LatticeField, MAX_DIM};
use crate::progress::{ProgressMsg, ProgressSink};
use crate::resample::upscale_field;
use crate::sparse_solver::{residual_norm, solve_sparse_linear};

/// Hard cap on polish iterations; the tolerance usually stops CG far
/// earlier.
const MAX_CG_ITERATIONS: usize = 500;

/// One axis-aligned refinement tile. Only the first `dim` entries of each
/// array are meaningful.
#[derive(Debug, Clone, Copy, Default)]
struct Tile {
    start: [usize; MAX_DIM],
    len: [usize; MAX_DIM],
}

/// One equation's contiguous run in the triplet list.
#[derive(Debug, Clone, Copy)]
struct RowSpan {
    row: usize,
    start: usize,
    end: usize,
}

/// Approximately solves the lattice system `A x = b` in the least-squares
/// sense.
///
/// `assemble` re-runs the constraint pipeline at an arbitrary lattice
/// resolution; the coarse stage calls it with the down-scaled sizes. For
/// point-cloud fits, [`sdf_from_points`] at rescaled sizes is exactly such
/// a closure (see [`solve_sdf_from_points`]).
///
/// Unlike [`solve_sparse_linear`] this never returns the empty vector: on
/// solver failure it falls back to the best intermediate estimate, down to
/// the zero field.
///
/// [`sdf_from_points`]: crate::sdf_from_points
/// [`solve_sdf_from_points`]: crate::solve_sdf_from_points
pub fn solve_sparse_linear_approximate_lattice<F>(
    triplets: &[Triplet],
    rhs: &[f32],
    sizes: &[usize],
    options: &SolveOptions,
    assemble: F,
) -> Vec<f32>
where
    F: Fn(&[usize]) -> LatticeField,
{
    solve_sparse_linear_approximate_lattice_with_progress(
        triplets, rhs, sizes, options, assemble, None,
    )
}

/// [`solve_sparse_linear_approximate_lattice`] with a progress sink that
/// receives coarse-stage, per-tile and per-CG-iteration events.
pub fn solve_sparse_linear_approximate_lattice_with_progress<F>(
    triplets: &[Triplet],
    rhs: &[f32],
    sizes: &[usize],
    options: &SolveOptions,
    assemble: F,
    callback: Option<Arc<dyn ProgressSink>>,
) -> Vec<f32>
where
    F: Fn(&[usize]) -> LatticeField,
{
    let dim = sizes.len();
    assert!(
        dim >= 1 && dim <= MAX_DIM,
        "Lattice dimensionality must be in 1..={}, got {}",
        MAX_DIM,
        dim
    );
    let num_unknowns: usize = sizes.iter().product();

    // Stage A: solve the same logical constraints on a coarse lattice and
    // up-sample the result as the initial guess.
    let coarse_sizes: Vec<usize> = sizes
        .iter()
        .map(|&s| s.div_ceil(options.downscale_factor).max(2))
        .collect();
    let coarse_field = assemble(&coarse_sizes);
    assert_eq!(
        coarse_field.sizes(),
        &coarse_sizes[..],
        "Re-assembly must honor the requested coarse sizes"
    );
    let coarse_solution = solve_sparse_linear(
        coarse_field.num_unknowns(),
        coarse_field.eq.triplets(),
        coarse_field.eq.rhs(),
    );
    let x_guess = match coarse_solution.len() == coarse_field.num_unknowns() {
        true => upscale_field(&coarse_solution, &coarse_sizes, sizes),
        false => vec![0.0; num_unknowns],
    };
    if let Some(sink) = &callback {
        sink.emit(ProgressMsg::CoarseSolveFinished {
            sizes: coarse_sizes.clone(),
        });
    }

    let mut candidates: Vec<Vec<f32>> = Vec::with_capacity(2);

    // Stage B: independent exact solves per tile, boundary values taken
    // from the coarse guess.
    let estimate = match options.tile {
        true => {
            let refined = refine_tiles(triplets, rhs, sizes, options.tile_size, &x_guess, &callback);
            candidates.push(refined.clone());
            refined
        }
        false => x_guess.clone(),
    };

    // Stage C: conjugate-gradient polish on the normal equations.
    if options.cg && !rhs.is_empty() {
        if let Some(polished) = cg_polish(
            triplets,
            rhs,
            num_unknowns,
            &estimate,
            options.error_tolerance as f64,
            callback,
        ) {
            candidates.push(polished);
        }
    }

    // Later stages are preferred, but are never allowed to hand back
    // something worse than the coarse guess.
    let mut best = x_guess;
    let mut best_residual = residual_norm(triplets, rhs, &best);
    for candidate in candidates {
        let candidate_residual = residual_norm(triplets, rhs, &candidate);
        if candidate_residual.is_finite() && candidate_residual <= best_residual {
            best = candidate;
            best_residual = candidate_residual;
        }
    }
    best
}

/// Partitions one axis into `(start, length)` runs of `tile_size`. A
/// trailing remainder of a single lattice point is merged into the
/// preceding tile so every tile keeps an edge of at least 2 (for axes that
/// have at least 2 points at all).
fn tile_ranges(size: usize, tile_size: usize) -> Vec<(usize, usize)> {
    let mut ranges = Vec::new();
    let mut start = 0usize;
    while start < size {
        let mut len = tile_size.min(size - start);
        if size - start - len == 1 {
            len += 1;
        }
        ranges.push((start, len));
        start += len;
    }
    ranges
}

fn refine_tiles(
    triplets: &[Triplet],
    rhs: &[f32],
    sizes: &[usize],
    tile_size: usize,
    x_guess: &[f32],
    callback: &Option<Arc<dyn ProgressSink>>,
) -> Vec<f32> {
    let dim = sizes.len();
    let axis_ranges: Vec<Vec<(usize, usize)>> =
        sizes.iter().map(|&s| tile_ranges(s, tile_size)).collect();
    let tile_counts: Vec<usize> = axis_ranges.iter().map(|ranges| ranges.len()).collect();
    let num_tiles: usize = tile_counts.iter().product();

    let tiles: Vec<Tile> = (0..num_tiles)
        .map(|mut flat| {
            let mut tile = Tile::default();
            for d in 0..dim {
                let range = axis_ranges[d][flat % tile_counts[d]];
                flat /= tile_counts[d];
                tile.start[d] = range.0;
                tile.len[d] = range.1;
            }
            tile
        })
        .collect();

    // Every range except the last starts at a multiple of tile_size, so a
    // coordinate maps straight to its range index.
    let tile_of_column = |col: usize| -> usize {
        let mut remaining = col;
        let mut tile_index = 0usize;
        let mut tile_stride = 1usize;
        for d in 0..dim {
            let coord = remaining % sizes[d];
            remaining /= sizes[d];
            tile_index += (coord / tile_size).min(tile_counts[d] - 1) * tile_stride;
            tile_stride *= tile_counts[d];
        }
        tile_index
    };

    let spans = row_spans(triplets);
    let mut tile_rows: Vec<Vec<usize>> = vec![Vec::new(); num_tiles];
    let mut touched: Vec<usize> = Vec::with_capacity(1 << dim);
    for (span_index, span) in spans.iter().enumerate() {
        touched.clear();
        for t in &triplets[span.start..span.end] {
            let tile = tile_of_column(t.col);
            if !touched.contains(&tile) {
                touched.push(tile);
            }
        }
        for &tile in &touched {
            tile_rows[tile].push(span_index);
        }
    }

    // Tiles own disjoint unknowns, so they solve independently.
    let solutions: Vec<Option<Vec<f32>>> = tiles
        .par_iter()
        .zip(tile_rows.par_iter())
        .map(|(tile, rows)| solve_tile(tile, rows, &spans, triplets, rhs, sizes, x_guess, dim))
        .collect();

    let mut refined = x_guess.to_vec();
    for (completed, (tile, solution)) in tiles.iter().zip(solutions).enumerate() {
        if let Some(solution) = solution {
            scatter_tile(&mut refined, tile, &solution, sizes, dim);
        }
        if let Some(sink) = callback {
            sink.emit(ProgressMsg::TileSolved {
                completed: completed + 1,
                total: num_tiles,
            });
        }
    }
    refined
}

/// Solves the reduced system of one tile. Equations that cross the tile
/// boundary keep only their in-tile coefficients; the out-of-tile
/// contribution moves to the right-hand side using the guessed values.
fn solve_tile(
    tile: &Tile,
    rows: &[usize],
    spans: &[RowSpan],
    triplets: &[Triplet],
    rhs: &[f32],
    sizes: &[usize],
    x_guess: &[f32],
    dim: usize,
) -> Option<Vec<f32>> {
    if rows.is_empty() {
        return None;
    }

    let mut local_strides = [0usize; MAX_DIM];
    let mut stride = 1usize;
    for d in 0..dim {
        local_strides[d] = stride;
        stride *= tile.len[d];
    }
    let num_local = stride;

    let mut eq = LinearEquation::new();
    eq.reserve(rows.len(), rows.len() * 4);
    let mut coeffs: Vec<(usize, f32)> = Vec::new();

    for &span_index in rows {
        let span = &spans[span_index];
        coeffs.clear();
        let mut b = rhs[span.row] as f64;
        for t in &triplets[span.start..span.end] {
            match local_index(t.col, tile, sizes, &local_strides, dim) {
                Some(local) => coeffs.push((local, t.value)),
                None => b -= t.value as f64 * x_guess[t.col] as f64,
            }
        }
        eq.add_equation(1.0, b as f32, &coeffs);
    }

    let solution = solve_sparse_linear(num_local, eq.triplets(), eq.rhs());
    match solution.len() == num_local {
        true => Some(solution),
        false => None,
    }
}

/// Maps a global unknown index into a tile-local index, or `None` when the
/// unknown lies outside the tile.
fn local_index(
    col: usize,
    tile: &Tile,
    sizes: &[usize],
    local_strides: &[usize; MAX_DIM],
    dim: usize,
) -> Option<usize> {
    let mut remaining = col;
    let mut local = 0usize;
    for d in 0..dim {
        let coord = remaining % sizes[d];
        remaining /= sizes[d];
        if coord < tile.start[d] || coord >= tile.start[d] + tile.len[d] {
            return None;
        }
        local += (coord - tile.start[d]) * local_strides[d];
    }
    Some(local)
}

/// Writes a tile's local solution back into the global estimate.
fn scatter_tile(global: &mut [f32], tile: &Tile, local: &[f32], sizes: &[usize], dim: usize) {
    let mut global_strides = [0usize; MAX_DIM];
    let mut stride = 1usize;
    for d in 0..dim {
        global_strides[d] = stride;
        stride *= sizes[d];
    }

    for (local_index, &value) in local.iter().enumerate() {
        let mut remaining = local_index;
        let mut global_index = 0usize;
        for d in 0..dim {
            let coord = remaining % tile.len[d];
            remaining /= tile.len[d];
            global_index += (tile.start[d] + coord) * global_strides[d];
        }
        global[global_index] = value;
    }
}

fn row_spans(triplets: &[Triplet]) -> Vec<RowSpan> {
    let mut spans = Vec::new();
    let mut start = 0usize;
    while start < triplets.len() {
        let row = triplets[start].row;
        let mut end = start;
        while end < triplets.len() && triplets[end].row == row {
            end += 1;
        }
        spans.push(RowSpan { row, start, end });
        start = end;
    }
    spans
}

/// Conjugate-gradient polish of `estimate` on the normal equations
/// `(A^T A) x = A^T b`. Returns `None` when the polish produced non-finite
/// values or there is nothing to polish.
fn cg_polish(
    triplets: &[Triplet],
    rhs: &[f32],
    num_unknowns: usize,
    estimate: &[f32],
    tolerance: f64,
    callback: Option<Arc<dyn ProgressSink>>,
) -> Option<Vec<f32>> {
    let mut projected = vec![0.0f64; num_unknowns];
    for t in triplets {
        projected[t.col] += t.value as f64 * rhs[t.row] as f64;
    }
    let b = Mat::<f64>::from_fn(num_unknowns, 1, |i, _| projected[i]);
    if b.norm_l2() == 0.0 {
        return None;
    }

    let num_rows = rhs.len();
    let normal_matvec = |v: &MatRef<f64>| -> Mat<f64> {
        let mut forward = vec![0.0f64; num_rows];
        for t in triplets {
            forward[t.row] += t.value as f64 * v[(t.col, 0)];
        }
        let mut out = Mat::<f64>::zeros(num_unknowns, 1);
        for t in triplets {
            out[(t.col, 0)] += t.value as f64 * forward[t.row];
        }
        out
    };

    let x0 = Mat::<f64>::from_fn(num_unknowns, 1, |i, _| estimate[i] as f64);
    let polished = conjugate_gradient(
        &normal_matvec,
        b.as_ref(),
        Some(&x0),
        tolerance,
        MAX_CG_ITERATIONS,
        callback,
    );

    let mut out = Vec::with_capacity(num_unknowns);
    for i in 0..num_unknowns {
        let xi = polished[(i, 0)];
        if !xi.is_finite() {
            return None;
        }
        out.push(xi as f32);
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SolveOptions;
    use crate::constraints::add_value_constraint;
    use crate::field_config::Weights;
    use crate::smoothness::add_field_constraints;

    fn ramp_assembly(sizes: &[usize]) -> LatticeField {
        let weights = Weights::builder().model_2(1.0).build();
        let mut field = LatticeField::new(sizes);
        add_field_constraints(&mut field, &weights);
        let last = (sizes[0] - 1) as f32;
        add_value_constraint(&mut field, &[0.0], 4.0, weights.data_pos);
        add_value_constraint(&mut field, &[last], 2.0, weights.data_pos);
        field
    }

    fn bumpy_assembly(sizes: &[usize]) -> LatticeField {
        let weights = Weights::default();
        let mut field = LatticeField::new(sizes);
        add_field_constraints(&mut field, &weights);
        let pins = [
            ([0.1f32, 0.2], 1.0f32),
            ([0.8, 0.3], -2.0),
            ([0.5, 0.9], 3.0),
            ([0.2, 0.7], 0.5),
        ];
        for (unit_pos, value) in pins {
            let pos = [
                unit_pos[0] * (sizes[0] - 1) as f32,
                unit_pos[1] * (sizes[1] - 1) as f32,
            ];
            add_value_constraint(&mut field, &pos, value, weights.data_pos);
        }
        field
    }

    #[test]
    fn tile_ranges_merge_the_trailing_single_point() {
        assert_eq!(tile_ranges(5, 2), vec![(0, 2), (2, 3)]);
        assert_eq!(tile_ranges(4, 2), vec![(0, 2), (2, 2)]);
        assert_eq!(tile_ranges(7, 3), vec![(0, 3), (3, 4)]);
        assert_eq!(tile_ranges(3, 2), vec![(0, 3)]);
        assert_eq!(tile_ranges(2, 5), vec![(0, 2)]);
    }

    #[test]
    fn all_stages_recover_the_ramp() {
        let fine = ramp_assembly(&[12]);
        let options = SolveOptions::builder()
            .downscale_factor(3)
            .tile(true)
            .tile_size(4)
            .cg(true)
            .error_tolerance(1e-6)
            .build();
        let solution = solve_sparse_linear_approximate_lattice(
            fine.eq.triplets(),
            fine.eq.rhs(),
            &[12],
            &options,
            ramp_assembly,
        );
        assert_eq!(solution.len(), 12);
        for (i, &value) in solution.iter().enumerate() {
            let expected = 4.0 - 2.0 * i as f32 / 11.0;
            assert!(
                (value - expected).abs() < 1e-2,
                "entry {} is {} but the ramp says {}",
                i,
                value,
                expected
            );
        }
    }

    #[test]
    fn refinement_never_worsens_the_coarse_guess() {
        let fine = bumpy_assembly(&[9, 9]);
        let guess_only = SolveOptions::builder().tile(false).cg(false).build();
        let full = SolveOptions::builder()
            .tile(true)
            .tile_size(4)
            .cg(true)
            .error_tolerance(1e-5)
            .build();

        let baseline = solve_sparse_linear_approximate_lattice(
            fine.eq.triplets(),
            fine.eq.rhs(),
            &[9, 9],
            &guess_only,
            bumpy_assembly,
        );
        let refined = solve_sparse_linear_approximate_lattice(
            fine.eq.triplets(),
            fine.eq.rhs(),
            &[9, 9],
            &full,
            bumpy_assembly,
        );

        let baseline_residual = residual_norm(fine.eq.triplets(), fine.eq.rhs(), &baseline);
        let refined_residual = residual_norm(fine.eq.triplets(), fine.eq.rhs(), &refined);
        assert!(refined_residual <= baseline_residual + 1e-9);
    }

    #[test]
    fn one_tile_covering_the_lattice_reproduces_the_exact_solve() {
        let fine = ramp_assembly(&[6]);
        let options = SolveOptions::builder()
            .tile(true)
            .tile_size(128)
            .cg(false)
            .build();
        let approximate = solve_sparse_linear_approximate_lattice(
            fine.eq.triplets(),
            fine.eq.rhs(),
            &[6],
            &options,
            ramp_assembly,
        );
        let exact =
            solve_sparse_linear(fine.num_unknowns(), fine.eq.triplets(), fine.eq.rhs());
        for (a, e) in approximate.iter().zip(&exact) {
            assert!((a - e).abs() < 1e-4);
        }
    }

    #[test]
    fn an_empty_system_still_yields_a_full_length_field() {
        let options = SolveOptions::default();
        let solution = solve_sparse_linear_approximate_lattice(
            &[],
            &[],
            &[4, 4],
            &options,
            |sizes| LatticeField::new(sizes),
        );
        assert_eq!(solution, vec![0.0; 16]);
    }
}
