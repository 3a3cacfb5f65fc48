/////////////////////////////////////////////////////////////////////////////////////////////
//
// Builds signed-distance-style lattice fields from oriented point clouds.
//
// Created on: 21 Jun 2026     Author: Daniel Owen
//
// Copyright (c) 2026, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # sdf
//!
//! Helpers for the main use case of this crate: estimating an approximate
//! signed distance field from surface samples with outward normals. The
//! resulting distances may be scaled arbitrarily and are only accurate
//! near the zero level set, which is exactly what iso-surface extraction
//! needs.
//!
//! # References
//! 1.  F. Calakli and G. Taubin. SSD: Smooth Signed Distance Surface
//!     Reconstruction. Computer Graphics Forum, 30(7), 2011.
//! 2.  M. Kazhdan, M. Bolitho, and H. Hoppe. Poisson Surface
//!     Reconstruction. Eurographics Symposium on Geometry Processing, 2006.

use crate::config::SolveOptions;
use crate::constraints::{
    add_gradient_constraint, add_value_constraint, add_value_constraint_nearest_neighbor,
};
use crate::field_config::{GradientKernel, ValueKernel, Weights};
use crate::lattice::LatticeField;
use crate::lattice_solver::solve_sparse_linear_approximate_lattice;
use crate::smoothness::add_field_constraints;

/// Adds one value constraint (`f = 0`) and, when normals are present, one
/// gradient constraint per surface point.
///
/// `positions` holds interleaved lattice coordinates (`xyxyxy...` in 2D);
/// `normals`, when given, is interleaved the same way and is used both as
/// the gradient observation and as the offset gradient of the
/// nearest-neighbor value kernel. `point_weights`, when given, scales both
/// constraint weights per point. Out-of-range points are skipped silently.
pub fn add_points(
    field: &mut LatticeField,
    value_weight: f32,
    value_kernel: ValueKernel,
    gradient_weight: f32,
    gradient_kernel: GradientKernel,
    positions: &[f32],
    normals: Option<&[f32]>,
    point_weights: Option<&[f32]>,
) {
    let dim = field.num_dim();
    assert_eq!(
        positions.len() % dim,
        0,
        "Interleaved positions must be a multiple of the dimensionality"
    );
    let num_points = positions.len() / dim;
    if let Some(normals) = normals {
        assert_eq!(
            normals.len(),
            positions.len(),
            "Interleaved normals must match the positions"
        );
    }
    if let Some(point_weights) = point_weights {
        assert_eq!(
            point_weights.len(),
            num_points,
            "One weight per point expected"
        );
    }

    let zero_gradient = [0.0f32; crate::lattice::MAX_DIM];

    for i in 0..num_points {
        let pos = &positions[i * dim..(i + 1) * dim];
        let normal = normals.map(|n| &n[i * dim..(i + 1) * dim]);
        let point_weight = point_weights.map_or(1.0, |w| w[i]);

        match value_kernel {
            ValueKernel::Linear => {
                add_value_constraint(field, pos, 0.0, value_weight * point_weight);
            }
            ValueKernel::NearestNeighbor => {
                let gradient = normal.unwrap_or(&zero_gradient[..dim]);
                add_value_constraint_nearest_neighbor(
                    field,
                    pos,
                    gradient,
                    0.0,
                    value_weight * point_weight,
                );
            }
        }

        if let Some(gradient) = normal {
            add_gradient_constraint(
                field,
                pos,
                gradient,
                gradient_weight * point_weight,
                gradient_kernel,
            );
        }
    }
}

/// Assembles the full constraint system for a signed distance field from
/// surface samples.
///
/// `positions` lives in the unit hypercube `[0, 1]^D` and is scaled onto
/// the lattice by `sizes[d] - 1` per axis. The smoothness priors of
/// `weights` are added first, then every point contributes `f = 0` plus
/// its normal as a gradient observation (see [`add_points`]).
///
/// The caller picks the solver: [`solve_sparse_linear`] for an exact
/// answer, [`solve_sparse_linear_approximate_lattice`] for large lattices,
/// or [`solve_sdf_from_points`] for the whole pipeline in one call.
///
/// [`solve_sparse_linear`]: crate::solve_sparse_linear
/// [`solve_sparse_linear_approximate_lattice`]: crate::solve_sparse_linear_approximate_lattice
pub fn sdf_from_points(
    sizes: &[usize],
    weights: &Weights,
    positions: &[f32],
    normals: Option<&[f32]>,
    point_weights: Option<&[f32]>,
) -> LatticeField {
    let dim = sizes.len();
    let mut field = LatticeField::new(sizes);

    let lattice_positions: Vec<f32> = positions
        .iter()
        .enumerate()
        .map(|(i, &p)| p * (sizes[i % dim] - 1) as f32)
        .collect();

    add_field_constraints(&mut field, weights);
    add_points(
        &mut field,
        weights.data_pos,
        weights.value_kernel,
        weights.data_gradient,
        weights.gradient_kernel,
        &lattice_positions,
        normals,
        point_weights,
    );

    field
}

/// Assembles and approximately solves a signed distance field from surface
/// samples, re-assembling the constraints at coarse resolution for the
/// first solver stage.
///
/// Never fails: if no stage produces a usable estimate the zero field of
/// the right length is returned.
pub fn solve_sdf_from_points(
    sizes: &[usize],
    weights: &Weights,
    positions: &[f32],
    normals: Option<&[f32]>,
    point_weights: Option<&[f32]>,
    options: &SolveOptions,
) -> Vec<f32> {
    let field = sdf_from_points(sizes, weights, positions, normals, point_weights);
    let num_unknowns = field.num_unknowns();

    let solution = solve_sparse_linear_approximate_lattice(
        field.eq.triplets(),
        field.eq.rhs(),
        sizes,
        options,
        |coarse_sizes| sdf_from_points(coarse_sizes, weights, positions, normals, point_weights),
    );

    match solution.len() == num_unknowns {
        true => solution,
        false => vec![0.0; num_unknowns],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field_test_functions::FieldTestFunctions;
    use crate::sparse_solver::solve_sparse_linear;

    /// Bilinear sample of a 2D field at a real-valued lattice position.
    fn sample(field: &[f32], sizes: &[usize], x: f32, y: f32) -> f32 {
        let x0 = x.floor() as usize;
        let y0 = y.floor() as usize;
        let tx = x - x0 as f32;
        let ty = y - y0 as f32;
        let idx = |x: usize, y: usize| y * sizes[0] + x;
        field[idx(x0, y0)] * (1.0 - tx) * (1.0 - ty)
            + field[idx(x0 + 1, y0)] * tx * (1.0 - ty)
            + field[idx(x0, y0 + 1)] * (1.0 - tx) * ty
            + field[idx(x0 + 1, y0 + 1)] * tx * ty
    }

    fn circle_sdf_exact(resolution: usize) -> Vec<f32> {
        let (positions, normals) = FieldTestFunctions::circle_points(64, [0.5, 0.5], 0.35);
        let weights = Weights::default();
        let field = sdf_from_points(
            &[resolution, resolution],
            &weights,
            &positions,
            Some(&normals),
            None,
        );
        solve_sparse_linear(field.num_unknowns(), field.eq.triplets(), field.eq.rhs())
    }

    #[test]
    fn circle_sdf_is_negative_inside_and_positive_outside() {
        let resolution = 32usize;
        let sdf = circle_sdf_exact(resolution);
        assert_eq!(sdf.len(), resolution * resolution);

        let idx = |x: usize, y: usize| y * resolution + x;
        // Lattice center (15.5, 15.5) is deep inside the circle.
        assert!(sdf[idx(15, 15)] < 0.0);
        assert!(sdf[idx(16, 16)] < 0.0);
        // The corner is far outside.
        assert!(sdf[idx(0, 0)] > 0.0);
    }

    #[test]
    fn circle_sdf_crosses_zero_near_the_true_radius() {
        let resolution = 32usize;
        let sdf = circle_sdf_exact(resolution);
        let sizes = [resolution, resolution];

        // March from the center along +x and find the sign change.
        let center = 0.5 * (resolution - 1) as f32;
        let mut crossing = None;
        for step in 0..(resolution - 17) {
            let x0 = 15.5 + step as f32;
            let f0 = sample(&sdf, &sizes, x0, center);
            let f1 = sample(&sdf, &sizes, x0 + 1.0, center);
            if f0 <= 0.0 && f1 > 0.0 {
                crossing = Some(x0 + f0 / (f0 - f1));
                break;
            }
        }

        let crossing = crossing.expect("the field never changed sign along +x");
        let expected = center + 0.35 * (resolution - 1) as f32;
        assert!(
            (crossing - expected).abs() < 0.5,
            "zero crossing at {} but the circle radius maps to {}",
            crossing,
            expected
        );
    }

    #[test]
    fn approximate_pipeline_matches_the_sign_structure() {
        let (positions, normals) = FieldTestFunctions::circle_points(64, [0.5, 0.5], 0.35);
        let weights = Weights::default();
        let options = SolveOptions::default();
        let resolution = 24usize;
        let sdf = solve_sdf_from_points(
            &[resolution, resolution],
            &weights,
            &positions,
            Some(&normals),
            None,
            &options,
        );
        assert_eq!(sdf.len(), resolution * resolution);

        let idx = |x: usize, y: usize| y * resolution + x;
        assert!(sdf[idx(resolution / 2, resolution / 2)] < 0.0);
        assert!(sdf[idx(0, 0)] > 0.0);
    }

    #[test]
    fn point_weights_scale_the_emitted_equations() {
        let mut field = LatticeField::new(&[8, 8]);
        add_points(
            &mut field,
            1.0,
            ValueKernel::Linear,
            0.0,
            GradientKernel::CellEdges,
            &[2.0, 2.0],
            None,
            Some(&[3.0]),
        );
        assert_eq!(field.eq.num_equations(), 1);
        assert_eq!(field.eq.triplets()[0].value, 3.0);
    }

    #[test]
    fn out_of_range_points_are_skipped_in_bulk() {
        let mut field = LatticeField::new(&[8, 8]);
        // Second point is outside the unit square mapping.
        let positions = [3.0f32, 3.0, 9.5, 3.0];
        let normals = [1.0f32, 0.0, 1.0, 0.0];
        add_points(
            &mut field,
            1.0,
            ValueKernel::Linear,
            1.0,
            GradientKernel::NearestNeighbor,
            &positions,
            Some(&normals),
            None,
        );
        // One value constraint and one gradient constraint (two axes).
        assert_eq!(field.eq.num_equations(), 3);
    }
}
