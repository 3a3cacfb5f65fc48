/////////////////////////////////////////////////////////////////////////////////////////////
//
// Generates the finite-difference smoothness priors emitted over the whole lattice.
//
// Created on: 21 Jun 2026     Author: Daniel Owen
//
// Copyright (c) 2026, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # smoothness
//!
//! Model constraints: equations describing the prior belief that the field
//! is smooth. Order-`k` priors penalize the `k`-th finite difference along
//! each axis; the optional gradient-smoothness prior penalizes differences
//! between parallel edges of each cell.
//!
//! # References
//! 1.  F. Calakli and G. Taubin. SSD: Smooth Signed Distance Surface
//!     Reconstruction. Computer Graphics Forum, 30(7), 2011.

use itertools::Itertools;

use crate::field_config::Weights;
use crate::lattice::LatticeField;

/// Finite-difference stencils for the order-0 to order-4 priors. An
/// order-`k` row drives the `k`-th difference toward zero, preferring a
/// polynomial of degree `k - 1`.
const MODEL_STENCILS: [&[f32]; 5] = [
    &[1.0],
    &[1.0, -1.0],
    &[1.0, -2.0, 1.0],
    &[1.0, -3.0, 3.0, -1.0],
    &[1.0, -4.0, 6.0, -4.0, 1.0],
];

/// Adds the model equations for a smooth field on the lattice.
///
/// For every lattice point and every `model_k > 0`, one stencil row is
/// emitted per axis wherever the `k`-wide stencil fits (the order-0 prior
/// is a single row per point with no axis loop). All rows have a zero
/// right-hand side and weight `model_k`. When
/// `weights.gradient_smoothness > 0` the opposing-edge prior of
/// [`Weights::gradient_smoothness`] is emitted for every cell as well.
pub fn add_field_constraints(field: &mut LatticeField, weights: &Weights) {
    let (equations, coefficients) = predicted_equation_counts(field, weights);
    field.eq.reserve(equations, coefficients);

    let num_unknowns = field.num_unknowns();
    let dim = field.num_dim();

    if weights.model_0 > 0.0 {
        for i in 0..num_unknowns {
            field.eq.add_equation(weights.model_0, 0.0, &[(i, 1.0)]);
        }
    }

    let model = [
        weights.model_0,
        weights.model_1,
        weights.model_2,
        weights.model_3,
        weights.model_4,
    ];
    let mut coeffs: Vec<(usize, f32)> = Vec::with_capacity(MODEL_STENCILS.len());

    for (order, &weight) in model.iter().enumerate().skip(1) {
        if weight <= 0.0 {
            continue;
        }
        let stencil = MODEL_STENCILS[order];
        for base in 0..num_unknowns {
            let coords = field.coords_of(base);
            for d in 0..dim {
                if coords[d] + order > field.sizes()[d] - 1 {
                    continue;
                }
                let stride = field.strides()[d];
                coeffs.clear();
                for (step, &coefficient) in stencil.iter().enumerate() {
                    coeffs.push((base + step * stride, coefficient));
                }
                field.eq.add_equation(weight, 0.0, &coeffs);
            }
        }
    }

    if weights.gradient_smoothness > 0.0 {
        add_gradient_smoothness(field, weights.gradient_smoothness);
    }
}

/// Emits `(f(b1) - f(a1)) - (f(b2) - f(a2)) = 0` for every unordered pair
/// of parallel edges of every cell, per axis. In 2D this is the classic
/// pair of constraints `B - A == D - C` and `C - A == D - B` per cell.
fn add_gradient_smoothness(field: &mut LatticeField, weight: f32) {
    let dim = field.num_dim();
    if dim < 2 {
        // A 1D lattice has no parallel edges.
        return;
    }

    let num_unknowns = field.num_unknowns();
    let edges_per_axis = 1usize << (dim - 1);
    let mut edges: Vec<(usize, usize)> = Vec::with_capacity(edges_per_axis);

    for base in 0..num_unknowns {
        let coords = field.coords_of(base);
        if (0..dim).any(|d| coords[d] + 2 > field.sizes()[d]) {
            continue;
        }

        for d in 0..dim {
            let stride = field.strides()[d];
            edges.clear();
            for edge in 0..edges_per_axis {
                let mut a = base;
                let mut bits = edge;
                for axis in 0..dim {
                    if axis == d {
                        continue;
                    }
                    if bits & 1 == 1 {
                        a += field.strides()[axis];
                    }
                    bits >>= 1;
                }
                edges.push((a, a + stride));
            }

            for ((a1, b1), (a2, b2)) in edges.iter().copied().tuple_combinations() {
                field
                    .eq
                    .add_equation(weight, 0.0, &[(b1, 1.0), (a1, -1.0), (b2, -1.0), (a2, 1.0)]);
            }
        }
    }
}

/// Predicts the number of equations and coefficients
/// [`add_field_constraints`] will emit, for capacity reservation.
fn predicted_equation_counts(field: &LatticeField, weights: &Weights) -> (usize, usize) {
    let num_unknowns = field.num_unknowns();
    let dim = field.num_dim();
    let mut equations = 0usize;
    let mut coefficients = 0usize;

    if weights.model_0 > 0.0 {
        equations += num_unknowns;
        coefficients += num_unknowns;
    }

    let model = [
        weights.model_0,
        weights.model_1,
        weights.model_2,
        weights.model_3,
        weights.model_4,
    ];
    for (order, &weight) in model.iter().enumerate().skip(1) {
        if weight <= 0.0 {
            continue;
        }
        for d in 0..dim {
            let size = field.sizes()[d];
            if size > order {
                let rows = num_unknowns / size * (size - order);
                equations += rows;
                coefficients += rows * (order + 1);
            }
        }
    }

    if weights.gradient_smoothness > 0.0 && dim >= 2 {
        let cells: usize = field.sizes().iter().map(|&s| s - 1).product();
        let edges_per_axis = 1usize << (dim - 1);
        let pairs_per_axis = edges_per_axis * (edges_per_axis - 1) / 2;
        let rows = cells * dim * pairs_per_axis;
        equations += rows;
        coefficients += rows * 4;
    }

    (equations, coefficients)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field_config::Weights;

    #[test]
    fn second_order_prior_emits_the_three_point_stencil() {
        let mut field = LatticeField::new(&[5]);
        let weights = Weights::builder().model_2(2.0).build();
        add_field_constraints(&mut field, &weights);

        assert_eq!(field.eq.num_equations(), 3);
        let row0: Vec<_> = field
            .eq
            .triplets()
            .iter()
            .filter(|t| t.row == 0)
            .map(|t| (t.col, t.value))
            .collect();
        assert_eq!(row0, vec![(0, 2.0), (1, -4.0), (2, 2.0)]);
        assert!(field.eq.rhs().iter().all(|&b| b == 0.0));
    }

    #[test]
    fn order_zero_prior_is_one_equation_per_point() {
        let mut field = LatticeField::new(&[3, 2]);
        let weights = Weights::builder().model_0(0.5).model_2(0.0).build();
        add_field_constraints(&mut field, &weights);
        assert_eq!(field.eq.num_equations(), 6);
        assert!(field.eq.triplets().iter().all(|t| t.value == 0.5));
    }

    #[test]
    fn gradient_smoothness_matches_the_two_dimensional_cell_constraints() {
        let mut field = LatticeField::new(&[2, 2]);
        let weights = Weights::builder()
            .model_2(0.0)
            .gradient_smoothness(1.0)
            .build();
        add_field_constraints(&mut field, &weights);

        // One cell, one pair of parallel edges per axis.
        assert_eq!(field.eq.num_equations(), 2);
        let idx = |x: usize, y: usize| field.flat_index(&[x, y]);
        let row0: Vec<_> = field
            .eq
            .triplets()
            .iter()
            .filter(|t| t.row == 0)
            .map(|t| (t.col, t.value))
            .collect();
        // (B - A) - (D - C) = 0 with corners A=(0,0) B=(1,0) C=(0,1) D=(1,1).
        assert_eq!(
            row0,
            vec![
                (idx(1, 0), 1.0),
                (idx(0, 0), -1.0),
                (idx(1, 1), -1.0),
                (idx(0, 1), 1.0),
            ]
        );
    }

    #[test]
    fn equation_count_matches_the_stencil_arithmetic() {
        // 4 x 3 lattice: model_1 fits 3*3 + 4*2 = 17 times, model_2 fits
        // 2*3 + 4*1 = 10 times, model_0 is one per point (12), and the
        // gradient-smoothness prior is 2 per cell (3 * 2 cells).
        let mut field = LatticeField::new(&[4, 3]);
        let weights = Weights::builder()
            .model_0(0.1)
            .model_1(0.2)
            .model_2(0.3)
            .gradient_smoothness(0.4)
            .build();
        add_field_constraints(&mut field, &weights);
        assert_eq!(field.eq.num_equations(), 12 + 17 + 10 + 12);
    }

    #[test]
    fn reservation_prediction_matches_what_is_emitted() {
        let mut field = LatticeField::new(&[4, 3, 2]);
        let weights = Weights::builder()
            .model_1(1.0)
            .model_3(1.0)
            .gradient_smoothness(1.0)
            .build();
        let (equations, coefficients) = predicted_equation_counts(&field, &weights);
        add_field_constraints(&mut field, &weights);
        assert_eq!(field.eq.num_equations(), equations);
        assert_eq!(field.eq.num_coefficients(), coefficients);
    }

    #[test]
    fn stencils_never_cross_the_lattice_boundary() {
        let mut field = LatticeField::new(&[3]);
        let weights = Weights::builder().model_2(0.0).model_4(1.0).build();
        add_field_constraints(&mut field, &weights);
        // A five-point stencil cannot fit in three unknowns.
        assert_eq!(field.eq.num_equations(), 0);
    }
}
