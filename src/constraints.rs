/////////////////////////////////////////////////////////////////////////////////////////////
//
// Implements the value and gradient constraint kernels that turn observations into equations.
//
// Created on: 21 Jun 2026     Author: Daniel Owen
//
// Copyright (c) 2026, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # constraints
//!
//! Data constraints: specific things known about the field at real-valued
//! lattice positions. A value constraint pins `f(pos)`, a gradient
//! constraint pins `grad f(pos)`. Both come in several kernels that trade
//! equation density against accuracy.
//!
//! Observations that fall outside (or too close to the edge of) the
//! lattice are silently dropped; the add-operations return `false` so bulk
//! callers can count rejections without treating them as errors.

use crate::field_config::GradientKernel;
use crate::lattice::{Cell, LatticeField};

/// Adds a value constraint `f(pos) = value` by n-linear interpolation over
/// the `2^D` corners of the enclosing cell.
///
/// Returns `false` (emitting nothing) when the position's cell is not
/// entirely inside the lattice. Corners with a zero interpolation weight
/// are not stored, so a constraint at an integer lattice position touches
/// exactly one unknown.
pub fn add_value_constraint(
    field: &mut LatticeField,
    pos: &[f32],
    value: f32,
    weight: f32,
) -> bool {
    let dim = field.num_dim();
    assert_eq!(pos.len(), dim, "Position length must match the lattice dimensionality");

    let cell = match field.enclosing_cell(pos) {
        Some(cell) => cell,
        None => return false,
    };

    let mut coeffs: Vec<(usize, f32)> = Vec::with_capacity(1 << dim);
    for corner in 0..1usize << dim {
        let (index, alpha) = corner_term(field, &cell, corner, usize::MAX);
        coeffs.push((index, alpha));
    }

    field.eq.add_equation(weight, value, &coeffs);
    true
}

/// Adds the constraint `f(pos) = value` to the nearest lattice point, with
/// an offset derived from the supplied gradient and the distance to that
/// point: `f(nearest) = value + gradient . (nearest - pos)`.
///
/// In many cases this can replace [`add_value_constraint`] to produce a
/// less dense system that solves quicker. Returns `false` iff the position
/// is outside the lattice.
pub fn add_value_constraint_nearest_neighbor(
    field: &mut LatticeField,
    pos: &[f32],
    gradient: &[f32],
    value: f32,
    weight: f32,
) -> bool {
    let dim = field.num_dim();
    assert_eq!(pos.len(), dim, "Position length must match the lattice dimensionality");
    assert_eq!(gradient.len(), dim, "Gradient length must match the lattice dimensionality");

    let nearest = match field.nearest_point(pos) {
        Some(nearest) => nearest,
        None => return false,
    };

    let mut rhs = value;
    let mut index = 0usize;
    for d in 0..dim {
        rhs += gradient[d] * (nearest[d] as f32 - pos[d]);
        index += nearest[d] * field.strides()[d];
    }

    field.eq.add_equation(weight, rhs, &[(index, 1.0)]);
    true
}

/// Adds a gradient constraint `grad f(pos) = gradient` using the given
/// kernel.
///
/// Returns `false` (emitting nothing) when the kernel's stencil does not
/// fit entirely inside the lattice.
pub fn add_gradient_constraint(
    field: &mut LatticeField,
    pos: &[f32],
    gradient: &[f32],
    weight: f32,
    kernel: GradientKernel,
) -> bool {
    let dim = field.num_dim();
    assert_eq!(pos.len(), dim, "Position length must match the lattice dimensionality");
    assert_eq!(gradient.len(), dim, "Gradient length must match the lattice dimensionality");

    match kernel {
        GradientKernel::NearestNeighbor => gradient_nearest_neighbor(field, pos, gradient, weight),
        GradientKernel::CellEdges => gradient_cell_edges(field, pos, gradient, weight),
        GradientKernel::Linear => gradient_linear(field, pos, gradient, weight),
    }
}

/// One forward difference per axis at the nearest lattice point:
/// `f(nearest + e_d) - f(nearest) = gradient[d]`.
fn gradient_nearest_neighbor(
    field: &mut LatticeField,
    pos: &[f32],
    gradient: &[f32],
    weight: f32,
) -> bool {
    let dim = field.num_dim();
    let nearest = match field.nearest_point(pos) {
        Some(nearest) => nearest,
        None => return false,
    };

    // Every forward neighbor must exist before anything is emitted.
    for d in 0..dim {
        if nearest[d] + 1 > field.sizes()[d] - 1 {
            return false;
        }
    }

    let base = field.flat_index(&nearest[..dim]);
    for d in 0..dim {
        let stride = field.strides()[d];
        field
            .eq
            .add_equation(weight, gradient[d], &[(base + stride, 1.0), (base, -1.0)]);
    }
    true
}

/// One forward difference along each of the `2^(D-1)` edges of the
/// enclosing cell that run parallel to each axis.
fn gradient_cell_edges(
    field: &mut LatticeField,
    pos: &[f32],
    gradient: &[f32],
    weight: f32,
) -> bool {
    let dim = field.num_dim();
    let cell = match field.enclosing_cell(pos) {
        Some(cell) => cell,
        None => return false,
    };

    for d in 0..dim {
        let stride = field.strides()[d];
        for edge in 0..1usize << (dim - 1) {
            let (base, _) = edge_term(field, &cell, d, edge);
            field
                .eq
                .add_equation(weight, gradient[d], &[(base + stride, 1.0), (base, -1.0)]);
        }
    }
    true
}

/// Per axis, one equation blending the `2^(D-1)` parallel cell edges with
/// n-linear weights over the remaining axes.
fn gradient_linear(
    field: &mut LatticeField,
    pos: &[f32],
    gradient: &[f32],
    weight: f32,
) -> bool {
    let dim = field.num_dim();
    let cell = match field.enclosing_cell(pos) {
        Some(cell) => cell,
        None => return false,
    };

    let mut coeffs: Vec<(usize, f32)> = Vec::with_capacity(1 << dim);
    for d in 0..dim {
        let stride = field.strides()[d];
        coeffs.clear();
        for edge in 0..1usize << (dim - 1) {
            let (base, beta) = edge_term(field, &cell, d, edge);
            coeffs.push((base + stride, beta));
            coeffs.push((base, -beta));
        }
        field.eq.add_equation(weight, gradient[d], &coeffs);
    }
    true
}

/// Flat index and n-linear weight of one cell corner. Corner bits select
/// the near/far side of the cell per axis; `skip_axis` (or `usize::MAX`
/// for none) is excluded from both the index offset and the weight.
fn corner_term(field: &LatticeField, cell: &Cell, corner: usize, skip_axis: usize) -> (usize, f32) {
    let dim = field.num_dim();
    let mut alpha = 1.0f32;
    let mut index = 0usize;
    let mut bits = corner;
    for axis in 0..dim {
        if axis == skip_axis {
            index += cell.floor[axis] * field.strides()[axis];
            continue;
        }
        let bit = bits & 1;
        bits >>= 1;
        alpha *= match bit == 1 {
            true => cell.frac[axis],
            false => 1.0 - cell.frac[axis],
        };
        index += (cell.floor[axis] + bit) * field.strides()[axis];
    }
    (index, alpha)
}

/// Lower endpoint and blend weight of the `edge`-th cell edge parallel to
/// `axis`. The weight interpolates over the remaining axes only.
fn edge_term(field: &LatticeField, cell: &Cell, axis: usize, edge: usize) -> (usize, f32) {
    corner_term(field, cell, edge, axis)
}
