/////////////////////////////////////////////////////////////////////////////////////////////
//
// Defines the lattice descriptor: per-axis sizes, row-major strides, and coordinate mapping.
//
// Created on: 21 Jun 2026     Author: Daniel Owen
//
// Copyright (c) 2026, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # lattice
//!
//! The dense, uniform, rectangular grid of scalar unknowns that every
//! constraint and solver in this crate operates on.
//!
//! Lattice coordinates are real-valued and run from `0.0` to
//! `sizes[d] - 1.0` inclusive along each axis.

use crate::equation::LinearEquation;

/// There is no algorithmic limit on dimensionality, but the linear value
/// kernel emits `2^D` coefficients per constraint, so the crate commits to
/// low-dimensional lattices only.
pub const MAX_DIM: usize = 3;

/// A lattice of scalar unknowns together with the equations accumulated
/// against it.
///
/// A `LatticeField` is constructed empty, populated through the
/// constraint-adding operations ([`add_value_constraint`],
/// [`add_gradient_constraint`], [`add_field_constraints`], ...) and then
/// handed read-only to one of the solvers.
///
/// [`add_value_constraint`]: crate::add_value_constraint
/// [`add_gradient_constraint`]: crate::add_gradient_constraint
/// [`add_field_constraints`]: crate::add_field_constraints
#[derive(Debug, Clone, Default)]
pub struct LatticeField {
    /// Accumulated equations.
    pub eq: LinearEquation,

    sizes: Vec<usize>,
    strides: Vec<usize>,
}

/// The enclosing cell of a real-valued lattice position: the floor corner
/// plus the fractional offset along each axis. Only the first `num_dim`
/// entries are meaningful.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Cell {
    pub floor: [usize; MAX_DIM],
    pub frac: [f32; MAX_DIM],
}

impl LatticeField {
    /// Creates an empty field over a lattice with the given per-axis sizes.
    ///
    /// Row-major strides are derived as `strides[d] = product(sizes[..d])`.
    ///
    /// # Panics
    /// If `sizes` is empty, longer than [`MAX_DIM`], or contains a zero.
    pub fn new(sizes: &[usize]) -> Self {
        assert!(
            !sizes.is_empty() && sizes.len() <= MAX_DIM,
            "Lattice dimensionality must be in 1..={}, got {}",
            MAX_DIM,
            sizes.len()
        );
        assert!(
            sizes.iter().all(|&s| s >= 1),
            "Lattice sizes must be positive, got {:?}",
            sizes
        );

        let mut strides = Vec::with_capacity(sizes.len());
        let mut stride = 1usize;
        for &size in sizes {
            strides.push(stride);
            stride *= size;
        }

        Self {
            eq: LinearEquation::new(),
            sizes: sizes.to_vec(),
            strides,
        }
    }

    /// Number of lattice axes.
    #[inline]
    pub fn num_dim(&self) -> usize {
        self.sizes.len()
    }

    /// Total number of scalar unknowns.
    #[inline]
    pub fn num_unknowns(&self) -> usize {
        self.sizes.iter().product()
    }

    /// Per-axis sizes.
    #[inline]
    pub fn sizes(&self) -> &[usize] {
        &self.sizes
    }

    /// Per-axis row-major strides.
    #[inline]
    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    /// Flat unknown index of an integer lattice point.
    #[inline]
    pub fn flat_index(&self, coords: &[usize]) -> usize {
        coords
            .iter()
            .zip(&self.strides)
            .map(|(c, s)| c * s)
            .sum()
    }

    /// Integer coordinates of a flat unknown index. Only the first
    /// `num_dim` entries of the result are meaningful.
    #[inline]
    pub(crate) fn coords_of(&self, mut flat: usize) -> [usize; MAX_DIM] {
        let mut coords = [0usize; MAX_DIM];
        for (d, &size) in self.sizes.iter().enumerate() {
            coords[d] = flat % size;
            flat /= size;
        }
        coords
    }

    /// Whether a real-valued position lies inside the closed lattice
    /// bounds `[0, sizes[d] - 1]` on every axis.
    pub(crate) fn contains(&self, pos: &[f32]) -> bool {
        pos.iter()
            .zip(&self.sizes)
            .all(|(&p, &size)| p >= 0.0 && p <= (size - 1) as f32)
    }

    /// The cell enclosing `pos`, or `None` when the position (or any part
    /// of its cell) falls outside the lattice.
    ///
    /// A position sitting exactly on the upper boundary of an axis
    /// (`floor == sizes[d] - 1`, fraction `0`) still resolves: it is
    /// clamped into the boundary cell with fraction `1`.
    pub(crate) fn enclosing_cell(&self, pos: &[f32]) -> Option<Cell> {
        debug_assert_eq!(pos.len(), self.num_dim());
        if !self.contains(pos) {
            return None;
        }

        let mut cell = Cell {
            floor: [0; MAX_DIM],
            frac: [0.0; MAX_DIM],
        };

        for (d, (&p, &size)) in pos.iter().zip(&self.sizes).enumerate() {
            // An axis of width 1 has no cell to interpolate in.
            if size < 2 {
                return None;
            }
            let mut floor = p.floor() as usize;
            let mut frac = p - floor as f32;
            if floor >= size - 1 {
                floor = size - 2;
                frac = 1.0;
            }
            cell.floor[d] = floor;
            cell.frac[d] = frac;
        }

        Some(cell)
    }

    /// The nearest integer lattice point to `pos`, or `None` when the
    /// position falls outside the lattice.
    pub(crate) fn nearest_point(&self, pos: &[f32]) -> Option<[usize; MAX_DIM]> {
        debug_assert_eq!(pos.len(), self.num_dim());
        if !self.contains(pos) {
            return None;
        }

        let mut nearest = [0usize; MAX_DIM];
        for (d, &p) in pos.iter().enumerate() {
            // `contains` bounds p to [0, size - 1], so rounding stays in range.
            nearest[d] = p.round() as usize;
        }
        Some(nearest)
    }
}
