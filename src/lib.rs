/////////////////////////////////////////////////////////////////////////////////////////////
//
// Exposes the public API and high-level documentation for lattice field interpolation.
//
// Created on: 21 Jun 2026     Author: Daniel Owen
//
// Copyright (c) 2026, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # Lattice field interpolation.
//!
//! This crate estimates a scalar field on a dense, uniform, rectangular
//! lattice (1D, 2D or 3D) from sparse observations. Two kinds of
//! constraint feed the fit:
//!
//! - **Model constraints** - equations describing the smoothness of the
//!   field (finite-difference priors of orders 0 to 4, plus an optional
//!   cross prior on cell gradients).
//! - **Data constraints** - specific things known about the field: its
//!   value at a position, or its gradient at a position.
//!
//! Every constraint carries a weight, and a sparse least-squares solve
//! returns the field minimizing the weighted errors. Trustworthy data gets
//! high data weights; noisy data gets high model weights. Typical use
//! cases:
//!
//! - Fit a smooth curve to noisy samples
//! - Generate a signed distance field (SDF) from oriented surface points,
//!   ready for iso-surface extraction
//!
//! Lattice coordinates run from `[0, 0, ...]` to
//! `[width - 1, height - 1, ...]` inclusive.
//!
//! # Features
//! - Value and gradient observations with selectable spreading kernels
//! - Smoothness priors from plain regularization up to cubic fits
//! - Exact solver via sparse Cholesky on the normal equations
//! - Approximate solver for large lattices: coarse solve, parallel tiled
//!   refinement, conjugate-gradient polish
//! - Residual blame maps and n-linear field up-sampling
//! - Built on [`faer`](https://docs.rs/faer/latest/faer/) for linear
//!   algebra, avoiding complex build dependencies
//!
//! # Examples
//!
//! ```
//! use ferreus_lattice::{
//!     add_field_constraints, add_value_constraint, solve_sparse_linear, LatticeField, Weights,
//! };
//!
//! // A 1D lattice with a "prefer linear" smoothness prior.
//! let weights = Weights::builder().model_2(1.0).build();
//! let mut field = LatticeField::new(&[6]);
//! add_field_constraints(&mut field, &weights);
//!
//! // Pin the end points and let least squares fill in the rest.
//! add_value_constraint(&mut field, &[0.0], 4.0, weights.data_pos);
//! add_value_constraint(&mut field, &[5.0], 2.0, weights.data_pos);
//!
//! let solution = solve_sparse_linear(field.num_unknowns(), field.eq.triplets(), field.eq.rhs());
//! assert_eq!(solution.len(), 6);
//! // The fit is the straight ramp between the two pins.
//! assert!((solution[1] - 3.6).abs() < 1e-3);
//! ```
//!
//! # References
//! 1.  F. Calakli and G. Taubin. SSD: Smooth Signed Distance Surface
//!     Reconstruction. Computer Graphics Forum, 30(7), 2011.
//! 2.  A. Björck. Numerical Methods for Least Squares Problems. SIAM, 1996.
//! 3.  W. L. Briggs, V. E. Henson, and S. F. McCormick. A Multigrid
//!     Tutorial, 2nd ed. SIAM, 2000.

pub mod config;

pub mod field_config;

pub mod progress;

mod constraints;

mod equation;

mod error_map;

mod field_test_functions;

mod iterative_solvers;

mod lattice;

mod lattice_solver;

mod resample;

mod sdf;

mod smoothness;

mod sparse_solver;

pub use {
    config::{SolveOptions, SolveOptionsBuilder},
    constraints::{
        add_gradient_constraint, add_value_constraint, add_value_constraint_nearest_neighbor,
    },
    equation::{LinearEquation, Triplet},
    error_map::generate_error_map,
    field_config::{GradientKernel, ValueKernel, Weights, WeightsBuilder},
    field_test_functions::FieldTestFunctions,
    lattice::{LatticeField, MAX_DIM},
    lattice_solver::{
        solve_sparse_linear_approximate_lattice,
        solve_sparse_linear_approximate_lattice_with_progress,
    },
    resample::upscale_field,
    sdf::{add_points, sdf_from_points, solve_sdf_from_points},
    smoothness::add_field_constraints,
    sparse_solver::solve_sparse_linear,
};
