/////////////////////////////////////////////////////////////////////////////////////////////
//
// Declares configuration for the multi-resolution approximate lattice solver.
//
// Created on: 21 Jun 2026     Author: Daniel Owen
//
// Copyright (c) 2026, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! Declares configuration for the multi-resolution approximate lattice solver.

use serde::{Deserialize, Serialize};

/// Options controlling [`solve_sparse_linear_approximate_lattice`].
///
/// The approximate solver always runs the coarse stage (solve a
/// down-scaled lattice exactly and up-sample the result); the tiled
/// refinement and conjugate-gradient polish stages are optional.
///
/// ### Default values
/// - `downscale_factor`: `4`
/// - `tile`: `true`
/// - `tile_size`: `16`
/// - `cg`: `true`
/// - `error_tolerance`: `1e-3`
///
/// [`solve_sparse_linear_approximate_lattice`]: crate::solve_sparse_linear_approximate_lattice
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolveOptions {
    /// Per-axis shrink factor for the coarse stage, in `[2, 10]`.
    pub downscale_factor: usize,

    /// Whether to run the tiled refinement stage.
    pub tile: bool,

    /// Edge length of the refinement tiles, in `[2, 128]`.
    pub tile_size: usize,

    /// Whether to run the conjugate-gradient polish stage.
    pub cg: bool,

    /// Relative residual of the normal equations at which the
    /// conjugate-gradient polish stops.
    pub error_tolerance: f32,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            downscale_factor: 4,
            tile: true,
            tile_size: 16,
            cg: true,
            error_tolerance: 1e-3,
        }
    }
}

impl SolveOptions {
    /// Returns a new [`SolveOptionsBuilder`] seeded with the defaults.
    pub fn builder() -> SolveOptionsBuilder {
        SolveOptionsBuilder::new()
    }
}

/// A convenience builder for constructing a [`SolveOptions`] instance.
///
/// The builder should be called via the [`SolveOptions::builder`] method.
/// Out-of-range values are clamped to the documented bounds.
#[derive(Debug, Clone, Copy)]
pub struct SolveOptionsBuilder {
    options: SolveOptions,
}

impl SolveOptionsBuilder {
    fn new() -> Self {
        Self {
            options: SolveOptions::default(),
        }
    }

    /// Sets the coarse-stage shrink factor, clamped to `[2, 10]`.
    pub fn downscale_factor(mut self, downscale_factor: usize) -> Self {
        self.options.downscale_factor = downscale_factor.clamp(2, 10);
        self
    }

    /// Enables or disables the tiled refinement stage.
    pub fn tile(mut self, tile: bool) -> Self {
        self.options.tile = tile;
        self
    }

    /// Sets the refinement tile edge length, clamped to `[2, 128]`.
    pub fn tile_size(mut self, tile_size: usize) -> Self {
        self.options.tile_size = tile_size.clamp(2, 128);
        self
    }

    /// Enables or disables the conjugate-gradient polish stage.
    pub fn cg(mut self, cg: bool) -> Self {
        self.options.cg = cg;
        self
    }

    /// Sets the conjugate-gradient stopping tolerance.
    pub fn error_tolerance(mut self, error_tolerance: f32) -> Self {
        self.options.error_tolerance = error_tolerance;
        self
    }

    /// Builds and returns the configured [`SolveOptions`].
    pub fn build(self) -> SolveOptions {
        self.options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_clamps_to_documented_ranges() {
        let options = SolveOptions::builder()
            .downscale_factor(50)
            .tile_size(1)
            .build();
        assert_eq!(options.downscale_factor, 10);
        assert_eq!(options.tile_size, 2);
    }

    #[test]
    fn options_round_trip_through_serde() {
        let options = SolveOptions::builder().cg(false).tile_size(32).build();
        let json = serde_json::to_string(&options).unwrap();
        let back: SolveOptions = serde_json::from_str(&json).unwrap();
        assert_eq!(back, options);
    }
}
