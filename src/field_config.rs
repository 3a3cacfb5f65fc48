/////////////////////////////////////////////////////////////////////////////////////////////
//
// Specifies constraint kernels and weighting options for configuring lattice field fits.
//
// Created on: 21 Jun 2026     Author: Daniel Owen
//
// Copyright (c) 2026, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! Specifies constraint kernels and weighting options for configuring lattice field fits.

use serde::{Deserialize, Serialize};

/// How a value observation `f(pos) = value` is spread onto the lattice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueKernel {
    /// Apply to the closest lattice point, offset by the supplied gradient
    /// and the distance to that point. Emits a single coefficient, which
    /// keeps the system sparse in higher dimensions.
    NearestNeighbor,

    /// N-linear interpolation over the `2^D` corners of the enclosing cell.
    Linear,
}

/// How a gradient observation `grad f(pos) = gradient` is spread onto the
/// lattice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GradientKernel {
    /// One forward difference per axis at the closest lattice point.
    NearestNeighbor,

    /// One forward difference along every edge of the enclosing cell.
    CellEdges,

    /// Per axis, a single equation blending the parallel cell edges with
    /// n-linear weights over the remaining axes.
    Linear,
}

/// Weights for the constraints describing a lattice field fit.
///
/// Each constraint contributes to the least-squares objective in proportion
/// to its weight: data weights say how much the observations are trusted,
/// model weights say how strongly the smoothness priors are enforced.
///
/// Picking good parameters:
/// - Continuous data with abrupt changes: high `model_1`, low everything else.
/// - Smooth data: high `model_2`, low everything else.
/// - Trustworthy data: model weights around a tenth of the data weights.
/// - Noisy data: raise the model weights.
/// - Lopsided data density: lower `model_1`.
///
/// The model weights are resolution-dependent. When changing the lattice
/// resolution, scale roughly as `model_0 ~ resolution`, `model_1` constant,
/// `model_2 ~ 1/resolution`, `model_3 ~ 1/resolution^2`. Higher smoothness
/// orders increase the computational cost.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Weights {
    /// How much the observed point values are trusted.
    pub data_pos: f32,

    /// How much the observed point gradients/normals are trusted.
    pub data_gradient: f32,

    /// Bias toward `f = 0` (regularization). If this is large everything
    /// will be pulled to zero.
    pub model_0: f32,

    /// Bias toward a constant field. If this is large the fit approaches
    /// the average of the data.
    pub model_1: f32,

    /// Bias toward a linear field (C1 smoothness).
    pub model_2: f32,

    /// Bias toward a quadratic field (C2 smoothness).
    pub model_3: f32,

    /// Bias toward a cubic field (C3 smoothness).
    pub model_4: f32,

    /// For a 2D cell with corners
    /// ```text
    ///   A B
    ///   C D
    /// ```
    /// this is the strength of the constraints `B - A == D - C` and
    /// `C - A == D - B`, generalized to every pair of parallel cell edges
    /// in higher dimensions. It improves iso-lines at large positive
    /// distances but adds a lot of equations.
    pub gradient_smoothness: f32,

    /// Kernel used for value observations.
    pub value_kernel: ValueKernel,

    /// Kernel used for gradient observations.
    pub gradient_kernel: GradientKernel,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            data_pos: 1.0,
            data_gradient: 1.0,
            model_0: 0.0,
            model_1: 0.0,
            model_2: 0.5,
            model_3: 0.0,
            model_4: 0.0,
            gradient_smoothness: 0.0,
            value_kernel: ValueKernel::Linear,
            gradient_kernel: GradientKernel::CellEdges,
        }
    }
}

impl Weights {
    /// Returns a new [`WeightsBuilder`] seeded with the defaults.
    pub fn builder() -> WeightsBuilder {
        WeightsBuilder::new()
    }
}

/// A convenience builder for constructing a [`Weights`] instance.
///
/// The builder should be called via the [`Weights::builder`] method.
///
/// # Example
/// ```
/// use ferreus_lattice::{GradientKernel, Weights};
///
/// let weights = Weights::builder()
///     .model_2(1.0)
///     .gradient_kernel(GradientKernel::Linear)
///     .build();
/// assert_eq!(weights.model_2, 1.0);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct WeightsBuilder {
    weights: Weights,
}

impl WeightsBuilder {
    fn new() -> Self {
        Self {
            weights: Weights::default(),
        }
    }

    /// Sets the value-observation weight.
    pub fn data_pos(mut self, data_pos: f32) -> Self {
        self.weights.data_pos = data_pos;
        self
    }

    /// Sets the gradient-observation weight.
    pub fn data_gradient(mut self, data_gradient: f32) -> Self {
        self.weights.data_gradient = data_gradient;
        self
    }

    /// Sets the zeroth-order (pull to zero) prior weight.
    pub fn model_0(mut self, model_0: f32) -> Self {
        self.weights.model_0 = model_0;
        self
    }

    /// Sets the first-order (constant field) prior weight.
    pub fn model_1(mut self, model_1: f32) -> Self {
        self.weights.model_1 = model_1;
        self
    }

    /// Sets the second-order (linear field) prior weight.
    pub fn model_2(mut self, model_2: f32) -> Self {
        self.weights.model_2 = model_2;
        self
    }

    /// Sets the third-order (quadratic field) prior weight.
    pub fn model_3(mut self, model_3: f32) -> Self {
        self.weights.model_3 = model_3;
        self
    }

    /// Sets the fourth-order (cubic field) prior weight.
    pub fn model_4(mut self, model_4: f32) -> Self {
        self.weights.model_4 = model_4;
        self
    }

    /// Sets the opposing-edge gradient-smoothness prior weight.
    pub fn gradient_smoothness(mut self, gradient_smoothness: f32) -> Self {
        self.weights.gradient_smoothness = gradient_smoothness;
        self
    }

    /// Sets the value kernel.
    pub fn value_kernel(mut self, value_kernel: ValueKernel) -> Self {
        self.weights.value_kernel = value_kernel;
        self
    }

    /// Sets the gradient kernel.
    pub fn gradient_kernel(mut self, gradient_kernel: GradientKernel) -> Self {
        self.weights.gradient_kernel = gradient_kernel;
        self
    }

    /// Builds and returns the configured [`Weights`].
    pub fn build(self) -> Weights {
        self.weights
    }
}
