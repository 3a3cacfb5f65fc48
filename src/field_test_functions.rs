/////////////////////////////////////////////////////////////////////////////////////////////
//
// Provides deterministic sample generators for exercising lattice field fits.
//
// Created on: 21 Jun 2026     Author: Daniel Owen
//
// Copyright (c) 2026, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! Deterministic sample generators for exercising lattice field fits:
//! oriented boundary samples for SDF reconstruction and a noisy chirped
//! sine for 1D denoising.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::Normal;

/// Collection of test data generators.
pub struct FieldTestFunctions;

impl FieldTestFunctions {
    /// Samples `num_points` points uniformly along a circle in the unit
    /// square, with unit outward normals.
    ///
    /// # Returns
    /// `(positions, normals)`, both interleaved `xyxyxy...`.
    ///
    /// # Example
    /// ```
    /// use ferreus_lattice::FieldTestFunctions;
    ///
    /// let (positions, normals) = FieldTestFunctions::circle_points(64, [0.5, 0.5], 0.35);
    /// assert_eq!(positions.len(), 128);
    /// assert_eq!(normals.len(), 128);
    /// ```
    pub fn circle_points(
        num_points: usize,
        center: [f32; 2],
        radius: f32,
    ) -> (Vec<f32>, Vec<f32>) {
        let mut positions = Vec::with_capacity(num_points * 2);
        let mut normals = Vec::with_capacity(num_points * 2);
        for i in 0..num_points {
            let angle = std::f32::consts::TAU * i as f32 / num_points as f32;
            let (sin, cos) = angle.sin_cos();
            positions.push(center[0] + radius * cos);
            positions.push(center[1] + radius * sin);
            normals.push(cos);
            normals.push(sin);
        }
        (positions, normals)
    }

    /// Adds Gaussian jitter to interleaved 2D positions and rotates the
    /// matching normals by Gaussian angular noise, keeping them unit
    /// length. The same seed reproduces the same perturbation.
    pub fn perturb_points(
        positions: &mut [f32],
        normals: &mut [f32],
        pos_stddev: f32,
        normal_stddev: f32,
        seed: u64,
    ) {
        assert_eq!(positions.len(), normals.len());
        let mut rng = StdRng::seed_from_u64(seed);
        let pos_noise = Normal::new(0.0f32, pos_stddev).unwrap();
        let angle_noise = Normal::new(0.0f32, normal_stddev).unwrap();

        for p in positions.iter_mut() {
            *p += rng.sample(pos_noise);
        }
        for normal in normals.chunks_exact_mut(2) {
            let angle = normal[1].atan2(normal[0]) + rng.sample(angle_noise);
            normal[0] = angle.cos();
            normal[1] = angle.sin();
        }
    }

    /// A noisy chirped sine `y = amplitude * sin(t * frequency * (1 + t *
    /// chirp_factor))` sampled at `num_samples` points with `t` in
    /// `[0, 1]`.
    ///
    /// # Returns
    /// `(t, y)` as separate vectors.
    pub fn chirp_samples(
        num_samples: usize,
        amplitude: f32,
        frequency: f32,
        chirp_factor: f32,
        noise_stddev: f32,
        seed: u64,
    ) -> (Vec<f32>, Vec<f32>) {
        let mut rng = StdRng::seed_from_u64(seed);
        let noise = Normal::new(0.0f32, noise_stddev).unwrap();

        let mut ts = Vec::with_capacity(num_samples);
        let mut ys = Vec::with_capacity(num_samples);
        for i in 0..num_samples {
            let t = match num_samples < 2 {
                true => 0.0,
                false => i as f32 / (num_samples - 1) as f32,
            };
            let y = amplitude * (t * frequency * (1.0 + t * chirp_factor)).sin();
            ts.push(t);
            ys.push(y + rng.sample(noise));
        }
        (ts, ys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn circle_points_lie_on_the_circle_with_unit_normals() {
        let (positions, normals) = FieldTestFunctions::circle_points(16, [0.5, 0.5], 0.35);
        for i in 0..16 {
            let dx = positions[2 * i] - 0.5;
            let dy = positions[2 * i + 1] - 0.5;
            assert!((dx.hypot(dy) - 0.35).abs() < 1e-5);
            let nx = normals[2 * i];
            let ny = normals[2 * i + 1];
            assert!((nx.hypot(ny) - 1.0).abs() < 1e-5);
            // Outward normal is radial.
            assert!((dx - 0.35 * nx).abs() < 1e-5);
            assert!((dy - 0.35 * ny).abs() < 1e-5);
        }
    }

    #[test]
    fn perturbation_is_deterministic_per_seed() {
        let (mut pa, mut na) = FieldTestFunctions::circle_points(8, [0.5, 0.5], 0.3);
        let (mut pb, mut nb) = FieldTestFunctions::circle_points(8, [0.5, 0.5], 0.3);
        FieldTestFunctions::perturb_points(&mut pa, &mut na, 0.01, 0.1, 7);
        FieldTestFunctions::perturb_points(&mut pb, &mut nb, 0.01, 0.1, 7);
        assert_eq!(pa, pb);
        assert_eq!(na, nb);
        // Normals stay unit length.
        for normal in na.chunks_exact(2) {
            assert!((normal[0].hypot(normal[1]) - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn chirp_spans_the_unit_interval() {
        let (ts, ys) = FieldTestFunctions::chirp_samples(100, 0.5, 10.0, 2.0, 0.0, 0);
        assert_eq!(ts.len(), 100);
        assert_eq!(ys.len(), 100);
        assert_eq!(ts[0], 0.0);
        assert_eq!(ts[99], 1.0);
        assert!(ys.iter().all(|y| y.abs() <= 0.5 + 1e-6));
    }
}
