/////////////////////////////////////////////////////////////////////////////////////////////
//
// Resamples a lattice field to a different resolution by n-linear interpolation.
//
// Created on: 21 Jun 2026     Author: Daniel Owen
//
// Copyright (c) 2026, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # resample

use crate::lattice::MAX_DIM;

/// N-linearly resamples `field` from `small_sizes` to `large_sizes`.
///
/// Each target lattice point maps back to source coordinates by the strict
/// closed-interval rescale `p[d] = q[d] * (small[d] - 1) / (large[d] - 1)`,
/// so the first and last samples of every axis are preserved and no
/// extrapolation occurs. Resampling to the identical sizes reproduces the
/// input bit-exactly.
///
/// # Panics
/// If the dimensionalities differ or `field` does not have
/// `product(small_sizes)` entries.
pub fn upscale_field(field: &[f32], small_sizes: &[usize], large_sizes: &[usize]) -> Vec<f32> {
    let dim = small_sizes.len();
    assert_eq!(
        large_sizes.len(),
        dim,
        "Source and target lattices must have the same dimensionality"
    );
    assert!(dim >= 1 && dim <= MAX_DIM);
    assert_eq!(
        field.len(),
        small_sizes.iter().product::<usize>(),
        "Field length must match the source lattice"
    );

    let mut small_strides = [0usize; MAX_DIM];
    let mut stride = 1usize;
    for d in 0..dim {
        small_strides[d] = stride;
        stride *= small_sizes[d];
    }

    let num_targets: usize = large_sizes.iter().product();
    let mut out = Vec::with_capacity(num_targets);

    let mut floor = [0usize; MAX_DIM];
    let mut frac = [0.0f32; MAX_DIM];

    for target in 0..num_targets {
        let mut remaining = target;
        for d in 0..dim {
            let coord = remaining % large_sizes[d];
            remaining /= large_sizes[d];
            let (fi, t) = source_coordinate(coord, small_sizes[d], large_sizes[d]);
            floor[d] = fi;
            frac[d] = t;
        }

        let mut value = 0.0f32;
        for corner in 0..1usize << dim {
            let mut alpha = 1.0f32;
            let mut index = 0usize;
            for d in 0..dim {
                let bit = (corner >> d) & 1;
                alpha *= match bit == 1 {
                    true => frac[d],
                    false => 1.0 - frac[d],
                };
                index += (floor[d] + bit) * small_strides[d];
            }
            if alpha != 0.0 {
                value += alpha * field[index];
            }
        }
        out.push(value);
    }

    out
}

/// Maps one target coordinate to a source floor index and fraction,
/// clamped so the interpolation cell always lies inside the source.
fn source_coordinate(coord: usize, small: usize, large: usize) -> (usize, f32) {
    if small < 2 {
        return (0, 0.0);
    }
    let p = match large < 2 {
        true => 0.0,
        false => coord as f32 * (small - 1) as f32 / (large - 1) as f32,
    };
    let mut floor = p.floor() as usize;
    let mut frac = p - floor as f32;
    if floor >= small - 1 {
        floor = small - 2;
        frac = 1.0;
    }
    (floor, frac)
}
