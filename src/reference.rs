use crate::generator::{generate, GeneratorParams};
use crate::sample::{unpack_sample, SampleCube};

/// Sign convention for the imaginary accumulation. Both are kept as
/// explicit options because older kernel generations emit the opposite
/// conjugate convention; neither is privileged here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Convention {
    /// imag += x_re * y_im - x_im * y_re
    Standard,
    /// imag += x_im * y_re - x_re * y_im
    Nonstandard,
}

impl Convention {
    pub fn parse(value: u32) -> Result<Self, String> {
        match value {
            0 => Ok(Self::Standard),
            1 => Ok(Self::Nonstandard),
            _ => Err(format!(
                "invalid convention selector {}, expected 0 (standard) or 1 (nonstandard)",
                value
            )),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Nonstandard => "nonstandard",
        }
    }

    pub fn imag_term(self, x_re: i32, x_im: i32, y_re: i32, y_im: i32) -> i32 {
        match self {
            Self::Standard => x_re * y_im - x_im * y_re,
            Self::Nonstandard => x_im * y_re - x_re * y_im,
        }
    }
}

/// Number of interleaved i32 values in a dense correlation result.
pub fn dense_len(num_frequencies: usize, num_elements: usize) -> usize {
    num_frequencies * num_elements * num_elements * 2
}

/// Number of interleaved i32 values in a compact-triangle result.
pub fn triangle_len(num_frequencies: usize, num_elements: usize) -> usize {
    num_frequencies * num_elements * (num_elements + 1)
}

/// Straightforward definitional correlation: for every timestep,
/// frequency and element pair, accumulate the complex products of the
/// unpacked samples. This is the correctness oracle for the accelerator
/// path, deliberately unoptimized.
///
/// Output is `num_frequencies` blocks of `num_elements x num_elements`
/// interleaved (re, im) pairs.
pub fn correlate_dense(cube: &SampleCube, convention: Convention) -> Vec<i32> {
    let num_frequencies = cube.num_frequencies();
    let num_elements = cube.num_elements();
    let mut out = vec![0i32; dense_len(num_frequencies, num_elements)];

    for k in 0..cube.num_timesteps() {
        for j in 0..num_frequencies {
            for element_y in 0..num_elements {
                let (y_re, y_im) = unpack_sample(cube.get(k, j, element_y));
                for element_x in 0..num_elements {
                    let (x_re, x_im) = unpack_sample(cube.get(k, j, element_x));
                    let address =
                        (j * num_elements * num_elements + element_y * num_elements + element_x) * 2;
                    out[address] += x_re * y_re + x_im * y_im;
                    out[address + 1] += convention.imag_term(x_re, x_im, y_re, y_im);
                }
            }
        }
    }

    out
}

/// Triangle-only variant: only pairs with element_x >= element_y, emitted
/// row-major by (y, x) per frequency, matching the compact-triangle
/// layout of the reorganized accelerator output.
pub fn correlate_triangle(cube: &SampleCube, convention: Convention) -> Vec<i32> {
    let num_frequencies = cube.num_frequencies();
    let num_elements = cube.num_elements();
    let mut out = vec![0i32; triangle_len(num_frequencies, num_elements)];

    for k in 0..cube.num_timesteps() {
        let mut counter = 0;
        for j in 0..num_frequencies {
            for element_y in 0..num_elements {
                let (y_re, y_im) = unpack_sample(cube.get(k, j, element_y));
                for element_x in element_y..num_elements {
                    let (x_re, x_im) = unpack_sample(cube.get(k, j, element_x));
                    out[counter] += x_re * y_re + x_im * y_im;
                    out[counter + 1] += convention.imag_term(x_re, x_im, y_re, y_im);
                    counter += 2;
                }
            }
        }
    }

    out
}

/// Regenerate the cube from the same parameters the pipeline used, then
/// correlate it. Keeps the reference path independent of the pipeline's
/// staged buffers.
pub fn generate_and_correlate_dense(params: &GeneratorParams, convention: Convention) -> Vec<i32> {
    correlate_dense(&generate(params), convention)
}

pub fn generate_and_correlate_triangle(
    params: &GeneratorParams,
    convention: Convention,
) -> Vec<i32> {
    correlate_triangle(&generate(params), convention)
}
