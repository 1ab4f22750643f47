use crate::sample::{biased_parts, offset_and_clip, SampleCube, NIBBLE_MAX, NIBBLE_MIN, SAMPLE_BIAS};

/// Sentinel for "generate the selected pattern on every frequency".
pub const ALL_FREQUENCIES: i32 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorMode {
    Constant,
    RampUp,
    RampDown,
    RandomSeeded,
}

impl GeneratorMode {
    /// Numeric selectors as exposed on the command line.
    pub fn parse(value: u32) -> Result<Self, String> {
        match value {
            1 => Ok(Self::Constant),
            2 => Ok(Self::RampUp),
            3 => Ok(Self::RampDown),
            4 => Ok(Self::RandomSeeded),
            _ => Err(format!(
                "invalid generation mode {}, expected 1 (constant), 2 (ramp up), 3 (ramp down) or 4 (seeded random)",
                value
            )),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Constant => "constant",
            Self::RampUp => "ramp_up",
            Self::RampDown => "ramp_down",
            Self::RandomSeeded => "random_seeded",
        }
    }
}

/// Everything needed to reproduce one generated cube. The reference
/// correlator regenerates from the same parameters rather than sharing
/// the pipeline's buffer, so determinism here is a correctness contract.
#[derive(Debug, Clone, Copy)]
pub struct GeneratorParams {
    pub mode: GeneratorMode,
    pub seed: u32,
    pub default_re: i32,
    pub default_im: i32,
    pub initial_re: i32,
    pub initial_im: i32,
    /// `ALL_FREQUENCIES` or a single frequency index; anything out of
    /// range is treated as `ALL_FREQUENCIES`.
    pub target_frequency: i32,
    pub num_timesteps: usize,
    pub num_frequencies: usize,
    pub num_elements: usize,
    /// Reseed the pseudo-random stream at the start of every timestep so
    /// all timesteps carry identical samples.
    pub no_repeat_random: bool,
}

/// ANSI-C minimal `rand()`: a 31-bit LCG with the top bits as output.
/// Chosen over an external RNG so the stream is fixed by this crate
/// alone; reproducibility is part of the generator contract.
struct CRand {
    state: u32,
}

impl CRand {
    fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    fn next(&mut self) -> u32 {
        self.state = self.state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        (self.state >> 16) & 0x7FFF
    }

    fn next_nibble(&mut self) -> u8 {
        (self.next() % 16) as u8
    }
}

/// Produce a deterministic cube of packed samples.
pub fn generate(params: &GeneratorParams) -> SampleCube {
    let num_frequencies = params.num_frequencies;
    let target_frequency =
        if params.target_frequency < 0 || params.target_frequency >= num_frequencies as i32 {
            ALL_FREQUENCIES
        } else {
            params.target_frequency
        };

    let default_re = offset_and_clip(params.default_re, SAMPLE_BIAS, NIBBLE_MIN, NIBBLE_MAX) as u8;
    let default_im = offset_and_clip(params.default_im, SAMPLE_BIAS, NIBBLE_MIN, NIBBLE_MAX) as u8;
    let initial_re = offset_and_clip(params.initial_re, SAMPLE_BIAS, NIBBLE_MIN, NIBBLE_MAX) as u8;
    let initial_im = offset_and_clip(params.initial_im, SAMPLE_BIAS, NIBBLE_MIN, NIBBLE_MAX) as u8;

    let mut cube = SampleCube::new(params.num_timesteps, num_frequencies, params.num_elements);
    let mut stream = CRand::new(params.seed);

    for k in 0..params.num_timesteps {
        if params.mode == GeneratorMode::RandomSeeded && params.no_repeat_random {
            stream = CRand::new(params.seed);
        }
        for j in 0..num_frequencies {
            for i in 0..params.num_elements {
                let (new_re, new_im) = match params.mode {
                    GeneratorMode::Constant => (initial_re, initial_im),
                    GeneratorMode::RampUp => (
                        ((j + initial_re as usize + i) % 16) as u8,
                        ((j + initial_im as usize + i) % 16) as u8,
                    ),
                    GeneratorMode::RampDown => (
                        15 - ((j + initial_re as usize + i) % 16) as u8,
                        15 - ((j + initial_im as usize + i) % 16) as u8,
                    ),
                    GeneratorMode::RandomSeeded => (stream.next_nibble(), stream.next_nibble()),
                };

                let byte = if target_frequency == ALL_FREQUENCIES || j as i32 == target_frequency {
                    ((new_re << 4) & 0xF0) | (new_im & 0x0F)
                } else {
                    ((default_re << 4) & 0xF0) | (default_im & 0x0F)
                };
                cube.set(k, j, i, byte);
            }
        }
    }

    cube
}

/// Print a table of unpacked samples, one row per frequency, for the
/// first `num_timesteps` timesteps. `particular_frequency` restricts the
/// rows when it is a valid index.
pub fn dump_samples(cube: &SampleCube, num_timesteps: usize, particular_frequency: i32) {
    print!("Number of timesteps to print: {}, ", num_timesteps);
    if particular_frequency == ALL_FREQUENCIES {
        println!(
            "number of frequency bands: {}, number of elements: {}",
            cube.num_frequencies(),
            cube.num_elements()
        );
    } else {
        println!(
            "frequency band: {}, number of elements: {}",
            particular_frequency,
            cube.num_elements()
        );
    }

    for k in 0..num_timesteps.min(cube.num_timesteps()) {
        if num_timesteps > 1 {
            println!("Time Step {}", k);
        }
        print!("            ");
        for header in 0..cube.num_elements() {
            print!("{:3}R {:3}I ", header, header);
        }
        println!();
        for j in 0..cube.num_frequencies() {
            if particular_frequency != ALL_FREQUENCIES && particular_frequency != j as i32 {
                continue;
            }
            if particular_frequency != j as i32 {
                print!("Freq: {:4}: ", j);
            }
            for i in 0..cube.num_elements() {
                let (hi, lo) = biased_parts(cube.get(k, j, i));
                print!("{:4} {:4} ", hi as i32 - SAMPLE_BIAS, lo as i32 - SAMPLE_BIAS);
            }
            println!();
        }
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::unpack_sample;

    fn base_params(mode: GeneratorMode) -> GeneratorParams {
        GeneratorParams {
            mode,
            seed: 42,
            default_re: 0,
            default_im: 0,
            initial_re: 0,
            initial_im: 0,
            target_frequency: ALL_FREQUENCIES,
            num_timesteps: 2,
            num_frequencies: 2,
            num_elements: 4,
            no_repeat_random: false,
        }
    }

    #[test]
    fn identical_parameters_give_byte_identical_cubes() {
        for mode in [
            GeneratorMode::Constant,
            GeneratorMode::RampUp,
            GeneratorMode::RampDown,
            GeneratorMode::RandomSeeded,
        ] {
            let params = base_params(mode);
            assert_eq!(generate(&params), generate(&params), "mode {:?}", mode);
        }
    }

    #[test]
    fn constant_mode_uses_clipped_initial_values() {
        let mut params = base_params(GeneratorMode::Constant);
        params.initial_re = -3;
        params.initial_im = 7;
        let cube = generate(&params);
        for &byte in cube.as_bytes() {
            assert_eq!(unpack_sample(byte), (-3, 7));
        }

        // Offsets past the packed domain saturate rather than wrap.
        params.initial_re = 12;
        params.initial_im = -20;
        let cube = generate(&params);
        for &byte in cube.as_bytes() {
            assert_eq!(unpack_sample(byte), (7, -8));
        }
    }

    #[test]
    fn ramp_up_and_down_are_complements() {
        let up = generate(&base_params(GeneratorMode::RampUp));
        let down = generate(&base_params(GeneratorMode::RampDown));
        for (u, d) in up.as_bytes().iter().zip(down.as_bytes()) {
            let (u_hi, u_lo) = crate::sample::biased_parts(*u);
            let (d_hi, d_lo) = crate::sample::biased_parts(*d);
            assert_eq!(u_hi + d_hi, 15);
            assert_eq!(u_lo + d_lo, 15);
        }
    }

    #[test]
    fn no_repeat_random_makes_every_timestep_identical() {
        let mut params = base_params(GeneratorMode::RandomSeeded);
        params.no_repeat_random = true;
        params.num_frequencies = 1;
        let cube = generate(&params);
        let per_step = cube.num_frequencies() * cube.num_elements();
        let (first, second) = cube.as_bytes().split_at(per_step);
        assert_eq!(first, second);
    }

    #[test]
    fn continuous_random_stream_differs_between_timesteps() {
        let mut params = base_params(GeneratorMode::RandomSeeded);
        params.no_repeat_random = false;
        params.num_frequencies = 1;
        params.num_elements = 16;
        let cube = generate(&params);
        let per_step = cube.num_frequencies() * cube.num_elements();
        let (first, second) = cube.as_bytes().split_at(per_step);
        assert_ne!(first, second);
    }

    #[test]
    fn target_frequency_fills_other_bands_with_defaults() {
        let mut params = base_params(GeneratorMode::Constant);
        params.initial_re = 5;
        params.initial_im = -2;
        params.default_re = 1;
        params.default_im = 1;
        params.target_frequency = 1;
        let cube = generate(&params);
        for k in 0..cube.num_timesteps() {
            for e in 0..cube.num_elements() {
                assert_eq!(unpack_sample(cube.get(k, 0, e)), (1, 1));
                assert_eq!(unpack_sample(cube.get(k, 1, e)), (5, -2));
            }
        }
    }

    #[test]
    fn out_of_range_target_frequency_falls_back_to_all() {
        let mut params = base_params(GeneratorMode::Constant);
        params.initial_re = 3;
        params.initial_im = 3;
        params.default_re = 0;
        params.default_im = 0;
        params.target_frequency = params.num_frequencies as i32; // one past the end
        let cube = generate(&params);
        for &byte in cube.as_bytes() {
            assert_eq!(unpack_sample(byte), (3, 3));
        }
    }
}
