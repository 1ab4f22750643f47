use crate::error::HarnessError;
use crate::generator::{GeneratorMode, GeneratorParams, ALL_FREQUENCIES};
use crate::layout::{block_count, BLOCK_SIDE};
use crate::reference::Convention;

pub const DEFAULT_NUM_ELEMENTS: usize = 256;
pub const DEFAULT_NUM_FREQUENCIES: usize = 8;
pub const DEFAULT_NUM_TIMESAMPLES: usize = 64 * 1024;
pub const DEFAULT_ITERATIONS: usize = 100;
pub const DEFAULT_SEED: u32 = 42;
/// Output frame band count used when padding compact triangles for
/// archival frames.
pub const DEFAULT_FRAME_FREQUENCIES: usize = 1024;

/// Which kernel build the accelerator runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelVariant {
    /// Element count handled directly; must be a multiple of the tile
    /// side.
    Standard,
    /// 16 real elements packed two-per-slot into a 32-element kernel;
    /// frequency pairs share one padded band.
    Packed16,
}

impl KernelVariant {
    pub fn parse(value: u32) -> Result<Self, String> {
        match value {
            0 => Ok(Self::Standard),
            1 => Ok(Self::Packed16),
            _ => Err(format!(
                "invalid kernel variant {}, expected 0 (standard) or 1 (packed 16-element)",
                value
            )),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Packed16 => "packed16",
        }
    }
}

/// The compile-time constants a kernel build is parameterized with: the
/// padded dimensions the accelerator actually processes alongside the
/// true ones, plus the derived block tiling.
#[derive(Debug, Clone, Copy)]
pub struct KernelGeometry {
    /// Padded element count the kernel operates on (multiple of
    /// `block_side`).
    pub num_elements: usize,
    /// Padded frequency count the kernel operates on.
    pub num_frequencies: usize,
    pub actual_num_elements: usize,
    pub actual_num_frequencies: usize,
    pub num_timesamples: usize,
    pub block_side: usize,
    pub num_blocks: usize,
}

impl KernelGeometry {
    pub fn input_bytes(&self) -> usize {
        self.num_timesamples * self.num_frequencies * self.num_elements
    }

    /// i32 count of the per-element offset accumulator (re, im pairs).
    pub fn accum_len(&self) -> usize {
        self.num_frequencies * self.num_elements * 2
    }

    /// i32 count of the tiled correlation output.
    pub fn output_len(&self) -> usize {
        self.num_frequencies * self.num_blocks * self.block_side * self.block_side * 2
    }
}

/// One run of the harness, fully parameterized. The historical
/// fixed-constant build is just `RunConfig::default()`.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub device_index: usize,
    pub iterations: usize,
    pub num_timesamples: usize,
    pub num_frequencies: usize,
    pub num_elements: usize,
    pub kernel_variant: KernelVariant,
    /// Skip per-cycle input transfer to isolate compute throughput.
    pub timer_only: bool,
    /// Reorganize and compare in compact-triangle form.
    pub upper_triangle: bool,
    pub convention: Convention,
    pub check_results: bool,
    pub verbose: bool,
    pub mode: GeneratorMode,
    pub seed: u32,
    pub default_re: i32,
    pub default_im: i32,
    pub initial_re: i32,
    pub initial_im: i32,
    pub no_repeat_random: bool,
    pub target_frequency: i32,
    pub frame_frequencies: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            device_index: 0,
            iterations: DEFAULT_ITERATIONS,
            num_timesamples: DEFAULT_NUM_TIMESAMPLES,
            num_frequencies: DEFAULT_NUM_FREQUENCIES,
            num_elements: DEFAULT_NUM_ELEMENTS,
            kernel_variant: KernelVariant::Standard,
            timer_only: true,
            upper_triangle: true,
            convention: Convention::Standard,
            check_results: true,
            verbose: false,
            mode: GeneratorMode::RandomSeeded,
            seed: DEFAULT_SEED,
            default_re: 0,
            default_im: 0,
            initial_re: 0,
            initial_im: 0,
            no_repeat_random: true,
            target_frequency: ALL_FREQUENCIES,
            frame_frequencies: DEFAULT_FRAME_FREQUENCIES,
        }
    }
}

impl RunConfig {
    /// Eager validation; nothing touches the backend until this passes.
    pub fn validate(&self) -> Result<(), HarnessError> {
        if self.iterations == 0 {
            return Err(HarnessError::Config(
                "iteration count must be at least 1".to_string(),
            ));
        }
        if self.num_timesamples == 0 {
            return Err(HarnessError::Config(
                "accumulation window must hold at least 1 time sample".to_string(),
            ));
        }
        if self.num_frequencies == 0 {
            return Err(HarnessError::Config(
                "frequency count must be at least 1".to_string(),
            ));
        }
        match self.kernel_variant {
            KernelVariant::Standard => {
                if self.num_elements == 0 || self.num_elements % BLOCK_SIDE != 0 {
                    return Err(HarnessError::Config(format!(
                        "element count {} must be a non-zero multiple of the {} tile side",
                        self.num_elements, BLOCK_SIDE
                    )));
                }
            }
            KernelVariant::Packed16 => {
                if self.num_elements != BLOCK_SIDE / 2 {
                    return Err(HarnessError::Config(format!(
                        "packed kernel variant supports exactly {} elements, got {}",
                        BLOCK_SIDE / 2,
                        self.num_elements
                    )));
                }
                if self.num_frequencies % 2 != 0 {
                    return Err(HarnessError::Config(format!(
                        "packed kernel variant pairs frequency bands; {} is odd",
                        self.num_frequencies
                    )));
                }
            }
        }
        Ok(())
    }

    /// Derive the padded geometry the kernels run with. The packed
    /// variant widens elements to one full tile and halves the band
    /// count, packing two real bands into each processed one.
    pub fn geometry(&self) -> KernelGeometry {
        let (padded_elements, padded_frequencies) = match self.kernel_variant {
            KernelVariant::Standard => (self.num_elements, self.num_frequencies),
            KernelVariant::Packed16 => (BLOCK_SIDE, self.num_frequencies / 2),
        };
        KernelGeometry {
            num_elements: padded_elements,
            num_frequencies: padded_frequencies,
            actual_num_elements: self.num_elements,
            actual_num_frequencies: self.num_frequencies,
            num_timesamples: self.num_timesamples,
            block_side: BLOCK_SIDE,
            num_blocks: block_count(padded_elements, BLOCK_SIDE),
        }
    }

    pub fn generator_params(&self) -> GeneratorParams {
        GeneratorParams {
            mode: self.mode,
            seed: self.seed,
            default_re: self.default_re,
            default_im: self.default_im,
            initial_re: self.initial_re,
            initial_im: self.initial_im,
            target_frequency: self.target_frequency,
            num_timesteps: self.num_timesamples,
            num_frequencies: self.num_frequencies,
            num_elements: self.num_elements,
            no_repeat_random: self.no_repeat_random,
        }
    }
}
