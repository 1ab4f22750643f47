use crate::backend::{
    BufferId, CompletionHandle, ComputeStage, CorrelatorBackend, QueueId, StageArgs,
    SubmissionKind, SubmissionRecord,
};
use crate::config::KernelGeometry;
use crate::error::{BackendError, HarnessError};
use crate::layout::block_id_to_coordinates;
use crate::reference::Convention;
use crate::sample::{biased_parts, SAMPLE_BIAS};

/// Clock and compute-unit figures reported for the software model,
/// loosely those of the accelerator card the kernels were tuned on.
const MODEL_CLOCK_MHZ: u32 = 930;
const MODEL_COMPUTE_UNITS: u32 = 44;

/// In-process stand-in for the accelerator. Every submission executes
/// eagerly and to completion before returning, so the asynchronous
/// contract is trivially satisfied; what makes it useful beyond
/// correctness checking is the submission log, which records the
/// dependency edge of every operation for later inspection.
///
/// The three stages reproduce the device kernels over the same byte
/// layout: packed samples in, interleaved little-endian i32 out.
pub struct SoftwareBackend {
    geometry: KernelGeometry,
    convention: Convention,
    buffers: Vec<Vec<u8>>,
    next_submission: u64,
    log: Vec<SubmissionRecord>,
}

impl SoftwareBackend {
    pub fn new(geometry: KernelGeometry, convention: Convention) -> Self {
        Self {
            geometry,
            convention,
            buffers: Vec::new(),
            next_submission: 0,
            log: Vec::new(),
        }
    }

    pub fn submission_log(&self) -> &[SubmissionRecord] {
        &self.log
    }

    fn check_buffer(&self, buffer: BufferId) -> Result<(), HarnessError> {
        if buffer.index() >= self.buffers.len() {
            return Err(BackendError::UnknownBuffer(buffer.index()).into());
        }
        Ok(())
    }

    fn check_wait(&self, wait_on: &Option<CompletionHandle>) -> Result<Option<u64>, HarnessError> {
        match wait_on {
            None => Ok(None),
            Some(handle) => {
                if handle.id() >= self.next_submission {
                    return Err(BackendError::UnknownHandle(handle.id()).into());
                }
                Ok(Some(handle.id()))
            }
        }
    }

    fn record(
        &mut self,
        queue: QueueId,
        kind: SubmissionKind,
        waited_on: Option<u64>,
    ) -> CompletionHandle {
        let id = self.next_submission;
        self.next_submission += 1;
        self.log.push(SubmissionRecord {
            id,
            queue,
            kind,
            waited_on,
        });
        CompletionHandle(id)
    }

    fn read_i32(buffer: &[u8], index: usize) -> i32 {
        let base = index * 4;
        i32::from_le_bytes([
            buffer[base],
            buffer[base + 1],
            buffer[base + 2],
            buffer[base + 3],
        ])
    }

    fn write_i32(buffer: &mut [u8], index: usize, value: i32) {
        let base = index * 4;
        buffer[base..base + 4].copy_from_slice(&value.to_le_bytes());
    }

    fn add_i32(buffer: &mut [u8], index: usize, delta: i32) {
        let value = Self::read_i32(buffer, index).wrapping_add(delta);
        Self::write_i32(buffer, index, value);
    }

    /// Per-(frequency, element) sums of the biased nibbles over the
    /// accumulation window, added into the accumulator buffer.
    fn run_offset_accumulate(&mut self, args: StageArgs) -> Result<(), HarnessError> {
        let g = self.geometry;
        let input = std::mem::take(&mut self.buffers[args.input.index()]);
        {
            let accum = &mut self.buffers[args.accum.index()];
            for frequency in 0..g.num_frequencies {
                for element in 0..g.num_elements {
                    let mut sum_re = 0i32;
                    let mut sum_im = 0i32;
                    for timestep in 0..g.num_timesamples {
                        let byte = input
                            [(timestep * g.num_frequencies + frequency) * g.num_elements + element];
                        let (re, im) = biased_parts(byte);
                        sum_re += i32::from(re);
                        sum_im += i32::from(im);
                    }
                    let base = (frequency * g.num_elements + element) * 2;
                    Self::add_i32(accum, base, sum_re);
                    Self::add_i32(accum, base + 1, sum_im);
                }
            }
        }
        self.buffers[args.input.index()] = input;
        Ok(())
    }

    /// Assign the bias-correction seed of every tile entry. Expanding
    /// the biased products shows the cross terms depend only on the
    /// per-element sums, so subtracting them up front lets the product
    /// stage accumulate raw biased nibbles:
    ///
    ///   re seed = bias^2 * 2T - bias * (Sx_re + Sx_im + Sy_re + Sy_im)
    ///   im seed = bias * (Sx_im + Sy_re - Sx_re - Sy_im)
    ///
    /// with S the biased per-element sums and the im seed negated under
    /// the nonstandard convention.
    fn run_preseed(&mut self, args: StageArgs) -> Result<(), HarnessError> {
        let g = self.geometry;
        let bias = SAMPLE_BIAS;
        let window = g.num_timesamples as i32;
        let grid_width = g.num_elements / g.block_side;
        let tile_len = g.block_side * g.block_side * 2;
        let accum = std::mem::take(&mut self.buffers[args.accum.index()]);
        {
            let output = &mut self.buffers[args.output.index()];
            for frequency in 0..g.num_frequencies {
                for block_id in 0..g.num_blocks {
                    let (block_y, block_x) = block_id_to_coordinates(block_id, grid_width);
                    for y_local in 0..g.block_side {
                        let y_global = block_y * g.block_side + y_local;
                        for x_local in 0..g.block_side {
                            let x_global = block_x * g.block_side + x_local;
                            let x_base = (frequency * g.num_elements + x_global) * 2;
                            let y_base = (frequency * g.num_elements + y_global) * 2;
                            let sx_re = Self::read_i32(&accum, x_base);
                            let sx_im = Self::read_i32(&accum, x_base + 1);
                            let sy_re = Self::read_i32(&accum, y_base);
                            let sy_im = Self::read_i32(&accum, y_base + 1);

                            let seed_re = bias * bias * 2 * window
                                - bias * (sx_re + sx_im + sy_re + sy_im);
                            let mut seed_im = bias * (sx_im + sy_re - sx_re - sy_im);
                            if self.convention == Convention::Nonstandard {
                                seed_im = -seed_im;
                            }

                            let address = (frequency * g.num_blocks + block_id) * tile_len
                                + (y_local * g.block_side + x_local) * 2;
                            Self::write_i32(output, address, seed_re);
                            Self::write_i32(output, address + 1, seed_im);
                        }
                    }
                }
            }
        }
        self.buffers[args.accum.index()] = accum;
        Ok(())
    }

    /// Accumulate the biased pairwise products into the seeded tiles.
    /// Diagonal tiles are computed as full squares; readout skips the
    /// below-diagonal entries.
    fn run_correlate(&mut self, args: StageArgs) -> Result<(), HarnessError> {
        let g = self.geometry;
        let grid_width = g.num_elements / g.block_side;
        let tile_len = g.block_side * g.block_side * 2;
        let input = std::mem::take(&mut self.buffers[args.input.index()]);
        {
            let output = &mut self.buffers[args.output.index()];
            for frequency in 0..g.num_frequencies {
                for block_id in 0..g.num_blocks {
                    let (block_y, block_x) = block_id_to_coordinates(block_id, grid_width);
                    for y_local in 0..g.block_side {
                        let y_global = block_y * g.block_side + y_local;
                        for x_local in 0..g.block_side {
                            let x_global = block_x * g.block_side + x_local;
                            let mut acc_re = 0i32;
                            let mut acc_im = 0i32;
                            for timestep in 0..g.num_timesamples {
                                let row =
                                    (timestep * g.num_frequencies + frequency) * g.num_elements;
                                let (x_re, x_im) = biased_parts(input[row + x_global]);
                                let (y_re, y_im) = biased_parts(input[row + y_global]);
                                let (x_re, x_im) = (i32::from(x_re), i32::from(x_im));
                                let (y_re, y_im) = (i32::from(y_re), i32::from(y_im));
                                acc_re += x_re * y_re + x_im * y_im;
                                acc_im += self.convention.imag_term(x_re, x_im, y_re, y_im);
                            }
                            let address = (frequency * g.num_blocks + block_id) * tile_len
                                + (y_local * g.block_side + x_local) * 2;
                            Self::add_i32(output, address, acc_re);
                            Self::add_i32(output, address + 1, acc_im);
                        }
                    }
                }
            }
        }
        self.buffers[args.input.index()] = input;
        Ok(())
    }
}

impl CorrelatorBackend for SoftwareBackend {
    fn alloc_buffer(&mut self, byte_count: usize) -> Result<BufferId, HarnessError> {
        if byte_count == 0 {
            return Err(BackendError::BufferAllocationFailed { byte_count }.into());
        }
        self.buffers.push(vec![0u8; byte_count]);
        Ok(BufferId(self.buffers.len() - 1))
    }

    fn submit_transfer(
        &mut self,
        queue: QueueId,
        destination: BufferId,
        source: &[u8],
        wait_on: Option<CompletionHandle>,
    ) -> Result<CompletionHandle, HarnessError> {
        self.check_buffer(destination)?;
        let waited_on = self.check_wait(&wait_on)?;
        let expected = self.buffers[destination.index()].len();
        if source.len() != expected {
            return Err(BackendError::TransferSizeMismatch {
                buffer: destination.index(),
                expected,
                actual: source.len(),
            }
            .into());
        }
        self.buffers[destination.index()].copy_from_slice(source);
        Ok(self.record(queue, SubmissionKind::Transfer { destination }, waited_on))
    }

    fn submit_compute(
        &mut self,
        queue: QueueId,
        stage: ComputeStage,
        args: StageArgs,
        global_extent: [usize; 3],
        local_extent: [usize; 3],
        wait_on: Option<CompletionHandle>,
    ) -> Result<CompletionHandle, HarnessError> {
        self.check_buffer(args.input)?;
        self.check_buffer(args.accum)?;
        self.check_buffer(args.output)?;
        let waited_on = self.check_wait(&wait_on)?;
        if global_extent.iter().any(|&extent| extent == 0)
            || local_extent.iter().any(|&extent| extent == 0)
        {
            return Err(BackendError::InvalidWorkSize {
                stage: stage.as_str(),
            }
            .into());
        }
        match stage {
            ComputeStage::OffsetAccumulate => self.run_offset_accumulate(args)?,
            ComputeStage::Preseed => self.run_preseed(args)?,
            ComputeStage::Correlate => self.run_correlate(args)?,
        }
        Ok(self.record(queue, SubmissionKind::Compute { stage }, waited_on))
    }

    fn wait_all(&mut self, handles: Vec<CompletionHandle>) -> Result<(), HarnessError> {
        for handle in handles {
            if handle.id() >= self.next_submission {
                return Err(BackendError::UnknownHandle(handle.id()).into());
            }
        }
        Ok(())
    }

    fn drain(&mut self) -> Result<(), HarnessError> {
        Ok(())
    }

    fn read_back(&mut self, buffer: BufferId) -> Result<Vec<i32>, HarnessError> {
        self.check_buffer(buffer)?;
        let bytes = &self.buffers[buffer.index()];
        Ok(bytes
            .chunks_exact(4)
            .map(|chunk| i32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect())
    }

    fn device_throughput_hint(&self) -> (u32, u32) {
        (MODEL_CLOCK_MHZ, MODEL_COMPUTE_UNITS)
    }
}
