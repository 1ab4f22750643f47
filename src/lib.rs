mod backend;
mod compare;
mod config;
mod error;
mod generator;
mod layout;
mod pinned;
mod pipeline;
mod reference;
mod report;
mod sample;
mod software;

pub use crate::backend::{
    BufferId, CompletionHandle, ComputeStage, CorrelatorBackend, QueueId, StageArgs,
    SubmissionKind, SubmissionRecord,
};
pub use crate::compare::{compare, ComparisonReport, MatrixLayout};
pub use crate::config::{
    KernelGeometry, KernelVariant, RunConfig, DEFAULT_FRAME_FREQUENCIES, DEFAULT_ITERATIONS,
    DEFAULT_NUM_ELEMENTS, DEFAULT_NUM_FREQUENCIES, DEFAULT_NUM_TIMESAMPLES, DEFAULT_SEED,
};
pub use crate::error::{BackendError, HarnessError};
pub use crate::generator::{
    dump_samples, generate, GeneratorMode, GeneratorParams, ALL_FREQUENCIES,
};
pub use crate::layout::{
    block_count, block_id_to_coordinates, compact_padded_output, tile_to_dense, tile_to_triangle,
    triangle_with_frequency_padding, BLOCK_SIDE,
};
pub use crate::pinned::PinnedBuffer;
pub use crate::pipeline::{CorrelatorPipeline, PipelineOutput, NUM_SLOTS, SYNC_INTERVAL};
pub use crate::reference::{
    correlate_dense, correlate_triangle, dense_len, generate_and_correlate_dense,
    generate_and_correlate_triangle, triangle_len, Convention,
};
pub use crate::report::{
    card_tflops, print_comparison_summary, print_kernel_parameters, print_reference_timing,
    print_run_banner, print_throughput, print_unverified_notice,
};
pub use crate::sample::{
    biased_parts, offset_and_clip, pack_sample, unpack_sample, SampleCube, NIBBLE_MAX, NIBBLE_MIN,
    SAMPLE_BIAS,
};
pub use crate::software::SoftwareBackend;
