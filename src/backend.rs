use crate::error::HarnessError;

/// Identifier of a device-side buffer owned by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId(pub(crate) usize);

impl BufferId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// The two logical command streams: host<->device transfers and the
/// compute-stage chain. Within one stream nothing is ordered unless a
/// wait handle says so; across streams nothing is ordered at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueId {
    Transfer,
    Compute,
}

/// The three compute stages chained per accumulation slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComputeStage {
    /// Sum the packed inputs per (frequency, element) over the window.
    OffsetAccumulate,
    /// Seed the output tiles with the bias-correction terms.
    Preseed,
    /// Accumulate pairwise products into the output tiles.
    Correlate,
}

impl ComputeStage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OffsetAccumulate => "offset_accumulate",
            Self::Preseed => "preseed",
            Self::Correlate => "correlate",
        }
    }
}

/// Buffer bindings for one compute submission.
#[derive(Debug, Clone, Copy)]
pub struct StageArgs {
    pub input: BufferId,
    pub accum: BufferId,
    pub output: BufferId,
}

/// Completion token for one asynchronous submission. Move-only: waiting
/// on an operation, or chaining another submission behind it, consumes
/// the handle.
#[derive(Debug, PartialEq, Eq)]
pub struct CompletionHandle(pub(crate) u64);

impl CompletionHandle {
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// What a logged submission was.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionKind {
    Transfer { destination: BufferId },
    Compute { stage: ComputeStage },
}

/// One entry of the backend's submission log. The log exists so ordering
/// invariants (which submission waited on which) can be checked after a
/// run; it is bookkeeping, not execution state.
#[derive(Debug, Clone, Copy)]
pub struct SubmissionRecord {
    pub id: u64,
    pub queue: QueueId,
    pub kind: SubmissionKind,
    pub waited_on: Option<u64>,
}

/// The compute-backend contract the pipeline scheduler drives. All
/// submissions are non-blocking from the caller's point of view and
/// return a completion handle; dependencies are expressed by handing a
/// prior handle back as `wait_on`.
pub trait CorrelatorBackend {
    /// Allocate a zero-initialized device buffer.
    fn alloc_buffer(&mut self, byte_count: usize) -> Result<BufferId, HarnessError>;

    /// Enqueue a host-to-device copy of `source` into `destination`.
    fn submit_transfer(
        &mut self,
        queue: QueueId,
        destination: BufferId,
        source: &[u8],
        wait_on: Option<CompletionHandle>,
    ) -> Result<CompletionHandle, HarnessError>;

    /// Enqueue one compute stage over the given work extents.
    fn submit_compute(
        &mut self,
        queue: QueueId,
        stage: ComputeStage,
        args: StageArgs,
        global_extent: [usize; 3],
        local_extent: [usize; 3],
        wait_on: Option<CompletionHandle>,
    ) -> Result<CompletionHandle, HarnessError>;

    /// Block until every listed operation has completed, consuming the
    /// handles.
    fn wait_all(&mut self, handles: Vec<CompletionHandle>) -> Result<(), HarnessError>;

    /// Block until both command streams are empty. Used for the periodic
    /// bounded sync and the final drain, whose dependency handles have
    /// already been consumed by the chain.
    fn drain(&mut self) -> Result<(), HarnessError>;

    /// Blocking read of a device buffer as little-endian i32 values.
    fn read_back(&mut self, buffer: BufferId) -> Result<Vec<i32>, HarnessError>;

    /// (core clock in MHz, compute unit count); for reporting only.
    fn device_throughput_hint(&self) -> (u32, u32);
}
