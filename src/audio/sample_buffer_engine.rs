use crate::audio::constants::INGEST_CAPACITY_FRAMES;
use atomic_float::AtomicF32;
use dasp::sample::{Sample, ToSample};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Interleaved stereo ring shared by one writer (audio thread) and one reader
/// (draw thread). Every slot is an atomic so a torn read at the wrap boundary
/// shows up as a stale sample, never as a data race.
struct IngestRing {
    // [L0, R0, L1, R1, ...], capacity * 2 slots
    samples: Box<[AtomicF32]>,
    // Next frame to be written, always < capacity
    write_frame: AtomicUsize,
    capacity: usize,
}

impl IngestRing {
    fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let samples = (0..capacity * 2)
            .map(|_| AtomicF32::new(0.0))
            .collect::<Vec<_>>()
            .into_boxed_slice();

        Self {
            samples,
            write_frame: AtomicUsize::new(0),
            capacity,
        }
    }

    #[inline]
    fn push(&self, left: f32, right: f32) {
        let frame = self.write_frame.load(Ordering::Relaxed);
        self.samples[frame * 2].store(left, Ordering::Relaxed);
        self.samples[frame * 2 + 1].store(right, Ordering::Relaxed);
        self.write_frame
            .store((frame + 1) % self.capacity, Ordering::Release);
    }
}

/// Audio-thread handle: appends frames, never blocks, never allocates
#[derive(Clone)]
pub struct SampleIngest {
    ring: Arc<IngestRing>,
}

/// Draw-thread handle: reads frames relative to the current write cursor
#[derive(Clone)]
pub struct IngestReader {
    ring: Arc<IngestRing>,
}

/// Create a connected (writer, reader) pair with the default capacity
pub fn ingest_channel() -> (SampleIngest, IngestReader) {
    ingest_channel_with_capacity(INGEST_CAPACITY_FRAMES)
}

/// Create a connected pair holding `capacity` stereo frames
pub fn ingest_channel_with_capacity(capacity: usize) -> (SampleIngest, IngestReader) {
    let ring = Arc::new(IngestRing::new(capacity));
    (
        SampleIngest { ring: ring.clone() },
        IngestReader { ring },
    )
}

impl SampleIngest {
    // Called from audio thread - NO ALLOCATIONS!
    #[inline]
    pub fn push_sample(&self, left: f32, right: f32) {
        self.ring.push(left, right);
    }

    /// Push an interleaved stereo host buffer of any sample format.
    /// A trailing half frame is dropped.
    pub fn push_interleaved<S>(&self, samples: &[S])
    where
        S: Sample + ToSample<f32>,
    {
        for frame in samples.chunks_exact(2) {
            self.ring
                .push(frame[0].to_sample::<f32>(), frame[1].to_sample::<f32>());
        }
    }

    pub fn capacity(&self) -> usize {
        self.ring.capacity
    }
}

impl IngestReader {
    pub fn capacity(&self) -> usize {
        self.ring.capacity
    }

    /// Snapshot of the write cursor, taken once per analysis cycle
    #[inline]
    pub fn write_cursor(&self) -> usize {
        self.ring.write_frame.load(Ordering::Acquire)
    }

    /// Frame located `frames_back` frames behind `cursor` (1 = newest)
    #[inline]
    pub fn frame_behind(&self, cursor: usize, frames_back: usize) -> (f32, f32) {
        let capacity = self.ring.capacity;
        let index = (cursor % capacity + capacity - frames_back % capacity) % capacity;
        (
            self.ring.samples[index * 2].load(Ordering::Relaxed),
            self.ring.samples[index * 2 + 1].load(Ordering::Relaxed),
        )
    }
}
