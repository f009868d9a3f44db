//! Concurrent media downloading.

pub mod batch;

pub use batch::{
    download_media_batch, MediaBatchOutcome, OversizedMedia, DEFAULT_CONCURRENT_DOWNLOADS,
    FETCH_CHUNK_SIZE, MAX_MEDIA_BYTES,
};
