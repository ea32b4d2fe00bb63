//! Size-bounded ingestion of untrusted upload payloads.
//!
//! Both readers consume any [`AsyncRead`] source in fixed-size chunks and
//! enforce a hard byte ceiling supplied per call: the running total is
//! checked after every chunk and the first chunk that pushes it past the
//! ceiling aborts the read with [`GjallarError::UploadTooLarge`]. No
//! partial result is ever observable.
//!
//! [`read_limited`] materializes the payload in memory; [`spool_to_temp`]
//! streams it to a named temporary file for payloads that downstream
//! decoders want on disk. The temp file is removed on every failure path —
//! including the caller dropping the future mid-read — and ownership of
//! the file passes to the caller only on success.
//!
//! HTTP transports hand bodies over as byte streams; adapt those to
//! [`AsyncRead`] at the boundary (e.g. `tokio_util::io::StreamReader`).

use std::path::PathBuf;

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};

use crate::telemetry;
use crate::{GjallarError, Result};

/// Default streaming granularity: 1 MiB per read.
///
/// Purely a throughput knob; correctness never depends on how the payload
/// is chunked.
pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;

/// Read an entire payload into memory, enforcing `max_size_bytes`.
///
/// Returns the exact payload bytes on success. The source is consumed;
/// one reader per call.
pub async fn read_limited<R>(mut source: R, max_size_bytes: u64, chunk_size: usize) -> Result<Bytes>
where
    R: AsyncRead + Unpin,
{
    // A zero-length buffer would make every read look like end-of-stream.
    let mut buf = vec![0u8; chunk_size.max(1)];
    let mut payload = BytesMut::new();
    let mut total: u64 = 0;

    loop {
        let n = source.read(&mut buf).await?;
        if n == 0 {
            break;
        }

        total += n as u64;
        if total > max_size_bytes {
            metrics::counter!(telemetry::UPLOADS_REJECTED_TOTAL).increment(1);
            return Err(GjallarError::UploadTooLarge {
                limit_bytes: max_size_bytes,
            });
        }

        payload.extend_from_slice(&buf[..n]);
    }

    Ok(payload.freeze())
}

/// Stream a payload into a temporary file, enforcing `max_size_bytes`.
///
/// The file is created with the given `suffix` in the system temp
/// directory. On success the caller owns the returned path and is
/// responsible for deleting it; on any failure the partially written file
/// is already gone.
pub async fn spool_to_temp<R>(
    mut source: R,
    suffix: &str,
    max_size_bytes: u64,
    chunk_size: usize,
) -> Result<PathBuf>
where
    R: AsyncRead + Unpin,
{
    // NamedTempFile unlinks on drop, which covers every early return below
    // as well as cancellation of this future.
    let tmp = tempfile::Builder::new().suffix(suffix).tempfile()?;
    let mut file = tokio::fs::File::from_std(tmp.as_file().try_clone()?);

    let mut buf = vec![0u8; chunk_size.max(1)];
    let mut total: u64 = 0;

    loop {
        let n = source.read(&mut buf).await?;
        if n == 0 {
            break;
        }

        total += n as u64;
        if total > max_size_bytes {
            metrics::counter!(telemetry::UPLOADS_REJECTED_TOTAL).increment(1);
            return Err(GjallarError::UploadTooLarge {
                limit_bytes: max_size_bytes,
            });
        }

        file.write_all(&buf[..n]).await?;
    }

    file.flush().await?;
    drop(file);

    let (_file, path) = tmp.keep().map_err(|e| GjallarError::Io(e.error))?;
    Ok(path)
}
