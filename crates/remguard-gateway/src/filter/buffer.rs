use async_trait::async_trait;

use remguard_core::error::{GuardError, Result};

/// Reports how large a buffer becomes once decompressed.
#[async_trait]
pub trait BufferInspector: Send + Sync {
    async fn decompressed_size(&self, buf: &[u8]) -> Result<usize>;
}

/// Reads the size from a little-endian `u32` header, the framing used by
/// the bundled clients for compressed payloads.
#[derive(Debug, Default)]
pub struct LengthPrefixedInspector;

#[async_trait]
impl BufferInspector for LengthPrefixedInspector {
    async fn decompressed_size(&self, buf: &[u8]) -> Result<usize> {
        let header: [u8; 4] = buf
            .get(..4)
            .and_then(|h| h.try_into().ok())
            .ok_or_else(|| GuardError::Filter("buffer shorter than size header".into()))?;
        Ok(u32::from_le_bytes(header) as usize)
    }
}
