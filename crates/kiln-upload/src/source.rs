//! Upload sources.
//!
//! A source is either a locally picked file or an in-memory buffer (small
//! captures, tests). Chunk reads are offset-addressed so a resumed session
//! can start mid-file.

use std::io::SeekFrom;
use std::path::PathBuf;

use bytes::Bytes;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

use crate::error::UploadError;

/// A local file or in-memory buffer to upload.
#[derive(Clone, Debug)]
pub enum UploadSource {
    File { path: PathBuf },
    Bytes { name: String, data: Bytes },
}

impl UploadSource {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File { path: path.into() }
    }

    pub fn bytes(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self::Bytes {
            name: name.into(),
            data: data.into(),
        }
    }

    /// Display name of the source; feeds the fingerprint and the extension
    /// fallback of content-type sniffing.
    pub fn name(&self) -> String {
        match self {
            Self::File { path } => path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| "upload".to_string()),
            Self::Bytes { name, .. } => name.clone(),
        }
    }

    /// Total size in bytes.
    pub async fn len(&self) -> Result<u64, UploadError> {
        match self {
            Self::File { path } => Ok(tokio::fs::metadata(path).await?.len()),
            Self::Bytes { data, .. } => Ok(data.len() as u64),
        }
    }

    pub async fn is_empty(&self) -> Result<bool, UploadError> {
        Ok(self.len().await? == 0)
    }

    /// Read up to `len` bytes starting at `offset`. Returns fewer bytes
    /// only at end of file.
    pub async fn read_chunk(&self, offset: u64, len: usize) -> Result<Bytes, UploadError> {
        match self {
            Self::File { path } => {
                let mut file = tokio::fs::File::open(path).await?;
                file.seek(SeekFrom::Start(offset)).await?;
                let mut buffer = vec![0u8; len];
                let mut filled = 0;
                while filled < len {
                    let read = file.read(&mut buffer[filled..]).await?;
                    if read == 0 {
                        break;
                    }
                    filled += read;
                }
                buffer.truncate(filled);
                Ok(Bytes::from(buffer))
            }
            Self::Bytes { data, .. } => {
                let start = (offset as usize).min(data.len());
                let end = start.saturating_add(len).min(data.len());
                Ok(data.slice(start..end))
            }
        }
    }

    /// Leading bytes for content-type sniffing.
    pub async fn head(&self, len: usize) -> Result<Bytes, UploadError> {
        self.read_chunk(0, len).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn bytes_source_chunks_by_offset() {
        let source = UploadSource::bytes("clip.bin", vec![0u8, 1, 2, 3, 4, 5, 6, 7]);

        assert_eq!(source.len().await.unwrap(), 8);
        assert_eq!(source.read_chunk(2, 3).await.unwrap().as_ref(), &[2, 3, 4]);
        assert_eq!(source.read_chunk(6, 10).await.unwrap().as_ref(), &[6, 7]);
        assert!(source.read_chunk(20, 4).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn file_source_chunks_by_offset() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"0123456789").unwrap();
        let source = UploadSource::file(file.path());

        assert_eq!(source.len().await.unwrap(), 10);
        assert_eq!(source.read_chunk(3, 4).await.unwrap().as_ref(), b"3456");
        assert_eq!(source.read_chunk(8, 4).await.unwrap().as_ref(), b"89");
    }

    #[tokio::test]
    async fn file_source_name_is_the_file_name() {
        let source = UploadSource::file("/tmp/somewhere/take1.mp4");
        assert_eq!(source.name(), "take1.mp4");
    }
}
