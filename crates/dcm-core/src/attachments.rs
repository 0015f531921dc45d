use std::io::Write;
use std::path::Path;
use std::time::Duration;

use tempfile::NamedTempFile;

use crate::{errors::Error, Result};

/// Downloads attachment bodies to transient local files for re-upload.
///
/// Attachment URLs are plain CDN links and need no authentication, so the
/// relay keeps its own client instead of going through the chat port. It
/// never retries; any failure propagates with the operation tag.
pub struct AttachmentRelay {
    http: reqwest::Client,
}

impl AttachmentRelay {
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::transport("attachment client build", e))?;
        Ok(Self { http })
    }

    /// Fetch `url` into a freshly created, uniquely named temp file.
    ///
    /// The returned guard owns the file: its content is readable from the
    /// start via `path()`, and dropping it removes the local copy whatever
    /// the upload outcome.
    pub async fn fetch(&self, url: &str) -> Result<TempAttachment> {
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| Error::transport("attachment download", e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::transport(
                "attachment download",
                format!("unexpected status {status}"),
            ));
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| Error::transport("attachment download", e))?;

        let mut file = tempfile::Builder::new().prefix("attachment-").tempfile()?;
        file.write_all(&bytes)?;

        Ok(TempAttachment { file })
    }
}

/// A downloaded attachment staged on local disk.
///
/// Removal on drop is best-effort; a failed delete never fails the pipeline.
pub struct TempAttachment {
    file: NamedTempFile,
}

impl TempAttachment {
    pub fn path(&self) -> &Path {
        self.file.path()
    }
}
