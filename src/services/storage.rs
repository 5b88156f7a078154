use std::io;
use std::path::{Path, PathBuf};

use uuid::Uuid;

/// Filesystem layout for per-job artifacts under one storage root:
/// `<root>/jobs/<job_id>/source.<ext>` for the uploaded video and
/// `<root>/jobs/<job_id>/snapshots/` for extracted frames.
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn job_dir(&self, job_id: Uuid) -> PathBuf {
        self.root.join("jobs").join(job_id.to_string())
    }

    pub fn snapshots_dir(&self, job_id: Uuid) -> PathBuf {
        self.job_dir(job_id).join("snapshots")
    }

    /// Write an uploaded video, keeping the original file extension
    /// (ffmpeg sniffs the container but the extension helps inspection).
    pub async fn save_video(
        &self,
        job_id: Uuid,
        original_name: &str,
        data: &[u8],
    ) -> io::Result<PathBuf> {
        let ext = Path::new(original_name)
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_else(|| "mp4".to_string());

        let dir = self.job_dir(job_id);
        tokio::fs::create_dir_all(&dir).await?;
        let path = dir.join(format!("source.{ext}"));
        tokio::fs::write(&path, data).await?;
        Ok(path)
    }

    /// Remove everything stored for a job. Missing directory is not an error.
    pub async fn remove_job(&self, job_id: Uuid) -> io::Result<()> {
        match tokio::fs::remove_dir_all(self.job_dir(job_id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Map an absolute artifact path to its `/storage/...` URL, or None for
    /// paths outside the root.
    pub fn public_url(&self, uri: &str) -> Option<String> {
        Path::new(uri)
            .strip_prefix(&self.root)
            .ok()
            .map(|rel| format!("/storage/{}", rel.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_url_strips_root() {
        let storage = LocalStorage::new("/var/lib/scenecut");
        let url = storage.public_url("/var/lib/scenecut/jobs/abc/snapshots/000001.jpg");
        assert_eq!(url.as_deref(), Some("/storage/jobs/abc/snapshots/000001.jpg"));
    }

    #[test]
    fn public_url_rejects_paths_outside_root() {
        let storage = LocalStorage::new("/var/lib/scenecut");
        assert_eq!(storage.public_url("/etc/passwd"), None);
    }

    #[tokio::test]
    async fn save_video_keeps_extension_and_defaults_to_mp4() {
        let tmp = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(tmp.path());
        let job_id = Uuid::new_v4();

        let path = storage.save_video(job_id, "clip.webm", b"data").await.unwrap();
        assert!(path.ends_with("source.webm"));

        let path = storage.save_video(job_id, "noext", b"data").await.unwrap();
        assert!(path.ends_with("source.mp4"));
    }

    #[tokio::test]
    async fn remove_job_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(tmp.path());
        let job_id = Uuid::new_v4();

        storage.save_video(job_id, "a.mp4", b"data").await.unwrap();
        storage.remove_job(job_id).await.unwrap();
        // Second removal finds nothing and still succeeds.
        storage.remove_job(job_id).await.unwrap();
    }
}
