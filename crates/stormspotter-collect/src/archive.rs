//! Archive packaging for a finished collection run (§4G, §6: "Archive the
//! directory as `<dir>.tar.xz`, delete the directory").

use std::fs::File;
use std::path::{Path, PathBuf};

use tar::Builder;
use xz2::write::XzEncoder;

/// Packages `output_dir` into `<output_dir>.tar.xz` next to it, then
/// removes `output_dir`. Runs on a blocking thread since both the tar
/// walk and xz compression are synchronous (§5: ambient archive packaging
/// is not part of the cooperative event loop's I/O).
///
/// # Errors
/// Returns an error if the directory cannot be read, the archive cannot be
/// written, or the original directory cannot be removed afterward.
pub async fn archive_and_cleanup(output_dir: PathBuf) -> anyhow::Result<PathBuf> {
    tokio::task::spawn_blocking(move || {
        let archive_path = archive_path_for(&output_dir);
        let archive_file = File::create(&archive_path)?;
        let encoder = XzEncoder::new(archive_file, 6);
        let mut tar = Builder::new(encoder);

        let dir_name = output_dir
            .file_name()
            .ok_or_else(|| anyhow::anyhow!("output directory has no file name: {}", output_dir.display()))?;
        tar.append_dir_all(dir_name, &output_dir)?;
        tar.into_inner()?.finish()?;

        std::fs::remove_dir_all(&output_dir)?;
        Ok(archive_path)
    })
    .await?
}

fn archive_path_for(output_dir: &Path) -> PathBuf {
    let mut archive_name = output_dir
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    archive_name.push(".tar.xz");
    output_dir
        .parent()
        .map(|p| p.join(&archive_name))
        .unwrap_or_else(|| PathBuf::from(archive_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn archive_path_appends_tar_xz_suffix() {
        let path = archive_path_for(Path::new("/tmp/results_20260801-120000"));
        assert_eq!(path, PathBuf::from("/tmp/results_20260801-120000.tar.xz"));
    }

    #[tokio::test]
    async fn archive_and_cleanup_produces_archive_and_removes_directory() {
        let base = tempfile::tempdir().unwrap();
        let output_dir = base.path().join("results_test");
        std::fs::create_dir_all(&output_dir).unwrap();
        std::fs::write(output_dir.join("tenant.sqlite"), b"fake").unwrap();

        let archive = archive_and_cleanup(output_dir.clone()).await.unwrap();
        assert!(archive.exists());
        assert!(!output_dir.exists());
    }
}
