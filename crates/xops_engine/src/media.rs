use std::path::{Path, PathBuf};
use std::sync::Arc;

use xops_core::media_extension;
use xops_logging::{xops_info, xops_warn};

use crate::fetch::{FetchSettings, Fetcher, ReqwestFetcher};
use crate::persist::AtomicFileWriter;

/// `<status_id>_<NN>.<ext>`, numbered from 1.
pub fn media_file_name(status_id: &str, index: usize, url: &str) -> String {
    let stem = if status_id.is_empty() { "capture" } else { status_id };
    format!("{stem}_{index:02}.{}", media_extension(url))
}

#[derive(Clone)]
pub struct MediaDownloader {
    fetcher: Arc<dyn Fetcher>,
}

impl Default for MediaDownloader {
    fn default() -> Self {
        Self::new(Arc::new(ReqwestFetcher::new(FetchSettings::for_media())))
    }
}

impl MediaDownloader {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self { fetcher }
    }

    /// Downloads each url into `dir`; failed downloads are logged and left out.
    pub async fn download_all(&self, urls: &[String], dir: &Path, status_id: &str) -> Vec<PathBuf> {
        let writer = AtomicFileWriter::new(dir);
        let mut saved = Vec::new();
        for (idx, url) in urls.iter().enumerate() {
            let name = media_file_name(status_id, idx + 1, url);
            let output = match self.fetcher.fetch(url).await {
                Ok(output) => output,
                Err(err) => {
                    xops_warn!("Media download failed for {}: {}", url, err);
                    continue;
                }
            };
            match writer.write(&name, &output.bytes) {
                Ok(path) => saved.push(path),
                Err(err) => xops_warn!("Could not store media {}: {}", name, err),
            }
        }
        xops_info!("Downloaded {}/{} media files", saved.len(), urls.len());
        saved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names_use_format_query_and_fallbacks() {
        assert_eq!(
            media_file_name("42", 3, "https://pbs.twimg.com/media/a?format=png&name=orig"),
            "42_03.png"
        );
        assert_eq!(media_file_name("", 12, "https://pbs.twimg.com/media/a"), "capture_12.jpg");
    }
}
