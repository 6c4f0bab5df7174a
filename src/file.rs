use crate::client::Client;
use crate::error::Result as NexusResult;

use chrono::{DateTime, Utc};

use serde::Deserialize;

/// A file uploaded to a mod page.
#[derive(Debug, PartialEq, Eq, Deserialize, Clone)]
#[non_exhaustive]
pub struct File {
    /// The file ID and the game ID.
    pub id: (u64, u64),
    pub uid: u64,
    pub file_id: u64,
    pub name: String,
    pub version: String,
    pub category_id: u64,
    pub category_name: Option<String>,
    pub is_primary: bool,
    pub size: u64,
    #[serde(default)]
    pub size_in_bytes: Option<u64>,
    pub file_name: String,
    pub uploaded_timestamp: i64,
    pub uploaded_time: DateTime<Utc>,
    pub mod_version: Option<String>,
    pub external_virus_scan_url: Option<String>,
    pub description: String,
    pub size_kb: u64,
    pub changelog_html: Option<String>,
    /// Link to a listing of the archive contents, see [`Client::get_content_preview`].
    pub content_preview_link: String,
    pub md5: Option<String>,
}

/// Records that a file was replaced by a newer one.
#[derive(Debug, PartialEq, Eq, Deserialize, Clone)]
#[non_exhaustive]
pub struct FileUpdate {
    pub old_file_id: u64,
    pub new_file_id: u64,
    pub old_file_name: String,
    pub new_file_name: String,
    pub uploaded_timestamp: i64,
    pub uploaded_time: DateTime<Utc>,
}

/// A place a file can be downloaded from. Links expire after a while.
#[derive(Debug, PartialEq, Eq, Deserialize, Clone)]
#[non_exhaustive]
pub struct DownloadLink {
    pub name: String,
    pub short_name: String,
    #[serde(rename = "URI")]
    pub uri: String,
}

/// A node of the tree describing the contents of an archive.
#[derive(Debug, PartialEq, Eq, Deserialize, Clone, Default)]
#[non_exhaustive]
pub struct ContentPreview {
    pub path: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub children: Option<Vec<ContentPreview>>,
    /// Human readable size, e.g. `1.2 kB`.
    pub size: Option<String>,
}

impl ContentPreview {
    /// Direct children of this node.
    pub fn children(&self) -> &[ContentPreview] {
        self.children.as_deref().unwrap_or_default()
    }

    /// Every node below this one, depth-first, parents before their children.
    pub fn children_recursive(&self) -> impl Iterator<Item = &ContentPreview> {
        let mut stack: Vec<&ContentPreview> = self.children().iter().rev().collect();

        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.children().iter().rev());
            Some(node)
        })
    }
}

#[derive(Deserialize)]
struct FilesResult {
    files: Vec<File>,
    file_updates: Vec<FileUpdate>,
}

impl Client {
    /// Returns the files of a mod, and the list of which files replaced which.
    pub async fn get_files_and_updates(
        &self,
        mod_id: u64,
    ) -> NexusResult<(Vec<File>, Vec<FileUpdate>)> {
        let result: FilesResult = self
            .get_json(
                &self.game_endpoint(&format!("/mods/{}/files.json", mod_id)),
                None,
            )
            .await?;

        Ok((result.files, result.file_updates))
    }

    /// Returns a single file of a mod.
    pub async fn get_file(&self, mod_id: u64, file_id: u64) -> NexusResult<File> {
        self.get_json(
            &self.game_endpoint(&format!("/mods/{}/files/{}.json", mod_id, file_id)),
            None,
        )
        .await
    }

    /// Generates download links for a file. Feed one of them to [`Client::download`].
    pub async fn get_download_links(
        &self,
        mod_id: u64,
        file_id: u64,
    ) -> NexusResult<Vec<DownloadLink>> {
        self.get_json(
            &self.game_endpoint(&format!(
                "/mods/{}/files/{}/download_link.json",
                mod_id, file_id
            )),
            None,
        )
        .await
    }

    /// Follows a [`File::content_preview_link`].
    pub async fn get_content_preview(
        &self,
        content_preview_link: &str,
    ) -> NexusResult<ContentPreview> {
        self.get_json(content_preview_link, None).await
    }
}
