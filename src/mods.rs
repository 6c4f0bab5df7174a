use crate::client::Client;
use crate::error::Result as NexusResult;
use crate::file::File;

use chrono::{DateTime, Utc};

use serde::{Deserialize, Serialize};
use serde_json::json;

use std::collections::BTreeMap;

/// Time window accepted by [`Client::get_mod_updates`].
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize, Clone, Copy)]
pub enum UpdatePeriod {
    #[serde(rename = "1d")]
    Day,
    #[serde(rename = "1w")]
    Week,
    #[serde(rename = "1m")]
    Month,
}

/// The uploader of a [`Mod`].
#[derive(Debug, PartialEq, Eq, Deserialize, Clone)]
#[non_exhaustive]
pub struct ModUser {
    pub member_id: u64,
    pub member_group_id: u64,
    pub name: String,
}

/// Whether the current user endorsed a [`Mod`].
#[derive(Debug, PartialEq, Eq, Deserialize, Clone)]
#[non_exhaustive]
pub struct EndorsementRef {
    pub endorse_status: String,
    pub timestamp: Option<String>,
    pub version: Option<String>,
}

/// A mod, as returned by `/games/{game}/mods/{id}.json`.
#[derive(Debug, PartialEq, Eq, Deserialize, Clone)]
#[non_exhaustive]
pub struct Mod {
    /// `None` when the mod is hidden or not published yet, like the summary and description.
    pub name: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub picture_url: Option<String>,
    pub uid: u64,
    pub mod_id: u64,
    pub game_id: u64,
    pub allow_rating: bool,
    pub domain_name: String,
    pub category_id: u64,
    pub version: String,
    pub endorsement_count: u64,
    pub created_timestamp: i64,
    pub created_time: DateTime<Utc>,
    pub updated_timestamp: i64,
    pub updated_time: DateTime<Utc>,
    pub author: String,
    pub uploaded_by: String,
    pub uploaded_users_profile_url: String,
    pub contains_adult_content: bool,
    pub status: String,
    pub available: bool,
    pub user: Option<ModUser>,
    pub endorsement: Option<EndorsementRef>,
}

/// Last activity on a mod, as listed by [`Client::get_mod_updates`].
#[derive(Debug, PartialEq, Eq, Deserialize, Clone)]
#[non_exhaustive]
pub struct ModUpdate {
    pub mod_id: u64,
    pub latest_file_update: i64,
    pub latest_mod_activity: i64,
}

/// Result of endorsing or abstaining from a mod.
#[derive(Debug, PartialEq, Eq, Deserialize, Clone)]
#[non_exhaustive]
pub struct Status {
    pub message: String,
    pub status: String,
}

#[derive(Deserialize)]
struct SearchResult {
    #[serde(rename = "mod")]
    mod_: Mod,
    file_details: File,
}

impl Client {
    /// Returns the mods updated during the given period, with the time of their last update.
    pub async fn get_mod_updates(&self, period: UpdatePeriod) -> NexusResult<Vec<ModUpdate>> {
        self.get_json(
            &self.game_endpoint("/mods/updated.json"),
            Some(&json!({ "period": period })),
        )
        .await
    }

    /// Returns the changelogs of a mod, indexed by version.
    pub async fn get_mod_changelogs(
        &self,
        mod_id: u64,
    ) -> NexusResult<BTreeMap<String, Vec<String>>> {
        self.get_json(
            &self.game_endpoint(&format!("/mods/{}/changelogs.json", mod_id)),
            None,
        )
        .await
    }

    /// Returns the 10 latest added mods.
    pub async fn get_latest_added_mods(&self) -> NexusResult<Vec<Mod>> {
        self.get_json(&self.game_endpoint("/mods/latest_added.json"), None)
            .await
    }

    /// Returns the 10 latest updated mods.
    pub async fn get_latest_updated_mods(&self) -> NexusResult<Vec<Mod>> {
        self.get_json(&self.game_endpoint("/mods/latest_updated.json"), None)
            .await
    }

    /// Returns 10 trending mods.
    pub async fn get_trending_mods(&self) -> NexusResult<Vec<Mod>> {
        self.get_json(&self.game_endpoint("/mods/trending.json"), None)
            .await
    }

    /// Returns the mod with the given ID.
    ///
    /// ```no_run
    /// # use nexusmods::client::Client;
    /// # #[tokio::main]
    /// # async fn main() -> nexusmods::error::Result<()> {
    /// let client = Client::new("MY_API_KEY", "morrowind")?;
    /// client.open().await?;
    ///
    /// let m = client.get_mod(49565).await?;
    /// assert_eq!(m.mod_id, 49565);
    ///
    /// client.close().await
    /// # }
    /// ```
    pub async fn get_mod(&self, mod_id: u64) -> NexusResult<Mod> {
        self.get_json(&self.game_endpoint(&format!("/mods/{}.json", mod_id)), None)
            .await
    }

    /// Returns the mod files matching the given MD5 hash, along with the mod they belong to.
    pub async fn md5_search(&self, md5_hash: &str) -> NexusResult<Vec<(Mod, File)>> {
        let results: Vec<SearchResult> = self
            .get_json(
                &self.game_endpoint(&format!(
                    "/mods/md5_search/{}.json",
                    urlencoding::encode(md5_hash)
                )),
                None,
            )
            .await?;

        Ok(results
            .into_iter()
            .map(|r| (r.mod_, r.file_details))
            .collect())
    }

    /// Endorse a mod if `endorsed` is true, abstain from endorsing it otherwise.
    pub async fn set_endorsed(
        &self,
        mod_id: u64,
        version: &str,
        endorsed: bool,
    ) -> NexusResult<Status> {
        let action = if endorsed { "endorse" } else { "abstain" };

        self.post_json(
            &self.game_endpoint(&format!("/mods/{}/{}.json", mod_id, action)),
            Some(&json!({ "version": version })),
        )
        .await
    }
}
