use crate::client::Client;
use crate::error::Result as NexusResult;

use either::Either;

use serde::Deserialize;

/// A mod category of a [`Game`].
#[derive(Debug, PartialEq, Eq, Deserialize, Clone)]
#[non_exhaustive]
pub struct Category {
    pub category_id: u64,
    pub name: String,
    /// `Left(false)` for top-level categories, `Right(id)` of the parent category otherwise.
    #[serde(with = "either::serde_untagged")]
    pub parent_category: Either<bool, u64>,
}

impl Category {
    /// ID of the parent category, if any.
    pub fn parent_id(&self) -> Option<u64> {
        self.parent_category.right()
    }
}

/// A game supported by Nexus Mods.
#[derive(Debug, PartialEq, Eq, Deserialize, Clone)]
#[non_exhaustive]
pub struct Game {
    pub id: u64,
    pub name: String,
    pub forum_url: String,
    pub nexusmods_url: String,
    pub genre: String,
    pub file_count: u64,
    pub downloads: u64,
    pub domain_name: String,
    pub approved_date: Option<i64>,
    pub file_views: u64,
    pub authors: u64,
    pub file_endorsements: u64,
    pub mods: u64,
    pub categories: Vec<Category>,
}

impl Client {
    /// Returns every game supported by Nexus Mods.
    pub async fn get_games(&self) -> NexusResult<Vec<Game>> {
        self.get_json("/games.json", None).await
    }

    /// Returns the game this client works with.
    pub async fn get_game(&self) -> NexusResult<Game> {
        self.get_json(&format!("{}.json", self.game_endpoint("")), None)
            .await
    }
}
