use crate::client::Client;
use crate::error::Result as NexusResult;

use serde::Deserialize;
use serde_json::json;

/// The owner of the API key.
#[derive(Debug, PartialEq, Eq, Deserialize, Clone)]
#[non_exhaustive]
pub struct User {
    pub user_id: u64,
    pub key: String,
    pub name: String,
    pub email: String,
    pub profile_url: String,
    pub is_premium: bool,
    pub is_supporter: bool,
}

/// A mod the current user is tracking.
#[derive(Debug, PartialEq, Eq, Deserialize, Clone)]
#[non_exhaustive]
pub struct TrackedMod {
    pub mod_id: u64,
    pub domain_name: String,
}

/// An endorsement given by the current user.
#[derive(Debug, PartialEq, Eq, Deserialize, Clone)]
#[non_exhaustive]
pub struct Endorsement {
    pub mod_id: u64,
    pub domain_name: String,
    pub date: i64,
    pub version: String,
    pub status: String,
}

/// Plain message returned by actions.
#[derive(Debug, PartialEq, Eq, Deserialize, Clone)]
#[non_exhaustive]
pub struct Message {
    pub message: String,
}

impl Client {
    /// Returns the user the API key belongs to. Useful to check that the key is valid.
    pub async fn get_user(&self) -> NexusResult<User> {
        self.get_json("/users/validate.json", None).await
    }

    /// Returns every mod tracked by the current user, across all games.
    pub async fn get_tracked_mods(&self) -> NexusResult<Vec<TrackedMod>> {
        self.get_json("/user/tracked_mods.json", None).await
    }

    /// Track a mod of the current game if `tracked` is true, stop tracking it otherwise.
    pub async fn set_tracked(&self, mod_id: u64, tracked: bool) -> NexusResult<Message> {
        let payload = json!({ "domain_name": self.game_domain(), "mod_id": mod_id });

        if tracked {
            self.post_json("/user/tracked_mods.json", Some(&payload))
                .await
        } else {
            self.delete_json("/user/tracked_mods.json", Some(&payload))
                .await
        }
    }

    /// Returns every endorsement given by the current user.
    pub async fn get_endorsements(&self) -> NexusResult<Vec<Endorsement>> {
        self.get_json("/user/endorsements.json", None).await
    }
}
