use crate::client::Client;
use crate::error::Result as NexusResult;

use serde::Deserialize;

/// Site colours used for a game, as hexadecimal RGB strings like `#da8e35`.
#[derive(Debug, PartialEq, Eq, Deserialize, Clone)]
#[non_exhaustive]
pub struct ColourScheme {
    pub id: u64,
    pub name: String,
    pub primary_colour: String,
    pub secondary_colour: String,
    pub darker_colour: String,
}

impl Client {
    /// Returns every colour scheme.
    pub async fn get_colour_schemes(&self) -> NexusResult<Vec<ColourScheme>> {
        self.get_json("/colourschemes.json", None).await
    }
}
