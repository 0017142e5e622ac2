use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier the service assigns to a single game.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameId(String);

impl GameId {
    pub fn new(id: impl Into<String>) -> Self {
        GameId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for GameId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for GameId {
    fn from(id: &str) -> Self {
        GameId(id.to_string())
    }
}

/// The game identifiers of one listing page, in the order the service returned them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    pub page: u32,
    pub game_ids: Vec<GameId>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.game_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.game_ids.is_empty()
    }
}

impl IntoIterator for Batch {
    type Item = GameId;
    type IntoIter = std::vec::IntoIter<GameId>;

    fn into_iter(self) -> Self::IntoIter {
        self.game_ids.into_iter()
    }
}
