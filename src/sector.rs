// Smile Bot Relay — Sectors
//
// A sector is the topic label the client attaches to every query; it selects
// which upstream fetcher handles the request. The set is closed: unknown
// names are rejected at every entry point (400 on the HTTP paths, a failure
// envelope on the duplex path) rather than silently falling through to the
// text-generation model — the model is its own explicit `Assistant` sector.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sector {
    Education,
    Dictionary,
    Weather,
    Entertainment,
    Wellbeing,
    News,
    Books,
    Recipes,
    Movies,
    Assistant,
}

impl Sector {
    pub const ALL: [Sector; 10] = [
        Sector::Education,
        Sector::Dictionary,
        Sector::Weather,
        Sector::Entertainment,
        Sector::Wellbeing,
        Sector::News,
        Sector::Books,
        Sector::Recipes,
        Sector::Movies,
        Sector::Assistant,
    ];

    /// Parse the wire name. Case-insensitive so hand-typed HTTP bodies work.
    pub fn from_name(name: &str) -> Option<Sector> {
        match name.trim().to_ascii_lowercase().as_str() {
            "education" => Some(Sector::Education),
            "dictionary" => Some(Sector::Dictionary),
            "weather" => Some(Sector::Weather),
            "entertainment" => Some(Sector::Entertainment),
            "wellbeing" => Some(Sector::Wellbeing),
            "news" => Some(Sector::News),
            "books" => Some(Sector::Books),
            "recipes" => Some(Sector::Recipes),
            "movies" => Some(Sector::Movies),
            "assistant" => Some(Sector::Assistant),
            _ => None,
        }
    }

    /// Canonical wire name (the capitalized form the chat page sends).
    pub fn name(&self) -> &'static str {
        match self {
            Sector::Education => "Education",
            Sector::Dictionary => "Dictionary",
            Sector::Weather => "Weather",
            Sector::Entertainment => "Entertainment",
            Sector::Wellbeing => "Wellbeing",
            Sector::News => "News",
            Sector::Books => "Books",
            Sector::Recipes => "Recipes",
            Sector::Movies => "Movies",
            Sector::Assistant => "Assistant",
        }
    }

    /// Lowercase key used in the capability probe map.
    pub fn probe_key(&self) -> String {
        self.name().to_ascii_lowercase()
    }
}

impl std::fmt::Display for Sector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
