use thiserror::Error;

/// Which of the two startup documents a failure refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Document {
    Defaults,
    Cultures,
}

impl std::fmt::Display for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Document::Defaults => f.write_str("config/default.json"),
            Document::Cultures => f.write_str("config/cultures.json"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{document} is not valid: {source}")]
    Json {
        document: Document,
        #[source]
        source: serde_json::Error,
    },
    #[error("configuration lists no cultures")]
    NoCultures,
    #[error("correct food order must not be empty (culture '{culture}')")]
    EmptyFoodOrder { culture: String },
    #[error("food item '{id}' appears twice in the order for culture '{culture}'")]
    DuplicateFoodItem { culture: String, id: String },
    #[error("food item '{id}' in the order for culture '{culture}' has no button on the food page")]
    UnknownFoodItem { culture: String, id: String },
    #[error("configuration defines no pages")]
    NoPages,
    #[error("page '{page}' is defined more than once")]
    DuplicatePage { page: String },
}

/// Failures while fetching the startup documents in the browser.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("request for {document} failed: {detail}")]
    Fetch { document: Document, detail: String },
    #[error("{document} answered with HTTP {status}")]
    Status { document: Document, status: u16 },
    #[error("could not read body of {document}: {detail}")]
    Body { document: Document, detail: String },
    #[error(transparent)]
    Config(#[from] ConfigError),
}
