use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Css(#[from] fontless_css::Error),

    #[error("Failed to fetch font `{url}`: {message}")]
    Fetch { url: String, message: String },

    #[error("Cache I/O error for key `{key}`")]
    Cache {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write asset {}", path.display())]
    WriteAsset {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("CSS minification failed: {message}")]
    Minify { message: String },

    #[error("Provider `{provider}` failed: {message}")]
    Provider { provider: String, message: String },

    #[error("Invalid fontless config: {message}")]
    Config { message: String },
}
