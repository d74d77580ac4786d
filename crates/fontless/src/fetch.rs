//! Downloading font binaries.

use crate::Result;
use futures::future::BoxFuture;
use std::sync::Arc;

/// Fetches the bytes behind a font URL.
///
/// The engine awaits fetches on the caller's executor; implementations decide how the I/O is
/// performed. Retries and timeouts are the implementation's business.
pub trait FontFetcher: Send + Sync {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Vec<u8>>>;
}

impl<T: FontFetcher + ?Sized> FontFetcher for Arc<T> {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Vec<u8>>> {
        (**self).fetch(url)
    }
}

impl<T: FontFetcher + ?Sized> FontFetcher for Box<T> {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Vec<u8>>> {
        (**self).fetch(url)
    }
}

#[cfg(feature = "http")]
pub use self::http::UreqFetcher;

#[cfg(feature = "http")]
mod http {
    use super::FontFetcher;
    use crate::{Error, Result};
    use futures::future::BoxFuture;
    use std::io::Read;
    use std::time::Duration;

    /// Blocking HTTP fetcher backed by `ureq`.
    ///
    /// The request runs inside the returned future, so it blocks whichever thread polls it.
    #[derive(Debug, Clone)]
    pub struct UreqFetcher {
        agent: ureq::Agent,
    }

    impl Default for UreqFetcher {
        fn default() -> Self {
            Self::new()
        }
    }

    impl UreqFetcher {
        pub fn new() -> Self {
            let agent = ureq::AgentBuilder::new()
                .timeout_connect(Duration::from_secs(30))
                .user_agent(concat!("fontless/", env!("CARGO_PKG_VERSION")))
                .build();
            Self { agent }
        }

        pub fn with_agent(agent: ureq::Agent) -> Self {
            Self { agent }
        }

        fn fetch_sync(&self, url: &str) -> Result<Vec<u8>> {
            let fetch_error = |message: String| Error::Fetch {
                url: url.to_string(),
                message,
            };
            let response = self
                .agent
                .get(url)
                .call()
                .map_err(|err| fetch_error(err.to_string()))?;
            let mut bytes = Vec::new();
            response
                .into_reader()
                .read_to_end(&mut bytes)
                .map_err(|err| fetch_error(err.to_string()))?;
            tracing::debug!(url, len = bytes.len(), "fetched font");
            Ok(bytes)
        }
    }

    impl FontFetcher for UreqFetcher {
        fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Vec<u8>>> {
            Box::pin(async move { self.fetch_sync(url) })
        }
    }
}
