use std::collections::BTreeMap;

use url::Url;

use crate::adapter::SiteAdapter;
use crate::config::ClientConfig;
use crate::error::{Result, SiteError};
use crate::formats::ShelfCredential;
use crate::sites::youdu;

pub type AdapterFactory =
    fn(base_url: Url, credential: ShelfCredential, config: &ClientConfig) -> Result<Box<dyn SiteAdapter>>;

#[derive(Debug, Clone)]
pub struct SiteEntry {
    pub name: &'static str,
    pub base_url: Url,
    factory: AdapterFactory,
}

/// Maps a site's base URL to the adapter that knows its markup and endpoints.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    entries: BTreeMap<String, SiteEntry>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every site this crate ships an adapter for.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry
            .register(youdu::BASE_URL, youdu::NAME, youdu::build)
            .expect("builtin site url is valid");
        registry
    }

    pub fn register(
        &mut self,
        base_url: &str,
        name: &'static str,
        factory: AdapterFactory,
    ) -> Result<()> {
        let base_url = normalize_base_url(base_url)?;
        tracing::debug!(site = name, base_url = %base_url, "register site adapter");
        self.entries.insert(
            base_url.as_str().to_owned(),
            SiteEntry {
                name,
                base_url,
                factory,
            },
        );
        Ok(())
    }

    pub fn resolve(&self, site_url: &str) -> Result<&SiteEntry> {
        let base_url = normalize_base_url(site_url)?;
        self.entries.get(base_url.as_str()).ok_or_else(|| {
            SiteError::validation("site url", format!("no adapter registered for {base_url}"))
        })
    }

    pub fn build(
        &self,
        credential: ShelfCredential,
        config: &ClientConfig,
    ) -> Result<Box<dyn SiteAdapter>> {
        let entry = self.resolve(&credential.site_url)?;
        (entry.factory)(entry.base_url.clone(), credential, config)
    }

    pub fn sites(&self) -> impl Iterator<Item = &SiteEntry> {
        self.entries.values()
    }
}

/// Canonical form used as the registry key: http(s), no query or fragment,
/// path ending in `/`.
pub fn normalize_base_url(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw.trim())
        .map_err(|err| SiteError::validation("site url", format!("{raw:?}: {err}")))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(SiteError::validation(
            "site url",
            format!("must be http/https: {url}"),
        ));
    }
    if url.host_str().is_none() {
        return Err(SiteError::validation("site url", format!("must have a host: {url}")));
    }
    url.set_query(None);
    url.set_fragment(None);
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
