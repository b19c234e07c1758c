// src/page/fetcher.rs
// =============================================================================
// The real PageFetcher: cache-first page loading over reqwest, plus the
// HTML-level logic for classification and link extraction.
//
// Classification rule (the domain predicate):
//   A page is a character page when its category header contains a link to
//   /wiki/Category:Characters. On Fandom wikis the categories live in
//   <div class="page-header__categories">.
//
// Neighbor extraction:
//   Every <a href> on the page whose target matches the page-reference
//   pattern, whether written relative ("/wiki/Graystripe") or absolute.
//   Returns a set, so a page that mentions a character fifty times
//   contributes that neighbor once.
// =============================================================================

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;
use url::Url;

use super::cache::PageCache;
use super::name::NameResolver;
use super::{ContentSource, FetchError, FetchedPage, PageFacts, PageFetcher};

// The category link that marks a page as a character page
const CHARACTER_CATEGORY_HREF: &str = "/wiki/Category:Characters";

// Characters that must be re-encoded when a canonical name goes back into a
// URL path segment (the url crate's path set, plus '%' so a literal percent
// in a name survives the round trip)
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'#')
    .add(b'?')
    .add(b'{')
    .add(b'}')
    .add(b'%');

pub struct WikiFetcher {
    client: reqwest::Client,
    resolver: NameResolver,
    cache: PageCache,
    // scheme + host (+ port) of the wiki, e.g. "https://warriors.fandom.com"
    origin: String,
    // Compiled once here; selector parsing is not free and these never change
    category_selector: Selector,
    anchor_selector: Selector,
}

impl WikiFetcher {
    // Builds a fetcher bound to the seed URL's origin. Fails only on broken
    // configuration (bad seed, unusable cache directory, client build) -
    // these are the fatal, non-zero-exit errors of the design.
    pub fn new(seed: &Url, cache_dir: &Path) -> anyhow::Result<Self> {
        if seed.scheme() != "http" && seed.scheme() != "https" {
            anyhow::bail!("seed URL must be http(s), got '{}'", seed.scheme());
        }

        let origin = seed.origin().ascii_serialization();
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent(concat!("character-atlas/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| anyhow::anyhow!("cannot build HTTP client: {source}"))?;

        // Both selectors are literals, so a parse failure is a programming
        // error, not a runtime condition
        let category_selector = Selector::parse("div.page-header__categories a")
            .map_err(|error| anyhow::anyhow!("category selector must parse: {error}"))?;
        let anchor_selector = Selector::parse("a[href]")
            .map_err(|error| anyhow::anyhow!("anchor selector must parse: {error}"))?;

        Ok(Self {
            client,
            resolver: NameResolver::new(&origin),
            cache: PageCache::new(cache_dir)?,
            origin,
            category_selector,
            anchor_selector,
        })
    }

    // Classification over an already-parsed document
    fn classify_document(&self, document: &Html) -> bool {
        document
            .select(&self.category_selector)
            .any(|link| link.value().attr("href") == Some(CHARACTER_CATEGORY_HREF))
    }

    // Neighbor extraction over an already-parsed document
    fn extract_from_document(&self, document: &Html) -> HashSet<String> {
        let mut neighbors = HashSet::new();
        for anchor in document.select(&self.anchor_selector) {
            let Some(href) = anchor.value().attr("href") else {
                continue;
            };

            // Wiki-internal links are usually written relative to the origin
            let identifier = if href.starts_with('/') {
                format!("{}{}", self.origin, href)
            } else {
                href.to_string()
            };

            // Keep only identifiers that resolve to a page name; everything
            // else (external links, namespaces, queries) is silently dropped
            if self.resolver.resolve(&identifier).is_some() {
                neighbors.insert(identifier);
            }
        }

        neighbors
    }

    // Rebuilds the page URL for a canonical name
    fn page_url(&self, name: &str) -> String {
        format!(
            "{}/wiki/{}",
            self.origin,
            utf8_percent_encode(name, PATH_SEGMENT)
        )
    }

    async fn download(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|error| FetchError::Transport {
                url: url.to_string(),
                reason: error.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|error| FetchError::Transport {
            url: url.to_string(),
            reason: error.to_string(),
        })
    }
}

#[async_trait]
impl PageFetcher for WikiFetcher {
    fn resolve_name(&self, identifier: &str) -> Option<String> {
        self.resolver.resolve(identifier)
    }

    fn is_cached(&self, name: &str) -> bool {
        self.cache.contains(name)
    }

    async fn fetch(&self, name: &str) -> Result<FetchedPage, FetchError> {
        // Cache first; any readable entry short-circuits the network
        if let Some(content) = self.cache.load(name) {
            return Ok(FetchedPage {
                content,
                source: ContentSource::Cache,
            });
        }

        let content = self.download(&self.page_url(name)).await?;
        self.cache.store(name, &content);

        Ok(FetchedPage {
            content,
            source: ContentSource::Network,
        })
    }

    fn is_character(&self, content: &str) -> bool {
        self.classify_document(&Html::parse_document(content))
    }

    fn extract_neighbors(&self, content: &str) -> HashSet<String> {
        self.extract_from_document(&Html::parse_document(content))
    }

    // Parse the page once and answer both questions from the same document
    fn inspect(&self, content: &str) -> PageFacts {
        let document = Html::parse_document(content);
        PageFacts {
            is_character: self.classify_document(&document),
            neighbors: self.extract_from_document(&document),
        }
    }
}
