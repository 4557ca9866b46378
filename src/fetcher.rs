use crate::tui::SegmentProgress;
use crate::verbose_println;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use scraper::{Html, Selector};
use std::time::Duration;

/// Scheme and host that root-relative pagination links are resolved against.
pub const SITE_ROOT: &str = "http://daft.ie";

/// Pause before every listing page request.
pub const INDEX_DELAY: Duration = Duration::from_millis(1000);

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Source of raw listing page markup.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String>;
}

pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch listing page: {}", url))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "Failed to fetch listing page {}: HTTP {}",
                url,
                response.status()
            ));
        }

        response
            .text()
            .await
            .context("Failed to read response body")
    }
}

/// Compiled selectors for one segment's listing pages.
pub struct PageSelectors {
    price: Selector,
    next_page: Selector,
}

impl PageSelectors {
    pub fn parse(price_selector: &str, next_page_selector: &str) -> Result<Self> {
        let price = Selector::parse(price_selector)
            .map_err(|e| anyhow!("Failed to parse price selector {:?}: {:?}", price_selector, e))?;
        let next_page = Selector::parse(next_page_selector).map_err(|e| {
            anyhow!(
                "Failed to parse next page selector {:?}: {:?}",
                next_page_selector,
                e
            )
        })?;
        Ok(Self { price, next_page })
    }
}

/// What one listing page contributes to a crawl.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingPage {
    pub prices: Vec<String>,
    pub next_page: NextPage,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextPage {
    /// No element matched the next page selector.
    Absent,
    /// The next page element exists but has no `href`.
    MissingHref,
    Link(String),
}

pub fn parse_listing_page(html: &str, selectors: &PageSelectors) -> ListingPage {
    let document = Html::parse_document(html);

    let prices = document
        .select(&selectors.price)
        .map(|element| element.text().collect::<String>())
        .collect();

    let next_page = match document.select(&selectors.next_page).next() {
        None => NextPage::Absent,
        Some(element) => match element.value().attr("href") {
            Some(href) => NextPage::Link(href.to_string()),
            None => NextPage::MissingHref,
        },
    };

    ListingPage { prices, next_page }
}

/// Root-relative links get the site root prepended; anything else is used verbatim.
pub fn resolve_next_url(href: &str) -> String {
    if href.starts_with('/') {
        format!("{}{}", SITE_ROOT, href)
    } else {
        href.to_string()
    }
}

/// Walks listing pages from `start_url` until a page has no next page link,
/// collecting the text of every price element in page order.
///
/// Sleeps `delay` before each request, the first one included. Any fetch
/// failure aborts the whole walk.
pub async fn fetch_all(
    fetcher: &dyn PageFetcher,
    delay: Duration,
    start_url: &str,
    price_selector: &str,
    next_page_selector: &str,
    progress: Option<&SegmentProgress>,
) -> Result<Vec<String>> {
    let selectors = PageSelectors::parse(price_selector, next_page_selector)?;
    let mut all_prices = Vec::new();
    let mut url = start_url.to_string();
    let mut pages = 0;

    loop {
        match progress {
            Some(progress) => progress.indexing(&url),
            None => println!("Indexing page... {}", url),
        }

        tokio::time::sleep(delay).await;
        let html = fetcher.fetch(&url).await?;
        let page = parse_listing_page(&html, &selectors);
        pages += 1;

        verbose_println!("Found {} prices on {}", page.prices.len(), url);
        all_prices.extend(page.prices);

        if let Some(progress) = progress {
            progress.update(pages, all_prices.len());
        }

        match page.next_page {
            NextPage::Absent => {
                verbose_println!("Reached last page.");
                break;
            }
            NextPage::MissingHref => {
                verbose_println!("Next page link on {} has no href, treating as last page.", url);
                break;
            }
            NextPage::Link(href) => url = resolve_next_url(&href),
        }
    }

    Ok(all_prices)
}
