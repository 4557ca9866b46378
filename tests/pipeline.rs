use anyhow::{anyhow, Result};
use async_trait::async_trait;
use daftstats::fetcher::{fetch_all, PageFetcher};
use daftstats::models::{Category, Locality, Segment};
use daftstats::segments::{Orchestrator, SegmentSet, SEL_NEXT_PAGE, SEL_PRICE};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Serves canned pages and records every URL requested.
struct FakeSite {
    pages: HashMap<String, String>,
    requested: Mutex<Vec<String>>,
}

impl FakeSite {
    fn new(pages: &[(&str, String)]) -> Self {
        Self {
            pages: pages
                .iter()
                .map(|(url, html)| (url.to_string(), html.clone()))
                .collect(),
            requested: Mutex::new(Vec::new()),
        }
    }

    fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageFetcher for FakeSite {
    async fn fetch(&self, url: &str) -> Result<String> {
        self.requested.lock().unwrap().push(url.to_string());
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| anyhow!("HTTP 404 for {}", url))
    }
}

fn listing(prices: &[&str], next: Option<&str>) -> String {
    let prices: String = prices
        .iter()
        .map(|p| format!(r#"<div class="box"><strong class="price">{}</strong></div>"#, p))
        .collect();
    let paging = match next {
        Some(href) => format!(
            r#"<ul class="paging"><li class="next_page"><a href="{}">Next &raquo;</a></li></ul>"#,
            href
        ),
        None => r#"<ul class="paging"><li>1</li></ul>"#.to_string(),
    };
    format!(
        "<html><body><div id=\"sr_content\">{}</div>{}</body></html>",
        prices, paging
    )
}

fn three_page_site() -> FakeSite {
    FakeSite::new(&[
        (
            "http://www.daft.ie/dublin/",
            listing(&["€1,000", "€1,100"], Some("/dublin/?offset=20")),
        ),
        (
            "http://daft.ie/dublin/?offset=20",
            listing(&["From €300 per week"], Some("http://daft.ie/dublin/?offset=40")),
        ),
        (
            "http://daft.ie/dublin/?offset=40",
            listing(&["€2,500", "POA"], None),
        ),
    ])
}

#[tokio::test]
async fn fetch_all_follows_pages_until_no_next_link() {
    let site = three_page_site();

    let prices = fetch_all(
        &site,
        Duration::ZERO,
        "http://www.daft.ie/dublin/",
        SEL_PRICE,
        SEL_NEXT_PAGE,
        None,
    )
    .await
    .unwrap();

    assert_eq!(
        prices,
        vec!["€1,000", "€1,100", "From €300 per week", "€2,500", "POA"]
    );
    assert_eq!(
        site.requested(),
        vec![
            "http://www.daft.ie/dublin/",
            "http://daft.ie/dublin/?offset=20",
            "http://daft.ie/dublin/?offset=40",
        ]
    );
}

#[tokio::test]
async fn fetch_all_waits_before_every_page() {
    let site = three_page_site();
    let started = Instant::now();

    fetch_all(
        &site,
        Duration::from_millis(20),
        "http://www.daft.ie/dublin/",
        SEL_PRICE,
        SEL_NEXT_PAGE,
        None,
    )
    .await
    .unwrap();

    assert!(started.elapsed() >= Duration::from_millis(60));
}

#[tokio::test]
async fn fetch_all_fails_when_a_page_cannot_be_fetched() {
    let site = FakeSite::new(&[(
        "http://www.daft.ie/dublin/",
        listing(&["€1,000"], Some("/dublin/missing")),
    )]);

    let result = fetch_all(
        &site,
        Duration::ZERO,
        "http://www.daft.ie/dublin/",
        SEL_PRICE,
        SEL_NEXT_PAGE,
        None,
    )
    .await;

    assert!(result.is_err());
    assert_eq!(site.requested().len(), 2);
}

#[tokio::test]
async fn single_page_without_prices_is_empty_not_an_error() {
    let site = FakeSite::new(&[("http://www.daft.ie/empty/", listing(&[], None))]);

    let prices = fetch_all(
        &site,
        Duration::ZERO,
        "http://www.daft.ie/empty/",
        SEL_PRICE,
        SEL_NEXT_PAGE,
        None,
    )
    .await
    .unwrap();

    assert!(prices.is_empty());
}

fn segment(category: Category, locality: Locality, start_url: &str) -> Segment {
    Segment {
        category,
        locality,
        start_url: start_url.to_string(),
        price_selector: SEL_PRICE.to_string(),
        next_page_selector: SEL_NEXT_PAGE.to_string(),
    }
}

fn fake_segments() -> SegmentSet {
    SegmentSet {
        rent_county: segment(Category::Rent, Locality::County, "http://www.daft.ie/dublin/"),
        rent_city: segment(Category::Rent, Locality::City, "http://www.daft.ie/city/"),
        sharing_county: segment(Category::Sharing, Locality::County, "http://www.daft.ie/share/"),
        sharing_city: segment(Category::Sharing, Locality::City, "http://www.daft.ie/share-city/"),
    }
}

#[tokio::test]
async fn run_all_assembles_a_report_from_every_segment() {
    let mut site = three_page_site();
    site.pages.insert(
        "http://www.daft.ie/city/".to_string(),
        listing(&["€1,800", "€2,200"], None),
    );
    site.pages.insert(
        "http://www.daft.ie/share/".to_string(),
        listing(&["€600", "€100 per week", "€700"], None),
    );
    site.pages.insert(
        "http://www.daft.ie/share-city/".to_string(),
        listing(&[], None),
    );

    let report = Orchestrator::new(&site, Duration::ZERO)
        .run_all(&fake_segments())
        .await
        .unwrap();

    let rent_county = &report.rent.county;
    assert_eq!(rent_county.prices.len(), 4);
    assert_eq!(rent_county.unparsed, 1);
    assert_eq!(rent_county.lowest, Some(1000.0));
    assert_eq!(rent_county.highest, Some(2500.0));

    assert_eq!(report.rent.city.median, Some(2000.0));
    assert_eq!(report.rent.city.average, Some(2000.0));

    let sharing_county = &report.sharing.county;
    assert_eq!(sharing_county.median, Some(600.0));
    assert!((sharing_county.lowest.unwrap() - 434.524).abs() < 1e-9);

    assert!(report.sharing.city.prices.is_empty());
    assert_eq!(report.sharing.city.lowest, None);

    // three pages for rent/county, one for each other segment
    assert_eq!(site.requested().len(), 6);
}

#[tokio::test]
async fn run_all_fails_when_any_segment_fails() {
    let mut site = three_page_site();
    site.pages.insert(
        "http://www.daft.ie/city/".to_string(),
        listing(&["€1,800"], None),
    );
    site.pages.insert(
        "http://www.daft.ie/share/".to_string(),
        listing(&["€600"], None),
    );
    // share-city is missing and fails

    let result = Orchestrator::new(&site, Duration::ZERO)
        .run_all(&fake_segments())
        .await;

    let error = format!("{:#}", result.unwrap_err());
    assert!(error.contains("Sharing / City Centre"), "{}", error);
}
