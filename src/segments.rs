use crate::fetcher::{self, PageFetcher};
use crate::models::{Category, Locality, LocalityStats, Report, Segment, SegmentStats};
use crate::parser::normalize_price;
use crate::stats::aggregate;
use crate::tui::CrawlProgress;
use crate::verbose_println;
use anyhow::{Context, Result};
use std::time::Duration;

const URL_RENT_COUNTY: &str =
    "http://www.daft.ie/dublin/residential-property-for-rent/?s[sort_type]=a&s[sort_by]=price";
const URL_RENT_CITY: &str = "http://www.daft.ie/dublin-city/residential-property-for-rent/?s[sort_by]=price&s[sort_type]=a&searchSource=rental";
const URL_SHARING_COUNTY: &str = "http://www.daft.ie/dublin/rooms-to-share/?s%5Broom_type%5D=either&s%5Badvanced%5D=1&s%5Bgender%5D=on&s%5Bsort_by%5D=price&s%5Bsort_type%5D=a&searchSource=sharing";
const URL_SHARING_CITY: &str = "http://www.daft.ie/dublin/rooms-to-share/dublin-city-centre/?s%5Broom_type%5D=either&s%5Badvanced%5D=1&s%5Bgender%5D=on&s%5Bsort_by%5D=price&s%5Bsort_type%5D=a&searchSource=sharing";

pub const SEL_PRICE: &str = "#sr_content .price";
pub const SEL_NEXT_PAGE: &str = ".paging .next_page a";

fn segment(category: Category, locality: Locality, start_url: &str) -> Segment {
    Segment {
        category,
        locality,
        start_url: start_url.to_string(),
        price_selector: SEL_PRICE.to_string(),
        next_page_selector: SEL_NEXT_PAGE.to_string(),
    }
}

/// The four Dublin market segments tracked on every run.
#[derive(Debug, Clone)]
pub struct SegmentSet {
    pub rent_county: Segment,
    pub rent_city: Segment,
    pub sharing_county: Segment,
    pub sharing_city: Segment,
}

impl Default for SegmentSet {
    fn default() -> Self {
        Self {
            rent_county: segment(Category::Rent, Locality::County, URL_RENT_COUNTY),
            rent_city: segment(Category::Rent, Locality::City, URL_RENT_CITY),
            sharing_county: segment(Category::Sharing, Locality::County, URL_SHARING_COUNTY),
            sharing_city: segment(Category::Sharing, Locality::City, URL_SHARING_CITY),
        }
    }
}

impl SegmentSet {
    pub fn iter(&self) -> impl Iterator<Item = &Segment> {
        [
            &self.rent_county,
            &self.rent_city,
            &self.sharing_county,
            &self.sharing_city,
        ]
        .into_iter()
    }
}

pub struct Orchestrator<'a> {
    fetcher: &'a dyn PageFetcher,
    delay: Duration,
    progress: Option<&'a CrawlProgress>,
}

impl<'a> Orchestrator<'a> {
    pub fn new(fetcher: &'a dyn PageFetcher, delay: Duration) -> Self {
        Self {
            fetcher,
            delay,
            progress: None,
        }
    }

    pub fn with_progress(mut self, progress: &'a CrawlProgress) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Crawls, normalizes and aggregates one segment.
    ///
    /// Prices that do not normalize to a finite number are dropped and counted
    /// in `unparsed`.
    pub async fn run_segment(&self, segment: &Segment) -> Result<SegmentStats> {
        let progress = self.progress.map(|p| p.segment(&segment.label()));

        let result = fetcher::fetch_all(
            self.fetcher,
            self.delay,
            &segment.start_url,
            &segment.price_selector,
            &segment.next_page_selector,
            progress.as_ref(),
        )
        .await
        .with_context(|| format!("Failed to crawl segment {}", segment.label()));

        let raw_prices = match result {
            Ok(raw_prices) => raw_prices,
            Err(e) => {
                if let Some(progress) = &progress {
                    progress.fail();
                }
                return Err(e);
            }
        };

        let stats = summarize(&raw_prices);
        if stats.unparsed > 0 {
            verbose_println!(
                "{}: skipped {} unparsable prices",
                segment.label(),
                stats.unparsed
            );
        }
        if let Some(progress) = &progress {
            progress.finish(stats.prices.len(), stats.unparsed);
        }

        Ok(stats)
    }

    /// Runs every segment concurrently and fails as soon as one of them fails.
    pub async fn run_all(&self, segments: &SegmentSet) -> Result<Report> {
        let (rent_county, rent_city, sharing_county, sharing_city) = tokio::try_join!(
            self.run_segment(&segments.rent_county),
            self.run_segment(&segments.rent_city),
            self.run_segment(&segments.sharing_county),
            self.run_segment(&segments.sharing_city),
        )?;

        Ok(Report {
            rent: LocalityStats {
                county: rent_county,
                city: rent_city,
            },
            sharing: LocalityStats {
                county: sharing_county,
                city: sharing_city,
            },
        })
    }
}

/// Normalizes raw price texts and aggregates the usable ones.
pub fn summarize(raw_prices: &[String]) -> SegmentStats {
    let normalized: Vec<f64> = raw_prices.iter().map(|raw| normalize_price(raw)).collect();
    let prices: Vec<f64> = normalized.iter().copied().filter(|p| p.is_finite()).collect();
    let unparsed = normalized.len() - prices.len();
    let summary = aggregate(&prices);
    SegmentStats::new(prices, summary, unparsed)
}

fn format_amount(value: Option<f64>) -> String {
    match value {
        Some(value) => format!("€{:.2}", value),
        None => "n/a".to_string(),
    }
}

fn banner(title: &str) -> String {
    let rule = "#".repeat(title.len() + 4);
    format!("{}\n# {} #\n{}\n", rule, title, rule)
}

/// Human readable lowest/highest overview of a report.
pub fn format_summary(report: &Report) -> String {
    let mut out = String::new();

    for category in [Category::Rent, Category::Sharing] {
        out.push('\n');
        out.push_str(&banner(&category.to_string()));

        for locality in [Locality::County, Locality::City] {
            let stats = report.get(category, locality);
            let heading = locality.to_string();
            out.push_str(&format!(
                "\n{}\n{}\nLowest: {}\nHighest: {}\n",
                heading,
                "#".repeat(heading.chars().count()),
                format_amount(stats.lowest),
                format_amount(stats.highest),
            ));
        }
    }

    out
}
