use serde::{Deserialize, Serialize};
use std::fmt;

use crate::stats::Summary;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Rent,
    Sharing,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Rent => write!(f, "Rent"),
            Category::Sharing => write!(f, "Sharing"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locality {
    County,
    City,
}

impl fmt::Display for Locality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locality::County => write!(f, "Co. Dublin"),
            Locality::City => write!(f, "City Centre"),
        }
    }
}

/// One market slice that is crawled and aggregated on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub category: Category,
    pub locality: Locality,
    pub start_url: String,
    pub price_selector: String,
    pub next_page_selector: String,
}

impl Segment {
    pub fn label(&self) -> String {
        format!("{} / {}", self.category, self.locality)
    }
}

/// Statistics for a single segment of one run.
///
/// `prices` keeps scrape order. The summary fields are `None` when the
/// segment produced no usable prices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentStats {
    pub prices: Vec<f64>,
    pub lowest: Option<f64>,
    pub highest: Option<f64>,
    pub average: Option<f64>,
    pub median: Option<f64>,
    #[serde(default)]
    pub unparsed: usize,
}

impl SegmentStats {
    pub fn new(prices: Vec<f64>, summary: Option<Summary>, unparsed: usize) -> Self {
        Self {
            prices,
            lowest: summary.map(|s| s.lowest),
            highest: summary.map(|s| s.highest),
            average: summary.map(|s| s.average),
            median: summary.map(|s| s.median),
            unparsed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalityStats {
    pub county: SegmentStats,
    pub city: SegmentStats,
}

impl LocalityStats {
    pub fn get(&self, locality: Locality) -> &SegmentStats {
        match locality {
            Locality::County => &self.county,
            Locality::City => &self.city,
        }
    }
}

/// Combined result of one run over every segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub rent: LocalityStats,
    pub sharing: LocalityStats,
}

impl Report {
    pub fn get(&self, category: Category, locality: Locality) -> &SegmentStats {
        match category {
            Category::Rent => self.rent.get(locality),
            Category::Sharing => self.sharing.get(locality),
        }
    }
}
