/// Summary statistics over a set of normalized monthly prices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub lowest: f64,
    pub highest: f64,
    pub average: f64,
    pub median: f64,
}

/// Computes lowest, highest, mean and median of `prices`.
///
/// Returns `None` for an empty slice. The input is never reordered; the
/// median is taken from a sorted copy. For an even count the median is the
/// mean of the two middle values.
pub fn aggregate(prices: &[f64]) -> Option<Summary> {
    if prices.is_empty() {
        return None;
    }

    let mut sorted = prices.to_vec();
    sorted.sort_by(f64::total_cmp);

    let lowest = sorted[0];
    let highest = sorted[sorted.len() - 1];
    let average = sorted.iter().sum::<f64>() / sorted.len() as f64;

    Some(Summary {
        lowest,
        highest,
        average,
        median: median_of_sorted(&sorted),
    })
}

fn median_of_sorted(sorted: &[f64]) -> f64 {
    let middle = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        sorted[middle]
    } else {
        (sorted[middle - 1] + sorted[middle]) / 2.0
    }
}
