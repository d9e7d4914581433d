//! Categorical buckets for bid latency and CPM reporting.

/// Bid load time range, half-open `[lower, upper)` in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LatencyBucket {
    Under200,
    From200To300,
    From300To400,
    From400To500,
    From500To600,
    From600To800,
    From800To1000,
    From1000To1200,
    From1200To1500,
    From1500To2000,
    Above2000,
}

impl LatencyBucket {
    pub const ALL: [LatencyBucket; 11] = [
        LatencyBucket::Under200,
        LatencyBucket::From200To300,
        LatencyBucket::From300To400,
        LatencyBucket::From400To500,
        LatencyBucket::From500To600,
        LatencyBucket::From600To800,
        LatencyBucket::From800To1000,
        LatencyBucket::From1000To1200,
        LatencyBucket::From1200To1500,
        LatencyBucket::From1500To2000,
        LatencyBucket::Above2000,
    ];

    /// Lower bounds of every bucket after the first.
    const BOUNDS_MS: [f64; 10] = [
        200.0, 300.0, 400.0, 500.0, 600.0, 800.0, 1000.0, 1200.0, 1500.0, 2000.0,
    ];

    pub fn label(self) -> &'static str {
        match self {
            LatencyBucket::Under200 => "0-200ms",
            LatencyBucket::From200To300 => "0200-300ms",
            LatencyBucket::From300To400 => "0300-400ms",
            LatencyBucket::From400To500 => "0400-500ms",
            LatencyBucket::From500To600 => "0500-600ms",
            LatencyBucket::From600To800 => "0600-800ms",
            LatencyBucket::From800To1000 => "0800-1000ms",
            LatencyBucket::From1000To1200 => "1000-1200ms",
            LatencyBucket::From1200To1500 => "1200-1500ms",
            LatencyBucket::From1500To2000 => "1500-2000ms",
            LatencyBucket::Above2000 => "2000ms above",
        }
    }
}

/// CPM range in dollars, half-open `[lower, upper)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CpmBucket {
    Under0_5,
    From0_5To1,
    From1To1_5,
    From1_5To2,
    From2To2_5,
    From2_5To3,
    From3To4,
    From4To6,
    From6To8,
    Above8,
}

impl CpmBucket {
    pub const ALL: [CpmBucket; 10] = [
        CpmBucket::Under0_5,
        CpmBucket::From0_5To1,
        CpmBucket::From1To1_5,
        CpmBucket::From1_5To2,
        CpmBucket::From2To2_5,
        CpmBucket::From2_5To3,
        CpmBucket::From3To4,
        CpmBucket::From4To6,
        CpmBucket::From6To8,
        CpmBucket::Above8,
    ];

    const BOUNDS: [f64; 9] = [0.5, 1.0, 1.5, 2.0, 2.5, 3.0, 4.0, 6.0, 8.0];

    pub fn label(self) -> &'static str {
        match self {
            CpmBucket::Under0_5 => "$0-0.5",
            CpmBucket::From0_5To1 => "$0.5-1",
            CpmBucket::From1To1_5 => "$1-1.5",
            CpmBucket::From1_5To2 => "$1.5-2",
            CpmBucket::From2To2_5 => "$2-2.5",
            CpmBucket::From2_5To3 => "$2.5-3",
            CpmBucket::From3To4 => "$3-4",
            CpmBucket::From4To6 => "$4-6",
            CpmBucket::From6To8 => "$6-8",
            CpmBucket::Above8 => "$8 above",
        }
    }
}

/// Number of bounds `value` has reached. NaN and negatives land in bucket 0.
fn bucket_index(value: f64, bounds: &[f64]) -> usize {
    bounds.iter().take_while(|bound| value >= **bound).count()
}

pub fn classify_latency(ms: f64) -> LatencyBucket {
    LatencyBucket::ALL[bucket_index(ms, &LatencyBucket::BOUNDS_MS)]
}

/// Default CPM table; callers may override it with their own function.
pub fn classify_cpm(cpm: f64) -> CpmBucket {
    CpmBucket::ALL[bucket_index(cpm, &CpmBucket::BOUNDS)]
}

/// CPM in whole cents, floored. Absent, zero or NaN CPM reports as 0.
pub fn cents_of(cpm: Option<f64>) -> i64 {
    match cpm {
        Some(dollars) if dollars != 0.0 && !dollars.is_nan() => (dollars * 100.0).floor() as i64,
        _ => 0,
    }
}

/// Render a number the way the tracker expects it in a value slot:
/// integral values without a fraction, others in shortest decimal form.
pub fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}
