pub mod masked;
pub mod output;
pub mod reducer;

use std::{borrow::Cow, fmt::Display, str::FromStr};

use crate::errors::{Result, RusterstatsError};

pub use masked::MaskedArray;
pub use output::{CategoryMap, FeatureStats, MiniRaster};

/// Statistics computed when none are requested.
pub const DEFAULT_STATS: [Stat; 4] = [Stat::Count, Stat::Min, Stat::Max, Stat::Mean];

/// Every fixed statistic, selected by `"*"` or `"ALL"`.
pub const VALID_STATS: [Stat; 12] = [
    Stat::Count,
    Stat::Min,
    Stat::Max,
    Stat::Mean,
    Stat::Sum,
    Stat::Std,
    Stat::Median,
    Stat::Majority,
    Stat::Minority,
    Stat::Unique,
    Stat::Range,
    Stat::Nodata,
];

const PERCENTILE_PREFIX: &str = "percentile_";

#[derive(Debug, Clone, PartialEq)]
pub enum Stat {
    Count,
    Min,
    Max,
    Mean,
    Sum,
    Std,
    Median,
    Majority,
    Minority,
    Unique,
    Range,
    Nodata,
    /// `q` in `[0, 100]`, `name` is the requested spelling, used as output key.
    Percentile { q: f64, name: Box<str> },
}

impl Stat {
    pub fn name(&self) -> Cow<'static, str> {
        Cow::Borrowed(match self {
            Self::Count => "count",
            Self::Min => "min",
            Self::Max => "max",
            Self::Mean => "mean",
            Self::Sum => "sum",
            Self::Std => "std",
            Self::Median => "median",
            Self::Majority => "majority",
            Self::Minority => "minority",
            Self::Unique => "unique",
            Self::Range => "range",
            Self::Nodata => "nodata",
            Self::Percentile { name, .. } => return Cow::Owned(name.to_string()),
        })
    }

    /// Whether the stat is derived from the categorical histogram.
    pub fn needs_histogram(&self) -> bool {
        matches!(self, Self::Majority | Self::Minority | Self::Unique)
    }

    /// Whether the stat is read off the sorted values.
    pub fn needs_sorted(&self) -> bool {
        matches!(self, Self::Median | Self::Percentile { .. })
    }
}

fn parse_percentile(name: &str) -> Result<Stat> {
    let invalid = || RusterstatsError::InvalidPercentile(name.to_string());
    let q: f64 = name
        .strip_prefix(PERCENTILE_PREFIX)
        .ok_or_else(invalid)?
        .parse()
        .map_err(|_| invalid())?;
    if !(0. ..=100.).contains(&q) {
        return Err(invalid());
    }
    Ok(Stat::Percentile {
        q,
        name: name.into(),
    })
}

impl FromStr for Stat {
    type Err = RusterstatsError;

    fn from_str(name: &str) -> Result<Self> {
        if name.starts_with(PERCENTILE_PREFIX) {
            return parse_percentile(name);
        }
        VALID_STATS
            .into_iter()
            .find(|stat| stat.name() == name)
            .ok_or_else(|| RusterstatsError::UnknownStat(name.to_string()))
    }
}

impl Display for Stat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name())
    }
}

/// Validated, ordered and deduplicated statistics of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct StatSet {
    stats: Vec<Stat>,
    categorical: bool,
}

impl StatSet {
    /// Validates requested names.
    ///
    /// A single name may hold several space separated names, `"*"` and
    /// `"ALL"` expand to [VALID_STATS]. Nothing requested means
    /// [DEFAULT_STATS], or only the histogram in categorical mode.
    pub fn new<S: AsRef<str>>(names: &[S], categorical: bool) -> Result<Self> {
        let mut stats: Vec<Stat> = Vec::new();
        for name in names.iter().flat_map(|names| names.as_ref().split_whitespace()) {
            let parsed = match name {
                "*" | "ALL" => VALID_STATS.to_vec(),
                name => vec![name.parse()?],
            };
            for stat in parsed {
                if !stats.contains(&stat) {
                    stats.push(stat);
                }
            }
        }
        if stats.is_empty() && !categorical {
            stats = DEFAULT_STATS.to_vec();
        }
        Ok(Self { stats, categorical })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Stat> {
        self.stats.iter()
    }

    pub fn categorical(&self) -> bool {
        self.categorical
    }

    /// Whether the categorical histogram has to be built.
    pub fn run_count(&self) -> bool {
        self.categorical || self.stats.iter().any(Stat::needs_histogram)
    }

    /// Whether the surviving values have to be sorted.
    pub fn needs_sorted(&self) -> bool {
        self.stats.iter().any(Stat::needs_sorted)
    }

    pub fn len(&self) -> usize {
        self.stats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }
}
