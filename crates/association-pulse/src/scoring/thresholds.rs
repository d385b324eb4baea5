use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceTier {
    Low,
    Moderate,
    High,
}

impl PerformanceTier {
    pub const fn ordered() -> [Self; 3] {
        [Self::Low, Self::Moderate, Self::High]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Moderate => "Moderate",
            Self::High => "High",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SupportDesignation {
    #[serde(rename = "Y-USA Support")]
    YUsaSupport,
    #[serde(rename = "Independent Improvement")]
    IndependentImprovement,
}

impl SupportDesignation {
    pub const fn label(self) -> &'static str {
        match self {
            Self::YUsaSupport => "Y-USA Support",
            Self::IndependentImprovement => "Independent Improvement",
        }
    }

    pub const fn needs_network_support(self) -> bool {
        matches!(self, Self::YUsaSupport)
    }
}

/// One row of the threshold table: percentages at or above `min_percentage`
/// fall into this band unless a higher band also matches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdBand {
    pub min_percentage: f64,
    pub tier: PerformanceTier,
    pub designation: SupportDesignation,
}

/// The single source for both the performance tier and the support designation.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdTable {
    bands: Vec<ThresholdBand>,
}

impl ThresholdTable {
    /// `<40` low, `40..70` moderate, `>=70` high.
    pub fn canonical() -> Self {
        Self::new(vec![
            ThresholdBand {
                min_percentage: 0.0,
                tier: PerformanceTier::Low,
                designation: SupportDesignation::YUsaSupport,
            },
            ThresholdBand {
                min_percentage: 40.0,
                tier: PerformanceTier::Moderate,
                designation: SupportDesignation::IndependentImprovement,
            },
            ThresholdBand {
                min_percentage: 70.0,
                tier: PerformanceTier::High,
                designation: SupportDesignation::IndependentImprovement,
            },
        ])
    }

    /// Bands are sorted by threshold; an empty table falls back to the canonical one.
    pub fn new(mut bands: Vec<ThresholdBand>) -> Self {
        if bands.is_empty() {
            return Self::canonical();
        }
        bands.sort_by(|left, right| {
            left.min_percentage
                .partial_cmp(&right.min_percentage)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Self { bands }
    }

    pub fn band(&self, percentage: f64) -> ThresholdBand {
        let percentage = if percentage.is_nan() { 0.0 } else { percentage };
        self.bands
            .iter()
            .rev()
            .find(|band| percentage >= band.min_percentage)
            .or_else(|| self.bands.first())
            .copied()
            .unwrap_or(ThresholdBand {
                min_percentage: 0.0,
                tier: PerformanceTier::Low,
                designation: SupportDesignation::YUsaSupport,
            })
    }

    pub fn tier(&self, percentage: f64) -> PerformanceTier {
        self.band(percentage).tier
    }

    pub fn designation(&self, percentage: f64) -> SupportDesignation {
        self.band(percentage).designation
    }

    pub fn bands(&self) -> &[ThresholdBand] {
        &self.bands
    }
}

impl Default for ThresholdTable {
    fn default() -> Self {
        Self::canonical()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_table_splits_at_forty_and_seventy() {
        let table = ThresholdTable::canonical();

        assert_eq!(table.tier(39.0), PerformanceTier::Low);
        assert_eq!(table.designation(39.0), SupportDesignation::YUsaSupport);
        assert_eq!(table.tier(45.0), PerformanceTier::Moderate);
        assert_eq!(
            table.designation(45.0),
            SupportDesignation::IndependentImprovement
        );
        assert_eq!(table.tier(69.9), PerformanceTier::Moderate);
        assert_eq!(table.tier(70.0), PerformanceTier::High);
        assert_eq!(table.tier(100.0), PerformanceTier::High);
    }

    #[test]
    fn tier_and_designation_move_together_when_table_changes() {
        let table = ThresholdTable::new(vec![
            ThresholdBand {
                min_percentage: 75.0,
                tier: PerformanceTier::High,
                designation: SupportDesignation::IndependentImprovement,
            },
            ThresholdBand {
                min_percentage: 0.0,
                tier: PerformanceTier::Low,
                designation: SupportDesignation::YUsaSupport,
            },
            ThresholdBand {
                min_percentage: 25.0,
                tier: PerformanceTier::Moderate,
                designation: SupportDesignation::IndependentImprovement,
            },
        ]);

        for percentage in [0.0, 24.9, 25.0, 39.0, 74.9, 75.0] {
            let band = table.band(percentage);
            assert_eq!(table.tier(percentage), band.tier);
            assert_eq!(table.designation(percentage), band.designation);
        }
        assert_eq!(table.tier(39.0), PerformanceTier::Moderate);
        assert_eq!(
            table.designation(39.0),
            SupportDesignation::IndependentImprovement
        );
    }

    #[test]
    fn negative_and_nan_percentages_land_in_lowest_band() {
        let table = ThresholdTable::canonical();
        assert_eq!(table.tier(-5.0), PerformanceTier::Low);
        assert_eq!(table.tier(f64::NAN), PerformanceTier::Low);
    }
}
