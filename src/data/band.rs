//! Severity bands and the two-threshold classifier.

use std::fmt;

/// Severity band of a reading, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SeverityBand {
    Normal,
    Warning,
    Critical,
}

impl SeverityBand {
    /// All bands in ascending severity.
    pub const ALL: [SeverityBand; 3] =
        [SeverityBand::Normal, SeverityBand::Warning, SeverityBand::Critical];

    /// Returns a short symbol for display.
    pub fn symbol(&self) -> &'static str {
        match self {
            SeverityBand::Normal => "OK",
            SeverityBand::Warning => "WARN",
            SeverityBand::Critical => "CRIT",
        }
    }

    /// Conventional indicator colour for the band.
    pub fn color(&self) -> &'static str {
        match self {
            SeverityBand::Normal => "green",
            SeverityBand::Warning => "yellow",
            SeverityBand::Critical => "red",
        }
    }
}

impl fmt::Display for SeverityBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Classify a reading against a warning (`t1`) and critical (`t2`) limit.
///
/// Boundary values belong to the upper band. Callers guarantee `t1 <= t2`;
/// configuration loading rejects anything else.
pub fn classify(value: f64, t1: f64, t2: f64) -> SeverityBand {
    debug_assert!(t1 <= t2, "warning limit above critical limit");
    if value >= t2 {
        SeverityBand::Critical
    } else if value >= t1 {
        SeverityBand::Warning
    } else {
        SeverityBand::Normal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bands() {
        assert_eq!(classify(55.0, 60.0, 75.0), SeverityBand::Normal);
        assert_eq!(classify(65.0, 60.0, 75.0), SeverityBand::Warning);
        assert_eq!(classify(80.0, 60.0, 75.0), SeverityBand::Critical);
    }

    #[test]
    fn test_boundaries_go_to_upper_band() {
        assert_eq!(classify(60.0, 60.0, 75.0), SeverityBand::Warning);
        assert_eq!(classify(75.0, 60.0, 75.0), SeverityBand::Critical);
    }

    #[test]
    fn test_equal_limits_skip_warning() {
        assert_eq!(classify(4.9, 5.0, 5.0), SeverityBand::Normal);
        assert_eq!(classify(5.0, 5.0, 5.0), SeverityBand::Critical);
    }

    #[test]
    fn test_classify_is_monotonic() {
        let samples: Vec<f64> = (-40..=120).map(|i| i as f64 * 0.75).collect();
        for (t1, t2) in [(0.0, 10.0), (60.0, 75.0), (-5.0, -5.0), (1.5, 3.0)] {
            for pair in samples.windows(2) {
                assert!(classify(pair[0], t1, t2) <= classify(pair[1], t1, t2));
            }
        }
    }

    #[test]
    fn test_band_ordering() {
        assert!(SeverityBand::Normal < SeverityBand::Warning);
        assert!(SeverityBand::Warning < SeverityBand::Critical);
        assert_eq!(SeverityBand::Critical.to_string(), "CRIT");
    }
}
