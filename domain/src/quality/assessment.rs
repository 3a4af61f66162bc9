//! Heuristic output assessment

use serde::{Deserialize, Serialize};

/// Output length at which the length bonus saturates
const LENGTH_SATURATION_CHARS: usize = 600;

const REFUSAL_MARKERS: &[&str] = &[
    "i cannot",
    "i can't",
    "i'm unable",
    "i am unable",
    "as an ai",
    "i won't be able",
];

/// Measured properties of an agent output (Value Object)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutputAssessment {
    /// Heuristic quality in [0, 1]
    pub quality: f64,
    /// Self-reported confidence from a `CONFIDENCE:` marker, if any
    pub confidence: Option<f64>,
    pub length: usize,
}

impl OutputAssessment {
    /// Score an output.
    ///
    /// Empty output scores 0. Otherwise: 0.5 base, up to 0.3 for length,
    /// 0.1 for markdown structure, 0.1 for a confidence marker of at least
    /// 0.5, minus 0.4 for refusal phrasing.
    pub fn of(output: &str) -> Self {
        let trimmed = output.trim();
        let length = trimmed.chars().count();
        let confidence = parse_confidence(trimmed);

        if trimmed.is_empty() {
            return Self {
                quality: 0.0,
                confidence,
                length: 0,
            };
        }

        let mut quality = 0.5;
        quality += 0.3 * (length.min(LENGTH_SATURATION_CHARS) as f64 / LENGTH_SATURATION_CHARS as f64);
        if has_structure(trimmed) {
            quality += 0.1;
        }
        if confidence.is_some_and(|c| c >= 0.5) {
            quality += 0.1;
        }
        let lower = trimmed.to_lowercase();
        if REFUSAL_MARKERS.iter().any(|m| lower.contains(m)) {
            quality -= 0.4;
        }

        Self {
            quality: quality.clamp(0.0, 1.0),
            confidence,
            length,
        }
    }

    /// Confidence if reported, otherwise the quality score
    pub fn effective_confidence(&self) -> f64 {
        self.confidence.unwrap_or(self.quality)
    }
}

fn has_structure(text: &str) -> bool {
    text.lines().any(|line| {
        let line = line.trim_start();
        line.starts_with('#')
            || line.starts_with("- ")
            || line.starts_with("* ")
            || line
                .split_once(". ")
                .is_some_and(|(n, _)| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
    })
}

/// Parse a `CONFIDENCE: 0.8` or `confidence: 80%` marker.
///
/// Values above 1 without a percent sign are read as percentages too.
fn parse_confidence(text: &str) -> Option<f64> {
    text.lines().find_map(|line| {
        let lower = line.trim().to_lowercase();
        let rest = lower.strip_prefix("confidence")?;
        let value = rest.trim_start_matches([':', '=', ' ', '*']).trim();
        let number: String = value
            .chars()
            .take_while(|c| c.is_ascii_digit() || *c == '.')
            .collect();
        let parsed: f64 = number.parse().ok()?;
        let scaled = if value[number.len()..].starts_with('%') || parsed > 1.0 {
            parsed / 100.0
        } else {
            parsed
        };
        Some(scaled.clamp(0.0, 1.0))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_output_scores_zero() {
        let a = OutputAssessment::of("   ");
        assert_eq!(a.quality, 0.0);
        assert_eq!(a.length, 0);
    }

    #[test]
    fn test_structured_output_scores_higher() {
        let plain = OutputAssessment::of("looks fine");
        let structured = OutputAssessment::of("## Findings\n- looks fine");
        assert!(structured.quality > plain.quality);
    }

    #[test]
    fn test_refusal_is_penalized() {
        let a = OutputAssessment::of("I cannot help with that request.");
        assert!(a.quality < 0.5);
    }

    #[test]
    fn test_confidence_marker_parsing() {
        assert_eq!(OutputAssessment::of("answer\nCONFIDENCE: 0.8").confidence, Some(0.8));
        assert_eq!(OutputAssessment::of("confidence: 30%").confidence, Some(0.3));
        assert_eq!(OutputAssessment::of("Confidence = 90").confidence, Some(0.9));
        assert_eq!(OutputAssessment::of("no marker").confidence, None);
    }

    #[test]
    fn test_effective_confidence_falls_back_to_quality() {
        let a = OutputAssessment::of("short answer");
        assert_eq!(a.effective_confidence(), a.quality);
    }
}
