use serde::{Deserialize, Serialize};

const FIRST_CHOICE: &str = "First Choice";
const FITS: &str = "Fits";
const DOES_NOT_FIT: &str = "Does Not Fit";

/// How a person ranked a single class period.
///
/// Variants are declared lowest priority first so the derived ordering gives
/// `FirstChoice > Fits > DoesNotFit > Unspecified`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PreferenceTier {
    Unspecified,
    DoesNotFit,
    Fits,
    FirstChoice,
}

/// Maps a raw form response to a tier. Unrecognized text is `Unspecified`.
pub fn classify(raw: &str) -> PreferenceTier {
    match raw.trim() {
        FIRST_CHOICE => PreferenceTier::FirstChoice,
        FITS => PreferenceTier::Fits,
        DOES_NOT_FIT => PreferenceTier::DoesNotFit,
        _ => PreferenceTier::Unspecified,
    }
}

impl PreferenceTier {
    /// Same as [`classify`], except "Does Not Fit" is matched ignoring case.
    /// Instructor sheets are filled in by hand more often than student ones.
    pub fn from_instructor_response(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case(DOES_NOT_FIT) {
            PreferenceTier::DoesNotFit
        } else {
            classify(raw)
        }
    }

    /// Whether an instructor with this tier can teach the period
    pub fn makes_available(self) -> bool {
        !matches!(self, PreferenceTier::DoesNotFit | PreferenceTier::Unspecified)
    }

    /// Whether a student with this tier is a candidate for the period
    pub fn is_candidate(self) -> bool {
        matches!(self, PreferenceTier::FirstChoice | PreferenceTier::Fits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_known_responses() {
        assert_eq!(classify("First Choice"), PreferenceTier::FirstChoice);
        assert_eq!(classify("Fits"), PreferenceTier::Fits);
        assert_eq!(classify("Does Not Fit"), PreferenceTier::DoesNotFit);
        assert_eq!(classify("  Fits "), PreferenceTier::Fits);
    }

    #[test]
    fn test_classify_unknown_is_unspecified() {
        assert_eq!(classify(""), PreferenceTier::Unspecified);
        assert_eq!(classify("first choice"), PreferenceTier::Unspecified);
        assert_eq!(classify("does not fit"), PreferenceTier::Unspecified);
        assert_eq!(classify("Maybe"), PreferenceTier::Unspecified);
    }

    #[test]
    fn test_instructor_does_not_fit_ignores_case() {
        assert_eq!(
            PreferenceTier::from_instructor_response("does not FIT"),
            PreferenceTier::DoesNotFit
        );
        assert_eq!(
            PreferenceTier::from_instructor_response("Fits"),
            PreferenceTier::Fits
        );
    }

    #[test]
    fn test_tier_ordering() {
        assert!(PreferenceTier::FirstChoice > PreferenceTier::Fits);
        assert!(PreferenceTier::Fits > PreferenceTier::DoesNotFit);
        assert!(PreferenceTier::DoesNotFit > PreferenceTier::Unspecified);
    }

    #[test]
    fn test_availability() {
        assert!(PreferenceTier::FirstChoice.makes_available());
        assert!(PreferenceTier::Fits.makes_available());
        assert!(!PreferenceTier::DoesNotFit.makes_available());
        assert!(!PreferenceTier::Unspecified.makes_available());
    }
}
