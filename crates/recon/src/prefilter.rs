//! Shape-only plausibility check for location strings.
//!
//! A positive answer never declares two venues equivalent on its own; it only
//! decides whether a human gets asked.

/// Default edit budget as a fraction of the longer string's length.
pub const DEFAULT_MAX_EDIT_RATIO: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prefilter {
    max_edit_ratio: f64,
}

impl Default for Prefilter {
    fn default() -> Self {
        Self {
            max_edit_ratio: DEFAULT_MAX_EDIT_RATIO,
        }
    }
}

impl Prefilter {
    pub fn new(max_edit_ratio: f64) -> Self {
        Self {
            max_edit_ratio: max_edit_ratio.clamp(0.0, 1.0),
        }
    }

    pub fn max_edit_ratio(&self) -> f64 {
        self.max_edit_ratio
    }

    /// Containment either way, or Levenshtein distance within the budget.
    pub fn is_plausible(&self, a: &str, b: &str) -> bool {
        let a = normalize(a);
        let b = normalize(b);

        if a.contains(b.as_str()) || b.contains(a.as_str()) {
            return true;
        }

        let longer = a.chars().count().max(b.chars().count());
        let budget = (longer as f64 * self.max_edit_ratio).floor() as usize;
        strsim::levenshtein(&a, &b) <= budget
    }
}

fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

/// [`Prefilter::is_plausible`] with the default ratio.
pub fn is_plausible(a: &str, b: &str) -> bool {
    Prefilter::default().is_plausible(a, b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn containment_is_plausible() {
        assert!(is_plausible("Fenway Park", "Fenway"));
        assert!(is_plausible("fenway", "  FENWAY PARK "));
        assert!(is_plausible("Lawrence / LSD #4", "lawrence"));
    }

    #[test]
    fn small_typo_is_plausible() {
        // 1 edit, budget floor(11 * 0.2) = 2
        assert!(is_plausible("Fenway Park", "Fenway Parc"));
        // transposition costs 2 under Levenshtein, budget floor(13 * 0.2) = 2
        assert!(is_plausible("Wrigley Field", "Wrigley Feild"));
    }

    #[test]
    fn unrelated_is_rejected() {
        assert!(!is_plausible("Shea Stadium", "Fenway Park"));
        assert!(!is_plausible("St Bens", "Welles Park"));
    }

    #[test]
    fn threshold_boundary_counts_as_plausible() {
        // "abcde" vs "abxde": distance 1, budget floor(5 * 0.2) = 1
        assert!(is_plausible("abcde", "abxde"));
        // distance 2 over the same budget
        assert!(!is_plausible("abcde", "axcxe"));
    }

    #[test]
    fn ratio_is_configurable() {
        let strict = Prefilter::new(0.0);
        assert!(!strict.is_plausible("Fenway Park", "Fenway Parc"));
        assert!(strict.is_plausible("Fenway Park", "fenway park"));

        let loose = Prefilter::new(1.0);
        assert!(loose.is_plausible("Shea Stadium", "Fenway Park"));
    }
}
