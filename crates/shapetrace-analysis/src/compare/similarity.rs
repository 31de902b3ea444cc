//! Edit-distance name similarity for typo detection.

/// Levenshtein distance over chars.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// `1 - d / max(len)`; 1.0 for two empty names.
pub fn similarity(a: &str, b: &str) -> f64 {
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 1.0;
    }
    1.0 - levenshtein(a, b) as f64 / longest as f64
}

/// Picks the closest plausible candidate for a misspelled name.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TypoDetector {
    pub threshold: f64,
    pub max_edit_distance: usize,
}

impl TypoDetector {
    pub fn new(threshold: f64, max_edit_distance: usize) -> Self {
        Self {
            threshold,
            max_edit_distance,
        }
    }

    pub fn is_plausible(&self, name: &str, candidate: &str) -> bool {
        levenshtein(name, candidate) <= self.max_edit_distance
            || similarity(name, candidate) >= self.threshold
    }

    /// Best plausible candidate other than `name` itself: lowest distance, then the
    /// lexicographically smallest.
    pub fn suggest<'a, I>(&self, name: &str, candidates: I) -> Option<&'a str>
    where
        I: IntoIterator<Item = &'a str>,
    {
        candidates
            .into_iter()
            .filter(|&candidate| candidate != name && self.is_plausible(name, candidate))
            .min_by(|a, b| {
                levenshtein(name, a)
                    .cmp(&levenshtein(name, b))
                    .then_with(|| a.cmp(b))
            })
    }
}
