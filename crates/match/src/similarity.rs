//! String similarity methods, each returning a score in [0.0, 1.0].
//!
//! Identical strings score 1.0 and a non-empty string against an empty one
//! scores 0.0 under every method. Edit-distance and alignment methods are
//! case-sensitive; the bigram methods (`qgram`, `cosine`) lowercase first.

use std::collections::HashMap;
use std::str::FromStr;

use serde::Serialize;

use crate::error::MatchError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    Jaro,
    JaroWinkler,
    Levenshtein,
    DamerauLevenshtein,
    Qgram,
    Cosine,
    SmithWaterman,
    Lcs,
}

impl Method {
    pub const ALL: [Method; 8] = [
        Self::Jaro,
        Self::JaroWinkler,
        Self::Levenshtein,
        Self::DamerauLevenshtein,
        Self::Qgram,
        Self::Cosine,
        Self::SmithWaterman,
        Self::Lcs,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Jaro => "jaro",
            Self::JaroWinkler => "jaro_winkler",
            Self::Levenshtein => "levenshtein",
            Self::DamerauLevenshtein => "damerau_levenshtein",
            Self::Qgram => "qgram",
            Self::Cosine => "cosine",
            Self::SmithWaterman => "smith_waterman",
            Self::Lcs => "lcs",
        }
    }

    pub fn similarity(&self, a: &str, b: &str) -> f64 {
        if a == b {
            return 1.0;
        }
        if a.is_empty() || b.is_empty() {
            return 0.0;
        }
        match self {
            Self::Jaro => strsim::jaro(a, b),
            Self::JaroWinkler => strsim::jaro_winkler(a, b),
            Self::Levenshtein => strsim::normalized_levenshtein(a, b),
            Self::DamerauLevenshtein => strsim::normalized_damerau_levenshtein(a, b),
            Self::Qgram => qgram(a, b),
            Self::Cosine => cosine(a, b),
            Self::SmithWaterman => smith_waterman(a, b),
            Self::Lcs => lcs(a, b),
        }
    }
}

impl FromStr for Method {
    type Err = MatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "jaro" => Ok(Self::Jaro),
            "jaro_winkler" | "jarowinkler" => Ok(Self::JaroWinkler),
            "levenshtein" => Ok(Self::Levenshtein),
            "damerau_levenshtein" => Ok(Self::DamerauLevenshtein),
            "qgram" => Ok(Self::Qgram),
            "cosine" => Ok(Self::Cosine),
            "smith_waterman" => Ok(Self::SmithWaterman),
            "lcs" => Ok(Self::Lcs),
            other => Err(MatchError::UnsupportedMethod(other.to_string())),
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ---------------------------------------------------------------------------
// Bigram methods
// ---------------------------------------------------------------------------

/// Lowercased character bigrams, each word padded with a space on both sides.
fn bigram_counts(s: &str) -> HashMap<[char; 2], u64> {
    let mut counts = HashMap::new();
    for word in s.split_whitespace() {
        let padded: Vec<char> = std::iter::once(' ')
            .chain(word.chars().flat_map(char::to_lowercase))
            .chain(std::iter::once(' '))
            .collect();
        for w in padded.windows(2) {
            *counts.entry([w[0], w[1]]).or_insert(0) += 1;
        }
    }
    counts
}

/// Dice coefficient over bigram multisets.
fn qgram(a: &str, b: &str) -> f64 {
    let ca = bigram_counts(a);
    let cb = bigram_counts(b);
    let total: u64 = ca.values().sum::<u64>() + cb.values().sum::<u64>();
    if total == 0 {
        return 0.0;
    }
    let shared: u64 = ca
        .iter()
        .map(|(gram, n)| (*n).min(cb.get(gram).copied().unwrap_or(0)))
        .sum();
    (2 * shared) as f64 / total as f64
}

/// Cosine similarity of bigram count vectors.
fn cosine(a: &str, b: &str) -> f64 {
    let ca = bigram_counts(a);
    let cb = bigram_counts(b);
    let dot: u64 = ca
        .iter()
        .map(|(gram, n)| n * cb.get(gram).copied().unwrap_or(0))
        .sum();
    let norm_a: u64 = ca.values().map(|n| n * n).sum();
    let norm_b: u64 = cb.values().map(|n| n * n).sum();
    if norm_a == 0 || norm_b == 0 {
        return 0.0;
    }
    (dot as f64 / ((norm_a as f64).sqrt() * (norm_b as f64).sqrt())).min(1.0)
}

// ---------------------------------------------------------------------------
// Alignment methods
// ---------------------------------------------------------------------------

const SW_MATCH: i32 = 5;
const SW_MISMATCH: i32 = -5;
const SW_GAP_OPEN: i32 = -5;
const SW_GAP_EXTEND: i32 = -1;
const NEG_INF: i32 = i32::MIN / 2;

/// Local alignment score with affine gaps, divided by the match score over
/// the mean length of the two strings.
fn smith_waterman(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let m = b.len();

    let mut h_prev = vec![0i32; m + 1];
    let mut f_prev = vec![NEG_INF; m + 1];
    let mut best = 0;

    for ca in &a {
        let mut h_cur = vec![0i32; m + 1];
        let mut f_cur = vec![NEG_INF; m + 1];
        let mut e = NEG_INF;
        for j in 1..=m {
            e = (h_cur[j - 1] + SW_GAP_OPEN).max(e + SW_GAP_EXTEND);
            f_cur[j] = (h_prev[j] + SW_GAP_OPEN).max(f_prev[j] + SW_GAP_EXTEND);
            let step = if *ca == b[j - 1] { SW_MATCH } else { SW_MISMATCH };
            let h = (h_prev[j - 1] + step).max(e).max(f_cur[j]).max(0);
            h_cur[j] = h;
            best = best.max(h);
        }
        h_prev = h_cur;
        f_prev = f_cur;
    }

    let ceiling = f64::from(SW_MATCH) * (a.len() + m) as f64 / 2.0;
    if ceiling == 0.0 {
        return 0.0;
    }
    (f64::from(best) / ceiling).min(1.0)
}

/// Longest common subsequence, Dice-normalized: `2 * lcs / (len_a + len_b)`.
fn lcs(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 0.0;
    }

    let mut prev = vec![0usize; b.len() + 1];
    for ca in &a {
        let mut cur = vec![0usize; b.len() + 1];
        for (j, cb) in b.iter().enumerate() {
            cur[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(cur[j])
            };
        }
        prev = cur;
    }

    (2 * prev[b.len()]) as f64 / total as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn parse_names_and_alias() {
        for m in Method::ALL {
            assert_eq!(m.name().parse::<Method>().unwrap(), m);
        }
        assert_eq!("jarowinkler".parse::<Method>().unwrap(), Method::JaroWinkler);
        let err = "soundex".parse::<Method>().unwrap_err();
        assert!(matches!(err, MatchError::UnsupportedMethod(ref m) if m == "soundex"));
    }

    #[test]
    fn identical_and_empty_edges() {
        for m in Method::ALL {
            assert_eq!(m.similarity("Smith", "Smith"), 1.0, "{m}");
            assert_eq!(m.similarity("", ""), 1.0, "{m}");
            assert_eq!(m.similarity("Smith", ""), 0.0, "{m}");
            assert_eq!(m.similarity("", "Smith"), 0.0, "{m}");
        }
    }

    #[test]
    fn scores_stay_in_unit_range() {
        let pairs = [
            ("Jon Smith", "Jan Smith"),
            ("123 Main St", "123 Main Street"),
            ("a", "zzzzzzzz"),
            ("2019-03-01", "2019-01-03"),
            ("  ", "x"),
        ];
        for m in Method::ALL {
            for (a, b) in pairs {
                let s = m.similarity(a, b);
                assert!((0.0..=1.0).contains(&s), "{m}({a:?}, {b:?}) = {s}");
            }
        }
    }

    #[test]
    fn levenshtein_normalized_by_longer() {
        assert!(close(Method::Levenshtein.similarity("Jon", "John"), 0.75));
        assert!(close(
            Method::Levenshtein.similarity("Jon Smith", "Jan Smith"),
            1.0 - 1.0 / 9.0
        ));
    }

    #[test]
    fn repeated_calls_are_identical() {
        for m in Method::ALL {
            let first = m.similarity("Jon", "John");
            for _ in 0..10 {
                assert_eq!(m.similarity("Jon", "John").to_bits(), first.to_bits());
            }
        }
    }

    #[test]
    fn damerau_counts_transposition_once() {
        assert!(close(Method::DamerauLevenshtein.similarity("ab", "ba"), 0.5));
        assert!(close(Method::Levenshtein.similarity("ab", "ba"), 0.0));
    }

    #[test]
    fn jaro_family_reference_values() {
        let j = Method::Jaro.similarity("MARTHA", "MARHTA");
        let jw = Method::JaroWinkler.similarity("MARTHA", "MARHTA");
        assert!((j - 0.944).abs() < 1e-3);
        assert!((jw - 0.961).abs() < 1e-3);
    }

    #[test]
    fn bigram_methods() {
        // " n","ni","ig","gh","ht","t " vs " n","na","ac","ch","ht","t "
        assert!(close(Method::Qgram.similarity("night", "nacht"), 0.5));
        assert!(close(Method::Cosine.similarity("night", "nacht"), 0.5));
        assert_eq!(Method::Qgram.similarity("SMITH", "smith"), 1.0);
        assert_eq!(Method::Cosine.similarity("abc", "xyz"), 0.0);
    }

    #[test]
    fn smith_waterman_local_alignment() {
        assert!(close(Method::SmithWaterman.similarity("Jon Smith", "Smith"), 25.0 / 35.0));
        assert_eq!(Method::SmithWaterman.similarity("abc", "xyz"), 0.0);
        // "Smith" vs "Smyth": S,m match, y/i mismatch, t,h match -> 5+5-5+5+5
        assert!(close(Method::SmithWaterman.similarity("Smith", "Smyth"), 15.0 / 25.0));
    }

    #[test]
    fn smith_waterman_short_value_is_not_a_top_candidate() {
        // One matching letter over a mean length of 5.
        assert!(close(Method::SmithWaterman.similarity("S", "Jon Smith"), 0.2));
        assert!(Method::SmithWaterman.similarity("S", "Jon Smith") < 0.45);
        assert!(Method::SmithWaterman.similarity("Smith", "Jon Smith Jr") < 1.0);
    }

    #[test]
    fn lcs_dice_ratio() {
        assert!(close(Method::Lcs.similarity("ABCBDAB", "BDCABA"), 8.0 / 13.0));
        assert!(close(Method::Lcs.similarity("Jon", "John"), 6.0 / 7.0));
    }
}
