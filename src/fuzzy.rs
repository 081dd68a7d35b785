// 🔍 Fuzzy Matching - Levenshtein distance with a length-scaled threshold
//
// Three tiers, cheapest first:
//   1. exact substring
//   2. whole-value distance within threshold
//   3. any same-length window of the value within threshold

/// Calculate Levenshtein distance between two strings
///
/// Minimum number of single-character edits (insertions, deletions,
/// substitutions) to change one string into another. Works on chars, not bytes.
pub fn levenshtein_distance(s1: &str, s2: &str) -> usize {
    let s1_chars: Vec<char> = s1.chars().collect();
    let s2_chars: Vec<char> = s2.chars().collect();
    levenshtein_chars(&s1_chars, &s2_chars)
}

fn levenshtein_chars(s1: &[char], s2: &[char]) -> usize {
    let len1 = s1.len();
    let len2 = s2.len();

    if len1 == 0 {
        return len2;
    }
    if len2 == 0 {
        return len1;
    }

    let mut matrix = vec![vec![0; len2 + 1]; len1 + 1];

    // Initialize first row and column
    for (i, row) in matrix.iter_mut().enumerate() {
        row[0] = i;
    }
    for j in 0..=len2 {
        matrix[0][j] = j;
    }

    for i in 1..=len1 {
        for j in 1..=len2 {
            let cost = if s1[i - 1] == s2[j - 1] { 0 } else { 1 };

            matrix[i][j] = std::cmp::min(
                std::cmp::min(
                    matrix[i - 1][j] + 1, // deletion
                    matrix[i][j - 1] + 1, // insertion
                ),
                matrix[i - 1][j - 1] + cost, // substitution
            );
        }
    }

    matrix[len1][len2]
}

/// Allowed edit distance for a pattern of `pattern_len` characters
pub fn allowed_distance(pattern_len: usize) -> usize {
    match pattern_len {
        0..=3 => 1,
        4..=7 => 2,
        _ => 3,
    }
}

/// Check whether `value` approximately contains or equals `pattern`
pub fn fuzzy_match(value: &str, pattern: &str) -> bool {
    if value.contains(pattern) {
        return true;
    }

    let value_chars: Vec<char> = value.chars().collect();
    let pattern_chars: Vec<char> = pattern.chars().collect();
    let allowed = allowed_distance(pattern_chars.len());

    if levenshtein_chars(&value_chars, &pattern_chars) <= allowed {
        return true;
    }

    // Slide a window of pattern length over the value
    if value_chars.len() >= pattern_chars.len() {
        return value_chars
            .windows(pattern_chars.len().max(1))
            .any(|window| levenshtein_chars(window, &pattern_chars) <= allowed);
    }

    false
}

// ============================================================================
// TESTS
// ============================================================================
