//! Levenshtein edit distance.
//!
//! Only ever invoked on short inputs (single words or individual answer
//! words), so the quadratic table is acceptable.

/// Minimum number of single-element insertions, deletions and substitutions
/// needed to turn `a` into `b`.
pub fn edit_distance<T: PartialEq>(a: &[T], b: &[T]) -> usize {
    let m = a.len();
    let n = b.len();

    if m == 0 {
        return n;
    }
    if n == 0 {
        return m;
    }

    // table[i][j] = distance between a[..i] and b[..j]
    let mut table = vec![vec![0usize; n + 1]; m + 1];
    for (i, row) in table.iter_mut().enumerate() {
        row[0] = i;
    }
    for (j, cell) in table[0].iter_mut().enumerate() {
        *cell = j;
    }

    for i in 1..=m {
        for j in 1..=n {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            table[i][j] = (table[i - 1][j] + 1) // deletion
                .min(table[i][j - 1] + 1) // insertion
                .min(table[i - 1][j - 1] + cost); // substitution
        }
    }

    table[m][n]
}

/// Edit distance over the Unicode scalar values of two strings.
pub fn edit_distance_str(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    edit_distance(&a, &b)
}
