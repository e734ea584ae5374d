/// Edit distance between two strings, counted in chars.
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr = vec![0; b_chars.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let cost = if ca == *cb { 0 } else { 1 };
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b_chars.len()]
}

/// Closest candidate to `name`, if any lies strictly within `max_distance`.
/// Ties keep the first candidate in iteration order.
pub fn find_similar_name<'a, I>(name: &str, candidates: I, max_distance: usize) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut best: Option<(&str, usize)> = None;
    for candidate in candidates {
        let distance = levenshtein_distance(name, candidate);
        if distance >= max_distance {
            continue;
        }
        match best {
            Some((_, best_distance)) if best_distance <= distance => {}
            _ => best = Some((candidate, distance)),
        }
    }
    best.map(|(candidate, _)| candidate)
}

/// Whether `name` can be used as a positional argument name.
pub fn is_valid_variable_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' => {
            chars.all(|c| c.is_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levenshtein_single_edits() {
        assert_eq!(levenshtein_distance("real", "real"), 0);
        assert_eq!(levenshtein_distance("reel", "real"), 1);
        assert_eq!(levenshtein_distance("int", "ints"), 1);
        assert_eq!(levenshtein_distance("", "bool"), 4);
        assert_eq!(levenshtein_distance("kitten", "sitting"), 3);
    }

    #[test]
    fn similar_name_respects_threshold() {
        let candidates = ["bool", "int", "real", "complex"];
        assert_eq!(find_similar_name("reel", candidates, 2), Some("real"));
        assert_eq!(find_similar_name("quaternion", candidates, 2), None);
    }

    #[test]
    fn variable_names() {
        assert!(is_valid_variable_name("x"));
        assert!(is_valid_variable_name("_theta2"));
        assert!(!is_valid_variable_name("2x"));
        assert!(!is_valid_variable_name("a-b"));
        assert!(!is_valid_variable_name(""));
    }
}
