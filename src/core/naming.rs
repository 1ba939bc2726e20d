// Unique record names
// Colliding names get a numeric suffix; the stem is truncated to keep the name within the field

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref TRAILING_DIGITS: Regex = Regex::new(r"^(.*?)(\d+)$").unwrap();
}

/// Split "Repeater12" into ("Repeater", Some(12))
pub fn split_suffix(name: &str) -> (&str, Option<u64>) {
    match TRAILING_DIGITS.captures(name) {
        Some(caps) => {
            let stem = caps.get(1).map_or("", |m| m.as_str());
            let number = caps.get(2).and_then(|m| m.as_str().parse().ok());
            match number {
                Some(n) => (stem, Some(n)),
                None => (name, None),
            }
        }
        None => (name, None),
    }
}

/// Return `name` if it is free, otherwise the first free suffixed variant
/// that fits in `max_len` characters. `None` when no such name exists.
pub fn unique_name(name: &str, max_len: usize, taken: impl Fn(&str) -> bool) -> Option<String> {
    let free = !taken(name);
    if free && name.chars().count() <= max_len {
        return Some(name.to_string());
    }

    // A free name that is only too long keeps its own number
    let (stem, number) = split_suffix(name);
    let mut n = match number {
        Some(n) if free => n,
        Some(n) => n + 1,
        None => 1,
    };
    loop {
        let suffix = n.to_string();
        if suffix.len() > max_len {
            return None;
        }
        let room = max_len - suffix.len();
        let candidate: String = stem.chars().take(room).chain(suffix.chars()).collect();
        if !taken(&candidate) {
            return Some(candidate);
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn taken(names: &[&str]) -> HashSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_split_suffix() {
        assert_eq!(split_suffix("Repeater12"), ("Repeater", Some(12)));
        assert_eq!(split_suffix("Simplex"), ("Simplex", None));
        assert_eq!(split_suffix("42"), ("", Some(42)));
    }

    #[test]
    fn test_unique_name_increments() {
        let names = taken(&["Repeater1", "Repeater2", "Simplex"]);
        let is_taken = |n: &str| names.contains(n);
        assert_eq!(unique_name("Repeater1", 16, is_taken).unwrap(), "Repeater3");
        assert_eq!(unique_name("Simplex", 16, is_taken).unwrap(), "Simplex1");
        assert_eq!(unique_name("Local", 16, is_taken).unwrap(), "Local");
    }

    #[test]
    fn test_unique_name_truncates_stem() {
        let names = taken(&["ABCD"]);
        assert_eq!(unique_name("ABCD", 4, |n| names.contains(n)).unwrap(), "ABC1");
        assert_eq!(unique_name("ABCDEFG", 4, |_| false).unwrap(), "ABC1");
    }

    #[test]
    fn test_overlong_free_name_keeps_its_number() {
        assert_eq!(unique_name("Channels1", 4, |_| false).unwrap(), "Cha1");
        assert_eq!(unique_name("Channels12", 4, |_| false).unwrap(), "Ch12");
        let names = taken(&["Cha1"]);
        assert_eq!(unique_name("Channels1", 4, |n| names.contains(n)).unwrap(), "Cha2");
    }

    #[test]
    fn test_name_space_exhausted() {
        assert_eq!(unique_name("A", 1, |_| true), None);
    }
}
