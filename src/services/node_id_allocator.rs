use std::collections::HashSet;

/// Returns the first `prefix + n` (`n = 1, 2, …`) not already in `existing`.
pub fn allocate(existing: &HashSet<String>, prefix: &str) -> String {
    let mut n: usize = 1;
    loop {
        let candidate = format!("{}{}", prefix, n);
        if !existing.contains(&candidate) {
            return candidate;
        }
        n += 1;
    }
}
