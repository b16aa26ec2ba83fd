/// Generate a fresh leaf/session/directory identifier.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Short form of an ID for log lines.
pub fn short(id: &str) -> &str {
    let end = id
        .char_indices()
        .nth(8)
        .map(|(i, _)| i)
        .unwrap_or(id.len());
    &id[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_ids_are_unique() {
        assert_ne!(new_id(), new_id());
    }

    #[test]
    fn short_truncates_to_eight_chars() {
        assert_eq!(short("0123456789abcdef"), "01234567");
        assert_eq!(short("abc"), "abc");
    }
}
