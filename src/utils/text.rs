/// Single-line preview of at most `limit` characters, with `...` appended
/// when anything was cut.
pub fn clip(value: &str, limit: usize) -> String {
    let single_line = value.replace(['\r', '\n'], " ");
    if single_line.chars().count() <= limit {
        return single_line;
    }
    let kept: String = single_line.chars().take(limit).collect();
    format!("{kept}...")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_values_pass_through_flattened() {
        assert_eq!(clip("abc", 5), "abc");
        assert_eq!(clip("a\nb", 5), "a b");
    }

    #[test]
    fn long_values_are_cut_on_char_boundaries() {
        assert_eq!(clip("ééééé", 2), "éé...");
        let long = format!("line one\n{}", "x".repeat(200));
        let shown = clip(&long, 80);
        assert!(!shown.contains('\n'));
        assert_eq!(shown.chars().count(), 83);
    }
}
