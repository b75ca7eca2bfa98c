/// Printable width of `s`, ignoring ANSI color escapes.
pub fn plain_len(s: &str) -> usize {
    let mut n = 0;
    let mut esc = false;
    for c in s.chars() {
        match (esc, c) {
            (true, 'm') => esc = false,
            (true, _) => {}
            (false, '\x1B') => esc = true,
            (false, _) => n += 1,
        }
    }
    n
}

pub fn format_age(age: chrono::Duration) -> String {
    let minutes = age.num_minutes();
    match minutes {
        m if m < 1 => "just now".to_string(),
        m if m < 60 => format!("{m}m ago"),
        m if m < 60 * 24 => format!("{}h ago", m / 60),
        m => format!("{}d ago", m / (60 * 24)),
    }
}

pub fn term_width() -> usize {
    term_size::dimensions().map(|(w, _)| w).unwrap_or(80)
}

/// Cuts plain text to `max` characters, marking the cut with an ellipsis.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let keep = max.saturating_sub(1);
    format!("{}…", s.chars().take(keep).collect::<String>())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_len_skips_escapes() {
        assert_eq!(plain_len("\x1B[1;33mabc\x1B[0m"), 3);
        assert_eq!(plain_len("héllo"), 5);
    }

    #[test]
    fn ages_are_coarse() {
        assert_eq!(format_age(chrono::Duration::seconds(10)), "just now");
        assert_eq!(format_age(chrono::Duration::minutes(5)), "5m ago");
        assert_eq!(format_age(chrono::Duration::hours(3)), "3h ago");
        assert_eq!(format_age(chrono::Duration::days(2)), "2d ago");
    }

    #[test]
    fn truncate_marks_the_cut() {
        assert_eq!(truncate("Upper Body", 20), "Upper Body");
        assert_eq!(truncate("Upper Body", 6), "Upper…");
    }
}
