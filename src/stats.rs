//! Character/word counting and word-limit evaluation.

use std::time::{Duration, Instant};

/// How long the stats panel stays visible after an acknowledgment.
pub const FLASH_DURATION: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Stats {
    pub char_count: usize,
    pub word_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LimitStatus {
    pub display_text: String,
    pub over_limit: bool,
}

pub fn compute_stats(text: &str) -> Stats {
    Stats {
        char_count: text.chars().count(),
        // split_whitespace already trims and collapses runs
        word_count: text.split_whitespace().count(),
    }
}

/// `None` means the limit display is suppressed entirely.
pub fn evaluate_limit(word_count: usize, limit: u32, enabled: bool) -> Option<LimitStatus> {
    if !enabled {
        return None;
    }
    Some(LimitStatus {
        display_text: format!("{} / {}", word_count, limit),
        over_limit: word_count > limit as usize,
    })
}

/// Formats a count with `,` thousands separators, e.g. `12,345`.
pub fn group_thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Transient acknowledgment: visible for `FLASH_DURATION` after the latest
/// trigger. Re-triggering restarts the countdown.
#[derive(Debug, Clone, Copy, Default)]
pub struct Flash {
    until: Option<Instant>,
}

impl Flash {
    pub fn trigger(&mut self, now: Instant) {
        self.until = Some(now + FLASH_DURATION);
    }

    pub fn is_visible(&self, now: Instant) -> bool {
        self.until.is_some_and(|until| now < until)
    }
}

/// Everything the stats panel needs to draw itself.
#[derive(Debug, Clone, Default)]
pub struct StatsDisplay {
    pub stats: Stats,
    pub limit: Option<LimitStatus>,
    pub flash: Flash,
}

impl StatsDisplay {
    pub fn recompute(&mut self, text: &str, limit: u32, enabled: bool, now: Instant) {
        self.stats = compute_stats(text);
        self.limit = evaluate_limit(self.stats.word_count, limit, enabled);
        self.flash.trigger(now);
    }

    /// The persistent warning, independent of the flash.
    pub fn warning_active(&self) -> bool {
        self.limit.as_ref().is_some_and(|status| status.over_limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_text_has_no_words() {
        for text in ["", " ", "\n\n", " \t \r\n ", "\u{3000}"] {
            assert_eq!(compute_stats(text).word_count, 0, "{:?}", text);
        }
    }

    #[test]
    fn words_are_whitespace_delimited_tokens() {
        assert_eq!(compute_stats("hello world").word_count, 2);
        assert_eq!(compute_stats("  hello   world  ").word_count, 2);
        assert_eq!(compute_stats("one\ntwo\tthree").word_count, 3);
        assert_eq!(compute_stats("don't stop-me now!").word_count, 3);
    }

    #[test]
    fn char_count_is_raw() {
        assert_eq!(compute_stats("  a b  ").char_count, 7);
        assert_eq!(compute_stats("café").char_count, 4);
        assert_eq!(compute_stats("").char_count, 0);
    }

    #[test]
    fn limit_boundary() {
        let at = evaluate_limit(500, 500, true).unwrap();
        assert!(!at.over_limit);
        assert_eq!(at.display_text, "500 / 500");

        let over = evaluate_limit(501, 500, true).unwrap();
        assert!(over.over_limit);
        assert_eq!(over.display_text, "501 / 500");

        assert_eq!(evaluate_limit(10_000, 500, false), None);
    }

    #[test]
    fn limit_on_exactly_500_words_of_text() {
        let text = vec!["word"; 500].join(" ");
        let stats = compute_stats(&text);
        assert!(!evaluate_limit(stats.word_count, 500, true).unwrap().over_limit);

        let text = format!("{} extra", text);
        let stats = compute_stats(&text);
        assert!(evaluate_limit(stats.word_count, 500, true).unwrap().over_limit);
    }

    #[test]
    fn thousands_grouping() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(1234567), "1,234,567");
    }

    #[test]
    fn flash_hides_after_two_seconds() {
        let start = Instant::now();
        let mut flash = Flash::default();
        assert!(!flash.is_visible(start));

        flash.trigger(start);
        assert!(flash.is_visible(start + Duration::from_millis(1999)));
        assert!(!flash.is_visible(start + FLASH_DURATION));

        flash.trigger(start + Duration::from_secs(1));
        assert!(flash.is_visible(start + Duration::from_millis(2500)));
    }

    #[test]
    fn recompute_sets_warning_and_flash() {
        let now = Instant::now();
        let mut display = StatsDisplay::default();
        display.recompute("hello world", 1, true, now);
        assert_eq!(display.limit.as_ref().unwrap().display_text, "2 / 1");
        assert!(display.warning_active());
        assert!(display.flash.is_visible(now));

        display.recompute("hello world", 1, false, now);
        assert!(!display.warning_active());
        assert_eq!(display.limit, None);
    }
}
