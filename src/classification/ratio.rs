//! English ratio metrics over a transcript

use super::RatioMetric;

const HANGUL_SYLLABLES: std::ops::RangeInclusive<char> = '\u{AC00}'..='\u{D7A3}';

fn is_hangul(c: char) -> bool {
    HANGUL_SYLLABLES.contains(&c)
}

/// Share of English in `text`, in [0, 1]. Text with nothing countable is 0.
pub fn english_ratio(text: &str, metric: RatioMetric) -> f32 {
    let (english, total) = match metric {
        RatioMetric::Letters => letter_counts(text),
        RatioMetric::Words => word_counts(text),
    };
    if total == 0 {
        0.0
    } else {
        (english as f32 / total as f32).min(1.0)
    }
}

/// (Latin letters, Latin letters + Hangul syllables)
fn letter_counts(text: &str) -> (usize, usize) {
    let english = text.chars().filter(char::is_ascii_alphabetic).count();
    let korean = text.chars().filter(|c| is_hangul(*c)).count();
    (english, english + korean)
}

/// (runs of Latin letters, runs of Latin letters, digits or Hangul)
fn word_counts(text: &str) -> (usize, usize) {
    let english = runs(text, |c| c.is_ascii_alphabetic());
    let total = runs(text, |c| c.is_ascii_alphanumeric() || is_hangul(c));
    (english, total)
}

fn runs(text: &str, member: impl Fn(char) -> bool) -> usize {
    let mut count = 0;
    let mut inside = false;
    for c in text.chars() {
        let m = member(c);
        if m && !inside {
            count += 1;
        }
        inside = m;
    }
    count
}
