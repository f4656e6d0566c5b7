//! Document titles and upload filenames.

use chrono::NaiveDateTime;

/// Prefix of every document title.
pub const TITLE_LABEL: &str = "German Handwriting: ";

/// Number of leading transcription words kept in a title.
pub const TITLE_WORDS: usize = 10;

/// Prefix of every uploaded file name.
pub const FILENAME_PREFIX: &str = "german_handwriting";

/// Build a title from the first [`TITLE_WORDS`] whitespace-separated tokens.
///
/// Tokens are re-joined with single spaces. Empty or whitespace-only text
/// yields the bare label `"German Handwriting: "`. No ellipsis is added.
///
/// ```rust
/// use pngx_upload::pipeline::title::derive_title;
///
/// assert_eq!(derive_title("  Lieber   Hans,\nwie geht's "), "German Handwriting: Lieber Hans, wie geht's");
/// assert_eq!(derive_title(""), "German Handwriting: ");
/// ```
pub fn derive_title(text: &str) -> String {
    let words: Vec<&str> = text.split_whitespace().take(TITLE_WORDS).collect();
    format!("{TITLE_LABEL}{}", words.join(" "))
}

/// File name for the sample at 0-based `index`, stamped with `now`.
///
/// The sample number is 1-based and zero-padded to five digits, e.g.
/// `german_handwriting_00042_20240131_235959.jpg`.
pub fn upload_filename(index: usize, now: NaiveDateTime) -> String {
    format!(
        "{FILENAME_PREFIX}_{:05}_{}.jpg",
        index + 1,
        now.format("%Y%m%d_%H%M%S")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn keeps_first_ten_words() {
        assert_eq!(
            derive_title("a b c d e f g h i j k l"),
            "German Handwriting: a b c d e f g h i j"
        );
    }

    #[test]
    fn short_text_is_kept_whole() {
        assert_eq!(derive_title("Guten Morgen"), "German Handwriting: Guten Morgen");
    }

    #[test]
    fn empty_and_blank_text_yield_bare_label() {
        assert_eq!(derive_title(""), "German Handwriting: ");
        assert_eq!(derive_title(" \t\n  "), "German Handwriting: ");
    }

    #[test]
    fn whitespace_runs_collapse() {
        assert_eq!(derive_title("eins\n\nzwei\t drei"), "German Handwriting: eins zwei drei");
    }

    #[test]
    fn truncating_again_is_stable() {
        let text = "one two three four five six seven eight nine ten eleven twelve";
        let once = derive_title(text);
        let body = once.strip_prefix(TITLE_LABEL).expect("label prefix");
        assert_eq!(derive_title(body), once);
    }

    #[test]
    fn no_ellipsis_for_long_text() {
        let long = "wort ".repeat(200);
        let title = derive_title(&long);
        assert!(!title.ends_with("..."));
        assert_eq!(title.split_whitespace().count(), 2 + TITLE_WORDS);
    }

    #[test]
    fn filename_is_one_based_and_padded() {
        let now = NaiveDate::from_ymd_opt(2024, 1, 31)
            .and_then(|d| d.and_hms_opt(23, 59, 59))
            .expect("valid timestamp");
        assert_eq!(
            upload_filename(41, now),
            "german_handwriting_00042_20240131_235959.jpg"
        );
    }
}
