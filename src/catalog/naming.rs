// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Human-readable names derived from folder names.

/// Author used when a lesson does not name one.
pub const DEFAULT_AUTHOR: &str = "Gen8";

/// Description used when a lesson does not have one.
pub const DEFAULT_DESCRIPTION: &str = "Không có mô tả.";

/// Icon used for categories missing from [`CATEGORY_ICONS`].
pub const DEFAULT_ICON: &str = "📚";

/// Known category icons, keyed by case-folded category key.
pub const CATEGORY_ICONS: &[(&str, &str)] = &[
    ("slides", "📊"),
    ("worksheets", "📝"),
    ("games", "🎮"),
    ("videos", "🎬"),
    ("documents", "📄"),
];

/// Capitalize every letter that follows a non-letter, lowercase the rest.
///
/// `"unit 1 vocab"` becomes `"Unit 1 Vocab"`, `"gs6"` becomes `"Gs6"`.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut after_letter = false;
    for ch in text.chars() {
        if ch.is_alphabetic() {
            if after_letter {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            after_letter = true;
        } else {
            out.push(ch);
            after_letter = false;
        }
    }

    out
}

/// Turn a folder name into a display name.
///
/// Dashes and underscores become spaces before title casing.
pub fn display_name(segment: &str) -> String {
    title_case(&segment.replace(['-', '_'], " "))
}

/// Default title for a lesson from its path segments below the category.
pub fn default_title<'a>(segments: impl IntoIterator<Item = &'a str>) -> String {
    segments
        .into_iter()
        .map(display_name)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Icon for category key, falling back to [`DEFAULT_ICON`].
pub fn category_icon(key: &str) -> &'static str {
    let key = key.to_lowercase();
    CATEGORY_ICONS
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, icon)| *icon)
        .unwrap_or(DEFAULT_ICON)
}

#[cfg(test)]
mod tests {
    use super::*;
    use simple_test_case::test_case;

    #[test_case("unit-1-vocab", "Unit 1 Vocab"; "dashes")]
    #[test_case("my_first_LESSON", "My First Lesson"; "underscores and caps")]
    #[test_case("GS6-slides", "Gs6 Slides"; "caps folded after first letter")]
    #[test_case("unit1abc", "Unit1Abc"; "letter after digit starts word")]
    #[test_case("bài-học_một", "Bài Học Một"; "vietnamese")]
    #[test_case("", ""; "empty")]
    #[test]
    fn derive_display_name(segment: &str, expect: &str) {
        assert_eq!(display_name(segment), expect);
    }

    #[test]
    fn default_title_joins_segments() {
        assert_eq!(default_title(["unit-1", "lesson_a"]), "Unit 1 Lesson A");
    }

    #[test_case("slides", "📊"; "known")]
    #[test_case("Worksheets", "📝"; "case folded")]
    #[test_case("misc", DEFAULT_ICON; "unknown")]
    #[test]
    fn lookup_category_icon(key: &str, expect: &str) {
        assert_eq!(category_icon(key), expect);
    }
}
