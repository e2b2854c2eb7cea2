/// Smallest number of tweets a single request may ask for.
pub const MIN_COUNT: u32 = 1;
/// Largest number of tweets a single request may ask for.
pub const MAX_COUNT: u32 = 10;

/// Languages offered by the generator, as (display name, ISO 639-1 code).
pub const SUPPORTED_LANGUAGES: &[(&str, &str)] = &[
    ("English", "en"),
    ("Hindi", "hi"),
    ("French", "fr"),
    ("Spanish", "es"),
    ("German", "de"),
    ("Bengali", "bn"),
    ("Tamil", "ta"),
    ("Telugu", "te"),
];

const KEY_POINTS_INSTRUCTION: &str =
    "For each tweet, also list key points or the main idea before the tweet.";

/// Resolves a display name such as `"Hindi"` to its language code.
pub fn language_code(name: &str) -> Option<&'static str> {
    SUPPORTED_LANGUAGES
        .iter()
        .find(|(lang, _)| *lang == name)
        .map(|(_, code)| *code)
}

/// Formats the model request for `count` tweets about `topic` in `language`.
///
/// No validation happens here; callers check the count range, topic and
/// language before building.
pub fn build(count: u32, topic: &str, language: &str) -> String {
    format!(
        "Generate {} tweets on '{}' in {}. {}",
        count, topic, language, KEY_POINTS_INSTRUCTION
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_substitutes_all_parameters() {
        let prompt = build(3, "monsoon travel", "Bengali");
        assert_eq!(
            prompt,
            "Generate 3 tweets on 'monsoon travel' in Bengali. \
             For each tweet, also list key points or the main idea before the tweet."
        );
    }

    #[test]
    fn build_keeps_topic_verbatim() {
        let topic = "{count} and {language} braces";
        let prompt = build(7, topic, "German");
        assert!(prompt.contains(topic));
        assert!(prompt.contains("Generate 7 tweets"));
        assert!(prompt.contains("in German."));
    }

    #[test]
    fn language_lookup() {
        assert_eq!(language_code("Telugu"), Some("te"));
        assert_eq!(language_code("English"), Some("en"));
        assert_eq!(language_code("english"), None);
        assert_eq!(language_code("Klingon"), None);
    }

    #[test]
    fn every_language_builds() {
        for (name, _) in SUPPORTED_LANGUAGES {
            for count in [MIN_COUNT, MAX_COUNT] {
                let prompt = build(count, "cricket", name);
                assert!(prompt.contains(name));
                assert!(prompt.contains(&count.to_string()));
            }
        }
    }
}
