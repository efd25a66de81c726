//! Disaster-relatedness classification.

/// Fixed keyword list. Matching is a substring test on the lowercased text.
pub const DISASTER_KEYWORDS: &[&str] = &[
    "防災",
    "災害",
    "避難",
    "緊急",
    "地震",
    "津波",
    "台風",
    "洪水",
    "土砂災害",
    "警報",
    "disaster",
    "emergency",
    "evacuation",
];

pub fn is_disaster_related(text: &str) -> bool {
    let text = text.to_lowercase();
    DISASTER_KEYWORDS.iter().any(|k| text.contains(k))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_japanese_keywords() {
        assert!(is_disaster_related("避難所開設状況"));
        assert!(is_disaster_related("津波避難ビル"));
        assert!(is_disaster_related("/v2/bousai 防災"));
    }

    #[test]
    fn test_english_keywords_case_insensitive() {
        assert!(is_disaster_related("Disaster Mail"));
        assert!(is_disaster_related("EMERGENCY shelters"));
        assert!(is_disaster_related("evacuation route"));
    }

    #[test]
    fn test_unrelated_text() {
        assert!(!is_disaster_related("Foo bar"));
        assert!(!is_disaster_related("観光イベント"));
        assert!(!is_disaster_related(""));
    }
}
