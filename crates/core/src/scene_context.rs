//! Scene-context extraction from generated story text.
//!
//! A deliberately crude keyword scan over two fixed vocabularies. The
//! output is a heuristic seed for a background image prompt, not
//! natural-language understanding.

/// Location/setting vocabulary, scanned first.
pub const LOCATION_TERMS: &[&str] = &[
    "forest", "castle", "city", "mountain", "beach", "desert", "village", "house", "room",
    "garden", "sky", "space",
];

/// Time/mood vocabulary, scanned after locations.
pub const MOOD_TERMS: &[&str] = &[
    "dark", "bright", "sunny", "stormy", "peaceful", "mystical", "ancient", "modern", "magical",
    "mysterious",
];

/// Phrase returned when the story hits no vocabulary term at all.
pub const DEFAULT_SCENE: &str = "a fantasy scene with atmospheric lighting";

/// Maximum number of keywords joined into the scene phrase.
const MAX_KEYWORDS: usize = 3;

/// Derive a short visual-scene phrase from story text.
///
/// Scans both vocabularies in their fixed order (locations before
/// moods, not story order), keeps the first three case-insensitive
/// hits, and joins them as `"a {k1} {k2} {k3} scene"`. Falls back to
/// [`DEFAULT_SCENE`] when nothing matches.
pub fn extract_scene(story_text: &str) -> String {
    let story_lower = story_text.to_lowercase();

    let keywords: Vec<&str> = LOCATION_TERMS
        .iter()
        .chain(MOOD_TERMS.iter())
        .filter(|term| story_lower.contains(*(*term)))
        .take(MAX_KEYWORDS)
        .copied()
        .collect();

    if keywords.is_empty() {
        DEFAULT_SCENE.to_string()
    } else {
        format!("a {} scene", keywords.join(" "))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_hits_yield_exactly_two_keywords() {
        let phrase = extract_scene("An ancient grove deep in the forest.");
        assert_eq!(phrase, "a forest ancient scene");
    }

    #[test]
    fn vocabulary_order_beats_story_order() {
        // "dark" appears before "castle" in the story, but locations
        // are scanned before moods.
        let phrase = extract_scene("It was dark inside the castle.");
        assert_eq!(phrase, "a castle dark scene");
    }

    #[test]
    fn at_most_three_keywords() {
        let phrase = extract_scene("a dark mystical forest near a castle in the mountains");
        assert_eq!(phrase, "a forest castle mountain scene");
    }

    #[test]
    fn no_hits_fall_back_to_default() {
        assert_eq!(extract_scene("Nothing relevant here."), DEFAULT_SCENE);
    }

    #[test]
    fn matching_is_case_insensitive() {
        assert_eq!(extract_scene("THE FOREST"), "a forest scene");
    }
}
