//! Story prompt template and output parsing.
//!
//! Text backends return a single completion; the template asks for
//! `STORY:` and `CHARACTER:` sections and [`parse_story_output`]
//! splits them back apart, degrading gracefully when the model
//! ignores the markers.

/// Section marker introducing the story body.
const STORY_MARKER: &str = "STORY:";
/// Section marker introducing the character description.
const CHARACTER_MARKER: &str = "CHARACTER:";

/// Character description used when the completion carries no
/// `CHARACTER:` section.
pub const FALLBACK_CHARACTER: &str = "A mysterious character in this tale.";

/// A parsed story completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoryOutput {
    /// The story body.
    pub story: String,
    /// Visual description of the main character, suitable as an image
    /// prompt seed.
    pub character_description: String,
}

/// Build the full story-generation prompt around the user's prompt.
pub fn story_prompt(user_prompt: &str) -> String {
    format!(
        "You are a creative storyteller. Based on the user's prompt, create an \
         engaging short story (200-300 words) and describe the main character \
         (100-150 words).\n\
         \n\
         User Prompt: {user_prompt}\n\
         \n\
         Please format your response as follows:\n\
         \n\
         STORY:\n\
         [Write an engaging short story here based on the user prompt. Make it \
         vivid, creative, and approximately 200-300 words.]\n\
         \n\
         CHARACTER:\n\
         [Provide a detailed description of the main character, including their \
         appearance, personality, and role in the story. Make it approximately \
         100-150 words and suitable for image generation.]\n\
         \n\
         Make sure both the story and character description are creative, vivid, \
         and engaging. The character description should include specific visual \
         details that would help in creating an image."
    )
}

/// Split a completion into story and character description.
///
/// When both markers are present the text is split on `CHARACTER:`
/// and the `STORY:` prefix is stripped. Otherwise the whole completion
/// is treated as the story with [`FALLBACK_CHARACTER`] substituted.
pub fn parse_story_output(text: &str) -> StoryOutput {
    if let Some((story_part, character_part)) = text.split_once(CHARACTER_MARKER) {
        if text.contains(STORY_MARKER) {
            return StoryOutput {
                story: story_part.replace(STORY_MARKER, "").trim().to_string(),
                character_description: character_part.trim().to_string(),
            };
        }
    }

    StoryOutput {
        story: text.trim().to_string(),
        character_description: FALLBACK_CHARACTER.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_marked_sections() {
        let text = "STORY:\nOnce upon a time.\n\nCHARACTER:\nA tall knight.";
        let parsed = parse_story_output(text);
        assert_eq!(parsed.story, "Once upon a time.");
        assert_eq!(parsed.character_description, "A tall knight.");
    }

    #[test]
    fn falls_back_without_markers() {
        let parsed = parse_story_output("Just a plain story.");
        assert_eq!(parsed.story, "Just a plain story.");
        assert_eq!(parsed.character_description, FALLBACK_CHARACTER);
    }

    #[test]
    fn character_marker_alone_is_not_enough() {
        let parsed = parse_story_output("CHARACTER: someone, somewhere");
        assert_eq!(parsed.character_description, FALLBACK_CHARACTER);
    }

    #[test]
    fn prompt_embeds_user_prompt_and_markers() {
        let prompt = story_prompt("a lighthouse keeper");
        assert!(prompt.contains("User Prompt: a lighthouse keeper"));
        assert!(prompt.contains("STORY:"));
        assert!(prompt.contains("CHARACTER:"));
    }
}
