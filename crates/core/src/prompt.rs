//! Prompt scaffolding for the two image generation steps.
//!
//! Fixed decorations around the generated character description and
//! extracted scene context, tuned for diffusion backends.

/// Build the character-portrait prompt from a character description.
pub fn character_image_prompt(description: &str) -> String {
    format!(
        "portrait of {description}, detailed character art, high quality, \
         professional artwork, centered composition"
    )
}

/// Build the background prompt from a scene phrase.
///
/// The character description is appended as a setting hint so the
/// background stays consistent with the character image; the scaffold
/// still asks for an empty landscape.
pub fn background_image_prompt(scene_context: &str, character_description: &str) -> String {
    let mut prompt = format!(
        "detailed background scene, {scene_context}, atmospheric lighting, \
         no characters, landscape, environment art"
    );
    if !character_description.is_empty() {
        prompt.push_str(&format!(", setting suited to {character_description}"));
    }
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn character_prompt_embeds_description() {
        let prompt = character_image_prompt("a red-cloaked wanderer");
        assert!(prompt.starts_with("portrait of a red-cloaked wanderer,"));
        assert!(prompt.contains("centered composition"));
    }

    #[test]
    fn background_prompt_embeds_scene_and_description() {
        let prompt = background_image_prompt("a forest ancient scene", "a wanderer");
        assert!(prompt.contains("a forest ancient scene"));
        assert!(prompt.contains("no characters"));
        assert!(prompt.ends_with("setting suited to a wanderer"));
    }

    #[test]
    fn background_prompt_omits_empty_description() {
        let prompt = background_image_prompt("a castle dark scene", "");
        assert!(prompt.ends_with("environment art"));
    }
}
