use crate::foundation::core::Label;

/// Decades requested when the caller does not name any.
pub const DEFAULT_DECADES: [&str; 6] = ["1950s", "1960s", "1970s", "1980s", "1990s", "2000s"];

pub fn default_labels() -> Vec<Label> {
    DEFAULT_DECADES.iter().map(|d| Label::from(*d)).collect()
}

/// Instruction sent with the source photo for one decade.
pub fn prompt_for(label: &Label) -> String {
    format!(
        "Reimagine the person in this photo in the style of the {label}. This includes \
         clothing, hairstyle, photo quality, and the overall aesthetic of that decade. \
         The output must be a photorealistic image showing the person clearly."
    )
}

/// Plainer wording used when the service rejects the primary instruction.
pub fn fallback_prompt_for(label: &Label) -> String {
    let decade = label.as_str();
    let year = decade.trim_end_matches('s');
    format!(
        "Create a photograph of the person in this image as if they were living in the \
         {year}s. The photograph should capture the distinct fashion, hairstyles, and \
         overall atmosphere of that time period. Ensure the final image is a clear photograph \
         that looks authentic to the era."
    )
}

#[cfg(test)]
#[path = "../../tests/unit/generation/prompt.rs"]
mod tests;
