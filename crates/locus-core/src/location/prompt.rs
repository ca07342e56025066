//! Detector prompt construction.

use crate::types::TagSet;

/// Join tag labels into a Grounding DINO text prompt.
///
/// Labels keep their insertion order and are separated by `". "`, with a
/// trailing `"."`. An empty tag set yields `"."`.
pub fn build_prompt(tags: &TagSet) -> String {
    let mut prompt = tags.labels().collect::<Vec<_>>().join(". ");
    prompt.push('.');
    prompt
}
