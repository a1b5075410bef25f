use super::domain::InitialState;

/// Tags registered with the reader and the emotional state each one stands for.
const TAG_TABLE: &[(&str, InitialState)] = &[
    ("feliz", InitialState::Feliz),
    ("a1b2c3", InitialState::Feliz),
    ("triste", InitialState::Triste),
    ("d4e5f6", InitialState::Triste),
    ("deadbeef", InitialState::Triste),
    ("surpreso", InitialState::Surpreso),
    ("neutro", InitialState::Neutro),
];

/// Returns the configured state for a registered tag.
pub fn lookup(tag_id: &str) -> Option<InitialState> {
    let tag_id = tag_id.trim();
    TAG_TABLE
        .iter()
        .find(|(tag, _)| *tag == tag_id)
        .map(|(_, state)| *state)
}

/// Maps any tag to an initial state; unregistered tags are `Neutro`.
pub fn map_tag(tag_id: &str) -> InitialState {
    lookup(tag_id).unwrap_or(InitialState::Neutro)
}
