use crate::selection::Selection;

/// Result of applying a command: which block indices were touched, where
/// the selection ended up, and the document version after the edit. An
/// empty `changed` list means the command was a no-op on the tree (e.g. a
/// style toggle on a collapsed caret, which only flips the typing state).
#[derive(Debug, Clone, PartialEq)]
pub struct Patch {
    pub changed: Vec<usize>,
    pub new_selection: Selection,
    pub version: u64,
}

impl Patch {
    pub fn mutated(&self) -> bool {
        !self.changed.is_empty()
    }
}
