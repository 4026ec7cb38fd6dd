use thiserror::Error;

/// Failures while turning a parsed document into draw calls.
#[derive(Error, Debug)]
pub enum DrawError {
    /// Cross-reference resolution failed; the geometry would be wrong, so
    /// the paint pass aborts instead of guessing.
    #[error(transparent)]
    Lookup(#[from] kicad_parse::error::LookupError),

    #[error("no layer named `{0}` in the layer set")]
    UnknownLayer(String),
}
