pub mod board;
pub mod common;
pub mod error;
pub mod schema;
pub mod schematic;
pub mod sexpr;

use std::path::Path;

use board::KicadPcb;
use error::ParseError;
use schematic::KicadSch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Schematic,
    Board,
}

/// Parsing is permissive by default so newer and older format revisions
/// both load; `strict` turns unknown top-level records into hard errors
/// for validation tooling.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParseOptions {
    pub strict: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum KicadDocument {
    Schematic(KicadSch),
    Board(KicadPcb),
}

/// Detect format from a file extension.
pub fn detect_format(path: &Path) -> Option<DocumentFormat> {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .as_deref()
    {
        Some("kicad_sch") => Some(DocumentFormat::Schematic),
        Some("kicad_pcb") => Some(DocumentFormat::Board),
        _ => None,
    }
}

/// Parse a `.kicad_sch` document from fully-materialized text.
pub fn parse_schematic(text: &str, opts: &ParseOptions) -> Result<KicadSch, ParseError> {
    KicadSch::parse(&sexpr::parse(text)?, opts)
}

/// Parse a `.kicad_pcb` document from fully-materialized text.
pub fn parse_board(text: &str, opts: &ParseOptions) -> Result<KicadPcb, ParseError> {
    KicadPcb::parse(&sexpr::parse(text)?, opts)
}

/// Parse with an explicit format.
pub fn parse_document(
    text: &str,
    format: DocumentFormat,
    opts: &ParseOptions,
) -> Result<KicadDocument, ParseError> {
    match format {
        DocumentFormat::Schematic => parse_schematic(text, opts).map(KicadDocument::Schematic),
        DocumentFormat::Board => parse_board(text, opts).map(KicadDocument::Board),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_format() {
        assert_eq!(
            detect_format(Path::new("amp.kicad_sch")),
            Some(DocumentFormat::Schematic)
        );
        assert_eq!(
            detect_format(Path::new("amp.kicad_pcb")),
            Some(DocumentFormat::Board)
        );
        assert_eq!(detect_format(Path::new("amp.kicad_pro")), None);
    }

    #[test]
    fn test_parse_failure_returns_no_document() {
        assert!(parse_schematic("(kicad_sch (wire", &ParseOptions::default()).is_err());
    }

    #[test]
    fn test_wrong_root_tag() {
        let err = parse_board("(kicad_sch (version 1))", &ParseOptions::default()).unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedTag { .. }));
    }
}
