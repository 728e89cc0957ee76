/// Reasons a dump line is rejected by the parser.
///
/// Both variants are non-fatal: the analyzer consumes them internally and
/// the offending line ends up in the ignored-lines counter (or re-enters
/// the classification chain, for a failed header). No error of this type
/// ever escapes an analysis run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("header line has no quoted thread name")]
    NameMissing,
    #[error("line does not match any known dump construct")]
    UnrecognizedLine,
}
