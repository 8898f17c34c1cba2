//! Error types with diagnostics using miette
//!
//! Contract violations by the command producer surface as [`CanvasError`].
//! Markup and measurement failures are recoverable and are normally absorbed
//! by the text renderer, but they are public so hosts can report them.

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

use crate::dom::NodeId;

// ============================================================================
// Canvas Errors
// ============================================================================

/// Errors raised by the drawing surface
#[derive(Error, Diagnostic, Debug)]
pub enum CanvasError {
    #[error("restore() called without a matching save()")]
    #[diagnostic(
        code(svgcanvas::state::unbalanced_restore),
        help("every restore() must be paired with an earlier save()")
    )]
    UnbalancedRestore,

    #[error("set_link(None) called while no link is open")]
    #[diagnostic(
        code(svgcanvas::link::unbalanced_link),
        help("close each link scope exactly once with set_link(None)")
    )]
    UnbalancedLink,

    #[error("node {node:?} does not belong to this document")]
    #[diagnostic(code(svgcanvas::dom::unknown_node))]
    UnknownNode { node: NodeId },

    #[error("invalid base URL {url:?}")]
    #[diagnostic(
        code(svgcanvas::convert::invalid_base_url),
        help("image sources are resolved against an absolute page URL")
    )]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("XML serialization error: {message}")]
    #[diagnostic(code(svgcanvas::dom::serialize))]
    Serialize { message: String },
}

// ============================================================================
// Markup Errors
// ============================================================================

/// The label markup could not be tokenized
#[derive(Error, Diagnostic, Debug)]
#[error("invalid label markup")]
#[diagnostic(
    code(svgcanvas::markup::invalid),
    help("labels are rendered as XHTML inside a foreign-content block")
)]
pub struct MarkupError {
    #[source_code]
    pub src: NamedSource<String>,
    #[label("cannot tokenize from here")]
    pub span: SourceSpan,
    pub details: String,
}

impl MarkupError {
    pub(crate) fn new(source: &str, offset: usize, details: impl Into<String>) -> Self {
        let offset = offset.min(source.len());
        Self {
            src: NamedSource::new("<label>", source.to_string()),
            span: (offset, 0).into(),
            details: details.into(),
        }
    }
}

// ============================================================================
// Measurement Errors
// ============================================================================

/// A text measurement or bounding-box query failed
#[derive(Error, Diagnostic, Debug, Clone, PartialEq)]
pub enum MeasureError {
    #[error("node has no measurable content")]
    #[diagnostic(code(svgcanvas::measure::empty))]
    Empty,

    #[error("measured size is not finite: {width} x {height}")]
    #[diagnostic(code(svgcanvas::measure::non_finite))]
    NonFinite { width: f64, height: f64 },

    #[error("node {node:?} is not attached to a measurable document")]
    #[diagnostic(code(svgcanvas::measure::detached))]
    Detached { node: NodeId },
}
