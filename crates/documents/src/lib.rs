//! Discharge summary documents.
//!
//! Rendering is a two-step pipeline:
//! - [`html::expand_discharge_summary`] substitutes a summary and its patient into a fixed
//!   HTML layout.
//! - [`pdf::convert`] parses that HTML and lays it out on A4 pages, resolving every
//!   stylesheet and image reference through a [`ResourceResolver`] first.
//!
//! The renderer never writes to disk and never touches the network. Local images are read
//! and embedded; anything resolved to a URL is only recorded on the [`RenderedDocument`].

pub mod html;
pub mod pdf;
pub mod resolver;

pub use resolver::{AssetPaths, ResolvedResource, ResourceKind, ResourceLocation, ResourceResolver};

use records::{DischargeSummaryRecord, PatientRecord};

/// MIME type of every rendered document.
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("{0}")]
    Conversion(String),
    #[error("discharge summary {summary_id} belongs to {expected}, not {actual}")]
    PatientMismatch {
        summary_id: u64,
        expected: String,
        actual: String,
    },
}

pub type RenderResult<T> = std::result::Result<T, RenderError>;

/// A rendered PDF ready to be streamed or written out.
#[derive(Clone, Debug)]
pub struct RenderedDocument {
    pub bytes: Vec<u8>,
    /// Suggested download name, `discharge_summary_<id>.pdf`.
    pub filename: String,
    pub content_type: &'static str,
    /// Every stylesheet and image reference met during conversion, in document order.
    pub resources: Vec<ResolvedResource>,
}

impl RenderedDocument {
    /// `Content-Disposition` value for inline display.
    pub fn inline_disposition(&self) -> String {
        format!("inline; filename={}", self.filename)
    }
}

/// File name used for the PDF export of a discharge summary.
pub fn discharge_summary_filename(summary_id: u64) -> String {
    format!("discharge_summary_{summary_id}.pdf")
}

/// Renders a discharge summary for `patient` to PDF.
///
/// # Errors
///
/// Returns [`RenderError::PatientMismatch`] if the summary was written for a different
/// patient, and [`RenderError::Conversion`] with the converter's diagnostic for any layout
/// or serialisation failure. No partial document is ever returned.
pub fn render_discharge_pdf(
    patient: &PatientRecord,
    summary: &DischargeSummaryRecord,
    resolver: &ResourceResolver,
) -> RenderResult<RenderedDocument> {
    if summary.patient_id != patient.patient_id {
        return Err(RenderError::PatientMismatch {
            summary_id: summary.id,
            expected: summary.patient_id.to_string(),
            actual: patient.patient_id.to_string(),
        });
    }

    let markup = html::expand_discharge_summary(patient, summary, resolver.static_url());
    let title = format!("Discharge Summary - {}", patient.name);
    let conversion = pdf::convert(&markup, &title, resolver)?;

    tracing::info!(
        summary_id = summary.id,
        patient_id = %patient.patient_id,
        bytes = conversion.bytes.len(),
        "rendered discharge summary"
    );

    Ok(RenderedDocument {
        bytes: conversion.bytes,
        filename: discharge_summary_filename(summary.id),
        content_type: PDF_CONTENT_TYPE,
        resources: conversion.resources,
    })
}
