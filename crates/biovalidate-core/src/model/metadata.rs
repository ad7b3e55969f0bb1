// biovalidate-core/src/model/metadata.rs
// ============================================================================
// Module: Dataset Metadata
// Description: Caller-supplied descriptor accompanying every validated table.
// Purpose: Carry the closed set of recognized format tags and dataset identity.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Dataset metadata `M` is immutable for the lifetime of a validation run. The
//! format tag drives which schema contract and biological-rule set apply.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Format Tag
// ============================================================================

/// The closed set of recognized dataset formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatTag {
    /// CRISPR guide RNA library.
    GuideRna,
    /// Variant annotation sheet.
    VariantAnnotation,
    /// Sample metadata sheet.
    SampleMetadata,
}

impl FormatTag {
    /// Parses a format tag from its wire representation.
    ///
    /// Returns `None` for any tag outside the closed set; callers treat this
    /// as a `critical` schema issue rather than a Rust-level error, since an
    /// unrecognized tag is a data problem, not a programmer error.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "guide_rna" => Some(Self::GuideRna),
            "variant_annotation" => Some(Self::VariantAnnotation),
            "sample_metadata" => Some(Self::SampleMetadata),
            _ => None,
        }
    }

    /// Returns the wire representation of this tag.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GuideRna => "guide_rna",
            Self::VariantAnnotation => "variant_annotation",
            Self::SampleMetadata => "sample_metadata",
        }
    }
}

// ============================================================================
// SECTION: Dataset Metadata
// ============================================================================

/// Dataset metadata accompanying a table through a validation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetMetadata {
    /// Opaque caller-assigned dataset identifier.
    pub dataset_id: String,
    /// Raw format tag as supplied by the caller (may be outside the closed set).
    pub format: String,
    /// Record count as declared by the caller (informational; not authoritative
    /// over `table.len()`).
    pub record_count: usize,
    /// Organism, when known.
    pub organism: Option<String>,
    /// Experiment type, when known.
    pub experiment_type: Option<String>,
    /// Reference genome tag, when known.
    pub reference_genome: Option<String>,
    /// Free-form caller tags.
    #[serde(default)]
    pub tags: Vec<String>,
}

impl DatasetMetadata {
    /// Resolves the declared format tag against the closed set.
    #[must_use]
    pub fn format_tag(&self) -> Option<FormatTag> {
        FormatTag::parse(&self.format)
    }
}
