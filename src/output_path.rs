//! Collision-safe output path naming, shared by every review mode.
//!
//! The engine only computes names; the caller supplies the existence check
//! and owns the actual write. The check must be read-only and idempotent —
//! it may be invoked once per collision candidate.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::warn;

use crate::error::EngineError;

/// Which review mode the output belongs to. Selects the output directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModeTag {
    Review,
    Comparison,
    MetaReview,
}

impl ModeTag {
    /// Directory the mode writes into.
    pub fn directory(&self) -> &'static str {
        match self {
            Self::Review => "reviews",
            Self::Comparison => "comparisons",
            Self::MetaReview => "meta-reviews",
        }
    }
}

/// Inputs for one path resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputPathRequest {
    /// Artifact-derived base name, used verbatim.
    pub base_name: String,
    /// Raw model identifier; normalized into the file name.
    pub model_identifier: String,
    /// Review date, `YYYY-MM-DD`.
    pub date: String,
    pub mode: ModeTag,
}

impl OutputPathRequest {
    pub fn new(
        base_name: impl Into<String>,
        model_identifier: impl Into<String>,
        date: impl Into<String>,
        mode: ModeTag,
    ) -> Self {
        Self {
            base_name: base_name.into(),
            model_identifier: model_identifier.into(),
            date: date.into(),
            mode,
        }
    }
}

/// A resolved, collision-free output path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputPath {
    pub directory: String,
    pub file_name: String,
    /// Collision suffix, `None` for the canonical name.
    pub suffix: Option<u32>,
}

impl OutputPath {
    /// Joined relative path.
    pub fn path(&self) -> String {
        format!("{}/{}", self.directory, self.file_name)
    }
}

/// Normalize a raw model identifier into a file-name slug.
///
/// Lowercases, keeps `[a-z0-9]`, collapses runs of separators to one
/// hyphen, strips everything else, and trims boundary hyphens. Idempotent.
/// An identifier with nothing left yields `"unknown"`.
///
/// Beyond space, hyphen, dot, and parenthesis, the separator set also
/// treats underscore, slash, colon, and plus as word breaks, so `gpt_4`
/// becomes `gpt-4` (not `gpt4`) and `meta/llama` becomes `meta-llama`.
/// Identifiers in the wild use all of these between words, and dropping
/// them would glue the words together in the canonical file name.
pub fn normalize_model_slug(raw: &str) -> String {
    const SEPARATORS: &[char] = &[' ', '-', '.', '(', ')', '_', '/', ':', '+'];

    let mut slug = String::with_capacity(raw.len());
    for c in raw.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            slug.push(c);
        } else if SEPARATORS.contains(&c) && !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }

    if slug.is_empty() {
        "unknown".to_string()
    } else {
        slug
    }
}

/// Resolve the first non-existing output path for `request`.
///
/// The canonical name is `{base}-{slug}-{date}.md` under the mode's
/// directory. On collision the suffix `-01`, `-02`, ... is appended,
/// zero-padded to two digits and widening naturally past `-99`. Never
/// returns a path the callback reports as existing.
pub fn resolve_output_path(
    request: &OutputPathRequest,
    exists: impl Fn(&str) -> bool,
) -> Result<OutputPath, EngineError> {
    NaiveDate::parse_from_str(&request.date, "%Y-%m-%d")
        .map_err(|_| EngineError::InvalidDate(request.date.clone()))?;

    let slug = normalize_model_slug(&request.model_identifier);
    let directory = request.mode.directory().to_string();
    let stem = format!("{}-{}-{}", request.base_name, slug, request.date);

    let canonical = OutputPath {
        directory: directory.clone(),
        file_name: format!("{stem}.md"),
        suffix: None,
    };
    if !exists(&canonical.path()) {
        return Ok(canonical);
    }

    let mut n = 1u32;
    loop {
        if n == 100 {
            warn!(stem = %stem, "collision suffix widened past -99");
        }
        let candidate = OutputPath {
            directory: directory.clone(),
            file_name: format!("{stem}-{n:02}.md"),
            suffix: Some(n),
        };
        if !exists(&candidate.path()) {
            return Ok(candidate);
        }
        n += 1;
    }
}
