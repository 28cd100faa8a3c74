//! The cover-page metadata record.
//!
//! Every field is optional; the composer substitutes a documented default
//! for each absent one, so an empty record still produces a fully populated
//! cover page. The record is owned by the caller (editor UI or CLI flags),
//! copied by value into the composed document, and never mutated by the
//! pipeline.

use serde::{Deserialize, Serialize};

/// Default substituted for a missing `title`.
pub const DEFAULT_TITLE: &str = "Public Key Infrastructure (PKI)";
/// Default substituted for a missing `subtitle`.
pub const DEFAULT_SUBTITLE: &str = "Implementation & Web Application Integration";
/// Default substituted for a missing `course`.
pub const DEFAULT_COURSE: &str = "CSE 802 - Information Security and Cryptography";
/// Default substituted for a missing `name`.
pub const DEFAULT_NAME: &str = "Nishan Paul";
/// Default substituted for a missing `roll`.
pub const DEFAULT_ROLL: &str = "JN-50028";
/// Default substituted for a missing `reg`.
pub const DEFAULT_REG: &str = "H-55";
/// Default substituted for a missing `batch`.
pub const DEFAULT_BATCH: &str = "05";
/// Default substituted for a missing `date`.
pub const DEFAULT_DATE: &str = "December 18, 2025";

/// Cover-page metadata supplied alongside the markdown document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportMetadata {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub course: Option<String>,
    pub name: Option<String>,
    pub roll: Option<String>,
    pub reg: Option<String>,
    pub batch: Option<String>,
    pub date: Option<String>,
}

impl ReportMetadata {
    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or(DEFAULT_TITLE)
    }

    pub fn subtitle(&self) -> &str {
        self.subtitle.as_deref().unwrap_or(DEFAULT_SUBTITLE)
    }

    pub fn course(&self) -> &str {
        self.course.as_deref().unwrap_or(DEFAULT_COURSE)
    }

    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or(DEFAULT_NAME)
    }

    pub fn roll(&self) -> &str {
        self.roll.as_deref().unwrap_or(DEFAULT_ROLL)
    }

    pub fn reg(&self) -> &str {
        self.reg.as_deref().unwrap_or(DEFAULT_REG)
    }

    pub fn batch(&self) -> &str {
        self.batch.as_deref().unwrap_or(DEFAULT_BATCH)
    }

    pub fn date(&self) -> &str {
        self.date.as_deref().unwrap_or(DEFAULT_DATE)
    }
}
