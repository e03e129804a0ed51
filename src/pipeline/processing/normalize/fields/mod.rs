// Per-field transforms of the product sheet columns
pub mod company;
pub mod pairs;
pub mod tables;
pub mod text;

pub use company::{CompanyDetailTransform, CompanySummaryTransform};
pub use pairs::{DetailsTransform, SalesTransform, TimestampsTransform};
pub use tables::{PackageWeightTransform, SkuTransform};
pub use text::{ImageListTransform, PriceTransform, ProductUrlTransform, TitleTransform};

use super::shape::RawShape;
use crate::error::FieldError;
use crate::types::{CompanyDetail, CompanySummary, PackageRow, SkuEntry, TextMap};

/// A successfully normalized field value
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Title(String),
    Timestamps(TextMap),
    Price(String),
    Sales(TextMap),
    Details(TextMap),
    PackageWeight(Vec<PackageRow>),
    MainImages(Vec<String>),
    DetailImages(Vec<String>),
    Skus(Vec<SkuEntry>),
    ProductUrl(String),
    CompanySummary(CompanySummary),
    CompanyDetail(CompanyDetail),
}

/// `Ok(None)` means the shape was understood but nothing usable was left
pub type TransformResult = Result<Option<FieldValue>, FieldError>;

/// Converts the raw cell of one column into its typed value
pub trait FieldTransform: Send + Sync {
    /// Column name this transform reads and writes
    fn key(&self) -> &'static str;

    fn transform(&self, shape: &RawShape) -> TransformResult;
}

pub(crate) fn unsupported(field: &'static str, shape: &RawShape) -> FieldError {
    FieldError::UnsupportedShape {
        field,
        shape: shape.name(),
    }
}

pub(crate) fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Lines of a table cell; the literal two-character `\n` escape also breaks lines
pub(crate) fn escaped_lines(text: &str) -> Vec<String> {
    text.replace("\\n", "\n")
        .replace("\r\n", "\n")
        .split('\n')
        .map(str::to_string)
        .collect()
}
