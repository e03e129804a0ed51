//! Seller information blocks.
//!
//! Both transforms encode the layout of the marketplace's seller card and
//! company page as scraped; the positions and marker strings below are not
//! general rules and only hold for that layout.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use super::{escaped_lines, non_empty, unsupported, FieldTransform, FieldValue, TransformResult};
use crate::constants::{
    COMPANY_FOUNDED, COMPANY_INTRO_TRAILER, COMPANY_PRIMARY_BUSINESS, COMPANY_REPEAT_RATE,
    DETAIL_BASIC_SECTION, DETAIL_BUSINESS_SECTION, DETAIL_FLAT_HEADER, DETAIL_INDUSTRY_SECTION,
    FIELD_COMPANY_DETAIL, FIELD_COMPANY_SUMMARY,
};
use crate::pipeline::processing::normalize::shape::{RawItem, RawShape};
use crate::types::{CompanyDetail, CompanySummary, TextMap};

static REPEAT_RATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"回头率\s*(\d+%)").expect("repeat rate pattern is valid"));
static FOUNDED_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"成立时间\s*(\d{4}-\d{2}-\d{2})").expect("founded date pattern is valid")
});

// Seller card rows, by position
const CARD_NAME: usize = 0;
const CARD_RATES: usize = 1;
const CARD_FOUNDED: usize = 2;
const CARD_INTRO: usize = 3;

/// Seller card: `[[name], [repeat rate + primary business], [founded], [intro]]`
pub struct CompanySummaryTransform;

impl FieldTransform for CompanySummaryTransform {
    fn key(&self) -> &'static str {
        FIELD_COMPANY_SUMMARY
    }

    fn transform(&self, shape: &RawShape) -> TransformResult {
        let RawShape::NestedList(items) = shape else {
            return Err(unsupported(FIELD_COMPANY_SUMMARY, shape));
        };

        let mut summary = CompanySummary::default();
        for (position, item) in items.iter().enumerate() {
            let RawItem::Row(row) = item else {
                continue;
            };
            let Some(content) = row.first() else {
                continue;
            };

            match position {
                CARD_NAME => summary.name = non_empty(content),
                CARD_RATES => {
                    if content.contains(COMPANY_REPEAT_RATE) {
                        summary.repeat_rate = capture(&REPEAT_RATE, content);
                    }
                    // text between the first marker and the next one, if any
                    summary.primary_business = content
                        .split(COMPANY_PRIMARY_BUSINESS)
                        .nth(1)
                        .and_then(non_empty);
                }
                CARD_FOUNDED => {
                    if content.contains(COMPANY_FOUNDED) {
                        summary.founded = capture(&FOUNDED_DATE, content);
                    }
                }
                CARD_INTRO => {
                    summary.intro = match content.split_once(COMPANY_INTRO_TRAILER) {
                        Some((intro, _)) => non_empty(intro),
                        None => non_empty(content),
                    };
                }
                _ => {}
            }
        }

        Ok((!summary.is_empty()).then_some(FieldValue::CompanySummary(summary)))
    }
}

fn capture(pattern: &Regex, text: &str) -> Option<String> {
    pattern
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Company page text in one of two layouts, detected from the first line:
/// `经营模式` starts a flat label/value list, `基本信息` starts a sectioned one.
pub struct CompanyDetailTransform;

impl FieldTransform for CompanyDetailTransform {
    fn key(&self) -> &'static str {
        FIELD_COMPANY_DETAIL
    }

    fn transform(&self, shape: &RawShape) -> TransformResult {
        if let RawShape::Unsupported(_) = shape {
            return Err(unsupported(FIELD_COMPANY_DETAIL, shape));
        }
        let text = shape.first_leaf().map(str::trim).unwrap_or("");

        let parts: Vec<String> = escaped_lines(text)
            .iter()
            .filter_map(|line| non_empty(line))
            .collect();
        let Some(first) = parts.first() else {
            return Ok(None);
        };

        let detail = if first == DETAIL_BASIC_SECTION {
            let sections = sectioned_pairs(&parts[1..]);
            (!sections.is_empty()).then_some(CompanyDetail::Sectioned(sections))
        } else {
            if first != DETAIL_FLAT_HEADER {
                debug!("Unrecognized company detail layout '{}', reading flat pairs", first);
            }
            let pairs = flat_pairs(&parts);
            (!pairs.is_empty()).then_some(CompanyDetail::Flat(pairs))
        };
        Ok(detail.map(FieldValue::CompanyDetail))
    }
}

fn flat_pairs(parts: &[String]) -> TextMap {
    parts
        .chunks_exact(2)
        .map(|pair| (pair[0].clone(), pair[1].clone()))
        .collect()
}

/// Pairs before any section header belong to the basic section.
/// A dangling label at the end is dropped, as are sections left empty.
fn sectioned_pairs(parts: &[String]) -> IndexMap<String, TextMap> {
    let mut sections: IndexMap<String, TextMap> = IndexMap::new();
    let mut current: &str = DETAIL_BASIC_SECTION;
    let mut i = 0;

    while i < parts.len() {
        let part = parts[i].as_str();
        if part == DETAIL_INDUSTRY_SECTION || part == DETAIL_BUSINESS_SECTION {
            current = part;
            // a repeated header starts the section over
            sections.insert(current.to_string(), TextMap::new());
            i += 1;
            continue;
        }
        let Some(value) = parts.get(i + 1) else {
            break;
        };
        sections
            .entry(current.to_string())
            .or_default()
            .insert(part.to_string(), value.clone());
        i += 2;
    }

    sections.retain(|_, pairs| !pairs.is_empty());
    sections
}
