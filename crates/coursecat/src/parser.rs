use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::types::{CourseRecord, Field, Units};

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Input is not markup: {0}")]
    NotMarkup(String),
}

const HEADING_DELIMITER: &str = " - ";

static RE_MARKUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[!/?A-Za-z]").expect("invalid regex: markup"));
// One or two uppercase words joined by a single space, e.g. "CMPUT" or "INT D".
static RE_DEPARTMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Z]+(?: [A-Z]+)?)").expect("invalid regex: department"));
static RE_UNITS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(\d{1,2}(?:\.\d+)?)\s+units?\s+\(fi\s+(\d+)\)\(([^,]+),\s*[\d-]+(?:\s.*)?\)$")
        .expect("invalid regex: units")
});

static SEL_COURSE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.course").expect("invalid selector: course"));
static SEL_HEADING: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h2").expect("invalid selector: heading"));
static SEL_ANCHOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a").expect("invalid selector: anchor"));
static SEL_PARAGRAPH: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("p").expect("invalid selector: paragraph"));
static SEL_BOLD: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("b, strong").expect("invalid selector: bold"));

fn elem_text(element: ElementRef) -> String {
    element.text().collect::<String>()
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn non_empty(text: String) -> Field<String> {
    if text.is_empty() {
        Field::Unknown
    } else {
        Field::Known(text)
    }
}

/// Parses every `div.course` listing block of a department page, in document order.
///
/// Individual fields that fail to parse become [`Field::Unknown`]; a block with
/// nothing extractable is dropped. Only input without any markup is an error.
pub fn parse_course_listing(html: &str) -> Result<Vec<CourseRecord>, ParseError> {
    if html.trim().is_empty() {
        return Ok(Vec::new());
    }
    if !RE_MARKUP.is_match(html) {
        let preview: String = html.trim().chars().take(40).collect();
        return Err(ParseError::NotMarkup(preview));
    }

    let document = Html::parse_document(html);
    let mut records = Vec::new();

    for (index, block) in document.select(&SEL_COURSE).enumerate() {
        let record = parse_course_block(block);
        if record.is_empty() {
            log::warn!("Dropping listing block {}: nothing extractable", index);
            continue;
        }
        log::debug!("Block {}: {}", index, record.course_code);
        records.push(record);
    }

    log::debug!("Parsed {} course record(s)", records.len());
    Ok(records)
}

fn parse_course_block(block: ElementRef) -> CourseRecord {
    let heading = block.select(&SEL_HEADING).next();

    let heading_text = heading
        .map(|h| normalize_whitespace(&elem_text(h)))
        .filter(|t| !t.is_empty());

    let (course_code, title) = match heading_text {
        Some(text) => split_heading(&text),
        None => (Field::Unknown, Field::Unknown),
    };

    let department: Field<String> = course_code
        .as_option()
        .and_then(|code| parse_department(code))
        .into();

    let description = block
        .select(&SEL_PARAGRAPH)
        .next()
        .map(|p| non_empty(elem_text(p).trim().to_string()))
        .unwrap_or_default();

    let units = block
        .select(&SEL_BOLD)
        .next()
        .and_then(|b| parse_units(&elem_text(b)))
        .unwrap_or_else(Units::unknown);

    let url = heading
        .and_then(|h| h.select(&SEL_ANCHOR).next())
        .and_then(|a| a.value().attr("href"))
        .map(|href| non_empty(href.trim().to_string()))
        .unwrap_or_default();

    CourseRecord {
        department,
        course_code,
        title,
        description,
        units,
        url,
    }
}

/// Splits a heading such as `"CMPUT 174 - Intro"` into code and title on the
/// first delimiter only. Without a delimiter the whole heading is the code.
pub fn split_heading(heading: &str) -> (Field<String>, Field<String>) {
    match heading.split_once(HEADING_DELIMITER) {
        Some((code, title)) => (
            non_empty(code.trim().to_string()),
            non_empty(title.trim().to_string()),
        ),
        None => (non_empty(heading.trim().to_string()), Field::Unknown),
    }
}

/// Lowercased department prefix of a course code: `"INT D 410"` gives `"int d"`.
pub fn parse_department(code: &str) -> Option<String> {
    RE_DEPARTMENT
        .captures(code)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_lowercase())
}

/// Parses a units-and-term line such as
/// `"3 units (fi 6)(either term, 3-0-0)"`. All three values parse or none do.
pub fn parse_units(text: &str) -> Option<Units> {
    let text = normalize_whitespace(text);
    let caps = RE_UNITS.captures(&text)?;

    let credits: f64 = caps[1].parse().ok()?;
    let fee_index: u32 = caps[2].parse().ok()?;
    let term = caps[3].trim();
    if term.is_empty() {
        return None;
    }

    Some(Units {
        credits: Field::Known(credits),
        fee_index: Field::Known(fee_index),
        term: Field::Known(term.to_string()),
    })
}
