//! `{FieldName}` message templates rendered against report rows.

use std::str::FromStr;
use std::sync::LazyLock;

use orion_error::prelude::*;
use regex::Regex;

use crate::error::{CoreError, CoreReason, CoreResult};
use crate::report::Report;

/// ASCII word characters only; `{Café}` is literal text.
static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{[0-9A-Za-z_]+\}").expect("placeholder regex is valid"));

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field(String),
}

/// A parsed message template, shared read-only by every rule task of an
/// alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageTemplate {
    raw: String,
    segments: Vec<Segment>,
}

impl MessageTemplate {
    pub fn parse(raw: &str) -> CoreResult<Self> {
        let mut segments = Vec::new();
        let mut last = 0;
        for m in PLACEHOLDER.find_iter(raw) {
            if m.start() > last {
                segments.push(Segment::Literal(raw[last..m.start()].to_string()));
            }
            segments.push(Segment::Field(placeholder_field(m.as_str())?.to_string()));
            last = m.end();
        }
        if last < raw.len() {
            segments.push(Segment::Literal(raw[last..].to_string()));
        }
        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Field names referenced by the template, in order of appearance.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Field(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Resolve every placeholder to a column index of `report`. Fails with
    /// `InvalidArgument` naming the first unknown field.
    pub fn bind(&self, report: &Report) -> CoreResult<BoundTemplate<'_>> {
        let mut parts = Vec::with_capacity(self.segments.len());
        for segment in &self.segments {
            parts.push(match segment {
                Segment::Literal(text) => BoundPart::Literal(text),
                Segment::Field(name) => BoundPart::Column(report.column_index(name)?),
            });
        }
        Ok(BoundTemplate { parts })
    }
}

impl FromStr for MessageTemplate {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        Self::parse(s)
    }
}

/// Strip the braces off a `{name}` token.
///
/// The token must be longer than two characters, with exactly one `{` at
/// the start and one `}` at the end.
pub fn placeholder_field(token: &str) -> CoreResult<&str> {
    let malformed = || {
        CoreError::from(CoreReason::InvalidArgument).with_detail(format!("malformed placeholder {token:?}"))
    };
    let inner = token
        .strip_prefix('{')
        .and_then(|t| t.strip_suffix('}'))
        .ok_or_else(malformed)?;
    if inner.is_empty() || inner.contains(['{', '}']) {
        return Err(malformed());
    }
    Ok(inner)
}

// ---------------------------------------------------------------------------
// BoundTemplate
// ---------------------------------------------------------------------------

#[derive(Debug)]
enum BoundPart<'t> {
    Literal(&'t str),
    Column(usize),
}

/// A template whose placeholders are resolved against one report's header.
#[derive(Debug)]
pub struct BoundTemplate<'t> {
    parts: Vec<BoundPart<'t>>,
}

impl BoundTemplate<'_> {
    pub fn render(&self, cells: &[String]) -> String {
        let mut out = String::new();
        for part in &self.parts {
            match part {
                BoundPart::Literal(text) => out.push_str(text),
                BoundPart::Column(idx) => {
                    if let Some(value) = cells.get(*idx) {
                        out.push_str(value);
                    }
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use aw_config::AccountId;

    use super::*;
    use crate::error::CoreReason;

    const TEMPLATE: &str = "Account \"{AccountDescriptiveName}\" (ID \"{ExternalCustomerId}\") \
                            has {Impressions} impressions and {Clicks} clicks.";

    fn report() -> Report {
        let mut report = Report::new(
            "ACCOUNT_PERFORMANCE_REPORT",
            AccountId::new(1232198123),
            ["ExternalCustomerId", "AccountDescriptiveName", "Impressions", "Clicks"],
        )
        .unwrap();
        report
            .add_row(vec![
                "1232198123".into(),
                "Le Test".into(),
                "1978".into(),
                "10".into(),
            ])
            .unwrap();
        report
    }

    #[test]
    fn renders_row_values() {
        let template = MessageTemplate::parse(TEMPLATE).unwrap();
        let report = report();
        let bound = template.bind(&report).unwrap();
        assert_eq!(
            bound.render(&report.rows()[0]),
            "Account \"Le Test\" (ID \"1232198123\") has 1978 impressions and 10 clicks."
        );
    }

    #[test]
    fn lists_fields_in_order() {
        let template: MessageTemplate = TEMPLATE.parse().unwrap();
        let fields: Vec<_> = template.fields().collect();
        assert_eq!(
            fields,
            vec!["AccountDescriptiveName", "ExternalCustomerId", "Impressions", "Clicks"]
        );
    }

    #[test]
    fn unknown_field_fails_bind() {
        let template = MessageTemplate::parse("Cost is {Cost}").unwrap();
        let err = template.bind(&report()).unwrap_err();
        assert_eq!(err.reason(), &CoreReason::InvalidArgument);
        assert!(err.to_string().contains("Cost"), "{err}");
    }

    #[test]
    fn non_word_braces_stay_literal() {
        let template = MessageTemplate::parse("{not a field} {Clicks}").unwrap();
        let report = report();
        let bound = template.bind(&report).unwrap();
        assert_eq!(bound.render(&report.rows()[0]), "{not a field} 10");
    }

    #[test]
    fn only_ascii_word_placeholders() {
        let template = MessageTemplate::parse("{Café} {Clicks_2}").unwrap();
        let fields: Vec<_> = template.fields().collect();
        assert_eq!(fields, vec!["Clicks_2"]);
    }

    #[test]
    fn placeholder_sanity_check() {
        assert_eq!(placeholder_field("{Clicks}").unwrap(), "Clicks");
        for bad in ["{}", "Clicks}", "{Clicks", "{{Clicks}", "x{Clicks}"] {
            let err = placeholder_field(bad).unwrap_err();
            assert_eq!(err.reason(), &CoreReason::InvalidArgument, "{bad}");
        }
    }
}
