//! Link objects shared by the License and Status Documents.

use crate::error::{ParsingError, ParsingResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A hypermedia link, as found in the `links` array of both documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// Link relation (e.g. `hint`, `status`, `register`).
    pub rel: String,
    /// Target URL, possibly a URI template when `templated` is true.
    pub href: String,
    /// Media type of the target resource.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    /// Title of the link, for display.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Whether `href` is a URI template.
    #[serde(default, skip_serializing_if = "is_false")]
    pub templated: bool,
}

fn is_false(b: &bool) -> bool {
    !b
}

impl Link {
    pub(crate) fn parse(value: &Value) -> ParsingResult<Self> {
        let obj = value.as_object().ok_or(ParsingError::Link)?;
        let rel = obj
            .get("rel")
            .and_then(Value::as_str)
            .ok_or(ParsingError::Link)?
            .to_string();
        let href = obj
            .get("href")
            .and_then(Value::as_str)
            .ok_or(ParsingError::Link)?
            .to_string();
        if href.is_empty() {
            return Err(ParsingError::Url(rel));
        }
        Ok(Self {
            rel,
            href,
            media_type: obj.get("type").and_then(Value::as_str).map(String::from),
            title: obj.get("title").and_then(Value::as_str).map(String::from),
            templated: obj.get("templated").and_then(Value::as_bool).unwrap_or(false),
        })
    }

    /// Resolves the link target, expanding the URI template (if any) with
    /// the given query parameters.
    ///
    /// Non-templated links get the parameters appended as a query string.
    /// Template variables without a matching parameter are dropped.
    #[must_use]
    pub fn url(&self, parameters: &[(&str, &str)]) -> String {
        if !self.templated {
            return append_query(&self.href, parameters);
        }

        // Only `{?name,...}` query expansion appears in LCP documents.
        let Some(open) = self.href.find('{') else {
            return append_query(&self.href, parameters);
        };
        let Some(close) = self.href[open..].find('}').map(|i| open + i) else {
            return append_query(&self.href, parameters);
        };

        let base = &self.href[..open];
        let tail = &self.href[close + 1..];
        let expr = &self.href[open + 1..close];

        let names: Vec<&str> = expr.trim_start_matches('?').split(',').collect();
        let pairs: Vec<(&str, &str)> = parameters
            .iter()
            .filter(|(name, _)| names.contains(name))
            .copied()
            .collect();

        format!("{}{}", append_query(base, &pairs), tail)
    }
}

fn append_query(base: &str, parameters: &[(&str, &str)]) -> String {
    if parameters.is_empty() {
        return base.to_string();
    }
    let query: Vec<String> = parameters
        .iter()
        .map(|(name, value)| {
            format!("{}={}", urlencoding::encode(name), urlencoding::encode(value))
        })
        .collect();
    let separator = if base.contains('?') { '&' } else { '?' };
    format!("{}{}{}", base, separator, query.join("&"))
}

/// An ordered collection of links, preserving document order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Links(Vec<Link>);

impl Links {
    pub(crate) fn parse(value: &Value) -> ParsingResult<Self> {
        let array = value.as_array().ok_or(ParsingError::Link)?;
        let links = array.iter().map(Link::parse).collect::<ParsingResult<_>>()?;
        Ok(Self(links))
    }

    /// Returns the first link with the given relation, in document order.
    #[must_use]
    pub fn first_with_rel(&self, rel: &str) -> Option<&Link> {
        self.0.iter().find(|link| link.rel == rel)
    }

    /// Returns all links with the given relation, in document order.
    pub fn all_with_rel<'a>(&'a self, rel: &'a str) -> impl Iterator<Item = &'a Link> {
        self.0.iter().filter(move |link| link.rel == rel)
    }

    /// Returns true if a link with the given relation is present.
    #[must_use]
    pub fn contains_rel(&self, rel: &str) -> bool {
        self.first_with_rel(rel).is_some()
    }

    /// Returns the number of links.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if there are no links.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the links in document order.
    pub fn iter(&self) -> impl Iterator<Item = &Link> {
        self.0.iter()
    }
}
