//! Request parameters, list pagination parameters and the filter builder.
//!
//! Everything sent to the service is a flat, ordered list of `key=value`
//! pairs. Nested keys use the bracket convention (`metadata[order]`,
//! `due_date[gt]`). Order is preserved on the wire.

use crate::error::Result;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Ordered request parameters.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Params {
    pairs: Vec<(String, String)>,
}

impl Params {
    pub fn new() -> Self {
        Params { pairs: Vec::new() }
    }

    /// Append a parameter. Repeated keys are kept.
    pub fn push(&mut self, key: impl Into<String>, value: impl ToString) -> &mut Self {
        self.pairs.push((key.into(), value.to_string()));
        self
    }

    /// Append a parameter only when a value is present.
    pub fn push_opt<V: ToString>(&mut self, key: &str, value: Option<V>) -> &mut Self {
        if let Some(value) = value {
            self.push(key, value);
        }
        self
    }

    /// Append `metadata[key]=value` for every entry.
    pub fn push_metadata(&mut self, metadata: &BTreeMap<String, String>) -> &mut Self {
        for (key, value) in metadata {
            self.push(format!("metadata[{}]", key), value);
        }
        self
    }

    /// First value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// All values for `key`, in insertion order.
    pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.pairs
            .iter()
            .filter(move |(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Form-urlencode the parameters (query string or request body).
    pub fn encode(&self) -> Result<String> {
        Ok(serde_urlencoded::to_string(&self.pairs)?)
    }
}

// ============================================================================
// Filters
// ============================================================================

/// Comparison operator of a filter.
///
/// `Eq` has no suffix on the wire; range operators are sent as `field[op]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum FilterOp {
    #[default]
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl FilterOp {
    pub fn suffix(&self) -> &'static str {
        match self {
            FilterOp::Eq => "",
            FilterOp::Gt => "gt",
            FilterOp::Gte => "gte",
            FilterOp::Lt => "lt",
            FilterOp::Lte => "lte",
        }
    }
}

impl FromStr for FilterOp {
    type Err = ();

    fn from_str(suffix: &str) -> std::result::Result<Self, Self::Err> {
        match suffix {
            "" => Ok(FilterOp::Eq),
            "gt" => Ok(FilterOp::Gt),
            "gte" => Ok(FilterOp::Gte),
            "lt" => Ok(FilterOp::Lt),
            "lte" => Ok(FilterOp::Lte),
            _ => Err(()),
        }
    }
}

impl fmt::Display for FilterOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

/// A single `(field, operator, value)` constraint.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Filter {
    pub field: String,
    pub op: FilterOp,
    pub value: String,
}

impl Filter {
    /// Wire key: `field` for equality, `field[op]` otherwise.
    pub fn key(&self) -> String {
        match self.op {
            FilterOp::Eq => self.field.clone(),
            op => format!("{}[{}]", self.field, op),
        }
    }
}

/// Ordered, conjunctive set of filters.
///
/// Field names are not checked locally. Adding the same field twice yields
/// two constraints; that is how closed ranges are expressed:
///
/// ```
/// use invoice_kit::params::{FilterOp, Filters};
///
/// let mut filters = Filters::new();
/// filters
///     .add("due_date", FilterOp::Gt, 1_500_000_000)
///     .add("due_date", FilterOp::Lt, 1_600_000_000);
/// assert_eq!(filters.len(), 2);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Filters {
    filters: Vec<Filter>,
}

impl Filters {
    pub fn new() -> Self {
        Filters {
            filters: Vec::new(),
        }
    }

    pub fn add(&mut self, field: impl Into<String>, op: FilterOp, value: impl ToString) -> &mut Self {
        self.filters.push(Filter {
            field: field.into(),
            op,
            value: value.to_string(),
        });
        self
    }

    /// Add a filter from a pre-formed key such as `due_date[gt]`.
    ///
    /// Unknown bracket suffixes are kept verbatim as an equality filter on the
    /// whole key, so the service gets to reject them.
    pub fn add_raw(&mut self, key: &str, value: impl ToString) -> &mut Self {
        let parsed = key
            .strip_suffix(']')
            .and_then(|rest| rest.split_once('['))
            .and_then(|(field, suffix)| {
                suffix
                    .parse::<FilterOp>()
                    .ok()
                    .filter(|op| *op != FilterOp::Eq)
                    .map(|op| (field, op))
            });

        match parsed {
            Some((field, op)) => self.add(field, op, value),
            None => self.add(key, FilterOp::Eq, value),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Filter> {
        self.filters.iter()
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn append_to(&self, params: &mut Params) {
        for filter in &self.filters {
            params.push(filter.key(), &filter.value);
        }
    }
}

// ============================================================================
// Pagination
// ============================================================================

/// Where the next page starts.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Cursor {
    /// First page in the service's default order.
    #[default]
    Start,
    /// Page of elements after this id (forward pagination).
    After(String),
    /// Page of elements before this id (backward pagination).
    Before(String),
}

impl Cursor {
    pub(crate) fn append_to(&self, params: &mut Params) {
        match self {
            Cursor::Start => {}
            Cursor::After(id) => {
                params.push("starting_after", id);
            }
            Cursor::Before(id) => {
                params.push("ending_before", id);
            }
        }
    }
}

/// Pagination parameters shared by every list call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ListParams {
    /// Page size. Falls back to the client's configured page limit.
    pub limit: Option<u32>,
    pub cursor: Cursor,
    /// Ask the service to report `total_count` in the envelope.
    pub include_total_count: bool,
    pub filters: Filters,
}

impl ListParams {
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn starting_after(mut self, id: impl Into<String>) -> Self {
        self.cursor = Cursor::After(id.into());
        self
    }

    pub fn ending_before(mut self, id: impl Into<String>) -> Self {
        self.cursor = Cursor::Before(id.into());
        self
    }

    pub fn with_total_count(mut self) -> Self {
        self.include_total_count = true;
        self
    }

    /// Parameters that stay fixed across pages (everything but the cursor).
    ///
    /// `default_limit` is used when `limit` is unset.
    pub fn append_to(&self, params: &mut Params, default_limit: Option<u32>) {
        params.push_opt("limit", self.limit.or(default_limit));
        if self.include_total_count {
            params.push("include[]", "total_count");
        }
        self.filters.append_to(params);
    }
}
