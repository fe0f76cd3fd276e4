//! Deterministic sort and skip/limit windowing with total-count reporting.

use std::cmp::Ordering;
use std::str::FromStr;

use chrono::DateTime;
use document_store::{CREATED_AT_FIELD, Document, ID_FIELD, UPDATED_AT_FIELD};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{QueryError, Result};

/// A validated page request. Pages are 1-indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    page: u64,
    limit: u64,
}

impl PageRequest {
    pub const DEFAULT_PAGE: u64 = 1;
    pub const DEFAULT_LIMIT: u64 = 10;

    /// Validates a page and limit. `limit <= 0` and `page <= 0` are input errors.
    pub fn new(page: i64, limit: i64) -> Result<Self> {
        if limit <= 0 {
            return Err(QueryError::InvalidInput(format!(
                "limit must be positive, got {limit}"
            )));
        }
        if page <= 0 {
            return Err(QueryError::InvalidInput(format!(
                "page must be 1 or greater, got {page}"
            )));
        }
        Ok(Self {
            page: page as u64,
            limit: limit as u64,
        })
    }

    /// Builds a request from optional query parameters, applying defaults.
    pub fn from_params(page: Option<i64>, limit: Option<i64>) -> Result<Self> {
        Self::new(
            page.unwrap_or(Self::DEFAULT_PAGE as i64),
            limit.unwrap_or(Self::DEFAULT_LIMIT as i64),
        )
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// Number of items before this window: `(page - 1) * limit`.
    pub fn skip(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: Self::DEFAULT_PAGE,
            limit: Self::DEFAULT_LIMIT,
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl FromStr for SortDirection {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" | "1" => Ok(SortDirection::Asc),
            "desc" | "descending" | "-1" => Ok(SortDirection::Desc),
            other => Err(QueryError::InvalidInput(format!(
                "unknown sort direction: {other}"
            ))),
        }
    }
}

/// An explicit sort key.
///
/// Ties are always broken by `createdAt` descending, then `_id` ascending,
/// so repeated calls over the same data return the same order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub key: String,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(key: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            key: key.into(),
            direction,
        }
    }

    pub fn ascending(key: impl Into<String>) -> Self {
        Self::new(key, SortDirection::Asc)
    }

    pub fn descending(key: impl Into<String>) -> Self {
        Self::new(key, SortDirection::Desc)
    }

    /// Most recent first.
    pub fn newest_first() -> Self {
        Self::descending(CREATED_AT_FIELD)
    }

    /// Compares two documents under this sort, including the tie-breakers.
    pub fn compare(&self, a: &Document, b: &Document) -> Ordering {
        let order = StringOrder::for_key(&self.key);
        let primary = compare_values(a.get(&self.key), b.get(&self.key), order);
        let primary = match self.direction {
            SortDirection::Asc => primary,
            SortDirection::Desc => primary.reverse(),
        };
        primary
            .then_with(|| {
                let (x, y) = (b.get(CREATED_AT_FIELD), a.get(CREATED_AT_FIELD));
                compare_values(x, y, StringOrder::Instant)
            })
            .then_with(|| compare_values(a.get(ID_FIELD), b.get(ID_FIELD), StringOrder::Lexical))
    }

    /// Sorts documents in place. The sort is stable.
    pub fn sort(&self, docs: &mut [Document]) {
        docs.sort_by(|a, b| self.compare(a, b));
    }
}

fn type_rank(value: Option<&Value>) -> u8 {
    match value {
        None | Some(Value::Null) => 0,
        Some(Value::Bool(_)) => 1,
        Some(Value::Number(_)) => 2,
        Some(Value::String(_)) => 3,
        Some(Value::Array(_)) => 4,
        Some(Value::Object(_)) => 5,
    }
}

/// How two strings under the same key compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StringOrder {
    Lexical,
    /// RFC 3339 values compare as instants and sort before anything that
    /// does not parse; the rest compare lexically.
    Instant,
}

impl StringOrder {
    /// Only the store's own timestamp fields hold instants.
    fn for_key(key: &str) -> Self {
        let field = key.rsplit('.').next().unwrap_or(key);
        if field == CREATED_AT_FIELD || field == UPDATED_AT_FIELD {
            Self::Instant
        } else {
            Self::Lexical
        }
    }

    fn compare(self, x: &str, y: &str) -> Ordering {
        if self == Self::Lexical {
            return x.cmp(y);
        }
        match (DateTime::parse_from_rfc3339(x), DateTime::parse_from_rfc3339(y)) {
            (Ok(dx), Ok(dy)) => dx.cmp(&dy),
            (Ok(_), Err(_)) => Ordering::Less,
            (Err(_), Ok(_)) => Ordering::Greater,
            (Err(_), Err(_)) => x.cmp(y),
        }
    }
}

/// Total order over optional JSON values: missing/null < bool < number < string.
fn compare_values(a: Option<&Value>, b: Option<&Value>, order: StringOrder) -> Ordering {
    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.total_cmp(&y)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => order.compare(x, y),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

/// One window of a sorted result set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_count: u64,
    pub total_pages: u64,
    pub page: u64,
    pub limit: u64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl<T> Page<T> {
    /// Cuts the window for `request` out of an already sorted set.
    ///
    /// A page beyond the last one yields no items but still reports the totals.
    pub fn from_sorted(all: Vec<T>, request: PageRequest) -> Self {
        let total_count = all.len() as u64;
        let items = all
            .into_iter()
            .skip(request.skip() as usize)
            .take(request.limit() as usize)
            .collect();
        Self::new(items, total_count, request)
    }

    /// Builds a page from a window and the cardinality of the full set.
    pub fn new(items: Vec<T>, total_count: u64, request: PageRequest) -> Self {
        let total_pages = total_count.div_ceil(request.limit());
        Self {
            items,
            total_count,
            total_pages,
            page: request.page(),
            limit: request.limit(),
            has_next_page: request.page() < total_pages,
            has_prev_page: request.page() > 1,
        }
    }

    /// Converts every item, keeping the page metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total_count: self.total_count,
            total_pages: self.total_pages,
            page: self.page,
            limit: self.limit,
            has_next_page: self.has_next_page,
            has_prev_page: self.has_prev_page,
        }
    }

    /// Converts every item with a fallible function.
    pub fn try_map<U, E>(
        self,
        f: impl FnMut(T) -> std::result::Result<U, E>,
    ) -> std::result::Result<Page<U>, E> {
        let items = self
            .items
            .into_iter()
            .map(f)
            .collect::<std::result::Result<Vec<_>, E>>()?;
        Ok(Page {
            items,
            total_count: self.total_count,
            total_pages: self.total_pages,
            page: self.page,
            limit: self.limit,
            has_next_page: self.has_next_page,
            has_prev_page: self.has_prev_page,
        })
    }
}
