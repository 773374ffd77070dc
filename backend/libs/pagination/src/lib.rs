//! Cursor pagination for `created_at`-ordered tables
//!
//! A page request carries an optional cursor (the id of the first row of the
//! page) and a page size `P`. Queries fetch `P + 1` rows starting at the cursor
//! row, newest first. When the extra row comes back its id becomes the cursor
//! of the following page and the row itself is dropped from the current one.
//!
//! Ordering is `(created_at DESC, id DESC)` so rows sharing a timestamp still
//! have a total order and no row is skipped or repeated across pages.

use serde::{Deserialize, Deserializer};
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

/// Page size used by feeds, search, bookmarks and notifications
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Query-string form of a page request (`?cursor=<uuid>`)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CursorQuery {
    #[serde(default, deserialize_with = "blank_cursor_as_none")]
    pub cursor: Option<Uuid>,
}

/// Reads an optional cursor where an empty value (`?cursor=`) means "first page".
pub fn blank_cursor_as_none<'de, D>(deserializer: D) -> Result<Option<Uuid>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => Uuid::parse_str(value)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

/// A single page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub cursor: Option<Uuid>,
    pub page_size: usize,
}

impl PageRequest {
    pub fn new(cursor: Option<Uuid>, page_size: usize) -> Self {
        Self {
            cursor,
            page_size: page_size.max(1),
        }
    }

    pub fn first(page_size: usize) -> Self {
        Self::new(None, page_size)
    }

    /// Number of rows to ask the database for: one more than the page size.
    pub fn fetch_limit(&self) -> i64 {
        self.page_size as i64 + 1
    }
}

impl From<CursorQuery> for PageRequest {
    fn from(query: CursorQuery) -> Self {
        Self::new(query.cursor, DEFAULT_PAGE_SIZE)
    }
}

/// Rows that can serve as a page boundary
pub trait Cursored {
    fn cursor_id(&self) -> Uuid;
}

/// Newest-first page with the cursor of the next (older) page
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<Uuid>,
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            next_cursor: None,
        }
    }

    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            next_cursor: self.next_cursor,
        }
    }
}

/// Oldest-first page with the cursor of the previous (older) page
#[derive(Debug, Clone, PartialEq)]
pub struct ReversePage<T> {
    pub items: Vec<T>,
    pub previous_cursor: Option<Uuid>,
}

impl<T> ReversePage<T> {
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> ReversePage<U> {
        ReversePage {
            items: self.items.into_iter().map(f).collect(),
            previous_cursor: self.previous_cursor,
        }
    }
}

/// Slice `P + 1` newest-first rows into a page and the next cursor.
pub fn paginate<T: Cursored>(mut rows: Vec<T>, page_size: usize) -> Page<T> {
    let next_cursor = if rows.len() > page_size {
        let cursor = rows[page_size].cursor_id();
        rows.truncate(page_size);
        Some(cursor)
    } else {
        None
    };

    Page {
        items: rows,
        next_cursor,
    }
}

/// Slice `P + 1` newest-first rows into an oldest-first page.
///
/// The extra row is the oldest one fetched; its id is where the caller
/// continues when it wants to load earlier rows.
pub fn paginate_backward<T: Cursored>(rows: Vec<T>, page_size: usize) -> ReversePage<T> {
    let Page { mut items, next_cursor } = paginate(rows, page_size);
    items.reverse();
    ReversePage {
        items,
        previous_cursor: next_cursor,
    }
}

/// Keyset bound over a table ordered by `(created_at DESC, id DESC)`
#[derive(Debug, Clone, Copy)]
pub struct Keyset {
    table: &'static str,
    alias: &'static str,
}

impl Keyset {
    pub const fn new(table: &'static str, alias: &'static str) -> Self {
        Self { table, alias }
    }

    /// Append the inclusive cursor bound. An unknown cursor matches nothing.
    pub fn push_bound(&self, qb: &mut QueryBuilder<'_, Postgres>, cursor: Option<Uuid>) {
        if let Some(cursor) = cursor {
            qb.push(format!(
                " AND ({alias}.created_at, {alias}.id) <= (SELECT created_at, id FROM {table} WHERE id = ",
                alias = self.alias,
                table = self.table,
            ));
            qb.push_bind(cursor);
            qb.push(")");
        }
    }

    pub fn push_order_and_limit(&self, qb: &mut QueryBuilder<'_, Postgres>, request: &PageRequest) {
        qb.push(format!(
            " ORDER BY {alias}.created_at DESC, {alias}.id DESC LIMIT ",
            alias = self.alias
        ));
        qb.push_bind(request.fetch_limit());
    }

    /// Bound, order and limit in one call.
    pub fn push_page(&self, qb: &mut QueryBuilder<'_, Postgres>, request: &PageRequest) {
        self.push_bound(qb, request.cursor);
        self.push_order_and_limit(qb, request);
    }
}
