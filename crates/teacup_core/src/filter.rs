//! Structured article filters.
//!
//! An [`ArticleFilter`] is a conjunction of [`Predicate`]s. It never contains
//! query-language text; storage backends translate it themselves and must
//! agree with [`ArticleFilter::matches`].

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

use crate::query::{Operator, ParsedQuery};
use crate::types::{Article, TIMESTAMP_FORMAT};
use crate::{Error, Result};

pub const DEFAULT_SINCE: &str = "2010-06-01";
pub const DEFAULT_UNTIL: &str = "2022-07-31";

/// Date bounds applied when a query carries no `since:`/`until:`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchWindow {
    pub since: String,
    pub until: String,
}

impl SearchWindow {
    pub fn new(since: impl Into<String>, until: impl Into<String>) -> Self {
        Self {
            since: since.into(),
            until: until.into(),
        }
    }
}

impl Default for SearchWindow {
    fn default() -> Self {
        Self::new(DEFAULT_SINCE, DEFAULT_UNTIL)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Field {
    Body,
    AuthorName,
    Title,
    CreatedAt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Comparison {
    /// Substring containment, ASCII case-insensitive
    Contains,
    /// Field value `>=` the predicate value, compared as text
    AtLeast,
    /// Field value `<=` the predicate value, compared as text
    AtMost,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Predicate {
    pub field: Field,
    pub comparison: Comparison,
    pub value: String,
}

impl Predicate {
    pub fn new(field: Field, comparison: Comparison, value: impl Into<String>) -> Self {
        Self {
            field,
            comparison,
            value: value.into(),
        }
    }

    pub fn matches(&self, article: &Article) -> bool {
        let candidate = field_value(article, self.field);
        match self.comparison {
            Comparison::Contains => contains_ignore_ascii_case(&candidate, &self.value),
            Comparison::AtLeast => candidate.as_ref() >= self.value.as_str(),
            Comparison::AtMost => candidate.as_ref() <= self.value.as_str(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ArticleFilter {
    pub predicates: Vec<Predicate>,
}

impl ArticleFilter {
    /// Filter for `query` using the built-in search window.
    pub fn from_query(query: &ParsedQuery) -> Self {
        build_filter(query, &SearchWindow::default())
    }

    /// Articles created within the given calendar month. Both bounds are
    /// inclusive, the upper one being midnight of the following month.
    pub fn month(year: i32, month: u32) -> Result<Self> {
        let start = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or_else(|| Error::InvalidDate(format!("{}-{:02}", year, month)))?;
        let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
        let end = NaiveDate::from_ymd_opt(next_year, next_month, 1)
            .ok_or_else(|| Error::InvalidDate(format!("{}-{:02}", next_year, next_month)))?;

        let midnight = |date: NaiveDate| {
            date.and_hms_opt(0, 0, 0)
                .map(|dt| dt.format(TIMESTAMP_FORMAT).to_string())
                .ok_or_else(|| Error::InvalidDate(date.to_string()))
        };

        Ok(Self {
            predicates: vec![
                Predicate::new(Field::CreatedAt, Comparison::AtLeast, midnight(start)?),
                Predicate::new(Field::CreatedAt, Comparison::AtMost, midnight(end)?),
            ],
        })
    }

    pub fn matches(&self, article: &Article) -> bool {
        self.predicates.iter().all(|p| p.matches(article))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Predicate> {
        self.predicates.iter()
    }
}

/// Turn a parsed query into the conjunction of body, date, author and title
/// predicates. Absent `by:`/`title:` become an empty containment test that
/// matches every article.
pub fn build_filter(query: &ParsedQuery, window: &SearchWindow) -> ArticleFilter {
    let mut predicates: Vec<Predicate> = query
        .search_terms
        .iter()
        .map(|term| Predicate::new(Field::Body, Comparison::Contains, term.as_str()))
        .collect();

    let since = query.get(Operator::Since).unwrap_or(window.since.as_str());
    let until = query.get(Operator::Until).unwrap_or(window.until.as_str());
    predicates.push(Predicate::new(Field::CreatedAt, Comparison::AtLeast, since));
    predicates.push(Predicate::new(Field::CreatedAt, Comparison::AtMost, until));

    let by = query.get(Operator::By).unwrap_or_default();
    let title = query.get(Operator::Title).unwrap_or_default();
    predicates.push(Predicate::new(Field::AuthorName, Comparison::Contains, by));
    predicates.push(Predicate::new(Field::Title, Comparison::Contains, title));

    ArticleFilter { predicates }
}

fn field_value(article: &Article, field: Field) -> Cow<'_, str> {
    match field {
        Field::Body => Cow::Borrowed(&article.body),
        Field::AuthorName => Cow::Borrowed(&article.author_name),
        Field::Title => Cow::Borrowed(&article.title),
        Field::CreatedAt => Cow::Owned(article.created_at_string()),
    }
}

fn contains_ignore_ascii_case(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    haystack.to_ascii_lowercase().contains(&needle.to_ascii_lowercase())
}
