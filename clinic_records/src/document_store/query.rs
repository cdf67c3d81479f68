//! Backend-neutral queries over BSON documents
//!
//! A query is a conjunction of filters plus an optional single-field
//! sort. It can be rendered as a MongoDB filter and sort document, or
//! evaluated directly against documents held in memory. Both forms
//! follow MongoDB's rules: a dotted field path reaches into embedded
//! documents and arrays, and a filter matches if any value reached by
//! the path satisfies it.
//!

use std::cmp::Ordering;

use bson::{doc, Bson, Document};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Field equals the value. Numbers compare by value regardless
    /// of their BSON width.
    Equals { field: String, value: Bson },
    /// Field is a datetime within the inclusive bounds
    Between {
        field: String,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    },
    /// Field is a string containing the text, ignoring case
    ContainsText { field: String, text: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SortOrder {
    pub field: String,
    pub direction: Direction,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub sort: Option<SortOrder>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn equals(mut self, field: &str, value: impl Into<Bson>) -> Self {
        self.filters.push(Filter::Equals {
            field: field.to_string(),
            value: value.into(),
        });
        self
    }

    pub fn between(
        mut self,
        field: &str,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Self {
        self.filters.push(Filter::Between {
            field: field.to_string(),
            from,
            to,
        });
        self
    }

    pub fn contains_text(mut self, field: &str, text: &str) -> Self {
        self.filters.push(Filter::ContainsText {
            field: field.to_string(),
            text: text.to_string(),
        });
        self
    }

    pub fn sort_by(mut self, field: &str, direction: Direction) -> Self {
        self.sort = Some(SortOrder {
            field: field.to_string(),
            direction,
        });
        self
    }

    /// The MongoDB filter document for this query
    pub fn filter_document(&self) -> Document {
        let mut clauses: Vec<Document> = self.filters.iter().map(Filter::to_document).collect();
        match clauses.len() {
            0 => Document::new(),
            1 => clauses.remove(0),
            _ => doc! { "$and": clauses },
        }
    }

    /// The MongoDB sort document for this query, if it is sorted
    pub fn sort_document(&self) -> Option<Document> {
        self.sort.as_ref().map(|sort| {
            let direction = match sort.direction {
                Direction::Ascending => 1,
                Direction::Descending => -1,
            };
            let mut document = Document::new();
            document.insert(sort.field.clone(), direction);
            document
        })
    }

    /// Whether a document satisfies every filter
    pub fn matches(&self, document: &Document) -> bool {
        self.filters.iter().all(|filter| filter.matches(document))
    }

    /// Sort documents in place by the query's sort order. The sort
    /// is stable, so documents with equal keys keep their order.
    pub fn sort_documents(&self, documents: &mut [Document]) {
        if let Some(sort) = &self.sort {
            documents.sort_by(|a, b| {
                let ordering = compare_values(
                    values_at_path(a, &sort.field).first().copied(),
                    values_at_path(b, &sort.field).first().copied(),
                );
                match sort.direction {
                    Direction::Ascending => ordering,
                    Direction::Descending => ordering.reverse(),
                }
            });
        }
    }
}

impl Filter {
    fn to_document(&self) -> Document {
        let mut document = Document::new();
        match self {
            Filter::Equals { field, value } => {
                document.insert(field.clone(), value.clone());
            }
            Filter::Between { field, from, to } => {
                let mut range = Document::new();
                if let Some(from) = from {
                    range.insert("$gte", bson::DateTime::from_chrono(*from));
                }
                if let Some(to) = to {
                    range.insert("$lte", bson::DateTime::from_chrono(*to));
                }
                if range.is_empty() {
                    range.insert("$type", "date");
                }
                document.insert(field.clone(), range);
            }
            Filter::ContainsText { field, text } => {
                document.insert(
                    field.clone(),
                    doc! { "$regex": regex::escape(text), "$options": "i" },
                );
            }
        }
        document
    }

    fn matches(&self, document: &Document) -> bool {
        let values = values_at_path(document, self.field());
        match self {
            Filter::Equals { value, .. } => values.iter().any(|found| bson_equals(found, value)),
            Filter::Between { from, to, .. } => values.iter().any(|found| match found {
                Bson::DateTime(datetime) => {
                    let millis = datetime.timestamp_millis();
                    from.map_or(true, |from| millis >= from.timestamp_millis())
                        && to.map_or(true, |to| millis <= to.timestamp_millis())
                }
                _ => false,
            }),
            Filter::ContainsText { text, .. } => {
                let needle = text.to_lowercase();
                values.iter().any(|found| match found {
                    Bson::String(haystack) => haystack.to_lowercase().contains(&needle),
                    _ => false,
                })
            }
        }
    }

    fn field(&self) -> &str {
        match self {
            Filter::Equals { field, .. }
            | Filter::Between { field, .. }
            | Filter::ContainsText { field, .. } => field,
        }
    }
}

/// All values reached by a dotted path. Arrays met along the path
/// (and at its end) are expanded element by element.
pub fn values_at_path<'a>(document: &'a Document, path: &str) -> Vec<&'a Bson> {
    let mut segments = path.split('.');
    let mut current: Vec<&Bson> = match segments.next().and_then(|first| document.get(first)) {
        Some(value) => vec![value],
        None => return Vec::new(),
    };

    for segment in segments {
        let mut next = Vec::new();
        for value in current {
            match value {
                Bson::Document(inner) => next.extend(inner.get(segment)),
                Bson::Array(items) => {
                    for item in items {
                        if let Bson::Document(inner) = item {
                            next.extend(inner.get(segment));
                        }
                    }
                }
                _ => (),
            }
        }
        current = next;
    }

    current
        .into_iter()
        .flat_map(|value| match value {
            Bson::Array(items) => items.iter().collect::<Vec<_>>(),
            other => vec![other],
        })
        .collect()
}

fn as_number(value: &Bson) -> Option<f64> {
    match value {
        Bson::Int32(n) => Some(f64::from(*n)),
        Bson::Int64(n) => Some(*n as f64),
        Bson::Double(n) => Some(*n),
        _ => None,
    }
}

fn bson_equals(found: &Bson, expected: &Bson) -> bool {
    match (as_number(found), as_number(expected)) {
        (Some(a), Some(b)) => a == b,
        _ => found == expected,
    }
}

/// Position of a BSON type in MongoDB's cross-type sort order
fn type_rank(value: Option<&Bson>) -> u8 {
    match value {
        None | Some(Bson::Null) => 0,
        Some(Bson::Int32(_)) | Some(Bson::Int64(_)) | Some(Bson::Double(_)) => 1,
        Some(Bson::String(_)) => 2,
        Some(Bson::Document(_)) => 3,
        Some(Bson::Array(_)) => 4,
        Some(Bson::ObjectId(_)) => 5,
        Some(Bson::Boolean(_)) => 6,
        Some(Bson::DateTime(_)) => 7,
        Some(_) => 8,
    }
}

fn compare_values(a: Option<&Bson>, b: Option<&Bson>) -> Ordering {
    let by_type = type_rank(a).cmp(&type_rank(b));
    if by_type != Ordering::Equal {
        return by_type;
    }
    match (a, b) {
        (Some(Bson::String(a)), Some(Bson::String(b))) => a.cmp(b),
        (Some(Bson::Boolean(a)), Some(Bson::Boolean(b))) => a.cmp(b),
        (Some(Bson::DateTime(a)), Some(Bson::DateTime(b))) => a.cmp(b),
        (Some(Bson::ObjectId(a)), Some(Bson::ObjectId(b))) => a.cmp(b),
        (Some(a), Some(b)) => match (as_number(a), as_number(b)) {
            (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
            _ => Ordering::Equal,
        },
        _ => Ordering::Equal,
    }
}
