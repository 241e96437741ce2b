//! Extracted items, per-stage outcomes and the output sink of response stages.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::request::Request;

/// Structured data extracted from a response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Item {
    fields: Map<String, Value>,
}

impl Item {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.fields
    }
}

impl From<Map<String, Value>> for Item {
    fn from(fields: Map<String, Value>) -> Self {
        Self { fields }
    }
}

/// The result of a single chain stage.
///
/// `Dropped` ends the payload's journey: the remaining stages are skipped and
/// the drop is reported to extensions with its reason.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Kept(T),
    Dropped(String),
}

impl<T> Outcome<T> {
    pub fn dropped(reason: impl Into<String>) -> Self {
        Outcome::Dropped(reason.into())
    }

    pub fn is_dropped(&self) -> bool {
        matches!(self, Outcome::Dropped(_))
    }

    pub fn kept(self) -> Option<T> {
        match self {
            Outcome::Kept(value) => Some(value),
            Outcome::Dropped(_) => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Kept(value) => Outcome::Kept(f(value)),
            Outcome::Dropped(reason) => Outcome::Dropped(reason),
        }
    }
}

/// Items and follow-up requests emitted while a response is processed.
#[derive(Debug, Default)]
pub struct ParseOutput {
    items: Vec<Item>,
    requests: Vec<Request>,
}

impl ParseOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_item(&mut self, item: Item) {
        self.items.push(item);
    }

    pub fn add_items(&mut self, items: impl IntoIterator<Item = Item>) {
        self.items.extend(items);
    }

    pub fn add_request(&mut self, request: Request) {
        self.requests.push(request);
    }

    pub fn add_requests(&mut self, requests: impl IntoIterator<Item = Request>) {
        self.requests.extend(requests);
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn requests(&self) -> &[Request] {
        &self.requests
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty() && self.requests.is_empty()
    }

    pub fn into_parts(self) -> (Vec<Item>, Vec<Request>) {
        (self.items, self.requests)
    }
}
