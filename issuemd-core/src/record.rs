//! Issue and comment records and the value tree templates resolve against
//!
//! Records deserialize straight from GitHub's REST payloads. Fields the
//! renderer needs are typed; everything else is kept in `extra` so templates
//! can still reach it (`{milestone.title}`, `{labels.0.name}`, ...).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Map;

use crate::datetime::Timestamp;

/// Dynamically typed value addressed by template field paths
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    Timestamp(Timestamp),
    List(Vec<Value>),
    Record(BTreeMap<String, Value>),
}

impl Value {
    /// Walk a dotted path. Absent keys, out-of-range indices and null
    /// intermediates all end the walk with `None`.
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        path.trim()
            .split(crate::constants::PATH_SEPARATOR)
            .try_fold(self, |current, key| match current {
                Value::Record(fields) => fields.get(key),
                Value::List(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
                _ => None,
            })
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Integer(n) => *n != 0,
            Value::Float(f) => *f != 0.0 && !f.is_nan(),
            Value::Text(s) => !s.is_empty(),
            Value::Timestamp(ts) => ts.is_valid(),
            Value::List(_) | Value::Record(_) => true,
        }
    }

    /// Plain text rendering used when no formatter applies
    pub fn to_text(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Integer(n) => n.to_string(),
            Value::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => (*f as i64).to_string(),
            Value::Float(f) => f.to_string(),
            Value::Text(s) => s.clone(),
            Value::Timestamp(ts) => ts.to_iso_string().unwrap_or_default(),
            Value::List(items) => items.iter().map(Value::to_text).collect::<Vec<_>>().join(","),
            Value::Record(_) => serde_json::Value::from(self).to_string(),
        }
    }

    fn from_timestamp(ts: Option<Timestamp>) -> Value {
        ts.map_or(Value::Null, Value::Timestamp)
    }
}

impl From<&serde_json::Value> for Value {
    fn from(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::Text(s.clone()),
            serde_json::Value::Array(items) => Value::List(items.iter().map(Value::from).collect()),
            serde_json::Value::Object(fields) => Value::Record(record_fields(fields)),
        }
    }
}

impl From<&Value> for serde_json::Value {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Integer(n) => serde_json::Value::from(*n),
            Value::Float(f) => serde_json::Value::from(*f),
            Value::Text(s) => serde_json::Value::String(s.clone()),
            Value::Timestamp(ts) => ts
                .to_iso_string()
                .map_or(serde_json::Value::Null, serde_json::Value::String),
            Value::List(items) => serde_json::Value::Array(items.iter().map(Into::into).collect()),
            Value::Record(fields) => serde_json::Value::Object(
                fields.iter().map(|(k, v)| (k.clone(), v.into())).collect(),
            ),
        }
    }
}

fn record_fields(fields: &Map<String, serde_json::Value>) -> BTreeMap<String, Value> {
    fields.iter().map(|(k, v)| (k.clone(), Value::from(v))).collect()
}

/// Anything a template can be resolved against
pub trait Record {
    fn to_value(&self) -> Value;
}

impl Record for Value {
    fn to_value(&self) -> Value {
        self.clone()
    }
}

impl Record for serde_json::Value {
    fn to_value(&self) -> Value {
        Value::from(self)
    }
}

/// Issue author or commenter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Author {
    pub login: String,
    #[serde(rename = "html_url", default)]
    pub profile_url: String,
    #[serde(flatten)]
    pub extra: Map<String, serde_json::Value>,
}

impl Record for Author {
    fn to_value(&self) -> Value {
        let mut fields = record_fields(&self.extra);
        fields.insert("login".to_string(), Value::Text(self.login.clone()));
        fields.insert("html_url".to_string(), Value::Text(self.profile_url.clone()));
        Value::Record(fields)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueState {
    Open,
    Closed,
}

impl IssueState {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueState::Open => "open",
            IssueState::Closed => "closed",
        }
    }
}

/// Issue as returned by `GET /repos/{owner}/{repo}/issues`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueRecord {
    pub number: u64,
    #[serde(rename = "html_url")]
    pub url: String,
    #[serde(rename = "user")]
    pub author: Author,
    pub title: String,
    pub state: IssueState,
    #[serde(default)]
    pub body: Option<String>,
    pub created_at: Timestamp,
    #[serde(default)]
    pub updated_at: Option<Timestamp>,
    #[serde(default)]
    pub closed_at: Option<Timestamp>,
    #[serde(rename = "comments", default)]
    pub comments_count: u64,
    #[serde(default)]
    pub comments_url: String,
    /// Present only when the record is a pull request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pull_request: Option<serde_json::Value>,
    #[serde(flatten)]
    pub extra: Map<String, serde_json::Value>,
}

impl IssueRecord {
    pub fn is_pull_request(&self) -> bool {
        self.pull_request.is_some()
    }

    /// Time that drives the checkpoint: last update, else creation
    pub fn activity_time(&self) -> Timestamp {
        self.updated_at.unwrap_or(self.created_at)
    }
}

impl Record for IssueRecord {
    fn to_value(&self) -> Value {
        let mut fields = record_fields(&self.extra);
        fields.insert("number".to_string(), Value::Integer(self.number as i64));
        fields.insert("html_url".to_string(), Value::Text(self.url.clone()));
        fields.insert("user".to_string(), self.author.to_value());
        fields.insert("title".to_string(), Value::Text(self.title.clone()));
        fields.insert("state".to_string(), Value::Text(self.state.as_str().to_string()));
        fields.insert(
            "body".to_string(),
            self.body.clone().map_or(Value::Null, Value::Text),
        );
        fields.insert("created_at".to_string(), Value::Timestamp(self.created_at));
        fields.insert("updated_at".to_string(), Value::from_timestamp(self.updated_at));
        fields.insert("closed_at".to_string(), Value::from_timestamp(self.closed_at));
        fields.insert("comments".to_string(), Value::Integer(self.comments_count as i64));
        fields.insert("comments_url".to_string(), Value::Text(self.comments_url.clone()));
        Value::Record(fields)
    }
}

/// Comment as returned by `GET /repos/{owner}/{repo}/issues/{number}/comments`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentRecord {
    #[serde(rename = "user")]
    pub author: Author,
    #[serde(default)]
    pub body: Option<String>,
    pub created_at: Timestamp,
    #[serde(default)]
    pub updated_at: Option<Timestamp>,
    #[serde(flatten)]
    pub extra: Map<String, serde_json::Value>,
}

impl Record for CommentRecord {
    fn to_value(&self) -> Value {
        let mut fields = record_fields(&self.extra);
        fields.insert("user".to_string(), self.author.to_value());
        fields.insert(
            "body".to_string(),
            self.body.clone().map_or(Value::Null, Value::Text),
        );
        fields.insert("created_at".to_string(), Value::Timestamp(self.created_at));
        fields.insert("updated_at".to_string(), Value::from_timestamp(self.updated_at));
        Value::Record(fields)
    }
}
