use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A received email as decoded from the service.
///
/// Only `subject` is guaranteed. Everything else the service sends (sender,
/// recipient, body, ids...) is kept untouched in `fields` for predicates to
/// inspect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub subject: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl EventRecord {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            fields: Map::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Convenience for string-valued fields such as `from` or `to`.
    pub fn field_str(&self, name: &str) -> Option<&str> {
        self.field(name).and_then(Value::as_str)
    }
}

/// What the poll endpoint returns: whatever is queued for a mailbox.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventBatch {
    pub emails: Vec<EventRecord>,
}

impl EventBatch {
    pub fn new(emails: Vec<EventRecord>) -> Self {
        Self { emails }
    }

    pub fn is_empty(&self) -> bool {
        self.emails.is_empty()
    }

    pub fn len(&self) -> usize {
        self.emails.len()
    }
}

impl IntoIterator for EventBatch {
    type Item = EventRecord;
    type IntoIter = std::vec::IntoIter<EventRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.emails.into_iter()
    }
}

/// Envelope of a single push frame: `{"data": { ...email... }}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushFrame {
    pub data: EventRecord,
}

impl PushFrame {
    pub fn encode(record: &EventRecord) -> Result<String, serde_json::Error> {
        #[derive(Serialize)]
        struct Borrowed<'a> {
            data: &'a EventRecord,
        }
        serde_json::to_string(&Borrowed { data: record })
    }

    pub fn decode(raw: &str) -> Result<EventRecord, serde_json::Error> {
        serde_json::from_str::<PushFrame>(raw).map(|frame| frame.data)
    }
}
