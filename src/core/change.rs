// Change notifications
// Every user-visible mutation becomes one Change, recorded and forwarded to the subscriber

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    FieldChange,
    /// Batch of records that had a reference field re-targeted
    RecordsFieldChange,
    InsertRecords,
    MoveRecords,
    RemoveRecords,
    InsertFields,
    MoveFields,
    RemoveFields,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordRef {
    pub record_type: String,
    pub index: usize,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRef {
    pub record: RecordRef,
    pub field_type: String,
    pub index: usize,
    /// Display value after the change
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub kind: ChangeKind,
    pub records: Vec<RecordRef>,
    pub fields: Vec<FieldRef>,
    /// Display strings of the state before the change, parallel to `fields`
    /// (or to `records` for record operations)
    pub previous: Vec<String>,
}

impl Change {
    pub fn new(kind: ChangeKind) -> Self {
        Self {
            kind,
            records: Vec::new(),
            fields: Vec::new(),
            previous: Vec::new(),
        }
    }

    pub fn record(mut self, record: RecordRef) -> Self {
        self.records.push(record);
        self
    }

    pub fn field(mut self, field: FieldRef, previous: impl Into<String>) -> Self {
        self.fields.push(field);
        self.previous.push(previous.into());
        self
    }

    pub fn previous(mut self, previous: impl Into<String>) -> Self {
        self.previous.push(previous.into());
        self
    }
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.kind)?;
        for field in &self.fields {
            write!(
                f,
                " {}[{}].{}[{}]={:?}",
                field.record.record_type,
                field.record.index + 1,
                field.field_type,
                field.index + 1,
                field.value
            )?;
        }
        if self.fields.is_empty() {
            for record in &self.records {
                write!(f, " {}[{}] {:?}", record.record_type, record.index + 1, record.name)?;
            }
        }
        Ok(())
    }
}

pub type Subscriber = Box<dyn FnMut(&Change) + Send>;

/// Change history plus the single registered subscriber
#[derive(Default)]
pub struct ChangeLog {
    subscriber: Option<Subscriber>,
    history: Vec<Change>,
}

impl fmt::Debug for ChangeLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeLog")
            .field("subscribed", &self.subscriber.is_some())
            .field("history", &self.history.len())
            .finish()
    }
}

impl ChangeLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the subscriber
    pub fn subscribe(&mut self, subscriber: Subscriber) {
        self.subscriber = Some(subscriber);
    }

    pub fn unsubscribe(&mut self) {
        self.subscriber = None;
    }

    /// Record a fully applied change and notify the subscriber
    pub fn emit(&mut self, change: Change) {
        tracing::debug!("Change: {}", change);
        if let Some(subscriber) = self.subscriber.as_mut() {
            subscriber(&change);
        }
        self.history.push(change);
    }

    pub fn history(&self) -> &[Change] {
        &self.history
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }
}
