// Field instances and their explicit state machine
// Valid -> Invalid on failed validation, Deferred until a reference target is loaded

use crate::schema::FieldTypeDescriptor;
use crate::value::{self, Value, ValueError};
use std::fmt;

/// Where an imported value came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePosition {
    pub source: Option<String>,
    pub line: usize,
    pub column: usize,
}

impl SourcePosition {
    pub fn new(line: usize, column: usize) -> Self {
        Self {
            source: None,
            line,
            column,
        }
    }

    pub fn in_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Some(source) => write!(f, "{}:{}:{}", source, self.line, self.column),
            None => write!(f, "line {}, column {}", self.line, self.column),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeferredRepr {
    /// Bytes read from the buffer, decoded once the target is loaded
    Raw(Vec<u8>),
    /// Display text supplied by an importer
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeferredValue {
    pub repr: DeferredRepr,
    pub position: Option<SourcePosition>,
}

impl DeferredValue {
    pub fn raw(bytes: Vec<u8>) -> Self {
        Self {
            repr: DeferredRepr::Raw(bytes),
            position: None,
        }
    }

    pub fn text(text: impl Into<String>, position: Option<SourcePosition>) -> Self {
        Self {
            repr: DeferredRepr::Text(text.into()),
            position,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldState {
    Valid(Value),
    /// Value kept for display; only unreadable raw bytes are ever written back
    Invalid { value: Value, error: ValueError },
    Deferred(DeferredValue),
}

/// One instance of a field type within a record
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// Index of the field type in its record type
    pub type_index: usize,
    /// Repeat index, kept equal to the position in its container
    pub index: usize,
    pub state: FieldState,
}

impl Field {
    pub fn new(type_index: usize, index: usize, state: FieldState) -> Self {
        Self {
            type_index,
            index,
            state,
        }
    }

    pub fn valid(type_index: usize, index: usize, value: Value) -> Self {
        Self::new(type_index, index, FieldState::Valid(value))
    }

    /// The value, when it is valid
    pub fn value(&self) -> Option<&Value> {
        match &self.state {
            FieldState::Valid(value) => Some(value),
            _ => None,
        }
    }

    /// The value whether valid or not
    pub fn held_value(&self) -> Option<&Value> {
        match &self.state {
            FieldState::Valid(value) | FieldState::Invalid { value, .. } => Some(value),
            FieldState::Deferred(_) => None,
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self.state, FieldState::Valid(_))
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self.state, FieldState::Invalid { .. })
    }

    pub fn is_deferred(&self) -> bool {
        matches!(self.state, FieldState::Deferred(_))
    }

    pub fn error(&self) -> Option<&ValueError> {
        match &self.state {
            FieldState::Invalid { error, .. } => Some(error),
            _ => None,
        }
    }

    /// Re-check the held value, moving between Valid and Invalid
    pub fn revalidated(&self, result: value::Result<()>) -> Option<FieldState> {
        let value = self.held_value()?.clone();
        let next = match result {
            Ok(()) => FieldState::Valid(value),
            Err(error) => FieldState::Invalid { value, error },
        };
        (next != self.state).then_some(next)
    }

    pub fn display(&self, ft: &FieldTypeDescriptor) -> String {
        match &self.state {
            FieldState::Valid(value) | FieldState::Invalid { value, .. } => value::format(ft, value),
            FieldState::Deferred(DeferredValue {
                repr: DeferredRepr::Text(text),
                ..
            }) => text.clone(),
            FieldState::Deferred(DeferredValue {
                repr: DeferredRepr::Raw(bytes),
                ..
            }) => value::hex::format(bytes),
        }
    }
}

/// Renumber a field container after insert/remove/move
pub fn renumber(fields: &mut [Field]) {
    for (i, field) in fields.iter_mut().enumerate() {
        field.index = i;
    }
}
