// Core containers and evaluators shared by every codeplug model
pub mod change;
pub mod constants;
pub mod context;
pub mod deferred;
pub mod enable;
pub mod field;
pub mod naming;
pub mod record;
pub mod validation;

// Re-export commonly used types
pub use change::{Change, ChangeKind, ChangeLog, FieldRef, RecordRef, Subscriber};
pub use constants::*;
pub use context::CodeplugContext;
pub use deferred::{ResolveReport, DEFAULT_MAX_PASSES};
pub use field::{DeferredRepr, DeferredValue, Field, FieldState, SourcePosition};
pub use record::{Record, RecordSet};
pub use validation::{Warning, WarningKind, Warnings};
