//! Per-document translation unit tracking for C-family editors.
//!
//! A [`Session`] keeps at most one parsed translation unit per open project
//! document, reparses it from unsaved buffer contents after edits settle,
//! and fans fresh snapshots out to completion, highlighting and
//! diagnostics helpers. The compiler itself sits behind the
//! [`CompilerFrontend`] trait.

pub mod cli;
pub mod config;
pub mod debouncer;
pub mod dispatch;
pub mod document;
pub mod driver;
pub mod error;
pub mod frontend;
pub mod helpers;
pub mod index;
pub mod logging;
pub mod notifications;
pub mod project;
pub mod session;

pub use config::Settings;
pub use dispatch::{DispatchReport, EntryEvent, UpdateDispatcher};
pub use document::{Document, DocumentId, DocumentProvider, Language};
pub use driver::{EventLoop, HostEvent};
pub use error::{CdkError, CdkResult};
pub use frontend::{CompilerFrontend, ErrorCode, IndexHandle, UnitHandle};
pub use index::SourceIndex;
pub use notifications::{NotificationBroadcaster, SessionEvent};
pub use project::{CompilerFlagSet, Project, ProjectConfig, ProjectFileSet};
pub use session::{Session, TickReport};
