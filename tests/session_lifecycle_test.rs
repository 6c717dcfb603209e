mod common;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use cdk::document::unit::UnitState;
use cdk::frontend::{
    CompletionItem, CursorClass, Diagnostic, ErrorCode, Severity, SourceLocation, TokenKind,
};
use cdk::{
    CdkError, CompilerFlagSet, Document, DocumentId, EntryEvent, Language, ProjectConfig, Session,
    SessionEvent, Settings,
};
use common::{FakeDocument, FakeFrontend, FakeProvider, member, project_dir, token};
use tempfile::TempDir;

const REPARSE: Duration = Duration::from_millis(250);
const HIGHLIGHT: Duration = Duration::from_millis(500);

fn config(cflags: &str, files: &[&str]) -> ProjectConfig {
    ProjectConfig::new(cflags, files.iter().map(PathBuf::from).collect())
}

/// A session with an open project containing `files`.
fn open_session(files: &[&str], cflags: &str) -> (TempDir, FakeFrontend, Session) {
    let dir = project_dir(files);
    let frontend = FakeFrontend::new();
    let mut session = Session::new(Settings::default(), Box::new(frontend.clone()));
    session.open_project(dir.path(), &config(cflags, files)).unwrap();
    (dir, frontend, session)
}

fn doc(dir: &TempDir, id: u64, file: &str, contents: &str) -> FakeDocument {
    FakeDocument::new(id, dir.path().join(file), contents)
}

fn record_events(session: &mut Session, id: DocumentId) -> Arc<Mutex<Vec<EntryEvent>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    assert!(session.observe(id, move |_, event| sink.lock().unwrap().push(event.clone())));
    events
}

#[test]
fn test_open_edit_close_scenario() {
    let (dir, frontend, mut session) = open_session(&["a.c"], "-std=c11");
    let a = doc(&dir, 1, "a.c", "int main(void) { return 0; }\n");
    let provider = FakeProvider::new(vec![a.clone()]);

    assert!(session.document_opened(&a));
    let unit = session.get_translation_unit(a.id()).expect("unit after add");
    {
        let state = frontend.state();
        assert_eq!(state.parses.len(), 1);
        assert_eq!(state.parses[0].1, vec!["-std=c11".to_string()]);
        // add() performs one update from disk
        assert_eq!(state.reparses.len(), 1);
        assert_eq!(state.reparses[0].unsaved, None);
    }

    let t0 = Instant::now();
    a.edit("int main(void) { return 1; }\n");
    assert!(session.text_modified_at(a.id(), t0));
    a.edit("int main(void) { return 2; }\n");
    assert!(session.text_modified_at(a.id(), t0 + Duration::from_millis(200)));

    // Not yet due
    assert!(session.tick(t0 + Duration::from_millis(100), &provider).reparsed.is_empty());

    // Fires relative to the first edit
    let report = session.tick(t0 + REPARSE, &provider);
    assert_eq!(report.reparsed, vec![a.id()]);
    {
        let state = frontend.state();
        assert_eq!(state.reparses.len(), 2);
        assert_eq!(state.reparses[1].unit, unit);
        assert_eq!(
            state.reparses[1].unsaved.as_deref(),
            Some(&b"int main(void) { return 2; }\n"[..])
        );
    }
    assert!(session.tick(t0 + REPARSE * 4, &provider).is_idle());

    // A pending timer must never fire after the project closes
    a.edit("int main(void) { return 3; }\n");
    session.text_modified_at(a.id(), t0 + REPARSE * 5);
    session.close_project();

    assert_eq!(session.get_translation_unit(a.id()), None);
    assert!(!session.reparse_pending(a.id()));
    assert!(session.tick(t0 + REPARSE * 10, &provider).is_idle());

    let state = frontend.state();
    assert_eq!(state.reparses.len(), 2);
    assert!(state.live_units.is_empty());
    assert!(state.live_indexes.is_empty());
}

#[test]
fn test_add_requires_every_eligibility_condition() {
    let dir = project_dir(&["a.c", "b.c"]);
    let frontend = FakeFrontend::new();
    let mut session = Session::new(Settings::default(), Box::new(frontend.clone()));

    // No project open
    let a = doc(&dir, 1, "a.c", "");
    assert!(!session.add(&a));

    session.open_project(dir.path(), &config("", &["a.c"])).unwrap();

    // Never saved
    assert!(!session.add(&FakeDocument::untitled(2)));

    // Not a project member
    assert!(!session.add(&doc(&dir, 3, "b.c", "")));

    // Unsupported language
    let python = doc(&dir, 4, "a.c", "");
    python.set_language(Language::Other("python".into()));
    assert!(!session.add(&python));

    // Destroyed by the host
    let stale = doc(&dir, 5, "a.c", "");
    stale.invalidate();
    assert!(!session.add(&stale));

    assert!(frontend.state().parses.is_empty());

    assert!(session.add(&a));
    assert!(session.is_tracked(a.id()));
}

#[test]
fn test_disabled_language_is_rejected() {
    let dir = project_dir(&["view.m"]);
    let mut settings = Settings::default();
    settings.languages.objc = false;
    let mut session = Session::new(settings, Box::new(FakeFrontend::new()));
    session.open_project(dir.path(), &config("", &["view.m"])).unwrap();

    assert!(!session.add(&doc(&dir, 1, "view.m", "")));
}

#[test]
fn test_membership_uses_canonical_paths() {
    let (dir, _frontend, mut session) = open_session(&["src/a.c"], "");
    let dotted = FakeDocument::new(1, dir.path().join("src/../src/./a.c"), "");

    assert!(session.add(&dotted));
    assert_eq!(session.files(), vec![member(&dir, "src/a.c").as_path()]);
}

#[test]
fn test_readd_never_holds_two_units() {
    let (dir, frontend, mut session) = open_session(&["a.c"], "");
    let a = doc(&dir, 1, "a.c", "");

    assert!(session.add(&a));
    let first = session.get_translation_unit(a.id()).unwrap();

    assert!(session.document_filetype_changed(&a));
    let second = session.get_translation_unit(a.id()).unwrap();

    assert!(session.add(&a));
    let third = session.get_translation_unit(a.id()).unwrap();

    assert_ne!(first, second);
    assert_ne!(second, third);
    let state = frontend.state();
    assert_eq!(state.max_live_per_path, 1);
    assert_eq!(state.disposed_units, vec![first, second]);
    assert_eq!(state.live_units.len(), 1);
}

#[test]
fn test_readd_with_failing_parse_leaves_document_untracked() {
    let (dir, frontend, mut session) = open_session(&["a.c"], "");
    let a = doc(&dir, 1, "a.c", "");
    assert!(session.add(&a));

    frontend.state().fail_parse = Some(ErrorCode::Failure);
    assert!(!session.add(&a));

    assert!(!session.is_tracked(a.id()));
    assert!(frontend.state().live_units.is_empty());
}

#[test]
fn test_parse_failure_disposes_broken_handle() {
    let (dir, frontend, mut session) = open_session(&["a.c"], "");
    {
        let mut state = frontend.state();
        state.fail_parse = Some(ErrorCode::AstReadError);
        state.broken_handle_on_failure = true;
    }
    let mut events = session.subscribe();

    assert!(!session.add(&doc(&dir, 1, "a.c", "")));

    assert_eq!(session.get_translation_unit(DocumentId(1)), None);
    let state = frontend.state();
    assert!(state.live_units.is_empty());
    assert_eq!(state.disposed_units.len(), 1);
    assert!(events.try_recv().is_err(), "no notification for a failed add");
}

#[test]
fn test_remove() {
    let (dir, frontend, mut session) = open_session(&["a.c"], "");
    let a = doc(&dir, 1, "a.c", "");

    assert!(!session.remove(a.id()));
    assert!(!session.document_closed(a.id()));

    session.add(&a);
    let unit = session.get_translation_unit(a.id()).unwrap();
    session.text_modified(a.id());

    assert!(session.document_closed(a.id()));
    assert!(!session.is_tracked(a.id()));
    assert!(!session.reparse_pending(a.id()));
    assert_eq!(frontend.state().disposed_units, vec![unit]);

    // Second removal is a no-op
    assert!(!session.remove(a.id()));
}

#[test]
fn test_failed_reparse_keeps_previous_unit() {
    let (dir, frontend, mut session) = open_session(&["a.c"], "");
    let a = doc(&dir, 1, "a.c", "int x;");
    session.add(&a);
    let unit = session.get_translation_unit(a.id()).unwrap();
    let events = record_events(&mut session, a.id());
    let mut broadcast = session.subscribe();

    frontend.state().fail_reparse = Some(ErrorCode::Crashed);
    a.edit("int x = ;");
    assert!(!session.update(&a));

    assert_eq!(session.get_translation_unit(a.id()), Some(unit));
    assert_eq!(
        session.entry(a.id()).unwrap().unit().state(),
        UnitState::Stale
    );
    // No dispatch for a failed reparse
    assert!(events.lock().unwrap().is_empty());
    assert_eq!(
        broadcast.try_recv().unwrap(),
        SessionEvent::DocumentStale { id: a.id() }
    );

    frontend.state().fail_reparse = None;
    assert!(session.update(&a));
    assert_eq!(
        session.entry(a.id()).unwrap().unit().state(),
        UnitState::Parsed
    );
}

#[test]
fn test_dispatch_order_and_isolation() {
    let (dir, frontend, mut session) = open_session(&["a.c"], "");
    let a = doc(&dir, 1, "a.c", "int x = y;\n");
    session.add(&a);
    let events = record_events(&mut session, a.id());

    {
        let mut state = frontend.state();
        state.fail_tokenize = Some(ErrorCode::InvalidArguments);
        state.diagnostics = vec![Diagnostic {
            severity: Severity::Error,
            message: "use of undeclared identifier 'y'".into(),
            location: SourceLocation {
                file: None,
                line: 1,
                offset: 8,
            },
            ranges: Vec::new(),
        }];
    }

    let report = session.update_with_report(&a).unwrap();
    assert_eq!(report.refreshed, vec!["completer", "diagnostics"]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, "highlighter");
    assert!(report.announced);

    let events = events.lock().unwrap();
    assert_eq!(events.len(), 4);
    assert_eq!(events[0], EntryEvent::Refreshed { helper: "completer" });
    assert!(matches!(
        events[1],
        EntryEvent::RefreshFailed {
            helper: "highlighter",
            ..
        }
    ));
    assert_eq!(events[2], EntryEvent::Refreshed { helper: "diagnostics" });
    assert_eq!(events[3], EntryEvent::Updated);

    // Later helpers still ran
    let entry = session.entry(a.id()).unwrap();
    assert_eq!(entry.helpers().diagnostics.indicators()[0].range, 8..9);
    assert_eq!(entry.helpers().diagnostics.markers()[0].line, 0);
}

#[test]
fn test_diagnostics_from_other_files_are_ignored() {
    let (dir, frontend, mut session) = open_session(&["a.c"], "");
    frontend.state().diagnostics = vec![Diagnostic {
        severity: Severity::Warning,
        message: "unused function".into(),
        location: SourceLocation {
            file: Some(dir.path().join("util.h")),
            line: 3,
            offset: 4,
        },
        ranges: Vec::new(),
    }];
    let a = doc(&dir, 1, "a.c", "#include \"util.h\"\n");
    session.add(&a);

    let entry = session.entry(a.id()).unwrap();
    assert!(entry.helpers().diagnostics.indicators().is_empty());
    assert!(entry.helpers().diagnostics.markers().is_empty());
}

#[test]
fn test_highlight_requests_coalesce() {
    let (dir, frontend, mut session) = open_session(&["a.c"], "");
    let contents = "x".repeat(64);
    let a = doc(&dir, 1, "a.c", &contents);
    let provider = FakeProvider::new(vec![a.clone()]);
    frontend.state().tokens = vec![token(TokenKind::Identifier, CursorClass::Call, 12..18)];
    session.add(&a);
    let baseline = frontend.state().tokenize_calls.len();

    let t0 = Instant::now();
    session.style_needed_at(a.id(), 10..20, t0);
    session.style_needed_at(a.id(), 15..30, t0 + Duration::from_millis(100));
    assert!(session.tick(t0 + Duration::from_millis(499), &provider).highlighted.is_empty());
    assert_eq!(session.tick(t0 + HIGHLIGHT, &provider).highlighted, vec![a.id()]);
    assert!(session.tick(t0 + HIGHLIGHT * 2, &provider).highlighted.is_empty());

    assert_eq!(frontend.state().tokenize_calls[baseline..], [10..30]);

    // Outside the window: two passes
    let t1 = t0 + HIGHLIGHT * 3;
    session.style_needed_at(a.id(), 10..20, t1);
    session.tick(t1 + HIGHLIGHT, &provider);
    session.style_needed_at(a.id(), 15..30, t1 + HIGHLIGHT + Duration::from_millis(1));
    session.tick(t1 + HIGHLIGHT * 2 + Duration::from_millis(1), &provider);

    assert_eq!(
        frontend.state().tokenize_calls[baseline + 1..],
        [10..20, 15..30]
    );
    let spans = session.entry(a.id()).unwrap().helpers().highlighter.spans();
    assert_eq!(spans.len(), 1);
    assert_eq!(spans[0].range, 12..18);
}

#[test]
fn test_index_creation_failure_aborts_open() {
    let dir = project_dir(&["a.c"]);
    let frontend = FakeFrontend::new();
    frontend.state().fail_index = Some(ErrorCode::Failure);
    let mut session = Session::new(Settings::default(), Box::new(frontend.clone()));

    let err = session
        .open_project(dir.path(), &config("", &["a.c"]))
        .unwrap_err();
    assert!(matches!(err, CdkError::IndexCreation { code: ErrorCode::Failure }));
    assert!(!session.is_project_open());
    assert!(!session.add(&doc(&dir, 1, "a.c", "")));
}

#[test]
fn test_reopen_recreates_index() {
    let (dir, frontend, mut session) = open_session(&["a.c"], "");
    session.open_project(dir.path(), &config("", &["a.c"])).unwrap();
    assert_eq!(frontend.state().live_indexes.len(), 1);
}

#[test]
fn test_reconfigure_retracks_open_documents() {
    let (dir, frontend, mut session) = open_session(&["a.c", "b.c"], "-DOLD");
    let a = doc(&dir, 1, "a.c", "");
    let b = doc(&dir, 2, "b.c", "");
    let provider = FakeProvider::new(vec![a.clone(), b.clone()]);
    assert_eq!(session.add_open_documents(&provider), 1);

    let tracked = session
        .reconfigure("-DNEW -Iinclude", &[PathBuf::from("a.c"), PathBuf::from("b.c")], &provider)
        .unwrap();

    assert_eq!(tracked, 2);
    assert_eq!(session.cflags(), ["-DNEW", "-Iinclude"]);
    assert_eq!(frontend.state().live_units.len(), 2);

    // Malformed flags keep the previous set
    session
        .reconfigure("-DX=\"unterminated", &[PathBuf::from("a.c")], &provider)
        .unwrap();
    assert_eq!(session.cflags(), ["-DNEW", "-Iinclude"]);
    assert!(session.is_tracked(a.id()));
    assert!(!session.is_tracked(b.id()));
}

#[test]
fn test_save_project_stores_relative_paths() {
    let (_dir, _frontend, session) = open_session(&["src/a.c", "src/b.c"], "-std=c11 -DNAME=\"a b\"");

    let saved = session.save_project().unwrap();
    assert_eq!(
        saved.files().unwrap(),
        [PathBuf::from("src/a.c"), PathBuf::from("src/b.c")]
    );
    let reloaded = CompilerFlagSet::parse(saved.cflags().unwrap()).unwrap();
    assert_eq!(reloaded.args(), ["-std=c11", "-DNAME=a b"]);
    assert_eq!(session.cflags(), ["-std=c11", "-DNAME=a b"]);
}

#[test]
fn test_current_document() {
    let (dir, _frontend, mut session) = open_session(&["a.c"], "");
    let a = doc(&dir, 1, "a.c", "");

    assert!(!session.set_current(Some(a.id())));
    assert!(session.document_opened(&a));
    assert!(session.document_activated(&a));
    assert_eq!(session.current(), Some(a.id()));

    session.document_closed(a.id());
    assert_eq!(session.current(), None);
}

#[test]
fn test_document_saved_tracks_new_member() {
    let (dir, frontend, mut session) = open_session(&["a.c"], "");
    let a = doc(&dir, 1, "a.c", "int a;");

    assert!(session.document_saved(&a));
    assert!(session.is_tracked(a.id()));

    a.edit("int a = 1;");
    a.mark_saved();
    assert!(session.document_saved(&a));
    // Saved buffers are reparsed from disk
    assert_eq!(frontend.state().reparses.last().unwrap().unsaved, None);
}

#[cfg(unix)]
#[test]
fn test_member_created_later_under_symlinked_project() {
    let dir = TempDir::new().unwrap();
    let real_dir = dunce::canonicalize(dir.path()).unwrap().join("real");
    std::fs::create_dir(&real_dir).unwrap();
    let link_dir = dir.path().join("proj");
    std::os::unix::fs::symlink(&real_dir, &link_dir).unwrap();

    let frontend = FakeFrontend::new();
    let mut session = Session::new(Settings::default(), Box::new(frontend.clone()));
    session.open_project(&link_dir, &config("", &["new.c"])).unwrap();

    // The host reports the resolved location once the file is written
    std::fs::write(real_dir.join("new.c"), "int n;").unwrap();
    let created = FakeDocument::new(1, real_dir.join("new.c"), "int n;");

    assert!(session.document_saved(&created));
    assert_eq!(session.files(), [real_dir.join("new.c").as_path()]);

    let saved = session.save_project().unwrap();
    assert_eq!(saved.files().unwrap(), [PathBuf::from("new.c")]);
}

#[test]
fn test_completion_uses_prefix() {
    let (dir, frontend, mut session) = open_session(&["a.c"], "");
    frontend.state().completions = ["printf", "print_usage", "puts", "printf"]
        .into_iter()
        .map(|name| CompletionItem {
            typed_text: name.to_string(),
            priority: 50,
        })
        .collect();
    let a = doc(&dir, 1, "a.c", "void f(void) { pri");
    session.add(&a);

    let items = session.complete(&a, a.len()).unwrap();
    assert_eq!(items, vec!["print_usage".to_string(), "printf".to_string()]);

    // Two characters are not enough to trigger
    let b = doc(&dir, 1, "a.c", "void f(void) { pr");
    assert_eq!(session.complete(&b, b.len()), None);
}

#[test]
fn test_session_events_in_order() {
    let (dir, _frontend, mut session) = open_session(&["a.c"], "");
    let mut events = session.subscribe();
    let a = doc(&dir, 1, "a.c", "");

    session.add(&a);
    session.close_project();

    let id = a.id();
    assert!(matches!(
        events.try_recv().unwrap(),
        SessionEvent::DocumentAdded { id: added, .. } if added == id
    ));
    assert_eq!(events.try_recv().unwrap(), SessionEvent::DocumentUpdated { id });
    assert_eq!(events.try_recv().unwrap(), SessionEvent::DocumentRemoved { id });
    assert_eq!(events.try_recv().unwrap(), SessionEvent::ProjectClosed);
}
