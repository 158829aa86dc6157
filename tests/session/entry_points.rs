//! Entry point integration tests

use std::sync::Arc;

use consequent_foundation::{DataSource, Value};
use consequent_session::{EntryPointDataProcessor, Session, SessionConfig};

// =============================================================================
// Declaration
// =============================================================================

#[test]
fn partitions_follow_declaration_order() {
    let mut session = Session::new();
    let persons = session.entry_point("persons");
    let results = session.entry_point("results");

    assert_eq!(persons.partition(), 1);
    assert_eq!(results.partition(), 2);
    let names: Vec<_> = session.entry_point_names().collect();
    assert_eq!(names, vec!["DEFAULT", "persons", "results"]);
}

#[test]
fn custom_default_entry_point() {
    let session = Session::with_config(SessionConfig::default().with_default_entry_point("main"));
    assert!(session.find_entry_point("main").is_some());
    assert!(session.find_entry_point("DEFAULT").is_none());
}

#[test]
fn entry_point_debug_form() {
    let mut session = Session::new();
    let persons = session.entry_point("persons");
    assert_eq!(format!("{persons:?}"), "EntryPoint(persons#1)");
}

// =============================================================================
// Data Source Forwarding
// =============================================================================

#[test]
fn source_feeds_entry_point() {
    let mut session = Session::new();
    let persons = session.entry_point("persons");
    let source = DataSource::new();
    source.append(Value::from("Mario")).unwrap();

    source
        .subscribe(Arc::new(EntryPointDataProcessor::new(persons.clone())))
        .unwrap();
    source.append(Value::from("Sofia")).unwrap();

    assert_eq!(persons.len(), 2);
    assert_eq!(
        persons.objects().unwrap(),
        vec![Value::from("Mario"), Value::from("Sofia")]
    );
    // Default entry point untouched
    assert!(session.find_entry_point("DEFAULT").unwrap().is_empty());
}
