//! Global store integration tests

use consequent_foundation::{DataSource, ErrorKind, Type, Value};
use consequent_session::{GlobalStore, GlobalTypes, Session, SessionConfig};

// =============================================================================
// Declared Types
// =============================================================================

#[test]
fn session_globals_are_checked_against_declarations() {
    let mut session = Session::with_config(
        SessionConfig::default()
            .with_global("limit", Type::Int)
            .with_global("results", Type::Source),
    );

    session.set_global("results", Value::from(DataSource::new())).unwrap();
    let err = session.set_global("limit", Value::from("18")).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::TypeMismatch { .. }));
    assert_eq!(session.get_global("limit"), None);
    assert_eq!(session.globals().types().type_of("limit"), Some(&Type::Int));
}

#[test]
fn optional_globals_accept_nil() {
    let mut store = GlobalStore::with_types(
        GlobalTypes::new().with("logger", Type::option(Type::String)),
    );
    store.set("logger", Value::Nil).unwrap();
    store.set("logger", Value::from("stdout")).unwrap();
    assert_eq!(store.require("logger").unwrap(), &Value::from("stdout"));
}

#[test]
fn require_distinguishes_unset_globals() {
    let store = GlobalStore::with_types(GlobalTypes::new().with("list", Type::vec(Type::Any)));
    let err = store.require("list").unwrap_err();
    assert!(matches!(err.kind, ErrorKind::MissingGlobal(ref n) if n == "list"));
    assert!(store.is_empty());
}

#[test]
fn declared_names_iterate_in_order() {
    let types = GlobalTypes::new()
        .with("zeta", Type::Int)
        .with("alpha", Type::String);
    let names: Vec<_> = types.iter().map(|(n, _)| n).collect();
    assert_eq!(names, vec!["alpha", "zeta"]);
}
