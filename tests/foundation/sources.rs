//! Data source integration tests

use std::sync::{Arc, Mutex};

use consequent_foundation::{DataProcessor, DataSource, Error, Result, Value};

/// Collects every value it receives.
#[derive(Default)]
struct Collect(Mutex<Vec<Value>>);

impl Collect {
    fn values(&self) -> Vec<Value> {
        self.0.lock().unwrap().clone()
    }
}

impl DataProcessor for Collect {
    fn insert(&self, value: Value) -> Result<()> {
        self.0.lock().unwrap().push(value);
        Ok(())
    }
}

/// Rejects everything.
struct Refuse;

impl DataProcessor for Refuse {
    fn insert(&self, _value: Value) -> Result<()> {
        Err(Error::action("refused"))
    }
}

// =============================================================================
// Publishing
// =============================================================================

#[test]
fn subscribers_see_later_values() {
    let source = DataSource::new();
    let sink = Arc::new(Collect::default());
    source.subscribe(sink.clone()).unwrap();

    source.append(Value::Int(1)).unwrap();
    source.append(Value::Int(2)).unwrap();

    assert_eq!(sink.values(), vec![Value::Int(1), Value::Int(2)]);
}

#[test]
fn late_subscribers_are_replayed() {
    let source = DataSource::new();
    source.append(Value::from("early")).unwrap();

    let sink = Arc::new(Collect::default());
    source.subscribe(sink.clone()).unwrap();
    source.append(Value::from("late")).unwrap();

    assert_eq!(sink.values(), vec![Value::from("early"), Value::from("late")]);
    assert_eq!(source.len(), 2);
}

#[test]
fn failing_subscriber_keeps_value_stored() {
    let source = DataSource::new();
    source.subscribe(Arc::new(Refuse)).unwrap();
    assert!(source.append(Value::Int(1)).is_err());
    assert_eq!(source.len(), 1);
}

// =============================================================================
// Identity
// =============================================================================

#[test]
fn clones_share_the_stream() {
    let source = DataSource::new();
    let alias = source.clone();
    alias.append(Value::Int(9)).unwrap();

    assert!(source.same(&alias));
    assert_eq!(source.len(), 1);
    assert_eq!(Value::from(source.clone()), Value::from(alias));
    assert_ne!(Value::from(source), Value::from(DataSource::new()));
}
