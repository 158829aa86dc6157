//! Consequence compiler integration tests

use std::sync::{Arc, Mutex};

use consequent_compiler::{
    ActionBody, CompilerConfig, ConsequenceCompiler, ConsequenceUnit, Declaration, Field,
    KnowledgeHelper, MatchChain, MatchNode, ParamSlot, RuleDescriptor, TokenSource,
};
use consequent_foundation::{Error, ErrorKind, FactObject, Type, Value};
use consequent_session::{GlobalStore, GlobalTypes, WorkingMemory};

type Calls = Arc<Mutex<Vec<Vec<Value>>>>;

fn recording(signature: Vec<Type>) -> (ActionBody, Calls) {
    let calls: Calls = Arc::default();
    let sink = Arc::clone(&calls);
    let action = ActionBody::new("Rules", "consequence", signature, move |_, args| {
        sink.lock().unwrap().push(args.to_vec());
        Ok(())
    });
    (action, calls)
}

fn person(name: &str, age: i64) -> Value {
    Value::from(FactObject::with_fields(
        "Person",
        [("name", Value::from(name)), ("age", Value::Int(age))],
    ))
}

fn compiler() -> ConsequenceCompiler {
    ConsequenceCompiler::new(CompilerConfig::reproducible(5).with_package("org.test"))
}

// =============================================================================
// Argument Layout
// =============================================================================

#[test]
fn arguments_pair_values_with_identities_then_globals() {
    let mut memory = WorkingMemory::new();
    let mario = person("Mario", 40);
    let handle = memory.insert(mario.clone(), 0);
    let chain = MatchChain::root(MatchNode::new(handle, mario.clone()));

    let mut globals = GlobalStore::with_types(GlobalTypes::new().with("limit", Type::Int));
    globals.set("limit", Value::Int(18)).unwrap();

    let (action, calls) = recording(vec![
        Type::fact("Person"),
        Type::Handle,
        Type::Int,
        Type::Handle,
        Type::Int,
    ]);
    let unit = compiler()
        .compile(
            &RuleDescriptor::new("adults").with_global("limit"),
            &[
                Declaration::direct("$p", Type::fact("Person"), 0, 0),
                Declaration::indirect("$age", Type::Int, 0, 1, Arc::new(Field::new("age"))),
            ],
            globals.types(),
            action,
        )
        .unwrap();

    let slots: Vec<String> = unit.layout().slots().iter().map(ToString::to_string).collect();
    assert_eq!(slots.len(), 5);
    assert!(matches!(unit.layout().slots()[4], ParamSlot::Global { .. }));

    let mut helper = KnowledgeHelper::new(&chain, &memory, &globals);
    unit.evaluate(&mut helper).unwrap();

    let calls = calls.lock().unwrap();
    assert_eq!(
        calls[0],
        vec![
            mario,
            Value::from(handle),
            Value::Int(40),
            Value::Nil,
            Value::Int(18),
        ]
    );
}

#[test]
fn layout_types_follow_declarations() {
    let (action, _) = recording(vec![Type::String, Type::Handle]);
    let unit = compiler()
        .compile(
            &RuleDescriptor::new("names"),
            &[Declaration::indirect("$n", Type::String, 0, 0, Arc::new(Field::new("name")))],
            &GlobalTypes::new(),
            action,
        )
        .unwrap();
    assert_eq!(unit.layout().types(), vec![Type::String, Type::Handle]);
    assert_eq!(unit.layout().declaration_count(), 1);
    assert_eq!(unit.layout().global_count(), 0);
}

// =============================================================================
// Build Errors
// =============================================================================

#[test]
fn undeclared_global_fails_the_build() {
    let (action, _) = recording(vec![Type::Any]);
    let err = compiler()
        .compile(
            &RuleDescriptor::new("r").with_global("list"),
            &[],
            &GlobalTypes::new(),
            action,
        )
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::UnresolvedGlobal(ref g) if g == "list"));
    assert!(err.is_build_error());
    let ctx = err.context.unwrap();
    assert_eq!(ctx.rule.as_deref(), Some("r"));
    assert!(ctx.artifact.unwrap().ends_with("ConsequenceInvoker"));
}

#[test]
fn signature_must_match_layout() {
    let (action, _) = recording(vec![Type::fact("Person")]);
    let err = compiler()
        .compile(
            &RuleDescriptor::new("r"),
            &[Declaration::direct("$p", Type::fact("Person"), 0, 0)],
            &GlobalTypes::new(),
            action,
        )
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::SignatureMismatch(_)));
}

#[test]
fn explicit_chain_depth_bounds_declarations() {
    let (action, _) = recording(vec![Type::Any, Type::Handle]);
    let err = compiler()
        .compile(
            &RuleDescriptor::new("r").with_chain_depth(0),
            &[Declaration::direct("$p", Type::Any, 1, 0)],
            &GlobalTypes::new(),
            action,
        )
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::DepthOutOfRange { depth: 1, max: 0, .. }));
}

#[test]
fn unchecked_signatures_compile() {
    let config = CompilerConfig::reproducible(5).with_signature_verification(false);
    let (action, _) = recording(vec![]);
    let unit = ConsequenceCompiler::new(config).compile(
        &RuleDescriptor::new("r"),
        &[Declaration::direct("$p", Type::Any, 0, 0)],
        &GlobalTypes::new(),
        action,
    );
    assert!(unit.is_ok());
}

// =============================================================================
// Naming
// =============================================================================

#[test]
fn seeded_compilers_name_identically() {
    let rule = RuleDescriptor::new("adults");
    let a = ConsequenceCompiler::new(CompilerConfig::reproducible(9));
    let b = ConsequenceCompiler::new(CompilerConfig::reproducible(9));
    assert_eq!(a.invoker_name(&rule), b.invoker_name(&rule));
    assert!(a.invoker_name(&rule).starts_with("defaultpkg.Rule_adults_"));
}

#[test]
fn rule_package_overrides_default() {
    let compiler = ConsequenceCompiler::new(
        CompilerConfig::default().with_tokens(TokenSource::seeded(1)),
    );
    let name = compiler.invoker_name(&RuleDescriptor::new("r").with_package("org.other"));
    assert!(name.starts_with("org.other.Rule_r_"));
}

// =============================================================================
// Lazy Compilation
// =============================================================================

#[test]
fn stub_compiles_on_first_firing() {
    let mut memory = WorkingMemory::new();
    let mario = person("Mario", 40);
    let chain = MatchChain::root(MatchNode::new(memory.insert(mario.clone(), 0), mario));
    let globals = GlobalStore::new();

    let (action, calls) = recording(vec![Type::fact("Person"), Type::Handle]);
    let stub = compiler().stub(
        RuleDescriptor::new("lazy"),
        vec![Declaration::direct("$p", Type::fact("Person"), 0, 0)],
        GlobalTypes::new(),
        action,
    );
    let name = stub.identify().to_string();
    assert!(!stub.is_compiled());

    for _ in 0..2 {
        let mut helper = KnowledgeHelper::new(&chain, &memory, &globals);
        stub.evaluate(&mut helper).unwrap();
    }

    assert!(stub.is_compiled());
    assert_eq!(stub.unit().unwrap().identify(), name);
    assert_eq!(calls.lock().unwrap().len(), 2);
}

#[test]
fn action_errors_reach_the_caller() {
    let memory = WorkingMemory::new();
    let globals = GlobalStore::new();
    let action = ActionBody::new("Rules", "fails", vec![], |_, _| Err(Error::action("boom")));
    let unit = compiler()
        .compile(&RuleDescriptor::new("r"), &[], &GlobalTypes::new(), action)
        .unwrap();

    let chain = MatchChain::new();
    let mut helper = KnowledgeHelper::new(&chain, &memory, &globals);
    let err = unit.evaluate(&mut helper).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Action(ref m) if m == "boom"));
}
