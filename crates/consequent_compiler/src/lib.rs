//! Match-to-action compilation for consequent.
//!
//! This crate provides:
//! - [`MatchChain`] - The partial-match sequence a firing hands over
//! - [`DeclarationResolver`] - Single-pass resolution of declarations against a chain
//! - [`ConsequenceCompiler`] - Builds [`CompiledConsequence`] units for rules
//! - [`ConsequenceStub`] - Compiles a consequence on first use
//! - [`RuleUnitCompiler`] - Generates rule-unit and rule-unit-instance scaffolding
//! - [`TemplateRegistry`] - Typed class templates the scaffolding is specialized from

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod chain;
pub mod config;
pub mod consequence;
pub mod declaration;
pub mod naming;
pub mod resolver;
pub mod template;
pub mod unit;

pub use chain::{ChainCursor, MatchChain, MatchNode};
pub use config::CompilerConfig;
pub use consequence::{
    ActionBody, CompiledConsequence, ConsequenceCompiler, ConsequenceStub, ConsequenceUnit, Effect,
    FiringReport, KnowledgeHelper, ParamSlot, ParameterLayout, RuleDescriptor, fire,
};
pub use declaration::{Declaration, Field, FieldExtractor, FnExtractor, WholeObject};
pub use naming::TokenSource;
pub use resolver::{DeclarationResolver, Resolution, ResolutionPlan, ResolvedSlot};
pub use template::{ClassDecl, Placeholder, Specializer, TemplateRegistry};
pub use unit::{
    BindStatement, RuleUnitCompiler, RuleUnitData, RuleUnitDescription, RuleUnitInstance,
    UnitArtifact, UnitData, UnitInstanceArtifact, UnitVariable,
};
