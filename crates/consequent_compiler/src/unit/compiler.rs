//! The rule-unit scaffold compiler.

use std::sync::Arc;

use consequent_foundation::{Error, ErrorContext, Result};
use tracing::debug;

use super::{ArtifactName, BindStatement, RuleUnitDescription, UnitArtifact, UnitInstanceArtifact};
use crate::config::CompilerConfig;
use crate::template::{
    BIND_METHOD, Placeholder, RULE_UNIT_INSTANCE_TEMPLATE, RULE_UNIT_TEMPLATE, Specializer,
    TemplateRegistry,
};

/// Generates rule-unit scaffolding from [`RuleUnitDescription`]s.
#[derive(Clone, Debug)]
pub struct RuleUnitCompiler {
    config: CompilerConfig,
    templates: TemplateRegistry,
}

impl Default for RuleUnitCompiler {
    fn default() -> Self {
        Self::new(CompilerConfig::default())
    }
}

impl RuleUnitCompiler {
    /// Creates a compiler using the built-in templates.
    #[must_use]
    pub fn new(config: CompilerConfig) -> Self {
        Self {
            config,
            templates: TemplateRegistry::builtin(),
        }
    }

    /// Builder method to replace the template registry.
    #[must_use]
    pub fn with_templates(mut self, templates: TemplateRegistry) -> Self {
        self.templates = templates;
        self
    }

    /// Returns the template registry.
    #[must_use]
    pub const fn templates(&self) -> &TemplateRegistry {
        &self.templates
    }

    /// Generates the unit and instance artifacts of a rule unit.
    ///
    /// Both artifacts share one freshly drawn token. Binding statements
    /// follow the declared variable order: a subscription for each data
    /// source, then a global registration for every variable.
    ///
    /// # Errors
    /// - `MissingTemplate` if either skeleton is absent from the registry
    /// - `MalformedTemplate` if a skeleton lacks the class-name slot or the
    ///   instance skeleton lacks `bind`
    /// - `MissingPlaceholder` if a skeleton uses a slot this compiler
    ///   does not fill
    pub fn compile_unit(
        &self,
        description: &RuleUnitDescription,
    ) -> Result<(UnitArtifact, Arc<UnitInstanceArtifact>)> {
        let token = self.config.tokens.next_token();
        let package = self.config.package_or(&description.package).to_string();
        let unit_name = ArtifactName::new(
            &package,
            format!("{}RuleUnit{token}", description.simple_name),
        );
        let instance_name = ArtifactName::new(
            &package,
            format!("{}RuleUnitInstance{token}", description.simple_name),
        );

        let located = |e: Error, artifact: &str| {
            e.with_context(
                ErrorContext::new()
                    .with_rule(&description.unit_type)
                    .with_artifact(artifact),
            )
        };

        let bind = bind_statements(description);

        let instance_class = self
            .templates
            .get(RULE_UNIT_INSTANCE_TEMPLATE)
            .and_then(Specializer::new)
            .and_then(|s| {
                s.fill(Placeholder::ClassName, &instance_name.simple)
                    .fill(Placeholder::RuleUnitClass, &description.simple_name)
                    .package(&package)
                    .replace_body(BIND_METHOD, bind.iter().map(BindStatement::to_stmt).collect())
            })
            .and_then(Specializer::finish)
            .map_err(|e| located(e, &instance_name.simple))?;

        let unit_class = self
            .templates
            .get(RULE_UNIT_TEMPLATE)
            .and_then(Specializer::new)
            .and_then(|s| {
                s.fill(Placeholder::ClassName, &unit_name.simple)
                    .fill(Placeholder::RuleUnitClass, &description.simple_name)
                    .fill(Placeholder::RuleUnitInstanceClass, &instance_name.simple)
                    .fill(Placeholder::RuleUnitModel, &description.model)
                    .package(&package)
                    .finish()
            })
            .map_err(|e| located(e, &unit_name.simple))?;

        debug!(
            unit = %unit_name.qualified,
            instance = %instance_name.qualified,
            statements = bind.len(),
            "rule unit compiled"
        );

        let instance = Arc::new(UnitInstanceArtifact {
            name: instance_name,
            class: instance_class,
            bind,
        });
        let unit = UnitArtifact {
            name: unit_name,
            unit_type: description.unit_type.clone(),
            class: unit_class,
            instance: Arc::clone(&instance),
        };
        Ok((unit, instance))
    }
}

fn bind_statements(description: &RuleUnitDescription) -> Vec<BindStatement> {
    let mut statements = Vec::new();
    for variable in &description.variables {
        if variable.data_source {
            statements.push(BindStatement::Subscribe {
                getter: variable.getter.clone(),
                entry_point: variable.name.clone(),
            });
        }
        statements.push(BindStatement::SetGlobal {
            name: variable.name.clone(),
            getter: variable.getter.clone(),
        });
    }
    statements
}
