//! Turns configuration into a populated class catalog and registry.

use crate::config::{AppConfig, ClassKindSetting, ClassSettings, RuleAction, RuleSettings};
use anyhow::{anyhow, Context, Result};
use redirection_system::{
    create_redirection_registry, parse_method_descriptor, ClassCatalog, ClassInfo, ConstantRedirection,
    DefaultValueRedirection, DeferRedirection, ObjectRedirection, Redirection, RedirectionRegistry,
};
use std::sync::Arc;
use tracing::{debug, info};

/// State of instances constructed for configured classes.
#[derive(Debug, Default)]
pub struct ConfiguredObject;

/// Builds the catalog in declaration order so that `extends` can refer to
/// interfaces declared earlier.
pub fn build_catalog(classes: &[ClassSettings]) -> Result<Arc<ClassCatalog>> {
    let catalog = Arc::new(ClassCatalog::new());

    for class in classes {
        let mut builder = match class.kind {
            ClassKindSetting::Interface => ClassInfo::interface(class.name.as_str()),
            ClassKindSetting::Abstract => ClassInfo::abstract_class(class.name.as_str()),
            ClassKindSetting::Concrete => ClassInfo::concrete(class.name.as_str()),
        };

        for method in &class.methods {
            let shape = parse_method_descriptor(&class.method_descriptor(method), &catalog)
                .ok_or_else(|| anyhow!("Invalid method {method} on class {}", class.name))?;
            builder = builder.method(shape.name, shape.params, shape.ret);
        }

        for parent in &class.extends {
            let parent = catalog
                .get(parent)
                .filter(|info| info.is_interface())
                .ok_or_else(|| anyhow!("Class {} extends unknown interface {parent}", class.name))?;
            builder = builder.extends(parent);
        }

        if class.constructible {
            builder = builder.default_constructor::<ConfiguredObject>();
        }

        let info = builder.build();
        debug!(class = %class.name, methods = info.methods().len(), "Declared class");
        catalog.register(info);
    }

    Ok(catalog)
}

/// Creates the handler a rule installs.
pub fn handler_for(rule: &RuleSettings, registry: &Arc<RedirectionRegistry>) -> Result<Arc<dyn Redirection>> {
    let handler: Arc<dyn Redirection> = match rule.action {
        RuleAction::Constant => {
            let value = rule
                .value
                .as_ref()
                .with_context(|| format!("Constant redirection needs a value: {}", rule.descriptor))?;
            Arc::new(ConstantRedirection::new(value.to_value()))
        }
        RuleAction::Null => Arc::new(ConstantRedirection::null()),
        RuleAction::Default => Arc::new(DefaultValueRedirection),
        RuleAction::Synthesize => Arc::new(ObjectRedirection::new(registry)),
        RuleAction::Defer => Arc::new(DeferRedirection),
    };
    Ok(handler)
}

/// Builds a registry holding every class and redirection in `config`.
pub fn build_registry(config: &AppConfig) -> Result<Arc<RedirectionRegistry>> {
    let catalog = build_catalog(&config.classes).context("Failed to declare classes")?;
    let registry = create_redirection_registry(catalog);

    for rule in &config.redirections {
        let handler = handler_for(rule, &registry)?;
        if registry.register(rule.descriptor.as_str(), handler).is_some() {
            info!(descriptor = %rule.descriptor, "Redirection declared twice, keeping the later one");
        }
    }

    info!(
        "Installed {} redirections over {} classes",
        registry.len(),
        registry.catalog().len()
    );
    Ok(registry)
}
