//! Inheritance resolution - merges base chains into self-contained records

use std::collections::HashMap;

use super::record::{BaseRef, RawTemplate, TemplateError, TemplateKind, TemplateStore};

/// Resolves templates against a record store by walking their base chains.
///
/// Resolution is memoized per resolver instance: resolving the same name
/// twice returns the cached merge. The store itself is never mutated.
pub struct TemplateResolver<'a> {
    store: &'a TemplateStore,
    cache: HashMap<String, RawTemplate>,
}

impl<'a> TemplateResolver<'a> {
    pub fn new(store: &'a TemplateStore) -> Self {
        Self {
            store,
            cache: HashMap::new(),
        }
    }

    /// Resolve a template into its fully merged, base-free form.
    ///
    /// The result's `base` is always a primitive kind. Child fields overlay
    /// resolved-parent fields: scalar fields replace, `variables` merge
    /// key-wise, template lists (`operators`, `nodes`, `edges`) replace
    /// wholesale.
    pub fn resolve(&mut self, name: &str) -> Result<RawTemplate, TemplateError> {
        let mut stack = Vec::new();
        self.resolve_inner(name, &mut stack)
    }

    /// Resolve a template and require a specific primitive kind
    pub fn resolve_kind(
        &mut self,
        name: &str,
        expected: TemplateKind,
    ) -> Result<RawTemplate, TemplateError> {
        let resolved = self.resolve(name)?;
        match resolved.kind() {
            Some(kind) if kind == expected => Ok(resolved),
            Some(kind) => Err(TemplateError::KindMismatch {
                name: name.to_string(),
                expected,
                found: kind,
            }),
            // resolve() only returns base-free records
            None => unreachable!("resolved template must carry a primitive kind"),
        }
    }

    fn resolve_inner(
        &mut self,
        name: &str,
        stack: &mut Vec<String>,
    ) -> Result<RawTemplate, TemplateError> {
        if let Some(hit) = self.cache.get(name) {
            return Ok(hit.clone());
        }

        if stack.iter().any(|n| n == name) {
            let mut chain = stack.clone();
            chain.push(name.to_string());
            return Err(TemplateError::CyclicInheritance { chain });
        }

        let record = self
            .store
            .get(name)
            .ok_or_else(|| TemplateError::UnresolvedReference {
                name: name.to_string(),
            })?;

        let merged = match &record.base {
            // Chain terminates: the record's own fields are the definition
            BaseRef::Kind(_) => record.clone(),
            BaseRef::Template(parent) => {
                let parent = parent.clone();
                stack.push(name.to_string());
                let resolved_parent = self.resolve_inner(&parent, stack)?;
                stack.pop();
                overlay(resolved_parent, record)
            }
        };

        self.cache.insert(name.to_string(), merged.clone());
        Ok(merged)
    }
}

/// Overlay a child record onto its fully resolved parent.
///
/// Scalar/string fields in the child fully replace the parent's if present.
/// `variables` merge key-by-key, child keys overriding parent keys with no
/// key removal. Template-reference lists are replaced wholesale when the
/// child declares them, inherited verbatim otherwise.
fn overlay(parent: RawTemplate, child: &RawTemplate) -> RawTemplate {
    let mut variables = parent.variables;
    for (name, var) in &child.variables {
        variables.insert(name.clone(), var.clone());
    }

    RawTemplate {
        name: child.name.clone(),
        base: parent.base,
        description: child.description.clone().or(parent.description),
        unit: child.unit.clone().or(parent.unit),
        equations: child.equations.clone().or(parent.equations),
        variables,
        operators: child.operators.clone().or(parent.operators),
        nodes: child.nodes.clone().or(parent.nodes),
        edges: child.edges.clone().or(parent.edges),
    }
}
