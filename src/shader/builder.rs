//! Deduplicated DSL source builder, grounded on
//! `original_source/src/runtime/shader/ShaderBuilder.{h,cpp}`: sub-generators
//! (per-material BSDF bodies, technique ray-generation) accumulate into one
//! of these instead of raw string concatenation, so that includes pulled in
//! by many materials are only ever emitted once and nested helper functions
//! keep their own statement list instead of polluting the caller's.

use rustc_hash::FxHashSet;

/// Accumulates `includes`, named `functions`, and top-level `statements`
/// for one DSL source unit, then renders them with [`ShaderBuilder::build`].
///
/// Functions are kept in a `Vec` rather than a map so emission order matches
/// registration order, mirroring the stable iteration an original build
/// relied on for reproducible shader source.
#[derive(Debug, Clone, Default)]
pub struct ShaderBuilder {
    functions: Vec<(String, Box<ShaderBuilder>)>,
    statements: Vec<String>,
    includes: FxHashSet<String>,
}

impl ShaderBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A builder with no statements of its own is "root": nothing but
    /// includes/functions have been added to it yet.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.statements.is_empty()
    }

    /// Merges `other`'s includes, statements, and functions into `self`.
    /// Matches the original's TODO-flagged behavior of not checking for
    /// function name collisions on merge.
    pub fn merge(&mut self, other: &ShaderBuilder) -> &mut Self {
        self.includes.extend(other.includes.iter().cloned());
        self.statements.extend(other.statements.iter().cloned());
        for (name, body) in &other.functions {
            if let Some(slot) = self.functions.iter_mut().find(|(n, _)| n == name) {
                slot.1 = body.clone();
            } else {
                self.functions.push((name.clone(), body.clone()));
            }
        }
        self
    }

    /// Registers a named function body. Fails silently (matching the
    /// original, which logs and continues) if `def` is already registered.
    /// The body's own includes bubble up to this builder; its statements do
    /// not.
    pub fn add_function(&mut self, def: impl Into<String>, mut body: ShaderBuilder) -> &mut Self {
        let def = def.into();
        if self.functions.iter().any(|(n, _)| *n == def) {
            log::error!("ShaderBuilder: given function def '{def}' already exists");
            return self;
        }
        self.includes.extend(body.includes.drain());
        self.functions.push((def, Box::new(body)));
        self
    }

    pub fn add_statement(&mut self, statement: impl Into<String>) -> &mut Self {
        self.statements.push(statement.into());
        self
    }

    pub fn add_statements<I, S>(&mut self, statements: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.statements.extend(statements.into_iter().map(Into::into));
        self
    }

    pub fn add_include(&mut self, include: impl Into<String>) -> &mut Self {
        self.includes.insert(include.into());
        self
    }

    /// Renders this builder's includes (as `//#<include="...">` pragmas, in
    /// a deterministic order), nested function definitions, then top-level
    /// statements, matching the original's output shape.
    pub fn build(&self, out: &mut String) {
        let mut includes: Vec<&String> = self.includes.iter().collect();
        includes.sort();
        for inc in includes {
            out.push_str("//#<include=\"");
            out.push_str(inc);
            out.push_str("\"\n");
        }

        for (name, body) in &self.functions {
            out.push_str("fn @");
            out.push_str(name);
            out.push_str("{\n");
            body.build(out);
            out.push_str("}\n");
        }

        for statement in &self.statements {
            out.push_str(statement);
            out.push('\n');
        }
    }

    #[must_use]
    pub fn to_source(&self) -> String {
        let mut out = String::new();
        self.build(&mut out);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_builder_is_root() {
        assert!(ShaderBuilder::new().is_root());
    }

    #[test]
    fn adding_a_statement_leaves_root() {
        let mut b = ShaderBuilder::new();
        b.add_statement("let x = 1;");
        assert!(!b.is_root());
    }

    #[test]
    fn includes_are_deduplicated_across_merges() {
        let mut a = ShaderBuilder::new();
        a.add_include("math.art");
        let mut b = ShaderBuilder::new();
        b.add_include("math.art");
        b.add_include("color.art");
        a.merge(&b);
        assert_eq!(a.to_source().lines().filter(|l| l.contains("math.art")).count(), 1);
        assert!(a.to_source().contains("color.art"));
    }

    #[test]
    fn duplicate_function_def_is_rejected() {
        let mut b = ShaderBuilder::new();
        b.add_function("helper", ShaderBuilder::new());
        b.add_function("helper", ShaderBuilder::new());
        assert_eq!(b.functions.len(), 1);
    }

    #[test]
    fn function_includes_bubble_up_but_statements_stay_nested() {
        let mut body = ShaderBuilder::new();
        body.add_include("bsdf.art");
        body.add_statement("let y = 2;");

        let mut root = ShaderBuilder::new();
        root.add_function("mat_0", body);

        let src = root.to_source();
        assert!(src.contains("bsdf.art"));
        assert!(src.contains("fn @mat_0{"));
        assert!(src.contains("let y = 2;"));
    }
}
