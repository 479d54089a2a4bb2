//! Scope tree for lambda conversion: a live stack of lexical scopes, built and
//! torn down as the pass walks the AST rather than precomputed up front. Each
//! frame mirrors the `Scope` record of a closure-conversion compiler (one node
//! per function body, lambda, or loop), but is only ever observed while its
//! ancestors are still on the stack -- there is no persistent scope graph
//! outside of a single top-level item's traversal.

use std::collections::HashSet;

use crate::typechecker::types::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Function,
    Lambda,
    Loop,
}

/// A binding visible in a scope: a function/lambda parameter, `this`, or a
/// local `let`. `captured` is set once some descendant lambda reaches across
/// a scope boundary to read it; `member` is the field name it is given on its
/// owning scope's synthesized environment struct once that happens.
///
/// `captured` is decided up front, from a whole-subtree pre-scan (see
/// `contains_lambda::collect_capture_names`), rather than lazily as the walk
/// reaches the lambda that does the capturing: a read of this name earlier in
/// program order than the capturing lambda still needs to know, at the point
/// it is lowered, that it is about to be rewritten into a field access.
#[derive(Debug, Clone)]
pub struct Definition {
    pub name: String,
    pub type_id: Type,
    pub captured: bool,
}

/// An obligation that this scope's environment must also hold a direct
/// reference to an ancestor scope's environment, so a lambda nested several
/// levels deep can reach a faraway capture in a single field access instead
/// of walking the scope chain at every use.
#[derive(Debug, Clone)]
pub struct Copy {
    /// Stack depth (from the bottom) of the scope this copy ultimately refers to.
    pub target_depth: usize,
    pub member: String,
}

#[derive(Debug)]
pub struct Scope {
    pub kind: ScopeKind,
    pub definitions: Vec<Definition>,
    pub copies: Vec<Copy>,
    /// True only for the inner `Function` scope pushed for a lambda's own
    /// `run` body. Such a scope never gets its own `Copy` fields: it reaches
    /// ancestor captures through the paired `Lambda` scope directly below it
    /// (the struct `run` is a method of), not through a local `env` of its
    /// own the way an ordinary function or loop body would.
    pub is_lambda_body: bool,
    /// The depth of the nearest enclosing `Lambda` scope whose `run` body
    /// this scope lives inside, if any. Set directly on a lambda's own body
    /// scope and inherited by any `Loop`/`Function` scope nested within it,
    /// so a reference built from several loops deep inside a lambda still
    /// knows to reach outer captures via `this` rather than a nonexistent
    /// local `env`.
    pub owning_lambda: Option<usize>,
    /// Every name captured by a lambda anywhere in this scope's own subtree,
    /// computed once up front (see `contains_lambda::collect_capture_names`)
    /// before this scope's own statements are lowered. `define_local` reads
    /// this to decide a new local's `captured` flag immediately, rather than
    /// waiting for `propagate_capture` to set it once the capturing lambda is
    /// actually reached -- which would be too late for a read of that name
    /// earlier in program order.
    pub capture_names: HashSet<String>,
}

impl Scope {
    pub fn new(kind: ScopeKind) -> Self {
        Scope {
            kind,
            definitions: Vec::new(),
            copies: Vec::new(),
            is_lambda_body: false,
            owning_lambda: None,
            capture_names: HashSet::new(),
        }
    }

    pub fn define(&mut self, name: impl Into<String>, type_id: Type, captured: bool) {
        self.definitions.push(Definition {
            name: name.into(),
            type_id,
            captured,
        });
    }

    /// Defines a local whose `captured` status is decided by membership in
    /// this scope's own precomputed `capture_names` set.
    pub fn define_local(&mut self, name: impl Into<String>, type_id: Type) {
        let name = name.into();
        let captured = self.capture_names.contains(&name);
        self.define(name, type_id, captured);
    }

    pub fn definition(&self, name: &str) -> Option<&Definition> {
        self.definitions.iter().find(|d| d.name == name)
    }

    pub fn has_captured_definitions(&self) -> bool {
        self.definitions.iter().any(|d| d.captured)
    }

    /// Registers a copy pointing at `target_depth`, reusing an existing entry
    /// if one already targets that depth. Returns the field name to use.
    fn add_copy(&mut self, target_depth: usize) -> String {
        if let Some(copy) = self.copies.iter().find(|c| c.target_depth == target_depth) {
            return copy.member.clone();
        }
        let member = format!("parent_{target_depth}");
        self.copies.push(Copy {
            target_depth,
            member: member.clone(),
        });
        member
    }
}

/// The live stack of enclosing scopes at the current point of the traversal.
#[derive(Debug, Default)]
pub struct ScopeStack {
    frames: Vec<Scope>,
}

impl ScopeStack {
    pub fn push(&mut self, kind: ScopeKind) {
        self.frames.push(Scope::new(kind));
    }

    pub fn pop(&mut self) -> Scope {
        self.frames.pop().expect("popped an empty scope stack")
    }

    pub fn top(&mut self) -> &mut Scope {
        self.frames.last_mut().expect("empty scope stack")
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    fn get(&self, depth: usize) -> &Scope {
        &self.frames[depth]
    }

    fn get_mut(&mut self, depth: usize) -> &mut Scope {
        &mut self.frames[depth]
    }

    pub fn kind_at(&self, depth: usize) -> ScopeKind {
        self.get(depth).kind
    }

    pub fn owning_lambda_at(&self, depth: usize) -> Option<usize> {
        self.get(depth).owning_lambda
    }

    pub fn is_captured_at(&self, depth: usize, name: &str) -> bool {
        self.get(depth).definition(name).is_some_and(|d| d.captured)
    }

    /// Finds the nearest enclosing scope (searching from `from_depth` upward,
    /// inclusive) that defines `name`, returning its depth.
    pub fn resolve(&self, from_depth: usize, name: &str) -> Option<usize> {
        (0..=from_depth)
            .rev()
            .find(|&depth| self.get(depth).definition(name).is_some())
    }

    /// Marks `name` captured at its defining scope (searched from
    /// `search_from` upward) and threads a flattened `Copy` obligation,
    /// pointing directly at the defining scope, through every frame from
    /// `using_depth` up to (but excluding) the defining scope.
    ///
    /// Returns `None` if `name` is not defined in any visible ancestor (it
    /// belongs to a scope that already unwound, which `get_lambda_captures`
    /// should never produce) or if it resolves to `using_depth` itself (not
    /// actually a cross-scope capture).
    pub fn propagate_capture(
        &mut self,
        using_depth: usize,
        search_from: usize,
        name: &str,
    ) -> Option<(usize, String)> {
        let defining_depth = self.resolve(search_from, name)?;
        if defining_depth == using_depth {
            return None;
        }

        let def_type = self.get(defining_depth).definition(name).unwrap().type_id.clone();
        if let Some(def) = self
            .get_mut(defining_depth)
            .definitions
            .iter_mut()
            .find(|d| d.name == name)
        {
            def.captured = true;
        }

        // A lambda's own body scope never carries its own `Copy` fields: it
        // reaches ancestor captures through the paired `Lambda` scope one
        // level below it (see `Scope::is_lambda_body`), so the chain just
        // passes through without registering anything here.
        let mut depth = using_depth;
        let mut member = String::new();
        while depth != defining_depth {
            if !self.get(depth).is_lambda_body {
                member = self.get_mut(depth).add_copy(defining_depth);
            }
            depth = depth.checked_sub(1).expect("capture escaped the scope stack");
        }
        let _ = def_type;
        Some((defining_depth, member))
    }

    /// The field name on the scope at `from_depth`'s own environment that
    /// was registered to reach `target_depth`, if any. Used at
    /// environment-construction time, once a copy obligation threaded by
    /// `propagate_capture` needs to be turned into an actual field access.
    pub fn copy_member_at(&self, from_depth: usize, target_depth: usize) -> Option<String> {
        self.get(from_depth)
            .copies
            .iter()
            .find(|c| c.target_depth == target_depth)
            .map(|c| c.member.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stack_of(kinds: &[ScopeKind]) -> ScopeStack {
        let mut stack = ScopeStack::default();
        for kind in kinds {
            stack.push(*kind);
        }
        stack
    }

    #[test]
    fn resolve_finds_nearest_shadowing_definition() {
        let mut stack = stack_of(&[ScopeKind::Function, ScopeKind::Function]);
        stack.top().define("x", Type::Integer, false);
        let outer_depth = stack.depth() - 1;

        stack.push(ScopeKind::Lambda);
        stack.top().define("x", Type::Boolean, false);
        let shadow_depth = stack.depth() - 1;

        let found = stack.resolve(shadow_depth, "x").unwrap();
        assert_eq!(found, shadow_depth);
        assert_ne!(found, outer_depth);
    }

    #[test]
    fn propagate_capture_is_noop_for_same_scope_use() {
        let mut stack = stack_of(&[ScopeKind::Function]);
        stack.top().define("x", Type::Integer, false);
        let using_depth = stack.depth() - 1;
        assert!(stack.propagate_capture(using_depth, using_depth, "x").is_none());
    }

    #[test]
    fn propagate_capture_threads_a_flattened_copy_through_every_intermediate_scope() {
        // fn outer { let x = 1; fn middle { fn inner { \() => x } } }
        let mut stack = stack_of(&[ScopeKind::Function]);
        stack.top().define("x", Type::Integer, false);
        let outer_depth = stack.depth() - 1;

        stack.push(ScopeKind::Function);
        let middle_depth = stack.depth() - 1;

        stack.push(ScopeKind::Lambda);
        let lambda_depth = stack.depth() - 1;

        let (defining_depth, member) = stack.propagate_capture(lambda_depth, lambda_depth, "x").unwrap();
        assert_eq!(defining_depth, outer_depth);

        // the lambda's own copy is a direct reference to the defining scope, not a
        // one-hop reference to its immediate parent
        assert_eq!(stack.copy_member_at(lambda_depth, outer_depth).as_deref(), Some(member.as_str()));
        // the intermediate `middle` frame also got its own direct copy, so a
        // deeper capture never needs more than one hop to resolve at construction time
        assert!(stack.copy_member_at(middle_depth, outer_depth).is_some());
        assert!(stack.get(outer_depth).has_captured_definitions());
    }

    #[test]
    fn lambda_body_frame_is_skipped_when_threading_a_copy() {
        // fn outer { let x = 1; let f = \() => { let g = \() => x; }; }
        let mut stack = stack_of(&[ScopeKind::Function]);
        stack.top().define("x", Type::Integer, false);
        let outer_depth = stack.depth() - 1;

        stack.push(ScopeKind::Lambda);
        let f_lambda_depth = stack.depth() - 1;
        stack.push(ScopeKind::Function);
        stack.top().is_lambda_body = true;
        stack.top().owning_lambda = Some(f_lambda_depth);
        let f_body_depth = stack.depth() - 1;

        stack.push(ScopeKind::Lambda);
        let g_lambda_depth = stack.depth() - 1;

        stack.propagate_capture(g_lambda_depth, g_lambda_depth, "x").unwrap();

        assert!(stack.copy_member_at(g_lambda_depth, outer_depth).is_some());
        assert!(stack.copy_member_at(f_lambda_depth, outer_depth).is_some());
        assert!(
            stack.copy_member_at(f_body_depth, outer_depth).is_none(),
            "a lambda's own body scope should never carry its own copy field"
        );
    }

    #[test]
    fn repeated_copies_to_the_same_target_reuse_one_field() {
        let mut scope = Scope::new(ScopeKind::Lambda);
        let a = scope.add_copy(2);
        let b = scope.add_copy(2);
        assert_eq!(a, b);
        assert_eq!(scope.copies.len(), 1);
    }
}
