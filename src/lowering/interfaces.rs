//! Synthesizes the nominal interface types that converted lambdas dispatch
//! through: a zero-field marker struct plus an `Instance` block declaring an
//! abstract `run` method, one per distinct call signature.
//!
//! The source material keys these abstractly as `Fn<R, A1..An>` /
//! `FnVoid<A1..An>`, instantiated through generic substitution. This
//! language has no generics, so there is nothing to substitute into: two
//! lambdas only ever share an interface if their parameter and return types
//! are literally identical. The registry is keyed on the full concrete
//! signature rather than on `(arity, has_return)`, and a new struct is
//! synthesized the first time a signature is seen.

use std::collections::HashMap;

use crate::parser::ast::{Instance, MethodDeclaration, StructDeclaration, TopLevelStatement};
use crate::typechecker::{types::Type, ValidatedTypeInformation};

use super::support::{id, info_of, type_name_for};

type Signature = (Vec<Type>, Option<Type>);

#[derive(Default)]
pub struct InterfaceRegistry {
    by_signature: HashMap<Signature, String>,
    next_suffix: HashMap<(usize, bool), usize>,
    pub statements: Vec<TopLevelStatement<ValidatedTypeInformation>>,
}

impl InterfaceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the struct name implementing `run` for this signature,
    /// synthesizing the interface on first sight of that exact signature.
    pub fn get_or_create(
        &mut self,
        params: &[Type],
        return_value: Option<&Type>,
        template: &ValidatedTypeInformation,
    ) -> String {
        let key = (params.to_vec(), return_value.cloned());
        if let Some(name) = self.by_signature.get(&key) {
            return name.clone();
        }

        let arity = params.len();
        let has_return = return_value.is_some();
        let base = if has_return {
            format!("Fn{arity}")
        } else {
            format!("FnVoid{arity}")
        };
        let slot = self.next_suffix.entry((arity, has_return)).or_insert(0);
        let name = if *slot == 0 { base } else { format!("{base}_{slot}") };
        *slot += 1;

        self.by_signature.insert(key, name.clone());
        self.emit(&name, params, return_value, template);
        name
    }

    fn emit(
        &mut self,
        name: &str,
        params: &[Type],
        return_value: Option<&Type>,
        template: &ValidatedTypeInformation,
    ) {
        let span = crate::lexer::Span::default();
        let void_info = info_of(Type::Void, template);

        let struct_decl = StructDeclaration {
            id: id(name, void_info.clone(), span.clone()),
            fields: vec![],
            info: void_info.clone(),
            position: span.clone(),
        };

        let return_type = return_value.cloned().unwrap_or(Type::Void);
        let run_info = info_of(
            Type::Function {
                params: params.to_vec(),
                return_value: Box::new(return_type.clone()),
            },
            template,
        );
        let run = MethodDeclaration {
            id: id("run", run_info, span.clone()),
            parameter_types: params.iter().map(type_name_for).collect(),
            return_type: type_name_for(&return_type),
            info: void_info.clone(),
            position: span.clone(),
        };

        let instance = Instance {
            name: crate::parser::ast::TypeName::Literal(name.to_string(), span.clone()),
            functions: vec![],
            declarations: vec![run],
            info: void_info,
            position: span,
        };

        self.statements.push(TopLevelStatement::StructDeclaration(struct_decl));
        self.statements.push(TopLevelStatement::Instance(instance));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ast::TopLevelStatement;
    use crate::typechecker::TypeChecker;

    /// A real validated `main` function's info, just to have a legitimate
    /// `ValidatedTypeInformation` to hand the registry; its contents are
    /// never inspected by `InterfaceRegistry`.
    fn template() -> ValidatedTypeInformation {
        let source = "fn main(): void {}";
        let program = crate::grammar::parse(source).unwrap();
        let statements = crate::parser::parse_program(program, source);
        let checked = TypeChecker::new(statements).check().unwrap();
        let validated = TypeChecker::validate(checked).unwrap();
        match &validated[0] {
            TopLevelStatement::Function(function) => function.info.clone(),
            _ => unreachable!("main always parses to a Function"),
        }
    }

    #[test]
    fn identical_signatures_reuse_the_same_interface() {
        let mut registry = InterfaceRegistry::new();
        let template = template();

        let params = vec![Type::Integer];
        let first = registry.get_or_create(&params, Some(&Type::Boolean), &template);
        let second = registry.get_or_create(&params, Some(&Type::Boolean), &template);
        assert_eq!(first, second);
        assert_eq!(registry.statements.len(), 2);
    }

    #[test]
    fn distinct_signatures_with_equal_arity_get_distinct_names() {
        let mut registry = InterfaceRegistry::new();
        let template = template();

        let int_to_bool = registry.get_or_create(&[Type::Integer], Some(&Type::Boolean), &template);
        let float_to_bool = registry.get_or_create(&[Type::FloatingPoint], Some(&Type::Boolean), &template);
        assert_ne!(int_to_bool, float_to_bool);
        assert_eq!(registry.statements.len(), 4);
    }

    #[test]
    fn void_returning_signature_uses_the_fn_void_family() {
        let mut registry = InterfaceRegistry::new();
        let template = template();

        let name = registry.get_or_create(&[Type::Integer], None, &template);
        assert!(name.starts_with("FnVoid1"));
    }
}
