//! Small synthesis helpers shared by the environment, interface and rewrite
//! stages: turning a `Type` back into a `TypeName`, building fresh
//! `ValidatedTypeInformation`/`Id` nodes, and providing a type-appropriate
//! placeholder value for a captured `var` whose environment slot exists
//! before its original initializer has run.

use crate::lexer::Span;
use crate::parser::ast::{AstString, Bool, Character, Expression, Id, Num};
use crate::typechecker::{types::Type, ValidatedTypeInformation};

/// Builds a fresh `ValidatedTypeInformation` of `type_id`, reusing the scope
/// context of `template` (an info value from a nearby, already-typed node)
/// since `Context` carries no information relevant to a synthesized node's
/// own identity.
pub fn info_of(type_id: Type, template: &ValidatedTypeInformation) -> ValidatedTypeInformation {
    ValidatedTypeInformation {
        type_id,
        context: template.context.clone(),
    }
}

pub fn id(name: impl Into<String>, info: ValidatedTypeInformation, position: Span) -> Id<ValidatedTypeInformation> {
    Id {
        name: name.into(),
        info,
        position,
    }
}

/// `TypeName` is purely syntactic (reused verbatim across every `T` stage),
/// so synthesized declarations need one even though their `info` already
/// carries the resolved `Type`. Interfaces are handled by the caller, which
/// substitutes the synthesized struct's own name for `Function`/`Closure`.
pub fn type_name_for(ty: &Type) -> crate::parser::ast::TypeName {
    use crate::parser::ast::TypeName;
    match ty {
        Type::Integer => TypeName::Literal("i64".into(), Span::default()),
        Type::FloatingPoint => TypeName::Literal("f64".into(), Span::default()),
        Type::Boolean => TypeName::Literal("bool".into(), Span::default()),
        Type::Character => TypeName::Literal("char".into(), Span::default()),
        Type::String => TypeName::Literal("string".into(), Span::default()),
        Type::Void => TypeName::Literal("void".into(), Span::default()),
        Type::Unknown => TypeName::Literal("void".into(), Span::default()),
        Type::Reference(inner) => TypeName::Reference(Box::new(type_name_for(inner)), Span::default()),
        Type::Array(inner) => TypeName::Array(Box::new(type_name_for(inner)), Span::default()),
        Type::Tuple(items) => TypeName::Tuple(items.iter().map(type_name_for).collect(), Span::default()),
        Type::Struct(name, _) => TypeName::Literal(name.clone(), Span::default()),
        Type::Function { params, return_value } => TypeName::Fn {
            params: params.iter().map(type_name_for).collect(),
            return_type: Box::new(type_name_for(return_value)),
            position: Span::default(),
        },
        Type::Closure { params, return_value, .. } => TypeName::Fn {
            params: params.iter().map(type_name_for).collect(),
            return_type: Box::new(type_name_for(return_value)),
            position: Span::default(),
        },
    }
}

/// A zero-equivalent value for `ty`, used to prefill a captured `var`'s
/// environment slot at construction time, before program order reaches the
/// original `let`. The slot is overwritten in place once the original
/// initializer runs.
pub fn default_value_for(
    ty: &Type,
    template: &ValidatedTypeInformation,
    position: Span,
) -> Expression<ValidatedTypeInformation> {
    let info = info_of(ty.clone(), template);
    match ty {
        Type::Integer => Expression::Num(Num::Integer(0, info, position)),
        Type::FloatingPoint => Expression::Num(Num::FloatingPoint(0.0, info, position)),
        Type::Boolean => Expression::Bool(Bool {
            value: false,
            info,
            position,
        }),
        Type::Character => Expression::Character(Character {
            character: '\0',
            info,
            position,
        }),
        Type::String => Expression::AstString(AstString {
            value: String::new(),
            info,
            position,
        }),
        Type::Reference(inner) => default_value_for(inner, template, position),
        Type::Array(_) => Expression::Array(crate::parser::ast::Array::Literal {
            values: vec![],
            info,
            position,
        }),
        Type::Struct(name, fields) => {
            let fields = fields
                .iter()
                .map(|(field_name, field_type)| crate::parser::ast::StructFieldInitialisation {
                    name: id(field_name.clone(), info_of(field_type.clone(), template), position.clone()),
                    value: default_value_for(field_type, template, position.clone()),
                    info: info_of(field_type.clone(), template),
                    position: position.clone(),
                })
                .collect();
            Expression::StructInitialisation(crate::parser::ast::StructInitialisation {
                id: id(name.clone(), info.clone(), position.clone()),
                fields,
                info,
                position,
            })
        }
        Type::Void | Type::Unknown | Type::Tuple(_) | Type::Function { .. } | Type::Closure { .. } => {
            unreachable!(
                "capturing a `var` of type {ty:?} before its first assignment is not supported: \
                 no literal syntax exists to default-initialize it"
            )
        }
    }
}
