//! Lambda-to-object conversion: rewrites every lambda expression into the
//! construction of a plain struct (its captured environment) plus a
//! top-level struct/instance pair implementing a synthesized call
//! interface, and rewrites call sites accordingly. Runs ahead of the
//! other optimizer passes, since both `ConstantInlining` and
//! `ConstantFolding` are written against ordinary function calls and
//! struct literals, not `Lambda`/`Closure` nodes.

mod contains_lambda;
mod convert;
mod interfaces;
mod scope;
mod support;

use crate::optimizer::OptimizerPass;
use crate::typechecker::ValidatedTypeInformation;
use crate::Ast;

pub use convert::Lowerer;

pub struct LambdaConversion;

impl OptimizerPass for LambdaConversion {
    fn run(&self, ast: Ast<ValidatedTypeInformation>) -> Ast<ValidatedTypeInformation> {
        Lowerer::new().lower_program(ast)
    }
}
