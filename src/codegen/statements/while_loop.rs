//! # While Loop Code Generation
//!
//! This module implements LLVM code generation for while loop statements in Y-lang.
//! It creates control flow structures using LLVM basic blocks to implement
//! condition-controlled iteration with proper scope management.
//!
//! ## While Loop Semantics
//!
//! Y-lang while loops follow standard imperative programming semantics:
//! ```y-lang
//! while (condition) {
//!     // loop body
//! }
//! ```
//!
//! ## LLVM Control Flow Implementation
//!
//! ### Basic Block Structure
//! While loops are implemented using a three-block structure:
//! - **Condition Block**: Evaluates the loop condition
//! - **Body Block**: Executes the loop body when condition is true
//! - **After Block**: Continues execution when condition is false
//!
//! ### Control Flow Pattern
//! The generated control flow follows this pattern:
//! ```llvm
//! entry:
//!   br label %while.condition
//!
//! while.condition:
//!   %cond = ...condition evaluation...
//!   br i1 %cond, label %while.body, label %while.end
//!
//! while.body:
//!   ...loop body...
//!   br label %while.condition
//!
//! while.end:
//!   ...code after loop...
//! ```
//!
//! ## Condition Evaluation Strategy
//!
//! ### Boolean Value Handling
//! Loop conditions must produce boolean values:
//! - **Type requirement**: Condition expressions must yield boolean results
//! - **LLVM representation**: Booleans are represented as i1 values
//! - **Conditional branching**: Uses LLVM conditional branch instructions
//!
//! ### Short-circuit Evaluation
//! Condition evaluation occurs at the start of each iteration:
//! - **Fresh evaluation**: Condition is re-evaluated for each loop iteration
//! - **Variable access**: Condition can access variables modified in loop body
//! - **Dynamic termination**: Loop can terminate based on runtime state changes
//!
//! ## Scope Management
//!
//! ### Loop Body Scope Isolation
//! Each loop iteration has isolated scope management:
//! - **Scope creation**: New scope created when entering loop body
//! - **Variable isolation**: Loop body variables don't leak to outer scope
//! - **Automatic cleanup**: Scope cleaned up at end of each iteration
//! - **Nested scoping**: Supports nested loops and control structures
//!
//! ### Variable Lifetime
//! Loop variables follow specific lifetime rules:
//! - **Condition variables**: Accessible throughout loop execution
//! - **Body variables**: Scoped to individual loop iterations
//! - **Outer variables**: Accessible and modifiable within loop body
//!
//! ## Terminator Management
//!
//! ### Loop Continuation
//! The implementation handles various loop termination scenarios:
//! - **Normal iteration**: Unconditional branch back to condition
//! - **Early termination**: Return statements or breaks (if supported)
//! - **Unreachable code**: Proper handling of dead code after returns
//!
//! ### Basic Block Terminators
//! Every basic block must have a proper terminator:
//! - **Conditional branch**: From condition block to body or after block
//! - **Unconditional branch**: From entry to condition, body back to condition
//! - **Return handling**: Early returns in loop body are preserved
//!
//! ## Memory and Performance Considerations
//!
//! ### LLVM Optimization Opportunities
//! The basic block structure enables various LLVM optimizations:
//! - **Loop invariant code motion**: Move unchanging computations outside loop
//! - **Loop unrolling**: Replicate loop body for better performance
//! - **Dead code elimination**: Remove unreachable code in loop constructs
//! - **Induction variable optimization**: Optimize loop counter patterns
//!
//! ### Scope Efficiency
//! Scope management is designed for efficiency:
//! - **Minimal overhead**: Scope operations have low runtime cost
//! - **Stack allocation**: Loop variables use fast stack allocation
//! - **Automatic cleanup**: No manual memory management required
//!
//! ## Error Handling and Safety
//!
//! ### Type Safety
//! The implementation ensures type safety throughout:
//! - **Condition types**: Enforces boolean condition requirements
//! - **Variable access**: Maintains type information across iterations
//! - **Memory safety**: Prevents access to cleaned-up variables
//!
//! ### Infinite Loop Handling
//! The system handles infinite loops gracefully:
//! - **Valid construct**: Infinite loops are semantically valid
//! - **Resource management**: Proper scope cleanup even in infinite loops
//! - **Optimization compatibility**: LLVM can optimize infinite loop patterns

use crate::{codegen::CodeGen, parser::ast::WhileLoop, typechecker::ValidatedTypeInformation};

impl<'ctx> CodeGen<'ctx> for WhileLoop<ValidatedTypeInformation> {
    type ReturnValue = ();

    /// Generates LLVM IR for while loop statements.
    ///
    /// This function creates the complete control flow structure for while loops,
    /// including condition evaluation, loop body execution, and proper termination
    /// handling. It implements the standard while loop semantics using LLVM's
    /// basic block system.
    ///
    /// ## Implementation Strategy
    ///
    /// The while loop compilation follows a structured approach:
    /// 1. **Basic block creation**: Create condition, body, and after-loop blocks
    /// 2. **Entry branch**: Branch from current location to condition block
    /// 3. **Condition evaluation**: Generate condition check in condition block
    /// 4. **Conditional branching**: Branch to body or after-loop based on condition
    /// 5. **Body compilation**: Generate loop body with isolated scope
    /// 6. **Loop continuation**: Branch back to condition for next iteration
    /// 7. **Exit positioning**: Position builder for post-loop code
    ///
    /// ## Basic Block Architecture
    ///
    /// ### Three-Block Structure
    /// The while loop uses three distinct basic blocks:
    ///
    /// #### Condition Block (`while.condition`)
    /// - **Purpose**: Evaluates the loop condition expression
    /// - **Entry**: Entered from previous code and loop body
    /// - **Operation**: Generates condition evaluation code
    /// - **Exit**: Conditional branch to body or after-loop
    ///
    /// #### Body Block (`while.body`)
    /// - **Purpose**: Executes loop body when condition is true
    /// - **Entry**: Entered when condition evaluates to true
    /// - **Operation**: Executes loop body with isolated scope
    /// - **Exit**: Unconditional branch back to condition
    ///
    /// #### After-Loop Block (`while.end`)
    /// - **Purpose**: Continues execution after loop termination
    /// - **Entry**: Entered when condition evaluates to false
    /// - **Operation**: Serves as continuation point for subsequent code
    /// - **Exit**: Builder positioned here for post-loop code generation
    ///
    /// ## Control Flow Implementation
    ///
    /// ### Condition Evaluation
    /// Loop conditions are evaluated with specific requirements:
    /// - **Value production**: Condition expressions must produce LLVM values
    /// - **Boolean conversion**: Values are converted to i1 (boolean) type
    /// - **Fresh evaluation**: Condition re-evaluated on each iteration
    /// - **Variable access**: Can access variables modified in loop body
    ///
    /// ### Branching Strategy
    /// The implementation uses LLVM's conditional branching:
    /// - **True branch**: Jumps to loop body when condition is true
    /// - **False branch**: Jumps to after-loop when condition is false
    /// - **Unconditional return**: Body always returns to condition check
    ///
    /// ## Scope Management System
    ///
    /// ### Loop Body Isolation
    /// Each loop iteration maintains scope isolation:
    /// - **Scope creation**: New scope created when entering loop body
    /// - **Variable containment**: Loop body variables don't escape
    /// - **Automatic cleanup**: Scope automatically cleaned up each iteration
    /// - **Nesting support**: Supports nested loops and other control structures
    ///
    /// ### Variable Accessibility
    /// Variables have different accessibility within the loop:
    /// - **Outer variables**: Accessible and modifiable within loop
    /// - **Condition variables**: Available throughout loop execution
    /// - **Body variables**: Scoped to individual iterations
    ///
    /// ## Terminator Management
    ///
    /// ### Normal Loop Flow
    /// Standard loop iterations follow predictable terminator patterns:
    /// - **Entry to condition**: Unconditional branch to start condition check
    /// - **Condition branching**: Conditional branch based on evaluation result
    /// - **Body to condition**: Unconditional branch back for next iteration
    ///
    /// ### Early Termination Handling
    /// The function handles various early termination scenarios:
    /// - **Return statements**: Loop body may contain early returns
    /// - **Terminator checking**: Verifies basic block termination status
    /// - **Dead code prevention**: Avoids adding branches after terminators
    ///
    /// ## LLVM Integration Details
    ///
    /// ### Function Context
    /// Loop blocks are added to the current function:
    /// - **Function retrieval**: Gets parent function from current basic block
    /// - **Block naming**: Uses descriptive names for debugging clarity
    /// - **Block ordering**: Maintains logical ordering for readability
    ///
    /// ### Builder Management
    /// The LLVM builder is carefully managed throughout:
    /// - **Position tracking**: Builder positioned at appropriate blocks
    /// - **Instruction generation**: Instructions added to correct blocks
    /// - **Terminator verification**: Ensures all blocks are properly terminated
    ///
    /// # Returns
    ///
    /// `()` - While loop generation is a statement-level operation
    ///
    /// # Panics
    ///
    /// - **Missing condition value**: When condition expression doesn't produce a value
    /// - **Function context failure**: When current basic block has no parent function
    /// - **Branch instruction failure**: When LLVM branch instruction creation fails
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// // Y-lang while loop:
    /// while (x < 10) {
    ///     x = x + 1;
    /// }
    ///
    /// // Generated LLVM IR:
    /// br label %while.condition
    ///
    /// while.condition:
    ///   %cond = icmp slt i32 %x, 10
    ///   br i1 %cond, label %while.body, label %while.end
    ///
    /// while.body:
    ///   %new_x = add i32 %x, 1
    ///   store i32 %new_x, ptr %x_ptr
    ///   br label %while.condition
    ///
    /// while.end:
    ///   ; continue with code after loop
    /// ```
    fn codegen(&self, ctx: &crate::codegen::CodegenContext<'ctx>) -> Self::ReturnValue {
        // Step 1: Create the three basic blocks needed for while loop control flow
        // Get the parent function to add new basic blocks
        let current_function = ctx
            .builder
            .get_insert_block()
            .unwrap()
            .get_parent()
            .unwrap();

        // Create condition evaluation block
        let condition_block = ctx
            .context
            .append_basic_block(current_function, "while.condition");

        // Create loop body execution block
        let loop_body_block = ctx
            .context
            .append_basic_block(current_function, "while.body");

        // Create post-loop continuation block
        let after_loop_block = ctx
            .context
            .append_basic_block(current_function, "while.end");

        // Step 2: Branch from current location to condition block
        // This begins the while loop execution
        ctx.builder
            .build_unconditional_branch(condition_block)
            .unwrap();

        // Step 3: Build the condition evaluation block
        ctx.builder.position_at_end(condition_block);

        // Generate code for condition expression
        let Some(condition_value) = self.condition.codegen(ctx) else {
            unreachable!("While loop condition must produce a value")
        };

        // Convert condition result to boolean (i1) for branching
        let condition_value = condition_value.into_int_value();

        // Step 4: Create conditional branch based on condition result
        // Branch to body if true, to after-loop if false
        ctx.builder
            .build_conditional_branch(condition_value, loop_body_block, after_loop_block)
            .unwrap();

        // Step 5: Build the loop body block with isolated scope
        ctx.builder.position_at_end(loop_body_block);

        // Create isolated scope for loop body variables
        ctx.enter_scope();

        // Generate code for loop body
        self.block.codegen(ctx);

        // Clean up loop body scope
        ctx.exit_scope();

        // Step 6: Handle loop continuation
        // Only add branch back to condition if block doesn't already have a terminator
        // (e.g., from return statements in loop body)
        if ctx
            .builder
            .get_insert_block()
            .unwrap()
            .get_terminator()
            .is_none()
        {
            ctx.builder
                .build_unconditional_branch(condition_block)
                .unwrap();
        }

        // Step 7: Position builder at after-loop block for subsequent code generation
        ctx.builder.position_at_end(after_loop_block);
    }
}
