//! deadstrip - selective dead-declaration elimination for C++ translation units
//!
//! Given the parsed declaration tree of one translation unit and an oracle of
//! which declarations are semantically reachable, this library decides,
//! declaration by declaration, what must be excised from the source text and
//! computes the byte-exact range(s) to remove.
//!
//! # Architecture
//!
//! One elimination pass with four cooperating parts:
//! 1. **Traversal** - a single depth-first pre-order walk confined to the
//!    main file, with a post-order fix-up for namespace blocks
//! 2. **Classification** - one removal rule per declaration kind, keyed on
//!    canonical identity and the used-declaration oracle
//! 3. **Bookkeeping** - redeclaration and namespace-liveness tables that grow
//!    monotonically over the walk
//! 4. **Range resolution** - declaration ranges extended over trailing
//!    terminators, with attached comments as separate disjoint requests
//!
//! Parsing and reachability analysis are external: the tree is supplied
//! through [`AstBuilder`], the oracle through [`UsedDeclarations`]. Removal
//! requests are consolidated and applied by [`SmartRewriter`]. A companion
//! event-driven pass, [`PreprocessorPass`], removes inactive preprocessor
//! branches and unused macro definitions.

pub mod ast;
pub mod config;
pub mod optimizer;
pub mod preprocessor;
pub mod ranges;
pub mod rewriter;
pub mod usage;

pub use ast::{Ast, AstBuilder, CanonId, DeclKind, DeclNode, NodeId, Span, SpecializationKind};
pub use config::Config;
pub use optimizer::{Optimizer, PassState, RemovalPlan};
pub use preprocessor::{ConditionValue, PreprocessorPass};
pub use rewriter::{rewrite_file, RewriteError, SmartRewriter};
pub use usage::UsedDeclarations;
