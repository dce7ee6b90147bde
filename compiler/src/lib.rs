// ffc — Func Factory Compiler
//
// Library root. A procedure graph is resolved into a `GraphContext`, then
// rendered to TypeScript by `codegen::generate`.

pub mod catalog;
pub mod codegen;
pub mod context;
pub mod diag;
pub mod dot;
pub mod graph;
pub mod id;
pub mod pipeline;
pub mod template;

pub use codegen::{generate, Flavor};
pub use context::{construct_context, GraphContext};
