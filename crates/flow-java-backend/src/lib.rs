// Copyright (c) Asymptotic
// SPDX-License-Identifier: Apache-2.0

//! Java rendering backend
//!
//! Flattens a structured procedure's code block tree into indented text
//! lines and provides the batch generation entry points. No decision logic
//! lives here: indentation is purely structural depth.

mod code_line;
mod generator;
mod renderer;

pub use code_line::{render_text, CodeLine};
pub use generator::{
    generate_all, generate_procedure, generate_procedure_with, GeneratedProcedure,
    GeneratorOptions,
};
pub use renderer::ProcedureRenderer;
