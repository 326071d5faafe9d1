// Copyright (c) Asymptotic
// SPDX-License-Identifier: Apache-2.0

//! Generation entry points

use crate::code_line::render_text;
use crate::renderer::ProcedureRenderer;
use anyhow::Result;
use flow_model::FlowGraph;
use flow_structuring::{structure_procedure, ExpressionTranslator, StepEmitter};
use log::warn;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Rendering options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorOptions {
    /// Indent unit prepended once per nesting depth.
    pub indent_unit: String,
    /// Starting indent depth for all rendered routines.
    pub base_indent: usize,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            indent_unit: "\t".to_string(),
            base_indent: 0,
        }
    }
}

/// Structure and render one procedure with default options: tab indentation
/// starting at depth zero. The primary routine comes first, extracted merge
/// routines follow in reverse discovery order.
pub fn generate_procedure(
    graph: &FlowGraph,
    emitter: &dyn StepEmitter,
    translator: &dyn ExpressionTranslator,
) -> Result<String> {
    generate_procedure_with(graph, emitter, translator, &GeneratorOptions::default())
}

/// Structure and render one procedure.
pub fn generate_procedure_with(
    graph: &FlowGraph,
    emitter: &dyn StepEmitter,
    translator: &dyn ExpressionTranslator,
    options: &GeneratorOptions,
) -> Result<String> {
    let procedure = structure_procedure(graph, emitter, translator)?;
    let lines = ProcedureRenderer::new(&procedure).render(options.base_indent);
    Ok(render_text(&lines, &options.indent_unit))
}

/// Outcome of one procedure in a batch run.
#[derive(Debug)]
pub struct GeneratedProcedure {
    pub name: String,
    pub result: Result<String>,
}

/// Structure and render many procedures, fanning out per procedure. No
/// mutable state crosses procedure boundaries, so this is safely parallel.
/// A failing procedure is reported individually and does not abort the rest
/// of the batch; nothing is retried.
pub fn generate_all<E, T>(
    graphs: &[FlowGraph],
    emitter: &E,
    translator: &T,
    options: &GeneratorOptions,
) -> Vec<GeneratedProcedure>
where
    E: StepEmitter + Sync,
    T: ExpressionTranslator + Sync,
{
    graphs
        .par_iter()
        .map(|graph| {
            let result = generate_procedure_with(graph, emitter, translator, options);
            if let Err(error) = &result {
                warn!("failed to generate procedure {}: {error:#}", graph.name());
            }
            GeneratedProcedure {
                name: graph.name().to_string(),
                result,
            }
        })
        .collect()
}
