// Copyright (c) Asymptotic
// SPDX-License-Identifier: Apache-2.0

//! Renders a structured procedure to indented code lines

use crate::code_line::CodeLine;
use flow_structuring::{merge_routine_name, BlockId, BlockItem, Routine, StructuredProcedure};
use itertools::Itertools;

/// Pure function of the block tree: member declarations first, then the
/// primary routine, then the extracted routines, blank-line separated.
pub struct ProcedureRenderer<'a> {
    procedure: &'a StructuredProcedure,
}

impl<'a> ProcedureRenderer<'a> {
    pub fn new(procedure: &'a StructuredProcedure) -> Self {
        Self { procedure }
    }

    pub fn render(&self, indent: usize) -> Vec<CodeLine> {
        let mut lines = Vec::new();
        for member in &self.procedure.members {
            lines.push(CodeLine::new(
                indent,
                format!("{} {};", member.data_type, member.name),
            ));
        }
        if !self.procedure.members.is_empty() {
            lines.push(CodeLine::blank());
        }
        for (index, routine) in self.procedure.routines.iter().enumerate() {
            if index > 0 {
                lines.push(CodeLine::blank());
            }
            lines.extend(self.render_routine(routine, indent));
        }
        lines
    }

    fn render_routine(&self, routine: &Routine, indent: usize) -> Vec<CodeLine> {
        let parameters = self
            .procedure
            .parameters
            .iter()
            .map(|parameter| format!("{} {}", parameter.data_type, parameter.name))
            .join(", ");
        let mut lines = vec![CodeLine::new(
            indent,
            format!(
                "{} {}({}) {{",
                self.procedure.return_type, routine.name, parameters
            ),
        )];
        lines.extend(self.render_block(routine.body, indent + 1));
        lines.push(CodeLine::new(indent, "}"));
        lines
    }

    fn render_block(&self, block: BlockId, indent: usize) -> Vec<CodeLine> {
        self.procedure
            .blocks
            .block(block)
            .items()
            .iter()
            .flat_map(|item| self.render_item(item, indent))
            .collect()
    }

    fn render_item(&self, item: &BlockItem, indent: usize) -> Vec<CodeLine> {
        match item {
            BlockItem::Statement(statement_lines) | BlockItem::Comment(statement_lines) => {
                statement_lines
                    .iter()
                    .map(|line| CodeLine::new(indent, line.clone()))
                    .collect()
            }
            BlockItem::Guarded { inner, handler } => {
                let mut lines = vec![CodeLine::new(indent, "try {")];
                lines.extend(self.render_item(inner, indent + 1));
                lines.push(CodeLine::new(indent, "} catch (Exception e) {"));
                lines.extend(self.render_block(*handler, indent + 1));
                lines.push(CodeLine::new(indent, "}"));
                lines
            }
            BlockItem::Loop {
                collection,
                variable,
                body,
            } => {
                let mut lines = vec![CodeLine::new(
                    indent,
                    format!("{collection}.forEach(({variable}) -> {{"),
                )];
                lines.extend(self.render_block(*body, indent + 1));
                lines.push(CodeLine::new(indent, "});"));
                lines
            }
            BlockItem::Conditional { arms, default_arm } => {
                let mut lines = Vec::new();
                for (index, arm) in arms.iter().enumerate() {
                    let opener = if index == 0 {
                        format!("if ({}) {{", arm.condition)
                    } else {
                        format!("}} else if ({}) {{", arm.condition)
                    };
                    lines.push(CodeLine::new(indent, opener));
                    lines.extend(self.render_block(arm.body, indent + 1));
                }
                if let Some(default) = default_arm {
                    lines.push(CodeLine::new(indent, "} else {"));
                    lines.extend(self.render_block(*default, indent + 1));
                }
                lines.push(CodeLine::new(indent, "}"));
                lines
            }
            BlockItem::MergeCall { merge, with_result } => {
                let arguments = self
                    .procedure
                    .parameters
                    .iter()
                    .map(|parameter| parameter.name.as_str())
                    .join(", ");
                let call = format!("{}({});", merge_routine_name(merge), arguments);
                let content = if *with_result {
                    format!("return {call}")
                } else {
                    call
                };
                vec![CodeLine::new(indent, content)]
            }
            BlockItem::Return { value } => {
                let content = match value {
                    Some(value) => format!("return {value};"),
                    None => "return;".to_string(),
                };
                vec![CodeLine::new(indent, content)]
            }
            BlockItem::Break => vec![CodeLine::new(indent, "break;")],
            BlockItem::Continue => vec![CodeLine::new(indent, "continue;")],
            BlockItem::Raise => vec![CodeLine::new(indent, "throw new RuntimeException(e);")],
        }
    }
}
