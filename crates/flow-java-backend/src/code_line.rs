// Copyright (c) Asymptotic
// SPDX-License-Identifier: Apache-2.0

//! Line-based output with structural indentation

/// One output line: indent depth plus content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeLine {
    pub indent: usize,
    pub content: String,
}

impl CodeLine {
    pub fn new(indent: usize, content: impl Into<String>) -> Self {
        Self {
            indent,
            content: content.into(),
        }
    }

    /// Separator line between grouped declarations and statements.
    pub fn blank() -> Self {
        Self {
            indent: 0,
            content: String::new(),
        }
    }
}

/// Join rendered lines into final text, one `indent_unit` per depth level.
/// Blank lines carry no indentation.
pub fn render_text(lines: &[CodeLine], indent_unit: &str) -> String {
    let mut out = String::new();
    for line in lines {
        if !line.content.is_empty() {
            for _ in 0..line.indent {
                out.push_str(indent_unit);
            }
            out.push_str(&line.content);
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indents_by_depth() {
        let lines = vec![
            CodeLine::new(0, "void execute() {"),
            CodeLine::new(1, "a();"),
            CodeLine::blank(),
            CodeLine::new(1, "b();"),
            CodeLine::new(0, "}"),
        ];
        assert_eq!(
            render_text(&lines, "    "),
            "void execute() {\n    a();\n\n    b();\n}\n"
        );
    }
}
