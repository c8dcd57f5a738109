//! Comment recovery from `.proto` source text
//!
//! The grammar skips comments, so they are collected here in a separate pass
//! and looked up by line number afterwards.

/// One comment, or a run of consecutive full-line `//` comments
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CommentBlock {
    /// First line (1-based)
    pub start_line: usize,
    /// Last line (1-based)
    pub end_line: usize,
    /// Text without the `//` / `/*` `*/` delimiters, one entry per line
    pub lines: Vec<String>,
    /// Code precedes the comment on its first line
    pub inline: bool,
    /// Code follows a block comment on its last line, as in `/* A */ message A {}`
    pub precedes_code: bool,
    line_style: bool,
}

/// All comments of a file, addressable by line
#[derive(Debug, Clone, Default)]
pub(crate) struct CommentIndex {
    blocks: Vec<CommentBlock>,
}

impl CommentIndex {
    /// Collect every comment outside string literals
    pub fn scan(source: &str) -> Self {
        let bytes = source.as_bytes();
        let mut blocks: Vec<CommentBlock> = Vec::new();
        let mut line = 1;
        let mut code_on_line = false;
        let mut i = 0;

        while i < bytes.len() {
            if !code_on_line && !matches!(bytes[i], b'\n' | b' ' | b'\t' | b'\r' | b'/') {
                mark_precedes_code(&mut blocks, line);
            }
            match bytes[i] {
                b'\n' => {
                    line += 1;
                    code_on_line = false;
                    i += 1;
                }
                quote @ (b'"' | b'\'') => {
                    code_on_line = true;
                    i += 1;
                    while i < bytes.len() && bytes[i] != quote && bytes[i] != b'\n' {
                        if bytes[i] == b'\\' {
                            i += 1;
                        }
                        i += 1;
                    }
                    if bytes.get(i) == Some(&quote) {
                        i += 1;
                    }
                }
                b'/' if bytes.get(i + 1) == Some(&b'/') => {
                    let start = i + 2;
                    let end = source[start..]
                        .find('\n')
                        .map_or(bytes.len(), |offset| start + offset);
                    let text = source[start..end].trim_end_matches('\r').to_string();

                    match blocks.last_mut() {
                        Some(last)
                            if !code_on_line
                                && last.line_style
                                && !last.inline
                                && last.end_line + 1 == line =>
                        {
                            last.end_line = line;
                            last.lines.push(text);
                        }
                        _ => blocks.push(CommentBlock {
                            start_line: line,
                            end_line: line,
                            lines: vec![text],
                            inline: code_on_line,
                            precedes_code: false,
                            line_style: true,
                        }),
                    }
                    i = end;
                }
                b'/' if bytes.get(i + 1) == Some(&b'*') => {
                    let start = i + 2;
                    let (end, next) = match source[start..].find("*/") {
                        Some(offset) => (start + offset, start + offset + 2),
                        None => (bytes.len(), bytes.len()),
                    };
                    let body = &source[start..end];
                    let lines: Vec<String> = body
                        .split('\n')
                        .map(|l| l.trim_end_matches('\r').to_string())
                        .collect();
                    let newlines = lines.len() - 1;

                    blocks.push(CommentBlock {
                        start_line: line,
                        end_line: line + newlines,
                        lines,
                        inline: code_on_line,
                        precedes_code: false,
                        line_style: false,
                    });
                    line += newlines;
                    i = next;
                }
                b' ' | b'\t' | b'\r' => i += 1,
                _ => {
                    code_on_line = true;
                    i += 1;
                }
            }
        }

        CommentIndex { blocks }
    }

    /// Comment block opening `line`, or else the one ending right above it
    pub fn leading(&self, line: usize) -> Option<&[String]> {
        self.blocks
            .iter()
            .find(|block| block.precedes_code && block.end_line == line)
            .or_else(|| {
                self.blocks
                    .iter()
                    .find(|block| {
                        !block.inline && !block.precedes_code && block.end_line + 1 == line
                    })
            })
            .map(|block| block.lines.as_slice())
    }

    /// Comment that follows code on `line`
    pub fn inline(&self, line: usize) -> Option<&[String]> {
        self.blocks
            .iter()
            .find(|block| block.inline && block.start_line == line)
            .map(|block| block.lines.as_slice())
    }
}

/// Flag a block comment that is the first thing on `line` before code
fn mark_precedes_code(blocks: &mut [CommentBlock], line: usize) {
    if let Some(last) = blocks.last_mut() {
        if !last.inline && !last.line_style && last.end_line == line {
            last.precedes_code = true;
        }
    }
}
