//! `#define <SYMBOL> <literal>` lines in C headers.
//!
//! Only defines whose value looks like a resource literal (`0...L`) are
//! returned; whether the literal is valid hex is left to the caller.

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DefineLine {
    pub line: usize,
    pub symbol: String,
    pub literal: String,
}

pub const GENERATED_BANNER: [&str; 3] = [
    "/* This file was auto-generated by the resmap generate command and",
    "   should not be edited directly.  Modify the resource descriptor",
    "   instead and regenerate. */",
];

pub fn parse_defines(text: &str) -> Vec<DefineLine> {
    let mut defines = Vec::new();
    for (index, raw_line) in text.lines().enumerate() {
        let line = raw_line.trim();
        if !line.starts_with("#define") {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() != 3 || fields[0] != "#define" {
            continue;
        }
        let literal = fields[2];
        if literal.starts_with('0') && literal.ends_with('L') {
            defines.push(DefineLine {
                line: index + 1,
                symbol: fields[1].to_string(),
                literal: literal.to_string(),
            });
        }
    }
    defines
}

pub fn format_define(symbol: &str, literal: &str) -> String {
    format!("#define {} {}", symbol, literal)
}
