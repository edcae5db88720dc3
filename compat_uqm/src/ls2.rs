//! Package index files: `<package> <instance> <type> <target>` per line.

use std::num::IntErrorKind;

use crate::{LineError, Parsed};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexLine {
    pub line: usize,
    pub package: u32,
    pub instance: u32,
    pub res_type: u32,
    pub target: String,
}

/// Reads a package index. Lines that do not have exactly four fields are
/// ignored (titles, underlines, blank lines); four-field lines with a
/// non-integer number are rejected.
///
/// Numbers wider than 32 bits keep their low 32 bits; the codec masks them
/// further to the field widths.
pub fn parse_index(text: &str) -> Parsed<IndexLine> {
    let mut parsed = Parsed::default();
    for (index, raw_line) in text.lines().enumerate() {
        let line_no = index + 1;
        let fields: Vec<&str> = raw_line.split_whitespace().collect();
        if fields.len() != 4 {
            continue;
        }
        let numbers = (
            parse_number(fields[0]),
            parse_number(fields[1]),
            parse_number(fields[2]),
        );
        match numbers {
            (Ok(package), Ok(instance), Ok(res_type)) => parsed.records.push(IndexLine {
                line: line_no,
                package,
                instance,
                res_type,
                target: fields[3].to_string(),
            }),
            (Err(reason), _, _) | (_, Err(reason), _) | (_, _, Err(reason)) => {
                parsed.rejected.push(LineError::new(line_no, reason))
            }
        }
    }
    parsed
}

fn parse_number(field: &str) -> Result<u32, &'static str> {
    match field.parse::<u64>() {
        Ok(value) => Ok((value & u64::from(u32::MAX)) as u32),
        Err(err) if *err.kind() == IntErrorKind::PosOverflow => {
            Err("package/instance/type out of range")
        }
        Err(_) => Err("noninteger package/instance/type"),
    }
}

pub fn format_index_line(package: u32, instance: u32, res_type: u32, target: &str) -> String {
    format!("{:>3} {:>3} {:>3} {}", package, instance, res_type, target)
}
