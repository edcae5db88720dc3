//! Tabular resource descriptor: one comma-separated row per resource.
//!
//! Columns: header file, index file, source constant, package, instance,
//! type, symbolic id, type tag, file name. `--` marks an absent value in the
//! optional columns (header file, constant, type tag, file name). Anything
//! after a `#` is a comment.

use crate::{LineError, Parsed};

pub const FIELD_COUNT: usize = 9;
pub const ABSENT: &str = "--";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DescriptorRow {
    pub line: usize,
    pub header_file: Option<String>,
    pub index_file: String,
    pub constant: Option<String>,
    pub package: u32,
    pub instance: u32,
    pub res_type: u32,
    pub res_id: String,
    pub type_tag: Option<String>,
    pub file: Option<String>,
}

impl DescriptorRow {
    pub fn to_row(&self) -> String {
        [
            optional_field(&self.header_file).to_string(),
            self.index_file.clone(),
            optional_field(&self.constant).to_string(),
            self.package.to_string(),
            self.instance.to_string(),
            self.res_type.to_string(),
            self.res_id.clone(),
            optional_field(&self.type_tag).to_string(),
            optional_field(&self.file).to_string(),
        ]
        .join(",")
    }
}

pub fn parse_descriptors(text: &str) -> Parsed<DescriptorRow> {
    let mut parsed = Parsed::default();
    for (index, raw_line) in text.lines().enumerate() {
        let line_no = index + 1;
        let line = strip_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() != FIELD_COUNT {
            parsed.rejected.push(LineError::new(
                line_no,
                format!(
                    "incorrect number of fields ({} found, {} expected)",
                    fields.len(),
                    FIELD_COUNT
                ),
            ));
            continue;
        }
        match parse_row(line_no, &fields) {
            Ok(row) => parsed.records.push(row),
            Err(err) => parsed.rejected.push(err),
        }
    }
    parsed
}

fn parse_row(line_no: usize, fields: &[&str]) -> Result<DescriptorRow, LineError> {
    let number = |value: &str| {
        value
            .parse::<u32>()
            .map_err(|_| LineError::new(line_no, "noninteger package/instance/type"))
    };
    let package = number(fields[3])?;
    let instance = number(fields[4])?;
    let res_type = number(fields[5])?;
    if fields[1].is_empty() || fields[1] == ABSENT {
        return Err(LineError::new(line_no, "missing index file"));
    }
    if fields[6].is_empty() || fields[6] == ABSENT {
        return Err(LineError::new(line_no, "missing symbolic id"));
    }
    Ok(DescriptorRow {
        line: line_no,
        header_file: present(fields[0]),
        index_file: fields[1].to_string(),
        constant: present(fields[2]),
        package,
        instance,
        res_type,
        res_id: fields[6].to_string(),
        type_tag: present(fields[7]),
        file: present(fields[8]),
    })
}

fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(index) => &line[..index],
        None => line,
    }
}

fn present(value: &str) -> Option<String> {
    if value.is_empty() || value == ABSENT {
        None
    } else {
        Some(value.to_string())
    }
}

fn optional_field(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or(ABSENT)
}
