//! Master map files: `<key> = <TYPE>:<path>` or `<key> = <path>`.

use crate::{LineError, Parsed};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MapLine {
    pub line: usize,
    pub key: String,
    /// `None` when the value has no `TYPE:` segment.
    pub res_type: Option<String>,
    pub path: String,
}

pub fn parse_map(text: &str) -> Parsed<MapLine> {
    let mut parsed = Parsed::default();
    for (index, raw_line) in text.lines().enumerate() {
        let line_no = index + 1;
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            parsed
                .rejected
                .push(LineError::new(line_no, "no = in resource initializer"));
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            parsed
                .rejected
                .push(LineError::new(line_no, "empty resource key"));
            continue;
        }
        let (res_type, path) = match value.split_once(':') {
            Some((res_type, path)) => {
                let res_type = res_type.trim();
                let res_type = (!res_type.is_empty()).then(|| res_type.to_string());
                (res_type, path.trim())
            }
            None => (None, value.trim()),
        };
        parsed.records.push(MapLine {
            line: line_no,
            key: key.to_string(),
            res_type,
            path: path.to_string(),
        });
    }
    parsed
}

pub fn format_map_line(key: &str, res_type: &str, path: &str) -> String {
    format!("{} = {}:{}", key, res_type, path)
}
