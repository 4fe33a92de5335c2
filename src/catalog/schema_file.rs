use crate::common::{DbError, Result};
use crate::tuple::{FieldDesc, TupleDesc, Type};

/// One table entry of a schema file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    pub name: String,
    pub desc: TupleDesc,
    pub primary_key: Option<String>,
}

/// Parses a whole schema file, one table per non-blank line.
///
/// ```text
/// users (id int pk, name string, age int)
/// orders (id int, user_id int)
/// ```
///
/// Line numbers in errors are 1-based.
pub fn parse_schema(text: &str) -> Result<Vec<TableSchema>> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| parse_schema_line(line, i + 1))
        .collect()
}

/// Parses one `name (field type [pk], ...)` line.
pub fn parse_schema_line(line: &str, line_no: usize) -> Result<TableSchema> {
    let parse_err = |reason: String| DbError::CatalogParse {
        line: line_no,
        reason,
    };

    let open = line
        .find('(')
        .ok_or_else(|| parse_err("missing '('".to_string()))?;
    let close = line
        .rfind(')')
        .filter(|&c| c > open)
        .ok_or_else(|| parse_err("missing ')'".to_string()))?;
    if !line[close + 1..].trim().is_empty() {
        return Err(parse_err("unexpected text after ')'".to_string()));
    }

    let name = line[..open].trim();
    if name.is_empty() {
        return Err(parse_err("missing table name".to_string()));
    }

    let mut fields = Vec::new();
    let mut primary_key = None;
    for entry in line[open + 1..close].split(',') {
        let parts: Vec<&str> = entry.split_whitespace().collect();
        let (field_name, type_name, annotation) = match parts.as_slice() {
            [n, t] => (*n, *t, None),
            [n, t, a] => (*n, *t, Some(*a)),
            _ => return Err(parse_err(format!("malformed field '{}'", entry.trim()))),
        };

        let field_type = Type::from_name(type_name)
            .ok_or_else(|| parse_err(format!("unknown type '{}'", type_name)))?;

        match annotation {
            None => {}
            Some("pk") if primary_key.is_none() => primary_key = Some(field_name.to_string()),
            Some("pk") => return Err(parse_err("more than one pk field".to_string())),
            Some(other) => return Err(parse_err(format!("unknown annotation '{}'", other))),
        }

        fields.push(FieldDesc::new(field_name, field_type));
    }

    Ok(TableSchema {
        name: name.to_string(),
        desc: TupleDesc::new(fields),
        primary_key,
    })
}
