//! [`TypeModel`] → Go declarations.
//!
//! The emitter only reads the model; it writes declarations in the order the
//! builder produced them, aliases first, then records.

use std::io::{self, Write};

use crate::model::{Alias, Field, NamedKind, Primitive, Record, ResolvedType, TypeModel};

/// Write every declaration of the model to `out`.
///
/// Each declaration is preceded by a blank line, so the text can follow a
/// `package` clause directly. Write errors are returned unchanged.
pub fn emit<W: Write>(model: &TypeModel, out: &mut W) -> io::Result<()> {
    if uses_time(model) {
        writeln!(out)?;
        writeln!(out, "import (")?;
        writeln!(out, "\t\"time\"")?;
        writeln!(out, ")")?;
    }
    for alias in &model.aliases {
        writeln!(out)?;
        write_alias(alias, out)?;
    }
    for record in &model.records {
        writeln!(out)?;
        write_record(record, out)?;
    }
    Ok(())
}

/// Render the model into a string.
pub fn render(model: &TypeModel) -> String {
    let mut buf = Vec::new();
    // Writing into a Vec cannot fail.
    let _ = emit(model, &mut buf);
    String::from_utf8_lossy(&buf).into_owned()
}

fn write_alias<W: Write>(alias: &Alias, out: &mut W) -> io::Result<()> {
    if let Some(description) = &alias.description {
        write_comment(out, "", &alias.name, description)?;
    }
    if !alias.values.is_empty() {
        let values: Vec<String> = alias.values.iter().map(|v| v.to_string()).collect();
        writeln!(out, "// Values: {}.", values.join(", "))?;
    }
    writeln!(out, "type {} {}", alias.name, go_type(&alias.ty))?;

    if !alias.constants.is_empty() {
        let width = alias.constants.iter().map(|c| c.name.len()).max().unwrap_or(0);
        writeln!(out)?;
        writeln!(out, "const (")?;
        for constant in &alias.constants {
            writeln!(
                out,
                "\t{:<width$} {} = {}",
                constant.name, alias.name, constant.value
            )?;
        }
        writeln!(out, ")")?;
    }
    Ok(())
}

fn write_record<W: Write>(record: &Record, out: &mut W) -> io::Result<()> {
    if let Some(description) = &record.description {
        write_comment(out, "", &record.name, description)?;
    }
    writeln!(out, "type {} struct {{", record.name)?;

    let lines: Vec<(&Field, String, String)> = record
        .fields
        .iter()
        .map(|field| (field, field_type(field), field_tag(field)))
        .collect();
    let name_width = lines.iter().map(|(f, _, _)| f.name.len()).max().unwrap_or(0);
    let type_width = lines.iter().map(|(_, ty, _)| ty.len()).max().unwrap_or(0);

    for (field, ty, tag) in &lines {
        if let Some(description) = &field.description {
            write_comment(out, "\t", &field.name, description)?;
        }
        writeln!(
            out,
            "\t{:<name_width$} {:<type_width$} {}",
            field.name, ty, tag
        )?;
    }
    writeln!(out, "}}")
}

/// `// Name first line`, then one `//` line per remaining line.
fn write_comment<W: Write>(out: &mut W, indent: &str, name: &str, text: &str) -> io::Result<()> {
    let mut lines = text.lines().map(str::trim_end);
    let first = lines.next().unwrap_or_default();
    writeln!(out, "{indent}// {name} {first}")?;
    for line in lines {
        if line.is_empty() {
            writeln!(out, "{indent}//")?;
        } else {
            writeln!(out, "{indent}// {line}")?;
        }
    }
    Ok(())
}

/// Go spelling of a type.
pub fn go_type(ty: &ResolvedType) -> String {
    match ty {
        ResolvedType::Primitive(primitive) => primitive_type(*primitive).to_string(),
        ResolvedType::Named(named) => named.name.clone(),
        ResolvedType::Sequence(item) => format!("[]{}", go_type(item)),
        ResolvedType::Map(value) => format!("map[string]{}", go_type(value)),
        ResolvedType::Fallback => "interface{}".to_string(),
    }
}

fn primitive_type(primitive: Primitive) -> &'static str {
    match primitive {
        Primitive::String => "string",
        Primitive::Bytes => "[]byte",
        Primitive::DateTime | Primitive::Date => "time.Time",
        Primitive::Integer => "int",
        Primitive::Int32 => "int32",
        Primitive::Int64 => "int64",
        Primitive::Float32 => "float32",
        Primitive::Number => "float64",
        Primitive::Boolean => "bool",
    }
}

/// Field type with a pointer where absence or a cycle needs one.
fn field_type(field: &Field) -> String {
    let recursive_record = matches!(
        &field.ty,
        ResolvedType::Named(named) if named.recursive && named.kind == NamedKind::Record
    );
    if recursive_record || (field.is_optional() && !field.ty.is_indirect()) {
        format!("*{}", go_type(&field.ty))
    } else {
        go_type(&field.ty)
    }
}

/// `json:"key"` struct tag, with `omitempty` for fields that are not required.
fn field_tag(field: &Field) -> String {
    let mut value = field.key.clone();
    if !field.required {
        value.push_str(",omitempty");
    }
    let tag = format!("json:{}", quote(&value));
    if tag.contains('`') {
        quote(&tag)
    } else {
        format!("`{tag}`")
    }
}

fn quote(text: &str) -> String {
    serde_json::Value::String(text.to_string()).to_string()
}

fn uses_time(model: &TypeModel) -> bool {
    fn mentions_time(ty: &ResolvedType) -> bool {
        match ty {
            ResolvedType::Primitive(p) => matches!(p, Primitive::Date | Primitive::DateTime),
            ResolvedType::Sequence(inner) | ResolvedType::Map(inner) => mentions_time(inner),
            ResolvedType::Named(_) | ResolvedType::Fallback => false,
        }
    }
    model.aliases.iter().any(|a| mentions_time(&a.ty))
        || model
            .records
            .iter()
            .flat_map(|r| &r.fields)
            .any(|f| mentions_time(&f.ty))
}
