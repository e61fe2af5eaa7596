use std::path::Path;

use super::types::*;
use crate::error::{Error, Result};

/// Encodings a diagram descriptor can arrive in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagramFormat {
    Json,
    Yaml,
    Toml,
    Text,
}

impl DiagramFormat {
    /// Pick a format from the file extension; unknown extensions are the text form.
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("json") => DiagramFormat::Json,
            Some("yaml") | Some("yml") => DiagramFormat::Yaml,
            Some("toml") => DiagramFormat::Toml,
            _ => DiagramFormat::Text,
        }
    }
}

pub fn parse_diagram(source: &str, format: DiagramFormat) -> Result<Diagram> {
    match format {
        DiagramFormat::Json => serde_json::from_str(source).map_err(|e| Error::Format {
            format: "JSON",
            message: e.to_string(),
        }),
        DiagramFormat::Yaml => serde_yaml::from_str(source).map_err(|e| Error::Format {
            format: "YAML",
            message: e.to_string(),
        }),
        DiagramFormat::Toml => toml::from_str(source).map_err(|e| Error::Format {
            format: "TOML",
            message: e.to_string(),
        }),
        DiagramFormat::Text => parse_text(source),
    }
}

pub fn load_diagram(path: &Path) -> Result<Diagram> {
    let source = std::fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_diagram(&source, DiagramFormat::from_path(path))
}

// ============================================
// TEXT FORM
// ============================================

/// Arrow ends as written on the `from` side; `true` marks a "many" end.
const FROM_ENDS: &[(&str, bool)] = &[("||", false), ("|o", false), ("}|", true), ("}o", true)];
/// Arrow ends as written on the `to` side.
const TO_ENDS: &[(&str, bool)] = &[("||", false), ("o|", false), ("|{", true), ("o{", true)];

/// `Some(kind)` for a recognised arrow; untyped arrows carry no cardinality.
fn parse_arrow(arrow: &str) -> Option<Option<Cardinality>> {
    if arrow == "--" || arrow == "-->" {
        return Some(None);
    }

    let from_end = arrow.get(..2)?;
    let link = arrow.get(2..4)?;
    let to_end = arrow.get(4..)?;
    if link != "--" && link != ".." {
        return None;
    }

    let (_, from_many) = FROM_ENDS.iter().find(|(end, _)| *end == from_end)?;
    let (_, to_many) = TO_ENDS.iter().find(|(end, _)| *end == to_end)?;
    Some(Some(Cardinality::from_ends(*from_many, *to_many)))
}

/// Parse the compact `erDiagram` text form.
///
/// Boxes are `name { col ... }` blocks, `*` marks the primary key, and
/// relationships are `box.column ARROW box.column : "label"`.
pub fn parse_text(input: &str) -> Result<Diagram> {
    let mut entities: Vec<EntityBox> = Vec::new();
    let mut relationships: Vec<Relationship> = Vec::new();
    let mut current: Option<EntityBox> = None;
    let mut seen_header = false;

    for (idx, raw) in input.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with("%%") {
            continue;
        }

        if !seen_header {
            seen_header = true;
            if line == "erDiagram" {
                continue;
            }
        }

        if line == "}" {
            match current.take() {
                Some(done) => entities.push(done),
                None => return Err(Error::parse(line_no, "unexpected '}'")),
            }
            continue;
        }

        if let Some(entity) = current.as_mut() {
            let (is_key, name) = match line.strip_prefix('*') {
                Some(rest) => (true, rest.trim()),
                None => (false, line),
            };
            if name.is_empty() {
                return Err(Error::parse(line_no, "empty column name"));
            }
            if is_key {
                if entity.primary_key.is_some() {
                    return Err(Error::parse(
                        line_no,
                        format!("entity '{}' already has a primary key", entity.name),
                    ));
                }
                entity.primary_key = Some(name.to_string());
            }
            entity.columns.push(name.to_string());
            continue;
        }

        if line.contains("--") || line.contains("..") {
            relationships.push(parse_relationship(line, line_no)?);
            continue;
        }

        let (name, opens_block) = match line.strip_suffix('{') {
            Some(head) => (head.trim(), true),
            None => (line, false),
        };
        if name.is_empty() || name.contains(char::is_whitespace) {
            return Err(Error::parse(line_no, format!("invalid entity name '{}'", name)));
        }
        if entities.iter().any(|e| e.name == name) {
            return Err(Error::parse(line_no, format!("duplicate entity '{}'", name)));
        }

        let entity = EntityBox::new(name, Vec::<String>::new());
        if opens_block {
            current = Some(entity);
        } else {
            entities.push(entity);
        }
    }

    if let Some(open) = current {
        return Err(Error::parse(
            input.lines().count(),
            format!("entity '{}' is missing a closing '}}'", open.name),
        ));
    }

    Ok(Diagram::new(entities, relationships))
}

fn parse_relationship(line: &str, line_no: usize) -> Result<Relationship> {
    let (body, label) = match line.split_once(':') {
        Some((body, label)) => {
            let label = label.trim().trim_matches('"').trim();
            (body, (!label.is_empty()).then(|| label.to_string()))
        }
        None => (line, None),
    };

    let tokens: Vec<&str> = body.split_whitespace().collect();
    let [from, arrow, to] = tokens.as_slice() else {
        return Err(Error::parse(
            line_no,
            format!("expected 'entity.column ARROW entity.column', found '{}'", body.trim()),
        ));
    };
    let Some(kind) = parse_arrow(arrow) else {
        return Err(Error::parse(line_no, format!("unrecognised arrow '{}'", arrow)));
    };

    let (from, from_column) = parse_endpoint(from, line_no)?;
    let (to, to_column) = parse_endpoint(to, line_no)?;
    Ok(Relationship {
        from,
        from_column,
        to,
        to_column,
        label,
        kind,
    })
}

fn parse_endpoint(part: &str, line_no: usize) -> Result<(String, String)> {
    let is_name = |s: &str| {
        !s.is_empty() && !s.contains(|c: char| c.is_whitespace() || "|{}<>".contains(c))
    };
    match part.split_once('.') {
        Some((entity, column)) if is_name(entity) && is_name(column) => {
            Ok((entity.to_string(), column.to_string()))
        }
        _ => Err(Error::parse(
            line_no,
            format!("expected 'entity.column', found '{}'", part),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_text_boxes_and_relationship() {
        let input = r#"
erDiagram
orders {
    *order_id
    customer_id
}
customers {
    *customer_id
    name
}
orders.customer_id }o--|| customers.customer_id : "placed by"
"#;
        let diagram = parse_text(input).unwrap();
        assert_eq!(diagram.entities.len(), 2);
        assert_eq!(diagram.entities[0].columns, vec!["order_id", "customer_id"]);
        assert_eq!(diagram.entities[0].primary_key.as_deref(), Some("order_id"));

        let rel = &diagram.relationships[0];
        assert_eq!(rel.from, "orders");
        assert_eq!(rel.from_column, "customer_id");
        assert_eq!(rel.to, "customers");
        assert_eq!(rel.to_column, "customer_id");
        assert_eq!(rel.kind, Some(Cardinality::ManyToOne));
        assert_eq!(rel.label.as_deref(), Some("placed by"));
    }

    #[test]
    fn test_parse_arrow_kinds() {
        let cases = [
            ("a.x ||--|| b.y", Some(Cardinality::OneToOne)),
            ("a.x ||--o{ b.y", Some(Cardinality::OneToMany)),
            ("a.x |o--|{ b.y", Some(Cardinality::OneToMany)),
            ("a.x }o--|| b.y", Some(Cardinality::ManyToOne)),
            ("a.x }|..o| b.y", Some(Cardinality::ManyToOne)),
            ("a.x |o--o| b.y", Some(Cardinality::OneToOne)),
            ("a.x }o--o{ b.y", Some(Cardinality::ManyToMany)),
            ("a.x --> b.y", None),
            ("a.x -- b.y", None),
        ];
        for (line, expected) in cases {
            let rel = parse_relationship(line, 1).unwrap();
            assert_eq!(rel.kind, expected, "arrow in {line}");
            assert_eq!(rel.from_column, "x");
            assert_eq!(rel.to_column, "y");
        }
    }

    #[test]
    fn test_relationship_to_undeclared_box_still_parses() {
        let diagram = parse_text("erDiagram\norders {\n  id\n}\norders.id -- invoices.order_id\n").unwrap();
        assert_eq!(diagram.relationships.len(), 1);
        assert_eq!(diagram.relationships[0].to, "invoices");
    }

    #[test]
    fn test_endpoint_without_column_is_an_error() {
        let err = parse_text("erDiagram\norders -- customers\n").unwrap_err();
        assert!(matches!(err, Error::Parse { line: 2, .. }), "{err}");
    }

    #[test]
    fn test_malformed_arrows_are_errors() {
        for line in [
            "a.x ||--|o b.y",
            "a.x o{--}o b.y",
            "a.x ||-|| b.y",
            "a.x||--||b.y",
            "a.x ||--|| b.y c.z",
        ] {
            let input = format!("erDiagram\na {{\n  x\n}}\n{line}\n");
            let err = parse_text(&input).unwrap_err();
            assert!(matches!(err, Error::Parse { line: 5, .. }), "{line}: {err}");
        }
    }

    #[test]
    fn test_endpoint_rejects_arrow_characters() {
        assert!(parse_endpoint("a.x", 1).is_ok());
        assert!(parse_endpoint("a.x|o", 1).is_err());
        assert!(parse_endpoint("|{b.y", 1).is_err());
        assert!(parse_endpoint(".y", 1).is_err());
    }

    #[test]
    fn test_unclosed_block_is_an_error() {
        let err = parse_text("erDiagram\norders {\n  id\n").unwrap_err();
        assert!(err.to_string().contains("closing"));
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(DiagramFormat::from_path(Path::new("a.JSON")), DiagramFormat::Json);
        assert_eq!(DiagramFormat::from_path(Path::new("a.yml")), DiagramFormat::Yaml);
        assert_eq!(DiagramFormat::from_path(Path::new("a.toml")), DiagramFormat::Toml);
        assert_eq!(DiagramFormat::from_path(Path::new("a.erd")), DiagramFormat::Text);
    }

    #[test]
    fn test_parse_toml_descriptor() {
        let source = r#"
[[entities]]
name = "orders"
columns = ["order_id", "customer_id"]
primaryKey = "order_id"

[[relationships]]
from = "orders"
fromColumn = "customer_id"
to = "customers"
toColumn = "customer_id"
type = "one-to-many"
"#;
        let diagram = parse_diagram(source, DiagramFormat::Toml).unwrap();
        assert_eq!(diagram.entities[0].primary_key.as_deref(), Some("order_id"));
        assert_eq!(diagram.relationships[0].kind, Some(Cardinality::OneToMany));
    }
}
