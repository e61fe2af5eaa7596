use serde::{Deserialize, Serialize};

/// One table/record type drawn as a box of column rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityBox {
    pub name: String,
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_key: Option<String>,
}

impl EntityBox {
    pub fn new<I, S>(name: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            primary_key: None,
        }
    }

    pub fn with_primary_key(mut self, column: impl Into<String>) -> Self {
        self.primary_key = Some(column.into());
        self
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    pub fn is_primary(&self, column: &str) -> bool {
        self.primary_key.as_deref() == Some(column)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Cardinality {
    OneToOne,
    OneToMany,
    /// Many rows on the `from` side reference one row on the `to` side.
    ManyToOne,
    ManyToMany,
}

impl Cardinality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Cardinality::OneToOne => "one-to-one",
            Cardinality::OneToMany => "one-to-many",
            Cardinality::ManyToOne => "many-to-one",
            Cardinality::ManyToMany => "many-to-many",
        }
    }

    pub fn from_ends(from_many: bool, to_many: bool) -> Self {
        match (from_many, to_many) {
            (false, false) => Cardinality::OneToOne,
            (false, true) => Cardinality::OneToMany,
            (true, false) => Cardinality::ManyToOne,
            (true, true) => Cardinality::ManyToMany,
        }
    }

    /// Whether the `from` end takes a crow's foot.
    pub fn from_many(&self) -> bool {
        matches!(self, Cardinality::ManyToOne | Cardinality::ManyToMany)
    }

    /// Whether the `to` end takes a crow's foot.
    pub fn to_many(&self) -> bool {
        matches!(self, Cardinality::OneToMany | Cardinality::ManyToMany)
    }
}

/// Directed association from a column of one box to a column of another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    pub from: String,
    pub from_column: String,
    pub to: String,
    pub to_column: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<Cardinality>,
}

impl Relationship {
    pub fn new(
        from: impl Into<String>,
        from_column: impl Into<String>,
        to: impl Into<String>,
        to_column: impl Into<String>,
    ) -> Self {
        Self {
            from: from.into(),
            from_column: from_column.into(),
            to: to.into(),
            to_column: to_column.into(),
            label: None,
            kind: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_kind(mut self, kind: Cardinality) -> Self {
        self.kind = Some(kind);
        self
    }
}

/// Why a relationship cannot be drawn against its own diagram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unresolved {
    MissingBox(String),
    MissingColumn { entity: String, column: String },
}

impl std::fmt::Display for Unresolved {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Unresolved::MissingBox(name) => write!(f, "no entity named '{}'", name),
            Unresolved::MissingColumn { entity, column } => {
                write!(f, "entity '{}' has no column '{}'", entity, column)
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diagram {
    #[serde(default)]
    pub entities: Vec<EntityBox>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
}

impl Diagram {
    pub fn new(entities: Vec<EntityBox>, relationships: Vec<Relationship>) -> Self {
        Self {
            entities,
            relationships,
        }
    }

    pub fn entity(&self, name: &str) -> Option<&EntityBox> {
        self.entities.iter().find(|e| e.name == name)
    }

    pub fn has_endpoint(&self, entity: &str, column: &str) -> bool {
        self.entity(entity)
            .is_some_and(|e| e.column_index(column).is_some())
    }

    /// First broken reference of a relationship, source side checked first.
    pub fn resolve(&self, relationship: &Relationship) -> Result<(), Unresolved> {
        for (entity, column) in [
            (&relationship.from, &relationship.from_column),
            (&relationship.to, &relationship.to_column),
        ] {
            match self.entity(entity) {
                None => return Err(Unresolved::MissingBox(entity.clone())),
                Some(found) if found.column_index(column).is_none() => {
                    return Err(Unresolved::MissingColumn {
                        entity: entity.clone(),
                        column: column.clone(),
                    });
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    pub fn unresolved(&self) -> Vec<(usize, Unresolved)> {
        self.relationships
            .iter()
            .enumerate()
            .filter_map(|(idx, rel)| self.resolve(rel).err().map(|why| (idx, why)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shop() -> Diagram {
        Diagram::new(
            vec![
                EntityBox::new("orders", ["order_id", "customer_id"]).with_primary_key("order_id"),
                EntityBox::new("customers", ["customer_id", "name"]),
            ],
            vec![
                Relationship::new("orders", "customer_id", "customers", "customer_id"),
                Relationship::new("orders", "invoice_id", "invoices", "invoice_id"),
                Relationship::new("orders", "total", "customers", "name"),
            ],
        )
    }

    #[test]
    fn resolve_reports_first_broken_reference() {
        let diagram = shop();
        assert!(diagram.resolve(&diagram.relationships[0]).is_ok());
        assert_eq!(
            diagram.resolve(&diagram.relationships[1]),
            Err(Unresolved::MissingColumn {
                entity: "orders".into(),
                column: "invoice_id".into()
            })
        );
        assert_eq!(
            diagram.resolve(&diagram.relationships[2]),
            Err(Unresolved::MissingColumn {
                entity: "orders".into(),
                column: "total".into()
            })
        );
    }

    #[test]
    fn missing_box_is_reported_by_name() {
        let diagram = Diagram::new(
            vec![EntityBox::new("orders", ["invoice_id"])],
            vec![Relationship::new("orders", "invoice_id", "invoices", "id")],
        );
        let broken = diagram.unresolved();
        assert_eq!(broken.len(), 1);
        assert_eq!(broken[0].1, Unresolved::MissingBox("invoices".into()));
        assert_eq!(broken[0].1.to_string(), "no entity named 'invoices'");
    }

    #[test]
    fn cardinality_ends_follow_direction() {
        assert!(!Cardinality::OneToMany.from_many());
        assert!(Cardinality::OneToMany.to_many());
        assert!(Cardinality::ManyToOne.from_many());
        assert!(!Cardinality::ManyToOne.to_many());
        assert_eq!(Cardinality::from_ends(true, false), Cardinality::ManyToOne);

        let kind: Cardinality = serde_json::from_str("\"many-to-one\"").expect("kebab-case name");
        assert_eq!(kind, Cardinality::ManyToOne);
    }

    #[test]
    fn deserializes_page_input_contract() {
        let json = r#"{
            "entities": [
                {"name": "orders", "columns": ["order_id", "customer_id"], "primaryKey": "order_id"},
                {"name": "customers", "columns": ["customer_id"]}
            ],
            "relationships": [
                {"from": "orders", "to": "customers", "fromColumn": "customer_id",
                 "toColumn": "customer_id", "label": "placed by", "type": "one-to-many"}
            ]
        }"#;
        let diagram: Diagram = serde_json::from_str(json).expect("valid diagram json");

        assert!(diagram.entities[0].is_primary("order_id"));
        assert_eq!(diagram.entities[1].primary_key, None);
        let rel = &diagram.relationships[0];
        assert_eq!(rel.kind, Some(Cardinality::OneToMany));
        assert_eq!(rel.label.as_deref(), Some("placed by"));
        assert!(diagram.has_endpoint("customers", "customer_id"));
    }
}
