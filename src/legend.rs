use crate::diagram::{Cardinality, Diagram};

/// Text listing of one declared relationship.
#[derive(Debug, Clone, PartialEq)]
pub struct LegendEntry {
    pub relationship: usize,
    /// `from.fromColumn → to.toColumn`
    pub text: String,
    pub label: Option<String>,
    pub kind: Option<Cardinality>,
}

impl LegendEntry {
    /// Text plus label and cardinality, as shown in the rendered legend.
    pub fn line(&self) -> String {
        let mut line = self.text.clone();
        if let Some(label) = &self.label {
            line.push_str(": ");
            line.push_str(label);
        }
        if let Some(kind) = self.kind {
            line.push_str(" (");
            line.push_str(kind.as_str());
            line.push(')');
        }
        line
    }
}

/// One entry per declared relationship, whether or not it can be drawn.
pub fn legend(diagram: &Diagram) -> Vec<LegendEntry> {
    diagram
        .relationships
        .iter()
        .enumerate()
        .map(|(idx, rel)| LegendEntry {
            relationship: idx,
            text: format!(
                "{}.{} → {}.{}",
                rel.from, rel.from_column, rel.to, rel.to_column
            ),
            label: rel.label.clone(),
            kind: rel.kind,
        })
        .collect()
}
