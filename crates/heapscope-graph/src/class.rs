//! Class keys: the grouping used by aggregates and diffs.

use std::fmt;

use heapscope_schemas::NodeType;
use serde::{Deserialize, Serialize};

/// Groups nodes that share a constructor name and node type.
///
/// Two snapshots of the same program produce equal keys for the same kind of
/// object, which is what lets the differ align classes across snapshots
/// without relying on node ids.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct ClassKey {
    /// Node name shared by every instance.
    pub name: String,
    /// Node type shared by every instance.
    #[serde(rename = "type")]
    pub node_type: NodeType,
}

impl ClassKey {
    /// Creates a key.
    pub fn new(name: impl Into<String>, node_type: NodeType) -> Self {
        Self {
            name: name.into(),
            node_type,
        }
    }

    /// Returns the display label: the name, or `(<type>)` when unnamed.
    pub fn label(&self) -> String {
        if self.name.is_empty() {
            format!("({})", self.node_type)
        } else {
            self.name.clone()
        }
    }

    /// Returns true for classes excluded from aggregates.
    pub fn is_bookkeeping(&self) -> bool {
        self.node_type.is_bookkeeping()
    }
}

impl fmt::Display for ClassKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_uses_name_or_type() {
        assert_eq!(ClassKey::new("Window", NodeType::Object).label(), "Window");
        assert_eq!(ClassKey::new("", NodeType::Closure).label(), "(closure)");
        assert_eq!(
            ClassKey::new("", NodeType::ConcatenatedString).to_string(),
            "(concatenated-string)"
        );
    }

    /// Same name with different types are different classes.
    #[test]
    fn type_is_part_of_identity() {
        let object = ClassKey::new("Foo", NodeType::Object);
        let closure = ClassKey::new("Foo", NodeType::Closure);
        assert_ne!(object, closure);
        assert!(ClassKey::new("", NodeType::Synthetic).is_bookkeeping());
        assert!(!object.is_bookkeeping());
    }
}
