//! Placement decisions

/// Combined score of one feasible node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeScore {
    /// Node name
    pub node: String,
    /// Sum of all score plugins
    pub score: i64,
}

/// Outcome of one scheduling attempt for a work item
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    /// The item fits; `node` had the highest combined score
    Node { node: String, score: i64 },
    /// No node fits; one reason per rejected node
    Unschedulable { reasons: Vec<String> },
}

impl Placement {
    /// Chosen node name, if any
    pub fn node(&self) -> Option<&str> {
        match self {
            Placement::Node { node, .. } => Some(node),
            Placement::Unschedulable { .. } => None,
        }
    }
}

impl std::fmt::Display for Placement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Placement::Node { node, score } => write!(f, "{} (score {})", node, score),
            Placement::Unschedulable { reasons } => {
                write!(f, "unschedulable: {}", reasons.join("; "))
            }
        }
    }
}

/// Pick the highest-scoring node; equal scores go to the lexically smallest name
pub fn select_node(scores: &[NodeScore]) -> Option<&NodeScore> {
    scores
        .iter()
        .max_by(|a, b| a.score.cmp(&b.score).then_with(|| b.node.cmp(&a.node)))
}
