use crate::{NodeId, RuleId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SuffixError {
    #[error("'{0}' is not a transformation between known suffixes")]
    MalformedTransform(String),
    #[error("unknown transformation rule {0:?}")]
    UnknownRule(RuleId),
    #[error("unknown graph node {0:?}")]
    UnknownNode(NodeId),
    #[error("suffix cycle while searching for an implicit source of '{target}': {}", chain.join(" -> "))]
    SuffixCycle { target: String, chain: Vec<String> },
    #[error("invalid plan: {0}")]
    Plan(String),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
