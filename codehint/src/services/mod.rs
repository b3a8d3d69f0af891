mod classifier;
mod explain;
mod hints;

pub use classifier::{parse_classifier_output, CodeRelevanceClassifier};
pub use explain::{ExplainService, Explanation};
pub use hints::{HintOutcome, HintService};
