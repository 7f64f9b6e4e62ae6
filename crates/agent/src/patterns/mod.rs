//! Agent patterns: the six reasoning architectures.
//!
//! 1. **ReAct**: Thought → Action → Observation loop
//! 2. **OODA**: Observe → Orient → Decide → Act cycles
//! 3. **BDI**: Beliefs, desires and intentions driving actions
//! 4. **LAT**: tree search over scored candidate paths
//! 5. **RAISE**: reasoning over a persisted scratch pad
//! 6. **ReWOO**: plan, parallel workers, solve
//!
//! Every pattern drives a fresh [`Run`](crate::run) per call and returns an
//! `AgentResult`; none of them keeps state between runs.

pub mod bdi;
pub mod lat;
pub mod ooda;
pub mod raise;
pub mod react;
pub mod rewoo;

pub use bdi::BdiAgent;
pub use lat::{Evaluator, FnEvaluator, LatAgent, LlmEvaluator, SearchTree, TreeNode};
pub use ooda::OodaAgent;
pub use raise::{RaiseAgent, ScratchPad};
pub use react::ReactAgent;
pub use rewoo::RewooAgent;

#[cfg(test)]
pub(crate) mod test_helpers;
