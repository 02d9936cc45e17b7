use std::collections::HashMap;

/// A misbehavior the reference engine injects into one context.
#[derive(Debug, Clone, PartialEq)]
pub enum Fault {
    /// `solve` returns these messages instead of running the model.
    SolverErrors(Vec<String>),
    /// `solve` itself fails with this message.
    SolveRaises(String),
    /// Writes to this property fail as if the unit did not expose it.
    RejectProperty(String),
    /// The solve succeeds but scrambles every material stream afterwards and lists a
    /// bogus reaction set ahead of the default one.
    CorruptState,
    /// Every `connect` call fails.
    FailTopology,
}

/// Faults keyed by context ordinal: the first context created by an engine has
/// ordinal 0, the next 1, and so on.
#[derive(Debug, Clone, Default)]
pub struct FaultPlan {
    faults: HashMap<usize, Vec<Fault>>,
}

impl FaultPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_case(mut self, ordinal: usize, fault: Fault) -> Self {
        self.faults.entry(ordinal).or_default().push(fault);
        self
    }

    pub fn for_case(&self, ordinal: usize) -> &[Fault] {
        self.faults.get(&ordinal).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.faults.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn faults_accumulate_per_ordinal() {
        let plan = FaultPlan::new()
            .on_case(1, Fault::FailTopology)
            .on_case(1, Fault::CorruptState);
        assert!(plan.for_case(0).is_empty());
        assert_eq!(plan.for_case(1).len(), 2);
        assert!(!plan.is_empty());
    }
}
