use super::binding::BindingOutcome;
use crate::core::models::ids::ContextId;
use crate::core::models::reaction::ReactionSetRef;
use crate::core::models::unit::UnitHandle;
use std::fmt;

/// The stages of a single case, in the only order they are ever entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CaseStage {
    Init,
    Compounds,
    Topology,
    ReactionDefine,
    ReactionBind,
    UnitConfigure,
    Solve,
    Extract,
    Record,
}

impl CaseStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaseStage::Init => "INIT",
            CaseStage::Compounds => "COMPOUNDS",
            CaseStage::Topology => "TOPOLOGY",
            CaseStage::ReactionDefine => "REACTION_DEFINE",
            CaseStage::ReactionBind => "REACTION_BIND",
            CaseStage::UnitConfigure => "UNIT_CONFIGURE",
            CaseStage::Solve => "SOLVE",
            CaseStage::Extract => "EXTRACT",
            CaseStage::Record => "RECORD",
        }
    }
}

impl fmt::Display for CaseStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What one case created and how far it got. Handles in a trace refer to a context
/// that has already been released by the time the trace is returned.
#[derive(Debug, Clone, Default)]
pub struct CaseTrace {
    pub context: Option<ContextId>,
    pub units: Vec<UnitHandle>,
    pub reaction_set: Option<ReactionSetRef>,
    pub binding: Option<BindingOutcome>,
    pub stages: Vec<CaseStage>,
}

impl CaseTrace {
    pub fn enter(&mut self, stage: CaseStage) {
        self.stages.push(stage);
    }

    pub fn last_stage(&self) -> Option<CaseStage> {
        self.stages.last().copied()
    }

    pub fn unit(&self, tag: &str) -> Option<&UnitHandle> {
        self.units.iter().find(|u| u.tag() == tag)
    }
}
