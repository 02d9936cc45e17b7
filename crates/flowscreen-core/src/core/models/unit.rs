use super::ids::{ContextId, UnitId};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitKind {
    MaterialStream,
    EnergyStream,
    PfrReactor,
    ShortcutColumn,
}

impl UnitKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitKind::MaterialStream => "MaterialStream",
            UnitKind::EnergyStream => "EnergyStream",
            UnitKind::PfrReactor => "PFR-Reactor",
            UnitKind::ShortcutColumn => "ShortcutColumn",
        }
    }

    pub fn is_stream(&self) -> bool {
        matches!(self, UnitKind::MaterialStream | UnitKind::EnergyStream)
    }
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UnitKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "materialstream" | "material-stream" => Ok(UnitKind::MaterialStream),
            "energystream" | "energy-stream" => Ok(UnitKind::EnergyStream),
            "pfr" | "pfr-reactor" => Ok(UnitKind::PfrReactor),
            "shortcutcolumn" | "shortcut-column" => Ok(UnitKind::ShortcutColumn),
            _ => Err(format!("unknown unit kind '{}'", s)),
        }
    }
}

/// What a unit declares it can accept: the property names it exposes and whether it
/// takes free-form attribute writes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Capabilities {
    properties: BTreeSet<String>,
    dynamic_attributes: bool,
}

impl Capabilities {
    pub fn new<I, S>(properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            properties: properties.into_iter().map(Into::into).collect(),
            dynamic_attributes: false,
        }
    }

    pub fn with_dynamic_attributes(mut self, enabled: bool) -> Self {
        self.dynamic_attributes = enabled;
        self
    }

    pub fn supports(&self, property: &str) -> bool {
        self.properties.contains(property)
    }

    pub fn accepts_dynamic_attributes(&self) -> bool {
        self.dynamic_attributes
    }

    pub fn properties(&self) -> impl Iterator<Item = &str> {
        self.properties.iter().map(String::as_str)
    }
}

/// Reference to an object created inside one simulation context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitHandle {
    id: UnitId,
    context: ContextId,
    kind: UnitKind,
    tag: String,
    capabilities: Capabilities,
}

impl UnitHandle {
    pub fn new(
        id: UnitId,
        context: ContextId,
        kind: UnitKind,
        tag: impl Into<String>,
        capabilities: Capabilities,
    ) -> Self {
        Self {
            id,
            context,
            kind,
            tag: tag.into(),
            capabilities,
        }
    }

    pub fn id(&self) -> UnitId {
        self.id
    }

    pub fn context(&self) -> ContextId {
        self.context
    }

    pub fn kind(&self) -> UnitKind {
        self.kind
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    pub fn supports(&self, property: &str) -> bool {
        self.capabilities.supports(property)
    }
}
