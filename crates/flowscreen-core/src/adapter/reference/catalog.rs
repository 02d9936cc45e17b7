use crate::core::models::property::names;
use crate::core::models::unit::UnitKind;
use phf::{Map, phf_map};

/// Pure-component constants used by the reference model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Compound {
    /// g/mol
    pub molar_mass: f64,
    /// Ideal-gas enthalpy of formation at 298.15 K, kJ/mol.
    pub formation_enthalpy: f64,
    /// Enthalpy of vaporization at the normal boiling point, kJ/mol.
    pub vaporization_enthalpy: f64,
    /// K
    pub normal_boiling_point: f64,
}

#[rustfmt::skip]
static COMPOUNDS: Map<&'static str, Compound> = phf_map! {
    "Water"         => Compound { molar_mass: 18.015, formation_enthalpy: -285.83, vaporization_enthalpy: 40.65, normal_boiling_point: 373.15 },
    "Ethanol"       => Compound { molar_mass: 46.07,  formation_enthalpy: -277.0,  vaporization_enthalpy: 38.56, normal_boiling_point: 351.44 },
    "Methanol"      => Compound { molar_mass: 32.04,  formation_enthalpy: -238.4,  vaporization_enthalpy: 35.21, normal_boiling_point: 337.8 },
    "Benzene"       => Compound { molar_mass: 78.11,  formation_enthalpy: 49.0,    vaporization_enthalpy: 30.72, normal_boiling_point: 353.2 },
    "Toluene"       => Compound { molar_mass: 92.14,  formation_enthalpy: 12.0,    vaporization_enthalpy: 33.18, normal_boiling_point: 383.8 },
    "Acetone"       => Compound { molar_mass: 58.08,  formation_enthalpy: -248.4,  vaporization_enthalpy: 29.1,  normal_boiling_point: 329.2 },
    "Chlorobenzene" => Compound { molar_mass: 112.56, formation_enthalpy: 11.0,    vaporization_enthalpy: 35.19, normal_boiling_point: 404.9 },
};

pub fn compound(name: &str) -> Option<&'static Compound> {
    COMPOUNDS.get(name)
}

pub fn compound_names() -> impl Iterator<Item = &'static str> {
    COMPOUNDS.keys().copied()
}

#[rustfmt::skip]
static PROPERTY_ALIASES: Map<&'static str, &'static str> = phf_map! {
    "MolarFlow"   => names::MOLAR_FLOW,
    "Mass Flow"   => names::MASS_FLOW,
    "EnergyFlow"  => names::ENERGY_FLOW,
    "RefluxRatio" => names::REFLUX_RATIO,
};

/// Maps accepted spellings onto the canonical property name.
pub fn canonical_property(name: &str) -> &str {
    PROPERTY_ALIASES.get(name).copied().unwrap_or(name)
}

const MATERIAL_STREAM_PROPERTIES: &[&str] = &[
    names::TEMPERATURE,
    names::PRESSURE,
    names::MASS_FLOW,
    names::MOLAR_FLOW,
    names::COMPOSITION,
];

const ENERGY_STREAM_PROPERTIES: &[&str] = &[names::ENERGY_FLOW];

const PFR_PROPERTIES: &[&str] = &[
    names::VOLUME,
    "Length",
    names::OPERATION_MODE,
];

const COLUMN_PROPERTIES: &[&str] = &[
    names::REFLUX_RATIO,
    names::NUMBER_OF_STAGES,
    names::CONDENSER_PRESSURE,
    names::REBOILER_PRESSURE,
    names::LIGHT_KEY,
    names::HEAVY_KEY,
    names::LIGHT_KEY_FRACTION,
    names::CONDENSER_DUTY,
    names::REBOILER_DUTY,
];

/// Properties every unit of `kind` exposes, before any binding properties are added.
pub fn base_properties(kind: UnitKind) -> &'static [&'static str] {
    match kind {
        UnitKind::MaterialStream => MATERIAL_STREAM_PROPERTIES,
        UnitKind::EnergyStream => ENERGY_STREAM_PROPERTIES,
        UnitKind::PfrReactor => PFR_PROPERTIES,
        UnitKind::ShortcutColumn => COLUMN_PROPERTIES,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compound_lookup_is_exact() {
        let water = compound("Water").unwrap();
        assert!((water.molar_mass - 18.015).abs() < 1e-9);
        assert!(compound("water").is_none());
        assert!(compound("Unobtainium").is_none());
        assert_eq!(compound_names().count(), 7);
    }

    #[test]
    fn aliases_resolve_to_canonical_names() {
        assert_eq!(canonical_property("MolarFlow"), names::MOLAR_FLOW);
        assert_eq!(canonical_property(names::TEMPERATURE), names::TEMPERATURE);
    }

    #[test]
    fn column_exposes_duties_but_reactor_does_not() {
        assert!(base_properties(UnitKind::ShortcutColumn).contains(&names::CONDENSER_DUTY));
        assert!(!base_properties(UnitKind::PfrReactor).contains(&names::CONDENSER_DUTY));
    }
}
