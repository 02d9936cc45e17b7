use super::ids::ContextId;

/// Arrhenius parameters for the forward and reverse directions.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct KineticParameters {
    pub forward_factor: f64,
    pub forward_activation_energy: f64,
    pub reverse_factor: f64,
    pub reverse_activation_energy: f64,
}

/// A kinetic reaction as handed to the engine.
///
/// Stoichiometric coefficients are signed: negative for consumed compounds, positive
/// for produced ones. Orders default to zero for compounds that are not listed.
#[derive(Debug, Clone, PartialEq)]
pub struct ReactionDefinition {
    pub name: String,
    pub description: String,
    pub stoichiometry: Vec<(String, f64)>,
    pub forward_orders: Vec<(String, f64)>,
    pub reverse_orders: Vec<(String, f64)>,
    pub base_compound: String,
    pub phase: String,
    pub basis: String,
    pub amount_units: String,
    pub rate_units: String,
    pub kinetics: KineticParameters,
    pub forward_expression: Option<String>,
    pub reverse_expression: Option<String>,
}

impl ReactionDefinition {
    /// Builds an irreversible `reactant -> product` reaction with the given forward order
    /// in the reactant, on a molar-concentration basis in the mixed phase.
    pub fn irreversible(
        name: impl Into<String>,
        reactant: &str,
        product: &str,
        order: f64,
        kinetics: KineticParameters,
    ) -> Self {
        Self {
            name: name.into(),
            description: format!("{} -> {}", reactant, product),
            stoichiometry: vec![(reactant.to_string(), -1.0), (product.to_string(), 1.0)],
            forward_orders: vec![(reactant.to_string(), order), (product.to_string(), 0.0)],
            reverse_orders: vec![(reactant.to_string(), 0.0), (product.to_string(), 0.0)],
            base_compound: reactant.to_string(),
            phase: "Mixture".to_string(),
            basis: "Molar Concentration".to_string(),
            amount_units: "mol".to_string(),
            rate_units: "mol/[m3.s]".to_string(),
            kinetics,
            forward_expression: None,
            reverse_expression: None,
        }
    }

    pub fn coefficient(&self, compound: &str) -> f64 {
        lookup(&self.stoichiometry, compound)
    }

    pub fn forward_order(&self, compound: &str) -> f64 {
        lookup(&self.forward_orders, compound)
    }

    pub fn reverse_order(&self, compound: &str) -> f64 {
        lookup(&self.reverse_orders, compound)
    }

    pub fn compounds(&self) -> impl Iterator<Item = &str> {
        self.stoichiometry.iter().map(|(c, _)| c.as_str())
    }

    pub fn has_custom_expressions(&self) -> bool {
        let non_empty = |e: &Option<String>| e.as_deref().is_some_and(|s| !s.trim().is_empty());
        non_empty(&self.forward_expression) || non_empty(&self.reverse_expression)
    }
}

fn lookup(pairs: &[(String, f64)], compound: &str) -> f64 {
    pairs
        .iter()
        .find(|(c, _)| c == compound)
        .map(|(_, v)| *v)
        .unwrap_or(0.0)
}

/// Reference to a reaction set inside one simulation context.
///
/// The owning context is part of the identity, so references produced by different
/// cases never compare equal even when the engine reuses set identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactionSetRef {
    pub context: ContextId,
    pub id: String,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn irreversible_reaction_consumes_reactant_and_produces_product() {
        let rxn = ReactionDefinition::irreversible(
            "Rxn-1",
            "Water",
            "Ethanol",
            1.0,
            KineticParameters {
                forward_factor: 0.005,
                ..Default::default()
            },
        );
        assert_eq!(rxn.coefficient("Water"), -1.0);
        assert_eq!(rxn.coefficient("Ethanol"), 1.0);
        assert_eq!(rxn.forward_order("Water"), 1.0);
        assert_eq!(rxn.reverse_order("Water"), 0.0);
        assert_eq!(rxn.coefficient("Methanol"), 0.0);
        assert_eq!(rxn.base_compound, "Water");
        assert!(!rxn.has_custom_expressions());
    }

    #[test]
    fn blank_custom_expressions_are_ignored() {
        let mut rxn =
            ReactionDefinition::irreversible("R", "A", "B", 1.0, KineticParameters::default());
        rxn.forward_expression = Some("  ".to_string());
        assert!(!rxn.has_custom_expressions());
        rxn.reverse_expression = Some("k*C_A".to_string());
        assert!(rxn.has_custom_expressions());
    }
}
