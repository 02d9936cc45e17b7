//! The reference flowsheet model.
//!
//! Plug-flow reactors integrate power-law kinetics along the reactor volume at
//! constant temperature and pressure with an ideal-gas concentration basis. Shortcut columns handle
//! binary feeds with a constant relative volatility estimated from Clausius-Clapeyron
//! vapor pressures, Fenske minimum stages and Underwood minimum reflux.
//!
//! Every function here only reads the flowsheet and returns the property writes the
//! engine should apply, or a solver message when the unit cannot be computed.

use super::catalog::{self, Compound};
use super::{Flowsheet, ReactionRecord, ReactionSetRecord, UnitRecord};
use crate::core::models::ids::{ReactionId, UnitId};
use crate::core::models::property::{PropertyValue, names};
use crate::core::models::reaction::ReactionDefinition;
use crate::core::models::unit::UnitKind;
use slotmap::SlotMap;

/// J/(mol K)
const GAS_CONSTANT: f64 = 8.314_462_618;
/// Pa
const REFERENCE_PRESSURE: f64 = 101_325.0;
const INTEGRATION_STEPS: usize = 200;

/// The only reactor operation mode the model supports.
pub const MODE_ISOTHERMAL: i64 = 1;

#[derive(Debug, Clone, PartialEq)]
pub(super) struct PropertyWrite {
    pub unit: UnitId,
    pub property: &'static str,
    pub value: PropertyValue,
}

impl PropertyWrite {
    fn new(unit: UnitId, property: &'static str, value: impl Into<PropertyValue>) -> Self {
        Self {
            unit,
            property,
            value: value.into(),
        }
    }
}

pub(super) type SolveResult = Result<Vec<PropertyWrite>, String>;

#[derive(Debug, Default)]
struct Ports {
    material_in: Vec<UnitId>,
    material_out: Vec<UnitId>,
    energy_in: Vec<UnitId>,
    energy_out: Vec<UnitId>,
}

fn ports(flowsheet: &Flowsheet, units: &SlotMap<UnitId, UnitRecord>, unit: UnitId) -> Ports {
    let mut ports = Ports::default();
    for &(from, to) in &flowsheet.connections {
        let (peer, incoming) = if to == unit {
            (from, true)
        } else if from == unit {
            (to, false)
        } else {
            continue;
        };
        let Some(peer_kind) = units.get(peer).map(|u| u.kind) else {
            continue;
        };
        let bucket = match (peer_kind, incoming) {
            (UnitKind::MaterialStream, true) => &mut ports.material_in,
            (UnitKind::MaterialStream, false) => &mut ports.material_out,
            (UnitKind::EnergyStream, true) => &mut ports.energy_in,
            (UnitKind::EnergyStream, false) => &mut ports.energy_out,
            _ => continue,
        };
        bucket.push(peer);
    }
    ports
}

fn flowsheet_compounds(flowsheet: &Flowsheet) -> Result<Vec<&'static Compound>, String> {
    flowsheet
        .compounds
        .iter()
        .map(|name| catalog::compound(name).ok_or_else(|| format!("unknown compound '{}'", name)))
        .collect()
}

struct FeedState {
    temperature: f64,
    pressure: f64,
    molar_flow: f64,
    /// Normalized mole fractions, parallel to the flowsheet compound list.
    fractions: Vec<f64>,
    /// Set when the molar flow was derived from a mass flow.
    derived_molar_flow: bool,
}

fn feed_state(stream: &UnitRecord, compounds: &[&Compound]) -> Result<FeedState, String> {
    let tag = &stream.tag;
    let temperature = stream
        .number(names::TEMPERATURE)
        .filter(|t| *t > 0.0)
        .ok_or_else(|| format!("{}: temperature is not specified", tag))?;
    let pressure = stream
        .number(names::PRESSURE)
        .filter(|p| *p > 0.0)
        .ok_or_else(|| format!("{}: pressure is not specified", tag))?;
    let raw = stream
        .vector(names::COMPOSITION)
        .ok_or_else(|| format!("{}: composition is not specified", tag))?;
    if raw.len() != compounds.len() {
        return Err(format!(
            "{}: composition has {} entries for {} compounds",
            tag,
            raw.len(),
            compounds.len()
        ));
    }
    let total: f64 = raw.iter().sum();
    if total <= 0.0 || raw.iter().any(|x| *x < 0.0) {
        return Err(format!("{}: composition must be non-negative and non-zero", tag));
    }
    let fractions: Vec<f64> = raw.iter().map(|x| x / total).collect();

    let (molar_flow, derived_molar_flow) = match stream.number(names::MASS_FLOW) {
        Some(mass_flow) => {
            let molar_mass: f64 = fractions
                .iter()
                .zip(compounds)
                .map(|(x, c)| x * c.molar_mass)
                .sum();
            // kg/h -> mol/s
            (mass_flow / 3600.0 * 1000.0 / molar_mass, true)
        }
        None => (
            stream
                .number(names::MOLAR_FLOW)
                .ok_or_else(|| format!("{}: flow rate is not specified", tag))?,
            false,
        ),
    };
    if molar_flow < 0.0 {
        return Err(format!("{}: flow rate is negative", tag));
    }

    Ok(FeedState {
        temperature,
        pressure,
        molar_flow,
        fractions,
        derived_molar_flow,
    })
}

fn mass_flow_kg_per_h(flows: &[f64], compounds: &[&Compound]) -> f64 {
    flows
        .iter()
        .zip(compounds)
        .map(|(f, c)| f * c.molar_mass)
        .sum::<f64>()
        * 3600.0
        / 1000.0
}

fn stream_writes(
    stream: UnitId,
    temperature: f64,
    pressure: f64,
    flows: &[f64],
    compounds: &[&Compound],
) -> Vec<PropertyWrite> {
    let total: f64 = flows.iter().sum();
    let fractions: Vec<f64> = if total > 0.0 {
        flows.iter().map(|f| f / total).collect()
    } else {
        vec![0.0; flows.len()]
    };
    vec![
        PropertyWrite::new(stream, names::TEMPERATURE, temperature),
        PropertyWrite::new(stream, names::PRESSURE, pressure),
        PropertyWrite::new(stream, names::MOLAR_FLOW, total),
        PropertyWrite::new(stream, names::MASS_FLOW, mass_flow_kg_per_h(flows, compounds)),
        PropertyWrite::new(stream, names::COMPOSITION, fractions),
    ]
}

/// The set a reactor will draw its reactions from. Falls back to the first set in
/// the context when nothing has been bound.
pub(super) fn bound_reaction_set<'a>(
    reactor: &UnitRecord,
    sets: &'a [ReactionSetRecord],
) -> Option<&'a ReactionSetRecord> {
    for name in [names::REACTION_SET_INDEX, names::REACTION_SET_INDEX_COMPACT] {
        if let Some(index) = reactor.number(name) {
            return sets.get(index as usize);
        }
    }
    if let Some(id) = reactor.text(names::REACTION_SET_ID) {
        return sets.iter().find(|s| s.id == id);
    }
    match reactor.attributes.get(names::REACTION_SET_ATTRIBUTE) {
        Some(PropertyValue::Text(id)) => sets.iter().find(|s| s.id == *id),
        Some(value) => value.as_f64().and_then(|i| sets.get(i as usize)),
        None => sets.first(),
    }
}

fn per_compound(compound_names: &[String], f: impl Fn(&str) -> f64) -> Vec<f64> {
    compound_names.iter().map(|c| f(c)).collect()
}

struct Kinetics<'a> {
    definition: &'a ReactionDefinition,
    coefficients: Vec<f64>,
    forward_orders: Vec<f64>,
    reverse_orders: Vec<f64>,
}

impl<'a> Kinetics<'a> {
    fn new(definition: &'a ReactionDefinition, compound_names: &[String]) -> Self {
        Self {
            definition,
            coefficients: per_compound(compound_names, |c| definition.coefficient(c)),
            forward_orders: per_compound(compound_names, |c| definition.forward_order(c)),
            reverse_orders: per_compound(compound_names, |c| definition.reverse_order(c)),
        }
    }

    fn rate(&self, concentrations: &[f64], temperature: f64) -> f64 {
        let k = &self.definition.kinetics;
        let arrhenius = |factor: f64, energy: f64| {
            factor * (-energy / (GAS_CONSTANT * temperature)).exp()
        };
        let power_law = |orders: &[f64]| -> f64 {
            concentrations
                .iter()
                .zip(orders)
                .filter(|(_, order)| **order != 0.0)
                .map(|(c, order)| c.max(0.0).powf(*order))
                .product()
        };
        let forward = arrhenius(k.forward_factor, k.forward_activation_energy)
            * power_law(&self.forward_orders);
        let reverse = if k.reverse_factor != 0.0 {
            arrhenius(k.reverse_factor, k.reverse_activation_energy)
                * power_law(&self.reverse_orders)
        } else {
            0.0
        };
        forward - reverse
    }
}

fn flow_derivatives(
    flows: &[f64],
    kinetics: &[Kinetics<'_>],
    temperature: f64,
    pressure: f64,
) -> Vec<f64> {
    let total: f64 = flows.iter().sum();
    let mut derivatives = vec![0.0; flows.len()];
    if total <= 0.0 {
        return derivatives;
    }
    let total_concentration = pressure / (GAS_CONSTANT * temperature);
    let concentrations: Vec<f64> = flows
        .iter()
        .map(|f| f / total * total_concentration)
        .collect();
    for reaction in kinetics {
        let rate = reaction.rate(&concentrations, temperature);
        for (d, nu) in derivatives.iter_mut().zip(&reaction.coefficients) {
            *d += nu * rate;
        }
    }
    derivatives
}

fn integrate(
    inlet: &[f64],
    volume: f64,
    kinetics: &[Kinetics<'_>],
    temperature: f64,
    pressure: f64,
) -> Vec<f64> {
    let h = volume / INTEGRATION_STEPS as f64;
    let shifted = |base: &[f64], k: &[f64], scale: f64| -> Vec<f64> {
        base.iter().zip(k).map(|(b, d)| b + scale * d).collect()
    };
    let mut flows = inlet.to_vec();
    for _ in 0..INTEGRATION_STEPS {
        let k1 = flow_derivatives(&flows, kinetics, temperature, pressure);
        let k2 = flow_derivatives(&shifted(&flows, &k1, h / 2.0), kinetics, temperature, pressure);
        let k3 = flow_derivatives(&shifted(&flows, &k2, h / 2.0), kinetics, temperature, pressure);
        let k4 = flow_derivatives(&shifted(&flows, &k3, h), kinetics, temperature, pressure);
        for i in 0..flows.len() {
            flows[i] += h / 6.0 * (k1[i] + 2.0 * k2[i] + 2.0 * k3[i] + k4[i]);
            flows[i] = flows[i].max(0.0);
        }
    }
    flows
}

pub(super) fn solve_pfr(
    flowsheet: &Flowsheet,
    units: &SlotMap<UnitId, UnitRecord>,
    reactions: &SlotMap<ReactionId, ReactionRecord>,
    reactor_id: UnitId,
) -> SolveResult {
    let reactor = units
        .get(reactor_id)
        .ok_or_else(|| "reactor vanished from the flowsheet".to_string())?;
    let tag = &reactor.tag;
    let ports = ports(flowsheet, units, reactor_id);
    let inlet_id = *ports
        .material_in
        .first()
        .ok_or_else(|| format!("{}: no inlet stream connected", tag))?;
    let outlet_id = *ports
        .material_out
        .first()
        .ok_or_else(|| format!("{}: no outlet stream connected", tag))?;

    let compounds = flowsheet_compounds(flowsheet)?;
    let feed = feed_state(&units[inlet_id], &compounds)?;

    let volume = reactor
        .number(names::VOLUME)
        .filter(|v| *v > 0.0)
        .ok_or_else(|| format!("{}: reactor volume is not specified", tag))?;
    let mode = reactor
        .number(names::OPERATION_MODE)
        .map(|m| m as i64)
        .unwrap_or(MODE_ISOTHERMAL);
    if mode != MODE_ISOTHERMAL {
        return Err(format!("{}: unsupported operation mode {}", tag, mode));
    }

    let set = bound_reaction_set(reactor, &flowsheet.reaction_sets)
        .ok_or_else(|| format!("{}: no reaction set is associated with the reactor", tag))?;
    let mut members: Vec<_> = set.members.iter().filter(|m| m.enabled).collect();
    members.sort_by_key(|m| m.order);
    let mut kinetics = Vec::with_capacity(members.len());
    for member in members {
        let Some(record) = reactions.get(member.reaction) else {
            continue;
        };
        if record.definition.has_custom_expressions() {
            return Err(format!(
                "{}: reaction '{}' uses custom rate expressions, which are not supported",
                tag, record.definition.name
            ));
        }
        kinetics.push(Kinetics::new(&record.definition, &flowsheet.compounds));
    }

    let inlet_flows: Vec<f64> = feed.fractions.iter().map(|x| x * feed.molar_flow).collect();
    let outlet_flows = integrate(
        &inlet_flows,
        volume,
        &kinetics,
        feed.temperature,
        feed.pressure,
    );

    // kJ/mol * mol/s = kW
    let duty: f64 = outlet_flows
        .iter()
        .zip(&inlet_flows)
        .zip(&compounds)
        .map(|((out, inp), c)| (out - inp) * c.formation_enthalpy)
        .sum();

    let mut writes = stream_writes(
        outlet_id,
        feed.temperature,
        feed.pressure,
        &outlet_flows,
        &compounds,
    );
    if feed.derived_molar_flow {
        writes.push(PropertyWrite::new(inlet_id, names::MOLAR_FLOW, feed.molar_flow));
    }
    if let Some(&energy_id) = ports.energy_in.first() {
        writes.push(PropertyWrite::new(energy_id, names::ENERGY_FLOW, duty));
    }
    Ok(writes)
}

/// Clausius-Clapeyron vapor pressure relative to the normal boiling point.
fn vapor_pressure(compound: &Compound, temperature: f64) -> f64 {
    let exponent = -compound.vaporization_enthalpy * 1000.0 / GAS_CONSTANT
        * (1.0 / temperature - 1.0 / compound.normal_boiling_point);
    REFERENCE_PRESSURE * exponent.exp()
}

pub(super) fn relative_volatility(light: &Compound, heavy: &Compound, temperature: f64) -> f64 {
    vapor_pressure(light, temperature) / vapor_pressure(heavy, temperature)
}

pub(super) fn fenske_minimum_stages(alpha: f64, xd: f64, xb: f64) -> f64 {
    ((xd / (1.0 - xd)) * ((1.0 - xb) / xb)).ln() / alpha.ln()
}

/// Binary Underwood minimum reflux for a saturated-liquid feed.
pub(super) fn underwood_minimum_reflux(alpha: f64, xd: f64, zf: f64) -> f64 {
    (xd / zf - alpha * (1.0 - xd) / (1.0 - zf)) / (alpha - 1.0)
}

fn blend(x_light: f64, light: &Compound, heavy: &Compound, f: impl Fn(&Compound) -> f64) -> f64 {
    x_light * f(light) + (1.0 - x_light) * f(heavy)
}

fn key_index(flowsheet: &Flowsheet, column: &UnitRecord, property: &str, default: usize) -> Result<usize, String> {
    match column.text(property) {
        Some(name) => flowsheet
            .compounds
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| format!("{}: key compound '{}' is not in the flowsheet", column.tag, name)),
        None => Ok(default),
    }
}

pub(super) fn solve_column(
    flowsheet: &Flowsheet,
    units: &SlotMap<UnitId, UnitRecord>,
    column_id: UnitId,
) -> SolveResult {
    let column = units
        .get(column_id)
        .ok_or_else(|| "column vanished from the flowsheet".to_string())?;
    let tag = &column.tag;
    let ports = ports(flowsheet, units, column_id);
    let feed_id = *ports
        .material_in
        .first()
        .ok_or_else(|| format!("{}: no feed stream connected", tag))?;
    let (distillate_id, bottoms_id) = match ports.material_out.as_slice() {
        [distillate, bottoms, ..] => (*distillate, *bottoms),
        _ => return Err(format!("{}: distillate and bottoms streams must both be connected", tag)),
    };

    let compounds = flowsheet_compounds(flowsheet)?;
    if compounds.len() != 2 {
        return Err(format!(
            "{}: the shortcut model handles binary feeds only ({} compounds present)",
            tag,
            compounds.len()
        ));
    }
    let lk = key_index(flowsheet, column, names::LIGHT_KEY, 0)?;
    let hk = key_index(flowsheet, column, names::HEAVY_KEY, 1)?;
    if lk == hk {
        return Err(format!("{}: light and heavy keys must differ", tag));
    }

    let xd = column
        .number(names::LIGHT_KEY_FRACTION)
        .ok_or_else(|| format!("{}: light key mole fraction is not specified", tag))?;
    // The bottoms carry the heavy key at the distillate's light-key purity.
    let xb = 1.0 - xd;
    let reflux = column
        .number(names::REFLUX_RATIO)
        .ok_or_else(|| format!("{}: reflux ratio is not specified", tag))?;
    let stages = column
        .number(names::NUMBER_OF_STAGES)
        .ok_or_else(|| format!("{}: number of stages is not specified", tag))?;

    let feed = feed_state(&units[feed_id], &compounds)?;
    let zf = feed.fractions[lk];
    if !(0.0 < xb && xb < zf && zf < xd && xd < 1.0) {
        return Err(format!(
            "{}: key specifications are infeasible (bottoms {:.4}, feed {:.4}, distillate {:.4})",
            tag, xb, zf, xd
        ));
    }

    let alpha = relative_volatility(compounds[lk], compounds[hk], feed.temperature);
    if alpha <= 1.0 {
        return Err(format!(
            "{}: relative volatility {:.4} does not favor the light key",
            tag, alpha
        ));
    }
    let minimum_stages = fenske_minimum_stages(alpha, xd, xb);
    let minimum_reflux = underwood_minimum_reflux(alpha, xd, zf);
    if stages <= minimum_stages {
        return Err(format!(
            "{}: {} stages is below the minimum of {:.2}",
            tag, stages, minimum_stages
        ));
    }
    if reflux <= minimum_reflux {
        return Err(format!(
            "{}: reflux ratio {} is below the minimum of {:.4}",
            tag, reflux, minimum_reflux
        ));
    }

    let distillate_flow = feed.molar_flow * (zf - xb) / (xd - xb);
    let bottoms_flow = feed.molar_flow - distillate_flow;
    let (light, heavy) = (compounds[lk], compounds[hk]);
    let vapor_flow = (reflux + 1.0) * distillate_flow;
    let condenser_duty = -vapor_flow * blend(xd, light, heavy, |c| c.vaporization_enthalpy);
    let reboiler_duty = vapor_flow * blend(xb, light, heavy, |c| c.vaporization_enthalpy);
    // Product temperatures are approximated by mole-fraction-weighted boiling points.
    let distillate_temperature = blend(xd, light, heavy, |c| c.normal_boiling_point);
    let bottoms_temperature = blend(xb, light, heavy, |c| c.normal_boiling_point);
    let condenser_pressure = column.number(names::CONDENSER_PRESSURE).unwrap_or(feed.pressure);
    let reboiler_pressure = column.number(names::REBOILER_PRESSURE).unwrap_or(feed.pressure);

    let split = |x_light: f64, flow: f64| {
        let mut flows = vec![0.0; 2];
        flows[lk] = x_light * flow;
        flows[hk] = (1.0 - x_light) * flow;
        flows
    };

    let mut writes = vec![
        PropertyWrite::new(column_id, names::CONDENSER_DUTY, condenser_duty),
        PropertyWrite::new(column_id, names::REBOILER_DUTY, reboiler_duty),
    ];
    if feed.derived_molar_flow {
        writes.push(PropertyWrite::new(feed_id, names::MOLAR_FLOW, feed.molar_flow));
    }
    writes.extend(stream_writes(
        distillate_id,
        distillate_temperature,
        condenser_pressure,
        &split(xd, distillate_flow),
        &compounds,
    ));
    writes.extend(stream_writes(
        bottoms_id,
        bottoms_temperature,
        reboiler_pressure,
        &split(xb, bottoms_flow),
        &compounds,
    ));
    if let Some(&condenser_id) = ports.energy_out.first() {
        writes.push(PropertyWrite::new(condenser_id, names::ENERGY_FLOW, -condenser_duty));
    }
    if let Some(&reboiler_id) = ports.energy_in.first() {
        writes.push(PropertyWrite::new(reboiler_id, names::ENERGY_FLOW, reboiler_duty));
    }
    Ok(writes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ethanol_is_more_volatile_than_water() {
        let ethanol = catalog::compound("Ethanol").unwrap();
        let water = catalog::compound("Water").unwrap();
        let alpha = relative_volatility(ethanol, water, 350.0);
        assert!(alpha > 2.0 && alpha < 3.0, "alpha = {}", alpha);
    }

    #[test]
    fn vapor_pressure_equals_reference_at_boiling_point() {
        let water = catalog::compound("Water").unwrap();
        let p = vapor_pressure(water, water.normal_boiling_point);
        assert!((p - REFERENCE_PRESSURE).abs() < 1e-6);
    }

    #[test]
    fn fenske_is_symmetric_for_symmetric_splits() {
        let n = fenske_minimum_stages(2.0, 0.95, 0.05);
        let expected = (19.0_f64 * 19.0).ln() / 2.0_f64.ln();
        assert!((n - expected).abs() < 1e-9);
    }

    #[test]
    fn underwood_reflux_for_equimolar_feed() {
        let r = underwood_minimum_reflux(2.5, 0.95, 0.5);
        let expected = (1.9 - 2.5 * 0.1) / 1.5;
        assert!((r - expected).abs() < 1e-9);
    }
}
