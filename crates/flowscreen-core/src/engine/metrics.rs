use crate::adapter::PropertyAccess;
use crate::adapter::error::EngineError;
use crate::core::models::property::names;
use crate::core::models::unit::UnitHandle;
use tracing::warn;

pub const CONVERSION: &str = "Conversion";
pub const OUTLET_TEMPERATURE: &str = "OutletTemperature_K";
pub const HEAT_DUTY: &str = "HeatDuty_kW";
pub const DISTILLATE_PURITY: &str = "DistillatePurity";
pub const CONDENSER_DUTY: &str = "CondenserDuty_kW";
pub const REBOILER_DUTY: &str = "ReboilerDuty_kW";

/// Column name for the outlet flow of `product`.
pub fn outlet_flow(product: &str) -> String {
    format!("OutletFlow_{}_mol_s", product)
}

/// Fractional consumption of a reactant, defined as zero when nothing flows in.
pub fn conversion(inlet: f64, outlet: f64) -> f64 {
    if inlet <= 0.0 {
        0.0
    } else {
        (inlet - outlet) / inlet
    }
}

pub fn read_number<P: PropertyAccess + ?Sized>(
    engine: &P,
    unit: &UnitHandle,
    property: &str,
) -> Result<f64, EngineError> {
    let value = engine.get_property(unit, property)?;
    value.as_f64().ok_or_else(|| EngineError::InvalidValue {
        unit: unit.tag().to_string(),
        property: property.to_string(),
        expected: "number",
        found: value.kind_name(),
    })
}

/// Mole fraction of the compound at `index` in the stream's overall composition.
pub fn composition_fraction<P: PropertyAccess + ?Sized>(
    engine: &P,
    stream: &UnitHandle,
    index: usize,
) -> Result<f64, EngineError> {
    let value = engine.get_property(stream, names::COMPOSITION)?;
    let invalid = |expected: &'static str| EngineError::InvalidValue {
        unit: stream.tag().to_string(),
        property: names::COMPOSITION.to_string(),
        expected,
        found: value.kind_name(),
    };
    let fractions = value.as_vector().ok_or_else(|| invalid("vector"))?;
    fractions
        .get(index)
        .copied()
        .ok_or_else(|| invalid("an entry for every study compound"))
}

/// Molar flow of one compound: total molar flow times its mole fraction.
pub fn component_flow<P: PropertyAccess + ?Sized>(
    engine: &P,
    stream: &UnitHandle,
    index: usize,
) -> Result<f64, EngineError> {
    let total = read_number(engine, stream, names::MOLAR_FLOW)?;
    Ok(total * composition_fraction(engine, stream, index)?)
}

/// Ordered metric values for one case. A metric that cannot be read is recorded as
/// `0.0` and logged; it never affects the other metrics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricSheet {
    values: Vec<(String, f64)>,
    placeholders: usize,
}

impl MetricSheet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, name: impl Into<String>, reading: Result<f64, EngineError>) {
        let name = name.into();
        let value = match reading {
            Ok(value) => value,
            Err(e) => {
                warn!(metric = %name, error = %e, "Metric unavailable, recording 0.0");
                self.placeholders += 1;
                0.0
            }
        };
        self.values.push((name, value));
    }

    pub fn placeholders(&self) -> usize {
        self.placeholders
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn into_values(self) -> Vec<(String, f64)> {
        self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversion_is_zero_without_inlet_flow() {
        assert_eq!(conversion(0.0, 0.0), 0.0);
        assert_eq!(conversion(-1.0, 0.0), 0.0);
    }

    #[test]
    fn conversion_is_fraction_consumed() {
        assert!((conversion(10.0, 4.0) - 0.6).abs() < 1e-9);
        assert!((conversion(10.0, 10.0)).abs() < 1e-9);
    }

    #[test]
    fn failed_reading_becomes_placeholder_without_touching_others() {
        let mut sheet = MetricSheet::new();
        sheet.record("Conversion", Ok(0.25));
        sheet.record("HeatDuty_kW", Err(EngineError::ContextNotFound));
        sheet.record("OutletTemperature_K", Ok(300.0));
        assert_eq!(sheet.placeholders(), 1);
        assert_eq!(
            sheet.into_values(),
            vec![
                ("Conversion".to_string(), 0.25),
                ("HeatDuty_kW".to_string(), 0.0),
                ("OutletTemperature_K".to_string(), 300.0),
            ]
        );
    }
}
