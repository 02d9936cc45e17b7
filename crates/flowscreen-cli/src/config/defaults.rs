use std::path::PathBuf;

pub struct ReactorDefaults {
    pub case_type: String,
    pub reactant: String,
    pub product: String,
    pub temperatures: Vec<f64>,
    pub volumes: Vec<f64>,
    pub feed_temperature: f64,
    pub feed_pressure: f64,
    pub feed_mass_flow: f64,
    pub feed_composition: Vec<f64>,
    pub reaction_order: f64,
    pub pre_exponential_factor: f64,
    pub activation_energy: f64,
    pub operation_mode: i64,
}

pub struct DistillationDefaults {
    pub case_type: String,
    pub light_key: String,
    pub heavy_key: String,
    pub reflux_ratios: Vec<f64>,
    pub stages: Vec<i64>,
    pub feed_temperature: f64,
    pub feed_pressure: f64,
    pub feed_mass_flow: f64,
    pub feed_composition: Vec<f64>,
    pub condenser_pressure: f64,
    pub reboiler_pressure: f64,
    pub light_key_fraction: f64,
}

pub struct DefaultsConfig {
    pub backend: String,
    pub output_path: PathBuf,
    pub reactor: ReactorDefaults,
    pub distillation: DistillationDefaults,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            backend: "reference".to_string(),
            output_path: PathBuf::from("results.csv"),
            reactor: ReactorDefaults {
                case_type: "PFR_Sweep".to_string(),
                reactant: "Water".to_string(),
                product: "Ethanol".to_string(),
                temperatures: vec![300.0, 325.0, 350.0],
                volumes: vec![1.0, 2.0, 3.0],
                feed_temperature: 300.0,
                feed_pressure: 101_325.0,
                feed_mass_flow: 3600.0,
                feed_composition: vec![1.0, 0.0],
                reaction_order: 1.0,
                pre_exponential_factor: 0.005,
                activation_energy: 0.0,
                operation_mode: 1,
            },
            distillation: DistillationDefaults {
                case_type: "Distillation_Sweep".to_string(),
                light_key: "Ethanol".to_string(),
                heavy_key: "Water".to_string(),
                reflux_ratios: vec![1.5, 2.0, 3.0],
                stages: vec![10, 15, 20],
                feed_temperature: 350.0,
                feed_pressure: 101_325.0,
                feed_mass_flow: 5000.0,
                feed_composition: vec![0.5, 0.5],
                condenser_pressure: 101_325.0,
                reboiler_pressure: 101_325.0,
                light_key_fraction: 0.95,
            },
        }
    }
}
