use super::value::Scalar;
use std::fmt;

/// A named, ordered sequence of values swept by a study.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterAxis {
    name: String,
    values: Vec<Scalar>,
}

impl ParameterAxis {
    pub fn new<I, V>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Scalar>,
    {
        Self {
            name: name.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &[Scalar] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// One combination of axis values, keyed by axis name in axis order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParameterSet {
    entries: Vec<(String, Scalar)>,
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `name` to `value`, replacing an existing entry in place so insertion order
    /// is preserved.
    pub fn insert(&mut self, name: impl Into<String>, value: Scalar) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Scalar> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Scalar)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for ParameterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (name, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}={}", name, value)?;
        }
        Ok(())
    }
}

impl<K: Into<String>> FromIterator<(K, Scalar)> for ParameterSet {
    fn from_iter<T: IntoIterator<Item = (K, Scalar)>>(iter: T) -> Self {
        let mut set = ParameterSet::new();
        for (name, value) in iter {
            set.insert(name, value);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_replaces_in_place_and_keeps_order() {
        let mut set = ParameterSet::new();
        set.insert("Temperature_K", Scalar::Int(300));
        set.insert("Volume_m3", Scalar::Float(1.0));
        set.insert("Temperature_K", Scalar::Int(350));

        let names: Vec<_> = set.names().collect();
        assert_eq!(names, vec!["Temperature_K", "Volume_m3"]);
        assert_eq!(set.get("Temperature_K"), Some(&Scalar::Int(350)));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn display_lists_pairs_in_axis_order() {
        let set: ParameterSet = [
            ("RefluxRatio", Scalar::Float(1.5)),
            ("Stages", Scalar::Int(10)),
        ]
        .into_iter()
        .collect();
        assert_eq!(set.to_string(), "RefluxRatio=1.5, Stages=10");
    }

    #[test]
    fn axis_collects_heterogeneous_inputs() {
        let axis = ParameterAxis::new("Stages", [10, 15, 20]);
        assert_eq!(axis.len(), 3);
        assert_eq!(axis.values()[1], Scalar::Int(15));
        assert!(!axis.is_empty());
    }
}
