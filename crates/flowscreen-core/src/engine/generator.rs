use crate::core::models::parameters::{ParameterAxis, ParameterSet};

/// Expands an ordered list of axes into the cartesian product of their values.
///
/// The first axis is the outermost loop and varies slowest. Generation is lazy and can
/// be restarted any number of times with [`CaseGenerator::iter`]; each pass yields the
/// same sets in the same order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CaseGenerator {
    axes: Vec<ParameterAxis>,
}

impl CaseGenerator {
    pub fn new(axes: Vec<ParameterAxis>) -> Self {
        Self { axes }
    }

    pub fn axes(&self) -> &[ParameterAxis] {
        &self.axes
    }

    /// The number of cases: the product of the axis lengths, which is one for an empty
    /// axis list and zero when any axis has no values.
    pub fn len(&self) -> usize {
        self.axes.iter().map(ParameterAxis::len).product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> Cases<'_> {
        Cases {
            axes: &self.axes,
            indices: vec![0; self.axes.len()],
            remaining: self.len(),
        }
    }
}

impl<'a> IntoIterator for &'a CaseGenerator {
    type Item = ParameterSet;
    type IntoIter = Cases<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Odometer over the axes of a [`CaseGenerator`].
#[derive(Debug, Clone)]
pub struct Cases<'a> {
    axes: &'a [ParameterAxis],
    indices: Vec<usize>,
    remaining: usize,
}

impl Iterator for Cases<'_> {
    type Item = ParameterSet;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let set = self
            .axes
            .iter()
            .zip(&self.indices)
            .map(|(axis, &i)| (axis.name(), axis.values()[i].clone()))
            .collect();

        for (position, axis) in self.axes.iter().enumerate().rev() {
            self.indices[position] += 1;
            if self.indices[position] < axis.len() {
                break;
            }
            self.indices[position] = 0;
        }
        self.remaining -= 1;
        Some(set)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Cases<'_> {}
