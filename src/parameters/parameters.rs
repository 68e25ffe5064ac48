//! Ordered parameter collection
//!
//! [`ParameterSet`] keeps parameters in insertion order, so the flat vector
//! of free values handed to the optimizer always has the same layout for a
//! given set.

use serde::{Deserialize, Serialize};

use crate::parameters::bounds::{Bounds, BoundsError};
use crate::parameters::link::Link;
use crate::parameters::parameter::{Parameter, ParameterError};

/// A named, ordered collection of parameters with link resolution.
///
/// Serializes as the list of its parameters. Deserializing rebuilds the set
/// through [`ParameterSet::add`], so a snapshot with duplicate names or
/// dangling links is rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<Parameter>", into = "Vec<Parameter>")]
pub struct ParameterSet {
    params: Vec<Parameter>,
}

impl ParameterSet {
    /// Create a new empty set
    ///
    /// # Examples
    ///
    /// ```
    /// use hydiff_rs::parameters::{Link, ParameterSet};
    ///
    /// let mut params = ParameterSet::new();
    /// params.add_free("log10_dx", -12.0).unwrap();
    /// params.add_linked("log10_dy", Link::offset("log10_dx", -1.0)).unwrap();
    /// assert_eq!(params.value("log10_dy").unwrap(), -13.0);
    /// assert_eq!(params.free_count(), 1);
    /// ```
    pub fn new() -> Self {
        Self { params: Vec::new() }
    }

    /// Add a parameter. Names must be unique, and a link must point at an
    /// existing parameter that is not itself linked.
    pub fn add(&mut self, param: Parameter) -> Result<(), ParameterError> {
        if self.contains(param.name()) {
            return Err(ParameterError::DuplicateName {
                name: param.name().to_string(),
            });
        }

        if let Some(link) = param.link() {
            let target_ok = self
                .get(link.reference())
                .map(|target| !target.is_linked())
                .unwrap_or(false);
            if !target_ok {
                return Err(ParameterError::InvalidLinkTarget {
                    name: param.name().to_string(),
                    reference: link.reference().to_string(),
                });
            }
        }

        self.params.push(param);
        self.update_links();
        Ok(())
    }

    /// Build a set from parameters in order, with the checks of [`add`](Self::add).
    /// Free and fixed values must also lie inside their bounds.
    pub fn from_parameters(params: Vec<Parameter>) -> Result<Self, ParameterError> {
        let mut set = Self::new();
        for param in params {
            let bounds = param.bounds();
            if !param.is_linked() && !bounds.is_within_bounds(param.value()) {
                return Err(BoundsError::ValueOutsideBounds {
                    value: param.value(),
                    min: bounds.min,
                    max: bounds.max,
                }
                .into());
            }
            set.add(param)?;
        }
        Ok(set)
    }

    pub fn add_free(&mut self, name: &str, value: f64) -> Result<(), ParameterError> {
        self.add(Parameter::free(name, value))
    }

    pub fn add_fixed(&mut self, name: &str, value: f64) -> Result<(), ParameterError> {
        self.add(Parameter::fixed(name, value))
    }

    pub fn add_linked(&mut self, name: &str, link: Link) -> Result<(), ParameterError> {
        self.add(Parameter::linked(name, f64::NAN, link))
    }

    pub fn get(&self, name: &str) -> Option<&Parameter> {
        self.params.iter().find(|p| p.name() == name)
    }

    fn get_mut(&mut self, name: &str) -> Result<&mut Parameter, ParameterError> {
        self.params
            .iter_mut()
            .find(|p| p.name() == name)
            .ok_or_else(|| ParameterError::ParameterNotFound {
                name: name.to_string(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Effective value of a parameter (derived value for linked ones).
    pub fn value(&self, name: &str) -> Result<f64, ParameterError> {
        self.get(name)
            .map(Parameter::value)
            .ok_or_else(|| ParameterError::ParameterNotFound {
                name: name.to_string(),
            })
    }

    /// Standard error from the last fit, if any.
    pub fn stderr(&self, name: &str) -> Result<Option<f64>, ParameterError> {
        self.get(name)
            .map(|p| p.stderr)
            .ok_or_else(|| ParameterError::ParameterNotFound {
                name: name.to_string(),
            })
    }

    /// Set a free or fixed parameter and re-derive linked values.
    pub fn set_value(&mut self, name: &str, value: f64) -> Result<(), ParameterError> {
        self.get_mut(name)?.set_value(value)?;
        self.update_links();
        Ok(())
    }

    pub fn set_vary(&mut self, name: &str, vary: bool) -> Result<(), ParameterError> {
        self.get_mut(name)?.set_vary(vary);
        Ok(())
    }

    pub fn set_bounds(&mut self, name: &str, bounds: Bounds) -> Result<(), ParameterError> {
        let param = self.get_mut(name)?;
        *param = param.clone().with_bounds(bounds);
        self.update_links();
        Ok(())
    }

    pub(crate) fn set_stderr(&mut self, name: &str, stderr: Option<f64>) -> Result<(), ParameterError> {
        self.get_mut(name)?.stderr = stderr;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.params.iter()
    }

    pub fn names(&self) -> Vec<String> {
        self.params.iter().map(|p| p.name().to_string()).collect()
    }

    /// Names of the free parameters, in optimizer order.
    pub fn free_names(&self) -> Vec<String> {
        self.params
            .iter()
            .filter(|p| p.is_free())
            .map(|p| p.name().to_string())
            .collect()
    }

    pub fn free_count(&self) -> usize {
        self.params.iter().filter(|p| p.is_free()).count()
    }

    /// Free values in the optimizer's unbounded space.
    pub fn free_internal_values(&self) -> Result<Vec<f64>, ParameterError> {
        self.params
            .iter()
            .filter(|p| p.is_free())
            .map(Parameter::internal_value)
            .collect()
    }

    /// Overwrite the free values from the optimizer's unbounded space and
    /// re-derive linked values.
    pub fn set_free_internal_values(&mut self, values: &[f64]) -> Result<(), ParameterError> {
        let expected = self.free_count();
        if values.len() != expected {
            return Err(ParameterError::FreeCountMismatch {
                expected,
                found: values.len(),
            });
        }

        for (param, &internal) in self
            .params
            .iter_mut()
            .filter(|p| p.is_free())
            .zip(values.iter())
        {
            param.set_internal_value(internal);
        }

        self.update_links();
        Ok(())
    }

    /// d(external)/d(internal) of each free parameter at its current value.
    pub(crate) fn free_derivatives(&self) -> Result<Vec<f64>, ParameterError> {
        self.params
            .iter()
            .filter(|p| p.is_free())
            .map(|p| {
                let internal = p.internal_value()?;
                Ok(crate::parameters::BoundsTransform::new(p.bounds()).derivative(internal))
            })
            .collect()
    }

    /// Recompute every linked parameter from its reference.
    ///
    /// Links never point at other links, so one pass suffices.
    pub fn update_links(&mut self) {
        let derived: Vec<(usize, f64)> = self
            .params
            .iter()
            .enumerate()
            .filter_map(|(idx, p)| {
                let link = p.link()?;
                let reference = self.get(link.reference())?;
                Some((idx, link.apply(reference.value())))
            })
            .collect();

        for (idx, value) in derived {
            self.params[idx].set_derived_value(value);
        }
    }

    /// Serialize the set to a JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Load a set from a JSON string, re-deriving linked values.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl TryFrom<Vec<Parameter>> for ParameterSet {
    type Error = ParameterError;

    fn try_from(params: Vec<Parameter>) -> Result<Self, Self::Error> {
        Self::from_parameters(params)
    }
}

impl From<ParameterSet> for Vec<Parameter> {
    fn from(set: ParameterSet) -> Self {
        set.params
    }
}
