//! Per-tick parameter accumulation

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

use crate::params::ControlParam;

/// Control parameter values for one tick
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ParameterMap(BTreeMap<ControlParam, f32>);

impl ParameterMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, param: ControlParam) -> Option<f32> {
        self.0.get(&param).copied()
    }

    pub fn insert(&mut self, param: ControlParam, value: f32) {
        self.0.insert(param, value);
    }

    pub fn remove(&mut self, param: ControlParam) -> Option<f32> {
        self.0.remove(&param)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ControlParam, f32)> + '_ {
        self.0.iter().map(|(k, v)| (*k, *v))
    }

    /// Copy every entry of `other` over this map
    pub fn merge(&mut self, other: &ParameterMap) {
        self.0.extend(other.iter());
    }
}

/// Accumulates computed values for the current tick and merges in live
/// overrides on flush.
///
/// Controls not written during a tick are published with their value from
/// the previous flush.
#[derive(Debug, Default)]
pub struct ParameterBus {
    /// Written this tick
    current: ParameterMap,
    /// Last computed values, republished when not rewritten
    held: ParameterMap,
    /// Manual slider overrides, win over computed values
    overrides: ParameterMap,
}

impl ParameterBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write a computed value for this tick.
    ///
    /// Non-finite values come from collapsed geometry and are dropped, so the
    /// control keeps its held value.
    pub fn set(&mut self, param: ControlParam, value: f32) {
        if !value.is_finite() {
            debug!("Dropping non-finite value for {}: {}", param, value);
            return;
        }
        self.current.insert(param, value);
    }

    pub fn set_override(&mut self, param: ControlParam, value: f32) {
        self.overrides.insert(param, value);
    }

    pub fn clear_override(&mut self, param: ControlParam) -> Option<f32> {
        self.overrides.remove(param)
    }

    /// Value last published from computation (without overrides)
    pub fn held(&self, param: ControlParam) -> Option<f32> {
        self.held.get(param)
    }

    /// Build this tick's map and reset for the next tick.
    pub fn flush(&mut self) -> ParameterMap {
        let current = std::mem::take(&mut self.current);
        self.held.merge(&current);

        let mut out = self.held.clone();
        out.merge(&self.overrides);
        out
    }
}
