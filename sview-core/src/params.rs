//! Observed parameters shared between widgets and application settings.
//!
//! A parameter is created once (usually inside an `Arc`) and handed to every
//! control that shows or edits it. Changing the value emits `on_changed`
//! exactly once per effective change; setting the current value again is
//! silent.

use crate::signal::Signal;
use parking_lot::Mutex;

/// Generic observed value.
pub struct Param<T> {
    value: Mutex<T>,
    pub on_changed: Signal<T>,
}

pub type BoolParam = Param<bool>;
pub type Int32Param = Param<i32>;

impl<T: Copy + PartialEq> Param<T> {
    pub fn new(value: T) -> Self {
        Self {
            value: Mutex::new(value),
            on_changed: Signal::new(),
        }
    }

    pub fn value(&self) -> T {
        *self.value.lock()
    }

    /// Store a new value. Returns true if it differed from the old one.
    pub fn set_value(&self, value: T) -> bool {
        {
            let mut current = self.value.lock();
            if *current == value {
                return false;
            }
            *current = value;
        }
        self.on_changed.emit(&value);
        true
    }
}

impl Param<bool> {
    /// Flip the flag and return the new value.
    pub fn reverse(&self) -> bool {
        let value = !self.value();
        self.set_value(value);
        value
    }
}

impl<T: Copy + PartialEq + std::fmt::Debug> std::fmt::Debug for Param<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Param").field("value", &self.value()).finish()
    }
}

/// Float parameter clamped into [min, max] with a comparison tolerance.
pub struct Float32Param {
    inner: Param<f32>,
    min: f32,
    max: f32,
    default: f32,
    step: f32,
    tolerance: f32,
}

impl Float32Param {
    pub fn new(value: f32, min: f32, max: f32, default: f32, step: f32) -> Self {
        Self::with_tolerance(value, min, max, default, step, 0.0001)
    }

    pub fn with_tolerance(value: f32, min: f32, max: f32, default: f32, step: f32, tolerance: f32) -> Self {
        Self {
            inner: Param::new(value),
            min,
            max,
            default,
            step,
            tolerance,
        }
    }

    /// Unbounded parameter with unit step.
    pub fn unbounded(value: f32) -> Self {
        Self::new(value, -1e37, 1e37, 0.0, 1.0)
    }

    pub fn value(&self) -> f32 {
        self.inner.value()
    }

    pub fn on_changed(&self) -> &Signal<f32> {
        &self.inner.on_changed
    }

    pub fn min_value(&self) -> f32 {
        self.min
    }

    pub fn max_value(&self) -> f32 {
        self.max
    }

    pub fn default_value(&self) -> f32 {
        self.default
    }

    pub fn step(&self) -> f32 {
        self.step
    }

    pub fn are_equal(&self, a: f32, b: f32) -> bool {
        (a - b).abs() <= self.tolerance
    }

    pub fn is_default_value(&self) -> bool {
        self.are_equal(self.value(), self.default)
    }

    pub fn is_max_value(&self) -> bool {
        self.are_equal(self.value(), self.max)
    }

    pub fn is_min_value(&self) -> bool {
        self.are_equal(self.value(), self.min)
    }

    /// Clamp, snap to the default within tolerance, then store.
    pub fn set_value(&self, value: f32) -> bool {
        let value = if value + self.tolerance > self.max {
            self.max
        } else if value - self.tolerance < self.min {
            self.min
        } else if self.are_equal(value, self.default) {
            self.default
        } else {
            value
        };
        self.inner.set_value(value)
    }

    pub fn reset(&self) -> bool {
        self.set_value(self.default)
    }

    pub fn increment(&self) -> bool {
        self.set_value(self.value() + self.step)
    }

    pub fn decrement(&self) -> bool {
        self.set_value(self.value() - self.step)
    }
}

/// Integer parameter restricted to a list of named values.
pub struct EnumParam {
    inner: Param<i32>,
    names: Vec<String>,
}

impl EnumParam {
    pub fn new(value: i32, names: Vec<String>) -> Self {
        Self {
            inner: Param::new(value),
            names,
        }
    }

    pub fn value(&self) -> i32 {
        self.inner.value()
    }

    pub fn on_changed(&self) -> &Signal<i32> {
        &self.inner.on_changed
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Name of the current value, if it is inside the list.
    pub fn value_name(&self) -> Option<&str> {
        usize::try_from(self.value())
            .ok()
            .and_then(|i| self.names.get(i))
            .map(String::as_str)
    }

    /// Values outside the list are rejected.
    pub fn set_value(&self, value: i32) -> bool {
        match usize::try_from(value) {
            Ok(index) if index < self.names.len() => self.inner.set_value(value),
            _ => {
                tracing::debug!("EnumParam: value {} out of range 0..{}", value, self.names.len());
                false
            }
        }
    }

    pub fn set_by_name(&self, name: &str) -> bool {
        match self.names.iter().position(|n| n == name) {
            Some(index) => self.inner.set_value(index as i32),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_change_emits_once() {
        let param = Int32Param::new(0);
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_slot = calls.clone();
        param.on_changed.connect(move |_| {
            calls_slot.fetch_add(1, Ordering::SeqCst);
        });

        assert!(param.set_value(5));
        assert!(!param.set_value(5));
        assert_eq!(param.value(), 5);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_bool_reverse() {
        let param = BoolParam::new(false);
        assert!(param.reverse());
        assert!(!param.reverse());
    }

    #[test]
    fn test_float_clamping() {
        let param = Float32Param::new(0.0, -1.0, 1.0, 0.0, 0.5);
        param.set_value(10.0);
        assert!(param.is_max_value());
        param.set_value(-10.0);
        assert!(param.is_min_value());
        param.set_value(0.00005);
        assert!(param.is_default_value());
        assert_eq!(param.value(), 0.0);
        param.increment();
        assert_eq!(param.value(), 0.5);
    }

    #[test]
    fn test_enum_range() {
        let param = EnumParam::new(0, vec!["flat".into(), "sphere".into()]);
        assert!(param.set_value(1));
        assert_eq!(param.value_name(), Some("sphere"));
        assert!(!param.set_value(2));
        assert!(param.set_by_name("flat"));
        assert_eq!(param.value(), 0);
    }
}
