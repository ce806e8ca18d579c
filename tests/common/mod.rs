//! Common test utilities and helpers

#![allow(dead_code)] // Test utilities may not all be used in every test file

pub mod builders;
pub mod mock_helpers;

use lumenbind::Value;

/// Assert two floats are approximately equal
pub fn assert_float_eq(a: f64, b: f64, epsilon: f64) {
    assert!(
        (a - b).abs() < epsilon,
        "Expected {} to be approximately equal to {} (epsilon: {})",
        a,
        b,
        epsilon
    );
}

/// Assert a resolved value is a float close to `expected`
pub fn assert_value_float(value: &Value, expected: f64) {
    match value {
        Value::Float(v) => assert_float_eq(*v, expected, 1e-9),
        other => panic!("Expected a float value, got {:?}", other),
    }
}
