//! Configuration loading unit tests
//!
//! Only this test touches the process environment.

use secrecy::ExposeSecret;

use solswap::config::{AppConfig, PriorityFeeMode};
use solswap::constants::DEFAULT_RPC_ENDPOINT;

#[test]
fn test_flat_environment_surface() {
    let vars = [
        ("PRIVATE_KEY", "4wBqpZM9xaSheZzJSMawUHDgZ7miWfSsxmfVF5jJpYP"),
        ("FEE_RECIPIENT", "9xQeWvG816bUx9EPjHmaT23yvVM2ZWbrrpZb9PusVFin"),
        ("FEE_BASIS_POINTS", "20"),
        ("RPC_ENDPOINT", "https://rpc.example.com"),
        ("PRIORITY_FEE_MODE", "DYNAMIC"),
        ("FIXED_PRIORITY_FEE_MICRO_LAMPORTS", "1234"),
        ("DYNAMIC_PRIORITY_FEE_MULTIPLIER", "1.5"),
        ("MAX_PRIORITY_FEE_MICRO_LAMPORTS", "99999"),
        ("SOLSWAP_SLIPPAGE__BASE_BPS", "75"),
    ];
    for (key, value) in vars {
        std::env::set_var(key, value);
    }

    let config = AppConfig::load().unwrap();

    for (key, _) in vars {
        std::env::remove_var(key);
    }

    assert_eq!(
        config.wallet.private_key.as_ref().unwrap().expose_secret().as_str(),
        "4wBqpZM9xaSheZzJSMawUHDgZ7miWfSsxmfVF5jJpYP"
    );
    assert_eq!(
        config.wallet.fee_recipient.as_deref(),
        Some("9xQeWvG816bUx9EPjHmaT23yvVM2ZWbrrpZb9PusVFin")
    );
    assert_eq!(config.wallet.fee_basis_points, 20);
    assert_eq!(config.rpc.endpoint, "https://rpc.example.com");
    assert_eq!(config.priority_fee.mode, PriorityFeeMode::Dynamic);
    assert_eq!(config.priority_fee.fixed_micro_lamports, 1_234);
    assert!((config.priority_fee.dynamic_multiplier - 1.5).abs() < f64::EPSILON);
    assert_eq!(config.priority_fee.max_micro_lamports, 99_999);
    assert_eq!(config.slippage.base_bps, 75);
    assert!(config.validate().is_ok());

    let defaults = AppConfig::load().unwrap();
    assert_eq!(defaults.rpc.endpoint, DEFAULT_RPC_ENDPOINT);
    assert!(defaults.wallet.private_key.is_none());
}
