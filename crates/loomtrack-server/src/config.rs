// SPDX-License-Identifier: Apache-2.0

use serde::Serialize;

pub const CONFIG_SCHEMA_VERSION: &str = "1";

#[derive(Debug, Clone, Serialize)]
pub struct ApiConfig {
    pub max_body_bytes: usize,
    pub default_transaction_limit: usize,
    pub max_transaction_limit: usize,
    pub recent_transactions_limit: usize,
    pub dashboard_recent_limit: usize,
    pub default_min_stock_level: i64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 16 * 1024,
            default_transaction_limit: 50,
            max_transaction_limit: 500,
            recent_transactions_limit: 10,
            dashboard_recent_limit: 10,
            default_min_stock_level: 10,
        }
    }
}

pub fn validate_startup_config_contract(api: &ApiConfig) -> Result<(), String> {
    if api.max_body_bytes == 0 {
        return Err("max_body_bytes must be > 0".to_string());
    }
    if api.default_transaction_limit == 0 || api.max_transaction_limit == 0 {
        return Err("transaction limits must be > 0".to_string());
    }
    if api.default_transaction_limit > api.max_transaction_limit {
        return Err("default transaction limit must not exceed the max".to_string());
    }
    if api.recent_transactions_limit == 0 || api.dashboard_recent_limit == 0 {
        return Err("recent-transaction limits must be > 0".to_string());
    }
    if api.default_min_stock_level < 0 {
        return Err("default_min_stock_level must not be negative".to_string());
    }
    Ok(())
}
