//! EIP-1559 fee policy (spec §4.7): read suggested tip and base fee, floor
//! the priority fee at a per-network minimum, and derive `maxFeePerGas`
//! from whichever of three lower bounds is largest.

use alloy::primitives::U256;

const GWEI: u128 = 1_000_000_000;
/// Default Polygon Amoy minimum priority fee, used when the caller does not
/// override it via `MIN_PRIORITY_FEE_GWEI`.
pub const DEFAULT_MIN_PRIORITY_FEE_GWEI: u64 = 25;

#[derive(Debug, Clone, Copy)]
pub struct FeePolicyInput {
    pub suggested_priority_fee: U256,
    pub base_fee: U256,
    pub min_priority_fee_gwei: u64,
    /// `MIN_MAX_FEE_GWEI`, an absolute floor under which `maxFeePerGas`
    /// never submits regardless of current network conditions.
    pub min_max_fee_gwei: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Eip1559Fees {
    pub max_priority_fee_per_gas: U256,
    pub max_fee_per_gas: U256,
}

fn gwei(n: u64) -> U256 {
    U256::from(n as u128 * GWEI)
}

/// `priority := max(suggestedPriority, minPriorityFee)`;
/// `maxFeePerGas := max(2·baseFee + priority, 2·priority, envMin)`.
pub fn compute_fees(input: &FeePolicyInput) -> Eip1559Fees {
    let min_priority = gwei(input.min_priority_fee_gwei);
    let priority = input.suggested_priority_fee.max(min_priority);

    let from_base = input.base_fee.saturating_mul(U256::from(2)).saturating_add(priority);
    let from_priority = priority.saturating_mul(U256::from(2));
    let env_min = input.min_max_fee_gwei.map(gwei).unwrap_or(U256::ZERO);

    let max_fee = from_base.max(from_priority).max(env_min);

    Eip1559Fees {
        max_priority_fee_per_gas: priority,
        max_fee_per_gas: max_fee,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floors_priority_fee_at_the_configured_minimum() {
        let fees = compute_fees(&FeePolicyInput {
            suggested_priority_fee: gwei(1),
            base_fee: gwei(10),
            min_priority_fee_gwei: DEFAULT_MIN_PRIORITY_FEE_GWEI,
            min_max_fee_gwei: None,
        });
        assert_eq!(fees.max_priority_fee_per_gas, gwei(DEFAULT_MIN_PRIORITY_FEE_GWEI));
    }

    #[test]
    fn max_fee_is_driven_by_base_fee_when_it_dominates() {
        let fees = compute_fees(&FeePolicyInput {
            suggested_priority_fee: gwei(30),
            base_fee: gwei(100),
            min_priority_fee_gwei: 25,
            min_max_fee_gwei: None,
        });
        // 2*100 + 30 = 230 > 2*30 = 60
        assert_eq!(fees.max_fee_per_gas, gwei(230));
    }

    #[test]
    fn max_fee_respects_env_floor_when_network_is_quiet() {
        let fees = compute_fees(&FeePolicyInput {
            suggested_priority_fee: gwei(1),
            base_fee: gwei(1),
            min_priority_fee_gwei: 25,
            min_max_fee_gwei: Some(500),
        });
        assert_eq!(fees.max_fee_per_gas, gwei(500));
    }

    #[test]
    fn suggested_priority_above_minimum_is_used_directly() {
        let fees = compute_fees(&FeePolicyInput {
            suggested_priority_fee: gwei(40),
            base_fee: gwei(5),
            min_priority_fee_gwei: 25,
            min_max_fee_gwei: None,
        });
        assert_eq!(fees.max_priority_fee_per_gas, gwei(40));
    }
}
