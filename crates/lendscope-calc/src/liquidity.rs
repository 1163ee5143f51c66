use serde::{Deserialize, Serialize};

use crate::error::CalcError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LiquidityAction {
    Deposit,
    Borrow,
    Repay,
    Withdraw,
}

/// Current state of a reserve's liquidity, in USD.
#[derive(Debug, Clone, Copy)]
pub struct ReserveLiquidity {
    pub borrowed_usd: f64,
    pub available_usd: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct LiquidityScenario {
    pub action: LiquidityAction,
    pub amount_usd: f64,
}

/// Two-slope interest-rate curve parameters, all as fractions (0.04 = 4%).
#[derive(Debug, Clone, Copy)]
pub struct InterestRateParams {
    pub optimal_utilization: f64,
    pub base_rate: f64,
    pub slope1: f64,
    pub slope2: f64,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct LiquidityImpact {
    pub current_utilization: f64,
    pub new_utilization: f64,
    pub utilization_delta: f64,
    pub current_supply_apr: f64,
    pub current_borrow_apr: f64,
    pub new_supply_apr: f64,
    pub new_borrow_apr: f64,
    pub supply_apr_delta: f64,
    pub borrow_apr_delta: f64,
}

/// Simulate the utilization and rate impact of a hypothetical action against
/// a reserve.
pub fn calculate_liquidity_impact(
    current: &ReserveLiquidity,
    scenario: &LiquidityScenario,
    params: &InterestRateParams,
) -> Result<LiquidityImpact, CalcError> {
    if scenario.amount_usd < 0.0 || !scenario.amount_usd.is_finite() {
        return Err(CalcError::InvalidData(
            "Scenario amount must be non-negative".to_string(),
        ));
    }
    if current.borrowed_usd < 0.0 || current.available_usd < 0.0 {
        return Err(CalcError::InvalidData(
            "Reserve liquidity cannot be negative".to_string(),
        ));
    }

    let amount = scenario.amount_usd;
    let (mut borrowed, mut available) = (current.borrowed_usd, current.available_usd);
    match scenario.action {
        LiquidityAction::Deposit => available += amount,
        LiquidityAction::Withdraw => available -= amount,
        LiquidityAction::Borrow => {
            borrowed += amount;
            available -= amount;
        }
        LiquidityAction::Repay => {
            borrowed -= amount;
            available += amount;
        }
    }
    // Oversized scenarios clamp instead of going negative.
    borrowed = borrowed.max(0.0);
    available = available.max(0.0);

    let current_utilization = utilization(current.borrowed_usd, current.available_usd);
    let new_utilization = utilization(borrowed, available);

    let current_borrow_apr = borrow_rate(current_utilization, params);
    let new_borrow_apr = borrow_rate(new_utilization, params);
    let current_supply_apr = current_borrow_apr * current_utilization;
    let new_supply_apr = new_borrow_apr * new_utilization;

    Ok(LiquidityImpact {
        current_utilization,
        new_utilization,
        utilization_delta: new_utilization - current_utilization,
        current_supply_apr,
        current_borrow_apr,
        new_supply_apr,
        new_borrow_apr,
        supply_apr_delta: new_supply_apr - current_supply_apr,
        borrow_apr_delta: new_borrow_apr - current_borrow_apr,
    })
}

fn utilization(borrowed: f64, available: f64) -> f64 {
    let total = borrowed + available;
    if total > 0.0 { borrowed / total } else { 0.0 }
}

/// Two-slope rate model: linear up to the optimal utilization, steeper above.
/// No reserve factor is modeled, so supply APR is borrow rate scaled by
/// utilization.
fn borrow_rate(utilization: f64, params: &InterestRateParams) -> f64 {
    let optimal = params.optimal_utilization;
    if optimal <= 0.0 || optimal >= 1.0 {
        return params.base_rate;
    }

    if utilization <= optimal {
        params.base_rate + params.slope1 * (utilization / optimal)
    } else {
        params.base_rate + params.slope1 + params.slope2 * ((utilization - optimal) / (1.0 - optimal))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PARAMS: InterestRateParams = InterestRateParams {
        optimal_utilization: 0.8,
        base_rate: 0.0,
        slope1: 0.04,
        slope2: 0.6,
    };

    fn half_used() -> ReserveLiquidity {
        ReserveLiquidity {
            borrowed_usd: 50.0,
            available_usd: 50.0,
        }
    }

    #[test]
    fn deposit_strictly_decreases_utilization() {
        let impact = calculate_liquidity_impact(
            &half_used(),
            &LiquidityScenario {
                action: LiquidityAction::Deposit,
                amount_usd: 10.0,
            },
            &PARAMS,
        )
        .unwrap();
        assert!(impact.new_utilization < impact.current_utilization);
        assert!(impact.utilization_delta < 0.0);
        assert!((impact.new_utilization - 50.0 / 110.0).abs() < 1e-12);
    }

    #[test]
    fn borrow_strictly_increases_utilization() {
        let impact = calculate_liquidity_impact(
            &half_used(),
            &LiquidityScenario {
                action: LiquidityAction::Borrow,
                amount_usd: 10.0,
            },
            &PARAMS,
        )
        .unwrap();
        assert!(impact.new_utilization > impact.current_utilization);
        assert!((impact.new_utilization - 0.6).abs() < 1e-12);
    }

    #[test]
    fn repay_and_withdraw_mirror_each_other() {
        let repay = calculate_liquidity_impact(
            &half_used(),
            &LiquidityScenario {
                action: LiquidityAction::Repay,
                amount_usd: 20.0,
            },
            &PARAMS,
        )
        .unwrap();
        assert!((repay.new_utilization - 0.3).abs() < 1e-12);

        let withdraw = calculate_liquidity_impact(
            &half_used(),
            &LiquidityScenario {
                action: LiquidityAction::Withdraw,
                amount_usd: 20.0,
            },
            &PARAMS,
        )
        .unwrap();
        assert!((withdraw.new_utilization - 50.0 / 80.0).abs() < 1e-12);
    }

    #[test]
    fn rates_follow_the_two_slope_curve() {
        // at optimal utilization the borrow rate is base + slope1
        let rate = borrow_rate(0.8, &PARAMS);
        assert!((rate - 0.04).abs() < 1e-12);
        // halfway up the first slope
        let rate = borrow_rate(0.4, &PARAMS);
        assert!((rate - 0.02).abs() < 1e-12);
        // halfway up the excess slope
        let rate = borrow_rate(0.9, &PARAMS);
        assert!((rate - (0.04 + 0.6 * 0.5)).abs() < 1e-12);
        // supply rate is borrow rate scaled by utilization
        let impact = calculate_liquidity_impact(
            &ReserveLiquidity {
                borrowed_usd: 80.0,
                available_usd: 20.0,
            },
            &LiquidityScenario {
                action: LiquidityAction::Deposit,
                amount_usd: 0.0,
            },
            &PARAMS,
        )
        .unwrap();
        assert!((impact.current_supply_apr - 0.04 * 0.8).abs() < 1e-12);
    }

    #[test]
    fn oversized_scenarios_clamp_at_zero() {
        let impact = calculate_liquidity_impact(
            &half_used(),
            &LiquidityScenario {
                action: LiquidityAction::Withdraw,
                amount_usd: 500.0,
            },
            &PARAMS,
        )
        .unwrap();
        // all available liquidity drained, only debt remains
        assert!((impact.new_utilization - 1.0).abs() < 1e-12);
    }

    #[test]
    fn negative_amount_is_rejected() {
        let result = calculate_liquidity_impact(
            &half_used(),
            &LiquidityScenario {
                action: LiquidityAction::Deposit,
                amount_usd: -1.0,
            },
            &PARAMS,
        );
        assert!(result.is_err());
    }

    #[test]
    fn empty_reserve_has_zero_utilization() {
        let impact = calculate_liquidity_impact(
            &ReserveLiquidity {
                borrowed_usd: 0.0,
                available_usd: 0.0,
            },
            &LiquidityScenario {
                action: LiquidityAction::Deposit,
                amount_usd: 0.0,
            },
            &PARAMS,
        )
        .unwrap();
        assert!(impact.current_utilization.abs() < 1e-12);
        assert!(impact.new_utilization.abs() < 1e-12);
    }
}
