//! Discounted cash-flow helpers.
//!
//! # Convention
//! Cash flows are indexed by period, the first at period 0. The rate is
//! applied once per period, so the first flow is not discounted:
//!
//! NPV = Σ cf[t] / (1 + rate)^t

/// Net present value of `cash_flows` at `rate` per period.
pub fn npv(rate: f64, cash_flows: &[f64]) -> f64 {
    let factor = 1.0 + rate;
    cash_flows
        .iter()
        .fold((0.0, 1.0), |(acc, discount), cf| {
            (acc + cf / discount, discount * factor)
        })
        .0
}

/// First period whose cumulative cash flow is non-negative after having
/// been negative, or `None` if the series never pays back.
pub fn payback_period(cash_flows: &[f64]) -> Option<usize> {
    let mut cumulative = 0.0;
    let mut invested = false;
    for (period, cf) in cash_flows.iter().enumerate() {
        cumulative += cf;
        if cumulative < 0.0 {
            invested = true;
        } else if invested {
            return Some(period);
        }
    }
    if invested { None } else { Some(0) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_npv_matches_closed_form() {
        // -100 + 60/1.1 + 60/1.21
        let v = npv(0.1, &[-100.0, 60.0, 60.0]);
        let expected = -100.0 + 60.0 / 1.1 + 60.0 / 1.21;
        assert!((v - expected).abs() < 1e-9);
    }

    #[test]
    fn test_npv_zero_rate_is_sum() {
        let v = npv(0.0, &[1.0, 2.0, 3.0]);
        assert!((v - 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_npv_empty() {
        assert_eq!(npv(0.05, &[]), 0.0);
    }

    #[test]
    fn test_payback_period() {
        assert_eq!(payback_period(&[-100.0, 30.0, 30.0, 50.0]), Some(3));
        assert_eq!(payback_period(&[-100.0, 10.0]), None);
        assert_eq!(payback_period(&[5.0, 5.0]), Some(0));
    }
}
