//! Tests for core_kernel public types

use chrono::NaiveDate;
use rust_decimal_macros::dec;

use core_kernel::{age_on, parse_flexible_date, Currency, DateRange, EnrolleeId, Money, ProviderId};

mod money_tests {
    use super::*;

    #[test]
    fn test_default_currency_is_naira() {
        assert_eq!(Currency::default(), Currency::NGN);
    }

    #[test]
    fn test_round_to_currency() {
        let m = Money::ngn(dec!(10.005));
        assert_eq!(m.round_to_currency().amount(), dec!(10.00));
    }

    #[test]
    fn test_negative_is_not_positive() {
        let refund = -Money::ngn(dec!(50));
        assert!(refund.is_negative());
        assert!(!refund.is_positive());
    }

    #[test]
    fn test_sum_rejects_mixed_currencies() {
        let items = [Money::ngn(dec!(1)), Money::new(dec!(1), Currency::GBP)];
        assert!(Money::sum(items.iter(), Currency::NGN).is_err());
    }
}

mod temporal_tests {
    use super::*;

    #[test]
    fn test_invalid_range_rejected() {
        let start = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();
        assert!(DateRange::new(start, end).is_err());
    }

    #[test]
    fn test_overlapping_ranges() {
        let a = DateRange::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
        )
        .unwrap();
        let b = DateRange::new(
            NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
            NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
        )
        .unwrap();
        assert!(a.overlaps(&b));
    }

    #[test]
    fn test_age_rejects_future_birth() {
        let dob = NaiveDate::from_ymd_opt(2030, 1, 1).unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert!(age_on(dob, today).is_err());
    }

    #[test]
    fn test_newborn_is_zero() {
        let dob = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(age_on(dob, dob).unwrap(), 0);
    }

    #[test]
    fn test_parse_flexible_rejects_american_order_past_twelve() {
        assert!(parse_flexible_date("12/31/1990").is_err());
    }
}

mod identifier_tests {
    use super::*;

    #[test]
    fn test_prefixes() {
        assert_eq!(EnrolleeId::prefix(), "ENR");
        assert_eq!(ProviderId::prefix(), "PRV");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("ENR-not-a-uuid".parse::<EnrolleeId>().is_err());
    }
}
