//! Room-charge folio arithmetic and booking eligibility.

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::BookingStatus;

/// New amount due on a booking after posting `charge`.
///
/// Negative charges are rejected; posting zero returns the input unchanged.
pub fn apply_room_charge(current_amount_due: Money, charge: Money) -> CoreResult<Money> {
    if charge.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: "room charge".to_string(),
        }
        .into());
    }
    Ok(current_amount_due + charge)
}

/// A booking can take a room charge only when it is CONFIRMED and the guest is
/// authorized. Each failure has its own error.
pub fn validate_room_charge_booking(
    booking_id: &str,
    status: BookingStatus,
    guest_authorized: bool,
) -> CoreResult<()> {
    if status != BookingStatus::Confirmed {
        return Err(CoreError::BookingNotConfirmed {
            booking_id: booking_id.to_string(),
            status: status.to_string(),
        });
    }
    if !guest_authorized {
        return Err(CoreError::GuestNotAuthorized {
            booking_id: booking_id.to_string(),
        });
    }
    Ok(())
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    fn charges() -> impl Strategy<Value = Vec<Money>> {
        prop::collection::vec((0i64..=500_000).prop_map(Money::from_cents), 0..10)
    }

    fn post_all<'a>(due: Money, charges: impl Iterator<Item = &'a Money>) -> Money {
        charges
            .fold(Ok(due), |acc, c| acc.and_then(|due| apply_room_charge(due, *c)))
            .unwrap()
    }

    // Posting charges one by one equals posting their sum, in any order
    proptest! {
        #[test]
        fn prop_sequential_equals_summed(
            due in 0i64..=5_000_000,
            charges in charges(),
        ) {
            let due = Money::from_cents(due);
            let sequential = post_all(due, charges.iter());
            let at_once = apply_room_charge(due, charges.iter().sum()).unwrap();
            prop_assert_eq!(sequential, at_once);
            prop_assert_eq!(sequential, post_all(due, charges.iter().rev()));
            prop_assert!(sequential >= due);
        }
    }
}
