use rust_decimal::Decimal;

use crate::domain::customer::CustomerTier;
use crate::domain::order::{OrderStatus, ShippingSpeed};
use crate::errors::DomainError;

pub const STANDARD_SHIPPING_COST: Decimal = Decimal::from_parts(599, 0, 0, false, 2);
pub const EXPEDITED_SHIPPING_COST: Decimal = Decimal::from_parts(1299, 0, 0, false, 2);
pub const EXPRESS_SHIPPING_COST: Decimal = Decimal::from_parts(2499, 0, 0, false, 2);

/// Orders at or above this total ship standard for free.
pub const FREE_SHIPPING_THRESHOLD: Decimal = Decimal::from_parts(50, 0, 0, false, 0);

/// First matching rule wins: free-standard threshold, tier perks, flat rate.
pub fn shipping_cost(
    order_total: Decimal,
    speed: ShippingSpeed,
    tier: CustomerTier,
) -> Result<Decimal, DomainError> {
    if order_total < Decimal::ZERO {
        return Err(DomainError::NegativeOrderTotal(order_total));
    }

    if order_total >= FREE_SHIPPING_THRESHOLD && speed == ShippingSpeed::Standard {
        return Ok(Decimal::ZERO);
    }

    match (tier, speed) {
        (CustomerTier::Platinum, _) => return Ok(Decimal::ZERO),
        (CustomerTier::Gold, ShippingSpeed::Standard | ShippingSpeed::Expedited) => {
            return Ok(Decimal::ZERO)
        }
        _ => {}
    }

    Ok(match speed {
        ShippingSpeed::Standard => STANDARD_SHIPPING_COST,
        ShippingSpeed::Expedited => EXPEDITED_SHIPPING_COST,
        ShippingSpeed::Express => EXPRESS_SHIPPING_COST,
    })
}

/// Cancellation is possible until the order ships.
pub fn can_cancel(status: OrderStatus) -> bool {
    matches!(status, OrderStatus::Pending | OrderStatus::Processing)
}

pub fn can_modify(status: OrderStatus) -> bool {
    status == OrderStatus::Pending
}

pub fn delivery_estimate(speed: ShippingSpeed) -> &'static str {
    match speed {
        ShippingSpeed::Express => "1 business day",
        ShippingSpeed::Expedited => "2-3 business days",
        ShippingSpeed::Standard => "5-7 business days",
    }
}
