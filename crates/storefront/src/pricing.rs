//! Checkout pricing.
//!
//! Quotes are computed once, at order creation, from the catalog prices in
//! effect at that moment. Delivery fees come from great-circle distance
//! between the seller and the drop-off point:
//!
//! ```text
//! fee = max(minimum_fee, round_to_increment(base_fare + per_km_rate * km))
//! ```
//!
//! Meetup orders carry no delivery fee; the customer collects in person.

use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use thiserror::Error;

use reign_core::{Coordinates, Money, PaymentMethod};

use crate::config::{CheckoutConfig, PricingConfig};
use crate::models::OrderLineItem;

/// Mean Earth radius in kilometres, for the haversine formula.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Reasons an order cannot be priced.
#[derive(Debug, Error)]
pub enum PricingError {
    #[error("order must contain at least one item")]
    EmptyOrder,
    #[error("delivery orders require delivery coordinates")]
    MissingDeliveryCoordinates,
    #[error("delivery coordinates are outside the service area")]
    OutOfServiceArea,
    #[error("unknown meetup location: {0}")]
    UnknownMeetupLocation(String),
    #[error("meetup orders require a meetup location")]
    MissingMeetupLocation,
}

/// The priced totals for an order, frozen at creation time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quote {
    pub subtotal: Money,
    pub delivery_fee: Money,
    pub total: Money,
}

/// Great-circle distance between two points, in kilometres.
#[must_use]
pub fn distance_km(a: Coordinates, b: Coordinates) -> f64 {
    let lat_a = a.lat.to_radians();
    let lat_b = b.lat.to_radians();
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}

/// Delivery fee for a trip of `km` kilometres.
#[must_use]
pub fn delivery_fee(pricing: &PricingConfig, km: f64) -> Money {
    let km = Decimal::from_f64(km).unwrap_or(Decimal::ZERO);
    let raw = pricing.base_fare.amount() + pricing.per_km_rate.amount() * km;
    let fee = Money::new(raw)
        .unwrap_or(Money::ZERO)
        .round_to_increment(pricing.rounding_increment);
    fee.max(pricing.minimum_fee)
}

/// Price an order: subtotal from the line items, delivery fee from the
/// payment method and destination.
///
/// # Errors
///
/// Returns a [`PricingError`] when the order is empty, a delivery order has
/// no usable destination, or a meetup order names no known location.
pub fn price_order(
    items: &[OrderLineItem],
    payment_method: PaymentMethod,
    delivery_coordinates: Option<Coordinates>,
    meetup_location_id: Option<&str>,
    checkout: &CheckoutConfig,
) -> Result<Quote, PricingError> {
    if items.is_empty() {
        return Err(PricingError::EmptyOrder);
    }

    let subtotal: Money = items.iter().map(OrderLineItem::line_total).sum();

    let fee = match payment_method {
        PaymentMethod::Cod => {
            let dest =
                delivery_coordinates.ok_or(PricingError::MissingDeliveryCoordinates)?;
            if !checkout.region.contains(dest) {
                return Err(PricingError::OutOfServiceArea);
            }
            delivery_fee(&checkout.pricing, distance_km(checkout.seller, dest))
        }
        PaymentMethod::Meetup => {
            let id = meetup_location_id.ok_or(PricingError::MissingMeetupLocation)?;
            if checkout.meetup_location(id).is_none() {
                return Err(PricingError::UnknownMeetupLocation(id.to_string()));
            }
            Money::ZERO
        }
    };

    Ok(Quote {
        subtotal,
        delivery_fee: fee,
        total: subtotal + fee,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use reign_core::{ProductId, RegionBounds};

    fn money(s: &str) -> Money {
        s.parse().unwrap()
    }

    fn test_checkout() -> CheckoutConfig {
        CheckoutConfig {
            pricing: PricingConfig {
                base_fare: money("3"),
                per_km_rate: money("1.5"),
                minimum_fee: money("0"),
                rounding_increment: money("0.5"),
            },
            seller: Coordinates::new(25.2854, 51.5310),
            region: RegionBounds {
                min_lat: 24.4,
                max_lat: 26.2,
                min_lng: 50.7,
                max_lng: 51.7,
            },
            meetup_locations: vec![crate::config::MeetupLocation {
                id: "katara".into(),
                name: "Katara Cultural Village".into(),
                coordinates: Coordinates::new(25.3594, 51.5260),
            }],
        }
    }

    fn line(price: &str, quantity: u32) -> OrderLineItem {
        OrderLineItem {
            product_id: ProductId::new(1),
            name: "Amber candle".into(),
            price: money(price),
            quantity,
        }
    }

    #[test]
    fn test_distance_zero_for_same_point() {
        let p = Coordinates::new(25.2854, 51.5310);
        assert!(distance_km(p, p).abs() < 1e-9);
    }

    #[test]
    fn test_distance_symmetric() {
        let a = Coordinates::new(25.2854, 51.5310);
        let b = Coordinates::new(25.3594, 51.5260);
        assert!((distance_km(a, b) - distance_km(b, a)).abs() < 1e-9);
    }

    #[test]
    fn test_distance_one_degree_latitude() {
        // One degree of latitude is about 111.19 km on a 6371 km sphere.
        let a = Coordinates::new(25.0, 51.5);
        let b = Coordinates::new(26.0, 51.5);
        let d = distance_km(a, b);
        assert!((d - 111.19).abs() < 0.05, "got {d}");
    }

    #[test]
    fn test_fee_at_zero_distance_is_base_fare() {
        let checkout = test_checkout();
        assert_eq!(delivery_fee(&checkout.pricing, 0.0), money("3"));
    }

    #[test]
    fn test_fee_rounds_to_half_unit() {
        let checkout = test_checkout();
        // 3 + 1.5 * 5 = 10.5, already on the grid.
        assert_eq!(delivery_fee(&checkout.pricing, 5.0), money("10.5"));
        // 3 + 1.5 * 4.9 = 10.35, rounds up to 10.5.
        assert_eq!(delivery_fee(&checkout.pricing, 4.9), money("10.5"));
        // 3 + 1.5 * 4.8 = 10.2, rounds down to 10.0.
        assert_eq!(delivery_fee(&checkout.pricing, 4.8), money("10.0"));
    }

    #[test]
    fn test_fee_floor_applies_after_rounding() {
        let mut checkout = test_checkout();
        checkout.pricing.minimum_fee = money("15");
        assert_eq!(delivery_fee(&checkout.pricing, 0.0), money("15"));
        // Far enough that the formula beats the floor.
        assert_eq!(delivery_fee(&checkout.pricing, 20.0), money("33"));
    }

    #[test]
    fn test_price_cod_order() {
        let checkout = test_checkout();
        let items = [line("35", 2), line("12.5", 1)];
        // Same point as the seller, so fee is the base fare.
        let quote = price_order(
            &items,
            PaymentMethod::Cod,
            Some(checkout.seller),
            None,
            &checkout,
        )
        .unwrap();
        assert_eq!(quote.subtotal, money("82.5"));
        assert_eq!(quote.delivery_fee, money("3"));
        assert_eq!(quote.total, money("85.5"));
    }

    #[test]
    fn test_price_meetup_order_has_no_fee() {
        let checkout = test_checkout();
        let quote = price_order(
            &[line("35", 2)],
            PaymentMethod::Meetup,
            None,
            Some("katara"),
            &checkout,
        )
        .unwrap();
        assert_eq!(quote.delivery_fee, Money::ZERO);
        assert_eq!(quote.total, money("70"));
    }

    #[test]
    fn test_empty_order_rejected() {
        let checkout = test_checkout();
        assert!(matches!(
            price_order(&[], PaymentMethod::Meetup, None, Some("katara"), &checkout),
            Err(PricingError::EmptyOrder)
        ));
    }

    #[test]
    fn test_cod_requires_coordinates() {
        let checkout = test_checkout();
        assert!(matches!(
            price_order(&[line("35", 1)], PaymentMethod::Cod, None, None, &checkout),
            Err(PricingError::MissingDeliveryCoordinates)
        ));
    }

    #[test]
    fn test_cod_outside_service_area() {
        let checkout = test_checkout();
        // London is well outside the Qatar bounding box.
        let dest = Coordinates::new(51.5074, -0.1278);
        assert!(matches!(
            price_order(&[line("35", 1)], PaymentMethod::Cod, Some(dest), None, &checkout),
            Err(PricingError::OutOfServiceArea)
        ));
    }

    #[test]
    fn test_meetup_location_must_exist() {
        let checkout = test_checkout();
        assert!(matches!(
            price_order(&[line("35", 1)], PaymentMethod::Meetup, None, Some("the-pearl"), &checkout),
            Err(PricingError::UnknownMeetupLocation(_))
        ));
        assert!(matches!(
            price_order(&[line("35", 1)], PaymentMethod::Meetup, None, None, &checkout),
            Err(PricingError::MissingMeetupLocation)
        ));
    }
}
