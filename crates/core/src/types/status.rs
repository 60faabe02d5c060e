//! Order status and payment method enums.

use serde::{Deserialize, Serialize};

/// Error parsing a status or payment method from its wire string.
#[derive(thiserror::Error, Debug, Clone)]
#[error("unknown value: {0}")]
pub struct StatusParseError(pub String);

/// Order fulfillment status.
///
/// The legal transitions form a small state machine:
///
/// ```text
/// pending --> confirmed --> delivered   (terminal)
/// pending --> cancelled                 (terminal)
/// confirmed --> cancelled               (terminal)
/// ```
///
/// `delivered` and `cancelled` have no outgoing edges, and `pending` cannot
/// skip straight to `delivered`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Whether moving from `self` to `next` is a legal transition.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Confirmed)
                | (Self::Pending | Self::Confirmed, Self::Cancelled)
                | (Self::Confirmed, Self::Delivered)
        )
    }

    /// Wire representation, also used as the database value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "delivered" => Ok(Self::Delivered),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(StatusParseError(other.to_owned())),
        }
    }
}

/// How the customer intends to pay and receive the order.
///
/// The storefront records the intent only; no payment is processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Cash on delivery: priced by distance from the seller.
    Cod,
    /// Meet up at one of the configured locations; no delivery fee.
    Meetup,
}

impl PaymentMethod {
    /// Wire representation, also used as the database value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cod => "cod",
            Self::Meetup => "meetup",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cod" => Ok(Self::Cod),
            "meetup" => Ok(Self::Meetup),
            other => Err(StatusParseError(other.to_owned())),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const ALL: [OrderStatus; 4] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    #[test]
    fn test_legal_transitions() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Confirmed));
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Cancelled));
        assert!(OrderStatus::Confirmed.can_transition_to(OrderStatus::Delivered));
        assert!(OrderStatus::Confirmed.can_transition_to(OrderStatus::Cancelled));
    }

    #[test]
    fn test_every_other_pair_is_illegal() {
        let legal = [
            (OrderStatus::Pending, OrderStatus::Confirmed),
            (OrderStatus::Pending, OrderStatus::Cancelled),
            (OrderStatus::Confirmed, OrderStatus::Delivered),
            (OrderStatus::Confirmed, OrderStatus::Cancelled),
        ];
        for from in ALL {
            for to in ALL {
                let expected = legal.contains(&(from, to));
                assert_eq!(
                    from.can_transition_to(to),
                    expected,
                    "{from} -> {to} should be {expected}"
                );
            }
        }
    }

    #[test]
    fn test_terminal_states_have_no_exits() {
        for to in ALL {
            assert!(!OrderStatus::Delivered.can_transition_to(to));
            assert!(!OrderStatus::Cancelled.can_transition_to(to));
        }
    }

    #[test]
    fn test_status_roundtrip() {
        for status in ALL {
            let parsed: OrderStatus = status.as_str().parse().unwrap();
            assert_eq!(parsed, status);
        }
        assert!("shipped".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_status_serde() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::Pending).unwrap(),
            "\"pending\""
        );
        let status: OrderStatus = serde_json::from_str("\"cancelled\"").unwrap();
        assert_eq!(status, OrderStatus::Cancelled);
    }

    #[test]
    fn test_payment_method_roundtrip() {
        for method in [PaymentMethod::Cod, PaymentMethod::Meetup] {
            let parsed: PaymentMethod = method.as_str().parse().unwrap();
            assert_eq!(parsed, method);
        }
        assert!("card".parse::<PaymentMethod>().is_err());
        assert_eq!(
            serde_json::to_string(&PaymentMethod::Meetup).unwrap(),
            "\"meetup\""
        );
    }
}
