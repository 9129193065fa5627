pub mod sync_state;
pub mod user_position;
pub mod vault_event;
pub mod vault_stats;

use bigdecimal::BigDecimal;
use bigdecimal::num_bigint::BigInt;
use yvault_sdk::objects::EventType as SdkEventType;

/// Vault event kind for database operations.
///
/// This is the sqlx::Type version. For API/DTO use, see `yvault_sdk::objects::EventType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(rename_all = "UPPERCASE", type_name = "vault_event_type")]
pub enum EventKind {
    Deposit,
    Withdraw,
}

impl From<EventKind> for SdkEventType {
    fn from(value: EventKind) -> Self {
        match value {
            EventKind::Deposit => SdkEventType::Deposit,
            EventKind::Withdraw => SdkEventType::Withdraw,
        }
    }
}

impl From<SdkEventType> for EventKind {
    fn from(value: SdkEventType) -> Self {
        match value {
            SdkEventType::Deposit => EventKind::Deposit,
            SdkEventType::Withdraw => EventKind::Withdraw,
        }
    }
}

/// Integer amount to a scale-0 NUMERIC.
pub fn to_numeric(value: &BigInt) -> BigDecimal {
    BigDecimal::new(value.clone(), 0)
}

/// Scale-0 NUMERIC back to an integer amount. Any fractional part is dropped.
pub fn from_numeric(value: &BigDecimal) -> BigInt {
    let (int, _) = value.with_scale(0).into_bigint_and_exponent();
    int
}
