use super::Credits;

/// Post-transfer balances for a settled purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settlement {
    pub buyer_balance: Credits,
    pub seller_balance: Credits,
}

/// Compute the balances that result from moving `price` credits from buyer
/// to seller. The transfer is immediate and full-amount; the sum of the two
/// balances is unchanged.
pub fn settle_purchase(
    buyer_balance: Credits,
    seller_balance: Credits,
    price: Credits,
) -> Result<Settlement, LedgerError> {
    if price <= 0 {
        return Err(LedgerError::NonPositivePrice(price));
    }
    if buyer_balance < price {
        return Err(LedgerError::InsufficientFunds {
            balance: buyer_balance,
            required: price,
        });
    }
    let seller_after = seller_balance
        .checked_add(price)
        .ok_or(LedgerError::BalanceOverflow)?;

    Ok(Settlement {
        buyer_balance: buyer_balance - price,
        seller_balance: seller_after,
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    NonPositivePrice(Credits),
    InsufficientFunds { balance: Credits, required: Credits },
    BalanceOverflow,
}

impl std::fmt::Display for LedgerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LedgerError::NonPositivePrice(price) => {
                write!(f, "price must be positive, got {}", price)
            }
            LedgerError::InsufficientFunds { balance, required } => {
                write!(
                    f,
                    "insufficient funds: balance {} credits, required {}",
                    balance, required
                )
            }
            LedgerError::BalanceOverflow => write!(f, "seller balance would overflow"),
        }
    }
}

impl std::error::Error for LedgerError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settle_purchase_moves_full_amount() {
        let settlement = settle_purchase(100, 0, 40).unwrap();
        assert_eq!(settlement.buyer_balance, 60);
        assert_eq!(settlement.seller_balance, 40);
    }

    #[test]
    fn test_settlement_conserves_total_supply() {
        let settlement = settle_purchase(100, 250, 40).unwrap();
        assert_eq!(
            settlement.buyer_balance + settlement.seller_balance,
            100 + 250,
            "Transfer must not create or destroy credits"
        );
    }

    #[test]
    fn test_exact_balance_is_spendable() {
        let settlement = settle_purchase(40, 0, 40).unwrap();
        assert_eq!(settlement.buyer_balance, 0);
        assert_eq!(settlement.seller_balance, 40);
    }

    #[test]
    fn test_insufficient_funds() {
        let result = settle_purchase(10, 0, 40);
        assert_eq!(
            result,
            Err(LedgerError::InsufficientFunds {
                balance: 10,
                required: 40
            })
        );
    }

    #[test]
    fn test_non_positive_price_rejected() {
        assert_eq!(
            settle_purchase(100, 0, 0),
            Err(LedgerError::NonPositivePrice(0))
        );
        assert_eq!(
            settle_purchase(100, 0, -5),
            Err(LedgerError::NonPositivePrice(-5))
        );
    }

    #[test]
    fn test_seller_balance_overflow() {
        let result = settle_purchase(100, Credits::MAX - 10, 40);
        assert_eq!(result, Err(LedgerError::BalanceOverflow));
    }
}
