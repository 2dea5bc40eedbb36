use fishtank_engine::{EntityId, Vec2};
use thiserror::Error;
use tracing::{info, warn};

use super::economy::{Ledger, LedgerError, Money};
use super::world::{SpawnError, TankWorld};

pub(crate) const WIN_COST: Money = 5000;
pub(crate) const WIN_ITEM: &str = "win";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub(crate) enum PurchaseError {
    #[error(transparent)]
    Spawn(#[from] SpawnError),
    #[error("'{def_name}' is not for sale")]
    NotForSale { def_name: String },
    #[error("cannot afford '{item}': costs {cost}, balance {balance}")]
    InsufficientFunds {
        item: String,
        cost: Money,
        balance: Money,
    },
    #[error(transparent)]
    Ledger(LedgerError),
}

/// Buys one catalog entity. Everything is validated before the ledger is
/// touched; a failed purchase changes nothing.
///
/// Agents ignore `at` and appear at a random point; drops appear at `at`.
pub(crate) fn purchase(
    ledger: &mut Ledger,
    world: &mut TankWorld,
    def_name: &str,
    at: Option<Vec2>,
) -> Result<EntityId, PurchaseError> {
    let plan = world.plan_spawn(def_name, at).map_err(|error| {
        warn!(def_name, error = %error, "purchase_rejected");
        PurchaseError::from(error)
    })?;
    let Some(cost) = plan.cost() else {
        warn!(def_name, "purchase_not_for_sale");
        return Err(PurchaseError::NotForSale {
            def_name: def_name.to_string(),
        });
    };

    let balance = debit(ledger, plan.def_name(), cost)?;
    let id = world.commit_spawn(plan);
    info!(
        def_name,
        entity_id = id.0,
        cost,
        balance,
        "purchase_completed"
    );
    Ok(id)
}

/// Buys the win condition.
pub(crate) fn purchase_win(ledger: &mut Ledger) -> Result<Money, PurchaseError> {
    let balance = debit(ledger, WIN_ITEM, WIN_COST)?;
    info!(cost = WIN_COST, balance, "purchase_win_completed");
    Ok(balance)
}

fn debit(ledger: &mut Ledger, item: &str, cost: Money) -> Result<Money, PurchaseError> {
    match ledger.debit(cost) {
        Ok(balance) => Ok(balance),
        Err(LedgerError::InsufficientFunds { balance, requested }) => {
            info!(item, cost = requested, balance, "purchase_insufficient_funds");
            Err(PurchaseError::InsufficientFunds {
                item: item.to_string(),
                cost: requested,
                balance,
            })
        }
        Err(error) => {
            warn!(item, error = %error, "purchase_ledger_rejected");
            Err(PurchaseError::Ledger(error))
        }
    }
}
