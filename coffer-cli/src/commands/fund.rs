//! Fund command - credit an account from the system account

use anyhow::{anyhow, Result};
use uuid::Uuid;

use super::{get_context, get_logger, log_event};
use crate::output;
use coffer_core::domain::money::format_with_currency;
use coffer_core::services::Event;

pub fn run(to: &str, amount: i64, key: &str, json: bool) -> Result<()> {
    let logger = get_logger();
    let ctx = get_context(logger.clone())?;

    let to_id = Uuid::parse_str(to).map_err(|_| anyhow!("Invalid account id: {to}"))?;

    let outcome = match ctx.transfer_service.fund_initial(to_id, amount, key) {
        Ok(outcome) => outcome,
        Err(e) => {
            log_event(
                &logger,
                Event::new("funding_failed")
                    .with_command("fund")
                    .with_error_kind(e.kind())
                    .with_error(e.to_string()),
            );
            return Err(e.into());
        }
    };

    log_event(&logger, Event::new("funding_completed").with_command("fund"));

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    let tx = &outcome.transaction;
    let currency = ctx.account_service.resolve(to_id)?.currency;
    if outcome.already_processed {
        output::warning(&format!(
            "Idempotency key {key:?} already processed; returning the recorded transaction"
        ));
    }
    output::success(&format!(
        "Funded {} with {}",
        tx.to_account,
        format_with_currency(tx.amount, &currency)
    ));
    println!("Transaction: {} ({})", tx.id, tx.status.as_str());
    Ok(())
}
