//! Transfer command - move funds between accounts

use anyhow::{anyhow, Result};
use uuid::Uuid;

use super::{get_context, get_logger, log_event};
use crate::output;
use coffer_core::domain::money::format_with_currency;
use coffer_core::services::Event;

pub fn run(
    user: &str,
    from: &str,
    to: &str,
    amount: i64,
    key: &str,
    json: bool,
) -> Result<()> {
    let logger = get_logger();
    let ctx = get_context(logger.clone())?;

    let from_id = Uuid::parse_str(from).map_err(|_| anyhow!("Invalid account id: {from}"))?;
    let to_id = Uuid::parse_str(to).map_err(|_| anyhow!("Invalid account id: {to}"))?;

    let outcome = match ctx.transfer_service.transfer(user, from_id, to_id, amount, key) {
        Ok(outcome) => outcome,
        Err(e) => {
            log_event(
                &logger,
                Event::new("transfer_failed")
                    .with_command("transfer")
                    .with_error_kind(e.kind())
                    .with_error(e.to_string()),
            );
            return Err(e.into());
        }
    };

    log_event(
        &logger,
        Event::new(if outcome.already_processed {
            "transfer_replayed"
        } else {
            "transfer_completed"
        })
        .with_command("transfer"),
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        let tx = &outcome.transaction;
        let currency = ctx.account_service.resolve(to_id)?.currency;
        if outcome.already_processed {
            output::warning(&format!(
                "Idempotency key {key:?} already processed; returning the recorded transaction"
            ));
        }
        output::success(&format!(
            "Transferred {} from {} to {}",
            format_with_currency(tx.amount, &currency),
            tx.from_account,
            tx.to_account
        ));
        println!("Transaction: {} ({})", tx.id, tx.status.as_str());
    }

    // the webhook delivery runs on a background thread; exiting without
    // draining it would drop the notice
    ctx.transfer_service.flush_notifications();
    Ok(())
}
