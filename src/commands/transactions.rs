//! Handlers for `expense list`, `expense add` and `expense delete`.

use crate::api::Mode;
use crate::commands::{Client, Out};
use crate::model::{Transaction, TransactionFilter, TransactionForm, TransactionType};
use crate::Result;
use std::fmt::Write;
use std::path::Path;

/// Lists the logged-in user's transactions that match `filter`, newest first.
///
/// # Errors
/// - `ErrorType::Unauthenticated` if nobody is logged in.
/// - `ErrorType::FetchFailed` or `ErrorType::Timeout` if the list cannot be loaded.
pub async fn list(
    expense_home: &Path,
    mode: Mode,
    filter: TransactionFilter,
) -> Result<Out<Vec<Transaction>>> {
    let client = Client::connect(expense_home, mode).await?;
    client.session.require_user()?;
    client.view.fetch_transactions(filter).await?;
    let transactions = client.view.transactions();
    if transactions.is_empty() {
        return Ok(Out::new("No transactions", transactions));
    }
    Ok(Out::new(table(&client, &transactions), transactions))
}

/// Creates a transaction from raw command line input. Invalid input is rejected before anything is
/// sent.
///
/// # Errors
/// - `ErrorType::Unauthenticated` if nobody is logged in.
/// - `ErrorType::CreateFailed` if the input is invalid or the API rejects it.
pub async fn add(expense_home: &Path, mode: Mode, form: TransactionForm) -> Result<Out<Transaction>> {
    let client = Client::connect(expense_home, mode).await?;
    client.session.require_user()?;
    let created = client.view.submit(&form).await?;
    Ok(Out::new(
        format!(
            "Added {} of {} for {} on {} ({})",
            created.kind,
            client.money(&created.amount),
            created.category,
            created.date,
            created.id
        ),
        created,
    ))
}

/// Deletes the transaction with `id`.
///
/// # Errors
/// - `ErrorType::Unauthenticated` if nobody is logged in.
/// - `ErrorType::DeleteFailed` if the API does not confirm the delete.
pub async fn delete(expense_home: &Path, mode: Mode, id: &str) -> Result<Out<()>> {
    let client = Client::connect(expense_home, mode).await?;
    client.session.require_user()?;
    client.view.delete_transaction(id).await?;
    Ok(format!("Deleted transaction {id}").into())
}

fn table(client: &Client, transactions: &[Transaction]) -> String {
    let rows: Vec<[String; 6]> = transactions
        .iter()
        .map(|tx| {
            let amount = match tx.kind {
                TransactionType::Income => format!("+{}", client.money(&tx.amount)),
                TransactionType::Expense => format!("-{}", client.money(&tx.amount)),
            };
            [
                tx.date.to_string(),
                tx.kind.to_string(),
                tx.category.to_string(),
                amount,
                tx.description.clone(),
                tx.id.clone(),
            ]
        })
        .collect();
    let header = ["Date", "Type", "Category", "Amount", "Description", "ID"].map(String::from);

    let mut widths = header.clone().map(|h| h.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    for row in std::iter::once(&header).chain(rows.iter()) {
        out.push('\n');
        for (ix, (cell, width)) in row.iter().zip(widths).enumerate() {
            let pad = width - cell.chars().count();
            let _ = if ix == 3 {
                write!(out, "{}{cell}  ", " ".repeat(pad))
            } else {
                write!(out, "{cell}{}  ", " ".repeat(pad))
            };
        }
        out.truncate(out.trim_end().len());
    }
    let _ = write!(out, "\n{} transactions", transactions.len());
    out
}
