//! Per-customer transaction history index
//!
//! The aggregators slice each customer's history once per delinquency row
//! and window. Instead of rescanning the full log, transactions are
//! grouped by customer and kept date-sorted so both the "available
//! history" prefix (date <= cutoff) and each window suffix (date >= start)
//! are binary searches.

use std::collections::HashMap;

use chrono::NaiveDate;

use super::preprocess::Transaction;

/// A dated transaction usable for window features. Rows with an
/// unparsable date are indexed only as log membership.
#[derive(Debug, Clone, Copy)]
pub struct TxEvent {
    pub date: NaiveDate,
    pub value: Option<f64>,
}

/// Transaction log grouped by customer, events sorted by date.
#[derive(Debug, Default)]
pub struct HistoryIndex {
    events: HashMap<String, Vec<TxEvent>>,
}

impl HistoryIndex {
    /// Build the index from preprocessed (already sorted) transactions.
    /// Every customer appearing in the log gets an entry, even when all
    /// of their rows have missing dates: "in the log" and "has usable
    /// history" are different facts.
    pub fn build(transactions: &[Transaction]) -> Self {
        let mut events: HashMap<String, Vec<TxEvent>> = HashMap::new();
        for tx in transactions {
            let entry = events.entry(tx.id_cliente.clone()).or_default();
            if let Some(date) = tx.data_transacao {
                entry.push(TxEvent {
                    date,
                    value: tx.valor_transacao,
                });
            }
        }
        for list in events.values_mut() {
            list.sort_by_key(|e| e.date);
        }
        Self { events }
    }

    /// Whether the customer appears in the transaction log at all.
    pub fn contains(&self, id_cliente: &str) -> bool {
        self.events.contains_key(id_cliente)
    }

    /// Number of indexed customers.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// The customer's available history at a cutoff: every dated event
    /// with date <= cutoff. Empty slice when the customer is unknown.
    pub fn available(&self, id_cliente: &str, cutoff: NaiveDate) -> &[TxEvent] {
        match self.events.get(id_cliente) {
            Some(events) => {
                let end = events.partition_point(|e| e.date <= cutoff);
                &events[..end]
            }
            None => &[],
        }
    }
}

/// Restrict an available-history slice to a window lower bound. `None`
/// means the unbounded "ever" window.
pub fn window_slice(events: &[TxEvent], start: Option<NaiveDate>) -> &[TxEvent] {
    match start {
        Some(start) => {
            let begin = events.partition_point(|e| e.date < start);
            &events[begin..]
        }
        None => events,
    }
}
