use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceType {
    CreditCard,
    Bank,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::CreditCard => "credit_card",
            SourceType::Bank => "bank",
        }
    }
}

/// One normalized transaction row. Field order is the canonical output column
/// order; absent numeric fields serialize as empty cells.
///
/// `amount_jpy` is outflow-positive: money leaving the holder is positive,
/// money received is negative, for every source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalTransaction {
    pub transaction_id: String,
    pub date: String,
    pub date_raw: String,
    pub merchant: String,
    pub amount_jpy: i64,
    pub cardholder: String,
    pub category: String,
    pub memo: String,
    pub payment_method: String,
    pub transaction_type: String,
    pub debit_jpy: Option<i64>,
    pub credit_jpy: Option<i64>,
    pub balance_jpy: Option<i64>,
    pub card_number: String,
    pub sale_type: String,
    pub installments: String,
    pub current_installment: String,
    pub source_file: String,
    pub source_row: usize,
    pub source_encoding: String,
    pub imported_at: String,
}

/// A canonical transaction tagged with its source during a merge run. The
/// underlying record is copied verbatim; merging only adds provenance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergedTransaction {
    pub source_name: String,
    pub source_type: String,
    pub transaction_id: String,
    pub date: String,
    pub date_raw: String,
    pub merchant: String,
    pub amount_jpy: i64,
    pub is_outflow: u8,
    pub cardholder: String,
    pub category: String,
    pub memo: String,
    pub payment_method: String,
    pub transaction_type: String,
    pub debit_jpy: Option<i64>,
    pub credit_jpy: Option<i64>,
    pub balance_jpy: Option<i64>,
    pub card_number: String,
    pub sale_type: String,
    pub installments: String,
    pub current_installment: String,
    pub source_file: String,
    pub source_row: usize,
    pub source_encoding: String,
    pub imported_at: String,
    pub merged_at: String,
}

impl MergedTransaction {
    pub fn from_canonical(
        tx: CanonicalTransaction,
        source_name: &str,
        source_type: &str,
        merged_at: &str,
    ) -> Self {
        MergedTransaction {
            source_name: source_name.to_string(),
            source_type: source_type.to_string(),
            is_outflow: if tx.amount_jpy > 0 { 1 } else { 0 },
            merged_at: merged_at.to_string(),
            transaction_id: tx.transaction_id,
            date: tx.date,
            date_raw: tx.date_raw,
            merchant: tx.merchant,
            amount_jpy: tx.amount_jpy,
            cardholder: tx.cardholder,
            category: tx.category,
            memo: tx.memo,
            payment_method: tx.payment_method,
            transaction_type: tx.transaction_type,
            debit_jpy: tx.debit_jpy,
            credit_jpy: tx.credit_jpy,
            balance_jpy: tx.balance_jpy,
            card_number: tx.card_number,
            sale_type: tx.sale_type,
            installments: tx.installments,
            current_installment: tx.current_installment,
            source_file: tx.source_file,
            source_row: tx.source_row,
            source_encoding: tx.source_encoding,
            imported_at: tx.imported_at,
        }
    }
}

#[cfg(test)]
pub(crate) fn blank_canonical() -> CanonicalTransaction {
    CanonicalTransaction {
        transaction_id: String::new(),
        date: String::new(),
        date_raw: String::new(),
        merchant: String::new(),
        amount_jpy: 0,
        cardholder: String::new(),
        category: String::new(),
        memo: String::new(),
        payment_method: String::new(),
        transaction_type: String::new(),
        debit_jpy: None,
        credit_jpy: None,
        balance_jpy: None,
        card_number: String::new(),
        sale_type: String::new(),
        installments: String::new(),
        current_installment: String::new(),
        source_file: String::new(),
        source_row: 0,
        source_encoding: String::new(),
        imported_at: String::new(),
    }
}
