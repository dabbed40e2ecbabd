use crate::decode::Encoding;
use crate::error::{KakeiError, Result};
use crate::models::SourceType;

/// How a source expresses the transaction amount. Canonical amounts are
/// outflow-positive, so each policy says how to get there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountPolicy {
    /// One signed column, already outflow-positive.
    Signed,
    /// Separate debit and credit columns; amount is debit minus credit.
    DebitCredit,
    /// One signed column, deposit-positive; negate it.
    NegateSigned,
}

/// Where the `payment_method` field comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentMethodRule {
    /// The source has its own payment-method column.
    Column,
    /// Derived from the installments column, e.g. `3` becomes `3回払い`.
    Installments,
    /// Derived from the transaction-type column; `出金` rows become
    /// `口座引落/出金`, everything else passes through.
    TransactionType,
    /// Fixed label `口座取引` for plain account-activity statements.
    AccountActivity,
}

/// Everything the generic engine needs to know about one export format.
/// The built-ins differ only in these values, never in code paths.
pub struct SourceSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub source_type: SourceType,
    /// Decode candidates in trial order.
    pub encodings: &'static [Encoding],
    /// Minimum header-row detection score to accept a file.
    pub min_score: i32,
    pub amount: AmountPolicy,
    pub payment_method: PaymentMethodRule,
    /// Skip rows whose date cell does not parse instead of keeping them
    /// undated. Account statements are useless without a date.
    pub require_date: bool,
    /// Accept month/day dates like `4/1` when a default year is supplied.
    pub allow_short_dates: bool,
    /// Rows whose merchant cell starts with one of these are summary rows,
    /// not transactions.
    pub skip_merchant_prefixes: &'static [&'static str],
    /// Drop zero-amount rows. Some card exports list point adjustments and
    /// fee-free annotations as 0-yen lines.
    pub skip_zero_amounts: bool,
    /// Remove the `様` honorific from the cardholder cell.
    pub strip_cardholder_honorific: bool,
    /// Canonical keys that must resolve to a column (+3 each when scoring).
    pub required: &'static [&'static str],
    /// Canonical key to header aliases, in match-priority order.
    pub aliases: &'static [(&'static str, &'static [&'static str])],
}

impl SourceSpec {
    pub fn aliases_for(&self, key: &str) -> &'static [&'static str] {
        self.aliases
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| *v)
            .unwrap_or(&[])
    }

    pub fn is_required(&self, key: &str) -> bool {
        self.required.contains(&key)
    }
}

/// Named by trial priority, not by source type: most banks ship cp932 but
/// SBI Shinsei exports Unicode, so each spec picks the order its vendor
/// actually needs. Trying cp932 first on UTF-8 bytes can "succeed" with
/// mojibake, which detection cannot recover from.
const UTF8_FIRST: &[Encoding] = &[Encoding::Utf8Sig, Encoding::Cp932, Encoding::Utf8];
const CP932_FIRST: &[Encoding] = &[Encoding::Cp932, Encoding::Utf8Sig, Encoding::Utf8];

static RAKUTEN_CARD: SourceSpec = SourceSpec {
    key: "rakuten-card",
    label: "Rakuten Card statement",
    source_type: SourceType::CreditCard,
    encodings: UTF8_FIRST,
    min_score: 6,
    amount: AmountPolicy::Signed,
    payment_method: PaymentMethodRule::Column,
    require_date: false,
    allow_short_dates: true,
    skip_merchant_prefixes: &["合計"],
    skip_zero_amounts: false,
    strip_cardholder_honorific: false,
    required: &["date_raw", "merchant", "amount_raw"],
    aliases: &[
        (
            "date_raw",
            &["利用日", "利用日付", "利用年月日", "ご利用日", "取引日"],
        ),
        (
            "merchant",
            &[
                "利用店名・商品名",
                "利用店名",
                "ご利用店名・商品名",
                "ご利用先",
                "加盟店名",
                "内容",
            ],
        ),
        (
            "amount_raw",
            &[
                "利用金額",
                "ご利用金額",
                "利用金額(円)",
                "利用金額（円）",
                "請求金額",
                "支払総額",
            ],
        ),
        ("cardholder", &["利用者", "利用者名", "カード利用者", "名義"]),
        ("category", &["カテゴリ", "業種", "分類"]),
        ("memo", &["備考", "メモ", "摘要", "コメント"]),
        (
            "payment_method",
            &["支払方法", "お支払方法", "お支払い方法"],
        ),
    ],
};

static BITFLYER_CARD: SourceSpec = SourceSpec {
    key: "bitflyer-card",
    label: "bitFlyer credit card (Aplus statement)",
    source_type: SourceType::CreditCard,
    encodings: UTF8_FIRST,
    min_score: 6,
    amount: AmountPolicy::Signed,
    payment_method: PaymentMethodRule::Installments,
    require_date: false,
    allow_short_dates: false,
    skip_merchant_prefixes: &[],
    skip_zero_amounts: false,
    strip_cardholder_honorific: false,
    required: &["date_raw", "merchant", "amount_raw"],
    aliases: &[
        ("card_number", &["カード番号"]),
        ("date_raw", &["ご利用日", "利用日", "利用日付"]),
        (
            "merchant",
            &["ご利用店名", "利用店名", "利用店名・商品名"],
        ),
        (
            "amount_raw",
            &["お支払金額", "ご利用金", "利用金額", "ご利用金額"],
        ),
        ("sale_type", &["売上種別"]),
        ("installments", &["支払回数", "お支払回数"]),
        ("current_installment", &["今回回数"]),
        (
            "memo",
            &[
                "摘要",
                "備考",
                "摘要   現地通貨額(通貨略称)／換算レート／換算日等／手数料",
            ],
        ),
    ],
};

static D_CARD: SourceSpec = SourceSpec {
    key: "d-card",
    label: "d CARD statement",
    source_type: SourceType::CreditCard,
    encodings: UTF8_FIRST,
    min_score: 12,
    amount: AmountPolicy::Signed,
    payment_method: PaymentMethodRule::Column,
    require_date: true,
    allow_short_dates: false,
    skip_merchant_prefixes: &[],
    skip_zero_amounts: true,
    strip_cardholder_honorific: true,
    required: &["date_raw", "merchant", "amount_raw", "cardholder"],
    aliases: &[
        ("cardholder", &["名前"]),
        ("date_raw", &["ご利用年月日"]),
        ("merchant", &["利用店名"]),
        ("amount_raw", &["支払い金額"]),
        ("card_number", &["カード番号"]),
        ("payment_method", &["支払区分"]),
        ("memo", &["摘要"]),
    ],
};

static VIEW_CARD: SourceSpec = SourceSpec {
    key: "view-card",
    label: "VIEW CARD statement",
    source_type: SourceType::CreditCard,
    encodings: UTF8_FIRST,
    min_score: 9,
    amount: AmountPolicy::Signed,
    payment_method: PaymentMethodRule::Column,
    require_date: true,
    allow_short_dates: false,
    skip_merchant_prefixes: &[],
    skip_zero_amounts: true,
    strip_cardholder_honorific: false,
    required: &["date_raw", "merchant", "amount_raw"],
    aliases: &[
        ("date_raw", &["ご利用年月日"]),
        ("merchant", &["ご利用箇所"]),
        (
            "amount_raw",
            &["今回ご請求額・弁済金（うち手数料・利息）"],
        ),
        ("payment_method", &["支払区分（回数）"]),
    ],
};

static HOKURIKU_BANK: SourceSpec = SourceSpec {
    key: "hokuriku-bank",
    label: "Hokuriku Bank account statement",
    source_type: SourceType::Bank,
    encodings: CP932_FIRST,
    min_score: 9,
    amount: AmountPolicy::DebitCredit,
    payment_method: PaymentMethodRule::TransactionType,
    require_date: false,
    allow_short_dates: false,
    skip_merchant_prefixes: &[],
    skip_zero_amounts: false,
    strip_cardholder_honorific: false,
    required: &["date_raw", "debit_raw", "credit_raw", "merchant"],
    aliases: &[
        ("date_raw", &["取扱日付", "取引日", "日付"]),
        ("debit_raw", &["お支払金額", "支払金額", "出金額"]),
        ("credit_raw", &["お預り金額", "預り金額", "入金額"]),
        ("transaction_type", &["取引区分", "取引内容"]),
        ("balance_raw", &["残高"]),
        ("merchant", &["摘要", "取引摘要", "内容"]),
        ("memo", &["メモ", "備考"]),
        ("base_date", &["起算日"]),
    ],
};

static JRE_BANK: SourceSpec = SourceSpec {
    key: "jre-bank",
    label: "JRE Bank account statement",
    source_type: SourceType::Bank,
    encodings: CP932_FIRST,
    min_score: 6,
    amount: AmountPolicy::NegateSigned,
    payment_method: PaymentMethodRule::AccountActivity,
    require_date: true,
    allow_short_dates: false,
    skip_merchant_prefixes: &[],
    skip_zero_amounts: false,
    strip_cardholder_honorific: false,
    required: &["date_raw", "amount_raw"],
    aliases: &[
        ("date_raw", &["取引日"]),
        ("amount_raw", &["入出金(円)", "入出金（円）"]),
        (
            "balance_raw",
            &["取引後残高(円)", "取引後残高（円）", "残高"],
        ),
        ("merchant", &["入出金内容", "摘要"]),
    ],
};

static SHINSEI_BANK: SourceSpec = SourceSpec {
    key: "shinsei-bank",
    label: "SBI Shinsei Bank account statement",
    source_type: SourceType::Bank,
    encodings: UTF8_FIRST,
    min_score: 9,
    amount: AmountPolicy::DebitCredit,
    payment_method: PaymentMethodRule::AccountActivity,
    require_date: true,
    allow_short_dates: false,
    skip_merchant_prefixes: &[],
    skip_zero_amounts: false,
    strip_cardholder_honorific: false,
    required: &["date_raw", "debit_raw", "credit_raw"],
    aliases: &[
        ("date_raw", &["取引日"]),
        ("merchant", &["摘要"]),
        ("debit_raw", &["出金金額"]),
        ("credit_raw", &["入金金額"]),
        ("balance_raw", &["残高"]),
        ("memo", &["メモ"]),
    ],
};

static SOURCES: [&SourceSpec; 7] = [
    &RAKUTEN_CARD,
    &BITFLYER_CARD,
    &D_CARD,
    &VIEW_CARD,
    &HOKURIKU_BANK,
    &JRE_BANK,
    &SHINSEI_BANK,
];

pub fn all() -> &'static [&'static SourceSpec] {
    &SOURCES
}

pub fn get(key: &str) -> Result<&'static SourceSpec> {
    all()
        .iter()
        .find(|s| s.key == key)
        .copied()
        .ok_or_else(|| KakeiError::UnknownSource(key.to_string()))
}
