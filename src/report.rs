use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use chrono::{Datelike, NaiveDate};

use crate::classify::{classify, normalize_merchant, RuleBook};
use crate::error::Result;
use crate::fmt::{percent, yen};
use crate::merge;
use crate::models::MergedTransaction;

/// Spends at or above this are special regardless of frequency.
const SPECIAL_LARGE_JPY: i64 = 100_000;
/// Spends at or above this are special when the merchant is infrequent.
const SPECIAL_INFREQUENT_JPY: i64 = 50_000;
/// A merchant seen in this many distinct months or fewer is infrequent.
const INFREQUENT_MAX_MONTHS: usize = 2;

const DRIVER_FALLBACK: &str = "その他";
const SPECIAL_FALLBACK: &str = "その他特別";

/// One outflow as the report analyzes it, merchant already normalized.
#[derive(Debug, Clone)]
pub struct SpendRecord {
    pub day: String,
    pub source: &'static str,
    pub merchant: String,
    pub amount: i64,
}

/// Load the merged table and keep the rows dated inside the report year.
pub fn load_year(path: &Path, year: i32) -> Result<Vec<MergedTransaction>> {
    let rows = merge::load_source_merged(path)?;
    Ok(rows
        .into_iter()
        .filter(|row| {
            NaiveDate::parse_from_str(&row.date, "%Y-%m-%d")
                .map(|d| d.year() == year)
                .unwrap_or(false)
        })
        .collect())
}

fn month_keys(year: i32) -> Vec<String> {
    (1..=12).map(|m| format!("{year}-{m:02}")).collect()
}

/// Monthly bank inflow and outflow. Canonical amounts are outflow-positive,
/// so positive goes to the out column and negative to the in column.
pub fn bank_monthly(rows: &[MergedTransaction], year: i32) -> BTreeMap<String, (i64, i64)> {
    let mut months: BTreeMap<String, (i64, i64)> = month_keys(year)
        .into_iter()
        .map(|ym| (ym, (0, 0)))
        .collect();
    for row in rows {
        if row.source_type != "bank" {
            continue;
        }
        let ym = &row.date[..row.date.len().min(7)];
        if let Some((inflow, outflow)) = months.get_mut(ym) {
            if row.amount_jpy > 0 {
                *outflow += row.amount_jpy;
            } else if row.amount_jpy < 0 {
                *inflow += -row.amount_jpy;
            }
        }
    }
    months
}

/// Outflows worth classifying: every card spend, and bank spends that are not
/// excluded by rule (card settlements hit the bank too; excluding them keeps
/// each yen counted once).
pub fn spending_records(rows: &[MergedTransaction], book: &RuleBook) -> Vec<SpendRecord> {
    let mut records = Vec::new();
    for row in rows {
        if row.amount_jpy <= 0 {
            continue;
        }
        let merchant = normalize_merchant(&row.merchant);
        let source = match row.source_type.as_str() {
            "credit_card" => "card",
            "bank" => {
                if book.is_bank_excluded(&merchant) {
                    continue;
                }
                "bank"
            }
            _ => continue,
        };
        records.push(SpendRecord {
            day: row.date.clone(),
            source,
            merchant,
            amount: row.amount_jpy,
        });
    }
    records
}

/// Special spends: large one-offs, or sizable amounts at merchants that only
/// show up in a couple of months across the year.
pub fn special_records(spends: &[SpendRecord]) -> Vec<SpendRecord> {
    let mut months_by_merchant: HashMap<&str, HashSet<&str>> = HashMap::new();
    for record in spends {
        months_by_merchant
            .entry(&record.merchant)
            .or_default()
            .insert(ym(&record.day));
    }

    spends
        .iter()
        .filter(|record| {
            let merchant_months = months_by_merchant
                .get(record.merchant.as_str())
                .map(|set| set.len())
                .unwrap_or(0);
            record.amount >= SPECIAL_LARGE_JPY
                || (record.amount >= SPECIAL_INFREQUENT_JPY
                    && merchant_months <= INFREQUENT_MAX_MONTHS)
        })
        .cloned()
        .collect()
}

fn ym(day: &str) -> &str {
    &day[..day.len().min(7)]
}

struct DriverSummary {
    totals: Vec<(String, i64)>,
    examples: HashMap<String, Vec<(String, i64)>>,
}

fn driver_summary(spends: &[SpendRecord], book: &RuleBook) -> DriverSummary {
    let mut totals: HashMap<String, i64> = HashMap::new();
    let mut examples: HashMap<String, HashMap<String, i64>> = HashMap::new();
    for record in spends {
        let category = classify(&record.merchant, &book.driver, DRIVER_FALLBACK).to_string();
        *totals.entry(category.clone()).or_default() += record.amount;
        *examples
            .entry(category)
            .or_default()
            .entry(record.merchant.clone())
            .or_default() += record.amount;
    }

    let mut totals: Vec<(String, i64)> = totals.into_iter().collect();
    totals.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    let examples = examples
        .into_iter()
        .map(|(category, merchants)| {
            let mut merchants: Vec<(String, i64)> = merchants.into_iter().collect();
            merchants.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
            merchants.truncate(3);
            (category, merchants)
        })
        .collect();

    DriverSummary { totals, examples }
}

fn monthly_split(
    year: i32,
    spends: &[SpendRecord],
    specials: &[SpendRecord],
) -> BTreeMap<String, (i64, i64)> {
    // (special, total) per month; driver is derived at render time.
    let mut months: BTreeMap<String, (i64, i64)> = month_keys(year)
        .into_iter()
        .map(|key| (key, (0, 0)))
        .collect();
    for record in spends {
        if let Some((_, total)) = months.get_mut(ym(&record.day)) {
            *total += record.amount;
        }
    }
    for record in specials {
        if let Some((special, _)) = months.get_mut(ym(&record.day)) {
            *special += record.amount;
        }
    }
    months
}

fn display_merchant(merchant: &str) -> &str {
    if merchant.is_empty() {
        "(摘要空欄)"
    } else {
        merchant
    }
}

fn render_integrated_table(
    bank: &BTreeMap<String, (i64, i64)>,
    split: &BTreeMap<String, (i64, i64)>,
    lines: &mut Vec<String>,
) {
    lines.push(
        "| 月 | 入金(円) | 口座支出(円) | 収支(円) | 主要ドライバー(円) | 特別支出(円) | 分析支出合計(円) |"
            .to_string(),
    );
    lines.push("|---|---:|---:|---:|---:|---:|---:|".to_string());

    let mut sums = (0i64, 0i64, 0i64, 0i64, 0i64, 0i64);
    for (month, (inflow, outflow)) in bank {
        let (special, total) = split.get(month).copied().unwrap_or((0, 0));
        let net = inflow - outflow;
        let driver = total - special;
        sums.0 += inflow;
        sums.1 += outflow;
        sums.2 += net;
        sums.3 += driver;
        sums.4 += special;
        sums.5 += total;
        lines.push(format!(
            "| {month} | {} | {} | {} | {} | {} | {} |",
            yen(*inflow),
            yen(*outflow),
            yen(net),
            yen(driver),
            yen(special),
            yen(total),
        ));
    }
    lines.push(format!(
        "| 合計 | {} | {} | {} | {} | {} | {} |",
        yen(sums.0),
        yen(sums.1),
        yen(sums.2),
        yen(sums.3),
        yen(sums.4),
        yen(sums.5),
    ));
}

fn render_driver_table(summary: &DriverSummary, lines: &mut Vec<String>) {
    let grand_total: i64 = summary.totals.iter().map(|(_, amount)| amount).sum();
    lines.push("| 分類 | 金額(円) | 構成比 | 主な内容 |".to_string());
    lines.push("|---|---:|---:|---|".to_string());
    for (category, amount) in &summary.totals {
        let major = summary
            .examples
            .get(category)
            .map(|merchants| {
                merchants
                    .iter()
                    .map(|(name, _)| display_merchant(name))
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .unwrap_or_default();
        lines.push(format!(
            "| {category} | {} | {} | {major} |",
            yen(*amount),
            percent(*amount, grand_total),
        ));
    }
    lines.push(format!("| 合計 | {} | 100.0% |  |", yen(grand_total)));
}

fn render_special_tables(specials: &[SpendRecord], book: &RuleBook, lines: &mut Vec<String>) {
    let mut category_sum: HashMap<&str, (i64, usize)> = HashMap::new();
    for record in specials {
        let category = classify(&record.merchant, &book.special, SPECIAL_FALLBACK);
        let entry = category_sum.entry(category).or_default();
        entry.0 += record.amount;
        entry.1 += 1;
    }
    let mut categories: Vec<(&str, (i64, usize))> = category_sum.into_iter().collect();
    categories.sort_by(|a, b| b.1 .0.cmp(&a.1 .0).then_with(|| a.0.cmp(b.0)));

    lines.push("## 特別支出分類".to_string());
    lines.push("| 分類 | 金額(円) | 件数 |".to_string());
    lines.push("|---|---:|---:|".to_string());
    let grand_total: i64 = categories.iter().map(|(_, (amount, _))| amount).sum();
    for (category, (amount, count)) in &categories {
        lines.push(format!("| {category} | {} | {count} |", yen(*amount)));
    }
    lines.push(format!(
        "| 合計 | {} | {} |",
        yen(grand_total),
        specials.len()
    ));
    lines.push(String::new());

    let mut top: Vec<&SpendRecord> = specials.iter().collect();
    top.sort_by(|a, b| b.amount.cmp(&a.amount));
    top.truncate(10);

    lines.push("## 特別支出 上位10件".to_string());
    lines.push("| 日付 | ソース | 内容 | 金額(円) |".to_string());
    lines.push("|---|---|---|---:|".to_string());
    for record in top {
        lines.push(format!(
            "| {} | {} | {} | {} |",
            record.day,
            record.source,
            display_merchant(&record.merchant),
            yen(record.amount),
        ));
    }
}

/// Render the Markdown household report for one year of merged transactions.
pub fn render(
    year: i32,
    rows: &[MergedTransaction],
    book: &RuleBook,
    generated_at: &str,
) -> String {
    let bank = bank_monthly(rows, year);
    let spends = spending_records(rows, book);
    let specials = special_records(&spends);
    let split = monthly_split(year, &spends, &specials);
    let drivers = driver_summary(&spends, book);

    let mut lines = Vec::new();
    lines.push(format!("# 家計レポート {year}"));
    lines.push(String::new());
    lines.push(format!("- 生成日時(UTC): `{generated_at}`"));
    lines.push("- 月次収支: 銀行口座ベース".to_string());
    lines.push("- 支出ドライバー: カード支出 + 銀行直接支出（除外ルール適用後）".to_string());
    lines.push(String::new());
    lines.push("## 月次 支出入・支出内訳（統合表）".to_string());
    render_integrated_table(&bank, &split, &mut lines);
    lines.push(String::new());
    lines.push("## 主要支出ドライバー分類".to_string());
    render_driver_table(&drivers, &mut lines);
    lines.push(String::new());
    render_special_tables(&specials, book, &mut lines);
    lines.push(String::new());
    lines.join("\n")
}
