use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn kakei() -> Command {
    Command::cargo_bin("kakei").unwrap()
}

fn write(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}

#[test]
fn sources_lists_builtins() {
    kakei()
        .arg("sources")
        .assert()
        .success()
        .stdout(predicate::str::contains("rakuten-card"))
        .stdout(predicate::str::contains("d-card"))
        .stdout(predicate::str::contains("view-card"))
        .stdout(predicate::str::contains("hokuriku-bank"))
        .stdout(predicate::str::contains("credit_card"));
}

#[test]
fn import_unknown_source_fails() {
    kakei()
        .args(["import", "--source", "mizuho-bank"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown source"));
}

#[test]
fn import_without_files_fails() {
    let dir = TempDir::new().unwrap();
    kakei()
        .args(["import", "--source", "rakuten-card"])
        .args(["--input-dir".as_ref(), dir.path().as_os_str()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no input files"));
}

#[test]
fn import_writes_bom_prefixed_canonical_csv() {
    let dir = TempDir::new().unwrap();
    let input = write(
        &dir,
        "meisai.csv",
        "利用日,利用店名・商品名,利用者,支払方法,利用金額\n\
         2025/04/01,コンビニ,本人,1回払い,500\n\
         2025/04/02,スーパー,本人,1回払い,\"1,234\"\n",
    );
    let output = dir.path().join("normalized.csv");

    kakei()
        .args(["import", "--source", "rakuten-card"])
        .arg(&input)
        .arg("--output")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("[OK]"))
        .stdout(predicate::str::contains("rows=2 skipped=0"))
        .stdout(predicate::str::contains("[DONE]"));

    let bytes = std::fs::read(&output).unwrap();
    assert_eq!(&bytes[..3], b"\xef\xbb\xbf");
    let text = String::from_utf8(bytes[3..].to_vec()).unwrap();
    assert!(text.starts_with("transaction_id,date,date_raw,merchant,amount_jpy"));
    assert!(text.contains("2025-04-01"));
    assert!(text.contains("1234"));
}

#[test]
fn import_survives_one_bad_file() {
    let dir = TempDir::new().unwrap();
    write(&dir, "bad.csv", "これはヘッダーのないファイルです\n");
    write(
        &dir,
        "good.csv",
        "利用日,利用店名・商品名,利用金額\n2025/04/01,コンビニ,500\n",
    );
    let output = dir.path().join("normalized.csv");

    kakei()
        .args(["import", "--source", "rakuten-card"])
        .args(["--input-dir".as_ref(), dir.path().as_os_str()])
        .arg("--output")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("good.csv"))
        .stderr(predicate::str::contains("[NG]"))
        .stderr(predicate::str::contains("bad.csv"));

    assert!(output.exists());
}

#[test]
fn import_fails_when_every_file_fails() {
    let dir = TempDir::new().unwrap();
    write(&dir, "bad.csv", "no header here\n");

    kakei()
        .args(["import", "--source", "rakuten-card"])
        .args(["--input-dir".as_ref(), dir.path().as_os_str()])
        .arg("--output")
        .arg(dir.path().join("normalized.csv"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("no file could be processed"));
}

#[test]
fn merge_warns_on_missing_input_and_fails_with_none() {
    let dir = TempDir::new().unwrap();
    let ghost = dir.path().join("ghost.csv");

    kakei()
        .arg("merge")
        .arg(format!("rakutenCard:credit_card:{}", ghost.display()))
        .arg("--output")
        .arg(dir.path().join("all.csv"))
        .assert()
        .failure()
        .stdout(predicate::str::contains("[WARN]"))
        .stderr(predicate::str::contains("no file could be processed"));
}

#[test]
fn full_pipeline_import_merge_report() {
    let dir = TempDir::new().unwrap();
    let card_input = write(
        &dir,
        "card.csv",
        "利用日,利用店名・商品名,利用金額\n\
         2025/01/10,セブンイレブン,1200\n\
         2025/01/15,家電量販店,150000\n",
    );
    let bank_input = write(
        &dir,
        "bank.csv",
        "取引日,摘要,出金金額,入金金額,残高\n\
         2025/01/05,給与,,300000,500000\n\
         2025/01/20,ガス料金,8000,,492000\n",
    );
    let card_norm = dir.path().join("card_norm.csv");
    let bank_norm = dir.path().join("bank_norm.csv");
    let merged = dir.path().join("all.csv");
    let report = dir.path().join("report.md");

    kakei()
        .args(["import", "--source", "rakuten-card"])
        .arg(&card_input)
        .arg("--output")
        .arg(&card_norm)
        .assert()
        .success();

    kakei()
        .args(["import", "--source", "shinsei-bank"])
        .arg(&bank_input)
        .arg("--output")
        .arg(&bank_norm)
        .assert()
        .success();

    kakei()
        .arg("merge")
        .arg(format!("rakutenCard:credit_card:{}", card_norm.display()))
        .arg(format!("shinseiBank:bank:{}", bank_norm.display()))
        .arg("--output")
        .arg(&merged)
        .assert()
        .success()
        .stdout(predicate::str::contains("sources=2 records=4"));

    let merged_text = {
        let bytes = std::fs::read(&merged).unwrap();
        String::from_utf8(bytes[3..].to_vec()).unwrap()
    };
    assert!(merged_text.starts_with("source_name,source_type,transaction_id"));
    // Sorted by date: the Jan 5 deposit comes first, tagged as inflow.
    let first_row = merged_text.lines().nth(1).unwrap();
    assert!(first_row.starts_with("shinseiBank,bank,"));
    assert!(first_row.contains("-300000,0,"));

    kakei()
        .arg("report")
        .arg("--input")
        .arg(&merged)
        .args(["--year", "2025"])
        .arg("--output")
        .arg(&report)
        .assert()
        .success()
        .stdout(predicate::str::contains("rows=4"));

    let report_text = std::fs::read_to_string(&report).unwrap();
    assert!(report_text.contains("# 家計レポート 2025"));
    assert!(report_text.contains("| 2025-01 | 300,000 | 8,000 | 292,000 |"));
    assert!(report_text.contains("| 2025-01-15 | card | 家電量販店 | 150,000 |"));
}

#[test]
fn report_fails_on_year_without_data() {
    let dir = TempDir::new().unwrap();
    let input = write(
        &dir,
        "all.csv",
        "source_name,source_type,transaction_id,date,date_raw,merchant,amount_jpy,is_outflow,\
         cardholder,category,memo,payment_method,transaction_type,debit_jpy,credit_jpy,balance_jpy,\
         card_number,sale_type,installments,current_installment,source_file,source_row,\
         source_encoding,imported_at,merged_at\n\
         a,bank,x,2024-01-01,2024/01/01,店,500,1,,,,,,,,,,,,,f.csv,2,utf-8-sig,t,t\n",
    );

    kakei()
        .arg("report")
        .arg("--input")
        .arg(&input)
        .args(["--year", "2025"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no transactions dated in 2025"));
}
