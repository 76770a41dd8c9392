use anyhow::{Context, Result, bail};
use chrono::{Datelike, Local, Utc, Weekday};
use paytally_core::{LedgerStore, Normalizer, Reconciler, RunReport, UuidIds, parse_tz};
use paytally_ingest::{combine_pages, parse_payments_table, read_exports, save_backup};
use paytally_sheets::{SheetsClient, day_name, is_payday, payout_weekday};
use std::path::PathBuf;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::ledger_file::LedgerFile;
use crate::state::{default_backup_dir, expand_home};

#[derive(Debug, Clone)]
pub struct ReconcileArgs {
    pub html: Vec<PathBuf>,
    pub dry_run: bool,
    pub force: bool,
    pub no_backup: bool,
    pub ledger_file: Option<PathBuf>,
    pub json: bool,
}

/// Weekday "now" in the configured schedule zone.
pub fn today_in(cfg: &Config) -> Result<Weekday> {
    let tz = parse_tz(&cfg.schedule.timezone)?;
    Ok(Utc::now().with_timezone(&tz).weekday())
}

pub async fn run_payday(cfg: &Config) -> Result<()> {
    let today = today_in(cfg)?;
    let client = SheetsClient::new(cfg.ledger_url()?)?;
    let day = payout_weekday(&client, &cfg.ledger.settings_table, cfg.schedule.default_payout_weekday).await;
    if is_payday(day, today) {
        println!("Today is payday ({}).", day_name(day));
    } else {
        println!(
            "Payday is {}; today is {}.",
            day_name(day),
            day_name(today.num_days_from_sunday())
        );
    }
    Ok(())
}

pub async fn run_reconcile(cfg: &Config, args: ReconcileArgs) -> Result<()> {
    if args.html.is_empty() {
        bail!("no exports given (pass --html <file>...)");
    }

    match &args.ledger_file {
        Some(path) => {
            let store = LedgerFile::load(path)?;
            if !args.force {
                let day = cfg.schedule.default_payout_weekday;
                if !is_payday(day, today_in(cfg)?) {
                    info!(payday = day_name(day), "not payday, skipping (use --force to run anyway)");
                    return Ok(());
                }
            }
            let report = reconcile_with(cfg, &args, &store).await?;
            if !args.dry_run {
                store.save()?;
                info!(path = %path.display(), "ledger file updated");
            }
            print_report(&report, args.json)
        }
        None => {
            let client = SheetsClient::new(cfg.ledger_url()?)?;
            if !args.force {
                let day = payout_weekday(
                    &client,
                    &cfg.ledger.settings_table,
                    cfg.schedule.default_payout_weekday,
                )
                .await;
                if !is_payday(day, today_in(cfg)?) {
                    info!(payday = day_name(day), "not payday, skipping (use --force to run anyway)");
                    return Ok(());
                }
            }
            let report = reconcile_with(cfg, &args, &client).await?;
            print_report(&report, args.json)
        }
    }
}

async fn reconcile_with<S: LedgerStore + ?Sized>(
    cfg: &Config,
    args: &ReconcileArgs,
    store: &S,
) -> Result<RunReport> {
    let pages = read_exports(&args.html)?;
    let html = combine_pages(&pages);

    if !args.no_backup {
        let dir = match &cfg.ingest.backup_dir {
            Some(d) => expand_home(d)?,
            None => default_backup_dir()?,
        };
        match save_backup(&dir, &html, Local::now().naive_local()) {
            Ok(path) => info!(path = %path.display(), "export archived"),
            Err(e) => warn!(error = %e, "could not archive export"),
        }
    }

    let page_tz = cfg.ingest.page_timezone.as_deref().map(parse_tz).transpose()?;
    let raws = parse_payments_table(&html)?;
    let entries = Normalizer::new(page_tz)?.normalize_all(&raws);
    info!(pages = pages.len(), rows = raws.len(), entries = entries.len(), "export parsed");

    let reconciler = Reconciler::new(cfg.ledger.table.clone()).dry_run(args.dry_run);
    match reconciler.run(store, &entries, &mut UuidIds).await {
        Ok(report) => Ok(report),
        Err(e) => {
            error!(error = %e, entries = entries.len(), "run aborted, processed 0 entries");
            Err(e)
        }
    }
}

fn print_report(report: &RunReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report).context("serialize report")?);
        return Ok(());
    }
    println!("{report}");
    for failure in report.failures() {
        println!("  failed {} {}: {:?}", failure.action.as_str(), failure.record_id, failure.outcome);
    }
    if report.dry_run {
        for m in &report.plan {
            println!("  would {} {}", m.action().as_str(), m.record_id());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use paytally_core::WorkType;
    use paytally_sheets::protocol::decode_records;
    use serde_json::{Value, json};
    use std::fs;
    use std::path::Path;

    const EXPORT: &str = r#"<table>
        <tr><th>Submitted</th><th>Project</th><th>Type</th><th>Duration</th><th>Amount</th></tr>
        <tr><td>2026-02-17T15:00:00Z</td><td>Rate responses</td><td>Task</td><td></td><td>$12.50</td></tr>
        <tr><td>2026-02-18T10:00:00Z</td><td>Review batch</td><td>Project Time</td><td>1h 30m</td><td>$30.00</td></tr>
    </table>"#;

    fn args(dir: &Path, ledger: &Path, dry_run: bool) -> ReconcileArgs {
        let html = dir.join("page1.html");
        fs::write(&html, EXPORT).unwrap();
        ReconcileArgs {
            html: vec![html],
            dry_run,
            force: true,
            no_backup: true,
            ledger_file: Some(ledger.to_path_buf()),
            json: false,
        }
    }

    fn write_rows(path: &Path, rows: Value) {
        fs::write(path, json!({ "records": rows }).to_string()).unwrap();
    }

    fn read_rows(path: &Path) -> Vec<Value> {
        let v: Value = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        v["records"].as_array().unwrap().clone()
    }

    fn seed_ledger(path: &Path) {
        write_rows(
            path,
            json!([{"id": "r1", "earnings": 12.5, "type": "task", "submittedAt": "2026-02-17T15:02:00Z"}]),
        );
    }

    #[tokio::test]
    async fn test_offline_run_writes_ledger_file() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = dir.path().join("ledger.json");
        seed_ledger(&ledger);

        run_reconcile(&Config::default(), args(dir.path(), &ledger, false)).await.unwrap();

        let records = decode_records(read_rows(&ledger));
        assert_eq!(records.len(), 2);
        let inserted = records.iter().find(|r| r.id != "r1").unwrap();
        assert_eq!(inserted.earnings, 30.0);
        assert_eq!(inserted.work_type, WorkType::ProjectTime);

        // Second pass over the same export changes nothing.
        let before = fs::read_to_string(&ledger).unwrap();
        run_reconcile(&Config::default(), args(dir.path(), &ledger, false)).await.unwrap();
        assert_eq!(fs::read_to_string(&ledger).unwrap(), before);
    }

    #[tokio::test]
    async fn test_offline_run_keeps_rows_and_columns_it_does_not_model() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = dir.path().join("ledger.json");
        write_rows(
            &ledger,
            json!([
                {"id": "r1", "earnings": 12.5, "type": "task", "submittedAt": "2026-02-20T09:00:00Z", "platform": "DA"},
                {"earnings": 99, "notes": "row with no id"},
                {"id": "r3", "earnings": 4, "type": "bonus"}
            ]),
        );

        run_reconcile(&Config::default(), args(dir.path(), &ledger, false)).await.unwrap();

        let rows = read_rows(&ledger);
        assert_eq!(rows.len(), 4);
        // r1 was corrected in place; its extra column is untouched.
        assert_eq!(rows[0]["submittedAt"], "2026-02-17T15:00:00+00:00");
        assert_eq!(rows[0]["platform"], "DA");
        assert_eq!(rows[1], json!({"earnings": 99, "notes": "row with no id"}));
        assert_eq!(rows[2], json!({"id": "r3", "earnings": 4, "type": "bonus"}));
        assert_eq!(rows[3]["earnings"], 30.0);
    }

    #[tokio::test]
    async fn test_dry_run_leaves_ledger_file_alone() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = dir.path().join("ledger.json");
        seed_ledger(&ledger);
        let before = fs::read_to_string(&ledger).unwrap();

        run_reconcile(&Config::default(), args(dir.path(), &ledger, true)).await.unwrap();

        assert_eq!(fs::read_to_string(&ledger).unwrap(), before);
    }

    #[tokio::test]
    async fn test_missing_ledger_url_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = dir.path().join("unused.json");
        let mut a = args(dir.path(), &ledger, true);
        a.ledger_file = None;
        assert!(run_reconcile(&Config::default(), a).await.is_err());
    }
}
