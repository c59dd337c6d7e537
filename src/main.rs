use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use receipt_audit::api::{ApiClient, AuditBackend, RulesUpload};
use receipt_audit::cli::{Cli, Commands, RulesAction};
use receipt_audit::config::Config;
use receipt_audit::download::{self, ReportArtifact};
use receipt_audit::error::{AuditError, Result};
use receipt_audit::rules::RulesPanel;
use receipt_audit::workflow::{BatchKind, BatchProgress, BatchReport, Workflow};
use receipt_audit::{edit, scanner, session, view};
use receipt_audit_common::RecordId;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = Config::load()?;

    match cli.command {
        Commands::Config { set_api_url, show } => configure(config, set_api_url, show),
        command => {
            let api_url = cli.api_url.unwrap_or_else(|| config.api_url());
            let client = ApiClient::new(&api_url, config.timeout())?;
            let session_path = cli.session.unwrap_or_else(session::default_path);
            let workflow = Workflow::new(client, session::load(&session_path))
                .with_preview_size(config.preview_max_size);

            let result = run(command, &workflow, &config).await;

            // プレビューを反映してから保存
            workflow.wait_previews().await;
            session::save(&session_path, &workflow.snapshot())?;
            result
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "receipt_audit=debug,info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn configure(mut config: Config, set_api_url: Option<String>, show: bool) -> Result<()> {
    if let Some(url) = set_api_url {
        config.set_api_url(url)?;
        println!("✔ バックエンドURLを保存しました");
    }

    if show {
        println!("設定ファイル: {}", Config::config_path()?.display());
        println!("バックエンドURL: {}", config.api_url());
        println!("タイムアウト: {}秒", config.timeout().as_secs());
        println!("レポート保存先: {}", config.output_dir.display());
        println!("プレビューサイズ: {}px", config.preview_max_size);
    }
    Ok(())
}

async fn run<B: AuditBackend>(command: Commands, workflow: &Workflow<B>, config: &Config) -> Result<()> {
    match command {
        Commands::Add { paths } => {
            add_files(workflow, &paths)?;
        }

        Commands::Demo { scenario } => {
            workflow.load_scenario(&scenario)?;
            println!("✔ デモシナリオを読み込みました\n");
            println!("{}", view::review_stage(&workflow.snapshot()));
        }

        Commands::List => {
            println!("{}", view::upload_stage(&workflow.snapshot()));
        }

        Commands::Show { id } => {
            let snapshot = workflow.snapshot();
            match id {
                Some(id) => {
                    let record = snapshot.store.require(&RecordId::from(id))?;
                    println!("[{}] {}  [{}]", record.id, record.display_name(), record.status.label());
                    if let Some(data) = &record.receipt_data {
                        println!("{}", view::receipt_table(data));
                    }
                    if let Some(result) = &record.audit_result {
                        println!("{}", view::audit_detail(result));
                    }
                    if let Some(err) = &record.error {
                        println!("⚠ {}", err);
                    }
                }
                None => println!("{}", view::render(&snapshot)),
            }
        }

        Commands::Select { id } => {
            workflow.select(&RecordId::from(id.as_str()))?;
            println!("✔ {} を選択しました", id);
        }

        Commands::Edit { id } => {
            edit::run_interactive_edit(workflow, &RecordId::from(id))?;
        }

        Commands::Remove { id } => {
            if !workflow.remove(&RecordId::from(id.as_str())) {
                return Err(receipt_audit_common::Error::RecordNotFound(id).into());
            }
            println!("✔ {} を削除しました", id);
        }

        Commands::Reset => {
            workflow.reset();
            println!("✔ セッションを初期化しました");
        }

        Commands::Extract { id } => match id {
            Some(id) => {
                let data = workflow.extract_one(&RecordId::from(id)).await?;
                println!("✔ OCR抽出完了\n");
                println!("{}", view::receipt_table(&data));
            }
            None => {
                run_batch(workflow, BatchKind::Extract).await;
            }
        },

        Commands::Audit { id } => match id {
            Some(id) => {
                let result = workflow.audit_one(&RecordId::from(id)).await?;
                println!("✔ 監査完了\n");
                println!("{}", view::audit_detail(&result));
            }
            None => {
                run_batch(workflow, BatchKind::Audit).await;
            }
        },

        Commands::Confirm { id, batch, output } => {
            let output_dir = output.unwrap_or_else(|| config.output_dir.clone());
            if let Some(id) = id {
                let artifact = workflow.confirm_one(&RecordId::from(id)).await?;
                save_artifact(&artifact, &output_dir)?;
            } else if batch {
                confirm_batch(workflow, &output_dir).await?;
            } else {
                let report = run_batch(workflow, BatchKind::Confirm).await;
                let outcome = download::save_all(&report.artifacts, &output_dir);
                for path in &outcome.saved {
                    println!("📄 レポートを保存: {}", path.display());
                }
                for (name, err) in &outcome.failed {
                    println!("✗ {}: {}", name, err);
                }
                if let Some((_, err)) = outcome.failed.into_iter().next() {
                    return Err(err);
                }
            }
        }

        Commands::Run { paths, output } => {
            println!("🧾 receipt-audit - 一括監査\n");

            println!("[1/4] レシートを追加中...");
            if add_files(workflow, &paths)? == 0 {
                return Err(AuditError::NoEligibleRecords);
            }

            println!("\n[2/4] OCR抽出中...");
            run_batch(workflow, BatchKind::Extract).await;

            println!("\n[3/4] 監査中...");
            run_batch(workflow, BatchKind::Audit).await;

            println!("\n[4/4] レポート生成中...");
            let output_dir = output.unwrap_or_else(|| config.output_dir.clone());
            confirm_batch(workflow, &output_dir).await?;

            println!("\n{}", view::results_stage(&workflow.snapshot()));
            println!("✅ 完了");
        }

        Commands::Rules { action } => {
            let mut panel = RulesPanel::new(workflow.backend());
            match action {
                RulesAction::List => {
                    let rules = panel.refresh().await?;
                    println!("{}", view::rules_panel(rules));
                }
                RulesAction::Add { file, text } => {
                    let ack = panel.create(RulesUpload { file, text }).await?;
                    println!("✔ {}\n", ack.message);
                    if let Some(rules) = panel.cached() {
                        println!("{}", view::rules_panel(rules));
                    }
                }
                RulesAction::Update { id, content } => {
                    let ack = panel.update(&id, &content).await?;
                    println!("✔ {}", ack.message);
                }
                RulesAction::Delete { id } => {
                    let ack = panel.delete(&id).await?;
                    println!("✔ {}", ack.message);
                }
            }
        }

        Commands::Health => {
            let health = workflow.backend().health().await?;
            println!("✔ バックエンド: {}", health.status);
        }

        Commands::Config { .. } => unreachable!("config はセッション外で処理"),
    }

    Ok(())
}

/// 画像を検証して追加し、追加件数を返す
fn add_files<B: AuditBackend>(workflow: &Workflow<B>, paths: &[PathBuf]) -> Result<usize> {
    let selection = scanner::select(paths)?;
    for rejected in &selection.rejected {
        println!("✗ {}", rejected);
    }
    let ids = workflow.add_files(selection.accepted);
    println!("✔ {}件のレシートを追加", ids.len());
    Ok(ids.len())
}

async fn run_batch<B: AuditBackend>(workflow: &Workflow<B>, kind: BatchKind) -> BatchReport {
    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    bar.set_message(kind.label());
    bar.enable_steady_tick(Duration::from_millis(120));

    let report = workflow
        .run_batch(kind, &mut |progress: &BatchProgress| {
            bar.set_length(progress.total as u64);
            bar.inc(1);
            if let Some(err) = &progress.error {
                bar.println(format!("  ✗ {}: {}", progress.id, err));
            }
        })
        .await;
    bar.finish_and_clear();

    if report.attempted == 0 {
        println!("- 対象のレシートがありません");
    } else {
        println!("✔ {}: {}/{}件成功", kind.label(), report.succeeded, report.attempted);
    }
    if let Some(notice) = report.notice() {
        println!("⚠ {}", notice);
    }
    report
}

async fn confirm_batch<B: AuditBackend>(workflow: &Workflow<B>, output_dir: &Path) -> Result<()> {
    match workflow.confirm_batch().await {
        Ok(artifact) => save_artifact(&artifact, output_dir),
        Err(AuditError::NoEligibleRecords) => {
            println!("- 監査済みのレシートがありません");
            Ok(())
        }
        Err(e) => Err(e),
    }
}

fn save_artifact(artifact: &ReportArtifact, output_dir: &Path) -> Result<()> {
    let path = artifact.save(output_dir)?;
    println!("📄 レポートを保存: {}", path.display());
    Ok(())
}
