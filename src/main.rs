// ==========================================
// 经营看板数据导入系统 - 命令行入口
// ==========================================
// 职责: 解析命令行参数，调用 ImportApi，输出上传汇总
// 取消: 处理中按 Ctrl-C 发出取消信号，剩余行记为已取消
// ==========================================

use anyhow::Context;
use bizops_import::api::ImportApi;
use bizops_import::config::ConfigManager;
use bizops_import::db::{get_default_db_path, open_shared_connection};
use bizops_import::domain::{BusinessUnit, DuplicatePolicy, UploadSummary};
use bizops_import::i18n::{set_locale, t_with_args};
use bizops_import::importer::{display_messages, summary_line};
use bizops_import::{logging, ImportOverrides, ValidationMode};
use clap::{Parser, Subcommand, ValueEnum};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser)]
#[command(
    name = "bizops-import",
    version,
    about = "经营看板数据导入 - KPI 指标与员工档案表格导入"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// 数据库路径（默认: 用户数据目录下 bizops-import/bizops.db）
    #[arg(long = "db", value_name = "PATH", global = true)]
    db: Option<String>,

    /// 提示语言（zh-CN / en）
    #[arg(long = "lang", default_value = "zh-CN", global = true)]
    lang: String,

    /// 以 JSON 行输出日志
    #[arg(long = "log-json", global = true)]
    log_json: bool,
}

#[derive(Subcommand)]
enum Command {
    /// 导入 KPI 指标表
    ImportKpi {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// 事业部（整个文件归属该事业部）
        #[arg(long = "business-unit", value_parser = parse_business_unit)]
        business_unit: BusinessUnit,

        #[command(flatten)]
        options: UploadArgs,
    },

    /// 导入员工档案表
    ImportEmployees {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        #[command(flatten)]
        options: UploadArgs,
    },

    /// 生成上传模板（xlsx）
    Template {
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,

        #[command(subcommand)]
        kind: TemplateKind,
    },

    /// 查看或修改导入配置
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(clap::Args)]
struct UploadArgs {
    /// 严格模式：无法识别的取值按行拒绝
    #[arg(long = "strict")]
    strict: bool,

    /// 已存在记录的处理方式（默认沿用配置）
    #[arg(long = "on-duplicate", value_enum)]
    on_duplicate: Option<DuplicateArg>,
}

#[derive(Clone, Copy, ValueEnum)]
enum DuplicateArg {
    Reject,
    Update,
}

#[derive(Subcommand)]
enum TemplateKind {
    /// KPI 模板
    Kpi {
        #[arg(long = "business-unit", value_parser = parse_business_unit)]
        business_unit: BusinessUnit,

        /// 导出当前指标值（无数据时生成占位行）
        #[arg(long = "live")]
        live: bool,
    },
    /// 员工模板
    Employees,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// 读取单个配置
    Get { key: String },
    /// 写入配置
    Set { key: String, value: String },
    /// 输出生效配置快照
    Snapshot,
}

fn parse_business_unit(raw: &str) -> Result<BusinessUnit, String> {
    BusinessUnit::from_vocab(raw).ok_or_else(|| format!("未知事业部: {}", raw))
}

impl UploadArgs {
    fn overrides(&self) -> ImportOverrides {
        ImportOverrides {
            mode: self.strict.then_some(ValidationMode::Strict),
            duplicate_policy: self.on_duplicate.map(|arg| match arg {
                DuplicateArg::Reject => DuplicatePolicy::Reject,
                DuplicateArg::Update => DuplicatePolicy::Update,
            }),
        }
    }
}

fn resolve_db_path(cli_db: Option<String>) -> anyhow::Result<String> {
    let db_path = cli_db.unwrap_or_else(get_default_db_path);
    if let Some(parent) = Path::new(&db_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("无法创建数据库目录: {}", parent.display()))?;
        }
    }
    Ok(db_path)
}

fn print_summary(summary: &UploadSummary) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(summary)?);
    for line in display_messages(summary) {
        println!("{}", line);
    }
    println!("{}", summary_line(summary));
    Ok(())
}

/// 上传期间监听 Ctrl-C，收到后请求取消
fn spawn_cancel_listener(api: Arc<ImportApi>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            match api.cancel_current_upload() {
                Ok(true) => warn!("收到中断信号，正在取消上传"),
                Ok(false) => {}
                Err(e) => warn!(error = %e, "取消上传失败"),
            }
        }
    })
}

/// 执行上传；期间 Ctrl-C 触发取消
async fn with_cancel_listener<F, T>(api: &Arc<ImportApi>, upload: F) -> T
where
    F: Future<Output = T>,
{
    let listener = spawn_cancel_listener(api.clone());
    let result = upload.await;
    listener.abort();
    result
}

fn report_upload(summary: &UploadSummary) -> anyhow::Result<()> {
    print_summary(summary)?;
    if summary.has_errors() {
        std::process::exit(2);
    }
    Ok(())
}

fn check_exists(file: &Path) -> anyhow::Result<()> {
    if !file.exists() {
        let path = file.display().to_string();
        anyhow::bail!(t_with_args("import.file_not_found", &[("path", path.as_str())]));
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.log_json {
        logging::init_json();
    } else {
        logging::init();
    }
    set_locale(&cli.lang);

    let db_path = resolve_db_path(cli.db)?;
    info!(version = bizops_import::VERSION, db_path = %db_path, "{}", bizops_import::APP_NAME);

    match cli.command {
        Command::ImportKpi {
            file,
            business_unit,
            options,
        } => {
            check_exists(&file)?;
            let api = Arc::new(ImportApi::open(&db_path)?);
            let upload = api.import_kpis(&file, business_unit, options.overrides());
            let summary = with_cancel_listener(&api, upload).await?;
            report_upload(&summary)?;
        }
        Command::ImportEmployees { file, options } => {
            check_exists(&file)?;
            let api = Arc::new(ImportApi::open(&db_path)?);
            let upload = api.import_employees(&file, options.overrides());
            let summary = with_cancel_listener(&api, upload).await?;
            report_upload(&summary)?;
        }
        Command::Template { output, kind } => {
            let api = ImportApi::open(&db_path)?;
            match kind {
                TemplateKind::Kpi {
                    business_unit,
                    live,
                } => {
                    let rows = api.generate_kpi_template(&output, business_unit, live).await?;
                    info!(rows, "KPI 模板行数");
                }
                TemplateKind::Employees => api.generate_employee_template(&output)?,
            }
            let path = output.display().to_string();
            println!("{}", t_with_args("template.written", &[("path", path.as_str())]));
        }
        Command::Config { action } => {
            let manager = ConfigManager::from_connection(open_shared_connection(&db_path)?)?;
            match action {
                ConfigAction::Get { key } => {
                    let snapshot: std::collections::BTreeMap<String, String> =
                        serde_json::from_str(&manager.get_config_snapshot()?)?;
                    let value = snapshot
                        .get(&key)
                        .with_context(|| format!("未知配置键: {}", key))?;
                    println!("{}", value);
                }
                ConfigAction::Set { key, value } => {
                    let stored = manager.set_config_value(&key, &value)?;
                    println!("{} = {}", key, stored);
                }
                ConfigAction::Snapshot => println!("{}", manager.get_config_snapshot()?),
            }
        }
    }

    Ok(())
}
