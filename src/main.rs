use clap::Parser;
use doc_qa::config::toml_config::TomlConfig;
use doc_qa::domain::model::{QueryResponse, PREVIEW_CHAR_LIMIT};
use doc_qa::domain::ports::DocumentSource;
use doc_qa::utils::error::ErrorSeverity;
use doc_qa::utils::{logger, validation::Validate};
use doc_qa::{
    AppConfig, AppError, CliConfig, ConfigOverrides, DocumentExtractor, GeminiBackend,
    GroundedQueryClient, LocalDocumentSource, Session,
};
use tokio::io::{AsyncBufReadExt, BufReader};

/// 根據錯誤嚴重程度決定退出碼
fn exit_code(e: &AppError) -> i32 {
    match e.severity() {
        ErrorSeverity::Low => 0,      // 警告，但成功
        ErrorSeverity::Medium => 2,   // 請求被拒絕
        ErrorSeverity::High => 1,     // 遠端或文件錯誤
        ErrorSeverity::Critical => 3, // 配置或系統錯誤
    }
}

fn report(e: &AppError) {
    // 記錄詳細錯誤信息
    tracing::error!(
        "{} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    // 輸出用戶友好的錯誤信息
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());
}

fn load_config(cli: &CliConfig) -> Result<AppConfig, AppError> {
    let file = cli.config.as_deref().map(TomlConfig::from_file).transpose()?;
    let config = AppConfig::resolve(file.as_ref(), &ConfigOverrides::from(cli), |name| {
        std::env::var(name).ok()
    })?;
    config.validate()?;
    Ok(config)
}

fn render(response: &QueryResponse) -> Result<(), AppError> {
    match &response.outcome {
        Ok(answer) => {
            println!("---");
            println!("Question Asked: {}", response.question);
            println!("{}", answer);
            println!("---");
            Ok(())
        }
        Err(e) => Err(AppError::Query(e.clone())),
    }
}

async fn run(cli: CliConfig) -> Result<(), AppError> {
    // 載入並驗證配置
    let config = load_config(&cli)?;
    tracing::debug!("Resolved config: {:?}", config);

    // 創建模型後端與會話
    let backend = GeminiBackend::from_config(&config)?;
    let client = GroundedQueryClient::with_model(backend, config.model.clone());
    let session = Session::new(DocumentExtractor::with_default_parsers(), client);

    // 讀取並解析文件
    let source = LocalDocumentSource::new(config.max_upload_bytes);
    let document = source.read_document(&cli.file).await?;
    let loaded = session.load_document(&document).await?;

    println!("{}", loaded);
    if loaded.is_empty() {
        println!("Please upload a supported file to enable the Q&A section.");
        return Ok(());
    }

    if cli.show_text {
        if let Some(context) = session.context().await {
            println!("{}", context.preview(PREVIEW_CHAR_LIMIT));
        }
    }

    if let Some(question) = cli.question.as_deref() {
        let response = session.ask(question).await;
        return render(&response);
    }

    println!("Enter your question (Ctrl-D to quit):");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let response = session.ask(&line).await;
        // 單一問題失敗不會結束會話
        if let Err(e) = render(&response) {
            report(&e);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = CliConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(cli.verbose, cli.log_json);
    tracing::info!("Starting doc-qa");

    if let Err(e) = run(cli).await {
        report(&e);
        let code = exit_code(&e);
        if code > 0 {
            std::process::exit(code);
        }
    }
}
