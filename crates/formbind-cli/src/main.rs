use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use formbind_core::domain::{
    Constraint, EnumValue, FieldDescriptor, FieldType, FormDefinition, ScopeKind, TypedValue,
    VariableMap,
};
use formbind_core::impls::{InMemoryDefinitionStore, InMemoryRuntimeStore, ProcessDefinitionSpec};
use formbind_core::{FormServiceBuilder, FormServiceConfig};

#[derive(Debug, Parser)]
#[command(name = "formbind")]
#[command(about = "Walk a sample process through its start and task forms", long_about = None)]
#[command(version)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Business key for the started instance
    #[arg(short, long)]
    business_key: Option<String>,

    /// Engine used to render the task form (default: configured default, else html)
    #[arg(short, long)]
    engine: Option<String>,

    /// Amount submitted on the start form
    #[arg(long, default_value_t = 120)]
    amount: i64,
}

fn sample_definition() -> ProcessDefinitionSpec {
    ProcessDefinitionSpec::new("expense-approval")
        .with_start_form(
            FormDefinition::new()
                .with_form_key("forms/expense-start")
                .with_field(
                    FieldDescriptor::new("amount", FieldType::Long)
                        .with_label("Amount")
                        .with_validator(Constraint::Required)
                        .with_validator(Constraint::Min(1.0)),
                )
                .with_field(
                    FieldDescriptor::new(
                        "currency",
                        FieldType::Enum {
                            values: vec![
                                EnumValue::new("EUR", "Euro"),
                                EnumValue::new("USD", "US Dollar"),
                            ],
                        },
                    )
                    .with_default("EUR"),
                ),
        )
        .with_task_form(
            "approve",
            FormDefinition::new()
                .with_form_key("forms/expense-approve")
                .with_field(FieldDescriptor::new("amount", FieldType::Long).with_validator(Constraint::Readonly))
                .with_field(FieldDescriptor::new("approved", FieldType::Boolean).with_validator(Constraint::Required))
                .with_field(
                    FieldDescriptor::new("comment", FieldType::String).with_validator(Constraint::MaxLength(200)),
                ),
        )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => FormServiceConfig::from_path(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => FormServiceConfig::default().with_default_form_engine("html"),
    };

    // (A) 定義をデプロイし、サービスを組み立てる
    let definitions = Arc::new(InMemoryDefinitionStore::default());
    let runtime = Arc::new(InMemoryRuntimeStore::default());
    let pd = definitions.deploy(sample_definition()).await?;

    let service = FormServiceBuilder::new()
        .definitions(definitions.clone())
        .runtime(runtime.clone())
        .config(config)
        .with_builtin_engines()?
        .build()?;
    tracing::info!(
        process_definition_id = %pd,
        engines = ?service.engine_names(),
        default_engine = ?service.config().default_form_engine,
        "form service ready"
    );

    // (B) 開始フォーム
    let start = service.start_form_data(pd).await?;
    println!("start form:\n{}", serde_json::to_string_pretty(&start)?);

    let variables = VariableMap::from([("amount".to_string(), TypedValue::long(cli.amount))]);
    let instance = match &cli.business_key {
        Some(key) => service.submit_start_form_with_business_key(pd, key.clone(), variables).await?,
        None => service.submit_start_form(pd, variables).await?,
    };
    println!("started: {} (business_key={:?})", instance.id, instance.business_key);

    // (C) エンジン側: サブプロセスに入り、承認タスクを作る
    let sub = runtime
        .spawn_scope(instance.root_scope_id, ScopeKind::SubProcess, VariableMap::new())
        .await?;
    let task_id = runtime.create_task(sub, "approve").await?;

    let engine = cli.engine.as_deref();
    let rendered = service.rendered_task_form(task_id, engine).await?;
    println!("rendered by {} ({}):\n{}", rendered.engine, rendered.content_type, rendered.body);

    // (D) タスクフォームを送信
    service
        .submit_task_form(
            task_id,
            VariableMap::from([
                ("approved".to_string(), TypedValue::boolean(true)),
                ("comment".to_string(), TypedValue::string("ok")),
            ]),
        )
        .await?;

    let root = runtime
        .process_instance(instance.id)
        .await
        .context("instance disappeared")?;
    println!(
        "completed {task_id}; open tasks left: {}",
        runtime.open_tasks(root.id).await.len()
    );
    Ok(())
}
