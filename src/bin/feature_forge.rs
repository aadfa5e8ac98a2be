//! FeatureForge 演示程序 - 配置驱动运行
//!
//! 组合一个示例类并展示序列化 / 反序列化 / 匹配的往返过程

use anyhow::Context;
use feature_forge::{
    config::generate_default_config_file, global_registry, on, ClassBuilder, Composer,
    ConfigManager, DeserializeRecord, FieldKind, FieldOptions, SerializeRecord, Value,
    DESERIALIZE, SERIALIZE,
};
use serde_json::json;
use std::env;
use std::path::Path;

const DEFAULT_CONFIG_PATH: &str = "feature_forge.yaml";

/// 程序入口点
fn main() {
    if let Err(e) = run_main() {
        eprintln!("feature_forge failed: {:#}", e);
        std::process::exit(1);
    }
}

/// 主要逻辑函数
fn run_main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();

    match args.len() {
        1 => run_demo(ConfigManager::new_default()),
        2 => match args[1].as_str() {
            "init" => generate_config_file(),
            "-h" | "--help" => {
                print_usage();
                Ok(())
            }
            path => {
                if !Path::new(path).exists() {
                    anyhow::bail!("config file not found: {} (use 'feature_forge init')", path);
                }
                let config_manager = ConfigManager::load_from_file(path)
                    .with_context(|| format!("loading {}", path))?;
                run_demo(config_manager)
            }
        },
        _ => {
            print_usage();
            Ok(())
        }
    }
}

/// 使用给定配置运行演示
fn run_demo(config_manager: ConfigManager) -> anyhow::Result<()> {
    config_manager.validate()?;
    let config = config_manager.get_config();
    feature_forge::initialize(config)?;

    let base = ClassBuilder::new("Account")
        .field("id", FieldKind::Plain)
        .field_with(
            "balance",
            FieldKind::Plain,
            FieldOptions::new()
                .rename("bal")
                .transform(|v| json!(v.as_f64().unwrap_or(0.0) / 100.0)),
        )
        .field_with("status", FieldKind::Plain, FieldOptions::new().default_value("open"))
        .field("nickname", FieldKind::Optional)
        .constructor(|instance, args| {
            if let Some(id) = args.first() {
                instance.set("id", id.clone());
            }
            if let Some(balance) = args.get(1) {
                instance.set("balance", balance.clone());
            }
        })
        .build();

    let composer = Composer::from_config(global_registry().clone(), &config.composition);
    let account = composer.compose(&base, &[SERIALIZE, DESERIALIZE])?;

    let instance = account.instantiate(&[json!("acc-1"), json!(12345)]);
    let record = instance.serialize()?;
    tracing::info!("Serialized: {}", serde_json::to_string(&record)?);

    let restored = account.deserialize(&record)?;
    tracing::info!("Deserialized: {:?}", restored);

    let copied = account.from_object(&json!({"id": "acc-2", "balance": 500, "nickname": "ops"}))?;
    let greeting = on(copied.optional("nickname").flatten())
        .some(|name: &Value| format!("nickname {}", name))
        .none(|| "no nickname".to_string())
        .default(String::new);
    tracing::info!("Copied: {:?} ({})", copied, greeting);

    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

/// 生成默认配置文件
fn generate_config_file() -> anyhow::Result<()> {
    generate_default_config_file(DEFAULT_CONFIG_PATH)?;
    println!("Wrote {}", DEFAULT_CONFIG_PATH);
    println!("Run: feature_forge {}", DEFAULT_CONFIG_PATH);
    Ok(())
}

/// 打印使用说明
fn print_usage() {
    println!("FeatureForge");
    println!();
    println!("Usage:");
    println!("  feature_forge                  # run the demo with default config");
    println!("  feature_forge init             # write {}", DEFAULT_CONFIG_PATH);
    println!("  feature_forge <config_file>    # run the demo with a YAML/TOML config");
}
