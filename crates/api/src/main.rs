use std::env;
use std::path::PathBuf;

use anyhow::Result;
use coco_api::build_app;
use coco_observability::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("coco_api");

    let artifacts = env::var("COCO_ARTIFACTS_DIR").unwrap_or_else(|_| "artifacts".to_string());
    let rules_path = env::var("COCO_RULES_PATH").ok().map(PathBuf::from);
    let bind = env::var("COCO_BIND").unwrap_or_else(|_| "127.0.0.1:8000".to_string());

    let app = build_app(&artifacts, rules_path.as_deref())?;

    let listener = tokio::net::TcpListener::bind(&bind).await?;
    tracing::info!(bind = %bind, artifacts = %artifacts, "cocobot api started");

    axum::serve(listener, app).await?;
    Ok(())
}
