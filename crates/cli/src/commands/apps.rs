//! ArgoCD application listing

use anyhow::Result;
use portal_lib::ApplicationList;
use serde::Serialize;
use tabled::Tabled;

use crate::client::ApiClient;
use crate::output::{color_health, color_sync, print_table, OutputFormat};

/// Row for the applications table
#[derive(Serialize, Tabled)]
struct AppRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Namespace")]
    namespace: String,
    #[tabled(rename = "Health")]
    health: String,
    #[tabled(rename = "Sync")]
    sync: String,
    #[tabled(rename = "Revision")]
    revision: String,
    #[tabled(rename = "Path")]
    path: String,
    #[tabled(rename = "Resources")]
    resources: usize,
}

/// List ArgoCD applications as the portal sees them
pub async fn apps(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let list: ApplicationList = client.get("/api/argocd/applications").await?;

    let rows: Vec<AppRow> = list
        .applications
        .iter()
        .map(|app| AppRow {
            name: app.name.clone(),
            namespace: app.namespace.clone(),
            health: color_health(app.health),
            sync: color_sync(app.sync),
            revision: app.target_revision.clone(),
            path: app.path.clone(),
            resources: app.resources.len(),
        })
        .collect();

    print_table(&rows, format);
    Ok(())
}
