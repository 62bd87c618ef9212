//! Docs & Files commands: vaults (folders), uploads and documents.

use clap::Subcommand;
use serde_json::{json, Map, Value};
use std::path::{Path, PathBuf};

use bcq_core::api::BasecampApi;
use bcq_core::models::ToolKind;
use bcq_core::pagination::ListOptions;
use bcq_core::probe::{probe, ItemKind};
use bcq_core::urlarg::extract_with_project;
use bcq_core::{BcqError, Result};

use super::{id_of, text, PaginationArgs};
use crate::app::{list_options, App};
use crate::output::Envelope;

#[derive(Subcommand, Debug)]
pub enum FilesCommands {
    /// List folders, files and documents in a vault
    List {
        /// Vault ID or title (defaults to the project's Docs & Files)
        #[arg(long, visible_alias = "folder")]
        vault: Option<String>,

        #[command(flatten)]
        pagination: PaginationArgs,
    },

    /// Show a folder, file or document
    Show {
        /// Item ID or URL
        id: String,

        /// Item type: vault, upload or document (detected when omitted)
        #[arg(long = "type")]
        kind: Option<String>,
    },

    /// Update a folder, file or document
    Update {
        /// Item ID or URL
        id: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        content: Option<String>,

        #[arg(long = "type")]
        kind: Option<String>,
    },

    /// Download an uploaded file
    Download {
        /// Upload ID or URL
        id: String,

        /// Destination file or directory
        #[arg(long, short = 'o')]
        out: Option<PathBuf>,
    },

    /// Folder management
    #[command(subcommand)]
    Folders(FolderCommands),

    /// Document management
    #[command(subcommand)]
    Docs(DocCommands),
}

#[derive(Subcommand, Debug)]
pub enum FolderCommands {
    /// Create a folder
    Create {
        #[arg(long)]
        name: Option<String>,

        /// Parent vault ID or title
        #[arg(long, visible_alias = "folder")]
        vault: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum DocCommands {
    /// Create a document
    Create {
        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        content: Option<String>,

        #[arg(long, visible_alias = "folder")]
        vault: Option<String>,
    },
}

pub async fn handle_files_command(app: &App, cmd: FilesCommands) -> Result<Envelope> {
    match cmd {
        FilesCommands::List { vault, pagination } => {
            list_vault(app, vault.as_deref(), &pagination).await
        }
        FilesCommands::Show { id, kind } => show_item(app, &id, kind.as_deref()).await,
        FilesCommands::Update {
            id,
            title,
            content,
            kind,
        } => update_item(app, &id, title, content, kind.as_deref()).await,
        FilesCommands::Download { id, out } => download_upload(app, &id, out).await,
        FilesCommands::Folders(FolderCommands::Create { name, vault }) => {
            create_folder(app, name.as_deref(), vault.as_deref()).await
        }
        FilesCommands::Docs(DocCommands::Create {
            title,
            content,
            vault,
        }) => create_document(app, title.as_deref(), content.as_deref(), vault.as_deref()).await,
    }
}

/// Items of one vault collection. A failed listing reads as empty.
async fn collection(
    api: &dyn BasecampApi,
    project_id: &str,
    vault_id: &str,
    kind: ItemKind,
    options: &ListOptions,
) -> (Vec<Value>, bool) {
    let path = format!(
        "/buckets/{}/vaults/{}/{}.json",
        project_id,
        vault_id,
        kind.collection()
    );
    match api.get_all(&path, options).await {
        Ok(listing) => (listing.items, listing.has_more),
        Err(e) => {
            tracing::warn!(%kind, vault_id, error = %e, "vault listing failed");
            (Vec::new(), false)
        }
    }
}

async fn list_vault(app: &App, vault: Option<&str>, pagination: &PaginationArgs) -> Result<Envelope> {
    let options = list_options(pagination, None)?;
    let project = app.resolve_project(None).await?;
    let vault_id = app.tool_id(&project.id, ToolKind::Vault, vault).await?;

    let details = app
        .api
        .get(&ItemKind::Vault.path(&project.id, &vault_id))
        .await?;
    let title = match text(&details, "title") {
        "" => "Docs & Files",
        t => t,
    };

    let api = app.api.as_ref();
    let (folders, more_folders) = collection(api, &project.id, &vault_id, ItemKind::Vault, &options).await;
    let (files, more_files) = collection(api, &project.id, &vault_id, ItemKind::Upload, &options).await;
    let (documents, more_docs) =
        collection(api, &project.id, &vault_id, ItemKind::Document, &options).await;

    let summary = format!(
        "{} folders, {} files, {} documents",
        folders.len(),
        files.len(),
        documents.len()
    );
    let notice = (more_folders || more_files || more_docs)
        .then(|| "Some listings were cut short; use --all to fetch everything".to_string());
    let data = json!({
        "vault_id": vault_id.parse::<i64>().unwrap_or_default(),
        "vault_title": title,
        "folders": folders,
        "files": files,
        "documents": documents,
    });

    Ok(Envelope::new(data, summary)
        .breadcrumb(
            "show",
            format!("bcq files show <id> --in {}", project.id),
            "Show item",
        )
        .breadcrumb(
            "folder",
            format!("bcq files list --vault <id> --in {}", project.id),
            "Open a folder",
        )
        .notice(notice))
}

/// Kinds to try for an item: just the one named by `--type`, or all of them.
fn probe_kinds(kind: Option<&str>) -> Result<Vec<ItemKind>> {
    match kind {
        Some(k) => Ok(vec![k.parse()?]),
        None => Ok(ItemKind::PROBE_ORDER.to_vec()),
    }
}

async fn show_item(app: &App, arg: &str, kind: Option<&str>) -> Result<Envelope> {
    let kinds = probe_kinds(kind)?;
    let (item_id, url_project) = extract_with_project(arg);
    let project = app.resolve_project(url_project.as_deref()).await?;

    let (kind, item) = probe(app.api.as_ref(), &project.id, &item_id, &kinds).await?;

    let label = match text(&item, "type") {
        "" => kind.as_str(),
        t => t,
    };
    let title = match text(&item, kind.title_field()) {
        "" => text(&item, "title"),
        t => t,
    };
    let summary = format!("{}: {}", label, title);

    let mut envelope = Envelope::new(item, summary).breadcrumb(
        "update",
        format!("bcq files update {} --in {}", item_id, project.id),
        "Update item",
    );
    envelope = match kind {
        ItemKind::Vault => envelope.breadcrumb(
            "contents",
            format!("bcq files list --vault {} --in {}", item_id, project.id),
            "List contents",
        ),
        ItemKind::Upload => envelope.breadcrumb(
            "download",
            format!("bcq files download {} --in {}", item_id, project.id),
            "Download file",
        ),
        ItemKind::Document => envelope,
    };
    Ok(envelope)
}

async fn update_item(
    app: &App,
    arg: &str,
    title: Option<String>,
    content: Option<String>,
    kind: Option<&str>,
) -> Result<Envelope> {
    if title.is_none() && content.is_none() {
        return Err(BcqError::usage(
            "At least one of --title or --content is required",
        ));
    }
    let kinds = probe_kinds(kind)?;
    let (item_id, url_project) = extract_with_project(arg);
    let project = app.resolve_project(url_project.as_deref()).await?;

    let kind = match kinds.as_slice() {
        [only] => *only,
        _ => probe(app.api.as_ref(), &project.id, &item_id, &kinds).await?.0,
    };

    let mut body = Map::new();
    if let Some(title) = title {
        body.insert("title".into(), json!(title));
    }
    if let Some(content) = content {
        body.insert("content".into(), json!(content));
    }

    let item = app
        .api
        .put(&kind.path(&project.id, &item_id), &Value::Object(body))
        .await?;

    Ok(
        Envelope::new(item, format!("Updated {} #{}", kind, item_id)).breadcrumb(
            "show",
            format!("bcq files show {} --in {}", item_id, project.id),
            "View item",
        ),
    )
}

/// Final path for a download: inside `out` when it is a directory.
fn destination(out: Option<PathBuf>, filename: &str) -> PathBuf {
    // Never let a server-supplied name escape the target directory
    let name = Path::new(filename)
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("download"));
    match out {
        Some(p) if p.is_dir() => p.join(name),
        Some(p) => p,
        None => name,
    }
}

/// Human-readable byte count.
fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

async fn download_upload(app: &App, arg: &str, out: Option<PathBuf>) -> Result<Envelope> {
    let (upload_id, url_project) = extract_with_project(arg);
    let project = app.resolve_project(url_project.as_deref()).await?;

    let upload = app
        .api
        .get(&ItemKind::Upload.path(&project.id, &upload_id))
        .await?;
    let url = match text(&upload, "download_url") {
        "" => {
            return Err(BcqError::not_found_hint(
                "Download URL",
                format!("upload {}", upload_id),
                "Only uploaded files can be downloaded",
            ));
        }
        u => u.to_string(),
    };
    let filename = match text(&upload, "filename") {
        "" => format!("upload-{}", upload_id),
        f => f.to_string(),
    };

    let dest = destination(out, &filename);
    let written = app.api.download(&url, &dest).await?;

    let summary = format!(
        "Downloaded {} ({}) to {}",
        filename,
        format_size(written),
        dest.display()
    );
    Ok(Envelope::new(
        json!({
            "id": upload_id,
            "filename": filename,
            "path": dest.display().to_string(),
            "bytes": written,
        }),
        summary,
    ))
}

async fn create_folder(app: &App, name: Option<&str>, vault: Option<&str>) -> Result<Envelope> {
    let name = name
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| BcqError::usage("--name is required"))?;
    let project = app.resolve_project(None).await?;
    let vault_id = app.tool_id(&project.id, ToolKind::Vault, vault).await?;

    let folder = app
        .api
        .post(
            &format!("/buckets/{}/vaults/{}/vaults.json", project.id, vault_id),
            &json!({ "title": name }),
        )
        .await?;
    let summary = format!("Created folder #{}: {}", id_of(&folder), name);
    let folder_id = id_of(&folder);

    Ok(Envelope::new(folder, summary).breadcrumb(
        "contents",
        format!("bcq files list --vault {} --in {}", folder_id, project.id),
        "List contents",
    ))
}

async fn create_document(
    app: &App,
    title: Option<&str>,
    content: Option<&str>,
    vault: Option<&str>,
) -> Result<Envelope> {
    let title = title
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| BcqError::usage("--title is required"))?;
    let project = app.resolve_project(None).await?;
    let vault_id = app.tool_id(&project.id, ToolKind::Vault, vault).await?;

    let document = app
        .api
        .post(
            &format!("/buckets/{}/vaults/{}/documents.json", project.id, vault_id),
            &json!({ "title": title, "content": content.unwrap_or_default(), "status": "active" }),
        )
        .await?;
    let doc_id = id_of(&document);

    Ok(
        Envelope::new(document, format!("Created document #{}: {}", doc_id, title)).breadcrumb(
            "show",
            format!("bcq files show {} --type document --in {}", doc_id, project.id),
            "View document",
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.00 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.00 MB");
    }

    #[test]
    fn destination_strips_directories_from_names() {
        assert_eq!(destination(None, "../../etc/passwd"), PathBuf::from("passwd"));
        assert_eq!(destination(None, "report.pdf"), PathBuf::from("report.pdf"));

        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            destination(Some(dir.path().to_path_buf()), "a.png"),
            dir.path().join("a.png")
        );
        assert_eq!(
            destination(Some(PathBuf::from("/tmp/x.bin")), "a.png"),
            PathBuf::from("/tmp/x.bin")
        );
    }

    #[test]
    fn explicit_type_limits_probing() {
        assert_eq!(probe_kinds(Some("doc")).unwrap(), vec![ItemKind::Document]);
        assert_eq!(probe_kinds(None).unwrap().len(), 3);
        assert!(probe_kinds(Some("spreadsheet")).is_err());
    }
}
