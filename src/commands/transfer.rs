//! Transfer command - File-based import and export.
//!
//! Runs with the system principal, so every church is in scope. The model
//! `all` exports every data set into a directory and imports churches,
//! users and groups in that order.

use std::path::{Path, PathBuf};

use crate::cli::args::{TransferAction, TransferArgs};
use crate::config::Config;
use crate::domain::Principal;
use crate::errors::{AppError, AppResult};
use crate::services::{ImportReport, ServiceContainer, Services, TransferModel};
use crate::utils::Format;

/// Import order for `all`; later models refer to earlier ones.
const IMPORT_ORDER: [TransferModel; 3] = [
    TransferModel::Church,
    TransferModel::User,
    TransferModel::Group,
];

/// A single model, or every model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Selection {
    One(TransferModel),
    All,
}

impl std::str::FromStr for Selection {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(Selection::All)
        } else {
            s.parse().map(Selection::One)
        }
    }
}

/// Execute the transfer command
pub async fn execute(args: TransferArgs, config: Config) -> AppResult<()> {
    let (_db, services) = super::connect_services(config).await?;

    match args.action {
        TransferAction::Export {
            model,
            output,
            format,
            church,
        } => export(&services, model.parse()?, output, format, church).await,
        TransferAction::Import {
            model,
            input,
            format,
            dry_run,
        } => import(&services, model.parse()?, &input, format, dry_run).await,
    }
}

async fn export(
    services: &Services,
    selection: Selection,
    output: Option<PathBuf>,
    format: Format,
    church: Option<String>,
) -> AppResult<()> {
    let models: Vec<TransferModel> = match selection {
        Selection::One(model) => vec![model],
        Selection::All => TransferModel::ALL.to_vec(),
    };

    for model in models {
        let file = services
            .transfer()
            .export(Principal::system(), model, format, church.clone())
            .await?;

        let path = match (&output, selection) {
            (Some(path), Selection::One(_)) if !path.is_dir() => path.clone(),
            (Some(dir), _) => dir.join(&file.filename),
            (None, _) => PathBuf::from(&file.filename),
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::internal(format!("Cannot create {}: {}", parent.display(), e)))?;
        }
        tokio::fs::write(&path, &file.bytes)
            .await
            .map_err(|e| AppError::internal(format!("Cannot write {}: {}", path.display(), e)))?;

        println!("{}: {} row(s) -> {}", model, file.rows, path.display());
    }
    Ok(())
}

async fn import(
    services: &Services,
    selection: Selection,
    input: &Path,
    format: Option<Format>,
    dry_run: bool,
) -> AppResult<()> {
    let jobs: Vec<(TransferModel, PathBuf)> = match selection {
        Selection::One(model) => vec![(model, input.to_path_buf())],
        Selection::All => {
            let mut jobs = Vec::new();
            for model in IMPORT_ORDER {
                match find_model_file(input, model, format).await? {
                    Some(path) => jobs.push((model, path)),
                    None => tracing::warn!(model = %model, dir = %input.display(), "No file to import"),
                }
            }
            jobs
        }
    };

    let mut failed_rows = 0;
    for (model, path) in jobs {
        let format = match format {
            Some(format) => format,
            None => format_from_path(&path)?,
        };
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| AppError::validation(format!("Cannot read {}: {}", path.display(), e)))?;

        let report = services
            .transfer()
            .import(Principal::system(), model, format, bytes, dry_run)
            .await?;
        print_report(&path, &report);
        failed_rows += report.errors.len();
    }

    if failed_rows > 0 {
        tracing::warn!(failed_rows, "Import finished with row errors");
    }
    Ok(())
}

/// Format implied by a file's extension
fn format_from_path(path: &Path) -> AppResult<Format> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .ok_or_else(|| {
            AppError::validation(format!(
                "Cannot tell the format of {}; pass --format",
                path.display()
            ))
        })?
        .parse()
}

/// First file in `dir` named `{model}.{ext}` or `{model}_*.{ext}`, by name.
async fn find_model_file(dir: &Path, model: TransferModel, format: Option<Format>) -> AppResult<Option<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| AppError::validation(format!("Cannot read {}: {}", dir.display(), e)))?;

    let mut candidates = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| AppError::internal(e.to_string()))?
    {
        let path = entry.path();
        if matches_model(&path, model, format) {
            candidates.push(path);
        }
    }
    candidates.sort();
    Ok(candidates.into_iter().next())
}

fn matches_model(path: &Path, model: TransferModel, format: Option<Format>) -> bool {
    let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
        return false;
    };
    let Ok(file_format) = format_from_path(path) else {
        return false;
    };
    let prefix = format!("{}_", model);
    (stem == model.as_str() || stem.starts_with(&prefix))
        && format.map_or(true, |f| f == file_format)
}

fn print_report(path: &Path, report: &ImportReport) {
    let mode = if report.dry_run { " (dry run)" } else { "" };
    println!(
        "{}{}: {} row(s), {} created, {} skipped, {} error(s)",
        path.display(),
        mode,
        report.total_rows,
        report.created,
        report.skipped.len(),
        report.errors.len()
    );
    for skipped in &report.skipped {
        println!("  line {}: {} already exists", skipped.line, skipped.key);
    }
    for error in &report.errors {
        println!("  line {}: {}", error.line, error.message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_accepts_all() {
        assert_eq!("ALL".parse::<Selection>().unwrap(), Selection::All);
        assert_eq!(
            "regular_member".parse::<Selection>().unwrap(),
            Selection::One(TransferModel::RegularMember)
        );
        assert!("pastor".parse::<Selection>().is_err());
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(format_from_path(Path::new("users.XLSX")).unwrap(), Format::Xlsx);
        assert!(format_from_path(Path::new("users")).is_err());
    }

    #[test]
    fn test_model_files_match_export_names() {
        let path = Path::new("out/user_all_20260101.csv");
        assert!(matches_model(path, TransferModel::User, None));
        assert!(matches_model(path, TransferModel::User, Some(Format::Csv)));
        assert!(!matches_model(path, TransferModel::User, Some(Format::Json)));
        assert!(!matches_model(path, TransferModel::Group, None));
        assert!(matches_model(Path::new("group.json"), TransferModel::Group, None));
    }
}
