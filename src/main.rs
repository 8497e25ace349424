// ==========================================
// Campagnes médicales - Ligne de commande d'import
// ==========================================
// Usage:
//   campaign-import import <fichier> <campagne_id> [--db <chemin>]
//                   [--ignore-duplicates] [--force] [--dry-run] [--init-schema]
//   campaign-import cancel <lot_id> [--db <chemin>]
//   campaign-import template <sortie.csv>
//   campaign-import config [<clé> <valeur>] [--db <chemin>]
//
// Le rapport JSON est écrit sur stdout, les journaux sur stderr.
// Code de sortie 1 sur erreur fatale.
// ==========================================

use anyhow::{bail, Context, Result};
use campaign_import::api::{ImportApi, ImportRequest};
use campaign_import::{db, logging};
use std::path::Path;

const USAGE: &str = "usage:
  campaign-import import <fichier> <campagne_id> [--db <chemin>] [--ignore-duplicates] [--force] [--dry-run] [--init-schema]
  campaign-import cancel <lot_id> [--db <chemin>]
  campaign-import template <sortie.csv>
  campaign-import config [<clé> <valeur>] [--db <chemin>]";

/// Arguments communs: positionnels + drapeaux
struct CliArgs {
    positional: Vec<String>,
    db_path: String,
    ignore_duplicates: bool,
    force_import: bool,
    dry_run: bool,
    init_schema: bool,
}

fn parse_args(args: impl Iterator<Item = String>) -> Result<CliArgs> {
    let mut parsed = CliArgs {
        positional: Vec::new(),
        db_path: String::new(),
        ignore_duplicates: false,
        force_import: false,
        dry_run: false,
        init_schema: false,
    };

    let mut args = args.peekable();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--db" => {
                parsed.db_path = args.next().context("--db attend un chemin")?;
            }
            "--ignore-duplicates" => parsed.ignore_duplicates = true,
            "--force" => parsed.force_import = true,
            "--dry-run" => parsed.dry_run = true,
            "--init-schema" => parsed.init_schema = true,
            flag if flag.starts_with("--") => bail!("option inconnue : {}\n{}", flag, USAGE),
            _ => parsed.positional.push(arg),
        }
    }

    if parsed.db_path.is_empty() {
        parsed.db_path = db::default_db_path();
    }
    Ok(parsed)
}

#[tokio::main]
async fn main() {
    logging::init();

    if let Err(e) = run().await {
        tracing::error!(error = %e, "échec");
        eprintln!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let command = args.next().context(USAGE)?;
    let cli = parse_args(args)?;
    let api = ImportApi::new(cli.db_path.clone());

    match command.as_str() {
        "import" => {
            let [file, campaign_id] = cli.positional.as_slice() else {
                bail!(USAGE);
            };
            let campaign_id: i64 = campaign_id
                .parse()
                .with_context(|| format!("identifiant de campagne invalide : {}", campaign_id))?;

            if cli.init_schema {
                api.init_schema()?;
            }
            let locale = api.apply_configured_locale()?;

            tracing::info!(db = %cli.db_path, file = %file, campaign_id, %locale, "import demandé");
            let report = api
                .import_beneficiaries(ImportRequest {
                    file_path: file.clone(),
                    campaign_id,
                    ignore_duplicates: cli.ignore_duplicates,
                    force_import: cli.force_import,
                    dry_run: cli.dry_run,
                })
                .await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        "cancel" => {
            let [batch_id] = cli.positional.as_slice() else {
                bail!(USAGE);
            };
            let response = api.cancel_import_batch(batch_id).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        "template" => {
            let [output] = cli.positional.as_slice() else {
                bail!(USAGE);
            };
            ImportApi::write_template_csv(Path::new(output))?;
            println!("{}", output);
        }
        "config" => match cli.positional.as_slice() {
            [] => {
                let overrides = api.get_config_overrides()?;
                println!("{}", serde_json::to_string_pretty(&overrides)?);
            }
            [key, value] => {
                let config = api.set_config_value(key, value)?;
                println!("{}", serde_json::to_string_pretty(&config)?);
            }
            _ => bail!(USAGE),
        },
        other => bail!("commande inconnue : {}\n{}", other, USAGE),
    }
    Ok(())
}
