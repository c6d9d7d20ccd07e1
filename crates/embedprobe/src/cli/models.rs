//! The `embedprobe models` command for managing the ONNX encoders.

use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};
use embedprobe_core::embedding::{clip, sentence};
use embedprobe_core::Config;

/// Arguments for the `models` command.
#[derive(Args, Debug)]
pub struct ModelsArgs {
    #[command(subcommand)]
    pub command: ModelsCommand,
}

/// Subcommands for model management.
#[derive(Subcommand, Debug)]
pub enum ModelsCommand {
    /// Download the sentence-transformer and CLIP text encoders
    Download,

    /// List the encoders and whether they are installed
    List,

    /// Show model directory path
    Path,
}

/// One file of a model: where it lives on the hub and what it is called locally.
struct ModelFile {
    remote_path: &'static str,
    local_name: &'static str,
}

/// A downloadable encoder.
struct ModelSource {
    name: &'static str,
    label: &'static str,
    repo: &'static str,
    files: &'static [ModelFile],
}

const SOURCES: &[ModelSource] = &[
    ModelSource {
        name: "all-MiniLM-L6-v2",
        label: "Sentence Transformer",
        repo: "Xenova/all-MiniLM-L6-v2",
        files: &[
            ModelFile {
                remote_path: "onnx/model.onnx",
                local_name: sentence::MODEL_FILENAME,
            },
            ModelFile {
                remote_path: "tokenizer.json",
                local_name: sentence::TOKENIZER_FILENAME,
            },
        ],
    },
    ModelSource {
        name: "clip-vit-base-patch32",
        label: "CLIP text tower",
        repo: "Xenova/clip-vit-base-patch32",
        files: &[
            ModelFile {
                remote_path: "onnx/text_model.onnx",
                local_name: clip::TEXT_MODEL_FILENAME,
            },
            ModelFile {
                remote_path: "tokenizer.json",
                local_name: clip::TOKENIZER_FILENAME,
            },
        ],
    },
];

fn source_for(name: &str) -> Option<&'static ModelSource> {
    SOURCES.iter().find(|s| s.name == name)
}

/// The configured model names, sentence encoder first.
fn configured_models(config: &Config) -> [&str; 2] {
    [
        config.embedding.sentence_model.as_str(),
        config.embedding.clip_model.as_str(),
    ]
}

fn hub_url(repo: &str, remote_path: &str) -> String {
    format!("https://huggingface.co/{repo}/resolve/main/{remote_path}")
}

/// Execute the models command.
pub async fn execute(args: ModelsArgs, config: &Config) -> anyhow::Result<()> {
    let model_dir = config.model_dir();

    match args.command {
        ModelsCommand::Download => {
            let client = reqwest::Client::new();
            for name in configured_models(config) {
                let Some(source) = source_for(name) else {
                    anyhow::bail!(
                        "No download source for model {name:?}. Place its files in {} manually.",
                        model_dir.join(name).display()
                    );
                };
                download_model(&client, source, &model_dir).await?;
            }
            tracing::info!("All downloads complete.");
        }

        ModelsCommand::List => {
            println!("Models:");
            println!("  Directory: {}\n", model_dir.display());

            let embedding = &config.embedding;
            let rows = [
                (
                    "Sentence Transformer",
                    sentence::SentenceEncoder::model_path(embedding, &model_dir),
                    sentence::SentenceEncoder::model_exists(embedding, &model_dir),
                ),
                (
                    "CLIP text tower",
                    clip::ClipTextEncoder::model_path(embedding, &model_dir),
                    clip::ClipTextEncoder::model_exists(embedding, &model_dir),
                ),
            ];
            for (label, path, installed) in &rows {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let status = if *installed { "ready" } else { "not installed" };
                println!("    - {:22} {:30} {}", label, name, status);
            }

            if !rows.iter().all(|(_, _, installed)| *installed) {
                println!("\nRun `embedprobe models download` to fetch missing models.");
            }
        }

        ModelsCommand::Path => {
            println!("{}", model_dir.display());
        }
    }

    Ok(())
}

/// Download every missing file of one model into `{model_dir}/{name}/`.
async fn download_model(
    client: &reqwest::Client,
    source: &ModelSource,
    model_dir: &Path,
) -> anyhow::Result<()> {
    let dir = model_dir.join(source.name);
    std::fs::create_dir_all(&dir)?;

    for file in source.files {
        let dest = dir.join(file.local_name);
        if dest.exists() {
            tracing::info!("{} {} already exists at {:?}", source.label, file.local_name, dest);
            continue;
        }

        let url = hub_url(source.repo, file.remote_path);
        tracing::info!("Downloading {} {}...", source.label, file.local_name);
        tracing::info!("  Source: {}", url);
        tracing::info!("  Destination: {:?}", dest);

        download_file(client, &url, &dest).await?;

        let file_size = std::fs::metadata(&dest)?.len();
        tracing::info!(
            "  {} complete ({:.1} MB)",
            file.local_name,
            file_size as f64 / (1024.0 * 1024.0)
        );
    }

    Ok(())
}

/// Partial downloads land next to the destination and are renamed on success.
fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    dest.with_file_name(name)
}

/// Stream a URL to disk.
async fn download_file(client: &reqwest::Client, url: &str, dest: &Path) -> anyhow::Result<()> {
    use futures_util::StreamExt;
    use tokio::io::AsyncWriteExt;

    let response = client
        .get(url)
        .send()
        .await?
        .error_for_status()
        .map_err(|e| anyhow::anyhow!("Download failed: {e}"))?;

    let total_size = response.content_length();
    if let Some(size) = total_size {
        tracing::info!("  Size: {:.1} MB", size as f64 / (1024.0 * 1024.0));
    }

    let partial = partial_path(dest);
    let mut file = tokio::fs::File::create(&partial).await?;
    let mut stream = response.bytes_stream();
    let mut downloaded: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) => {
                drop(file);
                let _ = tokio::fs::remove_file(&partial).await;
                anyhow::bail!("Download of {url} interrupted: {e}");
            }
        };
        file.write_all(&chunk).await?;
        downloaded += chunk.len() as u64;

        if let Some(total) = total_size {
            if downloaded % (25 * 1024 * 1024) < chunk.len() as u64 {
                tracing::info!(
                    "  Progress: {:.0}%",
                    downloaded as f64 / total as f64 * 100.0
                );
            }
        }
    }

    file.flush().await?;
    drop(file);
    tokio::fs::rename(&partial, dest).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_models_have_sources() {
        let config = Config::default();
        for name in configured_models(&config) {
            assert!(source_for(name).is_some(), "{name} has no source");
        }
    }

    #[test]
    fn test_local_names_match_encoder_files() {
        let sentence_files: Vec<&str> = SOURCES[0].files.iter().map(|f| f.local_name).collect();
        assert_eq!(sentence_files, vec!["model.onnx", "tokenizer.json"]);
        let clip_files: Vec<&str> = SOURCES[1].files.iter().map(|f| f.local_name).collect();
        assert_eq!(clip_files, vec!["text_model.onnx", "tokenizer.json"]);
    }

    #[test]
    fn test_hub_url() {
        assert_eq!(
            hub_url("Xenova/all-MiniLM-L6-v2", "onnx/model.onnx"),
            "https://huggingface.co/Xenova/all-MiniLM-L6-v2/resolve/main/onnx/model.onnx"
        );
    }

    #[test]
    fn test_partial_path() {
        assert_eq!(
            partial_path(Path::new("/m/clip/text_model.onnx")),
            PathBuf::from("/m/clip/text_model.onnx.part")
        );
    }

    #[test]
    fn test_unknown_model_has_no_source() {
        assert!(source_for("bert-large").is_none());
    }
}
