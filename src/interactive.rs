use crate::config::{Config, OutputFormat, Provider};
use crate::pipeline::PipelineConfig;
use console::style;
use dialoguer::{Confirm, Input, Select};
use std::fs;
use std::path::PathBuf;

pub struct InteractiveResult {
    pub input: PathBuf,
    pub output: PathBuf,
    pub config: Config,
    pub pipeline_config: PipelineConfig,
}

pub fn run_interactive_wizard() -> anyhow::Result<InteractiveResult> {
    print_header();

    // Step 1: Select embedding provider
    let provider = select_provider()?;

    // Step 2: Check/Setup API key
    let config = setup_api_key(provider)?;

    // Step 3: Select transcript file
    let input = select_transcript_file()?;

    // Step 4: Select output format
    let format = select_output_format()?;

    // Derive output path
    let output = derive_output_path(&input, &format);

    // Step 5: Confirm
    print_plan(&input, &output, provider, &format);

    if !Confirm::new()
        .with_prompt("Proceed with these settings?")
        .default(true)
        .interact()?
    {
        anyhow::bail!("Cancelled by user");
    }

    println!();

    let pipeline_config = PipelineConfig {
        provider,
        format,
        concurrency: config.concurrency,
        show_progress: true,
        ..PipelineConfig::default()
    };

    Ok(InteractiveResult {
        input,
        output,
        config,
        pipeline_config,
    })
}

fn print_header() {
    println!();
    println!(
        "{}",
        style("╔═══════════════════════════════════════════════════╗").cyan()
    );
    println!(
        "{}",
        style("║        chapterize - AI Chapter Generator          ║").cyan()
    );
    println!(
        "{}",
        style("╚═══════════════════════════════════════════════════╝").cyan()
    );
    println!();
}

fn select_provider() -> anyhow::Result<Provider> {
    let providers = vec![
        ("OpenAI", "text-embedding-3-small", Provider::OpenAi),
        ("Gemini", "text-embedding-004", Provider::Gemini),
    ];

    let items: Vec<String> = providers
        .iter()
        .map(|(name, model, _)| format!("{} ({})", name, model))
        .collect();

    let selection = Select::new()
        .with_prompt("Select embedding provider")
        .items(&items)
        .default(0)
        .interact()?;

    Ok(providers[selection].2)
}

fn setup_api_key(provider: Provider) -> anyhow::Result<Config> {
    let mut config = Config::load().unwrap_or_default();

    let configured = match provider {
        Provider::OpenAi => config.openai_api_key.is_some(),
        Provider::Gemini => config.gemini_api_key.is_some(),
    };

    if configured {
        println!("{} API key configured", style("✓").green());
        return Ok(config);
    }

    let hint = match provider {
        Provider::OpenAi => "Get one at: https://platform.openai.com/api-keys",
        Provider::Gemini => "Get one at: https://aistudio.google.com/apikey",
    };

    println!("{} {} API key not found", style("!").yellow(), provider);
    println!("  {}\n", hint);

    let api_key: String = Input::new()
        .with_prompt(format!("Enter your {} API key", provider))
        .interact_text()?;

    if api_key.trim().is_empty() {
        anyhow::bail!("API key is required");
    }

    match provider {
        Provider::OpenAi => config.openai_api_key = Some(api_key.trim().to_string()),
        Provider::Gemini => config.gemini_api_key = Some(api_key.trim().to_string()),
    }

    // Offer to save
    if Confirm::new()
        .with_prompt("Save API key to config file?")
        .default(true)
        .interact()?
    {
        save_config(&config)?;
        println!("{} API key saved to config\n", style("✓").green());
    }

    Ok(config)
}

fn save_config(config: &Config) -> anyhow::Result<()> {
    if let Some(config_dir) = dirs::config_dir() {
        let chapterize_dir = config_dir.join("chapterize");
        fs::create_dir_all(&chapterize_dir)?;

        let config_path = chapterize_dir.join("config.toml");
        let toml_content = toml::to_string_pretty(config)?;
        fs::write(config_path, toml_content)?;
    }
    Ok(())
}

fn select_transcript_file() -> anyhow::Result<PathBuf> {
    println!("\n{}", style("Select transcript file:").bold());

    let files = scan_transcript_files(".")?;

    if files.is_empty() {
        println!("  No transcript JSON files found in current directory.\n");
        let path: String = Input::new()
            .with_prompt("Enter file path")
            .interact_text()?;
        let path = PathBuf::from(path);
        if !path.exists() {
            anyhow::bail!("File not found: {}", path.display());
        }
        return Ok(path);
    }

    let display_items: Vec<String> = files
        .iter()
        .map(|f| {
            let size = fs::metadata(f)
                .map(|m| format_size(m.len()))
                .unwrap_or_else(|_| "?".to_string());
            format!("{} ({})", f.display(), size)
        })
        .collect();

    let mut items = display_items.clone();
    items.push("Enter custom path...".to_string());

    let selection = Select::new()
        .with_prompt("Choose a file")
        .items(&items)
        .default(0)
        .interact()?;

    if selection == files.len() {
        // Custom path
        let path: String = Input::new()
            .with_prompt("Enter file path")
            .interact_text()?;
        let path = PathBuf::from(path);
        if !path.exists() {
            anyhow::bail!("File not found: {}", path.display());
        }
        Ok(path)
    } else {
        Ok(files[selection].clone())
    }
}

fn scan_transcript_files(dir: &str) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();

        if path.is_file() {
            if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
                if ext.eq_ignore_ascii_case("json") {
                    files.push(path);
                }
            }
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

fn select_output_format() -> anyhow::Result<OutputFormat> {
    let formats = vec![
        ("JSON", "Full chapter records", OutputFormat::Json),
        ("Text", "Video-description chapter list", OutputFormat::Text),
        ("Markdown", "Readable chapter outline", OutputFormat::Markdown),
    ];

    let items: Vec<String> = formats
        .iter()
        .map(|(name, desc, _)| format!("{} - {}", name, desc))
        .collect();

    let selection = Select::new()
        .with_prompt("Select output format")
        .items(&items)
        .default(0)
        .interact()?;

    Ok(formats[selection].2)
}

fn derive_output_path(input: &PathBuf, format: &OutputFormat) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default();
    let mut output = input.clone();
    output.set_file_name(format!(
        "{}.chapters.{}",
        stem.to_string_lossy(),
        format.extension()
    ));
    output
}

fn print_plan(input: &PathBuf, output: &PathBuf, provider: Provider, format: &OutputFormat) {
    println!("\n{}", style("═══ Summary ═══").bold());
    println!("  Input:     {}", style(input.display()).cyan());
    println!("  Output:    {}", style(output.display()).cyan());
    println!("  Provider:  {}", provider);
    println!("  Format:    {}", format.extension().to_uppercase());
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(500), "500 B");
        assert_eq!(format_size(1024), "1.0 KB");
        assert_eq!(format_size(1024 * 1024), "1.0 MB");
        assert_eq!(format_size(1024 * 1024 * 1024), "1.0 GB");
    }

    #[test]
    fn test_derive_output_path() {
        let input = PathBuf::from("/path/to/talk_en_transcript.json");

        let json = derive_output_path(&input, &OutputFormat::Json);
        assert_eq!(
            json,
            PathBuf::from("/path/to/talk_en_transcript.chapters.json")
        );

        let text = derive_output_path(&input, &OutputFormat::Text);
        assert_eq!(
            text,
            PathBuf::from("/path/to/talk_en_transcript.chapters.txt")
        );
    }
}
