use crate::config::{Config, ConfigError, ConfigPaths};
use clap::Args;
use std::path::Path;
use std::process::Command;

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// Print config with secrets redacted
    #[arg(long)]
    pub print: bool,

    /// Edit config in $VISUAL or $EDITOR
    #[arg(long)]
    pub edit: bool,

    /// Set a config value (dotted key=value)
    #[arg(long, value_name = "key=value")]
    pub set: Vec<String>,
}

pub fn run(args: &ConfigArgs, paths: &ConfigPaths) -> Result<(), ConfigError> {
    if args.edit && (!args.set.is_empty() || args.print) {
        return Err(ConfigError::Validation(
            "--edit cannot be combined with --set or --print".into(),
        ));
    }

    let mut config = Config::load_or_create(paths)?;

    if args.edit {
        edit_config(paths)?;
        config = Config::load(paths)?;
        config.validate()?;
        return Ok(());
    }

    if !args.set.is_empty() {
        for assignment in &args.set {
            apply_set(&mut config, assignment)?;
        }
        config.validate()?;
        Config::write(paths, &config)?;
    }

    if args.print || args.set.is_empty() {
        let redacted = config.redacted();
        let output = toml::to_string_pretty(&redacted)?;
        println!("{output}");
    }

    Ok(())
}

fn edit_config(paths: &ConfigPaths) -> Result<(), ConfigError> {
    let command = editor_command(|key| std::env::var(key).ok())?;
    open_in_editor(&command, &paths.config_path)
}

fn open_in_editor(command: &[String], path: &Path) -> Result<(), ConfigError> {
    let (program, args) = command
        .split_first()
        .ok_or_else(|| ConfigError::Validation("editor command is empty".into()))?;
    tracing::debug!(editor = %program, path = %path.display(), "opening config");
    let status = Command::new(program).args(args).arg(path).status()?;
    if !status.success() {
        return Err(ConfigError::Validation(format!(
            "{program} exited with {status}; config left as saved by the editor"
        )));
    }
    Ok(())
}

/// Editor command line from `$VISUAL`, falling back to `$EDITOR`.
fn editor_command(lookup: impl Fn(&str) -> Option<String>) -> Result<Vec<String>, ConfigError> {
    let line = ["VISUAL", "EDITOR"]
        .into_iter()
        .filter_map(|key| lookup(key))
        .find(|value| !value.trim().is_empty())
        .ok_or_else(|| ConfigError::Validation("set $VISUAL or $EDITOR, or use --set".into()))?;
    command_words(&line)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Quote {
    None,
    Single,
    Double,
}

/// Split a command line into words. Quotes group words (and may yield an
/// empty word); a backslash escapes the next character outside single quotes.
fn command_words(line: &str) -> Result<Vec<String>, ConfigError> {
    let mut words = Vec::new();
    let mut word: Option<String> = None;
    let mut quote = Quote::None;
    let mut chars = line.chars();

    while let Some(ch) = chars.next() {
        match (quote, ch) {
            (Quote::Single, '\'') | (Quote::Double, '"') => quote = Quote::None,
            (Quote::None, '\'') => {
                quote = Quote::Single;
                word.get_or_insert_with(String::new);
            }
            (Quote::None, '"') => {
                quote = Quote::Double;
                word.get_or_insert_with(String::new);
            }
            (Quote::Single, ch) => word.get_or_insert_with(String::new).push(ch),
            (_, '\\') => {
                if let Some(next) = chars.next() {
                    word.get_or_insert_with(String::new).push(next);
                }
            }
            (Quote::None, ch) if ch.is_whitespace() => words.extend(word.take()),
            (_, ch) => word.get_or_insert_with(String::new).push(ch),
        }
    }

    if quote != Quote::None {
        return Err(ConfigError::Validation(
            "editor command has an unterminated quote".into(),
        ));
    }
    words.extend(word);
    if words.is_empty() {
        return Err(ConfigError::Validation("editor command is empty".into()));
    }
    Ok(words)
}

fn apply_set(config: &mut Config, assignment: &str) -> Result<(), ConfigError> {
    let (key, value) = assignment
        .split_once('=')
        .ok_or_else(|| ConfigError::Validation("expected key=value for --set".into()))?;
    let key = key.trim();
    let value = value.trim();
    match key {
        "server.bind" => {
            config.server.bind = value.to_string();
        }
        "server.max_sessions" => {
            config.server.max_sessions = parse_usize(value, key)?;
        }
        "provider.name" => {
            config.provider.name = value.to_string();
        }
        "provider.base_url" => {
            config.provider.base_url = value.to_string();
        }
        "provider.model" => {
            config.provider.model = value.to_string();
        }
        "provider.api_key" => {
            config.provider.api_key = value.to_string();
        }
        "analysis.temperature" => {
            config.analysis.temperature = parse_f32(value, key)?;
        }
        "analysis.top_p" => {
            config.analysis.top_p = parse_f32(value, key)?;
        }
        "analysis.max_tokens" => {
            config.analysis.max_tokens = parse_u32(value, key)?;
        }
        "analysis.transcript_limit" => {
            config.analysis.transcript_limit = parse_usize(value, key)?;
        }
        "generation.temperature" => {
            config.generation.temperature = parse_f32(value, key)?;
        }
        "generation.top_p" => {
            config.generation.top_p = parse_f32(value, key)?;
        }
        "generation.max_tokens" => {
            config.generation.max_tokens = parse_u32(value, key)?;
        }
        "transcript.languages" => {
            config.transcript.languages = parse_languages(value)?;
        }
        _ => {
            return Err(ConfigError::Validation(format!(
                "unknown config key: {key}"
            )));
        }
    }
    Ok(())
}

fn parse_u32(value: &str, key: &str) -> Result<u32, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::Validation(format!("{key} expects an unsigned integer")))
}

fn parse_usize(value: &str, key: &str) -> Result<usize, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::Validation(format!("{key} expects an unsigned integer")))
}

fn parse_f32(value: &str, key: &str) -> Result<f32, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::Validation(format!("{key} expects a number")))
}

fn parse_languages(value: &str) -> Result<Vec<String>, ConfigError> {
    let languages: Vec<String> = value
        .split(',')
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect();
    if languages.is_empty() {
        return Err(ConfigError::Validation(
            "transcript.languages must include at least one value".into(),
        ));
    }
    Ok(languages)
}
