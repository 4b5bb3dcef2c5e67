//! Healthtrack CLI
//!
//! Command-line client for the Healthtrack API:
//! - Log health and sleep entries
//! - Show trends, food correlations, sleep analysis and triggers
//! - Export data
//! - Generate a default config file

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::{json, Value};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "healthtrack")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Personal health tracking: meals, digestion and sleep")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// API server URL
    #[arg(long, default_value = "http://localhost:8082", global = true)]
    pub api_url: String,

    /// User id forwarded to the API
    #[arg(short, long, default_value = "1", global = true)]
    pub user: i64,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table, global = true)]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ExportKind {
    Health,
    Sleep,
    Meals,
    All,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Log how you felt on a day
    LogHealth {
        /// Physical feeling (1-5)
        physical: u8,
        /// Mental feeling (1-5)
        mental: u8,
        /// Day (YYYY-MM-DD, default: today)
        #[arg(short, long)]
        date: Option<String>,
        /// Stool quality: hard, normal, soft, diarrhea
        #[arg(long)]
        stool_quality: Option<String>,
        /// Number of bowel movements
        #[arg(long, default_value = "0")]
        stool_count: u32,
        /// Weight in kilograms
        #[arg(short, long)]
        weight: Option<f64>,
        /// Free-text symptoms
        #[arg(short, long, default_value = "")]
        symptoms: String,
    },

    /// Log last night's sleep
    LogSleep {
        /// Hours slept
        duration: f64,
        /// Sleep quality (1-5)
        quality: u8,
        /// Energy level (1-5)
        energy: u8,
        /// Ease of waking up (1-5)
        #[arg(long, default_value = "3")]
        wake_up_ease: u8,
        /// Day (YYYY-MM-DD, default: today)
        #[arg(short, long)]
        date: Option<String>,
    },

    /// Show health trends
    Trends {
        /// Window in days
        #[arg(short, long)]
        days: Option<u32>,
        /// Single field: physical_feeling, mental_feeling, stool_quality, weight
        #[arg(long)]
        field: Option<String>,
    },

    /// Show health logs with foods eaten that day and the day before
    Correlations {
        #[arg(short, long)]
        days: Option<u32>,
    },

    /// Show sleep averages
    Sleep {
        #[arg(short, long)]
        days: Option<u32>,
    },

    /// Rank foods eaten before poor days
    Triggers {
        #[arg(short, long)]
        days: Option<u32>,
    },

    /// Show API status
    Status,

    /// Export data
    Export {
        #[arg(value_enum)]
        kind: ExportKind,
        /// CSV instead of JSON (health and sleep only)
        #[arg(long)]
        csv: bool,
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Thin wrapper adding the base URL and identity header
struct ApiClient {
    http: reqwest::Client,
    base: String,
    user: i64,
}

impl ApiClient {
    fn new(base: &str, user: i64) -> Self {
        Self {
            http: reqwest::Client::new(),
            base: base.trim_end_matches('/').to_string(),
            user,
        }
    }

    async fn get(&self, path: &str) -> Result<reqwest::Response> {
        let response = self
            .http
            .get(format!("{}{}", self.base, path))
            .header("X-User-Id", self.user.to_string())
            .send()
            .await
            .with_context(|| format!("Cannot connect to Healthtrack API at {}", self.base))?;
        ensure_success(response).await
    }

    async fn get_json(&self, path: &str) -> Result<Value> {
        Ok(self.get(path).await?.json().await?)
    }

    async fn post_json(&self, path: &str, body: &Value) -> Result<Value> {
        let response = self
            .http
            .post(format!("{}{}", self.base, path))
            .header("X-User-Id", self.user.to_string())
            .json(body)
            .send()
            .await
            .with_context(|| format!("Cannot connect to Healthtrack API at {}", self.base))?;
        Ok(ensure_success(response).await?.json().await?)
    }
}

async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body: Value = response.json().await.unwrap_or(Value::Null);
    let message = body["error"]["message"].as_str().unwrap_or("request failed");
    bail!("API returned {}: {}", status, message)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let client = ApiClient::new(&cli.api_url, cli.user);

    match cli.command {
        Commands::LogHealth {
            physical,
            mental,
            date,
            stool_quality,
            stool_count,
            weight,
            symptoms,
        } => {
            let date = resolve_date(date.as_deref())?;
            let body = json!({
                "date": date,
                "physical_feeling": physical,
                "mental_feeling": mental,
                "stool_quality": stool_quality.map(|s| s.to_lowercase()),
                "stool_count": stool_count,
                "weight": weight,
                "symptoms": symptoms,
            });

            let log = client.post_json("/api/v1/health-logs", &body).await?;
            println!(
                "Logged health for {}: physical {}, mental {}",
                date,
                log["physical_feeling"],
                log["mental_feeling"]
            );
        }

        Commands::LogSleep {
            duration,
            quality,
            energy,
            wake_up_ease,
            date,
        } => {
            let date = resolve_date(date.as_deref())?;
            let body = json!({
                "date": date,
                "duration": duration,
                "quality": quality,
                "energy_level": energy,
                "wake_up_ease": wake_up_ease,
            });

            client.post_json("/api/v1/sleep", &body).await?;
            println!("Logged {:.1}h of sleep for {}", duration, date);
        }

        Commands::Trends { days, field } => {
            let mut path = format!("/api/v1/analytics/health-trends?{}", days_query(days));
            if let Some(field) = &field {
                path.push_str(&format!("&field={}", field));
            }
            let data = client.get_json(&path).await?;

            match cli.format {
                OutputFormat::Json => print_json(&data)?,
                OutputFormat::Table => match &field {
                    Some(name) => print_series(name, &data),
                    None => {
                        for name in ["physical_feeling", "mental_feeling", "stool_quality", "weight"] {
                            print_series(name, &data[name]);
                        }
                    }
                },
            }
        }

        Commands::Correlations { days } => {
            let data = client
                .get_json(&format!("/api/v1/analytics/food-correlations?{}", days_query(days)))
                .await?;

            match cli.format {
                OutputFormat::Json => print_json(&data)?,
                OutputFormat::Table => print_correlations(&data),
            }
        }

        Commands::Sleep { days } => {
            let data = client
                .get_json(&format!("/api/v1/analytics/sleep-analysis?{}", days_query(days)))
                .await?;

            match cli.format {
                OutputFormat::Json => print_json(&data)?,
                OutputFormat::Table => {
                    println!("Average duration: {:.2}h", data["average_duration"].as_f64().unwrap_or(0.0));
                    println!("Average quality:  {:.2}", data["average_quality"].as_f64().unwrap_or(0.0));
                    println!("Average energy:   {:.2}", data["average_energy"].as_f64().unwrap_or(0.0));
                    println!();
                    print_series("duration", &data["duration_trend"]);
                }
            }
        }

        Commands::Triggers { days } => {
            let data = client
                .get_json(&format!("/api/v1/analytics/symptom-triggers?{}", days_query(days)))
                .await?;

            match cli.format {
                OutputFormat::Json => print_json(&data)?,
                OutputFormat::Table => print_triggers(&data),
            }
        }

        Commands::Status => {
            let health = client.get_json("/health").await?;
            println!("Healthtrack v{}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("API Status: {}", health["status"].as_str().unwrap_or("unknown"));
            println!("Storage:    {}", health["storage"].as_str().unwrap_or("unknown"));
            if let Some(uptime) = health["uptime_seconds"].as_u64() {
                println!("Uptime:     {}", format_duration(uptime));
            }
        }

        Commands::Export { kind, csv, output } => {
            let path = match (kind, csv) {
                (ExportKind::Health, false) => "/api/v1/export/health-data",
                (ExportKind::Health, true) => "/api/v1/export/health-data?format=csv",
                (ExportKind::Sleep, false) => "/api/v1/export/sleep-data",
                (ExportKind::Sleep, true) => "/api/v1/export/sleep-data?format=csv",
                (ExportKind::Meals, false) => "/api/v1/export/meal-data",
                (ExportKind::All, false) => "/api/v1/export/all-data",
                (_, true) => bail!("CSV export is only available for health and sleep data"),
            };

            let data = client.get(path).await?.text().await?;

            match output {
                Some(path) => {
                    std::fs::write(&path, &data)
                        .with_context(|| format!("Failed to write {:?}", path))?;
                    println!("Exported to {:?}", path);
                }
                None => print!("{}", data),
            }
        }

        Commands::Config { output } => {
            let config = healthtrack::config::generate_default_config();

            match output {
                Some(path) => {
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(&path, &config)?;
                    println!("Config written to {:?}", path);
                }
                None => print!("{}", config),
            }
        }
    }

    Ok(())
}

fn resolve_date(raw: Option<&str>) -> Result<NaiveDate> {
    match raw {
        None | Some("today") => Ok(Utc::now().date_naive()),
        Some("yesterday") => Utc::now()
            .date_naive()
            .pred_opt()
            .context("date out of range"),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .with_context(|| format!("Invalid date '{}'. Use YYYY-MM-DD", s)),
    }
}

fn days_query(days: Option<u32>) -> String {
    days.map(|d| format!("days={}", d)).unwrap_or_default()
}

fn print_json(data: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(data)?);
    Ok(())
}

fn print_series(name: &str, points: &Value) {
    let points = points.as_array().map(Vec::as_slice).unwrap_or_default();
    println!("{}", name);
    if points.is_empty() {
        println!("  (no data)");
    }
    for point in points {
        let value = match &point["value"] {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        println!("  {:<12} {}", point["date"].as_str().unwrap_or("-"), value);
    }
    println!();
}

fn print_correlations(data: &Value) {
    let days = data.as_array().map(Vec::as_slice).unwrap_or_default();
    if days.is_empty() {
        println!("No health logs in this window");
        return;
    }

    let food_list = |foods: &Value| {
        foods
            .as_array()
            .map(|fs| {
                fs.iter()
                    .filter_map(|f| f["name"].as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .unwrap_or_default()
    };

    println!("{:<12} {:>4} {:>4}  {:<30} {}", "Date", "Phys", "Ment", "Same day", "Day before");
    println!("{}", "-".repeat(90));
    for day in days {
        println!(
            "{:<12} {:>4} {:>4}  {:<30} {}",
            day["date"].as_str().unwrap_or("-"),
            day["physical_feeling"],
            day["mental_feeling"],
            food_list(&day["foods_eaten_same_day"]),
            food_list(&day["foods_eaten_previous_day"]),
        );
    }
}

fn print_triggers(data: &Value) {
    let triggers = data.as_array().map(Vec::as_slice).unwrap_or_default();
    if triggers.is_empty() {
        println!("No potential triggers found");
        return;
    }

    println!("{:<4} {:<30} {}", "#", "Food", "Poor days preceded");
    println!("{}", "-".repeat(55));
    for (i, t) in triggers.iter().enumerate() {
        println!(
            "{:<4} {:<30} {}",
            i + 1,
            t["food"].as_str().unwrap_or("-"),
            t["count"]
        );
    }
}

fn format_duration(seconds: u64) -> String {
    if seconds < 60 {
        format!("{}s", seconds)
    } else if seconds < 3600 {
        format!("{}m {}s", seconds / 60, seconds % 60)
    } else if seconds < 86400 {
        format!("{}h {}m", seconds / 3600, (seconds % 3600) / 60)
    } else {
        format!("{}d {}h", seconds / 86400, (seconds % 86400) / 3600)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_date() {
        assert_eq!(
            resolve_date(Some("2024-03-01")).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
        );
        assert!(resolve_date(Some("03/01/2024")).is_err());
        assert_eq!(resolve_date(None).unwrap(), Utc::now().date_naive());
    }

    #[test]
    fn test_days_query() {
        assert_eq!(days_query(Some(14)), "days=14");
        assert_eq!(days_query(None), "");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(45), "45s");
        assert_eq!(format_duration(3700), "1h 1m");
        assert_eq!(format_duration(90000), "1d 1h");
    }

    #[test]
    fn test_cli_parses() {
        let cli = Cli::try_parse_from(["healthtrack", "--user", "3", "triggers", "--days", "30"])
            .unwrap();
        assert_eq!(cli.user, 3);
        assert!(matches!(cli.command, Commands::Triggers { days: Some(30) }));
    }
}
