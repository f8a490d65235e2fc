use anyhow::{Context, bail};
use chrono::FixedOffset;
use clap::{Parser, Subcommand};
use inquire::{Confirm, Text};

use nimbus_core::config::Config;
use nimbus_core::location::Location;
use nimbus_core::mapper;
use nimbus_core::model::{Alert, Base, Current, Daily, Temperature};
use nimbus_core::source::{SourceId, source_from_config};
use nimbus_core::units::{
    FormattingCapabilities, Locale, SpeedUnit, TemperatureUnit, UnitWidth,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "nimbus", version, about = "Multi-source weather CLI")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure credentials for a specific source.
    Configure {
        /// Source short name, e.g. "openweather" or "brightsky".
        source: String,
    },

    /// List the known sources and their configuration state.
    Sources,

    /// Show weather for a coordinate pair.
    Show {
        /// Latitude in decimal degrees.
        latitude: f64,

        /// Longitude in decimal degrees.
        longitude: f64,

        /// Source to query; defaults to the configured default source.
        #[arg(long)]
        source: Option<String>,

        /// ISO 3166-1 alpha-2 country code of the location, used for
        /// region-restricted sources and unit defaults.
        #[arg(long)]
        country: Option<String>,

        /// UTC offset of the location in whole minutes (e.g. -300).
        #[arg(long, default_value_t = 0)]
        utc_offset: i32,

        /// BCP 47 style language tag for output ("en-US", "de-DE").
        #[arg(long, default_value = "en-US")]
        lang: String,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure { source } => configure(&source),
            Command::Sources => {
                list_sources()?;
                Ok(())
            }
            Command::Show {
                latitude,
                longitude,
                source,
                country,
                utc_offset,
                lang,
            } => show(latitude, longitude, source, country, utc_offset, &lang).await,
        }
    }
}

fn configure(source: &str) -> anyhow::Result<()> {
    let id = SourceId::try_from(source)?;
    let mut config = Config::load()?;

    let api_key = Text::new(&format!("API key for {id} (leave empty to skip):"))
        .prompt()
        .context("Failed to read API key")?;
    if !api_key.trim().is_empty() {
        config.upsert_source_api_key(id, api_key.trim().to_string());
    }

    let custom_instance = Confirm::new("Use a custom instance URL?")
        .with_default(false)
        .prompt()
        .context("Failed to read answer")?;
    if custom_instance {
        let url = Text::new("Instance base URL:")
            .prompt()
            .context("Failed to read instance URL")?;
        if !url.trim().is_empty() {
            config.set_instance_url(id, url.trim().to_string());
        }
    }

    if !id.is_secondary_only() {
        let make_default = Confirm::new(&format!("Make {id} the default source?"))
            .with_default(config.default_source.is_none())
            .prompt()
            .context("Failed to read answer")?;
        if make_default {
            config.set_default_source(id);
        }
    }

    config.save()?;
    println!("Saved configuration for {id}.");
    Ok(())
}

fn list_sources() -> anyhow::Result<()> {
    let config = Config::load()?;
    let default = config.default_source_id().ok();

    for id in SourceId::all() {
        let mut notes = Vec::new();
        if id.is_secondary_only() {
            notes.push("secondary only");
        }
        if config
            .source_config(*id)
            .is_some_and(|c| c.api_key.is_some())
        {
            notes.push("key configured");
        }
        if default == Some(*id) {
            notes.push("default");
        }
        if notes.is_empty() {
            println!("{id}");
        } else {
            println!("{id} ({})", notes.join(", "));
        }
    }
    Ok(())
}

async fn show(
    latitude: f64,
    longitude: f64,
    source: Option<String>,
    country: Option<String>,
    utc_offset: i32,
    lang: &str,
) -> anyhow::Result<()> {
    let config = Config::load()?;
    let id = match source {
        Some(s) => SourceId::try_from(s.as_str())?,
        None => config.default_source_id()?,
    };

    let timezone = FixedOffset::east_opt(utc_offset * 60)
        .context("UTC offset out of range")?;
    let mut location = Location::new(latitude, longitude, timezone);
    if let Some(country) = &country {
        location = location.with_country(country);
    }

    let service = source_from_config(id, &config)?;
    let supported = service.supported_features(&location);
    if supported.is_empty() {
        bail!("{id} does not cover this location");
    }
    // Everything the source offers here, minutely and normals included.
    let mut wrapper = service.fetch(&location, &supported).await?;
    for (feature, error) in std::mem::take(&mut wrapper.failed_features) {
        eprintln!("warning: {feature} unavailable: {error}");
    }
    let weather = mapper::assemble(wrapper, Base::default(), timezone);

    let locale = parse_locale(lang);
    let temperature_unit = country
        .as_deref()
        .map(TemperatureUnit::default_for_country)
        .unwrap_or(TemperatureUnit::Celsius);
    let speed_unit = country
        .as_deref()
        .map(SpeedUnit::default_for_country)
        .unwrap_or(SpeedUnit::MeterPerSecond);

    if let Some(current) = &weather.current {
        print_current(current, temperature_unit, speed_unit, &locale);
    }
    if !weather.daily_forecast.is_empty() {
        println!("Forecast:");
        for day in weather.daily_forecast.iter().take(7) {
            print_daily(day, temperature_unit, &locale);
        }
    }
    for alert in &weather.alert_list {
        print_alert(alert);
    }

    Ok(())
}

/// Split a "language-REGION" tag; a bare language gets an empty region.
fn parse_locale(lang: &str) -> Locale {
    match lang.split_once('-') {
        Some((language, region)) => Locale::new(language, region),
        None => Locale::new(lang, ""),
    }
}

fn print_current(
    current: &Current,
    temperature_unit: TemperatureUnit,
    speed_unit: SpeedUnit,
    locale: &Locale,
) {
    let caps = FormattingCapabilities::MODERN;
    if let Some(text) = &current.weather_text {
        println!("Now: {text}");
    }
    if let Some(t) = current.temperature.as_ref().and_then(|t| t.temperature) {
        println!(
            "  temperature {}",
            t.format(temperature_unit, UnitWidth::Short, locale, caps, false)
        );
    }
    if let Some(feels) = current.temperature.as_ref().and_then(Temperature::feels_like) {
        println!(
            "  feels like  {}",
            feels.format(temperature_unit, UnitWidth::Short, locale, caps, false)
        );
    }
    if let Some(speed) = current.wind.as_ref().and_then(|w| w.speed) {
        println!(
            "  wind        {}",
            speed.format(speed_unit, UnitWidth::Short, locale, caps)
        );
    }
    if let Some(humidity) = current.relative_humidity {
        println!("  humidity    {}%", (humidity.value() * 100.0).round());
    }
}

fn print_daily(day: &Daily, temperature_unit: TemperatureUnit, locale: &Locale) {
    let caps = FormattingCapabilities::MODERN;
    let format = |t: Option<nimbus_core::units::Temperature>| {
        t.map(|t| t.format(temperature_unit, UnitWidth::Narrow, locale, caps, false))
            .unwrap_or_else(|| "--".to_string())
    };
    let high = format(
        day.day
            .as_ref()
            .and_then(|h| h.temperature.as_ref())
            .and_then(|t| t.temperature),
    );
    let low = format(
        day.night
            .as_ref()
            .and_then(|h| h.temperature.as_ref())
            .and_then(|t| t.temperature),
    );
    let text = day
        .day
        .as_ref()
        .and_then(|h| h.weather_text.as_deref())
        .unwrap_or("");
    println!("  {}  {high} / {low}  {text}", day.date.format("%Y-%m-%d"));
}

fn print_alert(alert: &Alert) {
    let headline = alert.headline.as_deref().unwrap_or("Weather alert");
    println!("! {headline} [{:?}]", alert.severity);
    if let Some(description) = &alert.description {
        println!("  {description}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locale_tags_split_into_language_and_region() {
        let l = parse_locale("de-DE");
        assert_eq!(l.language, "de");
        assert_eq!(l.region, "DE");
        let bare = parse_locale("fr");
        assert_eq!(bare.language, "fr");
        assert_eq!(bare.region, "");
    }

    #[test]
    fn unknown_show_source_is_rejected() {
        assert!(SourceId::try_from("nope").is_err());
    }
}
