use std::path::PathBuf;

use clap::builder::{styling::AnsiColor, Styles};
use clap::Parser;

const ABOUT: &str = "Open-Meteo weather TUI";

const LONG_ABOUT: &str = "
TUI for looking up current and hourly weather for any city, sourced from Open-Meteo.

Search for a city with `/`, save it with `f`, and reopen saved cities from the favorites list. When
notifications are enabled (`n`), meteo raises an alert if rain or high temperatures are expected in
the next few hours.

Favorites, the theme and the notification choice are saved, so they survive restarts.
";

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Yellow.on_default())
    .usage(AnsiColor::Green.on_default())
    .literal(AnsiColor::Green.on_default())
    .placeholder(AnsiColor::Green.on_default());

#[derive(Parser, Debug)]
#[command(version, styles=STYLES, about=ABOUT, long_about = LONG_ABOUT)]
pub struct Args {
    #[arg(help = "City to look up on start (e.g. Paris, \"San Francisco\")")]
    pub city: Option<String>,

    #[arg(long, value_name = "PATH", help = "Config file (defaults to <config dir>/meteo/config.toml)")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Treat notifications as unsupported for this run")]
    pub no_notifications: bool,
}
