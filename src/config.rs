// Runtime configuration: optional TOML file, then command-line overrides.

use std::path::{Path, PathBuf};

use clap::Parser;
use serde::Deserialize;

use crate::error::Error;
use crate::renderer::DEFAULT_CELL_SIZE;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Image to render.
    pub source: Option<PathBuf>,
    /// Pixels per grid cell.
    pub cell_size: u32,
    /// Start fully visible instead of faded out.
    pub active: bool,
    /// Initial window size.
    pub width: usize,
    pub height: usize,
    /// Surface color behind the glyphs, 0xRRGGBB.
    pub background: u32,
    pub target_fps: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: None,
            cell_size: DEFAULT_CELL_SIZE,
            active: true,
            width: 640,
            height: 800,
            background: 0x00F5_F0E8,
            target_fps: 60,
        }
    }
}

/// Command-line flags; each one overrides the matching config entry.
#[derive(Debug, Default, Parser)]
#[command(name = "halftone-portrait", about = "Live ASCII halftone of an image, with pointer ripples")]
pub struct Args {
    /// Image file to render
    pub source: Option<PathBuf>,

    /// TOML config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Pixels per grid cell
    #[arg(long)]
    pub cell_size: Option<u32>,

    /// Start faded out (toggle with A)
    #[arg(long)]
    pub inactive: bool,

    #[arg(long)]
    pub width: Option<usize>,

    #[arg(long)]
    pub height: Option<usize>,
}

impl Config {
    pub fn from_toml_str(text: &str) -> Result<Self, Error> {
        let cfg: Config = toml::from_str(text).map_err(|e| Error::Config(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: &Path) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// File (if given) first, then flags on top.
    pub fn resolve(args: &Args) -> Result<Self, Error> {
        let mut cfg = match &args.config {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        if let Some(src) = &args.source {
            cfg.source = Some(src.clone());
        }
        if let Some(cell) = args.cell_size {
            cfg.cell_size = cell;
        }
        if args.inactive {
            cfg.active = false;
        }
        if let Some(w) = args.width {
            cfg.width = w;
        }
        if let Some(h) = args.height {
            cfg.height = h;
        }
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.cell_size < 1 {
            return Err(Error::Config("cell_size must be at least 1".into()));
        }
        if self.width == 0 || self.height == 0 {
            return Err(Error::Config(format!("window size {}x{} is empty", self.width, self.height)));
        }
        if self.background > 0x00FF_FFFF {
            return Err(Error::Config(format!("background {:#x} is not 0xRRGGBB", self.background)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test_log::test]
    fn empty_file_gives_defaults() {
        assert_eq!(Config::from_toml_str("").unwrap(), Config::default());
    }

    #[test_log::test]
    fn partial_file_overrides_fields() {
        let cfg = Config::from_toml_str("cell_size = 12\nactive = false\nbackground = 0x101010\n").unwrap();
        assert_eq!(cfg.cell_size, 12);
        assert!(!cfg.active);
        assert_eq!(cfg.background, 0x101010);
        assert_eq!(cfg.width, Config::default().width);
    }

    #[test_log::test]
    fn zero_cell_size_is_rejected() {
        assert!(matches!(Config::from_toml_str("cell_size = 0"), Err(Error::Config(_))));
    }

    #[test_log::test]
    fn flags_override_defaults() {
        let args = Args::parse_from(["halftone-portrait", "face.png", "--cell-size", "6", "--inactive"]);
        let cfg = Config::resolve(&args).unwrap();
        assert_eq!(cfg.source.as_deref(), Some(Path::new("face.png")));
        assert_eq!(cfg.cell_size, 6);
        assert!(!cfg.active);
    }

    #[test_log::test]
    fn missing_config_file_is_an_error() {
        let args = Args::parse_from(["halftone-portrait", "--config", "/definitely/not/here.toml"]);
        assert!(matches!(Config::resolve(&args), Err(Error::Config(_))));
    }
}
