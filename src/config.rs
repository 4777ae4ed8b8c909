use crate::errors::{ParseError, Result, ValidationError};
use crate::structured::{BoxDimensions, CTypeDimensions};
use std::fmt::Write as _;
use std::path::Path;

/// Where the airfoil outline comes from. Exactly one source may be active at
/// a time: the analytic NACA generator, a named database entry resolved by an
/// external service, or a local coordinate file.
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeSource {
    Naca(String),
    Database(String),
    File(String),
}

/// The batch parameter set, one optional slot per config key. `None` means
/// "not set here": defaults apply only when the merged configuration still
/// carries no value, so file values and command-line overrides can be
/// layered without losing track of which keys were actually given.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub naca: Option<String>,
    pub airfoil: Option<String>,
    pub airfoil_path: Option<String>,
    pub flap_path: Option<String>,
    pub aoa: Option<f64>,
    pub deflection: Option<f64>,
    pub farfield: Option<f64>,
    pub box_dims: Option<String>,
    pub airfoil_mesh_size: Option<f64>,
    pub ext_mesh_size: Option<f64>,
    pub no_bl: Option<bool>,
    pub first_layer: Option<f64>,
    pub ratio: Option<f64>,
    pub nb_layers: Option<usize>,
    pub format: Option<String>,
    pub structured: Option<bool>,
    pub arg_struc: Option<String>,
    pub output: Option<String>,
}

fn parse_f64(key: &str, value: &str) -> Result<f64> {
    value.parse().map_err(|_| {
        ParseError::BadNumber {
            key: key.to_string(),
            value: value.to_string(),
        }
        .into()
    })
}

fn parse_usize(key: &str, value: &str) -> Result<usize> {
    value.parse().map_err(|_| {
        ParseError::BadNumber {
            key: key.to_string(),
            value: value.to_string(),
        }
        .into()
    })
}

fn parse_bool(value: &str) -> Result<bool> {
    if value.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if value.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(ParseError::BadBoolean(value.to_string()).into())
    }
}

impl Config {
    /// Parses the line-oriented `key=value` format. Blank lines and lines
    /// starting with `#` are skipped, whitespace around the `=` is ignored,
    /// and an empty value leaves the key unset.
    pub fn parse(text: &str) -> Result<Config> {
        let mut config = Config::default();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (key, value) = line
                .split_once('=')
                .ok_or_else(|| ParseError::BadConfigLine(line.to_string()))?;
            let key = key.trim();
            let value = value.trim();
            if value.is_empty() {
                continue;
            }

            config.set(key, value)?;
        }
        Ok(config)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "naca" => self.naca = Some(value.to_string()),
            "airfoil" => self.airfoil = Some(value.to_string()),
            "airfoil_path" => self.airfoil_path = Some(value.to_string()),
            "flap_path" => self.flap_path = Some(value.to_string()),
            "aoa" => self.aoa = Some(parse_f64(key, value)?),
            "deflection" => self.deflection = Some(parse_f64(key, value)?),
            "farfield" => self.farfield = Some(parse_f64(key, value)?),
            "box" => self.box_dims = Some(value.to_string()),
            "airfoil_mesh_size" => self.airfoil_mesh_size = Some(parse_f64(key, value)?),
            "ext_mesh_size" => self.ext_mesh_size = Some(parse_f64(key, value)?),
            "no_bl" => self.no_bl = Some(parse_bool(value)?),
            "first_layer" => self.first_layer = Some(parse_f64(key, value)?),
            "ratio" => self.ratio = Some(parse_f64(key, value)?),
            "nb_layers" => self.nb_layers = Some(parse_usize(key, value)?),
            "format" => self.format = Some(value.to_string()),
            "structured" => self.structured = Some(parse_bool(value)?),
            "arg_struc" => self.arg_struc = Some(value.to_string()),
            "output" => self.output = Some(value.to_string()),
            other => log::warn!("ignoring unknown config key '{}'", other),
        }
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Config> {
        let text = std::fs::read_to_string(path).map_err(|e| ParseError::UnreadableFile {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Config::parse(&text)
    }

    /// Serializes the parameter set in the same format `parse` reads, one
    /// `key= value` line per key with the value blank when unset, so saving
    /// and reloading reproduces the identical effective set.
    pub fn render(&self) -> String {
        fn line(out: &mut String, key: &str, value: Option<String>) {
            let _ = writeln!(out, "{}= {}", key, value.unwrap_or_default());
        }

        let mut out = String::new();
        line(&mut out, "naca", self.naca.clone());
        line(&mut out, "airfoil", self.airfoil.clone());
        line(&mut out, "airfoil_path", self.airfoil_path.clone());
        line(&mut out, "flap_path", self.flap_path.clone());
        line(&mut out, "aoa", self.aoa.map(|v| v.to_string()));
        line(&mut out, "deflection", self.deflection.map(|v| v.to_string()));
        line(&mut out, "farfield", self.farfield.map(|v| v.to_string()));
        line(&mut out, "box", self.box_dims.clone());
        line(
            &mut out,
            "airfoil_mesh_size",
            self.airfoil_mesh_size.map(|v| v.to_string()),
        );
        line(
            &mut out,
            "ext_mesh_size",
            self.ext_mesh_size.map(|v| v.to_string()),
        );
        line(&mut out, "no_bl", self.no_bl.map(|v| v.to_string()));
        line(
            &mut out,
            "first_layer",
            self.first_layer.map(|v| v.to_string()),
        );
        line(&mut out, "ratio", self.ratio.map(|v| v.to_string()));
        line(&mut out, "nb_layers", self.nb_layers.map(|v| v.to_string()));
        line(&mut out, "format", self.format.clone());
        line(&mut out, "structured", self.structured.map(|v| v.to_string()));
        line(&mut out, "arg_struc", self.arg_struc.clone());
        line(&mut out, "output", self.output.clone());
        out
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.render()).map_err(|e| {
            ParseError::UnwritableFile {
                path: path.display().to_string(),
                reason: e.to_string(),
            }
            .into()
        })
    }

    /// Layers `overrides` on top of this configuration: any key the override
    /// sets wins, any key it leaves unset falls through to this value.
    pub fn merge(&self, overrides: &Config) -> Config {
        Config {
            naca: overrides.naca.clone().or_else(|| self.naca.clone()),
            airfoil: overrides.airfoil.clone().or_else(|| self.airfoil.clone()),
            airfoil_path: overrides
                .airfoil_path
                .clone()
                .or_else(|| self.airfoil_path.clone()),
            flap_path: overrides.flap_path.clone().or_else(|| self.flap_path.clone()),
            aoa: overrides.aoa.or(self.aoa),
            deflection: overrides.deflection.or(self.deflection),
            farfield: overrides.farfield.or(self.farfield),
            box_dims: overrides.box_dims.clone().or_else(|| self.box_dims.clone()),
            airfoil_mesh_size: overrides.airfoil_mesh_size.or(self.airfoil_mesh_size),
            ext_mesh_size: overrides.ext_mesh_size.or(self.ext_mesh_size),
            no_bl: overrides.no_bl.or(self.no_bl),
            first_layer: overrides.first_layer.or(self.first_layer),
            ratio: overrides.ratio.or(self.ratio),
            nb_layers: overrides.nb_layers.or(self.nb_layers),
            format: overrides.format.clone().or_else(|| self.format.clone()),
            structured: overrides.structured.or(self.structured),
            arg_struc: overrides.arg_struc.clone().or_else(|| self.arg_struc.clone()),
            output: overrides.output.clone().or_else(|| self.output.clone()),
        }
    }

    /// Resolves the airfoil shape source, rejecting both an empty selection
    /// and an over-determined one.
    pub fn shape_source(&self) -> Result<ShapeSource> {
        let sources = [
            self.naca.clone().map(ShapeSource::Naca),
            self.airfoil.clone().map(ShapeSource::Database),
            self.airfoil_path.clone().map(ShapeSource::File),
        ];
        let mut given = sources.into_iter().flatten();
        match (given.next(), given.next()) {
            (Some(source), None) => Ok(source),
            (None, _) => Err(ValidationError::NoShapeSource.into()),
            (Some(_), Some(_)) => Err(ValidationError::MultipleShapeSources.into()),
        }
    }

    // Defaults applied where the merged configuration is silent.

    pub fn aoa(&self) -> f64 {
        self.aoa.unwrap_or(0.0)
    }

    pub fn deflection(&self) -> f64 {
        self.deflection.unwrap_or(0.0)
    }

    pub fn farfield(&self) -> f64 {
        self.farfield.unwrap_or(10.0)
    }

    pub fn airfoil_mesh_size(&self) -> f64 {
        self.airfoil_mesh_size.unwrap_or(0.01)
    }

    pub fn ext_mesh_size(&self) -> f64 {
        self.ext_mesh_size.unwrap_or(0.2)
    }

    pub fn no_bl(&self) -> bool {
        self.no_bl.unwrap_or(false)
    }

    pub fn first_layer(&self) -> f64 {
        self.first_layer.unwrap_or(3e-5)
    }

    pub fn ratio(&self) -> f64 {
        self.ratio.unwrap_or(1.2)
    }

    pub fn nb_layers(&self) -> usize {
        self.nb_layers.unwrap_or(35)
    }

    pub fn format(&self) -> &str {
        self.format.as_deref().unwrap_or("msh")
    }

    pub fn structured(&self) -> bool {
        self.structured.unwrap_or(false)
    }

    pub fn output(&self) -> &str {
        self.output.as_deref().unwrap_or(".")
    }

    /// The rectangular domain dimensions, when the `box` key was given.
    pub fn box_dimensions(&self) -> Option<Result<BoxDimensions>> {
        self.box_dims.as_deref().map(BoxDimensions::parse)
    }

    /// The C-type domain dimensions, defaulted when the `arg_struc` key is
    /// absent so a bare `structured= true` run still resolves.
    pub fn structured_dimensions(&self) -> Result<CTypeDimensions> {
        CTypeDimensions::parse(self.arg_struc.as_deref().unwrap_or("2x10x10"))
    }
}
