// Copyright @yucwang 2026

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use quick_xml::events::{ BytesStart, Event };
use quick_xml::Reader;
use thiserror::Error;

use crate::core::bxdf::BxDF;
use crate::core::computation_node::generate_node_id;
use crate::materials::coated::{ CoatedConductorBxDF, CoatedDiffuseBxDF };
use crate::materials::conductor::ConductorBxDF;
use crate::materials::dielectric::DielectricInterfaceBxDF;
use crate::materials::diffuse::{ DiffuseBxDF, IdealDiffuseBxDF };
use crate::materials::hair::HairBxDF;
use crate::materials::handle::BxDFHandle;
use crate::materials::layered::LayeredBxDFConfig;
use crate::materials::microfacet::TrowbridgeReitzDistribution;
use crate::materials::normalized_fresnel::NormalizedFresnelBxDF;
use crate::materials::specular::{ SpecularReflectionBxDF, SpecularTransmissionBxDF };
use crate::materials::thin_dielectric::ThinDielectricBxDF;
use crate::math::constants::Float;
use crate::math::spectrum::{ SampledSpectrum, N_SPECTRUM_SAMPLES };
use crate::media::slab::LayerSlab;

#[derive(Debug, Error)]
pub enum MaterialLoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Missing field: {0}")]
    MissingField(&'static str),

    #[error("Unknown bsdf type: {0}")]
    UnknownType(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamValue {
    Float(Float),
    Integer(i64),
    Boolean(bool),
    Spectrum(SampledSpectrum),
}

/// Parameters of one `<bsdf>` element, resolved against the file's defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialDesc {
    id: String,
    kind: String,
    params: HashMap<String, ParamValue>,
}

impl MaterialDesc {
    pub fn new(id: &str, kind: &str) -> Self {
        Self {
            id: id.to_string(),
            kind: kind.to_string(),
            params: HashMap::new(),
        }
    }

    pub fn with_param(mut self, name: &str, value: ParamValue) -> Self {
        self.params.insert(name.to_string(), value);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    fn float(&self, name: &str, default: Float) -> Result<Float, MaterialLoadError> {
        match self.params.get(name) {
            None => Ok(default),
            Some(ParamValue::Float(v)) => Ok(*v),
            Some(ParamValue::Integer(v)) => Ok(*v as Float),
            Some(other) => Err(self.type_mismatch(name, "float", other)),
        }
    }

    fn integer(&self, name: &str, default: i64) -> Result<i64, MaterialLoadError> {
        match self.params.get(name) {
            None => Ok(default),
            Some(ParamValue::Integer(v)) => Ok(*v),
            Some(other) => Err(self.type_mismatch(name, "integer", other)),
        }
    }

    fn boolean(&self, name: &str, default: bool) -> Result<bool, MaterialLoadError> {
        match self.params.get(name) {
            None => Ok(default),
            Some(ParamValue::Boolean(v)) => Ok(*v),
            Some(other) => Err(self.type_mismatch(name, "boolean", other)),
        }
    }

    fn spectrum(&self, name: &str, default: SampledSpectrum) -> Result<SampledSpectrum, MaterialLoadError> {
        match self.params.get(name) {
            None => Ok(default),
            Some(ParamValue::Spectrum(v)) => Ok(*v),
            Some(ParamValue::Float(v)) => Ok(SampledSpectrum::constant(*v)),
            Some(other) => Err(self.type_mismatch(name, "spectrum", other)),
        }
    }

    fn type_mismatch(&self, name: &str, expected: &str, found: &ParamValue) -> MaterialLoadError {
        MaterialLoadError::Parse(format!("{}: parameter '{}' expects a {}, found {:?}", self.id, name, expected, found))
    }

    fn warn_unknown_params(&self, known: &[&str]) {
        for name in self.params.keys() {
            if !known.contains(&name.as_str()) {
                log::warn!("{}: ignoring unknown parameter '{}' for bsdf type '{}'.", self.id, name, self.kind);
            }
        }
    }

    fn distribution(&self, prefix: &str) -> Result<TrowbridgeReitzDistribution, MaterialLoadError> {
        let roughness = self.float(&format!("{}roughness", prefix), 0.0)?;
        let u_roughness = self.float(&format!("{}uroughness", prefix), roughness)?;
        let v_roughness = self.float(&format!("{}vroughness", prefix), roughness)?;
        let (alpha_x, alpha_y) = if self.boolean("remaproughness", true)? {
            (TrowbridgeReitzDistribution::roughness_to_alpha(u_roughness),
             TrowbridgeReitzDistribution::roughness_to_alpha(v_roughness))
        } else {
            (u_roughness, v_roughness)
        };
        Ok(TrowbridgeReitzDistribution::new(alpha_x, alpha_y))
    }

    fn layered(&self) -> Result<(LayerSlab, LayeredBxDFConfig), MaterialLoadError> {
        let slab = LayerSlab::new(self.float("thickness", 0.01)?)
            .with_albedo(self.spectrum("albedo", SampledSpectrum::zero())?)
            .with_g(self.float("g", 0.0)?);
        let max_depth = self.integer("maxdepth", 10)?;
        let n_samples = self.integer("nsamples", 1)?;
        if !(0..=255).contains(&max_depth) || !(1..=255).contains(&n_samples) {
            return Err(MaterialLoadError::Parse(format!(
                "{}: maxdepth must be in [0, 255] and nsamples in [1, 255]", self.id)));
        }
        let config = LayeredBxDFConfig {
            max_depth: max_depth as u8,
            n_samples: n_samples as u8,
            two_sided: self.boolean("twosided", true)?,
        };
        Ok((slab, config))
    }

    /// Instantiates the scattering model this description names.
    pub fn build(&self) -> Result<BxDFHandle, MaterialLoadError> {
        const ROUGHNESS: [&str; 4] = ["roughness", "uroughness", "vroughness", "remaproughness"];
        const LAYER: [&str; 6] = ["thickness", "albedo", "g", "maxdepth", "nsamples", "twosided"];

        let handle: BxDFHandle = match self.kind.as_str() {
            "diffuse" => {
                self.warn_unknown_params(&["reflectance"]);
                IdealDiffuseBxDF::new(self.spectrum("reflectance", SampledSpectrum::constant(0.5))?).into()
            }
            "roughdiffuse" => {
                self.warn_unknown_params(&["reflectance", "transmittance", "sigma"]);
                DiffuseBxDF::new(self.spectrum("reflectance", SampledSpectrum::constant(0.5))?,
                                 self.spectrum("transmittance", SampledSpectrum::zero())?,
                                 self.float("sigma", 0.0)?).into()
            }
            "dielectric" => {
                self.warn_unknown_params(&[&ROUGHNESS[..], &["eta", "reflectance", "transmittance"][..]].concat());
                DielectricInterfaceBxDF::with_tints(self.float("eta", 1.5)?,
                                                    self.distribution("")?,
                                                    self.spectrum("reflectance", SampledSpectrum::one())?,
                                                    self.spectrum("transmittance", SampledSpectrum::one())?).into()
            }
            "thindielectric" => {
                self.warn_unknown_params(&["eta"]);
                ThinDielectricBxDF::new(self.float("eta", 1.5)?).into()
            }
            "specularreflection" => {
                self.warn_unknown_params(&["eta", "reflectance"]);
                SpecularReflectionBxDF::new(self.float("eta", 1.5)?,
                                            self.spectrum("reflectance", SampledSpectrum::one())?).into()
            }
            "speculartransmission" => {
                self.warn_unknown_params(&["eta", "transmittance"]);
                SpecularTransmissionBxDF::new(self.float("eta", 1.5)?,
                                              self.spectrum("transmittance", SampledSpectrum::one())?).into()
            }
            "conductor" => {
                self.warn_unknown_params(&[&ROUGHNESS[..], &["eta", "k"][..]].concat());
                ConductorBxDF::new(self.distribution("")?,
                                   self.spectrum("eta", SampledSpectrum::constant(0.2))?,
                                   self.spectrum("k", SampledSpectrum::constant(3.9))?).into()
            }
            "coateddiffuse" => {
                self.warn_unknown_params(&[&ROUGHNESS[..], &LAYER[..], &["eta", "reflectance"][..]].concat());
                let (slab, config) = self.layered()?;
                CoatedDiffuseBxDF::new(
                    DielectricInterfaceBxDF::new(self.float("eta", 1.5)?, self.distribution("")?),
                    IdealDiffuseBxDF::new(self.spectrum("reflectance", SampledSpectrum::constant(0.5))?),
                    slab,
                    config,
                ).into()
            }
            "coatedconductor" => {
                let known = [
                    &LAYER[..],
                    &["interface.eta", "interface.roughness", "interface.uroughness", "interface.vroughness",
                      "conductor.eta", "conductor.k", "conductor.roughness", "conductor.uroughness",
                      "conductor.vroughness", "remaproughness"][..],
                ].concat();
                self.warn_unknown_params(&known);
                let (slab, config) = self.layered()?;
                CoatedConductorBxDF::new(
                    DielectricInterfaceBxDF::new(self.float("interface.eta", 1.5)?, self.distribution("interface.")?),
                    ConductorBxDF::new(self.distribution("conductor.")?,
                                       self.spectrum("conductor.eta", SampledSpectrum::constant(0.2))?,
                                       self.spectrum("conductor.k", SampledSpectrum::constant(3.9))?),
                    slab,
                    config,
                ).into()
            }
            "hair" => {
                self.warn_unknown_params(&["h", "eta", "beta_m", "beta_n", "alpha",
                                           "sigma_a", "reflectance", "eumelanin", "pheomelanin"]);
                let beta_n = self.float("beta_n", 0.3)?;
                let sigma_a = if self.params.contains_key("sigma_a") {
                    self.spectrum("sigma_a", SampledSpectrum::zero())?
                } else if self.params.contains_key("reflectance") {
                    let color = self.spectrum("reflectance", SampledSpectrum::one())?;
                    HairBxDF::sigma_a_from_reflectance(&color, beta_n)
                } else {
                    let eumelanin = self.float("eumelanin", 1.3)?;
                    let pheomelanin = self.float("pheomelanin", 0.0)?;
                    let [r, g, b] = HairBxDF::sigma_a_from_concentration(eumelanin, pheomelanin);
                    SampledSpectrum::new([r, g, b, b])
                };
                let h = self.float("h", 0.0)?;
                if !(-1.0..=1.0).contains(&h) {
                    return Err(MaterialLoadError::Parse(format!("{}: h must lie in [-1, 1]", self.id)));
                }
                HairBxDF::new(h,
                              self.float("eta", 1.55)?,
                              sigma_a,
                              self.float("beta_m", 0.3)?.clamp(0.0, 1.0),
                              beta_n.clamp(0.0, 1.0),
                              self.float("alpha", 2.0)?).into()
            }
            "normalizedfresnel" => {
                self.warn_unknown_params(&["eta"]);
                NormalizedFresnelBxDF::new(self.float("eta", 1.33)?).into()
            }
            other => return Err(MaterialLoadError::UnknownType(other.to_string())),
        };

        log::debug!("Built material '{}' as {}.", self.id, handle.name());
        Ok(handle)
    }
}

pub fn load_materials<P: AsRef<Path>>(path: P) -> Result<Vec<MaterialDesc>, MaterialLoadError> {
    let path = path.as_ref();
    log::info!("Loading materials from: {}.", path.display());
    let xml = fs::read_to_string(path)?;
    parse_materials(&xml)
}

pub fn parse_materials(xml: &str) -> Result<Vec<MaterialDesc>, MaterialLoadError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut buf = Vec::new();

    let mut defaults: HashMap<String, String> = HashMap::new();
    let mut materials: Vec<MaterialDesc> = Vec::new();
    let mut current: Option<MaterialDesc> = None;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Eof => break,
            Event::Start(e) => start_element(&e, false, &mut defaults, &mut current, &mut materials)?,
            Event::Empty(e) => start_element(&e, true, &mut defaults, &mut current, &mut materials)?,
            Event::End(e) => {
                if e.name().as_ref() == b"bsdf" {
                    if let Some(desc) = current.take() {
                        materials.push(desc);
                    }
                }
            }
            _ => {}
        }
        buf.clear();
    }

    if let Some(desc) = current.take() {
        return Err(MaterialLoadError::Parse(format!("unterminated bsdf element '{}'", desc.id)));
    }
    log::info!("Loaded {} material descriptions.", materials.len());
    Ok(materials)
}

fn start_element(e: &BytesStart,
                 self_closing: bool,
                 defaults: &mut HashMap<String, String>,
                 current: &mut Option<MaterialDesc>,
                 materials: &mut Vec<MaterialDesc>) -> Result<(), MaterialLoadError> {
    match e.name().as_ref() {
        b"default" => {
            let name = attribute(e, b"name")?.ok_or(MaterialLoadError::MissingField("default.name"))?;
            let value = attribute(e, b"value")?.ok_or(MaterialLoadError::MissingField("default.value"))?;
            defaults.insert(name, value);
        }
        b"bsdf" => {
            if current.is_some() {
                return Err(MaterialLoadError::Parse("nested bsdf elements are not supported".to_string()));
            }
            let kind = attribute(e, b"type")?.ok_or(MaterialLoadError::MissingField("bsdf.type"))?;
            let kind = resolve_value(&kind, defaults);
            let id = match attribute(e, b"id")? {
                Some(id) => resolve_value(&id, defaults),
                None => generate_node_id(&kind),
            };
            let desc = MaterialDesc::new(&id, &kind);
            if self_closing {
                materials.push(desc);
            } else {
                *current = Some(desc);
            }
        }
        tag @ (b"float" | b"integer" | b"boolean" | b"spectrum") => {
            let desc = current.as_mut().ok_or_else(|| {
                MaterialLoadError::Parse("parameter outside of a bsdf element".to_string())
            })?;
            let name = attribute(e, b"name")?.ok_or(MaterialLoadError::MissingField("parameter.name"))?;
            let raw = attribute(e, b"value")?.ok_or(MaterialLoadError::MissingField("parameter.value"))?;
            let value = resolve_value(&raw, defaults);
            let param = match tag {
                b"float" => ParamValue::Float(parse_float(&value)?),
                b"integer" => ParamValue::Integer(parse_integer(&value)?),
                b"boolean" => ParamValue::Boolean(parse_boolean(&value)?),
                _ => ParamValue::Spectrum(parse_spectrum(&value)?),
            };
            desc.params.insert(name, param);
        }
        b"materials" => {}
        other => {
            log::warn!("Ignoring unknown element <{}>.", String::from_utf8_lossy(other));
        }
    }
    Ok(())
}

fn attribute(e: &BytesStart, key: &[u8]) -> Result<Option<String>, MaterialLoadError> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == key {
            return Ok(Some(attr.unescape_value()?.to_string()));
        }
    }
    Ok(None)
}

fn resolve_value(raw: &str, defaults: &HashMap<String, String>) -> String {
    let mut out = raw.to_string();
    for (k, v) in defaults {
        out = out.replace(&format!("${}", k), v);
    }
    out
}

fn parse_float(value: &str) -> Result<Float, MaterialLoadError> {
    value.trim().parse::<Float>().map_err(|_| MaterialLoadError::Parse(format!("invalid float: {}", value)))
}

fn parse_integer(value: &str) -> Result<i64, MaterialLoadError> {
    value.trim().parse::<i64>().map_err(|_| MaterialLoadError::Parse(format!("invalid integer: {}", value)))
}

fn parse_boolean(value: &str) -> Result<bool, MaterialLoadError> {
    match value.trim() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(MaterialLoadError::Parse(format!("invalid boolean: {}", value))),
    }
}

fn parse_spectrum(value: &str) -> Result<SampledSpectrum, MaterialLoadError> {
    let parts = value.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(parse_float)
        .collect::<Result<Vec<Float>, MaterialLoadError>>()?;
    match parts.len() {
        1 => Ok(SampledSpectrum::constant(parts[0])),
        N_SPECTRUM_SAMPLES => {
            let mut values = [0.0; N_SPECTRUM_SAMPLES];
            values.copy_from_slice(&parts);
            Ok(SampledSpectrum::new(values))
        }
        n => Err(MaterialLoadError::Parse(format!(
            "spectrum needs 1 or {} values, found {}: {}", N_SPECTRUM_SAMPLES, n, value))),
    }
}
