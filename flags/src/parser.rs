//! Validation of the untrusted remote payload.
//!
//! The payload is a JSON object keyed by flag domain. Each recognized domain is
//! deserialized against its schema with every field decoded leniently: a field
//! that is missing or has the wrong shape takes the domain default instead of
//! failing the whole flag. A domain value that cannot be read at all is skipped
//! on its own and the remaining keys are still processed.

use crate::counter;
use crate::metrics_defs::PARSE_SKIPPED;
use crate::schema::{
    BannerConfig, BannerIcon, MaterialsVisibility, ModalConfig, OutOfServiceConfig,
    SectionsVisibility, ServicesVisibility,
};
use crate::types::{Flag, FlagDomain, FlagSet, Toggle};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

#[derive(thiserror::Error, Debug)]
pub enum ParseError {
    #[error("expected an object, found {0}")]
    NotAnObject(&'static str),
    #[error("invalid flag value: {0}")]
    Invalid(#[from] serde_json::Error),
}

/// Builds a typed flag set from the raw payload. Never fails: anything that
/// cannot be understood is left out of the result.
pub fn parse(raw: &Value) -> FlagSet {
    let Some(entries) = raw.as_object() else {
        tracing::debug!(found = kind(raw), "flag payload is not an object");
        return FlagSet::new();
    };

    let mut flags = FlagSet::new();
    for (key, value) in entries {
        let Ok(domain) = key.parse::<FlagDomain>() else {
            tracing::trace!(key = %key, "ignoring unrecognized flag key");
            continue;
        };

        match parse_flag(domain, value) {
            Ok(flag) => {
                flags.insert(flag);
            }
            Err(err) => {
                tracing::debug!(domain = %domain, error = %err, "skipping malformed flag");
                counter!(PARSE_SKIPPED).increment(1);
            }
        }
    }

    flags
}

fn parse_flag(domain: FlagDomain, value: &Value) -> Result<Flag, ParseError> {
    if !value.is_object() {
        return Err(ParseError::NotAnObject(kind(value)));
    }

    let flag = match domain {
        FlagDomain::OutOfService => WireOutOfService::deserialize(value)?.into(),
        FlagDomain::SectionsVisibility => WireSections::deserialize(value)?.into(),
        FlagDomain::ServicesVisibility => WireServices::deserialize(value)?.into(),
        FlagDomain::MaterialsVisibility => WireMaterials::deserialize(value)?.into(),
    };

    Ok(flag)
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// Only a literal `true` enables a flag.
fn literal_true<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(matches!(Value::deserialize(deserializer)?, Value::Bool(true)))
}

// A value of the wrong type reads as absent.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

// Like `lenient`, but only objects are accepted so arrays are never read
// positionally into a struct.
fn lenient_object<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    if !value.is_object() {
        return Ok(None);
    }
    Ok(serde_json::from_value(value).ok())
}

fn text_or(value: Option<String>, default: String) -> String {
    value.filter(|s| !s.is_empty()).unwrap_or(default)
}

#[derive(Deserialize)]
struct WireOutOfService {
    #[serde(default, deserialize_with = "literal_true")]
    enabled: bool,
    #[serde(default, deserialize_with = "lenient_object")]
    modal: Option<WireModal>,
    #[serde(default, deserialize_with = "lenient_object")]
    banner: Option<WireBanner>,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireModal {
    #[serde(default, deserialize_with = "lenient")]
    title: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    message: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    button_text: Option<String>,
}

#[derive(Default, Deserialize)]
struct WireBanner {
    #[serde(default, deserialize_with = "lenient")]
    message: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    icon: Option<BannerIcon>,
    #[serde(default, deserialize_with = "lenient")]
    dismissible: Option<bool>,
}

impl From<WireOutOfService> for Flag {
    fn from(wire: WireOutOfService) -> Self {
        let defaults = OutOfServiceConfig::default();
        let modal = wire.modal.unwrap_or_default();
        let banner = wire.banner.unwrap_or_default();

        let config = OutOfServiceConfig {
            modal: ModalConfig {
                title: text_or(modal.title, defaults.modal.title),
                message: text_or(modal.message, defaults.modal.message),
                button_text: text_or(modal.button_text, defaults.modal.button_text),
            },
            banner: BannerConfig {
                message: text_or(banner.message, defaults.banner.message),
                icon: banner.icon.unwrap_or(defaults.banner.icon),
                dismissible: banner.dismissible.unwrap_or(defaults.banner.dismissible),
            },
        };

        Flag::OutOfService(Toggle::new(wire.enabled, config))
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireSections {
    #[serde(default, deserialize_with = "literal_true")]
    enabled: bool,
    #[serde(default, deserialize_with = "lenient")]
    hero: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    services: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    model_viewer: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    filament_colors: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    gallery: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    contact: Option<bool>,
}

impl From<WireSections> for Flag {
    fn from(wire: WireSections) -> Self {
        let defaults = SectionsVisibility::default();
        let config = SectionsVisibility {
            hero: wire.hero.unwrap_or(defaults.hero),
            services: wire.services.unwrap_or(defaults.services),
            model_viewer: wire.model_viewer.unwrap_or(defaults.model_viewer),
            filament_colors: wire.filament_colors.unwrap_or(defaults.filament_colors),
            gallery: wire.gallery.unwrap_or(defaults.gallery),
            contact: wire.contact.unwrap_or(defaults.contact),
        };
        Flag::SectionsVisibility(Toggle::new(wire.enabled, config))
    }
}

#[derive(Deserialize)]
struct WireServices {
    #[serde(default, deserialize_with = "literal_true")]
    enabled: bool,
    #[serde(default, deserialize_with = "lenient")]
    printing: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    prototyping: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    custom: Option<bool>,
}

impl From<WireServices> for Flag {
    fn from(wire: WireServices) -> Self {
        let defaults = ServicesVisibility::default();
        let config = ServicesVisibility {
            printing: wire.printing.unwrap_or(defaults.printing),
            prototyping: wire.prototyping.unwrap_or(defaults.prototyping),
            custom: wire.custom.unwrap_or(defaults.custom),
        };
        Flag::ServicesVisibility(Toggle::new(wire.enabled, config))
    }
}

#[derive(Deserialize)]
struct WireMaterials {
    #[serde(default, deserialize_with = "literal_true")]
    enabled: bool,
    #[serde(default, deserialize_with = "lenient")]
    pla: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    petg: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    abs: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    tpu: Option<bool>,
}

impl From<WireMaterials> for Flag {
    fn from(wire: WireMaterials) -> Self {
        let defaults = MaterialsVisibility::default();
        let config = MaterialsVisibility {
            pla: wire.pla.unwrap_or(defaults.pla),
            petg: wire.petg.unwrap_or(defaults.petg),
            abs: wire.abs.unwrap_or(defaults.abs),
            tpu: wire.tpu.unwrap_or(defaults.tpu),
        };
        Flag::MaterialsVisibility(Toggle::new(wire.enabled, config))
    }
}
