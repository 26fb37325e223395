//! Static local configuration shipped with the client.
//!
//! These catalogs are the local fallback whenever a visibility flag is absent
//! or disabled.

use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SectionDescriptor {
    /// Key used by the `sections-visibility` payload.
    pub key: &'static str,
    /// Identifier used by the page.
    pub id: &'static str,
    pub name: &'static str,
    pub enabled: bool,
    pub description: &'static str,
}

pub const SECTIONS: &[SectionDescriptor] = &[
    SectionDescriptor {
        key: "hero",
        id: "hero",
        name: "Hero",
        enabled: true,
        description: "Banner principal con título y llamada a la acción",
    },
    SectionDescriptor {
        key: "services",
        id: "services",
        name: "Servicios",
        enabled: true,
        description: "Listado de servicios ofrecidos",
    },
    SectionDescriptor {
        key: "modelViewer",
        id: "model-viewer",
        name: "Visor de Modelos",
        enabled: true,
        description: "Visor 3D interactivo para subir y visualizar modelos",
    },
    SectionDescriptor {
        key: "filamentColors",
        id: "filament-colors",
        name: "Colores de Filamento",
        enabled: true,
        description: "Selector de materiales y colores disponibles",
    },
    SectionDescriptor {
        key: "gallery",
        id: "gallery",
        name: "Galería de Proyectos",
        // Hidden until there are projects to show.
        enabled: false,
        description: "Galería con trabajos realizados",
    },
    SectionDescriptor {
        key: "contact",
        id: "contact",
        name: "Contacto WhatsApp",
        enabled: true,
        description: "Sección de contacto con enlace a WhatsApp",
    },
];

/// Finds a section by payload key or by page id.
pub fn section(key_or_id: &str) -> Option<&'static SectionDescriptor> {
    SECTIONS
        .iter()
        .find(|s| s.key == key_or_id || s.id == key_or_id)
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Service {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub features: &'static [&'static str],
}

pub const SERVICES: &[Service] = &[
    Service {
        id: "printing",
        title: "Impresión 3D",
        description: "Impresión de alta calidad en diversos materiales y colores",
        icon: "Printer",
        features: &[
            "Múltiples materiales (PLA, PETG, ABS, TPU)",
            "Amplia gama de colores",
            "Alta precisión y acabado",
            "Tamaños desde miniatura hasta 30cm",
        ],
    },
    Service {
        id: "design",
        title: "Diseño 3D",
        description: "Modelado profesional de tus ideas desde cero",
        icon: "Pen",
        features: &[
            "Diseño personalizado",
            "Optimización para impresión",
            "Modificación de modelos existentes",
            "Asesoramiento técnico",
        ],
    },
    Service {
        id: "prototyping",
        title: "Prototipado Rápido",
        description: "Convierte tus ideas en prototipos físicos rápidamente",
        icon: "Zap",
        features: &[
            "Entrega rápida",
            "Iteraciones veloces",
            "Validación de diseños",
            "Ahorro en desarrollo",
        ],
    },
    Service {
        id: "custom",
        title: "Proyectos a Medida",
        description: "Soluciones personalizadas para tus necesidades específicas",
        icon: "Wrench",
        features: &[
            "Consultoría personalizada",
            "Proyectos complejos",
            "Post-procesado disponible",
            "Soporte continuo",
        ],
    },
];

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FilamentColor {
    pub id: &'static str,
    pub name: &'static str,
    pub hex: &'static str,
    pub available: bool,
}

const fn color(id: &'static str, name: &'static str, hex: &'static str, available: bool) -> FilamentColor {
    FilamentColor {
        id,
        name,
        hex,
        available,
    }
}

const WHITE: FilamentColor = color("white", "Blanco", "#FFFFFF", true);
const BLACK: FilamentColor = color("black", "Negro", "#000000", true);
const RED: FilamentColor = color("red", "Rojo", "#EF4444", true);
const BLUE: FilamentColor = color("blue", "Azul", "#3B82F6", true);
const GREEN: FilamentColor = color("green", "Verde", "#10B981", true);
const YELLOW: FilamentColor = color("yellow", "Amarillo", "#FBBF24", true);
const ORANGE: FilamentColor = color("orange", "Naranja", "#F97316", true);
const PURPLE: FilamentColor = color("purple", "Violeta", "#A855F7", true);
const PINK: FilamentColor = color("pink", "Rosa", "#EC4899", false);
const GRAY: FilamentColor = color("gray", "Gris", "#6B7280", true);
const SILVER: FilamentColor = color("silver", "Plateado", "#D1D5DB", true);
const GOLD: FilamentColor = color("gold", "Dorado", "#F59E0B", false);

/// A printing material. `available` is the only field flags can override;
/// color availability is always local.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Material {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub properties: &'static [&'static str],
    pub available: bool,
    pub colors: &'static [FilamentColor],
}

pub const MATERIALS: &[Material] = &[
    Material {
        id: "pla",
        name: "PLA",
        description: "Material versátil y fácil de usar, ideal para la mayoría de aplicaciones",
        properties: &[
            "Biodegradable",
            "Bajo olor",
            "Buena calidad superficial",
            "No flexible",
        ],
        available: true,
        colors: &[
            WHITE, BLACK, RED, BLUE, GREEN, YELLOW, ORANGE, PURPLE, PINK, GRAY, SILVER, GOLD,
        ],
    },
    Material {
        id: "petg",
        name: "PETG",
        description: "Mayor resistencia y durabilidad que PLA, resistente a impactos",
        properties: &[
            "Resistente",
            "Flexible",
            "Resistente a químicos",
            "Uso alimentario",
        ],
        available: true,
        colors: &[WHITE, BLACK, BLUE, GRAY],
    },
    Material {
        id: "abs",
        name: "ABS",
        description: "Alta resistencia mecánica y térmica, ideal para piezas funcionales",
        properties: &[
            "Muy resistente",
            "Resistente al calor",
            "Mecanizable",
            "Más fuerte que PLA",
        ],
        available: false,
        colors: &[WHITE, BLACK, GRAY],
    },
    Material {
        id: "tpu",
        name: "TPU",
        description: "Material flexible tipo goma, ideal para piezas que requieren elasticidad",
        properties: &[
            "Muy flexible",
            "Resistente a abrasión",
            "Absorbe impactos",
            "Elástico",
        ],
        available: false,
        colors: &[BLACK, WHITE, RED],
    },
];

pub fn material(id: &str) -> Option<&'static Material> {
    MATERIALS.iter().find(|m| m.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_lookup_by_key_or_id() {
        assert_eq!(section("modelViewer").map(|s| s.id), Some("model-viewer"));
        assert_eq!(section("model-viewer").map(|s| s.key), Some("modelViewer"));
        assert!(section("footer").is_none());
    }

    #[test]
    fn test_static_material_table() {
        let available: Vec<_> = MATERIALS
            .iter()
            .filter(|m| m.available)
            .map(|m| m.id)
            .collect();
        assert_eq!(available, vec!["pla", "petg"]);
        assert!(material("abs").is_some_and(|m| !m.available));
        assert!(material("nylon").is_none());
    }
}
