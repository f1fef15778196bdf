//! Canned-response rule table for the chat widget.
//!
//! Rules are tried top to bottom and the first match wins, so every
//! multi-keyword rule sits above the broader rule it refines ("taller" +
//! "gratis" before plain "taller").  Keywords are lowercase substrings; a
//! rule matches when each of its groups has at least one keyword present.

/// One canned answer and the keywords that select it.
#[derive(Debug, PartialEq, Eq)]
pub struct ResponseRule {
    pub id: &'static str,
    /// Conjunction of groups; each group is a disjunction of substrings.
    pub triggers: &'static [&'static [&'static str]],
    pub response: &'static str,
    /// Pre-bound question for the suggested-question buttons.
    pub quick_question: Option<&'static str>,
}

impl ResponseRule {
    /// `lowered` must already be lower-cased.
    pub fn matches(&self, lowered: &str) -> bool {
        !self.triggers.is_empty()
            && self
                .triggers
                .iter()
                .all(|group| group.iter().any(|kw| lowered.contains(kw)))
    }
}

pub const GREETING: &str = "¡Hola! Soy el asistente del colectivo. Pregúntame por los talleres, \
la tienda, las donaciones o la radio.";

pub const FALLBACK_RESPONSE: &str = "No tengo una respuesta para eso todavía. ¿Quieres hablar \
con una persona del colectivo? Escríbenos por WhatsApp y te respondemos pronto.";

pub const RULES: &[ResponseRule] = &[
    ResponseRule {
        id: "free_workshop",
        triggers: &[&["taller"], &["gratis", "gratuit"]],
        response: "El taller gratuito es cada primer sábado del mes, de 10 a.m. a 1 p.m. Los \
cupos son limitados: inscríbete por WhatsApp con tu nombre y edad. Los materiales los pone \
el colectivo.",
        quick_question: Some("¿Cómo funciona el taller gratuito?"),
    },
    ResponseRule {
        id: "workshop_prices",
        triggers: &[
            &["taller", "curso", "clase"],
            &["precio", "costo", "cuesta", "cuánto", "cuanto", "valor"],
        ],
        response: "Los talleres regulares cuestan entre $40.000 y $80.000 COP al mes según la \
técnica. Tenemos becas parciales: pregúntanos por WhatsApp.",
        quick_question: None,
    },
    ResponseRule {
        id: "workshops",
        triggers: &[&["taller", "curso", "clase"]],
        response: "Ofrecemos talleres de cerámica, serigrafía, muralismo, fotografía análoga y \
radio comunitaria, para niños, jóvenes y adultos. Revisa la sección de talleres para ver \
horarios y cupos.",
        quick_question: Some("¿Qué talleres ofrecen?"),
    },
    ResponseRule {
        id: "donations",
        triggers: &[&["donar", "donaci", "apoyar", "aporte", "aportar"]],
        response: "Puedes apoyarnos con una donación única por PayPal o PSE, o de forma mensual \
en Patreon. Todo lo recaudado va a materiales y becas para los talleres.",
        quick_question: Some("¿Cómo puedo donar?"),
    },
    ResponseRule {
        id: "store",
        triggers: &[&["tienda", "comprar", "producto", "venden", "camiseta"]],
        response: "En la tienda hay camisetas serigrafiadas, fanzines, tazas de cerámica y \
afiches hechos en nuestros talleres. Los pedidos se coordinan por WhatsApp.",
        quick_question: Some("¿Qué venden en la tienda?"),
    },
    ResponseRule {
        id: "radio",
        triggers: &[&["radio", "emisora", "estaci", "escuchar"]],
        response: "Nuestra radio transmite las 24 horas: programas en vivo de los talleres y \
grabaciones de conciertos. Dale play en el reproductor y cambia de estación con las flechas.",
        quick_question: Some("¿Cómo escucho la radio?"),
    },
    ResponseRule {
        id: "gallery",
        triggers: &[&["galer", "obra", "exposici", "artista"]],
        response: "La galería muestra obras de estudiantes y artistas invitados. La exposición \
del mes se puede visitar gratis de martes a sábado.",
        quick_question: None,
    },
    ResponseRule {
        id: "schedule",
        triggers: &[&["horario", "abren", "cierran", "atienden"]],
        response: "Abrimos de martes a sábado, de 9 a.m. a 6 p.m. Los domingos solo hay \
actividades especiales anunciadas en redes.",
        quick_question: None,
    },
    ResponseRule {
        id: "location",
        triggers: &[&["dónde", "donde", "ubica", "direcci", "llegar"]],
        response: "Estamos en la casa cultural del barrio, a dos cuadras del parque principal. \
En la sección de contacto está el mapa.",
        quick_question: Some("¿Dónde están ubicados?"),
    },
    ResponseRule {
        id: "contact",
        triggers: &[&["contacto", "whatsapp", "teléfono", "telefono", "correo", "hablar con"]],
        response: "Escríbenos por WhatsApp o con el formulario de contacto. Respondemos de \
martes a sábado.",
        quick_question: None,
    },
    ResponseRule {
        id: "volunteer",
        triggers: &[&["voluntari", "participar", "unirme", "sumarme"]],
        response: "¡Nos encanta sumar gente! Cuéntanos por WhatsApp qué sabes hacer y en qué \
horarios puedes apoyar.",
        quick_question: None,
    },
    ResponseRule {
        id: "free_content",
        triggers: &[&["gratis", "gratuit"]],
        response: "Muchas actividades son gratuitas: el taller del primer sábado, las \
exposiciones y la radio. Los talleres regulares tienen costo, con becas disponibles.",
        quick_question: None,
    },
    ResponseRule {
        id: "greeting",
        triggers: &[&["hola", "buenas", "buenos días", "buenos dias", "saludos"]],
        response: "¡Hola! ¿En qué te puedo ayudar? Puedo contarte de talleres, la tienda, \
donaciones o la radio.",
        quick_question: None,
    },
    ResponseRule {
        id: "thanks",
        triggers: &[&["gracias"]],
        response: "¡Con gusto! Si tienes otra pregunta, aquí estoy.",
        quick_question: None,
    },
];

/// Rules that back a suggested-question button, in table order.
pub fn quick_replies() -> impl Iterator<Item = &'static ResponseRule> {
    RULES.iter().filter(|r| r.quick_question.is_some())
}

pub fn find(id: &str) -> Option<&'static ResponseRule> {
    RULES.iter().find(|r| r.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        for (i, rule) in RULES.iter().enumerate() {
            assert!(
                RULES[i + 1..].iter().all(|r| r.id != rule.id),
                "duplicate rule id {}",
                rule.id
            );
        }
    }

    #[test]
    fn test_keywords_are_lowercase() {
        for rule in RULES {
            for group in rule.triggers {
                assert!(!group.is_empty(), "empty group in {}", rule.id);
                for kw in *group {
                    assert_eq!(*kw, kw.to_lowercase(), "keyword {:?} in {}", kw, rule.id);
                }
            }
        }
    }

    #[test]
    fn test_every_rule_is_reachable() {
        // The first keyword of each group must land on the rule itself,
        // otherwise an earlier rule shadows it.
        for rule in RULES {
            let sample: Vec<&str> = rule.triggers.iter().map(|g| g[0]).collect();
            let sample = sample.join(" ");
            let winner = RULES.iter().find(|r| r.matches(&sample)).map(|r| r.id);
            assert_eq!(winner, Some(rule.id), "sample {:?}", sample);
        }
    }

    #[test]
    fn test_group_needs_every_conjunct() {
        let rule = find("free_workshop").unwrap();
        assert!(rule.matches("el taller es gratis"));
        assert!(rule.matches("taller gratuito"));
        assert!(!rule.matches("taller de cerámica"));
        assert!(!rule.matches("es gratis"));
    }

    #[test]
    fn test_quick_replies_have_questions() {
        let ids: Vec<&str> = quick_replies().map(|r| r.id).collect();
        assert_eq!(ids[0], "free_workshop");
        assert!(ids.contains(&"workshops"));
        assert!(ids.contains(&"donations"));
    }
}
