//! Scenario library
//!
//! Built-in scripted scenarios. Each scenario alternates scripted lines with
//! lines the learner is expected to produce.

use serde::{Deserialize, Serialize};

use lingua_tutor_core::Language;

use crate::turn::{DialogueState, DialogueTurn, Speaker, TurnStatus};

/// A single line of a scenario script
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioTurn {
    pub speaker: Speaker,
    pub text: String,
}

impl ScenarioTurn {
    fn other(text: &str) -> Self {
        Self {
            speaker: Speaker::ScriptedOther,
            text: text.to_string(),
        }
    }

    fn learner(text: &str) -> Self {
        Self {
            speaker: Speaker::Learner,
            text: text.to_string(),
        }
    }
}

/// A scripted practice scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    pub id: String,
    pub title: String,
    pub language: Language,
    /// CEFR level the script is pitched at
    pub level: String,
    pub turns: Vec<ScenarioTurn>,
}

impl Scenario {
    /// Start a fresh dialogue: every turn pending, index at zero
    pub fn start(&self) -> DialogueState {
        DialogueState {
            scenario_id: self.id.clone(),
            language: self.language,
            turns: self
                .turns
                .iter()
                .enumerate()
                .map(|(index, turn)| DialogueTurn {
                    index,
                    speaker: turn.speaker,
                    text: turn.text.clone(),
                    status: TurnStatus::Pending,
                })
                .collect(),
            index: 0,
        }
    }
}

/// In-memory scenario registry
pub struct ScenarioLibrary {
    scenarios: Vec<Scenario>,
}

impl ScenarioLibrary {
    /// Library with the built-in scenarios
    pub fn builtin() -> Self {
        Self {
            scenarios: builtin_scenarios(),
        }
    }

    /// Library from an explicit scenario set
    pub fn new(scenarios: Vec<Scenario>) -> Self {
        Self { scenarios }
    }

    pub fn get(&self, id: &str) -> Option<&Scenario> {
        self.scenarios.iter().find(|s| s.id == id)
    }

    pub fn list(&self) -> &[Scenario] {
        &self.scenarios
    }
}

impl Default for ScenarioLibrary {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Built-in scenario scripts
pub fn builtin_scenarios() -> Vec<Scenario> {
    vec![
        Scenario {
            id: "introductions".to_string(),
            title: "Meeting someone new".to_string(),
            language: Language::English,
            level: "A1".to_string(),
            turns: vec![
                ScenarioTurn::other("Hi! I don't think we've met. What's your name?"),
                ScenarioTurn::learner("My name is Maria. Nice to meet you."),
                ScenarioTurn::other("Nice to meet you too! Where are you from?"),
                ScenarioTurn::learner("I am from Brazil."),
            ],
        },
        Scenario {
            id: "cafe-ordering".to_string(),
            title: "Ordering at a café".to_string(),
            language: Language::Spanish,
            level: "A1".to_string(),
            turns: vec![
                ScenarioTurn::other("¡Hola! Bienvenido al café. ¿Qué desea tomar?"),
                ScenarioTurn::learner("Quisiera un café con leche, por favor."),
                ScenarioTurn::other("¿Algo más? Tenemos croissants muy ricos."),
                ScenarioTurn::learner("Sí, un croissant también."),
                ScenarioTurn::other("Perfecto. Son cinco euros."),
                ScenarioTurn::learner("Aquí tiene. Muchas gracias."),
            ],
        },
        Scenario {
            id: "asking-directions".to_string(),
            title: "Asking for directions".to_string(),
            language: Language::French,
            level: "A2".to_string(),
            turns: vec![
                ScenarioTurn::other("Bonjour ! Vous semblez perdu. Je peux vous aider ?"),
                ScenarioTurn::learner("Oui, je cherche la gare, s'il vous plaît."),
                ScenarioTurn::other("C'est tout droit, puis à gauche après la banque."),
                ScenarioTurn::learner("Merci beaucoup. C'est loin d'ici ?"),
                ScenarioTurn::other("Non, c'est à cinq minutes à pied."),
                ScenarioTurn::learner("Parfait. Bonne journée !"),
            ],
        },
        Scenario {
            id: "hotel-checkin".to_string(),
            title: "Checking into a hotel".to_string(),
            language: Language::German,
            level: "A2".to_string(),
            turns: vec![
                ScenarioTurn::other("Guten Tag! Willkommen im Hotel Sonne."),
                ScenarioTurn::learner("Guten Tag. Ich habe ein Zimmer reserviert."),
                ScenarioTurn::other("Wie ist Ihr Name, bitte?"),
                ScenarioTurn::learner("Mein Name ist Anna Schmidt."),
                ScenarioTurn::other("Hier ist Ihr Schlüssel. Zimmer zwölf."),
                ScenarioTurn::learner("Vielen Dank. Schönen Tag noch!"),
            ],
        },
    ]
}
