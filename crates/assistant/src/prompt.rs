//! Prompt composition.
//!
//! The prompt is rebuilt on every turn from three parts: the auditor
//! persona, the full matrix context and the latest question, followed by
//! the mandatory answer directives.

const PERSONA: &str = "Eres un auditor experto en sistemas de gestión (ISO 14001/45001) \
y normatividad mexicana (STPS, SEMARNAT, CONAGUA).";

const CONTEXT_INTRO: &str =
    "Tienes acceso a las siguientes matrices del proceso de producción de HCl:";

const QUESTION_LABEL: &str = "Pregunta del usuario:";

const DIRECTIVES: [&str; 4] = [
    "Base de datos: Analiza el equipo usando estrictamente la información de las matrices provistas.",
    "Precisión Normativa: Al mencionar la legislación, DEBES indicar los APARTADOS, CAPÍTULOS O \
ARTÍCULOS específicos de la norma.",
    "Estructura Documental: Si el requerimiento legal implica un documento (Análisis de Riesgos, \
Plan de Emergencias, etc.), GENERA UNA ESTRUCTURA SUGERIDA detallada (índice, capítulos) para el \
ingeniero.",
    "Formato: Presenta la información de forma ejecutiva con formato Markdown.",
];

/// Builds the text sent to the model for one question.
///
/// Stateless: the same inputs always produce byte-identical output.
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptComposer;

impl PromptComposer {
    pub fn new() -> Self {
        Self
    }

    /// Render the prompt for `question` over `matrix_context`.
    ///
    /// The context is embedded verbatim, without truncation.
    pub fn compose(&self, matrix_context: &str, question: &str) -> String {
        let mut prompt = String::with_capacity(
            PERSONA.len() + matrix_context.len() + question.len() + 1024,
        );

        prompt.push_str(PERSONA);
        prompt.push_str("\n\n");
        prompt.push_str(CONTEXT_INTRO);
        prompt.push('\n');
        prompt.push_str(matrix_context);
        prompt.push_str("\n\n");
        prompt.push_str(QUESTION_LABEL);
        prompt.push(' ');
        prompt.push_str(question);
        prompt.push_str("\n\nINSTRUCCIONES OBLIGATORIAS:");
        for (n, directive) in DIRECTIVES.iter().enumerate() {
            prompt.push_str(&format!("\n{}. {directive}", n + 1));
        }
        prompt
    }
}
