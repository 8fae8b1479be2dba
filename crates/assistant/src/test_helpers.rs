//! Shared test helpers for assistant tests.

use std::path::Path;
use std::sync::Mutex;

use hclaudit_config::DataConfig;
use hclaudit_core::error::ProviderError;
use hclaudit_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};

/// A mock provider that replays scripted results and records prompts.
///
/// Panics if more calls are made than results provided.
pub struct ScriptedProvider {
    script: Mutex<Vec<Result<String, ProviderError>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    pub fn new(script: Vec<Result<String, ProviderError>>) -> Self {
        Self {
            script: Mutex::new(script),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// A provider that answers every call successfully, in order.
    pub fn answers(texts: &[&str]) -> Self {
        Self::new(texts.iter().map(|t| Ok(t.to_string())).collect())
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let prompt = request
            .messages
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        let call = {
            let mut prompts = self.prompts.lock().unwrap();
            prompts.push(prompt);
            prompts.len()
        };

        let mut script = self.script.lock().unwrap();
        if script.is_empty() {
            panic!("ScriptedProvider: no more results (call #{call})");
        }
        script.remove(0).map(|text| ProviderResponse {
            text,
            usage: Some(Usage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            }),
            model: request.model,
        })
    }
}

/// Write the three default matrix files into `dir`.
pub fn write_matrices(dir: &Path) -> DataConfig {
    let data = DataConfig {
        dir: dir.to_path_buf(),
        ..DataConfig::default()
    };
    let paths = data.matrix_paths();
    std::fs::write(
        &paths[0],
        "Equipo,Aspecto ambiental,Norma\nB-110,Emisión de HCl,NOM-085-SEMARNAT\nB-120,Ruido,NOM-011-STPS\n",
    )
    .unwrap();
    std::fs::write(
        &paths[1],
        "Equipo,Aspecto ambiental,Norma\nTK-201,Derrame de ácido,NOM-052-SEMARNAT\n",
    )
    .unwrap();
    std::fs::write(
        &paths[2],
        "Pregunta,Consecuencia,Salvaguarda\n¿Qué pasa si falla la bomba P-205?,Fuga de HCl,Dique de contención\n",
    )
    .unwrap();
    data
}
