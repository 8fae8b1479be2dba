//! `hclaudit chat` — Ask questions from the terminal.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use hclaudit_assistant::{Assistant, ChatSession};
use hclaudit_core::Error;
use hclaudit_matrix::MatrixStore;
use tokio::io::{AsyncBufReadExt, BufReader};

pub async fn run(
    config_path: Option<&Path>,
    message: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;
    let store = Arc::new(MatrixStore::from_config(&config.data));

    let assistant = match Assistant::from_config(&config, store).await {
        Ok(assistant) => assistant,
        Err(e) => {
            print_blocked(&e);
            return Err(e.into());
        }
    };

    let mut session = ChatSession::new();

    if let Some(question) = message {
        // Single question mode
        eprint!("  Analizando matrices...");
        let result = assistant.submit(&mut session, &question).await;
        eprint!("\r                         \r");
        let outcome = result?;
        println!("{}", outcome.answer);
        return Ok(());
    }

    // Interactive mode
    println!();
    println!("  ╔══════════════════════════════════════════════════╗");
    println!("  ║   Asistente Experto: Gestión Ambiental y Riesgos   ║");
    println!("  ╚══════════════════════════════════════════════════╝");
    println!();
    println!("  Provider:  {}", assistant.provider_name());
    println!("  Model:     {}", assistant.settings().model);
    println!("  Matrices:  {} caracteres de contexto", assistant.context().await?.len());
    println!();
    println!("  Escribe tu pregunta y presiona Enter.");
    println!("  'salir', 'exit' o Ctrl+D para terminar; 'reiniciar' para empezar de nuevo.");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    print!("  Tú > ");
    std::io::stdout().flush()?;

    while let Some(line) = lines.next_line().await? {
        let input = line.trim();
        match input {
            "salir" | "exit" | "quit" => break,
            "reiniciar" | "reset" => {
                session.reset();
                println!("  (nueva conversación)");
            }
            _ => {
                eprint!("  ...");
                let result = assistant.submit(&mut session, input).await;
                eprint!("\r     \r");
                match result {
                    Ok(outcome) => {
                        println!();
                        for line in outcome.answer.lines() {
                            println!("  Asistente > {line}");
                        }
                        println!();
                    }
                    Err(e) => {
                        eprintln!("  {}", turn_error_message(&e));
                        println!();
                    }
                }
                session.finish_turn();
            }
        }

        print!("  Tú > ");
        std::io::stdout().flush()?;
    }

    println!();
    println!("  Hasta luego 👋");
    println!();

    Ok(())
}

/// The line shown on stderr when a turn fails.
fn turn_error_message(error: &Error) -> String {
    match error {
        Error::EmptyInput => "[Aviso] La pregunta está vacía; escribe una consulta.".into(),
        Error::Transport(e) => format!("[Error de comunicación con el modelo] {e}"),
        other => format!("[Error] {other}"),
    }
}

fn print_blocked(error: &Error) {
    eprintln!();
    match error {
        Error::DataUnavailable(e) => {
            eprintln!("  ⚠️  ALARMA: Faltan archivos de las matrices.");
            eprintln!("     {e}");
            eprintln!();
            eprintln!("  Coloca los CSV en el directorio de datos o ajusta [data] en config.toml.");
        }
        Error::Configuration { message } => {
            eprintln!("  ❌ Falla en la llave de acceso (API Key).");
            eprintln!("     {message}");
            eprintln!();
            eprintln!("  Set one of these environment variables:");
            eprintln!("    GEMINI_API_KEY=...     (recommended)");
            eprintln!("    HCLAUDIT_API_KEY=...   (generic)");
        }
        other => eprintln!("  ❌ {other}"),
    }
    eprintln!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use hclaudit_core::error::ProviderError;

    #[test]
    fn blank_question_gets_a_notice() {
        let line = turn_error_message(&Error::EmptyInput);
        assert!(line.contains("La pregunta está vacía"));
    }

    #[test]
    fn transport_failure_names_the_cause() {
        let line = turn_error_message(&Error::Transport(ProviderError::Timeout(
            "deadline exceeded".into(),
        )));
        assert!(line.starts_with("[Error de comunicación con el modelo]"));
        assert!(line.contains("deadline exceeded"));
    }
}
