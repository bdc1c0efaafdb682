//! Blocking client for an Ollama-compatible `/api/generate` endpoint.

use crate::config::types::{GeneratorConfig, Result, TransboxError};
use crate::repair::{CodeGenerator, GenerationRequest};
use serde::{Deserialize, Serialize};
use std::io::{BufRead, BufReader};
use std::time::Duration;

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
    top_p: f32,
}

#[derive(Debug, Serialize)]
struct GeneratePayload<'a> {
    model: &'a str,
    prompt: &'a str,
    system: &'a str,
    stream: bool,
    options: GenerateOptions,
}

/// One line of the newline-delimited response stream
#[derive(Debug, Default, Deserialize)]
struct GenerateChunk {
    #[serde(default)]
    response: String,
    #[serde(default)]
    done: bool,
}

pub struct OllamaGenerator {
    client: reqwest::blocking::Client,
    config: GeneratorConfig,
}

impl OllamaGenerator {
    pub fn new(config: GeneratorConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| TransboxError::Generator(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    pub fn endpoint(&self) -> String {
        format!("{}/api/generate", self.config.base_url.trim_end_matches('/'))
    }
}

impl CodeGenerator for OllamaGenerator {
    fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let payload = GeneratePayload {
            model: &self.config.model,
            prompt: &request.prompt,
            system: &request.system,
            stream: true,
            options: GenerateOptions {
                temperature: self.config.temperature,
                top_p: self.config.top_p,
            },
        };

        let url = self.endpoint();
        log::info!("Requesting generation from {} ({})", url, self.config.model);
        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| TransboxError::Generator(format!("POST {} failed: {}", url, e)))?;

        collect_stream(BufReader::new(response))
    }
}

/// Concatenate the `response` fields until a chunk reports `done`.
fn collect_stream<R: BufRead>(reader: R) -> Result<String> {
    let mut text = String::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let chunk: GenerateChunk = serde_json::from_str(&line).map_err(|e| {
            TransboxError::Generator(format!("Malformed stream line {:?}: {}", line, e))
        })?;
        text.push_str(&chunk.response);
        if chunk.done {
            break;
        }
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn stream_is_concatenated_until_done() {
        let body = "{\"response\":\"```cpp\\n\",\"done\":false}\n\n{\"response\":\"int main(){}\\n```\",\"done\":false}\n{\"response\":\"\",\"done\":true}\n{\"response\":\"ignored\"}\n";
        let text = collect_stream(Cursor::new(body)).unwrap();
        assert_eq!(text, "```cpp\nint main(){}\n```");
    }

    #[test]
    fn malformed_lines_are_errors() {
        assert!(matches!(
            collect_stream(Cursor::new("not json\n")),
            Err(TransboxError::Generator(_))
        ));
    }

    #[test]
    fn payload_shape() {
        let payload = GeneratePayload {
            model: "m",
            prompt: "p",
            system: "s",
            stream: true,
            options: GenerateOptions {
                temperature: 0.15,
                top_p: 0.9,
            },
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["stream"], true);
        assert_eq!(json["model"], "m");
        let top_p = json["options"]["top_p"].as_f64().unwrap();
        assert!((top_p - 0.9).abs() < 1e-6);
    }

    #[test]
    fn endpoint_tolerates_trailing_slash() {
        let generator = OllamaGenerator::new(GeneratorConfig {
            base_url: "http://localhost:11434/".to_string(),
            ..GeneratorConfig::default()
        })
        .unwrap();
        assert_eq!(generator.endpoint(), "http://localhost:11434/api/generate");
    }
}
