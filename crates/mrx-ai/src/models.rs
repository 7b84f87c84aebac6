//! Model registry with public lookup API.

use crate::{Model, Provider};

struct ModelEntry {
    id: &'static str,
    name: &'static str,
    provider: Provider,
    context_window: u32,
    max_tokens: u32,
}

const MODEL_ENTRIES: &[ModelEntry] = &[
    ModelEntry {
        id: "gpt-4o-mini",
        name: "GPT-4o mini",
        provider: Provider::OpenAI,
        context_window: 128_000,
        max_tokens: 16_384,
    },
    ModelEntry {
        id: "gpt-4o",
        name: "GPT-4o",
        provider: Provider::OpenAI,
        context_window: 128_000,
        max_tokens: 16_384,
    },
    ModelEntry {
        id: "gpt-4.1-mini",
        name: "GPT-4.1 mini",
        provider: Provider::OpenAI,
        context_window: 1_047_576,
        max_tokens: 32_768,
    },
    ModelEntry {
        id: "gpt-4.1",
        name: "GPT-4.1",
        provider: Provider::OpenAI,
        context_window: 1_047_576,
        max_tokens: 32_768,
    },
    ModelEntry {
        id: "llama-3.3-70b-versatile",
        name: "Llama 3.3 70B",
        provider: Provider::Groq,
        context_window: 131_072,
        max_tokens: 32_768,
    },
];

impl ModelEntry {
    fn to_model(&self) -> Model {
        Model {
            id: self.id.to_string(),
            name: self.name.to_string(),
            provider: self.provider,
            base_url: self
                .provider
                .default_base_url()
                .unwrap_or_default()
                .to_string(),
            context_window: self.context_window,
            max_tokens: self.max_tokens,
            headers: Default::default(),
        }
    }
}

/// Look up a model by provider and ID.
pub fn get_model(provider: Provider, id: &str) -> Option<Model> {
    MODEL_ENTRIES
        .iter()
        .find(|e| e.id == id && e.provider == provider)
        .map(|e| e.to_model())
}

/// Look up a model by ID only (first match across all providers).
pub fn get_model_by_id(id: &str) -> Option<Model> {
    MODEL_ENTRIES
        .iter()
        .find(|e| e.id == id)
        .map(|e| e.to_model())
}

/// Resolve a model, falling back to a generic definition for unknown IDs.
///
/// `base_url` overrides the provider default when given; custom providers
/// have no default, so the result may carry an empty base URL.
pub fn resolve(provider: Provider, id: &str, base_url: Option<&str>) -> Model {
    let mut model = get_model(provider, id).unwrap_or_else(|| Model {
        id: id.to_string(),
        name: id.to_string(),
        provider,
        base_url: provider.default_base_url().unwrap_or_default().to_string(),
        context_window: 128_000,
        max_tokens: 8192,
        headers: Default::default(),
    });

    if let Some(url) = base_url {
        model.base_url = url.trim_end_matches('/').to_string();
    }
    model
}

/// Get all registered models.
pub fn get_all_models() -> Vec<Model> {
    MODEL_ENTRIES.iter().map(|e| e.to_model()).collect()
}
