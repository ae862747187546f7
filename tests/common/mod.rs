//! Shared test utilities.

#![allow(dead_code, unused_imports)]

pub mod mock_backend;

use ccr_manager::config::{ConfigPaths, ConfigStore, Provider};
use std::path::PathBuf;
use tempfile::TempDir;

/// Paths inside a fresh temp dir; neither file exists yet.
pub fn temp_paths() -> (TempDir, ConfigPaths) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let paths = ConfigPaths {
        config_file: temp_dir.path().join(".claude-code-router").join("config.json"),
        settings_file: temp_dir.path().join(".claude").join("settings.json"),
    };
    (temp_dir, paths)
}

/// Write `content` as the config file and return its paths.
pub fn temp_config(content: &str) -> (TempDir, ConfigPaths) {
    let (temp_dir, paths) = temp_paths();
    std::fs::create_dir_all(paths.config_file.parent().unwrap()).unwrap();
    std::fs::write(&paths.config_file, content).unwrap();
    (temp_dir, paths)
}

/// A store loaded from a fresh default document.
pub fn loaded_store() -> (TempDir, ConfigStore) {
    let (temp_dir, paths) = temp_paths();
    let mut store = ConfigStore::new(paths);
    store.load().expect("Failed to load default config");
    (temp_dir, store)
}

pub fn provider(name: &str, base_url: &str, models: &[&str]) -> Provider {
    Provider {
        name: name.to_string(),
        api_base_url: base_url.to_string(),
        api_key: "k".to_string(),
        models_endpoint: None,
        models: models.iter().map(|m| m.to_string()).collect(),
        transformer: None,
    }
}

pub fn read_file(path: &PathBuf) -> String {
    std::fs::read_to_string(path).expect("Failed to read file")
}

/// Router config shaped like a hand-edited real one.
pub const SAMPLE_CONFIG: &str = r#"{
  "LOG": true,
  "LOG_LEVEL": "info",
  "CLAUDE_PATH": "",
  "HOST": "127.0.0.1",
  "PORT": 3456,
  "APIKEY": "secret",
  "API_TIMEOUT_MS": "600000",
  "PROXY_URL": "http://127.0.0.1:7890",
  "transformers": [
    {
      "path": "/home/user/.claude-code-router/plugins/gemini-cli.js",
      "options": {
        "project": "x"
      }
    }
  ],
  "Providers": [
    {
      "name": "openrouter",
      "api_base_url": "https://openrouter.ai/api/v1/chat/completions",
      "api_key": "sk-or",
      "models": [
        "google/gemini-2.5-pro-preview",
        "anthropic/claude-sonnet-4"
      ],
      "transformer": {
        "use": [
          "openrouter"
        ]
      }
    },
    {
      "name": "deepseek",
      "api_base_url": "https://api.deepseek.com/chat/completions",
      "api_key": "sk-ds",
      "models": [
        "deepseek-chat",
        "deepseek-reasoner"
      ],
      "transformer": {
        "use": [
          "deepseek"
        ],
        "deepseek-chat": {
          "use": [
            "tooluse",
            [
              "maxtoken",
              {
                "max_tokens": 16384
              }
            ]
          ]
        }
      }
    }
  ],
  "StatusLine": {
    "enabled": true,
    "currentStyle": "powerline",
    "powerline": {
      "modules": [
        {
          "type": "model",
          "icon": "🤖",
          "text": "{{model}}",
          "color": "bright_yellow"
        }
      ]
    },
    "default": {
      "modules": []
    }
  },
  "Router": {
    "default": "deepseek,deepseek-chat",
    "background": "",
    "think": "deepseek,deepseek-reasoner",
    "longContext": "openrouter,google/gemini-2.5-pro-preview",
    "longContextThreshold": 60000,
    "webSearch": "",
    "image": ""
  },
  "CUSTOM_ROUTER_PATH": "",
  "NON_INTERACTIVE_MODE": false
}
"#;
