//! Fixed classification tables.
//!
//! `TYPE_PATTERNS` is an ordered slice on purpose: classification is
//! first-match-wins, so the position of an entry decides ties between types
//! that share indicator files (e.g. `requirements.txt`).

use std::ffi::OsStr;
use std::path::{Component, Path};

use crate::types::ProjectType;

/// One row of the ordered type-pattern table.
#[derive(Debug, Clone, Copy)]
pub struct TypePattern {
    pub project_type: ProjectType,
    /// Paths relative to the candidate directory.
    pub files: &'static [&'static str],
}

pub const TYPE_PATTERNS: &[TypePattern] = &[
    TypePattern {
        project_type: ProjectType::NextJs,
        files: &["next.config.js", "next.config.ts", "next.config.mjs"],
    },
    TypePattern {
        project_type: ProjectType::React,
        files: &["src/App.jsx", "src/App.tsx"],
    },
    TypePattern {
        project_type: ProjectType::NodeJs,
        files: &["package.json", "index.js", "server.js", "app.js"],
    },
    TypePattern {
        project_type: ProjectType::Python,
        files: &["requirements.txt", "pyproject.toml", "setup.py"],
    },
    TypePattern {
        project_type: ProjectType::Django,
        files: &["manage.py", "requirements.txt"],
    },
    TypePattern {
        project_type: ProjectType::Flask,
        files: &["app.py", "requirements.txt"],
    },
    TypePattern {
        project_type: ProjectType::LangGraph,
        files: &["langgraph.json"],
    },
    TypePattern {
        project_type: ProjectType::Docker,
        files: &["Dockerfile", "docker-compose.yml", "compose.yaml"],
    },
    TypePattern {
        project_type: ProjectType::Rust,
        files: &["Cargo.toml"],
    },
    TypePattern {
        project_type: ProjectType::Go,
        files: &["go.mod"],
    },
];

/// Any of these directly under a directory makes it a project.
pub const PROJECT_INDICATORS: &[&str] = &[
    ".git",
    "package.json",
    "pyproject.toml",
    "requirements.txt",
    "Cargo.toml",
    "go.mod",
    "pom.xml",
    "build.gradle",
    "Makefile",
    "mise.toml",
    "Taskfile.yml",
    "devenv.nix",
    ".envrc",
    "docker-compose.yml",
    "langgraph.json",
];

/// Directory names skipped by enumeration and by the watcher.
pub const IGNORED_DIRS: &[&str] = &[
    "node_modules",
    ".git",
    "dist",
    "build",
    "__pycache__",
    ".venv",
    "venv",
];

/// Dependency manifest read by the refinement step.
pub const MANIFEST_FILE: &str = "package.json";

pub const NEXT_DEPENDENCY: &str = "next";
pub const ELECTRON_DEPENDENCY: &str = "electron";
pub const REACT_DEPENDENCY: &str = "react";
pub const SERVER_DEPENDENCIES: &[&str] = &["express", "fastify", "koa"];

pub fn is_ignored_name(name: &OsStr) -> bool {
    IGNORED_DIRS.iter().any(|ignored| OsStr::new(ignored) == name)
}

/// True if any segment of `relative` is an ignored directory name.
pub fn has_ignored_segment(relative: &Path) -> bool {
    relative.components().any(|component| match component {
        Component::Normal(name) => is_ignored_name(name),
        _ => false,
    })
}

/// Every name a snapshot needs to know about, deduplicated, in table order.
pub fn candidate_names() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = Vec::new();
    let all = PROJECT_INDICATORS
        .iter()
        .chain(TYPE_PATTERNS.iter().flat_map(|p| p.files.iter()));
    for name in all {
        if !names.contains(name) {
            names.push(name);
        }
    }
    names
}
