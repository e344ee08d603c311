use std::fmt;
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status assigned to every project the scanner registers.
pub const DEFAULT_STATUS: &str = "stopped";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(NonZeroU32);

impl ProjectId {
    pub fn new(value: u32) -> Option<Self> {
        NonZeroU32::new(value).map(Self)
    }

    pub fn value(&self) -> u32 {
        self.0.get()
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Classification label for a project directory.
///
/// Serialized with the human-readable label (`"Next.js + Electron"`), which is
/// also what the store persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProjectType {
    #[serde(rename = "Next.js")]
    NextJs,
    #[serde(rename = "Next.js + Electron")]
    NextJsElectron,
    React,
    #[serde(rename = "Node.js")]
    NodeJs,
    Python,
    Django,
    Flask,
    LangGraph,
    Docker,
    Rust,
    Go,
    Unknown,
}

impl ProjectType {
    pub const ALL: [ProjectType; 12] = [
        ProjectType::NextJs,
        ProjectType::NextJsElectron,
        ProjectType::React,
        ProjectType::NodeJs,
        ProjectType::Python,
        ProjectType::Django,
        ProjectType::Flask,
        ProjectType::LangGraph,
        ProjectType::Docker,
        ProjectType::Rust,
        ProjectType::Go,
        ProjectType::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectType::NextJs => "Next.js",
            ProjectType::NextJsElectron => "Next.js + Electron",
            ProjectType::React => "React",
            ProjectType::NodeJs => "Node.js",
            ProjectType::Python => "Python",
            ProjectType::Django => "Django",
            ProjectType::Flask => "Flask",
            ProjectType::LangGraph => "LangGraph",
            ProjectType::Docker => "Docker",
            ProjectType::Rust => "Rust",
            ProjectType::Go => "Go",
            ProjectType::Unknown => "Unknown",
        }
    }

    /// Labels the manifest refinement is allowed to replace.
    pub fn is_generic(&self) -> bool {
        matches!(self, ProjectType::Unknown | ProjectType::NodeJs)
    }
}

impl fmt::Display for ProjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProjectType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown project type: {s}"))
    }
}

/// A registered project row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    #[serde(rename = "type")]
    pub project_type: ProjectType,
    /// Unique key across the store.
    pub path: PathBuf,
    /// Owned by the process manager; never touched by scanning.
    pub status: String,
    /// Owned by the process manager; never touched by scanning.
    pub port: Option<u16>,
    pub last_modified: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// A project row before the store assigns an id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProject {
    pub name: String,
    #[serde(rename = "type")]
    pub project_type: ProjectType,
    pub path: PathBuf,
    pub status: String,
    pub port: Option<u16>,
    /// Also stored as the row's `created_at`.
    pub last_modified: DateTime<Utc>,
}

impl NewProject {
    /// Row for a freshly discovered directory: stopped, no port.
    pub fn discovered(result: &ScanResult, now: DateTime<Utc>) -> Self {
        Self {
            name: result.name.clone(),
            project_type: result.project_type,
            path: result.path.clone(),
            status: DEFAULT_STATUS.to_string(),
            port: None,
            last_modified: now,
        }
    }
}

/// Partial update applied by `ProjectStore::update`. `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectUpdate {
    pub project_type: Option<ProjectType>,
    pub last_modified: Option<DateTime<Utc>>,
    pub status: Option<String>,
    pub port: Option<Option<u16>>,
}

impl ProjectUpdate {
    /// The only update the scanner ever issues.
    pub fn retype(project_type: ProjectType, now: DateTime<Utc>) -> Self {
        Self {
            project_type: Some(project_type),
            last_modified: Some(now),
            ..Self::default()
        }
    }

    pub fn apply_to(self, project: &mut Project) {
        if let Some(project_type) = self.project_type {
            project.project_type = project_type;
        }
        if let Some(last_modified) = self.last_modified {
            project.last_modified = last_modified;
        }
        if let Some(status) = self.status {
            project.status = status;
        }
        if let Some(port) = self.port {
            project.port = port;
        }
    }
}

/// Result of classifying one directory. Never persisted directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    pub path: PathBuf,
    pub name: String,
    #[serde(rename = "type")]
    pub project_type: ProjectType,
    pub detected_files: Vec<String>,
}

impl ScanResult {
    pub fn new(path: &Path, project_type: ProjectType, detected_files: Vec<String>) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Self {
            path: path.to_path_buf(),
            name,
            project_type,
            detected_files,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_id_creation() {
        assert!(ProjectId::new(0).is_none());

        let id = ProjectId::new(42).unwrap();
        assert_eq!(id.value(), 42);
        assert_eq!(id.to_string(), "42");
    }

    #[test]
    fn test_project_type_labels_roundtrip() {
        for project_type in ProjectType::ALL {
            let parsed: ProjectType = project_type.as_str().parse().unwrap();
            assert_eq!(parsed, project_type);
        }
        assert!("Cobol".parse::<ProjectType>().is_err());
    }

    #[test]
    fn test_project_type_serializes_as_label() {
        let json = serde_json::to_string(&ProjectType::NextJsElectron).unwrap();
        assert_eq!(json, "\"Next.js + Electron\"");
    }

    #[test]
    fn test_scan_result_name_is_last_segment() {
        let result = ScanResult::new(Path::new("/work/my-app"), ProjectType::Rust, vec![]);
        assert_eq!(result.name, "my-app");
    }

    #[test]
    fn test_retype_leaves_process_fields_alone() {
        let now = Utc::now();
        let mut project = Project {
            id: ProjectId::new(1).unwrap(),
            name: "api".to_string(),
            project_type: ProjectType::NodeJs,
            path: PathBuf::from("/work/api"),
            status: "running".to_string(),
            port: Some(3000),
            last_modified: now,
            created_at: now,
        };

        let later = now + chrono::Duration::seconds(5);
        ProjectUpdate::retype(ProjectType::NextJs, later).apply_to(&mut project);

        assert_eq!(project.project_type, ProjectType::NextJs);
        assert_eq!(project.last_modified, later);
        assert_eq!(project.status, "running");
        assert_eq!(project.port, Some(3000));
    }

    #[test]
    fn test_project_json_uses_camel_case() {
        let now = Utc::now();
        let result = ScanResult::new(Path::new("/work/site"), ProjectType::React, vec![]);
        let row = NewProject::discovered(&result, now);
        let json = serde_json::to_value(&row).unwrap();

        assert_eq!(json["type"], "React");
        assert_eq!(json["status"], "stopped");
        assert!(json["port"].is_null());
        assert!(json.get("lastModified").is_some());
    }
}
