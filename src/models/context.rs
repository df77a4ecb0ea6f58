/*
    The project context used to live in process-wide environment variables (HAL_*)
    set by the launcher.
    Here it is an explicit value: load it from the environment once, or from a json file,
    and hand it to the resolver.
*/
use super::entity::EntityRef;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContextError {
    #[error("Missing required project context: {0}")]
    Missing(&'static str),
    #[error("{var} must be an integer id, got \"{value}\"")]
    InvalidId { var: &'static str, value: String },
    #[error("Tree must be 'shots' or 'assets', got \"{0}\"")]
    InvalidTree(String),
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Unable to read project context: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Unable to locate the user config directory")]
    NoConfigDir,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abbr: Option<String>,
}

/// Which branch of the project tree the unit of work lives in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Tree {
    Shots {
        sequence: String,
        shot: String,
        #[serde(default)]
        shot_id: Option<i64>,
    },
    Assets {
        #[serde(default)]
        category: Option<String>,
        asset: String,
        #[serde(default)]
        asset_id: Option<i64>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectContext {
    pub project: Project,
    /// Short user tag appended to every version label.
    pub user_abbr: String,
    pub task: String,
    pub tree: Tree,
}

impl ProjectContext {
    /// Read the context from the process environment.
    pub fn from_env() -> Result<Self, ContextError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the context through any key lookup using the launcher's variable names.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ContextError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // blank values count as unset
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let require = |key: &'static str| get(key).ok_or(ContextError::Missing(key));

        let project = Project {
            id: parse_id("HAL_PROJECT_SGID", require("HAL_PROJECT_SGID")?)?,
            name: require("HAL_PROJECT")?,
            abbr: get("HAL_PROJECT_ABBR"),
        };

        let tree = match require("HAL_TREE")?.as_str() {
            "shots" => Tree::Shots {
                sequence: require("HAL_SEQUENCE")?,
                shot: require("HAL_SHOT")?,
                shot_id: get("HAL_SHOT_SGID")
                    .map(|v| parse_id("HAL_SHOT_SGID", v))
                    .transpose()?,
            },
            "assets" => Tree::Assets {
                category: get("HAL_CATEGORY"),
                asset: require("HAL_ASSET")?,
                asset_id: get("HAL_ASSET_SGID")
                    .map(|v| parse_id("HAL_ASSET_SGID", v))
                    .transpose()?,
            },
            other => return Err(ContextError::InvalidTree(other.to_owned())),
        };

        Ok(Self {
            project,
            user_abbr: require("HAL_USER_ABBR")?,
            task: require("HAL_TASK")?,
            tree,
        })
    }

    /// Name shared by the task and every version of it.
    pub fn content_base(&self) -> String {
        match &self.tree {
            Tree::Shots { sequence, shot, .. } => format!("{sequence}_{shot}_{}", self.task),
            Tree::Assets { asset, .. } => format!("{asset}_{}", self.task),
        }
    }

    /// Shot or asset owning the task. Fails when the launcher did not provide the id.
    pub fn parent(&self) -> Result<EntityRef, ContextError> {
        match &self.tree {
            Tree::Shots { shot_id, .. } => shot_id
                .map(|id| EntityRef::new("Shot", id))
                .ok_or(ContextError::Missing("HAL_SHOT_SGID")),
            Tree::Assets { asset_id, .. } => asset_id
                .map(|id| EntityRef::new("Asset", id))
                .ok_or(ContextError::Missing("HAL_ASSET_SGID")),
        }
    }

    pub fn project_ref(&self) -> EntityRef {
        EntityRef::new("Project", self.project.id)
    }

    // this path is machine specific and should not be shared across machines.
    pub fn default_path() -> Result<PathBuf, ContextError> {
        let dir = dirs::config_dir().ok_or(ContextError::NoConfigDir)?;
        Ok(dir.join("prodtrack").join("context.json"))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ContextError> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ContextError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(self)?;
        fs::write(path, data)?;
        Ok(())
    }
}

fn parse_id(var: &'static str, value: String) -> Result<i64, ContextError> {
    value
        .trim()
        .parse()
        .map_err(|_| ContextError::InvalidId { var, value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn shot_env() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("HAL_PROJECT_SGID", "122"),
            ("HAL_PROJECT", "aurora"),
            ("HAL_PROJECT_ABBR", "AUR"),
            ("HAL_USER_ABBR", "ab"),
            ("HAL_TREE", "shots"),
            ("HAL_SEQUENCE", "SEQ010"),
            ("HAL_SHOT", "SH020"),
            ("HAL_SHOT_SGID", "1204"),
            ("HAL_TASK", "comp"),
        ])
    }

    fn from_map(map: &HashMap<&'static str, &'static str>) -> Result<ProjectContext, ContextError> {
        ProjectContext::from_lookup(|key| map.get(key).map(|v| v.to_string()))
    }

    #[test]
    fn shot_context_from_lookup() {
        let context = from_map(&shot_env()).unwrap();
        assert_eq!(context.project.id, 122);
        assert_eq!(context.project.abbr.as_deref(), Some("AUR"));
        assert_eq!(context.content_base(), "SEQ010_SH020_comp");
        assert_eq!(context.parent().unwrap(), EntityRef::new("Shot", 1204));
    }

    #[test]
    fn asset_context_from_lookup() {
        let env = HashMap::from([
            ("HAL_PROJECT_SGID", "122"),
            ("HAL_PROJECT", "aurora"),
            ("HAL_USER_ABBR", "ab"),
            ("HAL_TREE", "assets"),
            ("HAL_CATEGORY", "props"),
            ("HAL_ASSET", "lantern"),
            ("HAL_ASSET_SGID", "88"),
            ("HAL_TASK", "model"),
        ]);
        let context = from_map(&env).unwrap();
        assert_eq!(context.content_base(), "lantern_model");
        assert_eq!(context.parent().unwrap(), EntityRef::new("Asset", 88));
    }

    #[test]
    fn missing_task_is_reported() {
        let mut env = shot_env();
        env.remove("HAL_TASK");
        assert!(matches!(
            from_map(&env),
            Err(ContextError::Missing("HAL_TASK"))
        ));
    }

    #[test]
    fn blank_value_counts_as_missing() {
        let mut env = shot_env();
        env.insert("HAL_USER_ABBR", "  ");
        assert!(matches!(
            from_map(&env),
            Err(ContextError::Missing("HAL_USER_ABBR"))
        ));
    }

    #[test]
    fn non_numeric_project_id() {
        let mut env = shot_env();
        env.insert("HAL_PROJECT_SGID", "abc");
        assert!(matches!(
            from_map(&env),
            Err(ContextError::InvalidId { var: "HAL_PROJECT_SGID", .. })
        ));
    }

    #[test]
    fn unknown_tree() {
        let mut env = shot_env();
        env.insert("HAL_TREE", "editorial");
        assert!(matches!(from_map(&env), Err(ContextError::InvalidTree(t)) if t == "editorial"));
    }

    #[test]
    fn shot_id_is_only_required_for_parent() {
        let mut env = shot_env();
        env.remove("HAL_SHOT_SGID");
        let context = from_map(&env).unwrap();
        assert_eq!(context.content_base(), "SEQ010_SH020_comp");
        assert!(matches!(
            context.parent(),
            Err(ContextError::Missing("HAL_SHOT_SGID"))
        ));
    }

    #[test]
    fn save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("context.json");
        let context = from_map(&shot_env()).unwrap();
        context.save(&path).unwrap();
        let loaded = ProjectContext::load(&path).unwrap();
        assert_eq!(loaded, context);
    }

    #[test]
    fn load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = ProjectContext::load(dir.path().join("absent.json"));
        assert!(matches!(result, Err(ContextError::Io(_))));
    }
}
